//! Unix domain socket backend, used for non-Windows builds and for
//! portable testing of the helper channel's framing and state machine.

use std::os::unix::net::{UnixListener, UnixStream};

use crate::duplex::Duplex;
use crate::error::Result;

pub struct PlatformListener {
    inner: UnixListener,
}

impl PlatformListener {
    pub fn bind(name: &str) -> Result<Self> {
        let path = socket_path(name);
        let _ = std::fs::remove_file(&path);
        let inner = UnixListener::bind(&path)?;
        Ok(PlatformListener { inner })
    }

    pub fn accept(&mut self) -> Result<(Box<dyn Duplex>, u32)> {
        let (stream, _addr) = self.inner.accept()?;
        let peer_pid = peer_pid(&stream);
        Ok((Box::new(stream), peer_pid))
    }
}

pub fn connect(name: &str) -> Result<Box<dyn Duplex>> {
    let stream = UnixStream::connect(socket_path(name))?;
    Ok(Box::new(stream))
}

fn socket_path(name: &str) -> std::path::PathBuf {
    if name.contains('/') {
        std::path::PathBuf::from(name)
    } else {
        std::env::temp_dir().join(format!("{name}.sock"))
    }
}

#[cfg(target_os = "linux")]
fn peer_pid(stream: &UnixStream) -> u32 {
    use std::os::linux::net::UnixStreamExt;
    stream
        .peer_cred()
        .ok()
        .and_then(|cred| cred.pid())
        .map(|pid| pid as u32)
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn peer_pid(_stream: &UnixStream) -> u32 {
    0
}
