//! A single connected helper-channel client (§4.5).
//!
//! On construction the session captures the peer's process identity and
//! flips the listener's shared `connected` flag so at most one
//! `HelperSession` is ever alive at a time; dropping the session clears
//! the flag again, mirroring §4.5's connect/disconnect symmetry (identity
//! duplicated in, trust added on connect; both undone on disconnect).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tetherfs_wire::Envelope;

use crate::duplex::Duplex;
use crate::error::{Result, TransportError};

pub struct HelperSession {
    stream: Box<dyn Duplex>,
    connected_flag: Arc<AtomicBool>,
    pub peer_pid: u32,
}

impl HelperSession {
    pub fn new(stream: Box<dyn Duplex>, connected_flag: Arc<AtomicBool>, peer_pid: u32) -> Self {
        log::info!("helper channel: client connected (pid {peer_pid})");
        HelperSession {
            stream,
            connected_flag,
            peer_pid,
        }
    }

    /// Sends one framed envelope (§4.5 "every message is a header ...
    /// followed by data_length bytes").
    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.stream.write_all(&envelope.encode())?;
        self.stream.flush()?;
        Ok(())
    }

    /// Blocks for exactly one framed envelope: the fixed 8-byte header,
    /// then `data_length` more bytes.
    pub fn recv(&mut self) -> Result<Envelope> {
        let mut header = [0u8; tetherfs_wire::ENVELOPE_HEADER_SIZE];
        self.stream.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TransportError::PortDisconnected
            } else {
                TransportError::Io(e)
            }
        })?;
        let (msg_type, data_length) = tetherfs_wire::Envelope::decode_header(&header)?;
        let mut body = vec![0u8; data_length as usize];
        self.stream.read_exact(&mut body)?;
        Ok(Envelope::new(msg_type, body))
    }
}

impl Drop for HelperSession {
    fn drop(&mut self) {
        self.connected_flag.store(false, Ordering::SeqCst);
        log::info!("helper channel: client disconnected (pid {})", self.peer_pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// A shared, seekable buffer usable as both ends of a loopback
    /// duplex — enough to exercise framing without a real socket.
    #[derive(Clone)]
    struct LoopbackBuf(Arc<Mutex<Cursor<Vec<u8>>>>);
    impl LoopbackBuf {
        fn new() -> Self {
            LoopbackBuf(Arc::new(Mutex::new(Cursor::new(Vec::new()))))
        }
        fn rewind(&self) {
            self.0.lock().unwrap().set_position(0);
        }
    }
    impl std::io::Read for LoopbackBuf {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().read(buf)
        }
    }
    impl std::io::Write for LoopbackBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.0.lock().unwrap().flush()
        }
    }

    #[test]
    fn send_then_recv_round_trips() {
        let flag = Arc::new(AtomicBool::new(true));
        let buf = LoopbackBuf::new();
        let mut session = HelperSession::new(Box::new(buf.clone()), flag.clone(), 4242);
        session.send(&Envelope::new(1, vec![9, 9, 9])).unwrap();
        buf.rewind();
        let received = session.recv().unwrap();
        assert_eq!(received.msg_type, 1);
        assert_eq!(received.body, vec![9, 9, 9]);
    }

    #[test]
    fn drop_clears_connected_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        {
            let _session = HelperSession::new(Box::new(LoopbackBuf::new()), flag.clone(), 1);
        }
        assert!(!flag.load(Ordering::SeqCst));
    }
}
