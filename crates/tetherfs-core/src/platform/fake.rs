//! An in-memory `Platform` used by tests for the pipeline, copier, and
//! lock table without touching real reparse points or the filesystem.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use super::{Platform, StubRecord};
use crate::error::{Error, Result};

#[derive(Default, Clone)]
struct FakeFile {
    stub: Option<StubRecord>,
    /// Bytes backing the target file once extended/written.
    content: Vec<u8>,
}

type FileTable = Arc<Mutex<HashMap<String, FakeFile>>>;

/// Remote sources are registered separately from target files — a stub
/// at `path` points at `remote_path`, whose bytes live here, possibly
/// diverging in length from the stub's declared `remote_size` to
/// exercise §8 scenario 5 (source misreports size).
#[derive(Default)]
pub struct InMemoryPlatform {
    files: FileTable,
    remotes: Mutex<HashMap<String, Vec<u8>>>,
    deny_source_open: Mutex<bool>,
    /// Handles a fake helper would have opened, keyed by the opaque
    /// handle value returned from a simulated `OpenRemote` (§8 scenario 4).
    helper_handles: Mutex<HashMap<u64, Vec<u8>>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        InMemoryPlatform::default()
    }

    pub fn install_stub(&self, path: &str, stub: StubRecord) {
        self.files.lock().unwrap().entry(path.to_string()).or_default().stub = Some(stub);
    }

    pub fn install_remote(&self, remote_path: &str, bytes: Vec<u8>) {
        self.remotes
            .lock()
            .unwrap()
            .insert(remote_path.to_string(), bytes);
    }

    pub fn has_stub(&self, path: &str) -> bool {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .is_some_and(|f| f.stub.is_some())
    }

    pub fn target_contents(&self, path: &str) -> Vec<u8> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
            .unwrap_or_default()
    }

    /// Makes the next `open_source` call fail, simulating the
    /// access-denied case that triggers the helper fallback (§8
    /// scenario 4).
    pub fn deny_next_source_open(&self) {
        *self.deny_source_open.lock().unwrap() = true;
    }

    /// Registers the bytes a simulated helper-duplicated `handle` should
    /// read back as, for tests exercising the helper fallback path.
    pub fn register_helper_handle(&self, handle: u64, bytes: Vec<u8>) {
        self.helper_handles.lock().unwrap().insert(handle, bytes);
    }
}

impl Platform for InMemoryPlatform {
    fn read_stub(&self, path: &str) -> Result<StubRecord> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .and_then(|f| f.stub.clone())
            .ok_or(Error::NotAStub)
    }

    fn clear_stub(&self, path: &str) -> Result<()> {
        if let Some(file) = self.files.lock().unwrap().get_mut(path) {
            file.stub = None;
        }
        Ok(())
    }

    fn open_source(&self, remote_path: &str) -> Result<Box<dyn Read + Send>> {
        let mut deny = self.deny_source_open.lock().unwrap();
        if *deny {
            *deny = false;
            return Err(Error::IoFailure(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "access denied",
            )));
        }
        let bytes = self
            .remotes
            .lock()
            .unwrap()
            .get(remote_path)
            .cloned()
            .ok_or_else(|| {
                Error::IoFailure(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no remote registered at {remote_path}"),
                ))
            })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn extend_target(&self, path: &str, size: i64) -> Result<Box<dyn Write + Send>> {
        let mut files = self.files.lock().unwrap();
        let file = files.entry(path.to_string()).or_default();
        file.content = vec![0u8; size.max(0) as usize];
        Ok(Box::new(TargetWriter {
            path: path.to_string(),
            files: self.files.clone(),
            offset: 0,
        }))
    }

    fn open_via_duplicated_handle(&self, _source_pid: u32, handle: u64) -> Result<Box<dyn Read + Send>> {
        self.helper_handles
            .lock()
            .unwrap()
            .get(&handle)
            .cloned()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
            .ok_or_else(|| {
                Error::IoFailure(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no helper handle {handle} registered"),
                ))
            })
    }
}

struct TargetWriter {
    path: String,
    files: FileTable,
    offset: usize,
}

impl Write for TargetWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut files = self.files.lock().unwrap();
        let file = files.entry(self.path.clone()).or_default();
        let end = self.offset + buf.len();
        if file.content.len() < end {
            file.content.resize(end, 0);
        }
        file.content[self.offset..end].copy_from_slice(buf);
        self.offset = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_then_write_round_trips_contents() {
        let platform = InMemoryPlatform::new();
        let mut writer = platform.extend_target("C:\\data\\file.bin", 6).unwrap();
        writer.write_all(b"ab").unwrap();
        writer.write_all(b"cdef").unwrap();
        assert_eq!(platform.target_contents("C:\\data\\file.bin"), b"abcdef");
    }

    #[test]
    fn read_stub_on_unmarked_file_is_not_a_stub() {
        let platform = InMemoryPlatform::new();
        assert!(matches!(
            platform.read_stub("C:\\data\\file.bin"),
            Err(Error::NotAStub)
        ));
    }

    #[test]
    fn clear_stub_removes_marker() {
        let platform = InMemoryPlatform::new();
        platform.install_stub(
            "C:\\data\\file.bin",
            StubRecord {
                remote_size: 10,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        assert!(platform.has_stub("C:\\data\\file.bin"));
        platform.clear_stub("C:\\data\\file.bin").unwrap();
        assert!(!platform.has_stub("C:\\data\\file.bin"));
    }
}
