//! Chunked pipelined copier (§4.4): streams a stub's declared remote size
//! from a source read endpoint into the target file's write endpoint,
//! with read/write overlap and adaptive buffering.
//!
//! The source algorithm drives a ring of chunks with two virtual cursors
//! (`R`/`W`) advanced by Windows overlapped-I/O completions. This crate
//! has no kernel-mode completion ports to drive, so the same shape —
//! bounded look-ahead, strict write ordering, adaptive growth past a
//! misreported size — is built out of a plain thread-plus-channel idiom
//! instead: a reader thread filling a bounded channel (the ring, capped
//! at [`MAX_CHUNKS`]) while the calling thread drains and writes it in
//! order. A `sync_channel` enforces both the bound and the ordering for
//! free; the reader thread is the `R` cursor, the caller is `W`.

use std::io::{Read, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// §4.4 tunables.
pub const CHUNK_SIZE: usize = 128 * 1024;
pub const MAX_CHUNKS: usize = 4;
pub const IO_TIMEOUT: Duration = Duration::from_secs(15);

enum ReaderMessage {
    Chunk(Vec<u8>),
    Eof,
    Failed(std::io::Error),
}

/// Streams bytes from `source` into `target`. `declared_size` is the
/// stub's authoritative `remote_size` (§3); the target is assumed to
/// already be extended to that length (§4.4 step 1, performed by the
/// caller via [`crate::platform::Platform::extend_target`] before this is
/// called).
///
/// Returns the total bytes actually written, which can exceed
/// `declared_size` when the source reports fewer bytes than it actually
/// holds (§4.4 correctness properties, §8 scenario 5) — the ring keeps
/// reading full-size chunks past the declared length until the source
/// itself signals end-of-file.
///
/// Any I/O failure (other than end-of-file) aborts the copy; the target
/// is left with whatever was written so far and the caller must not
/// clear the stub (§4.4 failure model).
pub fn copy(
    mut source: Box<dyn Read + Send>,
    mut target: Box<dyn Write + Send>,
    declared_size: i64,
) -> Result<u64> {
    // Bounding the channel to MAX_CHUNKS - 1 in-flight sends caps the
    // ring at MAX_CHUNKS buffers total (one more is always being filled
    // by the reader thread) — §4.4 "the ring is bounded to MaxChunks".
    let (tx, rx) = mpsc::sync_channel::<ReaderMessage>(MAX_CHUNKS.saturating_sub(1));

    let reader = thread::spawn(move || {
        let mut remaining = declared_size;
        loop {
            // `remaining > 0` sizes the next chunk to what's still
            // declared outstanding; once it drops to zero (or the source
            // turns out to hold more than declared) a full-size chunk is
            // requested and the real EOF decides when to stop (§4.4
            // "remaining is renormalized ... when it would otherwise go
            // non-positive before EOF").
            let want = if remaining > 0 {
                (remaining as usize).min(CHUNK_SIZE)
            } else {
                CHUNK_SIZE
            };
            let mut buf = vec![0u8; want];
            match read_fully_or_eof(&mut *source, &mut buf) {
                Ok(0) => {
                    let _ = tx.send(ReaderMessage::Eof);
                    return;
                }
                Ok(n) => {
                    remaining -= n as i64;
                    buf.truncate(n);
                    let hit_eof = n < want;
                    if tx.send(ReaderMessage::Chunk(buf)).is_err() {
                        // Writer gave up (timeout or I/O failure); stop reading.
                        return;
                    }
                    if hit_eof {
                        let _ = tx.send(ReaderMessage::Eof);
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.send(ReaderMessage::Failed(e));
                    return;
                }
            }
        }
    });

    let outcome = drain_and_write(&rx, &mut target);

    // Ring teardown: dropping the receiver makes the reader's next send
    // fail immediately if it's still running, then join it so no chunk
    // buffer outlives its (now-abandoned) read (§5 memory discipline).
    drop(rx);
    let _ = reader.join();

    outcome
}

fn drain_and_write(
    rx: &mpsc::Receiver<ReaderMessage>,
    target: &mut (dyn Write + Send),
) -> Result<u64> {
    let mut bytes_copied: u64 = 0;
    loop {
        match rx.recv_timeout(IO_TIMEOUT) {
            Ok(ReaderMessage::Chunk(buf)) => {
                target.write_all(&buf).map_err(Error::IoFailure)?;
                bytes_copied += buf.len() as u64;
            }
            Ok(ReaderMessage::Eof) => break,
            Ok(ReaderMessage::Failed(e)) => return Err(Error::IoFailure(e)),
            Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout),
            // The reader thread panicked or dropped its sender without
            // signaling EOF; treat like EOF since nothing more is coming.
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    target.flush().map_err(Error::IoFailure)?;
    Ok(bytes_copied)
}

/// Reads until `buf` is full or the source hits EOF, looping past
/// `Interrupted` the way a direct syscall wrapper would.
fn read_fully_or_eof(source: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);
    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn cold_fetch_of_300kib_stub_copies_all_bytes() {
        let size = 300 * 1024;
        let data: Vec<u8> = (0..size as u32).map(|i| (i % 251) as u8).collect();
        let out = Arc::new(Mutex::new(Vec::new()));
        let bytes_copied = copy(
            Box::new(Cursor::new(data.clone())),
            Box::new(SharedBuf(out.clone())),
            size as i64,
        )
        .unwrap();
        assert_eq!(bytes_copied, size as u64);
        assert_eq!(*out.lock().unwrap(), data);
    }

    #[test]
    fn empty_stub_copies_zero_bytes() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let bytes_copied = copy(Box::new(Cursor::new(Vec::new())), Box::new(SharedBuf(out.clone())), 0).unwrap();
        assert_eq!(bytes_copied, 0);
        assert!(out.lock().unwrap().is_empty());
    }

    #[test]
    fn source_misreporting_size_copies_actual_length() {
        // Declared S = 12, actual source is 25 bytes (§8 scenario 5).
        let data: Vec<u8> = (0..25u8).collect();
        let out = Arc::new(Mutex::new(Vec::new()));
        let bytes_copied = copy(Box::new(Cursor::new(data.clone())), Box::new(SharedBuf(out.clone())), 12).unwrap();
        assert_eq!(bytes_copied, 25);
        assert_eq!(*out.lock().unwrap(), data);
    }

    #[test]
    fn source_shorter_than_declared_stops_at_actual_eof() {
        let data: Vec<u8> = (0..10u8).collect();
        let out = Arc::new(Mutex::new(Vec::new()));
        let bytes_copied = copy(Box::new(Cursor::new(data.clone())), Box::new(SharedBuf(out.clone())), 1000).unwrap();
        assert_eq!(bytes_copied, 10);
        assert_eq!(*out.lock().unwrap(), data);
    }

    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("source went away"))
        }
    }

    #[test]
    fn source_io_error_aborts_copy() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let err = copy(Box::new(FailingReader), Box::new(SharedBuf(out.clone())), 100).unwrap_err();
        assert!(matches!(err, Error::IoFailure(_)));
        assert!(out.lock().unwrap().is_empty());
    }
}
