//! Target-independent surface the algorithmic core runs against (§9:
//! "process-wide globals → explicit context"; §10.1: the `Platform`
//! trait decoupling the pipeline/copier from real syscalls). Grounded on
//! the `dokan`/`winfsp` driver-shim pattern in the reference pack: a
//! thin trait standing in for the minifilter/driver surface, with a
//! real backend and an in-memory fake sharing one interface.

use std::io::{Read, Write};

use tetherfs_wire::StubPayload;

use crate::error::Result;

mod fake;

#[cfg(windows)]
mod windows;

pub use fake::InMemoryPlatform;

#[cfg(windows)]
pub use windows::WindowsPlatform;

/// The stub record attached to a file (§3 `StubRecord`). A thin alias
/// over the wire payload type — this core only consumes and clears
/// records an external tagger created.
pub type StubRecord = StubPayload;

/// Syscalls the pipeline and copier need, kept to exactly the surface
/// §4.2 and §4.4 exercise.
pub trait Platform: Send + Sync {
    /// Reads and decodes the stub reparse payload for `path` (§4.2
    /// Read). Returns `Error::NotAStub` if the file carries no
    /// recognized reparse metadata, `Error::InvalidStubData` if the
    /// payload is malformed.
    fn read_stub(&self, path: &str) -> Result<StubRecord>;

    /// Removes the reparse point and clears `Offline`/`ReparsePoint`/
    /// `NotContentIndexed`, preserving read-only across the operation
    /// (§4.2 Clear). A file with no stub is left unchanged — not an
    /// error.
    fn clear_stub(&self, path: &str) -> Result<()>;

    /// Opens a read endpoint for `remote_path`, used by the copier as
    /// the in-kernel-context source open (§4.4 inputs). Failing with a
    /// platform access-denied error is the trigger for the helper
    /// fallback (§8 scenario 4); callers distinguish that case upstream
    /// via the returned `Error`.
    fn open_source(&self, remote_path: &str) -> Result<Box<dyn Read + Send>>;

    /// Extends the target file to `size` bytes before any chunk is
    /// written (§4.4 step 1), so a peer waiting on the fetch sees the
    /// post-materialization length immediately.
    fn extend_target(&self, path: &str, size: i64) -> Result<Box<dyn Write + Send>>;

    /// Turns a raw handle value the helper opened in its own process
    /// (`source_pid`) into a local read endpoint, by duplicating it into
    /// this process (§4.5 Notifications, §8 scenario 4). Used only when
    /// `open_source` failed and the stub's `use_helper` permits falling
    /// back to the helper channel.
    fn open_via_duplicated_handle(&self, source_pid: u32, handle: u64) -> Result<Box<dyn Read + Send>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_record_alias_matches_wire_payload() {
        let payload = StubPayload {
            remote_size: 10,
            remote_path: "\\\\remote\\share\\f".into(),
            use_helper: false,
        };
        let record: StubRecord = payload.clone();
        assert_eq!(record.remote_size, payload.remote_size);
    }
}
