//! In-memory stream markers (§3): allocated at most once per open
//! stream, keyed by the opaque per-open stream identity the platform
//! layer assigns.

use std::collections::HashMap;
use std::sync::Mutex;

/// Copied from the `StubRecord` at post-open time (§4.1.2 step 8), so
/// the pipeline never has to re-read the reparse payload once a marker
/// is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMarker {
    pub remote_size: i64,
    pub remote_path: String,
    pub use_helper: bool,
}

/// A registry of markers keyed by stream identity. Concurrent installers
/// racing to mark the same stream must detect the pre-existing marker
/// and discard their own (§3 lifecycle).
#[derive(Default)]
pub struct StreamMarkerTable {
    markers: Mutex<HashMap<u64, StreamMarker>>,
}

impl StreamMarkerTable {
    pub fn new() -> Self {
        StreamMarkerTable::default()
    }

    /// Installs `marker` for `stream_id` unless one is already present;
    /// returns the marker that ended up installed (the racing winner's).
    pub fn install_if_absent(&self, stream_id: u64, marker: StreamMarker) -> StreamMarker {
        let mut markers = self.markers.lock().unwrap();
        markers.entry(stream_id).or_insert(marker).clone()
    }

    pub fn get(&self, stream_id: u64) -> Option<StreamMarker> {
        self.markers.lock().unwrap().get(&stream_id).cloned()
    }

    pub fn remove(&self, stream_id: u64) -> Option<StreamMarker> {
        self.markers.lock().unwrap().remove(&stream_id)
    }
}
