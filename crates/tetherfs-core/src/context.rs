//! The aggregated core context (§9 "process-wide globals → explicit
//! context"): one value built at startup bundling the singletons the
//! original design keeps as process globals — the policy store, the
//! fetch-lock table, the stream-marker table, the platform shim, the
//! sampled-access reporter, and (once a client connects) the
//! demand-helper bridge.

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::helper_bridge::HelperBridge;
use crate::lock_table::FetchLockTable;
use crate::pipeline::SampledReporter;
use crate::platform::Platform;
use crate::policy::PolicyStore;
use crate::stream_marker::StreamMarkerTable;

pub struct CoreContext {
    pub policy: PolicyStore,
    pub lock_table: FetchLockTable,
    pub stream_markers: StreamMarkerTable,
    pub platform: Arc<dyn Platform>,
    pub reporter: SampledReporter,
    helper: RwLock<Option<Arc<HelperBridge>>>,
}

impl CoreContext {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x9e37_79b9);
        CoreContext {
            policy: PolicyStore::new(),
            lock_table: FetchLockTable::new(),
            stream_markers: StreamMarkerTable::new(),
            platform,
            reporter: SampledReporter::new(seed),
            helper: RwLock::new(None),
        }
    }

    /// Installs the bridge for the channel's one live client (§4.5:
    /// exactly one connection at a time). Replaces any prior bridge,
    /// matching the channel's own connect/disconnect symmetry. The
    /// bridge's peer pid is added to `trusted_processes` so the helper's
    /// own source opens are relaxed rather than intercepted (§8 scenario 4).
    pub fn set_helper(&self, bridge: Arc<HelperBridge>) {
        let mut slot = self.helper.write().unwrap();
        if let Some(previous) = slot.take() {
            self.policy.remove_trusted_process(previous.peer_pid() as u64);
        }
        self.policy.add_trusted_process(bridge.peer_pid() as u64);
        *slot = Some(bridge);
    }

    /// Inverse of [`Self::set_helper`]: removes the departing bridge's
    /// peer pid from `trusted_processes` before dropping the bridge.
    pub fn clear_helper(&self) {
        let mut slot = self.helper.write().unwrap();
        if let Some(bridge) = slot.take() {
            self.policy.remove_trusted_process(bridge.peer_pid() as u64);
        }
    }

    pub fn helper(&self) -> Option<Arc<HelperBridge>> {
        self.helper.read().unwrap().clone()
    }

    pub(crate) fn close_remote_via_helper(&self, handle: u64) -> Result<()> {
        self.helper()
            .ok_or(Error::PortDisconnected)?
            .close_remote(handle)
    }
}
