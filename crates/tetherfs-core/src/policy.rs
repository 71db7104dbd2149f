//! Process-wide policy state (§4.6): operation mode, trusted-process set,
//! watch-path set, and the sampled-reporting rate. Guarded by a single
//! multi-reader/single-writer lock, exclusive on mutation and shared on
//! read (§5).

use std::collections::HashSet;
use std::sync::RwLock;

use crate::config::ConfigSource;
use crate::error::{Error, Result};

/// `mode ∈ {Disabled, FetchEnabled, WatchEnabled, FetchEnabled|WatchEnabled}`
/// (§3). A plain bitset rather than an external `bitflags` dependency —
/// two bits, four valid combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationMode(u32);

impl OperationMode {
    pub const DISABLED: OperationMode = OperationMode(0);
    pub const FETCH_ENABLED: OperationMode = OperationMode(1);
    pub const WATCH_ENABLED: OperationMode = OperationMode(2);

    pub fn from_bits(bits: u32) -> Self {
        OperationMode(bits & 0b11)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, flag: OperationMode) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::BitOr for OperationMode {
    type Output = OperationMode;
    fn bitor(self, rhs: OperationMode) -> OperationMode {
        OperationMode(self.0 | rhs.0)
    }
}

const MAX_REPORT_RATE: u32 = 10_000;

#[derive(Debug, Default)]
struct PolicyState {
    mode: OperationMode,
    report_rate: u32,
    trusted_processes: HashSet<u64>,
    watch_paths: Vec<String>,
}

/// Case-insensitive UTF-16 path comparison is required everywhere paths
/// are keys (§9) — implemented here via lowercase comparison, since every
/// path this core handles has already been decoded to a Rust `String`
/// by the wire/platform layer.
fn normalize(path: &str) -> String {
    path.to_lowercase()
}

pub struct PolicyStore {
    state: RwLock<PolicyState>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        PolicyStore {
            state: RwLock::new(PolicyState::default()),
        }
    }
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&self, mode: OperationMode) {
        self.state.write().unwrap().mode = mode;
    }

    pub fn get_mode(&self) -> OperationMode {
        self.state.read().unwrap().mode
    }

    pub fn set_report_rate(&self, rate: u32) {
        self.state.write().unwrap().report_rate = rate.min(MAX_REPORT_RATE);
    }

    pub fn report_rate(&self) -> u32 {
        self.state.read().unwrap().report_rate
    }

    /// Returns the configured rate if any ordered prefix in `watch_paths`
    /// matches `path` case-insensitively, else 0 (§4.6).
    pub fn report_rate_for(&self, path: &str) -> u32 {
        let state = self.state.read().unwrap();
        let normalized = normalize(path);
        if state.watch_paths.iter().any(|p| normalized.starts_with(p.as_str())) {
            state.report_rate
        } else {
            0
        }
    }

    /// Rejects `p` unless non-empty and ending in the path separator;
    /// de-duplicates case-insensitively (§4.6).
    pub fn add_watch_path(&self, path: &str) -> Result<()> {
        let trimmed = path.trim_end_matches('\0');
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("watch path must not be empty".into()));
        }
        if !trimmed.ends_with('\\') && !trimmed.ends_with('/') {
            return Err(Error::InvalidInput(
                "watch path must end in the path separator".into(),
            ));
        }
        let normalized = normalize(trimmed);
        let mut state = self.state.write().unwrap();
        if !state.watch_paths.iter().any(|p| normalize(p) == normalized) {
            state.watch_paths.push(trimmed.to_string());
        }
        Ok(())
    }

    pub fn clear_watch_paths(&self) {
        self.state.write().unwrap().watch_paths.clear();
    }

    pub fn watch_paths(&self) -> Vec<String> {
        self.state.read().unwrap().watch_paths.clone()
    }

    pub fn add_trusted_process(&self, id: u64) {
        self.state.write().unwrap().trusted_processes.insert(id);
    }

    pub fn remove_trusted_process(&self, id: u64) {
        self.state.write().unwrap().trusted_processes.remove(&id);
    }

    pub fn is_trusted(&self, id: u64) -> bool {
        self.state.read().unwrap().trusted_processes.contains(&id)
    }

    /// Re-reads report rate, operation mode, and watch-paths atomically
    /// under the policy lock; on failure, forces fail-closed state
    /// (§4.6, §7).
    pub fn reload_from_config(&self, source: &dyn ConfigSource) {
        match source.load() {
            Ok(loaded) => {
                let mut state = self.state.write().unwrap();
                state.mode = loaded.mode;
                state.report_rate = loaded.report_rate.min(MAX_REPORT_RATE);
                state.watch_paths = loaded.watch_paths;
                log::info!(
                    "policy reloaded: mode={:?} report_rate={} watch_paths={}",
                    state.mode,
                    state.report_rate,
                    state.watch_paths.len()
                );
            }
            Err(e) => {
                log::warn!("policy reload failed, forcing fail-closed state: {e}");
                let mut state = self.state.write().unwrap();
                state.mode = OperationMode::DISABLED;
                state.report_rate = 0;
                state.watch_paths.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadedPolicy;

    #[test]
    fn report_rate_clamped_to_10000() {
        let store = PolicyStore::new();
        store.set_report_rate(50_000);
        assert_eq!(store.report_rate(), MAX_REPORT_RATE);
    }

    #[test]
    fn add_watch_path_rejects_missing_separator() {
        let store = PolicyStore::new();
        assert!(store.add_watch_path("C:\\data").is_err());
        assert!(store.add_watch_path("C:\\data\\").is_ok());
    }

    #[test]
    fn add_watch_path_dedupes_case_insensitively() {
        let store = PolicyStore::new();
        store.add_watch_path("C:\\Data\\").unwrap();
        store.add_watch_path("c:\\data\\").unwrap();
        assert_eq!(store.watch_paths().len(), 1);
    }

    #[test]
    fn report_rate_for_matches_prefix_case_insensitively() {
        let store = PolicyStore::new();
        store.set_report_rate(500);
        store.add_watch_path("c:\\data\\").unwrap();
        assert_eq!(store.report_rate_for("C:\\Data\\file.txt"), 500);
        assert_eq!(store.report_rate_for("C:\\Other\\file.txt"), 0);
    }

    #[test]
    fn reload_failure_is_fail_closed() {
        struct Failing;
        impl ConfigSource for Failing {
            fn load(&self) -> Result<LoadedPolicy> {
                Err(Error::IoFailure(std::io::Error::other("boom")))
            }
        }

        let store = PolicyStore::new();
        store.set_mode(OperationMode::FETCH_ENABLED | OperationMode::WATCH_ENABLED);
        store.set_report_rate(9000);
        store.add_watch_path("C:\\data\\").unwrap();

        store.reload_from_config(&Failing);

        assert_eq!(store.get_mode(), OperationMode::DISABLED);
        assert_eq!(store.report_rate(), 0);
        assert!(store.watch_paths().is_empty());
    }
}
