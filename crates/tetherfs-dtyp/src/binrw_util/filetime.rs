//! [`FileTime`]: the Windows `FILETIME` wire representation.

use std::time::{Duration, SystemTime};

use binrw::prelude::*;

/// 100-nanosecond intervals since 1601-01-01 00:00:00 UTC, exactly as Windows
/// reports creation/access/write/change times in query-information replies.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FileTime(pub u64);

/// Seconds between the Windows epoch (1601-01-01) and the Unix epoch (1970-01-01).
const EPOCH_DIFFERENCE_SECS: u64 = 11_644_473_600;

impl FileTime {
    pub const ZERO: FileTime = FileTime(0);

    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        let since_windows_epoch =
            since_unix + Duration::from_secs(EPOCH_DIFFERENCE_SECS);
        FileTime(since_windows_epoch.as_nanos() as u64 / 100)
    }

    pub fn to_system_time(self) -> Option<SystemTime> {
        let since_windows_epoch = Duration::from_nanos(self.0 * 100);
        let windows_epoch_secs = Duration::from_secs(EPOCH_DIFFERENCE_SECS);
        let since_unix = since_windows_epoch.checked_sub(windows_epoch_secs)?;
        SystemTime::UNIX_EPOCH.checked_add(since_unix)
    }
}

impl From<SystemTime> for FileTime {
    fn from(value: SystemTime) -> Self {
        FileTime::from_system_time(value)
    }
}
