//! Common file-information-class structures the pipeline reads and rewrites
//! when spoofing a stub's metadata (§4.1.4).
//!
//! [MS-FSCC 2.4](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/4718fc40-e539-4014-8e33-b675af74e3e1>)

use binrw::prelude::*;

use tetherfs_dtyp::binrw_util::prelude::*;

use crate::FileAttributes;

/// Query or Set file information.
///
/// [MS-FSCC 2.4.7](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/16023025-8a78-492f-8b96-c873b042ac50>)
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBasicInformation {
    /// The time when the file was created.
    pub creation_time: FileTime,
    /// The time when the file was last accessed.
    pub last_access_time: FileTime,
    /// The time when data was last written to the file.
    pub last_write_time: FileTime,
    /// The time when the file was last changed.
    pub change_time: FileTime,
    /// The file attributes.
    pub file_attributes: FileAttributes,
    #[bw(calc = 0)]
    #[br(temp)]
    _reserved: u32,
}

/// Reparse tag values this implementation recognizes on disk.
///
/// Each reparse point has a reparse tag that uniquely identifies the
/// implementer of the file-system filter driver associated with the tag.
/// Unlike MS-FSCC's full catalog, this is not exhaustive: the pipeline only
/// ever needs to tell the stub tag apart from "something else".
///
/// [MS-FSCC 2.1.2.1](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/c8e77b37-3909-4fe6-a4ea-2b9d423b1ee4>)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparseTagKind {
    /// Used for mount point support.
    MountPoint,
    /// Used for symbolic link support.
    Symlink,
    /// This implementation's own lazy-materialization stub tag (§6).
    Stub,
    /// A recognized-but-uninteresting tag.
    Other(u32),
}

impl ReparseTagKind {
    pub fn from_raw(tag: u32) -> Self {
        match tag {
            0xA000_0003 => ReparseTagKind::MountPoint,
            0xA000_000C => ReparseTagKind::Symlink,
            crate::STUB_REPARSE_TAG => ReparseTagKind::Stub,
            other => ReparseTagKind::Other(other),
        }
    }
}
