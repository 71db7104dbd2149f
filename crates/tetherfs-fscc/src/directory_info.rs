//! Directory-enumeration record layout: a chained sequence of
//! `FileFullDirectoryInformation`-shaped entries, walked by §4.1.4's
//! directory-spoofing pass.

use binrw::prelude::*;

use tetherfs_dtyp::binrw_util::prelude::*;

use crate::{ChainedItemList, FileAttributes};

/// One directory-enumeration entry.
///
/// Mirrors `FILE_FULL_DIR_INFORMATION` (MS-FSCC 2.4.14): the fields common
/// to every directory information class, enough for §4.1.4's walk to
/// recognize and clear the stub signature on each entry.
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub creation_time: FileTime,
    pub last_access_time: FileTime,
    pub last_write_time: FileTime,
    pub change_time: FileTime,
    pub end_of_file: u64,
    pub allocation_size: u64,
    pub file_attributes: FileAttributes,
    #[bw(try_calc = file_name.byte_len().try_into())]
    _file_name_length: u32,
    #[br(if(!file_attributes.reparse_point()))]
    pub ea_size: Option<u32>,
    #[br(if(file_attributes.reparse_point()))]
    pub reparse_tag: Option<u32>,
    #[br(parse_with = read_sized_wide_string, args(_file_name_length))]
    #[bw(write_with = write_sized_wide_string)]
    pub file_name: SizedWideString,
}

/// A directory enumeration reply: a chain of [`DirectoryEntry`] records,
/// each prefixed with an offset to the next (0 on the last entry), aligned
/// to 8-byte boundaries per MS-FSCC 2.4.
pub type DirectoryInformationList = ChainedItemList<DirectoryEntry, 8>;

impl DirectoryEntry {
    /// §4.1.4: clear the offline bit on entries whose attributes match the
    /// stub signature and which are neither a directory nor a system file.
    pub fn clear_stub_offline_bit_if_eligible(&mut self) {
        let eligible = self.file_attributes.has_stub_signature()
            && !self.file_attributes.directory()
            && !self.file_attributes.system();
        if eligible {
            self.file_attributes.set_offline(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(attrs: FileAttributes) -> DirectoryEntry {
        DirectoryEntry {
            creation_time: FileTime::ZERO,
            last_access_time: FileTime::ZERO,
            last_write_time: FileTime::ZERO,
            change_time: FileTime::ZERO,
            end_of_file: 0,
            allocation_size: 0,
            file_attributes: attrs,
            ea_size: Some(0),
            reparse_tag: None,
            file_name: SizedWideString::from("stub.txt"),
        }
    }

    #[test]
    fn clears_offline_on_plain_stub_file() {
        let mut entry = entry_with(
            FileAttributes::new()
                .with_offline(true)
                .with_reparse_point(true),
        );
        entry.clear_stub_offline_bit_if_eligible();
        assert!(!entry.file_attributes.offline());
    }

    #[test]
    fn leaves_directories_untouched() {
        let mut entry = entry_with(
            FileAttributes::new()
                .with_offline(true)
                .with_reparse_point(true)
                .with_directory(true),
        );
        entry.clear_stub_offline_bit_if_eligible();
        assert!(entry.file_attributes.offline());
    }

    #[test]
    fn leaves_system_files_untouched() {
        let mut entry = entry_with(
            FileAttributes::new()
                .with_offline(true)
                .with_reparse_point(true)
                .with_system(true),
        );
        entry.clear_stub_offline_bit_if_eligible();
        assert!(entry.file_attributes.offline());
    }
}
