//! Query-file-information classes and structures the spoofing logic in
//! §4.1.4 reads and rewrites.
//!
//! [MS-FSCC 2.4](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/4718fc40-e539-4014-8e33-b675af74e3e1>)

use binrw::prelude::*;

use tetherfs_dtyp::binrw_util::prelude::*;

use crate::FileAttributes;
use crate::common_info::FileBasicInformation;

/// The subset of `FILE_INFORMATION_CLASS` values the pipeline's metadata
/// spoofing cares about (§4.1.4). Numbering matches MS-FSCC 2.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueryFileInfoClass {
    Basic = 4,
    Standard = 5,
    EndOfFile = 20,
    NetworkOpen = 34,
    AttributeTag = 35,
    All = 18,
}

impl QueryFileInfoClass {
    /// Classes whose `end_of_file` field is substituted with the stub's
    /// `remote_size` when the on-disk value is zero (§4.1.4, first bullet).
    pub fn substitutes_end_of_file(self) -> bool {
        matches!(
            self,
            QueryFileInfoClass::All
                | QueryFileInfoClass::Standard
                | QueryFileInfoClass::EndOfFile
                | QueryFileInfoClass::NetworkOpen
        )
    }

    /// Classes whose reported attributes have the offline/reparse-point
    /// signature cleared (§4.1.4, second bullet).
    pub fn clears_stub_attribute_bits(self) -> bool {
        matches!(
            self,
            QueryFileInfoClass::All
                | QueryFileInfoClass::Basic
                | QueryFileInfoClass::NetworkOpen
                | QueryFileInfoClass::AttributeTag
        )
    }
}

/// [MS-FSCC 2.4.41](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/6069f8c0-c93f-43a0-a5b4-9ec454bd51ff>)
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStandardInformation {
    pub allocation_size: u64,
    pub end_of_file: u64,
    pub number_of_links: u32,
    #[bw(calc = (*delete_pending).into())]
    #[br(map = |v: u8| v != 0)]
    delete_pending: u8,
    #[bw(calc = (*directory).into())]
    #[br(map = |v: u8| v != 0)]
    directory: u8,
    #[bw(calc = 0)]
    #[br(temp)]
    _reserved: u16,
}

impl FileStandardInformation {
    pub fn delete_pending(&self) -> bool {
        self.delete_pending != 0
    }
}

/// [MS-FSCC 2.4.39](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/41ad6fcb-6fa0-4a93-984d-18b8bbd234bf>)
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNetworkOpenInformation {
    pub creation_time: FileTime,
    pub last_access_time: FileTime,
    pub last_write_time: FileTime,
    pub change_time: FileTime,
    pub allocation_size: u64,
    pub end_of_file: u64,
    pub file_attributes: FileAttributes,
    #[bw(calc = 0)]
    #[br(temp)]
    _reserved: u32,
}

/// [MS-FSCC 2.4.6](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/d4d8cf4d-37bc-4d88-b5a3-06b4b0fa1cf2>)
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEndOfFileInformation {
    pub end_of_file: u64,
}

/// [MS-FSCC 2.4.10](<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-fscc/d295752f-ce89-4e7d-a654-59f139049034>)
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributeTagInformation {
    pub file_attributes: FileAttributes,
    pub reparse_tag: u32,
}

/// Composite structure returned for [`QueryFileInfoClass::All`]; fields not
/// relevant to spoofing are omitted relative to the full MS-FSCC layout.
#[binrw::binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAllInformation {
    pub basic: FileBasicInformation,
    pub standard: FileStandardInformation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_class_substitutes_and_clears() {
        assert!(QueryFileInfoClass::All.substitutes_end_of_file());
        assert!(QueryFileInfoClass::All.clears_stub_attribute_bits());
    }

    #[test]
    fn attribute_tag_clears_but_does_not_substitute() {
        assert!(QueryFileInfoClass::AttributeTag.clears_stub_attribute_bits());
        assert!(!QueryFileInfoClass::AttributeTag.substitutes_end_of_file());
    }

    #[test]
    fn end_of_file_substitutes_but_does_not_clear() {
        assert!(QueryFileInfoClass::EndOfFile.substitutes_end_of_file());
        assert!(!QueryFileInfoClass::EndOfFile.clears_stub_attribute_bits());
    }
}
