//! File-system-control-code vocabulary the interception pipeline spoofs
//! against: file attributes, reparse tags, the query-information-class
//! structures named in §4.1.4, and the chained directory-enumeration
//! record list.
//!
//! MS-FSCC wire types, narrowed to exactly the classes the pipeline
//! touches.

pub mod chained_list;
pub mod common_info;
pub mod directory_info;
pub mod file_attributes;
pub mod query_file_info;

pub use chained_list::{CHAINED_ITEM_PREFIX_SIZE, ChainedItemList};
pub use common_info::{FileBasicInformation, ReparseTagKind};
pub use directory_info::{DirectoryEntry, DirectoryInformationList};
pub use file_attributes::FileAttributes;
pub use query_file_info::{
    FileAllInformation, FileAttributeTagInformation, FileEndOfFileInformation,
    FileNetworkOpenInformation, FileStandardInformation, QueryFileInfoClass,
};

/// This implementation's reparse tag (§6): `0x00000340`, in the
/// vendor-reserved range below `0x8000_0000`.
pub const STUB_REPARSE_TAG: u32 = 0x0000_0340;
