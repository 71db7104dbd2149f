pub mod boolean;
pub mod filetime;
pub mod guid;
pub mod multi_sz;
pub mod sized_wide_string;

pub mod prelude {
    pub use super::boolean::Boolean;
    pub use super::filetime::FileTime;
    pub use super::guid::Guid;
    pub use super::multi_sz::MultiWSz;
    pub use super::sized_wide_string::{
        SizedWideString, read_sized_wide_string, write_sized_wide_string,
    };
    pub use binrw::NullWideString;
}
