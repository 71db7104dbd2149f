//! Shared wire-level primitives used across the `tetherfs` workspace.
//!
//! Every other crate in the workspace builds its own wire structures out of
//! the types here: UTF-16 string codecs, a Windows `FILETIME` wrapper, and a
//! GUID type, all `binrw`-encodable.

pub mod binrw_util;

pub use binrw_util::prelude::*;
