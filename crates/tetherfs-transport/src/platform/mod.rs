//! Platform backend for the helper channel: a Windows named pipe in
//! production, a Unix domain socket everywhere else (used both for
//! non-Windows builds and for portable testing, per SPEC_FULL.md §10.1).

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::PlatformListener;
#[cfg(windows)]
pub use self::windows::connect;

#[cfg(not(windows))]
mod unix;
#[cfg(not(windows))]
pub use self::unix::PlatformListener;
#[cfg(not(windows))]
pub use self::unix::connect;
