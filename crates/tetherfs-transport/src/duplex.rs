//! The minimal byte-stream contract a platform backend must provide. Real
//! backends are a Windows named pipe or a Unix domain socket; tests can
//! hand in anything that reads and writes bytes (e.g. a pair of
//! in-memory pipes).

use std::io::{Read, Write};

/// A bidirectional, blocking byte stream. `Send` so a [`HelperSession`]
/// (crate::session) can be handed off to the thread that drives it.
pub trait Duplex: Read + Write + Send {}
impl<T: Read + Write + Send> Duplex for T {}
