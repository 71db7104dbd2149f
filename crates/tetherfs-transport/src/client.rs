//! The helper channel's client side: the process that wants to drive the
//! core (§4.5 commands) or stand in for remote opens (§4.5 notifications)
//! connects once, as the channel's single permitted client.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::Result;
use crate::platform;
use crate::session::HelperSession;

/// Connects to the well-known channel name. The returned session shares
/// no state with any [`crate::listener::HelperListener`] on this side —
/// the "only one client" invariant is enforced by the server, which
/// refuses the connection at accept time if one is already live.
pub fn connect(name: &str) -> Result<HelperSession> {
    let stream = platform::connect(name)?;
    // The client doesn't know its own "peer" pid in the same sense the
    // listener does; it isn't relevant on this side of the channel.
    Ok(HelperSession::new(stream, Arc::new(AtomicBool::new(true)), std::process::id()))
}
