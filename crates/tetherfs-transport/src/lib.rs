//! Helper-channel listener/client plumbing (§4.5, §6): the framing and
//! connect/accept state machine around the wire codecs in `tetherfs-wire`.
//!
//! One small set of platform backends behind a common constructor, picked
//! by `cfg(windows)` rather than a runtime config enum — there is exactly
//! one real backend per target here.

pub mod client;
pub mod duplex;
pub mod error;
pub mod listener;
pub mod session;

mod platform;

pub use client::connect;
pub use duplex::Duplex;
pub use error::{Result, TransportError};
pub use listener::{ChannelState, HelperListener};
pub use session::HelperSession;
