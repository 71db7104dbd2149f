//! Transport-local error enum: channel setup and framing failures.
//! `tetherfs-core` composes this into its umbrella `Error` via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error on helper channel: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wire(#[from] tetherfs_wire::WireError),

    /// A connect attempt arrived while a client session was already
    /// `Connected` (§4.5: "at most one client connected at a time").
    #[error("helper channel already has a connected client")]
    AlreadyConnected,

    /// An operation was attempted on a channel that has been closed.
    #[error("helper channel is closed")]
    Closed,

    /// The helper channel is unavailable or unresponsive (§7
    /// `PortDisconnected`/`Timeout`).
    #[error("helper channel disconnected")]
    PortDisconnected,

    #[error("helper channel operation timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, TransportError>;
