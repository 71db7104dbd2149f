//! The umbrella error type (§7), composed from the leaf crates' narrow
//! enums via `#[from]`, splitting error responsibility between each leaf
//! crate and this aggregator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied arguments failed validation (§7 `InvalidInput`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The file lacks the recognized stub reparse metadata. Benign —
    /// callers treat this as "no work" (§7).
    #[error("file is not a stub")]
    NotAStub,

    /// Reparse metadata present but malformed.
    #[error("stub reparse data is invalid: {0}")]
    InvalidStubData(String),

    /// Helper-channel framing violation.
    #[error("buffer too small: needed {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("misaligned buffer")]
    MisalignedBuffer,

    /// Helper channel unavailable or unresponsive. `OpenRemote` callers
    /// must prefer the original open error over this one (§7).
    #[error("helper channel disconnected")]
    PortDisconnected,

    #[error("operation timed out")]
    Timeout,

    /// Generic propagated I/O error from source or target (§7
    /// `IoFailure`). Aborts the current fetch; the stub is left in place.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl From<tetherfs_wire::WireError> for Error {
    fn from(e: tetherfs_wire::WireError) -> Self {
        match e {
            tetherfs_wire::WireError::Io(io) => Error::IoFailure(io),
            tetherfs_wire::WireError::NotAStub => Error::NotAStub,
            tetherfs_wire::WireError::InvalidStubData(msg) => Error::InvalidStubData(msg.to_string()),
            tetherfs_wire::WireError::BufferTooSmall { needed, available } => {
                Error::BufferTooSmall { needed, available }
            }
            tetherfs_wire::WireError::MalformedPayload(msg) => Error::InvalidInput(msg.to_string()),
        }
    }
}

impl From<tetherfs_transport::TransportError> for Error {
    fn from(e: tetherfs_transport::TransportError) -> Self {
        match e {
            tetherfs_transport::TransportError::Io(io) => Error::IoFailure(io),
            tetherfs_transport::TransportError::Wire(w) => w.into(),
            tetherfs_transport::TransportError::AlreadyConnected => {
                Error::InvalidInput("helper channel already connected".into())
            }
            tetherfs_transport::TransportError::Closed => Error::PortDisconnected,
            tetherfs_transport::TransportError::PortDisconnected => Error::PortDisconnected,
            tetherfs_transport::TransportError::Timeout => Error::Timeout,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
