//! Narrow error enum for the two wire formats this crate codecs: the stub
//! reparse payload (§4.2/§6) and the helper-channel envelope (§4.5/§6).
//!
//! `tetherfs-core` composes this into its umbrella `Error` via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error decoding wire data: {0}")]
    Io(#[from] std::io::Error),

    /// The reparse tag or GUID did not match this implementation's stub
    /// signature. Benign: callers treat this as "no work" (§7).
    #[error("file does not carry this implementation's stub reparse tag")]
    NotAStub,

    /// The tag/GUID matched but the payload itself was malformed (too
    /// short, unterminated path, ...).
    #[error("stub reparse payload is malformed: {0}")]
    InvalidStubData(&'static str),

    /// A helper-channel envelope claimed a `data_length` the supplied
    /// buffer could not back.
    #[error("buffer too small for declared data_length ({needed} needed, {available} available)")]
    BufferTooSmall { needed: usize, available: usize },

    /// A helper-channel payload failed a fixed-size decode (e.g. a
    /// `SetOperationMode` body shorter than 4 bytes).
    #[error("malformed helper-channel payload: {0}")]
    MalformedPayload(&'static str),
}

pub type Result<T> = std::result::Result<T, WireError>;
