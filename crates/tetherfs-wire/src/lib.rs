//! On-the-wire codecs for `tetherfs` (§6): the stub reparse payload
//! (§4.2) and the demand-helper channel's envelope framing (§4.5).
//!
//! This crate owns encoding/decoding only; `tetherfs-transport` owns the
//! channel I/O and `tetherfs-core` owns what the decoded messages mean.

#![forbid(unsafe_code)]

pub mod error;
pub mod helper;
pub mod stub;

pub use error::{Result, WireError};
pub use helper::{
    CloseRemoteRequest, CommandType, ENVELOPE_HEADER_SIZE, Envelope, FetchRemoteReply,
    FetchRemoteRequest, NotificationType, OpenRemoteReply, OpenRemoteRequest,
    SetOperationModePayload, SetReportRatePayload, SetWatchPathsPayload, VersionReply,
};
pub use stub::{ReparseBuffer, STUB_GUID, STUB_REPARSE_TAG, StubPayload};
