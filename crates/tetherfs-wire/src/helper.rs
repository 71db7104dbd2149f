//! Codec for the demand-helper channel's command/notification envelopes
//! (§4.5, §6).
//!
//! Every message, in either direction, is a fixed 8-byte header —
//! `{type: u32, data_length: u32}` — followed by `data_length` bytes of
//! typed payload. `tetherfs-transport` owns the framing I/O (reading the
//! header, then exactly `data_length` more bytes); this module only
//! encodes/decodes the bytes on either side of that boundary.

use crate::error::{Result, WireError};

pub const ENVELOPE_HEADER_SIZE: usize = 8;

/// A decoded-but-untyped envelope: the message type code and its raw body.
/// Callers match `msg_type` against [`CommandType`]/[`NotificationType`]
/// and decode the body with the corresponding payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub msg_type: u32,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(msg_type: u32, body: Vec<u8>) -> Self {
        Envelope { msg_type, body }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_SIZE + self.body.len());
        out.extend_from_slice(&self.msg_type.to_le_bytes());
        out.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Decodes a header previously read on its own (`ENVELOPE_HEADER_SIZE`
    /// bytes), returning `(msg_type, data_length)`. The caller reads
    /// `data_length` more bytes and passes them to [`Envelope::new`].
    pub fn decode_header(header: &[u8]) -> Result<(u32, u32)> {
        if header.len() < ENVELOPE_HEADER_SIZE {
            return Err(WireError::BufferTooSmall {
                needed: ENVELOPE_HEADER_SIZE,
                available: header.len(),
            });
        }
        let msg_type = u32::from_le_bytes(header[0..4].try_into().unwrap());
        let data_length = u32::from_le_bytes(header[4..8].try_into().unwrap());
        Ok((msg_type, data_length))
    }
}

/// Client → core commands (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandType {
    GetVersion = 1,
    ReloadPolicy = 2,
    SetOperationMode = 3,
    SetWatchPaths = 4,
    SetReportRate = 5,
}

impl CommandType {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => CommandType::GetVersion,
            2 => CommandType::ReloadPolicy,
            3 => CommandType::SetOperationMode,
            4 => CommandType::SetWatchPaths,
            5 => CommandType::SetReportRate,
            _ => return None,
        })
    }
}

/// Core → client notifications (§4.5). `FetchRemote` is reserved: declared
/// on the wire but never dispatched (§9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NotificationType {
    OpenRemote = 1,
    CloseRemote = 2,
    FetchRemote = 3,
}

impl NotificationType {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => NotificationType::OpenRemote,
            2 => NotificationType::CloseRemote,
            3 => NotificationType::FetchRemote,
            _ => return None,
        })
    }
}

/// `GetVersion` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionReply {
    pub major: u16,
    pub minor: u16,
}

impl VersionReply {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4);
        out.extend_from_slice(&self.major.to_le_bytes());
        out.extend_from_slice(&self.minor.to_le_bytes());
        out
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 4 {
            return Err(WireError::MalformedPayload("GetVersion reply shorter than 4 bytes"));
        }
        Ok(VersionReply {
            major: u16::from_le_bytes(body[0..2].try_into().unwrap()),
            minor: u16::from_le_bytes(body[2..4].try_into().unwrap()),
        })
    }
}

/// `SetOperationMode` payload: the raw bitset (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOperationModePayload {
    pub mode: u32,
}

impl SetOperationModePayload {
    pub fn encode(&self) -> Vec<u8> {
        self.mode.to_le_bytes().to_vec()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 4 {
            return Err(WireError::MalformedPayload("SetOperationMode payload shorter than 4 bytes"));
        }
        Ok(SetOperationModePayload {
            mode: u32::from_le_bytes(body[0..4].try_into().unwrap()),
        })
    }
}

/// `SetReportRate` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetReportRatePayload {
    pub report_rate: u32,
}

impl SetReportRatePayload {
    pub fn encode(&self) -> Vec<u8> {
        self.report_rate.to_le_bytes().to_vec()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 4 {
            return Err(WireError::MalformedPayload("SetReportRate payload shorter than 4 bytes"));
        }
        Ok(SetReportRatePayload {
            report_rate: u32::from_le_bytes(body[0..4].try_into().unwrap()),
        })
    }
}

/// `SetWatchPaths` payload: `path_count: u32` followed by `path_count`
/// NUL-separated UTF-16 strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetWatchPathsPayload {
    pub paths: Vec<String>,
}

impl SetWatchPathsPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.paths.len() as u32).to_le_bytes());
        for path in &self.paths {
            for unit in path.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 4 {
            return Err(WireError::MalformedPayload("SetWatchPaths payload missing path_count"));
        }
        let path_count = u32::from_le_bytes(body[0..4].try_into().unwrap()) as usize;
        let mut offset = 4usize;
        let mut paths = Vec::with_capacity(path_count);
        for _ in 0..path_count {
            let mut units = Vec::new();
            loop {
                if offset + 2 > body.len() {
                    return Err(WireError::MalformedPayload("SetWatchPaths path not NUL-terminated"));
                }
                let unit = u16::from_le_bytes([body[offset], body[offset + 1]]);
                offset += 2;
                if unit == 0 {
                    break;
                }
                units.push(unit);
            }
            paths.push(String::from_utf16_lossy(&units));
        }
        Ok(SetWatchPathsPayload { paths })
    }
}

/// `OpenRemote` request: a single NUL-terminated UTF-16 path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRemoteRequest {
    pub path: String,
}

impl OpenRemoteRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in self.path.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut units = Vec::new();
        let mut offset = 0usize;
        loop {
            if offset + 2 > body.len() {
                return Err(WireError::MalformedPayload("OpenRemote request not NUL-terminated"));
            }
            let unit = u16::from_le_bytes([body[offset], body[offset + 1]]);
            offset += 2;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(OpenRemoteRequest {
            path: String::from_utf16_lossy(&units),
        })
    }
}

/// `OpenRemote` reply: an opaque handle value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRemoteReply {
    pub file_handle: u64,
}

impl OpenRemoteReply {
    pub fn encode(&self) -> Vec<u8> {
        self.file_handle.to_le_bytes().to_vec()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 8 {
            return Err(WireError::MalformedPayload("OpenRemote reply shorter than 8 bytes"));
        }
        Ok(OpenRemoteReply {
            file_handle: u64::from_le_bytes(body[0..8].try_into().unwrap()),
        })
    }
}

/// `CloseRemote` request: the handle value to release. No reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRemoteRequest {
    pub file_handle: u64,
}

impl CloseRemoteRequest {
    pub fn encode(&self) -> Vec<u8> {
        self.file_handle.to_le_bytes().to_vec()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 8 {
            return Err(WireError::MalformedPayload("CloseRemote request shorter than 8 bytes"));
        }
        Ok(CloseRemoteRequest {
            file_handle: u64::from_le_bytes(body[0..8].try_into().unwrap()),
        })
    }
}

/// `FetchRemote` request: reserved (§9 Open Questions) — round-trips but is
/// never dispatched by `tetherfs-core`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRemoteRequest {
    pub path: String,
}

impl FetchRemoteRequest {
    pub fn encode(&self) -> Vec<u8> {
        OpenRemoteRequest {
            path: self.path.clone(),
        }
        .encode()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        Ok(FetchRemoteRequest {
            path: OpenRemoteRequest::decode(body)?.path,
        })
    }
}

/// `FetchRemote` reply: bytes copied. Reserved, same status as the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRemoteReply {
    pub bytes_copied: u64,
}

impl FetchRemoteReply {
    pub fn encode(&self) -> Vec<u8> {
        self.bytes_copied.to_le_bytes().to_vec()
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 8 {
            return Err(WireError::MalformedPayload("FetchRemote reply shorter than 8 bytes"));
        }
        Ok(FetchRemoteReply {
            bytes_copied: u64::from_le_bytes(body[0..8].try_into().unwrap()),
        })
    }
}
