//! Codec for the on-disk stub reparse payload (§4.2, §6).
//!
//! ```text
//! u32    tag          = 0x00000340
//! u16    data_length  = length of body
//! u16    reserved     = 0
//! u8[16] guid         = STUB_GUID
//! body:
//!   i64    remote_size   little-endian
//!   utf16le remote_path  NUL-terminated
//!   u8     use_helper    optional, default 0
//! ```
//!
//! A file is recognized as a stub only if both `tag` and `guid` match
//! (§4.2). The `Read` operation is split into header/body stages by the
//! caller (a header-only probe to learn `data_length`, then a full read);
//! this module only ever sees the already-separated `(tag, guid, body)`
//! triple or produces the full on-disk buffer via [`ReparseBuffer::encode`].

use tetherfs_dtyp::binrw_util::prelude::Guid;

use crate::error::{Result, WireError};

/// This implementation's reparse tag (§6), matching
/// `tetherfs_fscc::STUB_REPARSE_TAG`. Duplicated here (rather than a crate
/// dependency on `tetherfs-fscc`) because the wire codec has no other need
/// for the fscc vocabulary.
pub const STUB_REPARSE_TAG: u32 = 0x0000_0340;

/// This implementation's GUID (§4.2: "a 16-byte GUID unique to this
/// implementation"), pinned to a fixed constant so on-disk stubs always
/// carry the same value.
pub const STUB_GUID: Guid = Guid::from_fields(
    0x7a4e_1c02,
    0x9b3d,
    0x4e6a,
    [0x8f, 0x21, 0x5d, 0x6c, 0x0a, 0x3e, 0x9b, 0x44],
);

/// A decoded stub payload (§3 `StubRecord`, minus the tag/GUID that
/// identified it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubPayload {
    pub remote_size: i64,
    pub remote_path: String,
    pub use_helper: bool,
}

impl StubPayload {
    /// Encodes the body (everything after `guid` in the on-disk layout).
    pub fn encode_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(8 + self.remote_path.len() * 2 + 2 + 1);
        body.extend_from_slice(&self.remote_size.to_le_bytes());
        for unit in self.remote_path.encode_utf16() {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        body.extend_from_slice(&0u16.to_le_bytes());
        body.push(self.use_helper as u8);
        body
    }

    /// Decodes a body previously separated from its `(tag, guid)` pair by
    /// the caller. `tag`/`guid` are validated here so every decode path
    /// goes through the same tag-and-GUID check (§4.2).
    ///
    /// Fails with [`WireError::NotAStub`] on tag/GUID mismatch and
    /// [`WireError::InvalidStubData`] if the body is shorter than the
    /// declared path (missing size field, unterminated path string).
    pub fn decode(tag: u32, guid: Guid, body: &[u8]) -> Result<Self> {
        if tag != STUB_REPARSE_TAG || guid != STUB_GUID {
            return Err(WireError::NotAStub);
        }

        if body.len() < 8 {
            return Err(WireError::InvalidStubData("body shorter than remote_size field"));
        }
        let remote_size = i64::from_le_bytes(body[0..8].try_into().unwrap());

        let rest = &body[8..];
        let mut units = Vec::new();
        let mut offset = 0usize;
        loop {
            if offset + 2 > rest.len() {
                return Err(WireError::InvalidStubData("remote_path is not NUL-terminated"));
            }
            let unit = u16::from_le_bytes([rest[offset], rest[offset + 1]]);
            offset += 2;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        let remote_path = String::from_utf16_lossy(&units);

        // use_helper is an optional extension byte; absent ⇒ false (§4.2).
        let use_helper = rest.get(offset).copied().unwrap_or(0) != 0;

        Ok(StubPayload {
            remote_size,
            remote_path,
            use_helper,
        })
    }
}

/// The full on-disk reparse buffer, including the header fields that
/// identify it as this implementation's stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparseBuffer {
    pub tag: u32,
    pub guid: Guid,
    pub payload: StubPayload,
}

impl ReparseBuffer {
    pub fn new(payload: StubPayload) -> Self {
        ReparseBuffer {
            tag: STUB_REPARSE_TAG,
            guid: STUB_GUID,
            payload,
        }
    }

    /// Encodes the complete on-disk buffer: `tag`, `data_length`,
    /// `reserved`, `guid`, then the body.
    pub fn encode(&self) -> Vec<u8> {
        let body = self.payload.encode_body();
        let mut out = Vec::with_capacity(24 + body.len());
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.guid.to_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Decodes a complete on-disk buffer, as read in one shot after the
    /// header-only probe that learned its total length (§4.2 Read).
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 24 {
            return Err(WireError::InvalidStubData("buffer shorter than fixed header"));
        }
        let tag = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let data_length = u16::from_le_bytes(buf[4..6].try_into().unwrap()) as usize;
        // buf[6..8] is reserved, ignored.
        let guid_bytes: [u8; 16] = buf[8..24].try_into().unwrap();
        let guid = Guid::from_fields(
            u32::from_le_bytes(guid_bytes[0..4].try_into().unwrap()),
            u16::from_le_bytes(guid_bytes[4..6].try_into().unwrap()),
            u16::from_le_bytes(guid_bytes[6..8].try_into().unwrap()),
            guid_bytes[8..16].try_into().unwrap(),
        );

        let body = &buf[24..];
        if body.len() < data_length {
            return Err(WireError::InvalidStubData("body shorter than declared data_length"));
        }
        let payload = StubPayload::decode(tag, guid, &body[..data_length])?;
        Ok(ReparseBuffer { tag, guid, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StubPayload {
        StubPayload {
            remote_size: 307_200,
            remote_path: "\\\\server\\share\\file.bin".to_string(),
            use_helper: false,
        }
    }

    #[test]
    fn encode_decode_round_trips() {
        let buf = ReparseBuffer::new(sample());
        let encoded = buf.encode();
        let decoded = ReparseBuffer::decode(&encoded).unwrap();
        assert_eq!(decoded, buf);
    }

    #[test]
    fn use_helper_round_trips_when_true() {
        let mut payload = sample();
        payload.use_helper = true;
        let buf = ReparseBuffer::new(payload);
        let decoded = ReparseBuffer::decode(&buf.encode()).unwrap();
        assert!(decoded.payload.use_helper);
    }

    #[test]
    fn missing_use_helper_byte_defaults_to_false() {
        // Older layout: body ends right after the NUL terminator, no
        // trailing use_helper byte.
        let payload = sample();
        let mut body = payload.encode_body();
        body.pop(); // drop the extension byte entirely
        let decoded = StubPayload::decode(STUB_REPARSE_TAG, STUB_GUID, &body).unwrap();
        assert!(!decoded.use_helper);
    }

    #[test]
    fn tag_mismatch_is_not_a_stub() {
        let err = StubPayload::decode(0xdead_beef, STUB_GUID, &sample().encode_body()).unwrap_err();
        assert!(matches!(err, WireError::NotAStub));
    }

    #[test]
    fn guid_mismatch_is_not_a_stub() {
        let other = Guid::from_fields(0, 0, 0, [0; 8]);
        let err = StubPayload::decode(STUB_REPARSE_TAG, other, &sample().encode_body()).unwrap_err();
        assert!(matches!(err, WireError::NotAStub));
    }

    #[test]
    fn truncated_path_is_invalid_stub_data() {
        let mut body = sample().encode_body();
        body.truncate(10); // cuts the NUL-terminated path short
        let err = StubPayload::decode(STUB_REPARSE_TAG, STUB_GUID, &body).unwrap_err();
        assert!(matches!(err, WireError::InvalidStubData(_)));
    }

    #[test]
    fn empty_remote_size_field_is_invalid() {
        let err = StubPayload::decode(STUB_REPARSE_TAG, STUB_GUID, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, WireError::InvalidStubData(_)));
    }
}
