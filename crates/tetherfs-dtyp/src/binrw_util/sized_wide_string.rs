//! [`SizedWideString`]: a UTF-16LE string whose length is carried
//! out-of-band (a preceding length field) rather than by a NUL terminator.
//! Used for directory-enumeration file names (MS-FSCC 2.4.14), which are
//! *not* NUL-terminated on the wire.

use std::io::{Read, Seek, Write};

use binrw::{BinResult, Endian};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizedWideString(String);

impl SizedWideString {
    /// Byte length on the wire (no terminator).
    pub fn byte_len(&self) -> usize {
        self.0.encode_utf16().count() * 2
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SizedWideString {
    fn from(value: &str) -> Self {
        SizedWideString(value.to_owned())
    }
}

impl From<String> for SizedWideString {
    fn from(value: String) -> Self {
        SizedWideString(value)
    }
}

impl std::ops::Deref for SizedWideString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `#[br(parse_with = read_sized_wide_string, args(byte_len))]`
pub fn read_sized_wide_string<R: Read + Seek>(
    reader: &mut R,
    _endian: Endian,
    args: (u32,),
) -> BinResult<SizedWideString> {
    let byte_len = args.0 as usize;
    let mut raw = vec![0u8; byte_len];
    reader.read_exact(&mut raw)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    Ok(SizedWideString(String::from_utf16_lossy(&units)))
}

/// `#[bw(write_with = write_sized_wide_string)]`
pub fn write_sized_wide_string<W: Write + Seek>(
    value: &SizedWideString,
    writer: &mut W,
    _endian: Endian,
    _args: (),
) -> BinResult<()> {
    for unit in value.0.encode_utf16() {
        writer.write_all(&unit.to_le_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn roundtrips_byte_length() {
        let value = SizedWideString::from("abc");
        let mut buf = Vec::new();
        write_sized_wide_string(&value, &mut Cursor::new(&mut buf), Endian::Little, ()).unwrap();
        assert_eq!(buf.len(), 6);
        let read =
            read_sized_wide_string(&mut Cursor::new(&buf), Endian::Little, (6,)).unwrap();
        assert_eq!(&*read, "abc");
    }
}
