//! [`Guid`]: a 16-byte GUID, used to pin the stub reparse tag to this
//! implementation (§4.2/§6 require tag *and* GUID to match).

use std::fmt;

use binrw::prelude::*;

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Guid {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub fn to_bytes(self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.data4);
        bytes
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::Endian;
    use binrw::io::Cursor;

    const SAMPLE: Guid = Guid::from_fields(
        0x12345678,
        0x9abc,
        0xdef0,
        [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
    );

    #[test]
    fn formats_as_hyphenated_hex() {
        assert_eq!(SAMPLE.to_string(), "12345678-9abc-def0-0102-030405060708");
    }

    #[test]
    fn roundtrips_through_binrw() {
        let mut buf = Vec::new();
        SAMPLE
            .write_options(&mut Cursor::new(&mut buf), Endian::Little, ())
            .unwrap();
        let read = Guid::read_options(&mut Cursor::new(&buf), Endian::Little, ()).unwrap();
        assert_eq!(read, SAMPLE);
    }
}
