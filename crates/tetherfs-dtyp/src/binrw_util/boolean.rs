//! [`Boolean`] implementation for binrw.

use binrw::{Endian, prelude::*};
use std::io::{Read, Seek, Write};

/// A single-byte boolean. Any non-zero value reads as `true`, matching the
/// `use_helper` extension byte in the stub payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Boolean(bool);

impl BinRead for Boolean {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let value: u8 = u8::read_options(reader, Endian::Little, ())?;
        Ok(Boolean(value != 0))
    }
}

impl BinWrite for Boolean {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _: Endian,
        _: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        let value: u8 = if self.0 { 1 } else { 0 };
        value.write_options(writer, Endian::Little, ())
    }
}

impl From<bool> for Boolean {
    fn from(value: bool) -> Self {
        Boolean(value)
    }
}

impl From<Boolean> for bool {
    fn from(val: Boolean) -> Self {
        val.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn true_roundtrips_as_one() {
        let mut buf = Vec::new();
        Boolean::from(true)
            .write_options(&mut Cursor::new(&mut buf), Endian::Little, ())
            .unwrap();
        assert_eq!(buf, [0x01]);
    }

    #[test]
    fn false_roundtrips_as_zero() {
        let mut buf = Vec::new();
        Boolean::from(false)
            .write_options(&mut Cursor::new(&mut buf), Endian::Little, ())
            .unwrap();
        assert_eq!(buf, [0x00]);
    }

    #[test]
    fn any_nonzero_byte_reads_as_true() {
        let read: Boolean =
            Boolean::read_options(&mut Cursor::new([0x17u8]), Endian::Little, ()).unwrap();
        assert!(bool::from(read));
    }
}
