use bytes::Buf;

use crate::error::{PduError, Result};

/// Big-endian field reader over one contiguous frame.
///
/// Every read checks the bytes that remain before touching them, so a length
/// field that claims more than the frame holds surfaces as
/// [`PduError::FieldOverrun`].
#[derive(Debug)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    /// Bytes read so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(PduError::FieldOverrun {
                field,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.ensure(field, 1)?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.ensure(field, 2)?;
        self.consumed += 2;
        Ok(self.buf.get_u16())
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.ensure(field, 4)?;
        self.consumed += 4;
        Ok(self.buf.get_u32())
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64> {
        self.ensure(field, 8)?;
        self.consumed += 8;
        Ok(self.buf.get_u64())
    }

    /// Borrow the next `len` bytes.
    pub fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        self.ensure(field, len)?;
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        self.consumed += len;
        Ok(head)
    }

    /// Read a fixed-size byte array.
    pub fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(field, N)?);
        Ok(out)
    }

    /// Read a two-byte length followed by that many bytes of text.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the character set id
    /// travels separately and is checked by the caller.
    pub fn string(&mut self, field: &'static str) -> Result<String> {
        let len = usize::from(self.u16(field)?);
        let raw = self.bytes(field, len)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_fields_in_order() {
        let frame = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x09,
        ];
        let mut reader = FieldReader::new(&frame);
        assert_eq!(reader.u8("a").unwrap(), 0x01);
        assert_eq!(reader.u16("b").unwrap(), 0x0203);
        assert_eq!(reader.u32("c").unwrap(), 0x0405_0607);
        assert_eq!(reader.u64("d").unwrap(), 0x09);
        assert_eq!(reader.position(), 15);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn overrun_reports_field_and_leaves_reader_in_place() {
        let frame = [0x00, 0x05, b'a', b'b'];
        let mut reader = FieldReader::new(&frame);
        let err = reader.string("name").unwrap_err();
        assert_eq!(
            err,
            PduError::FieldOverrun {
                field: "name",
                needed: 5,
                remaining: 2
            }
        );
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn string_decodes_lossily() {
        let frame = [0x00, 0x03, b'o', 0xFF, b'k'];
        let mut reader = FieldReader::new(&frame);
        assert_eq!(reader.string("name").unwrap(), "o\u{FFFD}k");
    }

    #[test]
    fn array_reads_fixed_width_block() {
        let frame: Vec<u8> = (0..20).collect();
        let mut reader = FieldReader::new(&frame);
        let block: [u8; 16] = reader.array("features").unwrap();
        assert_eq!(block[15], 15);
        assert_eq!(reader.remaining(), 4);
        assert!(reader.array::<16>("features").is_err());
    }
}
