use avbrowse_packet::{Packet, PacketError};

use crate::error::{PduError, Result};

/// Sequential big-endian writer into a packet's payload.
///
/// The packet is sized before writing starts; running past its payload is a
/// sizing bug and fails with [`PacketError::CapacityExceeded`].
#[derive(Debug)]
pub struct FieldWriter<'a> {
    packet: &'a mut Packet,
    position: usize,
}

impl<'a> FieldWriter<'a> {
    pub fn new(packet: &'a mut Packet) -> Self {
        Self {
            packet,
            position: 0,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        let written = self.packet.write_payload(src, self.position);
        if written != src.len() {
            return Err(PacketError::CapacityExceeded {
                required: self.position + src.len(),
                capacity: self.packet.payload_size(),
            }
            .into());
        }
        self.position += written;
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_slice(&[value])
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    /// Write a two-byte length followed by the text's bytes.
    pub fn put_string(&mut self, field: &'static str, value: &str) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| PduError::InvalidParameter {
            field,
            value: value.len() as u64,
        })?;
        self.put_u16(len)?;
        self.put_slice(value.as_bytes())
    }
}

/// Encoded size of a length-prefixed string.
pub(crate) fn string_len(value: &str) -> usize {
    2 + value.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_fields_big_endian() {
        let mut packet = Packet::allocate(0, 9, 0).unwrap();
        let mut writer = FieldWriter::new(&mut packet);
        writer.put_u8(0x01).unwrap();
        writer.put_u16(0x0203).unwrap();
        writer.put_string("name", "abcd").unwrap();
        assert_eq!(writer.position(), 9);
        assert_eq!(
            packet.to_vec().unwrap(),
            vec![0x01, 0x02, 0x03, 0x00, 0x04, b'a', b'b', b'c', b'd']
        );
    }

    #[test]
    fn overflow_is_a_capacity_error() {
        let mut packet = Packet::allocate(0, 3, 0).unwrap();
        let mut writer = FieldWriter::new(&mut packet);
        writer.put_u16(0xBEEF).unwrap();
        let err = writer.put_u32(1).unwrap_err();
        assert_eq!(
            err,
            PduError::Packet(PacketError::CapacityExceeded {
                required: 6,
                capacity: 3
            })
        );
    }

    #[test]
    fn oversized_string_is_rejected() {
        let mut packet = Packet::allocate(0, 4, 0).unwrap();
        let mut writer = FieldWriter::new(&mut packet);
        let long = "x".repeat(usize::from(u16::MAX) + 1);
        assert!(matches!(
            writer.put_string("name", &long),
            Err(PduError::InvalidParameter { field: "name", .. })
        ));
    }
}
