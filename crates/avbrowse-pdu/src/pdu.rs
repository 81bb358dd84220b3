use std::fmt;

use avbrowse_packet::Packet;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{PduError, Result};
use crate::reader::FieldReader;
use crate::writer::FieldWriter;

/// Frame header: pdu id (1) + parameter length (2) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Browsing operation carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PduId {
    SetBrowsedPlayer = 0x01,
    ChangePath = 0x02,
    GetFolderItems = 0x03,
    GetItemAttributes = 0x04,
    GetTotalNumberOfItems = 0x05,
}

impl PduId {
    pub const ALL: [PduId; 5] = [
        PduId::SetBrowsedPlayer,
        PduId::ChangePath,
        PduId::GetFolderItems,
        PduId::GetItemAttributes,
        PduId::GetTotalNumberOfItems,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PduId::SetBrowsedPlayer => "SetBrowsedPlayer",
            PduId::ChangePath => "ChangePath",
            PduId::GetFolderItems => "GetFolderItems",
            PduId::GetItemAttributes => "GetItemAttributes",
            PduId::GetTotalNumberOfItems => "GetTotalNumberOfItems",
        }
    }
}

impl TryFrom<u8> for PduId {
    type Error = PduError;

    fn try_from(value: u8) -> Result<Self> {
        PduId::ALL
            .into_iter()
            .find(|id| *id as u8 == value)
            .ok_or(PduError::UnknownPdu(value))
    }
}

impl From<PduId> for u8 {
    fn from(id: PduId) -> Self {
        id as u8
    }
}

impl fmt::Display for PduId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read the PDU id from the first byte of a frame without consuming it.
pub fn peek_pdu_id(packet: &Packet) -> Result<PduId> {
    let mut id = [0u8; 1];
    if packet.read(&mut id, 0) == 0 {
        return Err(PduError::FieldOverrun {
            field: "pdu id",
            needed: 1,
            remaining: 0,
        });
    }
    PduId::try_from(id[0])
}

/// One side (command or response) of a browsing operation.
///
/// Implementors describe their operands; framing, sizing and the header
/// checks live in the provided [`assemble`](Pdu::assemble) and
/// [`disassemble`](Pdu::disassemble).
pub trait Pdu: Sized {
    const PDU_ID: PduId;

    /// Smallest operand length a well-formed frame can carry.
    const MIN_PARAMETER_LENGTH: usize;

    /// Operand bytes this value encodes to.
    fn parameter_length(&self) -> usize;

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()>;

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self>;

    /// Smallest whole frame, header included.
    fn min_frame_size() -> usize {
        HEADER_SIZE + Self::MIN_PARAMETER_LENGTH
    }

    /// Build a frame sized exactly to header plus operands.
    fn assemble(&self) -> Result<Packet> {
        let parameter_length = self.parameter_length();
        let declared = u16::try_from(parameter_length).map_err(|_| PduError::InvalidParameter {
            field: "parameter length",
            value: parameter_length as u64,
        })?;

        let mut packet = Packet::allocate(0, HEADER_SIZE + parameter_length, 0)?;
        let mut writer = FieldWriter::new(&mut packet);
        writer.put_u8(Self::PDU_ID.into())?;
        writer.put_u16(declared)?;
        self.encode_parameters(&mut writer)?;
        debug_assert_eq!(writer.position(), HEADER_SIZE + parameter_length);

        trace!(pdu = %Self::PDU_ID, parameter_length, "assembled frame");
        Ok(packet)
    }

    /// Decode a frame produced by [`assemble`](Pdu::assemble) or a peer.
    ///
    /// Frames below [`min_frame_size`](Pdu::min_frame_size) fail with
    /// [`PduError::ShortFrame`] before any field is read. The payload is
    /// coalesced in place when it arrived in pieces.
    fn disassemble(packet: &mut Packet) -> Result<Self> {
        let size = packet.size();
        let min = Self::min_frame_size();
        if size < min {
            return Err(PduError::ShortFrame {
                pdu: Self::PDU_ID,
                size,
                min,
            });
        }

        if packet.head_size() == 0 && packet.tail_size() == 0 {
            packet.continuous_payload()?.with_bytes(decode_frame::<Self>)
        } else {
            decode_frame::<Self>(&packet.to_vec()?)
        }
    }
}

fn decode_frame<P: Pdu>(frame: &[u8]) -> Result<P> {
    let mut reader = FieldReader::new(frame);
    let found = reader.u8("pdu id")?;
    if found != u8::from(P::PDU_ID) {
        return Err(PduError::UnexpectedPdu {
            expected: P::PDU_ID,
            found,
        });
    }

    // Operands are bounded by the declared length, never by the frame size.
    let declared = usize::from(reader.u16("parameter length")?);
    let operands = reader.bytes("parameters", declared)?;
    if reader.remaining() > 0 {
        debug!(
            pdu = %P::PDU_ID,
            declared,
            trailing = reader.remaining(),
            "ignoring bytes past the declared parameter length"
        );
    }

    let mut params = FieldReader::new(operands);
    let pdu = P::decode_parameters(&mut params)?;
    if params.remaining() > 0 {
        debug!(pdu = %P::PDU_ID, unread = params.remaining(), "ignoring unread operands");
    }
    Ok(pdu)
}

/// Encode a one-byte count followed by four-byte attribute ids.
pub(crate) fn put_attribute_ids(writer: &mut FieldWriter<'_>, ids: &[u32]) -> Result<()> {
    writer.put_u8(attribute_count(ids.len())?)?;
    for id in ids {
        writer.put_u32(*id)?;
    }
    Ok(())
}

pub(crate) fn read_attribute_ids(reader: &mut FieldReader<'_>) -> Result<Vec<u32>> {
    let count = reader.u8("attribute count")?;
    (0..count).map(|_| reader.u32("attribute id")).collect()
}

pub(crate) fn attribute_count(len: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| PduError::TooManyAttributes {
        count: len,
        max: crate::types::MAX_ATTRIBUTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_ids_round_trip_through_u8() {
        for id in PduId::ALL {
            assert_eq!(PduId::try_from(u8::from(id)).unwrap(), id);
        }
        assert_eq!(PduId::try_from(0x70), Err(PduError::UnknownPdu(0x70)));
        assert_eq!(PduId::SetBrowsedPlayer.to_string(), "SetBrowsedPlayer");
    }

    #[test]
    fn peek_reads_first_byte_only() {
        let packet = Packet::from_slice(&[0x03, 0x00, 0x00]).unwrap();
        assert_eq!(peek_pdu_id(&packet).unwrap(), PduId::GetFolderItems);
        assert_eq!(packet.size(), 3);

        let empty = Packet::empty();
        assert!(matches!(
            peek_pdu_id(&empty),
            Err(PduError::FieldOverrun { field: "pdu id", .. })
        ));
    }
}
