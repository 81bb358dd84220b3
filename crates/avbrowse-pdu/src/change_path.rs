use serde::Serialize;

use crate::error::Result;
use crate::pdu::{Pdu, PduId};
use crate::reader::FieldReader;
use crate::types::{Direction, StatusCode};
use crate::writer::FieldWriter;

/// Move one level up, or down into `folder_uid`, in the browsed player's
/// virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePathCommand {
    pub uid_counter: u16,
    pub direction: Direction,
    /// Ignored by the target when moving up.
    pub folder_uid: u64,
}

impl Pdu for ChangePathCommand {
    const PDU_ID: PduId = PduId::ChangePath;
    const MIN_PARAMETER_LENGTH: usize = 2 + 1 + 8;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u16(self.uid_counter)?;
        writer.put_u8(self.direction as u8)?;
        writer.put_u64(self.folder_uid)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let uid_counter = reader.u16("uid counter")?;
        let direction = Direction::try_from(reader.u8("direction")?)?;
        let folder_uid = reader.u64("folder uid")?;
        Ok(Self {
            uid_counter,
            direction,
            folder_uid,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangePathResponse {
    pub status: u8,
    /// Items in the folder that is now current.
    pub number_of_items: u32,
}

impl ChangePathResponse {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status)
    }
}

impl Pdu for ChangePathResponse {
    const PDU_ID: PduId = PduId::ChangePath;
    const MIN_PARAMETER_LENGTH: usize = 1 + 4;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u8(self.status)?;
        writer.put_u32(self.number_of_items)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            status: reader.u8("status")?,
            number_of_items: reader.u32("number of items")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PduError;
    use avbrowse_packet::Packet;

    #[test]
    fn test_command_layout() {
        let cmd = ChangePathCommand {
            uid_counter: 0x0A0B,
            direction: Direction::Down,
            folder_uid: 0x1122_3344_5566_7788,
        };
        let mut packet = cmd.assemble().unwrap();
        assert_eq!(
            packet.to_vec().unwrap(),
            vec![
                0x02, 0x00, 0x0B, 0x0A, 0x0B, 0x01, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88
            ]
        );
        assert_eq!(packet.size(), ChangePathCommand::min_frame_size());
        assert_eq!(ChangePathCommand::disassemble(&mut packet).unwrap(), cmd);
    }

    #[test]
    fn test_command_rejects_reserved_direction() {
        let mut packet =
            Packet::from_slice(&[0x02, 0x00, 0x0B, 0x00, 0x01, 0x02, 0, 0, 0, 0, 0, 0, 0, 1])
                .unwrap();
        assert_eq!(
            ChangePathCommand::disassemble(&mut packet).unwrap_err(),
            PduError::InvalidParameter {
                field: "direction",
                value: 2
            }
        );
    }

    #[test]
    fn test_response_hand_built_frame() {
        let mut packet =
            Packet::from_slice(&[0x02, 0x00, 0x05, 0x04, 0x00, 0x00, 0x01, 0x00]).unwrap();
        let response = ChangePathResponse::disassemble(&mut packet).unwrap();
        assert_eq!(response.status_code(), Some(StatusCode::NoError));
        assert_eq!(response.number_of_items, 256);
    }

    #[test]
    fn test_response_short_frame_boundary() {
        let frame = [0x02, 0x00, 0x05, 0x04, 0x00, 0x00, 0x00, 0x09];
        assert_eq!(ChangePathResponse::min_frame_size(), 8);
        assert!(ChangePathResponse::disassemble(&mut Packet::from_slice(&frame).unwrap()).is_ok());
        assert!(matches!(
            ChangePathResponse::disassemble(&mut Packet::from_slice(&frame[..7]).unwrap()),
            Err(PduError::ShortFrame { min: 8, size: 7, .. })
        ));
    }
}
