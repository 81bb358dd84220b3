use avbrowse_packet::PacketError;

use crate::pdu::PduId;

/// Errors that can occur while assembling or disassembling browsing frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PduError {
    /// The frame is smaller than the operation's minimum size.
    #[error("{pdu} frame too short ({size} bytes, min {min})")]
    ShortFrame { pdu: PduId, size: usize, min: usize },

    /// A field would read past the end of the frame.
    #[error("{field} needs {needed} bytes, {remaining} remain")]
    FieldOverrun {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A string field uses a character set other than UTF-8.
    #[error("{pdu} response uses character set {character_set_id:#06x}, expected UTF-8")]
    CharacterSetMismatch { pdu: PduId, character_set_id: u16 },

    /// The frame carries a different operation than the one being decoded.
    #[error("expected {expected} frame, found pdu id {found:#04x}")]
    UnexpectedPdu { expected: PduId, found: u8 },

    /// The PDU id is not a browsing operation.
    #[error("unknown pdu id {0:#04x}")]
    UnknownPdu(u8),

    /// A folder listing contains an item type outside the known set.
    #[error("unknown item type {0:#04x}")]
    UnknownItemType(u8),

    /// A field value is outside its valid range.
    #[error("invalid {field}: {value:#x}")]
    InvalidParameter { field: &'static str, value: u64 },

    /// An attribute list does not fit its one-byte count.
    #[error("too many attributes ({count}, max {max})")]
    TooManyAttributes { count: usize, max: usize },

    /// A packet operation failed (allocation, capacity).
    #[error(transparent)]
    Packet(#[from] PacketError),
}

pub type Result<T> = std::result::Result<T, PduError>;
