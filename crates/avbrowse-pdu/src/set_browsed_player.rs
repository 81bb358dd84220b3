use serde::Serialize;

use crate::error::{PduError, Result};
use crate::items::warn_on_charset;
use crate::pdu::{Pdu, PduId};
use crate::reader::FieldReader;
use crate::types::{StatusCode, CHARSET_UTF8};
use crate::writer::{string_len, FieldWriter};

/// Select the player whose content later browsing commands address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetBrowsedPlayerCommand {
    pub player_id: u16,
}

impl SetBrowsedPlayerCommand {
    pub fn new(player_id: u16) -> Self {
        Self { player_id }
    }
}

impl Pdu for SetBrowsedPlayerCommand {
    const PDU_ID: PduId = PduId::SetBrowsedPlayer;
    const MIN_PARAMETER_LENGTH: usize = 2;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u16(self.player_id)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            player_id: reader.u16("player id")?,
        })
    }
}

/// Result of SetBrowsedPlayer: the player's UID counter, item count and the
/// path to its current folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetBrowsedPlayerResponse {
    pub status: u8,
    pub uid_counter: u16,
    pub number_of_items: u32,
    pub character_set_id: u16,
    /// Folder names from the root down; the list length is the folder depth.
    pub folder_names: Vec<String>,
}

impl SetBrowsedPlayerResponse {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status)
    }

    pub fn character_set_mismatch(&self) -> bool {
        self.character_set_id != CHARSET_UTF8
    }

    pub fn foreign_character_set(&self) -> Option<u16> {
        self.character_set_mismatch().then_some(self.character_set_id)
    }
}

impl Pdu for SetBrowsedPlayerResponse {
    const PDU_ID: PduId = PduId::SetBrowsedPlayer;
    // status, uid counter, item count, charset, folder depth
    const MIN_PARAMETER_LENGTH: usize = 1 + 2 + 4 + 2 + 1;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
            + self
                .folder_names
                .iter()
                .map(|name| string_len(name))
                .sum::<usize>()
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        let depth = u8::try_from(self.folder_names.len()).map_err(|_| {
            PduError::InvalidParameter {
                field: "folder depth",
                value: self.folder_names.len() as u64,
            }
        })?;
        writer.put_u8(self.status)?;
        writer.put_u16(self.uid_counter)?;
        writer.put_u32(self.number_of_items)?;
        writer.put_u16(self.character_set_id)?;
        writer.put_u8(depth)?;
        for name in &self.folder_names {
            writer.put_string("folder name", name)?;
        }
        Ok(())
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let status = reader.u8("status")?;
        let uid_counter = reader.u16("uid counter")?;
        let number_of_items = reader.u32("number of items")?;
        let character_set_id = reader.u16("character set")?;
        warn_on_charset("folder name", character_set_id);
        let depth = reader.u8("folder depth")?;
        let folder_names = (0..depth)
            .map(|_| reader.string("folder name"))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            status,
            uid_counter,
            number_of_items,
            character_set_id,
            folder_names,
        })
    }
}
