use serde::Serialize;
use tracing::trace;

use crate::error::{PduError, Result};
use crate::items::{BrowsableItem, FolderItem, MediaElementItem, MediaPlayerItem};
use crate::pdu::{put_attribute_ids, read_attribute_ids, Pdu, PduId};
use crate::reader::FieldReader;
use crate::types::{Scope, StatusCode};
use crate::writer::FieldWriter;

/// List items `start_item..=end_item` of a scope, asking for the given media
/// attributes on each media element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetFolderItemsCommand {
    pub scope: Scope,
    pub start_item: u32,
    pub end_item: u32,
    pub attributes: Vec<u32>,
}

impl GetFolderItemsCommand {
    /// Operand bytes before the attribute id list.
    pub const FIXED_PARAMETER_LENGTH: usize = 1 + 4 + 4 + 1;

    fn check_range(start_item: u32, end_item: u32) -> Result<()> {
        if start_item > end_item {
            return Err(PduError::InvalidParameter {
                field: "item range",
                value: start_item.into(),
            });
        }
        Ok(())
    }
}

impl Pdu for GetFolderItemsCommand {
    const PDU_ID: PduId = PduId::GetFolderItems;
    const MIN_PARAMETER_LENGTH: usize = Self::FIXED_PARAMETER_LENGTH;

    fn parameter_length(&self) -> usize {
        Self::FIXED_PARAMETER_LENGTH + 4 * self.attributes.len()
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        Self::check_range(self.start_item, self.end_item)?;
        writer.put_u8(self.scope as u8)?;
        writer.put_u32(self.start_item)?;
        writer.put_u32(self.end_item)?;
        put_attribute_ids(writer, &self.attributes)
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let scope = Scope::try_from(reader.u8("scope")?)?;
        let start_item = reader.u32("start item")?;
        let end_item = reader.u32("end item")?;
        Self::check_range(start_item, end_item)?;
        let attributes = read_attribute_ids(reader)?;
        Ok(Self {
            scope,
            start_item,
            end_item,
            attributes,
        })
    }
}

/// A page of folder items. Items keep their wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GetFolderItemsResponse {
    pub status: u8,
    pub uid_counter: u16,
    pub items: Vec<BrowsableItem>,
}

impl GetFolderItemsResponse {
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status)
    }

    /// Media player entries (PlayerList scope).
    pub fn media_players(&self) -> impl Iterator<Item = &MediaPlayerItem> {
        self.items.iter().filter_map(|item| match item {
            BrowsableItem::MediaPlayer(player) => Some(player),
            _ => None,
        })
    }

    /// Folder entries.
    pub fn folders(&self) -> impl Iterator<Item = &FolderItem> {
        self.items.iter().filter_map(|item| match item {
            BrowsableItem::Folder(folder) => Some(folder),
            _ => None,
        })
    }

    /// Media element entries.
    pub fn media_elements(&self) -> impl Iterator<Item = &MediaElementItem> {
        self.items.iter().filter_map(|item| match item {
            BrowsableItem::MediaElement(element) => Some(element),
            _ => None,
        })
    }

    pub fn character_set_mismatch(&self) -> bool {
        self.foreign_character_set().is_some()
    }

    /// First non UTF-8 character set id among the listed items.
    pub fn foreign_character_set(&self) -> Option<u16> {
        self.items.iter().find_map(BrowsableItem::foreign_character_set)
    }
}

impl Pdu for GetFolderItemsResponse {
    const PDU_ID: PduId = PduId::GetFolderItems;
    // status, uid counter, item count
    const MIN_PARAMETER_LENGTH: usize = 1 + 2 + 2;

    fn parameter_length(&self) -> usize {
        Self::MIN_PARAMETER_LENGTH
            + self
                .items
                .iter()
                .map(BrowsableItem::encoded_len)
                .sum::<usize>()
    }

    fn encode_parameters(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        let count = u16::try_from(self.items.len()).map_err(|_| PduError::InvalidParameter {
            field: "number of items",
            value: self.items.len() as u64,
        })?;
        writer.put_u8(self.status)?;
        writer.put_u16(self.uid_counter)?;
        writer.put_u16(count)?;
        for item in &self.items {
            item.encode(writer)?;
        }
        Ok(())
    }

    fn decode_parameters(reader: &mut FieldReader<'_>) -> Result<Self> {
        let status = reader.u8("status")?;
        let uid_counter = reader.u16("uid counter")?;
        let count = reader.u16("number of items")?;
        let items = (0..count)
            .map(|_| BrowsableItem::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        trace!(count, "decoded folder items");

        Ok(Self {
            status,
            uid_counter,
            items,
        })
    }
}
