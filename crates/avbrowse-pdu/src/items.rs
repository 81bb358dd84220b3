//! Entries of a GetFolderItems listing and attribute/value pairs.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PduError, Result};
use crate::pdu::attribute_count;
use crate::reader::FieldReader;
use crate::types::{ItemType, CHARSET_UTF8};
use crate::writer::{string_len, FieldWriter};

/// Fixed part of an attribute/value entry: id (4) + charset (2) + length (2).
const ATTRIBUTE_VALUE_HEADER: usize = 8;

/// One attribute of a media element, as a typed string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeValue {
    pub attribute_id: u32,
    pub character_set_id: u16,
    pub value: String,
}

impl AttributeValue {
    /// A UTF-8 attribute value.
    pub fn utf8(attribute_id: u32, value: impl Into<String>) -> Self {
        Self {
            attribute_id,
            character_set_id: CHARSET_UTF8,
            value: value.into(),
        }
    }

    pub(crate) fn encoded_len(&self) -> usize {
        ATTRIBUTE_VALUE_HEADER + self.value.len()
    }

    pub(crate) fn encode(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer.put_u32(self.attribute_id)?;
        writer.put_u16(self.character_set_id)?;
        writer.put_string("attribute value", &self.value)
    }

    pub(crate) fn decode(reader: &mut FieldReader<'_>) -> Result<Self> {
        let attribute_id = reader.u32("attribute id")?;
        let character_set_id = reader.u16("attribute character set")?;
        warn_on_charset("attribute value", character_set_id);
        let value = reader.string("attribute value")?;
        Ok(Self {
            attribute_id,
            character_set_id,
            value,
        })
    }
}

/// Encode a one-byte count followed by attribute/value entries.
pub(crate) fn put_attribute_values(
    writer: &mut FieldWriter<'_>,
    values: &[AttributeValue],
) -> Result<()> {
    writer.put_u8(attribute_count(values.len())?)?;
    for value in values {
        value.encode(writer)?;
    }
    Ok(())
}

pub(crate) fn read_attribute_values(reader: &mut FieldReader<'_>) -> Result<Vec<AttributeValue>> {
    let count = reader.u8("attribute count")?;
    (0..count).map(|_| AttributeValue::decode(reader)).collect()
}

pub(crate) fn attribute_values_len(values: &[AttributeValue]) -> usize {
    1 + values.iter().map(AttributeValue::encoded_len).sum::<usize>()
}

fn foreign(character_set_id: u16) -> Option<u16> {
    (character_set_id != CHARSET_UTF8).then_some(character_set_id)
}

pub(crate) fn first_foreign_attribute(values: &[AttributeValue]) -> Option<u16> {
    values
        .iter()
        .find_map(|value| foreign(value.character_set_id))
}

pub(crate) fn warn_on_charset(field: &'static str, character_set_id: u16) {
    if character_set_id != CHARSET_UTF8 {
        warn!(field, character_set_id, "non UTF-8 character set");
    }
}

/// A media player entry (PlayerList scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPlayerItem {
    pub player_id: u16,
    pub major_type: u8,
    pub sub_type: u32,
    pub play_status: u8,
    /// Feature bitmask, sent as 16 raw bytes.
    pub features: [u8; 16],
    pub character_set_id: u16,
    pub name: String,
}

/// A folder entry (VirtualFileSystem scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderItem {
    pub uid: u64,
    pub folder_type: u8,
    pub is_playable: bool,
    pub character_set_id: u16,
    pub name: String,
}

/// A playable media entry, with any attributes that were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaElementItem {
    pub uid: u64,
    pub media_type: u8,
    pub character_set_id: u16,
    pub name: String,
    pub attributes: Vec<AttributeValue>,
}

/// One entry of a folder listing, discriminated on the wire by its item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum BrowsableItem {
    MediaPlayer(MediaPlayerItem),
    Folder(FolderItem),
    MediaElement(MediaElementItem),
}

impl BrowsableItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            BrowsableItem::MediaPlayer(_) => ItemType::MediaPlayer,
            BrowsableItem::Folder(_) => ItemType::Folder,
            BrowsableItem::MediaElement(_) => ItemType::MediaElement,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BrowsableItem::MediaPlayer(item) => &item.name,
            BrowsableItem::Folder(item) => &item.name,
            BrowsableItem::MediaElement(item) => &item.name,
        }
    }

    /// Whether the name or any attribute value uses a non UTF-8 charset.
    pub fn character_set_mismatch(&self) -> bool {
        self.foreign_character_set().is_some()
    }

    /// First non UTF-8 character set id in the name or attribute values.
    pub fn foreign_character_set(&self) -> Option<u16> {
        match self {
            BrowsableItem::MediaPlayer(item) => foreign(item.character_set_id),
            BrowsableItem::Folder(item) => foreign(item.character_set_id),
            BrowsableItem::MediaElement(item) => foreign(item.character_set_id)
                .or_else(|| first_foreign_attribute(&item.attributes)),
        }
    }

    /// Bytes after the item length field.
    fn body_len(&self) -> usize {
        match self {
            // player id, major type, sub type, play status, features, charset
            BrowsableItem::MediaPlayer(item) => 2 + 1 + 4 + 1 + 16 + 2 + string_len(&item.name),
            // uid, folder type, playable, charset
            BrowsableItem::Folder(item) => 8 + 1 + 1 + 2 + string_len(&item.name),
            // uid, media type, charset
            BrowsableItem::MediaElement(item) => {
                8 + 1 + 2 + string_len(&item.name) + attribute_values_len(&item.attributes)
            }
        }
    }

    /// Whole entry on the wire: type (1) + length (2) + body.
    pub(crate) fn encoded_len(&self) -> usize {
        3 + self.body_len()
    }

    pub(crate) fn encode(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        let body_len = self.body_len();
        let item_length =
            u16::try_from(body_len).map_err(|_| PduError::InvalidParameter {
                field: "item length",
                value: body_len as u64,
            })?;
        writer.put_u8(self.item_type() as u8)?;
        writer.put_u16(item_length)?;

        match self {
            BrowsableItem::MediaPlayer(item) => {
                writer.put_u16(item.player_id)?;
                writer.put_u8(item.major_type)?;
                writer.put_u32(item.sub_type)?;
                writer.put_u8(item.play_status)?;
                writer.put_slice(&item.features)?;
                writer.put_u16(item.character_set_id)?;
                writer.put_string("player name", &item.name)
            }
            BrowsableItem::Folder(item) => {
                writer.put_u64(item.uid)?;
                writer.put_u8(item.folder_type)?;
                writer.put_u8(u8::from(item.is_playable))?;
                writer.put_u16(item.character_set_id)?;
                writer.put_string("folder name", &item.name)
            }
            BrowsableItem::MediaElement(item) => {
                writer.put_u64(item.uid)?;
                writer.put_u8(item.media_type)?;
                writer.put_u16(item.character_set_id)?;
                writer.put_string("media name", &item.name)?;
                put_attribute_values(writer, &item.attributes)
            }
        }
    }

    pub(crate) fn decode(reader: &mut FieldReader<'_>) -> Result<Self> {
        let item_type = ItemType::try_from(reader.u8("item type")?)?;
        let item_length = usize::from(reader.u16("item length")?);
        let start = reader.position();

        let item = match item_type {
            ItemType::MediaPlayer => {
                let player_id = reader.u16("player id")?;
                let major_type = reader.u8("major player type")?;
                let sub_type = reader.u32("player sub type")?;
                let play_status = reader.u8("play status")?;
                let features = reader.array::<16>("feature bitmask")?;
                let character_set_id = reader.u16("player character set")?;
                warn_on_charset("player name", character_set_id);
                let name = reader.string("player name")?;
                BrowsableItem::MediaPlayer(MediaPlayerItem {
                    player_id,
                    major_type,
                    sub_type,
                    play_status,
                    features,
                    character_set_id,
                    name,
                })
            }
            ItemType::Folder => {
                let uid = reader.u64("folder uid")?;
                let folder_type = reader.u8("folder type")?;
                let is_playable = reader.u8("is playable")? != 0;
                let character_set_id = reader.u16("folder character set")?;
                warn_on_charset("folder name", character_set_id);
                let name = reader.string("folder name")?;
                BrowsableItem::Folder(FolderItem {
                    uid,
                    folder_type,
                    is_playable,
                    character_set_id,
                    name,
                })
            }
            ItemType::MediaElement => {
                let uid = reader.u64("media uid")?;
                let media_type = reader.u8("media type")?;
                let character_set_id = reader.u16("media character set")?;
                warn_on_charset("media name", character_set_id);
                let name = reader.string("media name")?;
                let attributes = read_attribute_values(reader)?;
                BrowsableItem::MediaElement(MediaElementItem {
                    uid,
                    media_type,
                    character_set_id,
                    name,
                    attributes,
                })
            }
        };

        let consumed = reader.position() - start;
        if consumed != item_length {
            debug!(?item_type, item_length, consumed, "item length disagrees with contents");
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avbrowse_packet::Packet;

    fn encode(item: &BrowsableItem) -> Vec<u8> {
        let mut packet = Packet::allocate(0, item.encoded_len(), 0).unwrap();
        let mut writer = FieldWriter::new(&mut packet);
        item.encode(&mut writer).unwrap();
        packet.to_vec().unwrap()
    }

    #[test]
    fn folder_item_layout() {
        let item = BrowsableItem::Folder(FolderItem {
            uid: 0x0102,
            folder_type: 0x01,
            is_playable: true,
            character_set_id: CHARSET_UTF8,
            name: "Rock".into(),
        });
        let wire = encode(&item);
        assert_eq!(
            wire,
            vec![
                0x02, 0x00, 0x12, // type, length 18
                0, 0, 0, 0, 0, 0, 0x01, 0x02, // uid
                0x01, 0x01, // folder type, playable
                0x00, 0x6A, 0x00, 0x04, b'R', b'o', b'c', b'k',
            ]
        );

        let mut reader = FieldReader::new(&wire);
        assert_eq!(BrowsableItem::decode(&mut reader).unwrap(), item);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn media_element_carries_attributes() {
        let item = BrowsableItem::MediaElement(MediaElementItem {
            uid: 7,
            media_type: 0x00,
            character_set_id: CHARSET_UTF8,
            name: "Song".into(),
            attributes: vec![
                AttributeValue::utf8(crate::types::attribute::TITLE, "Song"),
                AttributeValue {
                    attribute_id: crate::types::attribute::ARTIST_NAME,
                    character_set_id: 0x0003,
                    value: "Band".into(),
                },
            ],
        });
        assert!(item.character_set_mismatch());

        let wire = encode(&item);
        let mut reader = FieldReader::new(&wire);
        let decoded = BrowsableItem::decode(&mut reader).unwrap();
        assert_eq!(decoded, item);
        assert_eq!(decoded.name(), "Song");
    }

    #[test]
    fn unknown_item_type_aborts() {
        let wire = [0x04, 0x00, 0x00];
        let mut reader = FieldReader::new(&wire);
        assert_eq!(
            BrowsableItem::decode(&mut reader).unwrap_err(),
            PduError::UnknownItemType(0x04)
        );
    }

    #[test]
    fn serializes_with_item_type_tag() {
        let item = BrowsableItem::Folder(FolderItem {
            uid: 1,
            folder_type: 0,
            is_playable: false,
            character_set_id: CHARSET_UTF8,
            name: "A".into(),
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["item_type"], "folder");
        assert_eq!(json["name"], "A");
    }
}
