use std::fmt;

use serde::Serialize;

use crate::error::{PduError, Result};

/// Character set id for UTF-8 (IANA MIBenum 106).
pub const CHARSET_UTF8: u16 = 0x006A;

/// Largest attribute list a one-byte count can describe.
pub const MAX_ATTRIBUTES: usize = u8::MAX as usize;

/// Media attribute ids.
pub mod attribute {
    pub const TITLE: u32 = 0x01;
    pub const ARTIST_NAME: u32 = 0x02;
    pub const ALBUM_NAME: u32 = 0x03;
    pub const TRACK_NUMBER: u32 = 0x04;
    pub const TOTAL_NUMBER_OF_TRACKS: u32 = 0x05;
    pub const GENRE: u32 = 0x06;
    pub const PLAYING_TIME: u32 = 0x07;
    pub const DEFAULT_COVER_ART: u32 = 0x08;

    /// Every defined attribute id, in id order.
    pub const ALL: [u32; 8] = [
        TITLE,
        ARTIST_NAME,
        ALBUM_NAME,
        TRACK_NUMBER,
        TOTAL_NUMBER_OF_TRACKS,
        GENRE,
        PLAYING_TIME,
        DEFAULT_COVER_ART,
    ];
}

/// Which item collection a browsing command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Scope {
    PlayerList = 0x00,
    VirtualFileSystem = 0x01,
    Search = 0x02,
    NowPlaying = 0x03,
}

impl TryFrom<u8> for Scope {
    type Error = PduError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::PlayerList),
            0x01 => Ok(Self::VirtualFileSystem),
            0x02 => Ok(Self::Search),
            0x03 => Ok(Self::NowPlaying),
            other => Err(PduError::InvalidParameter {
                field: "scope",
                value: other.into(),
            }),
        }
    }
}

/// ChangePath direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Direction {
    Up = 0x00,
    Down = 0x01,
}

impl TryFrom<u8> for Direction {
    type Error = PduError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Up),
            0x01 => Ok(Self::Down),
            other => Err(PduError::InvalidParameter {
                field: "direction",
                value: other.into(),
            }),
        }
    }
}

/// Discriminator of a GetFolderItems list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ItemType {
    MediaPlayer = 0x01,
    Folder = 0x02,
    MediaElement = 0x03,
}

impl TryFrom<u8> for ItemType {
    type Error = PduError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::MediaPlayer),
            0x02 => Ok(Self::Folder),
            0x03 => Ok(Self::MediaElement),
            other => Err(PduError::UnknownItemType(other)),
        }
    }
}

/// Status byte carried first in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StatusCode {
    InvalidCommand = 0x00,
    InvalidParameter = 0x01,
    ParameterContentError = 0x02,
    InternalError = 0x03,
    NoError = 0x04,
    UidChanged = 0x05,
    Reserved = 0x06,
    InvalidDirection = 0x07,
    NotADirectory = 0x08,
    DoesNotExist = 0x09,
    InvalidScope = 0x0A,
    RangeOutOfBounds = 0x0B,
    FolderItemIsNotPlayable = 0x0C,
    MediaInUse = 0x0D,
    NowPlayingListFull = 0x0E,
    SearchNotSupported = 0x0F,
    SearchInProgress = 0x10,
    InvalidPlayerId = 0x11,
    PlayerNotBrowsable = 0x12,
    PlayerNotAddressed = 0x13,
    NoValidSearchResults = 0x14,
    NoAvailablePlayers = 0x15,
    AddressedPlayerChanged = 0x16,
}

impl StatusCode {
    /// Decode a status byte; `None` for values outside the defined range.
    pub fn from_u8(value: u8) -> Option<Self> {
        use StatusCode::*;
        const TABLE: [StatusCode; 23] = [
            InvalidCommand,
            InvalidParameter,
            ParameterContentError,
            InternalError,
            NoError,
            UidChanged,
            Reserved,
            InvalidDirection,
            NotADirectory,
            DoesNotExist,
            InvalidScope,
            RangeOutOfBounds,
            FolderItemIsNotPlayable,
            MediaInUse,
            NowPlayingListFull,
            SearchNotSupported,
            SearchInProgress,
            InvalidPlayerId,
            PlayerNotBrowsable,
            PlayerNotAddressed,
            NoValidSearchResults,
            NoAvailablePlayers,
            AddressedPlayerChanged,
        ];
        TABLE.get(usize::from(value)).copied()
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> Self {
        code as u8
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({:#04x})", *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_by_value() {
        assert_eq!(StatusCode::from_u8(0x04), Some(StatusCode::NoError));
        assert_eq!(StatusCode::from_u8(0x16), Some(StatusCode::AddressedPlayerChanged));
        assert_eq!(StatusCode::from_u8(0x17), None);
        for value in 0..=0x16u8 {
            assert_eq!(StatusCode::from_u8(value).map(u8::from), Some(value));
        }
    }

    #[test]
    fn scope_and_direction_reject_reserved_values() {
        assert_eq!(Scope::try_from(0x03).unwrap(), Scope::NowPlaying);
        assert!(matches!(
            Scope::try_from(0x04),
            Err(PduError::InvalidParameter { field: "scope", value: 4 })
        ));
        assert!(Direction::try_from(0x02).is_err());
        assert_eq!(ItemType::try_from(0x00), Err(PduError::UnknownItemType(0)));
    }
}
