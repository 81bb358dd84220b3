use avbrowse_packet::Packet;
use serde::Serialize;

use crate::change_path::{ChangePathCommand, ChangePathResponse};
use crate::error::Result;
use crate::get_folder_items::{GetFolderItemsCommand, GetFolderItemsResponse};
use crate::get_item_attributes::{GetItemAttributesCommand, GetItemAttributesResponse};
use crate::get_total_number_of_items::{
    GetTotalNumberOfItemsCommand, GetTotalNumberOfItemsResponse,
};
use crate::pdu::{peek_pdu_id, Pdu, PduId};
use crate::set_browsed_player::{SetBrowsedPlayerCommand, SetBrowsedPlayerResponse};
use crate::types::{Scope, StatusCode};

/// Any browsing command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pdu", rename_all = "snake_case")]
pub enum BrowseCommand {
    SetBrowsedPlayer(SetBrowsedPlayerCommand),
    ChangePath(ChangePathCommand),
    GetFolderItems(GetFolderItemsCommand),
    GetItemAttributes(GetItemAttributesCommand),
    GetTotalNumberOfItems(GetTotalNumberOfItemsCommand),
}

impl BrowseCommand {
    pub fn pdu_id(&self) -> PduId {
        match self {
            BrowseCommand::SetBrowsedPlayer(_) => PduId::SetBrowsedPlayer,
            BrowseCommand::ChangePath(_) => PduId::ChangePath,
            BrowseCommand::GetFolderItems(_) => PduId::GetFolderItems,
            BrowseCommand::GetItemAttributes(_) => PduId::GetItemAttributes,
            BrowseCommand::GetTotalNumberOfItems(_) => PduId::GetTotalNumberOfItems,
        }
    }

    /// Scope the command browses, for the operations that name one.
    pub fn scope(&self) -> Option<Scope> {
        match self {
            BrowseCommand::GetFolderItems(cmd) => Some(cmd.scope),
            BrowseCommand::GetItemAttributes(cmd) => Some(cmd.scope),
            BrowseCommand::GetTotalNumberOfItems(cmd) => Some(cmd.scope),
            BrowseCommand::SetBrowsedPlayer(_) | BrowseCommand::ChangePath(_) => None,
        }
    }

    pub fn assemble(&self) -> Result<Packet> {
        match self {
            BrowseCommand::SetBrowsedPlayer(cmd) => cmd.assemble(),
            BrowseCommand::ChangePath(cmd) => cmd.assemble(),
            BrowseCommand::GetFolderItems(cmd) => cmd.assemble(),
            BrowseCommand::GetItemAttributes(cmd) => cmd.assemble(),
            BrowseCommand::GetTotalNumberOfItems(cmd) => cmd.assemble(),
        }
    }

    /// Decode whichever command the frame's PDU id names.
    pub fn disassemble(packet: &mut Packet) -> Result<Self> {
        Ok(match peek_pdu_id(packet)? {
            PduId::SetBrowsedPlayer => SetBrowsedPlayerCommand::disassemble(packet)?.into(),
            PduId::ChangePath => ChangePathCommand::disassemble(packet)?.into(),
            PduId::GetFolderItems => GetFolderItemsCommand::disassemble(packet)?.into(),
            PduId::GetItemAttributes => GetItemAttributesCommand::disassemble(packet)?.into(),
            PduId::GetTotalNumberOfItems => {
                GetTotalNumberOfItemsCommand::disassemble(packet)?.into()
            }
        })
    }
}

/// Any browsing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pdu", rename_all = "snake_case")]
pub enum BrowseResponse {
    SetBrowsedPlayer(SetBrowsedPlayerResponse),
    ChangePath(ChangePathResponse),
    GetFolderItems(GetFolderItemsResponse),
    GetItemAttributes(GetItemAttributesResponse),
    GetTotalNumberOfItems(GetTotalNumberOfItemsResponse),
}

impl BrowseResponse {
    /// An empty response to `pdu` carrying only `status`.
    ///
    /// Stands in for a response that never arrived, such as after a timeout.
    pub fn failed(pdu: PduId, status: StatusCode) -> Self {
        let status = u8::from(status);
        match pdu {
            PduId::SetBrowsedPlayer => SetBrowsedPlayerResponse {
                status,
                ..Default::default()
            }
            .into(),
            PduId::ChangePath => ChangePathResponse {
                status,
                ..Default::default()
            }
            .into(),
            PduId::GetFolderItems => GetFolderItemsResponse {
                status,
                ..Default::default()
            }
            .into(),
            PduId::GetItemAttributes => GetItemAttributesResponse {
                status,
                ..Default::default()
            }
            .into(),
            PduId::GetTotalNumberOfItems => GetTotalNumberOfItemsResponse {
                status,
                ..Default::default()
            }
            .into(),
        }
    }

    pub fn pdu_id(&self) -> PduId {
        match self {
            BrowseResponse::SetBrowsedPlayer(_) => PduId::SetBrowsedPlayer,
            BrowseResponse::ChangePath(_) => PduId::ChangePath,
            BrowseResponse::GetFolderItems(_) => PduId::GetFolderItems,
            BrowseResponse::GetItemAttributes(_) => PduId::GetItemAttributes,
            BrowseResponse::GetTotalNumberOfItems(_) => PduId::GetTotalNumberOfItems,
        }
    }

    /// Raw status byte.
    pub fn status(&self) -> u8 {
        match self {
            BrowseResponse::SetBrowsedPlayer(rsp) => rsp.status,
            BrowseResponse::ChangePath(rsp) => rsp.status,
            BrowseResponse::GetFolderItems(rsp) => rsp.status,
            BrowseResponse::GetItemAttributes(rsp) => rsp.status,
            BrowseResponse::GetTotalNumberOfItems(rsp) => rsp.status,
        }
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u8(self.status())
    }

    /// UID counter reported by the target, for responses that carry one.
    pub fn uid_counter(&self) -> Option<u16> {
        match self {
            BrowseResponse::SetBrowsedPlayer(rsp) => Some(rsp.uid_counter),
            BrowseResponse::GetFolderItems(rsp) => Some(rsp.uid_counter),
            BrowseResponse::GetTotalNumberOfItems(rsp) => Some(rsp.uid_counter),
            BrowseResponse::ChangePath(_) | BrowseResponse::GetItemAttributes(_) => None,
        }
    }

    /// Whether any string in the response is in a character set other than
    /// UTF-8. Such strings are still decoded, lossily.
    pub fn character_set_mismatch(&self) -> bool {
        self.foreign_character_set().is_some()
    }

    /// First non UTF-8 character set id found in the response.
    pub fn foreign_character_set(&self) -> Option<u16> {
        match self {
            BrowseResponse::SetBrowsedPlayer(rsp) => rsp.foreign_character_set(),
            BrowseResponse::GetFolderItems(rsp) => rsp.foreign_character_set(),
            BrowseResponse::GetItemAttributes(rsp) => rsp.foreign_character_set(),
            BrowseResponse::ChangePath(_) | BrowseResponse::GetTotalNumberOfItems(_) => None,
        }
    }

    /// Decoded cleanly with every string in UTF-8.
    pub fn is_valid(&self) -> bool {
        !self.character_set_mismatch()
    }

    pub fn assemble(&self) -> Result<Packet> {
        match self {
            BrowseResponse::SetBrowsedPlayer(rsp) => rsp.assemble(),
            BrowseResponse::ChangePath(rsp) => rsp.assemble(),
            BrowseResponse::GetFolderItems(rsp) => rsp.assemble(),
            BrowseResponse::GetItemAttributes(rsp) => rsp.assemble(),
            BrowseResponse::GetTotalNumberOfItems(rsp) => rsp.assemble(),
        }
    }

    /// Decode whichever response the frame's PDU id names.
    pub fn disassemble(packet: &mut Packet) -> Result<Self> {
        Ok(match peek_pdu_id(packet)? {
            PduId::SetBrowsedPlayer => SetBrowsedPlayerResponse::disassemble(packet)?.into(),
            PduId::ChangePath => ChangePathResponse::disassemble(packet)?.into(),
            PduId::GetFolderItems => GetFolderItemsResponse::disassemble(packet)?.into(),
            PduId::GetItemAttributes => GetItemAttributesResponse::disassemble(packet)?.into(),
            PduId::GetTotalNumberOfItems => {
                GetTotalNumberOfItemsResponse::disassemble(packet)?.into()
            }
        })
    }
}

macro_rules! impl_from_variant {
    ($outer:ident :: $variant:ident($inner:ty)) => {
        impl From<$inner> for $outer {
            fn from(value: $inner) -> Self {
                $outer::$variant(value)
            }
        }
    };
}

impl_from_variant!(BrowseCommand::SetBrowsedPlayer(SetBrowsedPlayerCommand));
impl_from_variant!(BrowseCommand::ChangePath(ChangePathCommand));
impl_from_variant!(BrowseCommand::GetFolderItems(GetFolderItemsCommand));
impl_from_variant!(BrowseCommand::GetItemAttributes(GetItemAttributesCommand));
impl_from_variant!(BrowseCommand::GetTotalNumberOfItems(GetTotalNumberOfItemsCommand));
impl_from_variant!(BrowseResponse::SetBrowsedPlayer(SetBrowsedPlayerResponse));
impl_from_variant!(BrowseResponse::ChangePath(ChangePathResponse));
impl_from_variant!(BrowseResponse::GetFolderItems(GetFolderItemsResponse));
impl_from_variant!(BrowseResponse::GetItemAttributes(GetItemAttributesResponse));
impl_from_variant!(BrowseResponse::GetTotalNumberOfItems(GetTotalNumberOfItemsResponse));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PduError;

    #[test]
    fn test_response_dispatch_by_pdu_id() {
        let mut packet = Packet::from_slice(&[
            0x01, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x6E, 0x00,
        ])
        .unwrap();
        let response = BrowseResponse::disassemble(&mut packet).unwrap();
        assert_eq!(response.pdu_id(), PduId::SetBrowsedPlayer);
        assert_eq!(response.status(), 0);
        assert_eq!(response.uid_counter(), Some(0));
        assert!(response.character_set_mismatch());
        assert_eq!(response.foreign_character_set(), Some(0x006E));
        assert!(!response.is_valid());
    }

    #[test]
    fn test_unknown_pdu_is_rejected() {
        let mut packet = Packet::from_slice(&[0x70, 0x00, 0x00]).unwrap();
        assert_eq!(
            BrowseResponse::disassemble(&mut packet).unwrap_err(),
            PduError::UnknownPdu(0x70)
        );
        assert_eq!(
            BrowseCommand::disassemble(&mut packet).unwrap_err(),
            PduError::UnknownPdu(0x70)
        );
    }

    #[test]
    fn test_every_command_survives_dispatch() {
        let commands: Vec<BrowseCommand> = vec![
            SetBrowsedPlayerCommand::new(3).into(),
            ChangePathCommand {
                uid_counter: 1,
                direction: crate::types::Direction::Up,
                folder_uid: 0,
            }
            .into(),
            GetFolderItemsCommand {
                scope: Scope::PlayerList,
                start_item: 0,
                end_item: 4,
                attributes: vec![],
            }
            .into(),
            GetItemAttributesCommand {
                scope: Scope::Search,
                uid: 5,
                uid_counter: 1,
                attributes: vec![1, 2, 3],
            }
            .into(),
            GetTotalNumberOfItemsCommand {
                scope: Scope::VirtualFileSystem,
            }
            .into(),
        ];
        let scopes: Vec<Option<Scope>> = commands.iter().map(BrowseCommand::scope).collect();
        assert_eq!(
            scopes,
            [
                None,
                None,
                Some(Scope::PlayerList),
                Some(Scope::Search),
                Some(Scope::VirtualFileSystem)
            ]
        );

        for cmd in commands {
            let mut packet = cmd.assemble().unwrap();
            let decoded = BrowseCommand::disassemble(&mut packet).unwrap();
            assert_eq!(decoded.pdu_id(), cmd.pdu_id());
            assert_eq!(decoded, cmd);
        }
    }

    #[test]
    fn test_failed_response_round_trips() {
        for pdu in PduId::ALL {
            let response = BrowseResponse::failed(pdu, StatusCode::InternalError);
            assert_eq!(response.pdu_id(), pdu);
            assert_eq!(response.status_code(), Some(StatusCode::InternalError));

            let mut packet = response.assemble().unwrap();
            let decoded = BrowseResponse::disassemble(&mut packet).unwrap();
            assert_eq!(decoded.status(), 0x03);
        }
    }

    #[test]
    fn test_serializes_with_pdu_tag() {
        let response: BrowseResponse = GetTotalNumberOfItemsResponse {
            status: 4,
            uid_counter: 1,
            number_of_items: 12,
        }
        .into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pdu"], "get_total_number_of_items");
        assert_eq!(json["number_of_items"], 12);
    }
}
