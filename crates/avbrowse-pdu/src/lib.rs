//! Command and response codec for the AVRCP Browsing channel.
//!
//! Every PDU is a 3-byte header followed by its operands:
//! - 1-byte PDU id
//! - 2-byte big-endian parameter length
//!
//! Multi-byte operands are big-endian. Each operation has a command and a
//! response type implementing [`Pdu`]; [`BrowseCommand`] and
//! [`BrowseResponse`] dispatch on the PDU id of a received frame.
//!
//! ```
//! use avbrowse_pdu::{Pdu, SetBrowsedPlayerCommand};
//!
//! let frame = SetBrowsedPlayerCommand::new(0x00FF).assemble().unwrap();
//! assert_eq!(frame.to_vec().unwrap(), [0x01, 0x00, 0x02, 0x00, 0xFF]);
//! ```

pub mod browse;
pub mod change_path;
pub mod error;
pub mod get_folder_items;
pub mod get_item_attributes;
pub mod get_total_number_of_items;
pub mod items;
pub mod pdu;
pub mod reader;
pub mod set_browsed_player;
pub mod types;
pub mod writer;

pub use browse::{BrowseCommand, BrowseResponse};
pub use change_path::{ChangePathCommand, ChangePathResponse};
pub use error::{PduError, Result};
pub use get_folder_items::{GetFolderItemsCommand, GetFolderItemsResponse};
pub use get_item_attributes::{GetItemAttributesCommand, GetItemAttributesResponse};
pub use get_total_number_of_items::{GetTotalNumberOfItemsCommand, GetTotalNumberOfItemsResponse};
pub use items::{AttributeValue, BrowsableItem, FolderItem, MediaElementItem, MediaPlayerItem};
pub use pdu::{peek_pdu_id, Pdu, PduId, HEADER_SIZE};
pub use reader::FieldReader;
pub use set_browsed_player::{SetBrowsedPlayerCommand, SetBrowsedPlayerResponse};
pub use types::{attribute, Direction, ItemType, Scope, StatusCode, CHARSET_UTF8, MAX_ATTRIBUTES};
pub use writer::FieldWriter;
