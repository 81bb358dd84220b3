//! Controller-side session for the AVRCP Browsing channel.
//!
//! A [`BrowseSession`] sits on any [`Transport`](avbrowse_link::Transport),
//! keeps one command outstanding at a time, queues the rest, and tracks the
//! target's UID counter across responses.

pub mod config;
pub mod error;
pub mod session;

pub use config::{CharsetPolicy, SessionConfig, DEFAULT_MAX_QUEUED_COMMANDS};
pub use error::{Result, SessionError};
pub use session::{BrowseSession, Completion, Submitted};
