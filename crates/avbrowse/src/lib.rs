//! Zero-copy packet chains and the AVRCP Browsing command/response codec.
//!
//! # Crate Structure
//!
//! - [`packet`]: reference-counted buffers, segment lists and fragmentable packets
//! - [`link`]: transport boundary and the MTU-fragmenting link
//! - [`pdu`]: browsing PDU assembly and disassembly
//! - [`session`]: command queueing and response tracking

/// Re-export packet types.
pub mod packet {
    pub use avbrowse_packet::*;
}

/// Re-export link types.
pub mod link {
    pub use avbrowse_link::*;
}

/// Re-export codec types.
pub mod pdu {
    pub use avbrowse_pdu::*;
}

/// Re-export session types.
pub mod session {
    pub use avbrowse_session::*;
}
