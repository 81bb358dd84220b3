use std::path::PathBuf;

use avbrowse_packet::PacketError;

use crate::fragmenting::SegmentKind;

/// Errors that can occur while moving packets across a link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A packet operation failed (allocation, extraction, frame check).
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// An I/O error occurred on the underlying datagram channel.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to bind a datagram socket to the specified path.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect a datagram socket to the specified path.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The configured MTU leaves no room for a fragment.
    #[error("mtu {mtu} must exceed per-unit overhead of {overhead} bytes")]
    MtuTooSmall { mtu: usize, overhead: usize },

    /// A frame needs more units than the link allows.
    #[error("frame needs {units} units, max {max}")]
    TooManyFragments { units: usize, max: usize },

    /// A segment arrived out of order for the current reassembly state.
    #[error("unexpected {kind:?} segment (reassembly open: {reassembling})")]
    UnexpectedSegment {
        kind: SegmentKind,
        reassembling: bool,
    },

    /// A unit too short to hold the segment header and frame check.
    #[error("unit of {size} bytes is shorter than the {min}-byte overhead")]
    TruncatedUnit { size: usize, min: usize },

    /// The segment header byte is not a known segment kind.
    #[error("invalid segment header {0:#04x}")]
    InvalidSegmentHeader(u8),

    /// The peer end of the link has gone away.
    #[error("link closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, LinkError>;
