/// Errors that can occur while building, slicing or checking packets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    /// Backing storage could not be allocated.
    #[error("out of memory allocating {requested} bytes")]
    NoMemory { requested: usize },

    /// A buffer window would extend past its backing storage.
    #[error("window {offset}+{len} exceeds buffer capacity {capacity}")]
    WindowOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// More bytes were requested from the payload than it holds.
    #[error("requested {requested} bytes but payload holds {available}")]
    Underflow { requested: usize, available: usize },

    /// A copy target is smaller than the source.
    #[error("destination holds {capacity} bytes, {required} required")]
    CapacityExceeded { required: usize, capacity: usize },

    /// The payload has no storage to hand out.
    #[error("packet payload is empty")]
    NoStorage,

    /// The frame check sequence did not match.
    #[error("crc mismatch (expected {expected:#06x}, computed {computed:#06x})")]
    CrcMismatch { expected: u16, computed: u16 },
}

pub type Result<T> = std::result::Result<T, PacketError>;
