//! Transport boundary for browsing frames.
//!
//! [`Transport`] is what the codec and session layers send through. The
//! [`FragmentingLink`] implementation splits each frame into MTU-sized units
//! with a segment header and optional CRC-16 frame check, and runs over any
//! unit-preserving [`Datagram`] channel:
//! - [`MemoryDatagram`] for in-process pairs
//! - [`UnixDatagramChannel`] for Unix datagram sockets (Linux/macOS)
//!
//! Connection setup and MTU negotiation are left to the integrator; the MTU
//! is plain configuration here.

pub mod error;
pub mod fragmenting;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{LinkError, Result};
pub use fragmenting::{FragmentingLink, LinkConfig, SegmentKind};
pub use memory::MemoryDatagram;
pub use traits::{Datagram, Transport};

#[cfg(unix)]
pub use uds::UnixDatagramChannel;
