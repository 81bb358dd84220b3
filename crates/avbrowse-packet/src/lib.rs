//! Reference-counted, fragmentable network buffer chains.
//!
//! A [`Packet`] is three [`SegmentList`]s (head, payload, tail) of [`Buffer`]
//! handles. Buffers share their backing storage by reference count, which lets
//! a frame be split across MTU-sized lower packets and rebuilt on the far side
//! without copying its bytes.
//!
//! ```
//! use avbrowse_packet::Packet;
//!
//! let mut frame = Packet::from_slice(b"hello, browsing channel").unwrap();
//! let mut accumulator = Packet::empty();
//! loop {
//!     let mut unit = Packet::empty();
//!     let remaining = frame.fragment(&mut unit, 8);
//!     unit.reassemble(&mut accumulator);
//!     if remaining == 0 {
//!         break;
//!     }
//! }
//! assert_eq!(accumulator.to_vec().unwrap(), b"hello, browsing channel");
//! ```

pub mod buffer;
pub mod error;
pub mod packet;
pub mod segment;

pub use buffer::Buffer;
pub use crc::Crc;
pub use error::{PacketError, Result};
pub use packet::Packet;
pub use segment::SegmentList;
