use std::io;

use avbrowse_packet::Packet;
use bytes::Bytes;

use crate::error::Result;

/// Packet-level transport boundary consumed by the browsing codec.
///
/// Implementations own connection state. A transport hands whole upper-layer
/// frames up and down; any splitting into smaller units happens below it.
pub trait Transport {
    /// Send one complete frame.
    fn send(&mut self, packet: Packet) -> Result<()>;

    /// Receive the next complete frame (blocking).
    fn receive(&mut self) -> Result<Packet>;

    /// Largest unit the lower channel carries in one piece.
    fn negotiated_mtu(&self) -> usize;
}

/// Unit-oriented channel underneath a [`Transport`].
///
/// Each call moves exactly one unit. Unit boundaries are preserved end to end.
pub trait Datagram {
    /// Send `unit` as one datagram.
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<()>;

    /// Receive one datagram of at most `max_len` bytes.
    ///
    /// An empty unit means the peer has closed the channel.
    fn recv_unit(&mut self, max_len: usize) -> io::Result<Bytes>;
}

impl<D: Datagram + ?Sized> Datagram for &mut D {
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<()> {
        (**self).send_unit(unit)
    }

    fn recv_unit(&mut self, max_len: usize) -> io::Result<Bytes> {
        (**self).recv_unit(max_len)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, packet: Packet) -> Result<()> {
        (**self).send(packet)
    }

    fn receive(&mut self) -> Result<Packet> {
        (**self).receive()
    }

    fn negotiated_mtu(&self) -> usize {
        (**self).negotiated_mtu()
    }
}
