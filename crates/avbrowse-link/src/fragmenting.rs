use avbrowse_packet::{Crc, Packet};
use tracing::{debug, trace, warn};

use crate::error::{LinkError, Result};
use crate::traits::{Datagram, Transport};

/// Segment header size in bytes.
pub const SEGMENT_HEADER_SIZE: usize = 1;

/// Frame check sequence size in bytes.
pub const FCS_SIZE: usize = 2;

/// CRC used for the per-unit frame check sequence.
pub const FCS_ALGORITHM: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_ARC);

/// Default unit size in bytes, header and FCS included.
pub const DEFAULT_MTU: usize = 512;

/// Default cap on units per frame.
pub const DEFAULT_MAX_FRAGMENTS: usize = 16;

/// Position of a unit within its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SegmentKind {
    /// The whole frame fits in this unit.
    Single = 0x00,
    Start = 0x01,
    Continue = 0x02,
    End = 0x03,
}

impl TryFrom<u8> for SegmentKind {
    type Error = LinkError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Single),
            0x01 => Ok(Self::Start),
            0x02 => Ok(Self::Continue),
            0x03 => Ok(Self::End),
            other => Err(LinkError::InvalidSegmentHeader(other)),
        }
    }
}

/// Configuration for a [`FragmentingLink`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Largest unit on the wire, header and FCS included. Default: 512.
    pub mtu: usize,
    /// Most units one frame may span. Default: 16.
    pub max_fragments: usize,
    /// Append and check a CRC-16 on every unit. Default: true.
    pub frame_check: bool,
}

impl LinkConfig {
    /// Header and FCS bytes added to every unit.
    pub fn overhead(&self) -> usize {
        SEGMENT_HEADER_SIZE + if self.frame_check { FCS_SIZE } else { 0 }
    }

    /// Frame bytes carried per unit.
    pub fn fragment_len(&self) -> usize {
        self.mtu.saturating_sub(self.overhead())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mtu: DEFAULT_MTU,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            frame_check: true,
        }
    }
}

struct Reassembly {
    packet: Packet,
    units: usize,
}

/// A [`Transport`] that splits frames into MTU-sized units over a [`Datagram`].
///
/// Unit layout:
///
/// ```text
/// ┌────────────┬──────────────────────┬─────────────┐
/// │ Kind (1B)  │ Fragment             │ FCS (2B BE) │
/// │ 0x00..0x03 │ (≤ mtu - overhead)   │ optional    │
/// └────────────┴──────────────────────┴─────────────┘
/// ```
///
/// The FCS is CRC-16/ARC over kind and fragment. Fragments reference the
/// sender's frame storage until the unit is flattened for the wire.
pub struct FragmentingLink<D> {
    datagram: D,
    config: LinkConfig,
    reassembly: Option<Reassembly>,
}

impl<D: Datagram> FragmentingLink<D> {
    /// Wrap `datagram` with default configuration.
    pub fn new(datagram: D) -> Result<Self> {
        Self::with_config(datagram, LinkConfig::default())
    }

    /// Wrap `datagram`, rejecting an MTU with no room for fragment bytes.
    pub fn with_config(datagram: D, config: LinkConfig) -> Result<Self> {
        let overhead = config.overhead();
        if config.mtu <= overhead {
            return Err(LinkError::MtuTooSmall {
                mtu: config.mtu,
                overhead,
            });
        }
        Ok(Self {
            datagram,
            config,
            reassembly: None,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Whether a multi-unit frame is partly received.
    pub fn is_reassembling(&self) -> bool {
        self.reassembly.is_some()
    }

    /// Get a reference to the underlying datagram channel.
    pub fn get_ref(&self) -> &D {
        &self.datagram
    }

    /// Get a mutable reference to the underlying datagram channel.
    pub fn get_mut(&mut self) -> &mut D {
        &mut self.datagram
    }

    /// Consume the link, returning the underlying datagram channel.
    pub fn into_inner(self) -> D {
        self.datagram
    }

    fn send_frame(&mut self, mut frame: Packet) -> Result<()> {
        let fragment_len = self.config.fragment_len();
        let units = frame.size().div_ceil(fragment_len).max(1);
        if units > self.config.max_fragments {
            return Err(LinkError::TooManyFragments {
                units,
                max: self.config.max_fragments,
            });
        }

        let mut first = true;
        loop {
            let mut unit = Packet::allocate(SEGMENT_HEADER_SIZE, 0, 0)?;
            let remaining = frame.fragment(&mut unit, fragment_len);
            let kind = match (first, remaining == 0) {
                (true, true) => SegmentKind::Single,
                (true, false) => SegmentKind::Start,
                (false, false) => SegmentKind::Continue,
                (false, true) => SegmentKind::End,
            };
            unit.write_head(&[kind as u8])?;

            let unit = if self.config.frame_check {
                let fcs = unit.crc16(&FCS_ALGORITHM);
                let mut checked = Packet::inherit_allocate(&unit, 0, FCS_SIZE)?;
                checked.write_tail(&fcs.to_be_bytes())?;
                checked
            } else {
                unit
            };

            let wire = unit.to_vec()?;
            trace!(?kind, len = wire.len(), remaining, "sending unit");
            self.datagram.send_unit(&wire)?;

            if remaining == 0 {
                break;
            }
            first = false;
        }
        debug!(units, "sent frame");
        Ok(())
    }

    fn receive_unit(&mut self) -> Result<Option<Packet>> {
        let wire = self.datagram.recv_unit(self.config.mtu)?;
        if wire.is_empty() {
            self.reassembly = None;
            return Err(LinkError::Closed);
        }

        let min = self.config.overhead();
        if wire.len() < min {
            warn!(size = wire.len(), min, "dropping truncated unit");
            self.reassembly = None;
            return Err(LinkError::TruncatedUnit {
                size: wire.len(),
                min,
            });
        }

        let mut unit = Packet::from_slice(&wire)?;
        if self.config.frame_check {
            let mut fcs = [0u8; FCS_SIZE];
            unit.extract_tail(&mut fcs)?;
            if let Err(err) = unit.verify_crc16(&FCS_ALGORITHM, u16::from_be_bytes(fcs)) {
                warn!(%err, "dropping unit with bad frame check");
                self.reassembly = None;
                return Err(err.into());
            }
        }

        let mut header = [0u8; SEGMENT_HEADER_SIZE];
        unit.extract_head(&mut header)?;
        let kind = SegmentKind::try_from(header[0])?;
        trace!(?kind, len = unit.payload_size(), "received unit");

        match (kind, self.reassembly.take()) {
            (SegmentKind::Single, None) => {
                let mut frame = Packet::empty();
                unit.reassemble(&mut frame);
                Ok(Some(frame))
            }
            (SegmentKind::Start, None) => {
                let mut packet = Packet::empty();
                unit.reassemble(&mut packet);
                self.reassembly = Some(Reassembly { packet, units: 1 });
                Ok(None)
            }
            (SegmentKind::Continue | SegmentKind::End, Some(mut partial)) => {
                partial.units += 1;
                if partial.units > self.config.max_fragments {
                    return Err(LinkError::TooManyFragments {
                        units: partial.units,
                        max: self.config.max_fragments,
                    });
                }
                unit.reassemble(&mut partial.packet);
                if kind == SegmentKind::End {
                    debug!(units = partial.units, "reassembled frame");
                    return Ok(Some(partial.packet));
                }
                self.reassembly = Some(partial);
                Ok(None)
            }
            (kind, partial) => {
                let reassembling = partial.is_some();
                warn!(?kind, reassembling, "segment out of sequence");
                Err(LinkError::UnexpectedSegment { kind, reassembling })
            }
        }
    }
}

impl<D: Datagram> Transport for FragmentingLink<D> {
    fn send(&mut self, packet: Packet) -> Result<()> {
        self.send_frame(packet)
    }

    fn receive(&mut self) -> Result<Packet> {
        loop {
            if let Some(frame) = self.receive_unit()? {
                return Ok(frame);
            }
        }
    }

    fn negotiated_mtu(&self) -> usize {
        self.config.mtu
    }
}

impl<D> std::fmt::Debug for FragmentingLink<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentingLink")
            .field("config", &self.config)
            .field("reassembling", &self.reassembly.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDatagram;

    fn frame_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn link_pair(config: LinkConfig) -> (FragmentingLink<MemoryDatagram>, FragmentingLink<MemoryDatagram>) {
        let (a, b) = MemoryDatagram::pair();
        (
            FragmentingLink::with_config(a, config.clone()).unwrap(),
            FragmentingLink::with_config(b, config).unwrap(),
        )
    }

    fn small_mtu(mtu: usize) -> LinkConfig {
        LinkConfig {
            mtu,
            max_fragments: 128,
            ..LinkConfig::default()
        }
    }

    fn raw_unit(kind: u8, fragment: &[u8]) -> Vec<u8> {
        let mut unit = vec![kind];
        unit.extend_from_slice(fragment);
        let fcs = FCS_ALGORITHM.checksum(&unit);
        unit.extend_from_slice(&fcs.to_be_bytes());
        unit
    }

    #[test]
    fn test_small_frame_is_single_unit() {
        let (mut tx, mut rx) = link_pair(LinkConfig::default());
        tx.send(Packet::from_slice(b"\x01\x00\x02\x00\xff").unwrap())
            .unwrap();
        assert_eq!(rx.get_ref().pending(), 1);

        let frame = rx.receive().unwrap();
        assert_eq!(frame.to_vec().unwrap(), b"\x01\x00\x02\x00\xff");
    }

    #[test]
    fn test_fragment_and_reassemble_across_mtus() {
        let sent = frame_bytes(100);
        for mtu in 4..=40 {
            let (mut tx, mut rx) = link_pair(small_mtu(mtu));
            tx.send(Packet::from_slice(&sent).unwrap()).unwrap();

            let expected_units = sent.len().div_ceil(mtu - 3);
            assert_eq!(rx.get_ref().pending(), expected_units, "mtu {mtu}");

            let frame = rx.receive().unwrap();
            assert_eq!(frame.to_vec().unwrap(), sent, "mtu {mtu}");
            assert!(!rx.is_reassembling());
        }
    }

    #[test]
    fn test_units_never_exceed_mtu() {
        let (a, mut b) = MemoryDatagram::pair();
        let mut tx = FragmentingLink::with_config(a, small_mtu(10)).unwrap();
        tx.send(Packet::from_slice(&frame_bytes(33)).unwrap()).unwrap();

        let mut kinds = Vec::new();
        while b.pending() > 0 {
            let unit = b.recv_unit(64).unwrap();
            assert!(unit.len() <= 10);
            kinds.push(unit[0]);
        }
        assert_eq!(kinds, vec![0x01, 0x02, 0x02, 0x02, 0x03]);
    }

    #[test]
    fn test_without_frame_check() {
        let config = LinkConfig {
            mtu: 6,
            frame_check: false,
            ..LinkConfig::default()
        };
        let (a, mut b) = MemoryDatagram::pair();
        let mut tx = FragmentingLink::with_config(a, config.clone()).unwrap();
        tx.send(Packet::from_slice(b"abcdefghij").unwrap()).unwrap();

        assert_eq!(b.recv_unit(64).unwrap().as_ref(), b"\x01abcde");
        assert_eq!(b.recv_unit(64).unwrap().as_ref(), b"\x03fghij");
    }

    #[test]
    fn test_corrupted_unit_fails_frame_check() {
        let (mut raw, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();

        let mut unit = raw_unit(0x00, b"payload");
        unit[3] ^= 0x40;
        raw.send_unit(&unit).unwrap();

        let err = rx.receive().unwrap_err();
        assert!(matches!(
            err,
            LinkError::Packet(avbrowse_packet::PacketError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_unit_is_rejected() {
        let (mut raw, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();
        raw.send_unit(&raw_unit(0x01, b"first")).unwrap();
        raw.send_unit(&[0x02, 0x00]).unwrap();

        assert!(rx.receive_unit().unwrap().is_none());
        assert!(rx.is_reassembling());
        assert!(matches!(
            rx.receive().unwrap_err(),
            LinkError::TruncatedUnit { size: 2, min: 3 }
        ));
        assert!(!rx.is_reassembling());
    }

    #[test]
    fn test_continue_without_start_is_rejected() {
        let (mut raw, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();
        raw.send_unit(&raw_unit(0x02, b"orphan")).unwrap();

        let err = rx.receive().unwrap_err();
        assert!(matches!(
            err,
            LinkError::UnexpectedSegment {
                kind: SegmentKind::Continue,
                reassembling: false
            }
        ));
    }

    #[test]
    fn test_start_while_reassembling_discards_partial() {
        let (mut raw, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();
        raw.send_unit(&raw_unit(0x01, b"first")).unwrap();
        raw.send_unit(&raw_unit(0x01, b"again")).unwrap();

        let err = rx.receive().unwrap_err();
        assert!(matches!(
            err,
            LinkError::UnexpectedSegment {
                kind: SegmentKind::Start,
                reassembling: true
            }
        ));
        assert!(!rx.is_reassembling());
    }

    #[test]
    fn test_invalid_segment_header() {
        let (mut raw, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();
        raw.send_unit(&raw_unit(0x09, b"x")).unwrap();
        assert!(matches!(
            rx.receive().unwrap_err(),
            LinkError::InvalidSegmentHeader(0x09)
        ));
    }

    #[test]
    fn test_too_many_fragments_on_send() {
        let config = LinkConfig {
            mtu: 4,
            max_fragments: 3,
            ..LinkConfig::default()
        };
        let (a, b) = MemoryDatagram::pair();
        let mut tx = FragmentingLink::with_config(a, config).unwrap();
        let err = tx.send(Packet::from_slice(b"abcd").unwrap()).unwrap_err();
        assert!(matches!(err, LinkError::TooManyFragments { units: 4, max: 3 }));
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn test_too_many_fragments_on_receive() {
        let (mut raw, b) = MemoryDatagram::pair();
        let config = LinkConfig {
            max_fragments: 2,
            ..LinkConfig::default()
        };
        let mut rx = FragmentingLink::with_config(b, config).unwrap();
        raw.send_unit(&raw_unit(0x01, b"a")).unwrap();
        raw.send_unit(&raw_unit(0x02, b"b")).unwrap();
        raw.send_unit(&raw_unit(0x03, b"c")).unwrap();
        assert!(matches!(
            rx.receive().unwrap_err(),
            LinkError::TooManyFragments { units: 3, max: 2 }
        ));
    }

    #[test]
    fn test_mtu_too_small() {
        let (a, _b) = MemoryDatagram::pair();
        let config = LinkConfig {
            mtu: 3,
            ..LinkConfig::default()
        };
        let err = FragmentingLink::with_config(a, config).unwrap_err();
        assert!(matches!(err, LinkError::MtuTooSmall { mtu: 3, overhead: 3 }));
    }

    #[test]
    fn test_closed_peer() {
        let (a, b) = MemoryDatagram::pair();
        let mut rx = FragmentingLink::new(b).unwrap();
        drop(a);
        assert!(matches!(rx.receive().unwrap_err(), LinkError::Closed));
    }

    #[test]
    fn test_empty_frame_round_trips() {
        let (mut tx, mut rx) = link_pair(LinkConfig::default());
        tx.send(Packet::empty()).unwrap();
        assert!(rx.receive().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_over_unix_datagram_pair() {
        use crate::uds::UnixDatagramChannel;

        let (a, b) = UnixDatagramChannel::pair().unwrap();
        let mut tx = FragmentingLink::with_config(a, small_mtu(16)).unwrap();
        let mut rx = FragmentingLink::with_config(b, small_mtu(16)).unwrap();
        assert_eq!(rx.negotiated_mtu(), 16);

        let sent = frame_bytes(90);
        tx.send(Packet::from_slice(&sent).unwrap()).unwrap();
        assert_eq!(rx.receive().unwrap().to_vec().unwrap(), sent);
    }
}
