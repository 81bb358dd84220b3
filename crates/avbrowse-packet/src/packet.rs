use bytes::Bytes;
use crc::Crc;
use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{PacketError, Result};
use crate::segment::SegmentList;

/// A logical frame made of three buffer chains: head, payload and tail.
///
/// Head and tail hold per-layer framing; the payload carries the bytes handed
/// down from the layer above. Bytes move between packets by handle, so a frame
/// split for a small MTU shares storage with the frame it came from.
///
/// Packets are `!Send`: the buffers they hold may be shared with other packets,
/// and only one logical flow may own the whole group at a time.
#[derive(Debug, Default)]
pub struct Packet {
    head: SegmentList,
    payload: SegmentList,
    tail: SegmentList,
}

impl Packet {
    /// An empty packet with no storage in any region.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Allocate zero-filled regions of the given sizes.
    ///
    /// A zero-sized region gets no buffer at all.
    pub fn allocate(head: usize, payload: usize, tail: usize) -> Result<Self> {
        let mut packet = Self::empty();
        push_fresh(&mut packet.head, head)?;
        push_fresh(&mut packet.payload, payload)?;
        push_fresh(&mut packet.tail, tail)?;
        Ok(packet)
    }

    /// A packet whose payload is a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut packet = Self::empty();
        if !bytes.is_empty() {
            packet.payload.push_back(Buffer::copy_from_slice(bytes)?);
        }
        Ok(packet)
    }

    /// A packet that shares `source`'s payload storage.
    ///
    /// Head and tail are copied into fresh buffers owned by the new packet.
    pub fn reference_allocate(source: &Packet) -> Result<Self> {
        let mut packet = Self::empty();
        copy_region(&source.head, &mut packet.head)?;
        for segment in source.payload.iter() {
            packet.payload.push_back(segment.reference());
        }
        copy_region(&source.tail, &mut packet.tail)?;
        Ok(packet)
    }

    /// A packet whose payload references every byte of `source` (head, payload
    /// and tail) with fresh zeroed head and tail regions around it.
    ///
    /// This is how a lower layer adds its own framing without copying.
    pub fn inherit_allocate(source: &Packet, head: usize, tail: usize) -> Result<Self> {
        let mut packet = Self::empty();
        push_fresh(&mut packet.head, head)?;
        for region in source.regions() {
            for segment in region.iter() {
                packet.payload.push_back(segment.reference());
            }
        }
        push_fresh(&mut packet.tail, tail)?;
        Ok(packet)
    }

    /// Whole-frame size: head, payload and tail.
    pub fn size(&self) -> usize {
        self.head.len() + self.payload.len() + self.tail.len()
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    pub fn head_size(&self) -> usize {
        self.head.len()
    }

    pub fn tail_size(&self) -> usize {
        self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn head(&self) -> &SegmentList {
        &self.head
    }

    pub fn payload(&self) -> &SegmentList {
        &self.payload
    }

    pub fn tail(&self) -> &SegmentList {
        &self.tail
    }

    /// Coalesce the payload into a single buffer and return it.
    ///
    /// A payload that is already one buffer is returned untouched. Fails with
    /// [`PacketError::NoStorage`] when the payload is empty.
    pub fn continuous_payload(&mut self) -> Result<&Buffer> {
        if self.payload.is_empty() {
            return Err(PacketError::NoStorage);
        }
        if self.payload.segment_count() > 1 {
            let size = self.payload.len();
            let mut merged = Buffer::allocate(size)?;
            let mut offset = 0;
            for segment in self.payload.iter() {
                segment.with_bytes(|bytes| offset += merged.write(offset, bytes));
            }
            trace!(
                segments = self.payload.segment_count(),
                size,
                "coalesced payload"
            );
            self.payload.clear();
            self.payload.push_back(merged);
        }
        self.payload.front().ok_or(PacketError::NoStorage)
    }

    /// Copy payload bytes starting at `offset` into `dst`.
    ///
    /// Returns the number of bytes copied; zero when `offset` is past the
    /// payload.
    pub fn read_payload(&self, dst: &mut [u8], offset: usize) -> usize {
        self.payload.read(offset, dst)
    }

    /// Copy `src` into the payload starting at `offset`.
    ///
    /// Never writes past the payload's logical length.
    pub fn write_payload(&mut self, src: &[u8], offset: usize) -> usize {
        self.payload.write(offset, src)
    }

    /// Copy bytes from the whole frame, addressed as head, payload, tail.
    pub fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        let mut skip = offset;
        let mut copied = 0;
        for region in self.regions() {
            if copied == dst.len() {
                break;
            }
            if skip >= region.len() {
                skip -= region.len();
                continue;
            }
            copied += region.read(skip, &mut dst[copied..]);
            skip = 0;
        }
        copied
    }

    /// Fill the head region from `src`.
    pub fn write_head(&mut self, src: &[u8]) -> Result<()> {
        write_region(&mut self.head, src)
    }

    /// Fill the tail region from `src`.
    pub fn write_tail(&mut self, src: &[u8]) -> Result<()> {
        write_region(&mut self.tail, src)
    }

    /// Copy `dst.len()` bytes from the front of the payload and drop them.
    ///
    /// Leaves the packet untouched and fails with [`PacketError::Underflow`]
    /// when the payload is shorter than `dst`.
    pub fn extract_head(&mut self, dst: &mut [u8]) -> Result<()> {
        self.check_extract(dst.len())?;
        self.payload.read(0, dst);
        self.payload.trim_front(dst.len());
        Ok(())
    }

    /// Copy `dst.len()` bytes from the back of the payload and drop them.
    pub fn extract_tail(&mut self, dst: &mut [u8]) -> Result<()> {
        self.check_extract(dst.len())?;
        let offset = self.payload.len() - dst.len();
        self.payload.read(offset, dst);
        self.payload.trim_back(dst.len());
        Ok(())
    }

    fn check_extract(&self, requested: usize) -> Result<()> {
        let available = self.payload.len();
        if requested > available {
            return Err(PacketError::Underflow {
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Append `buffer` to the end of the payload.
    pub fn append_payload(&mut self, buffer: Buffer) {
        self.payload.push_back(buffer);
    }

    /// Move up to `fragment_len` leading bytes of this frame into
    /// `destination`'s payload.
    ///
    /// Bytes are taken from the head, then the payload, then the tail. Whole
    /// buffers move by handle; a buffer straddling the boundary is split into
    /// two references over the same storage. Returns the number of bytes left
    /// in this packet. At zero every region is empty.
    pub fn fragment(&mut self, destination: &mut Packet, fragment_len: usize) -> usize {
        let mut moved = 0;
        for region in [&mut self.head, &mut self.payload, &mut self.tail] {
            if moved == fragment_len {
                break;
            }
            moved += region.move_front_into(&mut destination.payload, fragment_len - moved);
        }

        let remaining = self.size();
        if remaining == 0 {
            self.head.clear();
            self.payload.clear();
            self.tail.clear();
        }
        debug!(moved, remaining, "fragmented packet");
        remaining
    }

    /// Append this packet's payload, by reference, onto `destination`'s
    /// payload. This packet's head and tail are discarded.
    pub fn reassemble(mut self, destination: &mut Packet) {
        trace!(bytes = self.payload.len(), "reassembling fragment");
        destination.payload.append(&mut self.payload);
    }

    /// CRC-16 of every byte of the frame, head first.
    pub fn crc16(&self, algorithm: &Crc<u16>) -> u16 {
        let mut digest = algorithm.digest();
        for region in self.regions() {
            for segment in region.iter() {
                segment.with_bytes(|bytes| digest.update(bytes));
            }
        }
        digest.finalize()
    }

    /// Compare the frame's CRC-16 against `expected`.
    pub fn verify_crc16(&self, algorithm: &Crc<u16>, expected: u16) -> Result<()> {
        let computed = self.crc16(algorithm);
        if computed != expected {
            return Err(PacketError::CrcMismatch { expected, computed });
        }
        Ok(())
    }

    /// Copy the whole frame into a new vector.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let size = self.size();
        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|_| PacketError::NoMemory { requested: size })?;
        for region in self.regions() {
            for segment in region.iter() {
                segment.with_bytes(|bytes| out.extend_from_slice(bytes));
            }
        }
        Ok(out)
    }

    /// Copy the whole frame into an immutable [`Bytes`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.to_vec().map(Bytes::from)
    }

    fn regions(&self) -> [&SegmentList; 3] {
        [&self.head, &self.payload, &self.tail]
    }
}

fn push_fresh(region: &mut SegmentList, size: usize) -> Result<()> {
    if size > 0 {
        region.push_back(Buffer::allocate(size)?);
    }
    Ok(())
}

fn copy_region(source: &SegmentList, dest: &mut SegmentList) -> Result<()> {
    if !source.is_empty() {
        let mut copy = Buffer::allocate(source.len())?;
        let mut offset = 0;
        for segment in source.iter() {
            segment.with_bytes(|bytes| offset += copy.write(offset, bytes));
        }
        dest.push_back(copy);
    }
    Ok(())
}

fn write_region(region: &mut SegmentList, src: &[u8]) -> Result<()> {
    if src.len() > region.len() {
        return Err(PacketError::CapacityExceeded {
            required: src.len(),
            capacity: region.len(),
        });
    }
    region.write(0, src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ARC: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_ARC);

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    /// A packet with bytes spread over head, several payload buffers and tail.
    fn layered(bytes: &[u8]) -> Packet {
        let head_len = bytes.len().min(2);
        let tail_len = bytes.len().saturating_sub(head_len).min(2);
        let body = &bytes[head_len..bytes.len() - tail_len];

        let mut packet = Packet::allocate(head_len, 0, tail_len).unwrap();
        packet.write_head(&bytes[..head_len]).unwrap();
        packet.write_tail(&bytes[bytes.len() - tail_len..]).unwrap();
        for chunk in body.chunks(3) {
            packet.append_payload(Buffer::copy_from_slice(chunk).unwrap());
        }
        packet
    }

    fn split_and_rebuild(sent: &[u8], fragment_len: usize) -> Vec<u8> {
        let mut upper = layered(sent);
        let mut accumulator = Packet::empty();
        loop {
            let mut lower = Packet::empty();
            let remaining = upper.fragment(&mut lower, fragment_len);
            assert!(lower.size() <= fragment_len);
            lower.reassemble(&mut accumulator);
            if remaining == 0 {
                break;
            }
        }
        assert!(upper.is_empty());
        accumulator.to_vec().unwrap()
    }

    #[test]
    fn allocate_sizes_add_up() {
        let packet = Packet::allocate(1, 10, 2).unwrap();
        assert_eq!(packet.head_size(), 1);
        assert_eq!(packet.payload_size(), 10);
        assert_eq!(packet.tail_size(), 2);
        assert_eq!(packet.size(), 13);

        let empty = Packet::allocate(0, 0, 0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.payload().segment_count(), 0);
    }

    #[test]
    fn fragment_then_reassemble_restores_every_length() {
        let sent = sample(23);
        for fragment_len in 1..=sent.len() {
            assert_eq!(
                split_and_rebuild(&sent, fragment_len),
                sent,
                "fragment length {fragment_len}"
            );
        }
    }

    #[test]
    fn fragment_shares_storage_instead_of_copying() {
        let mut upper = Packet::from_slice(b"abcdefgh").unwrap();
        let mut lower = Packet::empty();

        let remaining = upper.fragment(&mut lower, 5);
        assert_eq!(remaining, 3);
        assert_eq!(lower.to_vec().unwrap(), b"abcde");
        assert_eq!(upper.to_vec().unwrap(), b"fgh");

        let lower_buf = lower.payload().front().unwrap();
        let upper_buf = upper.payload().front().unwrap();
        assert!(lower_buf.shares_storage_with(upper_buf));
        assert_eq!(lower_buf.ref_count(), 2);
    }

    #[test]
    fn fragment_consuming_everything_clears_upper() {
        let mut upper = Packet::allocate(1, 4, 1).unwrap();
        let mut lower = Packet::empty();
        assert_eq!(upper.fragment(&mut lower, 64), 0);
        assert!(upper.is_empty());
        assert_eq!(upper.head().segment_count(), 0);
        assert_eq!(upper.tail().segment_count(), 0);
        assert_eq!(lower.payload_size(), 6);
    }

    #[test]
    fn fragment_lands_after_existing_destination_head() {
        let mut upper = Packet::from_slice(b"data").unwrap();
        let mut lower = Packet::allocate(1, 0, 0).unwrap();
        lower.write_head(&[0x7f]).unwrap();
        upper.fragment(&mut lower, 2);
        assert_eq!(lower.to_vec().unwrap(), vec![0x7f, b'd', b'a']);
    }

    #[test]
    fn continuous_payload_is_idempotent() {
        let mut packet = Packet::empty();
        for part in [&b"ab"[..], b"cd", b"e"] {
            packet.append_payload(Buffer::copy_from_slice(part).unwrap());
        }
        let first = packet.continuous_payload().unwrap().to_vec();
        assert_eq!(first, b"abcde");
        assert_eq!(packet.payload().segment_count(), 1);

        let before = packet.payload().front().unwrap().reference();
        let second = packet.continuous_payload().unwrap();
        assert_eq!(second.to_vec(), first);
        assert!(second.shares_storage_with(&before));
    }

    #[test]
    fn continuous_payload_on_empty_payload_fails() {
        let mut packet = Packet::allocate(2, 0, 2).unwrap();
        assert_eq!(packet.continuous_payload().unwrap_err(), PacketError::NoStorage);
    }

    #[test]
    fn read_and_write_payload_stay_in_window() {
        let mut packet = Packet::allocate(2, 4, 2).unwrap();
        assert_eq!(packet.write_payload(b"wxyz!", 0), 4);
        assert_eq!(packet.write_payload(b"q", 4), 0);

        let mut dst = [0u8; 8];
        assert_eq!(packet.read_payload(&mut dst, 1), 3);
        assert_eq!(&dst[..3], b"xyz");
        assert_eq!(packet.read_payload(&mut dst, 9), 0);
    }

    #[test]
    fn read_spans_head_payload_and_tail() {
        let packet = layered(b"HHpayloadTT");
        let mut dst = [0u8; 6];
        assert_eq!(packet.read(&mut dst, 0), 6);
        assert_eq!(&dst, b"HHpayl");
        assert_eq!(packet.read(&mut dst, 7), 4);
        assert_eq!(&dst[..4], b"adTT");
    }

    #[test]
    fn extract_head_and_tail_shrink_payload() {
        let mut packet = Packet::empty();
        packet.append_payload(Buffer::copy_from_slice(b"\x01abc").unwrap());
        packet.append_payload(Buffer::copy_from_slice(b"def\x12\x34").unwrap());

        let mut kind = [0u8; 1];
        packet.extract_head(&mut kind).unwrap();
        assert_eq!(kind, [0x01]);

        let mut fcs = [0u8; 2];
        packet.extract_tail(&mut fcs).unwrap();
        assert_eq!(fcs, [0x12, 0x34]);
        assert_eq!(packet.to_vec().unwrap(), b"abcdef");
    }

    #[test]
    fn extract_past_payload_is_a_no_op() {
        let mut packet = Packet::from_slice(b"abc").unwrap();
        let mut dst = [0u8; 4];
        let err = packet.extract_tail(&mut dst).unwrap_err();
        assert_eq!(
            err,
            PacketError::Underflow {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(packet.to_vec().unwrap(), b"abc");
    }

    #[test]
    fn write_head_rejects_oversized_source() {
        let mut packet = Packet::allocate(1, 0, 0).unwrap();
        let err = packet.write_head(&[1, 2]).unwrap_err();
        assert!(matches!(err, PacketError::CapacityExceeded { required: 2, capacity: 1 }));
    }

    #[test]
    fn reference_allocate_copies_framing_and_shares_payload() {
        let source = layered(b"HHbodyTT");
        let mut copy = Packet::reference_allocate(&source).unwrap();
        assert_eq!(copy.to_vec().unwrap(), b"HHbodyTT");

        let src_payload = source.payload().front().unwrap();
        assert!(copy.payload().front().unwrap().shares_storage_with(src_payload));
        assert!(!copy.head().front().unwrap().shares_storage_with(source.head().front().unwrap()));

        copy.write_head(b"xx").unwrap();
        assert_eq!(source.head().to_vec(), b"HH");
    }

    #[test]
    fn inherit_allocate_wraps_whole_frame() {
        let source = layered(b"HHbodyTT");
        let wrapped = Packet::inherit_allocate(&source, 1, 2).unwrap();
        assert_eq!(wrapped.payload_size(), source.size());
        assert_eq!(wrapped.size(), source.size() + 3);
        assert_eq!(wrapped.payload().to_vec(), b"HHbodyTT");
    }

    #[test]
    fn crc16_covers_whole_frame() {
        // Check value for CRC-16/ARC over "123456789".
        let packet = layered(b"123456789");
        assert_eq!(packet.crc16(&ARC), 0xBB3D);
        assert!(packet.verify_crc16(&ARC, 0xBB3D).is_ok());

        let err = packet.verify_crc16(&ARC, 0x0000).unwrap_err();
        assert_eq!(
            err,
            PacketError::CrcMismatch {
                expected: 0x0000,
                computed: 0xBB3D
            }
        );
    }

    #[test]
    fn dropping_a_fragment_releases_its_reference() {
        let mut upper = Packet::from_slice(b"abcdef").unwrap();
        let mut lower = Packet::empty();
        upper.fragment(&mut lower, 3);
        assert_eq!(upper.payload().front().unwrap().ref_count(), 2);
        drop(lower);
        assert_eq!(upper.payload().front().unwrap().ref_count(), 1);
    }

    proptest! {
        #[test]
        fn fragmentation_inverse(
            bytes in proptest::collection::vec(any::<u8>(), 1..200),
            fragment_len in 1usize..64,
        ) {
            prop_assert_eq!(split_and_rebuild(&bytes, fragment_len), bytes);
        }
    }
}
