use std::collections::VecDeque;

use crate::buffer::Buffer;

/// Ordered run of buffers forming one region of a packet.
///
/// The byte length is tracked alongside the buffers so size queries are O(1).
#[derive(Debug, Default)]
pub struct SegmentList {
    segments: VecDeque<Buffer>,
    len: usize,
}

impl SegmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across every segment.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buffers in the list, including zero-length ones.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.segments.iter()
    }

    pub fn front(&self) -> Option<&Buffer> {
        self.segments.front()
    }

    pub fn push_back(&mut self, buffer: Buffer) {
        self.len += buffer.len();
        self.segments.push_back(buffer);
    }

    pub fn push_front(&mut self, buffer: Buffer) {
        self.len += buffer.len();
        self.segments.push_front(buffer);
    }

    pub fn pop_front(&mut self) -> Option<Buffer> {
        let buffer = self.segments.pop_front()?;
        self.len -= buffer.len();
        Some(buffer)
    }

    pub fn pop_back(&mut self) -> Option<Buffer> {
        let buffer = self.segments.pop_back()?;
        self.len -= buffer.len();
        Some(buffer)
    }

    /// Move every segment of `other` onto the back of this list.
    pub fn append(&mut self, other: &mut SegmentList) {
        self.len += other.len;
        other.len = 0;
        self.segments.append(&mut other.segments);
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.len = 0;
    }

    /// Copy bytes starting at `offset` into `dst`, crossing segment borders.
    pub fn read(&self, offset: usize, dst: &mut [u8]) -> usize {
        let mut skip = offset;
        let mut copied = 0;
        for segment in &self.segments {
            if copied == dst.len() {
                break;
            }
            if skip >= segment.len() {
                skip -= segment.len();
                continue;
            }
            copied += segment.read(skip, &mut dst[copied..]);
            skip = 0;
        }
        copied
    }

    /// Copy `src` into the list starting at `offset`, crossing segment borders.
    pub fn write(&mut self, offset: usize, src: &[u8]) -> usize {
        let mut skip = offset;
        let mut written = 0;
        for segment in &mut self.segments {
            if written == src.len() {
                break;
            }
            if skip >= segment.len() {
                skip -= segment.len();
                continue;
            }
            written += segment.write(skip, &src[written..]);
            skip = 0;
        }
        written
    }

    /// Move up to `count` bytes from the front of this list to the back of
    /// `dest`. A segment straddling the boundary is split by reference.
    ///
    /// Returns the number of bytes moved.
    pub fn move_front_into(&mut self, dest: &mut SegmentList, count: usize) -> usize {
        let mut moved = 0;
        while moved < count {
            let Some(mut segment) = self.pop_front() else {
                break;
            };
            let want = count - moved;
            if segment.len() <= want {
                moved += segment.len();
                dest.push_back(segment);
            } else {
                let front = segment.split_to(want);
                moved += front.len();
                dest.push_back(front);
                self.push_front(segment);
            }
        }
        moved
    }

    /// Drop `count` bytes from the front. Segments emptied along the way are
    /// released.
    pub fn trim_front(&mut self, count: usize) {
        let mut remaining = count.min(self.len);
        while remaining > 0 {
            let Some(front) = self.segments.front_mut() else {
                break;
            };
            let take = remaining.min(front.len());
            front.advance(take);
            self.len -= take;
            remaining -= take;
            if front.is_empty() {
                self.segments.pop_front();
            }
        }
    }

    /// Drop `count` bytes from the back.
    pub fn trim_back(&mut self, count: usize) {
        let mut remaining = count.min(self.len);
        while remaining > 0 {
            let Some(back) = self.segments.back_mut() else {
                break;
            };
            let take = remaining.min(back.len());
            back.truncate_back(take);
            self.len -= take;
            remaining -= take;
            if back.is_empty() {
                self.segments.pop_back();
            }
        }
    }

    /// Copy the whole region into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for segment in &self.segments {
            segment.with_bytes(|bytes| out.extend_from_slice(bytes));
        }
        out
    }
}
