use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{PacketError, Result};

type Storage = Rc<RefCell<Box<[u8]>>>;

/// A window onto reference-counted backing storage.
///
/// A buffer is either the only handle on its storage (owned) or one of several
/// handles that share it (referenced). Every handle carries its own
/// `offset`/`len` window, so two references may expose disjoint parts of the
/// same allocation. Storage is released when the last handle is dropped.
///
/// Writes go to the shared storage and are visible through every reference
/// whose window covers the written bytes.
pub struct Buffer {
    storage: Storage,
    offset: usize,
    len: usize,
}

impl Buffer {
    /// Allocate a zero-filled buffer of `size` bytes.
    ///
    /// Returns [`PacketError::NoMemory`] instead of aborting when the
    /// allocator refuses the request.
    pub fn allocate(size: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| PacketError::NoMemory { requested: size })?;
        bytes.resize(size, 0);
        Ok(Self {
            storage: Rc::new(RefCell::new(bytes.into_boxed_slice())),
            offset: 0,
            len: size,
        })
    }

    /// Allocate a buffer holding a copy of `src`.
    pub fn copy_from_slice(src: &[u8]) -> Result<Self> {
        let mut buffer = Self::allocate(src.len())?;
        buffer.write(0, src);
        Ok(buffer)
    }

    /// Create a new handle on the same storage with the same window.
    ///
    /// No bytes are copied. The returned buffer may be resized independently.
    pub fn reference(&self) -> Self {
        Self {
            storage: Rc::clone(&self.storage),
            offset: self.offset,
            len: self.len,
        }
    }

    /// Move this handle's window to `offset..offset + len` of the storage.
    pub fn resize(&mut self, offset: usize, len: usize) -> Result<()> {
        let capacity = self.capacity();
        match offset.checked_add(len) {
            Some(end) if end <= capacity => {
                self.offset = offset;
                self.len = len;
                Ok(())
            }
            _ => Err(PacketError::WindowOutOfBounds {
                offset,
                len,
                capacity,
            }),
        }
    }

    /// Logical length of the window.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the window within the backing storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.storage.borrow().len()
    }

    /// Number of live handles on the backing storage.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.storage)
    }

    /// Whether any other handle shares this buffer's storage.
    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// Whether `other` is a handle on the same storage.
    pub fn shares_storage_with(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    /// Copy bytes starting at `offset` within the window into `dst`.
    ///
    /// Returns the number of bytes copied, which is short when the window ends
    /// first and zero when `offset` is past the window.
    pub fn read(&self, offset: usize, dst: &mut [u8]) -> usize {
        if offset >= self.len {
            return 0;
        }
        let count = dst.len().min(self.len - offset);
        let start = self.offset + offset;
        let storage = self.storage.borrow();
        dst[..count].copy_from_slice(&storage[start..start + count]);
        count
    }

    /// Copy `src` into the window starting at `offset`.
    ///
    /// Returns the number of bytes written; nothing is written past the window.
    pub fn write(&mut self, offset: usize, src: &[u8]) -> usize {
        if offset >= self.len {
            return 0;
        }
        let count = src.len().min(self.len - offset);
        let start = self.offset + offset;
        let mut storage = self.storage.borrow_mut();
        storage[start..start + count].copy_from_slice(&src[..count]);
        count
    }

    /// Run `f` over the bytes of the window.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let storage = self.storage.borrow();
        f(&storage[self.offset..self.offset + self.len])
    }

    /// Copy the window into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(<[u8]>::to_vec)
    }

    /// Split off the first `at` bytes as a new reference.
    ///
    /// `self` keeps the remainder. Both handles share the storage.
    pub(crate) fn split_to(&mut self, at: usize) -> Buffer {
        let at = at.min(self.len);
        let front = Buffer {
            storage: Rc::clone(&self.storage),
            offset: self.offset,
            len: at,
        };
        self.offset += at;
        self.len -= at;
        front
    }

    /// Drop `count` bytes from the front of the window.
    pub(crate) fn advance(&mut self, count: usize) {
        let count = count.min(self.len);
        self.offset += count;
        self.len -= count;
    }

    /// Drop `count` bytes from the back of the window.
    pub(crate) fn truncate_back(&mut self, count: usize) {
        self.len -= count.min(self.len);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("refs", &self.ref_count())
            .finish()
    }
}
