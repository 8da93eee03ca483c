//! Circular buffers with a fixed capacity
//!
//! Used wherever state has to survive from one audio block to the next:
//! signal traces for display, spectrum history for a waterfall.
//!
//! Writes never block and never reallocate. Once the buffer is full, every
//! further write drops the oldest element.
//!
//! Two indexing strategies are available, selected at construction:
//! - modulo indexing, any capacity
//! - masked indexing, capacity must be a power of 2 (`index & (capacity - 1)`)

use crate::error::{Result, RttyError};

/// How a logical position is wrapped onto the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    Modulo,
    Masked { mask: usize },
}

impl Indexing {
    #[inline]
    fn wrap(self, index: usize, capacity: usize) -> usize {
        match self {
            Indexing::Modulo => index % capacity,
            Indexing::Masked { mask } => index & mask,
        }
    }
}

/// Read/write cursors shared by the scalar and the frame buffers
#[derive(Debug, Clone)]
struct Cursor {
    read_index: usize,
    write_index: usize,
    len: usize,
    capacity: usize,
    indexing: Indexing,
}

impl Cursor {
    fn new(capacity: usize, indexing: Indexing) -> Self {
        Self {
            read_index: 0,
            write_index: 0,
            len: 0,
            capacity,
            indexing,
        }
    }

    #[inline]
    fn wrap(&self, index: usize) -> usize {
        self.indexing.wrap(index, self.capacity)
    }

    /// Slot for the next write; advances the write cursor and, when full,
    /// the read cursor as well.
    fn advance_write(&mut self) -> usize {
        let slot = self.write_index;
        self.write_index = self.wrap(self.write_index + 1);
        if self.len < self.capacity {
            self.len += 1;
        } else {
            self.read_index = self.wrap(self.read_index + 1);
        }
        slot
    }

    /// Resolve a logical offset from the read cursor. Negative offsets count
    /// back from the newest element.
    fn resolve(&self, offset: isize) -> Option<usize> {
        let logical = if offset < 0 {
            offset + self.len as isize
        } else {
            offset
        };
        if logical < 0 || logical as usize >= self.len {
            return None;
        }
        Some(self.wrap(self.read_index + logical as usize))
    }

    fn pop_front(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let slot = self.read_index;
        self.read_index = self.wrap(self.read_index + 1);
        self.len -= 1;
        Some(slot)
    }

    fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.len = 0;
    }
}

/// Ring buffer of scalar values
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    cursor: Cursor,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Ring buffer with modulo indexing
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RttyError::ZeroCapacity);
        }
        Ok(Self {
            buffer: vec![T::default(); capacity],
            cursor: Cursor::new(capacity, Indexing::Modulo),
        })
    }

    /// Ring buffer with bitmask indexing
    ///
    /// Fails unless `capacity` is a power of 2.
    pub fn new_masked(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RttyError::ZeroCapacity);
        }
        if !capacity.is_power_of_two() {
            return Err(RttyError::CapacityNotPowerOfTwo(capacity));
        }
        Ok(Self {
            buffer: vec![T::default(); capacity],
            cursor: Cursor::new(capacity, Indexing::Masked { mask: capacity - 1 }),
        })
    }

    pub fn indexing(&self) -> Indexing {
        self.cursor.indexing
    }

    pub fn capacity(&self) -> usize {
        self.cursor.capacity
    }

    pub fn len(&self) -> usize {
        self.cursor.len
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor.len == self.cursor.capacity
    }

    /// Append one value, overwriting the oldest when full
    pub fn put(&mut self, value: T) {
        let slot = self.cursor.advance_write();
        self.buffer[slot] = value;
    }

    /// Append values in order
    pub fn put_slice(&mut self, values: &[T]) {
        for &value in values {
            self.put(value);
        }
    }

    /// Element `offset` positions after the read cursor
    ///
    /// Negative offsets index from the end of the held region, so `get(-1)`
    /// is the newest element. Returns `None` outside the held region.
    pub fn get(&self, offset: isize) -> Option<T> {
        self.cursor.resolve(offset).map(|slot| self.buffer[slot])
    }

    /// Pop the oldest element
    pub fn remove(&mut self) -> Option<T> {
        self.cursor.pop_front().map(|slot| self.buffer[slot])
    }

    /// Held elements, oldest first
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.cursor.len).map(move |i| self.buffer[self.cursor.wrap(self.cursor.read_index + i)])
    }

    /// Copy the held elements out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.cursor.clear();
    }
}

/// Ring buffer of fixed-width frames stored contiguously
///
/// Each slot holds `unit` elements (e.g. one spectrum snapshot).
#[derive(Debug, Clone)]
pub struct FrameRingBuffer<T> {
    buffer: Vec<T>,
    unit: usize,
    cursor: Cursor,
}

impl<T: Copy + Default> FrameRingBuffer<T> {
    pub fn new(unit: usize, capacity: usize) -> Result<Self> {
        if unit == 0 {
            return Err(RttyError::ZeroFrameWidth);
        }
        if capacity == 0 {
            return Err(RttyError::ZeroCapacity);
        }
        Ok(Self {
            buffer: vec![T::default(); unit * capacity],
            unit,
            cursor: Cursor::new(capacity, Indexing::Modulo),
        })
    }

    /// Elements per frame
    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn capacity(&self) -> usize {
        self.cursor.capacity
    }

    pub fn len(&self) -> usize {
        self.cursor.len
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.len == 0
    }

    fn frame_range(&self, slot: usize) -> std::ops::Range<usize> {
        let begin = slot * self.unit;
        begin..begin + self.unit
    }

    /// Copy a frame into the next slot
    ///
    /// Short frames are zero-padded, long frames truncated to `unit`.
    pub fn put(&mut self, frame: &[T]) {
        let n = frame.len().min(self.unit);
        let slot = self.next_slot();
        slot[..n].copy_from_slice(&frame[..n]);
        slot[n..].fill(T::default());
    }

    /// Mutable view of the next frame position
    ///
    /// The cursors advance as for a put, so the slot counts as written even
    /// if the caller leaves its previous contents in place.
    pub fn next_slot(&mut self) -> &mut [T] {
        let slot = self.cursor.advance_write();
        let range = self.frame_range(slot);
        &mut self.buffer[range]
    }

    /// Frame `offset` positions after the read cursor (negative from the end)
    pub fn get(&self, offset: isize) -> Option<&[T]> {
        self.cursor
            .resolve(offset)
            .map(|slot| &self.buffer[self.frame_range(slot)])
    }

    /// Held frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.cursor.len as isize).filter_map(move |i| self.get(i))
    }

    pub fn clear(&mut self) {
        self.cursor.clear();
    }
}
