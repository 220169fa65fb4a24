//! Append-only byte buffer with inline storage.

/// Bytes held inline before the buffer moves to the heap.
pub const INLINE_CAPACITY: usize = 1024;

/// An append-only byte buffer that starts in a fixed inline array and
/// spills to a heap `Vec` once a record outgrows it.
///
/// After spilling the heap allocation is kept across [`clear`](Self::clear),
/// so a recycled buffer that once held a large record does not reallocate.
pub struct RecordBuffer {
    inline: [u8; INLINE_CAPACITY],
    len: usize,
    heap: Vec<u8>,
    spilled: bool,
}

impl RecordBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            inline: [0; INLINE_CAPACITY],
            len: 0,
            heap: Vec::new(),
            spilled: false,
        }
    }

    /// Appends a single byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.extend_from_slice(&[byte]);
    }

    /// Appends a slice of bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        if self.spilled {
            self.heap.extend_from_slice(bytes);
            return;
        }
        let end = self.len + bytes.len();
        if end <= INLINE_CAPACITY {
            self.inline[self.len..end].copy_from_slice(bytes);
            self.len = end;
        } else {
            self.heap.clear();
            self.heap.reserve(end.max(2 * INLINE_CAPACITY));
            self.heap.extend_from_slice(&self.inline[..self.len]);
            self.heap.extend_from_slice(bytes);
            self.spilled = true;
        }
    }

    /// Returns the accumulated bytes.
    pub fn as_slice(&self) -> &[u8] {
        if self.spilled {
            &self.heap
        } else {
            &self.inline[..self.len]
        }
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        if self.spilled {
            self.heap.len()
        } else {
            self.len
        }
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the contents have moved to the heap.
    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    /// Empties the buffer and returns to inline storage.
    pub fn clear(&mut self) {
        self.len = 0;
        self.heap.clear();
        self.spilled = false;
    }
}

impl Default for RecordBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("len", &self.len())
            .field("spilled", &self.spilled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_records_stay_inline() {
        let mut buf = RecordBuffer::new();
        buf.push(1);
        buf.extend_from_slice(&[2, 3, 4]);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_spilled());
    }

    #[test]
    fn exactly_full_inline_does_not_spill() {
        let mut buf = RecordBuffer::new();
        buf.extend_from_slice(&[7u8; INLINE_CAPACITY]);
        assert!(!buf.is_spilled());
        assert_eq!(buf.len(), INLINE_CAPACITY);
    }

    #[test]
    fn overflow_spills_and_preserves_contents() {
        let mut buf = RecordBuffer::new();
        buf.extend_from_slice(&[1u8; INLINE_CAPACITY - 1]);
        buf.extend_from_slice(&[2, 3]);
        assert!(buf.is_spilled());
        assert_eq!(buf.len(), INLINE_CAPACITY + 1);
        assert_eq!(buf.as_slice()[INLINE_CAPACITY - 2], 1);
        assert_eq!(&buf.as_slice()[INLINE_CAPACITY - 1..], &[2, 3]);

        buf.push(4);
        assert_eq!(buf.as_slice().last(), Some(&4));
    }

    #[test]
    fn clear_returns_to_inline() {
        let mut buf = RecordBuffer::new();
        buf.extend_from_slice(&vec![0u8; 3 * INLINE_CAPACITY]);
        buf.clear();
        assert!(buf.is_empty());
        assert!(!buf.is_spilled());
        buf.extend_from_slice(b"abc");
        assert_eq!(buf.as_slice(), b"abc");
    }
}
