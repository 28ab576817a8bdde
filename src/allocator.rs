use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use core::iter::FusedIterator;

use crate::error::BitAllocError;

/// Number of bits inspected together by [`BitAllocator::mark_next`].
pub const WORD_BITS: usize = u64::BITS as usize;

const WORD_BYTES: usize = WORD_BITS / 8;

/// Computes the number of bytes needed to address `bit_count` bits.
///
/// This is the length of the raw view returned by [`BitAllocator::as_raw`].
///
/// # Examples
/// ```
/// use bit_alloc::byte_count;
///
/// assert_eq!(byte_count(0), 0);
/// assert_eq!(byte_count(9), 2);
/// assert_eq!(byte_count(16), 2);
/// assert_eq!(byte_count(17), 3);
/// ```
pub const fn byte_count(bit_count: usize) -> usize {
    bit_count.div_ceil(8)
}

/// Number of words backing `bit_count` bits. Never zero, so an empty map
/// still owns a buffer.
pub(crate) const fn word_count(bit_count: usize) -> usize {
    let words = bit_count.div_ceil(WORD_BITS);
    if words == 0 { 1 } else { words }
}

/// Mask of the bits of word `word_idx` that lie below `bit_count`.
pub(crate) const fn valid_mask(bit_count: usize, word_idx: usize) -> u64 {
    let start = word_idx * WORD_BITS;
    if bit_count <= start {
        0
    } else if bit_count - start >= WORD_BITS {
        !0
    } else {
        (1 << (bit_count - start)) - 1
    }
}

#[inline]
fn load_word(chunk: &[u8]) -> u64 {
    let mut bytes = [0u8; WORD_BYTES];
    bytes.copy_from_slice(chunk);
    u64::from_le_bytes(bytes)
}

fn zeroed(bytes: usize) -> Result<Vec<u8>, BitAllocError> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(bytes)
        .map_err(|_| BitAllocError::OutOfMemory { bytes })?;
    storage.resize(bytes, 0);
    Ok(storage)
}

/// Fixed-capacity allocator handing out single bits.
///
/// Bit `i` lives in byte `i / 8` at offset `i % 8`, least significant bit
/// first. A set bit is in use, a clear bit is free. The number of free bits
/// is cached and kept current by [`mark`], [`unmark`] and [`mark_next`].
///
/// The backing buffer is rounded up to whole 64-bit words so that
/// [`mark_next`] can skip full words with a single comparison. Bits at or
/// above the capacity are never handed out.
///
/// # Examples
/// ```
/// use bit_alloc::BitAllocator;
///
/// let mut frames = BitAllocator::new(4)?;
/// frames.mark(0);
/// assert_eq!(frames.mark_next(), Some(1));
/// assert_eq!(frames.free_count(), 2);
/// frames.unmark(0);
/// assert_eq!(frames.mark_next(), Some(0));
/// # Ok::<(), bit_alloc::BitAllocError>(())
/// ```
///
/// [`mark`]: BitAllocator::mark
/// [`unmark`]: BitAllocator::unmark
/// [`mark_next`]: BitAllocator::mark_next
#[derive(PartialEq, Eq, Hash, Clone)]
pub struct BitAllocator {
    capacity: usize,
    free: usize,
    storage: Vec<u8>,
}

impl BitAllocator {
    /// Creates an allocator for `capacity` bits, all of them free.
    ///
    /// # Errors
    /// Returns [`BitAllocError::OutOfMemory`] if the backing buffer cannot be
    /// reserved.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let ids = BitAllocator::new(100)?;
    /// assert_eq!(ids.capacity(), 100);
    /// assert_eq!(ids.free_count(), 100);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    pub fn new(capacity: usize) -> Result<Self, BitAllocError> {
        let storage = zeroed(word_count(capacity) * WORD_BYTES)?;
        log::debug!(
            "bit allocator created: {capacity} bits in {} bytes",
            storage.len()
        );
        Ok(Self {
            capacity,
            free: capacity,
            storage,
        })
    }

    /// Creates an allocator from a map previously copied out with
    /// [`as_raw`].
    ///
    /// `bytes` must hold exactly [`byte_count(capacity)`] bytes. Bits above
    /// `capacity` in the final byte are cleared and the free count is
    /// recomputed from the map.
    ///
    /// # Errors
    /// Returns [`BitAllocError::LengthMismatch`] if `bytes` has the wrong
    /// length and [`BitAllocError::OutOfMemory`] if the buffer cannot be
    /// reserved.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let restored = BitAllocator::from_raw(10, &[0b0000_0101, 0b1111_1110])?;
    /// assert!(restored.is_marked(0));
    /// assert!(restored.is_marked(9));
    /// assert_eq!(restored.free_count(), 7);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    ///
    /// [`as_raw`]: BitAllocator::as_raw
    /// [`byte_count(capacity)`]: crate::byte_count
    pub fn from_raw(capacity: usize, bytes: &[u8]) -> Result<Self, BitAllocError> {
        let expected = byte_count(capacity);
        if bytes.len() != expected {
            return Err(BitAllocError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let mut storage = zeroed(word_count(capacity) * WORD_BYTES)?;
        storage[..expected].copy_from_slice(bytes);
        let mut allocator = Self {
            capacity,
            free: 0,
            storage,
        };
        allocator.clean_unused_bits();
        allocator.recount();
        log::debug!(
            "bit allocator loaded: {capacity} bits, {} free",
            allocator.free
        );
        Ok(allocator)
    }

    /// Total number of bits managed by this allocator.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bits currently free.
    ///
    /// Runs in O(1). Only reflects changes made through this type's own
    /// methods; see [`as_raw_mut`](BitAllocator::as_raw_mut).
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free
    }

    /// Number of bits currently in use.
    #[inline]
    pub fn used_count(&self) -> usize {
        self.capacity - self.free
    }

    /// Returns `true` if no free bit is left.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.free == 0
    }

    /// Marks the bit at the given index as used.
    ///
    /// Marking a bit that is already used does nothing.
    ///
    /// # Panics
    /// Panics if `bit >= capacity`.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let mut ids = BitAllocator::new(8)?;
    /// ids.mark(3);
    /// ids.mark(3);
    /// assert!(ids.is_marked(3));
    /// assert_eq!(ids.free_count(), 7);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    #[inline]
    pub fn mark(&mut self, bit: usize) {
        assert!(bit < self.capacity, "Bit index {bit} out of bounds");
        let (byte_idx, offset) = Self::idxs(bit);
        let byte = &mut self.storage[byte_idx];
        if (*byte >> offset) & 1 == 0 {
            *byte |= 1 << offset;
            self.free = self.free.saturating_sub(1);
        }
    }

    /// Marks the bit at the given index as free.
    ///
    /// Unmarking a bit that is already free does nothing.
    ///
    /// # Panics
    /// Panics if `bit >= capacity`.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let mut ids = BitAllocator::new(8)?;
    /// ids.mark(5);
    /// ids.unmark(5);
    /// assert!(!ids.is_marked(5));
    /// assert_eq!(ids.free_count(), 8);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    #[inline]
    pub fn unmark(&mut self, bit: usize) {
        assert!(bit < self.capacity, "Bit index {bit} out of bounds");
        let (byte_idx, offset) = Self::idxs(bit);
        let byte = &mut self.storage[byte_idx];
        if (*byte >> offset) & 1 != 0 {
            *byte &= !(1 << offset);
            self.free = (self.free + 1).min(self.capacity);
        }
    }

    /// Returns `true` if the bit at the given index is in use.
    ///
    /// # Panics
    /// Panics if `bit >= capacity`.
    #[inline]
    pub fn is_marked(&self, bit: usize) -> bool {
        assert!(bit < self.capacity, "Bit index {bit} out of bounds");
        let (byte_idx, offset) = Self::idxs(bit);
        (self.storage[byte_idx] >> offset) & 1 != 0
    }

    /// Marks the lowest free bit as used and returns its index.
    ///
    /// Returns `None` once every bit is in use. The map is scanned one
    /// 64-bit word at a time and words with every bit set are skipped
    /// without looking at individual bits, so a call costs at most
    /// O(capacity / 64).
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let mut slots = BitAllocator::new(3)?;
    /// slots.mark(1);
    /// assert_eq!(slots.mark_next(), Some(0));
    /// assert_eq!(slots.mark_next(), Some(2));
    /// assert_eq!(slots.mark_next(), None);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    pub fn mark_next(&mut self) -> Option<usize> {
        let capacity = self.capacity;
        for (word_idx, chunk) in self.storage.chunks_exact_mut(WORD_BYTES).enumerate() {
            let word = load_word(chunk);
            if word == u64::MAX {
                continue;
            }
            // clear bits past the capacity are padding, not free bits
            let free_bits = !word & valid_mask(capacity, word_idx);
            if free_bits == 0 {
                continue;
            }
            let offset = free_bits.trailing_zeros() as usize;
            chunk.copy_from_slice(&(word | 1 << offset).to_le_bytes());
            self.free = self.free.saturating_sub(1);
            let bit = word_idx * WORD_BITS + offset;
            log::trace!("marked next free bit {bit}");
            return Some(bit);
        }
        log::debug!("bit allocator exhausted: all {capacity} bits in use");
        None
    }

    /// Returns an iterator over the indices of all used bits, in ascending
    /// order.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let mut ids = BitAllocator::new(70)?;
    /// ids.mark(2);
    /// ids.mark(67);
    /// let mut marked = ids.iter_marked();
    /// assert_eq!(marked.next(), Some(2));
    /// assert_eq!(marked.next(), Some(67));
    /// assert_eq!(marked.next(), None);
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    #[inline]
    pub fn iter_marked(&self) -> IterMarked<'_> {
        IterMarked {
            storage: &self.storage,
            capacity: self.capacity,
            word_idx: 0,
            current: self.storage.get(..WORD_BYTES).map_or(0, load_word)
                & valid_mask(self.capacity, 0),
        }
    }

    /// Length in bytes of the raw map, i.e. [`byte_count(capacity)`].
    ///
    /// [`byte_count(capacity)`]: crate::byte_count
    #[inline]
    pub fn byte_len(&self) -> usize {
        byte_count(self.capacity)
    }

    /// Returns the raw map, one bit per index in the layout described on
    /// [`BitAllocator`].
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        &self.storage[..self.byte_len()]
    }

    /// Returns the raw map for bulk writes.
    ///
    /// Writes through this slice bypass the free count. Call [`recount`]
    /// afterwards if [`free_count`] is needed again.
    ///
    /// # Examples
    /// ```
    /// use bit_alloc::BitAllocator;
    ///
    /// let mut ids = BitAllocator::new(16)?;
    /// ids.as_raw_mut().copy_from_slice(&[0xff, 0x01]);
    /// assert_eq!(ids.recount(), 7);
    /// assert_eq!(ids.mark_next(), Some(9));
    /// # Ok::<(), bit_alloc::BitAllocError>(())
    /// ```
    ///
    /// [`recount`]: BitAllocator::recount
    /// [`free_count`]: BitAllocator::free_count
    #[inline]
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        let len = self.byte_len();
        &mut self.storage[..len]
    }

    /// Recomputes the free count from the map and returns it.
    ///
    /// Bits above the capacity in the final byte are cleared first.
    pub fn recount(&mut self) -> usize {
        self.clean_unused_bits();
        let used: usize = self
            .storage
            .chunks_exact(WORD_BYTES)
            .enumerate()
            .map(|(word_idx, chunk)| {
                (load_word(chunk) & valid_mask(self.capacity, word_idx)).count_ones() as usize
            })
            .sum();
        self.free = self.capacity - used;
        self.free
    }

    #[inline]
    fn idxs(bit: usize) -> (usize, usize) {
        (bit / 8, bit % 8)
    }

    fn clean_unused_bits(&mut self) {
        let bits_in_last = self.capacity % 8;
        if bits_in_last != 0 {
            let mask = (1 << bits_in_last) - 1;
            self.storage[self.capacity / 8] &= mask;
        }
    }
}

impl Debug for BitAllocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "BitAllocator {{ capacity: {}, free: {}, map: LSB -> ",
            self.capacity, self.free
        )?;
        for i in 0..self.capacity {
            if i % 8 == 0 {
                write!(f, "{i}: ")?;
            }
            write!(f, "{}", if self.is_marked(i) { '1' } else { '0' })?;
            if i % 8 == 7 && i < self.capacity - 1 {
                write!(f, " ")?;
            }
        }
        write!(f, " <- MSB }}")
    }
}

/// Iterator over the indices of used bits.
///
/// Returned by [`BitAllocator::iter_marked()`].
#[derive(Clone, Copy)]
pub struct IterMarked<'alloc> {
    storage: &'alloc [u8],
    capacity: usize,
    word_idx: usize,
    current: u64,
}

impl Iterator for IterMarked<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current != 0 {
                let tz = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1; // unset LSB
                return Some(self.word_idx * WORD_BITS + tz);
            }

            let start = (self.word_idx + 1) * WORD_BYTES;
            let chunk = self.storage.get(start..start + WORD_BYTES)?;
            self.word_idx += 1;
            self.current = load_word(chunk) & valid_mask(self.capacity, self.word_idx);
        }
    }
}

impl FusedIterator for IterMarked<'_> {}
