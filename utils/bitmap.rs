//! Fixed-size bitmap
//!
//! This module provides the bitmap the TLMM driver uses to track which
//! lines are unmasked, wake-enabled or dual-edge. Storage is inline, so a
//! bitmap is allocated with its owner and never resized.

/// Bits per storage word
const WORD_BITS: usize = 64;

/// Number of `u64` words needed to hold `bits` bits
pub const fn words_for(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

/// Bitmap structure
///
/// `WORDS` fixes the capacity; `bits` (at most `WORDS * 64`) is the logical
/// length chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<const WORDS: usize> {
    /// Bitmap data
    data: [u64; WORDS],
    /// Number of bits
    bits: usize,
}

impl<const WORDS: usize> Bitmap<WORDS> {
    /// Create a new, cleared bitmap of `bits` bits
    ///
    /// Lengths beyond the storage capacity are clamped.
    pub const fn new(bits: usize) -> Self {
        let cap = WORDS * WORD_BITS;
        Self {
            data: [0; WORDS],
            bits: if bits > cap { cap } else { bits },
        }
    }

    /// Get the number of bits
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Test if a bit is set
    pub fn test(&self, index: usize) -> bool {
        if index >= self.bits {
            return false;
        }
        (self.data[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Set a bit
    ///
    /// Returns false if `index` is out of range.
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        if index >= self.bits {
            return false;
        }
        let word = &mut self.data[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
        true
    }

    /// Set a bit to 1
    pub fn set_bit(&mut self, index: usize) -> bool {
        self.set(index, true)
    }

    /// Clear a bit to 0
    pub fn clear_bit(&mut self, index: usize) -> bool {
        self.set(index, false)
    }

    /// Find the first set bit at or after `from`
    pub fn find_next_set(&self, from: usize) -> Option<usize> {
        if from >= self.bits {
            return None;
        }
        let mut word_idx = from / WORD_BITS;
        let mut value = self.data[word_idx] & (u64::MAX << (from % WORD_BITS));
        loop {
            if value != 0 {
                let index = word_idx * WORD_BITS + value.trailing_zeros() as usize;
                return if index < self.bits { Some(index) } else { None };
            }
            word_idx += 1;
            if word_idx >= WORDS {
                return None;
            }
            value = self.data[word_idx];
        }
    }

    /// Find the first set bit
    pub fn find_first_set(&self) -> Option<usize> {
        self.find_next_set(0)
    }

    /// Count the number of set bits
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Check if any bit is set
    pub fn any(&self) -> bool {
        self.data.iter().any(|&w| w != 0)
    }

    /// Check if no bits are set
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Clear all bits
    pub fn clear_all(&mut self) {
        self.data = [0; WORDS];
    }

    /// Create an iterator over set bits, in ascending order
    pub fn iter(&self) -> Iter<'_, WORDS> {
        Iter {
            bitmap: self,
            next: 0,
        }
    }
}

/// Iterator over set bits in the bitmap
pub struct Iter<'a, const WORDS: usize> {
    bitmap: &'a Bitmap<WORDS>,
    next: usize,
}

impl<'a, const WORDS: usize> Iterator for Iter<'a, WORDS> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.bitmap.find_next_set(self.next)?;
        self.next = index + 1;
        Some(index)
    }
}
