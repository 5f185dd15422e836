//! Fixed-length bit arrays backing configuration images.
//!
//! A [`BitArray`] is the device-wide configuration image, and also the
//! scratch window one entity serializes into before the window is spliced
//! into the image. Bits are packed into 32-bit words, bit `i` living in
//! word `i / 32` at position `i % 32`. Bits past the logical length are
//! always zero, so equality and hashing only see meaningful bits.

use crate::error::ImageError;
use mixcell_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A fixed-length array of bits, indexed from 0.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitArray")]
pub struct BitArray {
    len: u32,
    words: Vec<u32>,
}

/// Serialized form of a [`BitArray`], checked before it becomes one.
#[derive(Deserialize)]
struct RawBitArray {
    len: u32,
    words: Vec<u32>,
}

impl TryFrom<RawBitArray> for BitArray {
    type Error = ImageError;

    fn try_from(raw: RawBitArray) -> Result<Self, Self::Error> {
        let expected = raw.len.div_ceil(32) as usize;
        if raw.words.len() != expected {
            return Err(ImageError::Length {
                expected: raw.len,
                actual: (raw.words.len() as u64 * 32).min(u64::from(u32::MAX)) as u32,
            });
        }
        let spare = raw.len % 32;
        if let Some(&last) = raw.words.last() {
            if spare != 0 && last >> spare != 0 {
                return Err(ImageError::Padding);
            }
        }
        Ok(Self {
            len: raw.len,
            words: raw.words,
        })
    }
}

impl BitArray {
    /// Creates an all-zero array of `len` bits.
    pub fn new(len: u32) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(32) as usize],
        }
    }

    /// Builds an array from a slice of booleans, element 0 becoming bit 0.
    pub fn from_bools(bits: &[bool]) -> Self {
        let mut out = Self::new(bits.len() as u32);
        for (i, &b) in bits.iter().enumerate() {
            out.set(i as u32, b);
        }
        out
    }

    /// Returns the number of bits.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the array holds no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the packed words. Bits past [`len`](Self::len) are zero.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Reads bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn get(&self, index: u32) -> bool {
        assert!(index < self.len, "bit {index} out of range for {} bits", self.len);
        (self.words[(index / 32) as usize] >> (index % 32)) & 1 == 1
    }

    /// Reads bit `index`, or `None` if it is out of range.
    pub fn try_get(&self, index: u32) -> Option<bool> {
        (index < self.len).then(|| self.get(index))
    }

    /// Writes bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(index < self.len, "bit {index} out of range for {} bits", self.len);
        let word = &mut self.words[(index / 32) as usize];
        let mask = 1u32 << (index % 32);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Reads a `width`-bit unsigned field starting at `offset`, least
    /// significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `width > 32` or the field runs past the end.
    pub fn read_field(&self, offset: u32, width: u32) -> u32 {
        assert!(width <= 32, "field width {width} exceeds 32 bits");
        (0..width).fold(0, |acc, i| acc | (u32::from(self.get(offset + i)) << i))
    }

    /// Writes the low `width` bits of `value` starting at `offset`, least
    /// significant bit first. Higher bits of `value` are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `width > 32` or the field runs past the end.
    pub fn write_field(&mut self, offset: u32, width: u32, value: u32) {
        assert!(width <= 32, "field width {width} exceeds 32 bits");
        for i in 0..width {
            self.set(offset + i, (value >> i) & 1 == 1);
        }
    }

    /// Copies the bits in `range` into a new array.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the end.
    pub fn slice(&self, range: Range<u32>) -> BitArray {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "slice {range:?} out of range for {} bits",
            self.len
        );
        let mut out = BitArray::new(range.end - range.start);
        for (i, bit) in range.enumerate() {
            if self.get(bit) {
                out.set(i as u32, true);
            }
        }
        out
    }

    /// Overwrites `src.len()` bits starting at `offset` with the bits of `src`.
    ///
    /// # Panics
    ///
    /// Panics if `src` does not fit.
    pub fn splice(&mut self, offset: u32, src: &BitArray) {
        assert!(
            u64::from(offset) + u64::from(src.len) <= u64::from(self.len),
            "splice of {} bits at {offset} out of range for {} bits",
            src.len,
            self.len
        );
        for i in 0..src.len {
            self.set(offset + i, src.get(i));
        }
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Returns the indices at which `self` and `other` differ.
    ///
    /// When lengths differ, every index present in only one array counts as
    /// a difference.
    pub fn diff(&self, other: &BitArray) -> Vec<u32> {
        let common = self.len.min(other.len);
        let mut out: Vec<u32> = (0..common)
            .filter(|&i| self.get(i) != other.get(i))
            .collect();
        out.extend(common..self.len.max(other.len));
        out
    }

    /// Iterates over the bits from index 0 upward.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Computes a content hash over the length and packed words.
    pub fn content_hash(&self) -> ContentHash {
        let mut words = Vec::with_capacity(self.words.len() + 1);
        words.push(self.len);
        words.extend_from_slice(&self.words);
        ContentHash::from_words(&words)
    }
}

impl FromIterator<bool> for BitArray {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let bits: Vec<bool> = iter.into_iter().collect();
        Self::from_bools(&bits)
    }
}

impl fmt::Display for BitArray {
    /// Formats as `0`/`1` characters, bit 0 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitArray<{}>({self})", self.len)
    }
}
