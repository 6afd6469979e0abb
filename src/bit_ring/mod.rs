/*
    NibKit

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/bit_ring/mod.rs
*/
//! A [BitRing] is a binary ring buffer, which can be indexed and iterated over
//! past its end. A captured revolution of a track is a continuous ring of bits
//! with no inherent start, so sub-byte rotations and bit-phase searches that run
//! off the end of the buffer simply continue at its beginning.

use bit_vec::BitVec;
use std::ops::Index;

/// A [BitRingIter] iterates over the bits of a [BitRing] from an arbitrary starting bit,
/// producing a sequence of `bool` values. Iteration stops after `limit` bits.
pub struct BitRingIter<'a> {
    ring:   &'a BitRing,
    cursor: usize,
    limit:  usize,
}

impl Iterator for BitRingIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit == 0 {
            return None;
        }
        let bit = self.ring[self.cursor];
        self.cursor += 1;
        self.limit -= 1;
        Some(bit)
    }
}

/// A [BitRing] wraps a [BitVec] from the bit_vec crate (not to be confused with the
/// bitvec crate). Indexing past the end of the ring wraps around to the beginning.
#[derive(Clone)]
pub struct BitRing {
    bits: BitVec,
}

/// Produce a [BitRing] from a byte slice. Bits are taken MSB first.
impl From<&[u8]> for BitRing {
    fn from(bytes: &[u8]) -> BitRing {
        BitRing {
            bits: BitVec::from_bytes(bytes),
        }
    }
}

impl From<BitVec> for BitRing {
    fn from(bits: BitVec) -> BitRing {
        BitRing { bits }
    }
}

impl BitRing {
    /// Return the length of the [BitRing] in bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Return an iterator over one revolution of the ring, starting at bit `start`.
    pub fn iter_from(&self, start: usize) -> BitRingIter {
        BitRingIter {
            ring:   self,
            cursor: start,
            limit:  self.len(),
        }
    }

    /// Read eight bits starting at any bit position, wrapping around the end of the ring.
    pub fn byte_at(&self, bit: usize) -> u8 {
        (0..8).fold(0u8, |byte, i| (byte << 1) | self[bit + i] as u8)
    }

    /// Return the contents of the ring as bytes, beginning at bit `start`.
    /// If the ring length is not a multiple of 8 the final byte is padded with 0 bits.
    pub fn to_bytes_from(&self, start: usize) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        let rotated: BitVec = self.iter_from(start % self.len()).collect();
        rotated.to_bytes()
    }
}

impl Index<usize> for BitRing {
    type Output = bool;

    fn index(&self, index: usize) -> &Self::Output {
        if index < self.bits.len() {
            &self.bits[index]
        }
        else {
            &self.bits[index % self.bits.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let bytes: &[u8] = &[0b1010_1010, 0b1100_1100];
        let ring = BitRing::from(bytes);

        let expected_bits = BitVec::from_bytes(bytes);
        assert_eq!(ring.len(), 16);
        for i in 0..expected_bits.len() {
            assert_eq!(ring[i], expected_bits[i]);
        }
    }

    #[test]
    fn test_wrap_behavior() {
        let bits = BitVec::from_bytes(&[0b1111_1111, 0b0000_0000]);
        let ring = BitRing::from(bits.clone());

        // Access beyond the end should wrap around to the beginning
        for i in 0..32 {
            assert_eq!(ring[i], bits[i % 16]);
        }
    }

    #[test]
    fn test_byte_at_wraps() {
        let bytes: &[u8] = &[0b1111_0000, 0b1010_0101];
        let ring = BitRing::from(bytes);
        assert_eq!(ring.byte_at(0), 0b1111_0000);
        assert_eq!(ring.byte_at(4), 0b0000_1010);
        // Last four bits followed by the first four.
        assert_eq!(ring.byte_at(12), 0b0101_1111);
    }

    #[test]
    fn test_to_bytes_from() {
        let bytes: &[u8] = &[0x12, 0x34, 0x56];
        let ring = BitRing::from(bytes);
        assert_eq!(ring.to_bytes_from(0), bytes);
        assert_eq!(ring.to_bytes_from(8), vec![0x34, 0x56, 0x12]);
        assert_eq!(ring.to_bytes_from(4), vec![0x23, 0x45, 0x61]);
    }

    #[test]
    fn test_iter_revolution_length() {
        let ring = BitRing::from(&[0b1010_1010u8, 0b1100_1100][..]);
        let revolution: Vec<bool> = ring.iter_from(3).collect();
        assert_eq!(revolution.len(), ring.len());
        assert_eq!(revolution[0], ring[3]);
        assert_eq!(revolution[15], ring[2]);
    }
}
