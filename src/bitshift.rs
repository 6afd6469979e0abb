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

    src/bitshift.rs
*/
//! Detection and repair of bit-shifted track captures.
//!
//! The 1541 hardware re-synchronises its byte framing at every sync mark, so in a
//! normal capture each sync run ends exactly on a byte boundary. Some capture
//! methods lose that framing and produce a track whose bytes are offset from the
//! true framing by a few bits, which makes the data undecodable. This module
//! finds sync runs at the bit level and rebuilds such a track so that every sync
//! ends on a byte boundary again.

use crate::bit_ring::BitRing;

/// The shortest run of 1 bits recognised as a sync mark.
pub const MIN_SYNC_BITS: usize = 10;

/// For each bit phase within a byte, the mask selecting ten consecutive bits starting at
/// that phase within a 24-bit window. Phases 0-6 fit within two bytes; phase 7 spills into
/// a third.
const SYNC_PHASE_MASKS: [u32; 8] = [
    0xFF_C0_00, 0x7F_E0_00, 0x3F_F0_00, 0x1F_F8_00, 0x0F_FC_00, 0x07_FE_00, 0x03_FF_00, 0x01_FF_80,
];

/// A run of sync bits. `start` and `len` are in bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SyncRun {
    pub start: usize,
    pub len:   usize,
}

impl SyncRun {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[inline]
fn bit_at(track: &[u8], bit: usize) -> bool {
    track[bit >> 3] & (0x80 >> (bit & 0x07)) != 0
}

#[inline]
fn window24(track: &[u8], byte: usize) -> u32 {
    (0..3).fold(0u32, |acc, i| (acc << 8) | track.get(byte + i).copied().unwrap_or(0) as u32)
}

/// Find the next run of at least [MIN_SYNC_BITS] 1 bits beginning at or after bit `from_bit`.
/// The run is extended to its full length; runs do not wrap past the end of the track.
pub fn find_sync_bits(track: &[u8], from_bit: usize) -> Option<SyncRun> {
    let total = track.len() * 8;
    let mut byte = from_bit / 8;
    let mut first_phase = from_bit % 8;

    while byte < track.len() {
        let window = window24(track, byte);
        for (phase, &mask) in SYNC_PHASE_MASKS.iter().enumerate().skip(first_phase) {
            if window & mask == mask {
                let start = byte * 8 + phase;
                let mut end = start + MIN_SYNC_BITS;
                while end < total && bit_at(track, end) {
                    end += 1;
                }
                return Some(SyncRun { start, len: end - start });
            }
        }
        first_phase = 0;
        byte += 1;
    }
    None
}

/// Return true if any sync run in the track ends somewhere other than a byte boundary.
/// A sync that runs to the end of the track is not considered shifted.
pub fn is_track_bitshifted(track: &[u8]) -> bool {
    let total = track.len() * 8;
    let mut pos = 0;
    while let Some(run) = find_sync_bits(track, pos) {
        if run.end() % 8 != 0 && run.end() < total {
            log::trace!("is_track_bitshifted(): Sync at bit {} ends off-boundary at {}", run.start, run.end());
            return true;
        }
        pos = run.end();
    }
    false
}

/// A source of bits for [BitWriter::copy_bits].
#[derive(Copy, Clone, Debug)]
pub enum BitSource<'a> {
    /// Bits copied from a buffer, starting at the given bit offset.
    Data(&'a [u8], usize),
    Zeros,
    Ones,
}

/// Accumulates an output bitstream, MSB first.
#[derive(Default)]
pub struct BitWriter {
    out:  Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn with_capacity(bytes: usize) -> Self {
        BitWriter {
            out:  Vec::with_capacity(bytes),
            bits: 0,
        }
    }

    /// Return the number of bits written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Append `count` bits from `source`. Each step moves as many bits as fit in the current
    /// output byte, the current source byte and the remaining count.
    pub fn copy_bits(&mut self, source: BitSource, count: usize) {
        let mut remaining = count;
        let mut src_bit = match source {
            BitSource::Data(_, start) => start,
            _ => 0,
        };

        while remaining > 0 {
            let free = 8 - (self.bits % 8);
            let available = match source {
                BitSource::Data(..) => 8 - (src_bit % 8),
                _ => 8,
            };
            let step = free.min(available).min(remaining);
            let mask = ((1u16 << step) - 1) as u8;

            let value = match source {
                BitSource::Data(buf, _) => (buf[src_bit / 8] >> (8 - (src_bit % 8) - step)) & mask,
                BitSource::Zeros => 0,
                BitSource::Ones => mask,
            };

            if self.bits % 8 == 0 {
                self.out.push(0);
            }
            if let Some(last) = self.out.last_mut() {
                *last |= value << (free - step);
            }

            self.bits += step;
            src_bit += step;
            remaining -= step;
        }
    }

    /// Return the written bytes. A trailing partial byte is padded with 0 bits.
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

/// Rebuild a bit-shifted track so that every sync run ends on a byte boundary.
///
/// The track is walked from sync to sync. The data bits between syncs are copied
/// unchanged, then just enough 0 bits are inserted before each sync that the sync run
/// ends on a byte boundary. The result is slightly longer than the input. A track with
/// no sync marks is returned unchanged.
pub fn align_bitshifted_track(track: &[u8]) -> Vec<u8> {
    let total = track.len() * 8;
    let mut writer = BitWriter::with_capacity(track.len() + track.len() / 32 + 1);
    let mut pos = 0;
    let mut syncs = 0;

    while let Some(run) = find_sync_bits(track, pos) {
        writer.copy_bits(BitSource::Data(track, pos), run.start - pos);

        if run.end() >= total {
            writer.copy_bits(BitSource::Ones, run.len);
            pos = total;
            break;
        }

        let pad = (8 - (writer.len() + run.len) % 8) % 8;
        writer.copy_bits(BitSource::Zeros, pad);
        writer.copy_bits(BitSource::Ones, run.len);
        pos = run.end();
        syncs += 1;
    }

    writer.copy_bits(BitSource::Data(track, pos), total - pos);
    let out = writer.into_bytes();
    log::debug!(
        "align_bitshifted_track(): Realigned {} syncs, {} -> {} bytes",
        syncs,
        track.len(),
        out.len()
    );
    out
}

/// Rotate a buffer left by `bits` bits, treating it as a ring.
pub fn shift_buffer_left(buf: &[u8], bits: usize) -> Vec<u8> {
    BitRing::from(buf).to_bytes_from(bits)
}

/// Rotate a buffer right by `bits` bits, treating it as a ring.
pub fn shift_buffer_right(buf: &[u8], bits: usize) -> Vec<u8> {
    let total = buf.len() * 8;
    if total == 0 {
        return Vec::new();
    }
    BitRing::from(buf).to_bytes_from(total - bits % total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_sync_bits() {
        let track = [0x55, 0xFF, 0xFF, 0x52, 0x55];
        // The run begins at the final 1 bit of the leading 0x55.
        assert_eq!(find_sync_bits(&track, 0), Some(SyncRun { start: 7, len: 17 }));
        assert_eq!(find_sync_bits(&track, 24), None);

        let track = [0x03, 0xFF, 0x00];
        assert_eq!(find_sync_bits(&track, 0), Some(SyncRun { start: 6, len: 10 }));

        let track = [0x01, 0xFF, 0x80];
        assert_eq!(find_sync_bits(&track, 0), Some(SyncRun { start: 7, len: 10 }));
        // Only eight 1 bits remain after bit 9.
        assert_eq!(find_sync_bits(&track, 9), None);
    }

    #[test]
    fn test_copy_bits() {
        let mut writer = BitWriter::default();
        writer.copy_bits(BitSource::Ones, 3);
        writer.copy_bits(BitSource::Zeros, 2);
        writer.copy_bits(BitSource::Data(&[0b1011_0110], 2), 6);
        assert_eq!(writer.len(), 11);
        assert_eq!(writer.into_bytes(), vec![0b1110_0110, 0b1100_0000]);
    }

    #[test]
    fn test_shift_left_right() {
        let data = [0x12, 0x34, 0x56, 0x78];
        for bits in 0..32 {
            assert_eq!(shift_buffer_right(&shift_buffer_left(&data, bits), bits), data.to_vec());
        }
        assert_eq!(shift_buffer_left(&data, 4), vec![0x23, 0x45, 0x67, 0x81]);
        assert_eq!(shift_buffer_right(&data, 4), vec![0x81, 0x23, 0x45, 0x67]);
    }

    #[test]
    fn test_align_shifted_sync() {
        // 0x55 gap, a sync shifted by 3 bits, then data.
        let track = [0x55, 0x55, 0x4B, 0xFF, 0xEA, 0x4A, 0x52];
        assert!(is_track_bitshifted(&track));
        let aligned = align_bitshifted_track(&track);
        assert!(!is_track_bitshifted(&aligned));
    }
}
