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

    src/gcr/codec.rs
*/
//! The 4-to-5 bit GCR nibble codec.

/// The 5-bit GCR code for each 4-bit nibble.
pub const GCR_ENCODE: [u8; 16] = [
    0x0A, 0x0B, 0x12, 0x13, 0x0E, 0x0F, 0x16, 0x17, 0x09, 0x19, 0x1A, 0x1B, 0x0D, 0x1D, 0x1E, 0x15,
];

/// Marks a 5-bit code with no nibble mapping in the decode tables.
pub const GCR_INVALID: u8 = 0xFF;

/// Decode table for a code in the high nibble position. Invalid codes map to [GCR_INVALID].
#[rustfmt::skip]
pub const GCR_DECODE_HIGH: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x80, 0x00, 0x10, 0xFF, 0xC0, 0x40, 0x50,
    0xFF, 0xFF, 0x20, 0x30, 0xFF, 0xF0, 0x60, 0x70,
    0xFF, 0x90, 0xA0, 0xB0, 0xFF, 0xD0, 0xE0, 0xFF,
];

/// Decode table for a code in the low nibble position. Invalid codes map to [GCR_INVALID].
#[rustfmt::skip]
pub const GCR_DECODE_LOW: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x08, 0x00, 0x01, 0xFF, 0x0C, 0x04, 0x05,
    0xFF, 0xFF, 0x02, 0x03, 0xFF, 0x0F, 0x06, 0x07,
    0xFF, 0x09, 0x0A, 0x0B, 0xFF, 0x0D, 0x0E, 0xFF,
];

/// Encode a single byte into its two 5-bit GCR codes, returned as a 10-bit value.
#[inline]
pub fn encode_gcr_byte(byte: u8) -> u16 {
    ((GCR_ENCODE[(byte >> 4) as usize] as u16) << 5) | GCR_ENCODE[(byte & 0x0F) as usize] as u16
}

/// Decode a 10-bit GCR value into a byte. Returns None if either code is invalid.
#[inline]
pub fn decode_gcr_byte(gcr: u16) -> Option<u8> {
    let hi = GCR_DECODE_HIGH[((gcr >> 5) & 0x1F) as usize];
    let lo = GCR_DECODE_LOW[(gcr & 0x1F) as usize];
    if hi == GCR_INVALID || lo == GCR_INVALID {
        None
    }
    else {
        Some(hi | lo)
    }
}

/// Encode 4 plain bytes into 5 bytes of GCR. The eight 5-bit codes are packed MSB first.
pub fn encode_4bytes(plain: &[u8; 4]) -> [u8; 5] {
    let mut acc: u64 = 0;
    for byte in plain {
        acc = (acc << 10) | encode_gcr_byte(*byte) as u64;
    }

    let mut gcr = [0u8; 5];
    for (i, out) in gcr.iter_mut().enumerate() {
        *out = (acc >> (32 - i * 8)) as u8;
    }
    gcr
}

/// Decode 5 bytes of GCR into 4 plain bytes.
///
/// Returns the decoded bytes along with the number of bytes that decoded cleanly before
/// the first invalid code (4 if the whole group was valid). An invalid 5-bit code decodes
/// as 0xF in its own nibble; the other nibble of that byte keeps its decoded value.
pub fn decode_4bytes(gcr: &[u8; 5]) -> ([u8; 4], usize) {
    let acc = gcr.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);

    let mut plain = [0u8; 4];
    let mut valid = 4;
    for (i, out) in plain.iter_mut().enumerate() {
        let word = (acc >> (30 - i * 10)) & 0x3FF;
        let hi = GCR_DECODE_HIGH[(word >> 5) as usize];
        let lo = GCR_DECODE_LOW[(word & 0x1F) as usize];
        if hi == GCR_INVALID || lo == GCR_INVALID {
            valid = valid.min(i);
        }
        let hi = if hi == GCR_INVALID { 0xF0 } else { hi };
        let lo = if lo == GCR_INVALID { 0x0F } else { lo };
        *out = hi | lo;
    }
    (plain, valid)
}

/// Encode a plain buffer into GCR. The plain length must be a multiple of 4; any trailing
/// partial group is ignored.
pub fn encode_buffer(plain: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(plain.len() / 4 * 5);
    for chunk in plain.chunks_exact(4) {
        let mut group = [0u8; 4];
        group.copy_from_slice(chunk);
        out.extend_from_slice(&encode_4bytes(&group));
    }
    out
}

/// Decode a GCR buffer into plain bytes, five GCR bytes at a time. Returns the decoded bytes
/// and a flag indicating whether every code was valid.
pub fn decode_buffer(gcr: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::with_capacity(gcr.len() / 5 * 4);
    let mut all_valid = true;
    for chunk in gcr.chunks_exact(5) {
        let mut group = [0u8; 5];
        group.copy_from_slice(chunk);
        let (plain, valid) = decode_4bytes(&group);
        all_valid &= valid == 4;
        out.extend_from_slice(&plain);
    }
    (out, all_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tables_invert_encode() {
        for nibble in 0..16u8 {
            let code = GCR_ENCODE[nibble as usize] as usize;
            assert_eq!(GCR_DECODE_HIGH[code], nibble << 4);
            assert_eq!(GCR_DECODE_LOW[code], nibble);
        }
        let valid = GCR_DECODE_LOW.iter().filter(|&&b| b != GCR_INVALID).count();
        assert_eq!(valid, 16);
    }

    #[test]
    fn test_known_encoding() {
        // The first bytes of a header block. 0x08 encodes to 01010 01001.
        assert_eq!(encode_gcr_byte(0x08), 0b01010_01001);
        // Four zero bytes encode to the repeating 01010 pattern.
        assert_eq!(encode_4bytes(&[0, 0, 0, 0]), [0x52, 0x94, 0xA5, 0x29, 0x4A]);
        // Four 0xFF bytes
        assert_eq!(encode_4bytes(&[0xFF; 4]), [0xAD, 0x6B, 0x5A, 0xD6, 0xB5]);
    }

    #[test]
    fn test_invalid_code_reports_position() {
        let mut gcr = encode_4bytes(&[0x12, 0x34, 0x56, 0x78]);
        // Zero the third GCR byte - this destroys codes in plain bytes 1 and 2.
        gcr[2] = 0x00;
        let (plain, valid) = decode_4bytes(&gcr);
        assert_eq!(valid, 1);
        assert_eq!(plain[0], 0x12);
        // Only the damaged nibbles read as 0xF.
        assert_eq!(plain[1], 0x3F);
        assert_eq!(plain[2], 0xF6);
        assert_eq!(plain[3], 0x78);
    }
}
