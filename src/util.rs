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

    src/util.rs
*/
use std::io::{Seek, SeekFrom};

/// Return the XOR of all bytes in `data`. This is the checksum used by both the header and
/// data blocks of a 1541 sector.
pub(crate) fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, b| acc ^ b)
}

pub(crate) fn get_length<T: Seek>(source: &mut T) -> Result<u64, std::io::Error> {
    // Seek to the end of the source
    let length = source.seek(SeekFrom::End(0))?;
    // Seek back to the beginning of the source
    source.seek(SeekFrom::Start(0))?;
    Ok(length)
}

/// Find the longest run of bytes matching `pred` that starts within the first `limit`
/// bytes of `data`. Returns the start and length of the run. Ties resolve to the earliest
/// run.
pub(crate) fn longest_run<F>(data: &[u8], limit: usize, pred: F) -> Option<(usize, usize)>
where
    F: Fn(u8) -> bool,
{
    let mut best: Option<(usize, usize)> = None;
    let mut pos = 0;
    let limit = limit.min(data.len());

    while pos < limit {
        if !pred(data[pos]) {
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < data.len() && pred(data[pos]) {
            pos += 1;
        }
        let run = pos - start;
        if best.map_or(true, |(_, len)| run > len) {
            best = Some((start, run));
        }
    }
    best
}

/// Given a position within a circular track of `len` bytes, step backwards to the nearest
/// preceding sync byte and then to the first byte of that sync run. Returns `pos`
/// unchanged if the track holds no sync bytes.
pub(crate) fn sync_start_before(track: &[u8], pos: usize) -> usize {
    let len = track.len();
    if len == 0 {
        return pos;
    }
    let pos = pos % len;
    let prev = |p: usize| (p + len - 1) % len;

    // Find the last sync byte before pos.
    let mut p = prev(pos);
    let mut steps = 0;
    while track[p] != 0xFF {
        p = prev(p);
        steps += 1;
        if steps >= len {
            return pos;
        }
    }

    // Rewind to the start of the sync run.
    steps = 0;
    while track[prev(p)] == 0xFF && steps < len {
        p = prev(p);
        steps += 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_checksum() {
        assert_eq!(xor_checksum(&[]), 0);
        assert_eq!(xor_checksum(&[0x12, 0x34]), 0x26);
    }

    #[test]
    fn test_longest_run() {
        let data = [0x00, 0xFF, 0xFF, 0x00, 0xFF, 0xFF, 0xFF, 0x00];
        assert_eq!(longest_run(&data, data.len(), |b| b == 0xFF), Some((4, 3)));
        assert_eq!(longest_run(&data, 3, |b| b == 0xFF), Some((1, 2)));
        assert_eq!(longest_run(&data, data.len(), |b| b == 0x55), None);
    }

    #[test]
    fn test_sync_start_before() {
        let track = [0xFF, 0x52, 0x55, 0x55, 0xFF, 0xFF, 0x52, 0x55];
        assert_eq!(sync_start_before(&track, 7), 4);
        assert_eq!(sync_start_before(&track, 3), 0);
        // Wraps around the end of the track.
        let track = [0x52, 0x55, 0x55, 0xFF, 0xFF];
        assert_eq!(sync_start_before(&track, 1), 3);
        assert_eq!(sync_start_before(&[0x55; 4], 2), 2);
    }
}
