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

    src/gcr/scanner.rs
*/
//! Primitives for scanning byte-aligned GCR track data: locating sync marks and
//! sector headers, detecting bytes that can't be valid GCR, and classifying a
//! track by its sync content.

use crate::types::TrackDensityFlags;

/// A byte of sync (ten or more 1 bits written back to back).
pub const SYNC_BYTE: u8 = 0xFF;
/// The first GCR byte following the sync of a sector header (0x08 encoded).
pub const GCR_HEADER_MARKER: u8 = 0x52;
/// The first GCR byte following the sync of a data block (0x07 encoded).
pub const GCR_DATA_MARKER: u8 = 0x55;

/// Find the next sync mark at or after `pos`, stopping at `end`.
///
/// A sync mark begins where a byte with its low bit set is followed by 0xFF. The sync
/// bytes are consumed and the position of the first following non-sync byte is returned.
/// Returns None if no complete sync mark followed by data is found before `end`.
pub fn find_sync(track: &[u8], mut pos: usize, end: usize) -> Option<usize> {
    let end = end.min(track.len());
    loop {
        if pos + 1 >= end {
            return None;
        }
        if (track[pos] & 0x01) == 0x01 && track[pos + 1] == SYNC_BYTE {
            break;
        }
        pos += 1;
    }

    pos += 1;
    while pos < end && track[pos] == SYNC_BYTE {
        pos += 1;
    }

    if pos < end {
        Some(pos)
    }
    else {
        None
    }
}

/// Find the next sector header at or after `pos`, stopping at `end`. Returns the position
/// immediately after the header marker byte.
pub fn find_header(track: &[u8], mut pos: usize, end: usize) -> Option<usize> {
    loop {
        pos = find_sync(track, pos, end)?;
        if track[pos] == GCR_HEADER_MARKER {
            return Some(pos + 1);
        }
    }
}

/// Return true if the byte at `pos` can't be part of a valid GCR stream.
///
/// A GCR stream never contains three consecutive 0 bits. The byte is examined along with
/// the two low bits of the preceding byte, so that zero runs spanning a byte boundary are
/// also caught. The preceding byte wraps to the last byte of the buffer at position 0.
pub fn is_bad_gcr(track: &[u8], pos: usize) -> bool {
    let len = track.len();
    if pos >= len {
        return false;
    }
    let prev = if pos == 0 { track[len - 1] } else { track[pos - 1] };
    let data = (((prev & 0x03) as u16) << 8) | track[pos] as u16;

    let mut mask: u16 = 0x07 << 7;
    while mask >= 0x07 {
        if data & mask == 0 {
            return true;
        }
        mask >>= 1;
    }
    false
}

/// Count the bytes in `track` that can't be valid GCR.
pub fn count_bad_gcr(track: &[u8]) -> usize {
    (0..track.len()).filter(|&pos| is_bad_gcr(track, pos)).count()
}

/// Classify a raw track by its sync content.
///
/// A byte counts as sync-like if its seven low bits are all set. A track with no such
/// bytes is flagged [TrackDensityFlags::BM_NO_SYNC]; a track made up almost entirely of
/// them (all but three bytes or fewer) is flagged [TrackDensityFlags::BM_FF_TRACK].
/// The density zone bits of the input flags are preserved.
pub fn check_sync_flags(track: &[u8], flags: TrackDensityFlags) -> TrackDensityFlags {
    let mut flags = flags - (TrackDensityFlags::BM_NO_SYNC | TrackDensityFlags::BM_FF_TRACK);

    let syncs = track.iter().filter(|&&b| (b & 0x7F) == 0x7F).count();
    if syncs == 0 {
        flags |= TrackDensityFlags::BM_NO_SYNC;
    }
    else if syncs >= track.len().saturating_sub(3) {
        flags |= TrackDensityFlags::BM_FF_TRACK;
    }
    flags
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BadGcrState {
    Ok,
    OnceBad,
    Lost,
}

/// Detect, and optionally repair, bad GCR in a track.
///
/// Badness is evaluated against the unmodified data. Repaired bytes are replaced with
/// 0x00, so that a repaired region reads as a clean weak-bit area rather than a spurious
/// valid code. The repair `fix` level selects which bytes are rewritten:
///
/// * 0 - detection only.
/// * 1 - every byte of a run of two or more bad bytes.
/// * 2 - as 1, plus the good byte immediately preceding such a run.
/// * 3 - as 2, plus isolated single bad bytes.
/// * 4 - as 3, plus the good byte immediately following any bad byte or run.
///
/// Returns the number of bad GCR bytes found.
pub fn check_bad_gcr(track: &mut [u8], fix: u8) -> usize {
    let len = track.len();
    if len < 2 {
        return 0;
    }

    let bad: Vec<bool> = (0..len).map(|pos| is_bad_gcr(track, pos)).collect();
    let total = bad.iter().filter(|&&b| b).count();
    if fix == 0 || total == 0 {
        return total;
    }

    let mut state = BadGcrState::Ok;
    let mut repair = vec![false; len];

    for (pos, &is_bad) in bad.iter().enumerate() {
        let next = match (state, is_bad) {
            (_, false) => BadGcrState::Ok,
            (BadGcrState::Ok, true) => BadGcrState::OnceBad,
            (_, true) => BadGcrState::Lost,
        };

        match (state, next) {
            (BadGcrState::OnceBad, BadGcrState::Lost) => {
                repair[pos - 1] = true;
                repair[pos] = true;
                if fix >= 2 && pos >= 2 {
                    repair[pos - 2] = true;
                }
            }
            (BadGcrState::Lost, BadGcrState::Lost) => {
                repair[pos] = true;
            }
            (BadGcrState::OnceBad, BadGcrState::Ok) => {
                if fix >= 3 {
                    repair[pos - 1] = true;
                }
                if fix >= 4 {
                    repair[pos] = true;
                }
            }
            (BadGcrState::Lost, BadGcrState::Ok) => {
                if fix >= 4 {
                    repair[pos] = true;
                }
            }
            _ => {}
        }
        state = next;
    }

    let mut repaired = 0;
    for (byte, &fix_byte) in track.iter_mut().zip(repair.iter()) {
        if fix_byte {
            *byte = 0x00;
            repaired += 1;
        }
    }
    log::trace!(
        "check_bad_gcr(): Found {} bad GCR bytes, repaired {} at level {}",
        total,
        repaired,
        fix
    );
    total
}
