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

    src/compare.rs
*/
//! Comparison of two captures of the same track, at the byte level and the
//! sector level.

use crate::{
    gcr::{decode_track, is_bad_gcr, SYNC_BYTE},
    types::SectorErrorCode,
};

/// Byte-level comparison result. Counts are in bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackComparison {
    pub same: usize,
    pub diff: usize,
    pub skipped_sync: usize,
    pub skipped_bad: usize,
    pub skipped_shift: usize,
}

impl TrackComparison {
    pub fn is_identical(&self) -> bool {
        self.diff == 0
    }
}

/// Compare two tracks byte by byte, tolerating differences that don't affect the data.
///
/// Where the bytes differ, an extra sync byte or a bad GCR byte on either side is skipped,
/// as is a single inserted byte on either side. The same rules apply to both inputs, so
/// that swapping them produces the same counts in all but contrived cases. Bytes left over
/// on either side once the shorter track is exhausted count as differences.
pub fn compare_tracks(a: &[u8], b: &[u8]) -> TrackComparison {
    let mut result = TrackComparison::default();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            result.same += 1;
            i += 1;
            j += 1;
        }
        else if a[i] == SYNC_BYTE {
            result.skipped_sync += 1;
            i += 1;
        }
        else if b[j] == SYNC_BYTE {
            result.skipped_sync += 1;
            j += 1;
        }
        else if is_bad_gcr(a, i) {
            result.skipped_bad += 1;
            i += 1;
        }
        else if is_bad_gcr(b, j) {
            result.skipped_bad += 1;
            j += 1;
        }
        else if i + 1 < a.len() && a[i + 1] == b[j] {
            result.skipped_shift += 1;
            i += 1;
        }
        else if j + 1 < b.len() && b[j + 1] == a[i] {
            result.skipped_shift += 1;
            j += 1;
        }
        else {
            result.diff += 1;
            i += 1;
            j += 1;
        }
    }

    result.diff += (a.len() - i) + (b.len() - j);
    result
}

/// Sector-level comparison result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorComparison {
    /// Sectors that decoded cleanly on both tracks with identical payloads.
    pub identical: usize,
    /// Sectors that decoded cleanly on both tracks with differing payloads.
    pub differing: usize,
    /// Sectors that failed to decode on the first track.
    pub errors_a: usize,
    /// Sectors that failed to decode on the second track.
    pub errors_b: usize,
}

/// Decode every sector of two captures of the same track and compare their payloads.
pub fn compare_sectors(a: &[u8], b: &[u8], track: u8, id_a: [u8; 2], id_b: [u8; 2]) -> SectorComparison {
    let sectors_a = decode_track(a, track, id_a);
    let sectors_b = decode_track(b, track, id_b);
    let mut result = SectorComparison::default();

    for (sa, sb) in sectors_a.iter().zip(sectors_b.iter()) {
        let ok_a = sa.error == SectorErrorCode::Ok;
        let ok_b = sb.error == SectorErrorCode::Ok;
        if !ok_a {
            result.errors_a += 1;
        }
        if !ok_b {
            result.errors_b += 1;
        }
        if ok_a && ok_b {
            if sa.data == sb.data {
                result.identical += 1;
            }
            else {
                log::debug!("compare_sectors(): Track {} sector data differs", track);
                result.differing += 1;
            }
        }
    }
    result
}
