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

    src/align.rs
*/
//! Selection of a meaningful start point for one revolution of track data.
//!
//! Once a revolution has been isolated its start is arbitrary: it is wherever
//! the capture happened to begin. Rotating the track to a consistent landmark
//! (the long gap before sector 0, the sector 0 header, a protection marker)
//! makes tracks comparable between captures and produces images that write
//! back correctly.

use crate::{
    config::NibConfig,
    copy_protection::{detect_protection, CopyProtectionScheme},
    gcr::{decode_buffer, find_sync, is_bad_gcr, DATA_LENGTH, HEADER_ID, HEADER_LENGTH, SYNC_LENGTH},
    types::{AlignmentKind, AlignmentTag},
    util::{longest_run, sync_start_before},
};

/// The sync-to-sync distance of a typical data block (data, inter-sector gap and sync).
pub const GCR_BLOCK_DATA_LEN: usize = DATA_LENGTH + SYNC_LENGTH + 7;
/// A gap longer than a data block by at least this margin is taken to be the gap before
/// sector 0.
pub const SECTOR_GAP_MARGIN: usize = 0x20;
/// Bytes backed off from the end of a repeated-byte run when aligning on it.
pub const AUTOGAP_BACKOFF: usize = 5;

/// One revolution of track data rotated to its chosen start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignedTrack {
    pub data:   Vec<u8>,
    /// The offset within the input revolution that became the start of the track.
    pub offset: usize,
    pub tag:    AlignmentTag,
}

/// Choose the start of a revolution and rotate the track to it.
///
/// A per-track override in `config` is honoured first; if the requested marker can't be
/// found a warning is logged and automatic selection is used instead. Automatic selection
/// tries, in order: protection signatures, a long gap before a sync, the sector 0 header,
/// any sync gap, and the longest run of a repeated byte. If none apply the track is
/// returned unrotated and tagged [AlignmentTag::None].
pub fn align_track(cycle: &[u8], halftrack: usize, config: &NibConfig) -> AlignedTrack {
    let len = cycle.len();
    if len == 0 {
        return AlignedTrack::default();
    }

    let mut work = Vec::with_capacity(len * 2);
    work.extend_from_slice(cycle);
    work.extend_from_slice(cycle);

    let forced = config.align_for(halftrack);
    let mut choice = match forced {
        AlignmentKind::Auto => None,
        AlignmentKind::Raw => Some((0, AlignmentTag::None)),
        kind => {
            let found = find_by_kind(&work, len, kind);
            if found.is_none() {
                log::warn!(
                    "align_track(): Halftrack {}: requested {} alignment marker not found, using automatic selection",
                    halftrack,
                    kind
                );
            }
            found
        }
    };

    if choice.is_none() {
        choice = auto_align(&work, len);
    }

    let (offset, tag) = choice.unwrap_or((0, AlignmentTag::None));
    let offset = offset % len;
    log::debug!(
        "align_track(): Halftrack {}: aligned at {} of {} by {}",
        halftrack,
        offset,
        len,
        tag
    );

    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(&cycle[offset..]);
    data.extend_from_slice(&cycle[..offset]);
    AlignedTrack { data, offset, tag }
}

fn auto_align(work: &[u8], len: usize) -> Option<(usize, AlignmentTag)> {
    if let Some((pos, scheme)) = detect_protection(work, len) {
        return Some((pos, AlignmentTag::ProtectionSignature(scheme)));
    }

    let gap = find_sector_gap(work, len);
    if let Some((pos, gap_len)) = gap {
        if gap_len > GCR_BLOCK_DATA_LEN + SECTOR_GAP_MARGIN {
            return Some((pos, AlignmentTag::Gap));
        }
    }
    if let Some(pos) = find_sector0(work, len) {
        return Some((pos, AlignmentTag::Sector0));
    }
    if let Some((pos, _)) = gap {
        return Some((pos, AlignmentTag::Gap));
    }
    find_autogap(work, len).map(|pos| (pos, AlignmentTag::AutoGap))
}

fn find_by_kind(work: &[u8], len: usize, kind: AlignmentKind) -> Option<(usize, AlignmentTag)> {
    let protection = |scheme: CopyProtectionScheme| {
        scheme
            .find_marker(work, len)
            .map(|pos| (pos, AlignmentTag::ProtectionSignature(scheme)))
    };

    match kind {
        AlignmentKind::Auto => None,
        AlignmentKind::Raw => Some((0, AlignmentTag::None)),
        AlignmentKind::Gap => find_sector_gap(work, len).map(|(pos, _)| (pos, AlignmentTag::Gap)),
        AlignmentKind::Sector0 => find_sector0(work, len).map(|pos| (pos, AlignmentTag::Sector0)),
        AlignmentKind::LongestSync => find_long_sync(work, len).map(|pos| (pos, AlignmentTag::LongestSync)),
        AlignmentKind::BadGcr => find_bad_gap(work, len).map(|pos| (pos, AlignmentTag::BadGcrRun)),
        AlignmentKind::AutoGap => find_autogap(work, len).map(|pos| (pos, AlignmentTag::AutoGap)),
        AlignmentKind::VMax => protection(CopyProtectionScheme::VMax),
        AlignmentKind::VMaxCinemaware => protection(CopyProtectionScheme::VMaxCinemaware),
        AlignmentKind::PirateSlayer => protection(CopyProtectionScheme::PirateSlayer),
        AlignmentKind::RapidLok => protection(CopyProtectionScheme::RapidLok),
    }
}

/// Find the longest distance between consecutive syncs. Returns the position of the first
/// sync byte that ends that gap, and the length of the gap.
pub fn find_sector_gap(work: &[u8], len: usize) -> Option<(usize, usize)> {
    let end = work.len();
    let first = find_sync(work, 0, end)?;

    let mut best: Option<(usize, usize)> = None;
    let mut last = first;
    while last < first + len {
        let next = match find_sync(work, last, end) {
            Some(p) => p,
            None => break,
        };
        let gap = next - last;
        if best.map_or(true, |(_, g)| gap > g) {
            best = Some((next, gap));
        }
        last = next;
    }

    best.map(|(pos, gap)| (sync_start_before(&work[..len], pos), gap))
}

/// Find the header of sector 0 and return the start of the sync preceding it.
pub fn find_sector0(work: &[u8], len: usize) -> Option<usize> {
    let end = work.len();
    let mut pos = 0;
    while let Some(p) = find_sync(work, pos, end) {
        if p > len || p + HEADER_LENGTH > end {
            break;
        }
        pos = p;
        let (header, _) = decode_buffer(&work[p..p + HEADER_LENGTH]);
        if header[0] == HEADER_ID && header[2] == 0 {
            return Some(sync_start_before(&work[..len], p));
        }
    }
    None
}

/// Find the start of the longest run of sync bytes.
pub fn find_long_sync(work: &[u8], len: usize) -> Option<usize> {
    longest_run(work, len, |b| b == 0xFF).map(|(start, _)| start % len)
}

/// Find the end of the longest run of bad GCR bytes.
pub fn find_bad_gap(work: &[u8], len: usize) -> Option<usize> {
    let bad: Vec<u8> = (0..work.len()).map(|p| is_bad_gcr(work, p) as u8).collect();
    longest_run(&bad, len, |b| b == 1).map(|(start, run)| (start + run) % len)
}

/// Find the longest run of any single repeated byte and return a position a few bytes
/// before its start, leaving a short lead-in.
pub fn find_autogap(work: &[u8], len: usize) -> Option<usize> {
    let limit = len.min(work.len());
    let mut best: Option<(usize, usize)> = None;
    let mut pos = 0;
    while pos < limit {
        let start = pos;
        while pos + 1 < work.len() && work[pos + 1] == work[start] {
            pos += 1;
        }
        pos += 1;
        let run = pos - start;
        if run > 1 && best.map_or(true, |(_, r)| run > r) {
            best = Some((start, run));
        }
    }
    best.map(|(start, _)| (start + len - AUTOGAP_BACKOFF % len) % len)
}
