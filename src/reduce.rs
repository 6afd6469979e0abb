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

    src/reduce.rs
*/
//! Track length reduction and write preparation.
//!
//! A captured revolution is often slightly longer than the space available to
//! store it (a G64 track slot) or to write it back at a given density. Tracks
//! are shortened by stripping bytes that carry no information: the redundant
//! tail of long sync runs, runs of bad GCR, and gap bytes leading into a sync.

use crate::{
    config::NibConfig,
    gcr::{check_bad_gcr, GAP_BYTE, SYNC_BYTE},
    types::{DensityZone, ReduceFlags, TrackDensityFlags},
};
use std::iter::repeat;

/// The byte used for runs of bad GCR after repair.
pub const BAD_GCR_BYTE: u8 = 0x00;
/// Length of the gap lead-in written ahead of a track on a physical disk.
pub const WRITE_LEADER_LENGTH: usize = 10;

/// Strip one byte from every run of `target` longer than `min_run`, stopping early once the
/// track is no longer than `target_len`. Returns the number of bytes removed.
fn strip_runs(track: &mut Vec<u8>, target_len: usize, min_run: usize, target: u8) -> usize {
    let len = track.len();
    let mut out = Vec::with_capacity(len);
    let mut removed = 0;
    let mut pos = 0;

    while pos < len {
        if track[pos] != target {
            out.push(track[pos]);
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < len && track[pos] == target {
            pos += 1;
        }
        let run = pos - start;
        let strip = usize::from(run > min_run && len - removed > target_len);
        out.extend(repeat(target).take(run - strip));
        removed += strip;
    }

    *track = out;
    removed
}

/// Repeatedly shorten runs of `target` bytes longer than `min_run` until the track is no
/// longer than `target_len` or no run can be shortened further. Returns the new length.
pub fn reduce_runs(track: &mut Vec<u8>, target_len: usize, min_run: usize, target: u8) -> usize {
    while track.len() > target_len {
        if strip_runs(track, target_len, min_run, target) == 0 {
            break;
        }
    }
    track.len()
}

/// Repeatedly remove a gap byte immediately preceding a sync run of two or more bytes, until
/// the track is no longer than `target_len` or no such byte remains. Returns the new length.
pub fn reduce_gaps(track: &mut Vec<u8>, target_len: usize) -> usize {
    while track.len() > target_len {
        let len = track.len();
        let mut out = Vec::with_capacity(len);
        let mut removed = 0;

        for pos in 0..len {
            let precedes_sync = pos + 2 < len && track[pos + 1] == SYNC_BYTE && track[pos + 2] == SYNC_BYTE;
            if track[pos] == GAP_BYTE && precedes_sync && len - removed > target_len {
                removed += 1;
                continue;
            }
            out.push(track[pos]);
        }

        *track = out;
        if removed == 0 {
            break;
        }
    }
    track.len()
}

/// Shorten a track to at most `target_len` bytes.
///
/// Bad GCR is first repaired at the configured level. If the track is too long, the
/// strategies enabled for the halftrack are applied in order: sync runs, bad GCR runs and
/// gap bytes. Any remaining excess is truncated from the end of the track.
pub fn compress_halftrack(track: &[u8], halftrack: usize, config: &NibConfig, target_len: usize) -> Vec<u8> {
    let mut data = track.to_vec();
    check_bad_gcr(&mut data, config.fix_gcr());

    let original = data.len();
    if original <= target_len {
        return data;
    }

    let flags = config.reduce_for(halftrack);
    if flags.contains(ReduceFlags::SYNC) {
        reduce_runs(&mut data, target_len, config.min_sync_run(), SYNC_BYTE);
    }
    if flags.contains(ReduceFlags::BADGCR) {
        reduce_runs(&mut data, target_len, 0, BAD_GCR_BYTE);
    }
    if flags.contains(ReduceFlags::GAP) {
        reduce_gaps(&mut data, target_len);
    }

    if data.len() > target_len {
        log::warn!(
            "compress_halftrack(): Halftrack {}: truncating {} bytes",
            halftrack,
            data.len() - target_len
        );
        data.truncate(target_len);
    }
    log::debug!(
        "compress_halftrack(): Halftrack {}: {} -> {} bytes",
        halftrack,
        original,
        data.len()
    );
    data
}

/// Pad a short track with gap bytes to `target_len`. Longer tracks are left unchanged.
pub fn lengthen_track(track: &mut Vec<u8>, target_len: usize) {
    if track.len() < target_len {
        track.resize(target_len, GAP_BYTE);
    }
}

/// Prepare a track for writing at its density: a gap lead-in followed by the track reduced
/// or lengthened to the nominal capacity of its zone. Killer tracks are written as a full
/// revolution of sync.
pub fn prepare_write_track(
    track: &[u8],
    halftrack: usize,
    flags: TrackDensityFlags,
    config: &NibConfig,
) -> Vec<u8> {
    let zone: DensityZone = flags.zone();
    let capacity = zone.capacity();
    let mut out = Vec::with_capacity(WRITE_LEADER_LENGTH + capacity);
    out.extend(repeat(GAP_BYTE).take(WRITE_LEADER_LENGTH));

    if flags.contains(TrackDensityFlags::BM_FF_TRACK) {
        out.extend(repeat(SYNC_BYTE).take(capacity));
        return out;
    }

    let mut body = compress_halftrack(track, halftrack, config, capacity);
    lengthen_track(&mut body, capacity);
    out.extend(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_runs() {
        let mut track = vec![0x52, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x52, 0xFF, 0xFF, 0x52];
        let len = reduce_runs(&mut track, 6, 2, 0xFF);
        assert_eq!(len, 7);
        assert_eq!(track, vec![0x52, 0xFF, 0xFF, 0x52, 0xFF, 0xFF, 0x52]);
    }

    #[test]
    fn test_reduce_runs_stops_at_target() {
        let mut track = vec![0xFF; 10];
        assert_eq!(reduce_runs(&mut track, 8, 0, 0xFF), 8);
        assert_eq!(reduce_runs(&mut track, 0, 0, 0xFF), 0);
    }

    #[test]
    fn test_reduce_gaps() {
        let mut track = vec![0x52, 0x55, 0x55, 0x55, 0xFF, 0xFF, 0x52];
        assert_eq!(reduce_gaps(&mut track, 0), 4);
        assert_eq!(track, vec![0x52, 0xFF, 0xFF, 0x52]);
    }

    #[test]
    fn test_prepare_killer_track() {
        let flags = TrackDensityFlags::from_zone(DensityZone::ZONE3) | TrackDensityFlags::BM_FF_TRACK;
        let out = prepare_write_track(&[0xFF; 100], 2, flags, &NibConfig::default());
        assert_eq!(out.len(), WRITE_LEADER_LENGTH + 7692);
        assert!(out[WRITE_LEADER_LENGTH..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_prepare_short_track() {
        let flags = TrackDensityFlags::from_zone(DensityZone::ZONE0);
        let out = prepare_write_track(&[0x52; 6000], 70, flags, &NibConfig::default());
        assert_eq!(out.len(), WRITE_LEADER_LENGTH + 6250);
        assert_eq!(out[WRITE_LEADER_LENGTH + 6000], GAP_BYTE);
    }
}
