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

    src/cycle.rs
*/
//! Revolution (cycle) detection for raw track captures.
//!
//! A raw capture holds more than one revolution of a track and has no index
//! reference, so the length of a single revolution must be found by locating
//! data that repeats. Three strategies are tried in order:
//!
//! 1. Header matching: the bytes following each sector header are compared
//!    against the bytes following a header roughly one revolution later.
//! 2. Sync matching: as above, but keyed on any sync mark.
//! 3. Raw matching: an exhaustive comparison of byte windows.
//!
//! If none of these succeed the whole capture is treated as one revolution.

use crate::{
    config::NibConfig,
    gcr::{find_header, find_sync},
    types::{DensityZone, TrackDensityFlags},
};
use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::Range,
};

/// Identifies the strategy that located a [Cycle].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CycleMethod {
    Headers,
    Syncs,
    Raw,
    #[default]
    NotFound,
}

impl Display for CycleMethod {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CycleMethod::Headers => write!(f, "headers"),
            CycleMethod::Syncs => write!(f, "syncs"),
            CycleMethod::Raw => write!(f, "raw"),
            CycleMethod::NotFound => write!(f, "not found"),
        }
    }
}

/// The location of one revolution within a raw capture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cycle {
    pub start:  usize,
    pub length: usize,
    pub method: CycleMethod,
}

impl Cycle {
    /// Return true if a repeating cycle was actually detected.
    pub fn found(&self) -> bool {
        self.method != CycleMethod::NotFound
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.length
    }

    /// Copy one revolution out of the raw capture. If the cycle extends past the end of the
    /// capture, copying wraps around to the start of the cycle.
    pub fn extract(&self, raw: &[u8]) -> Vec<u8> {
        if self.start >= raw.len() || self.length == 0 {
            return Vec::new();
        }
        let available = &raw[self.start..];
        available.iter().copied().cycle().take(self.length).collect()
    }
}

/// Locate one revolution of track data in a raw capture.
///
/// `flags` are the sync flags computed for the capture; tracks without sync marks (or
/// made up entirely of sync) skip the marker based strategies. The search is bounded by
/// the capacity range of `zone`, relaxed by the configured allowance. This function never
/// fails: if no repeating data is found the whole capture is returned as the cycle.
pub fn find_track_cycle(raw: &[u8], zone: DensityZone, flags: TrackDensityFlags, config: &NibConfig) -> Cycle {
    let cap_min = zone.capacity_min().saturating_sub(config.cap_relax());
    let cap_max = zone.capacity_max() + config.cap_relax();
    let match_len = config.gap_match_length();

    let mut found = None;
    if !flags.is_unformatted() {
        found = find_cycle_by_markers(raw, cap_min, cap_max, match_len, find_header)
            .map(|(start, length)| (start, length, CycleMethod::Headers))
            .or_else(|| {
                find_cycle_by_markers(raw, cap_min, cap_max, match_len, find_sync)
                    .map(|(start, length)| (start, length, CycleMethod::Syncs))
            });
    }
    if found.is_none() {
        found = find_cycle_raw(raw, cap_min, cap_max, config.cap_relax(), match_len)
            .map(|(start, length)| (start, length, CycleMethod::Raw));
    }

    match found {
        Some((start, mut length, method)) => {
            if length <= zone.capacity_min() {
                let extend = (zone.capacity_max() - zone.capacity_min()) / 2;
                log::debug!(
                    "find_track_cycle(): Short cycle of {} bytes, extending by {}",
                    length,
                    extend
                );
                length += extend;
            }
            log::debug!(
                "find_track_cycle(): Found cycle at {} of {} bytes via {} ({})",
                start,
                length,
                method,
                zone
            );
            Cycle { start, length, method }
        }
        None => {
            log::warn!(
                "find_track_cycle(): No cycle found in {} byte capture, using whole buffer",
                raw.len()
            );
            Cycle {
                start:  0,
                length: raw.len(),
                method: CycleMethod::NotFound,
            }
        }
    }
}

/// Search for a cycle using a marker finder (headers or syncs).
///
/// Candidate start positions are the buffer start and then each marker in turn. For each
/// start, markers at least `cap_min` bytes later are tried as the start of the second
/// revolution. A candidate is accepted if the bytes following every subsequent marker
/// pair agree, the cycle is no longer than `cap_max`, and the data at the candidate looks
/// like real sector data.
fn find_cycle_by_markers<F>(
    raw: &[u8],
    cap_min: usize,
    cap_max: usize,
    match_len: usize,
    find: F,
) -> Option<(usize, usize)>
where
    F: Fn(&[u8], usize, usize) -> Option<usize>,
{
    if raw.len() <= match_len {
        return None;
    }
    let stop = raw.len() - match_len;

    let mut start = 0;
    loop {
        let mut data_pos = start + cap_min;
        if data_pos >= stop {
            return None;
        }

        while let Some(candidate) = find(raw, data_pos, stop) {
            data_pos = candidate;
            if candidate - start > cap_max {
                break;
            }
            if markers_agree(raw, start, candidate, stop, match_len, &find)
                && is_valid_cycle_data(&raw[candidate..], match_len)
            {
                return Some((start, candidate - start));
            }
        }

        start = find(raw, start, stop)?;
    }
}

/// Walk markers from `p1` and `p2` in lockstep, comparing the window after each pair.
fn markers_agree<F>(raw: &[u8], mut p1: usize, mut p2: usize, stop: usize, match_len: usize, find: &F) -> bool
where
    F: Fn(&[u8], usize, usize) -> Option<usize>,
{
    loop {
        if raw[p1..p1 + match_len] != raw[p2..p2 + match_len] {
            return false;
        }
        p1 = match find(raw, p1, stop) {
            Some(p) => p,
            None => return true,
        };
        p2 = match find(raw, p2, stop) {
            Some(p) => p,
            None => return true,
        };
    }
}

/// Exhaustive search for the first repeating window at a plausible distance.
fn find_cycle_raw(
    raw: &[u8],
    cap_min: usize,
    cap_max: usize,
    allowance: usize,
    match_len: usize,
) -> Option<(usize, usize)> {
    if raw.len() <= match_len {
        return None;
    }
    let stop = raw.len() - match_len;
    let min_distance = cap_min + allowance;

    for p1 in 0..stop {
        let lo = p1 + min_distance;
        if lo >= stop {
            break;
        }
        if !is_valid_cycle_data(&raw[p1..], match_len) {
            continue;
        }
        let window = &raw[p1..p1 + match_len];
        let hi = (p1 + cap_max).min(stop - 1);
        for p2 in lo..=hi {
            if raw[p2..p2 + match_len] == *window {
                return Some((p1, p2 - p1));
            }
        }
    }
    None
}

/// Return true if the window at the start of `data` looks like real sector data rather
/// than sync, gap filler or a repetitive pattern that would match anywhere.
///
/// The window is rejected if it contains a sync byte, if more than half of it is gap
/// filler (0x55 or 0xAA), or if it contains more than two repeated (AAA) or alternating
/// (ABAB) runs.
pub fn is_valid_cycle_data(data: &[u8], match_len: usize) -> bool {
    let window = &data[..match_len.min(data.len())];
    if window.is_empty() || window.contains(&0xFF) {
        return false;
    }

    let filler = window.iter().filter(|&&b| b == 0x55 || b == 0xAA).count();
    if filler * 2 > window.len() {
        return false;
    }

    // Count maximal runs, so one long run only counts once.
    let mut runs = 0;
    let mut i = 0;
    while i + 2 < window.len() {
        let end = if window[i] == window[i + 1] && window[i + 1] == window[i + 2] {
            let mut j = i + 3;
            while j < window.len() && window[j] == window[i] {
                j += 1;
            }
            j
        }
        else if i + 3 < window.len() && window[i] == window[i + 2] && window[i + 1] == window[i + 3] {
            let mut j = i + 4;
            while j < window.len() && window[j] == window[j - 2] {
                j += 1;
            }
            j
        }
        else {
            i += 1;
            continue;
        };
        runs += 1;
        i = end;
    }
    runs <= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cycle_data() {
        assert!(is_valid_cycle_data(&[0x52, 0x54, 0xB5, 0x29, 0x4B, 0x7A, 0x5E], 7));
        assert!(!is_valid_cycle_data(&[0x52, 0xFF, 0xB5, 0x29, 0x4B, 0x7A, 0x5E], 7));
        assert!(!is_valid_cycle_data(&[0x55; 7], 7));
    }

    #[test]
    fn test_cycle_data_run_count() {
        // A single long run counts once.
        assert!(is_valid_cycle_data(&[0x29, 0x29, 0x29, 0x29, 0x29, 0x4B, 0x7A], 7));
        assert!(is_valid_cycle_data(&[0x52, 0x4A, 0x52, 0x4A, 0x52, 0x4A, 0x52], 7));

        // Two runs are accepted, three are not.
        let two = [0x29, 0x29, 0x29, 0x4B, 0x7A, 0x4B, 0x7A, 0x5E, 0x52, 0x54];
        assert!(is_valid_cycle_data(&two, two.len()));
        let three = [0x29, 0x29, 0x29, 0x4B, 0x4B, 0x4B, 0x4B, 0x7A, 0x7A, 0x7A];
        assert!(!is_valid_cycle_data(&three, three.len()));
        let mixed = [0x29, 0x29, 0x29, 0x4B, 0x7A, 0x4B, 0x7A, 0x5E, 0x5E, 0x5E];
        assert!(!is_valid_cycle_data(&mixed, mixed.len()));
    }

    #[test]
    fn test_extract_wraps() {
        let raw = [1u8, 2, 3, 4, 5];
        let cycle = Cycle {
            start:  3,
            length: 4,
            method: CycleMethod::Raw,
        };
        assert_eq!(cycle.extract(&raw), vec![4, 5, 4, 5]);
    }

    #[test]
    fn test_no_cycle_in_noise_free_buffer() {
        // A buffer of a single repeating byte can't produce a valid cycle.
        let raw = vec![0x55; 8192];
        let config = NibConfig::default();
        let cycle = find_track_cycle(&raw, DensityZone::ZONE3, TrackDensityFlags::BM_NO_SYNC, &config);
        assert!(!cycle.found());
        assert_eq!(cycle.length, raw.len());
    }
}
