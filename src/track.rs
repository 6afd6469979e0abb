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

    src/track.rs
*/
//! The read pipeline for a single raw track capture.
//!
//! A capture flows through sync classification, cycle detection, extraction of
//! one revolution, bit-shift repair if needed, and finally alignment to a
//! meaningful start point. The result is one revolution of byte-aligned GCR
//! ready for sector decoding or storage in a G64 image.

use crate::{
    align::align_track,
    bitshift::{align_bitshifted_track, find_sync_bits, is_track_bitshifted},
    config::NibConfig,
    cycle::{find_track_cycle, Cycle, CycleMethod},
    gcr::{check_sync_flags, SYNC_BYTE},
    types::{AlignmentTag, DensityZone, TrackDensityFlags},
};

/// One revolution of a track after the read pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedTrack {
    pub halftrack:  usize,
    pub data:       Vec<u8>,
    /// Density flags, including the sync and cycle flags discovered by analysis.
    pub density:    TrackDensityFlags,
    /// The cycle located within the raw capture.
    pub cycle:      Cycle,
    pub tag:        AlignmentTag,
    /// True if the capture was bit-shifted and had to be realigned.
    pub bitshifted: bool,
}

impl ProcessedTrack {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn zone(&self) -> DensityZone {
        self.density.zone()
    }

    /// Return the whole track number, if this is a whole track rather than a halftrack.
    pub fn track_number(&self) -> Option<u8> {
        if self.halftrack % 2 == 0 {
            u8::try_from(self.halftrack / 2).ok()
        }
        else {
            None
        }
    }
}

/// Run the read pipeline over a raw capture of one halftrack.
///
/// `density` supplies the density zone the track was captured at; any analysis flags it
/// carries are recomputed. Killer tracks (almost entirely sync) are returned as one full
/// revolution of sync at the zone's capacity.
pub fn process_track(raw: &[u8], halftrack: usize, density: TrackDensityFlags, config: &NibConfig) -> ProcessedTrack {
    let mut flags = check_sync_flags(raw, density - (TrackDensityFlags::BM_NO_CYCLE | TrackDensityFlags::BM_MATCH));
    let zone = flags.zone();

    if flags.contains(TrackDensityFlags::BM_FF_TRACK) {
        log::debug!("process_track(): Halftrack {} is a killer track", halftrack);
        return ProcessedTrack {
            halftrack,
            data: vec![SYNC_BYTE; zone.capacity()],
            density: flags,
            cycle: Cycle {
                start:  0,
                length: raw.len(),
                method: CycleMethod::NotFound,
            },
            tag: AlignmentTag::None,
            bitshifted: false,
        };
    }

    let cycle = find_track_cycle(raw, zone, flags, config);
    if !cycle.found() {
        flags |= TrackDensityFlags::BM_NO_CYCLE;
    }
    else if (zone.capacity_min()..=zone.capacity_max()).contains(&cycle.length) {
        flags |= TrackDensityFlags::BM_MATCH;
    }

    let mut revolution = cycle.extract(raw);
    let bitshifted = !flags.contains(TrackDensityFlags::BM_NO_SYNC) && is_track_bitshifted(&revolution);
    if bitshifted {
        log::debug!("process_track(): Halftrack {} is bit-shifted, realigning", halftrack);
        // Start the revolution at a sync so the block it interrupts is realigned whole.
        if let Some(run) = find_sync_bits(&revolution, 0) {
            revolution.rotate_left(run.start / 8);
        }
        revolution = align_bitshifted_track(&revolution);
    }

    let aligned = align_track(&revolution, halftrack, config);
    log::debug!(
        "process_track(): Halftrack {}: {} bytes, {}, aligned by {}",
        halftrack,
        aligned.data.len(),
        zone,
        aligned.tag
    );

    ProcessedTrack {
        halftrack,
        data: aligned.data,
        density: flags,
        cycle,
        tag: aligned.tag,
        bitshifted,
    }
}
