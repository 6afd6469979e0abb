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

    src/config.rs
*/
//! Tunable parameters for track analysis and conversion.
//!
//! A [NibConfig] is built once, validated, and then passed by reference to every
//! pipeline stage. Invalid values are rejected when they are set rather than
//! when a track is processed.

use crate::{
    types::{AlignmentKind, ReduceFlags, MAX_HALFTRACKS, MAX_TRACK},
    NibError,
};

/// Default number of bytes compared when matching marker windows between revolutions.
pub const DEFAULT_GAP_MATCH_LENGTH: usize = 7;
/// Default number of bytes by which the capacity search bounds are relaxed.
pub const DEFAULT_CAP_RELAX: usize = 16;
/// Default minimum run length preserved when shortening sync and bad GCR runs.
pub const DEFAULT_MIN_SYNC_RUN: usize = 2;
/// The highest supported GCR repair level.
pub const MAX_FIX_GCR_LEVEL: u8 = 4;
/// The longest marker window that may be compared.
pub const MAX_GAP_MATCH_LENGTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NibConfig {
    /// Number of bytes compared after each header or sync mark when searching for a cycle.
    pub(crate) gap_match_length: usize,
    /// Allowance subtracted from / added to the capacity bounds during cycle detection.
    pub(crate) cap_relax: usize,
    /// Bad GCR repair level, 0 (none) to 4 (most aggressive).
    pub(crate) fix_gcr: u8,
    /// Minimum run length preserved by run reduction.
    pub(crate) min_sync_run: usize,
    /// Alignment overrides, indexed by halftrack.
    pub(crate) align_map: Vec<AlignmentKind>,
    /// Reduction options, indexed by halftrack.
    pub(crate) reduce_map: Vec<ReduceFlags>,
}

impl Default for NibConfig {
    fn default() -> Self {
        NibConfig {
            gap_match_length: DEFAULT_GAP_MATCH_LENGTH,
            cap_relax: DEFAULT_CAP_RELAX,
            fix_gcr: 0,
            min_sync_run: DEFAULT_MIN_SYNC_RUN,
            align_map: vec![AlignmentKind::Auto; MAX_HALFTRACKS + 2],
            reduce_map: vec![ReduceFlags::default(); MAX_HALFTRACKS + 2],
        }
    }
}

impl NibConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the number of bytes compared when matching marker windows.
    pub fn with_gap_match_length(mut self, len: usize) -> Result<Self, NibError> {
        if len == 0 || len > MAX_GAP_MATCH_LENGTH {
            return Err(NibError::ParameterError(format!(
                "Gap match length must be between 1 and {}",
                MAX_GAP_MATCH_LENGTH
            )));
        }
        self.gap_match_length = len;
        Ok(self)
    }

    /// Set the bad GCR repair level.
    pub fn with_fix_gcr(mut self, level: u8) -> Result<Self, NibError> {
        if level > MAX_FIX_GCR_LEVEL {
            return Err(NibError::ParameterError(format!(
                "GCR repair level must be between 0 and {}",
                MAX_FIX_GCR_LEVEL
            )));
        }
        self.fix_gcr = level;
        Ok(self)
    }

    /// Set the allowance used to relax the capacity bounds during cycle detection.
    pub fn with_cap_relax(mut self, relax: usize) -> Self {
        self.cap_relax = relax;
        self
    }

    /// Set the minimum run length preserved by run reduction.
    pub fn with_min_sync_run(mut self, run: usize) -> Self {
        self.min_sync_run = run;
        self
    }

    /// Force a specific alignment method for a whole track (both of its halftracks).
    pub fn with_alignment(mut self, track: u8, kind: AlignmentKind) -> Result<Self, NibError> {
        self.set_alignment(track, kind)?;
        Ok(self)
    }

    /// Set reduction options for a whole track (both of its halftracks).
    pub fn with_reduction(mut self, track: u8, flags: ReduceFlags) -> Result<Self, NibError> {
        let halftrack = Self::track_to_halftrack(track)?;
        self.reduce_map[halftrack] = flags;
        self.reduce_map[halftrack + 1] = flags;
        Ok(self)
    }

    pub fn set_alignment(&mut self, track: u8, kind: AlignmentKind) -> Result<(), NibError> {
        let halftrack = Self::track_to_halftrack(track)?;
        self.align_map[halftrack] = kind;
        self.align_map[halftrack + 1] = kind;
        Ok(())
    }

    /// Parse and apply an alignment override of the form `TRACK:KIND`, ie, `18:vmax`.
    pub fn set_align_override(&mut self, arg: &str) -> Result<(), NibError> {
        let (track_str, kind_str) = arg
            .split_once(':')
            .ok_or_else(|| NibError::ParameterError(format!("Expected TRACK:KIND, got '{}'", arg)))?;

        let track = track_str
            .trim()
            .parse::<u8>()
            .map_err(|_| NibError::ParameterError(format!("Invalid track number '{}'", track_str)))?;
        let kind = kind_str
            .trim()
            .parse::<AlignmentKind>()
            .map_err(|_| NibError::ParameterError(format!("Unknown alignment method '{}'", kind_str)))?;

        log::debug!("NibConfig::set_align_override(): Track {} forced to {}", track, kind);
        self.set_alignment(track, kind)
    }

    #[inline]
    pub fn gap_match_length(&self) -> usize {
        self.gap_match_length
    }

    #[inline]
    pub fn cap_relax(&self) -> usize {
        self.cap_relax
    }

    #[inline]
    pub fn fix_gcr(&self) -> u8 {
        self.fix_gcr
    }

    #[inline]
    pub fn min_sync_run(&self) -> usize {
        self.min_sync_run
    }

    /// Return the alignment override for the specified halftrack.
    pub fn align_for(&self, halftrack: usize) -> AlignmentKind {
        self.align_map.get(halftrack).copied().unwrap_or_default()
    }

    /// Return the reduction options for the specified halftrack.
    pub fn reduce_for(&self, halftrack: usize) -> ReduceFlags {
        self.reduce_map.get(halftrack).copied().unwrap_or_default()
    }

    fn track_to_halftrack(track: u8) -> Result<usize, NibError> {
        if track == 0 || track > MAX_TRACK {
            return Err(NibError::InvalidTrack(track));
        }
        Ok(track as usize * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NibConfig::default();
        assert_eq!(config.gap_match_length(), 7);
        assert_eq!(config.fix_gcr(), 0);
        assert_eq!(config.align_for(36), AlignmentKind::Auto);
        assert_eq!(config.align_for(1000), AlignmentKind::Auto);
    }

    #[test]
    fn test_align_override() {
        let mut config = NibConfig::new();
        config.set_align_override("18:vmax").unwrap();
        assert_eq!(config.align_for(36), AlignmentKind::VMax);
        assert_eq!(config.align_for(37), AlignmentKind::VMax);
        assert_eq!(config.align_for(38), AlignmentKind::Auto);

        assert!(config.set_align_override("18").is_err());
        assert!(config.set_align_override("0:gap").is_err());
        assert!(config.set_align_override("43:gap").is_err());
        assert!(config.set_align_override("18:wibble").is_err());
    }

    #[test]
    fn test_validation() {
        assert!(NibConfig::new().with_fix_gcr(4).is_ok());
        assert!(NibConfig::new().with_fix_gcr(5).is_err());
        assert!(NibConfig::new().with_gap_match_length(0).is_err());
        assert!(NibConfig::new().with_gap_match_length(12).is_ok());
    }
}
