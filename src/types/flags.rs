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

    src/types/flags.rs
*/
use crate::types::DensityZone;
use bitflags::bitflags;

bitflags! {
    /// Density byte flags stored per track in a NIB file.
    /// The two low bits hold the [DensityZone]; the high bits record what the track
    /// analysis discovered about the capture.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[rustfmt::skip]
    pub struct TrackDensityFlags: u8 {
        #[doc = "Mask for the density zone bits"]
        const ZONE_MASK     = 0b0000_0011;
        #[doc = "The revolution length agrees with the density zone"]
        const BM_MATCH      = 0b0001_0000;
        #[doc = "No repeating cycle could be found in the capture"]
        const BM_NO_CYCLE   = 0b0010_0000;
        #[doc = "Track contains no sync marks"]
        const BM_NO_SYNC    = 0b0100_0000;
        #[doc = "Track is (almost) entirely sync - a 'killer' track"]
        const BM_FF_TRACK   = 0b1000_0000;
    }
}

impl TrackDensityFlags {
    /// Build a flag set holding only the specified density zone.
    pub fn from_zone(zone: DensityZone) -> TrackDensityFlags {
        TrackDensityFlags::from_bits_retain(zone.value())
    }

    /// Return the density zone stored in the low bits.
    pub fn zone(&self) -> DensityZone {
        DensityZone::from_bits(self.bits())
    }

    /// Return a copy of these flags with the density zone replaced.
    pub fn with_zone(&self, zone: DensityZone) -> TrackDensityFlags {
        TrackDensityFlags::from_bits_retain((self.bits() & !0x03) | zone.value())
    }

    /// Return true if the track holds no usable sector data (no sync, or all sync).
    pub fn is_unformatted(&self) -> bool {
        self.intersects(TrackDensityFlags::BM_NO_SYNC | TrackDensityFlags::BM_FF_TRACK)
    }
}

bitflags! {
    /// Per-track options controlling which reduction strategies may be used to shorten
    /// a track that exceeds its target length.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[rustfmt::skip]
    pub struct ReduceFlags: u8 {
        #[doc = "Shorten sync (0xFF) runs"]
        const SYNC          = 0b0000_0001;
        #[doc = "Shorten runs of bad GCR (0x00) bytes"]
        const BADGCR        = 0b0000_0010;
        #[doc = "Shorten gap bytes leading into sync marks"]
        const GAP           = 0b0000_0100;
    }
}

impl Default for ReduceFlags {
    fn default() -> Self {
        ReduceFlags::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_zone_bits() {
        let flags = TrackDensityFlags::from_zone(DensityZone::ZONE2) | TrackDensityFlags::BM_NO_SYNC;
        assert_eq!(flags.zone(), DensityZone::ZONE2);
        assert_eq!(flags.bits(), 0x42);
        assert!(flags.is_unformatted());

        let flags = flags.with_zone(DensityZone::ZONE1);
        assert_eq!(flags.bits(), 0x41);
    }
}
