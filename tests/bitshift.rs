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
*/
mod common;

use common::*;
use nibkit::{
    bitshift::{align_bitshifted_track, is_track_bitshifted, shift_buffer_left, shift_buffer_right},
    gcr::check_errors,
    prelude::*,
    types::NIB_TRACK_LENGTH,
};

#[test]
fn test_realign_shifted_track() {
    init();
    let (data, _) = synthetic_track(31, 0xB175);
    assert!(!is_track_bitshifted(&data));

    for bits in 1..8 {
        let shifted = shift_buffer_right(&data, bits);
        assert!(is_track_bitshifted(&shifted), "shift {}", bits);

        let aligned = align_bitshifted_track(&shifted);
        assert!(!is_track_bitshifted(&aligned), "shift {}", bits);
        assert!(aligned.len() >= data.len());
        assert!(check_errors(&aligned, 31, TEST_DISK_ID).is_clean(), "shift {}", bits);
    }
}

#[test]
fn test_process_shifted_capture() {
    init();
    let config = NibConfig::default();
    for (track, bits) in [(2u8, 1usize), (19, 3), (27, 5), (33, 7)] {
        let (data, sectors) = synthetic_track(track, 0xB17);
        let shifted = shift_buffer_left(&data, bits);
        let raw = raw_capture(&shifted, 250, NIB_TRACK_LENGTH);

        let density = TrackDensityFlags::from_zone(DensityZone::for_track(track));
        let processed = process_track(&raw, track as usize * 2, density, &config);
        assert!(processed.bitshifted, "track {}", track);
        assert_eq!(processed.cycle.length, data.len(), "track {}", track);

        let report = check_errors(&processed.data, track, TEST_DISK_ID);
        assert!(report.is_clean(), "track {}: {:?}", track, report.errors);
        let decoded = nibkit::gcr::decode_track(&processed.data, track, TEST_DISK_ID);
        for (s, sector) in decoded.iter().enumerate() {
            assert_eq!(sector.data, sectors[s], "track {} sector {}", track, s);
        }
    }
}
