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
    gcr::{check_errors, SYNC_BYTE},
    prelude::*,
    reduce::{compress_halftrack, lengthen_track, prepare_write_track, WRITE_LEADER_LENGTH},
    types::{ReduceFlags, G64_TRACK_MAXLEN},
};

/// Lengthen every sync run in a track to `sync_len` bytes.
fn stretch_syncs(track: &[u8], sync_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(track.len() * 2);
    let mut pos = 0;
    while pos < track.len() {
        if track[pos] == SYNC_BYTE {
            while pos < track.len() && track[pos] == SYNC_BYTE {
                pos += 1;
            }
            out.extend(std::iter::repeat(SYNC_BYTE).take(sync_len));
        }
        else {
            out.push(track[pos]);
            pos += 1;
        }
    }
    out
}

#[test]
fn test_compress_long_syncs() {
    init();
    let (data, sectors) = synthetic_track(1, 21);
    let long = stretch_syncs(&data, 40);
    assert!(long.len() > G64_TRACK_MAXLEN);

    let config = NibConfig::default();
    let compressed = compress_halftrack(&long, 2, &config, G64_TRACK_MAXLEN);
    assert_eq!(compressed.len(), G64_TRACK_MAXLEN);

    let decoded = nibkit::gcr::decode_track(&compressed, 1, TEST_DISK_ID);
    for (s, sector) in decoded.iter().enumerate() {
        assert_eq!(sector.error, SectorErrorCode::Ok, "sector {}", s);
        assert_eq!(sector.data, sectors[s]);
    }
}

#[test]
fn test_compress_is_bounded() {
    init();
    let (data, _) = synthetic_track(1, 22);
    let long = stretch_syncs(&data, 60);

    let config = NibConfig::default().with_reduction(1, ReduceFlags::empty()).unwrap();
    let compressed = compress_halftrack(&long, 2, &config, G64_TRACK_MAXLEN);
    assert_eq!(compressed.len(), G64_TRACK_MAXLEN);
    assert_eq!(compressed[..], long[..G64_TRACK_MAXLEN]);

    // A track that already fits is left alone.
    assert_eq!(compress_halftrack(&data, 2, &NibConfig::default(), G64_TRACK_MAXLEN), data);
}

#[test]
fn test_prepare_write_track() {
    init();
    let (data, _) = synthetic_track(25, 23);
    let flags = TrackDensityFlags::from_zone(DensityZone::ZONE1);

    let mut short = data.clone();
    short.truncate(6000);
    let out = prepare_write_track(&short, 50, flags, &NibConfig::default());
    assert_eq!(out.len(), WRITE_LEADER_LENGTH + DensityZone::ZONE1.capacity());
    assert!(out[..WRITE_LEADER_LENGTH].iter().all(|&b| b == 0x55));

    let long = stretch_syncs(&data, 20);
    let out = prepare_write_track(&long, 50, flags, &NibConfig::default());
    assert_eq!(out.len(), WRITE_LEADER_LENGTH + DensityZone::ZONE1.capacity());
    assert!(check_errors(&out[WRITE_LEADER_LENGTH..], 25, TEST_DISK_ID).is_clean());

    let mut padded = data[..100].to_vec();
    lengthen_track(&mut padded, 200);
    assert_eq!(padded.len(), 200);
    assert!(padded[100..].iter().all(|&b| b == 0x55));
}

#[test]
fn test_reduction_never_grows() {
    use nibkit::reduce::{reduce_gaps, reduce_runs};
    let (data, _) = synthetic_track(18, 24);
    let inputs: Vec<Vec<u8>> = vec![
        data.clone(),
        stretch_syncs(&data, 30),
        vec![0xFF; 500],
        vec![0x00; 500],
        vec![0x55, 0xFF, 0xFF, 0x52],
        Vec::new(),
    ];

    for input in &inputs {
        for target in [0usize, 1, 100, 7000] {
            let mut track = input.clone();
            let len = reduce_runs(&mut track, target, 2, 0xFF);
            assert!(len <= input.len());
            assert_eq!(len, track.len());
            if !input.is_empty() && input.iter().any(|&b| b != 0xFF) {
                assert!(len > 0);
            }

            let mut track = input.clone();
            let len = reduce_gaps(&mut track, target);
            assert!(len <= input.len());
            if !input.is_empty() && input.iter().any(|&b| b != 0x55) {
                assert!(len > 0);
            }
        }
    }
}
