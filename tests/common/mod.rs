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
#![allow(dead_code)]

use hex::encode;
use nibkit::{
    gcr::encode_track,
    types::{sector_count, DensityZone, SectorErrorCode, TrackDensityFlags, NIB_TRACK_LENGTH},
    D64Image,
    NibImage,
    SECTOR_SIZE,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha1::{Digest, Sha1};

pub const TEST_DISK_ID: [u8; 2] = *b"NK";

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn compute_slice_hash(slice: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(slice);
    let result = hasher.finalize();

    encode(result)
}

/// Generate deterministic sector payloads for a track.
pub fn random_sectors(track: u8, seed: u64) -> Vec<[u8; SECTOR_SIZE]> {
    let mut rng = StdRng::seed_from_u64(seed ^ ((track as u64) << 32));
    (0..sector_count(track))
        .map(|_| {
            let mut sector = [0u8; SECTOR_SIZE];
            rng.fill(&mut sector[..]);
            sector
        })
        .collect()
}

/// Build a clean standard-format track holding random payloads.
pub fn synthetic_track(track: u8, seed: u64) -> (Vec<u8>, Vec<[u8; SECTOR_SIZE]>) {
    let sectors = random_sectors(track, seed);
    let data = encode_track(track, &sectors, TEST_DISK_ID, None).unwrap();
    (data, sectors)
}

/// Simulate a raw capture: start reading the circular track at `rotation` and keep
/// reading until `len` bytes have been captured.
pub fn raw_capture(track: &[u8], rotation: usize, len: usize) -> Vec<u8> {
    track
        .iter()
        .cycle()
        .skip(rotation % track.len())
        .take(len)
        .copied()
        .collect()
}

/// Build a 35 track D64 image with random payloads and a BAM carrying the test disk ID.
pub fn synthetic_d64(seed: u64) -> D64Image {
    let mut image = D64Image::new(35).unwrap();
    for track in 1..=35 {
        for (s, sector) in random_sectors(track, seed).iter().enumerate() {
            image.set_sector(track, s as u8, sector, SectorErrorCode::Ok).unwrap();
        }
    }
    let mut bam = [0u8; SECTOR_SIZE];
    bam[0] = 18;
    bam[1] = 1;
    bam[2] = 0x41;
    bam[0xA2] = TEST_DISK_ID[0];
    bam[0xA3] = TEST_DISK_ID[1];
    image.set_sector(18, 0, &bam, SectorErrorCode::Ok).unwrap();
    image
}

/// Build a NIB image by encoding every track of a D64 image and capturing each one
/// starting at a different rotation.
pub fn nib_from_d64(d64: &D64Image) -> NibImage {
    let g64 = d64.to_g64().unwrap();
    let mut nib = NibImage::new();
    for (i, track) in g64.tracks.iter().enumerate() {
        let rotation = (i * 977) % track.data.len();
        let raw = raw_capture(&track.data, rotation, NIB_TRACK_LENGTH);
        let density = TrackDensityFlags::from_zone(DensityZone::for_halftrack(track.halftrack as usize));
        nib.add_track(track.halftrack, density, &raw).unwrap();
    }
    nib
}
