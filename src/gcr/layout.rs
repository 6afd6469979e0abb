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

    src/gcr/layout.rs
*/
//! Track-level layout: building standard-format tracks from sector data and
//! decoding or checking every sector of a track.

use crate::{
    gcr::{
        codec::decode_buffer,
        scanner::{count_bad_gcr, find_header, find_sync},
        sector::{decode_sector, encode_sector, header_checksum, DecodedSector, GAP_BYTE, HEADER_ID, HEADER_LENGTH},
    },
    types::{sector_count, sector_gap_length, DensityZone, SectorErrorCode, MAX_TRACK},
    NibError,
    SECTOR_SIZE,
};
use std::iter::repeat;

/// Build a standard-format track from sector payloads.
///
/// `sectors` must hold exactly as many payloads as the track has sectors. `errors`, if
/// given, supplies one [SectorErrorCode] per sector to inject. The encoded sectors are
/// separated by the standard inter-sector gap for the track's zone and the track is
/// padded with gap bytes to the nominal capacity of the zone.
///
/// A sync error is a whole-track condition on a real drive, so if any sector requests
/// [SectorErrorCode::SyncNotFound] the entire track is written without sync marks.
pub fn encode_track(
    track: u8,
    sectors: &[[u8; SECTOR_SIZE]],
    disk_id: [u8; 2],
    errors: Option<&[SectorErrorCode]>,
) -> Result<Vec<u8>, NibError> {
    if track == 0 || track > MAX_TRACK {
        return Err(NibError::InvalidTrack(track));
    }
    let count = sector_count(track);
    if sectors.len() != count {
        return Err(NibError::ParameterError(format!(
            "Track {} requires {} sectors, got {}",
            track,
            count,
            sectors.len()
        )));
    }
    if let Some(errors) = errors {
        if errors.len() != count {
            return Err(NibError::ParameterError(format!(
                "Track {} requires {} error codes, got {}",
                track,
                count,
                errors.len()
            )));
        }
    }

    let no_sync = errors.is_some_and(|e| e.contains(&SectorErrorCode::SyncNotFound));
    if no_sync {
        log::debug!("encode_track(): Track {} will be written without sync", track);
    }

    let capacity = DensityZone::for_track(track).capacity();
    let gap = sector_gap_length(track);
    let mut out = Vec::with_capacity(capacity);

    for (s, data) in sectors.iter().enumerate() {
        let error = match errors {
            _ if no_sync => SectorErrorCode::SyncNotFound,
            Some(errors) => errors[s],
            None => SectorErrorCode::Ok,
        };
        out.extend(encode_sector(data, track, s as u8, disk_id, error));
        out.extend(repeat(GAP_BYTE).take(gap));
    }

    if out.len() < capacity {
        out.resize(capacity, GAP_BYTE);
    }
    Ok(out)
}

/// Decode every sector of a track. `track` should hold one revolution.
pub fn decode_track(track: &[u8], track_no: u8, disk_id: [u8; 2]) -> Vec<DecodedSector> {
    (0..sector_count(track_no))
        .map(|s| decode_sector(track, track_no, s as u8, disk_id))
        .collect()
}

/// Read the disk ID (ID1, ID2) from the first header on the track with a valid checksum.
/// This is normally done on track 18, where the directory lives.
pub fn extract_id(track: &[u8]) -> Option<[u8; 2]> {
    let end = track.len();
    let mut pos = 0;
    while let Some(p) = find_sync(track, pos, end) {
        pos = p;
        if p + HEADER_LENGTH > end {
            break;
        }
        let (header, valid) = decode_buffer(&track[p..p + HEADER_LENGTH]);
        if !valid || header[0] != HEADER_ID {
            continue;
        }
        let id = [header[5], header[4]];
        if header[1] == header_checksum(header[3], header[2], id) {
            log::debug!("extract_id(): Found disk ID {:02X}{:02X} at offset {}", id[0], id[1], p);
            return Some(id);
        }
    }
    None
}

/// A summary of the sector errors found on one track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackErrorReport {
    pub track:  u8,
    pub errors: Vec<SectorErrorCode>,
}

impl TrackErrorReport {
    /// Return the number of sectors that did not decode cleanly.
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.is_ok()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Return the number of sectors that reported a specific error.
    pub fn count_of(&self, error: SectorErrorCode) -> usize {
        self.errors.iter().filter(|e| **e == error).count()
    }
}

/// Decode every sector of a track and report only the resulting error codes.
pub fn check_errors(track: &[u8], track_no: u8, disk_id: [u8; 2]) -> TrackErrorReport {
    TrackErrorReport {
        track:  track_no,
        errors: decode_track(track, track_no, disk_id).into_iter().map(|s| s.error).collect(),
    }
}

/// Return true if the track looks like it was formatted: it contains at least one sector
/// header and less than a quarter of its bytes are bad GCR.
pub fn check_formatted(track: &[u8]) -> bool {
    if find_header(track, 0, track.len()).is_none() {
        return false;
    }
    count_bad_gcr(track) < track.len() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_sectors(track: u8) -> Vec<[u8; SECTOR_SIZE]> {
        (0..sector_count(track))
            .map(|s| [s as u8; SECTOR_SIZE])
            .collect()
    }

    #[test]
    fn test_encode_track_lengths() {
        for track in [1u8, 18, 25, 31, 35] {
            let encoded = encode_track(track, &blank_sectors(track), [0x30, 0x31], None).unwrap();
            assert_eq!(encoded.len(), DensityZone::for_track(track).capacity());
        }
        assert!(encode_track(0, &[], [0, 0], None).is_err());
        assert!(encode_track(18, &blank_sectors(1), [0, 0], None).is_err());
    }

    #[test]
    fn test_track_round_trip() {
        let sectors = blank_sectors(18);
        let encoded = encode_track(18, &sectors, [0x30, 0x31], None).unwrap();

        let report = check_errors(&encoded, 18, [0x30, 0x31]);
        assert!(report.is_clean());
        assert_eq!(report.errors.len(), 19);

        for (decoded, original) in decode_track(&encoded, 18, [0x30, 0x31]).iter().zip(sectors.iter()) {
            assert_eq!(&decoded.data, original);
        }

        assert_eq!(extract_id(&encoded), Some([0x30, 0x31]));
        assert!(check_formatted(&encoded));
        assert!(!check_formatted(&vec![0x55; 7000]));
    }

    #[test]
    fn test_track_sync_error() {
        let mut errors = vec![SectorErrorCode::Ok; 19];
        errors[4] = SectorErrorCode::SyncNotFound;
        let encoded = encode_track(18, &blank_sectors(18), [0x30, 0x31], Some(&errors)).unwrap();

        let report = check_errors(&encoded, 18, [0x30, 0x31]);
        assert_eq!(report.count_of(SectorErrorCode::SyncNotFound), 19);
    }
}
