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

    src/gcr/sector.rs
*/
//! Sector-level GCR encoding and decoding.
//!
//! A 1541 sector is recorded as two blocks, each introduced by a sync mark:
//!
//! | Field       | Length (bytes) | Content                                                  |
//! |-------------|----------------|----------------------------------------------------------|
//! | Sync        | 5              | 0xFF                                                     |
//! | Header      | 10 (GCR)       | 0x08, checksum, sector, track, ID2, ID1, 0x0F, 0x0F      |
//! | Header gap  | 9              | 0x55                                                     |
//! | Sync        | 5              | 0xFF                                                     |
//! | Data        | 325 (GCR)      | 0x07, 256 data bytes, checksum, 0x00, 0x00               |
//!
//! Both checksums are the XOR of the bytes they protect. The inter-sector gap that
//! follows the data block depends on the density zone and is written by the track
//! layout functions.

use crate::{
    gcr::{
        codec::{decode_buffer, encode_buffer},
        scanner::{find_sync, is_bad_gcr, SYNC_BYTE},
    },
    types::SectorErrorCode,
    util::xor_checksum,
    SECTOR_SIZE,
};
use std::iter::repeat;

pub const SYNC_LENGTH: usize = 5;
/// Length of the GCR-encoded header block.
pub const HEADER_LENGTH: usize = 10;
pub const HEADER_GAP_LENGTH: usize = 9;
/// Length of the GCR-encoded data block.
pub const DATA_LENGTH: usize = 325;
/// Length of a sector as written by [encode_sector], without the trailing inter-sector gap.
pub const ENCODED_SECTOR_LENGTH: usize =
    SYNC_LENGTH + HEADER_LENGTH + HEADER_GAP_LENGTH + SYNC_LENGTH + DATA_LENGTH;

pub const HEADER_ID: u8 = 0x08;
pub const DATA_ID: u8 = 0x07;
pub const HEADER_PAD: u8 = 0x0F;
pub const GAP_BYTE: u8 = 0x55;

/// The data block is checked for bad GCR up to the start of its final group. The final
/// group holds the checksum and two off bytes whose encoding varies between drives.
const DATA_BAD_GCR_CHECK_LENGTH: usize = DATA_LENGTH - 5;
/// Offset within the data block where an injected bad GCR code is written.
const INJECTED_BAD_GCR_OFFSET: usize = DATA_LENGTH / 2;

/// The filler placed in a sector payload when no data could be recovered. This is the
/// pattern the 1541 writes when formatting a disk.
pub fn format_pattern() -> [u8; SECTOR_SIZE] {
    let mut pattern = [0x01; SECTOR_SIZE];
    pattern[0] = 0x4B;
    pattern
}

/// The result of decoding a single sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSector {
    /// The sector payload, or the format pattern if no data block could be read.
    pub data:  [u8; SECTOR_SIZE],
    /// The disk ID as read from the sector header (ID1, ID2). Zero if no header was found.
    pub id:    [u8; 2],
    pub error: SectorErrorCode,
}

impl DecodedSector {
    fn not_found(error: SectorErrorCode) -> DecodedSector {
        DecodedSector {
            data: format_pattern(),
            id: [0, 0],
            error,
        }
    }
}

/// Compute the checksum stored in a sector header.
#[inline]
pub fn header_checksum(track: u8, sector: u8, disk_id: [u8; 2]) -> u8 {
    sector ^ track ^ disk_id[1] ^ disk_id[0]
}

/// Encode a sector, optionally injecting one of the DOS error conditions.
///
/// `disk_id` is given in disk order (ID1, ID2); the header stores it reversed.
/// Passing [SectorErrorCode::Ok] produces a clean sector. Any other code alters the
/// encoded sector so that [decode_sector] will report that code.
pub fn encode_sector(
    data: &[u8; SECTOR_SIZE],
    track: u8,
    sector: u8,
    disk_id: [u8; 2],
    error: SectorErrorCode,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENCODED_SECTOR_LENGTH);

    let id = match error {
        SectorErrorCode::IdMismatch => [!disk_id[0], !disk_id[1]],
        _ => disk_id,
    };

    let mut header = [
        HEADER_ID,
        header_checksum(track, sector, id),
        sector,
        track,
        id[1],
        id[0],
        HEADER_PAD,
        HEADER_PAD,
    ];
    match error {
        SectorErrorCode::HeaderNotFound => header[0] = 0x00,
        SectorErrorCode::BadHeaderChecksum => header[1] ^= 0xFF,
        _ => {}
    }

    let sync = match error {
        SectorErrorCode::SyncNotFound => GAP_BYTE,
        _ => SYNC_BYTE,
    };

    out.extend(repeat(sync).take(SYNC_LENGTH));
    out.extend(encode_buffer(&header));
    out.extend(repeat(GAP_BYTE).take(HEADER_GAP_LENGTH));
    out.extend(repeat(sync).take(SYNC_LENGTH));

    let mut block = [0u8; SECTOR_SIZE + 4];
    block[0] = match error {
        SectorErrorCode::DataNotFound => 0x00,
        _ => DATA_ID,
    };
    block[1..SECTOR_SIZE + 1].copy_from_slice(data);
    block[SECTOR_SIZE + 1] = match error {
        SectorErrorCode::BadDataChecksum => xor_checksum(data) ^ 0xFF,
        _ => xor_checksum(data),
    };

    let mut gcr = encode_buffer(&block);
    if error == SectorErrorCode::BadGcrCode {
        gcr[INJECTED_BAD_GCR_OFFSET] = 0x00;
        gcr[INJECTED_BAD_GCR_OFFSET + 1] = 0x00;
    }
    out.extend(gcr);
    out
}

/// Locate and decode a sector within one revolution of track data.
///
/// `track` should hold exactly one revolution (see [crate::cycle::Cycle]). The data is
/// treated as circular, so a sector that straddles the end of the buffer is read
/// correctly. The payload is always populated; if no data block could be read it holds
/// the format pattern.
pub fn decode_sector(track: &[u8], track_no: u8, sector: u8, disk_id: [u8; 2]) -> DecodedSector {
    let len = track.len();
    if len == 0 {
        return DecodedSector::not_found(SectorErrorCode::SyncNotFound);
    }

    // Two revolutions, so that no block needs to wrap.
    let mut work = Vec::with_capacity(len * 2);
    work.extend_from_slice(track);
    work.extend_from_slice(track);
    let end = work.len();

    if find_sync(&work, 0, end).is_none() {
        return DecodedSector::not_found(SectorErrorCode::SyncNotFound);
    }

    // Hunt for the header of the requested sector.
    let mut pos = 0;
    let (header_pos, header) = loop {
        pos = match find_sync(&work, pos, end) {
            Some(p) if p <= len && p + HEADER_LENGTH <= end => p,
            _ => return DecodedSector::not_found(SectorErrorCode::HeaderNotFound),
        };
        let (header, _) = decode_buffer(&work[pos..pos + HEADER_LENGTH]);
        if header[0] == HEADER_ID && header[2] == sector && header[3] == track_no {
            break (pos, header);
        }
    };

    let mut result = DecodedSector::not_found(SectorErrorCode::Ok);
    result.id = [header[5], header[4]];

    if header[1] != header_checksum(header[3], header[2], result.id) {
        result.error = SectorErrorCode::BadHeaderChecksum;
    }
    else if result.id != disk_id {
        result.error = SectorErrorCode::IdMismatch;
    }

    if (header_pos..header_pos + HEADER_LENGTH).any(|p| is_bad_gcr(&work, p)) {
        upgrade_bad_gcr(&mut result.error);
    }

    let data_pos = match find_sync(&work, header_pos + HEADER_LENGTH, end) {
        Some(p) if p + DATA_LENGTH <= end => p,
        _ => {
            if result.error.is_ok() {
                result.error = SectorErrorCode::DataNotFound;
            }
            return result;
        }
    };

    if (data_pos..data_pos + DATA_BAD_GCR_CHECK_LENGTH).any(|p| is_bad_gcr(&work, p)) {
        upgrade_bad_gcr(&mut result.error);
    }

    let (block, _) = decode_buffer(&work[data_pos..data_pos + DATA_LENGTH]);
    if block[0] != DATA_ID {
        if result.error.is_ok() {
            result.error = SectorErrorCode::DataNotFound;
        }
        return result;
    }

    result.data.copy_from_slice(&block[1..SECTOR_SIZE + 1]);
    if xor_checksum(&result.data) != block[SECTOR_SIZE + 1] && result.error.is_ok() {
        result.error = SectorErrorCode::BadDataChecksum;
    }

    log::trace!(
        "decode_sector(): Track {} sector {}: header at {}, data at {}: {}",
        track_no,
        sector,
        header_pos,
        data_pos,
        result.error
    );
    result
}

fn upgrade_bad_gcr(error: &mut SectorErrorCode) {
    if matches!(error, SectorErrorCode::Ok | SectorErrorCode::IdMismatch) {
        *error = SectorErrorCode::BadGcrCode;
    }
}
