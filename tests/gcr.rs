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
    gcr::{
        count_bad_gcr,
        decode_4bytes,
        decode_buffer,
        decode_gcr_byte,
        decode_sector,
        decode_track,
        encode_4bytes,
        encode_buffer,
        encode_gcr_byte,
        encode_sector,
        encode_track,
        extract_id,
        format_pattern,
        is_bad_gcr,
    },
    types::sector_count,
    NibError,
    SectorErrorCode,
};
use strum::IntoEnumIterator;

#[test]
fn test_codec_round_trip_all_words() {
    for word in 0..=u16::MAX {
        let [hi, lo] = word.to_be_bytes();
        let plain = [hi, lo, !hi, lo ^ hi];
        let gcr = encode_4bytes(&plain);
        assert_eq!(decode_4bytes(&gcr), (plain, 4), "word {:04X}", word);
    }
}

#[test]
fn test_byte_codes_never_have_long_zero_runs() {
    for byte in 0..=u8::MAX {
        let code = encode_gcr_byte(byte);
        assert!(code < 0x400);
        assert_eq!(decode_gcr_byte(code), Some(byte));
        // No more than two consecutive zero bits anywhere within the 10 bit code.
        for shift in 0..8 {
            assert_ne!((code >> shift) & 0b111, 0, "byte {:02X}", byte);
        }
    }
}

#[test]
fn test_buffer_round_trip() {
    let (_, sectors) = synthetic_track(5, 42);
    let plain: Vec<u8> = sectors.iter().flatten().copied().collect();
    let gcr = encode_buffer(&plain);
    assert_eq!(gcr.len(), plain.len() / 4 * 5);
    assert_eq!(decode_buffer(&gcr), (plain, true));

    let mut bad = gcr.clone();
    bad[7] = 0x00;
    assert!(!decode_buffer(&bad).1);
}

#[test]
fn test_injected_errors_are_reported() {
    init();
    let track = 22;
    let target = 3;
    for error in SectorErrorCode::iter() {
        let (_, sectors) = synthetic_track(track, 5);
        let mut errors = vec![SectorErrorCode::Ok; sector_count(track)];
        errors[target] = error;

        let data = encode_track(track, &sectors, TEST_DISK_ID, Some(&errors)).unwrap();
        let decoded = decode_track(&data, track, TEST_DISK_ID);

        for (s, sector) in decoded.iter().enumerate() {
            let expected = match error {
                SectorErrorCode::SyncNotFound => SectorErrorCode::SyncNotFound,
                _ if s == target => error,
                _ => SectorErrorCode::Ok,
            };
            assert_eq!(sector.error, expected, "injected {:?}, sector {}", error, s);
            if expected.is_ok() {
                assert_eq!(sector.data, sectors[s]);
            }
        }
    }
}

#[test]
fn test_missing_data_reads_format_pattern() {
    let (_, sectors) = synthetic_track(1, 9);
    let mut errors = vec![SectorErrorCode::Ok; sectors.len()];
    errors[0] = SectorErrorCode::DataNotFound;
    let data = encode_track(1, &sectors, TEST_DISK_ID, Some(&errors)).unwrap();

    let sector = decode_sector(&data, 1, 0, TEST_DISK_ID);
    assert_eq!(sector.error, SectorErrorCode::DataNotFound);
    assert_eq!(sector.data, format_pattern());
}

#[test]
fn test_sector_straddling_track_end() {
    let (data, sectors) = synthetic_track(31, 77);
    // Rotate so that sector 4 is split across the end of the buffer.
    let rotated = raw_capture(&data, 4 * 362 + 100, data.len());
    let sector = decode_sector(&rotated, 31, 4, TEST_DISK_ID);
    assert_eq!(sector.error, SectorErrorCode::Ok);
    assert_eq!(sector.data, sectors[4]);
}

#[test]
fn test_sector_checksum() {
    let data = [0x5Au8; 256];
    let encoded = encode_sector(&data, 1, 0, TEST_DISK_ID, SectorErrorCode::Ok);
    // An even number of identical bytes XORs to zero.
    let (block, valid) = decode_buffer(&encoded[29..29 + 325]);
    assert!(valid);
    assert_eq!(block[0], 0x07);
    assert_eq!(block[257], 0x00);
}

#[test]
fn test_extract_id() {
    let (data, _) = synthetic_track(18, 3);
    assert_eq!(extract_id(&data), Some(TEST_DISK_ID));
    assert_eq!(extract_id(&[0x55; 1000]), None);
}

#[test]
fn test_encode_track_validation() {
    let (_, sectors) = synthetic_track(1, 1);
    assert!(matches!(
        encode_track(18, &sectors, TEST_DISK_ID, None),
        Err(NibError::ParameterError(_))
    ));
    assert!(matches!(
        encode_track(0, &sectors, TEST_DISK_ID, None),
        Err(NibError::InvalidTrack(0))
    ));
    assert!(matches!(
        encode_track(1, &sectors, TEST_DISK_ID, Some(&[SectorErrorCode::Ok])),
        Err(NibError::ParameterError(_))
    ));
}

#[test]
fn test_sector_round_trip_grid() {
    let (_, random) = synthetic_track(1, 0x5EC);
    let payloads = [[0x00u8; 256], [0xFFu8; 256], random[0]];
    for track in [1u8, 18, 35, 42] {
        for sector in [0u8, (sector_count(track) - 1) as u8] {
            for payload in &payloads {
                let encoded = encode_sector(payload, track, sector, TEST_DISK_ID, SectorErrorCode::Ok);
                let decoded = decode_sector(&encoded, track, sector, TEST_DISK_ID);
                assert_eq!(decoded.error, SectorErrorCode::Ok, "track {} sector {}", track, sector);
                assert_eq!(&decoded.data, payload);
                assert_eq!(decoded.id, TEST_DISK_ID);
            }
        }
    }
}

#[test]
fn test_fresh_encoding_has_no_bad_gcr() {
    for track in [1u8, 18, 25, 31] {
        let (data, _) = synthetic_track(track, 0xBAD);
        assert_eq!(count_bad_gcr(&data), 0, "track {}", track);
    }

    // Three zero bits straddling a byte boundary, carried from the previous byte.
    let data = [0x55, 0x54, 0x3F, 0x55];
    assert!(is_bad_gcr(&data, 2));
    assert!(!is_bad_gcr(&data, 1));
}
