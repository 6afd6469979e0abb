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

    src/file_parsers/d64.rs
*/
//! A parser for the D64 sector image format.
//!
//! A D64 image is a flat array of 256-byte sectors in track order, with no header.
//! The track count is inferred from the file size. An optional table with one error
//! byte per sector may follow the sector data.

use crate::{
    config::NibConfig,
    file_parsers::{G64Image, NibImage, ReadSeek, WriteSeek},
    gcr::{decode_track, encode_track, extract_id, format_pattern},
    types::{sector_count, total_sectors, track_sector_offset, DensityZone, SectorErrorCode},
    util::get_length,
    NibError,
    SECTOR_SIZE,
};
use std::io::{Read, Seek, SeekFrom, Write};

/// Track counts a D64 image may hold.
pub const D64_TRACK_COUNTS: [u8; 3] = [35, 40, 42];
/// The track holding the BAM and directory.
pub const DIRECTORY_TRACK: u8 = 18;
/// Offset of the disk ID within the BAM sector.
pub const BAM_ID_OFFSET: usize = 0xA2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct D64Image {
    pub tracks: u8,
    data: Vec<u8>,
    errors: Option<Vec<SectorErrorCode>>,
}

impl D64Image {
    /// Create a blank image with every sector holding the format pattern.
    pub fn new(tracks: u8) -> Result<D64Image, NibError> {
        if !D64_TRACK_COUNTS.contains(&tracks) {
            return Err(NibError::ParameterError(format!("Unsupported D64 track count {}", tracks)));
        }
        let pattern = format_pattern();
        let data = pattern.repeat(total_sectors(tracks));
        Ok(D64Image {
            tracks,
            data,
            errors: None,
        })
    }

    /// Determine the track count of a D64 image and whether it carries an error table from
    /// its length in bytes.
    pub fn detect_size(len: u64) -> Option<(u8, bool)> {
        for tracks in D64_TRACK_COUNTS {
            let sectors = total_sectors(tracks) as u64;
            if len == sectors * SECTOR_SIZE as u64 {
                return Some((tracks, false));
            }
            if len == sectors * (SECTOR_SIZE as u64 + 1) {
                return Some((tracks, true));
            }
        }
        None
    }

    pub fn read<RS: ReadSeek>(mut image: RS) -> Result<D64Image, NibError> {
        let len = get_length(&mut image)?;
        let (tracks, has_errors) = D64Image::detect_size(len).ok_or(NibError::UnknownFormat)?;
        let sectors = total_sectors(tracks);
        log::debug!(
            "D64Image::read(): {} tracks, {} sectors, error table: {}",
            tracks,
            sectors,
            has_errors
        );

        image.seek(SeekFrom::Start(0))?;
        let mut data = vec![0u8; sectors * SECTOR_SIZE];
        image.read_exact(&mut data)?;

        let errors = if has_errors {
            let mut table = vec![0u8; sectors];
            image.read_exact(&mut table)?;
            Some(table.into_iter().map(SectorErrorCode::from_table_byte).collect())
        }
        else {
            None
        };

        Ok(D64Image { tracks, data, errors })
    }

    /// Write the image. The error table is only written if the image has one.
    pub fn write<WS: WriteSeek>(&self, out: &mut WS) -> Result<(), NibError> {
        out.write_all(&self.data)?;
        if let Some(errors) = &self.errors {
            let table: Vec<u8> = errors.iter().map(|e| *e as u8).collect();
            out.write_all(&table)?;
        }
        Ok(())
    }

    fn sector_index(&self, track: u8, sector: u8) -> Result<usize, NibError> {
        if track == 0 || track > self.tracks {
            return Err(NibError::InvalidTrack(track));
        }
        if sector as usize >= sector_count(track) {
            return Err(NibError::ParameterError(format!(
                "Track {} has no sector {}",
                track, sector
            )));
        }
        track_sector_offset(track)
            .map(|offset| offset + sector as usize)
            .ok_or(NibError::InvalidTrack(track))
    }

    pub fn sector(&self, track: u8, sector: u8) -> Result<&[u8], NibError> {
        let index = self.sector_index(track, sector)?;
        Ok(&self.data[index * SECTOR_SIZE..(index + 1) * SECTOR_SIZE])
    }

    /// Return the recorded error for a sector. Images without an error table report
    /// [SectorErrorCode::Ok] for every sector.
    pub fn sector_error(&self, track: u8, sector: u8) -> Result<SectorErrorCode, NibError> {
        let index = self.sector_index(track, sector)?;
        Ok(self
            .errors
            .as_ref()
            .map(|errors| errors[index])
            .unwrap_or(SectorErrorCode::Ok))
    }

    pub fn set_sector(
        &mut self,
        track: u8,
        sector: u8,
        data: &[u8; SECTOR_SIZE],
        error: SectorErrorCode,
    ) -> Result<(), NibError> {
        let index = self.sector_index(track, sector)?;
        self.data[index * SECTOR_SIZE..(index + 1) * SECTOR_SIZE].copy_from_slice(data);

        if !error.is_ok() || self.errors.is_some() {
            let count = total_sectors(self.tracks);
            let errors = self.errors.get_or_insert_with(|| vec![SectorErrorCode::Ok; count]);
            errors[index] = error;
        }
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        self.errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| !e.is_ok()))
    }

    /// Return the disk ID (ID1, ID2) stored in the BAM.
    pub fn disk_id(&self) -> [u8; 2] {
        match self.sector(DIRECTORY_TRACK, 0) {
            Ok(bam) => [bam[BAM_ID_OFFSET], bam[BAM_ID_OFFSET + 1]],
            Err(_) => [0, 0],
        }
    }

    /// Build an image by decoding whole tracks of aligned GCR. Tracks not supplied are
    /// recorded as unreadable.
    pub fn from_tracks<'a, I>(tracks: I, track_ct: u8, disk_id: [u8; 2]) -> Result<D64Image, NibError>
    where
        I: IntoIterator<Item = (u8, &'a [u8])>,
    {
        let mut image = D64Image::new(track_ct)?;
        let mut errors = vec![SectorErrorCode::SyncNotFound; total_sectors(track_ct)];

        for (track_no, track) in tracks {
            if track_no == 0 || track_no > track_ct {
                log::debug!("D64Image::from_tracks(): Skipping track {}", track_no);
                continue;
            }
            let offset = track_sector_offset(track_no).ok_or(NibError::InvalidTrack(track_no))?;
            for (s, sector) in decode_track(track, track_no, disk_id).into_iter().enumerate() {
                let index = offset + s;
                image.data[index * SECTOR_SIZE..(index + 1) * SECTOR_SIZE].copy_from_slice(&sector.data);
                errors[index] = sector.error;
            }
        }

        let error_ct = errors.iter().filter(|e| !e.is_ok()).count();
        if error_ct > 0 {
            log::debug!("D64Image::from_tracks(): {} sectors have errors", error_ct);
            image.errors = Some(errors);
        }
        Ok(image)
    }

    /// Decode a raw capture. The disk ID is read from the directory track.
    pub fn from_nib(nib: &NibImage, config: &NibConfig) -> Result<D64Image, NibError> {
        let processed = nib.process(config);
        let whole: Vec<(u8, &[u8])> = processed
            .iter()
            .filter_map(|t| t.track_number().map(|n| (n, t.data.as_slice())))
            .collect();
        decode_whole_tracks(&whole)
    }

    /// Decode every whole track of a G64 image.
    pub fn from_g64(g64: &G64Image) -> Result<D64Image, NibError> {
        let whole: Vec<(u8, &[u8])> = g64
            .tracks
            .iter()
            .filter(|t| t.halftrack % 2 == 0)
            .map(|t| (t.halftrack / 2, t.data.as_slice()))
            .collect();
        decode_whole_tracks(&whole)
    }

    /// Encode the image as standard-format GCR, writing any recorded errors back onto
    /// the affected sectors.
    pub fn to_g64(&self) -> Result<G64Image, NibError> {
        let disk_id = self.disk_id();
        let mut g64 = G64Image::new();

        for track in 1..=self.tracks {
            let offset = track_sector_offset(track).ok_or(NibError::InvalidTrack(track))?;
            let count = sector_count(track);

            let mut sectors = vec![[0u8; SECTOR_SIZE]; count];
            for (s, sector) in sectors.iter_mut().enumerate() {
                let index = offset + s;
                sector.copy_from_slice(&self.data[index * SECTOR_SIZE..(index + 1) * SECTOR_SIZE]);
            }
            let errors = self.errors.as_ref().map(|e| &e[offset..offset + count]);

            let data = encode_track(track, &sectors, disk_id, errors)?;
            g64.set_track(track * 2, DensityZone::for_track(track), data)?;
        }
        Ok(g64)
    }
}

fn decode_whole_tracks(tracks: &[(u8, &[u8])]) -> Result<D64Image, NibError> {
    let disk_id = match tracks
        .iter()
        .find(|(n, _)| *n == DIRECTORY_TRACK)
        .and_then(|(_, data)| extract_id(data))
    {
        Some(id) => id,
        None => {
            log::warn!("D64Image: Could not read disk ID from track {}", DIRECTORY_TRACK);
            [0, 0]
        }
    };

    let highest = tracks.iter().map(|(n, _)| *n).max().unwrap_or(0);
    let track_ct = D64_TRACK_COUNTS
        .iter()
        .copied()
        .find(|&ct| highest <= ct)
        .unwrap_or(D64_TRACK_COUNTS[D64_TRACK_COUNTS.len() - 1]);

    D64Image::from_tracks(tracks.iter().copied(), track_ct, disk_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sector_payload(track: u8, sector: u8) -> [u8; SECTOR_SIZE] {
        let mut data = [0u8; SECTOR_SIZE];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(track).wrapping_add(sector);
        }
        data
    }

    #[test]
    fn test_detect_size() {
        assert_eq!(D64Image::detect_size(174848), Some((35, false)));
        assert_eq!(D64Image::detect_size(175531), Some((35, true)));
        assert_eq!(D64Image::detect_size(196608), Some((40, false)));
        assert_eq!(D64Image::detect_size(197376), Some((40, true)));
        assert_eq!(D64Image::detect_size(205312), Some((42, false)));
        assert_eq!(D64Image::detect_size(206114), Some((42, true)));
        assert_eq!(D64Image::detect_size(1000), None);
    }

    #[test]
    fn test_d64_round_trip_with_errors() {
        let mut image = D64Image::new(35).unwrap();
        image
            .set_sector(1, 0, &sector_payload(1, 0), SectorErrorCode::Ok)
            .unwrap();
        assert!(!image.has_errors());
        image
            .set_sector(20, 3, &sector_payload(20, 3), SectorErrorCode::BadDataChecksum)
            .unwrap();
        assert!(image.has_errors());

        let mut buf = Cursor::new(Vec::new());
        image.write(&mut buf).unwrap();
        let bytes = buf.into_inner();
        assert_eq!(bytes.len(), 175531);

        let read = D64Image::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(read, image);
        assert_eq!(read.sector(20, 3).unwrap(), &sector_payload(20, 3)[..]);
        assert_eq!(read.sector_error(20, 3).unwrap(), SectorErrorCode::BadDataChecksum);
        assert_eq!(read.sector_error(20, 2).unwrap(), SectorErrorCode::Ok);
    }

    #[test]
    fn test_sector_bounds() {
        let image = D64Image::new(35).unwrap();
        assert!(image.sector(1, 20).is_ok());
        assert!(image.sector(1, 21).is_err());
        assert!(image.sector(36, 0).is_err());
        assert!(image.sector(0, 0).is_err());
        assert!(D64Image::new(37).is_err());
    }

    #[test]
    fn test_d64_g64_round_trip() {
        let mut image = D64Image::new(35).unwrap();
        let mut bam = [0u8; SECTOR_SIZE];
        bam[BAM_ID_OFFSET] = b'A';
        bam[BAM_ID_OFFSET + 1] = b'B';
        image.set_sector(18, 0, &bam, SectorErrorCode::Ok).unwrap();
        image
            .set_sector(5, 7, &sector_payload(5, 7), SectorErrorCode::BadDataChecksum)
            .unwrap();
        image
            .set_sector(30, 1, &sector_payload(30, 1), SectorErrorCode::IdMismatch)
            .unwrap();

        let g64 = image.to_g64().unwrap();
        assert_eq!(g64.tracks.len(), 35);
        assert_eq!(g64.track(36).map(|t| t.zone), Some(DensityZone::ZONE2));

        let decoded = D64Image::from_g64(&g64).unwrap();
        assert_eq!(decoded.disk_id(), *b"AB");
        assert_eq!(decoded.sector(5, 7).unwrap(), &sector_payload(5, 7)[..]);
        assert_eq!(decoded.sector_error(5, 7).unwrap(), SectorErrorCode::BadDataChecksum);
        assert_eq!(decoded.sector_error(30, 1).unwrap(), SectorErrorCode::IdMismatch);
        assert_eq!(decoded.sector_error(1, 0).unwrap(), SectorErrorCode::Ok);
        assert_eq!(decoded.sector(1, 0).unwrap(), &format_pattern()[..]);
    }
}
