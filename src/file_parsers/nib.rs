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

    src/file_parsers/nib.rs
*/
//! A parser for the NIB raw capture format.
//!
//! A NIB file holds one fixed-size slot of raw GCR for each captured halftrack,
//! usually about 1.3 revolutions of data with no index alignment. The 256-byte
//! header carries a signature, a version byte and a table of
//! (halftrack, density) pairs, one per slot.

use crate::{
    config::NibConfig,
    file_parsers::{ReadSeek, WriteSeek},
    track::{process_track, ProcessedTrack},
    types::{TrackDensityFlags, MAX_HALFTRACKS, NIB_TRACK_LENGTH},
    NibError,
};
use binrw::{binrw, BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom, Write};

pub const NIB_SIGNATURE: &[u8; 13] = b"MNIB-1541-RAW";
pub const NIB_VERSION: u8 = 3;
pub const NIB_HEADER_SIZE: usize = 0x100;
/// The header has room for this many (halftrack, density) entries.
pub const NIB_TRACK_ENTRIES: usize = (NIB_HEADER_SIZE - 0x10) / 2;

#[derive(Debug)]
#[binrw]
#[brw(little)]
struct NibFileHeader {
    signature:   [u8; 13],
    version:     u8,
    reserved:    [u8; 2],
    track_table: [u8; NIB_TRACK_ENTRIES * 2],
}

/// One raw capture slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NibTrack {
    pub halftrack: u8,
    pub density:   TrackDensityFlags,
    pub data:      Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NibImage {
    pub version: u8,
    pub tracks:  Vec<NibTrack>,
}

impl Default for NibImage {
    fn default() -> Self {
        NibImage {
            version: NIB_VERSION,
            tracks:  Vec::new(),
        }
    }
}

impl NibImage {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn detect<RS: ReadSeek>(mut image: RS) -> bool {
        if image.seek(SeekFrom::Start(0)).is_err() {
            return false;
        }
        match NibFileHeader::read(&mut image) {
            Ok(header) => &header.signature == NIB_SIGNATURE,
            Err(_) => false,
        }
    }

    /// Add a raw capture. The data is padded or truncated to the NIB slot size.
    pub fn add_track(&mut self, halftrack: u8, density: TrackDensityFlags, data: &[u8]) -> Result<(), NibError> {
        if halftrack < 2 || halftrack as usize > MAX_HALFTRACKS + 1 {
            return Err(NibError::ParameterError(format!("Invalid halftrack {}", halftrack)));
        }
        if self.tracks.len() >= NIB_TRACK_ENTRIES {
            return Err(NibError::ParameterError("NIB track table is full".to_string()));
        }
        let mut data = data.to_vec();
        data.resize(NIB_TRACK_LENGTH, 0x00);
        self.tracks.push(NibTrack {
            halftrack,
            density,
            data,
        });
        Ok(())
    }

    /// Return the capture for a halftrack, if present.
    pub fn track(&self, halftrack: u8) -> Option<&NibTrack> {
        self.tracks.iter().find(|t| t.halftrack == halftrack)
    }

    pub fn read<RS: ReadSeek>(mut image: RS) -> Result<NibImage, NibError> {
        image.seek(SeekFrom::Start(0))?;
        let header = NibFileHeader::read(&mut image)?;
        if &header.signature != NIB_SIGNATURE {
            return Err(NibError::UnknownFormat);
        }
        if header.version != NIB_VERSION {
            log::warn!("NibImage::read(): Unexpected NIB version {}", header.version);
        }

        let mut tracks = Vec::new();
        for (slot, entry) in header.track_table.chunks_exact(2).enumerate() {
            let (halftrack, density) = (entry[0], entry[1]);
            if halftrack == 0 {
                break;
            }

            let offset = NIB_HEADER_SIZE + slot * NIB_TRACK_LENGTH;
            image.seek(SeekFrom::Start(offset as u64))?;
            let mut data = vec![0u8; NIB_TRACK_LENGTH];
            image.read_exact(&mut data).map_err(|e| {
                NibError::FormatParseError(format!("Truncated data for halftrack {}: {}", halftrack, e))
            })?;

            log::trace!(
                "NibImage::read(): Slot {}: halftrack {} density {:02X}",
                slot,
                halftrack,
                density
            );
            tracks.push(NibTrack {
                halftrack,
                density: TrackDensityFlags::from_bits_retain(density),
                data,
            });
        }

        log::debug!("NibImage::read(): Read {} tracks", tracks.len());
        Ok(NibImage {
            version: header.version,
            tracks,
        })
    }

    pub fn write<WS: WriteSeek>(&self, out: &mut WS) -> Result<(), NibError> {
        let mut track_table = [0u8; NIB_TRACK_ENTRIES * 2];
        for (slot, track) in self.tracks.iter().take(NIB_TRACK_ENTRIES).enumerate() {
            track_table[slot * 2] = track.halftrack;
            track_table[slot * 2 + 1] = track.density.bits();
        }

        let header = NibFileHeader {
            signature: *NIB_SIGNATURE,
            version: self.version,
            reserved: [0; 2],
            track_table,
        };
        header.write(out)?;

        for track in self.tracks.iter().take(NIB_TRACK_ENTRIES) {
            let mut data = track.data.clone();
            data.resize(NIB_TRACK_LENGTH, 0x00);
            out.write_all(&data)?;
        }
        Ok(())
    }

    /// Run the read pipeline over every capture in the image.
    pub fn process(&self, config: &NibConfig) -> Vec<ProcessedTrack> {
        self.tracks
            .iter()
            .map(|t| process_track(&t.data, t.halftrack as usize, t.density, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DensityZone;
    use std::io::Cursor;

    #[test]
    fn test_nib_round_trip() {
        let mut image = NibImage::new();
        let density = TrackDensityFlags::from_zone(DensityZone::ZONE3);
        image.add_track(2, density, &[0x55; 100]).unwrap();
        image.add_track(4, density, &[0x52; NIB_TRACK_LENGTH]).unwrap();

        let mut buf = Cursor::new(Vec::new());
        image.write(&mut buf).unwrap();
        let bytes = buf.into_inner();
        assert_eq!(bytes.len(), NIB_HEADER_SIZE + 2 * NIB_TRACK_LENGTH);
        assert_eq!(&bytes[0..13], NIB_SIGNATURE);
        assert_eq!(bytes[0x0D], NIB_VERSION);
        assert_eq!(bytes[0x10..0x14], [2, 3, 4, 3]);

        assert!(NibImage::detect(Cursor::new(&bytes)));
        let read = NibImage::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(read, image);
        assert_eq!(read.track(4).map(|t| t.data[0]), Some(0x52));
    }

    #[test]
    fn test_truncated_nib() {
        let mut image = NibImage::new();
        image
            .add_track(2, TrackDensityFlags::from_zone(DensityZone::ZONE3), &[0x55; 100])
            .unwrap();
        let mut buf = Cursor::new(Vec::new());
        image.write(&mut buf).unwrap();
        let mut bytes = buf.into_inner();
        bytes.truncate(NIB_HEADER_SIZE + 100);
        assert!(matches!(
            NibImage::read(Cursor::new(&bytes)),
            Err(NibError::FormatParseError(_))
        ));
    }

    #[test]
    fn test_invalid_halftrack() {
        let mut image = NibImage::new();
        assert!(image.add_track(0, TrackDensityFlags::default(), &[]).is_err());
        assert!(image.add_track(90, TrackDensityFlags::default(), &[]).is_err());
    }
}
