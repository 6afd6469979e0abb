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

    src/file_parsers/g64.rs
*/
//! A parser for the G64 GCR image format.
//!
//! A G64 image stores one revolution of byte-aligned GCR per halftrack, along with
//! the density zone each track is written at. The header is followed by a table of
//! track offsets and a table of speed zones, one entry per halftrack starting at
//! track 1. Each present track is stored as a 16-bit length followed by data
//! padded to the maximum track size.

use crate::{
    config::NibConfig,
    file_parsers::{NibImage, ReadSeek, WriteSeek},
    reduce::compress_halftrack,
    types::{DensityZone, G64_TRACK_MAXLEN, MAX_HALFTRACKS},
    NibError,
};
use binrw::{binrw, BinRead, BinWrite};
use std::io::{Read, Seek, SeekFrom, Write};

pub const G64_SIGNATURE: &[u8; 8] = b"GCR-1541";
pub const G64_VERSION: u8 = 0;
/// The first halftrack represented in a G64 image (track 1).
pub const G64_FIRST_HALFTRACK: u8 = 2;

#[derive(Debug)]
#[binrw]
#[brw(little)]
struct G64FileHeader {
    signature: [u8; 8],
    version: u8,
    track_ct: u8,
    max_track_size: u16,
    #[br(count = track_ct)]
    offsets: Vec<u32>,
    #[br(count = track_ct)]
    speeds: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G64Track {
    pub halftrack: u8,
    pub zone:      DensityZone,
    pub data:      Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct G64Image {
    pub max_track_size: u16,
    pub tracks: Vec<G64Track>,
}

impl Default for G64Image {
    fn default() -> Self {
        G64Image {
            max_track_size: G64_TRACK_MAXLEN as u16,
            tracks: Vec::new(),
        }
    }
}

impl G64Image {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn detect<RS: ReadSeek>(mut image: RS) -> bool {
        if image.seek(SeekFrom::Start(0)).is_err() {
            return false;
        }
        let mut signature = [0u8; 8];
        match image.read_exact(&mut signature) {
            Ok(_) => &signature == G64_SIGNATURE,
            Err(_) => false,
        }
    }

    /// Add or replace a track. Data longer than the maximum track size is rejected.
    pub fn set_track(&mut self, halftrack: u8, zone: DensityZone, data: Vec<u8>) -> Result<(), NibError> {
        if halftrack < G64_FIRST_HALFTRACK || halftrack as usize >= MAX_HALFTRACKS + G64_FIRST_HALFTRACK as usize {
            return Err(NibError::ParameterError(format!("Invalid halftrack {}", halftrack)));
        }
        if data.len() > self.max_track_size as usize {
            return Err(NibError::ParameterError(format!(
                "Halftrack {} length {} exceeds maximum of {}",
                halftrack,
                data.len(),
                self.max_track_size
            )));
        }

        let track = G64Track { halftrack, zone, data };
        match self.tracks.iter_mut().find(|t| t.halftrack == halftrack) {
            Some(existing) => *existing = track,
            None => {
                self.tracks.push(track);
                self.tracks.sort_by_key(|t| t.halftrack);
            }
        }
        Ok(())
    }

    /// Return the track stored for a halftrack, if present.
    pub fn track(&self, halftrack: u8) -> Option<&G64Track> {
        self.tracks.iter().find(|t| t.halftrack == halftrack)
    }

    pub fn read<RS: ReadSeek>(mut image: RS) -> Result<G64Image, NibError> {
        image.seek(SeekFrom::Start(0))?;
        let header = G64FileHeader::read(&mut image)?;
        if &header.signature != G64_SIGNATURE {
            return Err(NibError::UnknownFormat);
        }
        if header.version != G64_VERSION {
            log::warn!("G64Image::read(): Unexpected G64 version {}", header.version);
        }
        log::debug!(
            "G64Image::read(): {} halftracks, max track size {}",
            header.track_ct,
            header.max_track_size
        );
        if header.track_ct as usize > MAX_HALFTRACKS {
            return Err(NibError::FormatParseError(format!(
                "Track count {} exceeds maximum of {}",
                header.track_ct, MAX_HALFTRACKS
            )));
        }

        let mut tracks = Vec::new();
        for (i, (&offset, &speed)) in header.offsets.iter().zip(header.speeds.iter()).enumerate() {
            if offset == 0 {
                continue;
            }
            // track_ct was checked above, so this always fits a u8.
            let halftrack = (G64_FIRST_HALFTRACK as usize + i) as u8;

            image.seek(SeekFrom::Start(offset as u64))?;
            let len = u16::read_le(&mut image)? as usize;
            if len > header.max_track_size as usize {
                return Err(NibError::FormatParseError(format!(
                    "Halftrack {} length {} exceeds declared maximum {}",
                    halftrack, len, header.max_track_size
                )));
            }
            let mut data = vec![0u8; len];
            image.read_exact(&mut data).map_err(|e| {
                NibError::FormatParseError(format!("Truncated data for halftrack {}: {}", halftrack, e))
            })?;

            let zone = match u8::try_from(speed).ok().and_then(|s| DensityZone::try_from(s).ok()) {
                Some(zone) => zone,
                None => {
                    log::warn!(
                        "G64Image::read(): Halftrack {} uses a speed zone map, which is not supported",
                        halftrack
                    );
                    DensityZone::for_halftrack(halftrack as usize)
                }
            };
            tracks.push(G64Track { halftrack, zone, data });
        }

        Ok(G64Image {
            max_track_size: header.max_track_size,
            tracks,
        })
    }

    pub fn write<WS: WriteSeek>(&self, out: &mut WS) -> Result<(), NibError> {
        let track_ct = MAX_HALFTRACKS;
        let slot_size = 2 + self.max_track_size as usize;
        let mut offsets = vec![0u32; track_ct];
        let mut speeds = vec![0u32; track_ct];

        let mut cursor = 12 + track_ct * 8;
        for track in &self.tracks {
            let index = (track.halftrack - G64_FIRST_HALFTRACK) as usize;
            offsets[index] = cursor as u32;
            speeds[index] = track.zone.value() as u32;
            cursor += slot_size;
        }

        let header = G64FileHeader {
            signature: *G64_SIGNATURE,
            version: G64_VERSION,
            track_ct: track_ct as u8,
            max_track_size: self.max_track_size,
            offsets,
            speeds,
        };
        header.write(out)?;

        for track in &self.tracks {
            (track.data.len() as u16).write_le(out)?;
            let mut data = track.data.clone();
            data.resize(self.max_track_size as usize, 0x00);
            out.write_all(&data)?;
        }
        Ok(())
    }

    /// Build a G64 image from raw captures. Each capture is run through the read pipeline
    /// and then reduced to fit the G64 track size.
    pub fn from_nib(nib: &NibImage, config: &NibConfig) -> Result<G64Image, NibError> {
        let mut image = G64Image::new();
        for processed in nib.process(config) {
            let halftrack = processed.halftrack;
            if halftrack < G64_FIRST_HALFTRACK as usize || halftrack >= MAX_HALFTRACKS + G64_FIRST_HALFTRACK as usize {
                log::warn!("G64Image::from_nib(): Skipping halftrack {}", halftrack);
                continue;
            }
            let data = compress_halftrack(&processed.data, halftrack, config, G64_TRACK_MAXLEN);
            image.set_track(halftrack as u8, processed.zone(), data)?;
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_g64_round_trip() {
        let mut image = G64Image::new();
        image.set_track(2, DensityZone::ZONE3, vec![0x52; 7692]).unwrap();
        image.set_track(36, DensityZone::ZONE2, vec![0x55; 7142]).unwrap();

        let mut buf = Cursor::new(Vec::new());
        image.write(&mut buf).unwrap();
        let bytes = buf.into_inner();

        assert_eq!(&bytes[0..8], G64_SIGNATURE);
        assert_eq!(bytes[9], 84);
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), 7928);
        assert_eq!(bytes.len(), 12 + 84 * 8 + 2 * (2 + 7928));

        assert!(G64Image::detect(Cursor::new(&bytes)));
        let read = G64Image::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(read, image);
    }

    #[test]
    fn test_oversize_track_rejected() {
        let mut image = G64Image::new();
        assert!(image.set_track(2, DensityZone::ZONE3, vec![0; 8000]).is_err());
        assert!(image.set_track(1, DensityZone::ZONE3, vec![0; 10]).is_err());
        assert!(image.set_track(86, DensityZone::ZONE0, vec![0; 10]).is_err());
    }

    /// Build a raw G64 file with one track stored at the last table entry.
    fn raw_g64(track_ct: u8, max_track_size: u16, track_len: u16) -> Vec<u8> {
        let table_len = track_ct as usize * 4;
        let data_offset = 12 + table_len * 2;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(G64_SIGNATURE);
        bytes.push(G64_VERSION);
        bytes.push(track_ct);
        bytes.extend_from_slice(&max_track_size.to_le_bytes());
        let mut offsets = vec![0u8; table_len];
        let last = table_len - 4;
        offsets[last..].copy_from_slice(&(data_offset as u32).to_le_bytes());
        bytes.extend_from_slice(&offsets);
        bytes.extend_from_slice(&vec![0u8; table_len]);
        bytes.extend_from_slice(&track_len.to_le_bytes());
        bytes.extend(std::iter::repeat(0x55).take(track_len as usize));
        bytes
    }

    #[test]
    fn test_track_count_limit() {
        let bytes = raw_g64(84, 7928, 100);
        let image = G64Image::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(image.tracks.len(), 1);
        assert_eq!(image.tracks[0].halftrack, 85);

        for track_ct in [85, 90, 255] {
            let bytes = raw_g64(track_ct, 7928, 100);
            assert!(
                matches!(G64Image::read(Cursor::new(&bytes)), Err(NibError::FormatParseError(_))),
                "track_ct {}",
                track_ct
            );
        }
    }

    #[test]
    fn test_track_longer_than_slot_rejected() {
        let bytes = raw_g64(1, 100, 300);
        assert!(matches!(
            G64Image::read(Cursor::new(&bytes)),
            Err(NibError::FormatParseError(_))
        ));

        let bytes = raw_g64(1, 100, 100);
        let image = G64Image::read(Cursor::new(&bytes)).unwrap();
        let mut buf = Cursor::new(Vec::new());
        image.write(&mut buf).unwrap();
        assert_eq!(G64Image::read(Cursor::new(buf.into_inner())).unwrap(), image);
    }
}
