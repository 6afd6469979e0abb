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

    src/lib.rs
*/
//! # nibkit
//!
//! nibkit is a library crate for recovering logical sector data from raw GCR
//! track captures of Commodore 1541/1571 floppy disks, and for converting
//! between the common preservation formats for these disks.
//!
//! A raw capture (as stored in a NIB file) holds roughly 1.3 revolutions of a
//! track with no index reference. nibkit finds the true revolution length,
//! repairs bit-shifted captures, picks a meaningful starting point for the
//! track, and decodes the track into 256-byte sectors with per-sector error
//! codes. In the other direction it can encode sector data back into GCR,
//! inject the classic CBM DOS error conditions, and squeeze tracks to fit the
//! space available in a G64 image or on a physical disk.
//!
//! The main entry points are:
//! * [track::process_track] - the full read pipeline for a single halftrack.
//! * [gcr::decode_sector] and [gcr::encode_sector] - sector level GCR codec.
//! * [file_parsers::NibImage], [file_parsers::G64Image] and [file_parsers::D64Image] -
//!   the supported container formats.

pub mod align;
mod bit_ring;
pub mod bitshift;
pub mod compare;
pub mod config;
pub mod copy_protection;
pub mod cycle;
pub mod file_parsers;
pub mod gcr;
pub mod reduce;
pub mod track;
pub mod types;
mod util;

use thiserror::Error;

/// The number of bytes in a logical 1541 sector.
pub const SECTOR_SIZE: usize = 256;

#[derive(Debug, Error)]
pub enum NibError {
    #[error("An IO error occurred reading or writing the disk image: {0}")]
    IoError(String),
    #[error("Unknown disk image format")]
    UnknownFormat,
    #[error("Unsupported disk image format for requested operation")]
    UnsupportedFormat,
    #[error("The disk image format parser encountered an error: {0}")]
    FormatParseError(String),
    #[error("The disk image is valid but contains incompatible disk information: {0}")]
    IncompatibleImage(String),
    #[error("Invalid parameters were specified to a library function: {0}")]
    ParameterError(String),
    #[error("Invalid track number: {0}")]
    InvalidTrack(u8),
}

impl From<std::io::Error> for NibError {
    fn from(err: std::io::Error) -> Self {
        NibError::IoError(err.to_string())
    }
}

impl From<binrw::Error> for NibError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(e) => NibError::IoError(e.to_string()),
            other => NibError::FormatParseError(other.to_string()),
        }
    }
}

pub use crate::{
    config::NibConfig,
    cycle::{Cycle, CycleMethod},
    file_parsers::{D64Image, G64Image, ImageFormat, NibImage},
    track::{process_track, ProcessedTrack},
    types::{
        AlignmentKind,
        AlignmentTag,
        DensityZone,
        ReduceFlags,
        SectorErrorCode,
        TrackDensityFlags,
        G64_TRACK_MAXLEN,
        MAX_HALFTRACKS,
        MAX_TRACK,
        NIB_TRACK_LENGTH,
    },
};

pub mod prelude {
    pub use crate::{
        config::NibConfig,
        file_parsers::{D64Image, G64Image, ImageFormat, NibImage},
        gcr::{decode_sector, encode_sector, DecodedSector},
        track::{process_track, ProcessedTrack},
        types::{AlignmentKind, AlignmentTag, DensityZone, SectorErrorCode, TrackDensityFlags},
        NibError,
    };
}
