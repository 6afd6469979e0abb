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

    src/file_parsers/mod.rs
*/
//! Disk image container formats.
//!
//! * NIB - raw track captures, roughly 1.3 revolutions per halftrack.
//! * G64 - one aligned revolution of GCR per halftrack.
//! * D64 - decoded sector data, with an optional per-sector error table.

use crate::{util::get_length, NibError};
use bitflags::bitflags;
use std::{
    fmt,
    fmt::{Display, Formatter},
    io::{Read, Seek, Write},
    path::Path,
};
use strum::{EnumIter, IntoEnumIterator};

pub mod d64;
pub mod g64;
pub mod nib;

pub use d64::D64Image;
pub use g64::{G64Image, G64Track};
pub use nib::{NibImage, NibTrack};

pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

pub trait WriteSeek: Write + Seek {}
impl<T: Write + Seek> WriteSeek for T {}

bitflags! {
    /// Bit flags representing the capabilities of a specific image format. Used to warn when a
    /// conversion will discard information.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[rustfmt::skip]
    pub struct FormatCaps: u32 {
        const CAP_RAW_CAPTURE   = 0b0000_0000_0000_0001; // Stores unprocessed multi-revolution captures
        const CAP_BITSTREAM     = 0b0000_0000_0000_0010; // Stores GCR track data, preserving protection
        const CAP_HALFTRACKS    = 0b0000_0000_0000_0100; // Can store halftracks
        const CAP_DENSITY       = 0b0000_0000_0000_1000; // Records the density zone of each track
        const CAP_ERROR_TABLE   = 0b0000_0000_0001_0000; // Records per-sector error codes
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    Nib,
    G64,
    D64,
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ImageFormat::Nib => write!(f, "NIB"),
            ImageFormat::G64 => write!(f, "G64"),
            ImageFormat::D64 => write!(f, "D64"),
        }
    }
}

impl ImageFormat {
    pub fn extensions(&self) -> Vec<&'static str> {
        match self {
            ImageFormat::Nib => vec!["nib"],
            ImageFormat::G64 => vec!["g64"],
            ImageFormat::D64 => vec!["d64"],
        }
    }

    pub fn capabilities(&self) -> FormatCaps {
        match self {
            ImageFormat::Nib => {
                FormatCaps::CAP_RAW_CAPTURE
                    | FormatCaps::CAP_BITSTREAM
                    | FormatCaps::CAP_HALFTRACKS
                    | FormatCaps::CAP_DENSITY
            }
            ImageFormat::G64 => FormatCaps::CAP_BITSTREAM | FormatCaps::CAP_HALFTRACKS | FormatCaps::CAP_DENSITY,
            ImageFormat::D64 => FormatCaps::CAP_ERROR_TABLE,
        }
    }

    /// Return the capabilities of this format that `target` lacks.
    pub fn lost_capabilities(&self, target: ImageFormat) -> FormatCaps {
        self.capabilities() - target.capabilities()
    }

    /// Returns the [ImageFormat] matching a file extension, if any.
    pub fn from_extension(ext: &str) -> Option<ImageFormat> {
        let ext = ext.to_lowercase();
        ImageFormat::iter().find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Returns the [ImageFormat] matching the extension of a path, if any.
    pub fn from_path(path: &Path) -> Option<ImageFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
    }

    /// Detect the format of an image from its content. NIB and G64 images are identified by
    /// signature, D64 images by size.
    pub fn detect<RS: ReadSeek>(mut image: RS) -> Result<ImageFormat, NibError> {
        if NibImage::detect(&mut image) {
            return Ok(ImageFormat::Nib);
        }
        if G64Image::detect(&mut image) {
            return Ok(ImageFormat::G64);
        }
        let len = get_length(&mut image)?;
        if D64Image::detect_size(len).is_some() {
            return Ok(ImageFormat::D64);
        }
        Err(NibError::UnknownFormat)
    }
}

/// Returns a list of file extensions supported by the image parsers.
pub fn supported_extensions() -> Vec<&'static str> {
    ImageFormat::iter().flat_map(|f| f.extensions()).collect()
}
