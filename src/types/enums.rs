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

    src/types/enums.rs
*/
use crate::copy_protection::CopyProtectionScheme;
use std::{
    fmt,
    fmt::{Display, Formatter},
};
use strum::{EnumIter, EnumString};

/// The result of decoding a single sector. The discriminants are the error codes used by
/// D64 error tables, so a [SectorErrorCode] can be written to an error table directly.
///
/// When several problems affect one sector, the reported code follows a fixed precedence:
/// a missing sync outranks a missing header, which outranks header checksum or ID problems,
/// which outrank bad GCR, which outranks a missing data block, which outranks a data
/// checksum failure.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectorErrorCode {
    #[default]
    Ok = 0x01,
    HeaderNotFound = 0x02,
    SyncNotFound = 0x03,
    DataNotFound = 0x04,
    BadDataChecksum = 0x05,
    BadGcrCode = 0x06,
    BadHeaderChecksum = 0x09,
    IdMismatch = 0x0B,
}

impl SectorErrorCode {
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, SectorErrorCode::Ok)
    }

    /// Return the CBM DOS error number a 1541 reports for this condition.
    pub fn dos_error(&self) -> u8 {
        match self {
            SectorErrorCode::Ok => 0,
            SectorErrorCode::HeaderNotFound => 20,
            SectorErrorCode::SyncNotFound => 21,
            SectorErrorCode::DataNotFound => 22,
            SectorErrorCode::BadDataChecksum => 23,
            SectorErrorCode::BadGcrCode => 24,
            SectorErrorCode::BadHeaderChecksum => 27,
            SectorErrorCode::IdMismatch => 29,
        }
    }

    /// Convert a byte from a D64 error table. Zero is commonly used for "no error";
    /// unknown codes are reported and treated as no error.
    pub fn from_table_byte(byte: u8) -> SectorErrorCode {
        match SectorErrorCode::try_from(byte) {
            Ok(code) => code,
            Err(_) => {
                if byte != 0 {
                    log::warn!("SectorErrorCode::from_table_byte(): Unknown error code {:02X}", byte);
                }
                SectorErrorCode::Ok
            }
        }
    }
}

impl TryFrom<u8> for SectorErrorCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(SectorErrorCode::Ok),
            0x02 => Ok(SectorErrorCode::HeaderNotFound),
            0x03 => Ok(SectorErrorCode::SyncNotFound),
            0x04 => Ok(SectorErrorCode::DataNotFound),
            0x05 => Ok(SectorErrorCode::BadDataChecksum),
            0x06 => Ok(SectorErrorCode::BadGcrCode),
            0x09 => Ok(SectorErrorCode::BadHeaderChecksum),
            0x0B => Ok(SectorErrorCode::IdMismatch),
            _ => Err(()),
        }
    }
}

impl Display for SectorErrorCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SectorErrorCode::Ok => write!(f, "OK"),
            SectorErrorCode::HeaderNotFound => write!(f, "Header block not found"),
            SectorErrorCode::SyncNotFound => write!(f, "No sync sequence"),
            SectorErrorCode::DataNotFound => write!(f, "Data block not present"),
            SectorErrorCode::BadDataChecksum => write!(f, "Data checksum error"),
            SectorErrorCode::BadGcrCode => write!(f, "Bad GCR code"),
            SectorErrorCode::BadHeaderChecksum => write!(f, "Header checksum error"),
            SectorErrorCode::IdMismatch => write!(f, "Disk ID mismatch"),
        }
    }
}

/// A per-track alignment override. [AlignmentKind::Auto] runs the normal selection
/// strategy; any other value asks the alignment selector to use one specific method,
/// falling back to automatic selection if the requested marker can't be found.
///
/// Alignment kinds can be parsed from strings, ie: `"vmax".parse::<AlignmentKind>()`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum AlignmentKind {
    #[default]
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "raw", serialize = "none")]
    Raw,
    #[strum(serialize = "gap")]
    Gap,
    #[strum(serialize = "sector0", serialize = "sec0")]
    Sector0,
    #[strum(serialize = "longsync", serialize = "sync")]
    LongestSync,
    #[strum(serialize = "badgcr", serialize = "weak")]
    BadGcr,
    #[strum(serialize = "autogap")]
    AutoGap,
    #[strum(serialize = "vmax")]
    VMax,
    #[strum(serialize = "vmax-cw", serialize = "cinemaware")]
    VMaxCinemaware,
    #[strum(serialize = "pirateslayer", serialize = "pslayer")]
    PirateSlayer,
    #[strum(serialize = "rapidlok")]
    RapidLok,
}

impl Display for AlignmentKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AlignmentKind::Auto => write!(f, "auto"),
            AlignmentKind::Raw => write!(f, "raw"),
            AlignmentKind::Gap => write!(f, "gap"),
            AlignmentKind::Sector0 => write!(f, "sector0"),
            AlignmentKind::LongestSync => write!(f, "longsync"),
            AlignmentKind::BadGcr => write!(f, "badgcr"),
            AlignmentKind::AutoGap => write!(f, "autogap"),
            AlignmentKind::VMax => write!(f, "vmax"),
            AlignmentKind::VMaxCinemaware => write!(f, "vmax-cw"),
            AlignmentKind::PirateSlayer => write!(f, "pirateslayer"),
            AlignmentKind::RapidLok => write!(f, "rapidlok"),
        }
    }
}

/// Records which method the alignment selector used to choose the start of a track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlignmentTag {
    #[default]
    None,
    Gap,
    Sector0,
    LongestSync,
    BadGcrRun,
    AutoGap,
    ProtectionSignature(CopyProtectionScheme),
}

impl Display for AlignmentTag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AlignmentTag::None => write!(f, "none"),
            AlignmentTag::Gap => write!(f, "gap"),
            AlignmentTag::Sector0 => write!(f, "sector 0"),
            AlignmentTag::LongestSync => write!(f, "longest sync"),
            AlignmentTag::BadGcrRun => write!(f, "bad GCR run"),
            AlignmentTag::AutoGap => write!(f, "auto gap"),
            AlignmentTag::ProtectionSignature(scheme) => write!(f, "{}", scheme),
        }
    }
}
