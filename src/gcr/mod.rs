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

    src/gcr/mod.rs
*/
//! Commodore GCR (Group Code Recording) encoding.
//!
//! The 1541 writes every 4 bits of data as a 5-bit code chosen so that the
//! recorded bitstream never contains more than two consecutive 0 bits. Runs of
//! ten or more 1 bits can therefore only appear where the drive deliberately
//! writes them, and serve as sync marks.
//!
//! This module contains the nibble-level codec, the scanner primitives used to
//! locate sync marks and sector headers in a captured track, the sector-level
//! encoder and decoder, and track-level layout helpers.

pub mod codec;
pub mod layout;
pub mod scanner;
pub mod sector;

pub use codec::*;
pub use layout::*;
pub use scanner::*;
pub use sector::*;
