/*
    nibconv

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
use crate::args::*;
use bpaf::{construct, long, Parser};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub(crate) struct ConvertParams {
    pub(crate) in_file: PathBuf,
    pub(crate) out_file: PathBuf,
    pub(crate) align: Vec<String>,
    pub(crate) fix_gcr: Option<u8>,
    pub(crate) gap_match: Option<usize>,
}

fn align_parser() -> impl Parser<Vec<String>> {
    long("align")
        .argument::<String>("TRACK:KIND")
        .help("Override the alignment method for a track, eg. 18:vmax. May be repeated")
        .many()
}

fn fix_gcr_parser() -> impl Parser<Option<u8>> {
    long("fix-gcr")
        .argument::<u8>("LEVEL")
        .help("Bad GCR repair level, 0 (none) to 4 (most aggressive)")
        .guard(|&level| level <= 4, "Level must be between 0 and 4")
        .optional()
}

fn gap_match_parser() -> impl Parser<Option<usize>> {
    long("gap-match")
        .argument::<usize>("BYTES")
        .help("Number of bytes to match when searching for the track cycle")
        .optional()
}

pub(crate) fn convert_parser() -> impl Parser<ConvertParams> {
    let in_file = in_file_parser();
    let out_file = out_file_parser();
    let align = align_parser();
    let fix_gcr = fix_gcr_parser();
    let gap_match = gap_match_parser();

    construct!(ConvertParams {
        in_file,
        out_file,
        align,
        fix_gcr,
        gap_match,
    })
}
