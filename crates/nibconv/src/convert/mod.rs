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
pub mod args;

use crate::{args::GlobalOptions, read_file};
use anyhow::{bail, Error};
use nibkit::prelude::*;
use std::io::Cursor;

fn build_config(params: &args::ConvertParams) -> Result<NibConfig, Error> {
    let mut config = NibConfig::default();
    if let Some(level) = params.fix_gcr {
        config = config.with_fix_gcr(level)?;
    }
    if let Some(len) = params.gap_match {
        config = config.with_gap_match_length(len)?;
    }
    for arg in &params.align {
        config.set_align_override(arg)?;
    }
    Ok(config)
}

pub(crate) fn run(global: &GlobalOptions, params: &args::ConvertParams) -> Result<(), Error> {
    let config = build_config(params)?;
    let mut reader = read_file(&params.in_file)?;

    let input_format = match ImageFormat::detect(&mut reader) {
        Ok(format) => format,
        Err(e) => {
            bail!("Error detecting input disk image type: {}", e);
        }
    };
    let output_format = match ImageFormat::from_path(&params.out_file) {
        Some(format) => format,
        None => {
            bail!("Error: Unknown or missing output file extension: {}", params.out_file.display());
        }
    };

    if !global.silent {
        println!("Input disk image type: {}", input_format);
        println!("Output disk image type: {}", output_format);
    }

    let lost = input_format.lost_capabilities(output_format);
    if !lost.is_empty() && !global.silent {
        println!("Warning: Output format {} cannot store: {:?}", output_format, lost);
    }

    let mut out_buffer = Cursor::new(Vec::new());
    match (input_format, output_format) {
        (ImageFormat::Nib, ImageFormat::G64) => {
            let nib = NibImage::read(&mut reader)?;
            G64Image::from_nib(&nib, &config)?.write(&mut out_buffer)?;
        }
        (ImageFormat::Nib, ImageFormat::D64) => {
            let nib = NibImage::read(&mut reader)?;
            let d64 = D64Image::from_nib(&nib, &config)?;
            report_errors(global, &d64);
            d64.write(&mut out_buffer)?;
        }
        (ImageFormat::G64, ImageFormat::D64) => {
            let g64 = G64Image::read(&mut reader)?;
            let d64 = D64Image::from_g64(&g64)?;
            report_errors(global, &d64);
            d64.write(&mut out_buffer)?;
        }
        (ImageFormat::D64, ImageFormat::G64) => {
            let d64 = D64Image::read(&mut reader)?;
            d64.to_g64()?.write(&mut out_buffer)?;
        }
        (input, output) => {
            bail!("Conversion from {} to {} is not supported", input, output);
        }
    }

    match std::fs::write(&params.out_file, out_buffer.into_inner()) {
        Ok(_) => {
            if !global.silent {
                println!("Output image saved to {}", params.out_file.display());
            }
            Ok(())
        }
        Err(e) => {
            bail!("Error saving output image: {}", e);
        }
    }
}

fn report_errors(global: &GlobalOptions, d64: &D64Image) {
    if global.silent || !d64.has_errors() {
        return;
    }
    println!("Sectors with errors:");
    for track in 1..=d64.tracks {
        for sector in 0..nibkit::types::sector_count(track) as u8 {
            if let Ok(error) = d64.sector_error(track, sector) {
                if !error.is_ok() {
                    println!("  {:2}/{:2}: {} (DOS error {})", track, sector, error, error.dos_error());
                }
            }
        }
    }
}
