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
use nibkit::{
    gcr::{check_errors, extract_id},
    prelude::*,
    types::sector_count,
};

pub(crate) fn run(_global: &GlobalOptions, params: &args::InfoParams) -> Result<(), Error> {
    let mut reader = read_file(&params.in_file)?;

    let format = match ImageFormat::detect(&mut reader) {
        Ok(format) => format,
        Err(e) => {
            bail!("Error detecting disk image type: {}", e);
        }
    };
    println!("Detected disk image type: {}", format);
    println!("{}", "-".repeat(79));

    match format {
        ImageFormat::Nib => nib_info(NibImage::read(&mut reader)?, params.halftracks),
        ImageFormat::G64 => g64_info(G64Image::read(&mut reader)?, params.halftracks),
        ImageFormat::D64 => d64_info(D64Image::read(&mut reader)?),
    }
    Ok(())
}

fn error_summary(data: &[u8], halftrack: usize, disk_id: [u8; 2]) -> String {
    if halftrack % 2 != 0 {
        return String::new();
    }
    let report = check_errors(data, (halftrack / 2) as u8, disk_id);
    format!("{}/{} sectors bad", report.error_count(), report.errors.len())
}

fn nib_info(nib: NibImage, halftracks: bool) {
    let processed = nib.process(&NibConfig::default());
    let disk_id = processed
        .iter()
        .find(|t| t.track_number() == Some(18))
        .and_then(|t| extract_id(&t.data))
        .unwrap_or([0, 0]);
    println!("Disk ID: {:02X}{:02X}", disk_id[0], disk_id[1]);

    for track in processed.iter().filter(|t| halftracks || t.halftrack % 2 == 0) {
        println!(
            "{:4.1}: {:5} bytes [{:02X}] cycle: {} at {} align: {}{} {}",
            track.halftrack as f32 / 2.0,
            track.len(),
            track.density.bits(),
            track.cycle.method,
            track.cycle.start,
            track.tag,
            if track.bitshifted { " (bitshifted)" } else { "" },
            error_summary(&track.data, track.halftrack, disk_id)
        );
    }
}

fn g64_info(g64: G64Image, halftracks: bool) {
    let disk_id = g64
        .track(36)
        .and_then(|t| extract_id(&t.data))
        .unwrap_or([0, 0]);
    println!("Disk ID: {:02X}{:02X}", disk_id[0], disk_id[1]);
    println!("Maximum track size: {}", g64.max_track_size);

    for track in g64.tracks.iter().filter(|t| halftracks || t.halftrack % 2 == 0) {
        println!(
            "{:4.1}: {:5} bytes {} {}",
            track.halftrack as f32 / 2.0,
            track.data.len(),
            track.zone,
            error_summary(&track.data, track.halftrack as usize, disk_id)
        );
    }
}

fn d64_info(d64: D64Image) {
    let disk_id = d64.disk_id();
    println!("Tracks: {}", d64.tracks);
    println!("Disk ID: {:02X}{:02X}", disk_id[0], disk_id[1]);
    println!("Error table: {}", if d64.has_errors() { "yes" } else { "no" });

    for track in 1..=d64.tracks {
        let bad = (0..sector_count(track) as u8)
            .filter(|&s| d64.sector_error(track, s).is_ok_and(|e| !e.is_ok()))
            .count();
        println!("{:4}: {} sectors, {} bad", track, sector_count(track), bad);
    }
}
