// src/nsx/data.rs
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::nsx::NsxFile;
use log::{debug, warn};

/// One contiguous run of sample frames found in the data region.
///
/// For spec 2.2+ this is one on-disk data section; for spec 2.1 the whole
/// data region is a single section at timestamp zero. Packet-per-sample
/// (PTP) files are first scanned as one section per packet and then
/// coalesced by [`coalesce_ptp_runs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSection {
    /// Absolute offset of the first sample frame.
    pub data_start: u64,
    /// Raw timestamp of the first frame.
    pub ticks: u64,
    pub n_samples: u64,
    /// Bytes between consecutive frames of this section.
    pub stride: u64,
}

/// Walk the data region and record every section's layout.
///
/// A malformed section header or a truncated trailing section ends the scan
/// with the data observed so far; those are recoverable conditions and are
/// logged, never raised.
pub fn scan_sections(cursor: ByteCursor<'_>, file: &NsxFile) -> Result<Vec<DataSection>> {
    let frame_bytes = file.frame_bytes();
    if frame_bytes == 0 {
        return Ok(Vec::new());
    }

    if file.spec_major == 2 && file.spec_minor == 1 {
        // No section headers on disk: one run from the end of the header to
        // the end of the file.
        let data_bytes = cursor.len().saturating_sub(file.data_start);
        if data_bytes % frame_bytes != 0 {
            warn!(
                "data region of {} bytes is not a whole number of {}-byte frames",
                data_bytes, frame_bytes
            );
        }
        return Ok(vec![DataSection {
            data_start: file.data_start,
            ticks: 0,
            n_samples: data_bytes / frame_bytes,
            stride: frame_bytes,
        }]);
    }

    let header_bytes = file.section_header_bytes();
    let mut sections = Vec::new();
    let mut offset = file.data_start;

    while offset + header_bytes <= cursor.len() {
        let flag = cursor.read_u8(offset)?;
        if flag != 0x01 {
            warn!("unknown data section header byte {flag:#04x} at offset {offset}; stopping scan");
            break;
        }
        let ticks = if file.timestamp_bytes() == 8 {
            cursor.read_u64(offset + 1)?
        } else {
            cursor.read_u32(offset + 1)? as u64
        };
        let declared = cursor.read_u32(offset + 1 + file.timestamp_bytes())? as u64;

        let data_start = offset + header_bytes;
        let available = (cursor.len().saturating_sub(data_start)) / frame_bytes;
        let n_samples = if declared > available {
            warn!(
                "data section at offset {offset} declares {declared} frames but only \
                 {available} fit in the file; using observed count"
            );
            available
        } else {
            declared
        };

        if n_samples > 0 {
            sections.push(DataSection {
                data_start,
                ticks,
                n_samples,
                stride: frame_bytes,
            });
        } else {
            debug!("skipping empty data section at offset {offset}");
        }

        if n_samples < declared {
            break;
        }
        offset = data_start + n_samples * frame_bytes;
    }

    Ok(sections)
}

/// Whether a section list uses the packet-per-sample layout.
pub fn is_packet_per_sample(sections: &[DataSection]) -> bool {
    sections.len() > 1 && sections.iter().all(|s| s.n_samples == 1)
}

/// Coalesce packet-per-sample sections into strided runs, splitting where
/// the timestamp gap between consecutive packets exceeds twice the expected
/// inter-sample gap (a pause or restarted acquisition) or where the clock
/// runs backwards.
pub fn coalesce_ptp_runs(
    sections: &[DataSection],
    header_bytes: u64,
    expected_gap_ticks: f64,
) -> Vec<DataSection> {
    let mut runs: Vec<DataSection> = Vec::new();
    let mut last_ticks = 0u64;

    for section in sections {
        let packet_stride = header_bytes + section.stride;
        if let Some(run) = runs.last_mut() {
            let delta = section.ticks as i128 - last_ticks as i128;
            let expected_start = run.data_start + run.n_samples * packet_stride;
            if section.data_start == expected_start
                && delta > 0
                && delta as f64 <= 2.0 * expected_gap_ticks
            {
                run.n_samples += 1;
                last_ticks = section.ticks;
                continue;
            }
        }
        runs.push(DataSection {
            data_start: section.data_start,
            ticks: section.ticks,
            n_samples: 1,
            stride: packet_stride,
        });
        last_ticks = section.ticks;
    }

    runs
}
