// src/nev/header.rs
use crate::cursor::ByteCursor;
use crate::error::{BlackrockError, Result};
use crate::types::TimeOrigin;
use log::{debug, warn};
use std::collections::HashMap;

pub const MAGIC_NEV: &[u8; 8] = b"NEURALEV";

/// Size of the NEV fixed header preceding the extension header table.
pub const NEV_FIXED_HEADER_SIZE: u64 = 336;
/// Size of one extension header entry.
pub const NEV_EXT_HEADER_SIZE: u64 = 32;

/// Waveform capture settings for one spike-capable electrode
/// (from its `NEUEVWAV` extension header).
#[derive(Debug, Clone, Copy)]
pub struct WaveformInfo {
    /// Physical value (nV) per raw waveform count.
    pub digitization_factor: u16,
    /// On-disk width of one waveform sample; the format stores 0 to mean 1.
    pub bytes_per_sample: u8,
    /// Snippet length in samples.
    pub spike_width: u16,
}

/// Parsed structural header of a NEV file, before packet scanning.
#[derive(Debug, Clone)]
pub struct NevFile {
    pub spec_major: u8,
    pub spec_minor: u8,
    /// Absolute offset of the first data packet.
    pub data_start: u64,
    /// Fixed size of every data packet.
    pub packet_size: u64,
    /// Ticks per second of packet timestamps.
    pub timestamp_resolution: u32,
    /// Ticks per second of waveform sampling.
    pub sample_resolution: u32,
    pub time_origin: TimeOrigin,
    pub application: String,
    pub comment: String,
    /// Per-electrode waveform settings, keyed by electrode id.
    pub waveform_info: HashMap<u16, WaveformInfo>,
    /// Label of the digital input port, when declared.
    pub digital_label: Option<String>,
}

impl NevFile {
    /// Width of a packet timestamp on disk.
    pub fn timestamp_bytes(&self) -> u64 {
        if self.spec_major >= 3 {
            8
        } else {
            4
        }
    }

    /// Offset of the packet id within a packet.
    pub fn packet_id_offset(&self) -> u64 {
        self.timestamp_bytes()
    }

    /// Offset of the type-specific payload within a packet.
    pub fn payload_offset(&self) -> u64 {
        self.timestamp_bytes() + 2
    }

    /// Offset of spike waveform samples within a spike packet
    /// (after the unit-class and reserved bytes).
    pub fn waveform_offset(&self) -> u64 {
        self.payload_offset() + 2
    }

    /// Offset of the digital port value within a digital event packet
    /// (after the insertion-reason and reserved bytes).
    pub fn digital_value_offset(&self) -> u64 {
        self.payload_offset() + 2
    }

    /// Offset of the comment text within a comment packet
    /// (after the charset, flag and color fields).
    pub fn comment_text_offset(&self) -> u64 {
        self.payload_offset() + 6
    }

    /// Fallback waveform length when an electrode spikes without a
    /// `NEUEVWAV` declaration: whatever fits in the packet.
    pub fn waveform_samples_in_packet(&self, bytes_per_sample: u8) -> usize {
        let span = self.packet_size.saturating_sub(self.waveform_offset());
        (span / bytes_per_sample.max(1) as u64) as usize
    }
}

/// Decode the NEV fixed header and the extension header table.
pub fn parse_nev_header(cursor: ByteCursor<'_>) -> Result<NevFile> {
    let magic = cursor.bytes(0, 8)?;
    if magic != MAGIC_NEV {
        return Err(BlackrockError::UnsupportedFormat(
            String::from_utf8_lossy(magic).to_string(),
        ));
    }

    let spec_major = cursor.read_u8(8)?;
    let spec_minor = cursor.read_u8(9)?;
    if !(2..=3).contains(&spec_major) {
        return Err(BlackrockError::UnsupportedVersion {
            major: spec_major,
            minor: spec_minor,
        });
    }

    let bytes_in_headers = cursor.read_u32(12)? as u64;
    let packet_size = cursor.read_u32(16)? as u64;
    let timestamp_resolution = cursor.read_u32(20)?;
    let sample_resolution = cursor.read_u32(24)?;
    let time_origin = read_time_origin(cursor, 28)?;
    let application = cursor.read_fixed_str(44, 32)?;
    let comment = cursor.read_fixed_str(76, 256)?;
    let declared_ext_count = cursor.read_u32(332)? as u64;

    let mut file = NevFile {
        spec_major,
        spec_minor,
        data_start: bytes_in_headers,
        packet_size,
        timestamp_resolution,
        sample_resolution,
        time_origin,
        application,
        comment,
        waveform_info: HashMap::new(),
        digital_label: None,
    };

    if packet_size < file.waveform_offset() {
        return Err(BlackrockError::HeaderInconsistency(format!(
            "declared packet size {packet_size} is smaller than the packet header"
        )));
    }

    // The extension table must fit between the fixed header and the packet
    // region; a count that overruns it is reconciled to what fits.
    let table_bytes = bytes_in_headers.saturating_sub(NEV_FIXED_HEADER_SIZE);
    let fit_count = table_bytes / NEV_EXT_HEADER_SIZE;
    let ext_count = if declared_ext_count > fit_count {
        warn!(
            "declared {declared_ext_count} extension headers but only {fit_count} \
             fit before the data region; using observed count"
        );
        fit_count
    } else {
        declared_ext_count
    };

    for i in 0..ext_count {
        let base = NEV_FIXED_HEADER_SIZE + i * NEV_EXT_HEADER_SIZE;
        let id = cursor.bytes(base, 8)?;
        if id == b"NEUEVWAV" {
            let electrode_id = cursor.read_u16(base + 8)?;
            let mut bytes_per_sample = cursor.read_u8(base + 21)?;
            if bytes_per_sample == 0 {
                bytes_per_sample = 1;
            }
            file.waveform_info.insert(
                electrode_id,
                WaveformInfo {
                    digitization_factor: cursor.read_u16(base + 12)?,
                    bytes_per_sample,
                    spike_width: cursor.read_u16(base + 22)?,
                },
            );
        } else if id == b"DIGLABEL" {
            file.digital_label = Some(cursor.read_fixed_str(base + 8, 16)?);
        } else {
            debug!(
                "skipping unknown extension header {:?}",
                String::from_utf8_lossy(id)
            );
        }
    }

    Ok(file)
}

fn read_time_origin(cursor: ByteCursor<'_>, offset: u64) -> Result<TimeOrigin> {
    let mut fields = [0u16; 8];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = cursor.read_u16(offset + 2 * i as u64)?;
    }
    Ok(TimeOrigin::from_fields(fields))
}
