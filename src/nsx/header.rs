// src/nsx/header.rs
use crate::cursor::ByteCursor;
use crate::error::{BlackrockError, Result};
use crate::types::{TimeOrigin, SAMPLE_CLOCK_HZ};
use log::warn;

/// Spec 2.1 magic ("basic header" layout, no version bytes on disk).
pub const MAGIC_V21: &[u8; 8] = b"NEURALSG";
/// Spec 2.2/2.3 magic (extended channel headers, sample-counter timestamps).
pub const MAGIC_V22: &[u8; 8] = b"NEURALCD";
/// Spec 3.0 magic (hardware-clock timestamps).
pub const MAGIC_V30: &[u8; 8] = b"BRSMPGRP";

/// Size of the spec 2.2+ fixed header preceding the extended channel table.
pub const V22_FIXED_HEADER_SIZE: u64 = 314;
/// Size of one "CC" extended channel entry.
pub const V22_CHANNEL_ENTRY_SIZE: u64 = 66;

/// Parsed structural header of one NSx file, before data-section scanning.
#[derive(Debug, Clone)]
pub struct NsxFile {
    pub spec_major: u8,
    pub spec_minor: u8,
    pub label: String,
    pub comment: String,
    /// Sampling period in ticks of the nominal 30 kHz clock.
    pub period: u32,
    /// Resolution of data-section timestamps, in ticks per second.
    pub timestamp_resolution: u32,
    pub time_origin: TimeOrigin,
    pub channels: Vec<NsxChannel>,
    /// Absolute offset of the first data section.
    pub data_start: u64,
}

impl NsxFile {
    pub fn sampling_rate(&self) -> f64 {
        SAMPLE_CLOCK_HZ as f64 / self.period as f64
    }

    /// Bytes of one interleaved sample frame (all channels, i16 each).
    pub fn frame_bytes(&self) -> u64 {
        2 * self.channels.len() as u64
    }

    /// Width of a data-section timestamp on disk.
    pub fn timestamp_bytes(&self) -> u64 {
        if self.spec_major >= 3 {
            8
        } else {
            4
        }
    }

    /// Data-section header size: flag byte + timestamp + point count.
    pub fn section_header_bytes(&self) -> u64 {
        1 + self.timestamp_bytes() + 4
    }
}

/// One channel as declared by the NSx header.
#[derive(Debug, Clone)]
pub struct NsxChannel {
    pub electrode_id: u16,
    pub label: String,
    pub units: String,
    pub min_digital: i16,
    pub max_digital: i16,
    pub min_analog: i16,
    pub max_analog: i16,
    pub highpass_freq_mhz: u32,
    pub lowpass_freq_mhz: u32,
}

impl NsxChannel {
    /// Physical value per raw count, from the declared ranges.
    pub fn gain(&self) -> f64 {
        let digital_span = self.max_digital as f64 - self.min_digital as f64;
        if digital_span == 0.0 {
            return 1.0;
        }
        (self.max_analog as f64 - self.min_analog as f64) / digital_span
    }

    /// Physical value at raw count zero.
    pub fn offset(&self) -> f64 {
        self.min_analog as f64 - self.gain() * self.min_digital as f64
    }
}

/// Decode the NSx preamble and the version-specific header layout.
///
/// Spec 2.1 files declare channels as a bare id list; spec 2.2+ files carry
/// 66-byte extended channel entries with labels, ranges and filter corners.
pub fn parse_nsx_header(cursor: ByteCursor<'_>) -> Result<NsxFile> {
    let magic = cursor.bytes(0, 8)?;
    if magic == MAGIC_V21 {
        parse_v21(cursor)
    } else if magic == MAGIC_V22 || magic == MAGIC_V30 {
        parse_v22(cursor)
    } else {
        Err(BlackrockError::UnsupportedFormat(
            String::from_utf8_lossy(magic).to_string(),
        ))
    }
}

fn parse_v21(cursor: ByteCursor<'_>) -> Result<NsxFile> {
    let label = cursor.read_fixed_str(8, 16)?;
    let period = cursor.read_u32(24)?;
    let channel_count = cursor.read_u32(28)? as usize;

    let mut channels = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let electrode_id = cursor.read_u32(32 + 4 * i as u64)? as u16;
        // Spec 2.1 declares no ranges; raw counts pass through unscaled.
        channels.push(NsxChannel {
            electrode_id,
            label: format!("chan{electrode_id}"),
            units: String::new(),
            min_digital: 0,
            max_digital: 0,
            min_analog: 0,
            max_analog: 0,
            highpass_freq_mhz: 0,
            lowpass_freq_mhz: 0,
        });
    }

    Ok(NsxFile {
        spec_major: 2,
        spec_minor: 1,
        label,
        comment: String::new(),
        period,
        timestamp_resolution: SAMPLE_CLOCK_HZ,
        time_origin: TimeOrigin::default(),
        channels,
        data_start: 32 + 4 * channel_count as u64,
    })
}

fn parse_v22(cursor: ByteCursor<'_>) -> Result<NsxFile> {
    let spec_major = cursor.read_u8(8)?;
    let spec_minor = cursor.read_u8(9)?;
    if !(2..=3).contains(&spec_major) {
        return Err(BlackrockError::UnsupportedVersion {
            major: spec_major,
            minor: spec_minor,
        });
    }

    let bytes_in_headers = cursor.read_u32(10)? as u64;
    let label = cursor.read_fixed_str(14, 16)?;
    let comment = cursor.read_fixed_str(30, 256)?;
    let period = cursor.read_u32(286)?;
    let timestamp_resolution = cursor.read_u32(290)?;
    let time_origin = read_time_origin(cursor, 294)?;
    let declared_count = cursor.read_u32(310)? as usize;

    // The extended header table runs up to bytes_in_headers; when the
    // declared count disagrees with the table size, the table wins.
    let table_bytes = bytes_in_headers.saturating_sub(V22_FIXED_HEADER_SIZE);
    let observed_count = (table_bytes / V22_CHANNEL_ENTRY_SIZE) as usize;
    let channel_count = if observed_count != declared_count {
        warn!(
            "declared channel count {declared_count} disagrees with extended \
             header table ({observed_count} entries); using observed count"
        );
        observed_count
    } else {
        declared_count
    };

    let mut channels = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let base = V22_FIXED_HEADER_SIZE + i as u64 * V22_CHANNEL_ENTRY_SIZE;
        let entry_type = cursor.bytes(base, 2)?;
        if entry_type != b"CC" {
            warn!(
                "extended channel entry {i} has unknown type {:?}",
                String::from_utf8_lossy(entry_type)
            );
        }
        channels.push(NsxChannel {
            electrode_id: cursor.read_u16(base + 2)?,
            label: cursor.read_fixed_str(base + 4, 16)?,
            units: cursor.read_fixed_str(base + 30, 16)?,
            min_digital: cursor.read_i16(base + 22)?,
            max_digital: cursor.read_i16(base + 24)?,
            min_analog: cursor.read_i16(base + 26)?,
            max_analog: cursor.read_i16(base + 28)?,
            highpass_freq_mhz: cursor.read_u32(base + 46)?,
            lowpass_freq_mhz: cursor.read_u32(base + 56)?,
        });
    }

    Ok(NsxFile {
        spec_major,
        spec_minor,
        label,
        comment,
        period,
        timestamp_resolution,
        time_origin,
        channels,
        data_start: bytes_in_headers,
    })
}

fn read_time_origin(cursor: ByteCursor<'_>, offset: u64) -> Result<TimeOrigin> {
    let mut fields = [0u16; 8];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = cursor.read_u16(offset + 2 * i as u64)?;
    }
    Ok(TimeOrigin::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn v21_bytes(period: u32, channel_ids: &[u32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC_V21);
        buf.extend_from_slice(&[0u8; 16]); // label
        buf.write_u32::<LittleEndian>(period).unwrap();
        buf.write_u32::<LittleEndian>(channel_ids.len() as u32).unwrap();
        for &id in channel_ids {
            buf.write_u32::<LittleEndian>(id).unwrap();
        }
        buf
    }

    #[test]
    fn test_parse_v21_header() {
        let bytes = v21_bytes(30, &[1, 2, 3]);
        let file = parse_nsx_header(ByteCursor::new(&bytes)).unwrap();

        assert_eq!(file.spec_major, 2);
        assert_eq!(file.spec_minor, 1);
        assert_eq!(file.period, 30);
        assert_eq!(file.sampling_rate(), 1000.0);
        assert_eq!(file.channels.len(), 3);
        assert_eq!(file.channels[1].electrode_id, 2);
        assert_eq!(file.data_start, 32 + 12);
        assert_eq!(file.timestamp_bytes(), 4);
    }

    #[test]
    fn test_unknown_magic_rejected() {
        let mut bytes = v21_bytes(30, &[1]);
        bytes[..8].copy_from_slice(b"NOTAFILE");
        let err = parse_nsx_header(ByteCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, BlackrockError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_truncated_preamble_rejected() {
        let bytes = b"NEURAL".to_vec();
        assert!(parse_nsx_header(ByteCursor::new(&bytes)).is_err());
    }

    #[test]
    fn test_unsupported_major_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC_V22);
        buf.push(4); // major
        buf.push(0); // minor
        buf.extend_from_slice(&[0u8; 304]);
        let err = parse_nsx_header(ByteCursor::new(&buf)).unwrap_err();
        assert!(matches!(
            err,
            BlackrockError::UnsupportedVersion { major: 4, minor: 0 }
        ));
    }

    #[test]
    fn test_channel_scaling() {
        let ch = NsxChannel {
            electrode_id: 1,
            label: "elec1".into(),
            units: "uV".into(),
            min_digital: -32764,
            max_digital: 32764,
            min_analog: -8191,
            max_analog: 8191,
            highpass_freq_mhz: 0,
            lowpass_freq_mhz: 0,
        };
        assert!((ch.gain() - 8191.0 / 32764.0).abs() < 1e-12);
        assert!(ch.offset().abs() < 1e-9);
    }
}
