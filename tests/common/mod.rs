// tests/common/mod.rs
//! Synthetic NSx/NEV fixture writers shared by the integration tests.
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::path::Path;

pub const SAMPLE_CLOCK: u32 = 30_000;
pub const PTP_CLOCK: u32 = 1_000_000_000;

/// One declared channel of a spec 2.2+ NSx file.
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub electrode_id: u16,
    pub label: String,
    pub units: String,
    pub min_digital: i16,
    pub max_digital: i16,
    pub min_analog: i16,
    pub max_analog: i16,
}

impl ChannelSpec {
    /// A channel whose analog range is a quarter of the digital range
    /// (gain 0.25, offset 0).
    pub fn quarter_gain(electrode_id: u16) -> Self {
        ChannelSpec {
            electrode_id,
            label: format!("elec{electrode_id}"),
            units: "uV".to_string(),
            min_digital: -32764,
            max_digital: 32764,
            min_analog: -8191,
            max_analog: 8191,
        }
    }
}

fn push_fixed_str(buf: &mut Vec<u8>, s: &str, len: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(len);
    buf.extend_from_slice(&bytes[..n]);
    buf.resize(buf.len() + (len - n), 0);
}

/// Write a spec 2.1 ("NEURALSG") file: bare channel id list, one contiguous
/// data region. `samples[s][c]` is sample `s` of channel position `c`.
pub fn write_nsx21(path: &Path, period: u32, channel_ids: &[u32], samples: &[Vec<i16>]) {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"NEURALSG");
    push_fixed_str(&mut buf, "30 kS/s", 16);
    buf.write_u32::<LittleEndian>(period).unwrap();
    buf.write_u32::<LittleEndian>(channel_ids.len() as u32).unwrap();
    for &id in channel_ids {
        buf.write_u32::<LittleEndian>(id).unwrap();
    }
    for frame in samples {
        assert_eq!(frame.len(), channel_ids.len());
        for &v in frame {
            buf.write_i16::<LittleEndian>(v).unwrap();
        }
    }
    std::fs::write(path, buf).unwrap();
}

/// Write a spec 2.2+ file with bulk data sections.
/// Each section is `(timestamp_ticks, samples)` with `samples[s][c]`.
pub fn write_nsx2x(
    path: &Path,
    spec: (u8, u8),
    period: u32,
    timestamp_resolution: u32,
    channels: &[ChannelSpec],
    sections: &[(u64, Vec<Vec<i16>>)],
) {
    let mut buf = nsx2x_header(spec, period, timestamp_resolution, channels);
    for (ticks, samples) in sections {
        buf.push(0x01);
        if spec.0 >= 3 {
            buf.write_u64::<LittleEndian>(*ticks).unwrap();
        } else {
            buf.write_u32::<LittleEndian>(*ticks as u32).unwrap();
        }
        buf.write_u32::<LittleEndian>(samples.len() as u32).unwrap();
        for frame in samples {
            assert_eq!(frame.len(), channels.len());
            for &v in frame {
                buf.write_i16::<LittleEndian>(v).unwrap();
            }
        }
    }
    std::fs::write(path, buf).unwrap();
}

/// Write a spec 3.0 PTP file: one single-sample data section per packet.
/// Each packet is `(hardware_clock_ticks, frame)`.
pub fn write_nsx_ptp(
    path: &Path,
    period: u32,
    channels: &[ChannelSpec],
    packets: &[(u64, Vec<i16>)],
) {
    let mut buf = nsx2x_header((3, 0), period, PTP_CLOCK, channels);
    for (ticks, frame) in packets {
        assert_eq!(frame.len(), channels.len());
        buf.push(0x01);
        buf.write_u64::<LittleEndian>(*ticks).unwrap();
        buf.write_u32::<LittleEndian>(1).unwrap();
        for &v in frame {
            buf.write_i16::<LittleEndian>(v).unwrap();
        }
    }
    std::fs::write(path, buf).unwrap();
}

fn nsx2x_header(
    spec: (u8, u8),
    period: u32,
    timestamp_resolution: u32,
    channels: &[ChannelSpec],
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(if spec.0 >= 3 { b"BRSMPGRP" } else { b"NEURALCD" });
    buf.push(spec.0);
    buf.push(spec.1);
    let bytes_in_headers = 314 + 66 * channels.len() as u32;
    buf.write_u32::<LittleEndian>(bytes_in_headers).unwrap();
    push_fixed_str(&mut buf, "fixture", 16);
    push_fixed_str(&mut buf, "synthetic recording", 256);
    buf.write_u32::<LittleEndian>(period).unwrap();
    buf.write_u32::<LittleEndian>(timestamp_resolution).unwrap();
    for field in [2024u16, 1, 4, 12, 10, 30, 0, 0] {
        buf.write_u16::<LittleEndian>(field).unwrap();
    }
    buf.write_u32::<LittleEndian>(channels.len() as u32).unwrap();
    for ch in channels {
        buf.extend_from_slice(b"CC");
        buf.write_u16::<LittleEndian>(ch.electrode_id).unwrap();
        push_fixed_str(&mut buf, &ch.label, 16);
        buf.push(1); // physical connector
        buf.push(ch.electrode_id as u8); // connector pin
        buf.write_i16::<LittleEndian>(ch.min_digital).unwrap();
        buf.write_i16::<LittleEndian>(ch.max_digital).unwrap();
        buf.write_i16::<LittleEndian>(ch.min_analog).unwrap();
        buf.write_i16::<LittleEndian>(ch.max_analog).unwrap();
        push_fixed_str(&mut buf, &ch.units, 16);
        buf.write_u32::<LittleEndian>(300_000).unwrap(); // highpass corner, mHz
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(7_500_000).unwrap(); // lowpass corner, mHz
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u16::<LittleEndian>(0).unwrap();
    }
    assert_eq!(buf.len(), bytes_in_headers as usize);
    buf
}

/// A `NEUEVWAV` extension header declaration.
#[derive(Debug, Clone, Copy)]
pub struct WaveDecl {
    pub electrode: u16,
    pub bytes_per_sample: u8,
    pub spike_width: u16,
}

/// One data packet of a NEV fixture.
#[derive(Debug, Clone)]
pub enum NevPacket {
    Spike {
        ticks: u64,
        electrode: u16,
        unit: u8,
        waveform: Vec<i16>,
    },
    Spike8 {
        ticks: u64,
        electrode: u16,
        unit: u8,
        waveform: Vec<i8>,
    },
    Digital {
        ticks: u64,
        value: u16,
    },
    Comment {
        ticks: u64,
        charset: u8,
        text: Vec<u8>,
    },
}

impl NevPacket {
    pub fn comment(ticks: u64, text: &str) -> Self {
        NevPacket::Comment {
            ticks,
            charset: 0,
            text: text.as_bytes().to_vec(),
        }
    }

    pub fn comment_utf16(ticks: u64, text: &str) -> Self {
        let mut bytes = Vec::new();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        NevPacket::Comment {
            ticks,
            charset: 1,
            text: bytes,
        }
    }
}

/// Write a NEV file. Spec major 2 uses 4-byte timestamps at 30 kHz; spec
/// major 3 uses 8-byte hardware-clock timestamps at 1 GHz.
pub fn write_nev(path: &Path, spec_major: u8, packet_size: u32, decls: &[WaveDecl], packets: &[NevPacket]) {
    let ts_bytes = if spec_major >= 3 { 8 } else { 4 };
    let mut buf = Vec::new();
    buf.extend_from_slice(b"NEURALEV");
    buf.push(spec_major);
    buf.push(0); // minor
    buf.write_u16::<LittleEndian>(0).unwrap(); // additional flags
    let bytes_in_headers = 336 + 32 * decls.len() as u32;
    buf.write_u32::<LittleEndian>(bytes_in_headers).unwrap();
    buf.write_u32::<LittleEndian>(packet_size).unwrap();
    let ts_res = if spec_major >= 3 { PTP_CLOCK } else { SAMPLE_CLOCK };
    buf.write_u32::<LittleEndian>(ts_res).unwrap();
    buf.write_u32::<LittleEndian>(SAMPLE_CLOCK).unwrap(); // sample resolution
    for field in [2024u16, 1, 4, 12, 10, 30, 0, 0] {
        buf.write_u16::<LittleEndian>(field).unwrap();
    }
    push_fixed_str(&mut buf, "fixture writer", 32);
    push_fixed_str(&mut buf, "synthetic recording", 256);
    buf.write_u32::<LittleEndian>(decls.len() as u32).unwrap();
    for decl in decls {
        buf.extend_from_slice(b"NEUEVWAV");
        buf.write_u16::<LittleEndian>(decl.electrode).unwrap();
        buf.push(1); // physical connector
        buf.push(decl.electrode as u8); // connector pin
        buf.write_u16::<LittleEndian>(250).unwrap(); // digitization factor, nV
        buf.write_u16::<LittleEndian>(0).unwrap(); // energy threshold
        buf.write_i16::<LittleEndian>(0).unwrap(); // high threshold
        buf.write_i16::<LittleEndian>(0).unwrap(); // low threshold
        buf.push(0); // sorted unit count
        buf.push(decl.bytes_per_sample);
        buf.write_u16::<LittleEndian>(decl.spike_width).unwrap();
        buf.extend_from_slice(&[0u8; 8]);
    }
    assert_eq!(buf.len(), bytes_in_headers as usize);

    for packet in packets {
        let mut p = vec![0u8; packet_size as usize];
        let (ticks, packet_id) = match packet {
            NevPacket::Spike { ticks, electrode, .. } | NevPacket::Spike8 { ticks, electrode, .. } => {
                (*ticks, *electrode)
            }
            NevPacket::Digital { ticks, .. } => (*ticks, 0),
            NevPacket::Comment { ticks, .. } => (*ticks, 0xFFFF),
        };
        if ts_bytes == 8 {
            p[..8].copy_from_slice(&ticks.to_le_bytes());
        } else {
            p[..4].copy_from_slice(&(ticks as u32).to_le_bytes());
        }
        p[ts_bytes..ts_bytes + 2].copy_from_slice(&packet_id.to_le_bytes());
        let payload = ts_bytes + 2;
        match packet {
            NevPacket::Spike { unit, waveform, .. } => {
                p[payload] = *unit;
                let mut at = payload + 2;
                for &v in waveform {
                    p[at..at + 2].copy_from_slice(&v.to_le_bytes());
                    at += 2;
                }
            }
            NevPacket::Spike8 { unit, waveform, .. } => {
                p[payload] = *unit;
                for (i, &v) in waveform.iter().enumerate() {
                    p[payload + 2 + i] = v as u8;
                }
            }
            NevPacket::Digital { value, .. } => {
                p[payload + 2..payload + 4].copy_from_slice(&value.to_le_bytes());
            }
            NevPacket::Comment { charset, text, .. } => {
                p[payload] = *charset;
                let at = payload + 6;
                p[at..at + text.len()].copy_from_slice(text);
            }
        }
        buf.extend_from_slice(&p);
    }
    std::fs::write(path, buf).unwrap();
}
