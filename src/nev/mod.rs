// src/nev/mod.rs
mod header;
mod packets;

pub use header::{parse_nev_header, NevFile, WaveformInfo};
pub use packets::{scan_packets, PacketScan, SpikeGroup};
