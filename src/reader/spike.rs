// src/reader/spike.rs
use crate::error::Result;
use crate::header::PacketRef;
use crate::reader::BlackrockReader;
use crate::types::TimeBase;
use ndarray::Array3;
use std::ops::Range;

/// Resolve optional second bounds (inclusive) to an index range over a
/// time-sorted packet index. `None` bounds select everything.
///
/// Bounds are compared in seconds, the domain extraction reports times in,
/// so a returned timestamp passed back as a bound always selects itself.
pub(crate) fn packet_window(
    packets: &[PacketRef],
    time_base: TimeBase,
    t_start: Option<f64>,
    t_stop: Option<f64>,
) -> Range<usize> {
    let start = match t_start {
        Some(t) => packets.partition_point(|p| time_base.ticks_to_seconds(p.ticks) < t),
        None => 0,
    };
    let end = match t_stop {
        Some(t) => packets.partition_point(|p| time_base.ticks_to_seconds(p.ticks) <= t),
        None => packets.len(),
    };
    start..end.max(start)
}

impl BlackrockReader {
    /// Spike times of one (channel, unit) pair in seconds, ascending,
    /// optionally restricted to `[t_start, t_stop]`.
    ///
    /// An empty channel yields an empty vector, never an error. Repeated
    /// calls with the same arguments return identical results.
    pub fn spike_timestamps(
        &self,
        spike_channel_index: usize,
        t_start: Option<f64>,
        t_stop: Option<f64>,
    ) -> Result<Vec<f64>> {
        let header = self.header()?;
        let channel = header.spike_channel(spike_channel_index)?;
        let window = packet_window(&channel.packets, header.time_base, t_start, t_stop);

        Ok(channel.packets[window]
            .iter()
            .map(|p| header.time_base.ticks_to_seconds(p.ticks))
            .collect())
    }

    /// Waveform snippets of one (channel, unit) pair, shaped
    /// `[spikes x 1 x samples]`.
    ///
    /// Row order matches [`spike_timestamps`](Self::spike_timestamps) for
    /// the same bounds; the sample count is the channel's declared waveform
    /// length. 8-bit waveforms are sign-extended to i16.
    pub fn spike_waveforms(
        &self,
        spike_channel_index: usize,
        t_start: Option<f64>,
        t_stop: Option<f64>,
    ) -> Result<Array3<i16>> {
        let header = self.header()?;
        let channel = header.spike_channel(spike_channel_index)?;
        let window = packet_window(&channel.packets, header.time_base, t_start, t_stop);
        let packets = &channel.packets[window];

        let mut out = Array3::zeros((packets.len(), 1, channel.waveform_len));
        if packets.is_empty() || channel.waveform_len == 0 {
            return Ok(out);
        }

        let cursor = self.nev_source()?.cursor();
        let bytes_per_sample = channel.bytes_per_sample as usize;
        let span = channel.waveform_len * bytes_per_sample;

        for (row, packet) in packets.iter().enumerate() {
            let raw = cursor.bytes(packet.offset + channel.waveform_offset, span)?;
            match bytes_per_sample {
                1 => {
                    for (s, &b) in raw.iter().enumerate() {
                        out[(row, 0, s)] = b as i8 as i16;
                    }
                }
                _ => {
                    for (s, pair) in raw.chunks_exact(2).enumerate() {
                        out[(row, 0, s)] = i16::from_le_bytes([pair[0], pair[1]]);
                    }
                }
            }
        }
        Ok(out)
    }
}
