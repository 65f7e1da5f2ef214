// src/reader/event.rs
use crate::error::Result;
use crate::reader::spike::packet_window;
use crate::reader::BlackrockReader;
use crate::types::EventKind;

/// Extracted slice of one event channel.
///
/// `durations` is present only for interval-style events; NSx/NEV markers
/// are instantaneous, so it is uniformly `None` here. Labels are the digital
/// port value as decimal text or the comment text, per channel kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub times: Vec<f64>,
    pub durations: Option<Vec<f64>>,
    pub labels: Vec<String>,
}

impl EventData {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl BlackrockReader {
    /// Timestamps and labels of one event channel, ascending, optionally
    /// restricted to `[t_start, t_stop]`.
    ///
    /// An empty channel yields empty sequences, never an error.
    pub fn event_timestamps(
        &self,
        event_channel_index: usize,
        t_start: Option<f64>,
        t_stop: Option<f64>,
    ) -> Result<EventData> {
        let header = self.header()?;
        let channel = header.event_channel(event_channel_index)?;
        let window = packet_window(&channel.packets, header.time_base, t_start, t_stop);
        let packets = &channel.packets[window];

        let mut times = Vec::with_capacity(packets.len());
        let mut labels = Vec::with_capacity(packets.len());
        if !packets.is_empty() {
            let nev = self.nev.as_ref().ok_or(crate::error::BlackrockError::NotParsed)?;
            let cursor = self.nev_source()?.cursor();

            for packet in packets {
                times.push(header.time_base.ticks_to_seconds(packet.ticks));
                let label = match channel.kind {
                    EventKind::DigitalPort => cursor
                        .read_u16(packet.offset + nev.digital_value_offset())?
                        .to_string(),
                    EventKind::Comment => {
                        let text_offset = packet.offset + nev.comment_text_offset();
                        let max_len = (nev.packet_size - nev.comment_text_offset()) as usize;
                        let charset = cursor.read_u8(packet.offset + nev.payload_offset())?;
                        if charset == 1 {
                            decode_utf16(cursor.bytes(text_offset, max_len)?)
                        } else {
                            cursor.read_cstr(text_offset, max_len)?
                        }
                    }
                };
                labels.push(label);
            }
        }

        Ok(EventData {
            times,
            durations: None,
            labels,
        })
    }
}

fn decode_utf16(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
