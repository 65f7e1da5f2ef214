// src/header/channels.rs
use crate::types::EventKind;

/// Location of one data packet within the NEV file: its absolute byte
/// offset and its raw timestamp, recorded during the header scan so that
/// extraction never re-walks the packet stream.
#[derive(Debug, Clone, Copy)]
pub struct PacketRef {
    pub offset: u64,
    pub ticks: u64,
}

/// A (source channel, unit) pair with detected spike events.
///
/// Discovered by scanning spike packet headers during header parsing; units
/// are not declared up front. The packet index is time-sorted and frozen
/// once parsing completes.
#[derive(Debug, Clone)]
pub struct SpikeChannel {
    /// `ch<electrode>#<unit>`.
    pub name: String,
    pub electrode_id: u16,
    pub unit_id: u8,
    /// Waveform snippet length in samples.
    pub waveform_len: usize,
    /// Physical value (nV) per raw waveform count, from the extended header.
    pub digitization_factor: u16,
    /// On-disk width of one waveform sample (1 or 2 bytes).
    pub(crate) bytes_per_sample: u8,
    /// Offset of the waveform within its packet.
    pub(crate) waveform_offset: u64,
    pub(crate) packets: Vec<PacketRef>,
}

impl SpikeChannel {
    pub fn spike_count(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// A labeled stream of discrete timestamped markers.
#[derive(Debug, Clone)]
pub struct EventChannel {
    pub name: String,
    pub kind: EventKind,
    pub(crate) packets: Vec<PacketRef>,
}

impl EventChannel {
    pub fn event_count(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
