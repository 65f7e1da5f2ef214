// src/header/mod.rs
mod channels;
mod segment;
mod stream;

pub use channels::{EventChannel, PacketRef, SpikeChannel};
pub use segment::{Block, SectionSlice, Segment};
pub use stream::{SignalChannel, SignalStream};

use crate::error::{BlackrockError, Result};
use crate::types::{TimeBase, TimeOrigin};

/// The parsed, immutable structural description of one recording.
///
/// Built once by `BlackrockReader::parse_header()` and read-only afterward.
/// Stream, spike-channel and event-channel indices are stable for the
/// lifetime of the header and are the sole addressing keys used by the
/// accessor calls.
#[derive(Debug)]
pub struct RecordingHeader {
    pub time_base: TimeBase,
    pub time_origin: TimeOrigin,
    pub signal_streams: Vec<SignalStream>,
    pub spike_channels: Vec<SpikeChannel>,
    pub event_channels: Vec<EventChannel>,
    pub blocks: Vec<Block>,
}

impl RecordingHeader {
    pub fn block(&self, block_index: usize) -> Result<&Block> {
        self.blocks
            .get(block_index)
            .ok_or(BlackrockError::BlockOutOfBounds {
                index: block_index,
                count: self.blocks.len(),
            })
    }

    pub fn segment(&self, block_index: usize, segment_index: usize) -> Result<&Segment> {
        let block = self.block(block_index)?;
        block
            .segments
            .get(segment_index)
            .ok_or(BlackrockError::SegmentOutOfBounds {
                index: segment_index,
                count: block.segments.len(),
            })
    }

    pub fn stream(&self, stream_index: usize) -> Result<&SignalStream> {
        self.signal_streams
            .get(stream_index)
            .ok_or(BlackrockError::StreamOutOfBounds {
                index: stream_index,
                count: self.signal_streams.len(),
            })
    }

    pub fn spike_channel(&self, index: usize) -> Result<&SpikeChannel> {
        self.spike_channels
            .get(index)
            .ok_or(BlackrockError::SpikeChannelOutOfBounds {
                index,
                count: self.spike_channels.len(),
            })
    }

    pub fn event_channel(&self, index: usize) -> Result<&EventChannel> {
        self.event_channels
            .get(index)
            .ok_or(BlackrockError::EventChannelOutOfBounds {
                index,
                count: self.event_channels.len(),
            })
    }
}
