// src/reader/signal.rs
use crate::error::{BlackrockError, Result};
use crate::reader::BlackrockReader;
use ndarray::Array2;
use smallvec::SmallVec;

type ChannelList = SmallVec<[usize; 32]>;

impl BlackrockReader {
    /// Random-access read of a sub-range of one stream within one segment.
    ///
    /// Returns raw counts shaped `[channels x samples]`, rows ordered as
    /// `channel_indexes` (all channels of the stream when `None`). Sample
    /// bounds default to the full segment range and must satisfy
    /// `i_start <= i_stop <= stream length`. Only the requested sub-range is
    /// read and allocated; slicing is pure offset/stride arithmetic over the
    /// mapped bytes.
    ///
    /// # Errors
    ///
    /// Out-of-range stream, channel or sample indexes fail with the matching
    /// `*OutOfBounds` error without touching any data; calling before
    /// [`parse_header`](Self::parse_header) fails with `NotParsed`.
    pub fn analog_signal_chunk(
        &self,
        block_index: usize,
        segment_index: usize,
        stream_index: usize,
        channel_indexes: Option<&[usize]>,
        i_start: Option<u64>,
        i_stop: Option<u64>,
    ) -> Result<Array2<i16>> {
        let header = self.header()?;
        let stream = header.stream(stream_index)?;
        let segment = header.segment(block_index, segment_index)?;
        let slice = segment
            .slice(stream_index)
            .copied()
            .ok_or(BlackrockError::StreamOutOfBounds {
                index: stream_index,
                count: header.signal_streams.len(),
            })?;

        let i_start = i_start.unwrap_or(0);
        let i_stop = i_stop.unwrap_or(slice.n_samples);
        if i_start > i_stop || i_stop > slice.n_samples {
            return Err(BlackrockError::SampleOutOfBounds {
                start: i_start,
                stop: i_stop,
                len: slice.n_samples,
            });
        }

        let channel_count = stream.channel_count();
        let channels: ChannelList = match channel_indexes {
            Some(indexes) => {
                for &ch in indexes {
                    if ch >= channel_count {
                        return Err(BlackrockError::ChannelOutOfBounds {
                            index: ch,
                            count: channel_count,
                        });
                    }
                }
                indexes.iter().copied().collect()
            }
            None => (0..channel_count).collect(),
        };

        let n_samples = (i_stop - i_start) as usize;
        let mut out = Array2::zeros((channels.len(), n_samples));
        if n_samples == 0 || channels.is_empty() {
            return Ok(out);
        }

        let frame_bytes = stream.frame_bytes();
        let cursor = self.nsx_source(stream.file_index).cursor();
        let span = (n_samples as u64 - 1) * slice.stride + frame_bytes;
        let region = cursor.bytes(slice.start + i_start * slice.stride, span as usize)?;

        // Contiguous frames on a little-endian target can be viewed as one
        // i16 slab; strided (packet-per-sample) layouts and unaligned
        // regions take the per-sample path.
        #[cfg(target_endian = "little")]
        if slice.stride == frame_bytes {
            if let Ok(frames) = bytemuck::try_cast_slice::<u8, i16>(region) {
                for (row, &ch) in channels.iter().enumerate() {
                    for col in 0..n_samples {
                        out[(row, col)] = frames[col * channel_count + ch];
                    }
                }
                return Ok(out);
            }
        }

        for (row, &ch) in channels.iter().enumerate() {
            let ch_offset = 2 * ch;
            for col in 0..n_samples {
                let at = col * slice.stride as usize + ch_offset;
                out[(row, col)] = i16::from_le_bytes([region[at], region[at + 1]]);
            }
        }
        Ok(out)
    }

    /// Iterate a stream segment in bounded chunks (memory-efficient access
    /// to long recordings).
    pub fn signal_chunk_iter(
        &self,
        block_index: usize,
        segment_index: usize,
        stream_index: usize,
        channel_indexes: Option<&[usize]>,
        chunk_samples: u64,
    ) -> Result<SignalChunkIter<'_>> {
        let header = self.header()?;
        header.stream(stream_index)?;
        let segment = header.segment(block_index, segment_index)?;
        let total = segment.stream_len(stream_index).unwrap_or(0);

        Ok(SignalChunkIter {
            reader: self,
            block_index,
            segment_index,
            stream_index,
            channel_indexes: channel_indexes.map(|c| c.to_vec()),
            chunk_samples: chunk_samples.max(1),
            position: 0,
            total,
        })
    }
}

/// Chunked access over one stream segment.
///
/// Yields `[channels x samples]` arrays of at most `chunk_samples` columns
/// until the segment is exhausted.
pub struct SignalChunkIter<'r> {
    reader: &'r BlackrockReader,
    block_index: usize,
    segment_index: usize,
    stream_index: usize,
    channel_indexes: Option<Vec<usize>>,
    chunk_samples: u64,
    position: u64,
    total: u64,
}

impl SignalChunkIter<'_> {
    /// Read the next chunk, or `None` once the segment is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Array2<i16>>> {
        if self.position >= self.total {
            return Ok(None);
        }
        let stop = (self.position + self.chunk_samples).min(self.total);
        let chunk = self.reader.analog_signal_chunk(
            self.block_index,
            self.segment_index,
            self.stream_index,
            self.channel_indexes.as_deref(),
            Some(self.position),
            Some(stop),
        )?;
        self.position = stop;
        Ok(Some(chunk))
    }

    /// Restart from the beginning of the segment.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn total_samples(&self) -> u64 {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.position < self.total
    }
}
