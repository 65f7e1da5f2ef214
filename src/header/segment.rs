// src/header/segment.rs

/// Byte layout of one stream's samples within one segment.
///
/// Sample `s` of channel position `c` lives at
/// `start + s * stride + 2 * c`. For contiguous data sections the stride
/// equals the frame size; for packet-per-sample (PTP) layouts it also skips
/// the per-packet header.
#[derive(Debug, Clone, Copy)]
pub struct SectionSlice {
    pub start: u64,
    pub stride: u64,
    pub n_samples: u64,
}

/// A maximal contiguous time span of one continuous recording session.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment start in seconds.
    pub t_start: f64,
    /// Segment stop in seconds.
    pub t_stop: f64,
    /// One slice per signal stream, in stream-index order.
    pub(crate) slices: Vec<SectionSlice>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.t_stop - self.t_start
    }

    /// Number of samples this segment holds for the given stream.
    pub fn stream_len(&self, stream_index: usize) -> Option<u64> {
        self.slices.get(stream_index).map(|s| s.n_samples)
    }

    pub(crate) fn slice(&self, stream_index: usize) -> Option<&SectionSlice> {
        self.slices.get(stream_index)
    }

    /// Whether a timestamp in seconds falls within this segment, with a
    /// tolerance of `slack` seconds at each boundary.
    pub fn contains(&self, t: f64, slack: f64) -> bool {
        t >= self.t_start - slack && t <= self.t_stop + slack
    }
}

/// Top-level grouping of segments; NSx/NEV recordings always yield one.
#[derive(Debug, Clone)]
pub struct Block {
    pub segments: Vec<Segment>,
}
