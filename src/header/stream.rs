// src/header/stream.rs

/// A group of channels sharing one sampling rate and on-disk layout,
/// corresponding to one NSx file of the recording.
#[derive(Debug, Clone)]
pub struct SignalStream {
    /// Stream id, e.g. "ns2".
    pub id: String,
    /// Sampling-group label from the file header, e.g. "1 kS/s".
    pub label: String,
    /// Sampling rate in Hz (nominal clock divided by the declared period).
    pub sampling_rate: f64,
    pub channels: Vec<SignalChannel>,
    /// Index into the reader's NSx sources; not meaningful to callers.
    pub(crate) file_index: usize,
}

impl SignalStream {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Bytes between consecutive samples of one channel within a frame row.
    pub(crate) fn frame_bytes(&self) -> u64 {
        2 * self.channels.len() as u64
    }
}

/// One continuously sampled channel within a stream.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    pub electrode_id: u16,
    pub label: String,
    /// Physical units of the rescaled signal, e.g. "uV". Empty for spec 2.1
    /// files, which do not declare ranges.
    pub units: String,
    /// Physical value per raw count.
    pub gain: f64,
    /// Physical value at raw count zero.
    pub offset: f64,
}

impl SignalChannel {
    /// Rescale a raw sample to physical units.
    pub fn to_physical(&self, raw: i16) -> f64 {
        raw as f64 * self.gain + self.offset
    }
}
