// src/lib.rs
//! # blackrock-rs
//!
//! A Rust library for reading Blackrock NSx/NEV electrophysiology
//! recordings: continuous multi-channel signals, sorted spike events with
//! waveform snippets, and digital/comment event markers.
//!
//! ## Features
//!
//! - 🧠 **Multi-file recordings**: all `.ns1`-`.ns9` signal streams and the
//!   `.nev` spike/event file of a session behind one reader
//! - 📦 **Memory efficient**: memory-mapped random access; extraction reads
//!   only the requested sub-range, never the whole file
//! - 🕐 **Both timestamp regimes**: 30 kHz sample-counter files
//!   (spec 2.1-2.3) and nanosecond hardware-clock files (spec 3.0 / PTP)
//! - ✂️ **Segment detection**: recording pauses and clock restarts are
//!   recovered from timestamp discontinuities, no markers needed
//! - 🎯 **Typed results**: `ndarray` arrays for chunks and waveforms,
//!   structured errors for every failure mode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blackrock_rs::*;
//!
//! fn main() -> Result<()> {
//!     let mut reader = BlackrockReader::open("session-001")?;
//!     reader.parse_header()?;
//!
//!     // Continuous signals: 100 samples of channels 0 and 1 of stream 0
//!     let chunk = reader.analog_signal_chunk(0, 0, 0, Some(&[0, 1]), Some(0), Some(100))?;
//!     println!("chunk shape: {:?}", chunk.dim());
//!
//!     // Spikes of the first discovered (channel, unit) pair
//!     if reader.spike_channels_count()? > 0 {
//!         let times = reader.spike_timestamps(0, None, None)?;
//!         let waveforms = reader.spike_waveforms(0, None, None)?;
//!         println!("{} spikes, waveforms {:?}", times.len(), waveforms.dim());
//!     }
//!
//!     // Event markers
//!     for i in 0..reader.event_channels_count()? {
//!         let events = reader.event_timestamps(i, None, None)?;
//!         println!("event channel {i}: {} events", events.len());
//!     }
//!     Ok(())
//! }
//! ```

// Modules
pub mod cursor;
pub mod error;
pub mod header;
pub mod nev;
pub mod nsx;
pub mod reader;
pub mod source;
pub mod types;

// Re-export commonly used types at the crate root for convenience
pub use error::{BlackrockError, Result};

// Type exports
pub use types::{EventKind, TimeBase, TimeOrigin};

// Header model exports
pub use header::{
    Block, EventChannel, RecordingHeader, Segment, SignalChannel, SignalStream, SpikeChannel,
};

// Reader exports
pub use reader::{BlackrockReader, EventData, SignalChunkIter};

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use blackrock_rs::prelude::*;
    //! ```

    pub use crate::error::{BlackrockError, Result};
    pub use crate::reader::{BlackrockReader, EventData};
    pub use crate::types::{EventKind, TimeBase};
}

// Version information
/// Newest file spec version family this library reads.
pub const SUPPORTED_SPEC: (u8, u8) = (3, 0);

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
