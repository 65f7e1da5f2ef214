// src/error.rs
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlackrockError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("not a Blackrock file: unrecognized magic {0:?}")]
    UnsupportedFormat(String),

    #[error("unsupported file spec version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("truncated data: {needed} bytes at offset {offset} exceed source size {available}")]
    Truncated {
        offset: u64,
        needed: usize,
        available: u64,
    },

    #[error("header inconsistency: {0}")]
    HeaderInconsistency(String),

    #[error("header has not been parsed; call parse_header() first")]
    NotParsed,

    #[error("stream index {index} out of range (stream count: {count})")]
    StreamOutOfBounds { index: usize, count: usize },

    #[error("channel index {index} out of range (channel count: {count})")]
    ChannelOutOfBounds { index: usize, count: usize },

    #[error("spike channel index {index} out of range (count: {count})")]
    SpikeChannelOutOfBounds { index: usize, count: usize },

    #[error("event channel index {index} out of range (count: {count})")]
    EventChannelOutOfBounds { index: usize, count: usize },

    #[error("block index {index} out of range (block count: {count})")]
    BlockOutOfBounds { index: usize, count: usize },

    #[error("segment index {index} out of range (segment count: {count})")]
    SegmentOutOfBounds { index: usize, count: usize },

    #[error("sample range {start}..{stop} invalid for stream of length {len}")]
    SampleOutOfBounds { start: u64, stop: u64, len: u64 },

    #[error("no data files found for {0}")]
    NoDataFiles(String),
}

pub type Result<T> = std::result::Result<T, BlackrockError>;
