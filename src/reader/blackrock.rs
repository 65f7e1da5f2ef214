// src/reader/blackrock.rs
use crate::error::{BlackrockError, Result};
use crate::header::{
    Block, EventChannel, RecordingHeader, SectionSlice, Segment, SignalChannel, SignalStream,
    SpikeChannel,
};
use crate::nev::{parse_nev_header, scan_packets, NevFile, PacketScan};
use crate::nsx::{coalesce_ptp_runs, parse_nsx_header, scan_sections, DataSection, NsxFile};
use crate::source::ByteSource;
use crate::types::{EventKind, TimeBase, SAMPLE_CLOCK_HZ};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Reader over one Blackrock recording: the sibling `.ns1`-`.ns9` files
/// (continuous signal streams) and `.nev` file (spikes and events) sharing
/// one base name.
///
/// Construction memory-maps the files; [`parse_header`](Self::parse_header)
/// builds the immutable [`RecordingHeader`]. Every extraction call after
/// that is a bounded, read-only random access into the mapped bytes.
///
/// # Example
///
/// ```no_run
/// use blackrock_rs::BlackrockReader;
///
/// fn main() -> blackrock_rs::Result<()> {
///     let mut reader = BlackrockReader::open("session-001")?;
///     reader.parse_header()?;
///
///     for i in 0..reader.signal_streams_count()? {
///         println!(
///             "stream {i}: {} channels at {} Hz",
///             reader.signal_channels_count(i)?,
///             reader.signal_sampling_rate(i)?,
///         );
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct BlackrockReader {
    base_path: PathBuf,
    nsx_sources: Vec<(u8, ByteSource)>,
    nev_source: Option<ByteSource>,
    pub(crate) nev: Option<NevFile>,
    header: Option<RecordingHeader>,
}

impl BlackrockReader {
    /// Open every recording file sharing the base name of `path`.
    ///
    /// A recognized extension (`.ns1`-`.ns9`, `.nev`) on `path` is ignored,
    /// so any of a recording's files names the whole recording.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_filtered(path.as_ref(), None)
    }

    /// Open only the numbered NSx file (plus the `.nev` file when present).
    ///
    /// Useful when a recording carries several sampling groups and only one
    /// is wanted.
    pub fn open_single(path: impl AsRef<Path>, nsx_number: u8) -> Result<Self> {
        Self::open_filtered(path.as_ref(), Some(nsx_number))
    }

    fn open_filtered(path: &Path, only: Option<u8>) -> Result<Self> {
        let base_path = strip_known_extension(path);

        let mut nsx_sources = Vec::new();
        for n in 1..=9u8 {
            if only.is_some_and(|o| o != n) {
                continue;
            }
            let candidate = sibling(&base_path, &format!("ns{n}"));
            if candidate.exists() {
                nsx_sources.push((n, ByteSource::open(&candidate)?));
            }
        }

        let nev_path = sibling(&base_path, "nev");
        let nev_source = if nev_path.exists() {
            Some(ByteSource::open(&nev_path)?)
        } else {
            None
        };

        if nsx_sources.is_empty() && nev_source.is_none() {
            return Err(BlackrockError::NoDataFiles(
                base_path.display().to_string(),
            ));
        }

        Ok(BlackrockReader {
            base_path,
            nsx_sources,
            nev_source,
            nev: None,
            header: None,
        })
    }

    /// Base path of the recording (without extension).
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Parse all file headers, scan packet/section streams and build the
    /// recording's [`RecordingHeader`].
    ///
    /// Re-parsing an already parsed reader rebuilds an identical header;
    /// the recording bytes are never mutated.
    pub fn parse_header(&mut self) -> Result<()> {
        let mut nsx_files = Vec::with_capacity(self.nsx_sources.len());
        let mut file_sections: Vec<Vec<DataSection>> = Vec::with_capacity(self.nsx_sources.len());

        for (n, source) in &self.nsx_sources {
            let cursor = source.cursor();
            let file = parse_nsx_header(cursor)?;
            let mut sections = scan_sections(cursor, &file)?;
            if file.spec_major >= 3 && crate::nsx::is_packet_per_sample(&sections) {
                let expected_gap = file.timestamp_resolution as f64 * file.period as f64
                    / SAMPLE_CLOCK_HZ as f64;
                sections =
                    coalesce_ptp_runs(&sections, file.section_header_bytes(), expected_gap);
            }
            debug!(
                "ns{n}: spec {}.{}, {} channels at {} Hz, {} sections",
                file.spec_major,
                file.spec_minor,
                file.channels.len(),
                file.sampling_rate(),
                sections.len()
            );
            nsx_files.push(file);
            file_sections.push(sections);
        }

        let mut nev_file = None;
        let mut scan = PacketScan::default();
        if let Some(source) = &self.nev_source {
            let file = parse_nev_header(source.cursor())?;
            scan = scan_packets(source.cursor(), &file)?;
            nev_file = Some(file);
        }

        let time_base = decide_time_base(&nsx_files, nev_file.as_ref());
        if time_base.is_hardware_clock() {
            scan.drop_zero_clock_packets();
        }

        let signal_streams = build_streams(&self.nsx_sources, &nsx_files);
        let segments = build_segments(&nsx_files, &file_sections, &scan, time_base);
        let spike_channels = build_spike_channels(scan.spikes, nev_file.as_ref());
        let event_channels = build_event_channels(scan.digital, scan.comments, nev_file.as_ref());

        let time_origin = nsx_files
            .first()
            .map(|f| f.time_origin)
            .or_else(|| nev_file.as_ref().map(|f| f.time_origin))
            .unwrap_or_default();

        self.nev = nev_file;
        self.header = Some(RecordingHeader {
            time_base,
            time_origin,
            signal_streams,
            spike_channels,
            event_channels,
            blocks: vec![Block { segments }],
        });
        Ok(())
    }

    /// The parsed header model.
    pub fn header(&self) -> Result<&RecordingHeader> {
        self.header.as_ref().ok_or(BlackrockError::NotParsed)
    }

    pub fn signal_streams_count(&self) -> Result<usize> {
        Ok(self.header()?.signal_streams.len())
    }

    pub fn signal_channels_count(&self, stream_index: usize) -> Result<usize> {
        Ok(self.header()?.stream(stream_index)?.channel_count())
    }

    pub fn signal_sampling_rate(&self, stream_index: usize) -> Result<f64> {
        Ok(self.header()?.stream(stream_index)?.sampling_rate)
    }

    pub fn spike_channels_count(&self) -> Result<usize> {
        Ok(self.header()?.spike_channels.len())
    }

    pub fn event_channels_count(&self) -> Result<usize> {
        Ok(self.header()?.event_channels.len())
    }

    pub fn block_count(&self) -> Result<usize> {
        Ok(self.header()?.blocks.len())
    }

    pub fn segment_count(&self, block_index: usize) -> Result<usize> {
        Ok(self.header()?.block(block_index)?.segments.len())
    }

    pub fn segment_t_start(&self, block_index: usize, segment_index: usize) -> Result<f64> {
        Ok(self.header()?.segment(block_index, segment_index)?.t_start)
    }

    pub fn segment_t_stop(&self, block_index: usize, segment_index: usize) -> Result<f64> {
        Ok(self.header()?.segment(block_index, segment_index)?.t_stop)
    }

    pub(crate) fn nsx_source(&self, file_index: usize) -> &ByteSource {
        &self.nsx_sources[file_index].1
    }

    pub(crate) fn nev_source(&self) -> Result<&ByteSource> {
        // Spike/event channels only exist when a NEV file was opened.
        self.nev_source.as_ref().ok_or(BlackrockError::NotParsed)
    }
}

fn sibling(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn strip_known_extension(path: &Path) -> PathBuf {
    let known = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| {
            e == "nev"
                || (e.len() == 3
                    && e.starts_with("ns")
                    && e.as_bytes()[2].is_ascii_digit())
        });
    if known {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

fn decide_time_base(nsx_files: &[NsxFile], nev: Option<&NevFile>) -> TimeBase {
    let mut resolutions: Vec<(u8, u32)> = nsx_files
        .iter()
        .map(|f| (f.spec_major, f.timestamp_resolution))
        .collect();
    if let Some(nev) = nev {
        resolutions.push((nev.spec_major, nev.timestamp_resolution));
    }

    // One regime per recording, decided here and never re-inferred later.
    let hardware = resolutions.iter().any(|&(major, _)| major >= 3);
    if resolutions.iter().any(|&(major, _)| (major >= 3) != hardware) {
        warn!("recording mixes spec 2.x and 3.0 files; using the hardware clock regime");
    }

    let resolution = resolutions
        .iter()
        .filter(|&&(major, _)| (major >= 3) == hardware)
        .map(|&(_, res)| res)
        .max()
        .unwrap_or(SAMPLE_CLOCK_HZ);
    if resolutions
        .iter()
        .any(|&(major, res)| (major >= 3) == hardware && res != resolution)
    {
        warn!("recording files declare differing timestamp resolutions; using {resolution}");
    }

    if hardware {
        TimeBase::HardwareClock { resolution }
    } else {
        TimeBase::SampleTicks { resolution }
    }
}

fn build_streams(sources: &[(u8, ByteSource)], nsx_files: &[NsxFile]) -> Vec<SignalStream> {
    sources
        .iter()
        .zip(nsx_files)
        .enumerate()
        .map(|(file_index, ((n, _), file))| SignalStream {
            id: format!("ns{n}"),
            label: file.label.clone(),
            sampling_rate: file.sampling_rate(),
            channels: file
                .channels
                .iter()
                .map(|c| SignalChannel {
                    electrode_id: c.electrode_id,
                    label: c.label.clone(),
                    units: c.units.clone(),
                    gain: c.gain(),
                    offset: c.offset(),
                })
                .collect(),
            file_index,
        })
        .collect()
}

/// Align per-stream section lists by position into shared segments.
///
/// Streams pause and resume together, so section `k` of every stream belongs
/// to segment `k`; a mismatched section count is reconciled to the minimum.
/// Segment bounds are the min/max of the member sections' time extents.
fn build_segments(
    nsx_files: &[NsxFile],
    file_sections: &[Vec<DataSection>],
    scan: &PacketScan,
    time_base: TimeBase,
) -> Vec<Segment> {
    let mut segments = Vec::new();

    if !nsx_files.is_empty() {
        let min = file_sections.iter().map(Vec::len).min().unwrap_or(0);
        let max = file_sections.iter().map(Vec::len).max().unwrap_or(0);
        if min != max {
            warn!(
                "streams disagree on segment count ({min} vs {max}); \
                 reconciling to {min} shared segments"
            );
        }

        for k in 0..min {
            let mut t_start = f64::INFINITY;
            let mut t_stop = f64::NEG_INFINITY;
            let mut slices = Vec::with_capacity(nsx_files.len());
            for (file, sections) in nsx_files.iter().zip(file_sections) {
                let section = &sections[k];
                let start = section.ticks as f64 / file.timestamp_resolution as f64;
                let stop = start + section.n_samples as f64 / file.sampling_rate();
                t_start = t_start.min(start);
                t_stop = t_stop.max(stop);
                slices.push(SectionSlice {
                    start: section.data_start,
                    stride: section.stride,
                    n_samples: section.n_samples,
                });
            }
            segments.push(Segment {
                t_start,
                t_stop,
                slices,
            });
        }
    }

    if segments.is_empty() {
        // NEV-only recording (or signal files without data): one segment
        // spanning the observed event extent.
        let (t_start, t_stop) = match scan.ticks_extent() {
            Some((lo, hi)) => (
                time_base.ticks_to_seconds(lo),
                time_base.ticks_to_seconds(hi),
            ),
            None => (0.0, 0.0),
        };
        segments.push(Segment {
            t_start,
            t_stop,
            slices: vec![
                SectionSlice {
                    start: 0,
                    stride: 0,
                    n_samples: 0,
                };
                nsx_files.len()
            ],
        });
    }

    segments
}

fn build_spike_channels(
    groups: Vec<crate::nev::SpikeGroup>,
    nev: Option<&NevFile>,
) -> Vec<SpikeChannel> {
    let Some(nev) = nev else {
        return Vec::new();
    };

    groups
        .into_iter()
        .map(|group| {
            let (bytes_per_sample, waveform_len, digitization_factor) =
                match nev.waveform_info.get(&group.electrode_id) {
                    Some(info) => {
                        let len = if info.spike_width > 0 {
                            info.spike_width as usize
                        } else {
                            nev.waveform_samples_in_packet(info.bytes_per_sample)
                        };
                        (info.bytes_per_sample, len, info.digitization_factor)
                    }
                    None => {
                        warn!(
                            "spike packets observed for electrode {} without a NEUEVWAV \
                             declaration; deriving waveform length from the packet size",
                            group.electrode_id
                        );
                        (2, nev.waveform_samples_in_packet(2), 0)
                    }
                };
            SpikeChannel {
                name: format!("ch{}#{}", group.electrode_id, group.unit_id),
                electrode_id: group.electrode_id,
                unit_id: group.unit_id,
                waveform_len,
                digitization_factor,
                bytes_per_sample,
                waveform_offset: nev.waveform_offset(),
                packets: group.packets,
            }
        })
        .collect()
}

fn build_event_channels(
    digital: Vec<crate::header::PacketRef>,
    comments: Vec<crate::header::PacketRef>,
    nev: Option<&NevFile>,
) -> Vec<EventChannel> {
    if nev.is_none() {
        return Vec::new();
    }
    vec![
        EventChannel {
            name: EventKind::DigitalPort.name().to_string(),
            kind: EventKind::DigitalPort,
            packets: digital,
        },
        EventChannel {
            name: EventKind::Comment.name().to_string(),
            kind: EventKind::Comment,
            packets: comments,
        },
    ]
}
