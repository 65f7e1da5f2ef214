// src/types.rs

/// Nominal acquisition clock shared by all spec 2.x files (ticks per second).
///
/// Sampling periods in NSx headers are expressed in ticks of this clock, and
/// spec 2.x packet timestamps count it directly.
pub const SAMPLE_CLOCK_HZ: u32 = 30_000;

/// Resolution of the PTP hardware clock used by spec 3.0 files (ticks per second).
pub const HARDWARE_CLOCK_HZ: u32 = 1_000_000_000;

/// Timestamp regime of a recording, decided once during header parsing.
///
/// Spec 2.x files count ticks of the nominal sample clock; spec 3.0 files
/// carry values of a high-resolution hardware clock whose rate is independent
/// of any stream's sampling rate. Both convert to seconds by dividing by the
/// declared resolution, but segment reconciliation differs per regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBase {
    /// Raw sample ticks at a fixed nominal clock (spec 2.1 - 2.3).
    SampleTicks { resolution: u32 },
    /// High-resolution hardware clock values (spec 3.0, PTP).
    HardwareClock { resolution: u32 },
}

impl TimeBase {
    /// Ticks per second of the underlying clock.
    pub fn resolution(&self) -> u32 {
        match *self {
            TimeBase::SampleTicks { resolution } => resolution,
            TimeBase::HardwareClock { resolution } => resolution,
        }
    }

    /// Convert a raw timestamp to seconds.
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.resolution() as f64
    }

    pub fn is_hardware_clock(&self) -> bool {
        matches!(self, TimeBase::HardwareClock { .. })
    }
}

/// Kind tag of an event channel; decode paths differ per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Digital input port samples; labels are the port value as decimal text.
    DigitalPort,
    /// Free-text annotations; labels are the comment text.
    Comment,
}

impl EventKind {
    /// Channel name used in the header model.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DigitalPort => "digital_input_port",
            EventKind::Comment => "comments",
        }
    }
}

/// Acquisition start time as stored on disk (Windows SYSTEMTIME layout).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeOrigin {
    pub year: u16,
    pub month: u16,
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: u16,
}

impl TimeOrigin {
    pub(crate) fn from_fields(f: [u16; 8]) -> Self {
        TimeOrigin {
            year: f[0],
            month: f[1],
            day_of_week: f[2],
            day: f[3],
            hour: f[4],
            minute: f[5],
            second: f[6],
            millisecond: f[7],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_ticks_conversion() {
        let tb = TimeBase::SampleTicks { resolution: 30_000 };
        assert_eq!(tb.ticks_to_seconds(30_000), 1.0);
        assert_eq!(tb.ticks_to_seconds(15_000), 0.5);
        assert!(!tb.is_hardware_clock());
    }

    #[test]
    fn test_hardware_clock_conversion() {
        let tb = TimeBase::HardwareClock {
            resolution: 1_000_000_000,
        };
        assert_eq!(tb.ticks_to_seconds(2_100_000_000), 2.1);
        assert!(tb.is_hardware_clock());
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::DigitalPort.name(), "digital_input_port");
        assert_eq!(EventKind::Comment.name(), "comments");
    }

    #[test]
    fn test_time_origin_fields() {
        let origin = TimeOrigin::from_fields([2023, 10, 5, 27, 12, 56, 8, 250]);
        assert_eq!(origin.year, 2023);
        assert_eq!(origin.month, 10);
        assert_eq!(origin.day, 27);
        assert_eq!(origin.millisecond, 250);
    }
}
