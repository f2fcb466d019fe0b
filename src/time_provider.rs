use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::time_of_day::TimeOfDay;
use crate::time_software::{OffsetTimeProvider, SystemTimeProvider};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimingSourceKind {
    System,
    Offset { start: NaiveDateTime },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeSample {
    pub local: NaiveDateTime,
    pub monotonic: Duration,
    pub source: &'static str,
}

impl TimeSample {
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_naive_time(self.local.time())
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn subsec_millis(&self) -> u32 {
        (self.local.nanosecond() / 1_000_000).min(999)
    }
}

pub trait TimeProvider: Send + Sync {
    fn now(&self) -> TimeSample;
    fn label(&self) -> &'static str;
}

pub struct SelectedTimeProvider {
    pub provider: Arc<dyn TimeProvider>,
    pub label: &'static str,
    pub note: Option<String>,
}

pub fn select_provider(kind: TimingSourceKind) -> SelectedTimeProvider {
    match kind {
        TimingSourceKind::System => SelectedTimeProvider {
            provider: Arc::new(SystemTimeProvider::new()),
            label: SystemTimeProvider::LABEL,
            note: None,
        },
        TimingSourceKind::Offset { start } => SelectedTimeProvider {
            provider: Arc::new(OffsetTimeProvider::new(start)),
            label: OffsetTimeProvider::LABEL,
            note: Some(format!(
                "Wall clock offset to start at {}",
                start.format("%Y-%m-%d %H:%M:%S%.3f")
            )),
        },
    }
}

/// Delay until the next wall-clock second boundary. Never zero, so a sample
/// taken exactly on a boundary schedules the following second.
pub fn next_tick_delay(sample: &TimeSample) -> Duration {
    Duration::from_millis(u64::from(1_000 - sample.subsec_millis()))
}
