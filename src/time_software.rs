use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::time_provider::{TimeProvider, TimeSample};

pub struct SystemTimeProvider {
    monotonic_anchor: Instant,
}

impl SystemTimeProvider {
    pub const LABEL: &'static str = "SYSTEM";

    pub fn new() -> Self {
        Self {
            monotonic_anchor: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> TimeSample {
        TimeSample {
            local: Local::now().naive_local(),
            monotonic: self.monotonic_anchor.elapsed(),
            source: Self::LABEL,
        }
    }

    fn label(&self) -> &'static str {
        Self::LABEL
    }
}

pub struct OffsetTimeProvider {
    start_local: NaiveDateTime,
    monotonic_anchor: Instant,
}

impl OffsetTimeProvider {
    pub const LABEL: &'static str = "OFFSET";

    pub fn new(start_local: NaiveDateTime) -> Self {
        Self {
            start_local,
            monotonic_anchor: Instant::now(),
        }
    }
}

impl TimeProvider for OffsetTimeProvider {
    fn now(&self) -> TimeSample {
        let monotonic = self.monotonic_anchor.elapsed();
        let offset = chrono::Duration::from_std(monotonic).unwrap_or(chrono::TimeDelta::MAX);
        let local = self
            .start_local
            .checked_add_signed(offset)
            .unwrap_or(NaiveDateTime::MAX);
        TimeSample {
            local,
            monotonic,
            source: Self::LABEL,
        }
    }

    fn label(&self) -> &'static str {
        Self::LABEL
    }
}
