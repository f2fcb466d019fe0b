use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::time_provider::{TimeProvider, TimeSample};

pub struct ManualTimeProvider {
    state: Mutex<ManualState>,
}

struct ManualState {
    local: NaiveDateTime,
    monotonic: Duration,
}

impl ManualTimeProvider {
    pub const LABEL: &'static str = "MANUAL";

    pub fn new(start_local: NaiveDateTime) -> Self {
        Self {
            state: Mutex::new(ManualState {
                local: start_local,
                monotonic: Duration::ZERO,
            }),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.monotonic += by;
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::TimeDelta::MAX);
        state.local = state
            .local
            .checked_add_signed(delta)
            .unwrap_or(NaiveDateTime::MAX);
    }

    pub fn set_local(&self, local: NaiveDateTime) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.local = local;
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> TimeSample {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        TimeSample {
            local: state.local,
            monotonic: state.monotonic,
            source: Self::LABEL,
        }
    }

    fn label(&self) -> &'static str {
        Self::LABEL
    }
}
