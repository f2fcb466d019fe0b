use thiserror::Error;

use crate::alarm::model::AlarmId;
use crate::stopwatch::StopwatchPhase;
use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum EngineError {
    #[error("an alarm at {time} already exists")]
    DuplicateAlarm { time: TimeOfDay },

    #[error("alarm {id} not found")]
    NotFound { id: AlarmId },

    #[error("stopwatch cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: StopwatchPhase,
    },

    #[error("time of day out of range: {hour}:{minute}:{second}")]
    InvalidTimeOfDay { hour: u32, minute: u32, second: u32 },

    #[error("invalid time '{input}', expected HH:MM[:SS] or h:MM[:SS] AM|PM")]
    InvalidTimeText { input: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
