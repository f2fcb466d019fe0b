//! Time-keeping core for a watch face: wall clock ticks, 12/24-hour display,
//! a daily alarm registry with once-per-day firing, and a drift-free
//! stopwatch.

pub mod alarm;
pub mod clock;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod format;
pub mod stopwatch;
pub mod time_manual;
pub mod time_of_day;
pub mod time_provider;
pub mod time_software;

pub use alarm::model::{Alarm, AlarmId};
pub use alarm::registry::AlarmRegistry;
pub use alarm::trigger::{AlarmFired, AlarmSink, AlarmStatus, AlarmTrigger, TickOutcome};
pub use clock::{ClockSource, TickHandle};
pub use engine::{AlarmView, WatchEngine, WatchSnapshot, start_ticking};
pub use error::{EngineError, EngineResult};
pub use format::{TimeDisplayMode, format_elapsed, format_time, format_time_of_day};
pub use stopwatch::{StopwatchEngine, StopwatchPhase};
pub use time_of_day::TimeOfDay;
pub use time_provider::{TimeProvider, TimeSample};
