use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::time_provider::TimeProvider;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum StopwatchPhase {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for StopwatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopwatchPhase::Idle => f.write_str("idle"),
            StopwatchPhase::Running => f.write_str("running"),
            StopwatchPhase::Paused => f.write_str("paused"),
        }
    }
}

// Elapsed is `accumulated + (now - reference)` while running, never summed per tick.
pub struct StopwatchEngine {
    provider: Arc<dyn TimeProvider>,
    phase: StopwatchPhase,
    reference: Option<Duration>,
    accumulated: Duration,
    laps: Vec<Duration>,
}

impl StopwatchEngine {
    pub fn new(provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            provider,
            phase: StopwatchPhase::Idle,
            reference: None,
            accumulated: Duration::ZERO,
            laps: Vec::new(),
        }
    }

    pub fn phase(&self) -> StopwatchPhase {
        self.phase
    }

    pub fn start(&mut self) -> EngineResult<()> {
        self.require("start", StopwatchPhase::Idle)?;
        self.reference = Some(self.monotonic_now());
        self.accumulated = Duration::ZERO;
        self.phase = StopwatchPhase::Running;
        debug!("stopwatch started");
        Ok(())
    }

    pub fn pause(&mut self) -> EngineResult<()> {
        self.require("pause", StopwatchPhase::Running)?;
        self.accumulated += self.running_span();
        self.reference = None;
        self.phase = StopwatchPhase::Paused;
        debug!(elapsed_ms = self.accumulated.as_millis() as u64, "stopwatch paused");
        Ok(())
    }

    pub fn resume(&mut self) -> EngineResult<()> {
        self.require("resume", StopwatchPhase::Paused)?;
        self.reference = Some(self.monotonic_now());
        self.phase = StopwatchPhase::Running;
        debug!("stopwatch resumed");
        Ok(())
    }

    pub fn split(&mut self) -> EngineResult<Duration> {
        self.require("split", StopwatchPhase::Running)?;
        let elapsed = self.elapsed();
        self.laps.push(elapsed);
        debug!(lap = self.laps.len(), elapsed_ms = elapsed.as_millis() as u64, "stopwatch split");
        Ok(elapsed)
    }

    pub fn stop(&mut self) {
        self.phase = StopwatchPhase::Idle;
        self.reference = None;
        self.accumulated = Duration::ZERO;
        self.laps.clear();
        debug!("stopwatch reset");
    }

    pub fn reset(&mut self) {
        self.stop();
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_span()
    }

    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    pub fn lap_durations(&self) -> Vec<Duration> {
        let mut previous = Duration::ZERO;
        self.laps
            .iter()
            .map(|split| {
                let lap = split.saturating_sub(previous);
                previous = *split;
                lap
            })
            .collect()
    }

    fn running_span(&self) -> Duration {
        match (self.phase, self.reference) {
            (StopwatchPhase::Running, Some(reference)) => {
                self.monotonic_now().saturating_sub(reference)
            }
            _ => Duration::ZERO,
        }
    }

    fn monotonic_now(&self) -> Duration {
        self.provider.now().monotonic
    }

    fn require(&self, operation: &'static str, expected: StopwatchPhase) -> EngineResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }
}
