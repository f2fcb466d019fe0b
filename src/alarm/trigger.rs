use std::sync::mpsc::Sender;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::alarm::model::{Alarm, AlarmId};
use crate::alarm::registry::AlarmRegistry;
use crate::time_of_day::TimeOfDay;
use crate::time_provider::TimeSample;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum AlarmStatus {
    Disabled,
    Armed,
    FiredToday,
}

pub fn alarm_status(alarm: &Alarm, today: NaiveDate) -> AlarmStatus {
    if !alarm.active {
        AlarmStatus::Disabled
    } else if alarm.has_fired_on(today) {
        AlarmStatus::FiredToday
    } else {
        AlarmStatus::Armed
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct AlarmFired {
    pub alarm_id: AlarmId,
    pub time: TimeOfDay,
    pub date: NaiveDate,
}

pub trait AlarmSink: Send {
    fn on_alarm_fired(&mut self, event: &AlarmFired);
}

impl AlarmSink for Sender<AlarmFired> {
    fn on_alarm_fired(&mut self, event: &AlarmFired) {
        if self.send(*event).is_err() {
            warn!(id = %event.alarm_id, "alarm listener disconnected");
        }
    }
}

impl<F> AlarmSink for F
where
    F: FnMut(&AlarmFired) + Send,
{
    fn on_alarm_fired(&mut self, event: &AlarmFired) {
        self(event)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub fired: Vec<AlarmFired>,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct AlarmTrigger {
    ticks_evaluated: u64,
}

impl AlarmTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, registry: &mut AlarmRegistry, sample: &TimeSample) -> TickOutcome {
        self.ticks_evaluated += 1;
        let now = sample.time_of_day();
        let today = sample.date();

        let due = registry
            .list()
            .iter()
            .filter(|alarm| alarm.active && alarm.time == now && !alarm.has_fired_on(today))
            .map(|alarm| alarm.id)
            .collect::<Vec<_>>();

        let mut outcome = TickOutcome::default();
        for id in due {
            match registry.mark_fired(id, today) {
                Ok(()) => {
                    info!(%id, time = %now, %today, "alarm fired");
                    outcome.fired.push(AlarmFired {
                        alarm_id: id,
                        time: now,
                        date: today,
                    });
                }
                Err(err) => {
                    warn!(%id, %err, "failed to mark alarm fired");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }

    pub fn ticks_evaluated(&self) -> u64 {
        self.ticks_evaluated
    }
}
