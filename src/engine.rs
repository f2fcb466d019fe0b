use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::alarm::model::{Alarm, AlarmId};
use crate::alarm::registry::AlarmRegistry;
use crate::alarm::trigger::{AlarmSink, AlarmStatus, AlarmTrigger, TickOutcome, alarm_status};
use crate::clock::{ClockSource, TickHandle};
use crate::error::EngineResult;
use crate::format::{FormattedTime, TimeDisplayMode, format_elapsed, format_time, format_time_of_day};
use crate::stopwatch::{StopwatchEngine, StopwatchPhase};
use crate::time_of_day::TimeOfDay;
use crate::time_provider::{TimeProvider, TimeSample};

#[derive(Debug, Clone, Serialize)]
pub struct AlarmView {
    pub id: AlarmId,
    pub display: String,
    pub active: bool,
    pub status: AlarmStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchSnapshot {
    pub current_time_display: String,
    pub current_time: FormattedTime,
    pub date: NaiveDate,
    pub format: TimeDisplayMode,
    pub alarms: Vec<AlarmView>,
    pub stopwatch_phase: StopwatchPhase,
    pub stopwatch_display: String,
    pub laps: Vec<String>,
}

pub struct WatchEngine {
    provider: Arc<dyn TimeProvider>,
    mode: TimeDisplayMode,
    registry: AlarmRegistry,
    trigger: AlarmTrigger,
    stopwatch: StopwatchEngine,
    sinks: Vec<Box<dyn AlarmSink>>,
    latest: TimeSample,
}

impl WatchEngine {
    pub fn new(provider: Arc<dyn TimeProvider>) -> Self {
        let latest = provider.now();
        Self {
            stopwatch: StopwatchEngine::new(Arc::clone(&provider)),
            provider,
            mode: TimeDisplayMode::default(),
            registry: AlarmRegistry::new(),
            trigger: AlarmTrigger::new(),
            sinks: Vec::new(),
            latest,
        }
    }

    pub fn add_alarm(&mut self, time: TimeOfDay) -> EngineResult<Alarm> {
        self.registry.add(time)
    }

    pub fn add_alarm_with_state(&mut self, time: TimeOfDay, active: bool) -> EngineResult<Alarm> {
        self.registry.add_with_state(time, active)
    }

    pub fn toggle_alarm(&mut self, id: AlarmId) -> EngineResult<bool> {
        self.registry.toggle(id).map(|alarm| alarm.active)
    }

    pub fn remove_alarm(&mut self, id: AlarmId) -> EngineResult<Alarm> {
        self.registry.remove(id)
    }

    pub fn alarms(&self) -> &[Alarm] {
        self.registry.list()
    }

    pub fn set_format(&mut self, mode: TimeDisplayMode) {
        if self.mode != mode {
            info!(?mode, "display format changed");
        }
        self.mode = mode;
    }

    pub fn format(&self) -> TimeDisplayMode {
        self.mode
    }

    pub fn stopwatch(&self) -> &StopwatchEngine {
        &self.stopwatch
    }

    pub fn stopwatch_mut(&mut self) -> &mut StopwatchEngine {
        &mut self.stopwatch
    }

    pub fn subscribe<S>(&mut self, sink: S)
    where
        S: AlarmSink + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    pub fn on_tick(&mut self, sample: TimeSample) -> TickOutcome {
        self.latest = sample;
        let outcome = self.trigger.tick(&mut self.registry, &sample);
        for event in &outcome.fired {
            for sink in &mut self.sinks {
                sink.on_alarm_fired(event);
            }
        }
        outcome
    }

    pub fn refresh(&mut self) {
        self.latest = self.provider.now();
    }

    pub fn latest_sample(&self) -> &TimeSample {
        &self.latest
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        let today = self.latest.date();
        let current_time = format_time_of_day(self.latest.time_of_day(), self.mode);
        let alarms = self
            .registry
            .list()
            .iter()
            .map(|alarm| AlarmView {
                id: alarm.id,
                display: format_time(alarm.time, self.mode),
                active: alarm.active,
                status: alarm_status(alarm, today),
            })
            .collect();

        WatchSnapshot {
            current_time_display: current_time.text.clone(),
            current_time,
            date: today,
            format: self.mode,
            alarms,
            stopwatch_phase: self.stopwatch.phase(),
            stopwatch_display: format_elapsed(self.stopwatch.elapsed()),
            laps: self.stopwatch.laps().iter().copied().map(format_elapsed).collect(),
        }
    }
}

pub fn start_ticking<F>(
    engine: Arc<Mutex<WatchEngine>>,
    clock: &ClockSource,
    mut publish: F,
) -> io::Result<TickHandle>
where
    F: FnMut(&WatchSnapshot, &TickOutcome) + Send + 'static,
{
    clock.start(move |sample| {
        let (snapshot, outcome) = {
            let mut guard = match engine.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("engine state lock poisoned; tick skipped");
                    return;
                }
            };
            let outcome = guard.on_tick(sample);
            (guard.snapshot(), outcome)
        };
        publish(&snapshot, &outcome);
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::alarm::trigger::AlarmFired;
    use crate::time_manual::ManualTimeProvider;

    fn start_at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 7)
            .expect("date")
            .and_hms_opt(hour, minute, second)
            .expect("time")
    }

    fn tod(hour: u32, minute: u32, second: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute, second).expect("valid time")
    }

    #[test]
    fn twelve_hour_alarm_display_and_inactive_alarm_stays_silent() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(7, 29, 58)));
        let mut engine = WatchEngine::new(clock.clone());
        let alarm = engine.add_alarm(tod(7, 30, 0)).expect("add");

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.alarms[0].display, "7:30:00 AM");
        assert_eq!(snapshot.current_time_display, "7:29:58 AM");

        assert!(!engine.toggle_alarm(alarm.id).expect("toggle"));
        assert_eq!(engine.alarms().len(), 1);

        for _ in 0..4 {
            clock.advance(Duration::from_secs(1));
            let outcome = engine.on_tick(clock.now());
            assert!(outcome.fired.is_empty());
        }
        assert_eq!(engine.snapshot().alarms[0].status, AlarmStatus::Disabled);
    }

    #[test]
    fn display_starts_in_twelve_hour_mode() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(19, 5, 0)));
        let mut engine = WatchEngine::new(clock);
        assert_eq!(engine.format(), TimeDisplayMode::Hour12);
        assert_eq!(engine.snapshot().current_time_display, "7:05:00 PM");

        engine.set_format(TimeDisplayMode::Hour24);
        assert_eq!(engine.format(), TimeDisplayMode::Hour24);
        assert_eq!(engine.snapshot().current_time_display, "19:05:00");
    }

    #[test]
    fn fired_alarms_reach_every_sink() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(6, 59, 59)));
        let mut engine = WatchEngine::new(clock.clone());
        let alarm = engine.add_alarm(tod(7, 0, 0)).expect("add");

        let (tx, rx) = mpsc::channel::<AlarmFired>();
        engine.subscribe(tx);
        let (tx2, rx2) = mpsc::channel::<AlarmId>();
        engine.subscribe(move |event: &AlarmFired| {
            let _ = tx2.send(event.alarm_id);
        });

        clock.advance(Duration::from_secs(1));
        engine.on_tick(clock.now());
        clock.advance(Duration::from_millis(400));
        engine.on_tick(clock.now());

        assert_eq!(rx.try_iter().map(|event| event.alarm_id).collect::<Vec<_>>(), vec![alarm.id]);
        assert_eq!(rx2.try_iter().collect::<Vec<_>>(), vec![alarm.id]);
        assert_eq!(engine.snapshot().alarms[0].status, AlarmStatus::FiredToday);
    }

    #[test]
    fn snapshot_tracks_stopwatch_and_laps() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(12, 0, 0)));
        let mut engine = WatchEngine::new(clock.clone());
        engine.stopwatch_mut().start().expect("start");
        clock.advance(Duration::from_millis(1_250));
        engine.stopwatch_mut().split().expect("split");
        clock.advance(Duration::from_millis(750));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.stopwatch_phase, StopwatchPhase::Running);
        assert_eq!(engine.stopwatch().elapsed(), Duration::from_secs(2));
        assert_eq!(snapshot.stopwatch_display, "00:00:02.000");
        assert_eq!(snapshot.laps, vec!["00:00:01.250".to_string()]);

        engine.stopwatch_mut().stop();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.stopwatch_phase, StopwatchPhase::Idle);
        assert!(snapshot.laps.is_empty());
    }

    #[test]
    fn remove_and_duplicate_errors_surface_to_caller() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(12, 0, 0)));
        let mut engine = WatchEngine::new(clock);
        let alarm = engine.add_alarm_with_state(tod(8, 0, 0), false).expect("add");
        assert!(engine.add_alarm(tod(8, 0, 0)).is_err());
        engine.remove_alarm(alarm.id).expect("remove");
        assert!(engine.remove_alarm(alarm.id).is_err());
        assert!(engine.alarms().is_empty());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let clock = Arc::new(ManualTimeProvider::new(start_at(18, 5, 0)));
        let mut engine = WatchEngine::new(clock.clone());
        engine.add_alarm(tod(19, 0, 0)).expect("add");
        clock.advance(Duration::from_secs(5));
        engine.refresh();
        assert_eq!(engine.latest_sample().local, start_at(18, 5, 5));

        let json = serde_json::to_value(engine.snapshot()).expect("serialize");
        assert_eq!(json["current_time_display"], "6:05:05 PM");
        assert_eq!(json["current_time"]["period"], "PM");
        assert_eq!(json["alarms"][0]["display"], "7:00:00 PM");
        assert_eq!(json["alarms"][0]["status"], "Armed");
        assert_eq!(json["stopwatch_phase"], "Idle");
    }

    #[test]
    fn ticking_engine_publishes_snapshots() {
        let clock = ClockSource::new(Arc::new(crate::time_software::SystemTimeProvider::new()));
        let engine = Arc::new(Mutex::new(WatchEngine::new(clock.provider())));
        let (tx, rx) = mpsc::channel::<WatchSnapshot>();
        let handle = start_ticking(Arc::clone(&engine), &clock, move |snapshot, _| {
            let _ = tx.send(snapshot.clone());
        })
        .expect("start ticking");

        let snapshot = rx.recv_timeout(Duration::from_secs(3)).expect("snapshot");
        handle.cancel();
        assert_eq!(snapshot.format, TimeDisplayMode::Hour12);
        assert!(snapshot.current_time.period.is_some());
        let display = &snapshot.current_time_display;
        assert!(display.ends_with(" AM") || display.ends_with(" PM"));
    }

    #[test]
    fn poisoned_engine_lock_skips_ticks() {
        let clock = ClockSource::new(Arc::new(crate::time_software::SystemTimeProvider::new()));
        let engine = Arc::new(Mutex::new(WatchEngine::new(clock.provider())));
        let poisoner = Arc::clone(&engine);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().expect("lock");
            panic!("poison engine lock");
        })
        .join();
        assert!(engine.is_poisoned());

        let (tx, rx) = mpsc::channel::<WatchSnapshot>();
        let handle = start_ticking(Arc::clone(&engine), &clock, move |snapshot, _| {
            let _ = tx.send(snapshot.clone());
        })
        .expect("start ticking");

        let received = rx.recv_timeout(Duration::from_millis(1_500));
        assert!(handle.is_running());
        handle.cancel();
        assert!(received.is_err());
    }
}
