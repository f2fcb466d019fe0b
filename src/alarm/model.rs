use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct AlarmId(pub(crate) u64);

impl AlarmId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: TimeOfDay,
    pub active: bool,
    pub last_fired_date: Option<NaiveDate>,
}

impl Alarm {
    pub fn has_fired_on(&self, date: NaiveDate) -> bool {
        self.last_fired_date == Some(date)
    }
}

#[derive(Debug, Clone)]
pub struct AlarmSeedConfig {
    pub version: u32,
    pub alarms: Vec<AlarmSeed>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AlarmSeed {
    pub time: TimeOfDay,
    pub active: bool,
}

pub fn load_alarm_seed(path: &Path) -> Result<AlarmSeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read alarm file {}", path.display()))?;
    parse_alarm_seed_text(&content)
}

pub fn parse_alarm_seed_text(content: &str) -> Result<AlarmSeedConfig> {
    let raw = serde_json::from_str::<AlarmSeedFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported alarm file version {}; expected version 1",
            raw.version
        );
    }

    let mut times = HashSet::new();
    let mut alarms = Vec::with_capacity(raw.alarms.len());
    for alarm in raw.alarms {
        if !times.insert(alarm.time) {
            bail!("duplicate alarm time found: {}", alarm.time);
        }
        alarms.push(AlarmSeed {
            time: alarm.time,
            active: alarm.active,
        });
    }

    Ok(AlarmSeedConfig {
        version: raw.version,
        alarms,
    })
}

#[derive(Debug, Deserialize)]
struct AlarmSeedFile {
    version: u32,
    #[serde(default)]
    alarms: Vec<AlarmSeedEntry>,
}

#[derive(Debug, Deserialize)]
struct AlarmSeedEntry {
    time: TimeOfDay,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}
