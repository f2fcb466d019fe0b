use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
    second: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub fn new(hour: u32, minute: u32, second: u32) -> EngineResult<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(EngineError::InvalidTimeOfDay {
                hour,
                minute,
                second,
            });
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second().min(59) as u8,
        }
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    pub fn second(&self) -> u32 {
        u32::from(self.second)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for TimeOfDay {
    type Err = EngineError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidTimeText {
            input: input.to_string(),
        };

        let text = input.trim();
        let upper = text.to_ascii_uppercase();
        let (clock, pm) = if upper.ends_with("AM") {
            (text[..text.len() - 2].trim_end(), Some(false))
        } else if upper.ends_with("PM") {
            (text[..text.len() - 2].trim_end(), Some(true))
        } else {
            (text, None)
        };

        let parts = clock.split(':').collect::<Vec<_>>();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }
        let hour = parse_field(parts[0], 1..=2).ok_or_else(invalid)?;
        let minute = parse_field(parts[1], 2..=2).ok_or_else(invalid)?;
        let second = match parts.get(2) {
            Some(raw) => parse_field(raw, 2..=2).ok_or_else(invalid)?,
            None => 0,
        };

        let hour = match pm {
            None => hour,
            Some(_) if !(1..=12).contains(&hour) => return Err(invalid()),
            Some(is_pm) => hour % 12 + if is_pm { 12 } else { 0 },
        };

        Self::new(hour, minute, second)
    }
}

fn parse_field(raw: &str, digits: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !digits.contains(&raw.len()) || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl TryFrom<String> for TimeOfDay {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}
