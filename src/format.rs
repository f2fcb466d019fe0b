use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub enum TimeDisplayMode {
    Hour24,
    #[default]
    Hour12,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FormattedTime {
    pub text: String,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub period: Option<Meridiem>,
}

pub fn format_time_of_day(time: TimeOfDay, mode: TimeDisplayMode) -> FormattedTime {
    match mode {
        TimeDisplayMode::Hour24 => FormattedTime {
            text: format!(
                "{:02}:{:02}:{:02}",
                time.hour(),
                time.minute(),
                time.second()
            ),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            period: None,
        },
        TimeDisplayMode::Hour12 => {
            let period = if time.hour() >= 12 {
                Meridiem::Pm
            } else {
                Meridiem::Am
            };
            let hour12 = match time.hour() % 12 {
                0 => 12,
                hour => hour,
            };
            FormattedTime {
                text: format!(
                    "{}:{:02}:{:02} {}",
                    hour12,
                    time.minute(),
                    time.second(),
                    period
                ),
                hour: hour12,
                minute: time.minute(),
                second: time.second(),
                period: Some(period),
            }
        }
    }
}

pub fn format_time(time: TimeOfDay, mode: TimeDisplayMode) -> String {
    format_time_of_day(time, mode).text
}

/// Stopwatch display, `HH:MM:SS.mmm`. Hours keep growing past 99.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn tod(hour: u32, minute: u32, second: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute, second).expect("valid time")
    }

    #[test]
    fn formats_24_hour_zero_padded() {
        assert_eq!(format_time(tod(0, 0, 0), TimeDisplayMode::Hour24), "00:00:00");
        assert_eq!(format_time(tod(7, 5, 9), TimeDisplayMode::Hour24), "07:05:09");
        assert_eq!(format_time(tod(23, 59, 59), TimeDisplayMode::Hour24), "23:59:59");
    }

    #[test]
    fn midnight_and_noon_both_show_twelve() {
        let midnight = format_time_of_day(tod(0, 0, 0), TimeDisplayMode::Hour12);
        assert_eq!(midnight.text, "12:00:00 AM");
        assert_eq!(midnight.hour, 12);
        assert_eq!(midnight.period, Some(Meridiem::Am));

        let noon = format_time_of_day(tod(12, 0, 0), TimeDisplayMode::Hour12);
        assert_eq!(noon.text, "12:00:00 PM");
        assert_eq!(noon.hour, 12);
        assert_eq!(noon.period, Some(Meridiem::Pm));
    }

    #[test]
    fn morning_alarm_reads_without_leading_zero() {
        assert_eq!(format_time(tod(7, 30, 0), TimeDisplayMode::Hour12), "7:30:00 AM");
        assert_eq!(format_time(tod(19, 30, 0), TimeDisplayMode::Hour12), "7:30:00 PM");
    }

    #[test]
    fn elapsed_display_carries_millis_and_long_hours() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00.000");
        assert_eq!(format_elapsed(Duration::from_millis(9_000)), "00:00:09.000");
        assert_eq!(format_elapsed(Duration::from_millis(3_723_456)), "01:02:03.456");
        assert_eq!(
            format_elapsed(Duration::from_secs(100 * 3_600)),
            "100:00:00.000"
        );
    }

    proptest! {
        #[test]
        fn both_modes_reparse_to_the_same_time(hour in 0u32..24, minute in 0u32..60, second in 0u32..60) {
            let time = tod(hour, minute, second);
            let h24: TimeOfDay = format_time(time, TimeDisplayMode::Hour24).parse().expect("24h text");
            let h12: TimeOfDay = format_time(time, TimeDisplayMode::Hour12).parse().expect("12h text");
            prop_assert_eq!(h24, time);
            prop_assert_eq!(h12, time);
        }

        #[test]
        fn twelve_hour_fields_stay_in_range(hour in 0u32..24, minute in 0u32..60) {
            let formatted = format_time_of_day(tod(hour, minute, 0), TimeDisplayMode::Hour12);
            prop_assert!((1..=12).contains(&formatted.hour));
            let expected = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
            prop_assert_eq!(formatted.period, Some(expected));
        }
    }
}
