use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::clock::ClockSource;
use crate::time_provider::{SelectedTimeProvider, TimeSample};

pub struct TickStats {
    total_ticks: u64,
    skipped_seconds: u64,
    offsets_ms: Vec<i64>,
    last_second: Option<i64>,
    offset_histogram: [u64; 6],
}

impl TickStats {
    pub fn new() -> Self {
        Self {
            total_ticks: 0,
            skipped_seconds: 0,
            offsets_ms: Vec::new(),
            last_second: None,
            offset_histogram: [0; 6],
        }
    }

    pub fn record_tick(&mut self, sample: &TimeSample) {
        self.total_ticks += 1;
        let millis = i64::from(sample.subsec_millis());
        let offset = if millis >= 500 { millis - 1_000 } else { millis };
        self.offsets_ms.push(offset);
        self.update_histogram(offset);

        let second = sample.local.and_utc().timestamp() + i64::from(offset < 0);
        if let Some(previous) = self.last_second
            && second > previous + 1
        {
            self.skipped_seconds += (second - previous - 1) as u64;
        }
        self.last_second = Some(second);
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn skipped_seconds(&self) -> u64 {
        self.skipped_seconds
    }

    pub fn mean_offset_ms(&self) -> f64 {
        if self.offsets_ms.is_empty() {
            return 0.0;
        }
        self.offsets_ms.iter().sum::<i64>() as f64 / self.offsets_ms.len() as f64
    }

    pub fn max_abs_offset_ms(&self) -> i64 {
        self.offsets_ms.iter().map(|offset| offset.abs()).max().unwrap_or(0)
    }

    pub fn histogram(&self) -> [u64; 6] {
        self.offset_histogram
    }

    fn update_histogram(&mut self, offset_ms: i64) {
        let abs = offset_ms.abs();
        let bucket = if abs <= 1 {
            0
        } else if abs <= 5 {
            1
        } else if abs <= 10 {
            2
        } else if abs <= 50 {
            3
        } else if abs <= 100 {
            4
        } else {
            5
        };
        self.offset_histogram[bucket] += 1;
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_diagnostics(selected: &SelectedTimeProvider, ticks: u32) -> Result<()> {
    println!("BetterWatch diagnostics");
    println!("Selected timing source: {}", selected.label);
    if let Some(note) = selected.note.as_deref() {
        println!("Note: {note}");
    }
    let first = selected.provider.now();
    println!(
        "Current local time: {}",
        first.local.format("%Y-%m-%d %H:%M:%S%.3f")
    );

    let ticks = ticks.max(1);
    println!("Sampling {ticks} tick(s)...");
    let clock = ClockSource::new(selected.provider.clone());
    let (tx, rx) = mpsc::channel();
    let handle = clock
        .start(move |sample| {
            let _ = tx.send(sample);
        })
        .context("failed to start tick thread")?;

    let mut stats = TickStats::new();
    for _ in 0..ticks {
        let sample = rx
            .recv_timeout(Duration::from_secs(3))
            .context("tick thread stopped delivering ticks")?;
        stats.record_tick(&sample);
    }
    handle.cancel();

    println!("Tick summary:");
    println!("  Ticks: {}", stats.total_ticks());
    println!("  Skipped seconds: {}", stats.skipped_seconds());
    println!("  Mean boundary offset: {:.1} ms", stats.mean_offset_ms());
    println!("  Max boundary offset: {} ms", stats.max_abs_offset_ms());
    println!("  Offset histogram buckets (<=1, <=5, <=10, <=50, <=100, >100 ms):");
    println!("  {:?}", stats.histogram());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample(second: u32, millis: u32) -> TimeSample {
        TimeSample {
            local: NaiveDate::from_ymd_opt(2026, 2, 7)
                .expect("date")
                .and_hms_milli_opt(8, 0, second, millis)
                .expect("time"),
            monotonic: Duration::ZERO,
            source: "TEST",
        }
    }

    #[test]
    fn offsets_are_signed_around_the_boundary() {
        let mut stats = TickStats::new();
        stats.record_tick(&sample(1, 3));
        stats.record_tick(&sample(1, 998));
        assert_eq!(stats.total_ticks(), 2);
        assert_eq!(stats.max_abs_offset_ms(), 3);
        assert!((stats.mean_offset_ms() - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.histogram(), [0, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn gaps_count_as_skipped_seconds() {
        let mut stats = TickStats::new();
        stats.record_tick(&sample(1, 0));
        stats.record_tick(&sample(2, 0));
        stats.record_tick(&sample(5, 120));
        assert_eq!(stats.skipped_seconds(), 2);
        assert_eq!(stats.histogram()[5], 1);
    }
}
