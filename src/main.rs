use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDateTime;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use betterwatch::alarm::model::load_alarm_seed;
use betterwatch::alarm::trigger::AlarmFired;
use betterwatch::clock::ClockSource;
use betterwatch::diagnostics;
use betterwatch::engine::{WatchEngine, WatchSnapshot, start_ticking};
use betterwatch::format::{TimeDisplayMode, format_time};
use betterwatch::stopwatch::StopwatchPhase;
use betterwatch::time_of_day::TimeOfDay;
use betterwatch::time_provider::{TimingSourceKind, select_provider};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTimingSource {
    System,
    Offset,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFormat {
    #[value(name = "12")]
    Hour12,
    #[value(name = "24")]
    Hour24,
}

impl From<CliFormat> for TimeDisplayMode {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Hour12 => TimeDisplayMode::Hour12,
            CliFormat::Hour24 => TimeDisplayMode::Hour24,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "betterwatch",
    version,
    about = "Terminal watch with daily alarms and a stopwatch"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliFormat::Hour12)]
    format: CliFormat,

    /// Alarm time: HH:MM, HH:MM:SS or h:MM[:SS] AM|PM. Repeatable.
    #[arg(long = "alarm")]
    alarms: Vec<String>,

    /// JSON file with alarms to create at startup. Never written.
    #[arg(long = "alarm-file")]
    alarm_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CliTimingSource::System)]
    timing_source: CliTimingSource,

    /// Local datetime the offset clock starts at, e.g. 2026-02-07T07:29:59.5
    #[arg(long)]
    start_at: Option<String>,

    /// Exit after this many ticks; 0 runs until interrupted.
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    #[arg(long)]
    stopwatch: bool,

    /// Record a stopwatch split every N ticks while it runs.
    #[arg(long, default_value_t = 0)]
    split_every: u32,

    #[arg(long)]
    json: bool,

    #[arg(long)]
    diagnostics: bool,

    /// Tracing filter, overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Serialize)]
struct TickReport<'a> {
    tick: u32,
    snapshot: &'a WatchSnapshot,
    fired: &'a [AlarmFired],
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let kind = match (cli.timing_source, cli.start_at.as_deref()) {
        (CliTimingSource::System, None) => TimingSourceKind::System,
        (CliTimingSource::System, Some(_)) => {
            bail!("--start-at requires --timing-source offset")
        }
        (CliTimingSource::Offset, Some(raw)) => TimingSourceKind::Offset {
            start: parse_local_datetime(raw)?,
        },
        (CliTimingSource::Offset, None) => {
            bail!("--timing-source offset requires --start-at")
        }
    };

    let mut seed_times = Vec::with_capacity(cli.alarms.len());
    for raw in &cli.alarms {
        let time = raw
            .parse::<TimeOfDay>()
            .with_context(|| format!("invalid --alarm value '{raw}'"))?;
        seed_times.push(time);
    }
    let seed_file = cli
        .alarm_file
        .as_ref()
        .map(|path| {
            load_alarm_seed(path).with_context(|| format!("failed to load {}", path.display()))
        })
        .transpose()?;

    let selected = select_provider(kind);
    if cli.diagnostics {
        let ticks = if cli.ticks == 0 { 3 } else { cli.ticks };
        return diagnostics::run_diagnostics(&selected, ticks);
    }

    let mode = TimeDisplayMode::from(cli.format);
    let mut engine = WatchEngine::new(selected.provider.clone());
    engine.set_format(mode);
    if let Some(config) = seed_file {
        for seed in config.alarms {
            engine
                .add_alarm_with_state(seed.time, seed.active)
                .context("failed to seed alarm from file")?;
        }
    }
    for time in seed_times {
        engine
            .add_alarm(time)
            .with_context(|| format!("failed to add alarm {time}"))?;
    }
    if cli.stopwatch {
        engine.stopwatch_mut().start()?;
    }

    let (alarm_tx, alarm_rx) = mpsc::channel::<AlarmFired>();
    engine.subscribe(alarm_tx);

    if !cli.json {
        print_snapshot(&engine.snapshot());
    }

    let engine = Arc::new(Mutex::new(engine));
    let clock = ClockSource::new(selected.provider);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<WatchSnapshot>();
    let handle = start_ticking(Arc::clone(&engine), &clock, move |snapshot, outcome| {
        if outcome.failed > 0 {
            warn!(failed = outcome.failed, "some alarms could not be marked fired");
        }
        let _ = snapshot_tx.send(snapshot.clone());
    })
    .context("failed to start clock")?;

    let mut tick = 0u32;
    for snapshot in snapshot_rx.iter() {
        tick += 1;
        let fired = alarm_rx.try_iter().collect::<Vec<_>>();
        if cli.json {
            let report = TickReport {
                tick,
                snapshot: &snapshot,
                fired: &fired,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_snapshot(&snapshot);
            for event in &fired {
                println!(
                    "ALARM {} {} fired",
                    event.alarm_id,
                    format_time(event.time, mode)
                );
            }
        }

        if cli.split_every > 0
            && tick % cli.split_every == 0
            && snapshot.stopwatch_phase == StopwatchPhase::Running
        {
            let mut guard = match engine.lock() {
                Ok(guard) => guard,
                Err(_) => bail!("engine state lock poisoned"),
            };
            guard.stopwatch_mut().split()?;
        }

        if cli.ticks > 0 && tick >= cli.ticks {
            break;
        }
    }

    handle.cancel();
    Ok(())
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid --log-level '{level}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
    Ok(())
}

fn print_snapshot(snapshot: &WatchSnapshot) {
    let armed = snapshot.alarms.iter().filter(|alarm| alarm.active).count();
    println!(
        "{}  | stopwatch {} ({}) | alarms {}/{} active",
        snapshot.current_time_display,
        snapshot.stopwatch_display,
        snapshot.stopwatch_phase,
        armed,
        snapshot.alarms.len()
    );
    if let Some(lap) = snapshot.laps.last() {
        println!("  lap {}: {}", snapshot.laps.len(), lap);
    }
}

fn parse_local_datetime(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| anyhow!("invalid --start-at '{input}', expected YYYY-MM-DDTHH:MM:SS[.fff]"))
}
