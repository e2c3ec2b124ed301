//! Webcam posture tracking: keypoint classification, bad-posture alerts and
//! session history.

pub mod audio;
pub mod db;
pub mod frames;
pub mod history;
pub mod models;
pub mod notify;
pub mod posture;
pub mod settings;
pub mod tracker;
mod utils;

use std::{env, fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{debug, info, warn, LevelFilter};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};

use audio::AlertSoundHandle;
use db::Database;
use frames::{parse_input_line, ChannelFrameSource, FrameFeeder, InputMessage};
use history::{format_duration, goal_progress, posture_history, posture_stats, tracked_days};
use notify::{CompositeAlertSink, LogAlertSink, SoundAlertSink};
use settings::SettingsStore;
use tracker::{PostureTracker, TrackerEvent};

const DATA_DIR_ENV: &str = "POSTURA_DATA_DIR";
const DEBUG_ENV: &str = "POSTURA_DEBUG";
const DEFAULT_HISTORY_DAYS: u32 = 7;

#[derive(Debug, PartialEq)]
enum Command {
    Track,
    Report,
    History { days: u32 },
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("track") => Ok(Command::Track),
        Some("report") => Ok(Command::Report),
        Some("history") => {
            let days = match args.get(1) {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid day count: {raw}"))?,
                None => DEFAULT_HISTORY_DAYS,
            };
            Ok(Command::History { days })
        }
        Some(other) => bail!("unknown command `{other}` (expected track, report or history)"),
    }
}

fn data_dir() -> PathBuf {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".postura"),
        None => PathBuf::from(".postura"),
    }
}

fn init_logging() {
    let level = if env::var(DEBUG_ENV).is_ok_and(|value| value == "1") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

pub async fn run() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let data_dir = data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let db = Database::new(data_dir.join("postura.sqlite3"))?;
    info!("Postura using data dir {}", data_dir.display());

    match command {
        Command::Track => track(&settings, db).await,
        Command::Report => print_report(&settings, &db).await,
        Command::History { days } => print_history(&db, days).await,
    }
}

async fn track(settings: &SettingsStore, db: Database) -> Result<()> {
    let audio = AlertSoundHandle::new();
    let alerts = CompositeAlertSink::new()
        .with(Arc::new(LogAlertSink))
        .with(Arc::new(SoundAlertSink::new(
            audio.clone(),
            settings.alert_sound(),
        )));

    // capacity 1: the producer waits for the tracker instead of queueing stale poses
    let (source, feeder) = ChannelFrameSource::new(1);
    let tracker = PostureTracker::new(
        settings.tracker(),
        Box::new(source),
        Arc::new(alerts),
        db.clone(),
    );

    let event_log = tokio::spawn(log_events(tracker.subscribe()));
    tracker.start().await?;
    info!("reading pose frames from stdin");

    let pumped = tokio::select! {
        result = pump_stdin(&tracker, &feeder) => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!("failed to listen for ctrl-c: {err}");
            }
            info!("interrupted");
            Ok(())
        }
    };

    let tracked_secs = tracker.snapshot().await.total_seconds;
    let record = tracker.stop().await?;
    event_log.abort();
    if let Err(err) = audio.stop() {
        warn!("failed to stop audio thread: {err:#}");
    }
    pumped?;

    match &record {
        Some(record) => println!(
            "Session saved: {} tracked, {} in good posture ({}%)",
            format_duration(record.duration_secs),
            format_duration(record.good_duration_secs),
            record.score()
        ),
        None => println!(
            "Session too short to save ({} tracked)",
            format_duration(tracked_secs)
        ),
    }

    let records = db.list_sessions().await?;
    let goal = goal_progress(
        &records,
        settings.daily_goal_percent(),
        Utc::now().date_naive(),
    );
    println!(
        "Today: {}% good posture (goal {}%{})",
        goal.progress,
        goal.goal,
        if goal.met { ", met" } else { "" }
    );
    Ok(())
}

async fn pump_stdin(tracker: &PostureTracker, feeder: &FrameFeeder) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let delivered = match parse_input_line(&line) {
            Ok(None) => true,
            Ok(Some(InputMessage::Frame(frame))) => feeder.send(Ok(frame)).await,
            Ok(Some(InputMessage::Activity { kind })) => {
                tracker.record_activity(kind).await;
                true
            }
            // surfaces in the frame loop as a dropped frame
            Err(err) => feeder.send(Err(err)).await,
        };
        if !delivered {
            warn!("frame source closed, ignoring remaining input");
            break;
        }
    }

    info!("end of input");
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<TrackerEvent>) {
    loop {
        match events.recv().await {
            Ok(TrackerEvent::StatusChanged { status, previous }) => {
                info!("posture: {} (was {})", status.label(), previous.label());
            }
            Ok(TrackerEvent::AlertFired { at }) => info!("posture alert at {}", at.to_rfc3339()),
            Ok(TrackerEvent::SessionCompleted { session }) => {
                debug!("session {} completed", session.id);
            }
            Err(RecvError::Lagged(skipped)) => warn!("event log skipped {skipped} events"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn print_report(settings: &SettingsStore, db: &Database) -> Result<()> {
    let records = db.list_sessions().await?;
    let now = Utc::now();
    let output = serde_json::json!({
        "stats": posture_stats(&records, now),
        "goal": goal_progress(&records, settings.daily_goal_percent(), now.date_naive()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn print_history(db: &Database, days: u32) -> Result<()> {
    let now = Utc::now();
    let records = db
        .list_sessions_since(now - chrono::Duration::days(i64::from(days)))
        .await?;
    let output = serde_json::json!({
        "sessions": posture_history(&records, days, now),
        "trackedDays": tracked_days(&records, days, now.date_naive()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
