use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::SessionRecord;

const RECENT_SESSION_LIMIT: usize = 10;
const SCORE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub id: String,
    pub date: DateTime<Utc>,
    pub score: u32,
    pub duration_secs: u64,
}

impl From<&SessionRecord> for HistoryPoint {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date,
            score: record.score(),
            duration_secs: record.duration_secs,
        }
    }
}

/// Aggregate over every stored session.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureStats {
    pub total_sessions: usize,
    pub total_duration_secs: u64,
    pub total_good_secs: u64,
    /// Good time over total time, rounded percent.
    pub good_posture_percentage: u32,
    /// Mean of per-session scores, rounded.
    pub average_score: u32,
    pub last_30_days_score: u32,
    /// Most recent first.
    pub recent_sessions: Vec<HistoryPoint>,
}

fn mean_score<'a>(records: impl Iterator<Item = &'a SessionRecord>) -> u32 {
    let (sum, count) = records.fold((0u64, 0u64), |(sum, count), record| {
        (sum + u64::from(record.score()), count + 1)
    });
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

/// Summarise `records` (any order) as of `now`.
pub fn posture_stats(records: &[SessionRecord], now: DateTime<Utc>) -> PostureStats {
    if records.is_empty() {
        return PostureStats::default();
    }

    let total_duration_secs: u64 = records.iter().map(|r| r.duration_secs).sum();
    let total_good_secs: u64 = records.iter().map(|r| r.good_duration_secs).sum();
    let good_posture_percentage = if total_duration_secs > 0 {
        (total_good_secs as f64 / total_duration_secs as f64 * 100.0).round() as u32
    } else {
        0
    };

    let window_start = now - Duration::days(SCORE_WINDOW_DAYS);
    let last_30_days_score = mean_score(records.iter().filter(|r| r.date >= window_start));

    let mut by_date: Vec<&SessionRecord> = records.iter().collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    let recent_sessions = by_date
        .into_iter()
        .take(RECENT_SESSION_LIMIT)
        .map(HistoryPoint::from)
        .collect();

    PostureStats {
        total_sessions: records.len(),
        total_duration_secs,
        total_good_secs,
        good_posture_percentage,
        average_score: mean_score(records.iter()),
        last_30_days_score,
        recent_sessions,
    }
}

/// Sessions from the last `days` days, oldest first.
pub fn posture_history(records: &[SessionRecord], days: u32, now: DateTime<Utc>) -> Vec<HistoryPoint> {
    let cutoff = now - Duration::days(i64::from(days));
    let mut points: Vec<HistoryPoint> = records
        .iter()
        .filter(|r| r.date >= cutoff)
        .map(HistoryPoint::from)
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}
