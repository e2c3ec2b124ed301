use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::SessionRecord;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GoalProgress {
    pub goal: u8,
    pub progress: u32,
    pub met: bool,
}

/// Today's good-posture share against the daily goal. Dates are UTC calendar days.
pub fn goal_progress(records: &[SessionRecord], goal_percent: u8, today: NaiveDate) -> GoalProgress {
    let (total, good) = records
        .iter()
        .filter(|r| r.date.date_naive() == today)
        .fold((0u64, 0u64), |(total, good), r| {
            (total + r.duration_secs, good + r.good_duration_secs)
        });

    let progress = if total > 0 {
        (good as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };

    GoalProgress {
        goal: goal_percent,
        progress,
        met: progress >= u32::from(goal_percent),
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TrackedDay {
    pub date: NaiveDate,
    pub tracked: bool,
}

/// One entry per day for the `days` days ending with `today`, oldest first.
pub fn tracked_days(records: &[SessionRecord], days: u32, today: NaiveDate) -> Vec<TrackedDay> {
    (0..i64::from(days))
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            TrackedDay {
                date,
                tracked: records.iter().any(|r| r.date.date_naive() == date),
            }
        })
        .collect()
}
