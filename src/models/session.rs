//! Finished tracking sessions as handed to the session store.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub duration_secs: u64,
    /// Never exceeds `duration_secs`.
    pub good_duration_secs: u64,
}

impl SessionRecord {
    pub fn new(date: DateTime<Utc>, duration_secs: u64, good_duration_secs: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            // stored with millisecond precision
            date: date.trunc_subsecs(3),
            duration_secs,
            good_duration_secs: good_duration_secs.min(duration_secs),
        }
    }

    /// Share of the session spent in good posture, as a rounded percentage.
    pub fn score(&self) -> u32 {
        if self.duration_secs == 0 {
            return 0;
        }
        (self.good_duration_secs as f64 / self.duration_secs as f64 * 100.0).round() as u32
    }
}
