use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PostureStatus;

use super::timers::{AlertTimer, InactivityMonitor};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackingStatus {
    #[default]
    Disabled,
    Enabled,
}

/// Everything the tracker mutates. Only ever touched under the controller's lock.
#[derive(Default)]
pub struct TrackerState {
    pub tracking: TrackingStatus,
    /// Canonical posture status.
    pub posture: PostureStatus,
    pub total_seconds: u64,
    /// Never exceeds `total_seconds`.
    pub good_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub alert: AlertTimer,
    pub inactivity: InactivityMonitor,
}

/// Consistent read-only view of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub tracking: TrackingStatus,
    pub posture: PostureStatus,
    pub total_seconds: u64,
    pub good_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
}

impl TrackerSnapshot {
    /// Good-posture share of the running session, rounded percent.
    pub fn score(&self) -> u32 {
        if self.total_seconds == 0 {
            return 0;
        }
        (self.good_seconds as f64 / self.total_seconds as f64 * 100.0).round() as u32
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.tracking == TrackingStatus::Enabled
    }

    /// Replace the canonical status. Returns the previous one if it changed.
    pub fn set_posture(&mut self, status: PostureStatus) -> Option<PostureStatus> {
        if self.posture == status {
            return None;
        }
        Some(std::mem::replace(&mut self.posture, status))
    }

    pub fn begin_session(&mut self, started_at: DateTime<Utc>) {
        self.tracking = TrackingStatus::Enabled;
        self.total_seconds = 0;
        self.good_seconds = 0;
        self.started_at = Some(started_at);
        self.alert.reset();
        self.inactivity.stop();
    }

    /// One accounting tick. Good time is counted against the status at this instant.
    pub fn tick(&mut self) {
        self.total_seconds += 1;
        if self.posture == PostureStatus::Good {
            self.good_seconds += 1;
        }
    }

    /// Disable tracking, cancel every timer, and hand back `(total, good)` seconds.
    pub fn finish_session(&mut self) -> (u64, u64) {
        let totals = (self.total_seconds, self.good_seconds);
        self.tracking = TrackingStatus::Disabled;
        self.total_seconds = 0;
        self.good_seconds = 0;
        self.started_at = None;
        self.alert.reset();
        self.inactivity.stop();
        totals
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            tracking: self.tracking,
            posture: self.posture,
            total_seconds: self.total_seconds,
            good_seconds: self.good_seconds,
            started_at: self.started_at,
        }
    }
}
