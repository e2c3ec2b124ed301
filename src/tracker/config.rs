use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::posture::PostureThresholds;
use crate::utils::serde_secs;

/// Timing and policy knobs for a [`PostureTracker`](super::PostureTracker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub thresholds: PostureThresholds,

    /// Period of the session accounting tick
    #[serde(with = "serde_secs")]
    pub tick_interval: Duration,

    /// How long posture must stay bad before an alert is considered
    #[serde(with = "serde_secs")]
    pub bad_posture_threshold: Duration,

    /// Minimum gap between two delivered alerts
    #[serde(with = "serde_secs")]
    pub alert_cooldown: Duration,

    /// No user activity for this long forces the status to idle
    #[serde(with = "serde_secs")]
    pub inactivity_timeout: Duration,

    /// Sessions must run strictly longer than this to be recorded
    pub min_session_duration_secs: u64,

    pub alert_title: String,
    pub alert_body: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            thresholds: PostureThresholds::default(),
            tick_interval: Duration::from_secs(1),
            bad_posture_threshold: Duration::from_secs(60),
            alert_cooldown: Duration::from_secs(120),
            inactivity_timeout: Duration::from_secs(15 * 60),
            min_session_duration_secs: 60,
            alert_title: "Posture Alert!".into(),
            alert_body: "Please check your posture.".into(),
        }
    }
}

impl TrackerConfig {
    /// Reject settings the timers cannot run with.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("tick_interval", self.tick_interval),
            ("bad_posture_threshold", self.bad_posture_threshold),
            ("inactivity_timeout", self.inactivity_timeout),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                bail!("{name} must be greater than zero");
            }
        }
        Ok(())
    }
}
