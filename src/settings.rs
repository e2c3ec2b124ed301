use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::tracker::TrackerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertSoundSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for AlertSoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct UserSettings {
    tracker: TrackerConfig,
    alert_sound: AlertSoundSettings,
    /// Target share of good posture per day, percent.
    daily_goal_percent: u8,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            alert_sound: AlertSoundSettings::default(),
            daily_goal_percent: 80,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn tracker(&self) -> TrackerConfig {
        self.read(|data| data.tracker.clone())
    }

    pub fn alert_sound(&self) -> AlertSoundSettings {
        self.read(|data| data.alert_sound.clone())
    }

    pub fn daily_goal_percent(&self) -> u8 {
        self.read(|data| data.daily_goal_percent)
    }

    pub fn update_tracker(&self, config: TrackerConfig) -> Result<()> {
        self.update(|data| data.tracker = config)
    }

    pub fn update_alert_sound(&self, settings: AlertSoundSettings) -> Result<()> {
        self.update(|data| data.alert_sound = settings)
    }

    pub fn update_daily_goal(&self, percent: u8) -> Result<()> {
        self.update(|data| data.daily_goal_percent = percent.min(100))
    }

    fn read<T>(&self, f: impl FnOnce(&UserSettings) -> T) -> T {
        match self.data.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn update(&self, f: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
