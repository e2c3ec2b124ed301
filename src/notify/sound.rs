use anyhow::Result;

use crate::audio::AlertSoundHandle;
use crate::settings::AlertSoundSettings;

use super::AlertSink;

/// Plays the alert chime.
pub struct SoundAlertSink {
    audio: AlertSoundHandle,
    settings: AlertSoundSettings,
}

impl SoundAlertSink {
    pub fn new(audio: AlertSoundHandle, settings: AlertSoundSettings) -> Self {
        Self { audio, settings }
    }
}

impl AlertSink for SoundAlertSink {
    fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        self.audio.play_chime(self.settings.volume)
    }
}
