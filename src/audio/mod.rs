pub mod chime;

pub use chime::Chime;

use anyhow::{anyhow, Result};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
#[cfg(feature = "sound")]
use rodio::{OutputStream, Sink};
#[cfg(feature = "sound")]
use std::thread;

enum AudioCommand {
    PlayChime { volume: f32 },
    Stop,
}

/// Handle to the thread that owns the audio output device.
///
/// The thread is started lazily on first use; rodio's output stream is not
/// `Send`, so it never leaves that thread.
#[derive(Clone, Default)]
pub struct AlertSoundHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl AlertSoundHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|e| anyhow!("audio handle lock poisoned: {e}"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        spawn_audio_thread(rx)?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    pub fn play_chime(&self, volume: f32) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::PlayChime { volume })
            .map_err(|e| anyhow!("audio thread is gone: {e}"))
    }

    /// Silence the chime. A no-op if nothing was ever played.
    pub fn stop(&self) -> Result<()> {
        let tx = self
            .tx
            .lock()
            .map_err(|e| anyhow!("audio handle lock poisoned: {e}"))?
            .clone();
        match tx {
            Some(tx) => tx
                .send(AudioCommand::Stop)
                .map_err(|e| anyhow!("audio thread is gone: {e}")),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "sound")]
fn spawn_audio_thread(rx: mpsc::Receiver<AudioCommand>) -> Result<()> {
    thread::Builder::new()
        .name("alert-audio".to_string())
        .spawn(move || {
            let mut _stream: Option<OutputStream> = None;
            let mut sink: Option<Sink> = None;

            fn ensure_sink(
                stream: &mut Option<OutputStream>,
                sink: &mut Option<Sink>,
            ) -> Result<(), String> {
                if sink.is_none() {
                    let (s, handle) = OutputStream::try_default()
                        .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                    let new_sink = Sink::try_new(&handle)
                        .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                    *stream = Some(s);
                    *sink = Some(new_sink);
                }
                Ok(())
            }

            while let Ok(cmd) = rx.recv() {
                match cmd {
                    AudioCommand::PlayChime { volume } => {
                        if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                            log::warn!("{err}");
                            continue;
                        }
                        if let Some(ref s) = sink {
                            s.append(Chime::alert(volume));
                            s.play();
                        }
                    }
                    AudioCommand::Stop => {
                        if let Some(s_old) = sink.take() {
                            s_old.stop();
                        }
                        _stream = None;
                    }
                }
            }
        })
        .map_err(|e| anyhow!("failed to spawn audio thread: {e}"))?;
    Ok(())
}

#[cfg(not(feature = "sound"))]
fn spawn_audio_thread(rx: mpsc::Receiver<AudioCommand>) -> Result<()> {
    log::info!("built without the `sound` feature; alert chimes are silent");
    // Drain commands so sends keep succeeding.
    std::thread::Builder::new()
        .name("alert-audio".to_string())
        .spawn(move || {
            while let Ok(cmd) = rx.recv() {
                if let AudioCommand::PlayChime { volume } = cmd {
                    log::debug!("chime requested at volume {volume:.2} (silent build)");
                }
            }
        })
        .map_err(|e| anyhow!("failed to spawn audio thread: {e}"))?;
    Ok(())
}
