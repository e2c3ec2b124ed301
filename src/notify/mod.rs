//! Where posture alerts go once the tracker decides to raise one.
//!
//! Delivery is best effort: the tracker logs and ignores any error returned here.

mod sound;

pub use sound::SoundAlertSink;

use std::sync::Arc;

use anyhow::{bail, Result};
use log::warn;

pub trait AlertSink: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Writes alerts to the log at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        warn!("{title} {body}");
        Ok(())
    }
}

/// Fans an alert out to several sinks. Every sink is tried even if one fails.
#[derive(Default, Clone)]
pub struct CompositeAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl CompositeAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AlertSink for CompositeAlertSink {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        let failures: Vec<String> = self
            .sinks
            .iter()
            .filter_map(|sink| sink.notify(title, body).err())
            .map(|err| format!("{err:#}"))
            .collect();

        if !failures.is_empty() {
            bail!("{} alert sink(s) failed: {}", failures.len(), failures.join("; "));
        }
        Ok(())
    }
}
