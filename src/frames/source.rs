use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::models::Frame;

/// One pose estimate, or the estimator's failure for that frame.
pub type FrameResult = Result<Frame>;

/// Producer of pose estimates (camera + detector).
///
/// A source is owned by exactly one tracker. Frames are pulled from the
/// returned channel; a bounded channel makes estimation cadence follow the
/// consumer.
pub trait FrameSource: Send + 'static {
    /// Begin producing frames for a new tracking session.
    fn start(&mut self) -> Result<mpsc::Receiver<FrameResult>>;

    /// Stop producing frames. Must be safe to call when not started.
    fn stop(&mut self);
}

type SenderSlot = Arc<Mutex<Option<mpsc::Sender<FrameResult>>>>;

/// Frame source fed from the outside through a [`FrameFeeder`].
pub struct ChannelFrameSource {
    capacity: usize,
    slot: SenderSlot,
}

/// Push side of a [`ChannelFrameSource`]. Cheap to clone.
#[derive(Clone)]
pub struct FrameFeeder {
    slot: SenderSlot,
}

impl ChannelFrameSource {
    pub fn new(capacity: usize) -> (Self, FrameFeeder) {
        let slot: SenderSlot = Arc::new(Mutex::new(None));
        let source = Self {
            capacity: capacity.max(1),
            slot: slot.clone(),
        };
        (source, FrameFeeder { slot })
    }
}

impl FrameSource for ChannelFrameSource {
    fn start(&mut self) -> Result<mpsc::Receiver<FrameResult>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        let mut guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }
}

impl FrameFeeder {
    fn current_sender(&self) -> Option<mpsc::Sender<FrameResult>> {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether a tracker is currently consuming frames.
    pub fn is_active(&self) -> bool {
        self.current_sender().is_some()
    }

    /// Deliver one estimate, waiting while the consumer is busy.
    ///
    /// Returns `false` when the source is stopped and the frame was discarded.
    pub async fn send(&self, frame: FrameResult) -> bool {
        let Some(tx) = self.current_sender() else {
            return false;
        };
        tx.send(frame).await.is_ok()
    }
}
