use std::future::Future;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::Frame;

use super::{loop_worker::frame_loop, FrameResult};

/// Owns the task that drains a frame source into the tracker.
#[derive(Default)]
pub struct FrameLoopController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl FrameLoopController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<F, Fut>(&mut self, frames: mpsc::Receiver<FrameResult>, on_frame: F) -> Result<()>
    where
        F: FnMut(Frame) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if self.handle.is_some() {
            bail!("frame loop already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(frames, cancel_token.clone(), on_frame));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for it, so no frame is processed after this returns.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("frame loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Synchronous teardown for drop paths that cannot await.
    pub fn abort(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            info!("aborting frame loop");
            handle.abort();
        }
    }
}

impl Drop for FrameLoopController {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (_tx, rx1) = mpsc::channel::<FrameResult>(1);
        let (_tx2, rx2) = mpsc::channel::<FrameResult>(1);
        let mut controller = FrameLoopController::new();

        controller.start(rx1, |_| async { true }).unwrap();
        assert!(controller.start(rx2, |_| async { true }).is_err());
        controller.stop().await.unwrap();
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_ok() {
        let mut controller = FrameLoopController::new();
        controller.stop().await.unwrap();
    }
}
