use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::Frame;

use super::FrameResult;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Pull frames until cancelled, the source closes, or `on_frame` returns `false`.
///
/// The next frame is only received after `on_frame` completes. Estimator
/// failures are logged and the frame is dropped.
pub async fn frame_loop<F, Fut>(
    mut frames: mpsc::Receiver<FrameResult>,
    cancel_token: CancellationToken,
    mut on_frame: F,
) where
    F: FnMut(Frame) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut processed: u64 = 0;
    let mut dropped: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("frame loop shutting down ({processed} processed, {dropped} dropped)");
                break;
            }
            next = frames.recv() => match next {
                Some(Ok(frame)) => {
                    processed += 1;
                    if !on_frame(frame).await {
                        log_info!("frame consumer gone, stopping frame loop");
                        break;
                    }
                }
                Some(Err(err)) => {
                    dropped += 1;
                    log_error!("pose estimation failed, dropping frame: {err:#}");
                }
                None => {
                    log_warn!("frame source closed after {processed} frames");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;

    use super::*;
    use crate::models::Keypoint;

    fn marked(name: &str) -> Frame {
        Frame::new(vec![Keypoint::new(name, 0.0, 0.0, 1.0)])
    }

    #[tokio::test]
    async fn errors_are_dropped_and_loop_continues() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok(marked("a"))).await.unwrap();
        tx.send(Err(anyhow!("estimator crashed"))).await.unwrap();
        tx.send(Ok(marked("b"))).await.unwrap();
        drop(tx);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        frame_loop(rx, CancellationToken::new(), move |frame| {
            sink.lock().unwrap().push(frame.keypoints[0].name.clone());
            async { true }
        })
        .await;

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn cancellation_stops_an_idle_loop() {
        let (_tx, rx) = mpsc::channel::<FrameResult>(1);
        let token = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(rx, token.clone(), |_| async { true }));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn consumer_can_end_the_loop() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Frame::empty())).await.unwrap();
        tx.send(Ok(Frame::empty())).await.unwrap();

        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        frame_loop(rx, CancellationToken::new(), move |_| {
            *counter.lock().unwrap() += 1;
            async { false }
        })
        .await;

        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
