use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};

use crate::{
    db::Database,
    frames::{FrameLoopController, FrameSource},
    models::{ActivityKind, Frame, PostureStatus, SessionRecord},
    notify::AlertSink,
    posture::classify,
};

use super::{timers::AlertDecision, TrackerConfig, TrackerSnapshot, TrackerState};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    StatusChanged {
        status: PostureStatus,
        previous: PostureStatus,
    },
    AlertFired {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session: SessionRecord,
    },
}

/// Resources acquired by `start` and released by `stop`.
struct Lifecycle {
    source: Box<dyn FrameSource>,
    ticker: Option<JoinHandle<()>>,
    frames: FrameLoopController,
}

impl Lifecycle {
    async fn shutdown(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Err(err) = self.frames.stop().await {
            warn!("frame loop did not stop cleanly: {err:#}");
        }
        self.source.stop();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        self.frames.abort();
        self.source.stop();
    }
}

struct TrackerInner {
    config: TrackerConfig,
    state: Mutex<TrackerState>,
    lifecycle: Mutex<Lifecycle>,
    alerts: Arc<dyn AlertSink>,
    db: Database,
    events: broadcast::Sender<TrackerEvent>,
}

/// Posture tracking session controller.
///
/// Cheap to clone; all clones drive the same session. Background tasks
/// (ticker, frame loop, timers) only hold weak references, so dropping the
/// last handle tears the session down.
#[derive(Clone)]
pub struct PostureTracker {
    inner: Arc<TrackerInner>,
}

impl PostureTracker {
    pub fn new(
        config: TrackerConfig,
        source: Box<dyn FrameSource>,
        alerts: Arc<dyn AlertSink>,
        db: Database,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(TrackerInner {
                config,
                state: Mutex::new(TrackerState::new()),
                lifecycle: Mutex::new(Lifecycle {
                    source,
                    ticker: None,
                    frames: FrameLoopController::new(),
                }),
                alerts,
                db,
                events,
            }),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.inner.events.subscribe()
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn status(&self) -> PostureStatus {
        self.inner.state.lock().await.posture
    }

    pub async fn is_tracking(&self) -> bool {
        self.inner.state.lock().await.is_enabled()
    }

    /// Begin a session. A no-op while a session is already running.
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        let already_tracking = self.inner.state.lock().await.is_enabled();
        if already_tracking {
            debug!("start ignored: already tracking");
            return Ok(());
        }
        self.inner
            .config
            .validate()
            .context("invalid tracker configuration")?;

        let frames = lifecycle
            .source
            .start()
            .context("failed to start frame source")?;

        let tracker = Arc::downgrade(&self.inner);
        let started = lifecycle.frames.start(frames, move |frame| {
            let tracker = tracker.clone();
            async move {
                match tracker.upgrade() {
                    Some(inner) => {
                        inner.handle_frame(frame).await;
                        true
                    }
                    None => false,
                }
            }
        });
        if let Err(err) = started {
            lifecycle.source.stop();
            return Err(err);
        }

        {
            let mut state = self.inner.state.lock().await;
            state.begin_session(Utc::now());
            self.inner.apply_status(&mut state, PostureStatus::Unknown);
            self.inner.restart_inactivity(&mut state);
        }

        lifecycle.ticker = Some(tokio::spawn(run_ticker(
            Arc::downgrade(&self.inner),
            self.inner.config.tick_interval,
        )));

        info!("posture tracking started");
        Ok(())
    }

    /// End the session and release every timer and the frame source.
    ///
    /// Returns the stored record when the session ran longer than the
    /// configured minimum. Teardown always completes before a store error
    /// is returned.
    pub async fn stop(&self) -> Result<Option<SessionRecord>> {
        let mut lifecycle = self.inner.lifecycle.lock().await;

        let (total_secs, good_secs) = {
            let mut state = self.inner.state.lock().await;
            if !state.is_enabled() {
                debug!("stop ignored: not tracking");
                return Ok(None);
            }
            let totals = state.finish_session();
            self.inner.apply_status(&mut state, PostureStatus::Unknown);
            totals
        };

        lifecycle.shutdown().await;

        let Some(record) = self.inner.complete_session(total_secs, good_secs) else {
            return Ok(None);
        };
        self.inner
            .db
            .append_session(&record)
            .await
            .context("failed to persist posture session")?;

        info!(
            "posture tracking stopped; saved session {} ({}s, {}s good)",
            record.id, record.duration_secs, record.good_duration_secs
        );
        Ok(Some(record))
    }

    /// Report user input. Leaves idle and restarts the inactivity timer.
    pub async fn record_activity(&self, kind: ActivityKind) {
        let mut state = self.inner.state.lock().await;
        if !state.is_enabled() {
            return;
        }
        if state.posture == PostureStatus::Idle {
            info!("activity ({kind:?}) after idle, resuming analysis");
            self.inner.apply_status(&mut state, PostureStatus::Unknown);
        }
        self.inner.restart_inactivity(&mut state);
    }
}

impl TrackerInner {
    fn publish(&self, event: TrackerEvent) {
        // Only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    /// Build and announce the record of a finished session. `None` when it
    /// was too short to keep.
    fn complete_session(&self, total_secs: u64, good_secs: u64) -> Option<SessionRecord> {
        let min_secs = self.config.min_session_duration_secs;
        if total_secs <= min_secs {
            info!("posture tracking stopped; discarding {total_secs}s session (minimum {min_secs}s)");
            return None;
        }

        let record = SessionRecord::new(Utc::now(), total_secs, good_secs);
        self.publish(TrackerEvent::SessionCompleted {
            session: record.clone(),
        });
        Some(record)
    }

    /// Set the canonical status and run the transition rules on a change.
    fn apply_status(self: &Arc<Self>, state: &mut TrackerState, status: PostureStatus) {
        let Some(previous) = state.set_posture(status) else {
            return;
        };
        debug!("posture {previous:?} -> {status:?}");

        let tracker = Arc::downgrade(self);
        let delay = self.config.bad_posture_threshold;
        state.alert.observe(status, move |generation| {
            tokio::spawn(run_alert_timer(tracker, generation, delay))
        });

        self.publish(TrackerEvent::StatusChanged { status, previous });
    }

    fn restart_inactivity(self: &Arc<Self>, state: &mut TrackerState) {
        let tracker = Arc::downgrade(self);
        let timeout = self.config.inactivity_timeout;
        state.inactivity.restart(Instant::now(), move |generation| {
            tokio::spawn(run_inactivity_timer(tracker, generation, timeout))
        });
    }

    async fn handle_frame(self: &Arc<Self>, frame: Frame) {
        let mut state = self.state.lock().await;
        if !state.is_enabled() || state.posture == PostureStatus::Idle {
            return;
        }
        let status = classify(&frame, &self.config.thresholds);
        self.apply_status(&mut state, status);
    }

    async fn fire_alert(&self, generation: u64) {
        let cooldown = self.config.alert_cooldown;
        let decision = {
            let mut state = self.state.lock().await;
            if !state.is_enabled() {
                return;
            }
            state.alert.on_fire(generation, Instant::now(), cooldown)
        };

        match decision {
            AlertDecision::Deliver => {
                info!(
                    "bad posture held for {:?}, sending alert",
                    self.config.bad_posture_threshold
                );
                if let Err(err) = self
                    .alerts
                    .notify(&self.config.alert_title, &self.config.alert_body)
                {
                    warn!("posture alert delivery failed: {err:#}");
                }
                self.publish(TrackerEvent::AlertFired { at: Utc::now() });
            }
            AlertDecision::Cooldown => {
                info!("posture alert suppressed: previous alert less than {cooldown:?} ago");
            }
            AlertDecision::Stale => {}
        }
    }

    async fn fire_inactivity(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock().await;
        if !state.is_enabled() || !state.inactivity.on_fire(generation) {
            return;
        }
        info!(
            "no activity for {:?}, marking user idle",
            self.config.inactivity_timeout
        );
        self.apply_status(&mut state, PostureStatus::Idle);
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let finished = state.is_enabled().then(|| state.finish_session());
        self.lifecycle.get_mut().abort();

        let Some((total_secs, good_secs)) = finished else {
            return;
        };
        warn!("posture tracker dropped mid-session; timers and frame source released");
        if let Some(record) = self.complete_session(total_secs, good_secs) {
            if let Err(err) = self.db.append_session_detached(&record) {
                error!("failed to queue session {} on drop: {err:#}", record.id);
            }
        }
    }
}

async fn run_ticker(tracker: Weak<TrackerInner>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(inner) = tracker.upgrade() else {
            break;
        };
        let mut state = inner.state.lock().await;
        if !state.is_enabled() {
            break;
        }
        state.tick();
    }
}

async fn run_alert_timer(tracker: Weak<TrackerInner>, generation: u64, delay: Duration) {
    time::sleep(delay).await;
    if let Some(inner) = tracker.upgrade() {
        inner.fire_alert(generation).await;
    }
}

async fn run_inactivity_timer(tracker: Weak<TrackerInner>, generation: u64, timeout: Duration) {
    time::sleep(timeout).await;
    if let Some(inner) = tracker.upgrade() {
        inner.fire_inactivity(generation).await;
    }
}
