//! One-shot timers owned by the tracker state.
//!
//! Each timer is a spawned task tagged with a generation number. The task
//! reports back with its generation when it wakes; a generation that no
//! longer matches the pending one means the timer was superseded and the
//! wake-up is ignored.

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::models::PostureStatus;

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Outcome of a bad-posture timer waking up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Cooldown elapsed: notify the user.
    Deliver,
    /// An alert went out too recently. The episode gets no alert.
    Cooldown,
    /// Timer was cancelled or replaced before it woke.
    Stale,
}

/// Bad-posture hysteresis: one timer per bad-posture episode, throttled by a cooldown.
#[derive(Default)]
pub struct AlertTimer {
    pending: Option<PendingTimer>,
    last_fired_at: Option<Instant>,
    generation: u64,
}

impl AlertTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_fired_at(&self) -> Option<Instant> {
        self.last_fired_at
    }

    /// Feed a canonical status transition.
    ///
    /// Entering bad posture arms a timer through `arm` unless one is already
    /// pending (slouching -> leaning keeps the running timer). Any other
    /// status cancels it.
    pub fn observe<F>(&mut self, status: PostureStatus, arm: F)
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        if !status.is_bad() {
            self.cancel();
            return;
        }

        if self.pending.is_none() {
            self.generation = self.generation.wrapping_add(1);
            let generation = self.generation;
            self.pending = Some(PendingTimer {
                generation,
                handle: arm(generation),
            });
        }
    }

    /// Called by the timer task when it wakes. The timer is cleared either
    /// way; a cooldown-blocked episode is not rescheduled.
    pub fn on_fire(&mut self, generation: u64, now: Instant, cooldown: Duration) -> AlertDecision {
        match &self.pending {
            Some(pending) if pending.generation == generation => {}
            _ => return AlertDecision::Stale,
        }
        // Not aborted: the caller is the timer task itself.
        self.pending = None;

        let cooled_down = self
            .last_fired_at
            .map(|last| now.saturating_duration_since(last) > cooldown)
            .unwrap_or(true);

        if cooled_down {
            self.last_fired_at = Some(now);
            AlertDecision::Deliver
        } else {
            AlertDecision::Cooldown
        }
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    /// Forget everything, including when the last alert went out.
    pub fn reset(&mut self) {
        self.cancel();
        self.last_fired_at = None;
    }
}

impl Drop for AlertTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Idle detection: a single timer restarted by every user activity event.
#[derive(Default)]
pub struct InactivityMonitor {
    pending: Option<PendingTimer>,
    last_activity_at: Option<Instant>,
    generation: u64,
}

impl InactivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_activity_at(&self) -> Option<Instant> {
        self.last_activity_at
    }

    /// Record activity at `now` and replace the pending timer with a fresh one.
    pub fn restart<F>(&mut self, now: Instant, arm: F)
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.last_activity_at = Some(now);
        self.pending = Some(PendingTimer {
            generation,
            handle: arm(generation),
        });
    }

    /// True when `generation` is the live timer; the timer is then consumed.
    pub fn on_fire(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    pub fn stop(&mut self) {
        self.cancel();
        self.last_activity_at = None;
    }
}

impl Drop for InactivityMonitor {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_task(_generation: u64) -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn entering_bad_posture_arms_once() {
        let mut timer = AlertTimer::new();
        let mut armed = Vec::new();

        timer.observe(PostureStatus::Slouching, |g| {
            armed.push(g);
            idle_task(g)
        });
        timer.observe(PostureStatus::Leaning, |g| {
            armed.push(g);
            idle_task(g)
        });

        assert_eq!(armed, vec![1]);
        assert!(timer.is_pending());
    }

    #[tokio::test]
    async fn leaving_bad_posture_cancels() {
        let mut timer = AlertTimer::new();
        timer.observe(PostureStatus::Slouching, idle_task);
        timer.observe(PostureStatus::Good, |_| unreachable!("good posture never arms"));

        assert!(!timer.is_pending());
        assert_eq!(
            timer.on_fire(1, Instant::now(), Duration::from_secs(120)),
            AlertDecision::Stale
        );
    }

    #[tokio::test]
    async fn first_fire_delivers_then_cooldown_applies() {
        let cooldown = Duration::from_secs(120);
        let start = Instant::now();
        let mut timer = AlertTimer::new();

        timer.observe(PostureStatus::Slouching, idle_task);
        assert_eq!(timer.on_fire(1, start, cooldown), AlertDecision::Deliver);
        assert!(!timer.is_pending());
        assert_eq!(timer.last_fired_at(), Some(start));

        timer.observe(PostureStatus::Good, idle_task);
        timer.observe(PostureStatus::Slouching, idle_task);
        assert_eq!(
            timer.on_fire(2, start + Duration::from_secs(120), cooldown),
            AlertDecision::Cooldown
        );
        // blocked episode is not rescheduled
        assert!(!timer.is_pending());
        assert_eq!(timer.last_fired_at(), Some(start));

        timer.observe(PostureStatus::Good, idle_task);
        timer.observe(PostureStatus::Leaning, idle_task);
        assert_eq!(
            timer.on_fire(3, start + Duration::from_secs(121), cooldown),
            AlertDecision::Deliver
        );
    }

    #[tokio::test]
    async fn superseded_generation_is_stale() {
        let mut timer = AlertTimer::new();
        timer.observe(PostureStatus::Slouching, idle_task);
        timer.observe(PostureStatus::Unknown, idle_task);
        timer.observe(PostureStatus::Slouching, idle_task);

        let now = Instant::now();
        let cooldown = Duration::from_secs(120);
        assert_eq!(timer.on_fire(1, now, cooldown), AlertDecision::Stale);
        assert_eq!(timer.on_fire(2, now, cooldown), AlertDecision::Deliver);
    }

    #[tokio::test]
    async fn reset_forgets_last_alert() {
        let mut timer = AlertTimer::new();
        timer.observe(PostureStatus::Slouching, idle_task);
        timer.on_fire(1, Instant::now(), Duration::from_secs(120));
        timer.reset();
        assert_eq!(timer.last_fired_at(), None);
    }

    #[tokio::test]
    async fn cancel_aborts_the_timer_task() {
        let mut timer = AlertTimer::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        timer.observe(PostureStatus::Slouching, move |_| {
            tokio::spawn(async move {
                std::future::pending::<()>().await;
                drop(tx);
            })
        });
        timer.cancel();
        // aborting the task drops the sender
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn restart_replaces_inactivity_timer() {
        let mut monitor = InactivityMonitor::new();
        let now = Instant::now();
        monitor.restart(now, idle_task);
        monitor.restart(now + Duration::from_secs(5), idle_task);

        assert!(!monitor.on_fire(1));
        assert_eq!(monitor.last_activity_at(), Some(now + Duration::from_secs(5)));
        assert!(monitor.on_fire(2));
        assert!(!monitor.is_armed());
        assert!(!monitor.on_fire(2));
    }

    #[tokio::test]
    async fn stop_disarms_inactivity_timer() {
        let mut monitor = InactivityMonitor::new();
        monitor.restart(Instant::now(), idle_task);
        monitor.stop();
        assert!(!monitor.is_armed());
        assert_eq!(monitor.last_activity_at(), None);
        assert!(!monitor.on_fire(1));
    }
}
