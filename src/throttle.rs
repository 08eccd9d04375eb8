use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Sliding-window limiter for outbound upstream calls.
///
/// At most `max_requests` calls may *start* inside any rolling window of
/// length `window`. Callers queue on a fair async mutex, so they are
/// admitted strictly in arrival order; the head of the queue sleeps until
/// the oldest start ages out of the window, then re-checks.
pub struct ApiThrottler {
    max_requests: usize,
    window: Duration,
    turn: tokio::sync::Mutex<()>,
    starts: Mutex<VecDeque<Instant>>,
    queued: AtomicUsize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThrottleStatus {
    pub max_requests: usize,
    pub window_secs: u64,
    pub in_window: usize,
    pub queued: usize,
}

struct QueuedGuard<'a>(&'a AtomicUsize);

impl Drop for QueuedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ApiThrottler {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            turn: tokio::sync::Mutex::new(()),
            starts: Mutex::new(VecDeque::new()),
            queued: AtomicUsize::new(0),
        }
    }

    /// Waits for a slot, then runs `f`.
    pub async fn throttle<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        f().await
    }

    async fn acquire(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        let _queued = QueuedGuard(&self.queued);
        let _turn = self.turn.lock().await;

        loop {
            let wait = {
                let now = Instant::now();
                let mut starts = self.starts.lock().unwrap_or_else(|e| e.into_inner());
                self.prune(&mut starts, now);
                let full = starts.len() >= self.max_requests;
                match starts.front().copied() {
                    Some(oldest) if full => self.window.saturating_sub(now.duration_since(oldest)),
                    _ => {
                        starts.push_back(now);
                        return;
                    }
                }
            };
            debug!(wait_ms = wait.as_millis() as u64, "throttle window full; waiting");
            sleep(wait).await;
        }
    }

    fn prune(&self, starts: &mut VecDeque<Instant>, now: Instant) {
        while let Some(front) = starts.front() {
            if now.duration_since(*front) >= self.window {
                starts.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn status(&self) -> ThrottleStatus {
        let now = Instant::now();
        let mut starts = self.starts.lock().unwrap_or_else(|e| e.into_inner());
        self.prune(&mut starts, now);
        ThrottleStatus {
            max_requests: self.max_requests,
            window_secs: self.window.as_secs(),
            in_window: starts.len(),
            queued: self.queued.load(Ordering::Relaxed),
        }
    }
}
