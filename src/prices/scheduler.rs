use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::{
    sync::{mpsc, oneshot},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    config::SchedulerConfig,
    empty_legs::{
        pricing::ROUTES,
        services::{update_all_route_prices, RefreshSummary},
        store::LegStore,
    },
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub interval_hours: u64,
    pub running: bool,
    pub runs: u64,
    pub last_run: Option<RefreshSummary>,
    pub last_error: Option<String>,
}

enum Command {
    RunNow(oneshot::Sender<RefreshSummary>),
    Shutdown,
}

/// Handle to the background task that reprices empty-leg routes.
///
/// The worker owns the refresh loop, so two runs never overlap: ticks and
/// `run_now` requests are handled one after another.
#[derive(Clone)]
pub struct PriceScheduler {
    tx: mpsc::Sender<Command>,
    status: Arc<RwLock<SchedulerStatus>>,
}

fn initial_status(cfg: &SchedulerConfig) -> SchedulerStatus {
    SchedulerStatus {
        enabled: cfg.enabled,
        interval_hours: cfg.interval_hours,
        running: false,
        runs: 0,
        last_run: None,
        last_error: None,
    }
}

impl PriceScheduler {
    pub fn spawn(store: Arc<dyn LegStore>, cfg: SchedulerConfig) -> Self {
        let (tx, rx) = mpsc::channel(8);
        let status = Arc::new(RwLock::new(initial_status(&cfg)));
        tokio::spawn(worker(store, cfg, rx, status.clone()));
        Self { tx, status }
    }

    /// A handle with no worker behind it; `run_now` fails.
    pub fn idle(cfg: SchedulerConfig) -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self {
            tx,
            status: Arc::new(RwLock::new(initial_status(&cfg))),
        }
    }

    pub async fn run_now(&self) -> anyhow::Result<RefreshSummary> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::RunNow(reply))
            .await
            .map_err(|_| anyhow::anyhow!("price scheduler is not running"))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("price scheduler stopped before replying"))
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

async fn worker(
    store: Arc<dyn LegStore>,
    cfg: SchedulerConfig,
    mut rx: mpsc::Receiver<Command>,
    status: Arc<RwLock<SchedulerStatus>>,
) {
    let mut rng = StdRng::from_entropy();
    let period = Duration::from_secs(cfg.interval_hours.max(1) * 3600);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        enabled = cfg.enabled,
        interval_hours = cfg.interval_hours,
        "price scheduler started"
    );
    if cfg.run_on_startup {
        run_once(store.as_ref(), &mut rng, &status).await;
    }

    loop {
        tokio::select! {
            _ = ticker.tick(), if cfg.enabled => {
                run_once(store.as_ref(), &mut rng, &status).await;
            }
            cmd = rx.recv() => match cmd {
                Some(Command::RunNow(reply)) => {
                    let summary = run_once(store.as_ref(), &mut rng, &status).await;
                    let _ = reply.send(summary);
                }
                Some(Command::Shutdown) | None => break,
            },
        }
    }
    info!("price scheduler stopped");
}

async fn run_once(
    store: &dyn LegStore,
    rng: &mut StdRng,
    status: &RwLock<SchedulerStatus>,
) -> RefreshSummary {
    set_status(status, |s| s.running = true);
    let summary = update_all_route_prices(store, ROUTES, rng, OffsetDateTime::now_utc()).await;
    if summary.failed > 0 {
        warn!(failed = summary.failed, "some routes were not repriced");
    }
    set_status(status, |s| {
        s.running = false;
        s.runs += 1;
        s.last_error = (summary.failed > 0)
            .then(|| format!("{} of {} routes failed", summary.failed, ROUTES.len()));
        s.last_run = Some(summary.clone());
    });
    summary
}

fn set_status(status: &RwLock<SchedulerStatus>, f: impl FnOnce(&mut SchedulerStatus)) {
    let mut guard = status.write().unwrap_or_else(|e| e.into_inner());
    f(&mut guard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::empty_legs::services::testing::MemoryLegStore;

    fn cfg(enabled: bool, run_on_startup: bool) -> SchedulerConfig {
        SchedulerConfig {
            enabled,
            interval_hours: 1,
            run_on_startup,
        }
    }

    async fn settle(s: &PriceScheduler, runs: u64) {
        for _ in 0..50 {
            if s.status().runs >= runs {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn run_now_reprices_every_route() {
        let store = Arc::new(MemoryLegStore::default());
        let s = PriceScheduler::spawn(store.clone(), cfg(false, false));
        let summary = s.run_now().await.unwrap();
        assert_eq!(summary.inserted as usize, ROUTES.len());

        let again = s.run_now().await.unwrap();
        assert_eq!((again.updated as usize, again.inserted), (ROUTES.len(), 0));

        let st = s.status();
        assert_eq!(st.runs, 2);
        assert!(!st.running);
        assert_eq!(st.last_run, Some(again));
        assert_eq!(st.last_error, None);
        assert_eq!(store.legs.lock().unwrap().len(), ROUTES.len());
    }

    #[tokio::test]
    async fn idle_handle_refuses_to_run() {
        let s = PriceScheduler::idle(cfg(true, false));
        let err = s.run_now().await.unwrap_err();
        assert!(err.to_string().contains("not running"));
        assert!(s.status().enabled);
    }

    #[tokio::test]
    async fn runs_once_on_startup_when_configured() {
        let s = PriceScheduler::spawn(Arc::new(MemoryLegStore::default()), cfg(false, true));
        settle(&s, 1).await;
        assert_eq!(s.status().runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_when_enabled() {
        let on = PriceScheduler::spawn(Arc::new(MemoryLegStore::default()), cfg(true, false));
        let off = PriceScheduler::spawn(Arc::new(MemoryLegStore::default()), cfg(false, false));
        tokio::time::sleep(Duration::from_secs(3600 * 2 + 5)).await;
        settle(&on, 2).await;
        assert_eq!(on.status().runs, 2);
        assert_eq!(off.status().runs, 0);
    }

    #[tokio::test]
    async fn shutdown_stops_the_worker() {
        let s = PriceScheduler::spawn(Arc::new(MemoryLegStore::default()), cfg(false, false));
        s.shutdown().await;
        assert!(s.run_now().await.is_err());
    }
}
