//! Periodic and on-demand re-fetch of the catalog and the user's solves.
//!
//! Each resource is replaced wholesale by whichever response lands last.
//! Periodic and event-triggered refreshes may overlap; both fetch full
//! snapshots, so the board converges on the most recent write.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::BoardResult,
    remote::CatalogService,
    state::{BoardEvent, BoardStore},
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// The fetch-and-apply routine shared by the timer task and explicit callers.
#[derive(Clone)]
pub(crate) struct Refresher {
    service: Arc<dyn CatalogService>,
    store: BoardStore,
}

impl Refresher {
    pub(crate) fn new(service: Arc<dyn CatalogService>, store: BoardStore) -> Self {
        Self { service, store }
    }

    /// Issues both fetches together and applies each as it lands. A failure
    /// leaves that resource's previous snapshot in place.
    pub(crate) async fn refresh(&self) -> BoardResult<()> {
        let (catalog, solves) = tokio::join!(self.load_catalog(), self.load_solves());
        catalog.and(solves)
    }

    async fn load_catalog(&self) -> BoardResult<()> {
        let tasks = self.service.fetch_catalog().await?;
        let count = tasks.len();
        self.store.update(|state| state.replace_catalog(tasks)).await;
        debug!(tasks = count, "board: catalog replaced");
        self.store.emit(BoardEvent::CatalogReplaced { tasks: count });
        Ok(())
    }

    async fn load_solves(&self) -> BoardResult<()> {
        let solves = self.service.fetch_solves().await?;
        let count = solves.len();
        self.store.update(|state| state.replace_solves(solves)).await;
        debug!(solves = count, "board: solves replaced");
        self.store.emit(BoardEvent::SolvesReplaced { solves: count });
        Ok(())
    }
}

pub struct RefreshScheduler {
    refresher: Refresher,
    period: Duration,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub(crate) fn new(refresher: Refresher, period: Duration) -> Self {
        Self {
            refresher,
            period,
            ticker: std::sync::Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arms the periodic timer, then performs the initial fetch and returns
    /// its result. The timer stays armed even if the first fetch fails.
    pub async fn start(&self) -> BoardResult<()> {
        self.arm();
        self.refresh_now().await
    }

    /// Out-of-band refresh. The periodic cadence is neither reset nor doubled.
    pub async fn refresh_now(&self) -> BoardResult<()> {
        self.refresher.refresh().await
    }

    pub fn is_running(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
            info!("board: periodic refresh stopped");
        }
    }

    fn arm(&self) {
        let mut ticker = self.lock_ticker();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let refresher = self.refresher.clone();
        let period = self.period;
        *ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(err) = refresher.refresh().await {
                    warn!("board: periodic refresh failed, keeping previous state: {err}");
                    refresher
                        .store
                        .emit(BoardEvent::RefreshFailed(err.to_string()));
                }
            }
        }));
        info!(period_ms = period.as_millis() as u64, "board: periodic refresh armed");
    }

    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }
}
