use std::{sync::Arc, time::Duration};

use shared::domain::{AttemptFeedback, CompletionState, SortKey, Task};
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    detail::{DetailCoordinator, Location, MemoryLocation},
    error::{BoardError, BoardResult},
    presentation::FilterSet,
    refresh::{RefreshScheduler, Refresher, DEFAULT_REFRESH_INTERVAL},
    remote::CatalogService,
    state::{BoardEvent, BoardStore, BoardView},
    submission::{SubmissionFlow, DEFAULT_FEEDBACK_CLEAR_DELAY},
};

#[derive(Debug, Clone)]
pub struct BoardOptions {
    pub refresh_interval: Duration,
    pub feedback_clear_delay: Duration,
    /// Anti-replay value the service expects with every submission.
    pub nonce: String,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            feedback_clear_delay: DEFAULT_FEEDBACK_CLEAR_DELAY,
            nonce: String::new(),
        }
    }
}

/// Root of the engine. Owns the composed state and exposes the mutation
/// surface presentation drives.
pub struct BoardController {
    store: BoardStore,
    scheduler: Arc<RefreshScheduler>,
    submission: SubmissionFlow,
    detail: DetailCoordinator,
    nonce: String,
}

impl BoardController {
    pub fn new(service: Arc<dyn CatalogService>) -> Arc<Self> {
        Self::new_with_location(
            service,
            Arc::new(MemoryLocation::default()),
            BoardOptions::default(),
        )
    }

    pub fn new_with_location(
        service: Arc<dyn CatalogService>,
        location: Arc<dyn Location>,
        options: BoardOptions,
    ) -> Arc<Self> {
        let store = BoardStore::default();
        let scheduler = Arc::new(RefreshScheduler::new(
            Refresher::new(Arc::clone(&service), store.clone()),
            options.refresh_interval,
        ));
        let submission = SubmissionFlow::new(
            Arc::clone(&service),
            store.clone(),
            Arc::clone(&scheduler),
            options.feedback_clear_delay,
        );
        let detail = DetailCoordinator::new(service, store.clone(), location);
        Arc::new(Self {
            store,
            scheduler,
            submission,
            detail,
            nonce: options.nonce,
        })
    }

    /// Initial fetch of catalog and solves (joined), then the one-time
    /// fragment lookup. Periodic refresh is armed either way.
    pub async fn start(&self) -> BoardResult<()> {
        self.scheduler.start().await?;
        if let Some(task) = self.detail.restore_from_location().await? {
            info!(task = %task.name, "board: restored detail from location");
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        self.submission.cancel_expiry();
        self.scheduler.stop();
    }

    pub async fn refresh_now(&self) -> BoardResult<()> {
        self.scheduler.refresh_now().await
    }

    pub async fn view(&self) -> BoardView {
        self.store.view().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.store.subscribe()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn location(&self) -> &Arc<dyn Location> {
        self.detail.location()
    }

    pub async fn update_filters(&self, filters: FilterSet) {
        self.store.update(|state| state.set_filters(filters)).await;
        self.store.emit(BoardEvent::FiltersChanged);
    }

    pub async fn update_category_filters<I, S>(&self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        self.store
            .update(|state| state.set_category_filters(categories))
            .await;
        self.store.emit(BoardEvent::FiltersChanged);
    }

    pub async fn update_completion_filters(
        &self,
        completion: impl IntoIterator<Item = CompletionState>,
    ) {
        let completion: Vec<CompletionState> = completion.into_iter().collect();
        self.store
            .update(|state| state.set_completion_filters(completion))
            .await;
        self.store.emit(BoardEvent::FiltersChanged);
    }

    pub async fn update_sort_key(&self, sort_key: SortKey) {
        self.store.update(|state| state.set_sort_key(sort_key)).await;
        self.store.emit(BoardEvent::SortChanged(sort_key));
    }

    pub async fn open_detail(&self, task: Task) -> BoardResult<()> {
        self.detail.open(task).await
    }

    /// Looks a task up by its exact name in the current catalog and opens it.
    pub async fn open_detail_by_name(&self, name: &str) -> BoardResult<Option<Task>> {
        let found = self.store.read(|state| state.task_named(name).cloned()).await;
        match found {
            Some(task) => {
                self.detail.open(task.clone()).await?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    pub async fn close_detail(&self) {
        self.detail.close().await;
    }

    pub async fn reload_solvers(&self) -> BoardResult<()> {
        self.detail.reload_solvers().await.map(|_| ())
    }

    /// Submits `key` for the open task.
    pub async fn submit_attempt(&self, key: &str) -> BoardResult<AttemptFeedback> {
        let task_id = self
            .store
            .read(|state| state.active.as_ref().map(|task| task.id))
            .await
            .ok_or(BoardError::NoActiveTask)?;
        self.submission.submit(task_id, key, &self.nonce).await
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
