//! Key submission for the open task and the lifetime of its feedback.
//!
//! Idle -> Pending -> Feedback. Incorrect feedback expires after a fixed
//! delay; correct feedback stays and triggers an immediate board refresh.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{AttemptFeedback, AttemptStatus, TaskId},
    protocol::SubmitResponse,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    error::BoardResult,
    refresh::RefreshScheduler,
    remote::CatalogService,
    state::{BoardEvent, BoardStore},
};

pub const DEFAULT_FEEDBACK_CLEAR_DELAY: Duration = Duration::from_millis(2000);

pub struct SubmissionFlow {
    service: Arc<dyn CatalogService>,
    store: BoardStore,
    scheduler: Arc<RefreshScheduler>,
    clear_delay: Duration,
    expiry: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SubmissionFlow {
    pub(crate) fn new(
        service: Arc<dyn CatalogService>,
        store: BoardStore,
        scheduler: Arc<RefreshScheduler>,
        clear_delay: Duration,
    ) -> Self {
        Self {
            service,
            store,
            scheduler,
            clear_delay,
            expiry: std::sync::Mutex::new(None),
        }
    }

    /// Submits `key` for `task_id`. On a transport or shape failure the flow
    /// returns to idle without feedback and the error goes to the caller.
    pub async fn submit(
        &self,
        task_id: TaskId,
        key: &str,
        nonce: &str,
    ) -> BoardResult<AttemptFeedback> {
        self.cancel_expiry();
        let attempt = self.store.update(|state| state.begin_attempt(task_id)).await;
        self.store.emit(BoardEvent::FeedbackChanged(None));

        let response = match self.service.submit_attempt(task_id, key, nonce).await {
            Ok(response) => response,
            Err(err) => {
                warn!(task_id = task_id.0, "board: submission failed: {err}");
                self.store.update(|state| state.abandon_attempt(attempt)).await;
                return Err(err);
            }
        };

        let feedback = feedback_from(task_id, response);
        let shown = self
            .store
            .update(|state| state.finish_attempt(feedback.clone()))
            .await;
        self.store
            .emit(BoardEvent::FeedbackChanged(Some(feedback.clone())));

        match feedback.status {
            AttemptStatus::Incorrect => self.schedule_expiry(shown),
            AttemptStatus::Correct => {
                info!(task_id = task_id.0, "board: correct key, refreshing board");
                if let Err(err) = self.scheduler.refresh_now().await {
                    warn!("board: refresh after correct submission failed: {err}");
                    self.store.emit(BoardEvent::RefreshFailed(err.to_string()));
                }
            }
        }

        Ok(feedback)
    }

    pub fn cancel_expiry(&self) {
        if let Some(handle) = self.lock_expiry().take() {
            handle.abort();
        }
    }

    pub fn expiry_pending(&self) -> bool {
        self.lock_expiry()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn schedule_expiry(&self, seq: u64) {
        let store = self.store.clone();
        let delay = self.clear_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if store.update(|state| state.expire_feedback(seq)).await {
                store.emit(BoardEvent::FeedbackChanged(None));
            }
        });

        if let Some(previous) = self.lock_expiry().replace(handle) {
            previous.abort();
        }
    }

    fn lock_expiry(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.expiry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SubmissionFlow {
    fn drop(&mut self) {
        self.cancel_expiry();
    }
}

fn feedback_from(task_id: TaskId, response: SubmitResponse) -> AttemptFeedback {
    if !response.is_recognized() {
        warn!(
            task_id = task_id.0,
            status = response.status,
            message = %response.message,
            "board: unexpected submission status, treating as incorrect"
        );
    }
    AttemptFeedback {
        status: response.attempt_status(),
        message: response.message,
    }
}
