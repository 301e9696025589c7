//! The single task overlay and its mirror in the location fragment.

use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::domain::{SolverEntry, Task, TaskId};
use tracing::{debug, info, warn};

use crate::{
    error::BoardResult,
    remote::CatalogService,
    state::{BoardEvent, BoardStore},
};

/// Navigable location whose fragment encodes the open task. `None` means no
/// fragment.
pub trait Location: Send + Sync {
    fn fragment(&self) -> Option<String>;
    fn set_fragment(&self, fragment: Option<&str>);
}

#[derive(Debug, Default)]
pub struct MemoryLocation {
    fragment: std::sync::Mutex<Option<String>>,
}

impl MemoryLocation {
    pub fn new(fragment: Option<&str>) -> Self {
        Self {
            fragment: std::sync::Mutex::new(fragment.map(str::to_string)),
        }
    }
}

impl Location for MemoryLocation {
    fn fragment(&self) -> Option<String> {
        self.fragment
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_fragment(&self, fragment: Option<&str>) {
        *self
            .fragment
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fragment.map(str::to_string);
    }
}

pub fn encode_fragment(task_name: &str) -> String {
    urlencoding::encode(task_name).into_owned()
}

/// Decodes a fragment, tolerating a leading `#` and falling back to the raw
/// text when it is not valid percent-encoding.
pub fn decode_fragment(fragment: &str) -> String {
    let raw = fragment.strip_prefix('#').unwrap_or(fragment);
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

pub struct DetailCoordinator {
    service: Arc<dyn CatalogService>,
    store: BoardStore,
    location: Arc<dyn Location>,
    restored: AtomicBool,
}

impl DetailCoordinator {
    pub(crate) fn new(
        service: Arc<dyn CatalogService>,
        store: BoardStore,
        location: Arc<dyn Location>,
    ) -> Self {
        Self {
            service,
            store,
            location,
            restored: AtomicBool::new(false),
        }
    }

    pub fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    /// Makes `task` the open detail and mirrors its name into the fragment.
    /// Solvers are re-fetched on every open; a list cached earlier this
    /// session stays visible until the new one lands.
    pub async fn open(&self, task: Task) -> BoardResult<()> {
        let task_id = task.id;
        let fragment = encode_fragment(&task.name);
        let cached = self
            .store
            .update(|state| {
                state.open_detail(task);
                state.has_cached_solvers(task_id)
            })
            .await;
        self.location.set_fragment(Some(&fragment));
        debug!(task_id = task_id.0, %fragment, cached, "board: detail opened");
        self.store.emit(BoardEvent::DetailOpened(task_id));

        self.load_solvers(task_id).await.map(|_| ())
    }

    pub async fn close(&self) {
        self.store.update(|state| state.close_detail()).await;
        self.location.set_fragment(None);
        debug!("board: detail closed");
        self.store.emit(BoardEvent::DetailClosed);
    }

    /// Re-fetches the open task's solvers, overwriting the cached list.
    pub async fn reload_solvers(&self) -> BoardResult<Option<Vec<SolverEntry>>> {
        let active = self
            .store
            .read(|state| state.active.as_ref().map(|task| task.id))
            .await;
        match active {
            Some(task_id) => self.load_solvers(task_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Opens the task named by the fragment, at most once per coordinator.
    /// Must run after the initial catalog fetch. A fragment naming no task is
    /// left as is.
    pub async fn restore_from_location(&self) -> BoardResult<Option<Task>> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        let Some(fragment) = self.location.fragment().filter(|f| !f.is_empty()) else {
            return Ok(None);
        };

        let name = decode_fragment(&fragment);
        let found = self
            .store
            .read(|state| state.task_named(&name).cloned())
            .await;
        let Some(task) = found else {
            debug!(fragment = %fragment, "board: fragment names no known task");
            return Ok(None);
        };

        info!(task_id = task.id.0, "board: reopening task from fragment");
        if let Err(err) = self.open(task.clone()).await {
            warn!(task_id = task.id.0, "board: solvers unavailable for restored task: {err}");
        }
        Ok(Some(task))
    }

    async fn load_solvers(&self, task_id: TaskId) -> BoardResult<Vec<SolverEntry>> {
        let solvers = self.service.fetch_solvers(task_id).await?;
        let count = solvers.len();
        self.store
            .update(|state| state.cache_solvers(task_id, solvers.clone()))
            .await;
        self.store.emit(BoardEvent::SolversLoaded {
            task_id,
            solvers: count,
        });
        Ok(solvers)
    }
}
