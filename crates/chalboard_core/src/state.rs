//! Composed board state and the single channel every component writes through.
//!
//! All transitions are plain methods on [`BoardState`] applied while the store
//! lock is held, so a reader never observes a half-applied update.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use serde::Serialize;
use shared::domain::{
    AttemptFeedback, AttemptStatus, CompletionState, SolveRecord, SolverEntry, SortKey, Task,
    TaskId,
};
use tokio::sync::{broadcast, Mutex};

use crate::{
    completion::{self, CompletionIndex},
    presentation::{self, FilterSet},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Pending { task_id: TaskId },
    Feedback(AttemptFeedback),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    CatalogReplaced { tasks: usize },
    SolvesReplaced { solves: usize },
    FiltersChanged,
    SortChanged(SortKey),
    DetailOpened(TaskId),
    DetailClosed,
    SolversLoaded { task_id: TaskId, solvers: usize },
    FeedbackChanged(Option<AttemptFeedback>),
    RefreshFailed(String),
}

/// Read model handed to presentation. Built in one pass under the store lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub visible_tasks: Vec<Task>,
    pub solved_task_ids: BTreeSet<TaskId>,
    pub total_points: u64,
    pub solved_points: u64,
    pub catalog_loading: bool,
    pub solves_loading: bool,
    pub active_task: Option<Task>,
    pub active_task_solvers: Option<Vec<SolverEntry>>,
    pub feedback: Option<AttemptFeedback>,
    pub submission_pending: bool,
    pub filters: FilterSet,
    pub sort_key: SortKey,
    pub categories: Vec<String>,
}

impl BoardView {
    pub fn progress_loading(&self) -> bool {
        self.catalog_loading || self.solves_loading
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        self.solved_points as f64 / self.total_points as f64
    }

    pub fn is_solved(&self, task_id: TaskId) -> bool {
        self.solved_task_ids.contains(&task_id)
    }
}

#[derive(Debug)]
pub struct BoardState {
    pub(crate) tasks: Vec<Task>,
    pub(crate) solves: Vec<SolveRecord>,
    pub(crate) index: CompletionIndex,
    pub(crate) categories: Vec<String>,
    pub(crate) filters: FilterSet,
    pub(crate) categories_customized: bool,
    pub(crate) sort_key: SortKey,
    pub(crate) catalog_loading: bool,
    pub(crate) solves_loading: bool,
    pub(crate) active: Option<Task>,
    pub(crate) solvers: HashMap<TaskId, Vec<SolverEntry>>,
    pub(crate) submission: SubmissionPhase,
    pub(crate) attempt_seq: u64,
    pub(crate) feedback_seq: u64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            solves: Vec::new(),
            index: CompletionIndex::default(),
            categories: Vec::new(),
            filters: FilterSet::default(),
            categories_customized: false,
            sort_key: SortKey::default(),
            catalog_loading: true,
            solves_loading: true,
            active: None,
            solvers: HashMap::new(),
            submission: SubmissionPhase::Idle,
            attempt_seq: 0,
            feedback_seq: 0,
        }
    }
}

impl BoardState {
    pub fn replace_catalog(&mut self, tasks: Vec<Task>) {
        self.categories = presentation::categories_of(&tasks);
        if self.categories_customized {
            let known = &self.categories;
            self.filters
                .categories
                .retain(|category| known.contains(category));
        } else {
            self.filters.categories = self.categories.iter().cloned().collect();
        }
        self.tasks = tasks;
        self.catalog_loading = false;
    }

    pub fn replace_solves(&mut self, solves: Vec<SolveRecord>) {
        self.index = CompletionIndex::from_solves(&solves);
        self.solves = solves;
        self.solves_loading = false;
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        self.categories_customized = filters.categories.is_empty()
            || filters.categories.len() != self.categories.len()
            || !self
                .categories
                .iter()
                .all(|category| filters.categories.contains(category));
        self.filters = filters;
    }

    pub fn set_category_filters(&mut self, categories: impl IntoIterator<Item = String>) {
        let filters = FilterSet {
            categories: categories.into_iter().collect(),
            completion: self.filters.completion.clone(),
        };
        self.set_filters(filters);
    }

    pub fn set_completion_filters(&mut self, completion: impl IntoIterator<Item = CompletionState>) {
        self.filters.completion = completion.into_iter().collect();
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    /// Opening a task always drops whatever feedback was on screen.
    pub fn open_detail(&mut self, task: Task) {
        self.active = Some(task);
        self.clear_feedback();
    }

    pub fn close_detail(&mut self) {
        self.active = None;
        self.clear_feedback();
    }

    pub fn cache_solvers(&mut self, task_id: TaskId, solvers: Vec<SolverEntry>) {
        self.solvers.insert(task_id, solvers);
    }

    pub fn has_cached_solvers(&self, task_id: TaskId) -> bool {
        self.solvers.contains_key(&task_id)
    }

    pub fn task_named(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Starts a new attempt, replacing any feedback still shown, and returns
    /// its sequence number.
    pub fn begin_attempt(&mut self, task_id: TaskId) -> u64 {
        self.attempt_seq += 1;
        self.submission = SubmissionPhase::Pending { task_id };
        self.attempt_seq
    }

    /// Responses are applied in arrival order; the last one to land wins.
    /// Returns the number of the feedback now shown.
    pub fn finish_attempt(&mut self, feedback: AttemptFeedback) -> u64 {
        self.feedback_seq += 1;
        self.submission = SubmissionPhase::Feedback(feedback);
        self.feedback_seq
    }

    /// A lost request returns to idle without feedback, unless a newer
    /// attempt has already taken over.
    pub fn abandon_attempt(&mut self, seq: u64) {
        if self.attempt_seq == seq && matches!(self.submission, SubmissionPhase::Pending { .. }) {
            self.submission = SubmissionPhase::Idle;
        }
    }

    /// Clears incorrect feedback number `seq` if it is still the one shown.
    /// Returns whether anything was cleared.
    pub fn expire_feedback(&mut self, seq: u64) -> bool {
        let incorrect_shown = matches!(
            &self.submission,
            SubmissionPhase::Feedback(feedback) if feedback.status == AttemptStatus::Incorrect
        );
        if self.feedback_seq == seq && incorrect_shown {
            self.submission = SubmissionPhase::Idle;
            return true;
        }
        false
    }

    pub fn feedback(&self) -> Option<&AttemptFeedback> {
        match &self.submission {
            SubmissionPhase::Feedback(feedback) => Some(feedback),
            _ => None,
        }
    }

    fn clear_feedback(&mut self) {
        if matches!(self.submission, SubmissionPhase::Feedback(_)) {
            self.submission = SubmissionPhase::Idle;
        }
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            visible_tasks: presentation::present(
                &self.tasks,
                &self.index,
                &self.filters,
                self.sort_key,
            ),
            solved_task_ids: self.index.iter().collect(),
            total_points: completion::total_points(&self.tasks),
            solved_points: completion::solved_points(&self.solves),
            catalog_loading: self.catalog_loading,
            solves_loading: self.solves_loading,
            active_task: self.active.clone(),
            active_task_solvers: self
                .active
                .as_ref()
                .and_then(|task| self.solvers.get(&task.id).cloned()),
            feedback: self.feedback().cloned(),
            submission_pending: matches!(self.submission, SubmissionPhase::Pending { .. }),
            filters: self.filters.clone(),
            sort_key: self.sort_key,
            categories: self.categories.clone(),
        }
    }
}

/// Shared handle to the board state plus its event fan-out.
#[derive(Clone)]
pub(crate) struct BoardStore {
    state: Arc<Mutex<BoardState>>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for BoardStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
            events,
        }
    }
}

impl BoardStore {
    pub async fn update<R>(&self, apply: impl FnOnce(&mut BoardState) -> R) -> R {
        let mut guard = self.state.lock().await;
        apply(&mut guard)
    }

    pub async fn read<R>(&self, inspect: impl FnOnce(&BoardState) -> R) -> R {
        let guard = self.state.lock().await;
        inspect(&guard)
    }

    pub async fn view(&self) -> BoardView {
        self.read(BoardState::view).await
    }

    pub fn emit(&self, event: BoardEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
