use std::collections::HashSet;

use shared::domain::{CompletionState, SolveRecord, Task, TaskId};

/// Which tasks the current user has solved, derived from the solve records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionIndex {
    solved: HashSet<TaskId>,
}

impl CompletionIndex {
    pub fn from_solves(solves: &[SolveRecord]) -> Self {
        Self {
            solved: solves.iter().map(|solve| solve.task_id).collect(),
        }
    }

    pub fn is_solved(&self, task_id: TaskId) -> bool {
        self.solved.contains(&task_id)
    }

    pub fn state_of(&self, task_id: TaskId) -> CompletionState {
        CompletionState::from_solved(self.is_solved(task_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.solved.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.solved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solved.is_empty()
    }
}

pub fn total_points(tasks: &[Task]) -> u64 {
    tasks.iter().map(|task| task.value).sum()
}

/// Sums the value recorded on each solve, not the task's current value, so a
/// later re-pricing of a task does not rewrite history.
pub fn solved_points(solves: &[SolveRecord]) -> u64 {
    solves.iter().map(|solve| solve.value).sum()
}

#[cfg(test)]
#[path = "tests/completion_tests.rs"]
mod tests;
