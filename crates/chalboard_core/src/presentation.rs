//! Filtering and ordering of the catalog into the list the board shows.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::{Deserialize, Serialize};
use shared::domain::{CompletionState, SortKey, Task};

use crate::completion::CompletionIndex;

/// Active filters. An empty set on either axis matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub categories: BTreeSet<String>,
    pub completion: BTreeSet<CompletionState>,
}

impl FilterSet {
    /// Every given category and both completion states.
    pub fn all<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            completion: CompletionState::ALL.into_iter().collect(),
        }
    }

    pub fn matches(&self, task: &Task, index: &CompletionIndex) -> bool {
        self.categories.contains(&task.category)
            && self.completion.contains(&index.state_of(task.id))
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::all(std::iter::empty::<String>())
    }
}

/// Sorted distinct categories of a catalog.
pub fn categories_of(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| task.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the presentation list. Inputs are left untouched; the sort is
/// stable so equal keys keep catalog order.
pub fn present(
    tasks: &[Task],
    index: &CompletionIndex,
    filters: &FilterSet,
    sort_key: SortKey,
) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| filters.matches(task, index))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare(sort_key, a, b));
    visible
}

pub fn compare(sort_key: SortKey, a: &Task, b: &Task) -> Ordering {
    match sort_key {
        SortKey::NameAsc => fold_case(&a.name).cmp(&fold_case(&b.name)),
        SortKey::NameDesc => fold_case(&b.name).cmp(&fold_case(&a.name)),
        // Category direction flips; the points tie-break is always ascending.
        SortKey::CategoryAsc => fold_case(&a.category)
            .cmp(&fold_case(&b.category))
            .then(a.value.cmp(&b.value)),
        SortKey::CategoryDesc => fold_case(&b.category)
            .cmp(&fold_case(&a.category))
            .then(a.value.cmp(&b.value)),
        SortKey::PointsAsc => a.value.cmp(&b.value),
        SortKey::PointsDesc => b.value.cmp(&a.value),
    }
}

fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
