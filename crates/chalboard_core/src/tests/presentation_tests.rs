use super::*;
use shared::domain::{SolveRecord, TaskId};

fn task(id: i64, name: &str, category: &str, value: u64) -> Task {
    Task {
        id: TaskId(id),
        name: name.to_string(),
        category: category.to_string(),
        value,
    }
}

fn scenario() -> (Vec<Task>, CompletionIndex) {
    let tasks = vec![task(1, "A", "web", 100), task(2, "B", "pwn", 50)];
    let index = CompletionIndex::from_solves(&[SolveRecord {
        task_id: TaskId(2),
        value: 50,
    }]);
    (tasks, index)
}

fn names(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.name.as_str()).collect()
}

#[test]
fn category_and_completion_filters_combine() {
    let (tasks, index) = scenario();
    let filters = FilterSet {
        categories: ["web".to_string()].into_iter().collect(),
        completion: [CompletionState::NotCompleted].into_iter().collect(),
    };

    let visible = present(&tasks, &index, &filters, SortKey::PointsAsc);
    assert_eq!(names(&visible), vec!["A"]);
}

#[test]
fn empty_filter_axis_yields_empty_list() {
    let (tasks, index) = scenario();

    let mut no_categories = FilterSet::all(categories_of(&tasks));
    no_categories.categories.clear();
    assert!(present(&tasks, &index, &no_categories, SortKey::PointsAsc).is_empty());

    let mut no_completion = FilterSet::all(categories_of(&tasks));
    no_completion.completion.clear();
    assert!(present(&tasks, &index, &no_completion, SortKey::PointsAsc).is_empty());
}

#[test]
fn full_filters_show_everything_sorted_by_points() {
    let (tasks, index) = scenario();
    let filters = FilterSet::all(categories_of(&tasks));

    let visible = present(&tasks, &index, &filters, SortKey::default());
    assert_eq!(names(&visible), vec!["B", "A"]);
    assert_eq!(names(&tasks), vec!["A", "B"], "input must not be reordered");
}

#[test]
fn completed_filter_keeps_only_solved() {
    let (tasks, index) = scenario();
    let mut filters = FilterSet::all(categories_of(&tasks));
    filters.completion = [CompletionState::Completed].into_iter().collect();

    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::NameAsc)),
        vec!["B"]
    );
}

#[test]
fn name_sort_ignores_case() {
    let tasks = vec![
        task(1, "beta", "x", 1),
        task(2, "Alpha", "x", 1),
        task(3, "Charlie", "x", 1),
    ];
    let index = CompletionIndex::default();
    let filters = FilterSet::all(categories_of(&tasks));

    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::NameAsc)),
        vec!["Alpha", "beta", "Charlie"]
    );
    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::NameDesc)),
        vec!["Charlie", "beta", "Alpha"]
    );
}

#[test]
fn category_sort_breaks_ties_by_ascending_points_in_both_directions() {
    let tasks = vec![
        task(1, "w300", "Web", 300),
        task(2, "p100", "pwn", 100),
        task(3, "w100", "web", 100),
        task(4, "p200", "Pwn", 200),
    ];
    let index = CompletionIndex::default();
    let filters = FilterSet::all(categories_of(&tasks));

    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::CategoryAsc)),
        vec!["p100", "p200", "w100", "w300"]
    );
    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::CategoryDesc)),
        vec!["w100", "w300", "p100", "p200"]
    );
}

#[test]
fn points_sort_is_stable_for_equal_values() {
    let tasks = vec![
        task(1, "first", "a", 50),
        task(2, "big", "a", 500),
        task(3, "second", "a", 50),
        task(4, "third", "a", 50),
    ];
    let index = CompletionIndex::default();
    let filters = FilterSet::all(categories_of(&tasks));

    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::PointsAsc)),
        vec!["first", "second", "third", "big"]
    );
    assert_eq!(
        names(&present(&tasks, &index, &filters, SortKey::PointsDesc)),
        vec!["big", "first", "second", "third"]
    );
}

#[test]
fn applying_the_same_inputs_twice_is_idempotent() {
    let (tasks, index) = scenario();
    let filters = FilterSet::all(categories_of(&tasks));

    let once = present(&tasks, &index, &filters, SortKey::CategoryDesc);
    let twice = present(&once, &index, &filters, SortKey::CategoryDesc);
    assert_eq!(once, twice);
}

#[test]
fn categories_are_distinct_and_sorted() {
    let tasks = vec![
        task(1, "a", "web", 1),
        task(2, "b", "crypto", 1),
        task(3, "c", "web", 1),
    ];
    assert_eq!(categories_of(&tasks), vec!["crypto", "web"]);
}
