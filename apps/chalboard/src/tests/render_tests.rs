use super::*;
use std::collections::BTreeSet;

use chalboard_core::FilterSet;
use shared::domain::{SolverEntry, SortKey, Task, TaskId};

fn sample_view() -> BoardView {
    let a = Task {
        id: TaskId(1),
        name: "A".to_string(),
        category: "web".to_string(),
        value: 100,
    };
    let b = Task {
        id: TaskId(2),
        name: "B".to_string(),
        category: "pwn".to_string(),
        value: 50,
    };
    BoardView {
        visible_tasks: vec![b.clone(), a],
        solved_task_ids: BTreeSet::from([TaskId(2)]),
        total_points: 150,
        solved_points: 50,
        catalog_loading: false,
        solves_loading: false,
        active_task: Some(b),
        active_task_solvers: Some(vec![SolverEntry {
            name: "team rocket".to_string(),
            id: Some(4),
        }]),
        feedback: None,
        submission_pending: false,
        filters: FilterSet::all(["pwn", "web"]),
        sort_key: SortKey::PointsAsc,
        categories: vec!["pwn".to_string(), "web".to_string()],
    }
}

#[test]
fn board_marks_solved_rows_and_prints_totals() {
    let text = board(&sample_view());
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[1].starts_with("* B"), "unexpected row: {}", lines[1]);
    assert!(lines[2].starts_with("  A"), "unexpected row: {}", lines[2]);
    assert!(text.contains("solved: 50 / 150 points (33%)"));
}

#[test]
fn board_reports_loading_catalog() {
    let mut view = sample_view();
    view.catalog_loading = true;
    assert_eq!(board(&view), "loading challenges...\n");
}

#[test]
fn detail_lists_solvers() {
    let text = detail(&sample_view());
    assert!(text.starts_with("B [pwn] 50 points (solved)"));
    assert!(text.contains("  team rocket"));
}

#[test]
fn feedback_line_names_status() {
    let line = feedback(&AttemptFeedback {
        status: AttemptStatus::Incorrect,
        message: "Incorrect".to_string(),
    });
    assert_eq!(line, "incorrect: Incorrect");
}
