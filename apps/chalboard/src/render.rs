//! Plain-text rendering of the board read model.

use std::fmt::Write as _;

use chalboard_core::BoardView;
use shared::domain::{AttemptFeedback, AttemptStatus};

pub fn board(view: &BoardView) -> String {
    let mut out = String::new();
    if view.catalog_loading {
        out.push_str("loading challenges...\n");
        return out;
    }

    let name_width = view
        .visible_tasks
        .iter()
        .map(|task| task.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let _ = writeln!(
        out,
        "  {:<name_width$}  {:<12}  {:>6}",
        "name", "category", "points"
    );
    for task in &view.visible_tasks {
        let mark = if view.is_solved(task.id) { "*" } else { " " };
        let _ = writeln!(
            out,
            "{mark} {:<name_width$}  {:<12}  {:>6}",
            task.name, task.category, task.value
        );
    }
    if view.visible_tasks.is_empty() {
        out.push_str("  (no challenges match the current filters)\n");
    }
    out.push_str(&totals(view));
    out
}

pub fn totals(view: &BoardView) -> String {
    if view.solves_loading {
        return format!("total: {} points (solves loading)", view.total_points);
    }
    format!(
        "solved: {} / {} points ({:.0}%)",
        view.solved_points,
        view.total_points,
        view.progress_ratio() * 100.0
    )
}

pub fn detail(view: &BoardView) -> String {
    let Some(task) = &view.active_task else {
        return "no task open".to_string();
    };

    let mut out = format!(
        "{} [{}] {} points{}\n",
        task.name,
        task.category,
        task.value,
        if view.is_solved(task.id) { " (solved)" } else { "" }
    );
    match &view.active_task_solvers {
        None => out.push_str("solvers: loading\n"),
        Some(solvers) if solvers.is_empty() => out.push_str("solvers: none yet\n"),
        Some(solvers) => {
            let _ = writeln!(out, "solvers ({}):", solvers.len());
            for solver in solvers {
                let _ = writeln!(out, "  {}", solver.name);
            }
        }
    }
    out
}

pub fn feedback(feedback: &AttemptFeedback) -> String {
    let label = match feedback.status {
        AttemptStatus::Correct => "correct",
        AttemptStatus::Incorrect => "incorrect",
    };
    format!("{label}: {}", feedback.message)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
