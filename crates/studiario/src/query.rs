//! Filtering, ordering and aggregation over the task collection
//!
//! Pure functions over a task slice. The web handlers recompute these on
//! every render; nothing here mutates or persists.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::types::Task;

/// Tasks whose subject contains `filter` case-insensitively, ordered by
/// deadline ascending. An empty filter matches everything.
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: &str) -> Vec<&'a Task> {
    let needle = filter.to_lowercase();
    let mut matched: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.subject.to_lowercase().contains(&needle))
        .collect();
    matched.sort_by(|a, b| deadline_order(a, b));
    matched
}

/// Ascending by parsed deadline. Unparseable deadlines sort after all
/// valid dates; ties fall back to byte-wise string order so the result
/// is deterministic.
fn deadline_order(a: &Task, b: &Task) -> Ordering {
    match (a.deadline_date(), b.deadline_date()) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.deadline.cmp(&b.deadline),
    }
}

/// Aggregated dashboard numbers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dashboard {
    /// Subject to task count, in first-appearance order
    pub subjects: Vec<(String, usize)>,
    pub completed: usize,
    pub total: usize,
}

impl Dashboard {
    /// Completion percentage, rounded; 0 when there are no tasks
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).round() as u32
    }
}

/// Recompute the dashboard from the full, unfiltered collection
pub fn dashboard(tasks: &[Task]) -> Dashboard {
    let mut subjects: Vec<(String, usize)> = Vec::new();
    let mut completed = 0;

    for task in tasks {
        match subjects.iter_mut().find(|(name, _)| *name == task.subject) {
            Some((_, count)) => *count += 1,
            None => subjects.push((task.subject.clone(), 1)),
        }
        if task.completed {
            completed += 1;
        }
    }

    Dashboard {
        subjects,
        completed,
        total: tasks.len(),
    }
}

/// Tasks whose deadline string equals `date` exactly (calendar view)
pub fn tasks_on<'a>(tasks: &'a [Task], date: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.deadline == date).collect()
}

/// Tasks due today or tomorrow, matched on the exact date string
pub fn due_soon(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    let today_str = today.format("%Y-%m-%d").to_string();
    let tomorrow_str = (today + chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    tasks
        .iter()
        .filter(|t| t.deadline == today_str || t.deadline == tomorrow_str)
        .collect()
}
