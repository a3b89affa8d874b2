use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// All priorities, in form-select order
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// CSS class for the coloured left border on list items
    pub fn css_class(&self) -> &'static str {
        match self {
            Priority::Low => "priority-low",
            Priority::Medium => "priority-medium",
            Priority::High => "priority-high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single study task
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    /// Creation timestamp in milliseconds; unique within the collection
    pub id: i64,

    /// Short description of the work
    pub name: String,

    /// Due date in YYYY-MM-DD format, as entered in the date picker
    pub deadline: String,

    /// Priority level
    pub priority: Priority,

    /// Subject the task belongs to
    pub subject: String,

    /// Whether the task has been completed
    pub completed: bool,
}

/// Visual urgency of a task relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Deadline is before today
    PastDue,
    /// Deadline is 1 or 2 days away
    Urgent,
    Normal,
}

impl Task {
    /// Parse the deadline string, `None` when it is not a valid date
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.deadline, "%Y-%m-%d").ok()
    }

    /// Days between today and the deadline, negative when past due
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        self.deadline_date().map(|due| (due - today).num_days())
    }

    pub fn urgency(&self, today: NaiveDate) -> Urgency {
        match self.days_left(today) {
            Some(days) if days < 0 => Urgency::PastDue,
            Some(1) | Some(2) => Urgency::Urgent,
            _ => Urgency::Normal,
        }
    }
}
