//! Pure computations from a store snapshot to the values the UI renders.

use crate::models::{Priority, Status, Todo};
use chrono::NaiveDate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Todo,
    InProgress,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Todo,
        StatusFilter::InProgress,
        StatusFilter::Completed,
    ];

    pub fn next(self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Todo,
            StatusFilter::Todo => StatusFilter::InProgress,
            StatusFilter::InProgress => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Todo => "Todo",
            StatusFilter::InProgress => "In Progress",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Todo => status == Status::Todo,
            StatusFilter::InProgress => status == Status::InProgress,
            StatusFilter::Completed => status == Status::Completed,
        }
    }
}

/// Keeps the items whose status matches `filter`, in store order.
pub fn filter_by_status(todos: &[Todo], filter: StatusFilter) -> Vec<&Todo> {
    todos.iter().filter(|todo| filter.matches(todo.status)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
    pub ratio: f64,
}

impl SubtaskProgress {
    /// A progress bar is only drawn for items that have subtasks.
    pub fn is_visible(&self) -> bool {
        self.total > 0
    }

    pub fn percent(&self) -> u16 {
        (self.ratio * 100.0).round() as u16
    }
}

pub fn subtask_progress(item: &Todo) -> SubtaskProgress {
    let total = item.subtasks.len();
    let completed = item.subtasks.iter().filter(|s| s.completed).count();
    let ratio = if total > 0 {
        completed as f64 / total as f64
    } else {
        0.0
    };
    SubtaskProgress {
        completed,
        total,
        ratio,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriorityClass {
    Green,
    Amber,
    Red,
    Unknown,
}

pub fn priority_class(priority: Option<Priority>) -> PriorityClass {
    match priority {
        Some(Priority::Low) => PriorityClass::Green,
        Some(Priority::Medium) => PriorityClass::Amber,
        Some(Priority::High) => PriorityClass::Red,
        None => PriorityClass::Unknown,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    Upcoming,
}

/// Calendar-date comparison; an item due today is still upcoming.
pub fn overdue_status(due_date: NaiveDate, reference: NaiveDate) -> DueStatus {
    if due_date < reference {
        DueStatus::Overdue
    } else {
        DueStatus::Upcoming
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressClass {
    Overdue,
    Strong,
    Medium,
    Light,
}

pub fn progress_class(
    progress: &SubtaskProgress,
    due_date: NaiveDate,
    reference: NaiveDate,
) -> ProgressClass {
    if overdue_status(due_date, reference) == DueStatus::Overdue {
        return ProgressClass::Overdue;
    }
    if progress.ratio >= 0.75 {
        ProgressClass::Strong
    } else if progress.ratio >= 0.5 {
        ProgressClass::Medium
    } else {
        ProgressClass::Light
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusSummary {
    pub fn count(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total,
            StatusFilter::Todo => self.todo,
            StatusFilter::InProgress => self.in_progress,
            StatusFilter::Completed => self.completed,
        }
    }
}

pub fn status_summary(todos: &[Todo]) -> StatusSummary {
    todos
        .iter()
        .fold(StatusSummary::default(), |mut summary, todo| {
            summary.total += 1;
            match todo.status {
                Status::Todo => summary.todo += 1,
                Status::InProgress => summary.in_progress += 1,
                Status::Completed => summary.completed += 1,
            }
            summary
        })
}
