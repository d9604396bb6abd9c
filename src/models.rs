use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(raw: &str) -> Option<Priority> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn next(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl Status {
    /// Accepts `inprogress`, `in_progress` and `in-progress` alike.
    pub fn parse(raw: &str) -> Option<Status> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "todo" => Some(Status::Todo),
            "inprogress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn from_completed(completed: bool) -> Status {
        if completed {
            Status::Completed
        } else {
            Status::Todo
        }
    }

    pub fn is_completed(self) -> bool {
        self == Status::Completed
    }

    pub fn next(self) -> Status {
        match self {
            Status::Todo => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::Todo,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Todo => "Todo",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// A todo as held by the store. `completed` always mirrors `status`.
#[derive(Clone, Debug, PartialEq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// `None` when the backend sent a priority we do not recognise.
    pub priority: Option<Priority>,
    pub due_date: NaiveDate,
    pub status: Status,
    pub subtasks: Vec<Subtask>,
}

// Backend ids are numeric in some deployments and strings in others
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SubtaskRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A todo exactly as the backend returns it, before normalisation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubtaskRecord>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TodoRecord {
    /// Fills in defaults and reconciles `status` with `completed`.
    ///
    /// A recognised `status` wins; otherwise the status is derived from
    /// `completed`. Missing or malformed due dates fall back to `today`.
    pub fn normalize(self, today: NaiveDate) -> Todo {
        let id = self.id.to_string();

        let status = match self.status.as_deref().map(Status::parse) {
            Some(Some(status)) => status,
            Some(None) => {
                warn!(todo = %id, status = ?self.status, "unrecognised status, deriving from completed");
                Status::from_completed(self.completed.unwrap_or(false))
            }
            None => Status::from_completed(self.completed.unwrap_or(false)),
        };

        let priority = match self.priority.as_deref() {
            None | Some("") => Some(Priority::default()),
            Some(raw) => Priority::parse(raw),
        };

        let due_date = match self.due_date.as_deref() {
            None | Some("") => today,
            Some(raw) => parse_due_date(raw).unwrap_or_else(|| {
                warn!(todo = %id, due_date = raw, "unparseable due date, using today");
                today
            }),
        };

        let subtasks = self
            .subtasks
            .unwrap_or_default()
            .into_iter()
            .map(|s| Subtask {
                id: s.id.to_string(),
                title: s.title,
                completed: s.completed,
            })
            .collect();

        Todo {
            id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            completed: status.is_completed(),
            priority,
            due_date,
            status,
            subtasks,
        }
    }
}

// Accepts plain dates as well as full timestamps such as 2024-06-01T00:00:00Z
fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Body of a create request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub due_date: NaiveDate,
    pub status: Status,
    pub subtasks: Vec<Subtask>,
}

impl TodoDraft {
    pub fn normalized(mut self) -> Self {
        self.completed = self.status.is_completed();
        self
    }
}

/// Body of an update request. Unset fields are left out of the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

impl TodoPatch {
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self.completed = Some(status.is_completed());
        self
    }

    /// Makes `status` and `completed` agree. When both are set and disagree,
    /// `status` wins.
    pub fn normalized(mut self) -> Self {
        match (self.status, self.completed) {
            (Some(status), _) => self.completed = Some(status.is_completed()),
            (None, Some(completed)) => self.status = Some(Status::from_completed(completed)),
            (None, None) => {}
        }
        self
    }
}

impl From<&Todo> for TodoPatch {
    fn from(todo: &Todo) -> Self {
        TodoPatch {
            title: Some(todo.title.clone()),
            description: Some(todo.description.clone()),
            completed: Some(todo.completed),
            priority: todo.priority,
            due_date: Some(todo.due_date),
            status: Some(todo.status),
            subtasks: Some(todo.subtasks.clone()),
        }
    }
}
