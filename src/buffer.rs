use crate::api::TodoApi;
use crate::error::TodoError;
use crate::models::{Priority, Status, Subtask, Todo, TodoDraft, TodoPatch};
use crate::parser::{parse_task_input, ParsedTask};
use crate::store::TodoStore;
use chrono::{Days, NaiveDate};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferMode {
    Create,
    Edit(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Priority,
    DueDate,
    Status,
    Subtask(usize),
}

/// Uncommitted fields of a todo being created or edited.
///
/// The buffer owns its own copy of every field, including the subtask list,
/// so nothing done here is visible in the store until `commit` succeeds.
#[derive(Clone, Debug)]
pub struct EditBuffer {
    mode: BufferMode,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub status: Status,
    pub subtasks: Vec<Subtask>,
    pub focus: Field,
    next_subtask_id: u64,
}

/// A rejected commit hands the buffer back so the user can retry.
#[derive(Debug)]
pub struct CommitError {
    pub buffer: EditBuffer,
    pub error: TodoError,
}

impl EditBuffer {
    pub fn open_create(today: NaiveDate) -> EditBuffer {
        EditBuffer {
            mode: BufferMode::Create,
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: today,
            status: Status::Todo,
            subtasks: Vec::new(),
            focus: Field::Title,
            next_subtask_id: 1,
        }
    }

    pub fn open_edit(source: &Todo) -> EditBuffer {
        let next_subtask_id = source
            .subtasks
            .iter()
            .filter_map(|s| s.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max.saturating_add(1));

        EditBuffer {
            mode: BufferMode::Edit(source.id.clone()),
            title: source.title.clone(),
            description: source.description.clone(),
            priority: source.priority.unwrap_or_default(),
            due_date: source.due_date,
            status: source.status,
            subtasks: source.subtasks.clone(),
            focus: Field::Title,
            next_subtask_id,
        }
    }

    pub fn mode(&self) -> &BufferMode {
        &self.mode
    }

    pub fn add_subtask(&mut self) -> String {
        // Wraps to 1 once the numeric space is exhausted
        let step = |n: u64| n.checked_add(1).unwrap_or(1);
        let mut candidate = self.next_subtask_id;
        while self.subtasks.iter().any(|s| s.id == candidate.to_string()) {
            candidate = step(candidate);
        }
        self.next_subtask_id = step(candidate);

        let id = candidate.to_string();
        self.subtasks.push(Subtask {
            id: id.clone(),
            title: String::new(),
            completed: false,
        });
        self.focus = Field::Subtask(self.subtasks.len() - 1);
        id
    }

    pub fn update_subtask_title(&mut self, id: &str, text: &str) {
        if let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == id) {
            subtask.title = text.to_string();
        }
    }

    pub fn toggle_subtask_completed(&mut self, id: &str) {
        if let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == id) {
            subtask.completed = !subtask.completed;
        }
    }

    pub fn remove_subtask(&mut self, id: &str) {
        self.subtasks.retain(|s| s.id != id);
        if let Field::Subtask(i) = self.focus {
            self.focus = match self.subtasks.len() {
                0 => Field::Status,
                len => Field::Subtask(i.min(len - 1)),
            };
        }
    }

    pub fn focused_subtask_id(&self) -> Option<String> {
        match self.focus {
            Field::Subtask(i) => self.subtasks.get(i).map(|s| s.id.clone()),
            _ => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Field::Title => Field::Description,
            Field::Description => Field::Priority,
            Field::Priority => Field::DueDate,
            Field::DueDate => Field::Status,
            Field::Status if self.subtasks.is_empty() => Field::Title,
            Field::Status => Field::Subtask(0),
            Field::Subtask(i) if i + 1 < self.subtasks.len() => Field::Subtask(i + 1),
            Field::Subtask(_) => Field::Title,
        };
    }

    /// Whether the focused field accepts typed text.
    pub fn focus_is_text(&self) -> bool {
        matches!(
            self.focus,
            Field::Title | Field::Description | Field::Subtask(_)
        )
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Field::Title => self.title.push(c),
            Field::Description => self.description.push(c),
            Field::Subtask(i) => {
                if let Some(subtask) = self.subtasks.get(i) {
                    let (id, text) = (subtask.id.clone(), format!("{}{}", subtask.title, c));
                    self.update_subtask_title(&id, &text);
                }
            }
            _ => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            Field::Title => {
                self.title.pop();
            }
            Field::Description => {
                self.description.pop();
            }
            Field::Subtask(i) => {
                if let Some(subtask) = self.subtasks.get(i) {
                    let mut text = subtask.title.clone();
                    text.pop();
                    let id = subtask.id.clone();
                    self.update_subtask_title(&id, &text);
                }
            }
            _ => {}
        }
    }

    pub fn cycle_priority(&mut self) {
        self.priority = self.priority.next();
    }

    pub fn cycle_status(&mut self) {
        self.status = self.status.next();
    }

    pub fn shift_due_date(&mut self, days: i64) {
        let shifted = if days >= 0 {
            self.due_date.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.due_date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(date) = shifted {
            self.due_date = date;
        }
    }

    /// Validates and dispatches the buffer. Success consumes it; on failure
    /// the buffer comes back unchanged inside the error.
    pub async fn commit<A: TodoApi>(self, store: &mut TodoStore<A>) -> Result<(), CommitError> {
        if self.title.trim().is_empty() {
            return Err(CommitError {
                buffer: self,
                error: TodoError::ValidationFailed,
            });
        }

        // Quick-add tokens only apply to new tasks; existing titles are kept verbatim
        let parsed = match self.mode {
            BufferMode::Create => parse_task_input(&self.title),
            BufferMode::Edit(_) => ParsedTask {
                title: self.title.trim().to_string(),
                priority: None,
                due_date: None,
            },
        };
        if parsed.title.is_empty() {
            return Err(CommitError {
                buffer: self,
                error: TodoError::ValidationFailed,
            });
        }
        let priority = parsed.priority.unwrap_or(self.priority);
        let due_date = parsed.due_date.unwrap_or(self.due_date);
        debug!(mode = ?self.mode, title = %parsed.title, "committing edit buffer");

        let result = match &self.mode {
            BufferMode::Create => {
                let draft = TodoDraft {
                    title: parsed.title,
                    description: self.description.clone(),
                    completed: self.status.is_completed(),
                    priority: Some(priority),
                    due_date,
                    status: self.status,
                    subtasks: self.subtasks.clone(),
                };
                store.create(draft).await
            }
            BufferMode::Edit(id) => {
                let patch = TodoPatch {
                    title: Some(parsed.title),
                    description: Some(self.description.clone()),
                    completed: None,
                    priority: Some(priority),
                    due_date: Some(due_date),
                    status: None,
                    subtasks: Some(self.subtasks.clone()),
                }
                .with_status(self.status);
                store.update(id, patch).await
            }
        };

        result.map_err(|error| CommitError {
            buffer: self,
            error,
        })
    }

    /// Closes the buffer without touching the store.
    pub fn discard(self) {
        debug!(mode = ?self.mode, "discarded edit buffer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use serde_json::json;
    use std::collections::HashSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn loaded_store() -> TodoStore<FakeApi> {
        let mut store = TodoStore::new(FakeApi::with_records(vec![json!({
            "id": "1",
            "title": "Plan trip",
            "description": "Summer",
            "completed": false,
            "status": "todo",
            "priority": "high",
            "dueDate": "2024-06-01",
            "subtasks": [
                { "id": "1", "title": "Book flights", "completed": false },
                { "id": "2", "title": "Pack", "completed": true }
            ]
        })]));
        store.list().await.unwrap();
        store
    }

    #[test]
    fn test_open_create_defaults() {
        let buffer = EditBuffer::open_create(date("2024-06-01"));
        assert_eq!(buffer.mode(), &BufferMode::Create);
        assert_eq!(buffer.title, "");
        assert_eq!(buffer.priority, Priority::Medium);
        assert_eq!(buffer.due_date, date("2024-06-01"));
        assert_eq!(buffer.status, Status::Todo);
        assert!(buffer.subtasks.is_empty());
    }

    #[tokio::test]
    async fn test_edit_then_discard_leaves_store_untouched() {
        let store = loaded_store().await;
        let original = store.get("1").unwrap().subtasks.clone();

        let mut buffer = EditBuffer::open_edit(store.get("1").unwrap());
        buffer.update_subtask_title("1", "Book trains");
        buffer.toggle_subtask_completed("2");
        buffer.remove_subtask("1");
        buffer.add_subtask();
        buffer.discard();

        assert_eq!(store.get("1").unwrap().subtasks, original);
        assert_eq!(store.api().calls(), vec!["GET /todos"]);
    }

    #[tokio::test]
    async fn test_new_subtask_ids_do_not_collide() {
        let store = loaded_store().await;
        let mut buffer = EditBuffer::open_edit(store.get("1").unwrap());

        let a = buffer.add_subtask();
        let b = buffer.add_subtask();

        assert_eq!(a, "3");
        assert_eq!(b, "4");
        let ids: HashSet<_> = buffer.subtasks.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_subtask_edits_by_id() {
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        let first = buffer.add_subtask();
        let second = buffer.add_subtask();

        buffer.update_subtask_title(&first, "Buy paint");
        buffer.toggle_subtask_completed(&second);
        assert_eq!(buffer.subtasks[0].title, "Buy paint");
        assert!(buffer.subtasks[1].completed);

        buffer.remove_subtask(&first);
        assert_eq!(buffer.subtasks.len(), 1);
        assert_eq!(buffer.subtasks[0].id, second);
        assert_eq!(buffer.focus, Field::Subtask(0));
    }

    #[tokio::test]
    async fn test_commit_rejects_blank_title() {
        let mut store = loaded_store().await;
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        buffer.title = "   ".to_string();
        buffer.add_subtask();

        let err = buffer.commit(&mut store).await.unwrap_err();

        assert_eq!(err.error, TodoError::ValidationFailed);
        assert_eq!(err.buffer.subtasks.len(), 1);
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.api().calls(), vec!["GET /todos"]);
    }

    #[tokio::test]
    async fn test_commit_create_applies_quick_add_tokens() {
        let mut store = loaded_store().await;
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        buffer.title = "Renew passport !high @2024-09-30".to_string();

        buffer.commit(&mut store).await.unwrap();

        let created = store.todos().last().unwrap();
        assert_eq!(created.title, "Renew passport");
        assert_eq!(created.priority, Some(Priority::High));
        assert_eq!(created.due_date, date("2024-09-30"));
        assert_eq!(created.status, Status::Todo);
        assert!(!created.completed);
    }

    #[tokio::test]
    async fn test_commit_edit_updates_store() {
        let mut store = loaded_store().await;
        let mut buffer = EditBuffer::open_edit(store.get("1").unwrap());
        buffer.title = "Plan summer trip".to_string();
        buffer.cycle_status();
        buffer.cycle_status();
        buffer.toggle_subtask_completed("1");

        buffer.commit(&mut store).await.unwrap();

        let todo = store.get("1").unwrap();
        assert_eq!(todo.title, "Plan summer trip");
        assert_eq!(todo.status, Status::Completed);
        assert!(todo.completed);
        assert!(todo.subtasks.iter().all(|s| s.completed));
        assert_eq!(
            store.api().calls(),
            vec!["GET /todos", "PUT /todos/1", "GET /todos"]
        );
    }

    #[tokio::test]
    async fn test_failed_commit_returns_buffer() {
        let mut store = loaded_store().await;
        store.api().fail_writes.set(true);
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        buffer.title = "Call the bank".to_string();

        let err = buffer.commit(&mut store).await.unwrap_err();

        assert!(matches!(err.error, TodoError::SaveFailed(_)));
        assert_eq!(err.buffer.title, "Call the bank");
    }

    #[test]
    fn test_shift_due_date_both_ways() {
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        buffer.shift_due_date(1);
        assert_eq!(buffer.due_date, date("2024-06-02"));
        buffer.shift_due_date(-2);
        assert_eq!(buffer.due_date, date("2024-05-31"));
    }

    #[test]
    fn test_add_subtask_after_max_id_does_not_overflow() {
        let mut source = Todo {
            id: "9".to_string(),
            title: "Archive".to_string(),
            description: String::new(),
            completed: false,
            priority: Some(Priority::Low),
            due_date: date("2024-06-01"),
            status: Status::Todo,
            subtasks: vec![Subtask {
                id: u64::MAX.to_string(),
                title: "Imported".to_string(),
                completed: false,
            }],
        };
        let mut buffer = EditBuffer::open_edit(&source);

        let a = buffer.add_subtask();
        let b = buffer.add_subtask();

        assert_eq!(a, "1");
        assert_eq!(b, "2");
        let ids: HashSet<_> = buffer.subtasks.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 3);

        source.subtasks.push(Subtask {
            id: "1".to_string(),
            title: "Taken".to_string(),
            completed: false,
        });
        let mut buffer = EditBuffer::open_edit(&source);
        assert_eq!(buffer.add_subtask(), "2");
    }

    #[tokio::test]
    async fn test_edit_keeps_token_like_text_in_title() {
        let mut store = loaded_store().await;
        let mut buffer = EditBuffer::open_edit(store.get("1").unwrap());
        buffer.title = "Plan trip !2 stops @2024-01-01".to_string();

        buffer.commit(&mut store).await.unwrap();

        let todo = store.get("1").unwrap();
        assert_eq!(todo.title, "Plan trip !2 stops @2024-01-01");
        assert_eq!(todo.priority, Some(Priority::High));
        assert_eq!(todo.due_date, date("2024-06-01"));
    }

    #[test]
    fn test_focus_cycles_through_subtasks() {
        let mut buffer = EditBuffer::open_create(date("2024-06-01"));
        buffer.add_subtask();
        buffer.focus = Field::Status;
        buffer.focus_next();
        assert_eq!(buffer.focus, Field::Subtask(0));
        buffer.focus_next();
        assert_eq!(buffer.focus, Field::Title);
    }
}
