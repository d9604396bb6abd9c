use crate::api::TodoApi;
use crate::error::TodoError;
use crate::models::{today, Status, Todo, TodoDraft, TodoPatch};
use tracing::{debug, error, info};

/// The session's authoritative list of todos.
///
/// Every successful mutation is followed by a full refetch; the list is never
/// patched locally. A failed fetch keeps the last good snapshot.
pub struct TodoStore<A> {
    api: A,
    todos: Vec<Todo>,
    error: Option<TodoError>,
}

impl<A: TodoApi> TodoStore<A> {
    pub fn new(api: A) -> TodoStore<A> {
        TodoStore {
            api,
            todos: Vec::new(),
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn error(&self) -> Option<&TodoError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub async fn list(&mut self) -> Result<(), TodoError> {
        match self.api.fetch_todos().await {
            Ok(records) => {
                let today = today();
                self.todos = records.into_iter().map(|r| r.normalize(today)).collect();
                debug!(count = self.todos.len(), "refreshed todos");
                if matches!(self.error, Some(TodoError::FetchFailed(_))) {
                    self.error = None;
                }
                Ok(())
            }
            Err(err) => {
                error!(%err, "fetching todos failed");
                Err(self.fail(TodoError::FetchFailed(err.to_string())))
            }
        }
    }

    pub async fn create(&mut self, draft: TodoDraft) -> Result<(), TodoError> {
        let draft = draft.normalized();
        if let Err(err) = self.api.create_todo(&draft).await {
            error!(%err, title = %draft.title, "creating todo failed");
            return Err(self.fail(TodoError::SaveFailed(err.to_string())));
        }
        info!(title = %draft.title, "created todo");
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub async fn update(&mut self, id: &str, patch: TodoPatch) -> Result<(), TodoError> {
        let patch = patch.normalized();
        if let Err(err) = self.api.update_todo(id, &patch).await {
            error!(%err, todo = id, "updating todo failed");
            return Err(self.fail(TodoError::SaveFailed(err.to_string())));
        }
        info!(todo = id, "updated todo");
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), TodoError> {
        if let Err(err) = self.api.delete_todo(id).await {
            error!(%err, todo = id, "deleting todo failed");
            return Err(self.fail(TodoError::DeleteFailed(err.to_string())));
        }
        info!(todo = id, "deleted todo");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Flips completion, sending the item's full field set so the backend
    /// does not clear fields it expects on every update.
    pub async fn toggle_complete(&mut self, id: &str) -> Result<(), TodoError> {
        let Some(todo) = self.get(id) else {
            return Err(self.fail(TodoError::SaveFailed(format!("task {} not found", id))));
        };
        let status = if todo.completed {
            Status::Todo
        } else {
            Status::Completed
        };
        let patch = TodoPatch::from(todo).with_status(status);
        self.update(id, patch).await
    }

    fn fail(&mut self, err: TodoError) -> TodoError {
        self.error = Some(err.clone());
        err
    }

    // The mutation already succeeded; a failed refresh only leaves a stale list
    async fn refresh_after_mutation(&mut self) {
        self.error = None;
        let _ = self.list().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::models::{Priority, Subtask};
    use chrono::NaiveDate;
    use serde_json::json;

    fn one_todo_store() -> TodoStore<FakeApi> {
        TodoStore::new(FakeApi::with_records(vec![json!({
            "id": "1",
            "title": "Water plants",
            "completed": false,
            "status": "todo",
            "priority": "low",
            "dueDate": "2024-06-01",
            "subtasks": []
        })]))
    }

    fn draft(title: &str) -> TodoDraft {
        TodoDraft {
            title: title.to_string(),
            description: String::new(),
            completed: false,
            priority: Some(Priority::Medium),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: Status::Todo,
            subtasks: vec![Subtask {
                id: "1".to_string(),
                title: "first".to_string(),
                completed: false,
            }],
        }
    }

    #[tokio::test]
    async fn test_list_replaces_snapshot() {
        let mut store = one_todo_store();
        store.list().await.unwrap();
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.todos()[0].title, "Water plants");
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_list_keeps_previous_snapshot() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        store.api().fail_fetch.set(true);
        let err = store.list().await.unwrap_err();

        assert!(matches!(err, TodoError::FetchFailed(_)));
        assert_eq!(store.error(), Some(&err));
        assert_eq!(store.todos().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_list_clears_fetch_error() {
        let mut store = one_todo_store();
        store.api().fail_fetch.set(true);
        let _ = store.list().await;
        assert!(store.error().is_some());

        store.api().fail_fetch.set(false);
        store.list().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_update_then_refresh() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        let patch = TodoPatch {
            status: Some(Status::Completed),
            completed: Some(true),
            ..TodoPatch::default()
        };
        store.update("1", patch).await.unwrap();

        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.todos()[0].status, Status::Completed);
        assert!(store.todos()[0].completed);
        assert_eq!(
            store.api().calls(),
            vec!["GET /todos", "PUT /todos/1", "GET /todos"]
        );
    }

    #[tokio::test]
    async fn test_create_refreshes_list() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        store.create(draft("Call mum")).await.unwrap();

        assert_eq!(store.todos().len(), 2);
        let created = &store.todos()[1];
        assert_eq!(created.title, "Call mum");
        assert_eq!(created.subtasks.len(), 1);
        assert_eq!(store.api().calls().last().unwrap(), "GET /todos");
    }

    #[tokio::test]
    async fn test_failed_create_surfaces_save_failed() {
        let mut store = one_todo_store();
        store.list().await.unwrap();
        store.api().fail_writes.set(true);

        let err = store.create(draft("Call mum")).await.unwrap_err();

        assert!(matches!(err, TodoError::SaveFailed(_)));
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.api().calls(), vec!["GET /todos", "POST /todos"]);
    }

    #[tokio::test]
    async fn test_delete_removes_after_refresh() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        store.delete("1").await.unwrap();

        assert!(store.todos().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_surfaces_delete_failed() {
        let mut store = one_todo_store();
        store.list().await.unwrap();
        store.api().fail_writes.set(true);

        let err = store.delete("1").await.unwrap_err();

        assert!(matches!(err, TodoError::DeleteFailed(_)));
        assert_eq!(store.todos().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        store.toggle_complete("1").await.unwrap();
        let todo = store.get("1").unwrap();
        assert_eq!(todo.status, Status::Completed);
        assert!(todo.completed);

        store.toggle_complete("1").await.unwrap();
        let todo = store.get("1").unwrap();
        assert_eq!(todo.status, Status::Todo);
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn test_toggle_sends_full_record() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        store.toggle_complete("1").await.unwrap();

        let record = store.api().record("1").unwrap();
        assert_eq!(record["title"], "Water plants");
        assert_eq!(record["priority"], "low");
        assert_eq!(record["status"], "completed");
        assert_eq!(record["completed"], true);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_fails_without_request() {
        let mut store = one_todo_store();
        store.list().await.unwrap();

        let err = store.toggle_complete("missing").await.unwrap_err();

        assert!(matches!(err, TodoError::SaveFailed(_)));
        assert_eq!(store.api().calls(), vec!["GET /todos"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_after_mutation_is_not_a_save_failure() {
        let mut store = one_todo_store();
        store.list().await.unwrap();
        store.api().fail_fetch.set(true);

        store.toggle_complete("1").await.unwrap();

        assert!(matches!(store.error(), Some(TodoError::FetchFailed(_))));
        // stale snapshot retained
        assert_eq!(store.get("1").unwrap().status, Status::Todo);
    }
}
