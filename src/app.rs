use crate::api::TodoApi;
use crate::buffer::EditBuffer;
use crate::error::TodoError;
use crate::models::{today, Todo};
use crate::store::TodoStore;
use crate::view::{filter_by_status, StatusFilter};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;
use tracing::warn;

pub struct App<A> {
    pub store: TodoStore<A>,
    pub state: ListState,
    pub filter: StatusFilter,
    pub input_mode: InputMode,
    pub buffer: Option<EditBuffer>,
    pub form_error: Option<TodoError>,
    pub detail_id: Option<String>,
    pub today: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
    ConfirmDelete(String),
}

impl<A: TodoApi> App<A> {
    pub fn new(store: TodoStore<A>) -> App<A> {
        let mut app = App {
            store,
            state: ListState::default(),
            filter: StatusFilter::All,
            input_mode: InputMode::Normal,
            buffer: None,
            form_error: None,
            detail_id: None,
            today: today(),
        };
        app.clamp_selection();
        app
    }

    pub fn visible(&self) -> Vec<&Todo> {
        filter_by_status(self.store.todos(), self.filter)
    }

    pub fn selected(&self) -> Option<&Todo> {
        let i = self.state.selected()?;
        self.visible().get(i).copied()
    }

    pub fn detail(&self) -> Option<&Todo> {
        self.detail_id.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.state.select(None);
        self.clamp_selection();
    }

    // Keeps the cursor on a row after the list changes under it
    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        let selected = match (self.state.selected(), len) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(selected);
    }

    pub async fn refresh(&mut self) {
        self.today = today();
        let _ = self.store.list().await;
        self.clamp_selection();
    }

    fn open_create(&mut self) {
        self.buffer = Some(EditBuffer::open_create(self.today));
        self.form_error = None;
        self.input_mode = InputMode::Editing;
    }

    fn open_edit(&mut self) {
        if let Some(todo) = self.selected() {
            let buffer = EditBuffer::open_edit(todo);
            self.buffer = Some(buffer);
            self.form_error = None;
            self.input_mode = InputMode::Editing;
        }
    }

    async fn save(&mut self) {
        let Some(buffer) = self.buffer.take() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        match buffer.commit(&mut self.store).await {
            Ok(()) => {
                self.form_error = None;
                self.input_mode = InputMode::Normal;
                self.clamp_selection();
            }
            Err(rejected) => {
                warn!(error = %rejected.error, "save rejected, keeping edit buffer");
                self.buffer = Some(rejected.buffer);
                self.form_error = Some(rejected.error);
            }
        }
    }

    fn discard(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.discard();
        }
        self.form_error = None;
        self.input_mode = InputMode::Normal;
    }

    async fn confirm_delete(&mut self, id: String) {
        // The dialog closes whether or not the delete goes through
        self.input_mode = InputMode::Normal;
        if self.store.delete(&id).await.is_ok() && self.detail_id.as_deref() == Some(id.as_str()) {
            self.detail_id = None;
        }
        self.clamp_selection();
    }

    /// Returns `true` when the user asked to quit.
    pub async fn handle_input(&mut self, key: KeyEvent) -> bool {
        match self.input_mode.clone() {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('f') => self.set_filter(self.filter.next()),
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    self.set_filter(StatusFilter::ALL[index]);
                }
                KeyCode::Char('r') => self.refresh().await,
                KeyCode::Char('a') => self.open_create(),
                KeyCode::Char('e') => self.open_edit(),
                KeyCode::Char('x') => {
                    if let Some(id) = self.selected().map(|t| t.id.clone()) {
                        let _ = self.store.toggle_complete(&id).await;
                        self.clamp_selection();
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected().map(|t| t.id.clone()) {
                        self.input_mode = InputMode::ConfirmDelete(id);
                    }
                }
                KeyCode::Enter => {
                    self.detail_id = self.selected().map(|t| t.id.clone());
                }
                KeyCode::Esc => {
                    if self.detail_id.is_some() {
                        self.detail_id = None;
                    } else {
                        self.store.dismiss_error();
                    }
                }
                _ => {}
            },

            InputMode::Editing => {
                let Some(buffer) = self.buffer.as_mut() else {
                    self.input_mode = InputMode::Normal;
                    return false;
                };
                match key.code {
                    KeyCode::Char('i') => {
                        if buffer.focus_is_text() {
                            self.input_mode = InputMode::Insert;
                        }
                    }
                    KeyCode::Tab => buffer.focus_next(),
                    KeyCode::Char('p') => buffer.cycle_priority(),
                    KeyCode::Char('s') => buffer.cycle_status(),
                    KeyCode::Char('+') => buffer.shift_due_date(1),
                    KeyCode::Char('-') => buffer.shift_due_date(-1),
                    KeyCode::Char('n') => {
                        buffer.add_subtask();
                        self.input_mode = InputMode::Insert;
                    }
                    KeyCode::Char(' ') => {
                        if let Some(id) = buffer.focused_subtask_id() {
                            buffer.toggle_subtask_completed(&id);
                        }
                    }
                    KeyCode::Char('D') => {
                        if let Some(id) = buffer.focused_subtask_id() {
                            buffer.remove_subtask(&id);
                        }
                    }
                    KeyCode::Enter => self.save().await,
                    KeyCode::Esc => self.discard(),
                    _ => {}
                }
            }

            InputMode::Insert => {
                let Some(buffer) = self.buffer.as_mut() else {
                    self.input_mode = InputMode::Normal;
                    return false;
                };
                match key.code {
                    KeyCode::Char(c) => buffer.push_char(c),
                    KeyCode::Backspace => buffer.pop_char(),
                    KeyCode::Tab => {
                        buffer.focus_next();
                        if !buffer.focus_is_text() {
                            self.input_mode = InputMode::Editing;
                        }
                    }
                    KeyCode::Esc => self.input_mode = InputMode::Editing,
                    _ => {}
                }
            }

            InputMode::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(id).await,
                KeyCode::Char('n') | KeyCode::Esc => self.input_mode = InputMode::Normal,
                _ => {}
            },
        }
        false
    }
}
