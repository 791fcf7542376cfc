use std::io;
use std::sync::Arc;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;

use mindsync::editor::TaskForm;
use mindsync::grouping::{group_tasks, Bucket};
use mindsync::models::{Attachment, AttachmentKind, Priority, Task};
use mindsync::parser::{format_datetime_input, parse_datetime_input};
use mindsync::store::{Command, TaskStore};
use mindsync::Error;

pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Clone, Copy, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
    Priority,
    Due,
    Reminder,
    Tags,
    Attachment,
}

impl ActiveInput {
    pub const ALL: [ActiveInput; 7] = [
        ActiveInput::Title,
        ActiveInput::Description,
        ActiveInput::Priority,
        ActiveInput::Due,
        ActiveInput::Reminder,
        ActiveInput::Tags,
        ActiveInput::Attachment,
    ];

    fn next(self) -> ActiveInput {
        let i = ActiveInput::ALL.iter().position(|a| *a == self).unwrap_or(0);
        ActiveInput::ALL[(i + 1) % ActiveInput::ALL.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActiveInput::Title => "Title",
            ActiveInput::Description => "Description",
            ActiveInput::Priority => "Priority",
            ActiveInput::Due => "Due",
            ActiveInput::Reminder => "Reminder",
            ActiveInput::Tags => "Tags",
            ActiveInput::Attachment => "Attach URL",
        }
    }
}

/// Text typed into the form before it is turned into a `TaskForm`.
#[derive(Default)]
pub struct FormInput {
    pub base: TaskForm,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due: String,
    pub reminder: String,
    pub tags: String,
    pub attachment: String,
}

impl FormInput {
    fn from_form(form: TaskForm) -> Self {
        FormInput {
            title: form.title.clone(),
            description: form.description.clone(),
            priority: form.priority,
            due: form.due_date.as_ref().map(format_datetime_input).unwrap_or_default(),
            reminder: form.reminder.as_ref().map(format_datetime_input).unwrap_or_default(),
            tags: form.tags.clone(),
            attachment: String::new(),
            base: form,
        }
    }

    pub fn text(&self, input: ActiveInput) -> String {
        match input {
            ActiveInput::Title => self.title.clone(),
            ActiveInput::Description => self.description.clone(),
            ActiveInput::Priority => self.priority.to_string(),
            ActiveInput::Due => self.due.clone(),
            ActiveInput::Reminder => self.reminder.clone(),
            ActiveInput::Tags => self.tags.clone(),
            ActiveInput::Attachment => self.attachment.clone(),
        }
    }

    fn field_mut(&mut self, input: ActiveInput) -> Option<&mut String> {
        match input {
            ActiveInput::Title => Some(&mut self.title),
            ActiveInput::Description => Some(&mut self.description),
            ActiveInput::Priority => None,
            ActiveInput::Due => Some(&mut self.due),
            ActiveInput::Reminder => Some(&mut self.reminder),
            ActiveInput::Tags => Some(&mut self.tags),
            ActiveInput::Attachment => Some(&mut self.attachment),
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.base.attachments
    }

    /// Moves the typed URL onto the form. Blank input is ignored.
    fn attach(&mut self, kind: AttachmentKind) -> bool {
        let value = self.attachment.trim().to_string();
        if value.is_empty() {
            return false;
        }
        self.base.add_attachment(Attachment { kind, value });
        self.attachment.clear();
        true
    }

    fn to_form(&self) -> Result<TaskForm, String> {
        let mut form = self.base.clone();
        form.title = self.title.clone();
        form.description = self.description.clone();
        form.priority = self.priority;
        form.tags = self.tags.clone();
        form.due_date = read_date("due date", &self.due)?;
        form.reminder = read_date("reminder", &self.reminder)?;
        Ok(form)
    }
}

fn read_date(name: &str, raw: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_datetime_input(raw)
        .map(Some)
        .ok_or_else(|| format!("Could not read {} '{}' (use YYYY-MM-DD HH:MM)", name, raw))
}

pub struct App {
    store: Arc<TaskStore>,
    pub rows: Vec<(Bucket, Task)>,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub form: FormInput,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(store: Arc<TaskStore>) -> App {
        let mut app = App {
            store,
            rows: Vec::new(),
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            form: FormInput::default(),
            status_message: None,
        };
        app.refresh_rows();
        app
    }

    /// Regroups the store's tasks against the current time.
    pub fn refresh_rows(&mut self) {
        self.regroup_at(&Local::now());
    }

    fn regroup_at(&mut self, now: &DateTime<Local>) {
        let tasks = self.store.tasks();
        let grouped = group_tasks(&tasks, now);
        self.rows = grouped
            .iter()
            .map(|(bucket, task)| (bucket, task.clone()))
            .collect();

        let selected = match self.state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|(_, task)| task)
    }

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    async fn run(&mut self, command: Command) {
        match self.store.dispatch(command).await {
            Ok(_) => self.status_message = None,
            Err(Error::NoUserIdentifier) => {
                self.status_message = Some("Not signed in. Run `mindsync login`.".to_string())
            }
            Err(err) => self.status_message = Some(format!("Error: {}", err)),
        }
        self.refresh_rows();
    }

    fn open_form(&mut self, form: TaskForm) {
        self.form = FormInput::from_form(form);
        self.active_input = ActiveInput::Title;
        self.input_mode = InputMode::Editing;
    }

    async fn submit_form(&mut self) {
        let form = match self.form.to_form() {
            Ok(form) => form,
            Err(message) => {
                self.status_message = Some(message);
                return;
            }
        };
        match form.save() {
            Ok(saved) => {
                self.input_mode = InputMode::Normal;
                self.run(saved.into_command()).await;
            }
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('r') => self.run(Command::Load).await,
                KeyCode::Char('a') => self.open_form(TaskForm::new()),
                KeyCode::Char('e') | KeyCode::Enter => {
                    if let Some(task) = self.selected_task() {
                        let form = TaskForm::edit(task);
                        self.open_form(form);
                    }
                }
                KeyCode::Char(' ') => {
                    if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                        self.run(Command::ToggleStatus(id)).await;
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                        self.run(Command::Delete(id)).await;
                    }
                }
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    if self.active_input == ActiveInput::Priority {
                        self.form.priority = self.form.priority.next();
                    } else {
                        self.input_mode = InputMode::Insert;
                    }
                }
                KeyCode::Char(' ') if self.active_input == ActiveInput::Priority => {
                    self.form.priority = self.form.priority.next();
                }
                KeyCode::Char('l') if self.active_input == ActiveInput::Attachment => {
                    if !self.form.attach(AttachmentKind::Link) {
                        self.status_message = Some("Type a URL first (i)".to_string());
                    }
                }
                KeyCode::Char('f') if self.active_input == ActiveInput::Attachment => {
                    if !self.form.attach(AttachmentKind::File) {
                        self.status_message = Some("Type a file URL first (i)".to_string());
                    }
                }
                KeyCode::Char('x') if self.active_input == ActiveInput::Attachment => {
                    self.form.base.attachments.pop();
                }
                KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => {
                    self.active_input = self.active_input.next();
                }
                KeyCode::Enter => self.submit_form().await,
                KeyCode::Esc => {
                    self.form = FormInput::default();
                    self.status_message = None;
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::Insert => match key.code {
                KeyCode::Char(c) => {
                    if let Some(field) = self.form.field_mut(self.active_input) {
                        field.push(c);
                    }
                }
                KeyCode::Backspace => {
                    if let Some(field) = self.form.field_mut(self.active_input) {
                        field.pop();
                    }
                }
                KeyCode::Tab => {
                    self.active_input = self.active_input.next();
                    if self.active_input == ActiveInput::Priority {
                        self.input_mode = InputMode::Editing;
                    }
                }
                KeyCode::Esc | KeyCode::Enter => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },
        }
        Ok(false)
    }
}
