use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Attachment, Priority, Status, Tags, Task, TaskDraft, TaskUpdate};
use crate::store::Command;

/// What saving the form produces.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskSave {
    Create(TaskDraft),
    Update(TaskUpdate),
}

impl TaskSave {
    pub fn into_command(self) -> Command {
        match self {
            TaskSave::Create(draft) => Command::Add(draft),
            TaskSave::Update(update) => Command::Update(update),
        }
    }
}

/// Field values of the create/edit task form.
#[derive(Clone, Debug, Default)]
pub struct TaskForm {
    editing: Option<(String, Status)>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    /// Comma separated.
    pub tags: String,
    pub attachments: Vec<Attachment>,
    pub ai_generated: bool,
    pub ai_confidence: Option<f64>,
    pub source_text: String,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm::default()
    }

    pub fn edit(task: &Task) -> Self {
        TaskForm {
            editing: Some((task.id.clone(), task.status)),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            due_date: task.due_date,
            reminder: task.reminder,
            tags: task.tags.to_input(),
            attachments: task.attachments.clone(),
            ai_generated: task.ai_generated.unwrap_or(false),
            ai_confidence: task.ai_confidence,
            source_text: task.source_text.clone().unwrap_or_default(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn save(&self) -> Result<TaskSave> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }

        let attachments: Vec<Attachment> = self
            .attachments
            .iter()
            .filter(|a| !a.value.trim().is_empty())
            .cloned()
            .collect();
        let tags = Tags::from_input(&self.tags);
        let description = non_empty(&self.description);
        let source_text = non_empty(&self.source_text);

        let saved = match &self.editing {
            Some((id, status)) => TaskSave::Update(TaskUpdate {
                id: id.clone(),
                title: Some(title.to_string()),
                description,
                priority: Some(self.priority),
                due_date: self.due_date,
                reminder: self.reminder,
                tags: Some(tags),
                attachments: Some(attachments),
                status: Some(*status),
                ai_generated: Some(self.ai_generated),
                ai_confidence: self.ai_confidence,
                source_text,
            }),
            None => TaskSave::Create(TaskDraft {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                description,
                priority: self.priority,
                due_date: self.due_date,
                reminder: self.reminder,
                tags,
                attachments,
                status: Status::Pending,
                ai_generated: Some(self.ai_generated),
                ai_confidence: self.ai_confidence,
                source_text,
            }),
        };
        log::debug!("task form saved: {:?}", saved);
        Ok(saved)
    }
}
