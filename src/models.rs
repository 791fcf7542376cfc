use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Lowercase form the server stores.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
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
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(label)
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::Validation(format!("unknown priority '{}'", other))),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    /// Status a checkbox toggle moves to.
    pub fn toggled(self) -> Status {
        match self {
            Status::Completed => Status::Pending,
            _ => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(Error::Validation(format!("unknown status '{}'", other))),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File,
    Link,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::File => "file",
            AttachmentKind::Link => "link",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub value: String,
}

impl Attachment {
    pub fn link(value: impl Into<String>) -> Self {
        Attachment {
            kind: AttachmentKind::Link,
            value: value.into(),
        }
    }

    pub fn file(value: impl Into<String>) -> Self {
        Attachment {
            kind: AttachmentKind::File,
            value: value.into(),
        }
    }
}

/// Task labels. Kept in entry order but compared as a set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new(tags: Vec<String>) -> Self {
        Tags(tags)
    }

    /// Splits a comma separated input, trimming entries and dropping empty ones.
    pub fn from_input(input: &str) -> Self {
        Tags(
            input
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn to_input(&self) -> String {
        self.0.join(",")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn as_set(&self) -> BTreeSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

impl PartialEq for Tags {
    fn eq(&self, other: &Self) -> bool {
        self.as_set() == other.as_set()
    }
}

impl From<Vec<&str>> for Tags {
    fn from(tags: Vec<&str>) -> Self {
        Tags(tags.into_iter().map(String::from).collect())
    }
}

/// ISO-8601 timestamps in the `2025-07-25T14:30:00.000Z` form.
pub mod iso {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// Empty or unreadable dates count as absent.
    pub fn deserialize_lenient<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let parsed = parse(&raw);
                if parsed.is_none() {
                    log::warn!("ignoring unreadable date '{}'", raw);
                }
                parsed
            }
            None => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub tags: Tags,
    pub attachments: Vec<Attachment>,
    pub status: Status,
    pub ai_generated: Option<bool>,
    pub ai_confidence: Option<f64>,
    pub source_text: Option<String>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

/// A task that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskDraft {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub tags: Tags,
    pub attachments: Vec<Attachment>,
    pub status: Status,
    pub ai_generated: Option<bool>,
    pub ai_confidence: Option<f64>,
    pub source_text: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            reminder: None,
            tags: Tags::default(),
            attachments: Vec::new(),
            status: Status::default(),
            ai_generated: None,
            ai_confidence: None,
            source_text: None,
        }
    }
}

/// Changes to an existing task. `None` means "leave as is".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskUpdate {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder: Option<DateTime<Utc>>,
    pub tags: Option<Tags>,
    pub attachments: Option<Vec<Attachment>>,
    pub status: Option<Status>,
    pub ai_generated: Option<bool>,
    pub ai_confidence: Option<f64>,
    pub source_text: Option<String>,
}

impl TaskUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        TaskUpdate {
            id: id.into(),
            ..TaskUpdate::default()
        }
    }

    pub fn status(id: impl Into<String>, status: Status) -> Self {
        TaskUpdate {
            status: Some(status),
            ..TaskUpdate::new(id)
        }
    }

    /// Sends every field the task currently has.
    pub fn from_task(task: &Task) -> Self {
        TaskUpdate {
            id: task.id.clone(),
            title: Some(task.title.clone()),
            description: task.description.clone(),
            priority: Some(task.priority),
            due_date: task.due_date,
            reminder: task.reminder,
            tags: Some(task.tags.clone()),
            attachments: Some(task.attachments.clone()),
            status: Some(task.status),
            ai_generated: task.ai_generated,
            ai_confidence: task.ai_confidence,
            source_text: task.source_text.clone(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.due_date.is_some()
            || self.reminder.is_some()
            || self.tags.is_some()
            || self.attachments.is_some()
            || self.status.is_some()
            || self.ai_generated.is_some()
            || self.ai_confidence.is_some()
            || self.source_text.is_some()
    }
}
