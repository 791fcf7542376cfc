use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{iso, Attachment, Priority, Status, Tags, Task, TaskDraft, TaskUpdate};
use crate::session::Session;

/// A task record exactly as the server sends it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "iso::deserialize_lenient")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso::deserialize_lenient")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso::deserialize_lenient")]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ai_generated: Option<bool>,
    #[serde(default)]
    pub ai_confidence: Option<f64>,
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TryFrom<WireTask> for Task {
    type Error = Error;

    fn try_from(wire: WireTask) -> Result<Task> {
        let id = wire
            .id
            .or(wire.object_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::MalformedRecord("task without an id".to_string()))?;
        let title = wire
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| Error::MalformedRecord(format!("task {} has no title", id)))?;

        let priority = match wire.priority.as_deref() {
            Some(raw) => raw.parse::<Priority>().unwrap_or_else(|_| {
                log::warn!("task {}: unknown priority '{}', using Low", id, raw);
                Priority::Low
            }),
            None => Priority::default(),
        };
        let status = match wire.status.as_deref() {
            Some(raw) => raw.parse::<Status>().unwrap_or_else(|_| {
                log::warn!("task {}: unknown status '{}', using pending", id, raw);
                Status::Pending
            }),
            None => Status::default(),
        };

        Ok(Task {
            id,
            title,
            description: wire.description,
            priority,
            due_date: wire.due_date,
            reminder: wire.reminder_at.or(wire.reminder),
            tags: Tags::new(wire.tags.unwrap_or_default()),
            attachments: wire.attachments.unwrap_or_default(),
            status,
            ai_generated: wire.ai_generated,
            ai_confidence: wire.ai_confidence,
            source_text: wire.source_text,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    priority: Priority,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso::serialize_opt"
    )]
    due_date: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso::serialize_opt"
    )]
    reminder_at: Option<DateTime<Utc>>,
    tags: &'a Tags,
    attachments: &'a [Attachment],
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_text: Option<&'a str>,
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso::serialize_opt"
    )]
    due_date: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "iso::serialize_opt"
    )]
    reminder_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a [Attachment]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_generated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_text: Option<&'a str>,
}

impl<'a> From<&'a TaskUpdate> for UpdatePayload<'a> {
    fn from(update: &'a TaskUpdate) -> Self {
        UpdatePayload {
            title: update.title.as_deref(),
            description: update.description.as_deref(),
            priority: update.priority,
            due_date: update.due_date,
            reminder_at: update.reminder,
            tags: update.tags.as_ref(),
            attachments: update.attachments.as_deref(),
            status: update.status,
            ai_generated: update.ai_generated,
            ai_confidence: update.ai_confidence,
            source_text: update.source_text.as_deref(),
        }
    }
}

pub(crate) fn build_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(config.connect_timeout())
        .build()?)
}

/// Turns a non-2xx response into `Error::Server` carrying the body text.
pub(crate) async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let message = res.text().await.unwrap_or_default();
        Err(Error::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Client for the `/tasks` endpoints of the MindSync service.
#[derive(Clone, Debug)]
pub struct TaskApi {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl TaskApi {
    pub fn new(config: &Config, session: Option<Session>) -> Result<Self> {
        Ok(TaskApi::with_client(
            build_client(config)?,
            &config.api_base_url,
            session,
        ))
    }

    pub fn with_client(client: Client, base_url: &str, session: Option<Session>) -> Self {
        TaskApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn user_id(&self) -> Result<&str> {
        self.session
            .as_ref()
            .map(|session| session.user_id.as_str())
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::NoUserIdentifier)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.as_ref().and_then(|s| s.token.as_deref()) {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<WireTask>> {
        let user_id = self.user_id()?;
        let url = format!("{}/tasks", self.base_url);

        let res = self
            .authorized(self.client.get(&url))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        let records = check_status(res).await?.json::<Vec<Value>>().await?;

        // A record of the wrong shape is dropped, not the whole list.
        let mut tasks = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<WireTask>(record) {
                Ok(task) => tasks.push(task),
                Err(err) => log::warn!("skipping undecodable task record: {}", err),
            }
        }

        log::debug!("fetched {} tasks for user {}", tasks.len(), user_id);
        Ok(tasks)
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<WireTask> {
        let user_id = self.user_id()?;
        let url = format!("{}/tasks", self.base_url);

        let payload = CreatePayload {
            id: &draft.id,
            title: &draft.title,
            description: draft.description.as_deref(),
            priority: draft.priority,
            due_date: draft.due_date,
            reminder_at: draft.reminder,
            tags: &draft.tags,
            attachments: &draft.attachments,
            status: draft.status,
            ai_generated: draft.ai_generated,
            ai_confidence: draft.ai_confidence,
            source_text: draft.source_text.as_deref(),
            user_id,
        };
        log::debug!("create task payload: {}", serde_json::to_string(&payload)?);

        let res = self
            .authorized(self.client.post(&url))
            .json(&payload)
            .send()
            .await?;
        Ok(check_status(res).await?.json::<WireTask>().await?)
    }

    /// Sends only the fields set on `updates`; the server keeps the rest.
    pub async fn update_task(&self, id: &str, updates: &TaskUpdate) -> Result<WireTask> {
        let url = format!("{}/tasks/{}", self.base_url, id);

        let payload = UpdatePayload::from(updates);
        log::debug!("update task {} payload: {}", id, serde_json::to_string(&payload)?);

        let res = self
            .authorized(self.client.patch(&url))
            .json(&payload)
            .send()
            .await?;
        Ok(check_status(res).await?.json::<WireTask>().await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<Value> {
        let url = format!("{}/tasks/{}", self.base_url, id);

        let res = self.authorized(self.client.delete(&url)).send().await?;
        let body = check_status(res).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
