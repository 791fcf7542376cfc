//! Client-side cache of the signed-in user's tasks.
//!
//! Local state only changes after the server accepts a change, so a failed
//! request leaves the list exactly as it was. Every operation resolves to
//! the new list or a typed error and the caller decides what to show.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::api::TaskApi;
use crate::error::{Error, Result};
use crate::models::{Task, TaskDraft, TaskUpdate};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Load,
    Add(TaskDraft),
    Update(TaskUpdate),
    ToggleStatus(String),
    Delete(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Holds a task id in the in-flight set until dropped.
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.ids).remove(&self.id);
    }
}

pub struct TaskStore {
    api: TaskApi,
    tasks: Mutex<Vec<Task>>,
    in_flight: Mutex<HashSet<String>>,
}

impl TaskStore {
    pub fn new(api: TaskApi) -> Self {
        TaskStore {
            api,
            tasks: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn api(&self) -> &TaskApi {
        &self.api
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        lock(&self.tasks).iter().find(|task| task.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin(&self, id: &str) -> Result<InFlight<'_>> {
        let mut ids = lock(&self.in_flight);
        if !ids.insert(id.to_string()) {
            log::warn!("rejecting request for task {}: one is already in flight", id);
            return Err(Error::InFlight(id.to_string()));
        }
        Ok(InFlight {
            ids: &self.in_flight,
            id: id.to_string(),
        })
    }

    pub async fn dispatch(&self, command: Command) -> Result<Vec<Task>> {
        match command {
            Command::Load => self.load().await,
            Command::Add(draft) => self.add(draft).await,
            Command::Update(update) => self.update(update).await,
            Command::ToggleStatus(id) => self.toggle_status(&id).await,
            Command::Delete(id) => self.delete(&id).await,
        }
    }

    /// Replaces the list with what the server has.
    pub async fn load(&self) -> Result<Vec<Task>> {
        let records = self.api.fetch_tasks().await.map_err(|err| {
            log::error!("loading tasks failed: {}", err);
            err
        })?;

        let mut loaded = Vec::with_capacity(records.len());
        for record in records {
            match Task::try_from(record) {
                Ok(task) => loaded.push(task),
                Err(err) => log::warn!("skipping server record: {}", err),
            }
        }

        let mut tasks = lock(&self.tasks);
        *tasks = loaded;
        log::info!("loaded {} tasks", tasks.len());
        Ok(tasks.clone())
    }

    /// Creates the task remotely and puts the server's copy first in the list.
    pub async fn add(&self, draft: TaskDraft) -> Result<Vec<Task>> {
        let _guard = self.begin(&draft.id)?;
        let created = self
            .api
            .create_task(&draft)
            .await
            .and_then(Task::try_from)
            .map_err(|err| {
                log::error!("creating task '{}' failed: {}", draft.title, err);
                err
            })?;

        let mut tasks = lock(&self.tasks);
        log::info!("created task {}", created.id);
        tasks.insert(0, created);
        Ok(tasks.clone())
    }

    pub async fn update(&self, update: TaskUpdate) -> Result<Vec<Task>> {
        let _guard = self.begin(&update.id)?;
        let updated = self
            .api
            .update_task(&update.id, &update)
            .await
            .and_then(Task::try_from)
            .map_err(|err| {
                log::error!("updating task {} failed: {}", update.id, err);
                err
            })?;

        let mut tasks = lock(&self.tasks);
        match tasks.iter_mut().find(|task| task.id == update.id) {
            Some(slot) => *slot = updated,
            None => log::warn!("updated task {} is not in the local list", update.id),
        }
        log::info!("updated task {}", update.id);
        Ok(tasks.clone())
    }

    /// Flips a task between completed and pending.
    pub async fn toggle_status(&self, id: &str) -> Result<Vec<Task>> {
        let current = self
            .get(id)
            .ok_or_else(|| Error::UnknownTask(id.to_string()))?;
        self.update(TaskUpdate::status(id, current.status.toggled()))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Vec<Task>> {
        let _guard = self.begin(id)?;
        let ack = self.api.delete_task(id).await.map_err(|err| {
            log::error!("deleting task {} failed: {}", id, err);
            err
        })?;
        log::debug!("delete acknowledged: {}", ack);

        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| task.id != id);
        log::info!("deleted task {}", id);
        Ok(tasks.clone())
    }
}
