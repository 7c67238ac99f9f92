use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tokio::sync::mpsc::UnboundedSender;

use super::app::App;
use super::input::UiEvent;
use super::{NOTES_DEBOUNCE, SAVING_INDICATOR};
use crate::client::DashboardClient;
use crate::model::{Status, TaskPatch};
use crate::timer::DelayedTask;
use crate::ui::Indicator;

/// Board state plus the requests that keep it in sync with the server.
/// Failed requests are logged and leave the indicator Offline; they never
/// end the session.
pub struct Session {
    client: DashboardClient,
    pub app: App,
    /// Set by a local notes edit, cleared once that text reached the server.
    notes_dirty: bool,
    autosave: DelayedTask,
    saving: DelayedTask,
    tx: UnboundedSender<UiEvent>,
}

impl Session {
    pub fn new(client: DashboardClient, tx: UnboundedSender<UiEvent>) -> Self {
        Self::with_delays(client, tx, NOTES_DEBOUNCE, SAVING_INDICATOR)
    }

    pub fn with_delays(
        client: DashboardClient,
        tx: UnboundedSender<UiEvent>,
        debounce: Duration,
        saving: Duration,
    ) -> Self {
        Self {
            client,
            app: App::new(),
            notes_dirty: false,
            autosave: DelayedTask::new(debounce),
            saving: DelayedTask::new(saving),
            tx,
        }
    }

    /// Fetch tasks, notes and actions. Local notes win while they have not
    /// been saved yet.
    pub async fn reload(&mut self) {
        let (tasks, notes, actions) = tokio::join!(
            self.client.list_tasks(),
            self.client.get_notes(),
            self.client.list_actions()
        );
        let tasks = self.settle("failed to fetch tasks", tasks);
        let notes = self.settle("failed to fetch notes", notes);
        let actions = self.settle("failed to fetch actions", actions);

        let complete = tasks.is_some() && notes.is_some() && actions.is_some();
        if let Some(tasks) = tasks {
            self.app.set_tasks(tasks);
        }
        if let Some(notes) = notes {
            if !self.notes_dirty {
                self.app.notes = notes;
            }
        }
        if let Some(actions) = actions {
            self.app.actions = actions;
        }
        if complete {
            self.app.indicator = Indicator::Online;
            self.app.last_sync = Some(Local::now());
        } else {
            self.app.indicator = Indicator::Offline;
        }
    }

    pub async fn refresh_actions(&mut self) {
        let actions = self.client.list_actions().await;
        if let Some(actions) = self.settle("failed to fetch actions", actions) {
            self.app.actions = actions;
        }
    }

    pub async fn create_task(&mut self, title: &str, status: Status) {
        let created = self.client.create_task(title, status).await;
        if let Some(task) = self.settle("failed to create task", created) {
            let id = task.id.clone();
            self.app.insert_task(task);
            self.app.select_task(&id);
            self.refresh_actions().await;
        }
    }

    pub async fn delete_task(&mut self, id: &str) {
        let deleted = self.client.delete_task(id).await;
        if self.settle("failed to delete task", deleted).is_some() {
            self.app.remove_task(id);
            self.refresh_actions().await;
        }
    }

    pub async fn move_task(&mut self, id: &str, patch: &TaskPatch) {
        let updated = self.client.update_task(id, patch).await;
        if let Some(task) = self.settle("failed to update task", updated) {
            self.app.replace_task(task);
            self.app.select_task(id);
            self.refresh_actions().await;
        }
    }

    /// Restart the autosave debounce after a local edit.
    pub fn notes_edited(&mut self) {
        self.notes_dirty = true;
        let tx = self.tx.clone();
        self.autosave.schedule(async move {
            let _ = tx.send(UiEvent::SaveNotes);
        });
    }

    pub async fn save_notes(&mut self) {
        let saved = self.client.set_notes(&self.app.notes).await;
        if self.settle("failed to save notes", saved).is_some() {
            self.notes_dirty = false;
        }
        self.app.saving = true;
        let tx = self.tx.clone();
        self.saving.schedule(async move {
            let _ = tx.send(UiEvent::SavingDone);
        });
    }

    pub fn saving_done(&mut self) {
        self.app.saving = false;
    }

    /// Save notes that never made it to the server. Called on quit.
    pub async fn flush(&mut self) {
        self.autosave.cancel();
        if !self.notes_dirty {
            return;
        }
        match self.client.set_notes(&self.app.notes).await {
            Ok(()) => self.notes_dirty = false,
            Err(e) => log::warn!("failed to save notes on exit: {e:#}"),
        }
    }

    fn settle<T>(&mut self, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.app.indicator = Indicator::Online;
                Some(value)
            }
            Err(e) => {
                log::warn!("{what}: {e:#}");
                self.app.indicator = Indicator::Offline;
                None
            }
        }
    }
}
