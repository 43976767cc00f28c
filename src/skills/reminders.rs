//! Reminder storage skill
//!
//! Reminders live in a single JSON file under the data directory.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nlp::{Entities, Intent};
use crate::skills::SkillHandler;
use crate::{Error, Result};

/// One stored reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub text: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

/// JSON-file-backed reminder store
pub struct ReminderStore {
    path: PathBuf,
    reminders: Mutex<Vec<Reminder>>,
}

impl ReminderStore {
    /// Open the store, loading any existing reminders
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read or parsed
    pub fn open(path: PathBuf) -> Result<Self> {
        let reminders = if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), count = reminders.len(), "reminder store opened");

        Ok(Self {
            path,
            reminders: Mutex::new(reminders),
        })
    }

    /// Add a reminder and return a confirmation
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn add(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok("I need to know what to remind you about.".to_string());
        }

        let mut reminders = self.lock()?;
        let id = reminders.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        reminders.push(Reminder {
            id,
            text: text.to_string(),
            created: Utc::now(),
            completed: false,
        });
        self.save(&reminders)?;

        tracing::info!(id, text, "reminder added");
        Ok(format!("Got it! I've added a reminder: {text}"))
    }

    /// List active reminders in spoken form
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned
    pub fn list(&self) -> Result<String> {
        let reminders = self.lock()?;
        let active: Vec<&Reminder> = reminders.iter().filter(|r| !r.completed).collect();

        Ok(match active.as_slice() {
            [] => "You don't have any reminders right now.".to_string(),
            [only] => format!("You have 1 reminder: {}", only.text),
            many => {
                let mut response = format!("You have {} reminders:\n", many.len());
                for (i, reminder) in many.iter().enumerate() {
                    response.push_str(&format!("{}. {}\n", i + 1, reminder.text));
                }
                response.trim_end().to_string()
            }
        })
    }

    /// Mark a reminder completed
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn complete(&self, id: u64) -> Result<String> {
        let mut reminders = self.lock()?;

        let Some(reminder) = reminders.iter_mut().find(|r| r.id == id) else {
            return Ok(format!("I couldn't find reminder #{id}"));
        };

        reminder.completed = true;
        let text = reminder.text.clone();
        self.save(&reminders)?;

        Ok(format!("Marked reminder as complete: {text}"))
    }

    /// Number of active reminders
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock()
            .map(|reminders| reminders.iter().filter(|r| !r.completed).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Reminder>>> {
        self.reminders
            .lock()
            .map_err(|_| Error::Reminder("reminder store poisoned".to_string()))
    }

    fn save(&self, reminders: &[Reminder]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(reminders)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[async_trait]
impl SkillHandler for ReminderStore {
    async fn handle(
        &self,
        intent: &Intent,
        entities: &Entities,
        raw_text: &str,
    ) -> Result<String> {
        match intent {
            Intent::ReminderSet => {
                // The extractor guarantees this slot for the gating intent,
                // but a missing slot still gets a clarifying string.
                let text = entities.reminder_text.as_deref().unwrap_or(raw_text);
                self.add(text)
            }
            Intent::ReminderList => self.list(),
            _ => Ok("I'm not sure what you want to do with reminders.".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> (PathBuf, ReminderStore) {
        let path = std::env::temp_dir().join(format!(
            "aria-reminders-{name}-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let store = ReminderStore::open(path.clone()).unwrap();
        (path, store)
    }

    #[test]
    fn add_confirms_and_counts() {
        let (path, store) = temp_store("add");

        let response = store.add("buy milk").unwrap();
        assert!(response.contains("buy milk"));
        assert_eq!(store.count(), 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn empty_text_is_rejected_politely() {
        let (path, store) = temp_store("empty");

        let response = store.add("   ").unwrap();
        assert!(response.contains("need to know"));
        assert_eq!(store.count(), 0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn list_formats_singular_and_plural() {
        let (path, store) = temp_store("list");

        assert!(store.list().unwrap().contains("don't have any"));

        store.add("buy milk").unwrap();
        assert!(store.list().unwrap().contains("1 reminder"));

        store.add("call mom").unwrap();
        let listing = store.list().unwrap();
        assert!(listing.contains("2 reminders"));
        assert!(listing.contains("1. buy milk"));
        assert!(listing.contains("2. call mom"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reminders_survive_reload() {
        let (path, store) = temp_store("reload");
        store.add("water plants").unwrap();
        drop(store);

        let reloaded = ReminderStore::open(path.clone()).unwrap();
        assert_eq!(reloaded.count(), 1);
        assert!(reloaded.list().unwrap().contains("water plants"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn completed_reminders_leave_the_list() {
        let (path, store) = temp_store("complete");
        store.add("buy milk").unwrap();

        let response = store.complete(1).unwrap();
        assert!(response.contains("buy milk"));
        assert_eq!(store.count(), 0);

        let _ = std::fs::remove_file(path);
    }
}
