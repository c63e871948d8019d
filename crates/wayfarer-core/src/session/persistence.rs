//! Conversation persistence - save and load thread history
//!
//! A store keeps one [`Conversation`] per thread id. The system prompt is
//! never part of what is stored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{Error, Result};
use crate::orchestration::Conversation;

/// Storage for conversation threads
pub trait ConversationStore: Send + Sync {
    /// Load a thread, `None` if it was never saved
    fn load(&self, thread_id: &str) -> Result<Option<Conversation>>;

    /// Create or replace a thread
    fn save(&self, conversation: &Conversation) -> Result<()>;

    /// All threads, most recently updated first
    fn list(&self) -> Result<Vec<Conversation>>;

    /// Remove a thread; returns whether it existed
    fn delete(&self, thread_id: &str) -> Result<bool>;
}

/// In-process store; contents are lost when the process exits
#[derive(Default)]
pub struct MemoryStore {
    threads: RwLock<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn load(&self, thread_id: &str) -> Result<Option<Conversation>> {
        Ok(self.threads.read().get(thread_id).cloned())
    }

    fn save(&self, conversation: &Conversation) -> Result<()> {
        self.threads
            .write()
            .insert(conversation.thread_id.clone(), conversation.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Conversation>> {
        let mut threads: Vec<Conversation> = self.threads.read().values().cloned().collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    fn delete(&self, thread_id: &str) -> Result<bool> {
        Ok(self.threads.write().remove(thread_id).is_some())
    }
}

/// One pretty-printed JSON file per thread
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn thread_path(&self, thread_id: &str) -> Result<PathBuf> {
        let valid = !thread_id.is_empty()
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !thread_id.starts_with('.');
        if !valid {
            return Err(Error::Session(format!("Invalid thread id: {:?}", thread_id)));
        }
        Ok(self.dir.join(format!("{}.json", thread_id)))
    }
}

impl ConversationStore for FileStore {
    fn load(&self, thread_id: &str) -> Result<Option<Conversation>> {
        let path = self.thread_path(thread_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let conversation: Conversation = serde_json::from_str(&json)?;
        Ok(Some(conversation))
    }

    fn save(&self, conversation: &Conversation) -> Result<()> {
        let path = self.thread_path(&conversation.thread_id)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a truncated thread
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(conversation)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Conversation>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut threads = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match std::fs::read_to_string(&path) {
                    Ok(json) => match serde_json::from_str::<Conversation>(&json) {
                        Ok(conversation) => threads.push(conversation),
                        Err(e) => warn!("Failed to parse thread {:?}: {}", path, e),
                    },
                    Err(e) => warn!("Failed to read thread {:?}: {}", path, e),
                }
            }
        }

        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads)
    }

    fn delete(&self, thread_id: &str) -> Result<bool> {
        let path = self.thread_path(thread_id)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}
