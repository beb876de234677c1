//! Per-user memory store.
//!
//! | Part    | File                     | Shape                                 |
//! |---------|--------------------------|---------------------------------------|
//! | Facts   | `<user>_facts.json`      | `{category: {key: {value, timestamp}}}` |
//! | History | `<user>_history.json`    | `[{role, content, timestamp, metadata}]` |
//!
//! A store is loaded synchronously when it is opened and every mutation is
//! flushed to disk before the mutating call returns. There is no write
//! buffering and no close step. One store instance owns the files of one
//! user identifier; no file locking is performed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::facts::{Fact, FactCategory, Facts, TASKS_CATEGORY, default_facts, render_context};
use crate::history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, HistoryRole};

/// Durable facts plus a bounded conversation log for one user.
#[derive(Debug)]
pub struct MemoryStore {
    user_id: String,
    facts_path: PathBuf,
    history_path: PathBuf,
    history_limit: usize,
    facts: Facts,
    history: Vec<HistoryEntry>,
}

impl MemoryStore {
    /// Open (or initialise) the memory of `user_id` inside `dir` with the
    /// default history bound.
    pub fn open(dir: impl AsRef<Path>, user_id: &str) -> StoreResult<Self> {
        Self::open_with_limit(dir, user_id, DEFAULT_HISTORY_LIMIT)
    }

    /// Open (or initialise) the memory of `user_id` inside `dir`, keeping at
    /// most `history_limit` history entries.
    pub fn open_with_limit(
        dir: impl AsRef<Path>,
        user_id: &str,
        history_limit: usize,
    ) -> StoreResult<Self> {
        validate_user_id(user_id)?;
        if history_limit == 0 {
            return Err(StoreError::InvalidArgument(
                "history limit must be at least 1".into(),
            ));
        }

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let facts_path = dir.join(format!("{user_id}_facts.json"));
        let history_path = dir.join(format!("{user_id}_history.json"));

        let facts: Facts = read_json(&facts_path)?.unwrap_or_else(default_facts);
        let mut history: Vec<HistoryEntry> = read_json(&history_path)?.unwrap_or_default();

        if history.len() > history_limit {
            let excess = history.len() - history_limit;
            history.drain(..excess);
        }

        info!(
            user_id = %user_id,
            categories = facts.len(),
            history = history.len(),
            "memory store loaded"
        );

        Ok(Self {
            user_id: user_id.to_owned(),
            facts_path,
            history_path,
            history_limit,
            facts,
            history,
        })
    }

    /// The user identifier this store belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Maximum number of history entries retained.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// All facts, by category.
    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    /// The full retained history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    // -- Facts ---------------------------------------------------------------

    /// Store `value` under `(category, key)`, replacing any earlier value.
    #[instrument(skip(self, value), fields(user_id = %self.user_id))]
    pub fn remember(&mut self, category: &str, key: &str, value: &str) -> StoreResult<()> {
        if category == TASKS_CATEGORY {
            return Err(StoreError::InvalidArgument(format!(
                "`{TASKS_CATEGORY}` is a list category; use add_task"
            )));
        }

        let entry = self
            .facts
            .entry(category.to_owned())
            .or_insert_with(FactCategory::keyed);

        match entry {
            FactCategory::Keyed(map) => {
                map.insert(key.to_owned(), Fact::now(value));
            }
            FactCategory::List(_) => {
                return Err(StoreError::InvalidArgument(format!(
                    "category `{category}` holds a list, not keyed facts"
                )));
            }
        }

        debug!("fact remembered");
        self.save()
    }

    /// The value stored under `(category, key)`, if any.
    pub fn recall(&self, category: &str, key: &str) -> Option<&str> {
        match self.facts.get(category)? {
            FactCategory::Keyed(map) => map.get(key).map(|fact| fact.value.as_str()),
            FactCategory::List(_) => None,
        }
    }

    /// The whole category, or `None` if it does not exist.
    pub fn recall_category(&self, category: &str) -> Option<&FactCategory> {
        self.facts.get(category)
    }

    /// Remove `(category, key)`. Absent facts are a no-op.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn forget(&mut self, category: &str, key: &str) -> StoreResult<()> {
        let removed = match self.facts.get_mut(category) {
            Some(FactCategory::Keyed(map)) => map.remove(key).is_some(),
            _ => false,
        };

        if removed {
            debug!("fact forgotten");
            self.save()?;
        }
        Ok(())
    }

    // -- Tasks ---------------------------------------------------------------

    /// Append a task to the reserved task list.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn add_task(&mut self, task: &str) -> StoreResult<()> {
        self.task_list_mut()?.push(task.to_owned());
        self.save()
    }

    /// Remove the task at `index`, returning it if it existed.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn complete_task(&mut self, index: usize) -> StoreResult<Option<String>> {
        let tasks = self.task_list_mut()?;
        if index >= tasks.len() {
            return Ok(None);
        }
        let done = tasks.remove(index);
        self.save()?;
        Ok(Some(done))
    }

    /// The current task list.
    pub fn tasks(&self) -> &[String] {
        match self.facts.get(TASKS_CATEGORY) {
            Some(FactCategory::List(tasks)) => tasks,
            _ => &[],
        }
    }

    fn task_list_mut(&mut self) -> StoreResult<&mut Vec<String>> {
        let entry = self
            .facts
            .entry(TASKS_CATEGORY.to_owned())
            .or_insert_with(|| FactCategory::List(Vec::new()));
        match entry {
            FactCategory::List(tasks) => Ok(tasks),
            FactCategory::Keyed(_) => Err(StoreError::InvalidArgument(format!(
                "category `{TASKS_CATEGORY}` holds keyed facts, not a task list"
            ))),
        }
    }

    // -- History -------------------------------------------------------------

    /// Append a message, evicting the oldest entries beyond the bound.
    #[instrument(skip(self, content, metadata), fields(user_id = %self.user_id))]
    pub fn add_message(
        &mut self,
        role: HistoryRole,
        content: &str,
        metadata: Option<Map<String, Value>>,
    ) -> StoreResult<()> {
        self.history
            .push(HistoryEntry::new(role, content, metadata.unwrap_or_default()));

        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
            debug!(evicted = excess, "history trimmed");
        }

        self.save()
    }

    /// The last `n` entries in chronological order (`n` is clamped).
    pub fn get_recent_history(&self, n: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Entries whose content contains `query`, ignoring case, in log order.
    pub fn search_history(&self, query: &str) -> Vec<&HistoryEntry> {
        let lowered = query.to_lowercase();
        self.history.iter().filter(|e| e.matches(&lowered)).collect()
    }

    // -- Context -------------------------------------------------------------

    /// Render the fact summary that is injected into the system prompt.
    pub fn get_context(&self) -> String {
        render_context(&self.facts)
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Reset facts to the defaults and drop all history.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn clear(&mut self) -> StoreResult<()> {
        self.facts = default_facts();
        self.history.clear();
        info!("memory cleared");
        self.save()
    }

    /// Write both documents to disk.
    fn save(&self) -> StoreResult<()> {
        write_json(&self.facts_path, &self.facts)?;
        write_json(&self.history_path, &self.history)
    }
}

// ── helpers ──────────────────────────────────────────────────────────

fn validate_user_id(user_id: &str) -> StoreResult<()> {
    let bad = user_id.is_empty()
        || user_id.contains(['/', '\\'])
        || user_id == "."
        || user_id.contains("..");
    if bad {
        return Err(StoreError::InvalidArgument(format!(
            "invalid user id `{user_id}`"
        )));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).map_err(|e| StoreError::io(path, e))
}

// ── tests ────────────────────────────────────────────────────────────
