//! Conversation history entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default maximum number of entries kept in a history.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

impl HistoryRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for HistoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation log. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(role: HistoryRole, content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Case-insensitive substring match against the content.
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.content.to_lowercase().contains(lowered_query)
    }
}
