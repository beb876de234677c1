//! # clawd-store
//!
//! Durable memory for the Clawd agent.
//!
//! Each user identifier owns one [`MemoryStore`] holding two JSON documents:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Facts    category -> key -> {value, ts}     │
//! │           + reserved "tasks" list            │
//! ├──────────────────────────────────────────────┤
//! │  History  bounded FIFO of {role, content,    │
//! │           timestamp, metadata}               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Facts feed the context summary rendered by [`MemoryStore::get_context`];
//! history feeds the conversation window sent to the model.
//!
//! ## Quick start
//!
//! ```no_run
//! use clawd_store::{HistoryRole, MemoryStore};
//!
//! let mut memory = MemoryStore::open("data/memory", "main")?;
//! memory.remember("user", "name", "Ada")?;
//! memory.add_message(HistoryRole::User, "Hello!", None)?;
//! assert!(memory.get_context().contains("name: Ada"));
//! # Ok::<(), clawd_store::StoreError>(())
//! ```

pub mod error;
pub mod facts;
pub mod history;
pub mod memory;
pub mod timestamp;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{StoreError, StoreResult};
pub use facts::{
    Fact, FactCategory, Facts, PREFERENCES_CATEGORY, TASKS_CATEGORY, USER_CATEGORY,
    WORLD_CATEGORY,
};
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, HistoryRole};
pub use memory::MemoryStore;
