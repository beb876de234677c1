//! Per-user agents.
//!
//! Each user identifier gets its own [`Agent`] (and therefore its own memory
//! files), created lazily by a factory.  Agents sit behind an async mutex so
//! turns for one identifier are serialized while different identifiers run
//! concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tracing::info;

use crate::agent::Agent;
use crate::error::Result;

/// Builds the agent for a user identifier.
pub type AgentFactory = Arc<dyn Fn(&str) -> Result<Agent> + Send + Sync>;

/// Lazily populated map of user identifier to agent.
pub struct AgentPool {
    agents: DashMap<String, Arc<Mutex<Agent>>>,
    factory: AgentFactory,
}

impl AgentPool {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&str) -> Result<Agent> + Send + Sync + 'static,
    {
        Self {
            agents: DashMap::new(),
            factory: Arc::new(factory),
        }
    }

    /// The agent for `user_id`, built on first use.
    ///
    /// # Errors
    ///
    /// Whatever the factory returns, typically a store error for an invalid
    /// identifier or unreadable memory files.  Nothing is cached on failure.
    pub fn get_or_create(&self, user_id: &str) -> Result<Arc<Mutex<Agent>>> {
        if let Some(agent) = self.agents.get(user_id) {
            return Ok(Arc::clone(agent.value()));
        }

        match self.agents.entry(user_id.to_owned()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let agent = Arc::new(Mutex::new((self.factory)(user_id)?));
                entry.insert(Arc::clone(&agent));
                info!(user_id, "agent added to pool");
                Ok(agent)
            }
        }
    }

    /// Run one turn for `user_id`, waiting for any turn already in flight for
    /// the same identifier.
    pub async fn chat(&self, user_id: &str, input: &str) -> Result<String> {
        let agent = self.get_or_create(user_id)?;
        let agent = agent.lock().await;
        agent.chat(input).await
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentPool")
            .field("agents", &self.agents.len())
            .finish_non_exhaustive()
    }
}
