//! Categorized facts.
//!
//! Facts live in named categories. Most categories are keyed maps where a
//! later write to the same key replaces the earlier one (last-write-wins, no
//! versioning). The reserved [`TASKS_CATEGORY`] holds an ordered list of
//! free-text tasks instead.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category holding facts about the user (name, language, ...).
pub const USER_CATEGORY: &str = "user";

/// Category holding user preferences.
pub const PREFERENCES_CATEGORY: &str = "preferences";

/// Category holding general knowledge about the world.
pub const WORLD_CATEGORY: &str = "world";

/// Reserved list-valued category of ongoing tasks.
pub const TASKS_CATEGORY: &str = "tasks";

/// A single stored value with the time it was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub value: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl Fact {
    /// Create a fact stamped with the current time.
    pub fn now(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The contents of one category.
///
/// On disk a keyed category is a JSON object and a list category is a JSON
/// array, so the enum is untagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactCategory {
    /// `key -> fact` mapping with unique keys.
    Keyed(BTreeMap<String, Fact>),
    /// Ordered list of entries (used by [`TASKS_CATEGORY`]).
    List(Vec<String>),
}

impl FactCategory {
    /// An empty keyed category.
    pub fn keyed() -> Self {
        Self::Keyed(BTreeMap::new())
    }

    /// Whether the category holds no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Keyed(map) => map.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// Number of entries in the category.
    pub fn len(&self) -> usize {
        match self {
            Self::Keyed(map) => map.len(),
            Self::List(items) => items.len(),
        }
    }
}

/// All facts for one user, keyed by category name.
pub type Facts = BTreeMap<String, FactCategory>;

/// The facts document a fresh user starts with.
pub fn default_facts() -> Facts {
    let mut facts = Facts::new();
    facts.insert(USER_CATEGORY.to_owned(), FactCategory::keyed());
    facts.insert(PREFERENCES_CATEGORY.to_owned(), FactCategory::keyed());
    facts.insert(WORLD_CATEGORY.to_owned(), FactCategory::keyed());
    facts.insert(TASKS_CATEGORY.to_owned(), FactCategory::List(Vec::new()));
    facts
}

/// Render the labelled context paragraphs for the system prompt.
///
/// Only the user, preferences and tasks categories are rendered; everything
/// else stays out of the prompt. Returns an empty string when none of them
/// has entries.
pub fn render_context(facts: &Facts) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(FactCategory::Keyed(map)) = facts.get(USER_CATEGORY)
        && !map.is_empty()
    {
        parts.push(render_keyed("About the user:", map));
    }

    if let Some(FactCategory::Keyed(map)) = facts.get(PREFERENCES_CATEGORY)
        && !map.is_empty()
    {
        parts.push(render_keyed("User preferences:", map));
    }

    if let Some(FactCategory::List(tasks)) = facts.get(TASKS_CATEGORY)
        && !tasks.is_empty()
    {
        let lines: Vec<String> = tasks.iter().map(|t| format!("- {t}")).collect();
        parts.push(format!("Active tasks:\n{}", lines.join("\n")));
    }

    parts.join("\n\n")
}

fn render_keyed(label: &str, map: &BTreeMap<String, Fact>) -> String {
    let lines: Vec<String> = map
        .iter()
        .map(|(key, fact)| format!("- {key}: {}", fact.value))
        .collect();
    format!("{label}\n{}", lines.join("\n"))
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(entries: &[(&str, &str)]) -> FactCategory {
        FactCategory::Keyed(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), Fact::now(*v)))
                .collect(),
        )
    }

    #[test]
    fn empty_facts_render_nothing() {
        assert_eq!(render_context(&default_facts()), "");
    }

    #[test]
    fn renders_labelled_paragraphs() {
        let mut facts = default_facts();
        facts.insert(USER_CATEGORY.into(), keyed(&[("name", "Ada")]));
        facts.insert(PREFERENCES_CATEGORY.into(), keyed(&[("voice", "fast")]));
        facts.insert(
            TASKS_CATEGORY.into(),
            FactCategory::List(vec!["buy milk".into()]),
        );

        assert_eq!(
            render_context(&facts),
            "About the user:\n- name: Ada\n\nUser preferences:\n- voice: fast\n\nActive tasks:\n- buy milk"
        );
    }

    #[test]
    fn other_categories_are_not_rendered() {
        let mut facts = default_facts();
        facts.insert(WORLD_CATEGORY.into(), keyed(&[("capital", "Paris")]));
        facts.insert("misc".into(), keyed(&[("a", "b")]));
        assert_eq!(render_context(&facts), "");
    }

    #[test]
    fn category_shapes_round_trip_through_json() {
        let json = serde_json::json!({
            "user": {"name": {"value": "Ada", "timestamp": "2024-01-01T00:00:00Z"}},
            "tasks": ["one", "two"]
        });
        let facts: Facts = serde_json::from_value(json).unwrap();
        assert!(matches!(facts["user"], FactCategory::Keyed(_)));
        assert_eq!(facts["tasks"], FactCategory::List(vec!["one".into(), "two".into()]));
        assert_eq!(facts["tasks"].len(), 2);
    }
}
