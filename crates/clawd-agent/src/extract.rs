//! Fact extraction from user input.
//!
//! A cheap, deterministic heuristic that promotes stated facts into memory
//! after each turn.  It is deliberately lossy and only looks at what the user
//! typed.  The [`FactExtractor`] trait keeps it swappable.

use clawd_store::{PREFERENCES_CATEGORY, USER_CATEGORY};

/// Trigger phrases for the user's name, in priority order.
const NAME_TRIGGERS: [&str; 3] = ["my name is ", "i'm ", "i am "];

/// Trigger phrases for a stated preference.
const PREFERENCE_TRIGGERS: [&str; 2] = ["i prefer", "i like"];

/// Maximum number of characters of raw input kept as a preference note.
const PREFERENCE_NOTE_CHARS: usize = 100;

/// Punctuation stripped from both ends of a captured name.
const NAME_PUNCTUATION: [char; 4] = ['.', ',', '!', '?'];

/// A fact to be written with `MemoryStore::remember`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFact {
    pub category: String,
    pub key: String,
    pub value: String,
}

impl ExtractedFact {
    fn new(category: &str, key: &str, value: impl Into<String>) -> Self {
        Self {
            category: category.to_owned(),
            key: key.to_owned(),
            value: value.into(),
        }
    }
}

/// Turns one exchange into facts worth remembering.
pub trait FactExtractor: Send + Sync {
    fn extract(&self, user_input: &str, reply: &str) -> Vec<ExtractedFact>;
}

/// Trigger-phrase extractor.
///
/// - Name: the first token after the first matching phrase of
///   `"my name is "`, `"i'm "`, `"i am "`, with `. , ! ?` trimmed; stored as
///   `user/name`.
/// - Preference: on `"i prefer"` or `"i like"`, the first 100 characters of
///   the raw input; stored as `preferences/noted`, replacing the previous note.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl FactExtractor for HeuristicExtractor {
    fn extract(&self, user_input: &str, _reply: &str) -> Vec<ExtractedFact> {
        // ASCII lowering keeps byte offsets aligned with `user_input`.
        let lowered = user_input.to_ascii_lowercase();
        let mut facts = Vec::new();

        if let Some(name) = detect_name(user_input, &lowered) {
            facts.push(ExtractedFact::new(USER_CATEGORY, "name", name));
        }

        if PREFERENCE_TRIGGERS.iter().any(|t| lowered.contains(t)) {
            let note: String = user_input.chars().take(PREFERENCE_NOTE_CHARS).collect();
            facts.push(ExtractedFact::new(PREFERENCES_CATEGORY, "noted", note));
        }

        facts
    }
}

fn detect_name<'a>(input: &'a str, lowered: &str) -> Option<&'a str> {
    for trigger in NAME_TRIGGERS {
        let Some(pos) = lowered.find(trigger) else {
            continue;
        };
        let rest = &input[pos + trigger.len()..];
        let name = rest
            .split_whitespace()
            .next()
            .map(|token| token.trim_matches(NAME_PUNCTUATION.as_slice()))
            .unwrap_or_default();
        if !name.is_empty() {
            return Some(name);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
