//! System prompt template.

/// Placeholder replaced by the memory context summary.
pub const MEMORY_CONTEXT_PLACEHOLDER: &str = "{memory_context}";

/// The default Clawd persona.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Clawd, an intelligent AI assistant with memory and tools.

You remember information about the user and past conversations.
You can use tools to search the web, read files, and interact with applications.

When you learn new information about the user, remember it.
Be helpful, concise, and proactive.

{memory_context}
";

/// Interpolate `memory_context` into `template`.
///
/// Every occurrence of the placeholder is replaced; other braces are left
/// untouched.
pub fn render_system_prompt(template: &str, memory_context: &str) -> String {
    template.replace(MEMORY_CONTEXT_PLACEHOLDER, memory_context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_placeholder() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains(MEMORY_CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn context_is_interpolated() {
        let prompt = render_system_prompt(DEFAULT_SYSTEM_PROMPT, "About the user:\n- name: Ada");
        assert!(prompt.starts_with("You are Clawd"));
        assert!(prompt.contains("- name: Ada"));
        assert!(!prompt.contains(MEMORY_CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn empty_context_leaves_template_text() {
        let prompt = render_system_prompt("Hi {json} {memory_context}!", "");
        assert_eq!(prompt, "Hi {json} !");
    }
}
