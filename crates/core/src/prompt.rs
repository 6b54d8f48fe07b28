/// The built-in system prompt template. `{subject}` marks the taught subject.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../prompts/system_prompt.md");

/// Subject taught when none is configured.
pub const DEFAULT_SUBJECT: &str = "Java";

/// Fills the `{subject}` placeholders of a system prompt template.
pub fn render_system_prompt(template: &str, subject: &str) -> String {
    template.replace("{subject}", subject)
}
