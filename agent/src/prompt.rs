use scheduler_memory::Turn;

/// Placeholder in system prompt templates replaced with the current time
pub const DATETIME_PLACEHOLDER: &str = "{current_datetime_str}";

/// Reply used when the model keeps requesting actions past the round limit
pub const FALLBACK_REPLY: &str = "Sorry, I wasn't able to complete that request. \
Could you rephrase it or break it into smaller steps?";

const CONDENSATION_INSTRUCTIONS: &str = "You are a helpful assistant. Summarize the key facts, \
entities, and user decisions from this conversation history. Key information includes event \
names, attendee names, preferred times, and meeting durations. Keep every stated preference and \
every decision that was made. The summary should be concise and clear.";

/// Substitutes the current time into a system prompt template
pub fn render_system_prompt(template: &str, current_datetime: &str) -> String {
    template.replace(DATETIME_PLACEHOLDER, current_datetime)
}

/// Single-shot prompt asking the model to summarize `turns`
pub fn condensation_prompt(turns: &[Turn]) -> String {
    let history = turns
        .iter()
        .map(Turn::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\n--- Conversation to Summarize ---\n{}",
        CONDENSATION_INSTRUCTIONS, history
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_placeholder() {
        let rendered = render_system_prompt(
            "Now: {current_datetime_str}. Again: {current_datetime_str}",
            "Monday 10:00",
        );
        assert_eq!(rendered, "Now: Monday 10:00. Again: Monday 10:00");
        assert_eq!(render_system_prompt("static", "x"), "static");
    }

    #[test]
    fn test_condensation_prompt_lists_turns_in_order() {
        let prompt = condensation_prompt(&[
            Turn::user("Meet Sarah for an hour"),
            Turn::assistant("Which day works?"),
        ]);
        assert!(prompt.contains("attendee names"));
        let history = prompt.split("--- Conversation to Summarize ---\n").nth(1).unwrap();
        assert_eq!(
            history,
            "user: Meet Sarah for an hour\nassistant: Which day works?"
        );
    }
}
