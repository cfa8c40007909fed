use std::fmt::Write as _;

use mercabot_core::{ContextMessage, Intent, Role};

/// History turns embedded into the reasoner prompt.
pub const HISTORY_TURNS: usize = 5;

/// Static domain block. The reasoner never learns facts from anywhere else.
pub const COMPANY_CONTEXT: &str = "\
Mercalia is an online store for school and office supplies in Latin America. \
Customers write short, informal Spanish messages (sometimes English). The \
assistant helps them find products, check orders, track shipments, handle \
returns, and navigate the site. It never invents prices or stock.";

/// Render the deep-reasoner prompt: domain context, recent history, the
/// current utterance, and the closed intent vocabulary with one-line
/// descriptions. The model is asked to reason briefly and answer with strict
/// JSON only.
pub fn render_reasoner_prompt(utterance: &str, history: &[ContextMessage]) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("You classify a customer message for a store assistant.\n\n");
    prompt.push_str("Context:\n");
    prompt.push_str(COMPANY_CONTEXT);
    prompt.push_str("\n\n");

    let start = history.len().saturating_sub(HISTORY_TURNS);
    let recent = &history[start..];
    if !recent.is_empty() {
        prompt.push_str("Recent conversation (oldest first):\n");
        for message in recent {
            let speaker = match message.role {
                Role::User => "user",
                Role::Bot => "assistant",
            };
            let _ = writeln!(prompt, "- {speaker}: {}", message.text);
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "Current message: {utterance}\n");

    prompt.push_str("Allowed intents:\n");
    for intent in Intent::ALL {
        let _ = writeln!(prompt, "- {}: {}", intent.wire_name(), intent.description());
    }

    prompt.push_str(
        "\nThink briefly, then answer with a single JSON object and nothing else:\n\
         {\"intent\": \"<one of the allowed intents>\", \"confidence\": <0.0-1.0>, \
         \"entities\": {\"search_term\": null, \"category\": null, \"brand\": null, \
         \"color\": null, \"min_price\": null, \"max_price\": null, \"destination\": null}, \
         \"reasoning\": \"<one sentence>\"}\n\
         Omit entity keys you did not find. Use UNCLEAR if no intent fits.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use mercabot_core::{ContextMessage, Intent, Role};

    use super::{render_reasoner_prompt, HISTORY_TURNS};

    fn message(role: Role, text: &str) -> ContextMessage {
        ContextMessage { role, text: text.to_string(), intent: None, timestamp: Utc::now() }
    }

    #[test]
    fn prompt_embeds_vocabulary_and_utterance() {
        let prompt = render_reasoner_prompt("busco una mochila", &[]);
        for intent in Intent::ALL {
            assert!(prompt.contains(intent.wire_name()), "missing {intent}");
        }
        assert!(prompt.contains("busco una mochila"));
        assert!(prompt.contains("Mercalia"));
    }

    #[test]
    fn history_is_capped_to_recent_turns() {
        let history: Vec<_> =
            (0..12).map(|i| message(Role::User, &format!("turno {i}"))).collect();
        let prompt = render_reasoner_prompt("y esto?", &history);

        assert!(!prompt.contains("turno 6"));
        assert!(prompt.contains("turno 7"));
        assert!(prompt.contains("turno 11"));
        assert_eq!(prompt.matches("- user:").count(), HISTORY_TURNS);
    }

    #[test]
    fn empty_history_omits_the_section() {
        let prompt = render_reasoner_prompt("hola", &[]);
        assert!(!prompt.contains("Recent conversation"));
    }
}
