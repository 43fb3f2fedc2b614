use handlebars::Handlebars;
use serde_json::json;

use super::persona::{lookup, Mood, FUNDAMENTALS};

pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = "{{base}} Your current mood is best described as '{{mood}}'. Answer the user's questions in character, {{terminology}}. Maintain the selected personality and mood throughout the conversation. ";

const TEMPLATE_NAME: &str = "instruction";

/// Renders the system instruction sent as the first turn of every request.
///
/// Placeholders available to the template:
/// `base` (persona voice), `mood` (label), `terminology` (topic clause) and
/// `fundamentals` (the raw list of selected topic terms).
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    pub fn new(template: Option<&str>) -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry
            .register_template_string(
                TEMPLATE_NAME,
                template.unwrap_or(DEFAULT_INSTRUCTION_TEMPLATE),
            )
            .map_err(|e| anyhow::anyhow!("invalid instruction template: {e}"))?;

        // strict mode only fails while rendering, so a bad placeholder shows up here
        registry
            .render(
                TEMPLATE_NAME,
                &render_data("", &FUNDAMENTALS, Mood::default()),
            )
            .map_err(|e| anyhow::anyhow!("invalid instruction template: {e}"))?;
        Ok(Self { registry })
    }

    pub fn build_system_instruction<S: AsRef<str>>(
        &self,
        display_name: &str,
        fundamentals: &[S],
        mood: Mood,
    ) -> anyhow::Result<String> {
        let fundamentals: Vec<&str> = fundamentals.iter().map(AsRef::as_ref).collect();
        let data = render_data(display_name, &fundamentals, mood);
        let instruction = self
            .registry
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| anyhow::anyhow!("render instruction err:{e}"))?;
        log::debug!("system instruction:\n{}", instruction);
        Ok(instruction)
    }
}

fn render_data(display_name: &str, fundamentals: &[&str], mood: Mood) -> serde_json::Value {
    json!({
        "base": lookup(display_name).voice,
        "mood": mood.label(),
        "terminology": terminology_clause(fundamentals),
        "fundamentals": fundamentals,
    })
}

fn terminology_clause(fundamentals: &[&str]) -> String {
    if fundamentals.is_empty() {
        "not relying on specialized terminology".to_string()
    } else {
        format!("mentioning terms like {}", fundamentals.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::persona::Persona;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(None).unwrap()
    }

    #[test]
    fn barthomeloi_glad_with_mana_and_od() {
        let text = builder()
            .build_system_instruction("Barthomeloi Lorelei", &["Mana", "Od"], Mood::Glad)
            .unwrap();

        assert!(text.starts_with(Persona::Barthomeloi.profile().voice));
        assert!(text.contains("mentioning terms like Mana, Od"));
        assert!(text.contains("current mood is best described as 'Glad'"));
    }

    #[test]
    fn full_text_matches_template() {
        let text = builder()
            .build_system_instruction("Rin Tohsaka", &["Familiar"], Mood::Pleased)
            .unwrap();
        assert_eq!(
            text,
            format!(
                "{} Your current mood is best described as 'Pleased'. Answer the user's questions in character, mentioning terms like Familiar. Maintain the selected personality and mood throughout the conversation. ",
                Persona::Tohsaka.profile().voice
            )
        );
    }

    #[test]
    fn empty_fundamentals_state_no_terminology() {
        let text = builder()
            .build_system_instruction::<&str>("Lord El Melloi-II", &[], Mood::Ambivalent)
            .unwrap();
        assert!(text.contains("in character, not relying on specialized terminology."));
        assert!(!text.contains("mentioning terms like"));
    }

    #[test]
    fn terms_keep_the_given_order() {
        let text = builder()
            .build_system_instruction("Rin Tohsaka", &["Od", "Magical energy", "Mana"], Mood::Glad)
            .unwrap();
        assert!(text.contains("mentioning terms like Od, Magical energy, Mana."));
    }

    #[test]
    fn output_is_deterministic() {
        let builder = builder();
        let a = builder
            .build_system_instruction("Rin Tohsaka", &["Mana"], Mood::TickedOff)
            .unwrap();
        let b = builder
            .build_system_instruction("Rin Tohsaka", &["Mana"], Mood::TickedOff)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn changing_topics_only_changes_topic_clause() {
        let builder = builder();
        let a = builder
            .build_system_instruction::<&str>("Rin Tohsaka", &[], Mood::Glad)
            .unwrap();
        let b = builder
            .build_system_instruction("Rin Tohsaka", &["Mana", "Od"], Mood::Glad)
            .unwrap();
        assert_eq!(
            a.replace("not relying on specialized terminology", "<topics>"),
            b.replace("mentioning terms like Mana, Od", "<topics>")
        );
    }

    #[test]
    fn changing_mood_only_changes_mood_clause() {
        let builder = builder();
        let a = builder
            .build_system_instruction("Barthomeloi Lorelei", &["Od"], Mood::YouShouldRun)
            .unwrap();
        let b = builder
            .build_system_instruction("Barthomeloi Lorelei", &["Od"], Mood::Pleased)
            .unwrap();
        assert_eq!(
            a.replace("'You should run'", "<mood>"),
            b.replace("'Pleased'", "<mood>")
        );
    }

    #[test]
    fn unknown_display_name_uses_generic_voice() {
        let text = builder()
            .build_system_instruction::<&str>("Gilgamesh", &[], Mood::Ambivalent)
            .unwrap();
        assert!(text.starts_with("You are a helpful and detailed AI assistant. "));
    }

    #[test]
    fn markup_is_not_escaped() {
        let text = builder()
            .build_system_instruction("Rin Tohsaka", &["<Od & Mana>"], Mood::Glad)
            .unwrap();
        assert!(text.contains("<Od & Mana>"));
        assert!(text.contains("'Glad'"));
    }

    #[test]
    fn custom_template_can_use_the_raw_list() {
        let builder = PromptBuilder::new(Some(
            "{{base}}|{{#each fundamentals}}[{{this}}]{{/each}}|{{mood}}",
        ))
        .unwrap();
        let text = builder
            .build_system_instruction("nobody", &["Mana", "Od"], Mood::Glad)
            .unwrap();
        assert_eq!(
            text,
            "You are a helpful and detailed AI assistant.|[Mana][Od]|Glad"
        );
    }

    #[test]
    fn misspelled_placeholder_is_rejected_at_load() {
        let err = PromptBuilder::new(Some("{{base}} {{moood}}"))
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("moood"));
    }

    #[test]
    fn every_documented_placeholder_is_accepted_at_load() {
        assert!(PromptBuilder::new(Some(
            "{{base}}{{mood}}{{terminology}}{{#each fundamentals}}{{this}}{{/each}}"
        ))
        .is_ok());
    }

    #[test]
    fn persona_key_is_not_a_display_name() {
        let text = builder()
            .build_system_instruction::<&str>("Tohsaka", &[], Mood::Glad)
            .unwrap();
        assert!(text.starts_with("You are a helpful and detailed AI assistant. "));
    }

    #[test]
    fn broken_template_is_rejected() {
        assert!(PromptBuilder::new(Some("{{#if base}}unterminated")).is_err());
    }
}
