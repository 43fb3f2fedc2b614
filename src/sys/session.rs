use std::{collections::HashMap, fmt::Display};

use super::persona::{Mood, Persona};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = self.as_ref();
        write!(f, "{role}")
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// A local notice. Shown in the transcript, never sent to the model.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Conversation state of one interactive session: a history per persona,
/// the persona on screen and the user-chosen mood.
#[derive(Debug, Default)]
pub struct Session {
    current: Persona,
    histories: HashMap<Persona, Vec<Message>>,
    mood: Mood,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Persona {
        self.current
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    pub fn select_persona(&mut self, persona: Persona) {
        if self.current != persona {
            log::info!("switching persona to {persona}");
        }
        self.current = persona;
        self.ensure_initialized(persona);
    }

    /// Seeds the opening line if the persona has no messages yet.
    pub fn ensure_initialized(&mut self, persona: Persona) {
        let history = self.histories.entry(persona).or_default();
        if history.is_empty() {
            history.push(Message::assistant(persona.opening_line()));
        }
    }

    /// Empty until [`Session::ensure_initialized`] has run for `persona`.
    pub fn history(&self, persona: Persona) -> &[Message] {
        self.histories
            .get(&persona)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn append(&mut self, persona: Persona, message: Message) {
        self.histories.entry(persona).or_default().push(message);
    }

    pub fn reset(&mut self, persona: Persona) {
        log::info!("clearing chat history of {persona}");
        if let Some(history) = self.histories.get_mut(&persona) {
            history.clear();
        }
        self.mood = Mood::default();
        self.ensure_initialized(persona);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_seeds_opening_line() {
        for persona in Persona::ALL {
            let mut session = Session::new();
            assert!(session.history(persona).is_empty());

            session.ensure_initialized(persona);
            assert_eq!(
                session.history(persona),
                [Message::assistant(persona.opening_line())]
            );
        }
    }

    #[test]
    fn initialization_is_idempotent() {
        let mut session = Session::new();
        session.ensure_initialized(Persona::Barthomeloi);
        session.append(Persona::Barthomeloi, Message::user("hello"));
        session.ensure_initialized(Persona::Barthomeloi);
        session.ensure_initialized(Persona::Barthomeloi);
        assert_eq!(session.history(Persona::Barthomeloi).len(), 2);
    }

    #[test]
    fn select_persona_initializes_only_that_persona() {
        let mut session = Session::new();
        session.select_persona(Persona::ElMelloiII);
        assert_eq!(session.current(), Persona::ElMelloiII);
        assert_eq!(session.history(Persona::ElMelloiII).len(), 1);
        assert!(session.history(Persona::Tohsaka).is_empty());
    }

    #[test]
    fn histories_are_kept_per_persona() {
        let mut session = Session::new();
        session.select_persona(Persona::Tohsaka);
        session.append(Persona::Tohsaka, Message::user("gems?"));
        session.select_persona(Persona::Barthomeloi);
        session.select_persona(Persona::Tohsaka);

        let history = session.history(Persona::Tohsaka);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], Message::user("gems?"));
    }

    #[test]
    fn append_keeps_turn_order() {
        let mut session = Session::new();
        session.select_persona(Persona::Tohsaka);
        session.append(Persona::Tohsaka, Message::user("What is Od?"));
        session.append(Persona::Tohsaka, Message::assistant("Your own prana."));

        let history = session.history(Persona::Tohsaka);
        assert_eq!(
            &history[history.len() - 2..],
            [
                Message::user("What is Od?"),
                Message::assistant("Your own prana.")
            ]
        );
    }

    #[test]
    fn reset_restores_opening_line_and_default_mood() {
        let mut session = Session::new();
        session.select_persona(Persona::ElMelloiII);
        for i in 0..5 {
            session.append(Persona::ElMelloiII, Message::user(format!("q{i}")));
            session.append(Persona::ElMelloiII, Message::assistant(format!("a{i}")));
        }
        session.set_mood(Mood::YouShouldRun);

        session.reset(Persona::ElMelloiII);

        assert_eq!(
            session.history(Persona::ElMelloiII),
            [Message::assistant(Persona::ElMelloiII.opening_line())]
        );
        assert_eq!(session.mood(), Mood::Ambivalent);
    }

    #[test]
    fn reset_of_untouched_persona_still_seeds() {
        let mut session = Session::new();
        session.reset(Persona::Barthomeloi);
        assert_eq!(session.history(Persona::Barthomeloi).len(), 1);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::System.to_string(), "system");
    }
}
