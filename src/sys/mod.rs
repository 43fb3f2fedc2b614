use llm::{generate_reply, Generate};
use prompt::PromptBuilder;
use session::{Message, Session};

pub mod llm;
pub mod persona;
pub mod prompt;
pub mod session;

/// Runs one chat turn for the current persona.
///
/// On success the user message and the reply are appended and the reply text
/// is returned. On failure the user message is kept, followed by a system
/// notice, and the error is returned to the caller.
pub fn exchange<G: Generate + ?Sized, S: AsRef<str>>(
    session: &mut Session,
    prompts: &PromptBuilder,
    generator: &mut G,
    fundamentals: &[S],
    message: String,
) -> anyhow::Result<String> {
    let persona = session.current();
    session.ensure_initialized(persona);

    let result = prompts
        .build_system_instruction(persona.display_name(), fundamentals, session.mood())
        .and_then(|instruction| {
            generate_reply(
                generator,
                &instruction,
                session.history(persona),
                &message,
                session.mood(),
            )
        });

    session.append(persona, Message::user(message));
    match result {
        Ok(reply) => {
            session.set_mood(reply.mood);
            session.append(persona, Message::assistant(reply.text.clone()));
            Ok(reply.text)
        }
        Err(err) => {
            log::error!("{persona} could not reply: {err:#}");
            let notice = format!("Failed to get a reply: {err}");
            session.append(persona, Message::system(notice));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::llm::{Turn, TurnRole};
    use super::persona::{Mood, Persona};
    use super::session::Role;
    use super::*;

    struct Scripted {
        replies: Vec<anyhow::Result<String>>,
        requests: Vec<Vec<Turn>>,
    }

    impl Scripted {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self {
                replies,
                requests: Vec::new(),
            }
        }
    }

    impl Generate for Scripted {
        fn generate(&mut self, turns: &[Turn]) -> anyhow::Result<String> {
            self.requests.push(turns.to_vec());
            self.replies.remove(0)
        }
    }

    fn setup(persona: Persona) -> (Session, PromptBuilder) {
        let mut session = Session::new();
        session.select_persona(persona);
        (session, PromptBuilder::new(None).unwrap())
    }

    #[test]
    fn successful_turn_appends_user_then_reply() {
        let (mut session, prompts) = setup(Persona::Tohsaka);
        let mut generator = Scripted::new(vec![Ok("Jewels, obviously.".to_string())]);

        let reply = exchange(
            &mut session,
            &prompts,
            &mut generator,
            &["Mana"],
            "Best catalyst?".to_string(),
        )
        .unwrap();

        assert_eq!(reply, "Jewels, obviously.");
        let history = session.history(Persona::Tohsaka);
        assert_eq!(
            &history[history.len() - 2..],
            [
                Message::user("Best catalyst?"),
                Message::assistant("Jewels, obviously.")
            ]
        );
    }

    #[test]
    fn request_carries_instruction_history_and_new_message() {
        let (mut session, prompts) = setup(Persona::Barthomeloi);
        session.set_mood(Mood::Glad);
        let mut generator = Scripted::new(vec![Ok("Proceed.".to_string())]);

        exchange(
            &mut session,
            &prompts,
            &mut generator,
            &["Mana", "Od"],
            "Hello".to_string(),
        )
        .unwrap();

        let turns = &generator.requests[0];
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, TurnRole::User);
        assert!(turns[0].text().contains("mentioning terms like Mana, Od"));
        assert!(turns[0].text().contains("'Glad'"));
        assert_eq!(turns[1], Turn::new(TurnRole::Model, Persona::Barthomeloi.opening_line()));
        assert_eq!(turns[2], Turn::new(TurnRole::User, "Hello"));
        assert_eq!(session.mood(), Mood::Glad);
    }

    #[test]
    fn failed_turn_keeps_message_and_adds_notice() {
        let (mut session, prompts) = setup(Persona::ElMelloiII);
        let mut generator = Scripted::new(vec![
            Err(anyhow!("quota exceeded")),
            Ok("As I was saying.".to_string()),
        ]);

        let err = exchange::<_, &str>(
            &mut session,
            &prompts,
            &mut generator,
            &[],
            "First".to_string(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");

        let history = session.history(Persona::ElMelloiII);
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], Message::user("First"));
        assert_eq!(history[2].role, Role::System);
        assert!(history[2].content.contains("quota exceeded"));

        exchange::<_, &str>(
            &mut session,
            &prompts,
            &mut generator,
            &[],
            "Second".to_string(),
        )
        .unwrap();
        let retry = &generator.requests[1];
        assert!(retry.iter().all(|t| !t.text().contains("quota exceeded")));
        assert_eq!(retry.len(), 4);
    }
}
