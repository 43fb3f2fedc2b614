use crate::sys::llm::{Generate, Turn};

/// Offline backend: replies with the last user turn, so the UI can be
/// exercised without an API key.
#[derive(Debug, Default)]
pub struct EchoAssistant {
    pub requests: usize,
}

impl Generate for EchoAssistant {
    fn generate(&mut self, turns: &[Turn]) -> anyhow::Result<String> {
        self.requests += 1;
        log::debug!("echo request #{} with {} turns", self.requests, turns.len());
        let last = turns
            .last()
            .map(Turn::text)
            .ok_or_else(|| anyhow::anyhow!("empty request"))?;
        Ok(format!("(echo) {last}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::llm::build_turns;

    #[test]
    fn echoes_the_newest_message() {
        let mut echo = EchoAssistant::default();
        let turns = build_turns("instruction", &[], "Is Od finite?");
        assert_eq!(echo.generate(&turns).unwrap(), "(echo) Is Od finite?");
        assert_eq!(echo.requests, 1);
    }

    #[test]
    fn empty_request_is_an_error() {
        let mut echo = EchoAssistant::default();
        assert!(echo.generate(&[]).is_err());
    }
}
