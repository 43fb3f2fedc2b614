use std::time::Duration;

use anyhow::anyhow;

use super::persona::Mood;
use super::session::{Message, Role};

/// Role vocabulary of the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TurnRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// `None` for local notices, which the API never sees.
fn to_turn(message: &Message) -> Option<Turn> {
    let role = match message.role {
        Role::User => TurnRole::User,
        Role::Assistant => TurnRole::Model,
        Role::System => return None,
    };
    Some(Turn::new(role, message.content.clone()))
}

/// Orders a request: instruction first (as a user turn), then the prior
/// history, then the new message.
pub fn build_turns(
    system_instruction: &str,
    history: &[Message],
    new_user_message: &str,
) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(Turn::new(TurnRole::User, system_instruction));
    turns.extend(history.iter().filter_map(to_turn));
    turns.push(Turn::new(TurnRole::User, new_user_message));
    turns
}

/// A text generation backend.
pub trait Generate {
    fn generate(&mut self, turns: &[Turn]) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Echo of the mood the request was made with. The model never changes it.
    pub mood: Mood,
}

pub fn generate_reply<G: Generate + ?Sized>(
    generator: &mut G,
    system_instruction: &str,
    history: &[Message],
    new_user_message: &str,
    mood: Mood,
) -> anyhow::Result<Reply> {
    let turns = build_turns(system_instruction, history, new_user_message);
    log::debug!("sending {} turns", turns.len());
    let text = generator.generate(&turns)?;
    Ok(Reply { text, mood })
}

#[derive(Debug, serde::Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Turn],
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, serde::Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    message: String,
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all text parts joined.
    fn into_text(self) -> anyhow::Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(anyhow!("the model returned no reply: {reason}"));
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(anyhow!("the reply carried no text (finish reason: {reason})"));
        }
        Ok(texts.concat())
    }
}

fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) => match error.status {
            Some(s) => format!("{status} {s}: {}", error.message),
            None => format!("{status}: {}", error.message),
        },
        Err(_) => format!("{status}: {}", body.trim()),
    }
}

/// Client of the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("build http client err:{e}"))?;
        let url = format!(
            "{}/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            model
        );
        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Generate for GeminiClient {
    fn generate(&mut self, turns: &[Turn]) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest { contents: turns })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            log::warn!("generateContent failed with {status}");
            return Err(anyhow!(
                "generation request failed: {}",
                api_error_message(status, &body)
            ));
        }

        let response: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow!("malformed generateContent response: {e}"))?;
        response.into_text()
    }
}
