use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use debug_tool::EchoAssistant;
use sys::{
    llm::{GeminiClient, Generate},
    persona::{Mood, Persona},
    prompt::PromptBuilder,
    session::Session,
};

mod component;
mod debug_tool;
mod sys;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Chat with the magi of the Clock Tower")]
struct Args {
    /// toml config file
    #[arg(long, short)]
    config: Option<String>,

    /// persona to start with (Tohsaka, Barthomeloi, El Melloi-II)
    #[arg(long, short)]
    persona: Option<Persona>,

    /// starting mood, e.g. "Glad"
    #[arg(long)]
    mood: Option<Mood>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, value_enum, default_value_t = Backend::Gemini)]
    backend: Backend,

    /// write logs here instead of stderr
    #[arg(long)]
    log_file: Option<String>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum Backend {
    Gemini,
    /// reply with the user's own message, no network
    Echo,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct Project {
    persona: Option<String>,
    /// handlebars template of the system instruction
    instruction: Option<String>,
    #[serde(default)]
    gemini: GeminiOptions,
}

#[derive(Clone, Default, serde::Deserialize)]
struct GeminiOptions {
    #[serde(default)]
    model: String,
    #[serde(default)]
    endpoint: String,
    api_key: Option<String>,
    #[serde(default)]
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiOptions")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiOptions {
    fn fill_default_value(&mut self) {
        if self.model.is_empty() {
            self.model = "gemini-2.5-flash".to_string();
        }
        if self.endpoint.is_empty() {
            self.endpoint = "https://generativelanguage.googleapis.com/v1beta".to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = 60;
        }
    }
}

fn load_project(path: Option<&str>) -> anyhow::Result<Project> {
    let Some(path) = path else {
        return Ok(Project::default());
    };
    let project = std::fs::read_to_string(path)
        .map_err(|_| anyhow!("config file `{}` not found", path))?;
    toml::from_str(&project).map_err(|e| anyhow!("config file `{path}` err:{e}"))
}

fn init_logger(log_file: Option<&str>) -> anyhow::Result<()> {
    // stderr would draw over the alternate screen, so it stays quiet unless asked
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .map_err(|e| anyhow!("open log file `{path}` err:{e}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn start_persona(cli: Option<Persona>, project: &Project) -> anyhow::Result<Persona> {
    match (cli, project.persona.as_deref()) {
        (Some(persona), _) => Ok(persona),
        (None, Some(name)) => name.parse(),
        (None, None) => Ok(Persona::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Args::parse();
    init_logger(cli.log_file.as_deref())?;

    let mut project = load_project(cli.config.as_deref())?;
    project.gemini.fill_default_value();
    log::debug!("{project:?}");

    let prompts = PromptBuilder::new(project.instruction.as_deref())?;
    let persona = start_persona(cli.persona, &project)?;

    let mut generator: Box<dyn Generate> = match cli.backend {
        Backend::Echo => Box::new(EchoAssistant::default()),
        Backend::Gemini => {
            let api_key = cli
                .api_key
                .or(project.gemini.api_key.clone())
                .ok_or(anyhow!(
                    "no API key: pass --api-key, set GEMINI_API_KEY or `api_key` under [gemini]"
                ))?;
            let client = GeminiClient::new(
                &project.gemini.endpoint,
                &project.gemini.model,
                api_key,
                Duration::from_secs(project.gemini.timeout_secs),
            )?;
            log::info!("using {}", client.url());
            Box::new(client)
        }
    };

    let mut session = Session::new();
    if let Some(mood) = cli.mood {
        session.set_mood(mood);
    }
    session.select_persona(persona);

    let app = component::App::new(session, prompts);
    app.run_loop(generator.as_mut())
}
