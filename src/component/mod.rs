use chat::Output;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    widgets::{Block, Paragraph, Tabs},
    Frame, Terminal,
};

use crate::sys::{self, llm::Generate, persona::Persona, prompt::PromptBuilder, session::Session};

pub mod chat;
pub mod options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Options,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Exit,
    Reply,
    Normal,
}

pub struct App {
    pub session: Session,
    prompts: PromptBuilder,
    pub chat: chat::ChatComponent,
    pub options: options::OptionsComponent,
    focus: Focus,
    pending: Option<String>,
    exit_n: u8,
    pub status: String,
}

impl App {
    pub fn new(session: Session, prompts: PromptBuilder) -> Self {
        Self {
            session,
            prompts,
            chat: chat::ChatComponent::new(),
            options: options::OptionsComponent::new(),
            focus: Focus::Input,
            pending: None,
            exit_n: 0,
            status: String::new(),
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let vertical = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ]);

        let [tabs_area, main_area, help_area, event_area] = vertical.areas(f.size());

        let persona = self.session.current();
        let tabs = Tabs::new(Persona::ALL.iter().map(|p| p.display_name()).collect::<Vec<_>>())
            .select(persona.index())
            .padding("[", "]")
            .block(Block::bordered());
        f.render_widget(tabs, tabs_area);

        let horizontal = Layout::horizontal([Constraint::Length(36), Constraint::Min(20)]);
        let [options_area, chat_area] = horizontal.areas(main_area);

        self.options.render(
            persona,
            self.session.mood(),
            self.focus == Focus::Options,
            f,
            options_area,
        );
        self.chat.render(
            self.session.history(persona),
            self.pending.as_deref(),
            persona,
            self.focus == Focus::Input,
            f,
            chat_area,
        );

        let help_message = Paragraph::new(
            "help: [Enter send] [Alt+Enter newline] [Tab options] [Ctrl+N next persona] [Ctrl+L clear] [Esc+Esc quit]",
        );
        f.render_widget(help_message, help_area);

        let status = Paragraph::new(self.status.as_str());
        f.render_widget(status, event_area);
    }

    fn apply(&mut self, output: Output) -> Step {
        match output {
            Output::Chat(message) => {
                self.status = format!("{} is thinking...", self.session.current().display_name());
                self.pending = Some(message);
                return Step::Reply;
            }
            Output::SelectPersona(persona) => {
                self.session.select_persona(persona);
                self.chat.messages.lock_on_bottom = true;
                self.status = format!("now chatting with {}", persona.display_name());
            }
            Output::SetMood(mood) => {
                self.session.set_mood(mood);
                self.status = format!("mood: {mood}");
            }
            Output::Clear => {
                self.session.reset(self.session.current());
                self.chat.messages.lock_on_bottom = true;
                self.status = "chat history cleared".to_string();
            }
            Output::Normal => {}
        }
        Step::Normal
    }

    fn handler_key(&mut self, input: KeyEvent) -> Step {
        let ctrl = input.modifiers.contains(KeyModifiers::CONTROL);
        let output = match input.code {
            KeyCode::Esc => {
                self.exit_n += 2;
                if self.exit_n >= 3 {
                    return Step::Exit;
                }
                self.status = "press Esc again to quit".to_string();
                Output::Normal
            }
            KeyCode::Char('c') if ctrl => return Step::Exit,
            KeyCode::Char('l') if ctrl => Output::Clear,
            KeyCode::Char('n') if ctrl => Output::SelectPersona(self.session.current().next()),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Options,
                    Focus::Options => Focus::Input,
                };
                Output::Normal
            }
            _ => match self.focus {
                Focus::Input => self.chat.handler_input(input),
                Focus::Options => self.options.handler_input(input, self.session.mood()),
            },
        };
        self.apply(output)
    }

    pub fn handler_input(&mut self, input: Event) -> Step {
        let step = match input {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handler_key(key),
            Event::Mouse(event) => {
                self.chat.messages.handler_mouse(event);
                Step::Normal
            }
            _ => return Step::Normal,
        };

        self.exit_n = self.exit_n.max(1) - 1;
        step
    }

    /// Sends the pending message and blocks until the reply (or error) is in.
    pub fn reply(&mut self, generator: &mut dyn Generate) {
        let Some(message) = self.pending.take() else {
            return;
        };
        let persona = self.session.current();
        let result = sys::exchange(
            &mut self.session,
            &self.prompts,
            generator,
            self.options.selected_fundamentals(),
            message,
        );
        self.status = match result {
            Ok(_) => format!("{} replied", persona.display_name()),
            Err(err) => format!("error: {err}"),
        };
        self.chat.messages.lock_on_bottom = true;
    }

    pub fn run_loop(mut self, generator: &mut dyn Generate) -> anyhow::Result<()> {
        // setup terminal
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut main_loop = || -> anyhow::Result<()> {
            let mut step = Step::Normal;

            loop {
                terminal.draw(|f| self.render(f))?;

                match step {
                    Step::Exit => break,
                    Step::Reply => {
                        // the thinking state is on screen now
                        self.reply(generator);
                        step = Step::Normal;
                        continue;
                    }
                    Step::Normal => {}
                }

                step = self.handler_input(event::read()?);
            }
            Ok(())
        };

        let r = main_loop();

        // restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        r
    }
}
