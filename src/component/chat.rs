use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::sys::persona::{Mood, Persona};
use crate::sys::session::{Message, Role};

#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Chat(String),
    SelectPersona(Persona),
    SetMood(Mood),
    Clear,
    Normal,
}

pub struct MessagesComponent {
    cursor: (u16, u16),
    last_mouse_event: MouseEvent,
    pub lock_on_bottom: bool,
    area: Rect,
    active: bool,
}

impl MessagesComponent {
    pub fn new() -> Self {
        Self {
            cursor: (0, 0),
            lock_on_bottom: true,
            active: true,
            area: Rect::default(),
            last_mouse_event: MouseEvent {
                row: 0,
                column: 0,
                kind: MouseEventKind::Moved,
                modifiers: KeyModifiers::empty(),
            },
        }
    }

    fn update_active(&mut self, event: MouseEvent) {
        if event.kind == MouseEventKind::Down(MouseButton::Left) {
            self.active = self.area.contains(Position::new(event.column, event.row))
        }
        if event.kind == MouseEventKind::Drag(MouseButton::Left) && self.active {
            self.move_scoll(event);
        }
        self.last_mouse_event = event;
    }

    /// `pending` is a user message still waiting for its reply.
    pub fn render(
        &mut self,
        messages: &[Message],
        pending: Option<&str>,
        persona: Persona,
        frame: &mut Frame,
        area: Rect,
    ) {
        self.area = area;
        let max_len = (area.width.max(3) - 2) as usize;
        let mut text = Text::default();

        for message in messages {
            push_message(&mut text, &message.role, &message.content, persona, max_len);
        }
        if let Some(pending) = pending {
            push_message(&mut text, &Role::User, pending, persona, max_len);
        }

        let line_n = text.lines.len();

        let max_line = area.height.saturating_sub(2) as usize;
        if line_n > max_line {
            let max_cursor = line_n - max_line;
            if self.cursor.0 >= max_cursor as u16 {
                self.lock_on_bottom = true;
            }

            if self.lock_on_bottom {
                self.cursor.0 = max_cursor as u16;
            }
        } else {
            self.cursor.0 = 0;
        }

        let paragraph = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(format!("Chatting with {}", persona.display_name()))
                    .gray(),
            )
            .scroll(self.cursor);
        frame.render_widget(paragraph, area);
    }

    pub fn move_scoll(&mut self, event: MouseEvent) {
        let (delta_y, delta_x) = (
            event.row as i16 - self.last_mouse_event.row as i16,
            event.column as i16 - self.last_mouse_event.column as i16,
        );
        if delta_x != 0 {
            self.cursor.1 = (self.cursor.1 as i16 - delta_x).max(0) as u16;
        }
        if delta_y != 0 {
            self.cursor.0 = (self.cursor.0 as i16 - delta_y).max(0) as u16;
            self.lock_on_bottom = false;
        }
    }

    pub fn handler_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::ScrollDown => {
                if event.modifiers.contains(KeyModifiers::CONTROL) {
                    self.cursor.1 = self.cursor.1.saturating_add(6);
                } else {
                    self.cursor.0 = self.cursor.0.saturating_add(3);
                }
            }
            MouseEventKind::ScrollUp => {
                if event.modifiers.contains(KeyModifiers::CONTROL) {
                    self.cursor.1 = self.cursor.1.max(6) - 6;
                } else {
                    self.cursor.0 = self.cursor.0.max(3) - 3;
                    self.lock_on_bottom = false;
                }
            }
            _ => {}
        }
        self.update_active(event);
    }
}

fn push_message(
    text: &mut Text<'static>,
    role: &Role,
    content: &str,
    persona: Persona,
    max_len: usize,
) {
    let (label, style) = match role {
        Role::Assistant => (persona.display_name().to_string(), Style::new().bg(Color::Cyan)),
        Role::User => ("You".to_string(), Style::new().bg(Color::Yellow)),
        Role::System => ("Notice".to_string(), Style::new().fg(Color::Red)),
    };
    text.extend([Line::styled(format!("{label}:"), style.add_modifier(Modifier::BOLD))]);

    // wide chars take two cells
    let mut s = String::with_capacity(max_len);
    let mut len = 0;
    for c in content.chars() {
        if c == '\n' {
            text.extend([Line::styled(std::mem::take(&mut s), style)]);
            len = 0;
            continue;
        }
        let width = if c.is_ascii() { 1 } else { 2 };
        if len + width > max_len && !s.is_empty() {
            text.extend([Line::styled(std::mem::take(&mut s), style)]);
            len = 0;
        }
        s.push(c);
        len += width;
        if len >= max_len {
            text.extend([Line::styled(std::mem::take(&mut s), style)]);
            len = 0;
        }
    }
    text.extend([Line::styled(s, style), Line::raw("")]);
}

pub struct ChatComponent {
    pub messages: MessagesComponent,
    input: TextArea<'static>,
}

impl ChatComponent {
    pub fn new() -> Self {
        Self {
            messages: MessagesComponent::new(),
            input: Self::new_textarea(),
        }
    }

    pub fn render(
        &mut self,
        messages: &[Message],
        pending: Option<&str>,
        persona: Persona,
        focused: bool,
        frame: &mut Frame,
        area: Rect,
    ) {
        let vertical = Layout::vertical([Constraint::Min(5), Constraint::Max(6)]);
        let [messages_area, input_area] = vertical.areas(area);

        self.messages
            .render(messages, pending, persona, frame, messages_area);

        let block = Block::bordered().title("Input");
        self.input
            .set_block(if focused { block.white() } else { block.dark_gray() });
        self.input.set_placeholder_text(format!(
            "Send a message to {}...",
            persona.display_name()
        ));
        frame.render_widget(&self.input, input_area);
    }

    fn new_textarea() -> TextArea<'static> {
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(Style::default());
        textarea
    }

    pub fn draft(&self) -> String {
        self.input.lines().join("\n")
    }

    fn submit_message(&mut self) -> Output {
        if self.draft().trim().is_empty() {
            return Output::Normal;
        }
        let mut new_textarea = Self::new_textarea();
        std::mem::swap(&mut self.input, &mut new_textarea);
        let message = new_textarea.into_lines().join("\n");
        self.messages.lock_on_bottom = true;
        Output::Chat(message)
    }

    pub fn handler_input(&mut self, input: KeyEvent) -> Output {
        match input.code {
            KeyCode::Enter if input.modifiers.contains(KeyModifiers::ALT) => {
                self.input.insert_newline();
                Output::Normal
            }
            KeyCode::Enter => self.submit_message(),
            KeyCode::Char('j') if input.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_message()
            }
            _ => {
                self.input.input(input);
                Output::Normal
            }
        }
    }
}
