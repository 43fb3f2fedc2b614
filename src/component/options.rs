use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use super::chat::Output;
use crate::sys::persona::{Mood, Persona, FUNDAMENTALS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Persona(Persona),
    Fundamental(&'static str),
    Mood,
    Clear,
}

fn rows() -> Vec<Row> {
    Persona::ALL
        .into_iter()
        .map(Row::Persona)
        .chain(FUNDAMENTALS.into_iter().map(Row::Fundamental))
        .chain([Row::Mood, Row::Clear])
        .collect()
}

fn heading(text: &'static str) -> Line<'static> {
    Line::styled(text, Style::new().add_modifier(Modifier::BOLD))
}

/// The "Options" sidebar: persona, fundamentals, mood and the clear button.
pub struct OptionsComponent {
    cursor: usize,
    rows: Vec<Row>,
    /// Kept in the order the terms were picked.
    fundamentals: Vec<&'static str>,
}

impl OptionsComponent {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            rows: rows(),
            fundamentals: Vec::new(),
        }
    }

    pub fn selected_fundamentals(&self) -> &[&'static str] {
        &self.fundamentals
    }

    fn toggle(&mut self, term: &'static str) {
        if let Some(i) = self.fundamentals.iter().position(|t| *t == term) {
            self.fundamentals.remove(i);
        } else {
            self.fundamentals.push(term);
        }
    }

    pub fn handler_input(&mut self, input: KeyEvent, mood: Mood) -> Output {
        let row = self.rows[self.cursor];
        match (input.code, row) {
            (KeyCode::Up, _) => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(self.rows.len() - 1);
            }
            (KeyCode::Down, _) => {
                self.cursor = (self.cursor + 1) % self.rows.len();
            }
            (KeyCode::Left, Row::Mood) => return Output::SetMood(mood.colder()),
            (KeyCode::Right, Row::Mood) => return Output::SetMood(mood.warmer()),
            (KeyCode::Enter | KeyCode::Char(' '), Row::Persona(persona)) => {
                return Output::SelectPersona(persona)
            }
            (KeyCode::Enter | KeyCode::Char(' '), Row::Fundamental(term)) => self.toggle(term),
            (KeyCode::Enter | KeyCode::Char(' '), Row::Clear) => return Output::Clear,
            _ => {}
        }
        Output::Normal
    }

    fn row_style(&self, index: usize, focused: bool) -> Style {
        if focused && index == self.cursor {
            Style::new().add_modifier(Modifier::REVERSED)
        } else {
            Style::new()
        }
    }

    fn controls(&self, current: Persona, mood: Mood, focused: bool) -> Text<'static> {
        let mut lines = Vec::with_capacity(self.rows.len() + 8);
        lines.push(heading("Personality select"));

        for (index, row) in self.rows.iter().enumerate() {
            let style = self.row_style(index, focused);
            match *row {
                Row::Persona(persona) => {
                    let mark = if persona == current { "(•)" } else { "( )" };
                    lines.push(Line::styled(format!(" {mark} {}", persona.display_name()), style));
                }
                Row::Fundamental(term) => {
                    if term == FUNDAMENTALS[0] {
                        lines.push(Line::raw(""));
                        lines.push(heading("Fundamentals"));
                    }
                    let mark = if self.fundamentals.contains(&term) { "[x]" } else { "[ ]" };
                    lines.push(Line::styled(format!(" {mark} {term}"), style));
                }
                Row::Mood => {
                    lines.push(Line::raw(""));
                    lines.push(heading("Mood Slider"));
                    let mut spans = vec![Span::raw(" ◀ ")];
                    for m in Mood::ALL {
                        spans.push(Span::raw(if m == mood { "●" } else { "─" }));
                        spans.push(Span::raw(" "));
                    }
                    spans.push(Span::raw("▶"));
                    lines.push(Line::from(spans).patch_style(style));
                    lines.push(Line::styled(
                        format!("   {}", mood.label()),
                        Style::new().add_modifier(Modifier::ITALIC),
                    ));
                }
                Row::Clear => {
                    lines.push(Line::raw(""));
                    lines.push(Line::styled(" [ Clear Chat History ] ", style));
                }
            }
        }
        Text::from(lines)
    }

    pub fn render(
        &self,
        current: Persona,
        mood: Mood,
        focused: bool,
        frame: &mut Frame,
        area: Rect,
    ) {
        let controls = self.controls(current, mood, focused);
        let height = controls.lines.len() as u16 + 2;
        let vertical = Layout::vertical([Constraint::Length(height), Constraint::Min(3)]);
        let [controls_area, about_area] = vertical.areas(area);

        let block = Block::bordered().title("Options");
        let block = if focused { block.white() } else { block.gray() };
        frame.render_widget(Paragraph::new(controls).block(block), controls_area);

        let about = Text::from(vec![
            Line::raw(current.description()),
            Line::raw(""),
            Line::styled(
                format!("portrait: {}", current.avatar()),
                Style::new().fg(Color::DarkGray),
            ),
        ]);
        let about = Paragraph::new(about)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(current.display_name()).gray());
        frame.render_widget(about, about_area);
    }
}
