use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState},
    game::{RoundPhase, MAX_ATTEMPTS},
    notify::ToastKind,
    util::{format_clock, visible_tail},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

const PLAYING_HELP: &str =
    "Enter guess · ^N letter count · ^O letter check · ^K clue · ^R new word · Esc quit";
const PROMPT_HELP: &str = "Enter confirm · Esc quit";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(2), // stats
                Constraint::Length(2), // word status
                Constraint::Length(3), // input
                Constraint::Min(2),    // toast
                Constraint::Length(1), // help
            ])
            .split(area);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        Paragraph::new(Span::styled("guessr", bold.fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        match self.state {
            AppState::NamePrompt => {
                Paragraph::new("Who is playing?")
                    .alignment(Alignment::Center)
                    .style(dim)
                    .render(chunks[2], buf);
                render_input(&self.input, "Enter your name", chunks[3], buf);
            }
            AppState::Playing => {
                render_stats(self, chunks[1], buf);
                render_word_status(self, chunks[2], buf);
                render_input(&self.input, "Your guess", chunks[3], buf);
            }
        }

        if let Some(toast) = self.toasts.current() {
            let color = match toast.kind {
                ToastKind::Info => Color::Cyan,
                ToastKind::Success => Color::Green,
                ToastKind::Warning => Color::Yellow,
                ToastKind::Error => Color::Red,
            };
            Paragraph::new(Span::styled(toast.text.as_str(), bold.fg(color)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[4], buf);
        }

        let help = match self.state {
            AppState::NamePrompt => PROMPT_HELP,
            AppState::Playing => PLAYING_HELP,
        };
        Paragraph::new(Span::styled(help, dim.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}

fn render_stats(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let label = Style::default().add_modifier(Modifier::DIM);
    let value = Style::default().add_modifier(Modifier::BOLD);

    let score_style = if session.score() <= 20 {
        value.fg(Color::Red)
    } else {
        value.fg(Color::Green)
    };

    let mut spans = Vec::new();
    if let Some(player) = &app.player {
        spans.push(Span::styled(format!("{player}  "), value.fg(Color::Magenta)));
    }
    spans.extend([
        Span::styled("Attempts: ", label),
        Span::styled(format!("{}/{}", session.attempts(), MAX_ATTEMPTS), value),
        Span::raw("   "),
        Span::styled("Score: ", label),
        Span::styled(session.score().to_string(), score_style),
        Span::raw("   "),
        Span::styled(format_clock(session.elapsed_seconds()), value.fg(Color::Cyan)),
    ]);

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_word_status(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let text = match session.phase() {
        RoundPhase::AwaitingWord => "Fetching a secret word...".to_string(),
        RoundPhase::Active => "A secret word is waiting. Guess it!".to_string(),
        RoundPhase::Won => format!(
            "Solved: {}. Press Enter for a new word.",
            session.secret_word()
        ),
        RoundPhase::LostGameOver => "Game over.".to_string(),
    };

    Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .render(area, buf);
}

fn render_input(input: &str, title: &str, area: Rect, buf: &mut Buffer) {
    let inner_width = area.width.saturating_sub(3) as usize;
    let line = Line::from(vec![
        Span::raw(visible_tail(input, inner_width)),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);

    Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(area, buf);
}
