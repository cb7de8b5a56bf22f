use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Tabs, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState, GRID_COLUMNS},
    countdown::Scheduler,
    difficulty::Difficulty,
    feedback::Feedback,
    highscore::HighScoreStore,
    problem::{ChoiceSet, CHOICE_COUNT},
    session::AnswerOutcome,
};

const TITLE: &str = "Math Mania";
const HORIZONTAL_MARGIN: u16 = 2;
const CHOICE_HEIGHT: u16 = 3;
const MIN_CHOICE_WIDTH: u16 = 9;
const BANNER_WIDTH: u16 = 40;
const BANNER_HEIGHT: u16 = 7;
const GRID_ROWS: u16 = (CHOICE_COUNT / GRID_COLUMNS) as u16;
const BOARD_HEIGHT: u16 = if CHOICE_HEIGHT * GRID_ROWS > BANNER_HEIGHT {
    CHOICE_HEIGHT * GRID_ROWS
} else {
    BANNER_HEIGHT
};
const START_HEIGHT: u16 = 8;
const GAME_HEIGHT: u16 = 8 + BOARD_HEIGHT;

impl<H: HighScoreStore, F: Feedback, S: Scheduler> Widget for &App<H, F, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Start => render_start(self, area, buf),
            AppState::Playing => render_game(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn title_line() -> Line<'static> {
    Line::from(Span::styled(TITLE, bold().fg(Color::Cyan)))
}

fn render_start<H: HighScoreStore, F: Feedback, S: Scheduler>(
    app: &App<H, F, S>,
    area: Rect,
    buf: &mut Buffer,
) {
    let content = centered(area, area.width, START_HEIGHT);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(3), // picker
            Constraint::Length(2), // high score
            Constraint::Length(1), // help
        ])
        .split(content);

    Paragraph::new(title_line())
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let labels: Vec<Line> = Difficulty::ALL
        .iter()
        .map(|d| Line::from(d.to_string()))
        .collect();
    let selected = Difficulty::ALL
        .iter()
        .position(|d| *d == app.picked)
        .unwrap_or(0);
    let picker_width = (labels.iter().map(|l| l.width() as u16 + 3).sum::<u16>() + 2)
        .min(chunks[1].width);
    Tabs::new(labels)
        .block(Block::default().borders(Borders::ALL).title("Difficulty"))
        .select(selected)
        .style(Style::default().add_modifier(Modifier::DIM))
        .highlight_style(bold().fg(Color::Yellow).remove_modifier(Modifier::DIM))
        .divider("|")
        .render(centered(chunks[1], picker_width, 3), buf);

    Paragraph::new(high_score_line(app))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(←/→) pick  (enter) play  (esc) quit",
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_game<H: HighScoreStore, F: Feedback, S: Scheduler>(
    app: &App<H, F, S>,
    area: Rect,
    buf: &mut Buffer,
) {
    let state = app.session.state();

    let content = centered(area, area.width, GAME_HEIGHT);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1),            // title
            Constraint::Length(1),            // spacing
            Constraint::Length(2),            // problem
            Constraint::Length(BOARD_HEIGHT), // choices, or the game over banner
            Constraint::Length(1),            // score
            Constraint::Length(1),            // time gauge
            Constraint::Length(1),            // spacing
            Constraint::Length(1),            // help
        ])
        .split(content);

    Paragraph::new(title_line())
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let problem_style = match app.flash() {
        Some(AnswerOutcome::Correct) => bold().fg(Color::Green),
        Some(AnswerOutcome::Incorrect) => bold().fg(Color::Red),
        None => bold(),
    };
    Paragraph::new(Span::styled(state.problem.to_string(), problem_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if state.is_game_over {
        render_game_over(app, chunks[3], buf);
    } else {
        render_choices(&state.choices, app.cursor, chunks[3], buf);
    }

    Paragraph::new(Span::styled(
        format!("Score: {}   [{}]", state.score, state.difficulty),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    let round = app.session.round_secs().max(1);
    let ratio = f64::from(state.time_remaining.min(round)) / f64::from(round);
    let gauge_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!("Time: {}", state.time_remaining))
        .render(chunks[5], buf);

    let help = if state.is_game_over {
        "(r) restart  (m) menu  (esc) quit"
    } else {
        "(1-4) or arrows + enter to answer  (m) menu  (esc) quit"
    };
    Paragraph::new(Span::styled(
        help,
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[7], buf);
}

/// Width of one choice box: the widest label plus its key hint and borders
fn choice_width(choices: &ChoiceSet) -> u16 {
    let widest = choices
        .iter()
        .map(|v| format!("{v}").width())
        .max()
        .unwrap_or(0) as u16;
    (widest + 6).max(MIN_CHOICE_WIDTH)
}

fn render_choices(choices: &ChoiceSet, cursor: usize, area: Rect, buf: &mut Buffer) {
    let width = choice_width(choices);
    let grid = centered(
        area,
        width * GRID_COLUMNS as u16,
        CHOICE_HEIGHT * GRID_ROWS,
    );

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(CHOICE_HEIGHT);
            CHOICE_COUNT / GRID_COLUMNS
        ])
        .split(grid);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Length(width); GRID_COLUMNS])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let position = row * GRID_COLUMNS + col;
            let Some(value) = choices.get(position) else {
                continue;
            };
            let border_style = if position == cursor {
                bold().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Blue)
            };
            Paragraph::new(Span::styled(value.to_string(), bold()))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(format!("{}", position + 1)),
                )
                .render(*cell, buf);
        }
    }
}

fn render_game_over<H: HighScoreStore, F: Feedback, S: Scheduler>(
    app: &App<H, F, S>,
    area: Rect,
    buf: &mut Buffer,
) {
    let banner = centered(area, BANNER_WIDTH, BANNER_HEIGHT);
    Clear.render(banner, buf);

    let state = app.session.state();
    let text = vec![
        Line::from(Span::styled("Game Over", bold().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", state.score), bold())),
        high_score_line(app),
        Line::from(Span::styled(
            "(r) restart  (m) menu",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(banner, buf);
}

fn high_score_line<H: HighScoreStore, F: Feedback, S: Scheduler>(app: &App<H, F, S>) -> Line<'static> {
    let store = app.session.store();
    let mut text = format!("High Score: {}", store.high_score());
    if let Some(when) = store.achieved_at().filter(|_| store.high_score() > 0) {
        text.push_str(&format!(" ({})", when.format("%Y-%m-%d")));
    }
    Line::from(Span::styled(text, bold().fg(Color::Magenta)))
}

/// Rect of at most `width` x `height`, centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
