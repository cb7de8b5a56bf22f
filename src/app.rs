use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use crate::countdown::{CountdownToken, Scheduler};
use crate::difficulty::Difficulty;
use crate::feedback::Feedback;
use crate::highscore::HighScoreStore;
use crate::problem::CHOICE_COUNT;
use crate::session::{AnswerOutcome, Intent, Session, Transition};

/// How long the last answer's color stays on screen
pub const FLASH_DURATION: Duration = Duration::from_millis(350);
/// Choices are laid out in a grid this many columns wide
pub const GRID_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Start,
    Playing,
}

/// What the main loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// A session started with this difficulty
    Started(Difficulty),
    Quit,
}

/// Screen-level state wrapped around a [`Session`]
#[derive(Debug)]
pub struct App<H, F, S> {
    pub state: AppState,
    pub picked: Difficulty,
    pub cursor: usize,
    pub session: Session<H, F, S>,
    flash_until: Option<Instant>,
}

impl<H: HighScoreStore, F: Feedback, S: Scheduler> App<H, F, S> {
    pub fn new(session: Session<H, F, S>, picked: Difficulty) -> Self {
        Self {
            state: AppState::Start,
            picked,
            cursor: 0,
            session,
            flash_until: None,
        }
    }

    /// Outcome to highlight, while its flash is still fresh
    pub fn flash(&self) -> Option<AnswerOutcome> {
        match self.flash_until {
            Some(until) if Instant::now() < until => self.session.state().last_outcome,
            _ => None,
        }
    }

    pub fn on_tick(&mut self, token: CountdownToken) -> Transition {
        self.session.dispatch(Intent::Tick(token))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Control::Quit;
        }

        match self.state {
            AppState::Start => self.on_start_key(key.code),
            AppState::Playing => self.on_playing_key(key.code),
        }
    }

    fn on_start_key(&mut self, code: KeyCode) -> Control {
        match code {
            KeyCode::Left | KeyCode::Char('h') => self.picked = self.picked.prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => self.picked = self.picked.next(),
            KeyCode::Char('1') => self.picked = Difficulty::Easy,
            KeyCode::Char('2') => self.picked = Difficulty::Medium,
            KeyCode::Char('3') => self.picked = Difficulty::Hard,
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.session.dispatch(Intent::SelectDifficulty(self.picked));
                self.state = AppState::Playing;
                self.cursor = 0;
                self.flash_until = None;
                return Control::Started(self.picked);
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_playing_key(&mut self, code: KeyCode) -> Control {
        if self.session.state().is_game_over {
            match code {
                KeyCode::Char('r') | KeyCode::Enter => {
                    self.session.dispatch(Intent::Restart);
                    self.cursor = 0;
                    self.flash_until = None;
                }
                KeyCode::Char('m') => self.back_to_menu(),
                _ => {}
            }
            return Control::Continue;
        }

        match code {
            KeyCode::Char(c @ '1'..='4') => {
                let position = c as usize - '1' as usize;
                self.answer(position);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.answer(self.cursor),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => self.move_cursor(code),
            KeyCode::Char('m') => self.back_to_menu(),
            _ => {}
        }
        Control::Continue
    }

    fn answer(&mut self, position: usize) {
        let Some(value) = self.session.state().choices.get(position) else {
            return;
        };
        if let Transition::Answered(_) = self.session.dispatch(Intent::Answer(value)) {
            self.flash_until = Some(Instant::now() + FLASH_DURATION);
        }
    }

    fn move_cursor(&mut self, code: KeyCode) {
        let (row, col) = (self.cursor / GRID_COLUMNS, self.cursor % GRID_COLUMNS);
        let rows = CHOICE_COUNT / GRID_COLUMNS;
        let (row, col) = match code {
            KeyCode::Left => (row, col.saturating_sub(1)),
            KeyCode::Right => (row, (col + 1).min(GRID_COLUMNS - 1)),
            KeyCode::Up => (row.saturating_sub(1), col),
            KeyCode::Down => ((row + 1).min(rows - 1), col),
            _ => (row, col),
        };
        self.cursor = row * GRID_COLUMNS + col;
    }

    /// Leave the round for the start screen. A finished round counts toward
    /// the high score exactly as a restart would.
    pub fn back_to_menu(&mut self) {
        self.finish_round();
        self.state = AppState::Start;
        self.picked = self.session.state().difficulty;
    }

    /// Called before the process exits
    pub fn on_quit(&mut self) {
        self.finish_round();
    }

    fn finish_round(&mut self) {
        if self.state == AppState::Playing && self.session.state().is_game_over {
            self.session.record_high_score();
        }
        self.session.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::ManualScheduler;
    use crate::feedback::RecordingFeedback;
    use crate::highscore::MemoryHighScoreStore;
    use crate::problem::ProblemGenerator;

    type TestApp = App<MemoryHighScoreStore, RecordingFeedback, ManualScheduler>;

    fn app() -> TestApp {
        let session = Session::new(
            MemoryHighScoreStore::new(),
            RecordingFeedback::default(),
            ManualScheduler::new(),
        )
        .with_generator(ProblemGenerator::seeded(99))
        .with_round_secs(3);
        App::new(session, Difficulty::Medium)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn expire(app: &mut TestApp) {
        let token = app.session.countdown_token().unwrap();
        while !app.session.state().is_game_over {
            app.on_tick(token);
        }
    }

    fn correct_position(app: &TestApp) -> usize {
        let state = app.session.state();
        state
            .choices
            .iter()
            .position(|v| v == state.problem.correct_sum)
            .unwrap()
    }

    #[test]
    fn test_picker_cycles() {
        let mut app = app();
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.picked, Difficulty::Hard);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.picked, Difficulty::Easy);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.picked, Difficulty::Hard);
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.picked, Difficulty::Easy);
    }

    #[test]
    fn test_enter_starts_session() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('3')));
        let control = app.handle_key(key(KeyCode::Enter));

        assert_eq!(control, Control::Started(Difficulty::Hard));
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.session.state().difficulty, Difficulty::Hard);
        assert!(app.session.is_running());
    }

    #[test]
    fn test_number_key_answers_and_flashes() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let pos = correct_position(&app);
        let digit = char::from(b'1' + pos as u8);

        app.handle_key(key(KeyCode::Char(digit)));
        assert_eq!(app.session.state().score, 1);
        assert_eq!(app.flash(), Some(AnswerOutcome::Correct));
    }

    #[test]
    fn test_cursor_moves_in_grid() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.cursor, 0);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.cursor, 1);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.cursor, 1);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor, 3);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.cursor, 2);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_enter_answers_cursor_position() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.cursor = correct_position(&app);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.state().score, 1);
    }

    #[test]
    fn test_keys_after_game_over() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let pos = correct_position(&app);
        app.handle_key(key(KeyCode::Char(char::from(b'1' + pos as u8))));
        expire(&mut app);

        // answering is closed once time is up
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.session.state().score, 1);

        app.handle_key(key(KeyCode::Char('r')));
        assert!(!app.session.state().is_game_over);
        assert_eq!(app.session.state().score, 0);
        assert_eq!(app.session.store().high_score(), 1);
    }

    #[test]
    fn test_menu_after_game_over_records_high_score() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let pos = correct_position(&app);
        app.handle_key(key(KeyCode::Char(char::from(b'1' + pos as u8))));
        expire(&mut app);

        app.handle_key(key(KeyCode::Char('m')));
        assert_eq!(app.state, AppState::Start);
        assert_eq!(app.session.store().high_score(), 1);
        assert!(app.session.scheduler().active().is_empty());
    }

    #[test]
    fn test_menu_mid_round_abandons_without_recording() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let pos = correct_position(&app);
        app.handle_key(key(KeyCode::Char(char::from(b'1' + pos as u8))));

        app.handle_key(key(KeyCode::Char('m')));
        assert_eq!(app.state, AppState::Start);
        assert_eq!(app.session.store().high_score(), 0);
        assert!(app.session.scheduler().active().is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Control::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Control::Quit
        );
    }

    #[test]
    fn test_quit_after_game_over_records_high_score() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let pos = correct_position(&app);
        app.handle_key(key(KeyCode::Char(char::from(b'1' + pos as u8))));
        expire(&mut app);
        app.on_quit();
        assert_eq!(app.session.store().high_score(), 1);
    }
}
