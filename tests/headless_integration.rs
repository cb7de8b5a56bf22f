use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use mathmania::app::{App, AppState, Control};
use mathmania::feedback::RecordingFeedback;
use mathmania::highscore::{HighScoreStore, MemoryHighScoreStore};
use mathmania::problem::ProblemGenerator;
use mathmania::runtime::{EventSource, FixedTicker, GameEvent, Runner, TestEventSource};
use mathmania::{AnswerOutcome, Difficulty, Session, Transition};

// Headless integration using the real runtime (threaded countdown timers)
// without a TTY. Hard difficulty ticks every 150ms, so short rounds finish fast.

#[test]
fn headless_round_runs_to_game_over() {
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let session = Session::new(
        MemoryHighScoreStore::new(),
        RecordingFeedback::default(),
        runner.scheduler(),
    )
    .with_generator(ProblemGenerator::seeded(11))
    .with_round_secs(3);
    let mut app = App::new(session, Difficulty::Hard);

    assert_eq!(
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
        Control::Started(Difficulty::Hard)
    );

    // answer one problem correctly before the clock runs out
    let state = app.session.state();
    let pos = state
        .choices
        .iter()
        .position(|v| v == state.problem.correct_sum)
        .unwrap();
    app.handle_key(KeyEvent::new(
        KeyCode::Char(char::from(b'1' + pos as u8)),
        KeyModifiers::NONE,
    ));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut ticks = 0;
    while !app.session.state().is_game_over && Instant::now() < deadline {
        if let GameEvent::Tick(token) = runner.step() {
            app.on_tick(token);
            ticks += 1;
        }
    }

    assert!(app.session.state().is_game_over, "round should expire");
    assert_eq!(app.session.state().time_remaining, 0);
    assert_eq!(ticks, 3);
    assert_eq!(app.session.state().score, 1);
    assert_eq!(app.session.feedback().played, vec![AnswerOutcome::Correct]);

    // the expired timer has been cancelled: no more ticks show up
    let quiet_until = Instant::now() + Duration::from_millis(400);
    while Instant::now() < quiet_until {
        if let GameEvent::Tick(token) = runner.step() {
            app.on_tick(token);
        }
    }
    assert_eq!(app.session.state().time_remaining, 0);

    app.on_quit();
    assert_eq!(app.session.store().high_score(), 1);
}

#[test]
fn headless_restart_ignores_stale_ticks() {
    let es = TestEventSource::new();
    let tx = es.sender();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
    let session = Session::new(
        MemoryHighScoreStore::new(),
        RecordingFeedback::default(),
        runner.scheduler(),
    )
    .with_round_secs(30);
    let mut app = App::new(session, Difficulty::Hard);

    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    let first = app.session.countdown_token().unwrap();

    // the app only offers restart after game over; drive it on the session
    app.session.restart_session();
    let second = app.session.countdown_token().unwrap();
    assert_ne!(first, second);

    // a late tick from the cancelled timer must not count
    tx.send(GameEvent::Tick(first)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut saw_stale = false;
    while Instant::now() < deadline {
        match runner.step() {
            GameEvent::Tick(token) if token == first => {
                let before = app.session.state().time_remaining;
                assert_eq!(app.on_tick(token), Transition::Ignored);
                assert_eq!(app.session.state().time_remaining, before);
                saw_stale = true;
                break;
            }
            GameEvent::Tick(token) => {
                app.on_tick(token);
            }
            _ => {}
        }
    }
    assert!(saw_stale);
    assert!(!app.session.state().is_game_over);

    app.on_quit();
}

#[test]
fn headless_menu_round_trip() {
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let session = Session::new(
        MemoryHighScoreStore::with_score(9),
        RecordingFeedback::default(),
        runner.scheduler(),
    );
    let mut app = App::new(session, Difficulty::Medium);

    for code in [
        KeyCode::Left,
        KeyCode::Enter,
        KeyCode::Char('m'),
        KeyCode::Right,
        KeyCode::Enter,
    ] {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    assert_eq!(app.state, AppState::Playing);
    assert_eq!(app.session.state().difficulty, Difficulty::Medium);
    assert_eq!(app.session.state().high_score, 9);
    app.on_quit();
}
