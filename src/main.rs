use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use mathmania::{
    app::{App, Control},
    config::{Config, ConfigStore, FileConfigStore},
    countdown::Scheduler,
    feedback::{Feedback, Silent, TerminalBell},
    highscore::{HighScoreStore, MemoryHighScoreStore, SqliteHighScoreStore},
    logging,
    problem::ProblemGenerator,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, GameEvent, Runner, Ticker},
    Difficulty, Session,
};

const FRAME_MS: u64 = 100;

/// quick-fire addition quiz for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Pick a difficulty, then answer as many addition problems as you can before the countdown runs out. Wrong answers cost a point; the best score is kept between runs."
)]
pub struct Cli {
    /// difficulty preselected on the start screen
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// length of a round in countdown ticks
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// seed problem generation for a reproducible round
    #[clap(long)]
    seed: Option<u64>,

    /// disable answer feedback sounds
    #[clap(long)]
    mute: bool,

    /// clear the stored high score and exit
    #[clap(long)]
    reset_high_score: bool,
}

impl Cli {
    /// Flags win over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(d) = self.difficulty {
            config.difficulty = d;
        }
        if let Some(s) = self.seconds {
            config.round_secs = s;
        }
        if self.mute {
            config.sound = false;
        }
        config
    }

    fn generator(&self) -> ProblemGenerator {
        self.seed
            .map(ProblemGenerator::seeded)
            .unwrap_or_default()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_path = logging::init();

    if cli.reset_high_score {
        let mut store = SqliteHighScoreStore::open_default()?;
        store.clear()?;
        println!("high score cleared");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    log::info!(
        "starting with {config:?}, logging to {}",
        log_path.map(|p| p.display().to_string()).unwrap_or_default()
    );

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(FRAME_MS)),
    );
    let session = Session::new(open_store(), feedback(config.sound), runner.scheduler())
        .with_generator(cli.generator())
        .with_round_secs(config.round_secs);
    let mut app = App::new(session, config.difficulty);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &runner, &mut app, &config_store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn open_store() -> Box<dyn HighScoreStore> {
    match SqliteHighScoreStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("high score database unavailable, keeping scores in memory: {e}");
            Box::new(MemoryHighScoreStore::new())
        }
    }
}

fn feedback(sound: bool) -> Box<dyn Feedback> {
    if sound {
        sound_feedback()
    } else {
        Box::new(Silent)
    }
}

#[cfg(feature = "audio")]
fn sound_feedback() -> Box<dyn Feedback> {
    match mathmania::feedback::ToneFeedback::new() {
        Some(tone) => Box::new(tone),
        None => Box::new(TerminalBell::stdout()),
    }
}

#[cfg(not(feature = "audio"))]
fn sound_feedback() -> Box<dyn Feedback> {
    Box::new(TerminalBell::stdout())
}

/// Remember the last difficulty played without persisting one-off CLI overrides
fn remember_difficulty<C: ConfigStore>(config_store: &C, difficulty: Difficulty) {
    let mut stored = config_store.load();
    if stored.difficulty == difficulty {
        return;
    }
    stored.difficulty = difficulty;
    if let Err(e) = config_store.save(&stored) {
        log::warn!("could not save config: {e}");
    }
}

fn start_tui<B, E, T, H, F, S, C>(
    terminal: &mut Terminal<B>,
    runner: &Runner<E, T>,
    app: &mut App<H, F, S>,
    config_store: &C,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    E: EventSource,
    T: Ticker,
    H: HighScoreStore,
    F: Feedback,
    S: Scheduler,
    C: ConfigStore,
{
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            GameEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key) {
                    Control::Quit => {
                        app.on_quit();
                        break;
                    }
                    Control::Started(difficulty) => remember_difficulty(config_store, difficulty),
                    Control::Continue => {}
                }
            }
            GameEvent::Tick(token) => {
                app.on_tick(token);
            }
            GameEvent::Resize | GameEvent::Refresh => {}
        }
    }

    Ok(())
}
