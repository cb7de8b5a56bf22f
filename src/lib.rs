// Library surface for the binary, headless drivers and integration tests.
// Rendering and terminal setup stay in ui.rs and main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod countdown;
pub mod difficulty;
pub mod error;
pub mod feedback;
pub mod highscore;
pub mod logging;
pub mod problem;
pub mod runtime;
pub mod session;
pub mod ui;

pub use difficulty::Difficulty;
pub use session::{AnswerOutcome, Intent, Session, SessionState, Transition};
