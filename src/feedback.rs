//! Answer feedback collaborators. Playing is fire-and-forget: a sink that
//! cannot produce output logs the failure and the game carries on silently.

use crossterm::{execute, style::Print};
use std::io::{self, Stdout, Write};

use crate::session::AnswerOutcome;

pub trait Feedback {
    fn play(&mut self, outcome: AnswerOutcome);
}

impl<T: Feedback + ?Sized> Feedback for Box<T> {
    fn play(&mut self, outcome: AnswerOutcome) {
        (**self).play(outcome)
    }
}

/// No feedback at all (`--mute`)
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Feedback for Silent {
    fn play(&mut self, _outcome: AnswerOutcome) {}
}

/// Remembers every outcome it was asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingFeedback {
    pub played: Vec<AnswerOutcome>,
}

impl Feedback for RecordingFeedback {
    fn play(&mut self, outcome: AnswerOutcome) {
        self.played.push(outcome);
    }
}

/// Rings the terminal bell on wrong answers
#[derive(Debug)]
pub struct TerminalBell<W: Write = Stdout> {
    out: W,
}

impl TerminalBell<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Feedback for TerminalBell<W> {
    fn play(&mut self, outcome: AnswerOutcome) {
        if outcome == AnswerOutcome::Correct {
            return;
        }
        if let Err(e) = execute!(self.out, Print('\x07')) {
            log::debug!("terminal bell failed: {e}");
        }
    }
}

#[cfg(feature = "audio")]
pub use tone::ToneFeedback;

#[cfg(feature = "audio")]
mod tone {
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use std::time::Duration;

    use super::Feedback;
    use crate::session::AnswerOutcome;

    const CORRECT_HZ: f32 = 880.0;
    const INCORRECT_HZ: f32 = 220.0;
    const TONE_MS: u64 = 120;

    /// Short synthesized tones on the default output device
    pub struct ToneFeedback {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl ToneFeedback {
        /// None when no output device is available
        pub fn new() -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Some(Self {
                    _stream: stream,
                    handle,
                }),
                Err(e) => {
                    log::warn!("audio output unavailable, falling back: {e}");
                    None
                }
            }
        }
    }

    impl Feedback for ToneFeedback {
        fn play(&mut self, outcome: AnswerOutcome) {
            let freq = match outcome {
                AnswerOutcome::Correct => CORRECT_HZ,
                AnswerOutcome::Incorrect => INCORRECT_HZ,
            };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(
                        SineWave::new(freq)
                            .take_duration(Duration::from_millis(TONE_MS))
                            .amplify(0.2),
                    );
                    sink.detach();
                }
                Err(e) => log::debug!("could not play tone: {e}"),
            }
        }
    }
}
