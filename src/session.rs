use crate::countdown::{Countdown, CountdownPhase, CountdownToken, Scheduler, TickOutcome};
use crate::difficulty::Difficulty;
use crate::feedback::Feedback;
use crate::highscore::HighScoreStore;
use crate::problem::{ChoiceSet, Problem, ProblemGenerator};

/// Default length of a round, in countdown ticks
pub const ROUND_SECS: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

/// Everything the presentation layer needs to draw a round
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub time_remaining: u32,
    pub is_game_over: bool,
    pub problem: Problem,
    pub choices: ChoiceSet,
    pub difficulty: Difficulty,
    pub high_score: u32,
    pub last_outcome: Option<AnswerOutcome>,
}

/// User or timer intent fed into [`Session::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Start a fresh session locked to this difficulty
    SelectDifficulty(Difficulty),
    /// Evaluate the chosen value, then move to the next problem
    Answer(u32),
    Restart,
    Tick(CountdownToken),
}

/// What a dispatched intent did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started(CountdownToken),
    Restarted {
        token: CountdownToken,
        new_high_score: bool,
    },
    Answered(AnswerOutcome),
    Ticked(u32),
    GameOver,
    Ignored,
}

/// One play-through plus the collaborators it talks to: the high score
/// store, the feedback sink and the scheduler driving the countdown.
#[derive(Debug)]
pub struct Session<H, F, S> {
    state: SessionState,
    round_secs: u32,
    generator: ProblemGenerator,
    countdown: Countdown,
    store: H,
    feedback: F,
    scheduler: S,
}

impl<H: HighScoreStore, F: Feedback, S: Scheduler> Session<H, F, S> {
    pub fn new(store: H, feedback: F, scheduler: S) -> Self {
        let mut generator = ProblemGenerator::from_entropy();
        let difficulty = Difficulty::default();
        let (problem, choices) = generator.generate(difficulty.params().range);

        Self {
            state: SessionState {
                score: 0,
                time_remaining: ROUND_SECS,
                is_game_over: false,
                problem,
                choices,
                difficulty,
                high_score: store.high_score(),
                last_outcome: None,
            },
            round_secs: ROUND_SECS,
            generator,
            countdown: Countdown::new(),
            store,
            feedback,
            scheduler,
        }
    }

    pub fn with_generator(mut self, generator: ProblemGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_round_secs(mut self, round_secs: u32) -> Self {
        self.round_secs = round_secs;
        self.state.time_remaining = round_secs;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn round_secs(&self) -> u32 {
        self.round_secs
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn countdown_phase(&self) -> CountdownPhase {
        self.countdown.phase()
    }

    /// Token of the running countdown, if any
    pub fn countdown_token(&self) -> Option<CountdownToken> {
        self.countdown.token()
    }

    pub fn is_running(&self) -> bool {
        self.countdown.phase() == CountdownPhase::Running && !self.state.is_game_over
    }

    pub fn start_session(&mut self, difficulty: Difficulty) -> &SessionState {
        let params = difficulty.params();

        self.state.difficulty = difficulty;
        self.state.score = 0;
        self.state.time_remaining = self.round_secs;
        self.state.is_game_over = false;
        self.state.last_outcome = None;
        self.state.high_score = self.store.high_score();
        self.next_problem();

        let token = self.countdown.start(params.tick_interval, &mut self.scheduler);
        log::info!(
            "session started: difficulty={difficulty} range={} tick={:?} token={}",
            params.range,
            params.tick_interval,
            token.id()
        );

        &self.state
    }

    /// Evaluate `selected` against the current problem. Does not advance.
    pub fn submit_answer(&mut self, selected: u32) -> AnswerOutcome {
        let outcome = if self.state.problem.is_correct(selected) {
            self.state.score += 1;
            AnswerOutcome::Correct
        } else {
            self.state.score = self.state.score.saturating_sub(1);
            AnswerOutcome::Incorrect
        };

        log::debug!(
            "{} = {selected}? {outcome:?}, score {}",
            self.state.problem,
            self.state.score
        );
        self.state.last_outcome = Some(outcome);
        self.feedback.play(outcome);

        outcome
    }

    pub fn next_problem(&mut self) {
        let (problem, choices) = self
            .generator
            .generate(self.state.difficulty.params().range);
        self.state.problem = problem;
        self.state.choices = choices;
    }

    pub fn on_tick(&mut self, token: CountdownToken) -> TickOutcome {
        let outcome = self.countdown.tick(token, &mut self.state.time_remaining);
        if outcome == TickOutcome::Expired {
            self.state.is_game_over = true;
            log::info!("time up: final score {}", self.state.score);
        }
        outcome
    }

    /// Persist the current score if it beats the stored one
    pub fn record_high_score(&mut self) -> bool {
        let stored = self.store.high_score();
        if self.state.score <= stored {
            return false;
        }

        log::info!("new high score {} (was {stored})", self.state.score);
        self.store.set_high_score(self.state.score);
        self.state.high_score = self.state.score;
        true
    }

    /// Record the high score and start over with the same difficulty
    pub fn restart_session(&mut self) -> (&SessionState, bool) {
        let new_high_score = self.record_high_score();
        let difficulty = self.state.difficulty;
        (self.start_session(difficulty), new_high_score)
    }

    /// Stop the countdown without touching score or high score
    pub fn end(&mut self) {
        self.countdown.cancel();
    }

    pub fn dispatch(&mut self, intent: Intent) -> Transition {
        match intent {
            Intent::SelectDifficulty(difficulty) => {
                self.start_session(difficulty);
                self.token_transition(Transition::Started)
            }
            Intent::Restart => {
                let (_, new_high_score) = self.restart_session();
                self.token_transition(|token| Transition::Restarted {
                    token,
                    new_high_score,
                })
            }
            Intent::Answer(value) => {
                if !self.is_running() {
                    return Transition::Ignored;
                }
                let outcome = self.submit_answer(value);
                self.next_problem();
                Transition::Answered(outcome)
            }
            Intent::Tick(token) => match self.on_tick(token) {
                TickOutcome::Ignored => Transition::Ignored,
                TickOutcome::Decremented(left) => Transition::Ticked(left),
                TickOutcome::Expired => Transition::GameOver,
            },
        }
    }

    fn token_transition(&self, f: impl FnOnce(CountdownToken) -> Transition) -> Transition {
        self.countdown
            .token()
            .map(f)
            .unwrap_or(Transition::Ignored)
    }
}
