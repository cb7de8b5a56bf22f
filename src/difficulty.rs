use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Named preset controlling the numeric range and the countdown cadence
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Parameters a difficulty resolves to for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyParams {
    /// Upper bound for decoys; operands are drawn from `[0, range / 2]`
    pub range: u32,
    /// Wall-clock time between two countdown ticks
    pub tick_interval: Duration,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn params(self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                range: 50,
                tick_interval: Duration::from_millis(1000),
            },
            Difficulty::Medium => DifficultyParams {
                range: 100,
                tick_interval: Duration::from_millis(750),
            },
            Difficulty::Hard => DifficultyParams {
                range: 200,
                tick_interval: Duration::from_millis(150),
            },
        }
    }

    /// Next preset in picker order, wrapping around
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    /// Previous preset in picker order, wrapping around
    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_table() {
        assert_eq!(Difficulty::Easy.params().range, 50);
        assert_eq!(
            Difficulty::Easy.params().tick_interval,
            Duration::from_secs(1)
        );
        assert_eq!(Difficulty::Medium.params().range, 100);
        assert_eq!(
            Difficulty::Medium.params().tick_interval,
            Duration::from_millis(750)
        );
        assert_eq!(Difficulty::Hard.params().range, 200);
        assert_eq!(
            Difficulty::Hard.params().tick_interval,
            Duration::from_millis(150)
        );
    }

    #[test]
    fn test_default_is_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_next_prev_cycle() {
        for d in Difficulty::ALL {
            assert_eq!(d.next().prev(), d);
            assert_eq!(d.next().next().next(), d);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Difficulty::Easy.to_string(), "Easy");
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
        let back: Difficulty = serde_json::from_str("\"easy\"").unwrap();
        assert_eq!(back, Difficulty::Easy);
    }
}
