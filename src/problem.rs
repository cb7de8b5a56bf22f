use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Number of decoys drawn alongside the correct sum
pub const DECOY_COUNT: usize = 3;
/// Number of answer positions shown to the player
pub const CHOICE_COUNT: usize = DECOY_COUNT + 1;

/// A single addition problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub operand_a: u32,
    pub operand_b: u32,
    pub correct_sum: u32,
}

impl Problem {
    pub fn new(operand_a: u32, operand_b: u32) -> Self {
        Self {
            operand_a,
            operand_b,
            correct_sum: operand_a + operand_b,
        }
    }

    pub fn is_correct(&self, selected: u32) -> bool {
        selected == self.correct_sum
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.operand_a, self.operand_b)
    }
}

/// Four answer positions, one of which was built from the correct sum.
/// Decoys are not deduplicated and may coincide with the correct sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceSet([u32; CHOICE_COUNT]);

impl ChoiceSet {
    pub fn new(values: [u32; CHOICE_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, position: usize) -> Option<u32> {
        self.0.get(position).copied()
    }

    pub fn values(&self) -> &[u32; CHOICE_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.0.contains(&value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Produces problems and shuffled choices from a random source
#[derive(Debug)]
pub struct ProblemGenerator<R: Rng = StdRng> {
    rng: R,
}

impl ProblemGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator; the same seed yields the same sequence
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for ProblemGenerator<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> ProblemGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self, range: u32) -> (Problem, ChoiceSet) {
        let half = range / 2;
        let problem = Problem::new(
            self.rng.gen_range(0..=half),
            self.rng.gen_range(0..=half),
        );

        let mut values = [0u32; CHOICE_COUNT];
        for slot in values.iter_mut().take(DECOY_COUNT) {
            *slot = self.rng.gen_range(0..=range);
        }
        values[DECOY_COUNT] = problem.correct_sum;
        values.shuffle(&mut self.rng);

        (problem, ChoiceSet::new(values))
    }
}
