//! Injectable randomness for combat rolls
//!
//! All randomness in the engine flows through two primitives:
//! - `roll_percentage(p)`: a Bernoulli trial, true with probability p%
//! - `roll_integer(min, max)`: a uniform integer in [min, max]
//!
//! Production code wraps a `rand::Rng` in [`GameRng`]; tests substitute
//! [`FixedRng`] or a seeded generator to make fights fully deterministic.

use rand::Rng;

/// Source of combat randomness
pub trait CombatRng {
    /// Percentage trial: true with probability `chance` percent.
    ///
    /// `chance <= 0` is always false, `chance >= 100` is always true.
    fn roll_percentage(&mut self, chance: f64) -> bool;

    /// Uniform integer in `[min, max]` inclusive.
    fn roll_integer(&mut self, min: i64, max: i64) -> i64;
}

/// Production RNG backed by any `rand::Rng`
#[derive(Debug)]
pub struct GameRng<R: Rng>(pub R);

impl<R: Rng> CombatRng for GameRng<R> {
    fn roll_percentage(&mut self, chance: f64) -> bool {
        if chance <= 0.0 {
            return false;
        }
        if chance >= 100.0 {
            return true;
        }
        self.0.gen::<f64>() * 100.0 < chance
    }

    fn roll_integer(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.0.gen_range(min..=max)
    }
}

/// Deterministic RNG for tests: percentage rolls follow a scripted
/// sequence of outcomes (cycling), integer rolls always return `min`.
#[derive(Debug, Clone)]
pub struct FixedRng {
    outcomes: Vec<bool>,
    next: usize,
}

impl FixedRng {
    /// Every percentage roll succeeds (subject to the 0/100 bounds)
    pub fn always_hit() -> Self {
        FixedRng {
            outcomes: vec![true],
            next: 0,
        }
    }

    /// Every percentage roll fails (subject to the 0/100 bounds)
    pub fn never_hit() -> Self {
        FixedRng {
            outcomes: vec![false],
            next: 0,
        }
    }

    /// Percentage rolls follow `outcomes`, cycling when exhausted
    pub fn scripted(outcomes: Vec<bool>) -> Self {
        assert!(!outcomes.is_empty(), "scripted rng needs at least one outcome");
        FixedRng { outcomes, next: 0 }
    }
}

impl CombatRng for FixedRng {
    fn roll_percentage(&mut self, chance: f64) -> bool {
        // The spec-mandated bounds hold even for a scripted source
        if chance <= 0.0 {
            return false;
        }
        if chance >= 100.0 {
            return true;
        }
        let outcome = self.outcomes[self.next % self.outcomes.len()];
        self.next += 1;
        outcome
    }

    fn roll_integer(&mut self, min: i64, _max: i64) -> i64 {
        min
    }
}
