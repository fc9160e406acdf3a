//! Skill level blocks feeding the stat pipeline
//!
//! Each combat skill carries a standard level plus an abyssal tier; the
//! effective level used by every rating formula is simply their sum. The
//! hidden +9 levels live inside the formulas themselves, not here.

use serde::{Deserialize, Serialize};

/// One skill's level pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub standard: u32,
    #[serde(default)]
    pub abyssal: u32,
}

impl Level {
    pub fn new(standard: u32) -> Self {
        Level {
            standard,
            abyssal: 0,
        }
    }

    pub fn with_abyssal(standard: u32, abyssal: u32) -> Self {
        Level { standard, abyssal }
    }

    /// Effective level = standard + abyssal tier
    pub fn effective(&self) -> f64 {
        (self.standard + self.abyssal) as f64
    }
}

/// The full combat skill block for one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevels {
    #[serde(default)]
    pub attack: Level,
    #[serde(default)]
    pub strength: Level,
    #[serde(default)]
    pub defence: Level,
    #[serde(default)]
    pub ranged: Level,
    #[serde(default)]
    pub magic: Level,
    #[serde(default)]
    pub hitpoints: Level,
}

impl SkillLevels {
    /// Uniform standard levels across every skill, handy for tests and demos.
    pub fn uniform(level: u32) -> Self {
        SkillLevels {
            attack: Level::new(level),
            strength: Level::new(level),
            defence: Level::new(level),
            ranged: Level::new(level),
            magic: Level::new(level),
            hitpoints: Level::new(level),
        }
    }
}
