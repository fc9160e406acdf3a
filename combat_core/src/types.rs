//! Core types shared across the combat engine

use serde::{Deserialize, Serialize};

/// Attack style a character is currently fighting with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    Melee,
    Ranged,
    Magic,
}

impl AttackType {
    /// Get all attack types
    pub fn all() -> &'static [AttackType] {
        &[AttackType::Melee, AttackType::Ranged, AttackType::Magic]
    }
}

/// Which side of a 1v1 fight a character occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantSide {
    Attacker,
    Defender,
}

impl CombatantSide {
    /// The opposing side
    pub fn opponent(self) -> CombatantSide {
        match self {
            CombatantSide::Attacker => CombatantSide::Defender,
            CombatantSide::Defender => CombatantSide::Attacker,
        }
    }
}

/// What a character will do when its action timer next fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Attack,
    Nothing,
}
