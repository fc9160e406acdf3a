//! Game balance constants

use serde::{Deserialize, Serialize};

/// Tunable game constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConstants {
    pub balance: BalanceConstants,
    pub timing: TimingConstants,
    pub crit: CritConstants,
    pub regen: RegenConstants,
}

impl Default for GameConstants {
    fn default() -> Self {
        GameConstants {
            balance: BalanceConstants::default(),
            timing: TimingConstants::default(),
            crit: CritConstants::default(),
            regen: RegenConstants::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConstants {
    /// Scalar applied to flat numeric bonuses to keep them proportionate
    /// across content tiers
    #[serde(default = "default_number_multiplier")]
    pub number_multiplier: f64,
    /// Cap on the flat damage bonus derived from current/max hitpoints
    #[serde(default = "default_hp_bonus_cap")]
    pub hp_damage_bonus_cap: f64,
    /// Effect groups that prevent a character from attacking while active
    #[serde(default = "default_crowd_control_groups")]
    pub crowd_control_groups: Vec<String>,
}

impl Default for BalanceConstants {
    fn default() -> Self {
        BalanceConstants {
            number_multiplier: 10.0,
            hp_damage_bonus_cap: 10_000.0,
            crowd_control_groups: default_crowd_control_groups(),
        }
    }
}

fn default_number_multiplier() -> f64 {
    10.0
}
fn default_hp_bonus_cap() -> f64 {
    10_000.0
}
fn default_crowd_control_groups() -> Vec<String> {
    vec![
        "core:stun".to_string(),
        "core:sleep".to_string(),
        "core:freeze".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConstants {
    /// Attack interval used when equipment supplies none
    #[serde(default = "default_attack_interval")]
    pub base_attack_interval_ms: f64,
    /// Attack interval can never be modified below this
    #[serde(default = "default_min_attack_interval")]
    pub min_attack_interval_ms: f64,
    /// Whether action timers run at all (idle game modes may disable them)
    #[serde(default = "default_timed_actions")]
    pub timed_actions: bool,
}

impl Default for TimingConstants {
    fn default() -> Self {
        TimingConstants {
            base_attack_interval_ms: 4000.0,
            min_attack_interval_ms: 250.0,
            timed_actions: true,
        }
    }
}

fn default_attack_interval() -> f64 {
    4000.0
}
fn default_min_attack_interval() -> f64 {
    250.0
}
fn default_timed_actions() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritConstants {
    /// Percent damage added when a critical hit lands
    #[serde(default = "default_crit_bonus")]
    pub bonus_percent: f64,
}

impl Default for CritConstants {
    fn default() -> Self {
        CritConstants {
            bonus_percent: 50.0,
        }
    }
}

fn default_crit_bonus() -> f64 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenConstants {
    /// Interval between regen ticks
    #[serde(default = "default_regen_interval")]
    pub interval_ms: f64,
    /// Fraction of damage taken that is buffered for later regeneration
    #[serde(default = "default_regen_buffer")]
    pub buffer_per_damage: f64,
    /// Fraction of max hitpoints restored per regen tick
    #[serde(default = "default_regen_fraction")]
    pub fraction_per_tick: f64,
}

impl Default for RegenConstants {
    fn default() -> Self {
        RegenConstants {
            interval_ms: 10_000.0,
            buffer_per_damage: 0.25,
            fraction_per_tick: 0.01,
        }
    }
}

fn default_regen_interval() -> f64 {
    10_000.0
}
fn default_regen_buffer() -> f64 {
    0.25
}
fn default_regen_fraction() -> f64 {
    0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let constants = GameConstants::default();
        assert!((constants.balance.number_multiplier - 10.0).abs() < f64::EPSILON);
        assert!((constants.timing.base_attack_interval_ms - 4000.0).abs() < f64::EPSILON);
        assert!((constants.crit.bonus_percent - 50.0).abs() < f64::EPSILON);
        assert!(constants.timing.timed_actions);
    }

    #[test]
    fn test_parse_constants() {
        let toml = r#"
[balance]
number_multiplier = 1.0
hp_damage_bonus_cap = 500.0

[timing]
base_attack_interval_ms = 3000.0
min_attack_interval_ms = 250.0
timed_actions = true

[crit]
bonus_percent = 50.0

[regen]
interval_ms = 10000.0
buffer_per_damage = 0.25
fraction_per_tick = 0.01
"#;

        let constants: GameConstants = toml::from_str(toml).unwrap();
        assert!((constants.balance.number_multiplier - 1.0).abs() < f64::EPSILON);
        assert!((constants.timing.base_attack_interval_ms - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
[balance]
number_multiplier = 1.0

[timing]

[crit]

[regen]
"#;
        let constants: GameConstants = toml::from_str(toml).unwrap();
        assert!((constants.balance.number_multiplier - 1.0).abs() < f64::EPSILON);
        assert!((constants.balance.hp_damage_bonus_cap - 10_000.0).abs() < f64::EPSILON);
        assert!((constants.regen.interval_ms - 10_000.0).abs() < f64::EPSILON);
    }
}
