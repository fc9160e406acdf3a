//! EquipmentStats - the aggregate the inventory system hands the engine
//!
//! The engine reads these numbers but never computes them; slot handling,
//! set bonuses and the rest live with the equipment system.

use crate::types::AttackType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated equipment bonuses for one character
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentStats {
    // === Offense ===
    #[serde(default)]
    pub melee_attack_bonus: f64,
    #[serde(default)]
    pub ranged_attack_bonus: f64,
    #[serde(default)]
    pub magic_attack_bonus: f64,
    #[serde(default)]
    pub strength_bonus: f64,
    #[serde(default)]
    pub ranged_strength_bonus: f64,
    /// Percent bonus to magic damage
    #[serde(default)]
    pub magic_damage_bonus: f64,

    // === Defense ===
    #[serde(default)]
    pub melee_defence_bonus: f64,
    #[serde(default)]
    pub ranged_defence_bonus: f64,
    #[serde(default)]
    pub magic_defence_bonus: f64,
    /// Base resistance per damage-type id
    #[serde(default)]
    pub resistances: BTreeMap<String, f64>,
    /// Flat barrier contribution (scaled by number_multiplier)
    #[serde(default)]
    pub barrier_bonus: f64,

    // === Timing ===
    /// Weapon attack interval; 0 means "use the game default"
    #[serde(default)]
    pub attack_speed_ms: f64,
}

impl EquipmentStats {
    pub fn new() -> Self {
        EquipmentStats::default()
    }

    /// Attack bonus for an attack style
    pub fn attack_bonus(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.melee_attack_bonus,
            AttackType::Ranged => self.ranged_attack_bonus,
            AttackType::Magic => self.magic_attack_bonus,
        }
    }

    /// Defence bonus against an attack style
    pub fn defence_bonus(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.melee_defence_bonus,
            AttackType::Ranged => self.ranged_defence_bonus,
            AttackType::Magic => self.magic_defence_bonus,
        }
    }

    /// Strength bonus for the style that scales max hit
    pub fn strength_bonus(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.strength_bonus,
            AttackType::Ranged => self.ranged_strength_bonus,
            // Magic scales from magic_damage_bonus instead
            AttackType::Magic => 0.0,
        }
    }

    pub fn resistance(&self, damage_type_id: &str) -> f64 {
        self.resistances.get(damage_type_id).copied().unwrap_or(0.0)
    }
}
