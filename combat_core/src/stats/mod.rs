//! Stat Computation Pipeline - derived combat stats with lazy recompute

mod cached;
mod equipment;
pub mod formulas;

pub use cached::Cached;
pub use equipment::EquipmentStats;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-style evasion ratings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Evasion {
    pub melee: f64,
    pub ranged: f64,
    pub magic: f64,
}

impl Evasion {
    pub fn against(&self, attack_type: crate::types::AttackType) -> f64 {
        match attack_type {
            crate::types::AttackType::Melee => self.melee,
            crate::types::AttackType::Ranged => self.ranged,
            crate::types::AttackType::Magic => self.magic,
        }
    }
}

/// Derived combat stats, owned by one character via a [`Cached`] wrapper.
///
/// Invariant: the values are meaningful only while the wrapper is clean;
/// every field is written by the recompute pipeline and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub accuracy: f64,
    pub evasion: Evasion,
    pub min_hit: f64,
    pub max_hit: f64,
    pub max_hitpoints: f64,
    pub max_barrier: f64,
    pub attack_interval_ms: f64,
    /// Chance for this character to hit its current opponent; only
    /// populated while a fight is active
    pub hit_chance: f64,
    /// Resistance per damage-type id
    pub resistances: BTreeMap<String, f64>,
}

impl CombatStats {
    pub fn resistance(&self, damage_type_id: &str) -> f64 {
        self.resistances.get(damage_type_id).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttackType;

    #[test]
    fn test_evasion_lookup() {
        let evasion = Evasion {
            melee: 100.0,
            ranged: 200.0,
            magic: 300.0,
        };
        assert!((evasion.against(AttackType::Melee) - 100.0).abs() < f64::EPSILON);
        assert!((evasion.against(AttackType::Magic) - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_resistance_is_zero() {
        let stats = CombatStats::default();
        assert!(stats.resistance("core:fire").abs() < f64::EPSILON);
    }
}
