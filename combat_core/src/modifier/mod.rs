//! Modifier Engine - additive/percentage adjustments from equipment and effects
//!
//! Every numeric adjustment in the engine is a [`ModifierEntry`] owned by a
//! named source (an equipment set, an active effect group, ...). Sources are
//! registered and removed atomically on a [`ModifierTable`]; stat derivations
//! query the table and never special-case a modifier themselves.
//!
//! Aggregation rules:
//! - All percentage modifiers for a stat are summed, then applied once via
//!   [`apply_modifier`]: `base * (1 + percent / 100)`.
//! - Flat modifiers are summed and scaled by the game-balance
//!   `number_multiplier` at the use site.

mod kind;

pub use kind::ModifierKind;

use crate::types::AttackType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Apply a summed percentage modifier to a base value
pub fn apply_modifier(base: f64, percent: f64) -> f64 {
    base * (1.0 + percent / 100.0)
}

/// Filter describing which calculations a modifier entry applies to.
///
/// A `None` field matches any query; a `Some` field requires the query to
/// carry the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierScope {
    #[serde(default)]
    pub damage_type: Option<String>,
    #[serde(default)]
    pub attack_type: Option<AttackType>,
    #[serde(default)]
    pub effect_group: Option<String>,
}

impl ModifierScope {
    /// Scope matching every query
    pub fn any() -> Self {
        ModifierScope::default()
    }

    /// Scope restricted to one damage type
    pub fn for_damage_type(id: impl Into<String>) -> Self {
        ModifierScope {
            damage_type: Some(id.into()),
            ..Default::default()
        }
    }

    /// Scope restricted to one attack type
    pub fn for_attack_type(attack_type: AttackType) -> Self {
        ModifierScope {
            attack_type: Some(attack_type),
            ..Default::default()
        }
    }

    /// Scope restricted to one effect group
    pub fn for_effect_group(id: impl Into<String>) -> Self {
        ModifierScope {
            effect_group: Some(id.into()),
            ..Default::default()
        }
    }

    fn matches(&self, query: &ModifierQuery) -> bool {
        let damage_ok = match &self.damage_type {
            None => true,
            Some(dt) => query.damage_type.as_deref() == Some(dt.as_str()),
        };
        let attack_ok = match self.attack_type {
            None => true,
            Some(at) => query.attack_type == Some(at),
        };
        let group_ok = match &self.effect_group {
            None => true,
            Some(g) => query.effect_group.as_deref() == Some(g.as_str()),
        };
        damage_ok && attack_ok && group_ok
    }
}

/// Attribute bag describing the calculation a modifier value is wanted for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierQuery {
    pub damage_type: Option<String>,
    pub attack_type: Option<AttackType>,
    pub effect_group: Option<String>,
}

impl ModifierQuery {
    pub fn any() -> Self {
        ModifierQuery::default()
    }

    pub fn with_damage_type(mut self, id: impl Into<String>) -> Self {
        self.damage_type = Some(id.into());
        self
    }

    pub fn with_attack_type(mut self, attack_type: AttackType) -> Self {
        self.attack_type = Some(attack_type);
        self
    }

    pub fn with_effect_group(mut self, id: impl Into<String>) -> Self {
        self.effect_group = Some(id.into());
        self
    }
}

/// One modifier contribution from a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub kind: ModifierKind,
    pub value: f64,
    #[serde(default)]
    pub scope: ModifierScope,
}

impl ModifierEntry {
    pub fn new(kind: ModifierKind, value: f64) -> Self {
        ModifierEntry {
            kind,
            value,
            scope: ModifierScope::any(),
        }
    }

    pub fn scoped(kind: ModifierKind, value: f64, scope: ModifierScope) -> Self {
        ModifierEntry { kind, value, scope }
    }
}

/// Per-character modifier aggregate, keyed by source id
#[derive(Debug, Clone, Default)]
pub struct ModifierTable {
    sources: BTreeMap<String, Vec<ModifierEntry>>,
}

impl ModifierTable {
    pub fn new() -> Self {
        ModifierTable::default()
    }

    /// Register (or replace) a source's contributions
    pub fn add_source(&mut self, source_id: impl Into<String>, entries: Vec<ModifierEntry>) {
        self.sources.insert(source_id.into(), entries);
    }

    /// Remove a source's contributions. Returns true if the source existed.
    pub fn remove_source(&mut self, source_id: &str) -> bool {
        self.sources.remove(source_id).is_some()
    }

    pub fn has_source(&self, source_id: &str) -> bool {
        self.sources.contains_key(source_id)
    }

    /// Sum of all matching entries for a modifier kind
    pub fn get_value(&self, kind: ModifierKind, query: &ModifierQuery) -> f64 {
        self.sources
            .values()
            .flatten()
            .filter(|e| e.kind == kind && e.scope.matches(query))
            .map(|e| e.value)
            .sum()
    }

    /// Whether any matching entry gives a strictly positive total
    pub fn is_active(&self, kind: ModifierKind, query: &ModifierQuery) -> bool {
        self.get_value(kind, query) > 0.0
    }

    /// Visit the per-damage-type totals of a modifier kind.
    ///
    /// Only entries scoped to a specific damage type participate; totals are
    /// visited in damage-type id order.
    pub fn for_each_damage_type(&self, kind: ModifierKind, mut f: impl FnMut(&str, f64)) {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for entry in self.sources.values().flatten() {
            if entry.kind != kind {
                continue;
            }
            if let Some(dt) = &entry.scope.damage_type {
                *totals.entry(dt.as_str()).or_insert(0.0) += entry.value;
            }
        }
        for (dt, total) in totals {
            f(dt, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_modifier() {
        // 200 base with +50% = 300
        assert!((apply_modifier(200.0, 50.0) - 300.0).abs() < f64::EPSILON);
        // Negative percentages reduce
        assert!((apply_modifier(200.0, -25.0) - 150.0).abs() < f64::EPSILON);
        // Zero percent is identity
        assert!((apply_modifier(200.0, 0.0) - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sources_sum() {
        let mut table = ModifierTable::new();
        table.add_source(
            "gear",
            vec![ModifierEntry::new(ModifierKind::DamageDealtPercent, 10.0)],
        );
        table.add_source(
            "effect:rage",
            vec![ModifierEntry::new(ModifierKind::DamageDealtPercent, 15.0)],
        );

        let total = table.get_value(ModifierKind::DamageDealtPercent, &ModifierQuery::any());
        assert!((total - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_source() {
        let mut table = ModifierTable::new();
        table.add_source(
            "effect:rage",
            vec![ModifierEntry::new(ModifierKind::DamageDealtPercent, 15.0)],
        );
        assert!(table.remove_source("effect:rage"));
        assert!(!table.remove_source("effect:rage"));
        let total = table.get_value(ModifierKind::DamageDealtPercent, &ModifierQuery::any());
        assert!(total.abs() < f64::EPSILON);
    }

    #[test]
    fn test_scope_filters_damage_type() {
        let mut table = ModifierTable::new();
        table.add_source(
            "gear",
            vec![
                ModifierEntry::scoped(
                    ModifierKind::ResistanceFlat,
                    5.0,
                    ModifierScope::for_damage_type("core:fire"),
                ),
                ModifierEntry::new(ModifierKind::ResistanceFlat, 2.0),
            ],
        );

        let fire = ModifierQuery::any().with_damage_type("core:fire");
        let frost = ModifierQuery::any().with_damage_type("core:frost");

        // Fire query picks up both the scoped and unscoped entry
        assert!((table.get_value(ModifierKind::ResistanceFlat, &fire) - 7.0).abs() < f64::EPSILON);
        // Frost query only the unscoped one
        assert!((table.get_value(ModifierKind::ResistanceFlat, &frost) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scope_filters_attack_type() {
        use crate::types::AttackType;

        let mut table = ModifierTable::new();
        table.add_source(
            "gear",
            vec![ModifierEntry::scoped(
                ModifierKind::EvasionPercent,
                20.0,
                ModifierScope::for_attack_type(AttackType::Ranged),
            )],
        );

        let ranged = ModifierQuery::any().with_attack_type(AttackType::Ranged);
        let melee = ModifierQuery::any().with_attack_type(AttackType::Melee);
        assert!((table.get_value(ModifierKind::EvasionPercent, &ranged) - 20.0).abs() < f64::EPSILON);
        assert!(table.get_value(ModifierKind::EvasionPercent, &melee).abs() < f64::EPSILON);
    }

    #[test]
    fn test_for_each_damage_type() {
        let mut table = ModifierTable::new();
        table.add_source(
            "gear",
            vec![
                ModifierEntry::scoped(
                    ModifierKind::ResistanceFlat,
                    5.0,
                    ModifierScope::for_damage_type("core:fire"),
                ),
                ModifierEntry::scoped(
                    ModifierKind::ResistanceFlat,
                    3.0,
                    ModifierScope::for_damage_type("core:abyssal"),
                ),
                // Unscoped entries are not visited
                ModifierEntry::new(ModifierKind::ResistanceFlat, 99.0),
            ],
        );

        let mut seen = Vec::new();
        table.for_each_damage_type(ModifierKind::ResistanceFlat, |dt, v| {
            seen.push((dt.to_string(), v));
        });
        assert_eq!(
            seen,
            vec![
                ("core:abyssal".to_string(), 3.0),
                ("core:fire".to_string(), 5.0)
            ]
        );
    }

    #[test]
    fn test_replacing_source_overwrites() {
        let mut table = ModifierTable::new();
        table.add_source(
            "gear",
            vec![ModifierEntry::new(ModifierKind::CritChance, 10.0)],
        );
        table.add_source(
            "gear",
            vec![ModifierEntry::new(ModifierKind::CritChance, 4.0)],
        );
        let total = table.get_value(ModifierKind::CritChance, &ModifierQuery::any());
        assert!((total - 4.0).abs() < f64::EPSILON);
    }
}
