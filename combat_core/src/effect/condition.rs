//! Applicator conditions - extra-chance gates evaluated per trigger
//!
//! Conditions are plain data (a tagged union), evaluated exhaustively against
//! the trigger context and a snapshot of the owning character's values. No
//! polymorphism; adding a variant forces every evaluator through the match.

use serde::{Deserialize, Serialize};

/// Comparison operator for condition leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl Comparison {
    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Lte => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Gte => lhs >= rhs,
            Comparison::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

/// Character-side quantities a condition may compare against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterValueKind {
    HitpointsPercent,
    BarrierPercent,
    AttackCount,
    TurnsTaken,
    ActiveEffectCount,
}

/// Snapshot of the trigger-owning character used for condition evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterValues {
    pub hitpoints_percent: f64,
    pub barrier_percent: f64,
    pub attack_count: f64,
    pub turns_taken: f64,
    pub active_effect_count: f64,
}

impl CharacterValues {
    fn get(&self, kind: CharacterValueKind) -> f64 {
        match kind {
            CharacterValueKind::HitpointsPercent => self.hitpoints_percent,
            CharacterValueKind::BarrierPercent => self.barrier_percent,
            CharacterValueKind::AttackCount => self.attack_count,
            CharacterValueKind::TurnsTaken => self.turns_taken,
            CharacterValueKind::ActiveEffectCount => self.active_effect_count,
        }
    }
}

/// Per-trigger quantities available to conditions
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerContext {
    pub damage_dealt: f64,
    pub damage_taken: f64,
}

/// A condition tree over trigger context and character values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicatorCondition {
    /// All children must hold
    AllOf(Vec<ApplicatorCondition>),
    /// At least one child must hold
    AnyOf(Vec<ApplicatorCondition>),
    /// Compare the damage dealt by the trigger's hit
    DamageDealt { op: Comparison, value: f64 },
    /// Compare the damage taken by the trigger's hit
    DamageTaken { op: Comparison, value: f64 },
    /// Compare a character value of the trigger owner
    CharacterValue {
        source: CharacterValueKind,
        op: Comparison,
        value: f64,
    },
}

impl ApplicatorCondition {
    /// Exhaustive evaluation against a trigger context and character snapshot
    pub fn evaluate(&self, ctx: &TriggerContext, values: &CharacterValues) -> bool {
        match self {
            ApplicatorCondition::AllOf(children) => {
                children.iter().all(|c| c.evaluate(ctx, values))
            }
            ApplicatorCondition::AnyOf(children) => {
                children.iter().any(|c| c.evaluate(ctx, values))
            }
            ApplicatorCondition::DamageDealt { op, value } => {
                op.evaluate(ctx.damage_dealt, *value)
            }
            ApplicatorCondition::DamageTaken { op, value } => {
                op.evaluate(ctx.damage_taken, *value)
            }
            ApplicatorCondition::CharacterValue { source, op, value } => {
                op.evaluate(values.get(*source), *value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(dealt: f64, taken: f64) -> TriggerContext {
        TriggerContext {
            damage_dealt: dealt,
            damage_taken: taken,
        }
    }

    #[test]
    fn test_comparisons() {
        assert!(Comparison::Lt.evaluate(1.0, 2.0));
        assert!(!Comparison::Lt.evaluate(2.0, 2.0));
        assert!(Comparison::Lte.evaluate(2.0, 2.0));
        assert!(Comparison::Gt.evaluate(3.0, 2.0));
        assert!(Comparison::Gte.evaluate(2.0, 2.0));
        assert!(Comparison::Eq.evaluate(2.0, 2.0));
    }

    #[test]
    fn test_damage_leaves() {
        let values = CharacterValues::default();
        let cond = ApplicatorCondition::DamageDealt {
            op: Comparison::Gte,
            value: 50.0,
        };
        assert!(cond.evaluate(&ctx(60.0, 0.0), &values));
        assert!(!cond.evaluate(&ctx(40.0, 0.0), &values));

        let cond = ApplicatorCondition::DamageTaken {
            op: Comparison::Gt,
            value: 0.0,
        };
        assert!(cond.evaluate(&ctx(0.0, 1.0), &values));
        assert!(!cond.evaluate(&ctx(0.0, 0.0), &values));
    }

    #[test]
    fn test_character_value_leaf() {
        let values = CharacterValues {
            hitpoints_percent: 35.0,
            ..Default::default()
        };
        let cond = ApplicatorCondition::CharacterValue {
            source: CharacterValueKind::HitpointsPercent,
            op: Comparison::Lt,
            value: 50.0,
        };
        assert!(cond.evaluate(&ctx(0.0, 0.0), &values));
    }

    #[test]
    fn test_nested_all_any() {
        let values = CharacterValues {
            hitpoints_percent: 35.0,
            ..Default::default()
        };
        // (dealt >= 10 AND (hp < 50 OR taken > 100))
        let cond = ApplicatorCondition::AllOf(vec![
            ApplicatorCondition::DamageDealt {
                op: Comparison::Gte,
                value: 10.0,
            },
            ApplicatorCondition::AnyOf(vec![
                ApplicatorCondition::CharacterValue {
                    source: CharacterValueKind::HitpointsPercent,
                    op: Comparison::Lt,
                    value: 50.0,
                },
                ApplicatorCondition::DamageTaken {
                    op: Comparison::Gt,
                    value: 100.0,
                },
            ]),
        ]);
        assert!(cond.evaluate(&ctx(10.0, 0.0), &values));
        assert!(!cond.evaluate(&ctx(5.0, 0.0), &values));
    }

    #[test]
    fn test_empty_groups() {
        let values = CharacterValues::default();
        // Vacuous truth for AllOf, vacuous falsehood for AnyOf
        assert!(ApplicatorCondition::AllOf(vec![]).evaluate(&ctx(0.0, 0.0), &values));
        assert!(!ApplicatorCondition::AnyOf(vec![]).evaluate(&ctx(0.0, 0.0), &values));
    }
}
