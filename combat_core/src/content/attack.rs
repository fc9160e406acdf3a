//! Attack definitions - damage rolls, sub-hits, and carried applicators

use crate::effect::EffectApplicator;
use crate::rng::CombatRng;
use serde::{Deserialize, Serialize};

/// How one damage-roll entry produces a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageRollKind {
    /// A fixed percentage of the attacker's max hit
    MaxHitPercent { percent: f64 },
    /// A uniform roll between two percentages of the attacker's max hit
    RandomPercent { min_percent: f64, max_percent: f64 },
    /// The attacker's normal damage range: uniform in [min_hit, max_hit]
    Normal,
    /// A flat amount, scaled by number_multiplier
    Flat { amount: f64 },
    /// A percentage of the target's current hitpoints
    TargetCurrentHpPercent { percent: f64 },
}

/// One weighted entry in an attack's damage-roll list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub kind: DamageRollKind,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Restricts this entry to one sub-hit index (0-based); `None` applies
    /// to every sub-hit
    #[serde(default)]
    pub hit_index: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

impl DamageRoll {
    pub fn normal() -> Self {
        DamageRoll {
            kind: DamageRollKind::Normal,
            weight: 1,
            hit_index: None,
        }
    }
}

/// Gate that extends an attack's sub-hit count from an effect parameter on
/// the target; the gating effect is consumed when the sequence ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumesEffect {
    pub effect_id: String,
    /// Named parameter read from the active effect: extra sub-hits
    pub param: String,
}

/// Content definition of one attack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackDef {
    pub id: String,
    pub name: String,
    /// Number of sub-hits
    #[serde(default = "default_attack_count")]
    pub attack_count: u32,
    #[serde(default)]
    pub damage: Vec<DamageRoll>,
    #[serde(default)]
    pub prehit_effects: Vec<EffectApplicator>,
    #[serde(default)]
    pub onhit_effects: Vec<EffectApplicator>,
    #[serde(default)]
    pub cant_miss: bool,
    /// Minimum accuracy for `cant_miss` to take effect
    #[serde(default)]
    pub min_accuracy: f64,
    #[serde(default)]
    pub is_dragonbreath: bool,
    #[serde(default)]
    pub consumes_effect: Option<ConsumesEffect>,
}

fn default_attack_count() -> u32 {
    1
}

/// Inputs for evaluating a damage roll
#[derive(Debug, Clone, Copy)]
pub struct DamageRollInputs {
    pub min_hit: f64,
    pub max_hit: f64,
    pub target_current_hp: f64,
    pub number_multiplier: f64,
}

impl AttackDef {
    /// Plain single-hit attack rolling the normal damage range
    pub fn normal(id: impl Into<String>, name: impl Into<String>) -> Self {
        AttackDef {
            id: id.into(),
            name: name.into(),
            attack_count: 1,
            damage: vec![DamageRoll::normal()],
            prehit_effects: Vec::new(),
            onhit_effects: Vec::new(),
            cant_miss: false,
            min_accuracy: 0.0,
            is_dragonbreath: false,
            consumes_effect: None,
        }
    }

    /// Reduce the weighted damage-roll list to a single value for one
    /// sub-hit: filter by hit index, pick one entry by weight, evaluate it.
    ///
    /// An attack with no applicable entry deals nothing.
    pub fn roll_damage(
        &self,
        hit_index: u32,
        inputs: &DamageRollInputs,
        rng: &mut dyn CombatRng,
    ) -> f64 {
        let applicable: Vec<&DamageRoll> = self
            .damage
            .iter()
            .filter(|r| r.hit_index.is_none() || r.hit_index == Some(hit_index))
            .collect();
        if applicable.is_empty() {
            return 0.0;
        }

        let total_weight: u32 = applicable.iter().map(|r| r.weight).sum();
        let mut pick = rng.roll_integer(0, total_weight as i64 - 1);
        let mut chosen = applicable[0];
        for roll in &applicable {
            if pick < roll.weight as i64 {
                chosen = roll;
                break;
            }
            pick -= roll.weight as i64;
        }

        match &chosen.kind {
            DamageRollKind::MaxHitPercent { percent } => inputs.max_hit * percent / 100.0,
            DamageRollKind::RandomPercent {
                min_percent,
                max_percent,
            } => {
                let min = (inputs.max_hit * min_percent / 100.0).floor() as i64;
                let max = (inputs.max_hit * max_percent / 100.0).floor() as i64;
                rng.roll_integer(min.min(max), min.max(max)) as f64
            }
            DamageRollKind::Normal => {
                let min = inputs.min_hit.floor() as i64;
                let max = inputs.max_hit.floor() as i64;
                rng.roll_integer(min.min(max), min.max(max)) as f64
            }
            DamageRollKind::Flat { amount } => amount * inputs.number_multiplier,
            DamageRollKind::TargetCurrentHpPercent { percent } => {
                (inputs.target_current_hp * percent / 100.0).floor()
            }
        }
    }
}
