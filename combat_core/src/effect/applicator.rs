//! Effect applicators - chance-gated rules that apply combat effects
//!
//! Applicators from different sources (equipment, attacks, effects) that are
//! equivalent per [`EffectApplicator::matches`] are merged into one bucket
//! entry by chance addition, and split back out by chance subtraction when
//! the source goes away. Splitting something that was never merged indicates
//! a corrupted call graph and is fatal.

use super::condition::{ApplicatorCondition, CharacterValues, TriggerContext};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Combat event that can fire applicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    PreAttack,
    HitWithAttack,
    MissedWithAttack,
    BeingAttacked,
    HitByAttack,
    Rebirth,
}

/// Which character the effect lands on, relative to the trigger owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicatorTarget {
    /// The character whose trigger fired
    Own,
    /// That character's opponent
    #[default]
    Target,
}

/// A conditional extra chance on top of the base chance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalChance {
    pub condition: ApplicatorCondition,
    pub extra_chance: f64,
}

/// A chance-gated rule applying a combat effect when its trigger fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectApplicator {
    pub trigger: EffectTrigger,
    pub effect_id: String,
    pub base_chance: f64,
    #[serde(default)]
    pub conditions: Vec<ConditionalChance>,
    #[serde(default)]
    pub target: ApplicatorTarget,
    #[serde(default)]
    pub bypass_barrier: bool,
    /// Parameters seeded into the active effect on application
    #[serde(default)]
    pub initial_params: BTreeMap<String, f64>,
}

impl EffectApplicator {
    /// Unconditional applicator with a flat chance
    pub fn new(trigger: EffectTrigger, effect_id: impl Into<String>, base_chance: f64) -> Self {
        EffectApplicator {
            trigger,
            effect_id: effect_id.into(),
            base_chance,
            conditions: Vec::new(),
            target: ApplicatorTarget::Target,
            bypass_barrier: false,
            initial_params: BTreeMap::new(),
        }
    }

    /// Synthetic 100%-chance applicator (curses, scripted applications)
    pub fn guaranteed(trigger: EffectTrigger, effect_id: impl Into<String>) -> Self {
        EffectApplicator::new(trigger, effect_id, 100.0)
    }

    pub fn targeting(mut self, target: ApplicatorTarget) -> Self {
        self.target = target;
        self
    }

    pub fn bypassing_barrier(mut self) -> Self {
        self.bypass_barrier = true;
        self
    }

    pub fn with_condition(mut self, condition: ApplicatorCondition, extra_chance: f64) -> Self {
        self.conditions.push(ConditionalChance {
            condition,
            extra_chance,
        });
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.initial_params.insert(name.into(), value);
        self
    }

    /// Merge/split equivalence: same trigger, effect, target selector, and
    /// condition list. Chance is deliberately excluded.
    pub fn matches(&self, other: &EffectApplicator) -> bool {
        self.trigger == other.trigger
            && self.effect_id == other.effect_id
            && self.target == other.target
            && self.conditions == other.conditions
    }

    /// Total chance once satisfied conditions have contributed
    pub fn chance_to_apply(&self, ctx: &TriggerContext, values: &CharacterValues) -> f64 {
        let extra: f64 = self
            .conditions
            .iter()
            .filter(|c| c.condition.evaluate(ctx, values))
            .map(|c| c.extra_chance)
            .sum();
        self.base_chance + extra
    }
}

/// Per-character buckets of merged applicators, keyed by trigger
#[derive(Debug, Clone, Default)]
pub struct ApplicatorBuckets {
    buckets: HashMap<EffectTrigger, Vec<EffectApplicator>>,
}

impl ApplicatorBuckets {
    pub fn new() -> Self {
        ApplicatorBuckets::default()
    }

    /// Merge an applicator in, adding `applicator.base_chance * multiplier`
    /// to the matching entry (or inserting a scaled copy).
    pub fn merge(&mut self, applicator: &EffectApplicator, multiplier: f64) {
        let bucket = self.buckets.entry(applicator.trigger).or_default();
        match bucket.iter_mut().find(|a| a.matches(applicator)) {
            Some(existing) => {
                existing.base_chance += applicator.base_chance * multiplier;
            }
            None => {
                let mut scaled = applicator.clone();
                scaled.base_chance *= multiplier;
                bucket.push(scaled);
            }
        }
    }

    /// Split an applicator back out, subtracting its scaled chance.
    ///
    /// # Panics
    ///
    /// Panics if no matching entry exists or more chance is split out than
    /// was merged in; both indicate a corrupted merge/split pairing.
    pub fn split(&mut self, applicator: &EffectApplicator, multiplier: f64) {
        let bucket = self
            .buckets
            .get_mut(&applicator.trigger)
            .unwrap_or_else(|| {
                panic!(
                    "split of applicator for effect '{}' with empty trigger bucket",
                    applicator.effect_id
                )
            });
        let index = bucket
            .iter()
            .position(|a| a.matches(applicator))
            .unwrap_or_else(|| {
                panic!(
                    "split of applicator for effect '{}' that was never merged",
                    applicator.effect_id
                )
            });

        let entry = &mut bucket[index];
        let removed = applicator.base_chance * multiplier;
        assert!(
            entry.base_chance - removed > -1e-9,
            "split of applicator for effect '{}' removes more chance ({removed}) than present ({})",
            applicator.effect_id,
            entry.base_chance
        );
        entry.base_chance -= removed;
        if entry.base_chance <= 1e-9 {
            bucket.remove(index);
        }
        if bucket.is_empty() {
            self.buckets.remove(&applicator.trigger);
        }
    }

    /// Applicators registered for a trigger (empty slice if none)
    pub fn for_trigger(&self, trigger: EffectTrigger) -> &[EffectApplicator] {
        self.buckets.get(&trigger).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
