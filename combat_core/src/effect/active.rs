//! ActiveEffect - a combat effect instance living on one character

use crate::content::{CombatEffectDef, ReapplyBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of advancing an active effect's timers by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectTick {
    /// The effect's duration elapsed this tick
    pub expired: bool,
    /// Number of DOT periods that completed this tick
    pub dot_ticks: u32,
}

/// A live effect instance: timers and a named parameter bag.
///
/// The immutable definition stays in the content registry; everything
/// mutable lives here so the instance can be encoded on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub effect_id: String,
    /// Remaining duration; `None` for effects that last until removed
    pub remaining_ms: Option<f64>,
    pub stacks: u32,
    pub params: BTreeMap<String, f64>,
    /// Time accumulated toward the next DOT period
    pub dot_elapsed_ms: f64,
}

impl ActiveEffect {
    /// Instantiate from a definition, seeding parameters from the definition
    /// first and the applicator's initial parameters second (which win).
    pub fn new(def: &CombatEffectDef, initial_params: &BTreeMap<String, f64>) -> Self {
        let mut params = def.initial_params.clone();
        for (k, v) in initial_params {
            params.insert(k.clone(), *v);
        }
        ActiveEffect {
            effect_id: def.id.clone(),
            remaining_ms: def.duration_ms,
            stacks: 1,
            params,
            dot_elapsed_ms: 0.0,
        }
    }

    /// Reapply hook for an effect that is already active.
    ///
    /// Returns true if the instance changed (renderer cares).
    pub fn reapply(&mut self, def: &CombatEffectDef) -> bool {
        match def.reapply {
            ReapplyBehavior::Refresh => {
                self.remaining_ms = def.duration_ms;
                true
            }
            ReapplyBehavior::Stack { max_stacks } => {
                self.remaining_ms = def.duration_ms;
                if self.stacks < max_stacks {
                    self.stacks += 1;
                }
                true
            }
            ReapplyBehavior::Ignore => false,
        }
    }

    /// Advance duration and DOT timers by `delta_ms`
    pub fn tick(&mut self, def: &CombatEffectDef, delta_ms: f64) -> EffectTick {
        let mut outcome = EffectTick::default();

        if let Some(dot) = &def.dot {
            if dot.interval_ms > 0.0 {
                self.dot_elapsed_ms += delta_ms;
                while self.dot_elapsed_ms >= dot.interval_ms {
                    self.dot_elapsed_ms -= dot.interval_ms;
                    outcome.dot_ticks += 1;
                }
            }
        }

        if let Some(remaining) = &mut self.remaining_ms {
            *remaining -= delta_ms;
            if *remaining <= 0.0 {
                outcome.expired = true;
            }
        }

        outcome
    }

    /// Read a named parameter
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Source id under which this effect's own modifiers register
    pub fn modifier_source_id(&self) -> String {
        format!("effect:{}", self.effect_id)
    }
}
