//! Character - one combatant's complete mutable state
//!
//! A character owns its resources (hitpoints, barrier), its modifier table,
//! its active effects with their refcounted groups, its applicator buckets,
//! and a lazily recomputed [`CombatStats`] block. The stat pipeline runs in
//! a fixed order so later stages can read earlier ones:
//!
//! 1. max hitpoints
//! 2. resistances (one entry per registered damage type)
//! 3. attack interval
//! 4. accuracy rating
//! 5. evasion ratings (melee / ranged / magic)
//! 6. max hit
//! 7. min hit
//! 8. max barrier
//!
//! Hit chance is the one derived stat that needs the opponent, so the fight
//! fills it in after both sides have recomputed.

mod levels;
mod render;
mod timer;

pub use levels::{Level, SkillLevels};
pub use render::RenderFlags;
pub use timer::Timer;

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::combat::CombatEvent;
use crate::config::GameConstants;
use crate::content::{CombatEffectDef, ContentRegistry};
use crate::effect::{
    ActiveEffect, ApplicatorBuckets, CharacterValues, EffectGroups, EffectTrigger, TriggerContext,
};
use crate::modifier::{apply_modifier, ModifierKind, ModifierQuery, ModifierTable};
use crate::rng::CombatRng;
use crate::stats::{formulas, Cached, CombatStats, EquipmentStats};
use crate::types::{AttackType, CombatantSide, NextAction};

/// One weighted entry in a character's special-attack pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSelection {
    pub attack_id: String,
    #[serde(default = "default_selection_weight")]
    pub weight: u32,
}

fn default_selection_weight() -> u32 {
    1
}

impl AttackSelection {
    pub fn new(attack_id: impl Into<String>, weight: u32) -> Self {
        AttackSelection {
            attack_id: attack_id.into(),
            weight,
        }
    }
}

/// A trigger waiting for its applicators to be processed
#[derive(Debug, Clone, Copy)]
pub struct PendingTrigger {
    pub trigger: EffectTrigger,
    pub ctx: TriggerContext,
}

/// One DOT damage packet produced by an effect tick
#[derive(Debug, Clone, PartialEq)]
pub struct DotDamage {
    pub effect_id: String,
    pub damage: f64,
    pub damage_type_id: String,
}

/// One combatant.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: String,
    /// Which slot this character occupies in the current fight
    pub side: CombatantSide,

    // === Configuration ===
    pub levels: SkillLevels,
    pub equipment: EquipmentStats,
    pub attack_type: AttackType,
    /// Damage type this character deals
    pub damage_type_id: String,
    pub spell_id: Option<String>,
    pub curse_id: Option<String>,
    /// Weighted special-attack pool; empty means "always the default attack"
    pub available_attacks: Vec<AttackSelection>,

    // === Resources ===
    pub hitpoints: f64,
    pub barrier: f64,
    /// Healing banked from damage taken, paid out by the regen tick
    pub buffered_regen: f64,

    // === Derived state ===
    pub stats: Cached<CombatStats>,
    pub modifiers: ModifierTable,

    // === Effects ===
    pub effect_groups: EffectGroups,
    pub active_effects: BTreeMap<String, ActiveEffect>,
    pub applicators: ApplicatorBuckets,
    pub pending_triggers: VecDeque<PendingTrigger>,

    // === Action state ===
    pub next_action: NextAction,
    /// Attack locked in when the action was queued
    pub queued_attack_id: Option<String>,
    /// Hits completed within the current attack sequence
    pub attack_count: u32,
    pub turns_taken: u32,
    pub is_attacking: bool,
    /// True until the first sub-hit of the current attack resolves
    pub first_hit: bool,
    /// True until this character's first miss of the current turn
    pub first_miss: bool,
    pub attack_interrupted: bool,

    // === Timers ===
    pub act_timer: Timer,
    pub regen_timer: Timer,

    // === Output ===
    pub render: RenderFlags,
    pub events: Vec<CombatEvent>,
}

impl Character {
    pub fn new(id: impl Into<String>) -> Self {
        Character {
            id: id.into(),
            side: CombatantSide::Attacker,
            levels: SkillLevels::default(),
            equipment: EquipmentStats::default(),
            attack_type: AttackType::Melee,
            damage_type_id: "core:normal".to_string(),
            spell_id: None,
            curse_id: None,
            available_attacks: Vec::new(),
            hitpoints: 0.0,
            barrier: 0.0,
            buffered_regen: 0.0,
            stats: Cached::new(CombatStats::default()),
            modifiers: ModifierTable::new(),
            effect_groups: EffectGroups::new(),
            active_effects: BTreeMap::new(),
            applicators: ApplicatorBuckets::new(),
            pending_triggers: VecDeque::new(),
            next_action: NextAction::Attack,
            queued_attack_id: None,
            attack_count: 0,
            turns_taken: 0,
            is_attacking: false,
            first_hit: true,
            first_miss: true,
            attack_interrupted: false,
            act_timer: Timer::new(),
            regen_timer: Timer::new(),
            render: RenderFlags::all(),
            events: Vec::new(),
        }
    }

    pub fn with_levels(mut self, levels: SkillLevels) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentStats) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn using_attack_type(mut self, attack_type: AttackType) -> Self {
        self.attack_type = attack_type;
        self
    }

    pub fn dealing_damage_type(mut self, damage_type_id: impl Into<String>) -> Self {
        self.damage_type_id = damage_type_id.into();
        self
    }

    pub fn with_spell(mut self, spell_id: impl Into<String>) -> Self {
        self.spell_id = Some(spell_id.into());
        self
    }

    pub fn with_curse(mut self, curse_id: impl Into<String>) -> Self {
        self.curse_id = Some(curse_id.into());
        self
    }

    pub fn with_available_attack(mut self, attack_id: impl Into<String>, weight: u32) -> Self {
        self.available_attacks
            .push(AttackSelection::new(attack_id, weight));
        self
    }

    // === Stat pipeline ===

    /// Recompute derived stats if anything invalidated them.
    ///
    /// Clamps current hitpoints and barrier to the new maxima. Hit chance is
    /// deliberately left alone; the fight writes it once both sides are done.
    pub fn recompute_stats(
        &mut self,
        registry: &ContentRegistry,
        constants: &GameConstants,
        fight_active: bool,
    ) {
        if !self.stats.is_dirty() {
            return;
        }
        let hit_chance = self.stats.peek().hit_chance;
        let mut computed = self.compute_stats(registry, constants, fight_active);
        computed.hit_chance = hit_chance;
        *self.stats.value_mut() = computed;
        self.stats.mark_clean();
        self.render.stats = true;

        let stats = self.stats.peek();
        if self.hitpoints > stats.max_hitpoints {
            self.hitpoints = stats.max_hitpoints;
            self.render.hitpoints = true;
        }
        if self.barrier > stats.max_barrier {
            self.barrier = stats.max_barrier;
            self.render.barrier = true;
        }
    }

    fn compute_stats(
        &self,
        registry: &ContentRegistry,
        constants: &GameConstants,
        fight_active: bool,
    ) -> CombatStats {
        let k = constants.balance.number_multiplier;
        let mods = &self.modifiers;
        let base_query = ModifierQuery::any();
        let style_query = ModifierQuery::any().with_attack_type(self.attack_type);
        let mut out = CombatStats::default();

        // 1. Max hitpoints
        let hp_base = k * 10.0 * self.levels.hitpoints.effective()
            + mods.get_value(ModifierKind::MaxHitpointsFlat, &base_query) * k;
        out.max_hitpoints =
            apply_modifier(hp_base, mods.get_value(ModifierKind::MaxHitpointsPercent, &base_query))
                .floor()
                .max(1.0);

        // 2. Resistances
        for id in registry.damage_type_ids() {
            let query = ModifierQuery::any()
                .with_damage_type(id)
                .with_attack_type(self.attack_type);
            let base = self.equipment.resistance(id);
            let flat = mods.get_value(ModifierKind::ResistanceFlat, &query);
            let percent = mods.get_value(ModifierKind::ResistancePercent, &query);
            let halve = mods.is_active(ModifierKind::HalveResistance, &query);
            let cap = registry
                .damage_type(id)
                .map(|d| d.resistance_cap)
                .unwrap_or(95.0);
            out.resistances.insert(
                id.to_string(),
                formulas::finalize_resistance(base + flat, percent, halve, cap),
            );
        }
        // Immunities harden to full resistance only while fighting, so the
        // stat screen outside combat still shows the underlying numbers.
        if fight_active {
            if let Some(own_type) = registry.damage_type(&self.damage_type_id) {
                for id in &own_type.immune_to {
                    out.resistances.insert(id.clone(), 100.0);
                }
            }
        }

        // 3. Attack interval
        let base_interval = if self.equipment.attack_speed_ms > 0.0 {
            self.equipment.attack_speed_ms
        } else {
            constants.timing.base_attack_interval_ms
        };
        let interval = apply_modifier(
            base_interval + mods.get_value(ModifierKind::AttackIntervalFlat, &base_query),
            mods.get_value(ModifierKind::AttackIntervalPercent, &base_query),
        );
        out.attack_interval_ms = interval.max(constants.timing.min_attack_interval_ms);

        // 4. Accuracy
        let accuracy_level = match self.attack_type {
            AttackType::Melee => self.levels.attack.effective(),
            AttackType::Ranged => self.levels.ranged.effective(),
            AttackType::Magic => self.levels.magic.effective(),
        };
        let accuracy_rating =
            formulas::stat_rating(accuracy_level, self.equipment.attack_bonus(self.attack_type));
        out.accuracy = apply_modifier(
            accuracy_rating,
            mods.get_value(ModifierKind::AccuracyPercent, &style_query),
        );

        // 5. Evasion
        let defence = self.levels.defence.effective();
        let evade = |style: AttackType, level: f64, equipment: &EquipmentStats| {
            let rating = formulas::stat_rating(level, equipment.defence_bonus(style));
            apply_modifier(
                rating,
                mods.get_value(
                    ModifierKind::EvasionPercent,
                    &ModifierQuery::any().with_attack_type(style),
                ),
            )
        };
        out.evasion.melee = evade(AttackType::Melee, defence, &self.equipment);
        out.evasion.ranged = evade(AttackType::Ranged, defence, &self.equipment);
        out.evasion.magic = evade(
            AttackType::Magic,
            formulas::magic_evasion_level(defence, self.levels.magic.effective()),
            &self.equipment,
        );

        // 6. Max hit
        out.max_hit = self.compute_max_hit(registry, k, &style_query);

        // 7. Min hit
        out.min_hit = formulas::min_hit(
            mods.get_value(ModifierKind::MinHitFlat, &base_query) * k,
            out.max_hit,
            mods.get_value(ModifierKind::MinHitPercentOfMaxHit, &base_query),
        );

        // 8. Max barrier
        let barrier_base = self.equipment.barrier_bonus * k
            + mods.get_value(ModifierKind::MaxBarrierFlat, &base_query) * k;
        out.max_barrier = apply_modifier(
            barrier_base,
            mods.get_value(ModifierKind::MaxBarrierPercent, &base_query),
        )
        .floor()
        .max(0.0);

        out
    }

    fn compute_max_hit(
        &self,
        registry: &ContentRegistry,
        number_multiplier: f64,
        style_query: &ModifierQuery,
    ) -> f64 {
        let mods = &self.modifiers;
        let base = match self.attack_type {
            AttackType::Melee => formulas::strength_max_hit(
                self.levels.strength.effective(),
                self.equipment.strength_bonus(AttackType::Melee),
                number_multiplier,
            ),
            AttackType::Ranged => formulas::strength_max_hit(
                self.levels.ranged.effective(),
                self.equipment.strength_bonus(AttackType::Ranged),
                number_multiplier,
            ),
            AttackType::Magic => {
                let spell = self
                    .spell_id
                    .as_deref()
                    .and_then(|id| registry.spell(id));
                match spell {
                    Some(spell) if spell.forbids_damage_modifiers => {
                        // Fixed-damage spells skip every max-hit modifier
                        return formulas::magic_max_hit_unmodified(
                            spell.max_hit,
                            number_multiplier,
                        );
                    }
                    Some(spell) => {
                        let bonus = self.equipment.magic_damage_bonus
                            + mods.get_value(ModifierKind::MagicDamagePercent, style_query);
                        formulas::magic_max_hit(
                            spell.max_hit,
                            self.levels.magic.effective(),
                            bonus,
                            number_multiplier,
                        )
                    }
                    None => {
                        warn!(
                            character = %self.id,
                            spell = ?self.spell_id,
                            "magic attacker has no usable spell; max hit falls back to 0"
                        );
                        0.0
                    }
                }
            }
        };
        apply_modifier(
            base + mods.get_value(ModifierKind::MaxHitFlat, style_query) * number_multiplier,
            mods.get_value(ModifierKind::MaxHitPercent, style_query),
        )
        .floor()
        .max(0.0)
    }

    // === Resources ===

    pub fn is_dead(&self) -> bool {
        self.hitpoints <= 0.0
    }

    pub fn has_barrier(&self) -> bool {
        self.barrier > 0.0
    }

    pub fn hitpoints_percent(&self) -> f64 {
        let max = self.stats.peek().max_hitpoints;
        if max > 0.0 {
            100.0 * self.hitpoints / max
        } else {
            0.0
        }
    }

    pub fn barrier_percent(&self) -> f64 {
        let max = self.stats.peek().max_barrier;
        if max > 0.0 {
            100.0 * self.barrier / max
        } else {
            0.0
        }
    }

    /// Heal hitpoints, clamped to the current maximum. Returns the amount
    /// actually restored.
    pub fn heal(&mut self, amount: f64) -> f64 {
        let max = self.stats.peek().max_hitpoints;
        let healed = (max - self.hitpoints).min(amount).max(0.0);
        if healed > 0.0 {
            self.hitpoints += healed;
            self.render.hitpoints = true;
        }
        healed
    }

    /// Remove hitpoints, clamped at zero. Returns the amount actually lost.
    pub fn remove_hitpoints(&mut self, amount: f64) -> f64 {
        let lost = self.hitpoints.min(amount).max(0.0);
        if lost > 0.0 {
            self.hitpoints -= lost;
            self.render.hitpoints = true;
        }
        lost
    }

    /// Add barrier, clamped to the current maximum. Returns the amount
    /// actually added.
    pub fn add_barrier(&mut self, amount: f64) -> f64 {
        let max = self.stats.peek().max_barrier;
        let added = (max - self.barrier).min(amount).max(0.0);
        if added > 0.0 {
            self.barrier += added;
            self.render.barrier = true;
        }
        added
    }

    /// Remove barrier, clamped at zero. Emits [`CombatEvent::BarrierBroken`]
    /// when this removal empties it. Returns the amount actually removed.
    pub fn remove_barrier(&mut self, amount: f64) -> f64 {
        let removed = self.barrier.min(amount).max(0.0);
        if removed > 0.0 {
            self.barrier -= removed;
            self.render.barrier = true;
            if self.barrier <= 0.0 {
                self.barrier = 0.0;
                self.events.push(CombatEvent::BarrierBroken { side: self.side });
            }
        }
        removed
    }

    /// Route incoming damage to barrier or hitpoints and emit the splash.
    ///
    /// While a barrier is up, every damage source except reflect is absorbed
    /// by it and hitpoints are untouched. Returns the hitpoints actually
    /// lost, which is what lifesteal and regen buffering care about.
    pub fn absorb_damage(&mut self, amount: f64, splash: crate::combat::SplashType) -> f64 {
        let hp_lost = if splash.consumes_barrier() && self.has_barrier() {
            self.remove_barrier(amount);
            0.0
        } else {
            self.remove_hitpoints(amount)
        };
        self.events.push(CombatEvent::Splash {
            side: self.side,
            splash,
            amount,
        });
        hp_lost
    }

    /// Snapshot of the quantities applicator conditions may inspect
    pub fn values(&self) -> CharacterValues {
        CharacterValues {
            hitpoints_percent: self.hitpoints_percent(),
            barrier_percent: self.barrier_percent(),
            attack_count: self.attack_count as f64,
            turns_taken: self.turns_taken as f64,
            active_effect_count: self.active_effects.len() as f64,
        }
    }

    // === Effects ===

    /// Try to apply a combat effect. Returns true if the effect landed
    /// (fresh or reapplied), false if ignored or blocked.
    pub fn apply_effect(
        &mut self,
        def: &CombatEffectDef,
        registry: &ContentRegistry,
        initial_params: &BTreeMap<String, f64>,
        rng: &mut dyn CombatRng,
    ) -> bool {
        // Ignore roll; a chance at or past 100 skips the roll entirely
        let ignore_chance = self.effect_ignore_chance(def);
        if ignore_chance >= 100.0 || (ignore_chance > 0.0 && rng.roll_percentage(ignore_chance)) {
            return false;
        }

        if let Some(active) = self.active_effects.get_mut(&def.id) {
            let changed = active.reapply(def);
            if changed {
                self.render.effects = true;
                self.events.push(CombatEvent::EffectApplied {
                    side: self.side,
                    effect_id: def.id.clone(),
                    reapplied: true,
                });
            }
            return changed;
        }

        for group_id in &def.exclusive_groups {
            if self.effect_groups.is_active(group_id) {
                return false;
            }
        }

        let active = ActiveEffect::new(def, initial_params);
        if !def.modifiers.is_empty() {
            self.modifiers
                .add_source(active.modifier_source_id(), def.modifiers.clone());
            self.stats.invalidate();
        }
        for group_id in &def.groups {
            if self.effect_groups.increment(group_id) {
                match registry.effect_group(group_id) {
                    Some(group_def) if !group_def.modifiers.is_empty() => {
                        self.modifiers
                            .add_source(group_def.modifier_source_id(), group_def.modifiers.clone());
                        self.stats.invalidate();
                    }
                    Some(_) => {}
                    None => {
                        warn!(effect = %def.id, group = %group_id, "effect references unknown group");
                    }
                }
                self.events.push(CombatEvent::EffectGroupApplied {
                    side: self.side,
                    group_id: group_id.clone(),
                });
            }
        }
        self.active_effects.insert(def.id.clone(), active);
        self.render.effects = true;
        self.events.push(CombatEvent::EffectApplied {
            side: self.side,
            effect_id: def.id.clone(),
            reapplied: false,
        });
        true
    }

    fn effect_ignore_chance(&self, def: &CombatEffectDef) -> f64 {
        let mut chance = self
            .modifiers
            .get_value(ModifierKind::EffectIgnoreChance, &ModifierQuery::any());
        for group_id in &def.groups {
            let query = ModifierQuery::any().with_effect_group(group_id.as_str());
            chance = chance.max(
                self.modifiers
                    .get_value(ModifierKind::EffectIgnoreChance, &query),
            );
        }
        chance
    }

    /// Remove an active effect and unwind its modifier and group
    /// registrations. Returns false if the effect was not active.
    pub fn remove_effect(&mut self, effect_id: &str, registry: &ContentRegistry) -> bool {
        let Some(active) = self.active_effects.remove(effect_id) else {
            return false;
        };
        if self.modifiers.remove_source(&active.modifier_source_id()) {
            self.stats.invalidate();
        }
        match registry.effect(effect_id) {
            Some(def) => {
                for group_id in &def.groups {
                    if self.effect_groups.decrement(group_id) {
                        if let Some(group_def) = registry.effect_group(group_id) {
                            if self.modifiers.remove_source(&group_def.modifier_source_id()) {
                                self.stats.invalidate();
                            }
                        }
                        self.events.push(CombatEvent::EffectGroupRemoved {
                            side: self.side,
                            group_id: group_id.clone(),
                        });
                    }
                }
            }
            None => {
                warn!(effect = %effect_id, "removing effect with no definition; group counts may be stale");
            }
        }
        self.render.effects = true;
        self.events.push(CombatEvent::EffectRemoved {
            side: self.side,
            effect_id: effect_id.to_string(),
        });
        true
    }

    pub fn remove_all_effects(&mut self, registry: &ContentRegistry) {
        let ids: Vec<String> = self.active_effects.keys().cloned().collect();
        for id in ids {
            self.remove_effect(&id, registry);
        }
    }

    /// Advance effect durations and DOT timers. Expired effects are removed
    /// with full unwind; completed DOT periods come back as damage packets
    /// for the fight to apply.
    pub fn tick_effects(&mut self, delta_ms: f64, registry: &ContentRegistry) -> Vec<DotDamage> {
        let mut dots = Vec::new();
        let mut expired = Vec::new();
        for (id, active) in self.active_effects.iter_mut() {
            let Some(def) = registry.effect(id) else {
                warn!(effect = %id, "active effect has no definition; skipping tick");
                continue;
            };
            let tick = active.tick(def, delta_ms);
            if tick.dot_ticks > 0 {
                if let Some(dot) = &def.dot {
                    let per_tick =
                        active.param(&dot.damage_param).unwrap_or(0.0) * active.stacks as f64;
                    for _ in 0..tick.dot_ticks {
                        dots.push(DotDamage {
                            effect_id: id.clone(),
                            damage: per_tick,
                            damage_type_id: dot.damage_type.clone(),
                        });
                    }
                }
            }
            if tick.expired {
                expired.push(id.clone());
            }
        }
        for id in expired {
            self.remove_effect(&id, registry);
        }
        dots
    }

    pub fn queue_trigger(&mut self, trigger: EffectTrigger, ctx: TriggerContext) {
        self.pending_triggers.push_back(PendingTrigger { trigger, ctx });
    }

    // === Actions ===

    pub fn can_attack(&self) -> bool {
        !self
            .modifiers
            .is_active(ModifierKind::CantAttack, &ModifierQuery::any())
    }

    /// Whether an active effect group currently locks this character out of
    /// acting (stun, sleep, freeze by default)
    pub fn is_crowd_controlled(&self, constants: &GameConstants) -> bool {
        constants
            .balance
            .crowd_control_groups
            .iter()
            .any(|group| self.effect_groups.is_active(group))
    }

    /// Weighted pick from the special-attack pool, or the style's default
    /// attack when the pool is empty or specials are disabled.
    pub fn select_attack(
        &self,
        registry: &ContentRegistry,
        rng: &mut dyn CombatRng,
    ) -> Option<String> {
        let specials_disabled = self
            .modifiers
            .is_active(ModifierKind::DisableSpecialAttacks, &ModifierQuery::any());
        if !self.available_attacks.is_empty() && !specials_disabled {
            let total: u32 = self.available_attacks.iter().map(|a| a.weight).sum();
            if total > 0 {
                let mut roll = rng.roll_integer(0, total as i64 - 1);
                for selection in &self.available_attacks {
                    roll -= selection.weight as i64;
                    if roll < 0 {
                        return Some(selection.attack_id.clone());
                    }
                }
            }
        }
        self.default_attack_id(registry)
    }

    pub fn default_attack_id(&self, registry: &ContentRegistry) -> Option<String> {
        let id = registry.default_attack(self.attack_type).map(|a| a.id.clone());
        if id.is_none() {
            warn!(
                character = %self.id,
                attack_type = ?self.attack_type,
                "no default attack registered for style"
            );
        }
        id
    }

    /// Clear per-turn attack state (queued action, sub-hit progress)
    pub fn reset_action_state(&mut self) {
        self.next_action = NextAction::Attack;
        self.queued_attack_id = None;
        self.attack_count = 0;
        self.is_attacking = false;
        self.first_hit = true;
        self.attack_interrupted = false;
        self.act_timer.stop();
    }

    /// Full reset to a fresh-spawn state: effects stripped, resources
    /// refilled to maximum, all counters zeroed.
    pub fn reset_for_spawning(&mut self, registry: &ContentRegistry, constants: &GameConstants) {
        self.remove_all_effects(registry);
        self.pending_triggers.clear();
        self.reset_action_state();
        self.first_miss = true;
        self.turns_taken = 0;
        self.buffered_regen = 0.0;
        self.regen_timer.stop();
        self.stats.invalidate();
        self.recompute_stats(registry, constants, false);
        let stats = self.stats.peek();
        self.hitpoints = stats.max_hitpoints;
        self.barrier = stats.max_barrier;
        self.render = RenderFlags::all();
        // Spawn bookkeeping produced events nobody should see
        self.events.clear();
    }

    /// Drain the queued events for the embedder
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::EffectGroupDef;
    use crate::modifier::ModifierEntry;
    use crate::rng::FixedRng;

    fn setup() -> (ContentRegistry, GameConstants) {
        (ContentRegistry::with_defaults(), GameConstants::default())
    }

    fn spawned(levels: SkillLevels) -> (Character, ContentRegistry, GameConstants) {
        let (registry, constants) = setup();
        let mut character = Character::new("test").with_levels(levels);
        character.reset_for_spawning(&registry, &constants);
        (character, registry, constants)
    }

    #[test]
    fn test_spawn_fills_resources() {
        let (character, _, _) = spawned(SkillLevels::uniform(10));
        // Max HP = 10 * K * 10 = 1000 with K = 10
        assert!((character.hitpoints - 1000.0).abs() < f64::EPSILON);
        assert!((character.stats.peek().max_hitpoints - 1000.0).abs() < f64::EPSILON);
        assert!(!character.stats.is_dirty());
    }

    #[test]
    fn test_max_hit_worked_example() {
        // Level 50, strength bonus 100, K = 1:
        // e = 59, term = 1.3 + 5.9 + 1.25 + 9.21875 = 17.66875 -> 17
        let (registry, mut constants) = setup();
        constants.balance.number_multiplier = 1.0;
        let mut character = Character::new("melee").with_levels(SkillLevels::uniform(50));
        character.equipment.strength_bonus = 100.0;
        character.reset_for_spawning(&registry, &constants);
        assert!((character.stats.peek().max_hit - 17.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_magic_max_hit_uses_spell() {
        let (registry, constants) = setup();
        let mut character = Character::new("mage")
            .with_levels(SkillLevels::uniform(20))
            .using_attack_type(AttackType::Magic)
            .with_spell("core:fire_bolt");
        character.reset_for_spawning(&registry, &constants);
        // floor(10 * 7 * 1.0 * (1 + 21/200)) = floor(77.35) = 77
        assert!((character.stats.peek().max_hit - 77.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_magic_without_spell_is_zero_max_hit() {
        let (registry, constants) = setup();
        let mut character = Character::new("mage")
            .with_levels(SkillLevels::uniform(20))
            .using_attack_type(AttackType::Magic);
        character.reset_for_spawning(&registry, &constants);
        assert!(character.stats.peek().max_hit.abs() < f64::EPSILON);
    }

    #[test]
    fn test_modifier_invalidates_and_changes_stats() {
        let (mut character, registry, constants) = spawned(SkillLevels::uniform(10));
        let before = character.stats.peek().max_hitpoints;
        character.modifiers.add_source(
            "test:buff",
            vec![ModifierEntry::new(ModifierKind::MaxHitpointsPercent, 50.0)],
        );
        character.stats.invalidate();
        character.recompute_stats(&registry, &constants, false);
        let after = character.stats.peek().max_hitpoints;
        assert!((after - before * 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shrinking_max_clamps_current() {
        let (mut character, registry, constants) = spawned(SkillLevels::uniform(10));
        character.modifiers.add_source(
            "test:debuff",
            vec![ModifierEntry::new(ModifierKind::MaxHitpointsPercent, -50.0)],
        );
        character.stats.invalidate();
        character.recompute_stats(&registry, &constants, false);
        assert!((character.hitpoints - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_heal_and_damage_clamp() {
        let (mut character, _, _) = spawned(SkillLevels::uniform(10));
        assert!(character.heal(100.0).abs() < f64::EPSILON);
        let lost = character.remove_hitpoints(1500.0);
        assert!((lost - 1000.0).abs() < f64::EPSILON);
        assert!(character.is_dead());
        let healed = character.heal(250.0);
        assert!((healed - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_barrier_break_event() {
        let (mut character, _, _) = spawned(SkillLevels::uniform(10));
        character.barrier = 30.0;
        let removed = character.remove_barrier(50.0);
        assert!((removed - 30.0).abs() < f64::EPSILON);
        assert!(character
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::BarrierBroken { .. })));
    }

    #[test]
    fn test_apply_effect_registers_group_modifiers() {
        let (mut character, registry, constants) = spawned(SkillLevels::uniform(50));
        let before = character.stats.peek().evasion.melee;
        let sleep = registry.effect("core:sleep").unwrap().clone();
        let mut rng = FixedRng::never_hit();
        assert!(character.apply_effect(&sleep, &registry, &BTreeMap::new(), &mut rng));
        assert!(character.effect_groups.is_active("core:sleep"));
        character.recompute_stats(&registry, &constants, true);
        // Sleep group carries -25% evasion
        let after = character.stats.peek().evasion.melee;
        assert!((after - before * 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_exclusive_group_blocks_application() {
        let (mut character, registry, _) = spawned(SkillLevels::uniform(50));
        let mut rng = FixedRng::never_hit();
        let stun = registry.effect("core:stun").unwrap().clone();
        let sleep = registry.effect("core:sleep").unwrap().clone();
        assert!(character.apply_effect(&stun, &registry, &BTreeMap::new(), &mut rng));
        assert!(!character.apply_effect(&sleep, &registry, &BTreeMap::new(), &mut rng));
    }

    #[test]
    fn test_ignore_chance_at_hundred_blocks() {
        let (mut character, registry, _) = spawned(SkillLevels::uniform(50));
        character.modifiers.add_source(
            "test:immunity",
            vec![ModifierEntry::scoped(
                ModifierKind::EffectIgnoreChance,
                100.0,
                crate::modifier::ModifierScope::for_effect_group("core:stun"),
            )],
        );
        // always_hit would pass a roll, but >= 100 never rolls
        let mut rng = FixedRng::always_hit();
        let stun = registry.effect("core:stun").unwrap().clone();
        assert!(!character.apply_effect(&stun, &registry, &BTreeMap::new(), &mut rng));
        assert!(character.active_effects.is_empty());
    }

    #[test]
    fn test_remove_effect_unwinds_group() {
        let (mut character, registry, _) = spawned(SkillLevels::uniform(50));
        let mut rng = FixedRng::never_hit();
        let stun = registry.effect("core:stun").unwrap().clone();
        character.apply_effect(&stun, &registry, &BTreeMap::new(), &mut rng);
        assert!(character.remove_effect("core:stun", &registry));
        assert!(!character.effect_groups.is_active("core:stun"));
        assert!(character.active_effects.is_empty());
    }

    #[test]
    fn test_dot_ticks_and_expiry() {
        let (mut character, registry, _) = spawned(SkillLevels::uniform(50));
        let mut rng = FixedRng::never_hit();
        let burn = registry.effect("core:burn").unwrap().clone();
        character.apply_effect(&burn, &registry, &BTreeMap::new(), &mut rng);
        // Burn: 5000ms duration, 500ms DOT period, 10 damage per tick
        let dots = character.tick_effects(1000.0, &registry);
        assert_eq!(dots.len(), 2);
        assert!((dots[0].damage - 10.0).abs() < f64::EPSILON);
        assert_eq!(dots[0].damage_type_id, "core:normal");
        // Run the rest of the duration out
        character.tick_effects(4000.0, &registry);
        assert!(character.active_effects.is_empty());
    }

    #[test]
    fn test_crowd_control_gating() {
        let (mut character, registry, constants) = spawned(SkillLevels::uniform(50));
        assert!(!character.is_crowd_controlled(&constants));
        let mut rng = FixedRng::never_hit();
        let stun = registry.effect("core:stun").unwrap().clone();
        character.apply_effect(&stun, &registry, &BTreeMap::new(), &mut rng);
        assert!(character.is_crowd_controlled(&constants));
    }

    #[test]
    fn test_select_attack_prefers_pool_and_respects_disable() {
        let (registry, constants) = setup();
        let mut character = Character::new("warrior")
            .with_levels(SkillLevels::uniform(50))
            .with_available_attack("core:double_slash", 1);
        character.reset_for_spawning(&registry, &constants);
        let mut rng = FixedRng::never_hit();
        assert_eq!(
            character.select_attack(&registry, &mut rng),
            Some("core:double_slash".to_string())
        );
        character.modifiers.add_source(
            "test:no_specials",
            vec![ModifierEntry::new(ModifierKind::DisableSpecialAttacks, 1.0)],
        );
        assert_eq!(
            character.select_attack(&registry, &mut rng),
            Some("core:melee_attack".to_string())
        );
    }

    #[test]
    fn test_immunity_forces_resistance_in_fight_only() {
        let (registry, constants) = setup();
        let mut registry = registry;
        // Give the character's damage type an immunity for the test
        registry.register_damage_type(crate::content::DamageTypeDef {
            id: "test:holy".to_string(),
            name: "Holy".to_string(),
            resistance_cap: 95.0,
            immune_to: vec!["core:abyssal".to_string()],
        });
        let mut character = Character::new("paladin")
            .with_levels(SkillLevels::uniform(10))
            .dealing_damage_type("test:holy");
        character.reset_for_spawning(&registry, &constants);
        assert!(character.stats.peek().resistance("core:abyssal") < 100.0);
        character.stats.invalidate();
        character.recompute_stats(&registry, &constants, true);
        assert!((character.stats.peek().resistance("core:abyssal") - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_group_modifier_registers_once_for_two_effects() {
        let (registry, constants) = setup();
        let mut registry = registry;
        registry.register_effect_group(
            EffectGroupDef::new("test:weakened", "Weakened").with_modifier(ModifierEntry::new(
                ModifierKind::AccuracyPercent,
                -10.0,
            )),
        );
        registry.register_effect(
            CombatEffectDef::new("test:weak_a", "Weak A")
                .in_group("test:weakened")
                .lasting_ms(5000.0),
        );
        registry.register_effect(
            CombatEffectDef::new("test:weak_b", "Weak B")
                .in_group("test:weakened")
                .lasting_ms(5000.0),
        );
        let mut character = Character::new("test").with_levels(SkillLevels::uniform(50));
        character.reset_for_spawning(&registry, &constants);
        let base = character.stats.peek().accuracy;
        let mut rng = FixedRng::never_hit();
        let weak_a = registry.effect("test:weak_a").unwrap().clone();
        let weak_b = registry.effect("test:weak_b").unwrap().clone();
        character.apply_effect(&weak_a, &registry, &BTreeMap::new(), &mut rng);
        character.apply_effect(&weak_b, &registry, &BTreeMap::new(), &mut rng);
        character.recompute_stats(&registry, &constants, true);
        // One group registration, not two
        assert!((character.stats.peek().accuracy - base * 0.9).abs() < 1e-9);
        // Removing one effect keeps the group active
        character.remove_effect("test:weak_a", &registry);
        character.recompute_stats(&registry, &constants, true);
        assert!((character.stats.peek().accuracy - base * 0.9).abs() < 1e-9);
        character.remove_effect("test:weak_b", &registry);
        character.recompute_stats(&registry, &constants, true);
        assert!((character.stats.peek().accuracy - base).abs() < 1e-9);
    }
}
