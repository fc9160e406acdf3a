//! Fight - the 1v1 turn resolution loop
//!
//! A fight owns both characters and drives them through the action cycle:
//!
//! ```text
//! queue next action -> act timer fires -> attack (or pass) -> end of turn
//!        ^                                      |
//!        +---------- multi-hit continuation ----+
//! ```
//!
//! One attack turn resolves per spec order: pre-attack effects, curse, hit
//! resolution, then per-hit damage with its on-hit extras. Multi-hit
//! attacks run the per-hit portion once per sub-hit, each separated by the
//! actor's attack interval; interrupts and crowd control cut the sequence
//! short. The fight ends the moment either side runs out of hitpoints and
//! fails to rebirth.
//!
//! Randomness and content are injected per call, so the same fight state
//! replays identically under a seeded generator.

mod events;

pub use events::{CombatEvent, SplashType};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::character::Character;
use crate::config::GameConstants;
use crate::content::{AttackDef, ContentRegistry, DamageRollInputs};
use crate::effect::{EffectApplicator, EffectTrigger, TriggerContext};
use crate::modifier::{apply_modifier, ModifierKind, ModifierQuery};
use crate::rng::CombatRng;
use crate::stats::formulas;
use crate::types::{AttackType, CombatantSide, NextAction};

/// Lifecycle of one fight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightState {
    /// Characters paired but not yet fighting
    Idle,
    Active,
    Finished { winner: CombatantSide },
}

/// A 1v1 fight between two characters.
#[derive(Debug, Clone)]
pub struct Fight {
    pub attacker: Character,
    pub defender: Character,
    pub constants: GameConstants,
    pub state: FightState,
    events: Vec<CombatEvent>,
}

impl Fight {
    pub fn new(mut attacker: Character, mut defender: Character, constants: GameConstants) -> Self {
        attacker.side = CombatantSide::Attacker;
        defender.side = CombatantSide::Defender;
        Fight {
            attacker,
            defender,
            constants,
            state: FightState::Idle,
            events: Vec::new(),
        }
    }

    pub fn character(&self, side: CombatantSide) -> &Character {
        match side {
            CombatantSide::Attacker => &self.attacker,
            CombatantSide::Defender => &self.defender,
        }
    }

    pub fn character_mut(&mut self, side: CombatantSide) -> &mut Character {
        match side {
            CombatantSide::Attacker => &mut self.attacker,
            CombatantSide::Defender => &mut self.defender,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, FightState::Finished { .. })
    }

    pub fn winner(&self) -> Option<CombatantSide> {
        match self.state {
            FightState::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    /// Spawn both characters fresh and queue their opening actions.
    pub fn start(&mut self, registry: &ContentRegistry, rng: &mut dyn CombatRng) {
        self.state = FightState::Active;
        self.attacker.reset_for_spawning(registry, &self.constants);
        self.defender.reset_for_spawning(registry, &self.constants);
        // Spawning computed stats without the in-fight immunity override
        self.attacker.stats.invalidate();
        self.defender.stats.invalidate();
        self.refresh_stats(registry);
        let regen_interval = self.constants.regen.interval_ms;
        self.attacker.regen_timer.start(regen_interval);
        self.defender.regen_timer.start(regen_interval);
        self.queue_next_action(CombatantSide::Attacker, registry, rng);
        self.queue_next_action(CombatantSide::Defender, registry, rng);
        self.collect_events();
    }

    /// Recompute any stale derived stats, then the pair-dependent hit
    /// chances. Always leaves both caches clean.
    pub fn refresh_stats(&mut self, registry: &ContentRegistry) {
        let fight_active = matches!(self.state, FightState::Active);
        self.attacker
            .recompute_stats(registry, &self.constants, fight_active);
        self.defender
            .recompute_stats(registry, &self.constants, fight_active);

        let attacker_chance = formulas::hit_chance(
            self.attacker.stats.peek().accuracy,
            self.defender
                .stats
                .peek()
                .evasion
                .against(self.attacker.attack_type),
        );
        let defender_chance = formulas::hit_chance(
            self.defender.stats.peek().accuracy,
            self.attacker
                .stats
                .peek()
                .evasion
                .against(self.defender.attack_type),
        );
        self.attacker.stats.value_mut().hit_chance = attacker_chance;
        self.defender.stats.value_mut().hit_chance = defender_chance;
    }

    /// Decide what `side` does when its action timer next fires and start
    /// that timer.
    pub fn queue_next_action(
        &mut self,
        side: CombatantSide,
        registry: &ContentRegistry,
        rng: &mut dyn CombatRng,
    ) {
        self.refresh_stats(registry);
        let Fight {
            attacker,
            defender,
            constants,
            events,
            ..
        } = self;
        let (actor, opponent) = match side {
            CombatantSide::Attacker => (attacker, defender),
            CombatantSide::Defender => (defender, attacker),
        };

        let mid_sequence = actor.is_attacking && actor.attack_count > 0;
        if !mid_sequence {
            if !actor.can_attack() || actor.is_crowd_controlled(constants) {
                actor.next_action = NextAction::Nothing;
                actor.queued_attack_id = None;
            } else {
                let mut chosen = actor.select_attack(registry, rng);
                if let Some(id) = chosen.clone() {
                    match registry.attack(&id) {
                        Some(attack) => {
                            // A special whose every effect is already running
                            // would be wasted; fall back to the default
                            if attack_only_reapplies(attack, actor, opponent) {
                                chosen = actor.default_attack_id(registry);
                            }
                        }
                        None => {
                            warn!(attack = %id, "selected attack is not registered; using default");
                            chosen = actor.default_attack_id(registry);
                        }
                    }
                }
                match chosen {
                    Some(id) => {
                        actor.queued_attack_id = Some(id);
                        actor.next_action = NextAction::Attack;
                    }
                    None => {
                        actor.next_action = NextAction::Nothing;
                        actor.queued_attack_id = None;
                    }
                }
            }
        }

        let interval = actor.stats.peek().attack_interval_ms;
        if constants.timing.timed_actions {
            actor.act_timer.start(interval);
            actor.render.attack_bar = true;
        }
        events.push(CombatEvent::ActionQueued {
            side,
            action: actor.next_action,
            attack_id: actor.queued_attack_id.clone(),
        });
    }

    /// Cut an in-flight attack sequence short: the character keeps its
    /// turn and remaining sub-hits are dropped. With no attack in flight
    /// the current action is discarded and the next one queued at once.
    pub fn interrupt_action(
        &mut self,
        side: CombatantSide,
        registry: &ContentRegistry,
        rng: &mut dyn CombatRng,
    ) {
        let actor = self.character_mut(side);
        if actor.is_attacking {
            actor.attack_interrupted = true;
            actor
                .events
                .push(CombatEvent::AttackInterrupted { side: actor.side });
        } else {
            actor.reset_action_state();
            self.queue_next_action(side, registry, rng);
        }
        self.collect_events();
    }

    /// The action timer fired: execute whatever was queued.
    pub fn act(&mut self, side: CombatantSide, registry: &ContentRegistry, rng: &mut dyn CombatRng) {
        if !matches!(self.state, FightState::Active) {
            return;
        }
        match self.character(side).next_action {
            NextAction::Attack => {
                self.attack(side, registry, rng);
            }
            NextAction::Nothing => {
                let actor = self.character_mut(side);
                actor.turns_taken += 1;
                actor.reset_action_state();
                self.queue_next_action(side, registry, rng);
                self.collect_events();
            }
        }
    }

    /// Resolve one sub-hit of `side`'s queued attack. Returns the damage
    /// dealt, for callers that want a damage readout.
    pub fn attack(
        &mut self,
        side: CombatantSide,
        registry: &ContentRegistry,
        rng: &mut dyn CombatRng,
    ) -> f64 {
        if !matches!(self.state, FightState::Active) {
            return 0.0;
        }
        self.refresh_stats(registry);

        // Crowd control that landed after queueing turns the action into a pass
        if self.character(side).is_crowd_controlled(&self.constants) {
            let actor = self.character_mut(side);
            actor.turns_taken += 1;
            actor.reset_action_state();
            self.queue_next_action(side, registry, rng);
            self.collect_events();
            return 0.0;
        }

        let attack = match self
            .character(side)
            .queued_attack_id
            .as_deref()
            .and_then(|id| registry.attack(id))
        {
            Some(attack) => attack.clone(),
            None => {
                warn!(?side, "action fired with no resolvable attack; passing the turn");
                let actor = self.character_mut(side);
                actor.turns_taken += 1;
                actor.reset_action_state();
                self.queue_next_action(side, registry, rng);
                self.collect_events();
                return 0.0;
            }
        };

        let end_of_turn;
        let damage_dealt;
        {
            let Fight {
                attacker,
                defender,
                constants,
                events,
                ..
            } = self;
            let (actor, target) = match side {
                CombatantSide::Attacker => (attacker, defender),
                CombatantSide::Defender => (defender, attacker),
            };

            if actor.attack_count == 0 {
                begin_attack_turn(actor, target, &attack, registry, constants, events, rng);
            }

            // Mid-sequence, a consumed effect disappearing ends the attack
            let consumed_gone = actor.attack_count > 0
                && attack.consumes_effect.as_ref().is_some_and(|consumes| {
                    !target.active_effects.contains_key(&consumes.effect_id)
                });

            if consumed_gone {
                damage_dealt = 0.0;
            } else {
                damage_dealt = resolve_sub_hit(actor, target, &attack, registry, constants, rng);
                actor.attack_count += 1;
                actor.first_hit = false;
            }

            let total_hits = effective_hit_count(&attack, target);
            let sequence_over = consumed_gone
                || actor.attack_count >= total_hits
                || actor.attack_interrupted
                || actor.is_dead()
                || target.is_dead();

            if sequence_over {
                if let Some(consumes) = &attack.consumes_effect {
                    if target.active_effects.contains_key(&consumes.effect_id) {
                        target.remove_effect(&consumes.effect_id, registry);
                    }
                }
                actor.turns_taken += 1;
                actor.attack_count = 0;
                actor.is_attacking = false;
                actor.first_hit = true;
                actor.attack_interrupted = false;
                actor.queued_attack_id = None;
                end_of_turn = true;
            } else {
                if constants.timing.timed_actions {
                    actor.act_timer.start(actor.stats.peek().attack_interval_ms);
                    actor.render.attack_bar = true;
                }
                end_of_turn = false;
            }
        }

        self.check_deaths(side.opponent(), registry, rng);
        if end_of_turn && matches!(self.state, FightState::Active) {
            self.queue_next_action(side, registry, rng);
        }
        self.collect_events();
        damage_dealt
    }

    /// Advance every timer in the fight by `delta_ms` and resolve whatever
    /// fires: actions, effect durations, DOT damage, regeneration.
    pub fn tick(&mut self, delta_ms: f64, registry: &ContentRegistry, rng: &mut dyn CombatRng) {
        if !matches!(self.state, FightState::Active) {
            return;
        }

        for side in [CombatantSide::Attacker, CombatantSide::Defender] {
            if !matches!(self.state, FightState::Active) {
                break;
            }
            if self.character_mut(side).act_timer.tick(delta_ms) {
                self.act(side, registry, rng);
            }
        }

        for side in [CombatantSide::Attacker, CombatantSide::Defender] {
            if !matches!(self.state, FightState::Active) {
                break;
            }
            let buffer = self.constants.regen.buffer_per_damage;
            let owner = self.character_mut(side);
            let dots = owner.tick_effects(delta_ms, registry);
            for dot in dots {
                let resistance = owner.stats.peek().resistance(&dot.damage_type_id);
                let damage = (dot.damage * (1.0 - resistance / 100.0)).floor().max(0.0);
                if damage > 0.0 {
                    let hp_lost = owner.absorb_damage(damage, SplashType::Dot);
                    owner.buffered_regen += hp_lost * buffer;
                }
            }
            self.check_deaths(side, registry, rng);
        }

        for side in [CombatantSide::Attacker, CombatantSide::Defender] {
            if !matches!(self.state, FightState::Active) {
                break;
            }
            let interval = self.constants.regen.interval_ms;
            let fraction = self.constants.regen.fraction_per_tick;
            let owner = self.character_mut(side);
            if owner.regen_timer.tick(delta_ms) {
                let max = owner.stats.peek().max_hitpoints;
                let amount = (owner.buffered_regen + max * fraction).floor();
                owner.buffered_regen = 0.0;
                if amount > 0.0 {
                    let healed = owner.heal(amount);
                    if healed > 0.0 {
                        owner.events.push(CombatEvent::Splash {
                            side: owner.side,
                            splash: SplashType::Regen,
                            amount: healed,
                        });
                    }
                }
                owner.regen_timer.start(interval);
            }
        }

        self.refresh_stats(registry);
        self.collect_events();
    }

    /// Check for deaths, giving `first` the chance to die (and rebirth)
    /// before its opponent. Finishes the fight when a death sticks.
    fn check_deaths(
        &mut self,
        first: CombatantSide,
        registry: &ContentRegistry,
        rng: &mut dyn CombatRng,
    ) {
        for side in [first, first.opponent()] {
            if !matches!(self.state, FightState::Active) {
                return;
            }
            if !self.character(side).is_dead() {
                continue;
            }
            {
                let Fight {
                    attacker,
                    defender,
                    constants,
                    ..
                } = self;
                let (dying, opponent) = match side {
                    CombatantSide::Attacker => (attacker, defender),
                    CombatantSide::Defender => (defender, attacker),
                };
                try_rebirth(dying, opponent, registry, constants, rng);
            }
            if self.character(side).is_dead() {
                debug!(?side, "character died; fight over");
                self.state = FightState::Finished {
                    winner: side.opponent(),
                };
                self.events.push(CombatEvent::Died { side });
                self.attacker.act_timer.stop();
                self.attacker.regen_timer.stop();
                self.defender.act_timer.stop();
                self.defender.regen_timer.stop();
            }
        }
    }

    fn collect_events(&mut self) {
        self.events.extend(self.attacker.take_events());
        self.events.extend(self.defender.take_events());
    }

    /// Hand every queued event to the embedder
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }
}

/// Number of sub-hits this attack will make against `target` right now.
/// A consumed effect extends the attack's base count by its parameter.
fn effective_hit_count(attack: &AttackDef, target: &Character) -> u32 {
    match &attack.consumes_effect {
        Some(consumes) => target
            .active_effects
            .get(&consumes.effect_id)
            .and_then(|effect| effect.param(&consumes.param))
            .map(|extra| attack.attack_count + extra.max(0.0) as u32)
            .unwrap_or(attack.attack_count),
        None => attack.attack_count,
    }
    .max(1)
}

/// True when a special attack would do nothing but refresh effects that
/// are already running on their recipients
fn attack_only_reapplies(attack: &AttackDef, actor: &Character, opponent: &Character) -> bool {
    let applicators: Vec<&EffectApplicator> = attack
        .prehit_effects
        .iter()
        .chain(attack.onhit_effects.iter())
        .collect();
    if applicators.is_empty() {
        return false;
    }
    applicators.iter().all(|applicator| {
        let recipient = match applicator.target {
            crate::effect::ApplicatorTarget::Own => actor,
            crate::effect::ApplicatorTarget::Target => opponent,
        };
        recipient.active_effects.contains_key(&applicator.effect_id)
    })
}

/// Turn-start work: pre-attack triggers, curses, first-attack self damage
fn begin_attack_turn(
    actor: &mut Character,
    target: &mut Character,
    attack: &AttackDef,
    registry: &ContentRegistry,
    constants: &GameConstants,
    events: &mut Vec<CombatEvent>,
    rng: &mut dyn CombatRng,
) {
    actor.is_attacking = true;
    actor.first_hit = true;
    actor.first_miss = true;
    events.push(CombatEvent::AttackStarted {
        side: actor.side,
        attack_id: attack.id.clone(),
    });

    let query = ModifierQuery::any();
    if actor.turns_taken == 0 {
        let percent = actor
            .modifiers
            .get_value(ModifierKind::SelfDamageFirstAttackPercent, &query);
        if percent > 0.0 {
            let max = actor.stats.peek().max_hitpoints;
            let damage = (max * percent / 100.0).floor();
            actor.absorb_damage(damage, SplashType::Attack);
        }
    }

    // Curses ride along with magic attacks and are blocked by barriers
    if actor.attack_type == AttackType::Magic {
        if let Some(curse_id) = actor.curse_id.clone() {
            match registry.spell(&curse_id).and_then(|s| s.curse_effect.as_deref()) {
                Some(effect_id) => {
                    if !target.has_barrier() {
                        if let Some(def) = registry.effect(effect_id) {
                            target.apply_effect(def, registry, &BTreeMap::new(), rng);
                        } else {
                            warn!(curse = %curse_id, effect = %effect_id, "curse effect is not registered");
                        }
                    }
                }
                None => {
                    warn!(curse = %curse_id, "selected curse is not a curse spell");
                }
            }
        }
    }

    actor.queue_trigger(EffectTrigger::PreAttack, TriggerContext::default());
    for applicator in &attack.prehit_effects {
        process_applicator(actor, target, applicator, &TriggerContext::default(), registry, constants, rng);
    }
    process_queue(actor, target, registry, constants, rng);
}

/// Resolve one sub-hit end to end: hit roll, damage pipeline, on-hit
/// extras, triggers. Returns the damage dealt (0 on a miss).
fn resolve_sub_hit(
    actor: &mut Character,
    target: &mut Character,
    attack: &AttackDef,
    registry: &ContentRegistry,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) -> f64 {
    target.queue_trigger(EffectTrigger::BeingAttacked, TriggerContext::default());
    process_queue(target, actor, registry, constants, rng);

    // A target whose damage type is immune to the attacker's cannot be hit
    let immune = registry
        .damage_type(&target.damage_type_id)
        .is_some_and(|def| def.is_immune_to(&actor.damage_type_id));

    let dealt = if !immune && resolve_hit(actor, target, attack, rng) {
        let damage = resolve_hit_damage(actor, target, attack, constants, rng);
        apply_hit(actor, target, attack, damage, registry, constants, rng);
        damage.0
    } else {
        target.events.push(CombatEvent::Splash {
            side: target.side,
            splash: if immune {
                SplashType::Immune
            } else {
                SplashType::Miss
            },
            amount: 0.0,
        });
        actor.queue_trigger(EffectTrigger::MissedWithAttack, TriggerContext::default());
        if actor.first_miss {
            actor.first_miss = false;
            let percent = actor
                .modifiers
                .get_value(ModifierKind::SelfDamageFirstMissPercent, &ModifierQuery::any());
            if percent > 0.0 {
                let max = actor.stats.peek().max_hitpoints;
                let damage = (max * percent / 100.0).floor();
                actor.absorb_damage(damage, SplashType::Attack);
            }
        }
        0.0
    };

    process_queue(actor, target, registry, constants, rng);
    process_queue(target, actor, registry, constants, rng);
    dealt
}

/// The hit resolution chain, checked strictly in order: immunities,
/// full protection, dodge, guaranteed hits, then the accuracy rolls.
fn resolve_hit(
    actor: &Character,
    target: &Character,
    attack: &AttackDef,
    rng: &mut dyn CombatRng,
) -> bool {
    let any = ModifierQuery::any();
    let style = ModifierQuery::any().with_attack_type(actor.attack_type);

    if target
        .modifiers
        .is_active(ModifierKind::AttackTypeImmunity, &style)
    {
        return false;
    }
    if actor.attack_type != target.attack_type
        && target
            .modifiers
            .is_active(ModifierKind::OtherStyleImmunity, &any)
    {
        return false;
    }
    if target.modifiers.get_value(ModifierKind::Protection, &style) >= 100.0 {
        return false;
    }
    let dodge = target.modifiers.get_value(ModifierKind::DodgeChance, &any);
    if dodge > 0.0 && rng.roll_percentage(dodge) {
        return false;
    }

    let chance = actor.stats.peek().hit_chance;
    if attack.cant_miss && chance >= attack.min_accuracy {
        return true;
    }
    if actor.modifiers.is_active(ModifierKind::CantMiss, &any) {
        return true;
    }
    if target.modifiers.is_active(ModifierKind::CantEvade, &any) {
        return true;
    }

    // At most one bonus accuracy roll, no matter how the modifier stacks
    let rolls = (1 + actor.modifiers.get_value(ModifierKind::ExtraHitRolls, &any) as u32).min(2);
    for _ in 0..rolls {
        if rng.roll_percentage(chance) {
            return true;
        }
    }

    let convert = actor
        .modifiers
        .get_value(ModifierKind::ConvertMissToHitChance, &any);
    convert > 0.0 && rng.roll_percentage(convert)
}

/// The per-hit damage pipeline: base roll, flat bonuses, crit, percent
/// modifiers, resistance, floor. Returns `(damage, was_crit)`.
fn resolve_hit_damage(
    actor: &Character,
    target: &Character,
    attack: &AttackDef,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) -> (f64, bool) {
    let k = constants.balance.number_multiplier;
    let any = ModifierQuery::any();
    let stats = actor.stats.peek();
    let inputs = DamageRollInputs {
        min_hit: stats.min_hit,
        max_hit: stats.max_hit,
        target_current_hp: target.hitpoints,
        number_multiplier: k,
    };
    let mut damage = attack.roll_damage(actor.attack_count, &inputs, rng);

    // Flat bonuses; the max-HP-derived one is capped
    damage += actor.modifiers.get_value(ModifierKind::FlatDamageBonus, &any) * k;
    let hp_percent = actor
        .modifiers
        .get_value(ModifierKind::DamageFromMaxHpPercent, &any);
    if hp_percent > 0.0 {
        let bonus = (stats.max_hitpoints * hp_percent / 100.0)
            .min(constants.balance.hp_damage_bonus_cap);
        damage += bonus;
    }

    // Crit
    let crit_chance = actor.modifiers.get_value(ModifierKind::CritChance, &any);
    let was_crit = crit_chance > 0.0 && rng.roll_percentage(crit_chance);
    if was_crit {
        let bonus = constants.crit.bonus_percent
            + actor.modifiers.get_value(ModifierKind::CritBonusPercent, &any);
        damage = apply_modifier(damage, bonus);
    }

    // Percent modifiers: dealt (actor side) and taken (target side)
    let dealt_query = ModifierQuery::any()
        .with_attack_type(actor.attack_type)
        .with_damage_type(actor.damage_type_id.as_str());
    let mut percent = actor
        .modifiers
        .get_value(ModifierKind::DamageDealtPercent, &dealt_query)
        + target
            .modifiers
            .get_value(ModifierKind::DamageTakenPercent, &dealt_query);
    let per_effect = actor
        .modifiers
        .get_value(ModifierKind::DamageDealtPerEffectPercent, &any);
    if per_effect != 0.0 {
        percent += per_effect * target.active_effects.len() as f64;
    }
    if attack.is_dragonbreath {
        percent += target
            .modifiers
            .get_value(ModifierKind::DragonbreathDamagePercent, &any);
    }
    damage = apply_modifier(damage, percent);

    // Resistance last, then floor
    let resistance = target.stats.peek().resistance(&actor.damage_type_id);
    damage *= 1.0 - resistance / 100.0;
    (damage.floor().max(0.0), was_crit)
}

/// Apply one landed hit: healing-when-hit, barrier/HP routing, lifesteal,
/// first-sub-hit extras, regen buffering, on-hit applicators and triggers.
fn apply_hit(
    actor: &mut Character,
    target: &mut Character,
    attack: &AttackDef,
    damage: (f64, bool),
    registry: &ContentRegistry,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) {
    let (damage, was_crit) = damage;
    let k = constants.balance.number_multiplier;
    let any = ModifierQuery::any();

    // The target's healing-when-hit lands before the damage does
    let heal_flat = target
        .modifiers
        .get_value(ModifierKind::HealingWhenHitFlat, &any)
        * k;
    if heal_flat > 0.0 {
        let healed = target.heal(heal_flat);
        if healed > 0.0 {
            target.events.push(CombatEvent::Splash {
                side: target.side,
                splash: SplashType::Heal,
                amount: healed,
            });
        }
    }

    let splash = if was_crit {
        SplashType::Crit
    } else {
        SplashType::Attack
    };
    let hp_lost = target.absorb_damage(damage, splash);

    // Lifesteal heals from damage dealt, barrier included
    let lifesteal = actor.modifiers.get_value(ModifierKind::LifestealPercent, &any);
    if lifesteal > 0.0 && damage > 0.0 {
        let healed = actor.heal((damage * lifesteal / 100.0).floor());
        if healed > 0.0 {
            actor.events.push(CombatEvent::Splash {
                side: actor.side,
                splash: SplashType::Heal,
                amount: healed,
            });
        }
    }

    // First-sub-hit extras
    if actor.first_hit {
        let mut reflect = target.modifiers.get_value(ModifierKind::ReflectPercent, &any)
            * damage
            / 100.0
            + target.modifiers.get_value(ModifierKind::ReflectFlat, &any) * k;
        let reflect_random = target
            .modifiers
            .get_value(ModifierKind::ReflectRandomFlat, &any);
        if reflect_random > 0.0 {
            reflect += rng.roll_integer(0, (reflect_random * k) as i64) as f64;
        }
        if reflect > 0.0 {
            // Reflected damage respects the attacker's own resistance and
            // never finishes the attacker off
            let resistance = actor.stats.peek().resistance(&target.damage_type_id);
            let reflect = (reflect * (1.0 - resistance / 100.0))
                .floor()
                .min((actor.hitpoints - 1.0).max(0.0));
            if reflect > 0.0 {
                actor.absorb_damage(reflect, SplashType::Reflect);
            }
        }

        let self_hit = actor
            .modifiers
            .get_value(ModifierKind::SelfHitPercentMaxHp, &any);
        if self_hit > 0.0 {
            let amount = (actor.stats.peek().max_hitpoints * self_hit / 100.0).floor();
            actor.absorb_damage(amount, SplashType::Attack);
        }
        let drain = actor
            .modifiers
            .get_value(ModifierKind::BarrierDrainFlat, &any);
        if drain > 0.0 && target.has_barrier() {
            target.remove_barrier(drain * k);
        }
    }

    let self_flat = actor
        .modifiers
        .get_value(ModifierKind::SelfDamageOnHitFlat, &any);
    if self_flat > 0.0 {
        actor.absorb_damage(self_flat * k, SplashType::Attack);
    }

    target.buffered_regen += hp_lost * constants.regen.buffer_per_damage;

    let hit_ctx = TriggerContext {
        damage_dealt: damage,
        damage_taken: 0.0,
    };
    let taken_ctx = TriggerContext {
        damage_dealt: 0.0,
        damage_taken: damage,
    };
    for applicator in &attack.onhit_effects {
        process_applicator(actor, target, applicator, &hit_ctx, registry, constants, rng);
    }
    actor.queue_trigger(EffectTrigger::HitWithAttack, hit_ctx);
    target.queue_trigger(EffectTrigger::HitByAttack, taken_ctx);
}

/// Drain `owner`'s pending trigger queue, rolling every applicator
/// registered for each trigger. Applications may queue further triggers;
/// those are processed too.
fn process_queue(
    owner: &mut Character,
    opponent: &mut Character,
    registry: &ContentRegistry,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) {
    while let Some(pending) = owner.pending_triggers.pop_front() {
        let applicators: Vec<EffectApplicator> =
            owner.applicators.for_trigger(pending.trigger).to_vec();
        for applicator in &applicators {
            process_applicator(owner, opponent, applicator, &pending.ctx, registry, constants, rng);
        }
    }
}

/// Roll one applicator and, if it passes, apply its effect to the right
/// character. Barriers block hostile applications unless bypassed; a
/// landed crowd-control effect interrupts whatever the victim was doing.
fn process_applicator(
    owner: &mut Character,
    opponent: &mut Character,
    applicator: &EffectApplicator,
    ctx: &TriggerContext,
    registry: &ContentRegistry,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) {
    let chance = applicator.chance_to_apply(ctx, &owner.values());
    if chance <= 0.0 {
        return;
    }
    if chance < 100.0 && !rng.roll_percentage(chance) {
        return;
    }

    let owner_attack_type = owner.attack_type;
    let owner_damage_type = owner.damage_type_id.clone();
    let hostile = applicator.target == crate::effect::ApplicatorTarget::Target;
    let recipient = if hostile { opponent } else { owner };
    if hostile {
        if recipient.has_barrier() && !applicator.bypass_barrier {
            return;
        }
        // Immunity gates mirror the hit resolution chain
        if registry
            .damage_type(&recipient.damage_type_id)
            .is_some_and(|def| def.is_immune_to(&owner_damage_type))
        {
            return;
        }
        let style = ModifierQuery::any().with_attack_type(owner_attack_type);
        if recipient
            .modifiers
            .is_active(ModifierKind::AttackTypeImmunity, &style)
        {
            return;
        }
        if owner_attack_type != recipient.attack_type
            && recipient
                .modifiers
                .is_active(ModifierKind::OtherStyleImmunity, &ModifierQuery::any())
        {
            return;
        }
    }

    let Some(def) = registry.effect(&applicator.effect_id) else {
        warn!(effect = %applicator.effect_id, "applicator references unknown effect");
        return;
    };
    let landed = recipient.apply_effect(def, registry, &applicator.initial_params, rng);
    if landed
        && def
            .groups
            .iter()
            .any(|group| constants.balance.crowd_control_groups.contains(group))
        && recipient.is_attacking
    {
        recipient.attack_interrupted = true;
        recipient.events.push(CombatEvent::AttackInterrupted {
            side: recipient.side,
        });
    }
}

/// Give a dying character its rebirth window: fire the Rebirth trigger
/// and, if a landed effect carries a `revive_percent` parameter, restore
/// that fraction of max hitpoints. The parameter is consumed so a single
/// effect revives at most once.
fn try_rebirth(
    dying: &mut Character,
    opponent: &mut Character,
    registry: &ContentRegistry,
    constants: &GameConstants,
    rng: &mut dyn CombatRng,
) {
    dying.queue_trigger(EffectTrigger::Rebirth, TriggerContext::default());
    process_queue(dying, opponent, registry, constants, rng);

    let mut revive_percent = 0.0f64;
    for effect in dying.active_effects.values_mut() {
        if let Some(percent) = effect.params.remove("revive_percent") {
            revive_percent = revive_percent.max(percent);
        }
    }
    if revive_percent > 0.0 && dying.is_dead() {
        let max = dying.stats.peek().max_hitpoints;
        dying.hitpoints = (max * revive_percent / 100.0).floor().max(1.0);
        dying.render.hitpoints = true;
        dying.events.push(CombatEvent::Splash {
            side: dying.side,
            splash: SplashType::Heal,
            amount: dying.hitpoints,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::SkillLevels;
    use crate::effect::{ApplicatorTarget, EffectApplicator};
    use crate::modifier::ModifierEntry;
    use crate::rng::{FixedRng, GameRng};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn fixture() -> (Fight, ContentRegistry) {
        let registry = ContentRegistry::with_defaults();
        let attacker = Character::new("alice").with_levels(SkillLevels::uniform(10));
        let defender = Character::new("bob").with_levels(SkillLevels::uniform(10));
        let fight = Fight::new(attacker, defender, GameConstants::default());
        (fight, registry)
    }

    #[test]
    fn test_start_queues_both_sides() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        assert_eq!(fight.state, FightState::Active);
        assert!(fight.attacker.act_timer.is_running());
        assert!(fight.defender.act_timer.is_running());
        assert_eq!(fight.attacker.next_action, NextAction::Attack);
        assert_eq!(
            fight.attacker.queued_attack_id.as_deref(),
            Some("core:melee_attack")
        );
        // Both sides see the same pair, so hit chance is symmetric here
        assert!((fight.attacker.stats.peek().hit_chance - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_deals_damage_and_buffers_regen() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let hp_before = fight.defender.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // FixedRng rolls the minimum damage: min hit = 1
        assert!((hp_before - fight.defender.hitpoints - 1.0).abs() < f64::EPSILON);
        assert!((fight.defender.buffered_regen - 0.25).abs() < f64::EPSILON);
        assert_eq!(fight.attacker.turns_taken, 1);
        let events = fight.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::Splash {
                splash: SplashType::Attack,
                ..
            }
        )));
    }

    #[test]
    fn test_miss_leaves_target_untouched() {
        let (mut fight, registry) = fixture();
        let mut start_rng = FixedRng::always_hit();
        fight.start(&registry, &mut start_rng);
        let hp_before = fight.defender.hitpoints;
        let mut rng = FixedRng::never_hit();
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!((fight.defender.hitpoints - hp_before).abs() < f64::EPSILON);
        assert!(!fight.attacker.first_miss);
        let events = fight.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::Splash {
                splash: SplashType::Miss,
                ..
            }
        )));
    }

    #[test]
    fn test_barrier_absorbs_hit() {
        let (mut fight, registry) = fixture();
        fight.defender.equipment.barrier_bonus = 5.0;
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        assert!((fight.defender.barrier - 50.0).abs() < f64::EPSILON);
        let hp_before = fight.defender.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!((fight.defender.hitpoints - hp_before).abs() < f64::EPSILON);
        assert!((fight.defender.barrier - 49.0).abs() < f64::EPSILON);
        // Barrier damage buffers no regen
        assert!(fight.defender.buffered_regen.abs() < f64::EPSILON);
    }

    #[test]
    fn test_multi_hit_sequence_runs_to_completion() {
        let (mut fight, registry) = fixture();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:double_slash", 1)];
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        assert_eq!(
            fight.attacker.queued_attack_id.as_deref(),
            Some("core:double_slash")
        );
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // One sub-hit down, still this character's turn
        assert_eq!(fight.attacker.attack_count, 1);
        assert!(fight.attacker.is_attacking);
        assert_eq!(fight.attacker.turns_taken, 0);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.attacker.attack_count, 0);
        assert!(!fight.attacker.is_attacking);
        assert_eq!(fight.attacker.turns_taken, 1);
    }

    #[test]
    fn test_crowd_control_passes_the_turn() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let stun = registry.effect("core:stun").unwrap().clone();
        let mut quiet = FixedRng::never_hit();
        fight.defender.apply_effect(&stun, &registry, &BTreeMap::new(), &mut quiet);
        let hp_before = fight.attacker.hitpoints;
        fight.act(CombatantSide::Defender, &registry, &mut rng);
        assert!((fight.attacker.hitpoints - hp_before).abs() < f64::EPSILON);
        assert_eq!(fight.defender.turns_taken, 1);
        assert_eq!(fight.defender.next_action, NextAction::Nothing);
    }

    #[test]
    fn test_cant_attack_queues_nothing() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.attacker.modifiers.add_source(
            "test:pacifism",
            vec![ModifierEntry::new(ModifierKind::CantAttack, 1.0)],
        );
        fight.queue_next_action(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.attacker.next_action, NextAction::Nothing);
    }

    #[test]
    fn test_onhit_stun_interrupts_target() {
        let (mut fight, registry) = fixture();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:crushing_blow", 1)];
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        // Put the defender mid-sequence so the interrupt is observable
        fight.defender.is_attacking = true;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!(fight.defender.effect_groups.is_active("core:stun"));
        assert!(fight.defender.attack_interrupted);
    }

    #[test]
    fn test_barrier_blocks_hostile_effects() {
        let (mut fight, registry) = fixture();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:crushing_blow", 1)];
        fight.defender.equipment.barrier_bonus = 50.0;
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!(!fight.defender.effect_groups.is_active("core:stun"));
    }

    #[test]
    fn test_protection_forces_miss() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.defender.modifiers.add_source(
            "test:melee_protect",
            vec![ModifierEntry::scoped(
                ModifierKind::Protection,
                100.0,
                crate::modifier::ModifierScope::for_attack_type(AttackType::Melee),
            )],
        );
        let hp_before = fight.defender.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!((fight.defender.hitpoints - hp_before).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reflect_cannot_kill() {
        let (mut fight, registry) = fixture();
        fight.defender.modifiers.add_source(
            "test:thorns",
            vec![ModifierEntry::new(ModifierKind::ReflectFlat, 1_000.0)],
        );
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // Reflect of 10000 would overkill; the attacker survives on 1 HP
        assert!((fight.attacker.hitpoints - 1.0).abs() < f64::EPSILON);
        assert!(!fight.is_over());
    }

    #[test]
    fn test_lethal_hit_ends_fight() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.defender.hitpoints = 1.0;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(
            fight.winner(),
            Some(CombatantSide::Attacker),
        );
        assert!(!fight.attacker.act_timer.is_running());
        let events = fight.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::Died {
                side: CombatantSide::Defender
            }
        )));
    }

    #[test]
    fn test_rebirth_revives_once() {
        let (mut fight, registry) = fixture();
        let mut registry = registry;
        registry.register_effect_group(crate::content::EffectGroupDef::new(
            "test:reborn",
            "Reborn",
        ));
        let mut phoenix = crate::content::CombatEffectDef::new("test:phoenix", "Phoenix")
            .in_group("test:reborn")
            .lasting_ms(5000.0);
        phoenix
            .initial_params
            .insert("revive_percent".to_string(), 50.0);
        registry.register_effect(phoenix);
        fight.defender.applicators.merge(
            &EffectApplicator::guaranteed(EffectTrigger::Rebirth, "test:phoenix")
                .targeting(ApplicatorTarget::Own),
            1.0,
        );
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.defender.hitpoints = 1.0;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!(!fight.is_over());
        assert!((fight.defender.hitpoints - 500.0).abs() < f64::EPSILON);
        // Second death: the parameter was consumed, no second revive
        fight.defender.hitpoints = 1.0;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.winner(), Some(CombatantSide::Attacker));
    }

    #[test]
    fn test_dot_damage_respects_resistance_and_can_kill() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::never_hit();
        fight.start(&registry, &mut rng);
        // Park both action timers far away so only effects tick
        fight.attacker.act_timer.start(1_000_000.0);
        fight.defender.act_timer.start(1_000_000.0);
        let burn = registry.effect("core:burn").unwrap().clone();
        fight
            .defender
            .apply_effect(&burn, &registry, &BTreeMap::new(), &mut rng);
        fight.defender.equipment.resistances.insert("core:normal".to_string(), 50.0);
        fight.defender.stats.invalidate();
        fight.refresh_stats(&registry);
        let hp_before = fight.defender.hitpoints;
        fight.tick(1000.0, &registry, &mut rng);
        // Two 10-damage ticks at 50% resistance
        assert!((hp_before - fight.defender.hitpoints - 10.0).abs() < f64::EPSILON);
        fight.defender.hitpoints = 3.0;
        fight.tick(500.0, &registry, &mut rng);
        assert_eq!(fight.winner(), Some(CombatantSide::Attacker));
    }

    #[test]
    fn test_regen_pays_out_buffer() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::never_hit();
        fight.start(&registry, &mut rng);
        fight.attacker.act_timer.start(1_000_000.0);
        fight.defender.act_timer.start(1_000_000.0);
        fight.defender.remove_hitpoints(400.0);
        fight.defender.buffered_regen = 100.0;
        fight.tick(10_000.0, &registry, &mut rng);
        // 100 buffered + 1% of 1000 max
        assert!((fight.defender.hitpoints - 710.0).abs() < f64::EPSILON);
        assert!(fight.defender.buffered_regen.abs() < f64::EPSILON);
        assert!(fight.defender.regen_timer.is_running());
    }

    #[test]
    fn test_consuming_attack_reads_and_removes_mark() {
        let (mut fight, registry) = fixture();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:frenzy", 1)];
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let mark = registry.effect("core:mark").unwrap().clone();
        let mut quiet = FixedRng::never_hit();
        fight
            .defender
            .apply_effect(&mark, &registry, &BTreeMap::new(), &mut quiet);
        // Mark grants 2 extra sub-hits on top of frenzy's base 1
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.attacker.attack_count, 1);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.attacker.attack_count, 2);
        assert!(fight.defender.active_effects.contains_key("core:mark"));
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert_eq!(fight.attacker.turns_taken, 1);
        assert!(!fight.defender.active_effects.contains_key("core:mark"));
    }

    #[test]
    fn test_reflect_reduced_by_attacker_resistance() {
        let (mut fight, registry) = fixture();
        fight.defender.modifiers.add_source(
            "test:thorns",
            vec![ModifierEntry::new(ModifierKind::ReflectFlat, 10.0)],
        );
        fight
            .attacker
            .equipment
            .resistances
            .insert("core:normal".to_string(), 50.0);
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let hp_before = fight.attacker.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // 10 * K = 100 reflected, halved by 50% resistance
        assert!((hp_before - fight.attacker.hitpoints - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_immune_target_blocks_hostile_applicators() {
        let (mut fight, registry) = fixture();
        let mut registry = registry;
        let mut shout = crate::content::AttackDef::normal("test:war_shout", "War Shout");
        shout.prehit_effects = vec![EffectApplicator::new(
            EffectTrigger::PreAttack,
            "core:stun",
            100.0,
        )];
        registry.register_attack(shout);
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("test:war_shout", 1)];
        fight.defender.modifiers.add_source(
            "test:melee_ward",
            vec![ModifierEntry::scoped(
                ModifierKind::AttackTypeImmunity,
                1.0,
                crate::modifier::ModifierScope::for_attack_type(AttackType::Melee),
            )],
        );
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!(!fight.defender.effect_groups.is_active("core:stun"));
    }

    #[test]
    fn test_damage_type_immunity_auto_misses() {
        let (mut fight, registry) = fixture();
        let mut registry = registry;
        registry.register_damage_type(crate::content::DamageTypeDef {
            id: "test:holy".to_string(),
            name: "Holy".to_string(),
            resistance_cap: 95.0,
            immune_to: vec!["core:normal".to_string()],
        });
        fight.defender.damage_type_id = "test:holy".to_string();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:crushing_blow", 1)];
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let hp_before = fight.defender.hitpoints;
        let dealt = fight.attack(CombatantSide::Attacker, &registry, &mut rng);
        assert!(dealt.abs() < f64::EPSILON);
        assert!((fight.defender.hitpoints - hp_before).abs() < f64::EPSILON);
        assert!(!fight.defender.effect_groups.is_active("core:stun"));
        let events = fight.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::Splash {
                splash: SplashType::Immune,
                ..
            }
        )));
    }

    #[test]
    fn test_self_damage_on_hit_applies_every_sub_hit() {
        let (mut fight, registry) = fixture();
        fight.attacker.available_attacks =
            vec![crate::character::AttackSelection::new("core:double_slash", 1)];
        fight.attacker.modifiers.add_source(
            "test:cursed_blade",
            vec![ModifierEntry::new(ModifierKind::SelfDamageOnHitFlat, 1.0)],
        );
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let hp_start = fight.attacker.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // 1 * K = 10 self damage per landed sub-hit
        assert!((hp_start - fight.attacker.hitpoints - 10.0).abs() < f64::EPSILON);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!((hp_start - fight.attacker.hitpoints - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_interrupt_outside_attack_requeues() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        fight.attacker.act_timer.stop();
        fight.interrupt_action(CombatantSide::Attacker, &registry, &mut rng);
        assert!(fight.attacker.act_timer.is_running());
        assert_eq!(fight.attacker.next_action, NextAction::Attack);
        assert!(fight.attacker.queued_attack_id.is_some());
    }

    #[test]
    fn test_attack_returns_damage_dealt() {
        let (mut fight, registry) = fixture();
        let mut rng = FixedRng::always_hit();
        fight.start(&registry, &mut rng);
        let dealt = fight.attack(CombatantSide::Attacker, &registry, &mut rng);
        // FixedRng rolls the minimum damage: min hit = 1
        assert!((dealt - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_miss_self_damage_each_turn() {
        let (mut fight, registry) = fixture();
        fight.attacker.modifiers.add_source(
            "test:recoil",
            vec![ModifierEntry::new(
                ModifierKind::SelfDamageFirstMissPercent,
                10.0,
            )],
        );
        let mut start_rng = FixedRng::always_hit();
        fight.start(&registry, &mut start_rng);
        let mut rng = FixedRng::never_hit();
        let hp_start = fight.attacker.hitpoints;
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        // 10% of 1000 max hitpoints on the turn's first miss
        assert!((hp_start - fight.attacker.hitpoints - 100.0).abs() < f64::EPSILON);
        fight.act(CombatantSide::Attacker, &registry, &mut rng);
        assert!((hp_start - fight.attacker.hitpoints - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seeded_fight_is_deterministic() {
        let run = |seed: u64| {
            let (mut fight, registry) = fixture();
            let mut rng = GameRng(ChaCha8Rng::seed_from_u64(seed));
            fight.start(&registry, &mut rng);
            let mut ticks = 0u32;
            while !fight.is_over() && ticks < 100_000 {
                fight.tick(100.0, &registry, &mut rng);
                ticks += 1;
            }
            (fight.winner(), fight.attacker.hitpoints, fight.defender.hitpoints)
        };
        let first = run(7);
        let second = run(7);
        assert!(first.0.is_some(), "fight should finish");
        assert_eq!(first, second);
    }
}
