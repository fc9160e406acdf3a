//! Content registry - read-only lookup of attacks, effects, damage types,
//! effect groups, and spells by namespaced id
//!
//! The registry is built by the embedder (from TOML packs or code) and
//! passed to the engine by shared reference; the engine never mutates it.

mod attack;
mod damage_type;
mod effect;
mod spell;

pub use attack::{AttackDef, ConsumesEffect, DamageRoll, DamageRollInputs, DamageRollKind};
pub use damage_type::DamageTypeDef;
pub use effect::{CombatEffectDef, DotSpec, EffectGroupDef, ReapplyBehavior};
pub use spell::SpellDef;

use crate::config::ConfigError;
use crate::effect::{EffectApplicator, EffectTrigger};
use crate::modifier::{ModifierEntry, ModifierKind};
use crate::types::AttackType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Serialized form of a content pack (TOML)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub damage_types: Vec<DamageTypeDef>,
    #[serde(default)]
    pub effect_groups: Vec<EffectGroupDef>,
    #[serde(default)]
    pub effects: Vec<CombatEffectDef>,
    #[serde(default)]
    pub attacks: Vec<AttackDef>,
    #[serde(default)]
    pub spells: Vec<SpellDef>,
    /// Default "normal attack" per attack type
    #[serde(default)]
    pub default_attacks: BTreeMap<AttackType, String>,
}

/// Read-only content lookup by namespaced id
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    damage_types: HashMap<String, DamageTypeDef>,
    effect_groups: HashMap<String, EffectGroupDef>,
    effects: HashMap<String, CombatEffectDef>,
    attacks: HashMap<String, AttackDef>,
    spells: HashMap<String, SpellDef>,
    default_attacks: HashMap<AttackType, String>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        ContentRegistry::default()
    }

    /// Build a registry from a deserialized pack
    pub fn from_pack(pack: ContentPack) -> Self {
        let mut registry = ContentRegistry::new();
        for def in pack.damage_types {
            registry.register_damage_type(def);
        }
        for def in pack.effect_groups {
            registry.register_effect_group(def);
        }
        for def in pack.effects {
            registry.register_effect(def);
        }
        for def in pack.attacks {
            registry.register_attack(def);
        }
        for def in pack.spells {
            registry.register_spell(def);
        }
        for (attack_type, id) in pack.default_attacks {
            registry.set_default_attack(attack_type, id);
        }
        registry
    }

    /// Load a registry from a TOML content pack
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let pack: ContentPack = crate::config::load_toml(path)?;
        Ok(Self::from_pack(pack))
    }

    // === Registration ===

    pub fn register_damage_type(&mut self, def: DamageTypeDef) {
        self.damage_types.insert(def.id.clone(), def);
    }

    pub fn register_effect_group(&mut self, def: EffectGroupDef) {
        self.effect_groups.insert(def.id.clone(), def);
    }

    pub fn register_effect(&mut self, def: CombatEffectDef) {
        self.effects.insert(def.id.clone(), def);
    }

    pub fn register_attack(&mut self, def: AttackDef) {
        self.attacks.insert(def.id.clone(), def);
    }

    pub fn register_spell(&mut self, def: SpellDef) {
        self.spells.insert(def.id.clone(), def);
    }

    pub fn set_default_attack(&mut self, attack_type: AttackType, id: impl Into<String>) {
        self.default_attacks.insert(attack_type, id.into());
    }

    // === Lookup ===

    pub fn damage_type(&self, id: &str) -> Option<&DamageTypeDef> {
        self.damage_types.get(id)
    }

    pub fn effect_group(&self, id: &str) -> Option<&EffectGroupDef> {
        self.effect_groups.get(id)
    }

    pub fn effect(&self, id: &str) -> Option<&CombatEffectDef> {
        self.effects.get(id)
    }

    pub fn attack(&self, id: &str) -> Option<&AttackDef> {
        self.attacks.get(id)
    }

    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.get(id)
    }

    /// The default "normal attack" for an attack type
    pub fn default_attack(&self, attack_type: AttackType) -> Option<&AttackDef> {
        let id = self.default_attacks.get(&attack_type)?;
        self.attacks.get(id)
    }

    pub fn damage_type_ids(&self) -> impl Iterator<Item = &str> {
        self.damage_types.keys().map(String::as_str)
    }

    /// Curated default content used by tests and the example fight
    pub fn with_defaults() -> Self {
        let mut registry = ContentRegistry::new();

        // Damage types
        registry.register_damage_type(DamageTypeDef::new("core:normal", "Normal"));
        registry.register_damage_type(DamageTypeDef::new("core:abyssal", "Abyssal"));

        // Effect groups
        registry.register_effect_group(EffectGroupDef::new("core:burn_dot", "Burn"));
        registry.register_effect_group(EffectGroupDef::new("core:stun", "Stun"));
        registry.register_effect_group(
            EffectGroupDef::new("core:sleep", "Sleep").with_modifier(ModifierEntry::new(
                ModifierKind::EvasionPercent,
                -25.0,
            )),
        );
        registry.register_effect_group(EffectGroupDef::new("core:curse", "Curse"));
        registry.register_effect_group(EffectGroupDef::new("core:mark", "Mark"));

        // Effects
        let mut burn = CombatEffectDef::new("core:burn", "Burn")
            .in_group("core:burn_dot")
            .lasting_ms(5000.0);
        burn.initial_params.insert("burn_damage".to_string(), 10.0);
        burn.dot = Some(DotSpec {
            interval_ms: 500.0,
            damage_param: "burn_damage".to_string(),
            damage_type: "core:normal".to_string(),
        });
        registry.register_effect(burn);

        registry.register_effect(
            CombatEffectDef::new("core:stun", "Stun")
                .in_group("core:stun")
                .exclusive_with("core:sleep")
                .lasting_ms(3000.0),
        );
        registry.register_effect(
            CombatEffectDef::new("core:sleep", "Sleep")
                .in_group("core:sleep")
                .exclusive_with("core:stun")
                .lasting_ms(6000.0),
        );
        registry.register_effect(
            CombatEffectDef::new("core:weakness_curse", "Weakness")
                .in_group("core:curse")
                .lasting_ms(12_000.0)
                .with_modifier(ModifierEntry::new(ModifierKind::DamageDealtPercent, -10.0)),
        );
        let mut mark = CombatEffectDef::new("core:mark", "Mark")
            .in_group("core:mark")
            .lasting_ms(10_000.0);
        mark.initial_params.insert("extra_hits".to_string(), 2.0);
        registry.register_effect(mark);

        // Attacks
        registry.register_attack(AttackDef::normal("core:melee_attack", "Attack"));
        registry.register_attack(AttackDef::normal("core:ranged_attack", "Shoot"));
        registry.register_attack(AttackDef::normal("core:magic_attack", "Cast"));

        let mut double_slash = AttackDef::normal("core:double_slash", "Double Slash");
        double_slash.attack_count = 2;
        double_slash.damage = vec![DamageRoll {
            kind: DamageRollKind::RandomPercent {
                min_percent: 10.0,
                max_percent: 100.0,
            },
            weight: 1,
            hit_index: None,
        }];
        registry.register_attack(double_slash);

        let mut crushing_blow = AttackDef::normal("core:crushing_blow", "Crushing Blow");
        crushing_blow.damage = vec![DamageRoll {
            kind: DamageRollKind::MaxHitPercent { percent: 120.0 },
            weight: 1,
            hit_index: None,
        }];
        crushing_blow.onhit_effects = vec![EffectApplicator::new(
            EffectTrigger::HitWithAttack,
            "core:stun",
            30.0,
        )];
        registry.register_attack(crushing_blow);

        let mut frenzy = AttackDef::normal("core:frenzy", "Frenzy");
        frenzy.consumes_effect = Some(ConsumesEffect {
            effect_id: "core:mark".to_string(),
            param: "extra_hits".to_string(),
        });
        registry.register_attack(frenzy);

        // Spells
        registry.register_spell(SpellDef::new("core:fire_bolt", "Fire Bolt", 7.0));
        let mut weaken = SpellDef::new("core:weaken", "Weaken", 0.0);
        weaken.curse_effect = Some("core:weakness_curse".to_string());
        registry.register_spell(weaken);

        registry.set_default_attack(AttackType::Melee, "core:melee_attack");
        registry.set_default_attack(AttackType::Ranged, "core:ranged_attack");
        registry.set_default_attack(AttackType::Magic, "core:magic_attack");

        registry
    }
}
