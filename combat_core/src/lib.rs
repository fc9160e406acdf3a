//! combat_core - Turn-based combat resolution engine for character fights
//!
//! This library provides:
//! - Character: one combatant's resources, effects, and derived stats
//! - Fight: the 1v1 action loop (queue, act, attack, end of turn)
//! - ContentRegistry: data-driven attacks, effects, spells, damage types
//! - ModifierTable: scoped percentage/flat modifiers from any source
//! - Save codec: versioned binary persistence of mid-fight state
//!
//! The engine is deterministic under an injected RNG and fully headless;
//! rendering, input, and content authoring live with the embedder.

pub mod character;
pub mod combat;
pub mod config;
pub mod content;
pub mod effect;
pub mod modifier;
pub mod rng;
pub mod save;
pub mod stats;
pub mod types;

// Re-export core types for convenience
pub use character::{
    AttackSelection, Character, DotDamage, Level, RenderFlags, SkillLevels, Timer,
};
pub use combat::{CombatEvent, Fight, FightState, SplashType};
pub use config::{ConfigError, GameConstants};
pub use content::{
    AttackDef, CombatEffectDef, ContentPack, ContentRegistry, DamageTypeDef, EffectGroupDef,
    SpellDef,
};
pub use effect::{
    ApplicatorCondition, ApplicatorTarget, CharacterValueKind, Comparison, EffectApplicator,
    EffectTrigger, TriggerContext,
};
pub use modifier::{ModifierEntry, ModifierKind, ModifierQuery, ModifierScope, ModifierTable};
pub use rng::{CombatRng, FixedRng, GameRng};
pub use save::{decode_character, encode_character, SaveError, SAVE_VERSION};
pub use stats::{CombatStats, EquipmentStats};
pub use types::{AttackType, CombatantSide, NextAction};
