//! The closed set of modifier kinds the engine understands

use serde::{Deserialize, Serialize};

/// Every numeric adjustment the stat pipeline and attack resolution consult.
///
/// Kinds ending in `Percent` are summed and applied once via
/// `apply_modifier`; kinds ending in `Flat` are summed and scaled by
/// `number_multiplier`. Boolean-like kinds (`CantMiss`, `HalveResistance`,
/// ...) are treated as active when their summed value is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    // === Stat pipeline ===
    MaxHitpointsFlat,
    MaxHitpointsPercent,
    MaxBarrierFlat,
    MaxBarrierPercent,
    AttackIntervalFlat,
    AttackIntervalPercent,
    AccuracyPercent,
    /// Scoped by attack type (melee/ranged/magic evasion)
    EvasionPercent,
    MaxHitFlat,
    MaxHitPercent,
    MinHitFlat,
    MinHitPercentOfMaxHit,
    /// Scoped by damage type, optionally also by attack type
    ResistanceFlat,
    ResistancePercent,
    HalveResistance,
    MagicDamagePercent,

    // === Hit resolution ===
    CantMiss,
    CantEvade,
    CantAttack,
    DisableSpecialAttacks,
    /// Extra independent hit-chance rolls (total rolls cap at 2)
    ExtraHitRolls,
    DodgeChance,
    /// A total of 100+ on the defender forces an evade
    Protection,
    ConvertMissToHitChance,

    // === Damage calculation ===
    DamageDealtPercent,
    DamageTakenPercent,
    /// Percent damage per active effect on the target
    DamageDealtPerEffectPercent,
    DragonbreathDamagePercent,
    FlatDamageBonus,
    /// Flat bonus equal to a percent of own max hitpoints, capped
    DamageFromMaxHpPercent,
    CritChance,
    /// Added to the base crit bonus percent
    CritBonusPercent,

    // === On-hit extras ===
    LifestealPercent,
    HealingWhenHitFlat,
    ReflectPercent,
    ReflectFlat,
    /// Reflect a uniform roll in [0, value * number_multiplier]
    ReflectRandomFlat,
    /// Percent-of-max-HP self damage dealt back to the attacker
    SelfHitPercentMaxHp,
    BarrierDrainFlat,
    SelfDamageOnHitFlat,
    SelfDamageFirstMissPercent,
    SelfDamageFirstAttackPercent,

    // === Effect application ===
    /// Chance to ignore an incoming effect; scoped by effect group.
    /// A total of 100+ ignores unconditionally.
    EffectIgnoreChance,
    /// Scoped by attack type: immune to effects from that style
    AttackTypeImmunity,
    /// Immune to effects while the attacker fights a different style
    OtherStyleImmunity,
}
