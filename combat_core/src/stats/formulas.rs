//! Combat stat formulas
//!
//! The hidden-level convention: a skill's effective level is its visible
//! level plus its abyssal tier; every formula below adds the 9 hidden
//! levels itself. Worked example (melee max hit): strength 50, strength
//! bonus 100, K = 1:
//!
//! `E = 50 + 9 = 59`
//! `max_hit = floor(1 * (1.3 + 59/10 + 100/80 + 59*100/640))`
//! `        = floor(1.3 + 5.9 + 1.25 + 9.21875) = floor(17.66875) = 17`

/// Hidden levels folded into every rating formula
const HIDDEN_LEVELS: f64 = 9.0;

/// Generic rating used for both accuracy and evasion:
/// `(effective_level + 9) * (bonus + 64)`
pub fn stat_rating(effective_level: f64, bonus: f64) -> f64 {
    (effective_level + HIDDEN_LEVELS) * (bonus + 64.0)
}

/// Melee/ranged max hit:
/// `floor(K * (1.3 + E/10 + S/80 + E*S/640))` with `E = level + 9`
pub fn strength_max_hit(effective_level: f64, strength_bonus: f64, number_multiplier: f64) -> f64 {
    let e = effective_level + HIDDEN_LEVELS;
    let s = strength_bonus;
    (number_multiplier * (1.3 + e / 10.0 + s / 80.0 + e * s / 640.0)).floor()
}

/// Magic max hit for a spell that allows damage modifiers:
/// `floor(K * spell_max_hit * (1 + bonus/100) * (1 + (level + 1)/200))`
pub fn magic_max_hit(
    spell_max_hit: f64,
    magic_level: f64,
    magic_damage_bonus: f64,
    number_multiplier: f64,
) -> f64 {
    (number_multiplier
        * spell_max_hit
        * (1.0 + magic_damage_bonus / 100.0)
        * (1.0 + (magic_level + 1.0) / 200.0))
        .floor()
}

/// Magic max hit for a spell that forbids damage modifiers:
/// `round(K * spell_max_hit)`
pub fn magic_max_hit_unmodified(spell_max_hit: f64, number_multiplier: f64) -> f64 {
    (number_multiplier * spell_max_hit).round()
}

/// Blended effective level for magic evasion:
/// `floor(0.3 * defence + 0.7 * magic)`
pub fn magic_evasion_level(defence_level: f64, magic_level: f64) -> f64 {
    (0.3 * defence_level + 0.7 * magic_level).floor()
}

/// Chance in [0, 100] for an accuracy rating to beat an evasion rating.
///
/// Examples:
/// - accuracy 150 vs evasion 300: 50 * 150/300 = 25
/// - accuracy 300 vs evasion 150: 100 - 50 * 150/300 = 75
pub fn hit_chance(accuracy: f64, evasion: f64) -> f64 {
    if accuracy <= 0.0 {
        return 0.0;
    }
    let chance = if accuracy < evasion {
        50.0 * accuracy / evasion
    } else {
        100.0 - 50.0 * evasion / accuracy
    };
    chance.clamp(0.0, 100.0)
}

/// Min hit: flat base plus a percentage of max hit, clamped to
/// `[1, max_hit]`
pub fn min_hit(flat_base: f64, max_hit: f64, percent_of_max_hit: f64) -> f64 {
    let raw = flat_base + (max_hit * percent_of_max_hit / 100.0).floor();
    raw.clamp(1.0, max_hit.max(1.0))
}

/// Resistance finalization: percentage modifier, optional halving, clamp
/// to `[0, cap]`
pub fn finalize_resistance(base_plus_flat: f64, percent: f64, halve: bool, cap: f64) -> f64 {
    let mut resistance = crate::modifier::apply_modifier(base_plus_flat, percent);
    if halve {
        resistance /= 2.0;
    }
    resistance.clamp(0.0, cap)
}
