//! Observable combat events
//!
//! Everything a renderer or log sink might care about is queued as a typed
//! event and drained by the embedder after each tick. The engine itself
//! never prints or draws.

use crate::types::{CombatantSide, NextAction};

/// The flavour of a floating damage/heal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashType {
    /// A normal hit landing
    Attack,
    /// A critical hit landing
    Crit,
    /// An attack that failed to land
    Miss,
    /// An attack shrugged off by a damage-type immunity
    Immune,
    /// Damage-over-time tick
    Dot,
    /// Damage reflected back at an attacker
    Reflect,
    /// A direct heal
    Heal,
    /// Passive hitpoint regeneration
    Regen,
}

impl SplashType {
    /// Whether damage from this source is absorbed by an active barrier.
    /// Reflect damage alone bypasses barriers and strikes hitpoints.
    pub fn consumes_barrier(&self) -> bool {
        !matches!(self, SplashType::Reflect)
    }
}

/// One observable thing that happened during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// A floating number to display over a character
    Splash {
        side: CombatantSide,
        splash: SplashType,
        amount: f64,
    },
    /// A character queued what it will do when its action timer fires
    ActionQueued {
        side: CombatantSide,
        action: NextAction,
        attack_id: Option<String>,
    },
    /// A character began executing an attack
    AttackStarted {
        side: CombatantSide,
        attack_id: String,
    },
    /// An in-flight attack sequence was cut short
    AttackInterrupted { side: CombatantSide },
    /// A combat effect landed (or refreshed/stacked an existing instance)
    EffectApplied {
        side: CombatantSide,
        effect_id: String,
        reapplied: bool,
    },
    /// A combat effect expired or was stripped
    EffectRemoved {
        side: CombatantSide,
        effect_id: String,
    },
    /// An effect group transitioned from inactive to active
    EffectGroupApplied {
        side: CombatantSide,
        group_id: String,
    },
    /// An effect group transitioned from active to inactive
    EffectGroupRemoved {
        side: CombatantSide,
        group_id: String,
    },
    /// A character's barrier broke (reached zero from a positive value)
    BarrierBroken { side: CombatantSide },
    /// A character ran out of hitpoints; the fight is over
    Died { side: CombatantSide },
}
