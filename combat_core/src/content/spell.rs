//! Spell definitions (damage spells and curses)

use serde::{Deserialize, Serialize};

/// Content definition of a castable spell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    /// Base max hit scalar; multiplied by number_multiplier when computing
    /// the magic max hit
    #[serde(default)]
    pub max_hit: f64,
    /// When set, magic damage modifiers do not apply to this spell
    #[serde(default)]
    pub forbids_damage_modifiers: bool,
    /// Effect applied to the target when this spell is used as a curse
    #[serde(default)]
    pub curse_effect: Option<String>,
}

impl SpellDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_hit: f64) -> Self {
        SpellDef {
            id: id.into(),
            name: name.into(),
            max_hit,
            forbids_damage_modifiers: false,
            curse_effect: None,
        }
    }

    /// Whether this spell curses rather than damages
    pub fn is_curse(&self) -> bool {
        self.curse_effect.is_some()
    }
}
