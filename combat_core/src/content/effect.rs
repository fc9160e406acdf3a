//! Combat effect and effect group definitions

use crate::modifier::ModifierEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happens when an already-active effect is applied again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReapplyBehavior {
    /// Reset the duration
    #[default]
    Refresh,
    /// Reset the duration and add a stack up to the cap
    Stack { max_stacks: u32 },
    /// Leave the existing instance untouched
    Ignore,
}

/// Periodic damage carried by an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotSpec {
    pub interval_ms: f64,
    /// Effect parameter holding the per-period damage
    pub damage_param: String,
    pub damage_type: String,
}

/// Immutable content definition of a combat effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEffectDef {
    pub id: String,
    pub name: String,
    /// Effect groups this effect counts toward
    #[serde(default)]
    pub groups: Vec<String>,
    /// Groups whose activity blocks this effect from applying
    #[serde(default)]
    pub exclusive_groups: Vec<String>,
    #[serde(default)]
    pub reapply: ReapplyBehavior,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub initial_params: BTreeMap<String, f64>,
    /// Modifier contributions registered while the instance is alive
    #[serde(default)]
    pub modifiers: Vec<ModifierEntry>,
    #[serde(default)]
    pub dot: Option<DotSpec>,
}

impl CombatEffectDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CombatEffectDef {
            id: id.into(),
            name: name.into(),
            groups: Vec::new(),
            exclusive_groups: Vec::new(),
            reapply: ReapplyBehavior::Refresh,
            duration_ms: None,
            initial_params: BTreeMap::new(),
            modifiers: Vec::new(),
            dot: None,
        }
    }

    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.groups.push(group_id.into());
        self
    }

    pub fn exclusive_with(mut self, group_id: impl Into<String>) -> Self {
        self.exclusive_groups.push(group_id.into());
        self
    }

    pub fn lasting_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_modifier(mut self, entry: ModifierEntry) -> Self {
        self.modifiers.push(entry);
        self
    }
}

/// An effect group: a refcounted category tag plus the modifier
/// contributions registered while the group is active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectGroupDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierEntry>,
}

impl EffectGroupDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        EffectGroupDef {
            id: id.into(),
            name: name.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, entry: ModifierEntry) -> Self {
        self.modifiers.push(entry);
        self
    }

    /// Source id under which the group's modifiers register
    pub fn modifier_source_id(&self) -> String {
        format!("group:{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let def = CombatEffectDef::new("core:stun", "Stun")
            .in_group("core:stun")
            .exclusive_with("core:sleep")
            .lasting_ms(3000.0);
        assert_eq!(def.groups, vec!["core:stun"]);
        assert_eq!(def.exclusive_groups, vec!["core:sleep"]);
        assert_eq!(def.duration_ms, Some(3000.0));
    }

    #[test]
    fn test_reapply_toml() {
        let def: CombatEffectDef = toml::from_str(
            r#"
id = "core:frenzy"
name = "Frenzy"

[reapply.stack]
max_stacks = 5
"#,
        )
        .unwrap();
        assert_eq!(def.reapply, ReapplyBehavior::Stack { max_stacks: 5 });
    }
}
