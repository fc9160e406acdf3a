//! Damage type definitions

use serde::{Deserialize, Serialize};

/// Read-only damage type definition, referenced by id everywhere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageTypeDef {
    pub id: String,
    pub name: String,
    /// Upper bound for computed resistance against this type
    #[serde(default = "default_resistance_cap")]
    pub resistance_cap: f64,
    /// Damage types a character fighting with this type is immune to
    #[serde(default)]
    pub immune_to: Vec<String>,
}

fn default_resistance_cap() -> f64 {
    95.0
}

impl DamageTypeDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        DamageTypeDef {
            id: id.into(),
            name: name.into(),
            resistance_cap: default_resistance_cap(),
            immune_to: Vec::new(),
        }
    }

    pub fn is_immune_to(&self, damage_type_id: &str) -> bool {
        self.immune_to.iter().any(|id| id == damage_type_id)
    }
}
