//! Effect Application System
//!
//! Applicators (chance-gated rules) fire on combat triggers and apply
//! combat effects; active effects belong to refcounted effect groups whose
//! modifier contributions register exactly once per 0→1 crossing and
//! deregister exactly once per 1→0 crossing.

mod active;
mod applicator;
mod condition;

pub use active::{ActiveEffect, EffectTick};
pub use applicator::{
    ApplicatorBuckets, ApplicatorTarget, ConditionalChance, EffectApplicator, EffectTrigger,
};
pub use condition::{
    ApplicatorCondition, CharacterValueKind, CharacterValues, Comparison, TriggerContext,
};

use std::collections::BTreeMap;

/// Refcounted effect-group activity per character.
///
/// Invariant: a group is "active" iff its count is strictly positive. The
/// zero-crossing transitions are the only places where a caller may perform
/// side-effecting modifier (de)registration, so both directions report them.
#[derive(Debug, Clone, Default)]
pub struct EffectGroups {
    counts: BTreeMap<String, u32>,
}

impl EffectGroups {
    pub fn new() -> Self {
        EffectGroups::default()
    }

    /// Increment a group's refcount. Returns true on the 0→1 crossing.
    pub fn increment(&mut self, group_id: &str) -> bool {
        let count = self.counts.entry(group_id.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Decrement a group's refcount. Returns true on the 1→0 crossing.
    ///
    /// # Panics
    ///
    /// Panics when the group is not active; a decrement without a matching
    /// increment is a corrupted effect-bookkeeping call graph.
    pub fn decrement(&mut self, group_id: &str) -> bool {
        let count = self
            .counts
            .get_mut(group_id)
            .unwrap_or_else(|| panic!("decrement of inactive effect group '{group_id}'"));
        assert!(*count > 0, "decrement of inactive effect group '{group_id}'");
        *count -= 1;
        if *count == 0 {
            self.counts.remove(group_id);
            true
        } else {
            false
        }
    }

    /// Whether any effect in the group is active
    pub fn is_active(&self, group_id: &str) -> bool {
        self.count(group_id) > 0
    }

    pub fn count(&self, group_id: &str) -> u32 {
        self.counts.get(group_id).copied().unwrap_or(0)
    }

    /// Ids of all currently active groups
    pub fn active_groups(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_crossings() {
        let mut groups = EffectGroups::new();

        assert!(!groups.is_active("core:stun"));
        // 0 -> 1 reports registration
        assert!(groups.increment("core:stun"));
        assert!(groups.is_active("core:stun"));
        // 1 -> 2 does not
        assert!(!groups.increment("core:stun"));
        // 2 -> 1 does not deregister
        assert!(!groups.decrement("core:stun"));
        assert!(groups.is_active("core:stun"));
        // 1 -> 0 reports deregistration
        assert!(groups.decrement("core:stun"));
        assert!(!groups.is_active("core:stun"));
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut groups = EffectGroups::new();
        let before = groups.count("core:curse");
        groups.increment("core:curse");
        groups.decrement("core:curse");
        assert_eq!(groups.count("core:curse"), before);
        assert!(!groups.is_active("core:curse"));
    }

    #[test]
    #[should_panic(expected = "inactive effect group")]
    fn test_unbalanced_decrement_panics() {
        let mut groups = EffectGroups::new();
        groups.decrement("core:stun");
    }

    #[test]
    fn test_active_groups_listing() {
        let mut groups = EffectGroups::new();
        groups.increment("core:sleep");
        groups.increment("core:burn_dot");
        let active: Vec<_> = groups.active_groups().collect();
        assert_eq!(active, vec!["core:burn_dot", "core:sleep"]);
    }
}
