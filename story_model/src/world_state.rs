//! World state - the shared flag and resource store read by every condition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A batch of world-state writes produced by one gameplay or simulation event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// Flags to set (or clear, with `false`).
    #[serde(default)]
    pub flags: HashMap<String, bool>,

    /// Signed deltas applied to resource counters.
    #[serde(default)]
    pub resources: HashMap<String, i64>,
}

impl StateChange {
    /// Create an empty state change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag when this change is applied.
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    /// Adjust a resource counter when this change is applied.
    pub fn with_resource(mut self, name: impl Into<String>, delta: i64) -> Self {
        self.resources.insert(name.into(), delta);
        self
    }

    /// Whether applying this change would do nothing.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.resources.is_empty()
    }
}

/// The mutable world state shared by reference across all graphs.
///
/// Flags gate content through boolean checks; resources are numeric counters
/// compared against thresholds. Condition evaluation takes `&WorldState`
/// explicitly so simulations stay deterministic and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Named boolean flags.
    pub flags: HashMap<String, bool>,

    /// Named numeric counters.
    pub resources: HashMap<String, i64>,
}

impl WorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a flag. Unset flags read as false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Set or clear a flag.
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    /// Read a resource counter. Unset resources read as 0.
    pub fn resource(&self, name: &str) -> i64 {
        self.resources.get(name).copied().unwrap_or(0)
    }

    /// Set a resource counter to an absolute value.
    pub fn set_resource(&mut self, name: impl Into<String>, value: i64) {
        self.resources.insert(name.into(), value);
    }

    /// Adjust a resource counter by a signed delta and return the new value.
    pub fn adjust_resource(&mut self, name: impl Into<String>, delta: i64) -> i64 {
        let entry = self.resources.entry(name.into()).or_insert(0);
        *entry += delta;
        *entry
    }

    /// Apply a batch of writes.
    pub fn apply(&mut self, change: &StateChange) {
        for (name, value) in &change.flags {
            self.flags.insert(name.clone(), *value);
        }
        for (name, delta) in &change.resources {
            self.adjust_resource(name.clone(), *delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reads() {
        let state = WorldState::new();
        assert!(!state.flag("has_key"));
        assert_eq!(state.resource("gold"), 0);
    }

    #[test]
    fn test_set_and_adjust() {
        let mut state = WorldState::new();
        state.set_flag("has_key", true);
        state.set_resource("gold", 100);

        assert!(state.flag("has_key"));
        assert_eq!(state.adjust_resource("gold", -30), 70);
        assert_eq!(state.resource("gold"), 70);
    }

    #[test]
    fn test_apply_state_change() {
        let mut state = WorldState::new();
        state.set_resource("gold", 50);

        let change = StateChange::new()
            .with_flag("talked_to_guard", true)
            .with_resource("gold", -10);
        state.apply(&change);

        assert!(state.flag("talked_to_guard"));
        assert_eq!(state.resource("gold"), 40);
    }
}
