//! Dialogue records - the authored data carried by dialogue nodes.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::quest::BranchList;

fn is_false(value: &bool) -> bool {
    !*value
}

/// One selectable option on a choice node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueChoice {
    /// Text shown to the player.
    pub text: String,

    /// Node activated when the choice is taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,

    /// Availability gate; empty means always offered.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
}

impl DialogueChoice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: None,
            condition: String::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<NodeId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }
}

/// Authored attributes shared by the dialogue node kinds. Which fields are
/// meaningful depends on the kind: choice nodes use `choices`, conditional
/// nodes use `branches`, hubs use `return_text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueAttrs {
    #[serde(default)]
    pub speaker: String,

    #[serde(default)]
    pub text: String,

    /// Choice nodes: the selectable options, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<DialogueChoice>,

    /// Conditional nodes: condition to next node, declaration order.
    #[serde(default, skip_serializing_if = "BranchList::is_empty")]
    pub branches: BranchList,

    /// Hub nodes: prompt shown when the hub is revisited.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_text: String,

    /// Show this line once, then never again.
    #[serde(default, skip_serializing_if = "is_false")]
    pub once_only: bool,
}

impl DialogueAttrs {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_choice(mut self, choice: DialogueChoice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_branch(
        mut self,
        condition: impl Into<String>,
        target: impl Into<NodeId>,
    ) -> Self {
        self.branches.push(condition, target);
        self
    }

    pub fn with_return_text(mut self, text: impl Into<String>) -> Self {
        self.return_text = text.into();
        self
    }

    pub fn once_only(mut self) -> Self {
        self.once_only = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_builder() {
        let attrs = DialogueAttrs::new("Guard", "Halt! Who goes there?")
            .with_choice(DialogueChoice::new("A friend.").with_target("guard_friendly"))
            .with_choice(
                DialogueChoice::new("None of your business.")
                    .with_target("guard_hostile")
                    .with_condition("reputation.guards <= -5"),
            );

        assert_eq!(attrs.speaker, "Guard");
        assert_eq!(attrs.choices.len(), 2);
        assert_eq!(attrs.choices[1].condition, "reputation.guards <= -5");
    }

    #[test]
    fn test_empty_fields_are_omitted_from_json() {
        let attrs = DialogueAttrs::new("NPC", "Hello there!");
        let json = serde_json::to_string(&attrs).unwrap();

        assert!(json.contains("speaker"));
        assert!(!json.contains("choices"));
        assert!(!json.contains("branches"));
        assert!(!json.contains("once_only"));
    }
}
