//! Node variant registry - the closed set of node kinds and their layouts.
//!
//! Each kind declares its port templates and default attributes here. The
//! graph container and the validation engine never look past the generic
//! node/port contract plus the kind tag, so supporting a new kind means
//! touching this module alone.

use story_model::{DialogueAttrs, NodeId, QuestAttrs};

use super::node::{Node, NodeAttrs, NodeKind};
use super::port::{DataType, Port, PortDirection};
use crate::error::{EngineError, Result};

/// Name of the quest input port mirroring the `prerequisites` field.
pub const PORT_PREREQUISITES: &str = "prerequisites";

/// Name of the quest output port feeding dependent quests.
pub const PORT_UNLOCKS: &str = "unlocks";

/// Name of the quest output port taken on failure (only when `can_fail`).
pub const PORT_FAILURE: &str = "failure";

/// Port layout declared by a node kind.
#[derive(Debug, Clone, Copy)]
pub struct PortTemplate {
    pub name: &'static str,
    pub direction: PortDirection,
    pub data_type: DataType,
    pub connection_limit: i32,
    pub required: bool,
}

impl PortTemplate {
    const fn new(
        name: &'static str,
        direction: PortDirection,
        data_type: DataType,
        connection_limit: i32,
        required: bool,
    ) -> Self {
        Self {
            name,
            direction,
            data_type,
            connection_limit,
            required,
        }
    }

    /// Build a concrete port (fresh id) from this template.
    pub fn build(&self) -> Port {
        let mut port = Port::new(self.name, self.direction, self.data_type);
        port.connection_limit = self.connection_limit;
        port.required = self.required;
        port
    }
}

const DIALOGUE_STANDARD_PORTS: &[PortTemplate] = &[
    PortTemplate::new("input", PortDirection::Input, DataType::Flow, -1, false),
    PortTemplate::new("output", PortDirection::Output, DataType::Flow, 1, false),
];

const DIALOGUE_CHOICE_PORTS: &[PortTemplate] = &[
    PortTemplate::new("input", PortDirection::Input, DataType::Flow, -1, false),
    PortTemplate::new("choice_1", PortDirection::Output, DataType::Flow, 1, false),
    PortTemplate::new("choice_2", PortDirection::Output, DataType::Flow, 1, false),
    PortTemplate::new("choice_3", PortDirection::Output, DataType::Flow, 1, false),
];

const DIALOGUE_CONDITIONAL_PORTS: &[PortTemplate] = &[
    PortTemplate::new("input", PortDirection::Input, DataType::Flow, -1, false),
    PortTemplate::new("true", PortDirection::Output, DataType::Flow, 1, true),
    PortTemplate::new("false", PortDirection::Output, DataType::Flow, 1, true),
];

const DIALOGUE_HUB_PORTS: &[PortTemplate] = &[
    PortTemplate::new("input", PortDirection::Input, DataType::Flow, -1, false),
    PortTemplate::new("option_1", PortDirection::Output, DataType::Flow, 1, false),
    PortTemplate::new("option_2", PortDirection::Output, DataType::Flow, 1, false),
    PortTemplate::new("option_3", PortDirection::Output, DataType::Flow, 1, false),
    PortTemplate::new("return", PortDirection::Output, DataType::Flow, 1, false),
];

const QUEST_PORTS: &[PortTemplate] = &[
    PortTemplate::new(
        PORT_PREREQUISITES,
        PortDirection::Input,
        DataType::Quest,
        -1,
        false,
    ),
    PortTemplate::new(PORT_UNLOCKS, PortDirection::Output, DataType::Quest, -1, false),
];

/// Port templates declared by a kind.
pub fn port_templates(kind: NodeKind) -> &'static [PortTemplate] {
    match kind {
        NodeKind::DialogueStandard => DIALOGUE_STANDARD_PORTS,
        NodeKind::DialogueChoice => DIALOGUE_CHOICE_PORTS,
        NodeKind::DialogueConditional => DIALOGUE_CONDITIONAL_PORTS,
        NodeKind::DialogueHub => DIALOGUE_HUB_PORTS,
        NodeKind::Quest => QUEST_PORTS,
    }
}

/// Default attributes for a kind.
pub fn default_attrs(kind: NodeKind) -> NodeAttrs {
    match kind {
        NodeKind::Quest => NodeAttrs::Quest(QuestAttrs::new("")),
        _ => NodeAttrs::Dialogue(DialogueAttrs::default()),
    }
}

/// Instantiate a node of the given kind tag with its template ports.
///
/// Fails with [`EngineError::UnknownNodeKind`] for a tag outside the
/// registered set.
pub fn instantiate(kind_tag: &str, id: impl Into<NodeId>, position: (f32, f32)) -> Result<Node> {
    let kind = NodeKind::from_tag(kind_tag)
        .ok_or_else(|| EngineError::UnknownNodeKind(kind_tag.to_string()))?;

    let mut node = Node::new(id, kind, default_attrs(kind)).with_position(position);
    for template in port_templates(kind) {
        node.push_port(template.build());
    }
    Ok(node)
}

/// Add the attribute-dependent quest ports: `failure` when the quest can
/// fail, and one `branch_<n>` output per declared branch. Existing ports are
/// left untouched.
pub fn refresh_quest_ports(node: &mut Node) {
    let Some(attrs) = node.quest() else {
        return;
    };

    let mut wanted: Vec<String> = Vec::new();
    if attrs.can_fail {
        wanted.push(PORT_FAILURE.to_string());
    }
    for index in 1..=attrs.branches.len() {
        wanted.push(format!("branch_{index}"));
    }

    let missing: Vec<String> = wanted
        .into_iter()
        .filter(|name| node.port_named(name).is_none())
        .collect();

    for name in missing {
        node.push_port(Port::new(name, PortDirection::Output, DataType::Quest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_known_kinds() {
        let quest = instantiate("quest", "find_lost_item", (10.0, 20.0)).unwrap();
        assert_eq!(quest.kind(), NodeKind::Quest);
        assert_eq!(quest.position, (10.0, 20.0));
        assert!(quest.port_named(PORT_PREREQUISITES).is_some());
        assert!(quest.port_named(PORT_UNLOCKS).is_some());

        let hub = instantiate("dialogue-hub", "tavern_hub", (0.0, 0.0)).unwrap();
        assert_eq!(hub.ports().len(), 5);
        assert!(hub.port_named("return").is_some());
    }

    #[test]
    fn test_instantiate_unknown_kind() {
        let err = instantiate("cutscene", "intro", (0.0, 0.0)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownNodeKind(tag) if tag == "cutscene"));
    }

    #[test]
    fn test_conditional_outputs_are_required() {
        let node = instantiate("dialogue-conditional", "gate", (0.0, 0.0)).unwrap();
        assert!(node.port_named("true").unwrap().required);
        assert!(node.port_named("false").unwrap().required);
        assert!(!node.port_named("input").unwrap().required);
    }

    #[test]
    fn test_refresh_quest_ports() {
        let mut node = instantiate("quest", "heist", (0.0, 0.0)).unwrap();
        {
            let attrs = node.quest_mut().unwrap();
            attrs.can_fail = true;
            attrs.branches.push("gold >= 100", "rich_path");
        }

        refresh_quest_ports(&mut node);
        assert!(node.port_named(PORT_FAILURE).is_some());
        assert!(node.port_named("branch_1").is_some());

        // Idempotent: running again adds nothing.
        let count = node.ports().len();
        refresh_quest_ports(&mut node);
        assert_eq!(node.ports().len(), count);
    }
}
