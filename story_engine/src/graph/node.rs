//! Nodes - the vertices of the authoring graph.

use serde::{Deserialize, Serialize};
use story_model::{DialogueAttrs, NodeId, PortId, QuestAttrs};

use super::port::Port;

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "dialogue-standard")]
    DialogueStandard,
    #[serde(rename = "dialogue-choice")]
    DialogueChoice,
    #[serde(rename = "dialogue-conditional")]
    DialogueConditional,
    #[serde(rename = "dialogue-hub")]
    DialogueHub,
    #[serde(rename = "quest")]
    Quest,
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::DialogueStandard => "dialogue-standard",
            NodeKind::DialogueChoice => "dialogue-choice",
            NodeKind::DialogueConditional => "dialogue-conditional",
            NodeKind::DialogueHub => "dialogue-hub",
            NodeKind::Quest => "quest",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "dialogue-standard" => Some(NodeKind::DialogueStandard),
            "dialogue-choice" => Some(NodeKind::DialogueChoice),
            "dialogue-conditional" => Some(NodeKind::DialogueConditional),
            "dialogue-hub" => Some(NodeKind::DialogueHub),
            "quest" => Some(NodeKind::Quest),
            _ => None,
        }
    }

    pub fn is_dialogue(&self) -> bool {
        !matches!(self, NodeKind::Quest)
    }
}

/// Kind-specific attributes behind the shared node contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeAttrs {
    Dialogue(DialogueAttrs),
    Quest(QuestAttrs),
}

impl NodeAttrs {
    pub fn as_dialogue(&self) -> Option<&DialogueAttrs> {
        match self {
            NodeAttrs::Dialogue(attrs) => Some(attrs),
            NodeAttrs::Quest(_) => None,
        }
    }

    pub fn as_dialogue_mut(&mut self) -> Option<&mut DialogueAttrs> {
        match self {
            NodeAttrs::Dialogue(attrs) => Some(attrs),
            NodeAttrs::Quest(_) => None,
        }
    }

    pub fn as_quest(&self) -> Option<&QuestAttrs> {
        match self {
            NodeAttrs::Quest(attrs) => Some(attrs),
            NodeAttrs::Dialogue(_) => None,
        }
    }

    pub fn as_quest_mut(&mut self) -> Option<&mut QuestAttrs> {
        match self {
            NodeAttrs::Quest(attrs) => Some(attrs),
            NodeAttrs::Dialogue(_) => None,
        }
    }
}

/// A graph vertex holding one unit of authored content.
///
/// The kind is immutable after creation. Position is presentational only; it
/// round-trips through persistence but has no effect on validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    kind: NodeKind,

    pub position: (f32, f32),

    ports: Vec<Port>,

    /// Draft nodes are exempt from reachability checks.
    pub draft: bool,

    pub attrs: NodeAttrs,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, attrs: NodeAttrs) -> Self {
        Self {
            id: id.into(),
            kind,
            position: (0.0, 0.0),
            ports: Vec::new(),
            draft: false,
            attrs,
        }
    }

    pub fn with_position(mut self, position: (f32, f32)) -> Self {
        self.position = position;
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Ports in declaration order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: &PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == *id)
    }

    pub fn port_named(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub(crate) fn push_port(&mut self, port: Port) {
        self.ports.push(port);
    }

    pub fn dialogue(&self) -> Option<&DialogueAttrs> {
        self.attrs.as_dialogue()
    }

    pub fn dialogue_mut(&mut self) -> Option<&mut DialogueAttrs> {
        self.attrs.as_dialogue_mut()
    }

    pub fn quest(&self) -> Option<&QuestAttrs> {
        self.attrs.as_quest()
    }

    pub fn quest_mut(&mut self) -> Option<&mut QuestAttrs> {
        self.attrs.as_quest_mut()
    }
}
