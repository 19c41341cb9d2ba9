//! Persisted record schema for the three project collections.
//!
//! Records are the raw shape of `dialogues.json`, `quests.json`, and
//! `connections.json`. Kind-specific attributes are flattened into the node
//! records, so the JSON stays the flat field set of the original format.

use serde::{Deserialize, Serialize};
use story_model::{DialogueAttrs, NodeId, PortId, QuestAttrs};

use crate::graph::{DataType, Port, PortDirection, StoryGraph};

fn default_connection_limit() -> i32 {
    -1
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One port as persisted on a node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: PortId,

    pub name: String,

    /// "input" or "output".
    pub port_type: PortDirection,

    pub data_type: DataType,

    #[serde(default = "default_connection_limit")]
    pub connection_limit: i32,

    #[serde(default)]
    pub required: bool,

    /// Peer port ids. Redundant with connections.json, which is
    /// authoritative; divergence is reported at load.
    #[serde(default)]
    pub connected_to: Vec<PortId>,

    #[serde(default)]
    pub position: (f32, f32),
}

impl PortRecord {
    /// Build the in-memory port. `connected_to` is not carried over - the
    /// connection table owns connectivity.
    pub fn to_port(&self) -> Port {
        let mut port = Port::new(&self.name, self.port_type, self.data_type)
            .with_id(self.id.clone());
        port.connection_limit = self.connection_limit;
        port.required = self.required;
        port.position = self.position;
        port
    }

    /// Snapshot a port with its derived `connected_to` view.
    pub fn from_port(port: &Port, graph: &StoryGraph) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            port_type: port.direction(),
            data_type: port.data_type(),
            connection_limit: port.connection_limit,
            required: port.required,
            connected_to: graph.connected_peers(&port.id),
            position: port.position,
        }
    }
}

/// One dialogue node record in dialogues.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub id: NodeId,

    /// Kind tag ("dialogue-standard", "dialogue-choice", ...). Unknown tags
    /// reject the load.
    pub kind: String,

    #[serde(default)]
    pub position: (f32, f32),

    #[serde(default)]
    pub ports: Vec<PortRecord>,

    /// Draft nodes are exempt from reachability checks.
    #[serde(default, skip_serializing_if = "is_false")]
    pub draft: bool,

    #[serde(flatten)]
    pub attrs: DialogueAttrs,
}

/// One quest record in quests.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub id: NodeId,

    #[serde(default)]
    pub position: (f32, f32),

    #[serde(default)]
    pub ports: Vec<PortRecord>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub draft: bool,

    #[serde(flatten)]
    pub attrs: QuestAttrs,
}

/// One row of connections.json, the authoritative connection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub id: String,

    pub from_node: NodeId,

    pub from_port: PortId,

    pub to_node: NodeId,

    pub to_port: PortId,
}
