//! Ports - typed, directional attachment points on nodes.

use serde::{Deserialize, Serialize};
use story_model::PortId;

/// Direction of a port. Connections always run output to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn tag(&self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// Payload tag restricting which ports may connect to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Conversation flow between dialogue nodes.
    Flow,
    /// References to dialogue content.
    Dialogue,
    /// Quest linkage (prerequisites, unlocks, branches).
    Quest,
}

impl DataType {
    pub fn tag(&self) -> &'static str {
        match self {
            DataType::Flow => "flow",
            DataType::Dialogue => "dialogue",
            DataType::Quest => "quest",
        }
    }
}

/// A typed attachment point on a node.
///
/// Direction and data type are fixed at creation. The set of connected peers
/// is not stored here - it lives in the graph's connection table, and the
/// persisted `connected_to` view is derived from that table on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,

    pub name: String,

    direction: PortDirection,

    data_type: DataType,

    /// Maximum simultaneous connections; -1 means unbounded.
    pub connection_limit: i32,

    /// An unconnected required port is a validation error.
    pub required: bool,

    /// Presentational offset relative to the node.
    pub position: (f32, f32),
}

impl Port {
    /// Create an unbounded, optional port with a fresh id.
    pub fn new(name: impl Into<String>, direction: PortDirection, data_type: DataType) -> Self {
        Self {
            id: PortId::generate(),
            name: name.into(),
            direction,
            data_type,
            connection_limit: -1,
            required: false,
            position: (0.0, 0.0),
        }
    }

    /// Replace the generated id (loaded data keeps its saved port ids).
    pub fn with_id(mut self, id: impl Into<PortId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.connection_limit = limit;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether the port can take one more connection given its current count.
    pub fn has_capacity(&self, current: usize) -> bool {
        self.connection_limit < 0 || current < self.connection_limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        let unbounded = Port::new("output", PortDirection::Output, DataType::Flow);
        assert!(unbounded.has_capacity(0));
        assert!(unbounded.has_capacity(1000));

        let single = Port::new("output", PortDirection::Output, DataType::Flow).with_limit(1);
        assert!(single.has_capacity(0));
        assert!(!single.has_capacity(1));
    }

    #[test]
    fn test_direction_tags() {
        assert_eq!(PortDirection::Input.tag(), "input");
        assert_eq!(DataType::Quest.tag(), "quest");
    }
}
