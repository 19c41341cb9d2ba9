//! The story graph - nodes, typed ports, and the canonical connection table.
//!
//! The graph owns every node and the single table of connections between
//! ports. Per-port `connected_to` views of the persisted schema are derived
//! from that table, never stored, which removes the bidirectional-mirroring
//! consistency hazard at the source.

mod node;
mod port;
pub mod registry;

pub use node::{Node, NodeAttrs, NodeKind};
pub use port::{DataType, Port, PortDirection};

use std::collections::HashMap;
use story_model::{NodeId, PortId};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// A directed edge between an output port and an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
}

/// Container for the whole project graph.
///
/// Nodes and connections iterate in insertion order so validation reports
/// and traversals are reproducible. Every mutation bumps the revision
/// counter, which invalidates any cached validation report.
#[derive(Debug, Clone, Default)]
pub struct StoryGraph {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
    connections: Vec<Connection>,
    port_owner: HashMap<PortId, NodeId>,
    revision: u64,
}

impl StoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Insert a fully built node. Node and port ids must be fresh.
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
        for port in node.ports() {
            if self.port_owner.contains_key(&port.id) {
                return Err(EngineError::DuplicatePortId(port.id.clone()));
            }
        }

        let id = node.id.clone();
        for port in node.ports() {
            self.port_owner.insert(port.id.clone(), id.clone());
        }
        self.order.push(id.clone());
        self.nodes.insert(id, node);
        self.touch();
        Ok(())
    }

    /// Instantiate a node kind from the registry and insert it.
    pub fn create_node(
        &mut self,
        kind_tag: &str,
        id: impl Into<NodeId>,
        position: (f32, f32),
    ) -> Result<NodeId> {
        let id = id.into();
        let node = registry::instantiate(kind_tag, id.clone(), position)?;
        self.insert_node(node)?;
        Ok(id)
    }

    /// Remove a node, detaching every connection that touches its ports.
    /// No dangling peer references survive the removal.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|n| n != id);
        for port in node.ports() {
            self.port_owner.remove(&port.id);
        }
        self.connections
            .retain(|c| c.from_node != *id && c.to_node != *id);
        self.touch();
        Some(node)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node access. Counts as a mutation for report caching, since
    /// attribute edits can change validation results.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.touch();
        self.nodes.get_mut(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// The canonical connection table, in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Owner of a port, if the port exists.
    pub fn port_owner(&self, port: &PortId) -> Option<&NodeId> {
        self.port_owner.get(port)
    }

    fn resolve_port(&self, port: &PortId) -> Option<(&Node, &Port)> {
        let owner = self.port_owner.get(port)?;
        let node = self.nodes.get(owner)?;
        Some((node, node.port(port)?))
    }

    /// Number of connections currently touching a port.
    pub fn connection_count(&self, port: &PortId) -> usize {
        self.connections
            .iter()
            .filter(|c| c.from_port == *port || c.to_port == *port)
            .count()
    }

    /// Peer ports currently linked to a port, in connection order. This is
    /// the derived view persisted as `connected_to`.
    pub fn connected_peers(&self, port: &PortId) -> Vec<PortId> {
        let mut peers = Vec::new();
        for connection in &self.connections {
            if connection.from_port == *port {
                peers.push(connection.to_port.clone());
            } else if connection.to_port == *port {
                peers.push(connection.from_port.clone());
            }
        }
        peers
    }

    /// Create a checked connection from an output port to an input port.
    ///
    /// Fails, leaving the graph untouched, if either port is missing, the
    /// directions are not output-to-input, the data types differ, or either
    /// side is at its connection limit. Re-connecting an existing pair is a
    /// no-op.
    pub fn connect(&mut self, from: &PortId, to: &PortId) -> Result<()> {
        let (from_node, from_port) = self
            .resolve_port(from)
            .ok_or_else(|| EngineError::dangling("port", from))?;
        let (to_node, to_port) = self
            .resolve_port(to)
            .ok_or_else(|| EngineError::dangling("port", to))?;

        if from_port.direction() != PortDirection::Output
            || to_port.direction() != PortDirection::Input
        {
            return Err(EngineError::IncompatibleConnection {
                from: from.clone(),
                to: to.clone(),
                reason: "connections run from an output port to an input port".to_string(),
            });
        }
        if from_port.data_type() != to_port.data_type() {
            return Err(EngineError::IncompatibleConnection {
                from: from.clone(),
                to: to.clone(),
                reason: format!(
                    "data type {} does not match {}",
                    from_port.data_type().tag(),
                    to_port.data_type().tag()
                ),
            });
        }

        if self
            .connections
            .iter()
            .any(|c| c.from_port == *from && c.to_port == *to)
        {
            return Ok(());
        }

        if !from_port.has_capacity(self.connection_count(from)) {
            return Err(EngineError::ConnectionLimitExceeded(from.clone()));
        }
        if !to_port.has_capacity(self.connection_count(to)) {
            return Err(EngineError::ConnectionLimitExceeded(to.clone()));
        }

        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            from_node: from_node.id.clone(),
            from_port: from.clone(),
            to_node: to_node.id.clone(),
            to_port: to.clone(),
        };
        self.connections.push(connection);
        self.touch();
        Ok(())
    }

    /// Remove the connection between two ports. Returns whether one existed.
    pub fn disconnect(&mut self, from: &PortId, to: &PortId) -> bool {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.from_port == *from && c.to_port == *to));
        if self.connections.len() == before {
            false
        } else {
            self.touch();
            true
        }
    }

    /// Insert a connection without compatibility checks.
    ///
    /// Used by the project loader: persisted data may be invalid and must
    /// still load so the graph stays editable and validation can report the
    /// problems.
    pub fn restore_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
        self.touch();
    }

    /// Neighbor nodes reached through the named port.
    pub fn neighbors_by_port(&self, node: &NodeId, port_name: &str) -> Vec<&Node> {
        let Some(port) = self.nodes.get(node).and_then(|n| n.port_named(port_name)) else {
            return Vec::new();
        };

        let mut neighbors = Vec::new();
        for peer in self.connected_peers(&port.id) {
            if let Some((peer_node, _)) = self.resolve_port(&peer) {
                if !neighbors.iter().any(|n: &&Node| n.id == peer_node.id) {
                    neighbors.push(peer_node);
                }
            }
        }
        neighbors
    }

    /// Neighbor nodes linked through any port of the given data type.
    pub fn neighbors_by_data_type(&self, node: &NodeId, data_type: DataType) -> Vec<&Node> {
        let Some(n) = self.nodes.get(node) else {
            return Vec::new();
        };

        let mut neighbors: Vec<&Node> = Vec::new();
        for port in n.ports() {
            if port.data_type() != data_type {
                continue;
            }
            for peer in self.connected_peers(&port.id) {
                if let Some((peer_node, _)) = self.resolve_port(&peer) {
                    if !neighbors.iter().any(|p| p.id == peer_node.id) {
                        neighbors.push(peer_node);
                    }
                }
            }
        }
        neighbors
    }

    /// Prerequisite quests of a quest node, derived from its prerequisites
    /// port. Falls back to the denormalized field when the port is absent
    /// (loaded data without wired ports).
    pub fn quest_prerequisites(&self, quest: &NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(quest) else {
            return Vec::new();
        };

        match node.port_named(registry::PORT_PREREQUISITES) {
            Some(port) => {
                let mut prerequisites = Vec::new();
                for peer in self.connected_peers(&port.id) {
                    if let Some(owner) = self.port_owner.get(&peer) {
                        if !prerequisites.contains(owner) {
                            prerequisites.push(owner.clone());
                        }
                    }
                }
                prerequisites
            }
            None => node
                .quest()
                .map(|attrs| attrs.prerequisites.clone())
                .unwrap_or_default(),
        }
    }
}
