//! Project persistence - the three JSON collections and their graph mapping.
//!
//! The on-disk mechanics (paths, file watching, backups) are the embedding
//! tool's concern; this module maps between JSON strings in the persisted
//! schema and the in-memory graph. Loading never rejects data that
//! validation can report instead: connections are restored unchecked, and
//! divergence between `connections.json` and per-port `connected_to` views
//! surfaces as load findings.

mod records;

pub use records::{ConnectionRecord, DialogueRecord, PortRecord, QuestRecord};

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use story_model::PortId;

use crate::error::{EngineError, Result};
use crate::graph::{registry, Connection, Node, NodeAttrs, NodeKind, StoryGraph};
use crate::validate::{Finding, FindingKind, Report};

/// The three independently loadable collections of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectData {
    pub dialogues: Vec<DialogueRecord>,
    pub quests: Vec<QuestRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl ProjectData {
    /// Parse the three collections from their JSON strings.
    pub fn from_json(dialogues: &str, quests: &str, connections: &str) -> Result<Self> {
        Ok(Self {
            dialogues: serde_json::from_str(dialogues).map_err(|source| {
                EngineError::MalformedProject {
                    file: "dialogues.json",
                    source,
                }
            })?,
            quests: serde_json::from_str(quests).map_err(|source| {
                EngineError::MalformedProject {
                    file: "quests.json",
                    source,
                }
            })?,
            connections: serde_json::from_str(connections).map_err(|source| {
                EngineError::MalformedProject {
                    file: "connections.json",
                    source,
                }
            })?,
        })
    }

    pub fn dialogues_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.dialogues).map_err(|source| {
            EngineError::MalformedProject {
                file: "dialogues.json",
                source,
            }
        })
    }

    pub fn quests_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.quests).map_err(|source| {
            EngineError::MalformedProject {
                file: "quests.json",
                source,
            }
        })
    }

    pub fn connections_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.connections).map_err(|source| {
            EngineError::MalformedProject {
                file: "connections.json",
                source,
            }
        })
    }
}

/// A hydrated project: the graph plus load-time consistency findings.
#[derive(Debug)]
pub struct HydratedProject {
    pub graph: StoryGraph,

    /// Divergence between `connections.json` and per-port `connected_to`
    /// views. Warnings: the connection table is authoritative and the views
    /// regenerate from it on the next save.
    pub load_findings: Report,
}

/// Build the graph from loaded project data.
///
/// Record order becomes insertion order (dialogues, then quests), keeping
/// validation reports reproducible across load/save cycles. Fails only on
/// unknown node kinds and duplicate ids; everything else loads and is left
/// to validation.
pub fn hydrate(data: &ProjectData) -> Result<HydratedProject> {
    let mut graph = StoryGraph::new();

    for record in &data.dialogues {
        let kind = NodeKind::from_tag(&record.kind)
            .filter(NodeKind::is_dialogue)
            .ok_or_else(|| EngineError::UnknownNodeKind(record.kind.clone()))?;

        let mut node = Node::new(
            record.id.clone(),
            kind,
            NodeAttrs::Dialogue(record.attrs.clone()),
        )
        .with_position(record.position);
        node.draft = record.draft;
        for port in &record.ports {
            node = node.with_port(port.to_port());
        }
        graph.insert_node(node)?;
    }

    for record in &data.quests {
        let mut node = Node::new(
            record.id.clone(),
            NodeKind::Quest,
            NodeAttrs::Quest(record.attrs.clone()),
        )
        .with_position(record.position);
        node.draft = record.draft;
        for port in &record.ports {
            node = node.with_port(port.to_port());
        }
        graph.insert_node(node)?;
    }

    for record in &data.connections {
        let id = if record.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            record.id.clone()
        };
        graph.restore_connection(Connection {
            id,
            from_node: record.from_node.clone(),
            from_port: record.from_port.clone(),
            to_node: record.to_node.clone(),
            to_port: record.to_port.clone(),
        });
    }

    let load_findings = cross_file_findings(data, &graph);

    info!(
        dialogues = data.dialogues.len(),
        quests = data.quests.len(),
        connections = data.connections.len(),
        "project hydrated"
    );
    Ok(HydratedProject {
        graph,
        load_findings,
    })
}

/// Compare each record's `connected_to` view against the connection table.
fn cross_file_findings(data: &ProjectData, graph: &StoryGraph) -> Report {
    let mut report = Report::new();

    let record_ports = data
        .dialogues
        .iter()
        .flat_map(|r| r.ports.iter())
        .chain(data.quests.iter().flat_map(|r| r.ports.iter()));

    for port in record_ports {
        let recorded: HashSet<&PortId> = port.connected_to.iter().collect();
        let derived = graph.connected_peers(&port.id);
        let derived_set: HashSet<&PortId> = derived.iter().collect();

        if recorded != derived_set {
            warn!(port = %port.id, "connected_to diverges from connections.json");
            report.push(
                Finding::warning(
                    FindingKind::DanglingReference,
                    format!(
                        "port {} lists peers that diverge from connections.json; \
                         the connection list wins on the next save",
                        port.id
                    ),
                )
                .with_entity(&port.id),
            );
        }
    }
    report
}

/// Project the graph back into persisted records.
///
/// Every `connected_to` view and every quest `prerequisites` field is
/// regenerated from the canonical connection table, so the two redundant
/// copies of the schema cannot drift on save.
pub fn dehydrate(graph: &StoryGraph) -> ProjectData {
    let mut data = ProjectData::default();

    for node in graph.nodes() {
        let ports: Vec<PortRecord> = node
            .ports()
            .iter()
            .map(|port| PortRecord::from_port(port, graph))
            .collect();

        match &node.attrs {
            NodeAttrs::Dialogue(attrs) => data.dialogues.push(DialogueRecord {
                id: node.id.clone(),
                kind: node.kind().tag().to_string(),
                position: node.position,
                ports,
                draft: node.draft,
                attrs: attrs.clone(),
            }),
            NodeAttrs::Quest(attrs) => {
                let mut attrs = attrs.clone();
                if node.port_named(registry::PORT_PREREQUISITES).is_some() {
                    attrs.prerequisites = graph.quest_prerequisites(&node.id);
                }
                data.quests.push(QuestRecord {
                    id: node.id.clone(),
                    position: node.position,
                    ports,
                    draft: node.draft,
                    attrs,
                });
            }
        }
    }

    for connection in graph.connections() {
        data.connections.push(ConnectionRecord {
            id: connection.id.clone(),
            from_node: connection.from_node.clone(),
            from_port: connection.from_port.clone(),
            to_node: connection.to_node.clone(),
            to_port: connection.to_port.clone(),
        });
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_model::{NodeId, Objective};

    fn sample_graph() -> StoryGraph {
        let mut graph = StoryGraph::new();
        graph.create_node("dialogue-standard", "intro", (10.0, 20.0)).unwrap();
        graph.create_node("dialogue-standard", "reply", (300.0, 20.0)).unwrap();
        graph.create_node("quest", "find_lost_item", (0.0, 200.0)).unwrap();
        graph.create_node("quest", "forest_mystery", (250.0, 200.0)).unwrap();

        {
            let attrs = graph
                .node_mut(&NodeId::from("find_lost_item"))
                .unwrap()
                .quest_mut()
                .unwrap();
            attrs.title = "The Lost Item".to_string();
            attrs.objectives.push(Objective::new("locate", "Locate the item"));
            attrs.reward_xp = 100;
        }
        {
            let attrs = graph
                .node_mut(&NodeId::from("forest_mystery"))
                .unwrap()
                .quest_mut()
                .unwrap();
            attrs.title = "Forest Mystery".to_string();
        }
        {
            let node = graph.node_mut(&NodeId::from("intro")).unwrap();
            let attrs = node.dialogue_mut().unwrap();
            attrs.speaker = "Elder".to_string();
            attrs.text = "Someone stole the heirloom.".to_string();
        }

        let intro_out = graph
            .node(&NodeId::from("intro"))
            .unwrap()
            .port_named("output")
            .unwrap()
            .id
            .clone();
        let reply_in = graph
            .node(&NodeId::from("reply"))
            .unwrap()
            .port_named("input")
            .unwrap()
            .id
            .clone();
        graph.connect(&intro_out, &reply_in).unwrap();

        let unlocks = graph
            .node(&NodeId::from("find_lost_item"))
            .unwrap()
            .port_named(registry::PORT_UNLOCKS)
            .unwrap()
            .id
            .clone();
        let prereq = graph
            .node(&NodeId::from("forest_mystery"))
            .unwrap()
            .port_named(registry::PORT_PREREQUISITES)
            .unwrap()
            .id
            .clone();
        graph.connect(&unlocks, &prereq).unwrap();

        graph
    }

    #[test]
    fn test_round_trip_is_value_identical() {
        let graph = sample_graph();
        let saved = dehydrate(&graph);

        let dialogues = saved.dialogues_json().unwrap();
        let quests = saved.quests_json().unwrap();
        let connections = saved.connections_json().unwrap();

        let loaded = ProjectData::from_json(&dialogues, &quests, &connections).unwrap();
        assert_eq!(loaded, saved);

        let hydrated = hydrate(&loaded).unwrap();
        assert!(hydrated.load_findings.is_empty());

        // Saving the untouched reload reproduces the same records, including
        // connected_to sets and the regenerated prerequisites field.
        let resaved = dehydrate(&hydrated.graph);
        assert_eq!(resaved, saved);
        assert_eq!(
            resaved.quests[1].attrs.prerequisites,
            vec![NodeId::from("find_lost_item")]
        );
    }

    #[test]
    fn test_prerequisites_field_regenerates_from_ports() {
        let mut graph = sample_graph();
        // Drift the field away from the port-derived truth.
        graph
            .node_mut(&NodeId::from("forest_mystery"))
            .unwrap()
            .quest_mut()
            .unwrap()
            .prerequisites = vec![NodeId::from("stale_entry")];

        let saved = dehydrate(&graph);
        assert_eq!(
            saved.quests[1].attrs.prerequisites,
            vec![NodeId::from("find_lost_item")]
        );
    }

    #[test]
    fn test_unknown_kind_rejects_load() {
        let dialogues = r#"[{"id": "weird", "kind": "cutscene", "speaker": "", "text": ""}]"#;
        let data = ProjectData::from_json(dialogues, "[]", "[]").unwrap();

        let err = hydrate(&data).unwrap_err();
        assert!(matches!(err, EngineError::UnknownNodeKind(tag) if tag == "cutscene"));
    }

    #[test]
    fn test_quest_kind_does_not_belong_in_dialogues_file() {
        let dialogues = r#"[{"id": "sneaky", "kind": "quest", "speaker": "", "text": ""}]"#;
        let data = ProjectData::from_json(dialogues, "[]", "[]").unwrap();
        assert!(hydrate(&data).is_err());
    }

    #[test]
    fn test_divergent_connected_to_is_reported() {
        let dialogues = r#"[
            {"id": "a", "kind": "dialogue-standard", "speaker": "", "text": "",
             "ports": [{"id": "a_out", "name": "output", "port_type": "output",
                        "data_type": "flow", "connection_limit": 1,
                        "connected_to": ["b_in"]}]},
            {"id": "b", "kind": "dialogue-standard", "speaker": "", "text": "",
             "ports": [{"id": "b_in", "name": "input", "port_type": "input",
                        "data_type": "flow", "connected_to": ["a_out"]}]}
        ]"#;
        // connections.json lost the edge the ports still remember.
        let data = ProjectData::from_json(dialogues, "[]", "[]").unwrap();

        let hydrated = hydrate(&data).unwrap();
        assert_eq!(hydrated.load_findings.len(), 2);
        assert!(!hydrated.load_findings.has_errors());

        // The table is authoritative: the stale views do not resurrect the
        // edge, and the next save drops them.
        assert!(hydrated.graph.connections().is_empty());
        let resaved = dehydrate(&hydrated.graph);
        assert!(resaved.dialogues[0].ports[0].connected_to.is_empty());
    }

    #[test]
    fn test_invalid_loaded_connections_still_hydrate() {
        let connections = r#"[
            {"id": "c1", "from_node": "ghost", "from_port": "gp",
             "to_node": "also_ghost", "to_port": "ap"}
        ]"#;
        let data = ProjectData::from_json("[]", "[]", connections).unwrap();

        let hydrated = hydrate(&data).unwrap();
        assert_eq!(hydrated.graph.connections().len(), 1);

        // The dangling endpoints are validation findings, not load errors.
        let report = crate::validate::validate(&hydrated.graph);
        assert!(report.has_errors());
    }

    #[test]
    fn test_connection_records_keep_their_ids() {
        let graph = sample_graph();
        let saved = dehydrate(&graph);
        let hydrated = hydrate(&saved).unwrap();
        let resaved = dehydrate(&hydrated.graph);

        let ids: Vec<&str> = saved.connections.iter().map(|c| c.id.as_str()).collect();
        let reloaded: Vec<&str> = resaved.connections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, reloaded);
    }
}
