//! Validation engine - static analysis over the project graph.
//!
//! Three independent check families run over the full graph and, for each
//! quest, its objective subgraph: structural integrity, cycle detection, and
//! reachability. Validation is read-only - it never mutates nodes, ports, or
//! objectives - and produces an ordered report. Fixes are suggested, never
//! applied; applying one is an ordinary graph mutation that must be
//! re-validated.

mod findings;

pub use findings::{Finding, FindingKind, FixSuggestion, Report, Severity};

use std::collections::{HashMap, HashSet};
use tracing::debug;

use story_model::{NodeId, ObjectiveId};

use crate::analysis;
use crate::graph::{registry, DataType, Node, NodeKind, Port, PortDirection, StoryGraph};
use crate::objectives::ObjectiveGraph;

/// Caching front-end over [`validate`].
///
/// The cached report is keyed by the graph's revision counter, so any
/// mutation invalidates it and an unchanged graph revalidates for free.
/// Correctness always equals a full re-scan.
#[derive(Debug, Default)]
pub struct Validator {
    cache: Option<(u64, Report)>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the whole graph, reusing the cached report while the graph
    /// is unchanged.
    pub fn validate(&mut self, graph: &StoryGraph) -> Report {
        if let Some((revision, report)) = &self.cache {
            if *revision == graph.revision() {
                return report.clone();
            }
        }

        let report = validate(graph);
        self.cache = Some((graph.revision(), report.clone()));
        report
    }

    /// Re-check a single node's scope: its port occupancy plus, for quests,
    /// prerequisite consistency and the objective subgraph. Findings equal
    /// the corresponding subset of a full scan; graph-wide analyses (quest
    /// prerequisite cycles, reachability) still need [`Validator::validate`].
    pub fn validate_node(&self, graph: &StoryGraph, id: &NodeId) -> Report {
        let mut report = Report::new();
        let Some(node) = graph.node(id) else {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!("no node {id} in the graph"),
                )
                .with_entity(id),
            );
            return report;
        };

        check_node_ports(graph, node, &mut report);
        if node.kind() == NodeKind::Quest {
            check_quest_structure(graph, node, &mut report);
            check_objective_cycles(node, &mut report);
        }
        report
    }
}

/// Run all three check families over the graph.
pub fn validate(graph: &StoryGraph) -> Report {
    let mut report = Report::new();

    check_connections(graph, &mut report);
    for node in graph.nodes() {
        check_node_ports(graph, node, &mut report);
        if node.kind() == NodeKind::Quest {
            check_quest_structure(graph, node, &mut report);
        }
    }

    check_prerequisite_cycles(graph, &mut report);
    for node in graph.nodes() {
        if node.kind() == NodeKind::Quest {
            check_objective_cycles(node, &mut report);
        }
    }

    check_reachability(graph, &mut report);

    debug!(
        findings = report.len(),
        errors = report.errors().count(),
        "validation complete"
    );
    report
}

// ---------------------------------------------------------------------------
// Structural integrity
// ---------------------------------------------------------------------------

fn check_connections(graph: &StoryGraph, report: &mut Report) {
    for connection in graph.connections() {
        let from = resolve(graph, &connection.from_port);
        let to = resolve(graph, &connection.to_port);

        if from.is_none() {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!(
                        "connection {} references missing port {}",
                        connection.id, connection.from_port
                    ),
                )
                .with_entity(&connection.from_port),
            );
        }
        if to.is_none() {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!(
                        "connection {} references missing port {}",
                        connection.id, connection.to_port
                    ),
                )
                .with_entity(&connection.to_port),
            );
        }

        let (Some((from_node, from_port)), Some((to_node, to_port))) = (from, to) else {
            continue;
        };

        if from_node.id != connection.from_node || to_node.id != connection.to_node {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!(
                        "connection {} names nodes {} -> {} but its ports belong to {} -> {}",
                        connection.id,
                        connection.from_node,
                        connection.to_node,
                        from_node.id,
                        to_node.id
                    ),
                )
                .with_entities([&connection.from_node, &connection.to_node]),
            );
        }

        if from_port.direction() != PortDirection::Output
            || to_port.direction() != PortDirection::Input
        {
            report.push(
                Finding::error(
                    FindingKind::IncompatibleConnection,
                    format!(
                        "connection {} does not run from an output port to an input port",
                        connection.id
                    ),
                )
                .with_entities([&connection.from_port, &connection.to_port]),
            );
        } else if from_port.data_type() != to_port.data_type() {
            report.push(
                Finding::error(
                    FindingKind::IncompatibleConnection,
                    format!(
                        "connection {} links {} to {}",
                        connection.id,
                        from_port.data_type().tag(),
                        to_port.data_type().tag()
                    ),
                )
                .with_entities([&connection.from_port, &connection.to_port]),
            );
        }
    }
}

fn resolve<'g>(graph: &'g StoryGraph, port: &story_model::PortId) -> Option<(&'g Node, &'g Port)> {
    let owner = graph.port_owner(port)?;
    let node = graph.node(owner)?;
    Some((node, node.port(port)?))
}

fn check_node_ports(graph: &StoryGraph, node: &Node, report: &mut Report) {
    for port in node.ports() {
        let count = graph.connection_count(&port.id);

        if port.connection_limit >= 0 && count > port.connection_limit as usize {
            report.push(
                Finding::error(
                    FindingKind::ConnectionLimitExceeded,
                    format!(
                        "port {} of node {} holds {} connections, limit {}",
                        port.name, node.id, count, port.connection_limit
                    ),
                )
                .with_entities([node.id.to_string(), port.id.to_string()]),
            );
        }

        if port.required && count == 0 {
            report.push(
                Finding::error(
                    FindingKind::MissingRequiredConnection,
                    format!("required port {} of node {} is unconnected", port.name, node.id),
                )
                .with_entities([node.id.to_string(), port.id.to_string()]),
            );
        }
    }
}

fn check_quest_structure(graph: &StoryGraph, node: &Node, report: &mut Report) {
    let Some(attrs) = node.quest() else {
        return;
    };

    // The prerequisites field is a projection of the port; divergence means
    // the two copies drifted apart and the port-derived set wins.
    if node.port_named(registry::PORT_PREREQUISITES).is_some() {
        let derived = graph.quest_prerequisites(&node.id);
        let derived_set: HashSet<&NodeId> = derived.iter().collect();
        let field_set: HashSet<&NodeId> = attrs.prerequisites.iter().collect();

        if derived_set != field_set {
            report.push(
                Finding::error(
                    FindingKind::InconsistentPrerequisites,
                    format!(
                        "quest {} prerequisites field does not match its prerequisites port",
                        node.id
                    ),
                )
                .with_entity(&node.id)
                .with_suggestion(FixSuggestion::SyncPrerequisites {
                    quest: node.id.clone(),
                    prerequisites: derived,
                }),
            );
        }
    }

    for prerequisite in &attrs.prerequisites {
        if graph.node(prerequisite).is_none() {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!(
                        "quest {} lists missing prerequisite {}",
                        node.id, prerequisite
                    ),
                )
                .with_entities([&node.id, prerequisite]),
            );
        }
    }

    for branch in &attrs.branches {
        if graph.node(&branch.target).is_none() {
            report.push(
                Finding::error(
                    FindingKind::DanglingReference,
                    format!(
                        "branch of quest {} targets missing node {}",
                        node.id, branch.target
                    ),
                )
                .with_entities([&node.id, &branch.target]),
            );
        }
    }

    let known: HashSet<&ObjectiveId> = attrs.objectives.iter().map(|o| &o.id).collect();
    for objective in &attrs.objectives {
        for dependency in &objective.dependencies {
            if !known.contains(dependency) {
                report.push(
                    Finding::error(
                        FindingKind::DanglingReference,
                        format!(
                            "objective {} of quest {} depends on missing objective {}",
                            objective.id, node.id, dependency
                        ),
                    )
                    .with_entities([
                        node.id.to_string(),
                        objective.id.to_string(),
                        dependency.to_string(),
                    ]),
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

fn check_prerequisite_cycles(graph: &StoryGraph, report: &mut Report) {
    let quests: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.kind() == NodeKind::Quest)
        .map(|n| n.id.clone())
        .collect();

    let mut edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for quest in &quests {
        let prerequisites = graph
            .quest_prerequisites(quest)
            .into_iter()
            .filter(|p| graph.node(p).is_some_and(|n| n.kind() == NodeKind::Quest))
            .collect();
        edges.insert(quest.clone(), prerequisites);
    }

    for cycle in analysis::find_cycles(&quests, &edges) {
        let mut finding = Finding::error(
            FindingKind::CircularDependency,
            format!("circular quest prerequisites: {}", join_ids(&cycle)),
        )
        .with_entities(cycle.iter());

        if let Some(suggestion) = prerequisite_cycle_fix(graph, &cycle) {
            finding = finding.with_suggestion(suggestion);
        }
        report.push(finding);
    }
}

/// Suggest removing the most recently added connection among the cycle's
/// prerequisite edges (highest index in the connection table).
fn prerequisite_cycle_fix(graph: &StoryGraph, cycle: &[NodeId]) -> Option<FixSuggestion> {
    let mut latest: Option<usize> = None;

    for (index, connection) in graph.connections().iter().enumerate() {
        for k in 0..cycle.len() {
            let dependent = &cycle[k];
            let prerequisite = &cycle[(k + 1) % cycle.len()];

            let realizes_edge = connection.from_node == *prerequisite
                && connection.to_node == *dependent
                && graph
                    .node(dependent)
                    .and_then(|n| n.port(&connection.to_port))
                    .is_some_and(|p| p.name == registry::PORT_PREREQUISITES);

            if realizes_edge && latest.map_or(true, |l| index > l) {
                latest = Some(index);
            }
        }
    }

    latest.map(|index| {
        let connection = &graph.connections()[index];
        FixSuggestion::RemoveConnection {
            from_port: connection.from_port.clone(),
            to_port: connection.to_port.clone(),
        }
    })
}

fn check_objective_cycles(node: &Node, report: &mut Report) {
    let Some(attrs) = node.quest() else {
        return;
    };

    let subgraph = ObjectiveGraph::from_objectives(&attrs.objectives);
    for cycle in subgraph.cycles() {
        let mut finding = Finding::error(
            FindingKind::CircularDependency,
            format!(
                "circular objective dependencies in quest {}: {}",
                node.id,
                join_ids(&cycle)
            ),
        )
        .with_entities(cycle.iter());

        if let Some(suggestion) = objective_cycle_fix(node, &cycle) {
            finding = finding.with_suggestion(suggestion);
        }
        report.push(finding);
    }
}

/// Suggest removing the dependency declared by the latest-inserted objective
/// in the cycle.
fn objective_cycle_fix(node: &Node, cycle: &[ObjectiveId]) -> Option<FixSuggestion> {
    let attrs = node.quest()?;
    let index: HashMap<&ObjectiveId, usize> = attrs
        .objectives
        .iter()
        .enumerate()
        .map(|(i, o)| (&o.id, i))
        .collect();

    let mut latest: Option<(usize, usize)> = None;
    for k in 0..cycle.len() {
        let from = &cycle[k];
        let dependency = &cycle[(k + 1) % cycle.len()];
        let Some(&i) = index.get(from) else { continue };
        if attrs.objectives[i].dependencies.contains(dependency)
            && latest.map_or(true, |(l, _)| i > l)
        {
            latest = Some((i, k));
        }
    }

    latest.map(|(_, k)| FixSuggestion::RemoveDependency {
        quest: node.id.clone(),
        objective: cycle[k].clone(),
        dependency: cycle[(k + 1) % cycle.len()].clone(),
    })
}

fn join_ids<I: ToString>(ids: &[I]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

fn check_reachability(graph: &StoryGraph, report: &mut Report) {
    let mut entries: Vec<NodeId> = Vec::new();
    for node in graph.nodes() {
        let is_entry = match node.kind() {
            NodeKind::Quest => graph.quest_prerequisites(&node.id).is_empty(),
            _ => !has_incoming_flow(graph, node),
        };
        if is_entry {
            entries.push(node.id.clone());
        }
    }

    let mut edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for connection in graph.connections() {
        if graph.node(&connection.from_node).is_some() && graph.node(&connection.to_node).is_some()
        {
            edges
                .entry(connection.from_node.clone())
                .or_default()
                .push(connection.to_node.clone());
        }
    }

    let reached = analysis::bfs_reachable(&entries, &edges);
    let reached_set: HashSet<&NodeId> = reached.iter().collect();

    for node in graph.nodes() {
        if node.draft || reached_set.contains(&node.id) {
            continue;
        }

        let mut finding = Finding::warning(
            FindingKind::UnreachableNode,
            format!("node {} cannot be reached from any entry point", node.id),
        )
        .with_entity(&node.id);

        if let Some(suggestion) = reconnect_suggestion(graph, &reached, node) {
            finding = finding.with_suggestion(suggestion);
        }
        report.push(finding);
    }
}

fn has_incoming_flow(graph: &StoryGraph, node: &Node) -> bool {
    graph.connections().iter().any(|connection| {
        connection.to_node == node.id
            && node
                .port(&connection.to_port)
                .is_some_and(|p| {
                    p.direction() == PortDirection::Input && p.data_type() == DataType::Flow
                })
    })
}

/// Propose wiring the unreached node to the nearest reachable node that has
/// a type-compatible output port with spare capacity. "Nearest" is BFS visit
/// order from the entry set.
fn reconnect_suggestion(
    graph: &StoryGraph,
    reached: &[NodeId],
    target: &Node,
) -> Option<FixSuggestion> {
    let open_inputs: Vec<&Port> = target
        .ports()
        .iter()
        .filter(|p| {
            p.direction() == PortDirection::Input && p.has_capacity(graph.connection_count(&p.id))
        })
        .collect();
    if open_inputs.is_empty() {
        return None;
    }

    for source_id in reached {
        let Some(source) = graph.node(source_id) else {
            continue;
        };
        for port in source.ports() {
            if port.direction() != PortDirection::Output
                || !port.has_capacity(graph.connection_count(&port.id))
            {
                continue;
            }
            if let Some(input) = open_inputs.iter().find(|i| i.data_type() == port.data_type()) {
                return Some(FixSuggestion::ConnectPorts {
                    from_port: port.id.clone(),
                    to_port: input.id.clone(),
                });
            }
        }
    }
    None
}
