//! Objective subgraph - the per-quest dependency DAG.

use std::collections::{BTreeSet, HashMap, HashSet};

use story_model::{Objective, ObjectiveId, WorldState};

use crate::analysis;
use crate::error::{EngineError, Result};
use crate::eval::condition_holds;

/// Dependency graph over one quest's objectives.
///
/// The insertion API refuses edges that would close a cycle, so a graph
/// grown through it is always a DAG. Loaded data goes through the tolerant
/// [`ObjectiveGraph::from_objectives`] constructor instead, which accepts
/// inconsistencies as-is and leaves reporting them to the validation engine.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveGraph {
    order: Vec<ObjectiveId>,
    dependencies: HashMap<ObjectiveId, Vec<ObjectiveId>>,
    dangling: Vec<(ObjectiveId, ObjectiveId)>,
}

impl ObjectiveGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded objectives without rejecting anything. Dependencies
    /// on missing siblings are recorded for the validator; duplicate ids
    /// keep their first occurrence.
    pub fn from_objectives(objectives: &[Objective]) -> Self {
        let known: HashSet<&ObjectiveId> = objectives.iter().map(|o| &o.id).collect();
        let mut graph = Self::new();

        for objective in objectives {
            if graph.dependencies.contains_key(&objective.id) {
                continue;
            }
            let mut edges = Vec::new();
            for dependency in &objective.dependencies {
                if known.contains(dependency) {
                    edges.push(dependency.clone());
                } else {
                    graph
                        .dangling
                        .push((objective.id.clone(), dependency.clone()));
                }
            }
            graph.order.push(objective.id.clone());
            graph.dependencies.insert(objective.id.clone(), edges);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ObjectiveId) -> bool {
        self.dependencies.contains_key(id)
    }

    /// Dependencies recorded against missing siblings in loaded data.
    pub fn dangling_dependencies(&self) -> &[(ObjectiveId, ObjectiveId)] {
        &self.dangling
    }

    /// Dependency edges of one objective.
    pub fn dependencies_of(&self, id: &ObjectiveId) -> &[ObjectiveId] {
        self.dependencies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add an objective and its dependency edges.
    ///
    /// Fails without committing anything if the id is taken, a dependency
    /// names a missing sibling, or an edge would close a cycle.
    pub fn add_objective(&mut self, objective: &Objective) -> Result<()> {
        if self.dependencies.contains_key(&objective.id) {
            return Err(EngineError::DuplicateObjectiveId(objective.id.clone()));
        }
        for dependency in &objective.dependencies {
            if *dependency == objective.id {
                return Err(EngineError::CyclicDependency {
                    from: objective.id.clone(),
                    to: dependency.clone(),
                });
            }
            if !self.dependencies.contains_key(dependency) {
                return Err(EngineError::dangling("objective", dependency));
            }
            if self.can_reach(dependency, &objective.id) {
                return Err(EngineError::CyclicDependency {
                    from: objective.id.clone(),
                    to: dependency.clone(),
                });
            }
        }

        self.order.push(objective.id.clone());
        self.dependencies
            .insert(objective.id.clone(), objective.dependencies.clone());
        Ok(())
    }

    /// Add a dependency edge between existing objectives.
    ///
    /// Rejected with [`EngineError::CyclicDependency`] when the dependency
    /// target can already reach the dependent - committing the edge would
    /// close a cycle. The check is a single reachability walk from the
    /// target back toward the dependent, O(objectives + edges).
    pub fn add_dependency(&mut self, from: &ObjectiveId, dependency: &ObjectiveId) -> Result<()> {
        if !self.dependencies.contains_key(from) {
            return Err(EngineError::dangling("objective", from));
        }
        if !self.dependencies.contains_key(dependency) {
            return Err(EngineError::dangling("objective", dependency));
        }
        if from == dependency || self.can_reach(dependency, from) {
            return Err(EngineError::CyclicDependency {
                from: from.clone(),
                to: dependency.clone(),
            });
        }

        if let Some(edges) = self.dependencies.get_mut(from) {
            if !edges.contains(dependency) {
                edges.push(dependency.clone());
            }
        }
        Ok(())
    }

    fn can_reach(&self, start: &ObjectiveId, target: &ObjectiveId) -> bool {
        analysis::bfs_reachable(std::slice::from_ref(start), &self.dependencies)
            .iter()
            .any(|id| id == target)
    }

    /// Every distinct dependency cycle (empty for graphs grown through the
    /// insertion API; loaded data can carry them).
    pub fn cycles(&self) -> Vec<Vec<ObjectiveId>> {
        analysis::find_cycles(&self.order, &self.dependencies)
    }

    /// Stable topological ordering for display: ready objectives are emitted
    /// lowest insertion index first, and members of cycles are omitted.
    pub fn topological_order(&self) -> Vec<ObjectiveId> {
        let index: HashMap<&ObjectiveId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        let mut unmet = vec![0usize; self.order.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.order.len()];
        for (i, id) in self.order.iter().enumerate() {
            for dependency in self.dependencies_of(id) {
                if let Some(&dep_index) = index.get(dependency) {
                    unmet[i] += 1;
                    dependents[dep_index].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = unmet
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 0)
            .map(|(i, _)| i)
            .collect();

        let mut ordered = Vec::with_capacity(self.order.len());
        while let Some(i) = ready.pop_first() {
            ordered.push(self.order[i].clone());
            for &dependent in &dependents[i] {
                unmet[dependent] -= 1;
                if unmet[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }
        ordered
    }

    /// Objectives ready to work on: not yet complete, every dependency
    /// complete, and the availability condition true against world state.
    pub fn ready_set<'a>(
        &self,
        objectives: &'a [Objective],
        world: &WorldState,
    ) -> Vec<&'a Objective> {
        let by_id: HashMap<&ObjectiveId, &Objective> =
            objectives.iter().map(|o| (&o.id, o)).collect();

        let mut ready = Vec::new();
        for id in &self.order {
            let Some(objective) = by_id.get(id).copied() else {
                continue;
            };
            if objective.is_complete() {
                continue;
            }
            let dependencies_met = self
                .dependencies_of(id)
                .iter()
                .all(|dep| by_id.get(dep).is_some_and(|o| o.is_complete()));
            if dependencies_met && condition_holds(&objective.condition, world) {
                ready.push(objective);
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Objective> {
        vec![
            Objective::new("search_forest", "Search the forest"),
            Objective::new("find_tracks", "Find the tracks").with_dependency("search_forest"),
            Objective::new("recover_heirloom", "Recover the heirloom")
                .with_dependency("find_tracks"),
        ]
    }

    #[test]
    fn test_incremental_insertion() {
        let mut graph = ObjectiveGraph::new();
        for objective in chain() {
            graph.add_objective(&objective).unwrap();
        }
        assert_eq!(graph.len(), 3);
        assert!(graph.dangling_dependencies().is_empty());
    }

    #[test]
    fn test_dangling_dependency_rejected() {
        let mut graph = ObjectiveGraph::new();
        let orphan = Objective::new("late", "Late task").with_dependency("never_added");
        let err = graph.add_objective(&orphan).unwrap_err();
        assert!(matches!(err, EngineError::DanglingReference { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_cycle_closing_edge_rejected() {
        let mut graph = ObjectiveGraph::new();
        for objective in chain() {
            graph.add_objective(&objective).unwrap();
        }

        // recover_heirloom -> find_tracks -> search_forest already holds, so
        // search_forest depending on recover_heirloom would close a cycle.
        let err = graph
            .add_dependency(
                &ObjectiveId::from("search_forest"),
                &ObjectiveId::from("recover_heirloom"),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::CyclicDependency { .. }));

        // The rejected edge was never committed.
        assert!(graph
            .dependencies_of(&ObjectiveId::from("search_forest"))
            .is_empty());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut graph = ObjectiveGraph::new();
        let selfish = Objective::new("loop", "Depends on itself").with_dependency("loop");
        assert!(matches!(
            graph.add_objective(&selfish),
            Err(EngineError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_topological_order_is_stable() {
        let objectives = vec![
            Objective::new("report", "Report back").with_dependency("investigate"),
            Objective::new("intro", "Listen to the briefing"),
            Objective::new("investigate", "Investigate the area").with_dependency("intro"),
        ];
        let graph = ObjectiveGraph::from_objectives(&objectives);

        let order: Vec<String> = graph
            .topological_order()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(order, vec!["intro", "investigate", "report"]);
    }

    #[test]
    fn test_topological_order_omits_cycles() {
        let objectives = vec![
            Objective::new("a", "A").with_dependency("b"),
            Objective::new("b", "B").with_dependency("a"),
            Objective::new("free", "Independent"),
        ];
        let graph = ObjectiveGraph::from_objectives(&objectives);

        assert_eq!(graph.topological_order(), vec![ObjectiveId::from("free")]);
        assert_eq!(graph.cycles().len(), 1);
    }

    #[test]
    fn test_from_objectives_records_dangling() {
        let objectives =
            vec![Objective::new("task", "Task").with_dependency("missing_sibling")];
        let graph = ObjectiveGraph::from_objectives(&objectives);

        assert_eq!(
            graph.dangling_dependencies(),
            &[(
                ObjectiveId::from("task"),
                ObjectiveId::from("missing_sibling")
            )]
        );
    }

    #[test]
    fn test_ready_set_gates_on_dependencies_and_condition() {
        let mut objectives = chain();
        objectives[1].condition = "has_lantern".to_string();
        let graph = ObjectiveGraph::from_objectives(&objectives);

        let mut world = WorldState::new();
        let ready: Vec<&str> = graph
            .ready_set(&objectives, &world)
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ready, vec!["search_forest"]);

        // Completing the first objective is not enough while the condition
        // on find_tracks is false.
        objectives[0].force_complete();
        let ready: Vec<&str> = graph
            .ready_set(&objectives, &world)
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert!(ready.is_empty());

        world.set_flag("has_lantern", true);
        let ready: Vec<&str> = graph
            .ready_set(&objectives, &world)
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ready, vec!["find_tracks"]);
    }
}
