//! Progress engine - objective and quest lifecycle evaluation.
//!
//! The engine derives lifecycle states from the graph plus world state and
//! advances them when the caller records progress or reports a world-state
//! change. World state is always passed in explicitly, never stored, so a
//! simulation driven from snapshots is reproducible.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use story_model::{NodeId, ObjectiveId, WorldState};

use crate::error::{EngineError, Result};
use crate::eval::condition_holds;
use crate::graph::{NodeKind, StoryGraph};

/// Lifecycle of a single objective.
///
/// Locked -> Available (dependencies complete, condition true) ->
/// InProgress (some progress recorded) -> Completed (threshold met).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

/// Lifecycle of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestStatus {
    #[default]
    NotStarted,
    Active,
    Completed,
    Failed,
}

impl QuestStatus {
    /// Completed and Failed are terminal for non-repeatable quests.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }
}

/// Transition notifications returned to the simulation driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    QuestActivated {
        quest: NodeId,
    },
    QuestCompleted {
        quest: NodeId,
        /// Branch target chosen on completion, if any condition matched.
        next: Option<NodeId>,
    },
    QuestFailed {
        quest: NodeId,
    },
    ObjectiveCompleted {
        quest: NodeId,
        objective: ObjectiveId,
    },
}

/// Runtime evaluator over a validated graph.
///
/// Quest statuses live here; objective progress lives in the objective
/// records themselves so it persists with the project.
#[derive(Debug, Clone, Default)]
pub struct ProgressEngine {
    statuses: HashMap<NodeId, QuestStatus>,
}

impl ProgressEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of a quest. Unknown quests read as NotStarted.
    pub fn quest_status(&self, quest: &NodeId) -> QuestStatus {
        self.statuses.get(quest).copied().unwrap_or_default()
    }

    /// Derive the status of one objective from its record and world state.
    pub fn objective_status(
        &self,
        graph: &StoryGraph,
        quest: &NodeId,
        objective: &ObjectiveId,
        world: &WorldState,
    ) -> Result<ObjectiveStatus> {
        let node = graph
            .node(quest)
            .ok_or_else(|| EngineError::dangling("node", quest))?;
        let attrs = node
            .quest()
            .ok_or_else(|| EngineError::NotAQuest(quest.clone()))?;
        let record = attrs
            .objective(objective)
            .ok_or_else(|| EngineError::dangling("objective", objective))?;

        if record.is_complete() {
            return Ok(ObjectiveStatus::Completed);
        }

        let dependencies_met = record
            .dependencies
            .iter()
            .all(|dep| attrs.objective(dep).is_some_and(|o| o.is_complete()));
        if !dependencies_met || !condition_holds(&record.condition, world) {
            return Ok(ObjectiveStatus::Locked);
        }

        if record.progress_current > 0 {
            Ok(ObjectiveStatus::InProgress)
        } else {
            Ok(ObjectiveStatus::Available)
        }
    }

    fn prerequisites_met(&self, graph: &StoryGraph, quest: &NodeId) -> bool {
        graph
            .quest_prerequisites(quest)
            .iter()
            .all(|p| self.quest_status(p) == QuestStatus::Completed)
    }

    /// Explicit start signal from the player or editor.
    ///
    /// Returns true when the quest transitioned to Active, false when it was
    /// already past NotStarted. Fails while prerequisites are incomplete.
    pub fn start_quest(&mut self, graph: &StoryGraph, quest: &NodeId) -> Result<bool> {
        let node = graph
            .node(quest)
            .ok_or_else(|| EngineError::dangling("node", quest))?;
        if node.quest().is_none() {
            return Err(EngineError::NotAQuest(quest.clone()));
        }

        if self.quest_status(quest) != QuestStatus::NotStarted {
            return Ok(false);
        }
        if !self.prerequisites_met(graph, quest) {
            return Err(EngineError::PrerequisitesNotMet(quest.clone()));
        }

        self.statuses.insert(quest.clone(), QuestStatus::Active);
        debug!(quest = %quest, "quest started");
        Ok(true)
    }

    /// Record progress on an objective of an active quest and cascade any
    /// resulting transitions. Progress against locked objectives or inactive
    /// quests is ignored.
    pub fn record_progress(
        &mut self,
        graph: &mut StoryGraph,
        quest: &NodeId,
        objective: &ObjectiveId,
        amount: i64,
        world: &WorldState,
    ) -> Result<Vec<ProgressEvent>> {
        if self.quest_status(quest) != QuestStatus::Active {
            return Ok(Vec::new());
        }

        match self.objective_status(graph, quest, objective, world)? {
            ObjectiveStatus::Locked | ObjectiveStatus::Completed => return Ok(Vec::new()),
            ObjectiveStatus::Available | ObjectiveStatus::InProgress => {}
        }

        let mut events = Vec::new();
        let completed = {
            let record = graph
                .node_mut(quest)
                .and_then(|n| n.quest_mut())
                .and_then(|attrs| attrs.objective_mut(objective))
                .ok_or_else(|| EngineError::dangling("objective", objective))?;
            record.add_progress(amount)
        };
        if completed {
            debug!(quest = %quest, objective = %objective, "objective completed");
            events.push(ProgressEvent::ObjectiveCompleted {
                quest: quest.clone(),
                objective: objective.clone(),
            });
        }

        events.extend(self.sync(graph, world));
        Ok(events)
    }

    /// Re-evaluate every quest against current world state, cascading until
    /// nothing changes. Callers invoke this whenever world state changes;
    /// failure conditions are checked here.
    pub fn sync(&mut self, graph: &mut StoryGraph, world: &WorldState) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        loop {
            let step = self.sync_step(graph, world);
            if step.is_empty() {
                break;
            }
            events.extend(step);
        }
        events
    }

    fn sync_step(&mut self, graph: &mut StoryGraph, world: &WorldState) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        let quest_ids: Vec<NodeId> = graph
            .nodes()
            .filter(|n| n.kind() == NodeKind::Quest)
            .map(|n| n.id.clone())
            .collect();

        for id in quest_ids {
            match self.quest_status(&id) {
                QuestStatus::NotStarted => {
                    let auto_start = graph
                        .node(&id)
                        .and_then(|n| n.quest())
                        .map_or(false, |q| q.auto_start);
                    if auto_start && self.prerequisites_met(graph, &id) {
                        self.statuses.insert(id.clone(), QuestStatus::Active);
                        debug!(quest = %id, "quest auto-started");
                        events.push(ProgressEvent::QuestActivated { quest: id });
                    }
                }
                QuestStatus::Active => {
                    events.extend(self.advance_active_quest(graph, &id, world));
                }
                QuestStatus::Completed | QuestStatus::Failed => {}
            }
        }

        events
    }

    fn advance_active_quest(
        &mut self,
        graph: &mut StoryGraph,
        id: &NodeId,
        world: &WorldState,
    ) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        let failed = graph.node(id).and_then(|n| n.quest()).map_or(false, |q| {
            q.can_fail && q.failure_conditions.iter().any(|c| condition_holds(c, world))
        });
        if failed {
            self.statuses.insert(id.clone(), QuestStatus::Failed);
            debug!(quest = %id, "quest failed");
            events.push(ProgressEvent::QuestFailed { quest: id.clone() });
            return events;
        }

        // Auto-complete objectives fire the moment they become available.
        let ready_to_auto: Vec<ObjectiveId> = graph
            .node(id)
            .and_then(|n| n.quest())
            .map(|attrs| {
                attrs
                    .objectives
                    .iter()
                    .filter(|o| o.auto_complete && !o.is_complete())
                    .filter(|o| {
                        o.dependencies
                            .iter()
                            .all(|dep| attrs.objective(dep).is_some_and(|d| d.is_complete()))
                            && condition_holds(&o.condition, world)
                    })
                    .map(|o| o.id.clone())
                    .collect()
            })
            .unwrap_or_default();

        for objective in ready_to_auto {
            if let Some(record) = graph
                .node_mut(id)
                .and_then(|n| n.quest_mut())
                .and_then(|attrs| attrs.objective_mut(&objective))
            {
                record.force_complete();
                events.push(ProgressEvent::ObjectiveCompleted {
                    quest: id.clone(),
                    objective,
                });
            }
        }

        let complete = graph
            .node(id)
            .and_then(|n| n.quest())
            .map_or(false, |q| q.non_optional_complete());
        if complete {
            self.statuses.insert(id.clone(), QuestStatus::Completed);
            debug!(quest = %id, "quest completed");

            // First true branch in declaration order decides what follows.
            let next = graph.node(id).and_then(|n| n.quest()).and_then(|q| {
                q.branches
                    .iter()
                    .find(|b| condition_holds(&b.condition, world))
                    .map(|b| b.target.clone())
            });
            events.push(ProgressEvent::QuestCompleted {
                quest: id.clone(),
                next: next.clone(),
            });

            if let Some(next_id) = next {
                let next_is_quest = graph
                    .node(&next_id)
                    .map_or(false, |n| n.kind() == NodeKind::Quest);
                if next_is_quest
                    && self.quest_status(&next_id) == QuestStatus::NotStarted
                    && self.prerequisites_met(graph, &next_id)
                {
                    self.statuses.insert(next_id.clone(), QuestStatus::Active);
                    events.push(ProgressEvent::QuestActivated { quest: next_id });
                }
            }
        }

        events
    }

    /// Return a completed repeatable quest to NotStarted with zeroed
    /// objective progress. Non-repeatable quests are terminal; returns
    /// whether a reset happened.
    pub fn reset_quest(&mut self, graph: &mut StoryGraph, quest: &NodeId) -> Result<bool> {
        let node = graph
            .node(quest)
            .ok_or_else(|| EngineError::dangling("node", quest))?;
        let repeatable = node
            .quest()
            .ok_or_else(|| EngineError::NotAQuest(quest.clone()))?
            .repeatable;

        if !repeatable || self.quest_status(quest) != QuestStatus::Completed {
            return Ok(false);
        }

        if let Some(attrs) = graph.node_mut(quest).and_then(|n| n.quest_mut()) {
            for objective in attrs.objectives.iter_mut() {
                objective.reset();
            }
        }
        self.statuses.insert(quest.clone(), QuestStatus::NotStarted);
        Ok(true)
    }
}
