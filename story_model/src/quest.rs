//! Quest and objective records - the authored data carried by quest nodes.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ids::{NodeId, ObjectiveId};

fn default_progress_required() -> i64 {
    1
}

fn default_progress_type() -> String {
    "count".to_string()
}

fn default_priority() -> i32 {
    1
}

/// A sub-task within a quest, tracked with its own dependencies and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,

    pub description: String,

    /// Sibling objectives that must be completed first. The relation over
    /// one quest's objectives must stay acyclic.
    #[serde(default)]
    pub dependencies: Vec<ObjectiveId>,

    #[serde(default)]
    pub progress_current: i64,

    #[serde(default = "default_progress_required")]
    pub progress_required: i64,

    /// Tag describing how completion is measured ("count", "collect", ...).
    #[serde(default = "default_progress_type")]
    pub progress_type: String,

    /// Optional objectives never block quest completion.
    #[serde(default)]
    pub optional: bool,

    /// Hidden objectives are not shown until unlocked.
    #[serde(default)]
    pub hidden: bool,

    /// Completes the instant its threshold is met, without confirmation.
    #[serde(default)]
    pub auto_complete: bool,

    /// Availability gate over world state; empty means always available.
    #[serde(default)]
    pub condition: String,
}

impl Objective {
    /// Create a new objective with a single unit of required progress.
    pub fn new(id: impl Into<ObjectiveId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            dependencies: Vec::new(),
            progress_current: 0,
            progress_required: 1,
            progress_type: default_progress_type(),
            optional: false,
            hidden: false,
            auto_complete: false,
            condition: String::new(),
        }
    }

    /// Add a dependency on a sibling objective.
    pub fn with_dependency(mut self, id: impl Into<ObjectiveId>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Set the required progress threshold.
    pub fn with_progress_required(mut self, required: i64) -> Self {
        self.progress_required = required;
        self
    }

    /// Set how completion is measured.
    pub fn with_progress_type(mut self, tag: impl Into<String>) -> Self {
        self.progress_type = tag.into();
        self
    }

    /// Set the availability condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Mark the objective optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Hide the objective until it unlocks.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Complete automatically when the threshold is met.
    pub fn auto_complete(mut self) -> Self {
        self.auto_complete = true;
        self
    }

    /// Whether the progress threshold has been met.
    pub fn is_complete(&self) -> bool {
        self.progress_current >= self.progress_required
    }

    /// Add progress, clamped at the threshold. Returns true when the
    /// threshold is newly crossed.
    pub fn add_progress(&mut self, amount: i64) -> bool {
        if self.is_complete() {
            return false;
        }
        self.progress_current = (self.progress_current + amount).min(self.progress_required);
        self.is_complete()
    }

    /// Drive progress straight to the threshold.
    pub fn force_complete(&mut self) {
        self.progress_current = self.progress_required;
    }

    /// Zero the progress counter (repeatable quest reset).
    pub fn reset(&mut self) {
        self.progress_current = 0;
    }
}

/// One conditional branch: when `condition` evaluates true, `target`
/// activates next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub condition: String,
    pub target: NodeId,
}

/// Ordered branch list, persisted as a JSON object whose declaration order is
/// significant: the first condition evaluating true wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchList(pub Vec<Branch>);

impl BranchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a branch.
    pub fn push(&mut self, condition: impl Into<String>, target: impl Into<NodeId>) {
        self.0.push(Branch {
            condition: condition.into(),
            target: target.into(),
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Branch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a BranchList {
    type Item = &'a Branch;
    type IntoIter = std::slice::Iter<'a, Branch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for BranchList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for branch in &self.0 {
            map.serialize_entry(&branch.condition, &branch.target)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BranchList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BranchVisitor;

        impl<'de> Visitor<'de> for BranchVisitor {
            type Value = BranchList;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of condition expression to target id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut branches = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((condition, target)) = access.next_entry::<String, NodeId>()? {
                    branches.push(Branch { condition, target });
                }
                Ok(BranchList(branches))
            }
        }

        deserializer.deserialize_map(BranchVisitor)
    }
}

/// Authored attributes of a quest node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestAttrs {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Higher priority sorts first in the default quest listing.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Minimum player level.
    #[serde(default)]
    pub level_requirement: u32,

    /// Quests that must be completed before this one may start. This is a
    /// denormalized projection of the prerequisites port, regenerated on
    /// every save; the port-derived set is authoritative.
    #[serde(default)]
    pub prerequisites: Vec<NodeId>,

    /// Ordered as authored; display order, not dependency order.
    #[serde(default)]
    pub objectives: Vec<Objective>,

    /// Becomes Active automatically once prerequisites are satisfied.
    #[serde(default)]
    pub auto_start: bool,

    /// Failure states are only reachable when set.
    #[serde(default)]
    pub can_fail: bool,

    /// May re-enter NotStarted after completion.
    #[serde(default)]
    pub repeatable: bool,

    #[serde(default)]
    pub reward_xp: i64,

    #[serde(default)]
    pub reward_gold: i64,

    /// Minutes; 0 means no limit.
    #[serde(default)]
    pub time_limit: u32,

    /// Region restriction; empty means unrestricted.
    #[serde(default)]
    pub region_locked: String,

    /// Evaluated in declaration order when the quest completes; the first
    /// true condition decides what activates next.
    #[serde(default)]
    pub branches: BranchList,

    /// Any expression evaluating true fails the quest (when `can_fail`).
    #[serde(default)]
    pub failure_conditions: Vec<String>,
}

impl QuestAttrs {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: default_priority(),
            level_requirement: 0,
            prerequisites: Vec::new(),
            objectives: Vec::new(),
            auto_start: false,
            can_fail: false,
            repeatable: false,
            reward_xp: 0,
            reward_gold: 0,
            time_limit: 0,
            region_locked: String::new(),
            branches: BranchList::new(),
            failure_conditions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_prerequisite(mut self, quest: impl Into<NodeId>) -> Self {
        self.prerequisites.push(quest.into());
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

    pub fn with_failure_condition(mut self, condition: impl Into<String>) -> Self {
        self.failure_conditions.push(condition.into());
        self
    }

    pub fn with_rewards(mut self, xp: i64, gold: i64) -> Self {
        self.reward_xp = xp;
        self.reward_gold = gold;
        self
    }

    pub fn auto_start(mut self) -> Self {
        self.auto_start = true;
        self
    }

    pub fn can_fail(mut self) -> Self {
        self.can_fail = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Look up an objective by id.
    pub fn objective(&self, id: &ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == *id)
    }

    pub fn objective_mut(&mut self, id: &ObjectiveId) -> Option<&mut Objective> {
        self.objectives.iter_mut().find(|o| o.id == *id)
    }

    /// Whether every non-optional objective has met its threshold.
    pub fn non_optional_complete(&self) -> bool {
        self.objectives
            .iter()
            .filter(|o| !o.optional)
            .all(Objective::is_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_progress_clamps() {
        let mut objective = Objective::new("kill_slimes", "Cull the slimes").with_progress_required(5);
        assert!(!objective.is_complete());

        assert!(!objective.add_progress(3));
        assert_eq!(objective.progress_current, 3);

        assert!(objective.add_progress(10));
        assert_eq!(objective.progress_current, 5);

        // Further progress is ignored once complete.
        assert!(!objective.add_progress(1));
        assert_eq!(objective.progress_current, 5);
    }

    #[test]
    fn test_objective_builder() {
        let objective = Objective::new("find_tracks", "Find the tracks")
            .with_dependency("search_forest")
            .with_condition("has_lantern")
            .optional()
            .hidden();

        assert_eq!(objective.dependencies, vec![ObjectiveId::from("search_forest")]);
        assert_eq!(objective.condition, "has_lantern");
        assert!(objective.optional);
        assert!(objective.hidden);
        assert!(!objective.auto_complete);
    }

    #[test]
    fn test_non_optional_complete_ignores_optional() {
        let mut attrs = QuestAttrs::new("Village Hero")
            .with_objective(Objective::new("main", "Main task"))
            .with_objective(Objective::new("extra", "Side task").optional());

        assert!(!attrs.non_optional_complete());
        attrs.objective_mut(&ObjectiveId::from("main")).unwrap().force_complete();
        assert!(attrs.non_optional_complete());
    }

    #[test]
    fn test_branch_list_preserves_declaration_order() {
        let json = r#"{"gold >= 100": "rich_path", "true": "default_path"}"#;
        let branches: BranchList = serde_json::from_str(json).unwrap();

        assert_eq!(branches.len(), 2);
        assert_eq!(branches.0[0].condition, "gold >= 100");
        assert_eq!(branches.0[0].target, NodeId::from("rich_path"));
        assert_eq!(branches.0[1].target, NodeId::from("default_path"));

        let back = serde_json::to_string(&branches).unwrap();
        assert_eq!(back, r#"{"gold >= 100":"rich_path","true":"default_path"}"#);
    }

    #[test]
    fn test_quest_attrs_defaults_from_json() {
        let json = r#"{"title": "Lost Item"}"#;
        let attrs: QuestAttrs = serde_json::from_str(json).unwrap();

        assert_eq!(attrs.priority, 1);
        assert!(!attrs.auto_start);
        assert!(attrs.objectives.is_empty());
        assert!(attrs.branches.is_empty());
        assert_eq!(attrs.time_limit, 0);
        assert_eq!(attrs.region_locked, "");
    }
}
