//! Validation findings - the report surface consumed by the external editor.

use serde::{Deserialize, Serialize};
use story_model::{NodeId, ObjectiveId, PortId};

/// Severity of a finding. The external tool refuses simulation/export while
/// any error-severity finding is present, but editing continues regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// The closed taxonomy of finding kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    IncompatibleConnection,
    ConnectionLimitExceeded,
    MissingRequiredConnection,
    InconsistentPrerequisites,
    CircularDependency,
    UnreachableNode,
    /// Only producible from loaded data; the instantiation API rejects
    /// unknown kinds before they ever reach the graph.
    UnknownNodeKind,
    DanglingReference,
}

/// A proposed edit resolving a finding. Suggestions are never applied
/// automatically; applying one is an ordinary graph mutation followed by
/// re-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fix", rename_all = "snake_case")]
pub enum FixSuggestion {
    /// Break a prerequisite cycle by removing its most recently added
    /// connection.
    RemoveConnection { from_port: PortId, to_port: PortId },

    /// Break an objective cycle by removing one dependency edge.
    RemoveDependency {
        quest: NodeId,
        objective: ObjectiveId,
        dependency: ObjectiveId,
    },

    /// Reconnect an unreachable node from the nearest reachable compatible
    /// output port.
    ConnectPorts { from_port: PortId, to_port: PortId },

    /// Overwrite the quest's prerequisites field with the port-derived set.
    SyncPrerequisites {
        quest: NodeId,
        prerequisites: Vec<NodeId>,
    },
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub kind: FindingKind,

    /// Ids of the implicated entities (nodes, ports, or objectives). For
    /// circular dependencies this is the full ordered cycle.
    pub entities: Vec<String>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<FixSuggestion>,
}

impl Finding {
    pub fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            entities: Vec::new(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            entities: Vec::new(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_entity(mut self, id: impl ToString) -> Self {
        self.entities.push(id.to_string());
        self
    }

    pub fn with_entities<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.entities.extend(ids.into_iter().map(|id| id.to_string()));
        self
    }

    pub fn with_suggestion(mut self, suggestion: FixSuggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

/// The ordered sequence of findings from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

impl IntoIterator for Report {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_severity_queries() {
        let mut report = Report::new();
        report.push(Finding::warning(
            FindingKind::UnreachableNode,
            "node island cannot be reached",
        ));
        assert!(!report.has_errors());

        report.push(
            Finding::error(FindingKind::DanglingReference, "missing port")
                .with_entity("p1"),
        );
        assert!(report.has_errors());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.of_kind(FindingKind::UnreachableNode).count(), 1);
    }

    #[test]
    fn test_finding_serializes_without_empty_suggestion() {
        let finding = Finding::warning(FindingKind::UnreachableNode, "island");
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("suggestion"));
        assert!(json.contains("unreachable_node"));
    }
}
