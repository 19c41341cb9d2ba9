//! Error types for the authoring engine.

use story_model::{NodeId, ObjectiveId, PortId};
use thiserror::Error;

/// Errors rejected synchronously at the engine API boundary.
///
/// Everything here is recoverable within an editing session: a rejected
/// mutation leaves the graph unchanged. Problems that must remain editable
/// (cycles or dangling references in loaded data) surface as validation
/// findings instead of errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Asked to instantiate a node kind the registry does not know.
    #[error("unknown node kind {0:?}")]
    UnknownNodeKind(String),

    #[error("node id {0} already exists")]
    DuplicateNodeId(NodeId),

    #[error("port id {0} already exists")]
    DuplicatePortId(PortId),

    #[error("objective id {0} already exists")]
    DuplicateObjectiveId(ObjectiveId),

    /// An id was referenced but nothing with that id exists.
    #[error("dangling reference to {entity} {id:?}")]
    DanglingReference { entity: &'static str, id: String },

    /// Connection endpoints whose directions or data types do not line up.
    #[error("incompatible connection {from} -> {to}: {reason}")]
    IncompatibleConnection {
        from: PortId,
        to: PortId,
        reason: String,
    },

    /// The port has no capacity for another connection.
    #[error("connection limit exceeded on port {0}")]
    ConnectionLimitExceeded(PortId),

    /// Committing the dependency edge would close a cycle.
    #[error("dependency {from} -> {to} would create a cycle")]
    CyclicDependency { from: ObjectiveId, to: ObjectiveId },

    /// The node exists but is not a quest.
    #[error("node {0} is not a quest")]
    NotAQuest(NodeId),

    /// The quest cannot start while prerequisites are incomplete.
    #[error("prerequisites of quest {0} are not satisfied")]
    PrerequisitesNotMet(NodeId),

    /// A project collection failed to parse or serialize.
    #[error("malformed project file {file}: {source}")]
    MalformedProject {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    pub(crate) fn dangling(entity: &'static str, id: impl ToString) -> Self {
        EngineError::DanglingReference {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
