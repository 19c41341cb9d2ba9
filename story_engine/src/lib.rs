//! # Story Engine
//!
//! The "Drafting Table" crate - the authoring engine for branching narrative
//! projects. It owns the typed node/port graph, per-quest objective
//! dependency DAGs, the static validation engine, the runtime progress
//! evaluator, and the JSON project adapter.
//!
//! ## Core Components
//!
//! - **graph**: nodes, typed ports, the node-kind registry, and the canonical
//!   connection table
//! - **objectives**: per-quest dependency DAGs with cycle-safe insertion
//! - **validate**: structural, cycle, and reachability analysis producing an
//!   ordered report with fix suggestions
//! - **progress**: objective and quest lifecycle evaluation against shared
//!   world state
//! - **project**: the three persisted JSON collections and their graph
//!   mapping
//!
//! ## Design Philosophy
//!
//! - **Single-threaded and cooperative**: every operation runs to completion
//!   before yielding; nothing suspends mid-computation
//! - **Editable even when invalid**: loaders never reject inconsistent data
//!   that validation can report instead
//! - **Explicit world state**: evaluation takes `&WorldState` as a parameter,
//!   never ambient state, so simulations are reproducible

mod analysis;
mod eval;

pub mod error;
pub mod graph;
pub mod objectives;
pub mod progress;
pub mod project;
pub mod validate;

pub use error::*;
pub use graph::*;
pub use objectives::*;
pub use progress::*;
pub use project::*;
pub use validate::*;
