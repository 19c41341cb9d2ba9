//! # Story Model
//!
//! The "Manuscript" crate - the single source of truth for authored narrative
//! data. It defines identifier newtypes, dialogue and quest records, the
//! shared world-state store, and the condition expression grammar that gates
//! content on that state. This crate holds no graph container and performs no
//! I/O; the authoring engine builds on top of it.

pub mod condition;
pub mod dialogue;
pub mod ids;
pub mod quest;
pub mod world_state;

pub use condition::*;
pub use dialogue::*;
pub use ids::*;
pub use quest::*;
pub use world_state::*;
