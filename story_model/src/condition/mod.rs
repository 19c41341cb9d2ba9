//! Condition expressions - the boolean grammar gating content on world state.
//!
//! Conditions are boolean formulas over flag truth values and resource
//! comparisons, with a fixed grammar:
//!
//! ```text
//! expr       := or
//! or         := and ("or" and)*
//! and        := not ("and" not)*
//! not        := "not" not | atom
//! atom       := "(" expr ")" | comparison | "true" | "false" | flag
//! comparison := ident (">=" | "<=" | "==" | "!=" | ">" | "<") integer
//! ident      := [a-zA-Z_][a-zA-Z0-9_.]*
//! ```
//!
//! A bare identifier reads a flag (unset flags are false); a comparison reads
//! a resource counter (unset resources are 0). The empty expression is
//! always true. Evaluation is pure against a world-state snapshot.

mod parser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world_state::WorldState;

/// Error raised when an expression does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid condition expression {expression:?}")]
pub struct ConditionError {
    pub expression: String,
}

/// Comparison operators usable against resource counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

/// A parsed condition expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Constant truth value. The empty expression parses to `Literal(true)`.
    Literal(bool),

    /// Truth value of a named flag.
    Flag(String),

    /// Numeric comparison against a resource counter.
    Comparison {
        resource: String,
        op: CompareOp,
        value: i64,
    },

    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Parse an expression. Empty or whitespace-only input is always true.
    pub fn parse(input: &str) -> Result<Self, ConditionError> {
        parser::parse(input)
    }

    /// Evaluate against a world-state snapshot. Pure and side-effect-free.
    pub fn eval(&self, world: &WorldState) -> bool {
        match self {
            Condition::Literal(value) => *value,
            Condition::Flag(name) => world.flag(name),
            Condition::Comparison {
                resource,
                op,
                value,
            } => op.apply(world.resource(resource), *value),
            Condition::Not(inner) => !inner.eval(world),
            Condition::And(lhs, rhs) => lhs.eval(world) && rhs.eval(world),
            Condition::Or(lhs, rhs) => lhs.eval(world) || rhs.eval(world),
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(expression: &str, world: &WorldState) -> Result<bool, ConditionError> {
    Ok(Condition::parse(expression)?.eval(world))
}
