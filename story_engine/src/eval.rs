//! Condition evaluation at engine call sites.

use story_model::{Condition, WorldState};
use tracing::warn;

/// Evaluate a stored condition string against world state.
///
/// An unparsable expression gates closed (evaluates false) rather than
/// unlocking content, and is logged once per evaluation.
pub(crate) fn condition_holds(expression: &str, world: &WorldState) -> bool {
    match Condition::parse(expression) {
        Ok(condition) => condition.eval(world),
        Err(err) => {
            warn!(%err, "treating unparsable condition as false");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsable_condition_gates_closed() {
        let world = WorldState::new();
        assert!(!condition_holds("gold >=", &world));
        assert!(condition_holds("", &world));
    }
}
