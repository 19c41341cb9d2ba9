//! Graph traversal helpers shared by the validation engine and the
//! objective subgraph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Collect every distinct cycle in a directed graph.
///
/// Three-color depth-first search: a back edge into an in-progress (gray)
/// node spells the cycle out along the current path. The search runs to
/// completion instead of stopping at the first hit. Each cycle is normalized
/// by rotating its smallest id to the front, so rotations of the same cycle
/// deduplicate and the output is stable for a given insertion order.
pub(crate) fn find_cycles<I>(order: &[I], edges: &HashMap<I, Vec<I>>) -> Vec<Vec<I>>
where
    I: Clone + Eq + Hash + Ord,
{
    let mut marks: HashMap<I, Mark> = HashMap::new();
    let mut path: Vec<I> = Vec::new();
    let mut cycles: Vec<Vec<I>> = Vec::new();

    for node in order {
        if mark_of(&marks, node) == Mark::White {
            visit(node, edges, &mut marks, &mut path, &mut cycles);
        }
    }

    let mut seen: HashSet<Vec<I>> = HashSet::new();
    let mut distinct = Vec::new();
    for cycle in cycles {
        let normalized = rotate_min_first(cycle);
        if seen.insert(normalized.clone()) {
            distinct.push(normalized);
        }
    }
    distinct
}

fn mark_of<I: Eq + Hash>(marks: &HashMap<I, Mark>, node: &I) -> Mark {
    marks.get(node).copied().unwrap_or(Mark::White)
}

fn visit<I>(
    node: &I,
    edges: &HashMap<I, Vec<I>>,
    marks: &mut HashMap<I, Mark>,
    path: &mut Vec<I>,
    cycles: &mut Vec<Vec<I>>,
) where
    I: Clone + Eq + Hash + Ord,
{
    marks.insert(node.clone(), Mark::Gray);
    path.push(node.clone());

    if let Some(next) = edges.get(node) {
        for peer in next {
            match mark_of(marks, peer) {
                Mark::White => visit(peer, edges, marks, path, cycles),
                Mark::Gray => {
                    if let Some(start) = path.iter().position(|p| p == peer) {
                        cycles.push(path[start..].to_vec());
                    }
                }
                Mark::Black => {}
            }
        }
    }

    path.pop();
    marks.insert(node.clone(), Mark::Black);
}

fn rotate_min_first<I: Clone + Ord>(cycle: Vec<I>) -> Vec<I> {
    let Some(min_index) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    else {
        return cycle;
    };

    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_index..]);
    rotated.extend_from_slice(&cycle[..min_index]);
    rotated
}

/// Breadth-first reachability from a seed set.
///
/// Deterministic: seeds are visited in the order given, edges in adjacency
/// order. Returns every reached id in visit order (nearest first).
pub(crate) fn bfs_reachable<I>(seeds: &[I], edges: &HashMap<I, Vec<I>>) -> Vec<I>
where
    I: Clone + Eq + Hash,
{
    let mut visited: HashSet<I> = HashSet::new();
    let mut visit_order: Vec<I> = Vec::new();
    let mut queue: VecDeque<I> = VecDeque::new();

    for seed in seeds {
        if visited.insert(seed.clone()) {
            visit_order.push(seed.clone());
            queue.push_back(seed.clone());
        }
    }

    while let Some(current) = queue.pop_front() {
        if let Some(next) = edges.get(&current) {
            for peer in next {
                if visited.insert(peer.clone()) {
                    visit_order.push(peer.clone());
                    queue.push_back(peer.clone());
                }
            }
        }
    }

    visit_order
}
