//! Topology compilation: processing order, cycle handling and input lists.
//!
//! Compilation runs on the control thread whenever the graph is dirty. It
//! produces a flat [`Schedule`] the renderer walks once per quantum:
//!
//! 1. Delay nodes that lie on a cycle are marked as *cycle delays*. Their
//!    audio input is consumed at the end of the quantum, so edges into them
//!    do not count as dependencies.
//! 2. Kahn's algorithm orders the remaining dependencies (audio and param
//!    edges alike).
//! 3. If the sort stalls, every stalled node that lies on a cycle has no
//!    delay to break it; those nodes are muted and the sort resumes.

use super::node::ParamKind;
use super::{Edge, Target};

/// Flat execution plan for one topology.
#[derive(Debug, Default, Clone)]
pub(crate) struct Schedule {
    /// Node slots in processing order.
    pub order: Vec<usize>,
    /// Slots of delays split into read/write phases.
    pub cycle_delays: Vec<usize>,
    /// Slots rendering silence because they sit on a delay-free cycle.
    pub muted: Vec<usize>,
    /// Audio sources per slot.
    pub inputs: Vec<Vec<usize>>,
    /// Param modulation sources per slot.
    pub param_inputs: Vec<Vec<(usize, ParamKind)>>,
}

/// Compile `edges` over `live.len()` slots. `delays[i]` marks delay nodes.
pub(crate) fn compile(live: &[bool], delays: &[bool], edges: &[Edge]) -> Schedule {
    let n = live.len();
    let mut successors = vec![Vec::new(); n];
    let mut inputs = vec![Vec::new(); n];
    let mut param_inputs = vec![Vec::new(); n];
    for edge in edges {
        let from = edge.from.0 as usize;
        let to = edge.to.node().0 as usize;
        if from >= n || to >= n || !live[from] || !live[to] {
            continue;
        }
        successors[from].push(to);
        match edge.to {
            Target::Node(_) => inputs[to].push(from),
            Target::Param(_, kind) => param_inputs[to].push((from, kind)),
        }
    }

    let cycle_delay: Vec<bool> = (0..n)
        .map(|i| live[i] && delays[i] && successors[i].iter().any(|&s| reaches(&successors, s, i)))
        .collect();

    // dependency edges: everything except audio edges into a cycle delay
    let mut dependents = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for edge in edges {
        let from = edge.from.0 as usize;
        let to = edge.to.node().0 as usize;
        if from >= n || to >= n || !live[from] || !live[to] {
            continue;
        }
        if cycle_delay[to] && matches!(edge.to, Target::Node(_)) {
            continue;
        }
        dependents[from].push(to);
        in_degree[to] += 1;
    }

    let active = live.iter().filter(|l| **l).count();
    let mut done = vec![false; n];
    let mut order = Vec::with_capacity(active);
    let mut muted = Vec::new();
    let mut queue: Vec<usize> = (0..n).rev().filter(|&i| live[i] && in_degree[i] == 0).collect();

    loop {
        while let Some(idx) = queue.pop() {
            done[idx] = true;
            order.push(idx);
            for &to in &dependents[idx] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push(to);
                }
            }
        }
        if order.len() + muted.len() == active {
            break;
        }

        let stalled: Vec<usize> = (0..n).filter(|&i| live[i] && !done[i]).collect();
        let mut on_cycle: Vec<usize> = stalled
            .iter()
            .copied()
            .filter(|&i| {
                dependents[i]
                    .iter()
                    .any(|&s| !done[s] && reaches_within(&dependents, &done, s, i))
            })
            .collect();
        if on_cycle.is_empty() {
            on_cycle = stalled;
        }
        tracing::debug!(nodes = ?on_cycle, "muting delay-free cycle");
        for &idx in &on_cycle {
            done[idx] = true;
            muted.push(idx);
        }
        for &idx in &on_cycle {
            for &to in &dependents[idx] {
                if done[to] {
                    continue;
                }
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push(to);
                }
            }
        }
    }

    Schedule {
        order,
        cycle_delays: (0..n).filter(|&i| cycle_delay[i]).collect(),
        muted,
        inputs,
        param_inputs,
    }
}

/// DFS reachability over `graph`.
fn reaches(graph: &[Vec<usize>], from: usize, target: usize) -> bool {
    let mut visited = vec![false; graph.len()];
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if visited[current] {
            continue;
        }
        visited[current] = true;
        stack.extend(graph[current].iter().copied());
    }
    false
}

/// DFS reachability restricted to nodes not yet `done`.
fn reaches_within(graph: &[Vec<usize>], done: &[bool], from: usize, target: usize) -> bool {
    let mut visited = vec![false; graph.len()];
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if visited[current] || done[current] {
            continue;
        }
        visited[current] = true;
        stack.extend(graph[current].iter().copied());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn audio(from: u32, to: u32) -> Edge {
        Edge {
            from: NodeId(from),
            to: Target::Node(NodeId(to)),
        }
    }

    fn position(schedule: &Schedule, slot: usize) -> usize {
        schedule.order.iter().position(|&s| s == slot).unwrap()
    }

    #[test]
    fn chain_is_ordered() {
        let edges = [audio(0, 2), audio(2, 3), audio(3, 1)];
        let s = compile(&[true; 4], &[false; 4], &edges);
        assert_eq!(s.order.len(), 4);
        assert!(position(&s, 0) < position(&s, 2));
        assert!(position(&s, 2) < position(&s, 3));
        assert!(position(&s, 3) < position(&s, 1));
        assert!(s.muted.is_empty());
        assert_eq!(s.inputs[1], vec![3]);
    }

    #[test]
    fn delay_breaks_cycle() {
        // 0 -> 1 -> 2(delay) -> 1
        let edges = [audio(0, 1), audio(1, 2), audio(2, 1)];
        let s = compile(&[true; 3], &[false, false, true], &edges);
        assert_eq!(s.cycle_delays, vec![2]);
        assert!(s.muted.is_empty());
        assert!(position(&s, 2) < position(&s, 1));
    }

    #[test]
    fn delay_free_cycle_is_muted_but_downstream_runs() {
        // 0 -> 1 <-> 2, 1 -> 3, 0 -> 3
        let edges = [audio(0, 1), audio(1, 2), audio(2, 1), audio(1, 3), audio(0, 3)];
        let s = compile(&[true; 4], &[false; 4], &edges);
        let mut muted = s.muted.clone();
        muted.sort_unstable();
        assert_eq!(muted, vec![1, 2]);
        assert!(s.order.contains(&3));
        assert!(s.order.contains(&0));
    }

    #[test]
    fn param_edges_are_dependencies() {
        let edges = [
            audio(0, 1),
            Edge {
                from: NodeId(2),
                to: Target::Param(NodeId(1), ParamKind::Gain),
            },
        ];
        let s = compile(&[true; 3], &[false; 3], &edges);
        assert!(position(&s, 2) < position(&s, 1));
        assert_eq!(s.param_inputs[1], vec![(2, ParamKind::Gain)]);
    }

    #[test]
    fn released_slots_are_skipped() {
        let edges = [audio(0, 1)];
        let s = compile(&[true, false], &[false; 2], &edges);
        assert_eq!(s.order, vec![0]);
        assert!(s.inputs[1].is_empty());
    }
}
