//! Deterministic, cycle-tolerant topological sorting.
//!
//! The sorter orders a list of nodes so that every declared `A runs before B`
//! constraint between nodes in different cycles is honoured. The final order
//! is a pure function of the node identifiers and the edges: it does not
//! depend on the order in which nodes or edges were supplied, as long as the
//! tie-breaking comparator is a strict total order.
//!
//! Sorting proceeds in three steps:
//!
//! 1. Compute the strongly connected components (i.e. cycles) of the graph.
//! 2. Sort the nodes inside each component with the comparator.
//! 3. Order the components against each other by honouring the remaining
//!    constraints, using the comparator applied to each component's minimum
//!    member to break ties.
//!
//! Cycles therefore never make sorting fail: the members of a cycle are
//! emitted as one contiguous, comparator-ordered block, and a warning naming
//! the members is sent to the warning sink (by default, [`tracing`]).
//!
//! # Examples
//!
//! ```rust
//! use phasic::toposort::{self, NodeLinks, SortableNode};
//! use std::collections::BTreeSet;
//!
//! struct Task {
//!     name: &'static str,
//!     links: NodeLinks<&'static str>,
//! }
//!
//! impl SortableNode for Task {
//!     type Id = &'static str;
//!
//!     fn id(&self) -> &&'static str {
//!         &self.name
//!     }
//!
//!     fn following(&self) -> &BTreeSet<&'static str> {
//!         self.links.following()
//!     }
//!
//!     fn preceding(&self) -> &BTreeSet<&'static str> {
//!         self.links.preceding()
//!     }
//! }
//!
//! let mut build = Task { name: "build", links: NodeLinks::new() };
//! let mut test = Task { name: "test", links: NodeLinks::new() };
//! let mut publish = Task { name: "publish", links: NodeLinks::new() };
//!
//! build.links.add_following("test");
//! test.links.add_preceding("build");
//! test.links.add_following("publish");
//! publish.links.add_preceding("test");
//!
//! let mut tasks = vec![test, publish, build];
//! let acyclic = toposort::sort(&mut tasks, "tasks");
//!
//! assert!(acyclic);
//! let names: Vec<_> = tasks.iter().map(|t| t.name).collect();
//! assert_eq!(names, ["build", "test", "publish"]);
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

/// Requirements on a node identifier: totally ordered, hashable, cloneable
/// and printable in warnings.
pub trait SortKey: Clone + Ord + Eq + Hash + Debug {}

impl<I: Clone + Ord + Eq + Hash + Debug> SortKey for I {}

/// A graph node that can be ordered by [`sort`].
///
/// Edges are stored on the nodes themselves, as the mirrored identifier sets
/// of the nodes that must run before and after this one. Identifiers that do
/// not resolve to a node in the sorted list are ignored.
pub trait SortableNode {
    /// The identifier type of this node.
    type Id: SortKey;

    /// The identifier of this node.
    fn id(&self) -> &Self::Id;

    /// Identifiers of the nodes that must be sorted after this one.
    fn following(&self) -> &BTreeSet<Self::Id>;

    /// Identifiers of the nodes that must be sorted before this one.
    fn preceding(&self) -> &BTreeSet<Self::Id>;
}

/// The mirrored adjacency sets of one node.
///
/// Both directions are kept so that the sorter can traverse the graph
/// forwards and backwards; callers are responsible for keeping the two
/// mirrors of an edge consistent (`a.add_following(b)` pairs with
/// `b.add_preceding(a)`). Re-adding an existing edge is a no-op.
#[derive(Debug, Clone, Default)]
pub struct NodeLinks<I> {
    following: BTreeSet<I>,
    preceding: BTreeSet<I>,
}

impl<I: SortKey> NodeLinks<I> {
    /// Creates an empty set of links.
    pub fn new() -> Self {
        Self {
            following: BTreeSet::new(),
            preceding: BTreeSet::new(),
        }
    }

    /// Identifiers of the nodes that must be sorted after this one.
    pub fn following(&self) -> &BTreeSet<I> {
        &self.following
    }

    /// Identifiers of the nodes that must be sorted before this one.
    pub fn preceding(&self) -> &BTreeSet<I> {
        &self.preceding
    }

    /// Records that the node identified by `id` must be sorted after the
    /// node owning these links.
    pub fn add_following(&mut self, id: I) {
        self.following.insert(id);
    }

    /// Records that the node identified by `id` must be sorted before the
    /// node owning these links.
    pub fn add_preceding(&mut self, id: I) {
        self.preceding.insert(id);
    }
}

/// Sorts `nodes` in place, breaking ties by the natural order of the node
/// identifiers.
///
/// Returns `true` if every constraint was satisfied, `false` if at least one
/// cycle was found. `description` names the elements in cycle warnings.
pub fn sort<N: SortableNode>(nodes: &mut Vec<N>, description: &str) -> bool {
    sort_by(nodes, description, |a, b| a.id().cmp(b.id()))
}

/// Sorts `nodes` in place with an explicit tie-breaking comparator.
///
/// The comparator must be a strict total order on the nodes for the output
/// to be deterministic. Cycle warnings go to [`tracing::warn!`]; use
/// [`sort_with`] to redirect them.
pub fn sort_by<N, F>(nodes: &mut Vec<N>, description: &str, compare: F) -> bool
where
    N: SortableNode,
    F: Fn(&N, &N) -> Ordering,
{
    sort_with(nodes, description, compare, |message| {
        tracing::warn!(target: "phasic::toposort", "{message}");
    })
}

/// Sorts `nodes` in place with an explicit comparator and warning sink.
///
/// `warn` receives one message per cycle, listing the members of the cycle
/// in their emitted order.
pub fn sort_with<N, F, W>(nodes: &mut Vec<N>, description: &str, compare: F, mut warn: W) -> bool
where
    N: SortableNode,
    F: Fn(&N, &N) -> Ordering,
    W: FnMut(&str),
{
    if nodes.len() <= 1 {
        return true;
    }

    let (order, acyclic) = compute_order(nodes, description, &compare, &mut warn);

    let mut slots: Vec<Option<N>> = nodes.drain(..).map(Some).collect();
    nodes.extend(
        order
            .into_iter()
            .map(|index| slots[index].take().expect("sort order is a permutation")),
    );

    acyclic
}

fn compute_order<N, F, W>(
    nodes: &[N],
    description: &str,
    compare: &F,
    warn: &mut W,
) -> (Vec<usize>, bool)
where
    N: SortableNode,
    F: Fn(&N, &N) -> Ordering,
    W: FnMut(&str),
{
    let count = nodes.len();

    let index_of: HashMap<&N::Id, usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id(), index))
        .collect();
    let resolve = |ids: &BTreeSet<N::Id>| -> Vec<usize> {
        ids.iter()
            .filter_map(|id| index_of.get(id).copied())
            .collect()
    };
    let next: Vec<Vec<usize>> = nodes.iter().map(|node| resolve(node.following())).collect();
    let previous: Vec<Vec<usize>> = nodes.iter().map(|node| resolve(node.preceding())).collect();

    // Global comparator rank, used to order SCC members and the ready queue.
    let rank = {
        let mut by_rank: Vec<usize> = (0..count).collect();
        by_rank.sort_by(|&a, &b| compare(&nodes[a], &nodes[b]));
        let mut rank = vec![0usize; count];
        for (position, &index) in by_rank.iter().enumerate() {
            rank[index] = position;
        }
        rank
    };

    // First Kosaraju pass: reverse postorder over the forward edges.
    let mut visited = vec![false; count];
    let mut postorder = Vec::with_capacity(count);
    for start in 0..count {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![(start, 0usize)];
        while let Some((node, cursor)) = stack.pop() {
            if let Some(&neighbour) = next[node].get(cursor) {
                stack.push((node, cursor + 1));
                if !visited[neighbour] {
                    visited[neighbour] = true;
                    stack.push((neighbour, 0));
                }
            } else {
                postorder.push(node);
            }
        }
    }
    postorder.reverse();

    // Second Kosaraju pass: collect SCCs over the backward edges, sorting
    // the members of each SCC with the comparator.
    const UNASSIGNED: usize = usize::MAX;
    let mut scc_of = vec![UNASSIGNED; count];
    let mut sccs: Vec<Vec<usize>> = Vec::new();
    for &start in &postorder {
        if scc_of[start] != UNASSIGNED {
            continue;
        }
        let scc = sccs.len();
        let mut members = Vec::new();
        scc_of[start] = scc;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            members.push(node);
            for &neighbour in &previous[node] {
                if scc_of[neighbour] == UNASSIGNED {
                    scc_of[neighbour] = scc;
                    stack.push(neighbour);
                }
            }
        }
        members.sort_by_key(|&member| rank[member]);
        sccs.push(members);
    }

    // SCC graph: edges between members of the same SCC are ignored.
    let mut in_degree = vec![0usize; sccs.len()];
    let mut next_sccs: Vec<Vec<usize>> = vec![Vec::new(); sccs.len()];
    for (scc, members) in sccs.iter().enumerate() {
        for &member in members {
            for &neighbour in &next[member] {
                let target = scc_of[neighbour];
                if target != scc {
                    next_sccs[scc].push(target);
                    in_degree[target] += 1;
                }
            }
        }
    }

    // Kahn drain; when several SCCs are ready, the one whose minimum member
    // ranks lowest is emitted first.
    let mut ready = BinaryHeap::new();
    for (scc, members) in sccs.iter().enumerate() {
        if in_degree[scc] == 0 {
            ready.push(Reverse((rank[members[0]], scc)));
        }
    }

    let mut order = Vec::with_capacity(count);
    let mut acyclic = true;
    while let Some(Reverse((_, scc))) = ready.pop() {
        let members = &sccs[scc];
        order.extend_from_slice(members);

        if members.len() > 1 {
            acyclic = false;
            let mut message = format!("Found cycle while sorting {description}:");
            for &member in members {
                message.push_str(&format!("\n\t{:?}", nodes[member].id()));
            }
            warn(&message);
        }

        for &target in &next_sccs[scc] {
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                ready.push(Reverse((rank[sccs[target][0]], target)));
            }
        }
    }

    (order, acyclic)
}
