//! Graph-Structured Stack (spec.md §3, §4.7, §9).
//!
//! Nodes are bucketed per input position; within a position the state label
//! is itself the dedup key, so an `IndexSet<StateId>` per position gives both
//! "no two nodes at a position share a state" for free and a stable `k`
//! (the set's insertion index) to serve as the node's coordinate.

use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

use crate::item::StateId;
use crate::sppf::SppfId;

/// `(position, k)`: `k` indexes into the ordered set of state labels live at
/// `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GssCoord {
    pub position: usize,
    pub k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GssEdge {
    parent: GssCoord,
    child: GssCoord,
    label: SppfId,
}

#[derive(Default)]
pub struct Gss {
    /// `nodes[position]` is the ordered set of state labels live at that
    /// input position.
    nodes: Vec<IndexSet<StateId>>,
    edges: HashSet<GssEdge>,
    /// parent -> children reachable from it (for `paths`, which walks
    /// parent -> child).
    outgoing: HashMap<GssCoord, Vec<(GssCoord, SppfId)>>,
}

impl Gss {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_position(&mut self, position: usize) {
        while self.nodes.len() <= position {
            self.nodes.push(IndexSet::new());
        }
    }

    /// Find-or-create the node labelled `state` at `position`.
    pub fn add_node(&mut self, position: usize, state: StateId) -> GssCoord {
        self.ensure_position(position);
        let (k, _) = self.nodes[position].insert_full(state);
        GssCoord { position, k }
    }

    pub fn state_at(&self, coord: GssCoord) -> StateId {
        self.nodes[coord.position][coord.k]
    }

    pub fn node_count_at(&self, position: usize) -> usize {
        self.nodes.get(position).map(|s| s.len()).unwrap_or(0)
    }

    /// Whether a node labelled `state` already exists at `position`, without
    /// creating one — lets a caller distinguish "found existing" from
    /// "just created" around a call to [`Self::add_node`].
    pub fn contains_state_at(&self, position: usize, state: StateId) -> bool {
        self.nodes.get(position).is_some_and(|s| s.contains(&state))
    }

    /// Directed parent -> child edge labelled with the SPPF node that
    /// records the sub-forest consumed by this transition. Returns `false`
    /// if the edge already existed (duplicate edges are rejected).
    pub fn add_edge(&mut self, parent: GssCoord, child: GssCoord, label: SppfId) -> bool {
        let edge = GssEdge { parent, child, label };
        if !self.edges.insert(edge) {
            return false;
        }
        self.outgoing.entry(parent).or_default().push((child, label));
        true
    }

    pub fn has_edge(&self, parent: GssCoord, child: GssCoord) -> bool {
        self.outgoing
            .get(&parent)
            .is_some_and(|children| children.iter().any(|&(c, _)| c == child))
    }

    pub fn edge_label(&self, parent: GssCoord, child: GssCoord) -> Option<SppfId> {
        self.outgoing
            .get(&parent)
            .and_then(|children| children.iter().find(|&&(c, _)| c == child).map(|&(_, l)| l))
    }

    /// Every length-`length` path starting at `v`, walking parent -> child
    /// edges. Each path is `[v, ..., end]` with `length + 1` coordinates and
    /// the SPPF labels of the `length` edges traversed, enumerating over
    /// every branch where a node has multiple children.
    pub fn paths(&self, v: GssCoord, length: usize) -> Vec<GssPath> {
        if length == 0 {
            return vec![GssPath { nodes: vec![v], labels: Vec::new() }];
        }
        let mut out = Vec::new();
        for &(child, label) in self.outgoing.get(&v).map(|v| v.as_slice()).unwrap_or(&[]) {
            for mut rest in self.paths(child, length - 1) {
                rest.nodes.insert(0, v);
                rest.labels.insert(0, label);
                out.push(rest);
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct GssPath {
    pub nodes: Vec<GssCoord>,
    pub labels: Vec<SppfId>,
}
