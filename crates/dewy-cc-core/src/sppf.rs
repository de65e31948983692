//! Shared Packed Parse Forest (spec.md §3, §4.8).
//!
//! Three node kinds, all interned. Child-lists are interned separately from
//! nodes; an inner node's family starts as a single (non-packed) child-list
//! and is promoted to a packed family (a set of distinct child-lists) the
//! moment a second, distinct list is attached — this *is* how local
//! ambiguity is recorded, never by duplicating the inner node itself.

use indexmap::IndexSet;
use std::collections::HashMap;

use crate::body::BodyId;
use crate::grammar::GrammarTable;
use crate::interner::{Id, Interner};
use crate::symbol::SymbolId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SppfNode {
    Leaf { input_index: usize },
    /// A sub-forest standing in for a vanished (nullable) suffix.
    Nullable { symbols: Vec<SymbolId> },
    Inner { head: SymbolId, start: usize, end: usize },
}

pub type SppfId = Id<SppfNode>;
pub type ChildList = Vec<SppfId>;
pub type ChildListId = Id<ChildList>;

/// `Clone` lets a builder pre-populate the nullable-tail nodes referenced by
/// baked `Action::Reduce` entries once, then hand each parse its own copy to
/// extend — the parse table's `nullable_tail` ids stay valid across parses
/// without requiring the forest itself to outlive a single parse.
#[derive(Clone)]
pub struct Sppf {
    nodes: Interner<SppfNode>,
    child_lists: Interner<ChildList>,
    /// Only inner nodes have an entry; insertion order is preserved so a
    /// family with one list reads as non-packed and two-or-more as packed.
    families: HashMap<SppfId, IndexSet<ChildListId>>,
    /// Which production grew a given family member, recorded by the driver
    /// alongside `add_family` so a post-parse pass (e.g.
    /// [`apply_reject_filter`]) can map a packed alternative back to its
    /// `reject`/`nofollow`/precedence annotations on the grammar table.
    child_list_bodies: HashMap<ChildListId, BodyId>,
    root_epsilon: SppfId,
    root_epsilon_children: ChildListId,
}

impl Default for Sppf {
    fn default() -> Self {
        Self::new()
    }
}

impl Sppf {
    pub fn new() -> Self {
        let mut nodes = Interner::new();
        let mut child_lists = Interner::new();
        // Node 0: the generic nullable root. Child-list 0: a list containing
        // only that node, so every later nullable node can point at a
        // ready-made "I vanished" child without special-casing ν=0.
        let root_epsilon = nodes.intern(SppfNode::Nullable { symbols: Vec::new() });
        let root_epsilon_children = child_lists.intern(vec![root_epsilon]);
        Self {
            nodes,
            child_lists,
            families: HashMap::new(),
            child_list_bodies: HashMap::new(),
            root_epsilon,
            root_epsilon_children,
        }
    }

    pub fn root_epsilon(&self) -> SppfId {
        self.root_epsilon
    }

    pub fn root_epsilon_children(&self) -> ChildListId {
        self.root_epsilon_children
    }

    pub fn intern_leaf(&mut self, input_index: usize) -> SppfId {
        self.nodes.intern(SppfNode::Leaf { input_index })
    }

    pub fn intern_nullable(&mut self, symbols: Vec<SymbolId>) -> SppfId {
        if symbols.is_empty() {
            return self.root_epsilon;
        }
        self.nodes.intern(SppfNode::Nullable { symbols })
    }

    pub fn intern_inner(&mut self, head: SymbolId, start: usize, end: usize) -> SppfId {
        self.nodes.intern(SppfNode::Inner { head, start, end })
    }

    pub fn intern_child_list(&mut self, children: ChildList) -> ChildListId {
        self.child_lists.intern(children)
    }

    pub fn node(&self, id: SppfId) -> &SppfNode {
        self.nodes.get(id)
    }

    pub fn children(&self, id: ChildListId) -> &ChildList {
        self.child_lists.get(id)
    }

    /// Attach `children` as a family member of inner node `inner`. Returns
    /// `true` if this grew the family (new distinct child-list); `false` if
    /// `children` was already a member (no new ambiguity recorded).
    pub fn add_family(&mut self, inner: SppfId, children: ChildList) -> (ChildListId, bool) {
        debug_assert!(
            matches!(self.node(inner), SppfNode::Inner { .. }),
            "only inner nodes carry packed families"
        );
        let list_id = self.intern_child_list(children);
        let family = self.families.entry(inner).or_default();
        let grew = family.insert(list_id);
        (list_id, grew)
    }

    pub fn family(&self, inner: SppfId) -> Option<&IndexSet<ChildListId>> {
        self.families.get(&inner)
    }

    /// `true` once an inner node has two or more distinct child-lists.
    pub fn is_packed(&self, inner: SppfId) -> bool {
        self.family(inner).is_some_and(|f| f.len() > 1)
    }

    /// Record which production grew family member `list`, for
    /// [`apply_reject_filter`] to consult later.
    pub fn record_production(&mut self, list: ChildListId, production: BodyId) {
        self.child_list_bodies.insert(list, production);
    }

    pub fn production_of(&self, list: ChildListId) -> Option<BodyId> {
        self.child_list_bodies.get(&list).copied()
    }
}

/// Prune packed alternatives whose production carries a `reject` annotation
/// (`A - B`, spec.md §4.2) matching a sibling alternative's head in the same
/// family — the minimal post-parse enforcement spec.md's Open Questions call
/// for (§4.4's supplement); `nofollow` and precedence-ordering annotations
/// are recorded on the grammar table but left unenforced here, same as the
/// source this was distilled from.
pub fn apply_reject_filter(sppf: &mut Sppf, grammar: &GrammarTable) {
    let inners: Vec<SppfId> = sppf.families.keys().copied().collect();
    for inner in inners {
        let Some(family) = sppf.families.get(&inner) else { continue };
        if family.len() < 2 {
            continue;
        }
        let members: Vec<ChildListId> = family.iter().copied().collect();
        let heads: Vec<Option<SymbolId>> = members
            .iter()
            .map(|&m| sppf.production_of(m).and_then(|body| grammar.head_of_body(body)))
            .collect();

        let mut keep = vec![true; members.len()];
        for (i, &member) in members.iter().enumerate() {
            let Some(body) = sppf.production_of(member) else { continue };
            let Some(rejected_head) = grammar.reject_of(body) else { continue };
            if heads.iter().enumerate().any(|(j, h)| j != i && *h == Some(rejected_head)) {
                keep[i] = false;
            }
        }

        if keep.iter().all(|&k| k) {
            continue;
        }
        let surviving: IndexSet<ChildListId> = members
            .into_iter()
            .zip(keep)
            .filter_map(|(m, k)| k.then_some(m))
            .collect();
        sppf.families.insert(inner, surviving);
    }
}

#[cfg(test)]
mod sppf_tests {
    use super::*;
    use crate::symbol::SymbolId;

    #[test]
    fn root_epsilon_is_node_zero_and_self_pointing() {
        let sppf = Sppf::new();
        assert_eq!(sppf.root_epsilon().as_usize(), 0);
        assert_eq!(sppf.root_epsilon_children().as_usize(), 0);
        assert_eq!(sppf.children(sppf.root_epsilon_children()), &vec![sppf.root_epsilon()]);
    }

    #[test]
    fn interning_no_nullable_symbols_returns_root_epsilon() {
        let mut sppf = Sppf::new();
        let again = sppf.intern_nullable(Vec::new());
        assert_eq!(again, sppf.root_epsilon());
    }

    #[test]
    fn second_distinct_child_list_packs_the_family() {
        let mut sppf = Sppf::new();
        let head = SymbolId::from_usize(7);
        let inner = sppf.intern_inner(head, 0, 3);
        let leaf0 = sppf.intern_leaf(0);
        let leaf1 = sppf.intern_leaf(1);
        let (_, grew1) = sppf.add_family(inner, vec![leaf0]);
        assert!(grew1);
        assert!(!sppf.is_packed(inner));
        let (_, grew2) = sppf.add_family(inner, vec![leaf1]);
        assert!(grew2);
        assert!(sppf.is_packed(inner));
        // Re-adding an existing list must not grow the family again.
        let (_, grew3) = sppf.add_family(inner, vec![leaf0]);
        assert!(!grew3);
        assert_eq!(sppf.family(inner).unwrap().len(), 2);
    }

    #[test]
    fn no_two_inner_nodes_share_head_start_end() {
        let mut sppf = Sppf::new();
        let head = SymbolId::from_usize(1);
        let a = sppf.intern_inner(head, 0, 2);
        let b = sppf.intern_inner(head, 0, 2);
        assert_eq!(a, b);
    }
}
