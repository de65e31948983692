//! LR items / slots and itemsets (spec.md §3, §4.6).

use std::collections::BTreeSet;

use crate::body::BodyId;
use crate::interner::{Id, Interner};
use crate::symbol::SymbolId;

/// `(head, production, position, lookahead)`. `position` is in `[0, |body|]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub head: SymbolId,
    pub production: BodyId,
    pub position: usize,
    pub lookahead: SymbolId,
}

impl Item {
    pub fn new(head: SymbolId, production: BodyId, position: usize, lookahead: SymbolId) -> Self {
        Self { head, production, position, lookahead }
    }

    pub fn advanced(&self) -> Self {
        Self { position: self.position + 1, ..*self }
    }
}

/// A set of items; `BTreeSet` gives a canonical iteration order so itemsets
/// can be interned by value (order-independent equality and `Hash`).
pub type ItemSet = BTreeSet<Item>;
pub type StateId = Id<ItemSet>;

pub type ItemSetTable = Interner<ItemSet>;
