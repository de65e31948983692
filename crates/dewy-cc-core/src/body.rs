//! Production bodies (spec.md §3): a finite ordered sequence of symbol
//! indices, interned globally. The empty body (epsilon) is interned first
//! so that every epsilon production shares index 0.

use crate::interner::{Id, Interner};
use crate::symbol::SymbolId;

pub type Body = Vec<SymbolId>;
pub type BodyId = Id<Body>;

#[derive(Debug, Clone)]
pub struct BodyTable {
    interner: Interner<Body>,
    epsilon: BodyId,
}

impl Default for BodyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyTable {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let epsilon = interner.intern(Vec::new());
        Self { interner, epsilon }
    }

    pub fn epsilon(&self) -> BodyId {
        self.epsilon
    }

    pub fn intern(&mut self, body: Body) -> BodyId {
        self.interner.intern(body)
    }

    pub fn get(&self, id: BodyId) -> &Body {
        self.interner.get(id)
    }

    pub fn is_epsilon(&self, id: BodyId) -> bool {
        id == self.epsilon
    }

    pub fn len(&self, id: BodyId) -> usize {
        self.get(id).len()
    }
}

#[cfg(test)]
mod body_tests {
    use super::*;

    #[test]
    fn epsilon_body_is_index_zero() {
        let table = BodyTable::new();
        assert_eq!(table.epsilon().as_usize(), 0);
        assert!(table.get(table.epsilon()).is_empty());
    }

    #[test]
    fn interning_empty_body_again_reuses_epsilon() {
        let mut table = BodyTable::new();
        let again = table.intern(Vec::new());
        assert_eq!(again, table.epsilon());
    }

    #[test]
    fn distinct_bodies_get_distinct_ids() {
        let mut table = BodyTable::new();
        let a = crate::symbol::SymbolId::from_usize(1);
        let b = crate::symbol::SymbolId::from_usize(2);
        let body1 = table.intern(vec![a, b]);
        let body2 = table.intern(vec![b, a]);
        assert_ne!(body1, body2);
    }
}
