//! FSet (spec.md §3, §4.5): a FIRST set paired with a nullability flag.

use std::collections::BTreeSet;

use crate::symbol::SymbolId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FSet {
    pub terminals: BTreeSet<SymbolId>,
    pub nullable: bool,
}

impl FSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(terminal: SymbolId) -> Self {
        let mut terminals = BTreeSet::new();
        terminals.insert(terminal);
        Self { terminals, nullable: false }
    }

    /// Merge `other`'s terminals (and nullability) into `self`.
    /// Returns `true` if `self` changed, for fixed-point loop termination.
    pub fn merge_from(&mut self, other: &FSet) -> bool {
        let mut changed = false;
        for &t in &other.terminals {
            changed |= self.terminals.insert(t);
        }
        if other.nullable && !self.nullable {
            self.nullable = true;
            changed = true;
        }
        changed
    }

    pub fn insert_terminal(&mut self, terminal: SymbolId) -> bool {
        self.terminals.insert(terminal)
    }
}
