//! The RNGLR parse table (spec.md §3, §4.6): keyed by `(state, symbol)`,
//! each cell a set of actions.

use indexmap::IndexSet;
use std::collections::HashMap;

use crate::body::BodyId;
use crate::item::StateId;
use crate::sppf::SppfId;
use crate::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Push(StateId),
    Reduce {
        head: SymbolId,
        production: BodyId,
        length: usize,
        /// The SPPF node for the reduction's entirely-nullable suffix
        /// (spec.md §4.6); the root-epsilon node when that suffix is empty.
        nullable_tail: SppfId,
    },
    Accept,
}

impl Action {
    pub fn is_push(&self) -> bool {
        matches!(self, Action::Push(_))
    }

    pub fn is_reduce(&self) -> bool {
        matches!(self, Action::Reduce { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParseTable {
    cells: HashMap<(StateId, SymbolId), IndexSet<Action>>,
}

impl ParseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action in cell `(state, symbol)`. At most one `Push` may
    /// occupy a cell; inserting a second, distinct push is a build-time
    /// invariant violation (spec.md §7's `build-fail`).
    pub fn insert(&mut self, state: StateId, symbol: SymbolId, action: Action) {
        let cell = self.cells.entry((state, symbol)).or_default();
        if let Action::Push(new_target) = action {
            for existing in cell.iter() {
                if let Action::Push(existing_target) = existing {
                    debug_assert_eq!(
                        *existing_target, new_target,
                        "at most one push action may occupy a parse table cell"
                    );
                }
            }
        }
        cell.insert(action);
    }

    pub fn actions(&self, state: StateId, symbol: SymbolId) -> Option<&IndexSet<Action>> {
        self.cells.get(&(state, symbol))
    }

    pub fn push_target(&self, state: StateId, symbol: SymbolId) -> Option<StateId> {
        self.actions(state, symbol)?.iter().find_map(|a| match a {
            Action::Push(target) => Some(*target),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(StateId, SymbolId), &IndexSet<Action>)> {
        self.cells.iter()
    }
}
