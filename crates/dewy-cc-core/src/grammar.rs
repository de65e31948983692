//! Grammar table (spec.md §4.4): interned symbols and bodies, the
//! head → {body} production map, the start symbol, and the side tables for
//! the filter operators whose enforcement is left to a post-parse pass
//! (SPEC_FULL.md's supplement on reject/nofollow/capture/precedence).

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::body::{BodyId, BodyTable};
use crate::symbol::{Symbol, SymbolId, SymbolTable};

/// Ordering recorded for the `>` / `<` precedence operator, keyed by the
/// body of the left-hand inner expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceOrder {
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Default)]
pub struct GrammarTable {
    pub symbols: SymbolTable,
    pub bodies: BodyTable,
    /// head -> ordered set of body indices, insertion ordered.
    productions: IndexMap<SymbolId, IndexSet<BodyId>>,
    /// Reverse of `productions`, for the post-parse filter pass to map a
    /// packed family member's production back to the head it belongs to.
    body_heads: HashMap<BodyId, SymbolId>,
    start_symbol: Option<SymbolId>,
    /// `A - B`: body of (the head standing for) A -> symbol of B's head.
    reject: HashMap<BodyId, SymbolId>,
    /// `A / B`: body of A -> symbol of B's head.
    nofollow: HashMap<BodyId, SymbolId>,
    /// `A > B` / `A < B`: body of A -> (ordering, symbol of B's head).
    precedence: HashMap<BodyId, (PrecedenceOrder, SymbolId)>,
    /// Heads produced by lowering a capture (`.`) node.
    captures: std::collections::HashSet<SymbolId>,
}

impl GrammarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `head -> body`; idempotent under the interned body set.
    pub fn insert_production(&mut self, head: SymbolId, body: BodyId) {
        self.productions.entry(head).or_default().insert(body);
        self.body_heads.insert(body, head);
    }

    /// The head a production body belongs to, if any `insert_production`
    /// call has registered it.
    pub fn head_of_body(&self, body: BodyId) -> Option<SymbolId> {
        self.body_heads.get(&body).copied()
    }

    pub fn bodies_of(&self, head: SymbolId) -> impl Iterator<Item = BodyId> + '_ {
        self.productions.get(&head).into_iter().flatten().copied()
    }

    pub fn heads(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.productions.keys().copied()
    }

    pub fn is_nonterminal_defined(&self, head: SymbolId) -> bool {
        self.productions.contains_key(&head)
    }

    pub fn start_symbol(&self) -> Option<SymbolId> {
        self.start_symbol
    }

    pub fn mark_reject(&mut self, body: BodyId, other_head: SymbolId) {
        self.reject.insert(body, other_head);
    }

    pub fn mark_nofollow(&mut self, body: BodyId, other_head: SymbolId) {
        self.nofollow.insert(body, other_head);
    }

    pub fn mark_precedence(&mut self, body: BodyId, order: PrecedenceOrder, other_head: SymbolId) {
        self.precedence.insert(body, (order, other_head));
    }

    pub fn mark_capture(&mut self, head: SymbolId) {
        self.captures.insert(head);
    }

    pub fn reject_of(&self, body: BodyId) -> Option<SymbolId> {
        self.reject.get(&body).copied()
    }

    pub fn nofollow_of(&self, body: BodyId) -> Option<SymbolId> {
        self.nofollow.get(&body).copied()
    }

    pub fn precedence_of(&self, body: BodyId) -> Option<(PrecedenceOrder, SymbolId)> {
        self.precedence.get(&body).copied()
    }

    pub fn is_capture(&self, head: SymbolId) -> bool {
        self.captures.contains(&head)
    }

    /// Append the augmented start rule `start' -> start $` and record its
    /// head as the start symbol. Idempotent: calling twice is a no-op after
    /// the first call.
    pub fn finalise(&mut self, start: SymbolId) {
        if self.start_symbol.is_some() {
            return;
        }
        let start_prime = self.symbols.intern_nonterminal("start'");
        let endmarker = self.symbols.endmarker();
        let body = self.bodies.intern(vec![start, endmarker]);
        self.insert_production(start_prime, body);
        self.start_symbol = Some(start_prime);
        crate::invariants::check_grammar_table(self);
    }

    /// Symbol `start` (the augmented rule's own right-hand side head, i.e.
    /// the user's declared start non-terminal), if `finalise` has run.
    pub fn user_start_symbol(&self) -> Option<SymbolId> {
        let start_prime = self.start_symbol?;
        let body = *self.bodies_of(start_prime).collect::<Vec<_>>().first()?;
        self.bodies.get(body).first().copied()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }
}
