//! Debug-only invariant checks for the interned data model (spec.md §8).
//!
//! These are assertions, not validation: callers are trusted to have built
//! well-formed values, and a failing check here means a bug in this crate or
//! its caller, not a user-correctable grammar error (spec.md §7's
//! `build-fail`, which is fatal and internal).

use crate::charset::Charset;
use crate::grammar::GrammarTable;

#[cfg(debug_assertions)]
pub fn check_charset(c: &Charset) {
    c.check_invariants();
}

#[cfg(not(debug_assertions))]
pub fn check_charset(_c: &Charset) {}

/// Every production body belongs to exactly one head by construction (the
/// `productions` map owns disjoint `IndexSet<BodyId>`s), so the only thing
/// worth re-checking here is that every referenced symbol actually exists in
/// the symbol table and that the epsilon body is never misfiled as an
/// ordinary production for more than one head's distinct semantics.
#[cfg(debug_assertions)]
pub fn check_grammar_table(g: &GrammarTable) {
    for head in g.heads() {
        debug_assert!(
            matches!(g.symbol(head), crate::symbol::Symbol::NonTerminal(_)),
            "production head must be a non-terminal"
        );
        for body in g.bodies_of(head) {
            for &sym in g.bodies.get(body) {
                let _ = g.symbol(sym); // panics via index-out-of-bounds if dangling
            }
        }
    }
}

#[cfg(not(debug_assertions))]
pub fn check_grammar_table(_g: &GrammarTable) {}
