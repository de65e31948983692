//! Item-set and table construction (spec.md §4.6): CLOSURE, GOTO, the
//! itemset worklist, and the reduce/accept rows of the RNGLR parse table.

use std::collections::{BTreeSet, VecDeque};

use dewy_cc_core::{
    Action, GrammarTable, Item, ItemSet, ItemSetTable, ParseTable, Sppf, StateId, SymbolId,
};
use indexmap::IndexSet;

use crate::analyze::Analysis;
use crate::error::BuildError;

pub struct Built {
    pub itemsets: ItemSetTable,
    pub table: ParseTable,
    /// Pre-populated with every nullable-tail SPPF node baked into the
    /// table's reduce actions; cloned fresh at the start of every parse.
    pub nullable_template: Sppf,
    pub start_state: StateId,
}

/// Iteration cap for the fixed-point loops below. Both CLOSURE and GOTO
/// converge in at most one pass per item ever discoverable, a quantity
/// bounded by the (finite) product of productions and lookahead symbols, so
/// this cap is a defensive backstop, not an expected ceiling.
const CLOSURE_FUEL: usize = 100_000;

pub fn build(grammar: &GrammarTable, analysis: &Analysis) -> Result<Built, BuildError> {
    let start_symbol = grammar
        .start_symbol()
        .ok_or_else(|| BuildError::invariant("grammar table has no start symbol; call finalise() first"))?;
    let endmarker = grammar.symbols.endmarker();

    let mut itemsets = ItemSetTable::new();
    let mut table = ParseTable::new();
    let mut sppf = Sppf::new();

    let start_bodies: Vec<_> = grammar.bodies_of(start_symbol).collect();
    let start_body = *start_bodies
        .first()
        .ok_or_else(|| BuildError::invariant("augmented start symbol has no production"))?;

    let seed = Item::new(start_symbol, start_body, 0, endmarker);
    let initial = closure(grammar, analysis, &BTreeSet::from([seed]))?;
    let start_state = itemsets.intern(initial);

    let mut worklist: VecDeque<StateId> = VecDeque::new();
    worklist.push_back(start_state);
    let mut seen: IndexSet<StateId> = IndexSet::new();
    seen.insert(start_state);

    while let Some(state) = worklist.pop_front() {
        let items = itemsets.get(state).clone();

        let mut symbols_after_dot: IndexSet<SymbolId> = IndexSet::new();
        for item in &items {
            let body = grammar.bodies.get(item.production);
            if item.position < body.len() {
                symbols_after_dot.insert(body[item.position]);
            }
        }

        for symbol in symbols_after_dot {
            let goto_set = goto(grammar, analysis, &items, symbol)?;
            if goto_set.is_empty() {
                continue;
            }
            let target = itemsets.intern(goto_set);
            table.insert(state, symbol, Action::Push(target));
            if seen.insert(target) {
                worklist.push_back(target);
            }
        }

        for item in &items {
            let body = grammar.bodies.get(item.production);
            let suffix = &body[item.position..];
            if !analysis.is_nullable_string(suffix) {
                continue;
            }
            if item.head == start_symbol && item.lookahead == endmarker && item.position == body.len() {
                table.insert(state, endmarker, Action::Accept);
                continue;
            }
            let nullable_tail = sppf.intern_nullable(suffix.to_vec());
            table.insert(
                state,
                item.lookahead,
                Action::Reduce {
                    head: item.head,
                    production: item.production,
                    length: item.position,
                    nullable_tail,
                },
            );
        }
    }

    Ok(Built { itemsets, table, nullable_template: sppf, start_state })
}

/// CLOSURE(I): grow I by, for every `[A -> a.Bb, a]` and every `B -> y` and
/// every `b in FIRST(ba)`, adding `[B -> .y, b]`.
fn closure(grammar: &GrammarTable, analysis: &Analysis, items: &ItemSet) -> Result<ItemSet, BuildError> {
    let mut set = items.clone();
    for _ in 0..CLOSURE_FUEL {
        let mut additions = Vec::new();
        for item in &set {
            let body = grammar.bodies.get(item.production);
            let Some(&next_symbol) = body.get(item.position) else { continue };
            if grammar.symbols.is_terminal(next_symbol) {
                continue;
            }
            let rest = &body[item.position + 1..];
            let lookaheads = analysis.first_of_string_with_lookahead(rest, item.lookahead);
            for production in grammar.bodies_of(next_symbol) {
                for &lookahead in &lookaheads {
                    let candidate = Item::new(next_symbol, production, 0, lookahead);
                    if !set.contains(&candidate) {
                        additions.push(candidate);
                    }
                }
            }
        }
        if additions.is_empty() {
            return Ok(set);
        }
        set.extend(additions);
    }
    Err(BuildError::FuelExhausted { pass: "itemset CLOSURE".into(), iterations: CLOSURE_FUEL })
}

/// GOTO(I, X): advance the dot past `X` in every item of I that has one
/// there, then close the result.
fn goto(grammar: &GrammarTable, analysis: &Analysis, items: &ItemSet, symbol: SymbolId) -> Result<ItemSet, BuildError> {
    let mut advanced = BTreeSet::new();
    for item in items {
        let body = grammar.bodies.get(item.production);
        if body.get(item.position) == Some(&symbol) {
            advanced.insert(item.advanced());
        }
    }
    closure(grammar, analysis, &advanced)
}

#[cfg(test)]
mod build_tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::{lower_rule, Parser};

    fn build_source(src: &str, start: &str) -> (GrammarTable, Analysis, Built) {
        let mut parser = Parser::new(src);
        let rules = parser.parse_grammar().expect("parse ok");
        let mut grammar = GrammarTable::new();
        let mut diagnostics = Diagnostics::new();
        for rule in &rules {
            lower_rule(&mut grammar, &rule.head, &rule.body, &mut diagnostics, rule.span);
        }
        let start_symbol = grammar.symbols.find_nonterminal(start).expect("start symbol exists");
        grammar.finalise(start_symbol);
        let analysis = Analysis::compute(&grammar).expect("analysis converges");
        let built = build(&grammar, &analysis).expect("build ok");
        (grammar, analysis, built)
    }

    #[test]
    fn builds_a_start_state_with_a_shift() {
        let (grammar, _analysis, built) = build_source("#r = 'a';", "r");
        let a_terminal = grammar
            .symbols
            .iter()
            .find_map(|(id, s)| s.as_terminal().map(|_| id))
            .expect("a terminal symbol was interned");
        assert!(built.table.push_target(built.start_state, a_terminal).is_some());
    }

    #[test]
    fn accept_action_reachable_for_trivial_grammar() {
        // `start' -> r $` (spec.md's glossary entry for `start'`): reaching
        // the accept row takes two gotos from the start state — one on `r`
        // itself (after `r`'s own body has been reduced), one on the
        // conceptually-appended `$` — not merely shifting `r`'s first
        // terminal.
        let (grammar, _analysis, built) = build_source("#r = 'a';", "r");
        let r_symbol = grammar.symbols.find_nonterminal("r").expect("r interned");
        let endmarker = grammar.symbols.endmarker();
        let after_r = built.table.push_target(built.start_state, r_symbol).expect("goto on r exists");
        let after_endmarker = built.table.push_target(after_r, endmarker).expect("goto on $ exists");
        let actions = built.table.actions(after_endmarker, endmarker).expect("actions on $ exist");
        assert!(actions.iter().any(|a| matches!(a, Action::Accept)));
    }

    #[test]
    fn nullable_rule_gets_zero_length_reduction_at_start() {
        let (grammar, _analysis, built) = build_source("#r = 'a'*;", "r");
        let endmarker = grammar.symbols.endmarker();
        let actions = built.table.actions(built.start_state, endmarker);
        let has_zero_length_reduce = actions
            .into_iter()
            .flat_map(|set| set.iter())
            .any(|a| matches!(a, Action::Reduce { length: 0, .. }));
        assert!(has_zero_length_reduce);
    }
}
