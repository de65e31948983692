//! FIRST-set / nullability fixed-point analysis (spec.md §4.5).

use std::collections::BTreeSet;

use dewy_cc_core::{FSet, GrammarTable, SymbolId};
use indexmap::IndexMap;

use crate::error::BuildError;

/// Iteration cap for the FIRST/nullable fixed point. Each iteration can only
/// grow a finite number of per-symbol terminal sets, so this is a defensive
/// backstop rather than an expected ceiling; see [`BuildError::FuelExhausted`].
const FIRST_SET_FUEL: usize = 100_000;

/// `FIRST`/`nullable` for every symbol in `grammar`, plus the pre-built SPPF
/// nullable node for every nullable non-terminal so the driver never has to
/// synthesise one mid-parse.
pub struct Analysis {
    sets: IndexMap<SymbolId, FSet>,
}

impl Analysis {
    pub fn compute(grammar: &GrammarTable) -> Result<Self, BuildError> {
        let mut sets: IndexMap<SymbolId, FSet> = IndexMap::new();
        for (id, symbol) in grammar.symbols.iter() {
            if symbol.is_terminal() {
                sets.insert(id, FSet::singleton(id));
            } else {
                sets.insert(id, FSet::new());
            }
        }

        for _ in 0..FIRST_SET_FUEL {
            let mut changed = false;
            for head in grammar.heads() {
                for body_id in grammar.bodies_of(head) {
                    let body = grammar.bodies.get(body_id);
                    let mut all_nullable_so_far = true;
                    for &sym in body.iter() {
                        if !all_nullable_so_far {
                            break;
                        }
                        let sym_set = sets.get(&sym).cloned().unwrap_or_else(FSet::new);
                        let head_set = sets.entry(head).or_insert_with(FSet::new);
                        for t in &sym_set.terminals {
                            changed |= head_set.insert_terminal(*t);
                        }
                        if !sym_set.nullable {
                            all_nullable_so_far = false;
                        }
                    }
                    if all_nullable_so_far {
                        let head_set = sets.entry(head).or_insert_with(FSet::new);
                        if !head_set.nullable {
                            head_set.nullable = true;
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                return Ok(Self { sets });
            }
        }
        Err(BuildError::FuelExhausted { pass: "FIRST/nullable".into(), iterations: FIRST_SET_FUEL })
    }

    pub fn first(&self, symbol: SymbolId) -> &BTreeSet<SymbolId> {
        static EMPTY: std::sync::OnceLock<BTreeSet<SymbolId>> = std::sync::OnceLock::new();
        self.sets.get(&symbol).map(|s| &s.terminals).unwrap_or_else(|| EMPTY.get_or_init(BTreeSet::new))
    }

    pub fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.sets.get(&symbol).is_some_and(|s| s.nullable)
    }

    /// `FIRST(αa)` for a symbol string `α` followed by a terminal lookahead
    /// `a`: `FIRST(α)` if `α` isn't nullable, else `FIRST(α) ∪ {a}`.
    pub fn first_of_string_with_lookahead(&self, alpha: &[SymbolId], lookahead: SymbolId) -> BTreeSet<SymbolId> {
        let mut out = BTreeSet::new();
        let mut nullable_so_far = true;
        for &sym in alpha {
            if !nullable_so_far {
                break;
            }
            out.extend(self.first(sym).iter().copied());
            nullable_so_far = self.is_nullable(sym);
        }
        if nullable_so_far {
            out.insert(lookahead);
        }
        out
    }

    pub fn is_nullable_string(&self, alpha: &[SymbolId]) -> bool {
        alpha.iter().all(|&s| self.is_nullable(s))
    }
}

#[cfg(test)]
mod analyze_tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::{lower_rule, Parser};

    fn analyse(src: &str) -> (GrammarTable, Analysis) {
        let mut parser = Parser::new(src);
        let rules = parser.parse_grammar().expect("parse ok");
        let mut grammar = GrammarTable::new();
        let mut diagnostics = Diagnostics::new();
        for rule in &rules {
            lower_rule(&mut grammar, &rule.head, &rule.body, &mut diagnostics, rule.span);
        }
        let analysis = Analysis::compute(&grammar).expect("analysis converges");
        (grammar, analysis)
    }

    #[test]
    fn terminal_first_set_is_itself() {
        let (grammar, analysis) = analyse("#r = 'a';");
        let head = grammar.symbols.find_nonterminal("r").unwrap();
        assert!(!analysis.is_nullable(head));
        assert_eq!(analysis.first(head).len(), 1);
    }

    #[test]
    fn star_rule_is_nullable() {
        let (grammar, analysis) = analyse("#r = 'a'*;");
        let head = grammar.symbols.find_nonterminal("r").unwrap();
        assert!(analysis.is_nullable(head));
    }

    #[test]
    fn plus_rule_is_not_nullable() {
        let (grammar, analysis) = analyse("#r = 'a'+;");
        let head = grammar.symbols.find_nonterminal("r").unwrap();
        assert!(!analysis.is_nullable(head));
        assert_eq!(analysis.first(head).len(), 1);
    }

    #[test]
    fn recursive_rule_propagates_first_set() {
        let (grammar, analysis) = analyse("#r = 'a' #r | 'b';");
        let head = grammar.symbols.find_nonterminal("r").unwrap();
        assert_eq!(analysis.first(head).len(), 2);
        assert!(!analysis.is_nullable(head));
    }
}
