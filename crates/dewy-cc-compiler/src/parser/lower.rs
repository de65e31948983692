//! Lowers a folded meta-AST into CFG productions on a [`GrammarTable`]
//! (spec.md §4.2's lowering table). Each call either reuses a caller-supplied
//! head or synthesises a fresh one via `SymbolTable::fresh_nonterminal`.

use dewy_cc_core::{GrammarTable, PrecedenceOrder, SymbolId};

use super::ast::MetaAst;
use crate::diagnostics::{Diagnostics, Span};

pub fn lower_rule(grammar: &mut GrammarTable, head_name: &str, ast: &MetaAst, diagnostics: &mut Diagnostics, span: Span) -> SymbolId {
    let head = grammar.symbols.intern_nonterminal(head_name.to_string());
    lower_into(grammar, head, ast, diagnostics, span);
    head
}

/// Lowers `ast` under `head`, inserting whatever productions are needed.
/// Returns the head actually used for `ast` (equal to `head` except where
/// the AST is itself a bare identifier reference, in which case no new
/// production is needed and the identifier's own symbol is returned).
fn lower_into(grammar: &mut GrammarTable, head: SymbolId, ast: &MetaAst, diagnostics: &mut Diagnostics, span: Span) -> SymbolId {
    match ast {
        MetaAst::Eps => {
            let body = grammar.bodies.epsilon();
            grammar.insert_production(head, body);
        }
        MetaAst::Charset(c) => {
            let sym = grammar.symbols.intern_terminal(c.clone());
            let body = grammar.bodies.intern(vec![sym]);
            grammar.insert_production(head, body);
        }
        MetaAst::String(chars) => {
            let symbols =
                chars.iter().map(|c| grammar.symbols.intern_terminal(dewy_cc_core::Charset::single(*c as u32))).collect();
            let body = grammar.bodies.intern(symbols);
            grammar.insert_production(head, body);
        }
        MetaAst::Caseless(chars) => {
            let symbols = chars
                .iter()
                .map(|c| {
                    let set = caseless_charset(*c);
                    grammar.symbols.intern_terminal(set)
                })
                .collect();
            let body = grammar.bodies.intern(symbols);
            grammar.insert_production(head, body);
        }
        MetaAst::Identifier(name) => {
            let referenced = grammar.symbols.intern_nonterminal(name.clone());
            let body = grammar.bodies.intern(vec![referenced]);
            grammar.insert_production(head, body);
        }
        MetaAst::Star(inner, count) => lower_repetition(grammar, head, inner, *count, true, diagnostics, span),
        MetaAst::Plus(inner, count) => lower_repetition(grammar, head, inner, *count, false, diagnostics, span),
        MetaAst::Count(inner, n) => {
            if *n == 0 {
                // `(A)0` is the degenerate count: spec.md §7's `lower-fail`
                // names this exact case, rewritten to ϵ rather than silently
                // treated as one copy.
                diagnostics.warning(span, "repetition count of 0 lowers to the empty string, not one copy");
                let eps = grammar.bodies.epsilon();
                grammar.insert_production(head, eps);
            } else {
                let copies = lower_fresh_head_for_repeated(grammar, inner, *n, diagnostics, span);
                let body = grammar.bodies.intern(copies);
                grammar.insert_production(head, body);
            }
        }
        MetaAst::Option(inner) => {
            let inner_head = symbol_for(grammar, inner, diagnostics, span);
            let via_inner = grammar.bodies.intern(vec![inner_head]);
            grammar.insert_production(head, via_inner);
            let eps = grammar.bodies.epsilon();
            grammar.insert_production(head, eps);
        }
        MetaAst::Cat(items) => {
            let symbols = items.iter().map(|item| symbol_for(grammar, item, diagnostics, span)).collect();
            let body = grammar.bodies.intern(symbols);
            grammar.insert_production(head, body);
        }
        MetaAst::Or(items) => {
            // Alternatives under the same head reuse that head rather than
            // each getting their own anonymous one.
            for item in items {
                lower_into(grammar, head, item, diagnostics, span);
            }
        }
        MetaAst::Compliment(inner) => {
            // Constant folding resolves `compliment(charset)` before this
            // runs; a `compliment` that survives folding wraps something
            // that isn't a charset literal, which spec.md §7's `lower-fail`
            // names alongside `(A)0` as a reportable degenerate form.
            diagnostics.warning(span, "`~` applied to a non-charset operand has no meaning and is dropped");
            lower_into(grammar, head, inner, diagnostics, span);
        }
        MetaAst::Intersect(l, r) | MetaAst::Reject(l, r) | MetaAst::Nofollow(l, r) => {
            let l_head = symbol_for(grammar, l, diagnostics, span);
            let r_head = symbol_for(grammar, r, diagnostics, span);
            let body = grammar.bodies.intern(vec![l_head]);
            grammar.insert_production(head, body);
            match ast {
                MetaAst::Reject(..) => grammar.mark_reject(body, r_head),
                MetaAst::Nofollow(..) => grammar.mark_nofollow(body, r_head),
                MetaAst::Intersect(..) => {
                    // Folding already resolved charset/charset intersection;
                    // a surviving `intersect` mixes non-charset operands and
                    // is recorded the same way reject is, as a filter.
                    grammar.mark_reject(body, r_head);
                }
                _ => unreachable!(),
            }
        }
        MetaAst::GreaterThan(l, r) | MetaAst::LessThan(l, r) => {
            let l_head = symbol_for(grammar, l, diagnostics, span);
            let r_head = symbol_for(grammar, r, diagnostics, span);
            let body = grammar.bodies.intern(vec![l_head]);
            grammar.insert_production(head, body);
            let order = if matches!(ast, MetaAst::GreaterThan(..)) {
                PrecedenceOrder::GreaterThan
            } else {
                PrecedenceOrder::LessThan
            };
            grammar.mark_precedence(body, order, r_head);
        }
        MetaAst::Capture(inner) => {
            lower_into(grammar, head, inner, diagnostics, span);
            grammar.mark_capture(head);
        }
    }
    head
}

/// Resolves `ast` to a single symbol, reusing an existing symbol where one
/// already stands for `ast` (a charset literal, or a reference to an
/// already-named non-terminal) and otherwise lowering it under a fresh
/// anonymous head. This is what keeps a concatenation like `'a' 'b'` a
/// two-terminal body instead of two needless one-hop indirections.
fn symbol_for(grammar: &mut GrammarTable, ast: &MetaAst, diagnostics: &mut Diagnostics, span: Span) -> SymbolId {
    match ast {
        MetaAst::Identifier(name) => grammar.symbols.intern_nonterminal(name.clone()),
        MetaAst::Charset(c) => grammar.symbols.intern_terminal(c.clone()),
        _ => {
            let head = grammar.symbols.fresh_nonterminal();
            lower_into(grammar, head, ast, diagnostics, span)
        }
    }
}

fn lower_fresh_head_for_repeated(grammar: &mut GrammarTable, inner: &MetaAst, n: u32, diagnostics: &mut Diagnostics, span: Span) -> Vec<SymbolId> {
    let head = symbol_for(grammar, inner, diagnostics, span);
    std::iter::repeat(head).take(n as usize).collect()
}

/// `A*` / `A+` with an optional repetition count, per the lowering table's
/// `(A)ₙ*` / `(A)ₙ+` rows: build the anonymous `T → A T; T → ϵ` trailer once,
/// then prefix it with `n` copies of `A` (or zero for the uncounted forms).
fn lower_repetition(
    grammar: &mut GrammarTable,
    head: SymbolId,
    inner: &MetaAst,
    count: Option<u32>,
    star: bool,
    diagnostics: &mut Diagnostics,
    span: Span,
) {
    let a_head = symbol_for(grammar, inner, diagnostics, span);
    match count {
        None => {
            let via_a_then_h = grammar.bodies.intern(vec![a_head, head]);
            grammar.insert_production(head, via_a_then_h);
            if star {
                let eps = grammar.bodies.epsilon();
                grammar.insert_production(head, eps);
            } else {
                let just_a = grammar.bodies.intern(vec![a_head]);
                grammar.insert_production(head, just_a);
            }
        }
        Some(n) => {
            let trailer = grammar.symbols.fresh_nonterminal();
            let via_a_then_trailer = grammar.bodies.intern(vec![a_head, trailer]);
            grammar.insert_production(trailer, via_a_then_trailer);
            let trailer_eps = grammar.bodies.epsilon();
            grammar.insert_production(trailer, trailer_eps);

            let mut symbols: Vec<SymbolId> = std::iter::repeat(a_head).take(n as usize).collect();
            symbols.push(trailer);
            let body = grammar.bodies.intern(symbols);
            grammar.insert_production(head, body);
            if star {
                let eps = grammar.bodies.epsilon();
                grammar.insert_production(head, eps);
            }
        }
    }
}

/// A charset matching both cases of an ASCII letter; non-letters match
/// themselves only.
fn caseless_charset(c: char) -> dewy_cc_core::Charset {
    if c.is_ascii_alphabetic() {
        let lower = c.to_ascii_lowercase() as u32;
        let upper = c.to_ascii_uppercase() as u32;
        dewy_cc_core::Charset::single(lower).union(&dewy_cc_core::Charset::single(upper))
    } else {
        dewy_cc_core::Charset::single(c as u32)
    }
}

#[cfg(test)]
mod lower_tests {
    use super::*;
    use crate::parser::Parser;

    fn lower_source(src: &str) -> GrammarTable {
        let (grammar, _diagnostics) = lower_source_with_diagnostics(src);
        grammar
    }

    fn lower_source_with_diagnostics(src: &str) -> (GrammarTable, Diagnostics) {
        let mut parser = Parser::new(src);
        let rules = parser.parse_grammar().expect("parse ok");
        let mut grammar = GrammarTable::new();
        let mut diagnostics = Diagnostics::new();
        for rule in &rules {
            lower_rule(&mut grammar, &rule.head, &rule.body, &mut diagnostics, rule.span);
        }
        (grammar, diagnostics)
    }

    #[test]
    fn concatenation_lowers_to_single_body() {
        let grammar = lower_source("#r = 'a' 'b';");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        let bodies: Vec<_> = grammar.bodies_of(head).collect();
        assert_eq!(bodies.len(), 1);
        assert_eq!(grammar.bodies.get(bodies[0]).len(), 2);
    }

    #[test]
    fn star_lowers_to_two_bodies() {
        let grammar = lower_source("#r = 'a'*;");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        assert_eq!(grammar.bodies_of(head).count(), 2);
    }

    #[test]
    fn plus_lowers_to_two_bodies_neither_epsilon() {
        let grammar = lower_source("#r = 'a'+;");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        let bodies: Vec<_> = grammar.bodies_of(head).collect();
        assert_eq!(bodies.len(), 2);
        assert!(bodies.iter().all(|b| !grammar.bodies.is_epsilon(*b)));
    }

    #[test]
    fn alternation_reuses_parent_head() {
        let grammar = lower_source("#r = 'a' | 'b';");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        assert_eq!(grammar.bodies_of(head).count(), 2);
    }

    #[test]
    fn reject_marks_filter_on_body() {
        let grammar = lower_source("#r = [a-z] - [m-q];");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        let body = grammar.bodies_of(head).next().expect("one body");
        assert!(grammar.reject_of(body).is_some());
    }

    #[test]
    fn capture_marks_head() {
        let grammar = lower_source("#r = ('a').;");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        assert!(grammar.is_capture(head));
    }

    #[test]
    fn zero_count_lowers_to_epsilon_with_a_warning() {
        let (grammar, diagnostics) = lower_source_with_diagnostics("#r = 'a'0;");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        let bodies: Vec<_> = grammar.bodies_of(head).collect();
        assert_eq!(bodies.len(), 1);
        assert!(grammar.bodies.is_epsilon(bodies[0]));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn compliment_of_non_charset_warns_and_passes_through() {
        let (grammar, diagnostics) = lower_source_with_diagnostics("#r = #x~; #x = 'a';");
        let head = grammar.symbols.find_nonterminal("r").expect("head interned");
        assert_eq!(grammar.bodies_of(head).count(), 1);
        assert_eq!(diagnostics.len(), 1);
    }
}
