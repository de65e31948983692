//! Dewy meta-grammar compiler: scanner -> parser/lowerer -> FIRST/nullable
//! analysis -> RNGLR table builder -> BSR/SPPF driver (spec.md §2's
//! pipeline). [`compile_grammar`] runs everything up to table construction;
//! [`Compiled::parse`] then drives the RNGLR parser over an input string.

pub mod analyze;
pub mod build;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod parser;
pub mod scanner;

use dewy_cc_core::GrammarTable;

use analyze::Analysis;
use build::Built;
use diagnostics::Diagnostics;
use driver::ParseOutcome;
use error::{CompileError, ParseError};
use parser::Parser;

/// The result of compiling a meta-grammar source text: everything needed to
/// drive repeated parses of input strings against it.
pub struct Compiled {
    pub grammar: GrammarTable,
    pub analysis: Analysis,
    pub built: Built,
    pub diagnostics: Diagnostics,
}

impl Compiled {
    /// Drive the RNGLR/BSR parser over `input` against this grammar.
    pub fn parse(&self, input: &str) -> ParseOutcome {
        driver::parse(&self.grammar, &self.built, input)
    }
}

/// Scan, parse, lower, analyse and build a meta-grammar source text, with
/// `start_rule` as the grammar's start symbol.
///
/// Scan/parse failures (spec.md §7's `scan-fail`/`parse-fail (grammar)`) and
/// build invariant violations (`build-fail`) are fatal and returned as
/// `Err`; anything lowering wants to warn about (`lower-fail`, e.g. a
/// reference to an undefined non-terminal) is collected non-fatally into
/// the returned [`Diagnostics`].
pub fn compile_grammar(source: &str, start_rule: &str) -> Result<Compiled, CompileError> {
    let mut parser = Parser::new(source);
    let rules = parser.parse_grammar().map_err(CompileError::from)?;

    let mut grammar = GrammarTable::new();
    let mut diagnostics = Diagnostics::new();
    for rule in &rules {
        parser::lower_rule(&mut grammar, &rule.head, &rule.body, &mut diagnostics, rule.span);
    }

    for rule in &rules {
        check_references(&grammar, &rule.body, &mut diagnostics, rule.span);
    }

    let start_symbol = match grammar.symbols.find_nonterminal(start_rule) {
        Some(id) => id,
        None => {
            return Err(CompileError::Parse(ParseError {
                offset: 0,
                reason: format!("start rule `{start_rule}` is not defined in this grammar"),
            }))
        }
    };
    grammar.finalise(start_symbol);

    let analysis = Analysis::compute(&grammar).map_err(CompileError::from)?;
    let built = build::build(&grammar, &analysis).map_err(CompileError::from)?;

    Ok(Compiled { grammar, analysis, built, diagnostics })
}

/// Walk a rule's body looking for identifier references to non-terminals
/// that were never given a production — spec.md §7's `lower-fail`, reported
/// as a diagnostic rather than a hard error since the rest of the grammar
/// may still be usable.
fn check_references(grammar: &GrammarTable, ast: &parser::MetaAst, diagnostics: &mut Diagnostics, span: diagnostics::Span) {
    use parser::MetaAst::*;
    match ast {
        Identifier(name) => {
            if let Some(id) = grammar.symbols.find_nonterminal(name) {
                if !grammar.is_nonterminal_defined(id) {
                    diagnostics.error(span, format!("undefined non-terminal `#{name}`"));
                }
            } else {
                diagnostics.error(span, format!("undefined non-terminal `#{name}`"));
            }
        }
        Eps | Charset(_) | String(_) | Caseless(_) => {}
        Star(inner, _) | Plus(inner, _) | Option(inner) | Count(inner, _) | Compliment(inner) | Capture(inner) => {
            check_references(grammar, inner, diagnostics, span);
        }
        Cat(items) | Or(items) => {
            for item in items {
                check_references(grammar, item, diagnostics, span);
            }
        }
        Intersect(l, r) | Reject(l, r) | Nofollow(l, r) | GreaterThan(l, r) | LessThan(l, r) => {
            check_references(grammar, l, diagnostics, span);
            check_references(grammar, r, diagnostics, span);
        }
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_grammar_and_accepts_its_input() {
        let compiled = compile_grammar("#r = 'a' 'b';", "r").expect("compiles");
        let outcome = compiled.parse("ab");
        assert!(outcome.accepted);
    }

    #[test]
    fn rejects_input_that_does_not_match() {
        let compiled = compile_grammar("#r = 'a' 'b';", "r").expect("compiles");
        let outcome = compiled.parse("ac");
        assert!(!outcome.accepted);
    }

    #[test]
    fn undefined_start_rule_is_a_parse_error() {
        let err = compile_grammar("#r = 'a';", "missing").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn reference_to_undefined_nonterminal_is_a_diagnostic_not_a_hard_error() {
        let compiled = compile_grammar("#r = #undefined;", "r").expect("compiles despite dangling reference");
        assert!(compiled.diagnostics.has_errors());
    }
}
