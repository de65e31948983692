//! Symbols (spec.md §3): terminals (charsets) and non-terminals (interned
//! names), sharing a single symbol table so that table index is identity.

use serde::{Deserialize, Serialize};

use crate::charset::Charset;
use crate::interner::{Id, Interner};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(Charset),
    NonTerminal(String),
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_terminal(&self) -> Option<&Charset> {
        match self {
            Symbol::Terminal(c) => Some(c),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            Symbol::NonTerminal(n) => Some(n),
            Symbol::Terminal(_) => None,
        }
    }
}

pub type SymbolId = Id<Symbol>;

/// Symbol table: a single interner shared by terminals and non-terminals,
/// pre-seeded with the distinguished `endmarker` terminal at index 0 so its
/// id is always known without a lookup.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    interner: Interner<Symbol>,
    endmarker: SymbolId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let endmarker = interner.intern(Symbol::Terminal(Charset::endmarker()));
        Self { interner, endmarker }
    }

    pub fn endmarker(&self) -> SymbolId {
        self.endmarker
    }

    pub fn intern_terminal(&mut self, charset: Charset) -> SymbolId {
        crate::invariants::check_charset(&charset);
        self.interner.intern(Symbol::Terminal(charset))
    }

    pub fn intern_nonterminal(&mut self, name: impl Into<String>) -> SymbolId {
        self.interner.intern(Symbol::NonTerminal(name.into()))
    }

    /// Synthesize a fresh anonymous non-terminal (`#__i` for a fresh `i`,
    /// spec.md §4.2) guaranteed not to collide with any existing name.
    pub fn fresh_nonterminal(&mut self) -> SymbolId {
        let mut i = self.interner.len();
        loop {
            let name = format!("#__{i}");
            if self.interner.find(&Symbol::NonTerminal(name.clone())).is_none() {
                return self.interner.intern(Symbol::NonTerminal(name));
            }
            i += 1;
        }
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        self.interner.get(id)
    }

    /// Looks up an already-interned non-terminal by name without interning
    /// a new one on miss.
    pub fn find_nonterminal(&self, name: &str) -> Option<SymbolId> {
        self.interner.find(&Symbol::NonTerminal(name.to_string()))
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.get(id).is_terminal()
    }

    pub fn len(&self) -> usize {
        self.interner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.interner.iter()
    }
}

#[cfg(test)]
mod symbol_tests {
    use super::*;

    #[test]
    fn endmarker_is_preseeded_and_stable() {
        let table = SymbolTable::new();
        assert_eq!(table.endmarker().as_usize(), 0);
        assert!(table.is_terminal(table.endmarker()));
    }

    #[test]
    fn nonterminal_interning_dedupes_by_name() {
        let mut table = SymbolTable::new();
        let a = table.intern_nonterminal("expr");
        let b = table.intern_nonterminal("expr");
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_nonterminal_never_collides() {
        let mut table = SymbolTable::new();
        let explicit = table.intern_nonterminal("#__1");
        let fresh = table.fresh_nonterminal();
        assert_ne!(explicit, fresh);
    }

    #[test]
    fn symbol_round_trips_through_json() {
        let nonterminal = Symbol::NonTerminal("expr".to_string());
        let json = serde_json::to_string(&nonterminal).expect("serializes");
        let back: Symbol = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(nonterminal, back);

        let terminal = Symbol::Terminal(Charset::endmarker());
        let json = serde_json::to_string(&terminal).expect("serializes");
        let back: Symbol = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(terminal, back);
    }
}
