//! Interned data model for the Dewy compiler-compiler.
//!
//! Leaf dependency in the pipeline (spec.md §2): charsets, symbol/body
//! interning, the grammar table, LR items and itemsets, FIRST sets, the
//! parse table, and the GSS/SPPF types the RNGLR driver mutates during a
//! parse. Nothing in this crate knows how to scan or parse Dewy source; it
//! only defines the shapes every later stage reads and writes.

pub mod body;
pub mod charset;
pub mod fset;
pub mod grammar;
pub mod gss;
pub mod interner;
pub mod invariants;
pub mod item;
pub mod sppf;
pub mod symbol;
pub mod table;

pub use body::{Body, BodyId, BodyTable};
pub use charset::{Charset, CpRange};
pub use fset::FSet;
pub use grammar::GrammarTable;
pub use gss::{Gss, GssCoord, GssPath};
pub use interner::{Id, Interner};
pub use item::{Item, ItemSet, ItemSetTable, StateId};
pub use sppf::{apply_reject_filter, ChildList, ChildListId, Sppf, SppfId, SppfNode};
pub use symbol::{Symbol, SymbolId, SymbolTable};
pub use table::{Action, ParseTable};
