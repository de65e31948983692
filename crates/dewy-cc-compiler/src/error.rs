//! Crate-level error types (spec.md §7). `ScanError`, `ParseError`, and
//! `BuildError` are fatal; lower-fail and parse-fail(input) are reported
//! through [`crate::diagnostics::Diagnostics`] instead, since spec.md names
//! them as non-fatal.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("scan failed at byte offset {offset}: {reason}")]
pub struct ScanError {
    pub offset: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("parse failed at byte offset {offset}: {reason}")]
pub struct ParseError {
    pub offset: usize,
    pub reason: String,
}

/// An internal bug in the builder, not a user-correctable grammar error
/// (spec.md §7's `build-fail`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("internal build invariant violated: {reason}")]
    Invariant { reason: String },
    /// A fixed-point loop (FIRST/nullable, or CLOSURE/GOTO) ran past its
    /// iteration cap. Both loops are mathematically guaranteed to converge
    /// over a finite symbol/item universe; hitting this means the cap itself
    /// is wrong or the grammar table is unbounded, either way a bug rather
    /// than a user-correctable grammar mistake.
    #[error("fixed-point analysis in {pass} did not converge within {iterations} iterations")]
    FuelExhausted { pass: String, iterations: usize },
}

impl BuildError {
    pub fn invariant(reason: impl Into<String>) -> Self {
        BuildError::Invariant { reason: reason.into() }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
