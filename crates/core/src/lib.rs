//! zmanim-core: formula DSL core library.
//!
//! Publishers define each zman (halachic time) as a small formula over
//! astronomical primitives, proportional-hour systems, and references
//! to other zmanim. This crate owns the text-to-AST half of that
//! pipeline plus set-level validation:
//!
//! - [`parse_formula()`] -- lex, parse, and semantically check one formula
//! - [`resolve()`] -- validate a full zman set and order it for evaluation
//! - [`symbols`] -- the static registry of primitives, functions,
//!   directions, and base systems
//! - [`assist`] -- cursor-context analysis for formula editors
//! - [`ParseError`] / [`DependencyError`] -- the structured error taxonomy
//!
//! Evaluation lives in the companion `zmanim-eval` crate.

pub mod assist;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod symbols;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{BaseSystem, BinOp, Direction, Expr, ValueKind};
pub use error::{DependencyError, ParseError, MAX_NESTING_DEPTH};
pub use resolve::{EvaluationOrder, ZmanDefinition};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use parser::parse_formula;
pub use resolve::resolve;
