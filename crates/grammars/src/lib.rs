//! bnfkit-grammars: grammars built on the public bnfkit-core surface.
//!
//! - [`calc`] -- arithmetic over exact decimals with operator precedence,
//!   parentheses and scientific notation
//! - [`sqlish`] -- a two-tier translator from a small SQL dialect to
//!   key-condition query parameters

pub mod calc;
pub mod sqlish;

pub use calc::CalcError;
pub use sqlish::{QueryParams, SqlishError, Translator};
