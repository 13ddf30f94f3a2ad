//! Parsed, format-independent representation of one input document.
//!
//! YAML is loaded with saphyr and immediately converted into [`GenericNode`],
//! an owned tagged variant that the transformer can match on exhaustively.

mod node;

pub use node::{DocumentError, GenericNode, Scalar};
