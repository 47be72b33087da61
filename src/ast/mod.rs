//! Raw Syntax Tree
//!
//! The tree produced by the shell parser and consumed by the normalizer.
//!
//! Architecture:
//!   Input → Preprocess → Lexer → Parser → Syntax tree → Normalizer → Command tree

pub mod types;
