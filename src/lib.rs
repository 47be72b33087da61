//! shell-normalizer - Shell command lines as normalized command trees
//!
//! This library parses a single shell command line and rewrites it into a
//! restricted tree of head commands, flags, arguments and logic operators,
//! suitable as a canonical target representation for command-line datasets.

pub mod ast;
pub mod normalizer;
pub mod parser;

pub use ast::types::*;
pub use normalizer::{
    normalize_ast, GrammarProfile, Lexicon, NormalizeFailure, NormalizedTree, Normalizer,
    NormalizerOptions,
};
pub use parser::{parse, ParseException, Parser};
