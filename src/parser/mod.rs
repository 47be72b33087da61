//! Parser module for shell command lines
//!
//! This module contains the lexer and the recursive descent parser that turn
//! a command line into raw syntax trees.

pub mod types;
pub mod lexer;
pub mod word_parser;
pub mod parser_substitution;
pub mod compound_parser;
pub mod command_parser;
pub mod parser;

// Re-exports
pub use types::{ParseErrorKind, ParseException};
pub use lexer::{Lexer, Token, TokenType, LexerError};
pub use parser::{parse, Parser};
