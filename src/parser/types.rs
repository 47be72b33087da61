//! Parser Types and Constants
//!
//! Shared types, limits, and token predicates used across parser modules.

use std::fmt;
use thiserror::Error;
use crate::parser::lexer::{LexerError, TokenType};

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 1_000_000; // 1MB max input
pub const MAX_TOKENS: usize = 100_000; // Max tokens to parse
pub const MAX_PARSE_ITERATIONS: usize = 1_000_000; // Max iterations in parsing loops
pub const MAX_PARSER_DEPTH: usize = 200; // Max recursion depth for nested constructs

/// Check if a token type is a redirection token
pub fn is_redirection_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Less
            | TokenType::Great
            | TokenType::DLess
            | TokenType::DGreat
            | TokenType::LessAnd
            | TokenType::GreatAnd
            | TokenType::LessGreat
            | TokenType::DLessDash
            | TokenType::Clobber
            | TokenType::TLess
            | TokenType::AndGreat
            | TokenType::AndDGreat
    )
}

/// Check if a token type can follow a number in a redirection
pub fn is_redirection_after_number(t: TokenType) -> bool {
    is_redirection_token(t) && !matches!(t, TokenType::AndGreat | TokenType::AndDGreat)
}

/// Check if a token type is a reserved word when it appears in command position
pub fn is_reserved_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::If
            | TokenType::Then
            | TokenType::Else
            | TokenType::Elif
            | TokenType::Fi
            | TokenType::For
            | TokenType::While
            | TokenType::Until
            | TokenType::Do
            | TokenType::Done
            | TokenType::Case
            | TokenType::Esac
            | TokenType::In
            | TokenType::Function
            | TokenType::Select
            | TokenType::Time
            | TokenType::Coproc
            | TokenType::LBrace
            | TokenType::RBrace
            | TokenType::Bang
    )
}

/// Tokens that close a compound body and therefore cannot start a command
pub fn is_body_terminator(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Then
            | TokenType::Else
            | TokenType::Elif
            | TokenType::Fi
            | TokenType::Do
            | TokenType::Done
            | TokenType::Esac
            | TokenType::RBrace
            | TokenType::RParen
            | TokenType::DSemi
            | TokenType::SemiAnd
            | TokenType::SemiSemiAnd
    )
}

/// The upstream failure classes a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Unterminated quote, parenthesis, brace or backtick
    MatchedPair,
    /// Generic syntax error
    Syntax,
    /// Recognized shell syntax this parser does not build trees for
    Unimplemented,
    /// Nothing to parse
    EmptyInput,
    /// A statement that does not form a command
    NotACommand,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchedPair => write!(f, "MatchedPairError"),
            Self::Syntax => write!(f, "ParsingError"),
            Self::Unimplemented => write!(f, "NotImplementedError"),
            Self::EmptyInput => write!(f, "EmptyInput"),
            Self::NotACommand => write!(f, "NotACommand"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub struct ParseException {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            self.kind, self.line, self.column, self.message
        )
    }
}

impl ParseException {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(ParseErrorKind::Syntax, message, line, column)
    }

    pub fn unimplemented(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(ParseErrorKind::Unimplemented, message, line, column)
    }
}

impl From<LexerError> for ParseException {
    fn from(e: LexerError) -> Self {
        let kind = if e.unterminated {
            ParseErrorKind::MatchedPair
        } else {
            ParseErrorKind::Syntax
        };
        ParseException::new(kind, e.message, e.line, e.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_redirection_token() {
        assert!(is_redirection_token(TokenType::Less));
        assert!(is_redirection_token(TokenType::Great));
        assert!(is_redirection_token(TokenType::DGreat));
        assert!(!is_redirection_token(TokenType::Word));
    }

    #[test]
    fn test_number_cannot_prefix_and_great() {
        assert!(is_redirection_after_number(TokenType::GreatAnd));
        assert!(!is_redirection_after_number(TokenType::AndGreat));
    }

    #[test]
    fn test_lexer_error_kind() {
        let unterminated = LexerError::unterminated("unterminated quote", 1, 5);
        assert_eq!(ParseException::from(unterminated).kind, ParseErrorKind::MatchedPair);

        let other = LexerError::new("bad token", 1, 1);
        assert_eq!(ParseException::from(other).kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn test_display_names_kind() {
        let e = ParseException::unimplemented("case", 1, 1);
        assert_eq!(e.to_string(), "NotImplementedError at 1:1: case");
    }
}
