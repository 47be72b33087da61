//! Lexer for Shell Command Lines
//!
//! The lexer tokenizes input into a stream of tokens that the parser consumes.
//! It handles:
//! - Operators and delimiters
//! - Words (with quoting rules and balanced substitutions)
//! - Comments
//! - Here-document bodies
//! - Escape sequences and line continuations
//!
//! Word tokens carry two texts: `value` with quotes removed and escapes
//! resolved, and `raw`, the exact source slice, which the word parser scans
//! again for expansions.

use std::collections::HashMap;

use crate::parser::parser_substitution::{
    find_closing_backtick, find_matching_brace, find_matching_paren,
};

/// Token types for the shell lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // End of input
    Eof,

    // Newlines and separators
    Newline,
    Semicolon,
    Amp, // &

    // Operators
    Pipe,    // |
    PipeAmp, // |&
    AndAnd,  // &&
    OrOr,    // ||
    Bang,    // !

    // Redirections
    Less,      // <
    Great,     // >
    DLess,     // <<
    DGreat,    // >>
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
    DLessDash, // <<-
    Clobber,   // >|
    TLess,     // <<<
    AndGreat,  // &>
    AndDGreat, // &>>

    // Grouping
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Case terminators
    DSemi,       // ;;
    SemiAnd,     // ;&
    SemiSemiAnd, // ;;&

    // Constructs recognized only to be rejected
    DBrackStart, // [[
    DParenStart, // ((

    // Reserved words
    If,
    Then,
    Else,
    Elif,
    Fi,
    For,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    In,
    Function,
    Select,
    Time,
    Coproc,

    // Words
    Word,
    Number,         // fd number directly before a redirection: 2>
    AssignmentWord, // VAR=value

    Comment,
    HeredocContent,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "NEWLINE",
            Self::Semicolon => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::PipeAmp => "|&",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Less => "<",
            Self::Great => ">",
            Self::DLess => "<<",
            Self::DGreat => ">>",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
            Self::DLessDash => "<<-",
            Self::Clobber => ">|",
            Self::TLess => "<<<",
            Self::AndGreat => "&>",
            Self::AndDGreat => "&>>",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::DSemi => ";;",
            Self::SemiAnd => ";&",
            Self::SemiSemiAnd => ";;&",
            Self::DBrackStart => "[[",
            Self::DParenStart => "((",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::Fi => "fi",
            Self::For => "for",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::Case => "case",
            Self::Esac => "esac",
            Self::In => "in",
            Self::Function => "function",
            Self::Select => "select",
            Self::Time => "time",
            Self::Coproc => "coproc",
            Self::Word => "WORD",
            Self::Number => "NUMBER",
            Self::AssignmentWord => "ASSIGNMENT_WORD",
            Self::Comment => "COMMENT",
            Self::HeredocContent => "HEREDOC_CONTENT",
        }
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Text with quotes removed and escapes resolved
    pub value: String,
    /// Exact source text of the token
    pub raw: String,
    /// Character offsets in the input (shifted by the lexer base)
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    /// For WORD tokens: quote information
    pub quoted: bool,
    pub single_quoted: bool,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        start: usize,
        end: usize,
        line: usize,
        column: usize,
    ) -> Self {
        let value = value.into();
        Self {
            token_type,
            raw: value.clone(),
            value,
            start,
            end,
            line,
            column,
            quoted: false,
            single_quoted: false,
        }
    }

    pub fn with_quotes(mut self, quoted: bool, single_quoted: bool) -> Self {
        self.quoted = quoted;
        self.single_quoted = single_quoted;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }
}

/// Error produced when the lexer encounters invalid input
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// A quote, parenthesis, brace or backtick was never closed
    pub unterminated: bool,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexerError {}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            unterminated: false,
        }
    }

    pub fn unterminated(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            unterminated: true,
        }
    }
}

/// Pending heredoc information
#[derive(Debug, Clone)]
struct PendingHeredoc {
    delimiter: String,
    strip_tabs: bool,
}

lazy_static::lazy_static! {
    /// Reserved words in bash
    static ref RESERVED_WORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("if", TokenType::If);
        m.insert("then", TokenType::Then);
        m.insert("else", TokenType::Else);
        m.insert("elif", TokenType::Elif);
        m.insert("fi", TokenType::Fi);
        m.insert("for", TokenType::For);
        m.insert("while", TokenType::While);
        m.insert("until", TokenType::Until);
        m.insert("do", TokenType::Do);
        m.insert("done", TokenType::Done);
        m.insert("case", TokenType::Case);
        m.insert("esac", TokenType::Esac);
        m.insert("in", TokenType::In);
        m.insert("function", TokenType::Function);
        m.insert("select", TokenType::Select);
        m.insert("time", TokenType::Time);
        m.insert("coproc", TokenType::Coproc);
        m
    };

    /// Single-character operators
    static ref SINGLE_CHAR_OPS: HashMap<char, TokenType> = {
        let mut m = HashMap::new();
        m.insert('|', TokenType::Pipe);
        m.insert('&', TokenType::Amp);
        m.insert(';', TokenType::Semicolon);
        m.insert('(', TokenType::LParen);
        m.insert(')', TokenType::RParen);
        m.insert('<', TokenType::Less);
        m.insert('>', TokenType::Great);
        m
    };
}

/// Three-character operators
const THREE_CHAR_OPS: &[(&str, TokenType)] = &[
    (";;&", TokenType::SemiSemiAnd),
    ("<<<", TokenType::TLess),
    ("&>>", TokenType::AndDGreat),
];

/// Two-character operators
const TWO_CHAR_OPS: &[(&str, TokenType)] = &[
    ("&&", TokenType::AndAnd),
    ("||", TokenType::OrOr),
    (";;", TokenType::DSemi),
    (";&", TokenType::SemiAnd),
    ("|&", TokenType::PipeAmp),
    (">>", TokenType::DGreat),
    ("<&", TokenType::LessAnd),
    (">&", TokenType::GreatAnd),
    ("<>", TokenType::LessGreat),
    (">|", TokenType::Clobber),
    ("&>", TokenType::AndGreat),
];

/// Check if a string is a valid variable name
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Check if a character is a word boundary (ends a word token)
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// `NAME=...` or `NAME+=...` where NAME is a valid variable name
fn is_assignment_word(raw: &str) -> bool {
    match raw.find('=') {
        Some(eq) => {
            let lhs = &raw[..eq];
            is_valid_name(lhs.strip_suffix('+').unwrap_or(lhs))
        }
        None => false,
    }
}

/// Lexer over a single input string
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Added to every reported offset; non-zero for substitution bodies
    base: usize,
    tokens: Vec<Token>,
    pending_heredocs: Vec<PendingHeredoc>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self::with_base(input, 0)
    }

    /// Lexer whose offsets start at `base` instead of zero
    pub fn with_base(input: &str, base: usize) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            base,
            tokens: Vec::new(),
            pending_heredocs: Vec::new(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let len = self.input.len();

        while self.pos < len {
            // Here-document bodies start on the line after their operator
            if !self.pending_heredocs.is_empty()
                && self.tokens.last().map(|t| t.token_type) == Some(TokenType::Newline)
            {
                self.read_heredoc_content();
                continue;
            }

            self.skip_whitespace();

            if self.pos >= len {
                break;
            }

            if let Some(token) = self.next_token()? {
                self.tokens.push(token);
            }
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            "",
            self.base + self.pos,
            self.base + self.pos,
            self.line,
            self.column,
        ));

        Ok(self.tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current();
        if let Some(ch) = c {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    /// Copy source characters up to and including `end` into `value`
    fn consume_through(&mut self, end: usize, value: &mut String) {
        while self.pos <= end {
            match self.advance() {
                Some(c) => value.push(c),
                None => break,
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            match c {
                ' ' | '\t' => {
                    self.advance();
                }
                '\\' if self.peek(1) == Some('\n') => {
                    // Line continuation
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn operator_token(&mut self, token_type: TokenType, text: &str, start: usize, line: usize, column: usize) -> Token {
        for _ in text.chars() {
            self.advance();
        }
        Token::new(
            token_type,
            text,
            self.base + start,
            self.base + self.pos,
            line,
            column,
        )
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        let start_line = self.line;
        let start_column = self.column;
        let start_pos = self.pos;

        let c0 = match self.current() {
            Some(c) => c,
            None => return Ok(None),
        };
        let c1 = self.peek(1);
        let c2 = self.peek(2);

        if c0 == '#' {
            return Ok(Some(self.read_comment(start_pos, start_line, start_column)));
        }

        if c0 == '\n' {
            return Ok(Some(self.operator_token(
                TokenType::Newline,
                "\n",
                start_pos,
                start_line,
                start_column,
            )));
        }

        // Process substitution opens a word, not a redirection
        if (c0 == '<' || c0 == '>') && c1 == Some('(') {
            return self.read_word(start_pos, start_line, start_column);
        }

        // Special case: <<- (heredoc with tab stripping)
        if c0 == '<' && c1 == Some('<') && c2 == Some('-') {
            let token = self.operator_token(TokenType::DLessDash, "<<-", start_pos, start_line, start_column);
            self.register_heredoc_from_lookahead(true);
            return Ok(Some(token));
        }

        for (op_str, token_type) in THREE_CHAR_OPS {
            let chars: Vec<char> = op_str.chars().collect();
            if c0 == chars[0] && c1 == Some(chars[1]) && c2 == Some(chars[2]) {
                return Ok(Some(self.operator_token(*token_type, op_str, start_pos, start_line, start_column)));
            }
        }

        // Special case: << (heredoc)
        if c0 == '<' && c1 == Some('<') {
            let token = self.operator_token(TokenType::DLess, "<<", start_pos, start_line, start_column);
            self.register_heredoc_from_lookahead(false);
            return Ok(Some(token));
        }

        if c0 == '(' && c1 == Some('(') {
            return Ok(Some(self.operator_token(TokenType::DParenStart, "((", start_pos, start_line, start_column)));
        }

        if c0 == '[' && c1 == Some('[') && c2.map_or(true, |c| c == ' ' || c == '\t' || c == '\n') {
            return Ok(Some(self.operator_token(TokenType::DBrackStart, "[[", start_pos, start_line, start_column)));
        }

        for (op_str, token_type) in TWO_CHAR_OPS {
            let chars: Vec<char> = op_str.chars().collect();
            if c0 == chars[0] && c1 == Some(chars[1]) {
                return Ok(Some(self.operator_token(*token_type, op_str, start_pos, start_line, start_column)));
            }
        }

        if let Some(&token_type) = SINGLE_CHAR_OPS.get(&c0) {
            let text = c0.to_string();
            return Ok(Some(self.operator_token(token_type, &text, start_pos, start_line, start_column)));
        }

        let standalone = c1.map_or(true, |c| c == ' ' || c == '\t' || c == '\n');

        // { only opens a group when followed by whitespace
        if c0 == '{' && standalone {
            return Ok(Some(self.operator_token(TokenType::LBrace, "{", start_pos, start_line, start_column)));
        }

        if c0 == '}' && c1.map_or(true, is_word_boundary) {
            return Ok(Some(self.operator_token(TokenType::RBrace, "}", start_pos, start_line, start_column)));
        }

        if c0 == '!' && standalone {
            return Ok(Some(self.operator_token(TokenType::Bang, "!", start_pos, start_line, start_column)));
        }

        self.read_word(start_pos, start_line, start_column)
    }

    fn read_comment(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        let value: String = self.input[start..self.pos].iter().collect();
        Token::new(
            TokenType::Comment,
            value,
            self.base + start,
            self.base + self.pos,
            line,
            column,
        )
    }

    fn read_word(&mut self, start: usize, line: usize, column: usize) -> Result<Option<Token>, LexerError> {
        let mut value = String::new();
        let mut quoted = false;
        let mut single_quoted = false;

        while let Some(c) = self.current() {
            if is_word_boundary(c) {
                if (c == '<' || c == '>') && self.peek(1) == Some('(') {
                    let close = find_matching_paren(&self.input, self.pos + 1).ok_or_else(|| {
                        LexerError::unterminated(
                            "unexpected EOF while looking for matching `)'",
                            self.line,
                            self.column,
                        )
                    })?;
                    self.consume_through(close, &mut value);
                    continue;
                }
                break;
            }

            match c {
                '\\' => {
                    quoted = true;
                    self.advance();
                    match self.advance() {
                        // Line continuation inside a word
                        Some('\n') => {}
                        Some(escaped) => value.push(escaped),
                        None => value.push('\\'),
                    }
                }
                '\'' => {
                    quoted = true;
                    single_quoted = true;
                    self.read_single_quoted(&mut value)?;
                }
                '"' => {
                    quoted = true;
                    self.advance();
                    self.read_double_quoted(&mut value)?;
                }
                '$' => match self.peek(1) {
                    Some('\'') => {
                        quoted = true;
                        self.advance();
                        self.read_ansi_c_quoted(&mut value)?;
                    }
                    Some('"') => {
                        // Locale string: the quote is handled on the next iteration
                        self.advance();
                    }
                    Some('(') => {
                        let close = self.matching_paren(self.pos + 1)?;
                        self.consume_through(close, &mut value);
                    }
                    Some('{') => {
                        let close = self.matching_brace(self.pos + 1)?;
                        self.consume_through(close, &mut value);
                    }
                    _ => {
                        value.push('$');
                        self.advance();
                    }
                },
                '`' => {
                    let close = self.closing_backtick(self.pos)?;
                    self.consume_through(close, &mut value);
                }
                _ => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        let raw: String = self.input[start..self.pos].iter().collect();
        let token_type = if !quoted && RESERVED_WORDS.contains_key(value.as_str()) {
            RESERVED_WORDS[value.as_str()]
        } else if !quoted
            && !value.is_empty()
            && value.chars().all(|c| c.is_ascii_digit())
            && matches!(self.current(), Some('<' | '>'))
        {
            TokenType::Number
        } else if is_assignment_word(&raw) {
            TokenType::AssignmentWord
        } else {
            TokenType::Word
        };

        Ok(Some(
            Token::new(
                token_type,
                value,
                self.base + start,
                self.base + self.pos,
                line,
                column,
            )
            .with_raw(raw)
            .with_quotes(quoted, single_quoted),
        ))
    }

    fn read_single_quoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        loop {
            match self.advance() {
                Some('\'') => return Ok(()),
                Some(c) => value.push(c),
                None => {
                    return Err(LexerError::unterminated(
                        "unexpected EOF while looking for matching `''",
                        line,
                        column,
                    ))
                }
            }
        }
    }

    /// Read the body of a double-quoted string; the opening quote is already consumed.
    fn read_double_quoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        loop {
            match self.current() {
                None => {
                    return Err(LexerError::unterminated(
                        "unexpected EOF while looking for matching `\"'",
                        line,
                        column,
                    ))
                }
                Some('"') => {
                    self.advance();
                    return Ok(());
                }
                Some('\\') => match self.peek(1) {
                    Some(c @ ('"' | '\\' | '$' | '`')) => {
                        value.push(c);
                        self.advance();
                        self.advance();
                    }
                    Some('\n') => {
                        self.advance();
                        self.advance();
                    }
                    _ => {
                        value.push('\\');
                        self.advance();
                    }
                },
                Some('$') if self.peek(1) == Some('(') => {
                    let close = self.matching_paren(self.pos + 1)?;
                    self.consume_through(close, value);
                }
                Some('$') if self.peek(1) == Some('{') => {
                    let close = self.matching_brace(self.pos + 1)?;
                    self.consume_through(close, value);
                }
                Some('`') => {
                    let close = self.closing_backtick(self.pos)?;
                    self.consume_through(close, value);
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Read `'...'` after `$`, resolving the common backslash escapes
    fn read_ansi_c_quoted(&mut self, value: &mut String) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        loop {
            match self.advance() {
                Some('\'') => return Ok(()),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(LexerError::unterminated(
            "unexpected EOF while looking for matching `''",
            line,
            column,
        ))
    }

    fn matching_paren(&self, open: usize) -> Result<usize, LexerError> {
        find_matching_paren(&self.input, open).ok_or_else(|| {
            LexerError::unterminated(
                "unexpected EOF while looking for matching `)'",
                self.line,
                self.column,
            )
        })
    }

    fn matching_brace(&self, open: usize) -> Result<usize, LexerError> {
        find_matching_brace(&self.input, open).ok_or_else(|| {
            LexerError::unterminated(
                "unexpected EOF while looking for matching `}'",
                self.line,
                self.column,
            )
        })
    }

    fn closing_backtick(&self, open: usize) -> Result<usize, LexerError> {
        find_closing_backtick(&self.input, open).ok_or_else(|| {
            LexerError::unterminated(
                "unexpected EOF while looking for matching ``'",
                self.line,
                self.column,
            )
        })
    }

    /// Peek at the delimiter word following `<<` without consuming it
    fn register_heredoc_from_lookahead(&mut self, strip_tabs: bool) {
        let mut pos = self.pos;
        while matches!(self.input.get(pos), Some(' ' | '\t')) {
            pos += 1;
        }
        let mut delimiter = String::new();
        while let Some(&c) = self.input.get(pos) {
            if is_word_boundary(c) {
                break;
            }
            if !matches!(c, '\'' | '"' | '\\') {
                delimiter.push(c);
            }
            pos += 1;
        }
        if !delimiter.is_empty() {
            self.pending_heredocs.push(PendingHeredoc {
                delimiter,
                strip_tabs,
            });
        }
    }

    /// Read every pending here-document body, one HEREDOC_CONTENT token each
    fn read_heredoc_content(&mut self) {
        let pending: Vec<PendingHeredoc> = self.pending_heredocs.drain(..).collect();
        for heredoc in pending {
            let start = self.pos;
            let (line, column) = (self.line, self.column);
            let mut content = String::new();

            while self.pos < self.input.len() {
                let mut text = String::new();
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                }
                let candidate = if heredoc.strip_tabs {
                    text.trim_start_matches('\t')
                } else {
                    text.as_str()
                };
                if candidate == heredoc.delimiter {
                    break;
                }
                content.push_str(candidate);
                content.push('\n');
            }

            self.tokens.push(Token::new(
                TokenType::HeredocContent,
                content,
                self.base + start,
                self.base + self.pos,
                line,
                column,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_simple_command() {
        let tokens = lex("find . -name foo");
        assert_eq!(tokens.len(), 5); // find, ., -name, foo, EOF
        assert_eq!(tokens[0].token_type, TokenType::Word);
        assert_eq!(tokens[0].value, "find");
        assert_eq!(tokens[2].value, "-name");
        assert_eq!((tokens[2].start, tokens[2].end), (7, 12));
        assert_eq!(tokens[4].token_type, TokenType::Eof);
    }

    #[test]
    fn test_pipeline() {
        let tokens = lex("cat file | grep pattern");
        assert_eq!(tokens[2].token_type, TokenType::Pipe);
    }

    #[test]
    fn test_redirection_and_fd_number() {
        let tokens = lex("ls 2>/dev/null");
        assert_eq!(tokens[1].token_type, TokenType::Number);
        assert_eq!(tokens[2].token_type, TokenType::Great);
        assert_eq!(tokens[3].value, "/dev/null");
    }

    #[test]
    fn test_quotes_are_removed_but_span_is_kept() {
        let tokens = lex("grep 'a b' \"c\"");
        assert_eq!(tokens[1].value, "a b");
        assert_eq!(tokens[1].raw, "'a b'");
        assert!(tokens[1].quoted);
        assert!(tokens[1].single_quoted);
        assert_eq!(tokens[1].end - tokens[1].start, 5);
        assert_eq!(tokens[2].value, "c");
        assert!(!tokens[2].single_quoted);
    }

    #[test]
    fn test_escaped_semicolon_is_a_word() {
        let tokens = lex("find . -exec rm {} \\;");
        let last = &tokens[tokens.len() - 2];
        assert_eq!(last.token_type, TokenType::Word);
        assert_eq!(last.value, ";");
        assert_eq!(last.end - last.start, 2);
        assert_eq!(tokens[4].value, "{}");
    }

    #[test]
    fn test_substitutions_stay_inside_one_word() {
        let tokens = lex("echo $(ls -l | wc -l) `date` <(sort a)");
        assert_eq!(tokens[1].value, "$(ls -l | wc -l)");
        assert_eq!(tokens[2].value, "`date`");
        assert_eq!(tokens[3].value, "<(sort a)");
        assert_eq!(tokens[4].token_type, TokenType::Eof);
    }

    #[test]
    fn test_double_quotes_keep_expansions() {
        let tokens = lex("echo \"$HOME/$(whoami)\"");
        assert_eq!(tokens[1].value, "$HOME/$(whoami)");
        assert!(tokens[1].quoted);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Lexer::new("echo 'abc").tokenize().unwrap_err();
        assert!(err.unterminated);
        let err = Lexer::new("echo $(ls").tokenize().unwrap_err();
        assert!(err.unterminated);
    }

    #[test]
    fn test_assignment() {
        let tokens = lex("VAR=value make");
        assert_eq!(tokens[0].token_type, TokenType::AssignmentWord);
        assert_eq!(tokens[0].value, "VAR=value");
        assert_eq!(lex("'VAR'=value")[0].token_type, TokenType::Word);
    }

    #[test]
    fn test_reserved_words() {
        let tokens = lex("if then else fi");
        assert_eq!(tokens[0].token_type, TokenType::If);
        assert_eq!(tokens[1].token_type, TokenType::Then);
        assert_eq!(tokens[2].token_type, TokenType::Else);
        assert_eq!(tokens[3].token_type, TokenType::Fi);
        assert_eq!(lex("'if'")[0].token_type, TokenType::Word);
    }

    #[test]
    fn test_braces_and_bang() {
        let tokens = lex("{ ls; }");
        assert_eq!(tokens[0].token_type, TokenType::LBrace);
        assert_eq!(tokens[3].token_type, TokenType::RBrace);

        let tokens = lex("find . ! -name x");
        assert_eq!(tokens[2].token_type, TokenType::Bang);
        assert_eq!(lex("echo !foo")[1].token_type, TokenType::Word);
    }

    #[test]
    fn test_heredoc() {
        let tokens = lex("cat <<EOF\nhello\nEOF\n");
        assert_eq!(tokens[1].token_type, TokenType::DLess);
        let heredoc = tokens
            .iter()
            .find(|t| t.token_type == TokenType::HeredocContent)
            .unwrap();
        assert_eq!(heredoc.value, "hello\n");
    }

    #[test]
    fn test_comment() {
        let tokens = lex("ls # list files");
        assert!(tokens.iter().any(|t| t.token_type == TokenType::Comment));
    }

    #[test]
    fn test_base_offset() {
        let tokens = Lexer::with_base("ls -l", 10).tokenize().unwrap();
        assert_eq!((tokens[1].start, tokens[1].end), (13, 15));
    }
}
