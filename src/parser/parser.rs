//! Recursive Descent Parser for Shell Command Lines
//!
//! This parser consumes tokens from the lexer and produces raw syntax trees.
//! It follows the bash grammar structure closely enough to give every
//! construct the right kind, and rejects the constructs it does not model.
//!
//! Grammar (simplified):
//!   script       ::= list (NEWLINE list)*
//!   list         ::= pipeline ((&&|'||'|;|&) pipeline)* [;|&]
//!   pipeline     ::= [!] command (('|'|'|&') command)*
//!   command      ::= simple_command | compound_command | function_def
//!   simple_cmd   ::= (assignment | redirection)* word (word | redirection)*
//!   compound_cmd ::= if | for | while | until | subshell | group

use crate::ast::types::{Span, SyntaxNode, AST};
use crate::parser::lexer::{Lexer, Token, TokenType};
use crate::parser::types::{
    is_body_terminator, ParseErrorKind, ParseException, MAX_INPUT_SIZE, MAX_PARSER_DEPTH,
    MAX_PARSE_ITERATIONS, MAX_TOKENS,
};

/// Parse a command line into its top-level statements.
///
/// Each newline-separated statement becomes one root. Empty input is an error.
pub fn parse(input: &str) -> Result<Vec<SyntaxNode>, ParseException> {
    Parser::new().parse(input)
}

/// Main parser struct
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    /// Substitution nesting level plus the current command nesting
    pub(crate) depth: usize,
    pub(crate) parse_iterations: usize,
    /// Index past the last here-document body handed out
    pub(crate) heredoc_cursor: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self::nested(0)
    }

    /// Parser for a substitution body at the given nesting level
    pub(crate) fn nested(depth: usize) -> Self {
        Parser {
            tokens: vec![Token::new(TokenType::Eof, "", 0, 0, 1, 1)],
            pos: 0,
            depth,
            parse_iterations: 0,
            heredoc_cursor: 0,
        }
    }

    /// Check parse iteration limit to prevent infinite loops
    pub fn check_iteration_limit(&mut self) -> Result<(), ParseException> {
        self.parse_iterations += 1;
        if self.parse_iterations > MAX_PARSE_ITERATIONS {
            let token = self.current();
            return Err(ParseException::syntax(
                "Maximum parse iterations exceeded (possible infinite loop)",
                token.line,
                token.column,
            ));
        }
        Ok(())
    }

    /// Parse a command line string
    pub fn parse(&mut self, input: &str) -> Result<Vec<SyntaxNode>, ParseException> {
        self.load(input, 0)?;
        let roots = self.parse_script()?;
        if roots.is_empty() {
            return Err(ParseException::new(
                ParseErrorKind::EmptyInput,
                "no command found",
                1,
                1,
            ));
        }
        Ok(roots)
    }

    /// Parse the body of `$( ... )`, backticks or `<( ... )` as a single statement
    pub(crate) fn parse_substitution(
        &mut self,
        input: &str,
        base: usize,
    ) -> Result<SyntaxNode, ParseException> {
        self.load(input, base)?;
        self.skip_newlines();
        if self.check(&[TokenType::Eof]) {
            return Err(ParseException::new(
                ParseErrorKind::NotACommand,
                "empty substitution",
                1,
                1,
            ));
        }
        let node = self.parse_list()?;
        self.skip_newlines();
        if !self.check(&[TokenType::Eof]) {
            return Err(self.unexpected_token());
        }
        Ok(node)
    }

    fn load(&mut self, input: &str, base: usize) -> Result<(), ParseException> {
        // Check input size limit
        if input.len() > MAX_INPUT_SIZE {
            return Err(ParseException::syntax(
                format!(
                    "Input too large: {} bytes exceeds limit of {}",
                    input.len(),
                    MAX_INPUT_SIZE
                ),
                1,
                1,
            ));
        }

        let tokens = Lexer::with_base(input, base).tokenize()?;

        // Check token count limit
        if tokens.len() > MAX_TOKENS {
            return Err(ParseException::syntax(
                format!(
                    "Too many tokens: {} exceeds limit of {}",
                    tokens.len(),
                    MAX_TOKENS
                ),
                1,
                1,
            ));
        }

        self.tokens = tokens;
        self.pos = 0;
        self.parse_iterations = 0;
        self.heredoc_cursor = 0;
        Ok(())
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    pub(crate) fn current(&self) -> Token {
        self.peek(0)
    }

    pub(crate) fn peek(&self, offset: usize) -> Token {
        let idx = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        match self.tokens.get(idx) {
            Some(token) => token.clone(),
            None => Token::new(TokenType::Eof, "", 0, 0, 1, 1),
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, types: &[TokenType]) -> bool {
        let current_type = self.tokens.get(self.pos).map(|t| t.token_type);
        types.iter().any(|t| current_type == Some(*t))
    }

    pub(crate) fn expect(&mut self, token_type: TokenType) -> Result<Token, ParseException> {
        if self.check(&[token_type]) {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(ParseException::syntax(
                format!(
                    "syntax error: expected `{}' before `{}'",
                    token_type.as_str(),
                    token.value
                ),
                token.line,
                token.column,
            ))
        }
    }

    pub(crate) fn unexpected_token(&self) -> ParseException {
        let token = self.current();
        let shown = match token.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::Newline => "newline".to_string(),
            _ => token.value.clone(),
        };
        ParseException::syntax(
            format!("syntax error near unexpected token `{}'", shown),
            token.line,
            token.column,
        )
    }

    pub(crate) fn token_span(token: &Token) -> Span {
        Span::new(token.start, token.end)
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&[
            TokenType::Newline,
            TokenType::Comment,
            TokenType::HeredocContent,
        ]) {
            self.advance();
        }
    }

    /// Enter one level of command nesting
    pub(crate) fn enter(&mut self) -> Result<(), ParseException> {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            let token = self.current();
            return Err(ParseException::syntax(
                "maximum nesting depth exceeded",
                token.line,
                token.column,
            ));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// True when the current token can begin a command
    pub(crate) fn is_command_start(&self) -> bool {
        let t = self.current().token_type;
        !(is_body_terminator(t)
            || matches!(
                t,
                TokenType::Eof
                    | TokenType::Newline
                    | TokenType::Comment
                    | TokenType::HeredocContent
                    | TokenType::Semicolon
                    | TokenType::Amp
                    | TokenType::AndAnd
                    | TokenType::OrOr
                    | TokenType::Pipe
                    | TokenType::PipeAmp
            ))
    }

    // ===========================================================================
    // SCRIPT AND LIST PARSING
    // ===========================================================================

    fn parse_script(&mut self) -> Result<Vec<SyntaxNode>, ParseException> {
        let mut roots = Vec::new();
        loop {
            self.check_iteration_limit()?;
            self.skip_newlines();
            if self.check(&[TokenType::Eof]) {
                break;
            }
            roots.push(self.parse_list()?);
            if !self.check(&[
                TokenType::Newline,
                TokenType::Comment,
                TokenType::HeredocContent,
                TokenType::Eof,
            ]) {
                return Err(self.unexpected_token());
            }
        }
        Ok(roots)
    }

    /// Pipelines joined by `;`, `&`, `&&` and `||`.
    ///
    /// A single pipeline without operators is returned unwrapped.
    pub(crate) fn parse_list(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = vec![self.parse_pipeline()?];

        loop {
            self.check_iteration_limit()?;
            if self.check(&[TokenType::AndAnd, TokenType::OrOr]) {
                let op = self.advance();
                parts.push(AST::operator(op.value.clone(), Self::token_span(&op)));
                self.skip_newlines();
                parts.push(self.parse_pipeline()?);
            } else if self.check(&[TokenType::Semicolon, TokenType::Amp]) {
                let op = self.advance();
                parts.push(AST::operator(op.value.clone(), Self::token_span(&op)));
                if !self.is_command_start() {
                    break;
                }
                parts.push(self.parse_pipeline()?);
            } else {
                break;
            }
        }

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(AST::list(parts))
        }
    }

    /// `[!] command (| command)*`
    ///
    /// A single command without a leading `!` is returned unwrapped.
    pub(crate) fn parse_pipeline(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = Vec::new();

        if self.check(&[TokenType::Bang, TokenType::Time]) {
            let word = self.advance();
            parts.push(AST::reserved_word(word.value.clone(), Self::token_span(&word)));
        }

        parts.push(self.parse_command()?);

        while self.check(&[TokenType::Pipe, TokenType::PipeAmp]) {
            self.check_iteration_limit()?;
            let pipe = self.advance();
            parts.push(AST::pipe(pipe.value.clone(), Self::token_span(&pipe)));
            self.skip_newlines();
            parts.push(self.parse_command()?);
        }

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(AST::pipeline(parts))
        }
    }

    /// Dispatch on the first token of a command
    pub(crate) fn parse_command(&mut self) -> Result<SyntaxNode, ParseException> {
        self.enter()?;
        let result = self.parse_command_inner();
        self.leave();
        result
    }

    fn parse_command_inner(&mut self) -> Result<SyntaxNode, ParseException> {
        let token = self.current();
        match token.token_type {
            TokenType::If => self.parse_if(),
            TokenType::For => self.parse_for(),
            TokenType::While | TokenType::Until => self.parse_loop(),
            TokenType::LParen => self.parse_subshell(),
            TokenType::LBrace => self.parse_group(),
            TokenType::Function => self.parse_function_keyword(),
            TokenType::Case
            | TokenType::Select
            | TokenType::Coproc
            | TokenType::DParenStart
            | TokenType::DBrackStart => Err(ParseException::unimplemented(
                token.token_type.as_str(),
                token.line,
                token.column,
            )),
            TokenType::Word
                if self.peek(1).token_type == TokenType::LParen
                    && self.peek(2).token_type == TokenType::RParen =>
            {
                self.parse_function_posix()
            }
            _ if self.is_command_start() => self.parse_simple_command(),
            _ => Err(self.unexpected_token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> SyntaxNode {
        let mut roots = parse(input).unwrap();
        assert_eq!(roots.len(), 1);
        roots.remove(0)
    }

    #[test]
    fn test_parse_empty() {
        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyInput);
        let err = parse("  # only a comment").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyInput);
    }

    #[test]
    fn test_parse_simple_command() {
        let node = parse_one("find . -name foo");
        assert_eq!(node.kind(), "command");
        let parts = node.parts().unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2].value(), "-name");
        assert_eq!(node.span(), Span::new(0, 16));
    }

    #[test]
    fn test_parse_pipeline() {
        let node = parse_one("cat a | grep b | wc -l");
        assert_eq!(node.kind(), "pipeline");
        let kinds: Vec<&str> = node.parts().unwrap().iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec!["command", "pipe", "command", "pipe", "command"]);
    }

    #[test]
    fn test_parse_negated_pipeline() {
        let node = parse_one("! grep x file");
        assert_eq!(node.kind(), "pipeline");
        assert_eq!(node.parts().unwrap()[0].kind(), "reservedword");
    }

    #[test]
    fn test_parse_list() {
        let node = parse_one("make && make install");
        assert_eq!(node.kind(), "list");
        let parts = node.parts().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].value(), "&&");

        let node = parse_one("ls;");
        assert_eq!(node.kind(), "list");
        assert_eq!(node.parts().unwrap().len(), 2);
    }

    #[test]
    fn test_newlines_make_separate_roots() {
        let roots = parse("ls\npwd\n").unwrap();
        assert_eq!(roots.len(), 2);
    }

    #[test]
    fn test_parse_function() {
        let node = parse_one("foo() { echo bar; }");
        assert_eq!(node.kind(), "function");
        assert_eq!(node.value(), "foo");
        let node = parse_one("function foo { echo bar; }");
        assert_eq!(node.kind(), "function");
    }

    #[test]
    fn test_parse_if_statement() {
        let node = parse_one("if true; then echo yes; else echo no; fi");
        assert_eq!(node.kind(), "if");
        let parts = node.parts().unwrap();
        assert_eq!(parts[0].value(), "if");
        assert_eq!(parts.last().unwrap().value(), "fi");
    }

    #[test]
    fn test_parse_loops() {
        assert_eq!(parse_one("for i in a b c; do echo $i; done").kind(), "for");
        assert_eq!(parse_one("while true; do echo yes; done").kind(), "while");
        assert_eq!(parse_one("until false; do echo no; done").kind(), "until");
    }

    #[test]
    fn test_parse_subshell_and_group() {
        let node = parse_one("(cd /tmp && ls)");
        assert_eq!(node.kind(), "compound");
        let node = parse_one("{ echo hello; }");
        assert_eq!(node.kind(), "compound");
        assert_eq!(node.parts().unwrap()[0].value(), "{");
    }

    #[test]
    fn test_unimplemented_constructs() {
        for input in ["case $x in a) echo a;; esac", "((x = 1 + 2))", "[[ -f x ]]", "echo $((1 + 2))"] {
            let err = parse(input).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::Unimplemented, "{}", input);
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse("ls |").unwrap_err().kind, ParseErrorKind::Syntax);
        assert_eq!(parse("if true; then fi").unwrap_err().kind, ParseErrorKind::Syntax);
        assert_eq!(parse(")").unwrap_err().kind, ParseErrorKind::Syntax);
        assert_eq!(parse("echo 'x").unwrap_err().kind, ParseErrorKind::MatchedPair);
    }

    #[test]
    fn test_nested_substitution_is_parsed() {
        let node = parse_one("echo $(dirname $(which ls))");
        let word = &node.parts().unwrap()[1];
        assert_eq!(word.kind(), "word");
        assert_eq!(word.parts().unwrap()[0].kind(), "commandsubstitution");
    }
}
