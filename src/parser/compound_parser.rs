//! Compound Command Parser
//!
//! Handles parsing of compound commands: if, for, while, until, subshell,
//! group, and function definitions. Compound nodes keep their reserved words
//! and bodies as an ordered list of parts, with trailing redirections last.

use crate::ast::types::{FunctionNode, Span, SyntaxNode, AST};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::ParseException;

impl Parser {
    /// Consume the current token as a reserved-word part
    fn reserved(&mut self) -> SyntaxNode {
        let token = self.advance();
        AST::reserved_word(token.value.clone(), Self::token_span(&token))
    }

    fn expect_reserved(&mut self, token_type: TokenType) -> Result<SyntaxNode, ParseException> {
        let token = self.expect(token_type)?;
        Ok(AST::reserved_word(token.value.clone(), Self::token_span(&token)))
    }

    /// Lists up to (not including) one of `terminators`; at least one is required
    pub(crate) fn parse_compound_list(
        &mut self,
        terminators: &[TokenType],
    ) -> Result<Vec<SyntaxNode>, ParseException> {
        let mut lists = Vec::new();
        loop {
            self.check_iteration_limit()?;
            self.skip_newlines();
            if self.check(terminators) || self.check(&[TokenType::Eof]) {
                break;
            }
            lists.push(self.parse_list()?);
        }
        if lists.is_empty() {
            return Err(self.unexpected_token());
        }
        Ok(lists)
    }

    pub(crate) fn parse_if(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = vec![self.reserved()];
        parts.extend(self.parse_compound_list(&[TokenType::Then])?);
        parts.push(self.expect_reserved(TokenType::Then)?);

        let body_end = [TokenType::Elif, TokenType::Else, TokenType::Fi];
        parts.extend(self.parse_compound_list(&body_end)?);

        while self.check(&[TokenType::Elif]) {
            self.check_iteration_limit()?;
            parts.push(self.reserved());
            parts.extend(self.parse_compound_list(&[TokenType::Then])?);
            parts.push(self.expect_reserved(TokenType::Then)?);
            parts.extend(self.parse_compound_list(&body_end)?);
        }

        if self.check(&[TokenType::Else]) {
            parts.push(self.reserved());
            parts.extend(self.parse_compound_list(&[TokenType::Fi])?);
        }

        parts.push(self.expect_reserved(TokenType::Fi)?);
        self.parse_trailing_redirections(&mut parts)?;
        Ok(SyntaxNode::If(AST::compound(parts)))
    }

    pub(crate) fn parse_for(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = vec![self.reserved()];

        let name = self.current();
        if name.token_type == TokenType::DParenStart {
            return Err(ParseException::unimplemented(
                "arithmetic for loop",
                name.line,
                name.column,
            ));
        }
        if !matches!(name.token_type, TokenType::Word | TokenType::AssignmentWord) {
            return Err(self.unexpected_token());
        }
        parts.push(self.parse_word()?);

        self.skip_newlines();
        if self.check(&[TokenType::In]) {
            parts.push(self.reserved());
            while !self.check(&[TokenType::Semicolon, TokenType::Newline, TokenType::Eof]) {
                self.check_iteration_limit()?;
                if !Self::is_word_token(self.current().token_type) {
                    return Err(self.unexpected_token());
                }
                parts.push(self.parse_word()?);
            }
        }

        if self.check(&[TokenType::Semicolon]) {
            let op = self.advance();
            parts.push(AST::operator(op.value.clone(), Self::token_span(&op)));
        }
        self.skip_newlines();

        parts.push(self.expect_reserved(TokenType::Do)?);
        parts.extend(self.parse_compound_list(&[TokenType::Done])?);
        parts.push(self.expect_reserved(TokenType::Done)?);
        self.parse_trailing_redirections(&mut parts)?;
        Ok(SyntaxNode::For(AST::compound(parts)))
    }

    /// `while` and `until` share one shape
    pub(crate) fn parse_loop(&mut self) -> Result<SyntaxNode, ParseException> {
        let is_until = self.check(&[TokenType::Until]);
        let mut parts = vec![self.reserved()];
        parts.extend(self.parse_compound_list(&[TokenType::Do])?);
        parts.push(self.expect_reserved(TokenType::Do)?);
        parts.extend(self.parse_compound_list(&[TokenType::Done])?);
        parts.push(self.expect_reserved(TokenType::Done)?);
        self.parse_trailing_redirections(&mut parts)?;

        let node = AST::compound(parts);
        Ok(if is_until {
            SyntaxNode::Until(node)
        } else {
            SyntaxNode::While(node)
        })
    }

    pub(crate) fn parse_subshell(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = vec![self.reserved()];
        parts.extend(self.parse_compound_list(&[TokenType::RParen])?);
        parts.push(self.expect_reserved(TokenType::RParen)?);
        self.parse_trailing_redirections(&mut parts)?;
        Ok(SyntaxNode::Compound(AST::compound(parts)))
    }

    pub(crate) fn parse_group(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = vec![self.reserved()];
        parts.extend(self.parse_compound_list(&[TokenType::RBrace])?);
        parts.push(self.expect_reserved(TokenType::RBrace)?);
        self.parse_trailing_redirections(&mut parts)?;
        Ok(SyntaxNode::Compound(AST::compound(parts)))
    }

    /// `function name [()] compound_command`
    pub(crate) fn parse_function_keyword(&mut self) -> Result<SyntaxNode, ParseException> {
        let keyword = self.advance();
        if !self.check(&[TokenType::Word]) {
            return Err(self.unexpected_token());
        }
        let name = self.advance();
        if self.check(&[TokenType::LParen]) {
            self.advance();
            self.expect(TokenType::RParen)?;
        }
        self.finish_function(keyword.start, name.value)
    }

    /// `name () compound_command`
    pub(crate) fn parse_function_posix(&mut self) -> Result<SyntaxNode, ParseException> {
        let name = self.advance();
        self.expect(TokenType::LParen)?;
        self.expect(TokenType::RParen)?;
        self.finish_function(name.start, name.value)
    }

    fn finish_function(&mut self, start: usize, name: String) -> Result<SyntaxNode, ParseException> {
        self.skip_newlines();
        let body = self.parse_command()?;
        if !matches!(
            body,
            SyntaxNode::Compound(_)
                | SyntaxNode::If(_)
                | SyntaxNode::For(_)
                | SyntaxNode::While(_)
                | SyntaxNode::Until(_)
        ) {
            let token = self.current();
            return Err(ParseException::syntax(
                format!("syntax error: function body of `{}' is not a compound command", name),
                token.line,
                token.column,
            ));
        }
        let span = Span::new(start, body.span().end);
        Ok(SyntaxNode::Function(FunctionNode {
            name,
            body: Box::new(body),
            span,
        }))
    }
}
