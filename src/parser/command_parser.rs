//! Command Parser
//!
//! Handles parsing of simple commands, words, redirections, and assignments.

use crate::ast::types::{AssignmentNode, HeredocNode, RedirectNode, Span, SyntaxNode, AST};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::{
    is_redirection_after_number, is_redirection_token, is_reserved_token, ParseException,
};
use crate::parser::word_parser;

impl Parser {
    /// Check if the current token starts a redirection
    pub(crate) fn is_redirection(&self) -> bool {
        let current = self.current();

        // Only treat a number as an fd when it is immediately adjacent to the operator
        if current.token_type == TokenType::Number {
            let next = self.peek(1);
            return current.end == next.start && is_redirection_after_number(next.token_type);
        }

        is_redirection_token(current.token_type)
    }

    /// Tokens that may be used as plain words in argument position
    pub(crate) fn is_word_token(t: TokenType) -> bool {
        matches!(
            t,
            TokenType::Word | TokenType::AssignmentWord | TokenType::Number
        ) || is_reserved_token(t)
    }

    /// Parse the current token as a word, extracting its expansions
    pub(crate) fn parse_word(&mut self) -> Result<SyntaxNode, ParseException> {
        let token = self.advance();
        let parts = word_parser::parse_word_parts(&token, self.depth)?;
        Ok(AST::word(token.value.clone(), Self::token_span(&token), parts))
    }

    pub(crate) fn parse_redirection(&mut self) -> Result<SyntaxNode, ParseException> {
        let start = self.current().start;
        let fd = if self.check(&[TokenType::Number]) {
            self.advance().value.parse::<u32>().ok()
        } else {
            None
        };
        let op = self.advance();

        if !Self::is_word_token(self.current().token_type) {
            return Err(self.unexpected_token());
        }

        if matches!(op.token_type, TokenType::DLess | TokenType::DLessDash) {
            let delimiter = self.advance();
            let content = self.take_heredoc_content();
            return Ok(SyntaxNode::Heredoc(HeredocNode {
                operator: op.value,
                delimiter: delimiter.value,
                content,
                span: Span::new(start, delimiter.end),
            }));
        }

        let target = self.parse_word()?;
        let end = target.span().end;
        Ok(SyntaxNode::Redirect(RedirectNode {
            operator: op.value,
            fd,
            target: Box::new(target),
            span: Span::new(start, end),
        }))
    }

    /// Body of the next here-document not yet claimed by an earlier `<<`
    fn take_heredoc_content(&mut self) -> String {
        let from = self.pos.max(self.heredoc_cursor);
        for i in from..self.tokens.len() {
            if self.tokens[i].token_type == TokenType::HeredocContent {
                self.heredoc_cursor = i + 1;
                return self.tokens[i].value.clone();
            }
        }
        String::new()
    }

    /// Redirections following a compound command are kept as trailing parts
    pub(crate) fn parse_trailing_redirections(
        &mut self,
        parts: &mut Vec<SyntaxNode>,
    ) -> Result<(), ParseException> {
        while self.is_redirection() {
            self.check_iteration_limit()?;
            parts.push(self.parse_redirection()?);
        }
        Ok(())
    }

    /// `(assignment | redirection)* word (word | redirection)*`
    pub(crate) fn parse_simple_command(&mut self) -> Result<SyntaxNode, ParseException> {
        let mut parts = Vec::new();
        let mut seen_word = false;

        loop {
            self.check_iteration_limit()?;

            if self.is_redirection() {
                parts.push(self.parse_redirection()?);
                continue;
            }

            let t = self.current().token_type;

            // Assignments only count before the command name
            if !seen_word && t == TokenType::AssignmentWord {
                let token = self.advance();
                parts.push(SyntaxNode::Assignment(AssignmentNode {
                    word: token.value.clone(),
                    span: Self::token_span(&token),
                }));
                continue;
            }

            // After the command name, reserved words are ordinary arguments
            if matches!(
                t,
                TokenType::Word | TokenType::AssignmentWord | TokenType::Number
            ) || (seen_word && is_reserved_token(t))
            {
                parts.push(self.parse_word()?);
                seen_word = true;
                continue;
            }

            break;
        }

        if parts.is_empty() {
            return Err(self.unexpected_token());
        }

        Ok(AST::command(parts))
    }
}
