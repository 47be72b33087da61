//! Word Parser
//!
//! Scans the raw source text of a word token and extracts the expansions it
//! contains: parameters, command substitutions, process substitutions and a
//! leading tilde. Literal text and quoting produce no parts.

use crate::ast::types::{Span, SyntaxNode, AST};
use crate::parser::lexer::Token;
use crate::parser::parser_substitution::{
    find_closing_backtick, find_matching_brace, find_matching_paren, is_dollar_dparen_subshell,
    parse_substitution_body, skip_ansi_c_quoted, skip_single_quoted, unescape_backtick_body,
};
use crate::parser::types::{ParseErrorKind, ParseException};

/// Special single-character parameters: `$@`, `$?`, ...
const SPECIAL_PARAMETERS: &[char] = &['@', '*', '#', '?', '$', '!', '-'];

/// Extract the expansion parts of a word token.
///
/// `depth` is the substitution nesting level of the token itself; bodies
/// found here are parsed one level deeper.
pub fn parse_word_parts(token: &Token, depth: usize) -> Result<Vec<SyntaxNode>, ParseException> {
    let chars: Vec<char> = token.raw.chars().collect();
    let base = token.start;
    let mut parts = Vec::new();
    let mut in_double = false;
    let mut i = 0;

    let unterminated = |i: usize, what: &str| {
        ParseException::new(
            ParseErrorKind::MatchedPair,
            format!("unexpected EOF while looking for matching `{}'", what),
            token.line,
            token.column + i,
        )
    };

    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\'' if !in_double => {
                i = skip_single_quoted(&chars, i).ok_or_else(|| unterminated(i, "'"))? + 1;
            }
            '"' => {
                in_double = !in_double;
                i += 1;
            }
            '`' => {
                let close = find_closing_backtick(&chars, i).ok_or_else(|| unterminated(i, "`"))?;
                let body = unescape_backtick_body(&chars[i + 1..close]);
                let command = parse_substitution_body(&body, base + i + 1, depth + 1)?;
                parts.push(AST::command_substitution(
                    command,
                    Span::new(base + i, base + close + 1),
                ));
                i = close + 1;
            }
            '$' => match chars.get(i + 1).copied() {
                Some('\'') if !in_double => {
                    i = skip_ansi_c_quoted(&chars, i + 1).ok_or_else(|| unterminated(i, "'"))? + 1;
                }
                Some('(') => {
                    if chars.get(i + 2) == Some(&'(') && !is_dollar_dparen_subshell(&chars, i) {
                        return Err(ParseException::unimplemented(
                            "arithmetic expansion",
                            token.line,
                            token.column + i,
                        ));
                    }
                    let close = find_matching_paren(&chars, i + 1).ok_or_else(|| unterminated(i, ")"))?;
                    let body: String = chars[i + 2..close].iter().collect();
                    let command = parse_substitution_body(&body, base + i + 2, depth + 1)?;
                    parts.push(AST::command_substitution(
                        command,
                        Span::new(base + i, base + close + 1),
                    ));
                    i = close + 1;
                }
                Some('{') => {
                    let close = find_matching_brace(&chars, i + 1).ok_or_else(|| unterminated(i, "}"))?;
                    let value: String = chars[i + 2..close].iter().collect();
                    parts.push(AST::parameter(value, Span::new(base + i, base + close + 1)));
                    i = close + 1;
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    let end = (i + 1..chars.len())
                        .find(|&j| !(chars[j].is_ascii_alphanumeric() || chars[j] == '_'))
                        .unwrap_or(chars.len());
                    let value: String = chars[i + 1..end].iter().collect();
                    parts.push(AST::parameter(value, Span::new(base + i, base + end)));
                    i = end;
                }
                Some(c) if c.is_ascii_digit() || SPECIAL_PARAMETERS.contains(&c) => {
                    parts.push(AST::parameter(
                        c.to_string(),
                        Span::new(base + i, base + i + 2),
                    ));
                    i += 2;
                }
                _ => i += 1,
            },
            '<' | '>' if !in_double && chars.get(i + 1) == Some(&'(') => {
                let close = find_matching_paren(&chars, i + 1).ok_or_else(|| unterminated(i, ")"))?;
                let body: String = chars[i + 2..close].iter().collect();
                let command = parse_substitution_body(&body, base + i + 2, depth + 1)?;
                parts.push(AST::process_substitution(
                    command,
                    Span::new(base + i, base + close + 1),
                ));
                i = close + 1;
            }
            '~' if i == 0 => {
                let end = find_tilde_end(&chars);
                let value: String = chars[..end].iter().collect();
                parts.push(AST::tilde(value, Span::new(base, base + end)));
                i = end;
            }
            _ => i += 1,
        }
    }

    Ok(parts)
}

/// End of a leading `~` or `~user` prefix
fn find_tilde_end(chars: &[char]) -> usize {
    let mut end = 1;
    while end < chars.len()
        && (chars[end].is_ascii_alphanumeric() || chars[end] == '_' || chars[end] == '-')
    {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn parts_of(input: &str) -> Vec<SyntaxNode> {
        let tokens = Lexer::new(input).tokenize().unwrap();
        parse_word_parts(&tokens[0], 0).unwrap()
    }

    #[test]
    fn test_literal_word_has_no_parts() {
        assert!(parts_of("hello").is_empty());
        assert!(parts_of("'$HOME'").is_empty());
        assert!(parts_of("a\\$b").is_empty());
    }

    #[test]
    fn test_parameters() {
        let parts = parts_of("$HOME/${USER}/$1");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].kind(), "parameter");
        assert_eq!(parts[0].value(), "HOME");
        assert_eq!(parts[0].span(), Span::new(0, 5));
        assert_eq!(parts[1].value(), "USER");
        assert_eq!(parts[2].value(), "1");
    }

    #[test]
    fn test_command_substitution() {
        let parts = parts_of("$(ls -l)");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind(), "commandsubstitution");
        assert_eq!(parts[0].span(), Span::new(0, 8));
        if let SyntaxNode::CommandSubstitution(sub) = &parts[0] {
            assert_eq!(sub.command.kind(), "command");
            assert_eq!(sub.command.span(), Span::new(2, 7));
        } else {
            panic!("expected command substitution");
        }
    }

    #[test]
    fn test_backtick_inside_double_quotes() {
        let parts = parts_of("\"`date`\"");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind(), "commandsubstitution");
    }

    #[test]
    fn test_process_substitution() {
        let parts = parts_of("<(sort a)");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind(), "processsubstitution");
    }

    #[test]
    fn test_tilde() {
        let parts = parts_of("~alice/docs");
        assert_eq!(parts[0].kind(), "tilde");
        assert_eq!(parts[0].value(), "~alice");
        assert!(parts_of("'~'").is_empty());
    }

    #[test]
    fn test_arithmetic_expansion_is_unimplemented() {
        let tokens = Lexer::new("$((1+2))").tokenize().unwrap();
        let err = parse_word_parts(&tokens[0], 0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Unimplemented);
    }
}
