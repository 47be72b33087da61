//! Substitution Scanning Helpers
//!
//! Pure character-slice analysis used by both the lexer (to keep a whole
//! substitution inside one word) and the word parser (to cut substitution
//! bodies out and hand them to a nested parser).

use crate::ast::types::SyntaxNode;
use crate::parser::parser::Parser;
use crate::parser::types::{ParseException, MAX_PARSER_DEPTH};

/// Check if $(( at position `start` in `chars` is a command substitution with a
/// nested subshell rather than arithmetic expansion.
///
/// The key heuristics are:
/// 1. If it closes with `) )` (separated by whitespace or content), it's a subshell
/// 2. If at depth 1 we see `||`, `&&`, or single `|`, it's a command context
/// 3. If it closes with `))`, it's arithmetic
///
/// `start` is the position of the `$` in `$((`.
pub fn is_dollar_dparen_subshell(chars: &[char], start: usize) -> bool {
    let len = chars.len();
    let mut pos = start + 3; // Skip past $((
    let mut depth: i32 = 2; // We've seen ((, so we start at depth 2
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    while pos < len && depth > 0 {
        let c = chars[pos];

        if in_single_quote {
            if c == '\'' {
                in_single_quote = false;
            }
            pos += 1;
            continue;
        }

        if in_double_quote {
            if c == '\\' {
                pos += 2;
                continue;
            }
            if c == '"' {
                in_double_quote = false;
            }
            pos += 1;
            continue;
        }

        match c {
            '\'' => in_single_quote = true,
            '"' => in_double_quote = true,
            '\\' => {
                pos += 2;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 1 {
                    // )) means arithmetic; anything between the parens means a subshell
                    return chars.get(pos + 1) != Some(&')');
                }
                if depth == 0 {
                    return false;
                }
            }
            '|' | '&' if depth == 1 => {
                let next = chars.get(pos + 1).copied();
                if c == '|' || next == Some('&') {
                    return true;
                }
            }
            _ => {}
        }
        pos += 1;
    }

    // Didn't find a definitive answer - default to arithmetic behavior
    false
}

/// Index of the `'` closing the single-quoted string opened at `open`
pub fn skip_single_quoted(chars: &[char], open: usize) -> Option<usize> {
    (open + 1..chars.len()).find(|&i| chars[i] == '\'')
}

/// Index of the `'` closing an ANSI-C string whose opening quote is at `open`
pub fn skip_ansi_c_quoted(chars: &[char], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\'' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `"` closing the double-quoted string opened at `open`.
/// Substitutions inside the string are skipped as units.
pub fn skip_double_quoted(chars: &[char], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Some(i),
            '`' => i = find_closing_backtick(chars, i)? + 1,
            '$' if chars.get(i + 1) == Some(&'(') => i = find_matching_paren(chars, i + 1)? + 1,
            '$' if chars.get(i + 1) == Some(&'{') => i = find_matching_brace(chars, i + 1)? + 1,
            _ => i += 1,
        }
    }
    None
}

/// Index of the backtick closing the one at `open`
pub fn find_closing_backtick(chars: &[char], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '`' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `)` matching the `(` at `open`, honoring quotes and escapes
pub fn find_matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '\'' => i = skip_single_quoted(chars, i)?,
            '"' => i = skip_double_quoted(chars, i)?,
            '`' => i = find_closing_backtick(chars, i)?,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the `}` matching the `{` at `open` in a `${...}` expansion
pub fn find_matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '\'' => i = skip_single_quoted(chars, i)?,
            '"' => i = skip_double_quoted(chars, i)?,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Strip the backslashes that quote `$`, `` ` `` and `\` inside a backtick body
pub fn unescape_backtick_body(body: &[char]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == '\\' && matches!(body.get(i + 1), Some('$' | '`' | '\\')) {
            out.push(body[i + 1]);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    out
}

/// Parse the body of a command or process substitution with a fresh parser.
///
/// `base` is the absolute offset of the body's first character, `depth` the
/// nesting level of the substitution.
pub fn parse_substitution_body(
    text: &str,
    base: usize,
    depth: usize,
) -> Result<SyntaxNode, ParseException> {
    if depth > MAX_PARSER_DEPTH {
        return Err(ParseException::syntax(
            "maximum substitution nesting depth exceeded",
            1,
            base + 1,
        ));
    }
    // A new parser so the caller's token stream is left untouched
    Parser::nested(depth).parse_substitution(text, base)
}
