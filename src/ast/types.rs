//! Raw Syntax Tree Types
//!
//! This module defines the tree the shell parser hands to the normalizer.
//! Every node carries a kind tag, a source span and, for containers, an
//! ordered list of parts. Words keep their unquoted text plus the expansion
//! parts found inside them; plain literal text never becomes a part.

use std::fmt;

// =============================================================================
// BASE TYPES
// =============================================================================

/// Character offsets into the parsed text, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of source characters covered by the span
    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// =============================================================================
// NODE UNION
// =============================================================================

/// Union of all raw node kinds produced by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    Word(WordNode),
    Assignment(AssignmentNode),
    Parameter(ParameterNode),
    Tilde(TildeNode),
    CommandSubstitution(CommandSubstitutionNode),
    ProcessSubstitution(ProcessSubstitutionNode),
    Command(CommandNode),
    Pipeline(PipelineNode),
    Pipe(PipeNode),
    List(ListNode),
    Operator(OperatorNode),
    ReservedWord(ReservedWordNode),
    Redirect(RedirectNode),
    Heredoc(HeredocNode),
    /// Subshell `( ... )` or group `{ ...; }`
    Compound(CompoundNode),
    If(CompoundNode),
    For(CompoundNode),
    While(CompoundNode),
    Until(CompoundNode),
    Function(FunctionNode),
}

impl SyntaxNode {
    /// Kind tag used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Word(_) => "word",
            Self::Assignment(_) => "assignment",
            Self::Parameter(_) => "parameter",
            Self::Tilde(_) => "tilde",
            Self::CommandSubstitution(_) => "commandsubstitution",
            Self::ProcessSubstitution(_) => "processsubstitution",
            Self::Command(_) => "command",
            Self::Pipeline(_) => "pipeline",
            Self::Pipe(_) => "pipe",
            Self::List(_) => "list",
            Self::Operator(_) => "operator",
            Self::ReservedWord(_) => "reservedword",
            Self::Redirect(_) => "redirect",
            Self::Heredoc(_) => "heredoc",
            Self::Compound(_) => "compound",
            Self::If(_) => "if",
            Self::For(_) => "for",
            Self::While(_) => "while",
            Self::Until(_) => "until",
            Self::Function(_) => "function",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Word(n) => n.span,
            Self::Assignment(n) => n.span,
            Self::Parameter(n) => n.span,
            Self::Tilde(n) => n.span,
            Self::CommandSubstitution(n) => n.span,
            Self::ProcessSubstitution(n) => n.span,
            Self::Command(n) => n.span,
            Self::Pipeline(n) => n.span,
            Self::Pipe(n) => n.span,
            Self::List(n) => n.span,
            Self::Operator(n) => n.span,
            Self::ReservedWord(n) => n.span,
            Self::Redirect(n) => n.span,
            Self::Heredoc(n) => n.span,
            Self::Compound(n) | Self::If(n) | Self::For(n) | Self::While(n) | Self::Until(n) => {
                n.span
            }
            Self::Function(n) => n.span,
        }
    }

    /// Ordered sub-parts for container kinds, `None` for leaves
    pub fn parts(&self) -> Option<&[SyntaxNode]> {
        match self {
            Self::Word(n) => Some(&n.parts),
            Self::Command(n) => Some(&n.parts),
            Self::Pipeline(n) => Some(&n.parts),
            Self::List(n) => Some(&n.parts),
            Self::Compound(n) | Self::If(n) | Self::For(n) | Self::While(n) | Self::Until(n) => {
                Some(&n.parts)
            }
            _ => None,
        }
    }

    /// Literal payload: word text, operator text, parameter name, ...
    pub fn value(&self) -> &str {
        match self {
            Self::Word(n) => &n.word,
            Self::Assignment(n) => &n.word,
            Self::Parameter(n) => &n.value,
            Self::Tilde(n) => &n.value,
            Self::Pipe(n) => &n.pipe,
            Self::Operator(n) => &n.op,
            Self::ReservedWord(n) => &n.word,
            Self::Redirect(n) => &n.operator,
            Self::Heredoc(n) => &n.delimiter,
            Self::Function(n) => &n.name,
            _ => "",
        }
    }
}

// =============================================================================
// WORDS AND EXPANSIONS
// =============================================================================

/// A shell word: unquoted text plus the expansions found inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNode {
    /// Text with quotes removed and escapes resolved; expansions stay textual
    pub word: String,
    pub span: Span,
    /// Expansion parts in source order
    pub parts: Vec<SyntaxNode>,
}

impl WordNode {
    /// True when no quoting or escaping was removed from the source text.
    pub fn is_bare(&self) -> bool {
        self.word.chars().count() == self.span.width()
    }
}

/// `NAME=value` in command prefix position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentNode {
    pub word: String,
    pub span: Span,
}

/// `$name`, `${...}`, `$1`, `$@`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNode {
    pub value: String,
    pub span: Span,
}

/// `~` or `~user` at the start of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TildeNode {
    pub value: String,
    pub span: Span,
}

/// `$( ... )` or backticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSubstitutionNode {
    pub command: Box<SyntaxNode>,
    pub span: Span,
}

/// `<( ... )` or `>( ... )`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSubstitutionNode {
    pub command: Box<SyntaxNode>,
    pub span: Span,
}

// =============================================================================
// COMMANDS, PIPELINES, LISTS
// =============================================================================

/// Simple command: words, assignments and redirections in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    pub parts: Vec<SyntaxNode>,
    pub span: Span,
}

/// `cmd1 | cmd2 | cmd3`, parts alternate command and pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineNode {
    pub parts: Vec<SyntaxNode>,
    pub span: Span,
}

/// `|` or `|&`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeNode {
    pub pipe: String,
    pub span: Span,
}

/// Statements joined by control operators, parts alternate statement and operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    pub parts: Vec<SyntaxNode>,
    pub span: Span,
}

/// `;`, `&`, `&&`, `||`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorNode {
    pub op: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedWordNode {
    pub word: String,
    pub span: Span,
}

// =============================================================================
// REDIRECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectNode {
    pub operator: String,
    /// Explicit file descriptor (`2>`)
    pub fd: Option<u32>,
    pub target: Box<SyntaxNode>,
    pub span: Span,
}

/// `<<DELIM` / `<<-DELIM` with the body read after the next newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeredocNode {
    pub operator: String,
    pub delimiter: String,
    pub content: String,
    pub span: Span,
}

// =============================================================================
// COMPOUND COMMANDS
// =============================================================================

/// Parts of a compound command: reserved words, bodies, trailing redirections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundNode {
    pub parts: Vec<SyntaxNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub name: String,
    pub body: Box<SyntaxNode>,
    pub span: Span,
}

// =============================================================================
// AST FACTORY
// =============================================================================

/// Helper constructors used by the parser
pub struct AST;

impl AST {
    pub fn word(word: impl Into<String>, span: Span, parts: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::Word(WordNode {
            word: word.into(),
            span,
            parts,
        })
    }

    pub fn reserved_word(word: impl Into<String>, span: Span) -> SyntaxNode {
        SyntaxNode::ReservedWord(ReservedWordNode {
            word: word.into(),
            span,
        })
    }

    pub fn operator(op: impl Into<String>, span: Span) -> SyntaxNode {
        SyntaxNode::Operator(OperatorNode { op: op.into(), span })
    }

    pub fn pipe(pipe: impl Into<String>, span: Span) -> SyntaxNode {
        SyntaxNode::Pipe(PipeNode {
            pipe: pipe.into(),
            span,
        })
    }

    pub fn parameter(value: impl Into<String>, span: Span) -> SyntaxNode {
        SyntaxNode::Parameter(ParameterNode {
            value: value.into(),
            span,
        })
    }

    pub fn tilde(value: impl Into<String>, span: Span) -> SyntaxNode {
        SyntaxNode::Tilde(TildeNode {
            value: value.into(),
            span,
        })
    }

    pub fn command_substitution(command: SyntaxNode, span: Span) -> SyntaxNode {
        SyntaxNode::CommandSubstitution(CommandSubstitutionNode {
            command: Box::new(command),
            span,
        })
    }

    pub fn process_substitution(command: SyntaxNode, span: Span) -> SyntaxNode {
        SyntaxNode::ProcessSubstitution(ProcessSubstitutionNode {
            command: Box::new(command),
            span,
        })
    }

    pub fn command(parts: Vec<SyntaxNode>) -> SyntaxNode {
        let span = span_of(&parts);
        SyntaxNode::Command(CommandNode { parts, span })
    }

    pub fn pipeline(parts: Vec<SyntaxNode>) -> SyntaxNode {
        let span = span_of(&parts);
        SyntaxNode::Pipeline(PipelineNode { parts, span })
    }

    pub fn list(parts: Vec<SyntaxNode>) -> SyntaxNode {
        let span = span_of(&parts);
        SyntaxNode::List(ListNode { parts, span })
    }

    pub fn compound(parts: Vec<SyntaxNode>) -> CompoundNode {
        let span = span_of(&parts);
        CompoundNode { parts, span }
    }
}

/// Span covering every part, empty at 0 when there are none
fn span_of(parts: &[SyntaxNode]) -> Span {
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) => first.span().cover(last.span()),
        _ => Span::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_is_bare() {
        let bare = WordNode {
            word: "ls".to_string(),
            span: Span::new(0, 2),
            parts: vec![],
        };
        assert!(bare.is_bare());

        let quoted = WordNode {
            word: "ls".to_string(),
            span: Span::new(0, 4),
            parts: vec![],
        };
        assert!(!quoted.is_bare());
    }

    #[test]
    fn test_command_span_covers_parts() {
        let cmd = AST::command(vec![
            AST::word("ls", Span::new(0, 2), vec![]),
            AST::word("-l", Span::new(3, 5), vec![]),
        ]);
        assert_eq!(cmd.span(), Span::new(0, 5));
        assert_eq!(cmd.kind(), "command");
        assert_eq!(cmd.parts().map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_leaf_has_no_parts() {
        let op = AST::operator(";", Span::new(2, 3));
        assert!(op.parts().is_none());
        assert_eq!(op.value(), ";");
    }
}
