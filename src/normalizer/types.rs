//! Normalized Command Tree Types
//!
//! The output of normalization: a restricted command grammar in which every
//! node kind carries exactly the children it may have.
//!
//! ```text
//! Command              ::= HeadCommand | Pipeline
//! Pipeline             ::= HeadCommand ('|' HeadCommand)+
//! HeadCommand          ::= name (Flag | Argument | LogicOp)*
//! Flag                 ::= name (Argument | HeadCommand)*
//! LogicOp              ::= UnaryLogicOp Expr | Expr BinaryLogicOp Expr
//! Argument             ::= Leaf | CommandSubstitution | ProcessSubstitution
//! ```

use std::fmt;

use serde::Serialize;

// =============================================================================
// KINDS AND ARITY
// =============================================================================

/// Lexical sub-type of an argument leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    File,
    Pattern,
    Number,
    SizeExpression,
    TimeExpression,
    PermissionMode,
    Username,
    Groupname,
    Unknown,
}

impl ArgumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Pattern => "pattern",
            Self::Number => "number",
            Self::SizeExpression => "sizeexpression",
            Self::TimeExpression => "timeexpression",
            Self::PermissionMode => "permissionmode",
            Self::Username => "username",
            Self::Groupname => "groupname",
            Self::Unknown => "unknown",
        }
    }
}

/// Which stream a process substitution connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// `<( ... )`, read by the enclosing command
    #[serde(rename = "<")]
    Input,
    /// `>( ... )`, written by the enclosing command
    #[serde(rename = ">")]
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "<",
            Self::Output => ">",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unconstrained,
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Pipeline,
    HeadCommand,
    UnaryLogicOp,
    BinaryLogicOp,
    Flag,
    Argument,
    CommandSubstitution,
    ProcessSubstitution,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Pipeline => "pipeline",
            Self::HeadCommand => "headcommand",
            Self::UnaryLogicOp => "unarylogicop",
            Self::BinaryLogicOp => "binarylogicop",
            Self::Flag => "flag",
            Self::Argument => "argument",
            Self::CommandSubstitution => "commandsubstitution",
            Self::ProcessSubstitution => "processsubstitution",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Argument => Arity::Fixed(0),
            Self::UnaryLogicOp | Self::CommandSubstitution | Self::ProcessSubstitution => {
                Arity::Fixed(1)
            }
            Self::BinaryLogicOp => Arity::Fixed(2),
            Self::Root | Self::Pipeline | Self::HeadCommand | Self::Flag => Arity::Unconstrained,
        }
    }

    /// Flags and logic operators, the operands of logic operators
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Flag | Self::UnaryLogicOp | Self::BinaryLogicOp)
    }

    /// Whether a node of kind `child` may appear under a node of this kind
    pub fn accepts(&self, child: NodeKind) -> bool {
        match self {
            Self::Root => matches!(child, Self::Pipeline | Self::HeadCommand),
            Self::Pipeline => child == Self::HeadCommand,
            Self::HeadCommand => matches!(
                child,
                Self::Flag
                    | Self::Argument
                    | Self::UnaryLogicOp
                    | Self::BinaryLogicOp
                    | Self::HeadCommand
                    | Self::CommandSubstitution
                    | Self::ProcessSubstitution
            ),
            Self::Flag => matches!(
                child,
                Self::Argument
                    | Self::HeadCommand
                    | Self::CommandSubstitution
                    | Self::ProcessSubstitution
            ),
            Self::UnaryLogicOp | Self::BinaryLogicOp => child.is_expression(),
            Self::CommandSubstitution | Self::ProcessSubstitution => {
                matches!(child, Self::Pipeline | Self::HeadCommand)
            }
            Self::Argument => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Pipeline(PipelineNode),
    HeadCommand(HeadCommandNode),
    Flag(FlagNode),
    UnaryLogicOp(UnaryLogicOpNode),
    BinaryLogicOp(BinaryLogicOpNode),
    Argument(ArgumentNode),
    CommandSubstitution(CommandSubstitutionNode),
    ProcessSubstitution(ProcessSubstitutionNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineNode {
    pub stages: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadCommandNode {
    pub name: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagNode {
    pub name: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnaryLogicOpNode {
    pub op: String,
    pub operand: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryLogicOpNode {
    pub op: String,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentNode {
    #[serde(rename = "type")]
    pub kind: ArgumentKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSubstitutionNode {
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSubstitutionNode {
    pub direction: Direction,
    pub body: Box<Node>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Pipeline(_) => NodeKind::Pipeline,
            Self::HeadCommand(_) => NodeKind::HeadCommand,
            Self::Flag(_) => NodeKind::Flag,
            Self::UnaryLogicOp(_) => NodeKind::UnaryLogicOp,
            Self::BinaryLogicOp(_) => NodeKind::BinaryLogicOp,
            Self::Argument(_) => NodeKind::Argument,
            Self::CommandSubstitution(_) => NodeKind::CommandSubstitution,
            Self::ProcessSubstitution(_) => NodeKind::ProcessSubstitution,
        }
    }

    /// Literal payload; empty for pipelines and command substitutions
    pub fn value(&self) -> &str {
        match self {
            Self::HeadCommand(n) => &n.name,
            Self::Flag(n) => &n.name,
            Self::UnaryLogicOp(n) => &n.op,
            Self::BinaryLogicOp(n) => &n.op,
            Self::Argument(n) => &n.value,
            Self::ProcessSubstitution(n) => n.direction.as_str(),
            Self::Pipeline(_) | Self::CommandSubstitution(_) => "",
        }
    }

    /// Children in left-to-right order
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Pipeline(n) => n.stages.iter().collect(),
            Self::HeadCommand(n) => n.children.iter().collect(),
            Self::Flag(n) => n.children.iter().collect(),
            Self::UnaryLogicOp(n) => vec![&*n.operand],
            Self::BinaryLogicOp(n) => vec![&*n.left, &*n.right],
            Self::Argument(_) => Vec::new(),
            Self::CommandSubstitution(n) => vec![&*n.body],
            Self::ProcessSubstitution(n) => vec![&*n.body],
        }
    }
}

/// A normalized command under its synthetic root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTree {
    pub children: Vec<Node>,
}

impl NormalizedTree {
    /// Node values in pre-order. Binary operators come before their operands.
    pub fn values(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a Node, out: &mut Vec<&'a str>) {
            let value = node.value();
            if !value.is_empty() {
                out.push(value);
            }
            for child in node.children() {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for child in &self.children {
            walk(child, &mut out);
        }
        out
    }
}
