//! Normalizer Errors
//!
//! Every failure the normalizer can report. At the public entry point all of
//! them collapse into "no result"; the variant only survives in diagnostics.

use thiserror::Error;

use crate::normalizer::types::NodeKind;
use crate::parser::ParseException;

/// An internal tree-shape invariant was violated while building
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("cannot attach `{token}' under a {attach_point} node")]
    AmbiguousAttachment { token: String, attach_point: NodeKind },

    #[error("pipeline has an even number of parts ({parts})")]
    MalformedPipeline { parts: usize },

    #[error("unexpected {kind} in pipeline")]
    UnexpectedPipelineStage { kind: &'static str },

    #[error("compound command: `;' closed a scope into a {attach_point} node")]
    CompoundCommand { attach_point: NodeKind },

    #[error("logic operator `{operator}' is missing an operand")]
    MissingOperand { operator: String },

    #[error("{kind} node expects {expected} children, found {found}")]
    ArityViolation {
        kind: NodeKind,
        expected: usize,
        found: usize,
    },

    #[error("{child} node is not allowed under a {parent} node")]
    IllegalChild { parent: NodeKind, child: NodeKind },

    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Shell syntax that is recognized but outside the command grammar
    #[error("Unsupported: {kind}")]
    Unsupported { kind: &'static str },

    #[error("Unsupported: list of {parts} parts")]
    MultiStatement { parts: usize },

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Anything that stops a command line from being normalized
#[derive(Debug, Clone, Error)]
pub enum NormalizeFailure {
    #[error(transparent)]
    Parse(#[from] ParseException),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl From<StructuralError> for NormalizeFailure {
    fn from(e: StructuralError) -> Self {
        NormalizeFailure::Normalize(NormalizeError::Structural(e))
    }
}

/// Grammar profile could not be loaded or compiled
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern `{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid grammar profile: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = NormalizeError::Unsupported { kind: "redirect" };
        assert_eq!(e.to_string(), "Unsupported: redirect");

        let e = NormalizeError::from(StructuralError::MissingOperand {
            operator: "-not".to_string(),
        });
        assert_eq!(e.to_string(), "logic operator `-not' is missing an operand");

        let e = StructuralError::IllegalChild {
            parent: NodeKind::Pipeline,
            child: NodeKind::Flag,
        };
        assert_eq!(e.to_string(), "flag node is not allowed under a pipeline node");
    }
}
