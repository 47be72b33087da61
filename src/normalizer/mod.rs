//! Command Normalizer
//!
//! Turns a shell command line into a normalized command tree: a restricted
//! grammar of head commands, flags, arguments, logic operators, pipelines and
//! substitutions. Shell syntax outside that grammar is rejected, never
//! approximated.
//!
//! The public entry points contain every failure. `Normalizer::normalize`
//! logs the reason and returns `None`; `Normalizer::try_normalize` hands the
//! error back to callers that want it.

pub mod builder;
pub mod classify;
pub mod dump;
mod engine;
pub mod errors;
pub mod preprocess;
pub mod types;

pub use classify::{GrammarProfile, Lexicon};
pub use errors::{ConfigError, NormalizeError, NormalizeFailure, StructuralError};
pub use types::{ArgumentKind, Direction, Node, NodeKind, NormalizedTree};

use crate::ast::types::SyntaxNode;
use crate::parser::{self, ParseErrorKind, ParseException};
use engine::Engine;

/// Default bound on recursion through nested substitutions and flags
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Normalizer options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Replace digit runs in arguments with the placeholder
    pub normalize_digits: bool,
    pub max_depth: usize,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            normalize_digits: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Normalizer holding its classification tables. Holds no per-call state,
/// so one instance can serve any number of calls, from any thread.
#[derive(Debug, Clone)]
pub struct Normalizer {
    lexicon: Lexicon,
    options: NormalizerOptions,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Lexicon::default(), NormalizerOptions::default())
    }
}

impl Normalizer {
    pub fn new(lexicon: Lexicon, options: NormalizerOptions) -> Self {
        Self { lexicon, options }
    }

    pub fn with_options(options: NormalizerOptions) -> Self {
        Self::new(Lexicon::default(), options)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn options(&self) -> &NormalizerOptions {
        &self.options
    }

    /// Normalize a command line, or `None` if it cannot be.
    ///
    /// The reason is logged at `warn` level.
    pub fn normalize(&self, cmd: &str) -> Option<NormalizedTree> {
        match self.try_normalize(cmd) {
            Ok(tree) => Some(tree),
            Err(NormalizeFailure::Parse(e)) => {
                log::warn!("Cannot parse: {} - {}", cmd, e.kind);
                None
            }
            Err(NormalizeFailure::Normalize(e)) => {
                log::warn!("{} - {}", e, cmd);
                None
            }
        }
    }

    /// Normalize a command line, reporting why it failed
    pub fn try_normalize(&self, cmd: &str) -> Result<NormalizedTree, NormalizeFailure> {
        let cmd = self.prepare(cmd);
        if cmd.is_empty() {
            return Err(ParseException::new(ParseErrorKind::EmptyInput, "no command found", 1, 1).into());
        }

        let roots = parser::parse(&cmd)?;
        Ok(self.normalize_roots(&cmd, &roots)?)
    }

    /// Normalize an already parsed syntax tree
    pub fn normalize_syntax(&self, node: &SyntaxNode) -> Result<NormalizedTree, NormalizeError> {
        Engine::new(&self.lexicon, &self.options).run(node)
    }

    /// Only the first root is normalized; the rest are dropped.
    fn normalize_roots(
        &self,
        cmd: &str,
        roots: &[SyntaxNode],
    ) -> Result<NormalizedTree, NormalizeFailure> {
        let first = roots.first().ok_or_else(|| {
            ParseException::new(ParseErrorKind::EmptyInput, "no command found", 1, 1)
        })?;
        if roots.len() > 1 {
            log::warn!("Doesn't support command with multiple root nodes: {}", cmd);
        }
        Ok(self.normalize_syntax(first)?)
    }

    /// Collapse newlines and apply the bare-option fix-up
    fn prepare(&self, cmd: &str) -> String {
        let cmd = cmd.replace('\n', " ");
        let cmd = cmd.trim();
        match self.lexicon.bare_option_utility() {
            Some(utility) => preprocess::add_missing_dash(cmd, utility),
            None => cmd.to_string(),
        }
    }
}

/// Normalize `cmd` with the default tables.
///
/// Returns `None` for anything outside the supported grammar.
pub fn normalize_ast(cmd: &str, normalize_digits: bool) -> Option<NormalizedTree> {
    Normalizer::with_options(NormalizerOptions {
        normalize_digits,
        ..Default::default()
    })
    .normalize(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ast() {
        let tree = normalize_ast("ls -la /tmp", true).unwrap();
        assert_eq!(tree.values(), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_bare_option_cluster() {
        let bare = normalize_ast("tar xvf archive.tar", true).unwrap();
        let dashed = normalize_ast("tar -xvf archive.tar", true).unwrap();
        assert_eq!(bare, dashed);
        assert_eq!(bare.values(), vec!["tar", "-xvf", "archive.tar"]);
    }

    #[test]
    fn test_newlines_collapsed() {
        let tree = normalize_ast("ls\n-l", true).unwrap();
        assert_eq!(tree.values(), vec!["ls", "-l"]);
    }

    #[test]
    fn test_digits_switch() {
        let on = normalize_ast("cp file1 file2", true).unwrap();
        assert_eq!(on.values(), vec!["cp", "file_NUM", "file_NUM"]);
        let off = normalize_ast("cp file1 file2", false).unwrap();
        assert_eq!(off.values(), vec!["cp", "file1", "file2"]);

        let on = normalize_ast("head -n5 log1", true).unwrap();
        assert_eq!(on.values(), vec!["head", "-n5", "log_NUM"]);
    }

    #[test]
    fn test_deterministic() {
        let cmd = "find . -name '*.rs' -and -not -path './target/*' | xargs wc -l";
        let first = normalize_ast(cmd, true).unwrap();
        let second = normalize_ast(cmd, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failures_are_contained() {
        for cmd in [
            "",
            "   ",
            "echo 'unterminated",
            "f() { ls; }",
            "ls > out.txt",
            "if true; then ls; fi",
            "for i in a b; do echo $i; done",
            "X=1 ls",
            "cat <<EOF\nhi\nEOF",
            "ls && pwd && whoami",
            "find . -not",
            "echo $((1 + 2))",
            "time ls -l",
        ] {
            assert!(normalize_ast(cmd, true).is_none(), "{}", cmd);
        }
    }

    #[test]
    fn test_try_normalize_reports_kind() {
        let normalizer = Normalizer::default();
        assert!(matches!(
            normalizer.try_normalize("echo 'x"),
            Err(NormalizeFailure::Parse(_))
        ));
        assert!(matches!(
            normalizer.try_normalize(""),
            Err(NormalizeFailure::Parse(ParseException {
                kind: ParseErrorKind::EmptyInput,
                ..
            }))
        ));
        assert!(matches!(
            normalizer.try_normalize("ls > out"),
            Err(NormalizeFailure::Normalize(NormalizeError::Unsupported { kind: "redirect" }))
        ));
    }

    #[test]
    fn test_deep_operator_chain_yields_no_result() {
        let cmd = format!("find . {}-empty", "! ".repeat(2000));
        assert!(normalize_ast(&cmd, true).is_none());
    }

    #[test]
    fn test_first_root_only() {
        let normalizer = Normalizer::default();
        let roots = parser::parse("ls -l\npwd").unwrap();
        assert_eq!(roots.len(), 2);
        let tree = normalizer.normalize_roots("ls -l\npwd", &roots).unwrap();
        assert_eq!(tree.values(), vec!["ls", "-l"]);
    }

    #[test]
    fn test_normalize_syntax() {
        let normalizer = Normalizer::default();
        let roots = parser::parse("sort -u names.txt").unwrap();
        let tree = normalizer.normalize_syntax(&roots[0]).unwrap();
        assert_eq!(tree.values(), vec!["sort", "-u", "names.txt"]);
    }

    #[test]
    fn test_custom_profile() {
        let profile = GrammarProfile::from_toml_str(
            r#"
            head_commands = ["kubectl"]
            bare_option_utility = "kubectl"
            "#,
        )
        .unwrap();
        let normalizer = Normalizer::new(
            Lexicon::from_profile(&profile).unwrap(),
            NormalizerOptions::default(),
        );
        let tree = normalizer.normalize("kubectl get pods").unwrap();
        assert_eq!(tree.values(), vec!["kubectl", "-get", "pods"]);
        assert!(normalizer.normalize("ls -l").is_none());
    }
}
