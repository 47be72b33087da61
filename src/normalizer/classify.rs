//! Lexical Classification
//!
//! Grammar profile (the swappable classification tables) and its compiled
//! form, the `Lexicon`, which answers the token-level questions the
//! normalizer asks: is this an option, a head command, a logic operator,
//! which kind of argument is it, and what does it look like with its digit
//! runs canonicalized.

use std::collections::HashSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex_lite::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::normalizer::errors::ConfigError;
use crate::normalizer::types::ArgumentKind;

pub const DEFAULT_DIGIT_PATTERN: &str = "[0-9]+";
pub const DEFAULT_DIGIT_PLACEHOLDER: &str = "_NUM";

/// Utilities recognized as head commands out of the box
const DEFAULT_HEAD_COMMANDS: &[&str] = &[
    "alias", "apropos", "apt-get", "awk", "base64", "basename", "bash", "bc", "bunzip2",
    "bzip2", "cal", "cat", "cd", "chgrp", "chmod", "chown", "chroot", "cksum", "clear",
    "column", "comm", "cp", "cpio", "crontab", "curl", "cut", "date", "dd", "df", "diff",
    "dig", "dirname", "disown", "du", "echo", "egrep", "env", "expand", "expr", "fgrep",
    "file", "find", "fold", "free", "fuser", "gawk", "git", "grep", "groups", "gunzip",
    "gzip", "head", "history", "host", "hostname", "id", "ifconfig", "join", "kill",
    "killall", "less", "ln", "locate", "ls", "lsof", "md5", "md5sum", "mkdir", "mkfifo",
    "more", "mount", "mv", "nice", "nl", "nohup", "nslookup", "od", "paste", "pgrep",
    "ping", "pkill", "popd", "printf", "ps", "pushd", "pwd", "readlink", "rename", "rev",
    "rm", "rmdir", "rsync", "scp", "sed", "seq", "sh", "sha1sum", "sha256sum", "shred",
    "shuf", "sleep", "sort", "source", "split", "ssh", "stat", "strings", "su", "sudo",
    "sum", "sync", "tac", "tail", "tar", "tee", "top", "touch", "tr", "tree",
    "true", "false", "tty", "uname", "uniq", "unzip", "uptime", "watch", "wc", "wget",
    "which", "who", "whoami", "xargs", "xz", "yes", "zcat", "zip",
];

const DEFAULT_UNARY_LOGIC_OPERATORS: &[&str] = &["!", "-not"];
const DEFAULT_CONJUNCTION_OPERATORS: &[&str] = &["-and", "&&"];
const DEFAULT_DISJUNCTION_OPERATORS: &[&str] = &["-or", "-o", "||"];

lazy_static! {
    static ref DEFAULT_DIGIT_RE: Regex = Regex::new(DEFAULT_DIGIT_PATTERN).unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref SIZE_RE: Regex = Regex::new(r"^[+-]?[0-9]+[kKMGTPEcb]$").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"^[+-]?[0-9]+[smhdw]$").unwrap();
    static ref PERMISSION_RE: Regex =
        Regex::new(r"^[ugoa]*[-+=][rwxXstugo]*(,[ugoa]*[-+=][rwxXstugo]*)*$").unwrap();
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Classification tables, loadable from TOML. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarProfile {
    pub head_commands: Vec<String>,
    pub unary_logic_operators: Vec<String>,
    pub conjunction_operators: Vec<String>,
    pub disjunction_operators: Vec<String>,
    pub option_prefixes: Vec<String>,
    pub digit_pattern: String,
    pub digit_placeholder: String,
    /// Utility whose first option cluster may omit the leading dash
    pub bare_option_utility: Option<String>,
}

impl Default for GrammarProfile {
    fn default() -> Self {
        Self {
            head_commands: owned(DEFAULT_HEAD_COMMANDS),
            unary_logic_operators: owned(DEFAULT_UNARY_LOGIC_OPERATORS),
            conjunction_operators: owned(DEFAULT_CONJUNCTION_OPERATORS),
            disjunction_operators: owned(DEFAULT_DISJUNCTION_OPERATORS),
            option_prefixes: vec!["-".to_string()],
            digit_pattern: DEFAULT_DIGIT_PATTERN.to_string(),
            digit_placeholder: DEFAULT_DIGIT_PLACEHOLDER.to_string(),
            bare_option_utility: Some("tar".to_string()),
        }
    }
}

impl GrammarProfile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Compiled grammar profile
#[derive(Debug, Clone)]
pub struct Lexicon {
    head_commands: HashSet<String>,
    unary_ops: HashSet<String>,
    conjunctions: HashSet<String>,
    disjunctions: HashSet<String>,
    option_prefixes: Vec<String>,
    digit_re: Regex,
    digit_placeholder: String,
    bare_option_utility: Option<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::compile(&GrammarProfile::default(), DEFAULT_DIGIT_RE.clone())
    }
}

impl Lexicon {
    pub fn from_profile(profile: &GrammarProfile) -> Result<Self, ConfigError> {
        let digit_re =
            Regex::new(&profile.digit_pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: profile.digit_pattern.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::compile(profile, digit_re))
    }

    fn compile(profile: &GrammarProfile, digit_re: Regex) -> Self {
        let set = |words: &[String]| words.iter().cloned().collect::<HashSet<_>>();
        Self {
            head_commands: set(&profile.head_commands),
            unary_ops: set(&profile.unary_logic_operators),
            conjunctions: set(&profile.conjunction_operators),
            disjunctions: set(&profile.disjunction_operators),
            option_prefixes: profile
                .option_prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
            digit_re,
            digit_placeholder: profile.digit_placeholder.clone(),
            bare_option_utility: profile.bare_option_utility.clone(),
        }
    }

    /// Starts with an option prefix and has something after it
    pub fn is_option(&self, word: &str) -> bool {
        self.option_prefixes
            .iter()
            .any(|p| word.starts_with(p.as_str()) && word.len() > p.len())
    }

    pub fn is_head_command(&self, word: &str) -> bool {
        self.head_commands.contains(word)
    }

    pub fn is_unary_logic_op(&self, word: &str) -> bool {
        self.unary_ops.contains(word)
    }

    pub fn is_binary_logic_op(&self, word: &str) -> bool {
        self.is_conjunction(word) || self.disjunctions.contains(word)
    }

    pub fn is_conjunction(&self, word: &str) -> bool {
        self.conjunctions.contains(word)
    }

    pub fn bare_option_utility(&self) -> Option<&str> {
        self.bare_option_utility.as_deref()
    }

    /// Replace digit runs with the placeholder. Options are left alone.
    pub fn canonicalize_digits(&self, word: &str, enabled: bool) -> String {
        if !enabled || self.is_option(word) {
            return word.to_string();
        }
        self.digit_re
            .replace_all(word, NoExpand(&self.digit_placeholder))
            .into_owned()
    }

    /// Lexical sub-type of a generic argument, judged on the raw word.
    ///
    /// Usernames and group names look like any other word and are never inferred.
    pub fn classify_argument(&self, word: &str) -> ArgumentKind {
        if NUMBER_RE.is_match(word) {
            ArgumentKind::Number
        } else if SIZE_RE.is_match(word) {
            ArgumentKind::SizeExpression
        } else if TIME_RE.is_match(word) {
            ArgumentKind::TimeExpression
        } else if word.len() > 1 && PERMISSION_RE.is_match(word) {
            ArgumentKind::PermissionMode
        } else if has_glob(word) {
            ArgumentKind::Pattern
        } else if word.contains('/') || word.contains('.') || word.starts_with('~') {
            ArgumentKind::File
        } else {
            ArgumentKind::Unknown
        }
    }
}

/// Unescaped `*`, `?` or `[`
fn has_glob(word: &str) -> bool {
    let mut escaped = false;
    for c in word.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_option() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_option("-name"));
        assert!(lexicon.is_option("--help"));
        assert!(lexicon.is_option("-5"));
        assert!(!lexicon.is_option("-"));
        assert!(!lexicon.is_option("file"));
    }

    #[test]
    fn test_logic_operators() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_unary_logic_op("!"));
        assert!(lexicon.is_unary_logic_op("-not"));
        assert!(lexicon.is_binary_logic_op("-and"));
        assert!(lexicon.is_binary_logic_op("-o"));
        assert!(lexicon.is_conjunction("-and"));
        assert!(!lexicon.is_conjunction("-or"));
        assert!(!lexicon.is_binary_logic_op("-name"));
    }

    #[test]
    fn test_reserved_words_are_not_head_commands() {
        let lexicon = Lexicon::default();
        assert!(!lexicon.is_head_command("time"));
        assert!(lexicon.is_head_command("sudo"));
    }

    #[test]
    fn test_canonicalize_digits() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.canonicalize_digits("file1", true), "file_NUM");
        assert_eq!(lexicon.canonicalize_digits("a10b2", true), "a_NUMb_NUM");
        assert_eq!(lexicon.canonicalize_digits("file1", false), "file1");
        assert_eq!(lexicon.canonicalize_digits("-l2", true), "-l2");
    }

    #[test]
    fn test_classify_argument() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.classify_argument("42"), ArgumentKind::Number);
        assert_eq!(lexicon.classify_argument("+7"), ArgumentKind::Number);
        assert_eq!(lexicon.classify_argument("+10M"), ArgumentKind::SizeExpression);
        assert_eq!(lexicon.classify_argument("100k"), ArgumentKind::SizeExpression);
        assert_eq!(lexicon.classify_argument("3d"), ArgumentKind::TimeExpression);
        assert_eq!(lexicon.classify_argument("u+x"), ArgumentKind::PermissionMode);
        assert_eq!(lexicon.classify_argument("go-w,a=r"), ArgumentKind::PermissionMode);
        assert_eq!(lexicon.classify_argument("*.txt"), ArgumentKind::Pattern);
        assert_eq!(lexicon.classify_argument("\\*.txt"), ArgumentKind::File);
        assert_eq!(lexicon.classify_argument("/tmp"), ArgumentKind::File);
        assert_eq!(lexicon.classify_argument("~"), ArgumentKind::File);
        assert_eq!(lexicon.classify_argument("root"), ArgumentKind::Unknown);
    }

    #[test]
    fn test_profile_from_toml() {
        let profile = GrammarProfile::from_toml_str(
            r#"
            head_commands = ["mytool"]
            digit_placeholder = "<N>"
            "#,
        )
        .unwrap();
        assert_eq!(profile.head_commands, vec!["mytool".to_string()]);
        assert_eq!(profile.unary_logic_operators, vec!["!", "-not"]);
        assert_eq!(profile.bare_option_utility.as_deref(), Some("tar"));

        let lexicon = Lexicon::from_profile(&profile).unwrap();
        assert!(lexicon.is_head_command("mytool"));
        assert!(!lexicon.is_head_command("find"));
        assert_eq!(lexicon.canonicalize_digits("f1", true), "f<N>");
    }

    #[test]
    fn test_invalid_digit_pattern() {
        let profile = GrammarProfile {
            digit_pattern: "[0-9".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Lexicon::from_profile(&profile),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
