//! Syntax Preprocessing
//!
//! Textual fix-up applied before parsing: some utilities (`tar` above all)
//! accept their first option cluster without a leading dash. The cluster is
//! given its dash so it normalizes like the dashed spelling.

use regex_lite::{Captures, Regex};

/// Add the missing dash to `utility`'s bare option clusters.
///
/// Only applies when `cmd` starts with `utility`.
pub fn add_missing_dash(cmd: &str, utility: &str) -> String {
    if utility.is_empty() || !cmd.starts_with(utility) {
        return cmd.to_string();
    }

    let pattern = format!(r" {} (\w)", regex_lite::escape(utility));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("cannot build preprocessing pattern for {}: {}", utility, e);
            return cmd.to_string();
        }
    };

    let padded = format!(" {}", cmd);
    let rewritten = re.replace_all(&padded, |caps: &Captures| {
        format!(" {} -{}", utility, &caps[1])
    });
    let rewritten = rewritten.trim().to_string();

    if rewritten != cmd {
        log::debug!("preprocessed `{}' into `{}'", cmd, rewritten);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_cluster_gets_dash() {
        assert_eq!(add_missing_dash("tar xvf a.tar", "tar"), "tar -xvf a.tar");
        assert_eq!(add_missing_dash("tar czf out.tgz dir", "tar"), "tar -czf out.tgz dir");
    }

    #[test]
    fn test_dashed_cluster_untouched() {
        assert_eq!(add_missing_dash("tar -xvf a.tar", "tar"), "tar -xvf a.tar");
        assert_eq!(add_missing_dash("tar 'xvf' a.tar", "tar"), "tar 'xvf' a.tar");
    }

    #[test]
    fn test_other_commands_untouched() {
        assert_eq!(add_missing_dash("ls tar xvf", "tar"), "ls tar xvf");
        assert_eq!(add_missing_dash("find . -name x", "tar"), "find . -name x");
    }

    #[test]
    fn test_pipeline_stage_also_fixed() {
        assert_eq!(
            add_missing_dash("tar cf - dir | tar xf -", "tar"),
            "tar -cf - dir | tar -xf -"
        );
    }
}
