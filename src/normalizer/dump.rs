//! Diagnostic Dump
//!
//! Indented, kind-tagged rendering of a normalized tree for debugging.
//!
//! ```text
//! ROOT(root)
//!     HEADCOMMAND(ls)
//!         FLAG(-l)
//!             ARGUMENT:FILE(/tmp)
//! ```

use std::fmt;

use crate::normalizer::types::{Node, NodeKind, NormalizedTree};

const INDENT: &str = "    ";

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    let kind = node.kind().as_str().to_uppercase();
    match node {
        Node::Argument(arg) => writeln!(
            f,
            "{}:{}({})",
            kind,
            arg.kind.as_str().to_uppercase(),
            arg.value
        )?,
        _ => writeln!(f, "{}({})", kind, node.value())?,
    }
    for child in node.children() {
        write_node(f, child, depth + 1)?;
    }
    Ok(())
}

impl fmt::Display for NormalizedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}(root)", NodeKind::Root.as_str().to_uppercase())?;
        for child in &self.children {
            write_node(f, child, 1)?;
        }
        Ok(())
    }
}
