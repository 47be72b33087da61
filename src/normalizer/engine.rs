//! Normalizer Engine
//!
//! Walks a raw syntax tree top-down and builds the normalized command tree
//! in a `TreeBuilder`. Each simple command is scanned left to right with an
//! attach-point cursor; logic operators are attached where they appear and
//! restructured into operator/operand subtrees once the scan is done.

use crate::ast::types::{CommandNode, PipelineNode, SyntaxNode, WordNode};
use crate::normalizer::builder::{NodeId, TreeBuilder, ROOT};
use crate::normalizer::classify::Lexicon;
use crate::normalizer::errors::{NormalizeError, StructuralError};
use crate::normalizer::types::{NodeKind, NormalizedTree};
use crate::normalizer::NormalizerOptions;

/// What a word becomes when it is emitted as a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    HeadCommand,
    Flag,
    Argument,
}

pub(crate) struct Engine<'a> {
    lexicon: &'a Lexicon,
    options: &'a NormalizerOptions,
    builder: TreeBuilder,
    depth: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(lexicon: &'a Lexicon, options: &'a NormalizerOptions) -> Self {
        Self {
            lexicon,
            options,
            builder: TreeBuilder::new(),
            depth: 0,
        }
    }

    /// Normalize `node` under a fresh root. No partial tree survives an error.
    pub(crate) fn run(mut self, node: &SyntaxNode) -> Result<NormalizedTree, NormalizeError> {
        self.normalize(node, ROOT, Role::Argument)?;
        Ok(self.builder.finish(self.options.max_depth)?)
    }

    fn normalize(
        &mut self,
        node: &SyntaxNode,
        current: NodeId,
        role: Role,
    ) -> Result<(), NormalizeError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(StructuralError::DepthExceeded {
                limit: self.options.max_depth,
            }
            .into());
        }
        let result = self.dispatch(node, current, role);
        self.depth -= 1;
        result
    }

    fn dispatch(
        &mut self,
        node: &SyntaxNode,
        current: NodeId,
        role: Role,
    ) -> Result<(), NormalizeError> {
        match node {
            SyntaxNode::Word(word) => self.normalize_word(word, current, role),
            SyntaxNode::Pipeline(pipeline) => self.normalize_pipeline(pipeline, current),
            SyntaxNode::List(list) => {
                if list.parts.len() > 2 {
                    return Err(NormalizeError::MultiStatement {
                        parts: list.parts.len(),
                    });
                }
                for part in &list.parts {
                    self.normalize(part, current, Role::Argument)?;
                }
                Ok(())
            }
            SyntaxNode::CommandSubstitution(sub) => {
                self.normalize(&sub.command, current, Role::Argument)
            }
            SyntaxNode::ProcessSubstitution(sub) => {
                self.normalize(&sub.command, current, Role::Argument)
            }
            SyntaxNode::Command(command) => self.normalize_command(command, current),
            SyntaxNode::Compound(compound) => {
                for part in &compound.parts {
                    self.normalize(part, current, Role::Argument)?;
                }
                Ok(())
            }
            // Structural separators
            SyntaxNode::ReservedWord(_) | SyntaxNode::Pipe(_) => Ok(()),
            SyntaxNode::Redirect(_)
            | SyntaxNode::Assignment(_)
            | SyntaxNode::Function(_)
            | SyntaxNode::Tilde(_)
            | SyntaxNode::Parameter(_)
            | SyntaxNode::If(_)
            | SyntaxNode::For(_)
            | SyntaxNode::While(_)
            | SyntaxNode::Until(_)
            | SyntaxNode::Heredoc(_)
            | SyntaxNode::Operator(_) => Err(NormalizeError::Unsupported { kind: node.kind() }),
        }
    }

    // =========================================================================
    // WORDS
    // =========================================================================

    /// A word whose first part is an expansion is compound and dispatches on that part
    fn normalize_word(
        &mut self,
        word: &WordNode,
        current: NodeId,
        role: Role,
    ) -> Result<(), NormalizeError> {
        match word.parts.first() {
            None | Some(SyntaxNode::Tilde(_)) | Some(SyntaxNode::Parameter(_)) => {
                self.emit_leaf(word, current, role);
                Ok(())
            }
            Some(SyntaxNode::ProcessSubstitution(_)) => {
                let direction = if word.word.contains('>') { ">" } else { "<" };
                let sub = self
                    .builder
                    .attach(current, NodeKind::ProcessSubstitution, direction);
                self.normalize_parts(&word.parts, sub)
            }
            Some(SyntaxNode::CommandSubstitution(_)) => {
                let sub = self
                    .builder
                    .attach(current, NodeKind::CommandSubstitution, "");
                self.normalize_parts(&word.parts, sub)
            }
            Some(_) => self.normalize_parts(&word.parts, current),
        }
    }

    fn normalize_parts(&mut self, parts: &[SyntaxNode], current: NodeId) -> Result<(), NormalizeError> {
        for part in parts {
            self.normalize(part, current, Role::Argument)?;
        }
        Ok(())
    }

    fn emit_leaf(&mut self, word: &WordNode, current: NodeId, role: Role) -> NodeId {
        let enabled = self.options.normalize_digits;
        match role {
            // Utility names keep their digits (md5sum, sha1sum)
            Role::HeadCommand => {
                self.builder
                    .attach(current, NodeKind::HeadCommand, word.word.clone())
            }
            Role::Flag => {
                let name = self.lexicon.canonicalize_digits(&word.word, enabled);
                self.builder.attach(current, NodeKind::Flag, name)
            }
            Role::Argument => {
                let kind = self.lexicon.classify_argument(&word.word);
                let value = self.lexicon.canonicalize_digits(&word.word, enabled);
                self.builder.attach_argument(current, kind, value)
            }
        }
    }

    // =========================================================================
    // PIPELINES
    // =========================================================================

    fn normalize_pipeline(
        &mut self,
        pipeline: &PipelineNode,
        current: NodeId,
    ) -> Result<(), NormalizeError> {
        if pipeline.parts.len() % 2 == 0 {
            return Err(StructuralError::MalformedPipeline {
                parts: pipeline.parts.len(),
            }
            .into());
        }

        let node = self.builder.attach(current, NodeKind::Pipeline, "");
        for (i, part) in pipeline.parts.iter().enumerate() {
            match (i % 2, part) {
                (0, SyntaxNode::Command(_)) => self.normalize(part, node, Role::Argument)?,
                (1, SyntaxNode::Pipe(_)) => {}
                _ => {
                    return Err(StructuralError::UnexpectedPipelineStage { kind: part.kind() }.into())
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // COMMAND BODY
    // =========================================================================

    fn normalize_command(
        &mut self,
        command: &CommandNode,
        current: NodeId,
    ) -> Result<(), NormalizeError> {
        let mut cursor = current;
        let mut end_of_options = false;
        let mut end_of_command = false;
        let mut unary_ops = Vec::new();
        let mut binary_ops = Vec::new();

        for part in &command.parts {
            if end_of_command {
                cursor = self.close_command_scope(cursor)?;
                end_of_command = false;
            }

            let word = match part {
                SyntaxNode::Word(word) => word,
                other => return Err(NormalizeError::Unsupported { kind: other.kind() }),
            };
            let text = word.word.as_str();

            if text == "--" {
                end_of_options = true;
            } else if text == ";" {
                // Ends a utility introduced inside an expression, e.g. find -exec
                end_of_command = true;
            } else if !end_of_options && self.lexicon.is_unary_logic_op(text) {
                cursor = self.resolve_attach_point(cursor, text)?;
                unary_ops.push(self.builder.attach(cursor, NodeKind::UnaryLogicOp, text));
            } else if !end_of_options && self.lexicon.is_binary_logic_op(text) {
                cursor = self.resolve_attach_point(cursor, text)?;
                binary_ops.push(self.builder.attach(cursor, NodeKind::BinaryLogicOp, text));
            } else if self.lexicon.is_head_command(text) && word.is_bare() {
                self.normalize(part, cursor, Role::HeadCommand)?;
                cursor = self.builder.last_child(cursor).unwrap_or(cursor);
            } else if !end_of_options && self.lexicon.is_option(text) {
                cursor = self.resolve_attach_point(cursor, text)?;
                self.normalize(part, cursor, Role::Flag)?;
                cursor = self.builder.last_child(cursor).unwrap_or(cursor);
            } else {
                self.normalize(part, cursor, Role::Argument)?;
            }
        }

        self.absorb_unary(&unary_ops)?;
        self.absorb_binary(&binary_ops)?;
        Ok(())
    }

    /// Flags never nest: a flag or operator goes next to the current flag
    fn resolve_attach_point(&self, cursor: NodeId, token: &str) -> Result<NodeId, StructuralError> {
        match self.builder.kind(cursor) {
            NodeKind::Flag => self.builder.parent(cursor).ok_or_else(|| {
                StructuralError::AmbiguousAttachment {
                    token: token.to_string(),
                    attach_point: NodeKind::Flag,
                }
            }),
            NodeKind::HeadCommand => Ok(cursor),
            other => Err(StructuralError::AmbiguousAttachment {
                token: token.to_string(),
                attach_point: other,
            }),
        }
    }

    /// Leave the utility scope a `;` just terminated.
    fn close_command_scope(&self, cursor: NodeId) -> Result<NodeId, StructuralError> {
        let mut point = cursor;

        if self.builder.kind(point) == NodeKind::Flag {
            let head = self.parent_of(point)?;
            let nested = self.builder.parent(head).map_or(false, |p| {
                matches!(
                    self.builder.kind(p),
                    NodeKind::Flag | NodeKind::HeadCommand
                )
            });
            // A flag of the outermost utility only closes the flag
            if !nested {
                return Ok(head);
            }
            point = head;
        }

        point = self.parent_of(point)?;
        if self.builder.kind(point) == NodeKind::Flag {
            point = self.parent_of(point)?;
        }

        match self.builder.kind(point) {
            NodeKind::HeadCommand => Ok(point),
            other => Err(StructuralError::CompoundCommand {
                attach_point: other,
            }),
        }
    }

    fn parent_of(&self, id: NodeId) -> Result<NodeId, StructuralError> {
        self.builder
            .parent(id)
            .ok_or(StructuralError::CompoundCommand {
                attach_point: self.builder.kind(id),
            })
    }

    // =========================================================================
    // LOGIC OPERATOR ABSORPTION
    // =========================================================================

    /// Each unary operator takes its right sibling as its only child.
    /// Right to left, so `! ! x` nests innermost first.
    fn absorb_unary(&mut self, ops: &[NodeId]) -> Result<(), StructuralError> {
        for &op in ops.iter().rev() {
            let operand = self.builder.next_sibling(op).ok_or_else(|| {
                StructuralError::MissingOperand {
                    operator: self.builder.value(op).to_string(),
                }
            })?;
            self.builder.reparent(operand, op);
        }
        Ok(())
    }

    /// Each binary operator takes its left and right siblings.
    /// Conjunctions bind first, then disjunctions, both left to right.
    fn absorb_binary(&mut self, ops: &[NodeId]) -> Result<(), StructuralError> {
        let (conjunctions, disjunctions): (Vec<NodeId>, Vec<NodeId>) = ops
            .iter()
            .copied()
            .partition(|&op| self.lexicon.is_conjunction(self.builder.value(op)));

        for op in conjunctions.into_iter().chain(disjunctions) {
            let missing = || StructuralError::MissingOperand {
                operator: self.builder.value(op).to_string(),
            };
            let left = self.builder.prev_sibling(op).ok_or_else(missing)?;
            let right = self.builder.next_sibling(op).ok_or_else(missing)?;
            self.builder.reparent(left, op);
            self.builder.reparent(right, op);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Span, AST};
    use crate::normalizer::types::{ArgumentKind, Node};
    use crate::parser::parse;

    fn run(input: &str) -> Result<NormalizedTree, NormalizeError> {
        let lexicon = Lexicon::default();
        let options = NormalizerOptions::default();
        let roots = parse(input).unwrap();
        Engine::new(&lexicon, &options).run(&roots[0])
    }

    fn head(tree: &NormalizedTree) -> &Node {
        &tree.children[0]
    }

    #[test]
    fn test_simple_command() {
        let tree = run("ls -l /tmp").unwrap();
        assert_eq!(tree.values(), vec!["ls", "-l", "/tmp"]);
        // -l takes /tmp as its argument
        let ls = head(&tree);
        assert_eq!(ls.children().len(), 1);
        let flag = ls.children()[0];
        assert_eq!(flag.kind(), NodeKind::Flag);
        if let Node::Argument(arg) = flag.children()[0] {
            assert_eq!(arg.kind, ArgumentKind::File);
        } else {
            panic!("expected argument");
        }
    }

    #[test]
    fn test_find_not_and() {
        let tree = run("find . -name x -and -not -name y").unwrap();
        let find = head(&tree);
        let children = find.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].value(), ".");

        let and = children[1];
        assert_eq!(and.kind(), NodeKind::BinaryLogicOp);
        let operands = and.children();
        assert_eq!(operands[0].value(), "-name");
        assert_eq!(operands[0].children()[0].value(), "x");
        assert_eq!(operands[1].kind(), NodeKind::UnaryLogicOp);
        assert_eq!(operands[1].value(), "-not");
        assert_eq!(operands[1].children()[0].value(), "-name");
        assert_eq!(operands[1].children()[0].children()[0].value(), "y");
    }

    #[test]
    fn test_conjunction_binds_tighter() {
        let tree = run("find . -name a -o -name b -and -type f").unwrap();
        let or = head(&tree).children()[1];
        assert_eq!(or.value(), "-o");
        assert_eq!(or.children()[0].value(), "-name");
        assert_eq!(or.children()[1].value(), "-and");
    }

    #[test]
    fn test_double_negation() {
        let tree = run("find . ! ! -empty").unwrap();
        let outer = head(&tree).children()[1];
        assert_eq!(outer.value(), "!");
        let inner = outer.children()[0];
        assert_eq!(inner.value(), "!");
        assert_eq!(inner.children()[0].value(), "-empty");
    }

    #[test]
    fn test_exec_scope_closed_by_semicolon() {
        let tree = run("find . -type f -exec rm -f {} \\; -print").unwrap();
        let find = head(&tree);
        let values: Vec<&str> = find.children().iter().map(|c| c.value()).collect();
        assert_eq!(values, vec![".", "-type", "-exec", "-print"]);

        let exec = find.children()[2];
        let rm = exec.children()[0];
        assert_eq!(rm.kind(), NodeKind::HeadCommand);
        assert_eq!(rm.value(), "rm");
        assert_eq!(rm.children()[0].value(), "-f");
    }

    #[test]
    fn test_double_dash_ends_options() {
        let tree = run("rm -f -- -file -not").unwrap();
        let rm = head(&tree);
        let flag = rm.children()[0];
        assert_eq!(flag.value(), "-f");
        let args: Vec<&str> = flag.children().iter().map(|c| c.value()).collect();
        assert_eq!(args, vec!["-file", "-not"]);
        assert!(flag
            .children()
            .iter()
            .all(|c| c.kind() == NodeKind::Argument));
    }

    #[test]
    fn test_quoted_head_command_is_an_argument() {
        let tree = run("grep 'ls' notes").unwrap();
        let grep = head(&tree);
        assert_eq!(grep.children().len(), 2);
        assert_eq!(grep.children()[0].kind(), NodeKind::Argument);
        assert_eq!(grep.children()[0].value(), "ls");
        assert!(grep
            .children()
            .iter()
            .all(|c| c.kind() == NodeKind::Argument));
    }

    #[test]
    fn test_every_double_dash_is_dropped() {
        let tree = run("rm -- a -- b").unwrap();
        assert_eq!(tree.values(), vec!["rm", "a", "b"]);
    }

    #[test]
    fn test_long_negation_chain_is_contained() {
        let input = format!("find . {}-empty", "! ".repeat(2000));
        assert!(matches!(
            run(&input).unwrap_err(),
            NormalizeError::Structural(StructuralError::DepthExceeded { limit: 128 })
        ));
    }

    #[test]
    fn test_pipeline() {
        let tree = run("cat a.txt | sort | uniq -c").unwrap();
        let pipeline = head(&tree);
        assert_eq!(pipeline.kind(), NodeKind::Pipeline);
        let stages: Vec<&str> = pipeline.children().iter().map(|c| c.value()).collect();
        assert_eq!(stages, vec!["cat", "sort", "uniq"]);
    }

    #[test]
    fn test_even_pipeline_rejected() {
        let lexicon = Lexicon::default();
        let options = NormalizerOptions::default();
        let cmd = AST::command(vec![AST::word("ls", Span::new(0, 2), vec![])]);
        let pipe = AST::pipe("|", Span::new(3, 4));
        let node = AST::pipeline(vec![cmd, pipe]);
        assert!(matches!(
            Engine::new(&lexicon, &options).run(&node),
            Err(NormalizeError::Structural(StructuralError::MalformedPipeline { parts: 2 }))
        ));
    }

    #[test]
    fn test_command_substitution() {
        let tree = run("echo $(date +%s)").unwrap();
        let echo = head(&tree);
        let sub = echo.children()[0];
        assert_eq!(sub.kind(), NodeKind::CommandSubstitution);
        assert_eq!(sub.children().len(), 1);
        assert_eq!(sub.children()[0].value(), "date");
    }

    #[test]
    fn test_process_substitution_direction() {
        let tree = run("diff <(sort a) <(sort b)").unwrap();
        let diff = head(&tree);
        assert_eq!(diff.children().len(), 2);
        assert!(diff
            .children()
            .iter()
            .all(|c| c.kind() == NodeKind::ProcessSubstitution && c.value() == "<"));

        let tree = run("tee >(wc -l)").unwrap();
        assert_eq!(head(&tree).children()[0].value(), ">");
    }

    #[test]
    fn test_parameter_word_is_a_leaf() {
        let tree = run("echo $HOME/x").unwrap();
        assert_eq!(tree.values(), vec!["echo", "$HOME/x"]);
    }

    #[test]
    fn test_digits() {
        let tree = run("cp file1 file2").unwrap();
        assert_eq!(tree.values(), vec!["cp", "file_NUM", "file_NUM"]);

        let lexicon = Lexicon::default();
        let options = NormalizerOptions {
            normalize_digits: false,
            ..Default::default()
        };
        let roots = parse("cp file1 file2").unwrap();
        let tree = Engine::new(&lexicon, &options).run(&roots[0]).unwrap();
        assert_eq!(tree.values(), vec!["cp", "file1", "file2"]);
    }

    #[test]
    fn test_options_and_heads_keep_digits() {
        let tree = run("md5sum -w2 x1").unwrap();
        assert_eq!(tree.values(), vec!["md5sum", "-w2", "x_NUM"]);
    }

    #[test]
    fn test_unsupported() {
        for (input, kind) in [
            ("ls > out", "redirect"),
            ("f() { ls; }", "function"),
            ("if true; then ls; fi", "if"),
            ("for i in a; do ls; done", "for"),
            ("X=1 ls", "assignment"),
            ("ls;", "operator"),
        ] {
            assert_eq!(
                run(input).unwrap_err(),
                NormalizeError::Unsupported { kind },
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_long_list_rejected() {
        assert_eq!(
            run("ls && pwd && id").unwrap_err(),
            NormalizeError::MultiStatement { parts: 5 }
        );
    }

    #[test]
    fn test_structural_failures() {
        assert!(matches!(
            run("find . -not").unwrap_err(),
            NormalizeError::Structural(StructuralError::MissingOperand { .. })
        ));
        assert!(matches!(
            run("-x foo").unwrap_err(),
            NormalizeError::Structural(StructuralError::AmbiguousAttachment { .. })
        ));
        assert!(matches!(
            run("ls \\; -l").unwrap_err(),
            NormalizeError::Structural(StructuralError::CompoundCommand { .. })
        ));
        assert!(matches!(
            run("sort -o out in.txt").unwrap_err(),
            NormalizeError::Structural(StructuralError::MissingOperand { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let lexicon = Lexicon::default();
        let options = NormalizerOptions {
            max_depth: 4,
            ..Default::default()
        };
        let roots = parse("echo $(echo $(echo $(echo x)))").unwrap();
        assert!(matches!(
            Engine::new(&lexicon, &options).run(&roots[0]),
            Err(NormalizeError::Structural(StructuralError::DepthExceeded { limit: 4 }))
        ));
    }

    #[test]
    fn test_token_order_preserved() {
        let tree = run("grep -r -n pattern src").unwrap();
        assert_eq!(tree.values(), vec!["grep", "-r", "-n", "pattern", "src"]);
    }
}
