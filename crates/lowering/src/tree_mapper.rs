// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tree mapper
//!
//! A bottom-up fold over a syntax tree driven by a table of translations
//! keyed by rule.
//!
//! - A node whose rule has a translation produces one result, computed from
//!   the results of its descendants.
//! - A node whose rule is transparent passes its children through; a node
//!   that is neither translated nor transparent is dropped with its subtree.
//! - Results of the nearest translated descendants are handed to the
//!   translation in document order. A translated node is only descended into
//!   when it is transparent as well; otherwise it receives an empty list.
//! - Error nodes are skipped.
//!
//! The traversal keeps its own frame stack, so deeply nested statements do
//! not grow the native stack.

use std::collections::{HashMap, HashSet};

use sqlscope_grammar::{NodeId, RuleKind, SyntaxTree};

use crate::error::LoweringResult;

/// Turns a node and its children's results into the node's result
pub type Translation<T, C> = fn(&mut C, NodeId, Vec<T>) -> LoweringResult<T>;

enum Frame<T, C> {
    /// Node still to be expanded, reporting to the aggregator at `parent`
    Queued { node: NodeId, parent: usize },
    /// Translated node waiting for its children's results
    Pending {
        node: NodeId,
        parent: usize,
        slot: usize,
        translation: Translation<T, C>,
    },
}

/// Result collectors; slot 0 belongs to the root
struct Aggregators<T> {
    slots: Vec<Vec<T>>,
}

impl<T> Aggregators<T> {
    fn open(&mut self) -> usize {
        self.slots.push(Vec::new());
        self.slots.len() - 1
    }

    fn take(&mut self, slot: usize) -> Vec<T> {
        std::mem::take(&mut self.slots[slot])
    }
}

/// Rule-keyed bottom-up transducer
pub struct TreeMapper<T, C> {
    transparent: HashSet<RuleKind>,
    translations: HashMap<RuleKind, Translation<T, C>>,
}

impl<T, C> TreeMapper<T, C> {
    pub fn new(
        transparent: impl IntoIterator<Item = RuleKind>,
        translations: impl IntoIterator<Item = (RuleKind, Translation<T, C>)>,
    ) -> Self {
        Self {
            transparent: transparent.into_iter().collect(),
            translations: translations.into_iter().collect(),
        }
    }

    pub fn is_transparent(&self, rule: RuleKind) -> bool {
        self.transparent.contains(&rule)
    }

    /// Fold the subtree at `root`
    ///
    /// Returns the last result reaching the root, or `None` when nothing in
    /// the subtree was translated.
    ///
    /// # Errors
    ///
    /// Fails with the first error a translation returns.
    pub fn translate(&self, tree: &SyntaxTree, context: &mut C, root: NodeId) -> LoweringResult<Option<T>> {
        let mut results = Aggregators { slots: vec![Vec::new()] };
        let mut stack: Vec<Frame<T, C>> = vec![Frame::Queued { node: root, parent: 0 }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Queued { node, parent } => {
                    let rule = tree.rule(node);
                    let translation = rule.and_then(|r| self.translations.get(&r).copied());
                    let aggregator = match translation {
                        Some(translation) => {
                            let slot = results.open();
                            stack.push(Frame::Pending {
                                node,
                                parent,
                                slot,
                                translation,
                            });
                            slot
                        }
                        None => parent,
                    };
                    if rule.is_some_and(|r| self.is_transparent(r)) {
                        for child in tree.children(node).rev() {
                            stack.push(Frame::Queued {
                                node: child,
                                parent: aggregator,
                            });
                        }
                    }
                }
                Frame::Pending {
                    node,
                    parent,
                    slot,
                    translation,
                } => {
                    let children = results.take(slot);
                    let result = translation(context, node, children)?;
                    results.slots[parent].push(result);
                }
            }
        }

        Ok(results.take(0).pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_grammar::SqlParser;
    use sqlscope_ir::Dialect;

    /// Renders the translated structure as a string
    struct Render {
        tree: SyntaxTree,
        calls: usize,
    }

    fn name(ctx: &mut Render, node: NodeId, _children: Vec<String>) -> LoweringResult<String> {
        ctx.calls += 1;
        Ok(ctx.tree.text(node).to_string())
    }

    fn group(ctx: &mut Render, node: NodeId, children: Vec<String>) -> LoweringResult<String> {
        ctx.calls += 1;
        Ok(format!("{}[{}]", ctx.tree.node_name(node), children.join(",")))
    }

    fn mapper() -> TreeMapper<String, Render> {
        let translations: [(RuleKind, Translation<String, Render>); 3] = [
            (RuleKind::QuerySpecification, group),
            (RuleKind::JoinedTable, group),
            (RuleKind::TableName, name),
        ];
        TreeMapper::new(
            [
                RuleKind::SqlQuery,
                RuleKind::DirectSqlDataStatement,
                RuleKind::SelectStatement,
                RuleKind::QueryExpression,
                RuleKind::NonJoinQueryTerm,
                RuleKind::QueryPrimary,
                RuleKind::NonJoinQueryPrimary,
                RuleKind::SimpleTable,
                RuleKind::QuerySpecification,
                RuleKind::TableExpression,
                RuleKind::FromClause,
                RuleKind::TableReference,
                RuleKind::JoinedTable,
                RuleKind::NonjoinedTableReference,
                RuleKind::CrossJoinTerm,
            ],
            translations,
        )
    }

    fn render(text: &str) -> (Option<String>, usize) {
        let tree = SqlParser::new(Dialect::Standard).parse(text).unwrap();
        let root = tree.root();
        let mut ctx = Render { tree, calls: 0 };
        let tree = ctx.tree.clone();
        let result = mapper().translate(&tree, &mut ctx, root).unwrap();
        (result, ctx.calls)
    }

    #[test]
    fn test_results_arrive_in_document_order() {
        let (result, calls) = render("SELECT a FROM t1 CROSS JOIN t2, t3");
        assert_eq!(result.as_deref(), Some("querySpecification[joinedTable[t1,t2],t3]"));
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_opaque_nodes_are_dropped() {
        // the select list is neither transparent nor translated
        let (result, _) = render("SELECT (SELECT x FROM hidden) FROM t");
        assert_eq!(result.as_deref(), Some("querySpecification[t]"));
    }

    #[test]
    fn test_untranslated_tree_yields_nothing() {
        let tree = SqlParser::new(Dialect::Standard).parse("DROP TABLE t").unwrap();
        let root = tree.root();
        let mut ctx = Render { tree: tree.clone(), calls: 0 };
        let result = mapper().translate(&tree, &mut ctx, root).unwrap();
        assert!(result.is_none());
        assert_eq!(ctx.calls, 0);
    }

    #[test]
    fn test_translation_errors_stop_the_fold() {
        fn fail(_: &mut Render, _: NodeId, _: Vec<String>) -> LoweringResult<String> {
            Err(crate::error::LoweringError::missing_child("tableName", "qualifiedName"))
        }
        let mapper: TreeMapper<String, Render> = TreeMapper::new(
            [RuleKind::SqlQuery, RuleKind::DirectSqlDataStatement],
            [(RuleKind::SelectStatement, fail as Translation<String, Render>)],
        );
        let tree = SqlParser::new(Dialect::Standard).parse("SELECT 1").unwrap();
        let root = tree.root();
        let mut ctx = Render { tree: tree.clone(), calls: 0 };
        assert!(mapper.translate(&tree, &mut ctx, root).is_err());
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 20;
        let text = format!("SELECT 1 FROM {}t{}", "(SELECT 1 FROM ".repeat(depth), ")".repeat(depth));
        let tree = SqlParser::new(Dialect::Standard).parse(&text).unwrap();
        let root = tree.root();
        let mut ctx = Render { tree: tree.clone(), calls: 0 };
        let mapper: TreeMapper<String, Render> = TreeMapper::new(
            RuleKind::ALL.iter().copied(),
            [(RuleKind::TableName, name as Translation<String, Render>)],
        );
        let result = mapper.translate(&tree, &mut ctx, root).unwrap();
        assert_eq!(result.as_deref(), Some("t"));
    }
}
