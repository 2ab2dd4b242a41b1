// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Value expressions
//!
//! Collects the parts of an expression the model cares about: column
//! references, variables, literals, casts and subqueries. Everything else
//! (operators, function calls, CASE) is flattened into its operands.

use std::sync::Arc;

use sqlscope_grammar::{NodeId, RuleKind, SyntaxTree, TokenKind};
use sqlscope_ir::Interval;

use crate::error::LoweringResult;
use crate::model::{ConstantKind, Filter, RowsSourceKind, RowsSourceModel, ValueExpression, ValueExpressionKind, VariableKind};
use crate::recognizer::QueryModelRecognizer;

/// Rules an expression can be collected from
const EXPRESSION_ROOTS: &[RuleKind] = &[
    RuleKind::ValueExpression,
    RuleKind::ValueExpressionAtom,
    RuleKind::SearchCondition,
    RuleKind::WhereClause,
    RuleKind::GroupByClause,
    RuleKind::HavingClause,
    RuleKind::OrderByClause,
    RuleKind::RowValueConstructor,
    RuleKind::UpdateSource,
];

/// Rules that become a model node of their own
const RECOGNIZED: &[RuleKind] = &[
    RuleKind::Subquery,
    RuleKind::ColumnReference,
    RuleKind::VariableExpression,
    RuleKind::TruthValue,
    RuleKind::UnsignedNumericLiteral,
    RuleKind::CharacterStringLiteral,
    RuleKind::DatetimeLiteral,
    RuleKind::NullSpecification,
];

enum Step {
    Visit {
        node: NodeId,
        parent: usize,
    },
    Close {
        node: NodeId,
        parent: usize,
        slot: usize,
        cast: Option<String>,
    },
}

fn flattened(tree: &SyntaxTree, node: NodeId, operands: Vec<ValueExpression>) -> ValueExpression {
    ValueExpression::new(node, tree.interval(node), ValueExpressionKind::Flattened(operands))
}

/// Follow chains of rules with a single rule child
fn descend(tree: &SyntaxTree, mut node: NodeId) -> NodeId {
    loop {
        let Some(rule) = tree.rule(node) else {
            return node;
        };
        if RECOGNIZED.contains(&rule) || cast_type(tree, node).is_some() {
            return node;
        }
        let mut rules = tree.children(node).filter(|child| tree.rule(*child).is_some());
        match (rules.next(), rules.next()) {
            (Some(child), None) => node = child,
            _ => return node,
        }
    }
}

/// Type name of `value::type`
fn cast_type(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    if !tree.is_rule(node, RuleKind::ValueExpressionPrimary) {
        return None;
    }
    let spec = tree.find_child_of_rule(node, RuleKind::ValueExpressionCastSpec)?;
    Some(
        tree.find_child_of_rule(spec, RuleKind::DataType)
            .map_or_else(|| "UNKNOWN".to_string(), |data_type| tree.text(data_type).to_string()),
    )
}

impl QueryModelRecognizer<'_> {
    /// Collect the expression rooted at `root` inside its own scope
    pub(crate) fn collect_value_expression(&mut self, root: NodeId) -> LoweringResult<ValueExpression> {
        let tree = Arc::clone(&self.tree);
        let (mut expr, scope) = self.with_scope(|r| r.collect_value_tree(&tree, root))?;
        expr.scope = Some(scope);
        Ok(expr)
    }

    /// Collect a clause expression; the filter scope is the one holding its
    /// names, widened over `node`
    pub(crate) fn collect_filter(&mut self, node: NodeId, root: NodeId) -> LoweringResult<Filter> {
        let tree = Arc::clone(&self.tree);
        let (mut expr, scope) = self.with_scope(|r| {
            r.scopes.register_node(tree.interval(node));
            r.collect_value_tree(&tree, root)
        })?;
        expr.scope = Some(scope);
        Ok(Filter { expr, scope })
    }

    fn collect_value_tree(&mut self, tree: &SyntaxTree, root: NodeId) -> LoweringResult<ValueExpression> {
        if !tree.rule(root).is_some_and(|rule| EXPRESSION_ROOTS.contains(&rule)) {
            return Ok(flattened(tree, root, Vec::new()));
        }

        let mut slots: Vec<Vec<ValueExpression>> = vec![Vec::new()];
        let mut stack = vec![Step::Visit { node: root, parent: 0 }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit { node, parent } => {
                    let node = descend(tree, node);
                    if tree.rule(node).is_some_and(|rule| RECOGNIZED.contains(&rule)) {
                        if let Some(expr) = self.collect_recognized(tree, node)? {
                            slots[parent].push(expr);
                        }
                        continue;
                    }
                    let cast = cast_type(tree, node);
                    let slot = slots.len();
                    slots.push(Vec::new());
                    stack.push(Step::Close {
                        node,
                        parent,
                        slot,
                        cast,
                    });
                    let operands: Vec<NodeId> = tree
                        .children(node)
                        .filter(|child| {
                            tree.rule(*child).is_some() && !tree.is_rule(*child, RuleKind::ValueExpressionCastSpec)
                        })
                        .collect();
                    for child in operands.into_iter().rev() {
                        stack.push(Step::Visit { node: child, parent: slot });
                    }
                }
                Step::Close {
                    node,
                    parent,
                    slot,
                    cast,
                } => {
                    let mut operands = std::mem::take(&mut slots[slot]);
                    let expr = match cast {
                        Some(type_name) => {
                            let value = if operands.len() == 1 {
                                operands.pop().unwrap_or_else(|| flattened(tree, node, Vec::new()))
                            } else {
                                flattened(tree, node, operands)
                            };
                            ValueExpression::new(
                                node,
                                tree.interval(node),
                                ValueExpressionKind::TypeCast {
                                    value: Box::new(value),
                                    type_name,
                                },
                            )
                        }
                        None if operands.is_empty() => continue,
                        None if operands.len() == 1
                            && matches!(operands[0].kind, ValueExpressionKind::Flattened(_)) =>
                        {
                            operands.remove(0)
                        }
                        None => flattened(tree, node, operands),
                    };
                    slots[parent].push(expr);
                }
            }
        }
        Ok(slots[0].pop().unwrap_or_else(|| flattened(tree, root, Vec::new())))
    }

    fn collect_recognized(&mut self, tree: &SyntaxTree, node: NodeId) -> LoweringResult<Option<ValueExpression>> {
        let constant = |kind| Some(ValueExpressionKind::Constant(kind));
        let kind = match tree.rule(node) {
            Some(RuleKind::Subquery) => Some(ValueExpressionKind::Subquery(Box::new(self.collect_subquery(node)?))),
            Some(RuleKind::ColumnReference) => self.collect_column_reference(node),
            Some(RuleKind::VariableExpression) => self.collect_variable(tree, node),
            Some(RuleKind::TruthValue) => constant(ConstantKind::Boolean),
            Some(RuleKind::UnsignedNumericLiteral) => constant(ConstantKind::Numeric),
            Some(RuleKind::CharacterStringLiteral) => constant(ConstantKind::String),
            Some(RuleKind::DatetimeLiteral) => constant(ConstantKind::Datetime),
            Some(RuleKind::NullSpecification) => constant(ConstantKind::Null),
            _ => None,
        };
        Ok(kind.map(|kind| ValueExpression::new(node, tree.interval(node), kind)))
    }

    /// A nested query, counted against the nesting limit
    pub(crate) fn collect_subquery(&mut self, node: NodeId) -> LoweringResult<RowsSourceModel> {
        self.ctx.enter_subquery()?;
        let result = self.collect_query_expression(node);
        self.ctx.exit_subquery();
        Ok(result?.unwrap_or_else(|| {
            let interval = Interval::empty_at(self.tree.interval(node).end);
            RowsSourceModel::new(node, interval, RowsSourceKind::Empty)
        }))
    }

    fn collect_variable(&mut self, tree: &SyntaxTree, node: NodeId) -> Option<ValueExpressionKind> {
        let first = tree.first_child(node)?;
        let raw = tree.text(first);
        let (kind, name_node, name) = match (tree.token_kind(first), tree.rule(first)) {
            (Some(TokenKind::BatchVariable), _) => (VariableKind::BatchVariable, first, raw.trim_start_matches('@')),
            (Some(TokenKind::ClientVariable), _) => {
                let name = raw
                    .strip_prefix("${")
                    .and_then(|inner| inner.strip_suffix('}'))
                    .unwrap_or(raw);
                (VariableKind::ClientVariable, first, name)
            }
            (_, Some(RuleKind::NamedParameter)) => {
                let identifier = tree.find_child_of_rule(first, RuleKind::Identifier)?;
                (VariableKind::ClientParameter, first, tree.text(identifier))
            }
            (_, Some(RuleKind::AnonymousParameter)) => (VariableKind::AnonymousParameter, first, "?"),
            _ => return None,
        };
        let entry = self.register_variable(name_node, name, raw);
        Some(ValueExpressionKind::Variable { kind, entry })
    }
}
