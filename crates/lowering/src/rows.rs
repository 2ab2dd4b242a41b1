// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Row sources
//!
//! Translations of the query rules into [`RowsSourceModel`] nodes, folded
//! bottom-up by the [`TreeMapper`].

use std::sync::Arc;

use sqlscope_grammar::{NodeId, RuleKind, SyntaxTree, TokenKind};
use sqlscope_ir::Interval;
use sqlscope_semantic::LexicalScope;

use crate::error::{LoweringError, LoweringResult};
use crate::model::{
    CteSubquery, Filter, Filters, ProjectionModel, RowsSourceKind, RowsSourceModel, SelectItem, SetOperationKind,
    ValueExpressionKind,
};
use crate::recognizer::QueryModelRecognizer;
use crate::tree_mapper::{Translation, TreeMapper};

type RowsTranslation<'c> = Translation<RowsSourceModel, QueryModelRecognizer<'c>>;

/// Rules whose children can hold row sources
const TRANSPARENT: &[RuleKind] = &[
    RuleKind::SqlQuery,
    RuleKind::DirectSqlDataStatement,
    RuleKind::SelectStatement,
    RuleKind::WithClause,
    RuleKind::CteList,
    RuleKind::WithListElement,
    RuleKind::Subquery,
    RuleKind::QueryExpression,
    RuleKind::UnionTerm,
    RuleKind::ExceptTerm,
    RuleKind::NonJoinQueryTerm,
    RuleKind::IntersectTerm,
    RuleKind::QueryPrimary,
    RuleKind::NonJoinQueryPrimary,
    RuleKind::SimpleTable,
    RuleKind::QuerySpecification,
    RuleKind::TableExpression,
    RuleKind::FromClause,
    RuleKind::TableReference,
    RuleKind::JoinedTable,
    RuleKind::NonjoinedTableReference,
    RuleKind::DerivedTable,
    RuleKind::TableSubquery,
    RuleKind::CrossJoinTerm,
    RuleKind::NaturalJoinTerm,
];

fn rows_mapper<'c>() -> TreeMapper<RowsSourceModel, QueryModelRecognizer<'c>> {
    let translations: [(RuleKind, RowsTranslation<'c>); 9] = [
        (RuleKind::DirectSqlDataStatement, direct_statement),
        (RuleKind::QueryExpression, set_operations),
        (RuleKind::NonJoinQueryTerm, set_operations),
        (RuleKind::QuerySpecification, query_specification),
        (RuleKind::FromClause, from_clause),
        (RuleKind::JoinedTable, joined_table),
        (RuleKind::NonjoinedTableReference, nonjoined_table_reference),
        (RuleKind::ExplicitTable, explicit_table),
        (RuleKind::TableValueConstructor, table_value_constructor),
    ];
    TreeMapper::new(TRANSPARENT.iter().copied(), translations)
}

fn empty_after(tree: &SyntaxTree, node: NodeId) -> RowsSourceModel {
    RowsSourceModel::new(node, Interval::empty_at(tree.interval(node).end), RowsSourceKind::Empty)
}

/// `[WITH ...] query`
fn direct_statement(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let Some(with_clause) = tree.find_child_of_rule(node, RuleKind::WithClause) else {
        return children
            .into_iter()
            .last()
            .ok_or_else(|| LoweringError::missing_child("directSqlDataStatement", "queryExpression"));
    };

    let recursive = tree.find_child_of_token(with_clause, TokenKind::Recursive).is_some();
    let elements = tree.expand_subtree(
        with_clause,
        Some(&[RuleKind::WithClause, RuleKind::CteList]),
        &[RuleKind::WithListElement],
    );
    let mut results = children.into_iter();
    let mut subqueries = Vec::with_capacity(elements.len());
    for element in elements {
        let has_query = tree
            .find_child_of_rule(element, RuleKind::Subquery)
            .and_then(|subquery| tree.find_child_of_rule(subquery, RuleKind::QueryExpression))
            .is_some();
        let source = has_query
            .then(|| results.next())
            .flatten()
            .unwrap_or_else(|| empty_after(&tree, element));
        let name = tree
            .find_child_of_rule(element, RuleKind::QueryName)
            .and_then(|name| r.collect_identifier(name));
        let columns = r.collect_column_name_list(element);
        subqueries.push(CteSubquery {
            node: element,
            name,
            columns,
            source,
        });
    }
    let result = results.next().unwrap_or_else(|| empty_after(&tree, with_clause));
    Ok(RowsSourceModel::new(
        node,
        tree.interval(node),
        RowsSourceKind::Cte {
            recursive,
            subqueries,
            result: Box::new(result),
        },
    ))
}

/// `a UNION b EXCEPT c` and `a INTERSECT b`, folded to the left
fn set_operations(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let mut results = children.into_iter();
    let Some(mut current) = results.next() else {
        return Ok(empty_after(&tree, node));
    };
    let start = tree.interval(node).start;
    for term in tree.children(node) {
        let kind = match tree.rule(term) {
            Some(RuleKind::UnionTerm) => SetOperationKind::Union,
            Some(RuleKind::ExceptTerm) => SetOperationKind::Except,
            Some(RuleKind::IntersectTerm) => SetOperationKind::Intersect,
            _ => continue,
        };
        let Some(right) = results.next() else {
            break;
        };
        let corresponding = r.collect_column_name_list(term);
        current = RowsSourceModel::new(
            term,
            Interval::new(start, tree.interval(term).end),
            RowsSourceKind::SetOperation {
                kind,
                left: Box::new(current),
                right: Box::new(right),
                corresponding,
            },
        );
    }
    Ok(current)
}

/// `FROM a, b, c` reads as `a CROSS JOIN b CROSS JOIN c`
fn from_clause(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let mut results = children.into_iter();
    let Some(mut current) = results.next() else {
        return Ok(empty_after(&r.tree, node));
    };
    for right in results {
        let interval = current.interval.union(&right.interval);
        current = RowsSourceModel::new(
            node,
            interval,
            RowsSourceKind::CrossJoin {
                left: Box::new(current),
                right: Box::new(right),
            },
        );
    }
    Ok(current)
}

fn joined_table(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let mut results = children.into_iter();
    let Some(mut current) = results.next() else {
        return Ok(empty_after(&tree, node));
    };
    let start = tree.interval(node).start;
    for term in tree.children(node) {
        let natural = match tree.rule(term) {
            Some(RuleKind::NaturalJoinTerm) => true,
            Some(RuleKind::CrossJoinTerm) => false,
            _ => continue,
        };
        let Some(right) = results.next() else {
            break;
        };
        let (left, right) = (Box::new(current), Box::new(right));
        let kind = if natural {
            let specification = tree.find_child_of_rule(term, RuleKind::JoinSpecification);
            let condition = match specification.and_then(|s| tree.find_child_of_rule(s, RuleKind::JoinCondition)) {
                Some(condition) => Some(r.collect_join_condition(condition)?),
                None => None,
            };
            RowsSourceKind::NaturalJoin {
                left,
                right,
                condition,
                using: r.collect_column_name_list(term),
            }
        } else {
            RowsSourceKind::CrossJoin { left, right }
        };
        current = RowsSourceModel::new(term, Interval::new(start, tree.interval(term).end), kind);
    }
    Ok(current)
}

fn query_specification(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let interval = tree.interval(node);
    let select_list = tree.find_child_of_rule(node, RuleKind::SelectList);
    let table_expression = tree.find_child_of_rule(node, RuleKind::TableExpression);
    let from_node = table_expression.and_then(|te| tree.find_child_of_rule(te, RuleKind::FromClause));

    let (items, select_scope) = r.with_scope(|r| match select_list {
        Some(list) => r.collect_select_items(list),
        None => Ok(Vec::new()),
    })?;
    let select_end = from_node
        .or(select_list)
        .map_or(interval.end, |n| tree.interval(n).end);
    r.scopes
        .get_mut(select_scope)
        .set_interval(Interval::new(interval.start, select_end));

    let from = children
        .into_iter()
        .next()
        .unwrap_or_else(|| RowsSourceModel::new(node, Interval::empty_at(select_end), RowsSourceKind::Empty));
    let from_scope = from_node.map(|from_node| {
        let mut scope = LexicalScope::new();
        scope.set_interval(tree.interval(from_node));
        r.scopes.push(scope)
    });

    let mut filters = Filters::default();
    if let Some(te) = table_expression {
        let clauses: Vec<NodeId> = tree
            .children(te)
            .filter(|c| {
                matches!(
                    tree.rule(*c),
                    Some(
                        RuleKind::WhereClause
                            | RuleKind::GroupByClause
                            | RuleKind::HavingClause
                            | RuleKind::OrderByClause
                    )
                )
            })
            .collect();
        let mut start = select_end;
        for (i, clause) in clauses.iter().enumerate() {
            let end = clauses
                .get(i + 1)
                .map_or(interval.end, |next| tree.interval(*next).start)
                .max(start);
            let filter = r.collect_filter(*clause, *clause)?;
            r.scopes.get_mut(filter.scope).set_interval(Interval::new(start, end));
            start = end;
            let filter = Some(filter);
            match tree.rule(*clause) {
                Some(RuleKind::WhereClause) => filters.where_clause = filter,
                Some(RuleKind::GroupByClause) => filters.group_by = filter,
                Some(RuleKind::HavingClause) => filters.having = filter,
                _ => filters.order_by = filter,
            }
        }
    }

    Ok(RowsSourceModel::new(
        node,
        interval,
        RowsSourceKind::Projection(Box::new(ProjectionModel {
            select_scope,
            from,
            from_scope,
            items,
            filters,
        })),
    ))
}

/// `table [AS alias [(columns)]]` or `(subquery) [AS alias [(columns)]]`
fn nonjoined_table_reference(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let source = match children.into_iter().next() {
        Some(source) => source,
        None if tree.find_child_of_rule(node, RuleKind::TableName).is_some() => r.collect_table_reference(node),
        None => empty_after(&tree, node),
    };
    let Some(correlation) = tree
        .last_child(node)
        .filter(|last| tree.is_rule(*last, RuleKind::CorrelationSpecification))
    else {
        return Ok(source);
    };
    let alias = tree
        .find_child_of_rule(correlation, RuleKind::CorrelationName)
        .and_then(|name| r.collect_identifier(name));
    let columns = r.collect_column_name_list(correlation);
    Ok(RowsSourceModel::new(
        node,
        tree.interval(node),
        RowsSourceKind::Correlated {
            source: Box::new(source),
            alias,
            columns,
        },
    ))
}

/// `TABLE name`
fn explicit_table(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    _children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    Ok(r.collect_table_reference(node))
}

/// `VALUES (...), (...)`
fn table_value_constructor(
    r: &mut QueryModelRecognizer<'_>,
    node: NodeId,
    _children: Vec<RowsSourceModel>,
) -> LoweringResult<RowsSourceModel> {
    let tree = Arc::clone(&r.tree);
    let rows: Vec<NodeId> = tree
        .children(node)
        .filter(|c| tree.is_rule(*c, RuleKind::RowValueConstructor))
        .collect();
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        values.push(r.collect_value_expression(row)?);
    }
    Ok(RowsSourceModel::new(node, tree.interval(node), RowsSourceKind::Values(values)))
}

impl QueryModelRecognizer<'_> {
    /// Fold the query under `node` into a row source
    pub(crate) fn collect_query_expression(&mut self, node: NodeId) -> LoweringResult<Option<RowsSourceModel>> {
        let tree = Arc::clone(&self.tree);
        rows_mapper().translate(&tree, self, node)
    }

    fn collect_join_condition(&mut self, condition: NodeId) -> LoweringResult<Filter> {
        let tree = Arc::clone(&self.tree);
        let search = tree
            .find_child_of_rule(condition, RuleKind::SearchCondition)
            .unwrap_or(condition);
        self.collect_filter(condition, search)
    }

    fn collect_select_items(&mut self, list: NodeId) -> LoweringResult<Vec<SelectItem>> {
        let tree = Arc::clone(&self.tree);
        let mut items = Vec::new();
        for sublist in tree.children(list) {
            if !tree.is_rule(sublist, RuleKind::SelectSublist) {
                continue;
            }
            let Some(item) = tree.first_child(sublist) else {
                continue;
            };
            if tree.token_kind(item) == Some(TokenKind::Asterisk) {
                items.push(SelectItem::CompleteTuple { node: sublist });
                continue;
            }
            let Some(value) = tree.find_child_of_rule(item, RuleKind::ValueExpression) else {
                continue;
            };
            let expr = self.collect_value_expression(value)?;
            if matches!(expr.kind, ValueExpressionKind::TupleReference { .. }) {
                items.push(SelectItem::Tuple { node: sublist, expr });
                continue;
            }
            let alias = tree
                .find_child_of_rule(item, RuleKind::AsClause)
                .and_then(|clause| tree.last_child(clause))
                .and_then(|name| self.collect_identifier(name));
            items.push(SelectItem::Column {
                node: sublist,
                expr,
                alias,
            });
        }
        Ok(items)
    }
}
