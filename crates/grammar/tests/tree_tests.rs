// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Syntax tree navigation over parsed statements

use sqlscope_grammar::{RuleKind, SqlParser, SyntaxTree, TokenKind};
use sqlscope_ir::Dialect;

fn parse(text: &str) -> SyntaxTree {
    SqlParser::new(Dialect::Standard).parse(text).unwrap()
}

#[test]
fn test_column_references_in_document_order() {
    let tree = parse("SELECT a, t.b FROM t WHERE c > 1 ORDER BY d");
    let refs = tree.expand_subtree(tree.root(), None, &[RuleKind::ColumnReference]);
    let texts: Vec<&str> = refs.iter().map(|r| tree.text(*r)).collect();
    assert_eq!(texts, vec!["a", "t.b", "c", "d"]);
}

#[test]
fn test_expand_only_through_given_rules() {
    let tree = parse("SELECT a FROM t");
    let found = tree.expand_subtree(
        tree.root(),
        Some(&[RuleKind::SqlQuery, RuleKind::DirectSqlDataStatement]),
        &[RuleKind::SelectStatement, RuleKind::TableName],
    );
    // tableName sits deeper than the expandable rules reach
    assert_eq!(found.len(), 1);
    assert!(tree.is_rule(found[0], RuleKind::SelectStatement));
}

#[test]
fn test_rule_path_and_parents() {
    let tree = parse("SELECT a FROM t");
    let table = tree.expand_subtree(tree.root(), None, &[RuleKind::TableName])[0];
    let path = tree.rule_path(table);
    assert_eq!(path.first(), Some(&RuleKind::SqlQuery));
    assert_eq!(path.last(), Some(&RuleKind::NonjoinedTableReference));
    assert!(tree.is_rule(tree.parent(table).unwrap(), RuleKind::NonjoinedTableReference));
}

#[test]
fn test_last_term_and_children() {
    let tree = parse("SELECT a FROM t");
    let last = tree.last_term(tree.root()).unwrap();
    assert_eq!(tree.text(last), "t");
    assert_eq!(tree.token_kind(last), Some(TokenKind::Identifier));

    let spec = tree.expand_subtree(tree.root(), None, &[RuleKind::QuerySpecification])[0];
    assert_eq!(tree.token_kind(tree.first_child(spec).unwrap()), Some(TokenKind::Select));
    assert!(tree.is_rule(tree.last_child(spec).unwrap(), RuleKind::TableExpression));
    assert!(tree.find_child_of_rule(spec, RuleKind::SelectList).is_some());
    assert!(tree.find_child_of_token(spec, TokenKind::Select).is_some());
}

#[test]
fn test_trailing_period_keeps_qualifier() {
    let tree = parse("SELECT t. FROM t");
    let names = tree.expand_subtree(tree.root(), None, &[RuleKind::QualifiedName]);
    assert!(!names.is_empty());
    assert_eq!(tree.text(names[0]), "t.");
}

#[test]
fn test_intervals_are_half_open_byte_ranges() {
    let text = "SELECT  x\nFROM tbl";
    let tree = parse(text);
    let table = tree.expand_subtree(tree.root(), None, &[RuleKind::TableName])[0];
    let interval = tree.interval(table);
    assert_eq!(&text[interval.start..interval.end], "tbl");
    assert_eq!(interval.end, text.len());
}

#[test]
fn test_dump_lists_every_node() {
    let tree = parse("SELECT 1");
    let dump = tree.dump();
    assert!(dump.starts_with("sqlQuery"));
    assert!(dump.contains("unsignedNumericLiteral"));
    assert_eq!(dump.lines().count(), tree.len());
}
