// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error-tolerant statement parser
//!
//! A memoizing backtracking parser over the compiled grammar. Alternatives
//! are ordered: the first one that matches wins.
//!
//! Parsing runs in up to two passes:
//! 1. A strict pass over all tokens.
//! 2. If the strict pass leaves tokens unconsumed, a tolerant pass over the
//!    prefix up to the farthest point any match was attempted. In this pass a
//!    required token at the end of the prefix counts as missing and matches
//!    nothing, which keeps the tree shaped for text that is still being typed.
//!
//! Tokens left over after the better pass go into a single error node at the
//! end of the root. The parser never panics on malformed input.

use std::collections::HashMap;
use std::ops::Range;

use sqlscope_ir::Dialect;

use crate::atn::StateId;
use crate::grammar::{sql_grammar, Expr, SqlGrammar};
use crate::lexer::tokenize;
use crate::rules::RuleKind;
use crate::token::Token;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Default limit on rule nesting
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Parser for single statements
#[derive(Debug, Clone)]
pub struct SqlParser {
    dialect: Dialect,
    max_depth: usize,
}

impl SqlParser {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Builder method: set the rule nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse `text` as one `sqlQuery`
    ///
    /// Returns `None` when the text holds no tokens.
    pub fn parse(&self, text: &str) -> Option<SyntaxTree> {
        self.parse_as(RuleKind::SqlQuery, text)
    }

    /// Parse `text` with `root` as the start rule
    pub fn parse_as(&self, root: RuleKind, text: &str) -> Option<SyntaxTree> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return None;
        }
        let grammar = sql_grammar();
        let count = tokens.len();

        let mut strict = Pass::new(grammar, self, &tokens, count, Mode::Strict);
        let strict_result = strict.rule(root, 0, 0);
        let strict_consumed = strict_result.map_or(0, |(end, _)| end);

        let (pass, result) = if strict_consumed == count {
            (strict, strict_result)
        } else {
            let cutoff = strict.farthest.max(strict_consumed).min(count);
            let mut tolerant = Pass::new(grammar, self, &tokens, cutoff, Mode::Tolerant);
            let tolerant_result = tolerant.rule(root, 0, 0);
            let tolerant_consumed = match tolerant_result {
                Some((end, Some(_))) => end,
                _ => 0,
            };
            if tolerant_consumed >= strict_consumed && tolerant_consumed > 0 {
                (tolerant, tolerant_result)
            } else {
                (strict, strict_result)
            }
        };

        if pass.depth_exceeded {
            tracing::warn!(
                max_depth = self.max_depth,
                "Statement nesting exceeds the parser depth limit"
            );
        }
        tracing::trace!(
            tokens = count,
            consumed = result.map_or(0, |(end, _)| end),
            tolerant = pass.mode == Mode::Tolerant,
            "Parsed statement"
        );

        let mut tree = SyntaxTree::new(text.to_string(), tokens.clone());
        match result {
            Some((end, Some(raw_root))) => {
                let root_node = pass.materialize(grammar, &mut tree, raw_root);
                if end < count {
                    append_error(&mut tree, root_node, end..count);
                }
            }
            _ => {
                let interval = tree.tokens_interval(&(0..count), 0);
                let root_node = tree.push_node(
                    NodeKind::Rule(root),
                    0..count,
                    interval,
                    Some(grammar.atn().rule_start(root)),
                );
                append_error(&mut tree, root_node, 0..count);
            }
        }
        Some(tree)
    }
}

fn append_error(tree: &mut SyntaxTree, parent: NodeId, tokens: Range<usize>) {
    let interval = tree.tokens_interval(&tokens, 0);
    let error = tree.push_node(NodeKind::Error, tokens, interval, None);
    tree.append_child(parent, error);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Tolerant,
}

#[derive(Debug, Clone, Copy)]
enum RawKind {
    Rule(RuleKind),
    Term(StateId),
}

#[derive(Debug)]
struct RawNode {
    kind: RawKind,
    tokens: Range<usize>,
    children: Vec<usize>,
}

/// Outcome of a rule attempt: end position and the node, if one was built
type RuleResult = Option<(usize, Option<usize>)>;

struct Pass<'a> {
    grammar: &'static SqlGrammar,
    dialect: Dialect,
    max_depth: usize,
    tokens: &'a [Token],
    end: usize,
    mode: Mode,
    nodes: Vec<RawNode>,
    memo: HashMap<(RuleKind, usize), RuleResult>,
    farthest: usize,
    depth_exceeded: bool,
}

impl<'a> Pass<'a> {
    fn new(
        grammar: &'static SqlGrammar,
        parser: &SqlParser,
        tokens: &'a [Token],
        end: usize,
        mode: Mode,
    ) -> Self {
        Self {
            grammar,
            dialect: parser.dialect,
            max_depth: parser.max_depth,
            tokens,
            end,
            mode,
            nodes: Vec::new(),
            memo: HashMap::new(),
            farthest: 0,
            depth_exceeded: false,
        }
    }

    fn rule(&mut self, rule: RuleKind, pos: usize, depth: usize) -> RuleResult {
        if let Some(hit) = self.memo.get(&(rule, pos)) {
            return *hit;
        }
        if depth > self.max_depth {
            self.depth_exceeded = true;
            return None;
        }
        let grammar = self.grammar;
        let mut children = Vec::new();
        let result = self
            .expr(grammar.rule_expr(rule), pos, &mut children, depth)
            .map(|end| {
                if end == pos && self.mode == Mode::Tolerant {
                    (end, None)
                } else {
                    let id = self.nodes.len();
                    self.nodes.push(RawNode {
                        kind: RawKind::Rule(rule),
                        tokens: pos..end,
                        children,
                    });
                    (end, Some(id))
                }
            });
        self.memo.insert((rule, pos), result);
        result
    }

    /// Match `expr` at `pos`; on failure `out` is left as it was
    fn expr(&mut self, expr: &Expr, pos: usize, out: &mut Vec<usize>, depth: usize) -> Option<usize> {
        match expr {
            Expr::Match { matcher, state } => {
                if pos < self.end && matcher.matches(self.tokens[pos].kind) {
                    let id = self.nodes.len();
                    self.nodes.push(RawNode {
                        kind: RawKind::Term(*state),
                        tokens: pos..pos + 1,
                        children: Vec::new(),
                    });
                    out.push(id);
                    Some(pos + 1)
                } else if self.mode == Mode::Tolerant && pos >= self.end {
                    Some(pos)
                } else {
                    self.farthest = self.farthest.max(pos);
                    None
                }
            }
            Expr::Rule(rule) => {
                let (end, node) = self.rule(*rule, pos, depth + 1)?;
                out.extend(node);
                Some(end)
            }
            Expr::Seq(items) => {
                let mark = out.len();
                let mut current = pos;
                for item in items {
                    match self.expr(item, current, out, depth) {
                        Some(next) => current = next,
                        None => {
                            out.truncate(mark);
                            return None;
                        }
                    }
                }
                Some(current)
            }
            Expr::Choice(alternatives) => alternatives
                .iter()
                .find_map(|alternative| self.expr(alternative, pos, out, depth)),
            Expr::Optional(inner) => {
                let mark = out.len();
                match self.expr(inner, pos, out, depth) {
                    Some(next) if next > pos => Some(next),
                    _ => {
                        out.truncate(mark);
                        Some(pos)
                    }
                }
            }
            Expr::ZeroOrMore(inner) => Some(self.repeat(inner, pos, out, depth)),
            Expr::OneOrMore(inner) => {
                let first = self.expr(inner, pos, out, depth)?;
                if first == pos {
                    return Some(first);
                }
                Some(self.repeat(inner, first, out, depth))
            }
            Expr::Gated(extension, inner) => {
                if self.dialect.supports(*extension) {
                    self.expr(inner, pos, out, depth)
                } else {
                    None
                }
            }
        }
    }

    /// Match `inner` as often as it consumes tokens
    fn repeat(&mut self, inner: &Expr, mut pos: usize, out: &mut Vec<usize>, depth: usize) -> usize {
        loop {
            let mark = out.len();
            match self.expr(inner, pos, out, depth) {
                Some(next) if next > pos => pos = next,
                _ => {
                    out.truncate(mark);
                    return pos;
                }
            }
        }
    }

    /// Copy the subtree under `raw_root` into `tree`, dropping abandoned nodes
    fn materialize(&self, grammar: &SqlGrammar, tree: &mut SyntaxTree, raw_root: usize) -> NodeId {
        let mut root = None;
        let mut stack: Vec<(usize, Option<NodeId>)> = vec![(raw_root, None)];
        while let Some((raw, parent)) = stack.pop() {
            let data = &self.nodes[raw];
            let at = self
                .tokens
                .get(data.tokens.start)
                .map_or_else(|| self.tokens.last().map_or(0, |t| t.interval.end), |t| t.interval.start);
            let interval = tree.tokens_interval(&data.tokens, at);
            let (kind, state) = match data.kind {
                RawKind::Rule(rule) => (NodeKind::Rule(rule), grammar.atn().rule_start(rule)),
                RawKind::Term(state) => (NodeKind::Term(self.tokens[data.tokens.start].kind), state),
            };
            let node = tree.push_node(kind, data.tokens.clone(), interval, Some(state));
            match parent {
                Some(parent) => tree.append_child(parent, node),
                None => root = Some(node),
            }
            for child in data.children.iter().rev() {
                stack.push((*child, Some(node)));
            }
        }
        root.unwrap_or_else(|| tree.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn parse(text: &str) -> SyntaxTree {
        SqlParser::new(Dialect::PostgreSQL)
            .parse(text)
            .expect("non-empty text parses")
    }

    fn rules_in(tree: &SyntaxTree) -> Vec<RuleKind> {
        (0..tree.len())
            .filter_map(|i| tree.rule(NodeId(i as u32)))
            .collect()
    }

    #[test]
    fn test_empty_text_has_no_tree() {
        assert!(SqlParser::new(Dialect::Standard).parse("  -- nothing\n").is_none());
    }

    #[test]
    fn test_simple_select_parses_strictly() {
        let tree = parse("SELECT a, b FROM t WHERE a = 1");
        let root = tree.root();
        assert_eq!(tree.rule(root), Some(RuleKind::SqlQuery));
        assert!(!tree.has_error_children(root));
        let rules = rules_in(&tree);
        assert!(rules.contains(&RuleKind::QuerySpecification));
        assert!(rules.contains(&RuleKind::WhereClause));
        assert_eq!(tree.interval(root).end, 30);
    }

    #[test]
    fn test_incomplete_from_clause_is_tolerated() {
        let tree = parse("SELECT a FROM");
        assert!(!tree.has_error_children(tree.root()));
        let rules = rules_in(&tree);
        assert!(rules.contains(&RuleKind::FromClause));
        assert!(!rules.contains(&RuleKind::TableReference));
    }

    #[test]
    fn test_trailing_garbage_becomes_error_node() {
        let tree = parse("SELECT a FROM t )");
        let root = tree.root();
        let last = *tree.all_children(root).last().expect("root has children");
        assert!(tree.is_error(last));
        assert_eq!(tree.text(last), ")");
        assert_eq!(tree.child_count(root), 1);
    }

    #[test]
    fn test_unparseable_statement_keeps_root() {
        let tree = parse("foo bar");
        let root = tree.root();
        assert_eq!(tree.rule(root), Some(RuleKind::SqlQuery));
        assert_eq!(tree.child_count(root), 0);
        assert!(tree.has_error_children(root));
    }

    #[test]
    fn test_missing_select_list_keeps_select_keyword() {
        let tree = parse("SELECT FROM t");
        let spec = tree.expand_subtree(tree.root(), None, &[RuleKind::QuerySpecification]);
        assert_eq!(spec.len(), 1);
        assert_eq!(tree.text(spec[0]), "SELECT");
        assert!(tree.has_error_children(tree.root()));
    }

    #[test]
    fn test_type_cast_is_dialect_gated() {
        let pg = SqlParser::new(Dialect::PostgreSQL).parse("SELECT a::int FROM t").unwrap();
        assert!(rules_in(&pg).contains(&RuleKind::ValueExpressionCastSpec));
        let std = SqlParser::new(Dialect::Standard).parse("SELECT a::int FROM t").unwrap();
        assert!(!rules_in(&std).contains(&RuleKind::ValueExpressionCastSpec));
        assert!(std.has_error_children(std.root()));
    }

    #[test]
    fn test_terms_carry_match_states() {
        let tree = parse("SELECT 1");
        let grammar = sql_grammar();
        for i in 0..tree.len() {
            let node = NodeId(i as u32);
            let state = tree.atn_state(node).expect("no error nodes here");
            match tree.kind(node) {
                NodeKind::Term(kind) => {
                    let transition = &grammar.atn().state(state).transitions[0];
                    assert!(matches!(
                        transition,
                        crate::atn::Transition::Match { matcher, .. } if matcher.matches(kind)
                    ));
                }
                NodeKind::Rule(rule) => assert_eq!(state, grammar.atn().rule_start(rule)),
                NodeKind::Error => unreachable!(),
            }
        }
    }

    #[test]
    fn test_depth_limit_fails_gracefully() {
        let nested = format!("SELECT {}1{}", "(".repeat(200), ")".repeat(200));
        let tree = SqlParser::new(Dialect::Standard)
            .with_max_depth(64)
            .parse(&nested)
            .unwrap();
        assert!(tree.has_error_children(tree.root()) || tree.child_count(tree.root()) == 0);
    }

    #[test]
    fn test_dml_and_ddl_statements() {
        for (text, rule) in [
            ("INSERT INTO t (a, b) VALUES (1, 2)", RuleKind::InsertStatement),
            ("UPDATE t SET a = 1 WHERE b = 2", RuleKind::UpdateStatement),
            ("DELETE FROM t x WHERE x.a > 0", RuleKind::DeleteStatement),
            ("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(20) NOT NULL)", RuleKind::CreateTableStatement),
            ("CREATE VIEW v AS SELECT 1", RuleKind::CreateViewStatement),
            ("DROP TABLE IF EXISTS a, b CASCADE", RuleKind::DropTableStatement),
            ("DROP VIEW v", RuleKind::DropViewStatement),
            ("DROP PROCEDURE IF EXISTS s.p, q RESTRICT", RuleKind::DropProcedureStatement),
            ("ALTER TABLE t ADD COLUMN c INT NOT NULL", RuleKind::AddColumnDefinition),
            ("ALTER TABLE t ADD PRIMARY KEY (a, b)", RuleKind::AddTableConstraintDefinition),
            ("ALTER TABLE t DROP c CASCADE, DROP COLUMN d", RuleKind::DropColumnDefinition),
            ("ALTER TABLE t ALTER COLUMN c SET DEFAULT 0", RuleKind::AlterColumnDefinition),
            ("ALTER TABLE t ALTER c DROP NOT NULL", RuleKind::AlterColumnAction),
        ] {
            let tree = parse(text);
            assert!(!tree.has_error_children(tree.root()), "{text}\n{}", tree.dump());
            assert!(rules_in(&tree).contains(&rule), "{text}");
        }
    }

    #[test]
    fn test_joins_and_set_operations() {
        let tree = parse(
            "WITH c AS (SELECT 1) SELECT * FROM a LEFT OUTER JOIN b ON a.id = b.id CROSS JOIN c \
             UNION ALL SELECT x.* FROM x",
        );
        assert!(!tree.has_error_children(tree.root()), "{}", tree.dump());
        let rules = rules_in(&tree);
        for rule in [
            RuleKind::WithClause,
            RuleKind::JoinedTable,
            RuleKind::NaturalJoinTerm,
            RuleKind::CrossJoinTerm,
            RuleKind::UnionTerm,
            RuleKind::TupleRefSuffix,
        ] {
            assert!(rules.contains(&rule), "{}", rule.name());
        }
    }

    #[test]
    fn test_non_reserved_keyword_as_identifier() {
        let tree = parse("SELECT key FROM t");
        let names = tree.expand_subtree(tree.root(), None, &[RuleKind::NonReserved]);
        assert_eq!(names.len(), 1);
        assert_eq!(tree.token_kind(tree.first_child(names[0]).unwrap()), Some(TokenKind::Key));
    }
}
