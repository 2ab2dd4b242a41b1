// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Keyword completion
//!
//! Predicts which reserved words may follow a position in a statement by
//! walking the grammar's transition network from the parser state at that
//! position.
//!
//! ## Locating the start state
//!
//! The syntax tree is descended towards the position. A terminal containing
//! the position restarts from the state the terminal was matched in; a
//! terminal ending before it restarts from the state after the match. The
//! rules enclosing the terminal form the initial rule stack, so the walk
//! can return to callers when a rule completes.
//!
//! A position ahead of the statement uses the shared *offquery* scope,
//! which predicts statement starts.
//!
//! ## Walking the network
//!
//! Every reachable consuming transition contributes its tokens. Rules that
//! stand for names (identifiers, table and column references) are not
//! entered: reaching them only sets the matching `expecting_*` flag, since
//! names are completed from the model rather than the grammar.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use sqlscope_grammar::{Atn, NodeId, RuleKind, StateId, StateKind, SyntaxTree, Transition, sql_grammar};
use sqlscope_ir::Dialect;
use sqlscope_lowering::Model;

/// Rules whose reachability is reported through the `expecting_*` flags
const REACHABILITY_RULES: [&str; 4] = ["tableName", "columnReference", "identifier", "columnName"];

/// Rules the walk never enters
const EXCLUDED_RULES: [&str; 10] = [
    "tableName",
    "columnReference",
    "identifier",
    "columnName",
    "nonReserved",
    "anyUnexpected",
    "aggregateExprParam",
    "anyWord",
    "correlationName",
    "tableHintKeywords",
];

/// Offquery scopes, one per entry of [`Dialect::ALL`]
static OFFQUERY: [OnceLock<Arc<CompletionScope>>; Dialect::ALL.len()] = [const { OnceLock::new() }; Dialect::ALL.len()];

static EXCLUDED: OnceLock<HashSet<RuleKind>> = OnceLock::new();

/// Rule kinds for `names`; names the grammar does not define are skipped
fn rules_named(names: &[&str]) -> HashSet<RuleKind> {
    names.iter().filter_map(|name| RuleKind::from_name(name)).collect()
}

fn excluded_rules() -> &'static HashSet<RuleKind> {
    EXCLUDED.get_or_init(|| rules_named(&EXCLUDED_RULES))
}

/// What may follow a position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPrediction {
    /// Reserved words of the dialect, sorted and without duplicates
    pub keywords: Vec<String>,
    pub expecting_table_reference: bool,
    pub expecting_column_reference: bool,
    pub expecting_identifier: bool,
}

/// A parser state with its rule stack, resolved lazily into a
/// [`KeywordPrediction`]
#[derive(Debug)]
pub struct CompletionScope {
    dialect: Dialect,
    state: StateId,
    stack: Vec<RuleKind>,
    resolved: OnceLock<KeywordPrediction>,
}

impl CompletionScope {
    fn new(dialect: Dialect, state: StateId, stack: Vec<RuleKind>) -> Self {
        Self {
            dialect,
            state,
            stack,
            resolved: OnceLock::new(),
        }
    }

    /// The shared scope for positions outside any statement
    pub fn offquery(dialect: Dialect) -> Arc<CompletionScope> {
        let index = Dialect::ALL.iter().position(|d| *d == dialect).unwrap_or(0);
        OFFQUERY[index]
            .get_or_init(|| {
                let start = sql_grammar().atn().rule_start(RuleKind::SqlQueries);
                Arc::new(CompletionScope::new(dialect, start, Vec::new()))
            })
            .clone()
    }

    /// The scope at `position`, relative to the model's text
    pub fn for_keywords_at(model: &Model, position: usize, dialect: Dialect) -> Arc<CompletionScope> {
        let tree = model.tree();
        match locate(tree, position) {
            Some((state, stack)) => Arc::new(CompletionScope::new(dialect, state, stack)),
            None => Self::offquery(dialect),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    /// Rules entered at the start state, outermost first
    pub fn stack(&self) -> &[RuleKind] {
        &self.stack
    }

    /// Whether this scope predicts statement starts
    pub fn is_offquery(&self) -> bool {
        self.stack.is_empty()
    }

    /// Compute the prediction once; later calls return the same value
    pub fn resolve(&self) -> &KeywordPrediction {
        self.resolved.get_or_init(|| {
            let prediction = predict(sql_grammar().atn(), self.dialect, self.state, &self.stack);
            tracing::debug!(
                state = %self.state,
                depth = self.stack.len(),
                keywords = prediction.keywords.len(),
                "Resolved keyword prediction"
            );
            prediction
        })
    }
}

/// Find the start state and rule stack for `position`
fn locate(tree: &SyntaxTree, position: usize) -> Option<(StateId, Vec<RuleKind>)> {
    if tree.is_empty() || position < tree.interval(tree.root()).start {
        return None;
    }
    let atn = sql_grammar().atn();
    match descend(tree, position) {
        Some((term, true)) => Some((tree.atn_state(term)?, tree.rule_path(term))),
        Some((term, false)) => Some((after_match(atn, tree, term)?, tree.rule_path(term))),
        None => {
            let term = tree.last_term(tree.root())?;
            Some((after_match(atn, tree, term)?, tree.rule_path(term)))
        }
    }
}

/// Walk down to the terminal at or before `position`
///
/// Returns the terminal and whether it contains the position.
fn descend(tree: &SyntaxTree, position: usize) -> Option<(NodeId, bool)> {
    let mut node = tree.root();
    loop {
        if tree.is_term(node) {
            let interval = tree.interval(node);
            return Some((node, interval.start <= position && position < interval.end));
        }
        let contained = tree.children(node).find(|child| {
            let interval = tree.interval(*child);
            interval.start <= position && position < interval.end
        });
        let next = contained.or_else(|| tree.children(node).rev().find(|child| tree.interval(*child).start < position));
        node = next?;
    }
}

/// The state reached by consuming the terminal `term`
fn after_match(atn: &Atn, tree: &SyntaxTree, term: NodeId) -> Option<StateId> {
    let state = tree.atn_state(term)?;
    atn.state(state).transitions.first().map(Transition::target)
}

fn predict(atn: &Atn, dialect: Dialect, start: StateId, stack: &[RuleKind]) -> KeywordPrediction {
    let table_name = RuleKind::from_name("tableName");
    let column_reference = RuleKind::from_name("columnReference");
    let reachability = rules_named(&REACHABILITY_RULES);
    let excluded = excluded_rules();

    let mut prediction = KeywordPrediction::default();
    let mut keywords = BTreeSet::new();
    let mut visited = HashSet::from([start]);
    let mut queue = vec![(start, stack.to_vec())];

    while let Some((id, mut stack)) = queue.pop() {
        let state = atn.state(id);
        match state.kind {
            StateKind::RuleStart => {
                if reachability.contains(&state.rule) {
                    if Some(state.rule) == table_name {
                        prediction.expecting_table_reference = true;
                    } else if Some(state.rule) == column_reference {
                        prediction.expecting_column_reference = true;
                    } else {
                        prediction.expecting_identifier = true;
                    }
                }
                if excluded.contains(&state.rule) {
                    continue;
                }
                stack.push(state.rule);
            }
            StateKind::RuleStop => {
                // completion returns to the caller recorded below the top
                let Some(caller) = stack.len().checked_sub(2).map(|i| stack[i]) else {
                    continue;
                };
                stack.pop();
                for transition in &state.transitions {
                    let target = transition.target();
                    if atn.state(target).rule == caller && visited.insert(target) {
                        queue.push((target, stack.clone()));
                    }
                }
                continue;
            }
            _ => {}
        }

        for transition in &state.transitions {
            match transition {
                Transition::Match { matcher, .. } => {
                    for token in matcher.tokens() {
                        let word = token.display_name();
                        if token.is_keyword() && dialect.is_reserved_word(word) {
                            keywords.insert(word);
                        }
                    }
                }
                Transition::Predicate { target, extension } => {
                    if dialect.supports(*extension) && visited.insert(*target) {
                        queue.push((*target, stack.clone()));
                    }
                }
                Transition::Epsilon { target } | Transition::Rule { target, .. } => {
                    if visited.insert(*target) {
                        queue.push((*target, stack.clone()));
                    }
                }
            }
        }
    }

    prediction.keywords = keywords.into_iter().map(str::to_string).collect();
    prediction
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_lowering::{RecognitionContext, RecognitionSettings, recognize};

    fn model(dialect: Dialect, text: &str) -> Model {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(dialect));
        recognize(text, &mut ctx).unwrap()
    }

    fn keywords_at_end(dialect: Dialect, text: &str) -> KeywordPrediction {
        let model = model(dialect, text);
        CompletionScope::for_keywords_at(&model, text.len(), dialect)
            .resolve()
            .clone()
    }

    #[test]
    fn test_offquery_predicts_statement_starts() {
        let scope = CompletionScope::offquery(Dialect::PostgreSQL);
        assert!(scope.is_offquery());
        let keywords = &scope.resolve().keywords;
        for expected in ["SELECT", "INSERT", "CREATE", "WITH"] {
            assert!(keywords.iter().any(|k| k == expected), "missing {expected} in {keywords:?}");
        }
        assert!(!keywords.iter().any(|k| k == "WHERE"));
    }

    #[test]
    fn test_offquery_is_shared_per_dialect() {
        let a = CompletionScope::offquery(Dialect::MySQL);
        let b = CompletionScope::offquery(Dialect::MySQL);
        assert!(Arc::ptr_eq(&a, &b));
        let c = CompletionScope::offquery(Dialect::PostgreSQL);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.dialect(), Dialect::PostgreSQL);
    }

    #[test]
    fn test_position_before_statement_is_offquery() {
        let text = "  SELECT a FROM t";
        let model = model(Dialect::MySQL, text);
        let scope = CompletionScope::for_keywords_at(&model, 0, Dialect::MySQL);
        assert!(scope.is_offquery());
    }

    #[test]
    fn test_inside_first_keyword() {
        let text = "SELECT a FROM t";
        let model = model(Dialect::MySQL, text);
        let scope = CompletionScope::for_keywords_at(&model, 0, Dialect::MySQL);
        assert!(!scope.is_offquery());
        assert!(scope.resolve().keywords.iter().any(|k| k == "SELECT"));
    }

    #[test]
    fn test_after_from_expects_table() {
        let prediction = keywords_at_end(Dialect::PostgreSQL, "select * from ");
        assert!(prediction.expecting_table_reference);
        assert!(!prediction.keywords.iter().any(|k| k == "WHERE"));
        assert!(
            prediction
                .keywords
                .iter()
                .all(|k| Dialect::PostgreSQL.is_reserved_word(k))
        );
    }

    #[test]
    fn test_after_table_predicts_clauses() {
        let prediction = keywords_at_end(Dialect::PostgreSQL, "SELECT * FROM t ");
        for expected in ["WHERE", "JOIN", "ORDER", "LIMIT"] {
            assert!(
                prediction.keywords.iter().any(|k| k == expected),
                "missing {expected} in {:?}",
                prediction.keywords
            );
        }
        let standard = keywords_at_end(Dialect::Standard, "SELECT * FROM t ");
        assert!(standard.keywords.iter().any(|k| k == "WHERE"));
        assert!(!standard.keywords.iter().any(|k| k == "LIMIT"));
    }

    #[test]
    fn test_select_list_expects_columns() {
        let prediction = keywords_at_end(Dialect::MySQL, "SELECT ");
        assert!(prediction.expecting_column_reference);
        assert!(prediction.keywords.iter().any(|k| k == "DISTINCT"));
        assert!(!prediction.keywords.iter().any(|k| k == "SELECT"));
    }

    #[test]
    fn test_keywords_are_sorted() {
        let prediction = keywords_at_end(Dialect::MySQL, "SELECT a FROM t ");
        let mut sorted = prediction.keywords.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(prediction.keywords, sorted);
    }

    #[test]
    fn test_resolve_is_memoized() {
        let model = model(Dialect::MySQL, "SELECT a FROM t");
        let scope = CompletionScope::for_keywords_at(&model, 15, Dialect::MySQL);
        let first: *const KeywordPrediction = scope.resolve();
        let second: *const KeywordPrediction = scope.resolve();
        assert_eq!(first, second);
    }

    #[test]
    fn test_excluded_rules_exist_or_are_skipped() {
        let excluded = excluded_rules();
        assert!(excluded.contains(&RuleKind::Identifier));
        assert!(excluded.contains(&RuleKind::NonReserved));
        assert!(excluded.len() < EXCLUDED_RULES.len());
    }
}
