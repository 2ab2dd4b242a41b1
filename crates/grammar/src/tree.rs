// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Syntax tree
//!
//! An immutable arena of parse nodes for one statement. Rule nodes and
//! terminals carry the ATN state they were parsed from; error nodes cover
//! tokens the parser could not fit into the grammar and carry none.
//!
//! Node intervals are half-open byte ranges into the statement text.

use std::ops::Range;

use serde::Serialize;
use sqlscope_ir::Interval;

use crate::atn::StateId;
use crate::rules::RuleKind;
use crate::token::{Token, TokenKind};

/// Index of a node in its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Rule(RuleKind),
    Term(TokenKind),
    Error,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    interval: Interval,
    tokens: Range<usize>,
    atn_state: Option<StateId>,
}

/// Parse tree of a single statement
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: String,
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub(crate) fn new(text: String, tokens: Vec<Token>) -> Self {
        Self {
            text,
            tokens,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn push_node(
        &mut self,
        kind: NodeKind,
        tokens: Range<usize>,
        interval: Interval,
        atn_state: Option<StateId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            interval,
            tokens,
            atn_state,
        });
        id
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Covering interval of a token range, or an empty interval at `at`
    pub(crate) fn tokens_interval(&self, tokens: &Range<usize>, at: usize) -> Interval {
        if tokens.is_empty() {
            return Interval::empty_at(at);
        }
        Interval::new(
            self.tokens[tokens.start].interval.start,
            self.tokens[tokens.end - 1].interval.end,
        )
    }

    /// The root is always the first node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn source(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node.index()].kind
    }

    pub fn rule(&self, node: NodeId) -> Option<RuleKind> {
        match self.kind(node) {
            NodeKind::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn token_kind(&self, node: NodeId) -> Option<TokenKind> {
        match self.kind(node) {
            NodeKind::Term(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_rule(&self, node: NodeId, rule: RuleKind) -> bool {
        self.rule(node) == Some(rule)
    }

    pub fn is_term(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Term(_))
    }

    pub fn is_error(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Error)
    }

    /// Rule name, token display name, or `error`
    pub fn node_name(&self, node: NodeId) -> &'static str {
        match self.kind(node) {
            NodeKind::Rule(rule) => rule.name(),
            NodeKind::Term(kind) => kind.display_name(),
            NodeKind::Error => "error",
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn interval(&self, node: NodeId) -> Interval {
        self.nodes[node.index()].interval
    }

    /// Indices of the tokens the node spans
    pub fn token_range(&self, node: NodeId) -> Range<usize> {
        self.nodes[node.index()].tokens.clone()
    }

    pub fn atn_state(&self, node: NodeId) -> Option<StateId> {
        self.nodes[node.index()].atn_state
    }

    /// The node's source text
    pub fn text(&self, node: NodeId) -> &str {
        let interval = self.interval(node);
        self.text.get(interval.start..interval.end).unwrap_or("")
    }

    /// All children including error nodes
    pub fn all_children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    /// Children that are not error nodes
    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.all_children(node)
            .iter()
            .copied()
            .filter(|child| !self.is_error(*child))
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).count()
    }

    /// The `index`-th non-error child
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).next()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).next_back()
    }

    pub fn has_error_children(&self, node: NodeId) -> bool {
        self.all_children(node).iter().any(|c| self.is_error(*c))
    }

    pub fn find_child_of_rule(&self, node: NodeId, rule: RuleKind) -> Option<NodeId> {
        self.children(node).find(|c| self.is_rule(*c, rule))
    }

    pub fn find_last_child_of_rule(&self, node: NodeId, rule: RuleKind) -> Option<NodeId> {
        self.children(node).rev().find(|c| self.is_rule(*c, rule))
    }

    pub fn find_child_of_token(&self, node: NodeId, kind: TokenKind) -> Option<NodeId> {
        self.children(node).find(|c| self.token_kind(*c) == Some(kind))
    }

    /// Rules from the root down to `node`'s parent, outermost first
    pub fn rule_path(&self, node: NodeId) -> Vec<RuleKind> {
        let mut path = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            if let Some(rule) = self.rule(id) {
                path.push(rule);
            }
            current = self.parent(id);
        }
        path.reverse();
        path
    }

    /// The last terminal of the subtree in document order
    pub fn last_term(&self, node: NodeId) -> Option<NodeId> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.is_term(current) {
                return Some(current);
            }
            stack.extend(self.children(current));
        }
        None
    }

    /// Collect the nodes of the subtree whose rule is in `collect`
    ///
    /// Collected nodes are not descended into. When `expand` is given, only
    /// nodes with those rules are descended into. Results are in document
    /// order.
    pub fn expand_subtree(
        &self,
        root: NodeId,
        expand: Option<&[RuleKind]>,
        collect: &[RuleKind],
    ) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.rule(node) {
                Some(rule) if collect.contains(&rule) => result.push(node),
                rule => {
                    let descend = match expand {
                        None => true,
                        Some(expand) => rule.is_some_and(|r| expand.contains(&r)),
                    };
                    if descend {
                        stack.extend(self.all_children(node).iter().rev());
                    }
                }
            }
        }
        result
    }

    /// Indented dump of the tree, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let interval = self.interval(node);
            out.push_str(&"  ".repeat(depth));
            out.push_str(self.node_name(node));
            if !matches!(self.kind(node), NodeKind::Rule(_)) {
                out.push_str(&format!(" {:?}", self.text(node)));
            }
            out.push_str(&format!(" {interval}\n"));
            for child in self.all_children(node).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}
