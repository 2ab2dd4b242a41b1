// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Augmented transition network
//!
//! The grammar compiled to a state machine. Each rule owns a start and a
//! stop state; rule references are transitions that enter the referenced
//! rule's start state and remember where to continue once its stop state is
//! reached. Token-consuming transitions carry a [`Matcher`], everything else
//! is epsilon (plain, rule entry, or a dialect predicate).
//!
//! Syntax tree nodes point back into this network, which is what makes
//! keyword prediction at an arbitrary position possible.

use std::fmt;

use serde::Serialize;
use sqlscope_ir::DialectExtensions;

use crate::rules::RuleKind;
use crate::token::TokenKind;

/// Index of a state in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StateId(u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Basic,
    RuleStart,
    RuleStop,
    BlockStart,
    BlockEnd,
    LoopEntry,
}

/// Which tokens a consuming transition accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Atom(TokenKind),
    Range(TokenKind, TokenKind),
    Set(&'static [TokenKind]),
}

impl Matcher {
    pub fn matches(&self, kind: TokenKind) -> bool {
        match self {
            Matcher::Atom(expected) => *expected == kind,
            Matcher::Range(from, to) => kind.in_range(*from, *to),
            Matcher::Set(kinds) => kinds.contains(&kind),
        }
    }

    /// Every token kind accepted
    pub fn tokens(&self) -> Vec<TokenKind> {
        match self {
            Matcher::Atom(kind) => vec![*kind],
            Matcher::Range(from, to) => TokenKind::ALL
                .iter()
                .copied()
                .filter(|k| k.in_range(*from, *to))
                .collect(),
            Matcher::Set(kinds) => kinds.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Epsilon {
        target: StateId,
    },
    /// Enter `rule` at `target`; continue at `follow` once it completes
    Rule {
        target: StateId,
        rule: RuleKind,
        follow: StateId,
    },
    Match {
        target: StateId,
        matcher: Matcher,
    },
    /// Passable only when the dialect supports `extension`
    Predicate {
        target: StateId,
        extension: DialectExtensions,
    },
}

impl Transition {
    pub fn target(&self) -> StateId {
        match self {
            Transition::Epsilon { target }
            | Transition::Rule { target, .. }
            | Transition::Match { target, .. }
            | Transition::Predicate { target, .. } => *target,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        !matches!(self, Transition::Match { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AtnState {
    pub kind: StateKind,
    pub rule: RuleKind,
    pub transitions: Vec<Transition>,
}

/// The compiled network for the whole grammar
#[derive(Debug)]
pub struct Atn {
    states: Vec<AtnState>,
    rule_starts: Vec<StateId>,
    rule_stops: Vec<StateId>,
}

impl Atn {
    /// A network holding just the start and stop state of every rule
    pub(crate) fn with_rule_boundaries() -> Self {
        let mut atn = Atn {
            states: Vec::new(),
            rule_starts: Vec::with_capacity(RuleKind::ALL.len()),
            rule_stops: Vec::with_capacity(RuleKind::ALL.len()),
        };
        for rule in RuleKind::ALL {
            let start = atn.add_state(StateKind::RuleStart, *rule);
            let stop = atn.add_state(StateKind::RuleStop, *rule);
            atn.rule_starts.push(start);
            atn.rule_stops.push(stop);
        }
        atn
    }

    pub(crate) fn add_state(&mut self, kind: StateKind, rule: RuleKind) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(AtnState {
            kind,
            rule,
            transitions: Vec::new(),
        });
        id
    }

    pub(crate) fn add_transition(&mut self, from: StateId, transition: Transition) {
        self.states[from.index()].transitions.push(transition);
    }

    pub fn state(&self, id: StateId) -> &AtnState {
        &self.states[id.index()]
    }

    pub fn rule_start(&self, rule: RuleKind) -> StateId {
        self.rule_starts[rule.index()]
    }

    pub fn rule_stop(&self, rule: RuleKind) -> StateId {
        self.rule_stops[rule.index()]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchers() {
        assert!(Matcher::Atom(TokenKind::Select).matches(TokenKind::Select));
        let (from, to) = TokenKind::NON_RESERVED_RANGE;
        let range = Matcher::Range(from, to);
        assert!(range.matches(TokenKind::Key));
        assert!(!range.matches(TokenKind::Select));
        assert_eq!(range.tokens().len(), 8);
    }

    #[test]
    fn test_rule_boundaries_are_allocated_up_front() {
        let atn = Atn::with_rule_boundaries();
        assert_eq!(atn.len(), RuleKind::ALL.len() * 2);
        let start = atn.rule_start(RuleKind::TableName);
        assert_eq!(atn.state(start).kind, StateKind::RuleStart);
        assert_eq!(atn.state(atn.rule_stop(RuleKind::TableName)).rule, RuleKind::TableName);
    }
}
