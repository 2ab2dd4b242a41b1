// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Compiled grammar
//!
//! Compiles every rule definition into two parallel forms: an expression
//! tree the parser walks, and the [`Atn`]. Token-matching expressions
//! remember the ATN state they were compiled to, so parsed terminals can be
//! located in the network afterwards.

use std::sync::LazyLock;

use sqlscope_ir::DialectExtensions;

use crate::atn::{Atn, Matcher, StateId, StateKind, Transition};
use crate::rules::{definition, Element, RuleKind};

/// Parser-side form of a grammar element
#[derive(Debug)]
pub(crate) enum Expr {
    Match { matcher: Matcher, state: StateId },
    Rule(RuleKind),
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Optional(Box<Expr>),
    ZeroOrMore(Box<Expr>),
    OneOrMore(Box<Expr>),
    Gated(DialectExtensions, Box<Expr>),
}

/// The SQL grammar, compiled once per process
#[derive(Debug)]
pub struct SqlGrammar {
    rules: Vec<Expr>,
    atn: Atn,
}

static GRAMMAR: LazyLock<SqlGrammar> = LazyLock::new(SqlGrammar::compile);

/// The shared compiled grammar
pub fn sql_grammar() -> &'static SqlGrammar {
    &GRAMMAR
}

impl SqlGrammar {
    fn compile() -> Self {
        let mut builder = Builder {
            atn: Atn::with_rule_boundaries(),
        };
        let rules = RuleKind::ALL
            .iter()
            .map(|rule| builder.compile_rule(*rule, &definition(*rule)))
            .collect();
        tracing::debug!(
            rules = RuleKind::ALL.len(),
            states = builder.atn.len(),
            "Compiled SQL grammar"
        );
        Self {
            rules,
            atn: builder.atn,
        }
    }

    pub fn atn(&self) -> &Atn {
        &self.atn
    }

    pub(crate) fn rule_expr(&self, rule: RuleKind) -> &Expr {
        &self.rules[rule.index()]
    }
}

struct Builder {
    atn: Atn,
}

impl Builder {
    fn compile_rule(&mut self, rule: RuleKind, element: &Element) -> Expr {
        let (expr, entry, exit) = self.compile(rule, element);
        let start = self.atn.rule_start(rule);
        let stop = self.atn.rule_stop(rule);
        self.epsilon(start, entry);
        self.epsilon(exit, stop);
        expr
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        self.atn.add_transition(from, Transition::Epsilon { target: to });
    }

    fn matcher(&mut self, rule: RuleKind, matcher: Matcher) -> (Expr, StateId, StateId) {
        let entry = self.atn.add_state(StateKind::Basic, rule);
        let exit = self.atn.add_state(StateKind::Basic, rule);
        self.atn.add_transition(
            entry,
            Transition::Match {
                target: exit,
                matcher,
            },
        );
        (
            Expr::Match {
                matcher,
                state: entry,
            },
            entry,
            exit,
        )
    }

    /// Returns the parser expression with its entry and exit states
    fn compile(&mut self, rule: RuleKind, element: &Element) -> (Expr, StateId, StateId) {
        match element {
            Element::Token(kind) => self.matcher(rule, Matcher::Atom(*kind)),
            Element::TokenSet(kinds) => self.matcher(rule, Matcher::Set(kinds)),
            Element::TokenRange(from, to) => self.matcher(rule, Matcher::Range(*from, *to)),
            Element::Rule(target) => {
                let entry = self.atn.add_state(StateKind::Basic, rule);
                let exit = self.atn.add_state(StateKind::Basic, rule);
                let target_start = self.atn.rule_start(*target);
                let target_stop = self.atn.rule_stop(*target);
                self.atn.add_transition(
                    entry,
                    Transition::Rule {
                        target: target_start,
                        rule: *target,
                        follow: exit,
                    },
                );
                self.epsilon(target_stop, exit);
                (Expr::Rule(*target), entry, exit)
            }
            Element::Seq(elements) => {
                let entry = self.atn.add_state(StateKind::Basic, rule);
                let mut exit = entry;
                let mut exprs = Vec::with_capacity(elements.len());
                for element in elements {
                    let (expr, e_entry, e_exit) = self.compile(rule, element);
                    self.epsilon(exit, e_entry);
                    exit = e_exit;
                    exprs.push(expr);
                }
                (Expr::Seq(exprs), entry, exit)
            }
            Element::Choice(alternatives) => {
                let start = self.atn.add_state(StateKind::BlockStart, rule);
                let end = self.atn.add_state(StateKind::BlockEnd, rule);
                let mut exprs = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    let (expr, a_entry, a_exit) = self.compile(rule, alternative);
                    self.epsilon(start, a_entry);
                    self.epsilon(a_exit, end);
                    exprs.push(expr);
                }
                (Expr::Choice(exprs), start, end)
            }
            Element::Optional(inner) => {
                let start = self.atn.add_state(StateKind::BlockStart, rule);
                let end = self.atn.add_state(StateKind::BlockEnd, rule);
                let (expr, i_entry, i_exit) = self.compile(rule, inner);
                self.epsilon(start, i_entry);
                self.epsilon(i_exit, end);
                self.epsilon(start, end);
                (Expr::Optional(Box::new(expr)), start, end)
            }
            Element::ZeroOrMore(inner) => {
                let entry = self.atn.add_state(StateKind::LoopEntry, rule);
                let end = self.atn.add_state(StateKind::BlockEnd, rule);
                let (expr, i_entry, i_exit) = self.compile(rule, inner);
                self.epsilon(entry, i_entry);
                self.epsilon(i_exit, entry);
                self.epsilon(entry, end);
                (Expr::ZeroOrMore(Box::new(expr)), entry, end)
            }
            Element::OneOrMore(inner) => {
                let (expr, i_entry, i_exit) = self.compile(rule, inner);
                let back = self.atn.add_state(StateKind::LoopEntry, rule);
                let end = self.atn.add_state(StateKind::BlockEnd, rule);
                self.epsilon(i_exit, back);
                self.epsilon(back, i_entry);
                self.epsilon(back, end);
                (Expr::OneOrMore(Box::new(expr)), i_entry, end)
            }
            Element::Gated(extension, inner) => {
                let entry = self.atn.add_state(StateKind::Basic, rule);
                let (expr, i_entry, i_exit) = self.compile(rule, inner);
                self.atn.add_transition(
                    entry,
                    Transition::Predicate {
                        target: i_entry,
                        extension: *extension,
                    },
                );
                (Expr::Gated(*extension, Box::new(expr)), entry, i_exit)
            }
        }
    }
}
