// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - SQL grammar
//!
//! Lexer, grammar rules and parser for the statements sqlscope analyzes.
//!
//! ## Overview
//!
//! - [`token`]/[`lexer`]: token vocabulary and a lexer that never fails
//! - [`rules`]: the grammar, one [`RuleKind`] per rule
//! - [`atn`]: the grammar compiled to an augmented transition network, used
//!   for keyword prediction
//! - [`parser`]: an error-tolerant parser producing a [`SyntaxTree`] whose
//!   nodes point into the ATN
//!
//! ## Usage
//!
//! ```rust
//! use sqlscope_grammar::{RuleKind, SqlParser};
//! use sqlscope_ir::Dialect;
//!
//! let tree = SqlParser::new(Dialect::PostgreSQL)
//!     .parse("SELECT id FROM users")
//!     .unwrap();
//! let refs = tree.expand_subtree(tree.root(), None, &[RuleKind::ColumnReference]);
//! assert_eq!(tree.text(refs[0]), "id");
//! ```

pub mod atn;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod rules;
pub mod token;
pub mod tree;

pub use atn::{Atn, AtnState, Matcher, StateId, StateKind, Transition};
pub use error::{GrammarError, GrammarResult};
pub use grammar::{sql_grammar, SqlGrammar};
pub use lexer::{tokenize, Lexer};
pub use parser::{SqlParser, DEFAULT_MAX_DEPTH};
pub use rules::{Element, RuleKind};
pub use token::{Token, TokenKind};
pub use tree::{NodeId, NodeKind, SyntaxTree};
