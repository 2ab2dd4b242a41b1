// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Completion Context
//!
//! This crate predicts the reserved words that may appear at a position of a
//! recognized statement.
//!
//! ## Overview
//!
//! A [`CompletionScope`] pairs a state of the grammar's transition network
//! with the stack of rules entered to reach it. Resolving the scope walks
//! the network and yields a [`KeywordPrediction`]: the dialect's reserved
//! words that can follow, plus flags telling whether a table reference, a
//! column reference or another identifier is expected there.
//!
//! ## Examples
//!
//! ```
//! use sqlscope_context::CompletionScope;
//! use sqlscope_ir::Dialect;
//! use sqlscope_lowering::{recognize, RecognitionContext, RecognitionSettings};
//!
//! let text = "SELECT id FROM users ";
//! let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::MySQL));
//! let model = recognize(text, &mut ctx).unwrap();
//!
//! let scope = CompletionScope::for_keywords_at(&model, text.len(), Dialect::MySQL);
//! assert!(scope.resolve().keywords.iter().any(|k| k == "WHERE"));
//! ```

pub mod completion;

pub use completion::{CompletionScope, KeywordPrediction};
