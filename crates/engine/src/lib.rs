// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Document Engine
//!
//! This crate keeps the statements of an edited SQL document recognized.
//!
//! ## Overview
//!
//! - [`DocumentSyntaxContext`]: offset-keyed index of recognized statements
//!   with cached lookups, delta application and listener notification
//! - [`ScriptItemSyntaxContext`]: one recognized statement with its token
//!   index
//! - [`DocumentAnalyzer`]: owns the document text, splits it into
//!   statements and re-recognizes what an edit touched
//! - [`EngineConfig`]: recognition settings read from client settings
//!
//! ## Example
//!
//! ```
//! use sqlscope_engine::{DocumentAnalyzer, EngineConfig};
//! use sqlscope_ir::Dialect;
//!
//! let mut analyzer = DocumentAnalyzer::new(EngineConfig::for_dialect(Dialect::MySQL));
//! analyzer.set_text("SELECT id FROM users; SELECT ");
//!
//! // complete after the second SELECT
//! let prediction = analyzer.complete_keywords_at(29);
//! assert!(prediction.expecting_column_reference);
//!
//! // a typed insertion shifts and re-recognizes the second statement
//! analyzer.apply_edit(29, 0, "name FROM users").unwrap();
//! assert_eq!(analyzer.token_at(29).unwrap().name, "name");
//! ```

pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod listener;
pub mod offset_map;
pub mod script_item;

pub use analyzer::{DocumentAnalyzer, StatementReport, StatementSpan, TokenInfo, split_statements};
pub use config::{ConfigError, EngineConfig, SETTINGS_SECTION};
pub use document::{DocumentSyntaxContext, ScriptItemAtOffset, TextRegion, TokenAtOffset};
pub use error::{DocumentError, DocumentResult};
pub use listener::ScriptItemListener;
pub use offset_map::OffsetMap;
pub use script_item::{ScriptItemSyntaxContext, ScriptToken};
