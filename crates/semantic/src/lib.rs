// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Semantic primitives
//!
//! The building blocks the query model recognizer registers names into.
//!
//! ## Overview
//!
//! - **Symbol table**: [`SymbolTable`] is an arena of [`SymbolEntry`]
//!   occurrences and the [`Symbol`]s they share. A symbol is classified
//!   once; merging two symbols unions their entries.
//! - **Qualified names**: multi-part names resolved against catalog objects
//!   or through other names (aliases, CTEs).
//! - **Lexical scopes**: interval-scoped sets of names, opened and closed in
//!   stack order while a statement is recognized.
//! - **Data contexts**: catalog lookup ([`QueryDataContext`], real or dummy)
//!   and the sources visible inside a query ([`SourcesContext`]).
//! - **Problems**: soft diagnostics collected per statement.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sqlscope_semantic::{DummyDataContext, QueryDataContext, SourcesContext};
//! use sqlscope_ir::Dialect;
//!
//! let dummy = DummyDataContext::new(
//!     vec!["id".to_string()],
//!     vec![vec!["users".to_string()]],
//! );
//! let data = Arc::new(QueryDataContext::dummy(Dialect::Standard, dummy));
//! let users = data.find_real_table(&["users".to_string()]).unwrap().unwrap();
//! assert_eq!(users.columns()[0].name, "id");
//!
//! let context = SourcesContext::new(data);
//! assert!(context.sources().is_empty());
//! ```

pub mod data_context;
pub mod error;
pub mod problem;
pub mod qualified_name;
pub mod scope;
pub mod symbol;

pub use data_context::{
    ColumnLookup, CteSource, DummyDataContext, QueryDataContext, ResultColumn, RowsSource, SourcesContext,
    DUMMY_CATALOG, DUMMY_SCHEMA,
};
pub use error::{SemanticError, SemanticResult};
pub use problem::{ProblemCollector, ProblemSeverity, RecognitionProblem};
pub use qualified_name::{QualifiedName, QualifiedNameId};
pub use scope::{LexicalScope, LexicalScopes, ScopeId, ScopeItem};
pub use symbol::{Symbol, SymbolClass, SymbolDefinition, SymbolEntry, SymbolEntryId, SymbolId, SymbolTable};
