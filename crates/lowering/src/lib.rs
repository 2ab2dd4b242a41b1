// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Query Model Recognition
//!
//! This crate turns the syntax tree of one SQL statement into a [`Model`]:
//! the statement's row sources and expressions, a symbol table classifying
//! every identifier, and lexical scopes recording what is visible where.
//!
//! ## Overview
//!
//! Recognition runs in three steps:
//!
//! ```text
//! SyntaxTree → build (TreeMapper) → propagate symbols → Model
//! ```
//!
//! - **Build**: rule-specific translations fold the tree bottom-up into
//!   row source models; value expressions are collected into a flattened
//!   form that keeps only what name resolution needs.
//! - **Propagate**: names are resolved top-down against CTEs, the sources
//!   of enclosing queries and the data context.
//! - **Fallback**: when the statement cannot be recognized structurally,
//!   identifiers are still classified by their syntactic position.
//!
//! ## Data context
//!
//! With a [`sqlscope_catalog::CatalogSnapshot`] attached and metadata
//! reading enabled, tables and columns resolve to catalog objects and
//! unresolved names become problems. Without one, a dummy context built
//! from the names in the statement stands in and no such problems are
//! reported.
//!
//! ## Usage
//!
//! ```
//! use sqlscope_ir::Dialect;
//! use sqlscope_lowering::{recognize, ModelContent, RecognitionContext, RecognitionSettings};
//!
//! let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::MySQL));
//! let model = recognize("DELETE FROM users WHERE id = 1", &mut ctx).unwrap();
//! assert!(matches!(model.content(), Some(ModelContent::Delete(_))));
//! ```

pub mod context;
pub mod error;
pub mod model;
mod propagate;
pub mod recognizer;
mod rows;
mod statements;
pub mod tree_mapper;
mod values;

pub use context::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PROBLEMS, RecognitionContext, RecognitionSettings};
pub use error::{LoweringError, LoweringResult};
pub use model::{
    AlterColumnAction, AlterTableModel, ColumnChange, ColumnDefinition, ConstantKind, CreateTableModel, CteSubquery,
    DeleteModel, DropModel, DroppedObject, Filter, Filters, ForeignReference, InsertModel, Model, ModelContent,
    ProjectionModel, RowsSourceKind, RowsSourceModel, SelectItem, SetClause, SetOperationKind, UpdateModel,
    ValueExpression, ValueExpressionKind, VariableKind,
};
pub use recognizer::{QueryModelRecognizer, recognize, string_literal_fallback};
pub use tree_mapper::{Translation, TreeMapper};
