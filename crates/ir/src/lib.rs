// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Shared vocabulary
//!
//! This crate holds the types every other sqlscope crate agrees on:
//! - SQL dialects with their reserved words, quoting rules and identifier
//!   canonicalization
//! - Half-open source intervals shared by the parser and the semantic model
//! - Catalog metadata (tables, columns, data types) as delivered by catalog
//!   providers

pub mod dialect;
pub mod interval;
pub mod metadata;

// Re-export commonly used types
pub use dialect::{Dialect, DialectExtensions, DialectFamily, IdentifierCase, UnknownDialect};
pub use interval::Interval;
pub use metadata::{ColumnMetadata, DataType, TableMetadata, TableType};
