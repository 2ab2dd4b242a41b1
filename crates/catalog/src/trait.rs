// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait for database schema abstraction
//!
//! This module defines the async Catalog trait used for querying database schema information.

use sqlscope_ir::{ColumnMetadata, TableMetadata};

use crate::error::CatalogResult;

/// Catalog trait for database schema abstraction
///
/// This trait provides an async interface for querying database schema information.
/// Implementations can connect to live databases, read from static files, or use caches.
/// Analysis itself never awaits: a [`crate::CatalogSnapshot`] is loaded from a catalog
/// up front and queried synchronously.
///
/// # Examples
///
/// ```rust
/// use sqlscope_catalog::{Catalog, CatalogError};
///
/// async fn list_user_tables(catalog: &impl Catalog) -> Result<Vec<String>, CatalogError> {
///     let tables = catalog.list_tables().await?;
///     Ok(tables.into_iter()
///         .filter(|t| t.schema == "users")
///         .map(|t| t.name)
///         .collect())
/// }
/// ```
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// List all tables in the database
    ///
    /// Returns metadata for all tables accessible to the current connection,
    /// including views. Column lists may be left empty, in which case they
    /// are fetched through [`Catalog::get_columns`].
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QueryFailed` if the provider cannot answer.
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>>;

    /// Get column metadata for a specific table
    ///
    /// # Arguments
    ///
    /// * `table` - Table name (may include schema qualifier like "schema.table")
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if the table doesn't exist.
    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>>;

    /// Schema that unqualified names resolve against first
    fn default_schema(&self) -> Option<String> {
        None
    }
}
