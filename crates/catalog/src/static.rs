// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! This module provides a static catalog implementation that uses predefined schema data.
//!
//! ## Usage
//!
//! ```rust
//! use sqlscope_catalog::{Catalog, StaticCatalog};
//!
//! # tokio_test::block_on(async {
//! let catalog = StaticCatalog::playground();
//! let tables = catalog.list_tables().await.unwrap();
//! assert_eq!(tables.len(), 3);
//! # });
//! ```

use async_trait::async_trait;

use sqlscope_ir::{ColumnMetadata, DataType, TableMetadata};

use crate::{Catalog, CatalogError, CatalogResult};

/// Static catalog with predefined schema data
///
/// This is used for the command line tool and testing without requiring a real database.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: Vec<TableMetadata>,
    default_schema: Option<String>,
}

impl StaticCatalog {
    pub fn new(tables: Vec<TableMetadata>) -> Self {
        Self {
            tables,
            default_schema: None,
        }
    }

    /// Builder method: set the default schema
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Load table definitions from a JSON array of table metadata
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let tables: Vec<TableMetadata> = serde_json::from_str(json)?;
        Ok(Self::new(tables))
    }

    /// A small shop schema: users, orders and order items
    pub fn playground() -> Self {
        let users = TableMetadata::new("users", "playground").with_columns(vec![
            ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
            ColumnMetadata::new("name", DataType::Varchar(Some(100)))
                .with_nullable(false)
                .with_comment("User name"),
            ColumnMetadata::new("email", DataType::Varchar(Some(255)))
                .with_nullable(false)
                .with_comment("User email address"),
            ColumnMetadata::new("created_at", DataType::Timestamp),
        ]);
        let orders = TableMetadata::new("orders", "playground").with_columns(vec![
            ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
            ColumnMetadata::new("user_id", DataType::Integer)
                .with_nullable(false)
                .with_comment("Foreign key to users.id"),
            ColumnMetadata::new("total", DataType::Decimal).with_nullable(false),
            ColumnMetadata::new("status", DataType::Varchar(Some(20))),
            ColumnMetadata::new("created_at", DataType::Timestamp),
        ]);
        let order_items = TableMetadata::new("order_items", "playground").with_columns(vec![
            ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
            ColumnMetadata::new("order_id", DataType::Integer).with_nullable(false),
            ColumnMetadata::new("product_name", DataType::Varchar(Some(255))).with_nullable(false),
            ColumnMetadata::new("quantity", DataType::Integer).with_nullable(false),
            ColumnMetadata::new("price", DataType::Decimal).with_nullable(false),
        ]);
        Self::new(vec![users, orders, order_items]).with_default_schema("playground")
    }

    /// Find a table by `name` or `schema.name`
    fn table(&self, qualified: &str) -> Option<&TableMetadata> {
        let (schema, name) = match qualified.split_once('.') {
            Some((schema, name)) => (Some(schema), name),
            None => (None, qualified),
        };
        self.tables.iter().find(|t| {
            t.name.eq_ignore_ascii_case(name)
                && schema.is_none_or(|s| t.schema.eq_ignore_ascii_case(s))
        })
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Ok(self.tables.clone())
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.table(table).map(|t| t.columns.clone()).ok_or_else(|| {
            CatalogError::TableNotFound(
                table.to_string(),
                self.default_schema.clone().unwrap_or_default(),
            )
        })
    }

    fn default_schema(&self) -> Option<String> {
        self.default_schema.clone()
    }
}
