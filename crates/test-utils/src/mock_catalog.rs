// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog implementation for testing
//!
//! Provides an in-memory catalog with builder pattern for easy test setup

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlscope_catalog::{Catalog, CatalogError, CatalogResult, CatalogSnapshot};
use sqlscope_ir::{ColumnMetadata, DataType, TableMetadata, TableType};

/// In-memory mock catalog for testing
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    tables: BTreeMap<String, TableMetadata>,
    default_schema: Option<String>,
    failure: Option<String>,
}

impl MockCatalog {
    /// Create a new empty mock catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the catalog
    pub fn add_table(mut self, table: TableMetadata) -> Self {
        let key = format!("{}.{}", table.schema, table.name);
        self.tables.insert(key, table);
        self
    }

    /// Get a table by name (any schema)
    pub fn get_table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.values().find(|t| t.name == name)
    }

    /// Every call fails with `QueryFailed(message)`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn check(&self) -> CatalogResult<()> {
        match &self.failure {
            Some(message) => Err(CatalogError::QueryFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Catalog for MockCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        self.check()?;
        // column lists are served lazily through get_columns
        Ok(self
            .tables
            .values()
            .map(|table| TableMetadata {
                columns: Vec::new(),
                ..table.clone()
            })
            .collect())
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.check()?;
        match self.get_table(table) {
            Some(metadata) => Ok(metadata.columns.clone()),
            None => Err(CatalogError::TableNotFound(table.to_string(), "mock".to_string())),
        }
    }

    fn default_schema(&self) -> Option<String> {
        self.default_schema.clone()
    }
}

/// Builder for creating mock catalogs with a fluent API
#[derive(Debug, Default)]
pub struct MockCatalogBuilder {
    catalog: MockCatalog,
}

impl MockCatalogBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the standard test schema: `myapp.users`, `myapp.orders` and
    /// `myapp.products`
    pub fn with_standard_schema(mut self) -> Self {
        self.catalog = self
            .catalog
            .add_table(TableMetadata::new("users", "myapp").with_columns(vec![
                ColumnMetadata::new("id", DataType::BigInt)
                    .with_nullable(false)
                    .with_primary_key(),
                ColumnMetadata::new("email", DataType::Varchar(Some(255))).with_nullable(false),
                ColumnMetadata::new("name", DataType::Varchar(Some(100))),
                ColumnMetadata::new("created_at", DataType::Timestamp),
            ]))
            .add_table(
                TableMetadata::new("orders", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt)
                            .with_nullable(false)
                            .with_primary_key(),
                        ColumnMetadata::new("user_id", DataType::BigInt).with_nullable(false),
                        ColumnMetadata::new("total", DataType::Decimal),
                        ColumnMetadata::new("status", DataType::Varchar(Some(50))).with_nullable(false),
                        ColumnMetadata::new("created_at", DataType::Timestamp),
                    ])
                    .with_type(TableType::Table),
            )
            .add_table(TableMetadata::new("products", "myapp").with_columns(vec![
                ColumnMetadata::new("id", DataType::BigInt)
                    .with_nullable(false)
                    .with_primary_key(),
                ColumnMetadata::new("name", DataType::Varchar(Some(255))).with_nullable(false),
                ColumnMetadata::new("price", DataType::Decimal).with_nullable(false),
                ColumnMetadata::new("stock", DataType::Integer),
            ]));
        self.catalog.default_schema = Some("myapp".to_string());
        self
    }

    /// Add a table with text columns
    pub fn with_table(mut self, schema: &str, name: &str, columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .map(|column| ColumnMetadata::new(*column, DataType::Text))
            .collect();
        self.catalog = self
            .catalog
            .add_table(TableMetadata::new(name, schema).with_columns(columns));
        self
    }

    /// Add a view with text columns
    pub fn with_view(mut self, schema: &str, name: &str, columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .map(|column| ColumnMetadata::new(*column, DataType::Text))
            .collect();
        self.catalog = self.catalog.add_table(
            TableMetadata::new(name, schema)
                .with_columns(columns)
                .with_type(TableType::View),
        );
        self
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.catalog.default_schema = Some(schema.into());
        self
    }

    /// Build the catalog
    pub fn build(self) -> MockCatalog {
        self.catalog
    }

    /// Build a snapshot of the catalog without going through the async API
    pub fn snapshot(self) -> Arc<CatalogSnapshot> {
        let default_schema = self.catalog.default_schema.clone();
        let tables = self.catalog.tables.into_values().collect();
        Arc::new(CatalogSnapshot::from_tables(tables).with_default_schema(default_schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_catalog_builder() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();

        let tables = catalog.list_tables().await.unwrap();
        assert_eq!(tables.len(), 3);
        assert!(tables.iter().all(|t| t.columns.is_empty()));

        let columns = catalog.get_columns("users").await.unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(catalog.default_schema().as_deref(), Some("myapp"));
    }

    #[tokio::test]
    async fn test_mock_catalog_table_not_found() {
        let catalog = MockCatalog::new();
        let result = catalog.get_columns("nonexistent").await;
        assert!(matches!(result, Err(CatalogError::TableNotFound(_, _))));
    }

    #[tokio::test]
    async fn test_failing_catalog() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build().failing("offline");
        assert_eq!(
            catalog.list_tables().await,
            Err(CatalogError::QueryFailed("offline".to_string()))
        );
    }

    #[tokio::test]
    async fn test_snapshot_load_fills_columns() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();
        let snapshot = CatalogSnapshot::load(&catalog).await.unwrap();
        let orders = snapshot
            .find_real_object(&["orders".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(orders.columns().len(), 5);
    }

    #[test]
    fn test_snapshot_shortcut() {
        let snapshot = MockCatalogBuilder::new()
            .with_table("public", "t", &["a", "b"])
            .with_view("public", "v", &["a"])
            .snapshot();
        assert_eq!(snapshot.tables().len(), 2);
        let view = snapshot.find_real_object(&["v".to_string()]).unwrap().unwrap();
        assert!(view.is_table_like());
    }
}
