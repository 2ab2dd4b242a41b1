// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the catalog crate

use sqlscope_catalog::{Catalog, CatalogError, CatalogResult, CatalogSnapshot, ObjectKind};
use sqlscope_ir::{ColumnMetadata, DataType, TableMetadata, TableType};

// Lists tables without columns, so snapshots must ask for them separately
struct TestCatalog;

#[async_trait::async_trait]
impl Catalog for TestCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Ok(vec![
            TableMetadata::new("users", "myapp"),
            TableMetadata::new("orders", "myapp"),
            TableMetadata::new("active_users", "myapp").with_type(TableType::View),
        ])
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        match table {
            "users" => Ok(vec![
                ColumnMetadata::new("id", DataType::BigInt).with_primary_key(),
                ColumnMetadata::new("email", DataType::Varchar(Some(255))).with_nullable(false),
            ]),
            "orders" => Ok(vec![
                ColumnMetadata::new("id", DataType::BigInt).with_primary_key(),
                ColumnMetadata::new("user_id", DataType::BigInt).with_nullable(false),
            ]),
            _ => Err(CatalogError::TableNotFound(table.to_string(), "myapp".to_string())),
        }
    }

    fn default_schema(&self) -> Option<String> {
        Some("myapp".to_string())
    }
}

struct BrokenCatalog;

#[async_trait::async_trait]
impl Catalog for BrokenCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Err(CatalogError::QueryFailed("connection reset".into()))
    }

    async fn get_columns(&self, _table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        Ok(Vec::new())
    }
}

fn name(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn test_snapshot_fetches_missing_columns() {
    let snapshot = CatalogSnapshot::load(&TestCatalog).await.unwrap();
    assert_eq!(snapshot.tables().len(), 3);
    assert_eq!(snapshot.default_schema(), Some("myapp"));

    let users = snapshot.find_real_object(&name(&["users"])).unwrap().unwrap();
    assert_eq!(users.columns().len(), 2);
    assert!(users.column("EMAIL").is_some());
}

#[tokio::test]
async fn test_snapshot_keeps_tables_whose_columns_fail() {
    let snapshot = CatalogSnapshot::load(&TestCatalog).await.unwrap();
    let view = snapshot
        .find_real_object(&name(&["myapp", "active_users"]))
        .unwrap()
        .unwrap();
    assert_eq!(view.kind(), ObjectKind::View);
    assert!(view.is_table_like());
    assert!(view.columns().is_empty());
}

#[tokio::test]
async fn test_snapshot_load_propagates_provider_errors() {
    let result = CatalogSnapshot::load(&BrokenCatalog).await;
    assert_eq!(
        result.unwrap_err(),
        CatalogError::QueryFailed("connection reset".into())
    );
}

#[test]
fn test_catalog_error_serializes() {
    let err = CatalogError::TableNotFound("t".into(), "s".into());
    assert_eq!(err.to_string(), "Table 't' not found in schema 's'");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["TableNotFound"][0], "t");
}
