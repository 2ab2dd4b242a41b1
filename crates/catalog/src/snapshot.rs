// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog snapshot
//!
//! A synchronous, in-memory view of a catalog. Recognition runs without
//! awaiting, so the metadata it may consult is fetched once through the
//! async [`Catalog`] trait and kept here as [`DatabaseObject`] chains.

use std::sync::Arc;

use sqlscope_ir::TableMetadata;

use crate::error::{CatalogError, CatalogResult};
use crate::object::{DatabaseObject, ObjectKind};
use crate::r#trait::Catalog;

#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    catalogs: Vec<Arc<DatabaseObject>>,
    schemas: Vec<Arc<DatabaseObject>>,
    tables: Vec<Arc<DatabaseObject>>,
    default_schema: Option<String>,
}

impl CatalogSnapshot {
    /// Fetch every table of `catalog`, filling in missing column lists
    pub async fn load(catalog: &dyn Catalog) -> CatalogResult<Self> {
        let mut tables = catalog.list_tables().await?;
        for table in tables.iter_mut().filter(|t| t.columns.is_empty()) {
            match catalog.get_columns(&table.name).await {
                Ok(columns) => table.columns = columns,
                Err(err) => {
                    tracing::warn!(table = %table.name, error = %err, "Failed to fetch table columns")
                }
            }
        }
        let snapshot = Self::from_tables(tables).with_default_schema(catalog.default_schema());
        tracing::debug!(
            tables = snapshot.tables.len(),
            schemas = snapshot.schemas.len(),
            "Loaded catalog snapshot"
        );
        Ok(snapshot)
    }

    /// Build the object hierarchy from table metadata
    pub fn from_tables(tables: Vec<TableMetadata>) -> Self {
        let mut snapshot = Self::default();
        for table in tables {
            let catalog = table.catalog.as_deref().map(|name| snapshot.catalog_object(name));
            let schema = snapshot.schema_object(&table.schema, catalog);
            let is_view = table.is_view();
            snapshot.tables.push(DatabaseObject::table(
                table.name,
                Some(schema),
                table.columns,
                is_view,
            ));
        }
        snapshot
    }

    /// Builder method: schema searched first for unqualified names
    pub fn with_default_schema(mut self, schema: Option<String>) -> Self {
        self.default_schema = schema;
        self
    }

    fn catalog_object(&mut self, name: &str) -> Arc<DatabaseObject> {
        if let Some(existing) = self.catalogs.iter().find(|c| c.name() == name) {
            return Arc::clone(existing);
        }
        let object = DatabaseObject::catalog(name);
        self.catalogs.push(Arc::clone(&object));
        object
    }

    fn schema_object(&mut self, name: &str, catalog: Option<Arc<DatabaseObject>>) -> Arc<DatabaseObject> {
        let catalog_name = catalog.as_ref().map(|c| c.name().to_string());
        if let Some(existing) = self.schemas.iter().find(|s| {
            s.name() == name && s.parent().map(|p| p.name().to_string()) == catalog_name
        }) {
            return Arc::clone(existing);
        }
        let object = DatabaseObject::schema(name, catalog);
        self.schemas.push(Arc::clone(&object));
        object
    }

    pub fn tables(&self) -> &[Arc<DatabaseObject>] {
        &self.tables
    }

    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Find the object named by a one to three part path
    ///
    /// A single name is looked up as a table (preferring the default
    /// schema), then as a schema, then as a catalog. Two parts name a table
    /// in a schema or a schema in a catalog; three parts a fully qualified
    /// table. Matching ignores ASCII case. Paths longer than three parts
    /// resolve to nothing.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an empty path, `AmbiguousObject` when an unqualified
    /// table name exists in several schemas and none is the default.
    pub fn find_real_object(&self, parts: &[String]) -> CatalogResult<Option<Arc<DatabaseObject>>> {
        match parts {
            [] => Err(CatalogError::InvalidName(String::new())),
            [name] => self.find_unqualified(name),
            [container, name] => Ok(self
                .find_table(Some(container.as_str()), None, name)
                .or_else(|| self.find_schema(Some(container.as_str()), name))),
            [catalog, schema, name] => {
                Ok(self.find_table(Some(schema.as_str()), Some(catalog.as_str()), name))
            }
            _ => Ok(None),
        }
    }

    fn find_unqualified(&self, name: &str) -> CatalogResult<Option<Arc<DatabaseObject>>> {
        let candidates: Vec<&Arc<DatabaseObject>> = self
            .tables
            .iter()
            .filter(|t| t.name().eq_ignore_ascii_case(name))
            .collect();
        if let Some(default) = &self.default_schema {
            let preferred = candidates
                .iter()
                .find(|t| t.parent().is_some_and(|s| s.name().eq_ignore_ascii_case(default)));
            if let Some(table) = preferred {
                return Ok(Some(Arc::clone(table)));
            }
        }
        match candidates.as_slice() {
            [] => Ok(self.find_schema(None, name).or_else(|| {
                self.catalogs
                    .iter()
                    .find(|c| c.name().eq_ignore_ascii_case(name))
                    .cloned()
            })),
            [table] => Ok(Some(Arc::clone(table))),
            _ => Err(CatalogError::AmbiguousObject(name.to_string())),
        }
    }

    fn find_table(&self, schema: Option<&str>, catalog: Option<&str>, name: &str) -> Option<Arc<DatabaseObject>> {
        self.tables
            .iter()
            .find(|t| {
                t.name().eq_ignore_ascii_case(name)
                    && names_match(t.ancestor(ObjectKind::Schema), schema)
                    && names_match(t.ancestor(ObjectKind::Catalog), catalog)
            })
            .cloned()
    }

    fn find_schema(&self, catalog: Option<&str>, name: &str) -> Option<Arc<DatabaseObject>> {
        self.schemas
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name) && names_match(s.parent(), catalog))
            .cloned()
    }
}

/// `expected = None` accepts any container
fn names_match(object: Option<&Arc<DatabaseObject>>, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => object.is_some_and(|o| o.name().eq_ignore_ascii_case(expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_ir::{ColumnMetadata, DataType};

    fn parts(path: &[&str]) -> Vec<String> {
        path.iter().map(|p| p.to_string()).collect()
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_tables(vec![
            TableMetadata::new("users", "public")
                .with_catalog("app")
                .with_columns(vec![ColumnMetadata::new("id", DataType::Integer)]),
            TableMetadata::new("users", "audit").with_catalog("app"),
            TableMetadata::new("events", "audit").with_catalog("app"),
        ])
    }

    #[test]
    fn test_find_by_full_path() {
        let snapshot = snapshot();
        let table = snapshot
            .find_real_object(&parts(&["APP", "Public", "USERS"]))
            .unwrap()
            .unwrap();
        assert_eq!(table.path(), vec!["app", "public", "users"]);
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn test_two_parts_prefer_tables_then_schemas() {
        let snapshot = snapshot();
        let table = snapshot.find_real_object(&parts(&["audit", "events"])).unwrap().unwrap();
        assert_eq!(table.kind(), ObjectKind::Table);
        let schema = snapshot.find_real_object(&parts(&["app", "audit"])).unwrap().unwrap();
        assert_eq!(schema.kind(), ObjectKind::Schema);
    }

    #[test]
    fn test_unqualified_names() {
        let snapshot = snapshot();
        assert!(matches!(
            snapshot.find_real_object(&parts(&["users"])),
            Err(CatalogError::AmbiguousObject(_))
        ));
        let events = snapshot.find_real_object(&parts(&["events"])).unwrap().unwrap();
        assert_eq!(events.name(), "events");
        let schema = snapshot.find_real_object(&parts(&["public"])).unwrap().unwrap();
        assert_eq!(schema.kind(), ObjectKind::Schema);
        let catalog = snapshot.find_real_object(&parts(&["app"])).unwrap().unwrap();
        assert_eq!(catalog.kind(), ObjectKind::Catalog);
        assert!(snapshot.find_real_object(&parts(&["nothing"])).unwrap().is_none());
    }

    #[test]
    fn test_default_schema_disambiguates() {
        let snapshot = snapshot().with_default_schema(Some("public".into()));
        let users = snapshot.find_real_object(&parts(&["users"])).unwrap().unwrap();
        assert_eq!(users.path(), vec!["app", "public", "users"]);
    }

    #[test]
    fn test_invalid_paths() {
        let snapshot = snapshot();
        assert!(matches!(snapshot.find_real_object(&[]), Err(CatalogError::InvalidName(_))));
        assert!(snapshot
            .find_real_object(&parts(&["a", "b", "c", "d"]))
            .unwrap()
            .is_none());
    }
}
