// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Database objects
//!
//! Resolved catalog objects linked to their containers: a column's parent is
//! its table, a table's parent its schema, a schema's parent its catalog.
//! Semantic symbols point at these objects once a name is resolved.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use sqlscope_ir::{ColumnMetadata, DataType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    Catalog,
    Schema,
    Table,
    View,
    Column,
}

/// A named object in a catalog hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseObject {
    kind: ObjectKind,
    name: String,
    parent: Option<Arc<DatabaseObject>>,
    columns: Vec<ColumnMetadata>,
    data_type: Option<DataType>,
}

impl DatabaseObject {
    fn new(kind: ObjectKind, name: impl Into<String>, parent: Option<Arc<DatabaseObject>>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
            columns: Vec::new(),
            data_type: None,
        }
    }

    pub fn catalog(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(ObjectKind::Catalog, name, None))
    }

    pub fn schema(name: impl Into<String>, catalog: Option<Arc<DatabaseObject>>) -> Arc<Self> {
        Arc::new(Self::new(ObjectKind::Schema, name, catalog))
    }

    /// A table, or a view when `is_view` is set
    pub fn table(
        name: impl Into<String>,
        schema: Option<Arc<DatabaseObject>>,
        columns: Vec<ColumnMetadata>,
        is_view: bool,
    ) -> Arc<Self> {
        let kind = if is_view { ObjectKind::View } else { ObjectKind::Table };
        let mut object = Self::new(kind, name, schema);
        object.columns = columns;
        Arc::new(object)
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<DatabaseObject>> {
        self.parent.as_ref()
    }

    /// Tables and views both provide rows
    pub fn is_table_like(&self) -> bool {
        matches!(self.kind, ObjectKind::Table | ObjectKind::View)
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    /// Names from the outermost container down to this object
    pub fn path(&self) -> Vec<&str> {
        let mut path = vec![self.name.as_str()];
        let mut current = self.parent.as_deref();
        while let Some(object) = current {
            path.push(object.name.as_str());
            current = object.parent.as_deref();
        }
        path.reverse();
        path
    }

    /// Nearest container of the given kind
    pub fn ancestor(&self, kind: ObjectKind) -> Option<&Arc<DatabaseObject>> {
        let mut current = self.parent.as_ref();
        while let Some(object) = current {
            if object.kind == kind {
                return Some(object);
            }
            current = object.parent.as_ref();
        }
        None
    }

    /// Column object of a table, matched case-insensitively
    pub fn column(self: &Arc<Self>, name: &str) -> Option<Arc<DatabaseObject>> {
        let column = self
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))?;
        let mut object = Self::new(ObjectKind::Column, column.name.clone(), Some(Arc::clone(self)));
        object.data_type = Some(column.data_type.clone());
        Some(Arc::new(object))
    }
}

impl fmt::Display for DatabaseObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path().join("."))
    }
}
