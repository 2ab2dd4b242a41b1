// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module defines the types used to describe catalog contents: tables,
//! their columns and column data types. Catalog providers produce these, and
//! the semantic layer turns them into resolvable database objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SQL data types (unified across dialects)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataType {
    // Numeric types
    Integer,
    BigInt,
    SmallInt,
    Decimal,
    Float,
    Double,

    // String types
    Varchar(Option<usize>),
    Char(Option<usize>),
    Text,

    // Date/Time types
    Date,
    Time,
    Timestamp,

    // Boolean
    Boolean,

    // Unknown/Other (with original type name)
    Other(String),
}

impl DataType {
    /// Map a type name as written in DDL to a data type
    ///
    /// `length` is the first parenthesized argument, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlscope_ir::DataType;
    ///
    /// assert_eq!(DataType::from_sql_name("varchar", Some(20)), DataType::Varchar(Some(20)));
    /// assert_eq!(DataType::from_sql_name("INT", None), DataType::Integer);
    /// ```
    pub fn from_sql_name(name: &str, length: Option<usize>) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => DataType::Integer,
            "BIGINT" => DataType::BigInt,
            "SMALLINT" => DataType::SmallInt,
            "DECIMAL" | "NUMERIC" | "DEC" => DataType::Decimal,
            "FLOAT" | "REAL" => DataType::Float,
            "DOUBLE" => DataType::Double,
            "VARCHAR" => DataType::Varchar(length),
            "CHAR" | "CHARACTER" => DataType::Char(length),
            "TEXT" => DataType::Text,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "TIMESTAMP" | "DATETIME" => DataType::Timestamp,
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            _ => DataType::Other(name.to_string()),
        }
    }

    /// Whether values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Integer
                | DataType::BigInt
                | DataType::SmallInt
                | DataType::Decimal
                | DataType::Float
                | DataType::Double
        )
    }

    /// Whether values of this type are character strings
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::Varchar(_) | DataType::Char(_) | DataType::Text)
    }

    /// Whether values of this type are dates or times
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::Timestamp)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => f.write_str("INTEGER"),
            DataType::BigInt => f.write_str("BIGINT"),
            DataType::SmallInt => f.write_str("SMALLINT"),
            DataType::Decimal => f.write_str("DECIMAL"),
            DataType::Float => f.write_str("FLOAT"),
            DataType::Double => f.write_str("DOUBLE"),
            DataType::Varchar(Some(n)) => write!(f, "VARCHAR({n})"),
            DataType::Varchar(None) => f.write_str("VARCHAR"),
            DataType::Char(Some(n)) => write!(f, "CHAR({n})"),
            DataType::Char(None) => f.write_str("CHAR"),
            DataType::Text => f.write_str("TEXT"),
            DataType::Date => f.write_str("DATE"),
            DataType::Time => f.write_str("TIME"),
            DataType::Timestamp => f.write_str("TIMESTAMP"),
            DataType::Boolean => f.write_str("BOOLEAN"),
            DataType::Other(name) => f.write_str(name),
        }
    }
}

/// Table type classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    Table,
    View,
    MaterializedView,
    Temporary,
    System,
    Other(String),
}

/// Metadata for a database column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Whether the column is nullable
    pub nullable: bool,
    /// Whether this is a primary key column
    #[serde(default)]
    pub is_primary_key: bool,
    /// Column comment/description
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column metadata with builder pattern
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_primary_key: false,
            comment: None,
        }
    }

    /// Builder method: set nullable
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Builder method: mark as primary key
    pub fn with_primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    /// Builder method: set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Metadata for a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name
    pub name: String,
    /// Schema name
    pub schema: String,
    /// Catalog (database) name, when the source distinguishes catalogs
    #[serde(default)]
    pub catalog: Option<String>,
    /// Column definitions
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    /// Table type (TABLE, VIEW, MATERIALIZED VIEW, etc.)
    pub table_type: TableType,
}

impl TableMetadata {
    /// Create new table metadata with builder pattern
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            catalog: None,
            columns: Vec::new(),
            table_type: TableType::Table,
        }
    }

    /// Builder method: set catalog
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Builder method: add columns
    pub fn with_columns(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.columns = columns;
        self
    }

    /// Builder method: set table type
    pub fn with_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// Get column by name, ignoring case
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether this table is a view of any kind
    pub fn is_view(&self) -> bool {
        matches!(
            self.table_type,
            TableType::View | TableType::MaterializedView
        )
    }
}
