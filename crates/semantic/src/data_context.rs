// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Data contexts
//!
//! Two layers answer "what does this name refer to":
//!
//! - [`QueryDataContext`] resolves names of catalog objects. It is either
//!   backed by a [`CatalogSnapshot`] or, without metadata, by a dummy
//!   catalog made up from the names the statement itself mentions.
//! - [`SourcesContext`] describes what is visible at one point of a query:
//!   the row sources of the FROM clause with their columns, the result
//!   columns, the CTEs in scope and the enclosing query's context.

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlscope_catalog::{CatalogResult, CatalogSnapshot, DatabaseObject};
use sqlscope_ir::{ColumnMetadata, DataType, Dialect};

use crate::symbol::SymbolEntryId;

pub const DUMMY_CATALOG: &str = "dummyCatalog";
pub const DUMMY_SCHEMA: &str = "dummySchema";

/// Catalog made up from the names found in a statement
///
/// Every known table exists in every known schema of every known catalog,
/// and every table has every known column. This keeps highlighting useful
/// when no metadata is available.
#[derive(Debug, Clone)]
pub struct DummyDataContext {
    catalogs: BTreeSet<String>,
    schemas: BTreeSet<String>,
    tables: BTreeSet<String>,
    columns: Vec<ColumnMetadata>,
}

impl DummyDataContext {
    /// Build from column names and table name paths
    ///
    /// A table path's last part is a table, the one before a schema and the
    /// one before that a catalog.
    pub fn new(
        column_names: impl IntoIterator<Item = String>,
        table_names: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        let mut catalogs = BTreeSet::new();
        let mut schemas = BTreeSet::new();
        let mut tables = BTreeSet::new();
        for path in table_names {
            let mut parts = path.into_iter().rev();
            if let Some(table) = parts.next() {
                tables.insert(table);
            }
            if let Some(schema) = parts.next() {
                schemas.insert(schema);
            }
            if let Some(catalog) = parts.next() {
                catalogs.insert(catalog);
            }
        }
        if catalogs.is_empty() {
            catalogs.insert(DUMMY_CATALOG.to_string());
        }
        if schemas.is_empty() {
            schemas.insert(DUMMY_SCHEMA.to_string());
        }
        let columns = column_names
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|name| ColumnMetadata::new(name, DataType::Text))
            .collect();
        Self {
            catalogs,
            schemas,
            tables,
            columns,
        }
    }

    pub fn default_catalog(&self) -> &str {
        self.catalogs.first().map_or(DUMMY_CATALOG, String::as_str)
    }

    pub fn default_schema(&self) -> &str {
        self.schemas.first().map_or(DUMMY_SCHEMA, String::as_str)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Find a table by its (unquoted) path; missing containers default
    pub fn find_real_table(&self, parts: &[String]) -> Option<Arc<DatabaseObject>> {
        let (table, containers) = parts.split_last()?;
        let mut containers = containers.iter().rev();
        let schema = containers.next().map_or(self.default_schema(), String::as_str);
        let catalog = containers.next().map_or(self.default_catalog(), String::as_str);
        if !(self.tables.contains(table) && self.schemas.contains(schema) && self.catalogs.contains(catalog)) {
            return None;
        }
        let catalog = DatabaseObject::catalog(catalog);
        let schema = DatabaseObject::schema(schema, Some(catalog));
        Some(DatabaseObject::table(table.as_str(), Some(schema), self.columns.clone(), false))
    }
}

#[derive(Debug, Clone)]
enum DataSource {
    Dummy(DummyDataContext),
    Metadata(Arc<CatalogSnapshot>),
}

/// Resolves catalog object names for one statement
#[derive(Debug, Clone)]
pub struct QueryDataContext {
    dialect: Dialect,
    source: DataSource,
}

impl QueryDataContext {
    pub fn dummy(dialect: Dialect, dummy: DummyDataContext) -> Self {
        Self {
            dialect,
            source: DataSource::Dummy(dummy),
        }
    }

    pub fn metadata(dialect: Dialect, snapshot: Arc<CatalogSnapshot>) -> Self {
        Self {
            dialect,
            source: DataSource::Metadata(snapshot),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.source, DataSource::Dummy(_))
    }

    /// Find the object a name path denotes
    ///
    /// Quoted parts are unquoted first. The dummy context only knows tables.
    pub fn find_real_object(&self, parts: &[String]) -> CatalogResult<Option<Arc<DatabaseObject>>> {
        let parts: Vec<String> = parts
            .iter()
            .map(|part| self.dialect.unquote_identifier(part))
            .collect();
        match &self.source {
            DataSource::Dummy(dummy) => Ok(dummy.find_real_table(&parts)),
            DataSource::Metadata(snapshot) => snapshot.find_real_object(&parts),
        }
    }

    /// Like [`Self::find_real_object`], but only tables and views count
    pub fn find_real_table(&self, parts: &[String]) -> CatalogResult<Option<Arc<DatabaseObject>>> {
        Ok(self.find_real_object(parts)?.filter(|o| o.is_table_like()))
    }
}

/// A column visible through a row source or produced by a query
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Canonical name
    pub name: String,
    /// The occurrence that defines the column, when written in the query
    pub entry: Option<SymbolEntryId>,
    /// The catalog column it comes from
    pub object: Option<Arc<DatabaseObject>>,
}

impl ResultColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: None,
            object: None,
        }
    }

    pub fn with_entry(mut self, entry: SymbolEntryId) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_object(mut self, object: Arc<DatabaseObject>) -> Self {
        self.object = Some(object);
        self
    }

    /// Columns of a table object, each pointing at its column object
    pub fn from_table(table: &Arc<DatabaseObject>) -> Vec<ResultColumn> {
        table
            .columns()
            .iter()
            .map(|column| {
                let result = ResultColumn::named(column.name.clone());
                match table.column(&column.name) {
                    Some(object) => result.with_object(object),
                    None => result,
                }
            })
            .collect()
    }
}

/// A row source visible in a FROM clause
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowsSource {
    /// Canonical table name, for sources read from a named table or CTE
    pub name: Option<String>,
    pub name_entry: Option<SymbolEntryId>,
    pub alias: Option<String>,
    pub alias_entry: Option<SymbolEntryId>,
    pub table: Option<Arc<DatabaseObject>>,
    pub columns: Vec<ResultColumn>,
    /// False when the columns are unknown, e.g. the table was not found
    pub resolved: bool,
}

impl RowsSource {
    /// Whether a qualifier such as `u` in `u.id` denotes this source
    ///
    /// An alias hides the table name.
    pub fn matches(&self, qualifier: &str) -> bool {
        match (&self.alias, &self.name) {
            (Some(alias), _) => alias.eq_ignore_ascii_case(qualifier),
            (None, Some(name)) => name.eq_ignore_ascii_case(qualifier),
            (None, None) => false,
        }
    }

    /// The occurrence a qualifier resolves to
    pub fn qualifier_entry(&self) -> Option<SymbolEntryId> {
        self.alias_entry.or(self.name_entry)
    }

    pub fn find_column(&self, name: &str) -> Option<&ResultColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn label(&self) -> &str {
        self.alias
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("<subquery>")
    }
}

/// A common table expression visible in a query
#[derive(Debug, Clone, PartialEq)]
pub struct CteSource {
    pub name: String,
    pub entry: SymbolEntryId,
    pub columns: Vec<ResultColumn>,
}

/// Outcome of looking up an unqualified column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnLookup<'a> {
    Found {
        source: &'a RowsSource,
        column: &'a ResultColumn,
    },
    /// Several sources of the same query provide the column
    Ambiguous(Vec<String>),
    NotFound,
}

/// What is visible at one point of a query
#[derive(Debug, Clone)]
pub struct SourcesContext {
    data: Arc<QueryDataContext>,
    sources: Vec<RowsSource>,
    result: Vec<ResultColumn>,
    ctes: Vec<CteSource>,
    parent: Option<Arc<SourcesContext>>,
}

impl SourcesContext {
    pub fn new(data: Arc<QueryDataContext>) -> Self {
        Self {
            data,
            sources: Vec::new(),
            result: Vec::new(),
            ctes: Vec::new(),
            parent: None,
        }
    }

    /// Empty context of a subquery nested in `parent`
    pub fn nested(parent: &Arc<SourcesContext>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            ..Self::new(Arc::clone(&parent.data))
        }
    }

    pub fn with_source(mut self, source: RowsSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = RowsSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn with_result(mut self, result: Vec<ResultColumn>) -> Self {
        self.result = result;
        self
    }

    pub fn with_cte(mut self, cte: CteSource) -> Self {
        self.ctes.push(cte);
        self
    }

    pub fn data(&self) -> &Arc<QueryDataContext> {
        &self.data
    }

    pub fn sources(&self) -> &[RowsSource] {
        &self.sources
    }

    pub fn result(&self) -> &[ResultColumn] {
        &self.result
    }

    pub fn ctes(&self) -> &[CteSource] {
        &self.ctes
    }

    pub fn parent(&self) -> Option<&Arc<SourcesContext>> {
        self.parent.as_ref()
    }

    /// Whether some source of this query has unknown columns
    pub fn has_unresolved_source(&self) -> bool {
        self.sources.iter().any(|s| !s.resolved)
    }

    /// Find the source a qualifier denotes, looking outwards
    pub fn find_source(&self, qualifier: &str) -> Option<&RowsSource> {
        let mut context = Some(self);
        while let Some(current) = context {
            if let Some(source) = current.sources.iter().find(|s| s.matches(qualifier)) {
                return Some(source);
            }
            context = current.parent.as_deref();
        }
        None
    }

    /// Find a CTE by name, looking outwards
    pub fn find_cte(&self, name: &str) -> Option<&CteSource> {
        let mut context = Some(self);
        while let Some(current) = context {
            if let Some(cte) = current.ctes.iter().rev().find(|c| c.name.eq_ignore_ascii_case(name)) {
                return Some(cte);
            }
            context = current.parent.as_deref();
        }
        None
    }

    /// Find an unqualified column among the visible sources
    ///
    /// The innermost query that provides the column wins; within one
    /// query, two providing sources make the reference ambiguous.
    pub fn resolve_column(&self, name: &str) -> ColumnLookup<'_> {
        let mut context = Some(self);
        while let Some(current) = context {
            let found: Vec<(&RowsSource, &ResultColumn)> = current
                .sources
                .iter()
                .filter_map(|source| source.find_column(name).map(|column| (source, column)))
                .collect();
            match found.as_slice() {
                [] => context = current.parent.as_deref(),
                [(source, column)] => return ColumnLookup::Found { source, column },
                _ => {
                    return ColumnLookup::Ambiguous(
                        found.iter().map(|(s, _)| s.label().to_string()).collect(),
                    );
                }
            }
        }
        ColumnLookup::NotFound
    }

    /// Whether any query on the way out has a source with unknown columns
    pub fn has_unresolved_source_outwards(&self) -> bool {
        let mut context = Some(self);
        while let Some(current) = context {
            if current.has_unresolved_source() {
                return true;
            }
            context = current.parent.as_deref();
        }
        false
    }

    /// A result column by name, e.g. an alias used in ORDER BY
    pub fn find_result_column(&self, name: &str) -> Option<&ResultColumn> {
        self.result.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_ir::TableMetadata;

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn dummy() -> DummyDataContext {
        DummyDataContext::new(
            strings(&["a", "b", "a"]),
            vec![strings(&["t"]), strings(&["s", "u"])],
        )
    }

    #[test]
    fn test_dummy_defaults() {
        let dummy = DummyDataContext::new(Vec::new(), Vec::new());
        assert_eq!(dummy.default_catalog(), DUMMY_CATALOG);
        assert_eq!(dummy.default_schema(), DUMMY_SCHEMA);
    }

    #[test]
    fn test_dummy_tables_have_every_column() {
        let dummy = dummy();
        let table = dummy.find_real_table(&strings(&["t"])).unwrap();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.to_string(), "dummyCatalog.s.t");
        // cross product: u exists in the default schema too
        assert!(dummy.find_real_table(&strings(&["u"])).is_some());
        assert!(dummy.find_real_table(&strings(&["x", "t"])).is_none());
        assert!(dummy.find_real_table(&strings(&["nope"])).is_none());
    }

    #[test]
    fn test_metadata_context_unquotes() {
        let snapshot = CatalogSnapshot::from_tables(vec![TableMetadata::new("Users", "public")]);
        let data = QueryDataContext::metadata(Dialect::PostgreSQL, Arc::new(snapshot));
        assert!(!data.is_dummy());
        let found = data.find_real_table(&strings(&["\"Users\""])).unwrap();
        assert_eq!(found.map(|t| t.name().to_string()), Some("Users".to_string()));
    }

    fn source(name: &str, alias: Option<&str>, columns: &[&str]) -> RowsSource {
        RowsSource {
            name: Some(name.to_string()),
            alias: alias.map(str::to_string),
            columns: columns.iter().map(|c| ResultColumn::named(*c)).collect(),
            resolved: true,
            ..RowsSource::default()
        }
    }

    #[test]
    fn test_alias_hides_table_name() {
        let data = Arc::new(QueryDataContext::dummy(Dialect::Standard, dummy()));
        let context = SourcesContext::new(data).with_source(source("users", Some("u"), &["id"]));
        assert!(context.find_source("u").is_some());
        assert!(context.find_source("users").is_none());
    }

    #[test]
    fn test_column_lookup_outwards_and_ambiguity() {
        let data = Arc::new(QueryDataContext::dummy(Dialect::Standard, dummy()));
        let outer = Arc::new(
            SourcesContext::new(data)
                .with_source(source("t1", None, &["x", "outer_only"]))
                .with_source(source("t2", None, &["x"])),
        );
        let inner = SourcesContext::nested(&outer).with_source(source("t3", None, &["y"]));

        assert!(matches!(inner.resolve_column("y"), ColumnLookup::Found { .. }));
        match inner.resolve_column("outer_only") {
            ColumnLookup::Found { source, .. } => assert_eq!(source.label(), "t1"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            inner.resolve_column("x"),
            ColumnLookup::Ambiguous(vec!["t1".to_string(), "t2".to_string()])
        );
        assert_eq!(inner.resolve_column("zzz"), ColumnLookup::NotFound);
    }
}
