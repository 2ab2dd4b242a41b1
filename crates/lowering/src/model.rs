// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query model
//!
//! The recognized shape of one statement: row sources for queries, value
//! expressions inside them, and dedicated models for DML and DDL. Model
//! nodes point back into the syntax tree and into the statement's symbol
//! table; they carry no text of their own.

use std::sync::Arc;

use serde::Serialize;
use sqlscope_grammar::{NodeId, SyntaxTree};
use sqlscope_ir::Interval;
use sqlscope_semantic::{
    LexicalScope, LexicalScopes, QualifiedNameId, ScopeId, SourcesContext, SymbolEntryId, SymbolTable,
};

/// Kind of a literal in a value expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantKind {
    Numeric,
    String,
    Datetime,
    Boolean,
    Null,
}

/// How a variable or parameter is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// `@name`
    BatchVariable,
    /// `${name}`
    ClientVariable,
    /// `:name`
    ClientParameter,
    /// `?`
    AnonymousParameter,
}

impl VariableKind {
    pub fn is_parameter(self) -> bool {
        matches!(self, Self::ClientParameter | Self::AnonymousParameter)
    }
}

#[derive(Debug, Clone)]
pub enum ValueExpressionKind {
    Constant(ConstantKind),
    /// `col` or `t.col`; the column is missing in an incomplete `t.`
    ColumnReference {
        table: Option<QualifiedNameId>,
        column: Option<SymbolEntryId>,
    },
    /// `t.*`
    TupleReference { table: Option<QualifiedNameId> },
    Variable { kind: VariableKind, entry: SymbolEntryId },
    Subquery(Box<RowsSourceModel>),
    /// Operators, function calls and other structure the model does not
    /// interpret; only the operands are kept
    Flattened(Vec<ValueExpression>),
    TypeCast {
        value: Box<ValueExpression>,
        type_name: String,
    },
}

#[derive(Debug, Clone)]
pub struct ValueExpression {
    pub node: NodeId,
    pub interval: Interval,
    pub kind: ValueExpressionKind,
    /// Scope opened for the expression as a whole
    pub scope: Option<ScopeId>,
}

impl ValueExpression {
    pub fn new(node: NodeId, interval: Interval, kind: ValueExpressionKind) -> Self {
        Self {
            node,
            interval,
            kind,
            scope: None,
        }
    }

    /// Direct sub-expressions
    pub fn operands(&self) -> Vec<&ValueExpression> {
        match &self.kind {
            ValueExpressionKind::Flattened(items) => items.iter().collect(),
            ValueExpressionKind::TypeCast { value, .. } => vec![value],
            _ => Vec::new(),
        }
    }
}

/// Set operation between two row sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SetOperationKind {
    Union,
    Except,
    Intersect,
}

/// An item of a select list
#[derive(Debug, Clone)]
pub enum SelectItem {
    /// `expr [AS alias]`
    Column {
        node: NodeId,
        expr: ValueExpression,
        alias: Option<SymbolEntryId>,
    },
    /// `t.*`
    Tuple { node: NodeId, expr: ValueExpression },
    /// `*`
    CompleteTuple { node: NodeId },
}

impl SelectItem {
    pub fn node(&self) -> NodeId {
        match self {
            Self::Column { node, .. } | Self::Tuple { node, .. } | Self::CompleteTuple { node } => *node,
        }
    }
}

/// A WHERE, GROUP BY, HAVING or ORDER BY clause with its scope
#[derive(Debug, Clone)]
pub struct Filter {
    pub expr: ValueExpression,
    pub scope: ScopeId,
}

#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub where_clause: Option<Filter>,
    pub group_by: Option<Filter>,
    pub having: Option<Filter>,
    pub order_by: Option<Filter>,
}

impl Filters {
    pub fn iter(&self) -> impl Iterator<Item = &Filter> + '_ {
        [&self.where_clause, &self.group_by, &self.having, &self.order_by]
            .into_iter()
            .flatten()
    }
}

/// `SELECT ... FROM ... WHERE ...`
#[derive(Debug, Clone)]
pub struct ProjectionModel {
    pub select_scope: ScopeId,
    pub from: RowsSourceModel,
    /// Scope between FROM and the first filter clause
    pub from_scope: Option<ScopeId>,
    pub items: Vec<SelectItem>,
    pub filters: Filters,
}

/// One `name [(columns)] AS (subquery)` of a WITH clause
#[derive(Debug, Clone)]
pub struct CteSubquery {
    pub node: NodeId,
    pub name: Option<SymbolEntryId>,
    pub columns: Vec<SymbolEntryId>,
    pub source: RowsSourceModel,
}

#[derive(Debug, Clone)]
pub enum RowsSourceKind {
    /// Placeholder for a source missing from incomplete text
    Empty,
    /// A named table, view or CTE
    Table { name: Option<QualifiedNameId> },
    /// `source [AS] alias [(columns)]`
    Correlated {
        source: Box<RowsSourceModel>,
        alias: Option<SymbolEntryId>,
        columns: Vec<SymbolEntryId>,
    },
    /// `a CROSS JOIN b` or `a, b`
    CrossJoin {
        left: Box<RowsSourceModel>,
        right: Box<RowsSourceModel>,
    },
    /// `a [NATURAL] [type] JOIN b [ON cond | USING (cols)]`
    NaturalJoin {
        left: Box<RowsSourceModel>,
        right: Box<RowsSourceModel>,
        condition: Option<Filter>,
        using: Vec<SymbolEntryId>,
    },
    SetOperation {
        kind: SetOperationKind,
        left: Box<RowsSourceModel>,
        right: Box<RowsSourceModel>,
        corresponding: Vec<SymbolEntryId>,
    },
    Projection(Box<ProjectionModel>),
    /// `VALUES (...), (...)`
    Values(Vec<ValueExpression>),
    /// `WITH ... <query>`
    Cte {
        recursive: bool,
        subqueries: Vec<CteSubquery>,
        result: Box<RowsSourceModel>,
    },
}

#[derive(Debug, Clone)]
pub struct RowsSourceModel {
    pub node: NodeId,
    pub interval: Interval,
    pub kind: RowsSourceKind,
}

impl RowsSourceModel {
    pub fn new(node: NodeId, interval: Interval, kind: RowsSourceKind) -> Self {
        Self { node, interval, kind }
    }

    /// Short name of the variant, for logs and tests
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            RowsSourceKind::Empty => "empty",
            RowsSourceKind::Table { .. } => "table",
            RowsSourceKind::Correlated { .. } => "correlated",
            RowsSourceKind::CrossJoin { .. } => "cross_join",
            RowsSourceKind::NaturalJoin { .. } => "natural_join",
            RowsSourceKind::SetOperation { .. } => "set_operation",
            RowsSourceKind::Projection(_) => "projection",
            RowsSourceKind::Values(_) => "values",
            RowsSourceKind::Cte { .. } => "cte",
        }
    }

    /// Direct child row sources
    pub fn children(&self) -> Vec<&RowsSourceModel> {
        match &self.kind {
            RowsSourceKind::Empty | RowsSourceKind::Table { .. } | RowsSourceKind::Values(_) => Vec::new(),
            RowsSourceKind::Correlated { source, .. } => vec![source],
            RowsSourceKind::CrossJoin { left, right }
            | RowsSourceKind::NaturalJoin { left, right, .. }
            | RowsSourceKind::SetOperation { left, right, .. } => vec![left, right],
            RowsSourceKind::Projection(projection) => vec![&projection.from],
            RowsSourceKind::Cte { subqueries, result, .. } => subqueries
                .iter()
                .map(|s| &s.source)
                .chain(std::iter::once(result.as_ref()))
                .collect(),
        }
    }
}

/// `DELETE FROM table [alias] [WHERE ...]`
#[derive(Debug, Clone)]
pub struct DeleteModel {
    pub table: Option<QualifiedNameId>,
    pub alias: Option<SymbolEntryId>,
    pub condition: Option<Filter>,
    /// Scope spanning the statement after the table name
    pub scope: Option<ScopeId>,
}

/// `INSERT INTO table [(columns)] source`
#[derive(Debug, Clone)]
pub struct InsertModel {
    pub table: Option<QualifiedNameId>,
    pub columns: Vec<SymbolEntryId>,
    pub source: Option<RowsSourceModel>,
}

/// `target = value` of an UPDATE
#[derive(Debug, Clone)]
pub struct SetClause {
    pub node: NodeId,
    pub target: Option<SymbolEntryId>,
    /// `None` for `DEFAULT`
    pub value: Option<ValueExpression>,
}

/// `UPDATE table [alias] SET ... [WHERE ...]`
#[derive(Debug, Clone)]
pub struct UpdateModel {
    pub table: Option<QualifiedNameId>,
    pub alias: Option<SymbolEntryId>,
    pub set_clauses: Vec<SetClause>,
    pub condition: Option<Filter>,
    pub scope: Option<ScopeId>,
}

/// A column of CREATE TABLE
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub node: NodeId,
    pub name: Option<SymbolEntryId>,
    pub type_name: String,
}

/// `REFERENCES table (columns)` in a column constraint
#[derive(Debug, Clone)]
pub struct ForeignReference {
    pub table: Option<QualifiedNameId>,
    pub columns: Vec<SymbolEntryId>,
}

/// `CREATE TABLE [IF NOT EXISTS] name (elements)`
#[derive(Debug, Clone)]
pub struct CreateTableModel {
    pub table: Option<QualifiedNameId>,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
    /// Column lists of PRIMARY KEY and UNIQUE constraints
    pub constraint_columns: Vec<SymbolEntryId>,
    pub references: Vec<ForeignReference>,
}

/// What an `ALTER TABLE` action does to its column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnChange {
    Add,
    Drop,
    Alter,
}

/// `ADD [COLUMN]`, `DROP [COLUMN]` or `ALTER [COLUMN]` of ALTER TABLE
#[derive(Debug, Clone)]
pub struct AlterColumnAction {
    pub node: NodeId,
    pub change: ColumnChange,
    pub column: Option<SymbolEntryId>,
    /// Declared type of an added column
    pub type_name: Option<String>,
    /// `SET DEFAULT` value of an altered column
    pub default: Option<ValueExpression>,
}

/// `ALTER TABLE name action, ...`
#[derive(Debug, Clone)]
pub struct AlterTableModel {
    pub table: Option<QualifiedNameId>,
    pub actions: Vec<AlterColumnAction>,
    /// Column lists of `ADD PRIMARY KEY` and `ADD UNIQUE`
    pub constraint_columns: Vec<SymbolEntryId>,
    pub references: Vec<ForeignReference>,
    /// From the target table to the end of the statement
    pub scope: Option<ScopeId>,
}

/// The kind of object a DROP statement removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroppedObject {
    Table,
    View,
    Procedure,
}

/// `DROP TABLE|VIEW|PROCEDURE [IF EXISTS] names`
#[derive(Debug, Clone)]
pub struct DropModel {
    pub object: DroppedObject,
    pub if_exists: bool,
    pub names: Vec<QualifiedNameId>,
}

#[derive(Debug, Clone)]
pub enum ModelContent {
    Query(RowsSourceModel),
    Delete(DeleteModel),
    Insert(InsertModel),
    Update(UpdateModel),
    CreateTable(CreateTableModel),
    AlterTable(AlterTableModel),
    Drop(DropModel),
}

impl ModelContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Delete(_) => "delete",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::CreateTable(_) => "create_table",
            Self::AlterTable(_) => "alter_table",
            Self::Drop(_) => "drop",
        }
    }

    pub fn as_query(&self) -> Option<&RowsSourceModel> {
        match self {
            Self::Query(source) => Some(source),
            _ => None,
        }
    }
}

/// A recognized statement
///
/// Shared between the document index and completion through `Arc`.
#[derive(Debug, Clone)]
pub struct Model {
    tree: Arc<SyntaxTree>,
    content: Option<ModelContent>,
    symbols: SymbolTable,
    scopes: LexicalScopes,
}

impl Model {
    pub fn new(
        tree: Arc<SyntaxTree>,
        content: Option<ModelContent>,
        symbols: SymbolTable,
        scopes: LexicalScopes,
    ) -> Self {
        Self {
            tree,
            content,
            symbols,
            scopes,
        }
    }

    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    pub fn text(&self) -> &str {
        self.tree.source()
    }

    pub fn content(&self) -> Option<&ModelContent> {
        self.content.as_ref()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn scopes(&self) -> &LexicalScopes {
        &self.scopes
    }

    /// The narrowest lexical scope covering `position`
    pub fn scope_at(&self, position: usize) -> Option<&LexicalScope> {
        self.scopes.innermost_at(position).map(|id| self.scopes.get(id))
    }

    /// The sources visible at `position`
    ///
    /// Falls back to wider scopes when the narrowest one carries no context.
    pub fn context_at(&self, position: usize) -> Option<&Arc<SourcesContext>> {
        let mut candidates: Vec<&LexicalScope> = self
            .scopes
            .iter()
            .map(|(_, scope)| scope)
            .filter(|scope| scope.context().is_some() && scope.interval().touches(position))
            .collect();
        candidates.sort_by_key(|scope| scope.interval().len());
        candidates.first().and_then(|scope| scope.context())
    }

    /// The symbol entry written at `position`, if any
    pub fn entry_at(&self, position: usize) -> Option<SymbolEntryId> {
        self.symbols
            .entries()
            .filter(|(_, entry)| entry.interval().touches(position))
            .min_by_key(|(_, entry)| entry.interval().start)
            .map(|(id, _)| id)
    }

    /// The deepest syntax node whose interval contains `position`
    pub fn find_node_containing(&self, position: usize) -> Option<NodeId> {
        let mut current = self.tree.root();
        if !self.tree.interval(current).touches(position) {
            return None;
        }
        loop {
            let next = self
                .tree
                .all_children(current)
                .iter()
                .copied()
                .find(|child| self.tree.interval(*child).touches(position));
            match next {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_model_is_shareable() {
        assert_send_sync::<Model>();
        assert_send_sync::<Arc<Model>>();
    }

    #[test]
    fn test_filters_iterate_present_clauses() {
        let tree = sqlscope_grammar::SqlParser::new(sqlscope_ir::Dialect::Standard)
            .parse("SELECT 1")
            .unwrap();
        let mut scopes = LexicalScopes::new();
        let expr = ValueExpression::new(
            tree.root(),
            Interval::new(0, 1),
            ValueExpressionKind::Constant(ConstantKind::Numeric),
        );
        let filters = Filters {
            having: Some(Filter {
                expr,
                scope: scopes.push(LexicalScope::new()),
            }),
            ..Filters::default()
        };
        assert_eq!(filters.iter().count(), 1);
    }
}
