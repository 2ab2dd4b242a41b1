// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query model recognizer
//!
//! Turns the syntax tree of one statement into a [`Model`]:
//!
//! 1. Choose the data context. With metadata enabled and a catalog snapshot
//!    at hand, names resolve against the catalog. Otherwise every table and
//!    column name the statement mentions is collected up front into a dummy
//!    catalog.
//! 2. Dispatch on the statement kind. Queries are folded by the row source
//!    [`TreeMapper`](crate::tree_mapper::TreeMapper); DML and DDL statements
//!    have dedicated builders.
//! 3. After a structured build, resolve symbols against the data context,
//!    add a tail scope after the statement and mark leftover reserved words.
//!    When no structure can be built, a flat pass classifies every name it
//!    finds instead.

use std::sync::Arc;

use sqlscope_catalog::DatabaseObject;
use sqlscope_grammar::{NodeId, RuleKind, SqlParser, SyntaxTree, TokenKind};
use sqlscope_ir::{Dialect, Interval};
use sqlscope_semantic::{
    DummyDataContext, LexicalScope, LexicalScopes, QualifiedNameId, QueryDataContext, RecognitionProblem, ScopeId,
    ScopeItem, SourcesContext, SymbolClass, SymbolEntryId, SymbolTable,
};
use tracing::{debug, error, info};

use crate::context::RecognitionContext;
use crate::error::{LoweringError, LoweringResult};
use crate::model::{DroppedObject, Model, ModelContent, RowsSourceKind, RowsSourceModel, ValueExpressionKind};

/// Rules wrapping a single identifier
const IDENTIFIER_WRAPPERS: &[RuleKind] = &[RuleKind::CorrelationName, RuleKind::ColumnName, RuleKind::QueryName];

/// Rules wrapping a single qualified name
const QUALIFIED_NAME_WRAPPERS: &[RuleKind] = &[RuleKind::TableName, RuleKind::ProcedureName];

/// Rules a table name is searched through
const TABLE_NAME_CONTAINERS: &[RuleKind] = &[
    RuleKind::NonjoinedTableReference,
    RuleKind::ExplicitTable,
    RuleKind::ColumnConstraint,
    RuleKind::CreateTableStatement,
    RuleKind::CreateViewStatement,
    RuleKind::AlterTableStatement,
    RuleKind::DropTableStatement,
    RuleKind::DropViewStatement,
    RuleKind::DeleteStatement,
    RuleKind::InsertStatement,
    RuleKind::UpdateStatement,
];

/// Rules a column name list is searched through
const COLUMN_NAME_LIST_WRAPPERS: &[RuleKind] = &[
    RuleKind::CorrespondingSpec,
    RuleKind::ColumnConstraint,
    RuleKind::TableConstraint,
    RuleKind::CorrelationSpecification,
    RuleKind::NonjoinedTableReference,
    RuleKind::NamedColumnsJoin,
    RuleKind::JoinSpecification,
    RuleKind::NaturalJoinTerm,
    RuleKind::UnionTerm,
    RuleKind::ExceptTerm,
    RuleKind::IntersectTerm,
    RuleKind::CreateViewStatement,
    RuleKind::InsertColumnsAndSource,
    RuleKind::DerivedColumnList,
    RuleKind::ViewColumnList,
    RuleKind::InsertColumnList,
    RuleKind::WithListElement,
];

/// A name found by the flat identifier pass
#[derive(Debug, Clone, Copy)]
enum IdentifierRef {
    /// A column reference, possibly qualified
    Column {
        table: Option<QualifiedNameId>,
        column: Option<SymbolEntryId>,
    },
    /// A column name at a definition or target site
    ColumnName(SymbolEntryId),
    Table(QualifiedNameId),
}

/// The class a name gets when it is really a string or quoted text
///
/// A single-quoted name is a string that ended up where a name was
/// expected. A double-quoted or backquoted one is quoted text; when it is a
/// quoted identifier of the dialect that only holds until it resolves.
pub fn string_literal_fallback(dialect: Dialect, raw: &str, resolved: bool) -> Option<SymbolClass> {
    let quote = raw.chars().next()?;
    let quoted_identifier = dialect.is_quoted_identifier(raw);
    let applies = (!quoted_identifier && matches!(quote, '"' | '`' | '\'')) || (quoted_identifier && !resolved);
    if !applies {
        return None;
    }
    match quote {
        '\'' => Some(SymbolClass::String),
        '"' | '`' => Some(SymbolClass::Quoted),
        _ => None,
    }
}

/// Parse and recognize one statement
///
/// Returns `None` when the text holds no tokens.
///
/// # Examples
///
/// ```
/// use sqlscope_ir::Dialect;
/// use sqlscope_lowering::{recognize, RecognitionContext, RecognitionSettings};
///
/// let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::PostgreSQL));
/// let model = recognize("SELECT id FROM users", &mut ctx).unwrap();
/// assert_eq!(model.content().unwrap().kind_name(), "query");
/// assert!(recognize("  ", &mut ctx).is_none());
/// ```
pub fn recognize(text: &str, ctx: &mut RecognitionContext) -> Option<Model> {
    let tree = SqlParser::new(ctx.dialect())
        .with_max_depth(ctx.settings().parser_max_depth)
        .parse(text)?;
    Some(QueryModelRecognizer::recognize_tree(Arc::new(tree), ctx))
}

/// Builds the query model of one statement
pub struct QueryModelRecognizer<'c> {
    pub(crate) ctx: &'c mut RecognitionContext,
    pub(crate) tree: Arc<SyntaxTree>,
    pub(crate) dialect: Dialect,
    pub(crate) symbols: SymbolTable,
    pub(crate) scopes: LexicalScopes,
    pub(crate) data: Arc<QueryDataContext>,
}

impl<'c> QueryModelRecognizer<'c> {
    fn new(tree: Arc<SyntaxTree>, ctx: &'c mut RecognitionContext) -> Self {
        let dialect = ctx.dialect();
        Self {
            ctx,
            tree,
            dialect,
            symbols: SymbolTable::new(),
            scopes: LexicalScopes::new(),
            data: Arc::new(QueryDataContext::dummy(dialect, DummyDataContext::new(Vec::new(), Vec::new()))),
        }
    }

    /// Recognize an already parsed statement
    pub fn recognize_tree(tree: Arc<SyntaxTree>, ctx: &'c mut RecognitionContext) -> Model {
        let root = tree.root();
        // Nothing but error nodes: a lone token that cannot start a
        // statement, or text the parser could not place at all
        let Some(query_node) = tree.first_child(root) else {
            debug!(tokens = tree.tokens().len(), "Statement has no recognizable structure");
            return Model::new(tree, None, SymbolTable::new(), LexicalScopes::new());
        };

        let mut recognizer = QueryModelRecognizer::new(Arc::clone(&tree), ctx);
        recognizer.prepare_data_context();

        let content = match recognizer.build_content(query_node) {
            Ok(content) => content,
            Err(err) => {
                recognizer.report(&err, tree.interval(query_node));
                recognizer.symbols = SymbolTable::new();
                recognizer.scopes = LexicalScopes::new();
                None
            }
        };

        match &content {
            Some(content) => {
                if let Err(err) = recognizer.propagate_content(content) {
                    recognizer.report(&err, tree.interval(root));
                }
                recognizer.register_tail_scope();
                if let Err(err) = recognizer.classify_reserved_words() {
                    recognizer.report(&err, tree.interval(root));
                }
            }
            None => {
                debug!("Falling back to flat identifier classification");
                if let Err(err) = recognizer.classify_identifiers() {
                    recognizer.report(&err, tree.interval(root));
                }
            }
        }

        info!(
            kind = content.as_ref().map_or("none", |c| c.kind_name()),
            entries = recognizer.symbols.len(),
            scopes = recognizer.scopes.len(),
            problems = recognizer.ctx.problems().len(),
            "Recognized statement"
        );
        Model::new(tree, content, recognizer.symbols, recognizer.scopes)
    }

    /// Surface a recognition failure
    fn report(&mut self, err: &LoweringError, interval: Interval) {
        if err.is_recoverable() {
            debug!(error = %err, "Structured recognition failed");
        } else {
            error!(error = %err, "Symbol table rejected an update during recognition");
            self.ctx.append_problem(
                RecognitionProblem::error(interval, "Internal error while recognizing the statement")
                    .with_cause(err.to_string()),
            );
        }
    }

    fn prepare_data_context(&mut self) {
        if let Some(snapshot) = self.ctx.metadata() {
            self.data = Arc::new(QueryDataContext::metadata(self.dialect, Arc::clone(snapshot)));
            return;
        }
        let mut columns = Vec::new();
        let mut tables = Vec::new();
        for reference in self.traverse_for_identifiers(true) {
            match reference {
                IdentifierRef::Column { table, column } => {
                    if let Some(table) = table {
                        tables.push(self.symbols.name_parts(table));
                    }
                    if let Some(column) = column {
                        columns.push(self.symbols.entry(column).name().to_string());
                    }
                }
                IdentifierRef::ColumnName(column) => columns.push(self.symbols.entry(column).name().to_string()),
                IdentifierRef::Table(table) => tables.push(self.symbols.name_parts(table)),
            }
        }
        debug!(columns = columns.len(), tables = tables.len(), "Built dummy data context");
        // entries of the scan are not part of the model
        self.symbols = SymbolTable::new();
        self.data = Arc::new(QueryDataContext::dummy(self.dialect, DummyDataContext::new(columns, tables)));
    }

    fn build_content(&mut self, query_node: NodeId) -> LoweringResult<Option<ModelContent>> {
        let tree = Arc::clone(&self.tree);
        match tree.rule(query_node) {
            Some(RuleKind::DirectSqlDataStatement) => {
                let Some(body) = tree.last_child(query_node) else {
                    return Ok(None);
                };
                match tree.rule(body) {
                    Some(RuleKind::DeleteStatement) => Ok(Some(ModelContent::Delete(self.collect_delete(body)?))),
                    Some(RuleKind::InsertStatement) => Ok(Some(ModelContent::Insert(self.collect_insert(body)?))),
                    Some(RuleKind::UpdateStatement) => Ok(Some(ModelContent::Update(self.collect_update(body)?))),
                    _ => Ok(self.collect_query_expression(tree.root())?.map(ModelContent::Query)),
                }
            }
            Some(RuleKind::SqlSchemaStatement) => {
                let Some(body) = tree.first_child(query_node) else {
                    return Ok(None);
                };
                match tree.rule(body) {
                    Some(RuleKind::CreateTableStatement) => {
                        Ok(Some(ModelContent::CreateTable(self.collect_create_table(body))))
                    }
                    Some(RuleKind::AlterTableStatement) => {
                        Ok(Some(ModelContent::AlterTable(self.collect_alter_table(body)?)))
                    }
                    Some(RuleKind::DropTableStatement) => {
                        Ok(Some(ModelContent::Drop(self.collect_drop(body, DroppedObject::Table))))
                    }
                    Some(RuleKind::DropViewStatement) => {
                        Ok(Some(ModelContent::Drop(self.collect_drop(body, DroppedObject::View))))
                    }
                    Some(RuleKind::DropProcedureStatement) => {
                        Ok(Some(ModelContent::Drop(self.collect_drop(body, DroppedObject::Procedure))))
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// The scope after the statement's last token
    ///
    /// Completion after the end of the text still sees the sources of the
    /// construct the text ends in.
    fn register_tail_scope(&mut self) {
        let tail = self.tree.interval(self.tree.root()).end;
        let context = self
            .scopes
            .iter()
            .filter(|(_, scope)| scope.context().is_some() && scope.interval().touches(tail))
            .min_by_key(|(_, scope)| scope.interval().len())
            .and_then(|(_, scope)| scope.context().cloned())
            .unwrap_or_else(|| Arc::new(SourcesContext::new(Arc::clone(&self.data))));
        let mut scope = LexicalScope::new();
        scope.set_interval(Interval::new(tail, usize::MAX));
        scope.set_context(context);
        self.scopes.push(scope);
    }

    /// Unclassified names spelled like reserved words are keywords
    fn classify_reserved_words(&mut self) -> LoweringResult<()> {
        for entry in self.symbols.unclassified_entries() {
            if self.dialect.is_reserved_word(self.symbols.entry(entry).raw_name()) {
                self.symbols.set_symbol_class(entry, SymbolClass::Reserved)?;
            }
        }
        Ok(())
    }

    /// Flat pass used when no structure could be recognized
    fn classify_identifiers(&mut self) -> LoweringResult<()> {
        for reference in self.traverse_for_identifiers(false) {
            match reference {
                IdentifierRef::Column { table, column } => {
                    let table = match table {
                        Some(table) => self.resolve_entity(table)?,
                        None => None,
                    };
                    if let Some(column) = column {
                        self.classify_column(column, table.is_some())?;
                    }
                }
                IdentifierRef::ColumnName(column) => self.classify_column(column, false)?,
                IdentifierRef::Table(table) => {
                    self.resolve_entity(table)?;
                }
            }
        }
        Ok(())
    }

    fn classify_column(&mut self, column: SymbolEntryId, has_table: bool) -> LoweringResult<()> {
        if !self.symbols.is_classified(column) && (has_table || !self.try_string_fallback(column)?) {
            self.symbols.set_symbol_class(column, SymbolClass::Column)?;
        }
        Ok(())
    }

    /// Resolve a name against the data context, returning the table it names
    fn resolve_entity(&mut self, name: QualifiedNameId) -> LoweringResult<Option<Arc<DatabaseObject>>> {
        let qualified = self.symbols.qualified_name(name);
        if self.symbols.is_classified(qualified.entity_name()) {
            return Ok(None);
        }
        if qualified.invalid_parts_count() > 0 {
            self.symbols
                .perform_partial_resolution(name, &self.data, self.ctx.problem_collector())?;
            return Ok(None);
        }
        let parts = self.symbols.name_parts(name);
        match self.data.find_real_object(&parts) {
            Ok(Some(object)) => {
                self.symbols.set_name_definition(name, &object)?;
                Ok(object.is_table_like().then_some(object))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                debug!(name = %parts.join("."), error = %err, "Catalog lookup failed");
                let interval = self.symbols.qualified_name(name).interval();
                self.ctx.append_problem(
                    RecognitionProblem::error(interval, format!("Failed to resolve {}", parts.join(".")))
                        .with_cause(err.to_string()),
                );
                Ok(None)
            }
        }
    }

    /// Classify the entry as a string or quoted text if it looks like one
    pub(crate) fn try_string_fallback(&mut self, entry: SymbolEntryId) -> LoweringResult<bool> {
        let raw = self.symbols.entry(entry).raw_name();
        let class = if self.dialect.is_quoted_string(raw) {
            Some(SymbolClass::String)
        } else {
            string_literal_fallback(self.dialect, raw, false)
        };
        match class {
            Some(class) => {
                self.symbols.set_symbol_class(entry, class)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn traverse_for_identifiers(&mut self, force_unquoted: bool) -> Vec<IdentifierRef> {
        let tree = Arc::clone(&self.tree);
        let nodes = tree.expand_subtree(
            tree.root(),
            None,
            &[RuleKind::ColumnReference, RuleKind::ColumnName, RuleKind::TableName],
        );
        let mut found = Vec::new();
        for node in nodes {
            match tree.rule(node) {
                Some(RuleKind::ColumnName) => {
                    if let Some(column) = self.collect_identifier_as(node, force_unquoted) {
                        found.push(IdentifierRef::ColumnName(column));
                    }
                }
                Some(RuleKind::ColumnReference) => match self.collect_column_reference_as(node, force_unquoted) {
                    Some(ValueExpressionKind::ColumnReference { table, column }) => {
                        found.push(IdentifierRef::Column { table, column });
                    }
                    Some(ValueExpressionKind::TupleReference { table }) => {
                        found.push(IdentifierRef::Column { table, column: None });
                    }
                    _ => {}
                },
                Some(RuleKind::TableName) => {
                    if let Some(table) = self.collect_table_name_as(node, force_unquoted) {
                        found.push(IdentifierRef::Table(table));
                    }
                }
                _ => {}
            }
        }
        found
    }

    /// Run `f` inside a fresh lexical scope
    ///
    /// The scope is closed whether `f` succeeds or not.
    pub(crate) fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> LoweringResult<R>) -> LoweringResult<(R, ScopeId)> {
        let scope = self.scopes.begin();
        let result = f(self);
        self.scopes.end(scope)?;
        Ok((result?, scope))
    }

    fn register_entry(&mut self, node: NodeId, name: String, raw: &str) -> SymbolEntryId {
        let interval = self.tree.interval(node);
        let entry = self.symbols.add_entry(node, interval, name, raw);
        self.scopes.register_item(ScopeItem::Entry(entry), interval);
        entry
    }

    /// Register an entry for a variable or parameter
    pub(crate) fn register_variable(&mut self, node: NodeId, name: &str, raw: &str) -> SymbolEntryId {
        self.register_entry(node, name.to_string(), raw)
    }

    fn register_name(
        &mut self,
        node: NodeId,
        scope_name: Vec<Option<SymbolEntryId>>,
        entity: SymbolEntryId,
        invalid_parts: usize,
    ) -> QualifiedNameId {
        let interval = self.tree.interval(node);
        let name = self
            .symbols
            .add_qualified_name(node, interval, scope_name, entity, invalid_parts);
        self.scopes.register_item(ScopeItem::Name(name), interval);
        name
    }

    pub(crate) fn collect_identifier(&mut self, node: NodeId) -> Option<SymbolEntryId> {
        self.collect_identifier_as(node, false)
    }

    fn collect_identifier_as(&mut self, node: NodeId, force_unquoted: bool) -> Option<SymbolEntryId> {
        let tree = Arc::clone(&self.tree);
        let identifier = match tree.rule(node) {
            Some(rule) if IDENTIFIER_WRAPPERS.contains(&rule) => tree.find_child_of_rule(node, RuleKind::Identifier)?,
            _ => node,
        };
        if !tree.is_rule(identifier, RuleKind::Identifier) {
            debug!(found = tree.node_name(identifier), "identifier expected");
            return None;
        }
        let actual = tree.find_last_child_of_rule(identifier, RuleKind::ActualIdentifier)?;
        let text_node = tree.first_child(actual)?;
        let raw = tree.text(text_node);
        let name = if tree.token_kind(text_node) == Some(TokenKind::Quoted) {
            // quoted names keep their spelling until resolution
            raw.to_string()
        } else {
            self.dialect.canonicalize_identifier(raw, force_unquoted)
        };
        Some(self.register_entry(text_node, name, raw))
    }

    /// Parts of a qualified name and how many of them are missing
    fn collect_qualified_name_parts(
        &mut self,
        node: NodeId,
        force_unquoted: bool,
    ) -> Option<(Vec<Option<SymbolEntryId>>, usize)> {
        let tree = Arc::clone(&self.tree);
        let name_node = match tree.rule(node) {
            Some(rule) if QUALIFIED_NAME_WRAPPERS.contains(&rule) => {
                tree.find_child_of_rule(node, RuleKind::QualifiedName)?
            }
            _ => node,
        };
        if !tree.is_rule(name_node, RuleKind::QualifiedName) {
            debug!(found = tree.node_name(name_node), "qualifiedName expected");
            return None;
        }

        let children = tree.all_children(name_node);
        if children.len() == 1 && !tree.is_error(children[0]) {
            let entity = self.collect_identifier_as(children[0], force_unquoted);
            return Some((vec![entity], usize::from(entity.is_none())));
        }

        let mut parts = Vec::with_capacity(children.len());
        let mut invalid = 0;
        let mut expecting_name = true;
        for child in children {
            let is_period = tree.token_kind(*child) == Some(TokenKind::Period);
            if expecting_name {
                let part = if is_period {
                    None
                } else {
                    expecting_name = false;
                    self.collect_identifier_as(*child, force_unquoted)
                };
                invalid += usize::from(part.is_none());
                parts.push(part);
            } else if is_period {
                expecting_name = true;
            } else {
                parts.push(None);
                invalid += 1;
            }
        }
        if expecting_name {
            // ends with a period
            parts.push(None);
            invalid += 1;
        }
        Some((parts, invalid))
    }

    fn collect_qualified_name_as(&mut self, node: NodeId, force_unquoted: bool) -> Option<QualifiedNameId> {
        let (mut parts, invalid) = self.collect_qualified_name_parts(node, force_unquoted)?;
        let entity = parts.pop().flatten()?;
        Some(self.register_name(node, parts, entity, invalid))
    }

    pub(crate) fn collect_qualified_name(&mut self, node: NodeId) -> Option<QualifiedNameId> {
        self.collect_qualified_name_as(node, false)
    }

    /// Find and collect the table name inside `node`
    pub(crate) fn collect_table_name(&mut self, node: NodeId) -> Option<QualifiedNameId> {
        self.collect_table_name_as(node, false)
    }

    fn collect_table_name_as(&mut self, node: NodeId, force_unquoted: bool) -> Option<QualifiedNameId> {
        let tree = Arc::clone(&self.tree);
        let found = tree.expand_subtree(
            node,
            Some(TABLE_NAME_CONTAINERS),
            &[RuleKind::TableName, RuleKind::CorrelationName],
        );
        if found.len() > 1 {
            debug!(node = tree.node_name(node), "Ambiguous table name collection");
        }
        let table_node = *found.first()?;
        if tree.is_rule(table_node, RuleKind::TableName) {
            self.collect_qualified_name_as(table_node, force_unquoted)
        } else {
            let entry = self.collect_identifier_as(table_node, force_unquoted)?;
            Some(self.register_name(table_node, Vec::new(), entry, 0))
        }
    }

    pub(crate) fn collect_table_reference(&mut self, node: NodeId) -> RowsSourceModel {
        let name = self.collect_table_name(node);
        RowsSourceModel::new(node, self.tree.interval(node), RowsSourceKind::Table { name })
    }

    /// Collect the column names of the column name list in `node`
    pub(crate) fn collect_column_name_list(&mut self, node: NodeId) -> Vec<SymbolEntryId> {
        let tree = Arc::clone(&self.tree);
        let list = match tree.rule(node) {
            Some(RuleKind::ColumnNameList) => node,
            Some(rule) if COLUMN_NAME_LIST_WRAPPERS.contains(&rule) => {
                let found = tree.expand_subtree(node, Some(COLUMN_NAME_LIST_WRAPPERS), &[RuleKind::ColumnNameList]);
                match found.as_slice() {
                    [] => return Vec::new(),
                    [list] => *list,
                    _ => {
                        debug!(node = tree.node_name(node), "Ambiguous column name list collection");
                        return Vec::new();
                    }
                }
            }
            _ => {
                debug!(found = tree.node_name(node), "columnNameList or a wrapper expected");
                return Vec::new();
            }
        };
        tree.children(list)
            .filter(|child| tree.is_rule(*child, RuleKind::ColumnName))
            .filter_map(|child| self.collect_identifier(child))
            .collect()
    }

    pub(crate) fn collect_column_reference(&mut self, node: NodeId) -> Option<ValueExpressionKind> {
        self.collect_column_reference_as(node, false)
    }

    /// `a`, `t.a`, `s.t.a`, `t.` or `t.*`
    fn collect_column_reference_as(&mut self, node: NodeId, force_unquoted: bool) -> Option<ValueExpressionKind> {
        let tree = Arc::clone(&self.tree);
        let name_node = tree.find_child_of_rule(node, RuleKind::QualifiedName)?;
        if tree.find_last_child_of_rule(node, RuleKind::TupleRefSuffix).is_some() {
            let table = self.collect_qualified_name_as(name_node, force_unquoted);
            return Some(ValueExpressionKind::TupleReference { table });
        }

        let (mut parts, invalid) = self.collect_qualified_name_parts(name_node, force_unquoted)?;
        let column = parts.pop().flatten();
        if parts.is_empty() {
            return match column {
                Some(column) if invalid == 0 => Some(ValueExpressionKind::ColumnReference {
                    table: None,
                    column: Some(column),
                }),
                _ => None,
            };
        }
        let table_invalid = if column.is_none() { invalid - 1 } else { invalid };
        let table = parts
            .pop()
            .flatten()
            .map(|entity| self.register_name(name_node, parts, entity, table_invalid));
        Some(ValueExpressionKind::ColumnReference { table, column })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecognitionSettings;

    fn recognize_with(dialect: Dialect, text: &str) -> Model {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(dialect));
        recognize(text, &mut ctx).unwrap()
    }

    fn classes(model: &Model) -> Vec<(String, SymbolClass)> {
        model
            .symbols()
            .entries()
            .map(|(id, entry)| (entry.raw_name().to_string(), model.symbols().class_of(id)))
            .collect()
    }

    #[test]
    fn test_tail_scope_follows_the_innermost_construct() {
        let text = "SELECT a FROM t WHERE a > 1";
        let model = recognize_with(Dialect::PostgreSQL, text);
        let context = model.context_at(text.len() + 10).unwrap();
        assert!(context.find_source("t").is_some());

        // a statement without sources still gets one
        let model = recognize_with(Dialect::PostgreSQL, "SELECT 1");
        let context = model.context_at(50).unwrap();
        assert!(context.sources().is_empty());
    }

    #[test]
    fn test_string_literal_fallback() {
        assert_eq!(string_literal_fallback(Dialect::PostgreSQL, "'x'", false), Some(SymbolClass::String));
        assert_eq!(string_literal_fallback(Dialect::PostgreSQL, "\"x\"", false), Some(SymbolClass::Quoted));
        assert_eq!(string_literal_fallback(Dialect::PostgreSQL, "\"x\"", true), None);
        assert_eq!(string_literal_fallback(Dialect::MySQL, "\"x\"", true), Some(SymbolClass::Quoted));
        assert_eq!(string_literal_fallback(Dialect::PostgreSQL, "x", false), None);
    }

    #[test]
    fn test_lone_unexpected_token_has_no_content() {
        let model = recognize_with(Dialect::Standard, "foo");
        assert!(model.content().is_none());
        assert!(model.symbols().is_empty());
    }

    #[test]
    fn test_create_view_falls_back_to_flat_pass() {
        let model = recognize_with(Dialect::PostgreSQL, "CREATE VIEW v AS SELECT a FROM t");
        assert!(model.content().is_none());
        let classes = classes(&model);
        assert!(classes.contains(&("a".to_string(), SymbolClass::Column)));
        assert!(classes.contains(&("t".to_string(), SymbolClass::Table)));
        assert!(classes.contains(&("v".to_string(), SymbolClass::Table)));
    }

    #[test]
    fn test_identifier_canonicalization() {
        let model = recognize_with(Dialect::PostgreSQL, "SELECT \"Name\", Age FROM People");
        let names: Vec<&str> = model.symbols().entries().map(|(_, e)| e.name()).collect();
        assert!(names.contains(&"\"Name\""));
        assert!(names.contains(&"age"));
        assert!(names.contains(&"people"));
    }

    #[test]
    fn test_incomplete_qualified_column() {
        let model = recognize_with(Dialect::PostgreSQL, "SELECT t. FROM t");
        let tree = model.tree();
        let refs = tree.expand_subtree(tree.root(), None, &[RuleKind::ColumnReference]);
        assert_eq!(refs.len(), 1);
        let table = model
            .symbols()
            .qualified_names()
            .find(|(_, name)| name.node() == tree.find_child_of_rule(refs[0], RuleKind::QualifiedName).unwrap());
        assert!(table.is_some());
    }
}
