// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Symbol propagation
//!
//! Walks a recognized model top-down and resolves every name against what
//! is visible at its position: tables against CTEs and the data context,
//! columns against the sources of the enclosing queries. Each lexical scope
//! receives the [`SourcesContext`] that was in effect, so completion can see
//! the same names later.
//!
//! Unresolved names become problems unless the data context is a dummy or
//! some visible source has unknown columns.

use std::sync::Arc;

use sqlscope_semantic::{
    ColumnLookup, CteSource, QualifiedNameId, RecognitionProblem, ResultColumn, RowsSource, SourcesContext,
    SymbolClass, SymbolDefinition, SymbolEntryId,
};
use tracing::trace;

use crate::error::LoweringResult;
use crate::model::{
    AlterTableModel, ColumnChange, CreateTableModel, DeleteModel, DropModel, DroppedObject, Filter, InsertModel,
    ModelContent, ProjectionModel, RowsSourceKind, RowsSourceModel, SelectItem, UpdateModel, ValueExpression,
    ValueExpressionKind,
};
use crate::recognizer::{string_literal_fallback, QueryModelRecognizer};

/// How a missing table is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableUse {
    /// Must exist
    Read,
    /// Created by the statement
    Create,
    /// `DROP ... IF EXISTS`
    DropIfExists,
}

/// What a row source contributes to the query around it
#[derive(Debug, Default)]
struct Propagated {
    sources: Vec<RowsSource>,
    columns: Vec<ResultColumn>,
    resolved: bool,
    /// A query result rather than named sources
    derived: bool,
}

impl Propagated {
    fn derived(columns: Vec<ResultColumn>, resolved: bool) -> Self {
        Self {
            sources: Vec::new(),
            columns,
            resolved,
            derived: true,
        }
    }

    fn from_source(source: RowsSource) -> Self {
        Self {
            columns: source.columns.clone(),
            resolved: source.resolved,
            sources: vec![source],
            derived: false,
        }
    }

    /// Sources visible to the enclosing query; a derived result becomes an
    /// anonymous source
    fn into_sources(self) -> Vec<RowsSource> {
        if self.derived {
            vec![RowsSource {
                columns: self.columns,
                resolved: self.resolved,
                ..RowsSource::default()
            }]
        } else {
            self.sources
        }
    }

    fn join(left: Propagated, right: Propagated) -> Self {
        let resolved = left.resolved && right.resolved;
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        let mut sources = left.into_sources();
        sources.extend(right.into_sources());
        Self {
            sources,
            columns,
            resolved,
            derived: false,
        }
    }
}

impl QueryModelRecognizer<'_> {
    pub(crate) fn propagate_content(&mut self, content: &ModelContent) -> LoweringResult<()> {
        let root = Arc::new(SourcesContext::new(Arc::clone(&self.data)));
        match content {
            ModelContent::Query(query) => {
                self.propagate_rows(query, &root)?;
            }
            ModelContent::Delete(delete) => self.propagate_delete(delete, &root)?,
            ModelContent::Insert(insert) => self.propagate_insert(insert, &root)?,
            ModelContent::Update(update) => self.propagate_update(update, &root)?,
            ModelContent::CreateTable(create) => self.propagate_create_table(create, &root)?,
            ModelContent::AlterTable(alter) => self.propagate_alter_table(alter, &root)?,
            ModelContent::Drop(drop) => self.propagate_drop(drop, &root)?,
        }
        self.classify_leftover_quoted()
    }

    /// Quoted identifiers nothing resolved are plain quoted text
    fn classify_leftover_quoted(&mut self) -> LoweringResult<()> {
        for entry in self.symbols.unclassified_entries() {
            if self.dialect.is_quoted_identifier(self.symbols.entry(entry).raw_name()) {
                self.symbols.set_symbol_class(entry, SymbolClass::Quoted)?;
            }
        }
        Ok(())
    }

    fn propagate_rows(&mut self, model: &RowsSourceModel, parent: &Arc<SourcesContext>) -> LoweringResult<Propagated> {
        trace!(kind = model.kind_name(), "propagating row source");
        match &model.kind {
            RowsSourceKind::Empty => Ok(Propagated::default()),
            RowsSourceKind::Table { name } => {
                let source = self.resolve_table(*name, parent, TableUse::Read)?;
                Ok(Propagated::from_source(source))
            }
            RowsSourceKind::Correlated { source, alias, columns } => {
                let inner = self.propagate_rows(source, parent)?;
                self.propagate_correlation(inner, *alias, columns)
            }
            RowsSourceKind::CrossJoin { left, right } => {
                let left = self.propagate_rows(left, parent)?;
                let right = self.propagate_rows(right, parent)?;
                Ok(Propagated::join(left, right))
            }
            RowsSourceKind::NaturalJoin {
                left,
                right,
                condition,
                using,
            } => {
                let left = self.propagate_rows(left, parent)?;
                let right = self.propagate_rows(right, parent)?;
                let joined = Propagated::join(left, right);
                let context = Arc::new(SourcesContext::nested(parent).with_sources(joined.sources.clone()));
                if let Some(condition) = condition {
                    self.propagate_filter(condition, &context)?;
                }
                for column in using {
                    self.resolve_column_in_sources(*column, &joined.sources)?;
                }
                Ok(joined)
            }
            RowsSourceKind::SetOperation {
                left,
                right,
                corresponding,
                ..
            } => {
                let left = self.propagate_rows(left, parent)?;
                let right = self.propagate_rows(right, parent)?;
                let left_sources = [RowsSource {
                    columns: left.columns.clone(),
                    resolved: left.resolved,
                    ..RowsSource::default()
                }];
                for column in corresponding {
                    self.resolve_column_in_sources(*column, &left_sources)?;
                }
                Ok(Propagated::derived(left.columns, left.resolved && right.resolved))
            }
            RowsSourceKind::Projection(projection) => self.propagate_projection(projection, parent),
            RowsSourceKind::Values(rows) => {
                for row in rows {
                    self.propagate_value(row, parent)?;
                }
                let width = rows.first().map_or(0, |row| match &row.kind {
                    ValueExpressionKind::Flattened(operands) => operands.len(),
                    _ => 1,
                });
                let columns = (1..=width).map(|i| ResultColumn::named(format!("column{i}"))).collect();
                Ok(Propagated::derived(columns, true))
            }
            RowsSourceKind::Cte {
                recursive,
                subqueries,
                result,
            } => {
                let mut context = SourcesContext::nested(parent);
                for subquery in subqueries {
                    let declared: Vec<ResultColumn> = subquery
                        .columns
                        .iter()
                        .map(|entry| ResultColumn::named(self.symbols.entry(*entry).name()).with_entry(*entry))
                        .collect();
                    for column in &subquery.columns {
                        self.symbols.classify_if_unknown(*column, SymbolClass::ColumnDerived)?;
                    }
                    if let Some(name) = subquery.name {
                        self.symbols.classify_if_unknown(name, SymbolClass::Table)?;
                        if *recursive {
                            context = context.with_cte(CteSource {
                                name: self.symbols.entry(name).name().to_string(),
                                entry: name,
                                columns: declared.clone(),
                            });
                        }
                    }
                    let propagated = self.propagate_rows(&subquery.source, &Arc::new(context.clone()))?;
                    if let Some(name) = subquery.name {
                        let columns = if declared.is_empty() { propagated.columns } else { declared };
                        context = context.with_cte(CteSource {
                            name: self.symbols.entry(name).name().to_string(),
                            entry: name,
                            columns,
                        });
                    }
                }
                let result = self.propagate_rows(result, &Arc::new(context))?;
                Ok(Propagated::derived(result.columns, result.resolved))
            }
        }
    }

    fn propagate_correlation(
        &mut self,
        inner: Propagated,
        alias: Option<SymbolEntryId>,
        renamed: &[SymbolEntryId],
    ) -> LoweringResult<Propagated> {
        let mut columns = inner.columns.clone();
        if !renamed.is_empty() {
            for (i, entry) in renamed.iter().enumerate() {
                self.symbols.classify_if_unknown(*entry, SymbolClass::ColumnDerived)?;
                let column = ResultColumn::named(self.symbols.entry(*entry).name()).with_entry(*entry);
                match columns.get_mut(i) {
                    Some(slot) => *slot = column,
                    None => columns.push(column),
                }
            }
        }

        let resolved = inner.resolved;
        let mut source = match (inner.derived, inner.sources.len()) {
            (false, 1) => inner.sources.into_iter().next().unwrap_or_default(),
            _ => RowsSource {
                resolved,
                ..RowsSource::default()
            },
        };
        source.columns = columns;
        if let Some(alias) = alias {
            self.symbols.classify_if_unknown(alias, SymbolClass::TableAlias)?;
            if let Some(target) = source.name_entry {
                self.symbols.set_definition(alias, SymbolDefinition::Entry(target))?;
            }
            source.alias = Some(self.symbols.entry(alias).name().to_string());
            source.alias_entry = Some(alias);
        }
        Ok(Propagated::from_source(source))
    }

    fn propagate_projection(
        &mut self,
        projection: &ProjectionModel,
        parent: &Arc<SourcesContext>,
    ) -> LoweringResult<Propagated> {
        let from = self.propagate_rows(&projection.from, parent)?;
        let mut resolved = from.resolved || matches!(projection.from.kind, RowsSourceKind::Empty);
        let sources = from.into_sources();
        let context = Arc::new(SourcesContext::nested(parent).with_sources(sources));
        if let Some(scope) = projection.from_scope {
            self.scopes.get_mut(scope).set_context(Arc::clone(parent));
        }

        let mut result = Vec::new();
        for item in &projection.items {
            match item {
                SelectItem::Column { node, expr, alias } => {
                    self.propagate_value(expr, &context)?;
                    let column = match &expr.kind {
                        ValueExpressionKind::ColumnReference { column: Some(column), .. } => {
                            let named = ResultColumn::named(self.symbols.entry(*column).name()).with_entry(*column);
                            match self.symbols.resolve_object(*column) {
                                Some(object) => named.with_object(object),
                                None => named,
                            }
                        }
                        _ => ResultColumn::named(self.tree.text(*node)),
                    };
                    let column = match alias {
                        Some(alias) => {
                            self.symbols.classify_if_unknown(*alias, SymbolClass::ColumnDerived)?;
                            if let Some(target) = column.entry {
                                self.symbols.set_definition(*alias, SymbolDefinition::Entry(target))?;
                            }
                            ResultColumn {
                                name: self.symbols.entry(*alias).name().to_string(),
                                entry: Some(*alias),
                                object: column.object,
                            }
                        }
                        None => column,
                    };
                    result.push(column);
                }
                SelectItem::Tuple { expr, .. } => {
                    self.propagate_value(expr, &context)?;
                    if let ValueExpressionKind::TupleReference { table: Some(table) } = &expr.kind {
                        let qualifier = self.entity_name(*table);
                        if let Some(source) = context.find_source(&qualifier) {
                            resolved &= source.resolved;
                            result.extend(source.columns.iter().cloned());
                        }
                    }
                }
                SelectItem::CompleteTuple { .. } => {
                    for source in context.sources() {
                        resolved &= source.resolved;
                        result.extend(source.columns.iter().cloned());
                    }
                }
            }
        }

        let full = Arc::new((*context).clone().with_result(result.clone()));
        self.scopes.get_mut(projection.select_scope).set_context(Arc::clone(&full));
        for filter in projection.filters.iter() {
            self.propagate_filter(filter, &full)?;
        }
        Ok(Propagated::derived(result, resolved))
    }

    fn propagate_filter(&mut self, filter: &Filter, context: &Arc<SourcesContext>) -> LoweringResult<()> {
        self.scopes.get_mut(filter.scope).set_context(Arc::clone(context));
        self.propagate_value(&filter.expr, context)
    }

    /// Resolve every name in an expression tree
    fn propagate_value(&mut self, expr: &ValueExpression, context: &Arc<SourcesContext>) -> LoweringResult<()> {
        let mut stack = vec![expr];
        while let Some(expr) = stack.pop() {
            if let Some(scope) = expr.scope {
                self.scopes.get_mut(scope).set_context(Arc::clone(context));
            }
            match &expr.kind {
                ValueExpressionKind::Constant(_) => {}
                ValueExpressionKind::ColumnReference { table, column } => {
                    self.resolve_column_reference(*table, *column, context)?;
                }
                ValueExpressionKind::TupleReference { table } => {
                    if let Some(table) = table {
                        self.resolve_qualifier(*table, context)?;
                    }
                }
                ValueExpressionKind::Variable { kind, entry } => {
                    let class = if kind.is_parameter() {
                        SymbolClass::Parameter
                    } else {
                        SymbolClass::Variable
                    };
                    self.symbols.classify_if_unknown(*entry, class)?;
                }
                ValueExpressionKind::Subquery(query) => {
                    self.propagate_rows(query, context)?;
                }
                ValueExpressionKind::Flattened(operands) => stack.extend(operands.iter()),
                ValueExpressionKind::TypeCast { value, .. } => stack.push(value),
            }
        }
        Ok(())
    }

    fn entity_name(&self, name: QualifiedNameId) -> String {
        let entity = self.symbols.qualified_name(name).entity_name();
        self.symbols.entry(entity).name().to_string()
    }

    /// Find a table for a name, classifying the name on the way
    fn resolve_table(
        &mut self,
        name: Option<QualifiedNameId>,
        context: &SourcesContext,
        usage: TableUse,
    ) -> LoweringResult<RowsSource> {
        let Some(name) = name else {
            return Ok(RowsSource::default());
        };
        let qualified = self.symbols.qualified_name(name);
        let entity = qualified.entity_name();
        let is_simple = qualified.scope_name().is_empty();
        let invalid_parts = qualified.invalid_parts_count();
        let mut source = RowsSource {
            name: Some(self.symbols.entry(entity).name().to_string()),
            name_entry: Some(entity),
            ..RowsSource::default()
        };

        if invalid_parts > 0 {
            self.symbols
                .perform_partial_resolution(name, &self.data, self.ctx.problem_collector())?;
            return Ok(source);
        }
        if is_simple && usage == TableUse::Read {
            if let Some(cte) = source.name.as_deref().and_then(|n| context.find_cte(n)) {
                self.symbols.merge_entries(cte.entry, entity)?;
                source.columns = cte.columns.clone();
                source.resolved = true;
                return Ok(source);
            }
        }

        let parts = self.symbols.name_parts(name);
        match self.data.find_real_table(&parts) {
            Ok(Some(table)) => {
                self.symbols.set_name_definition(name, &table)?;
                source.columns = ResultColumn::from_table(&table);
                source.table = Some(table);
                source.resolved = true;
            }
            Ok(None) => {
                let raw = self.symbols.entry(entity).raw_name();
                if let Some(class) = string_literal_fallback(self.dialect, raw, false) {
                    self.symbols.classify_if_unknown(entity, class)?;
                } else if usage != TableUse::Read || self.data.is_dummy() {
                    self.symbols.classify_if_unknown(entity, SymbolClass::Table)?;
                } else {
                    self.report_unresolved(entity, format!("Table {} not found", parts.join(".")))?;
                }
            }
            Err(err) => {
                let interval = self.symbols.qualified_name(name).interval();
                self.ctx.append_problem(
                    RecognitionProblem::error(interval, format!("Failed to resolve {}", parts.join(".")))
                        .with_entry(entity)
                        .with_cause(err.to_string()),
                );
            }
        }
        Ok(source)
    }

    /// Resolve the table part of `t.col` or `t.*`
    fn resolve_qualifier(&mut self, name: QualifiedNameId, context: &SourcesContext) -> LoweringResult<Option<RowsSource>> {
        let qualified = self.symbols.qualified_name(name);
        let entity = qualified.entity_name();
        let is_simple = qualified.scope_name().is_empty();
        if qualified.invalid_parts_count() > 0 {
            self.symbols
                .perform_partial_resolution(name, &self.data, self.ctx.problem_collector())?;
            return Ok(None);
        }

        let qualifier = self.entity_name(name);
        if let Some(source) = context.find_source(&qualifier) {
            match (&source.table, source.qualifier_entry()) {
                (Some(table), _) if !is_simple => self.symbols.set_name_definition(name, table)?,
                (_, Some(target)) if target != entity => {
                    self.symbols.set_definition(entity, SymbolDefinition::Entry(target))?;
                }
                _ => {}
            }
            return Ok(Some(source.clone()));
        }

        // not a visible source: a table path written out in full
        let parts = self.symbols.name_parts(name);
        if let Ok(Some(table)) = self.data.find_real_table(&parts) {
            self.symbols.set_name_definition(name, &table)?;
            return Ok(Some(RowsSource {
                name: Some(qualifier),
                name_entry: Some(entity),
                columns: ResultColumn::from_table(&table),
                table: Some(table),
                resolved: true,
                ..RowsSource::default()
            }));
        }
        let raw = self.symbols.entry(entity).raw_name();
        if let Some(class) = string_literal_fallback(self.dialect, raw, false) {
            self.symbols.classify_if_unknown(entity, class)?;
        } else if !self.data.is_dummy() && !context.has_unresolved_source_outwards() {
            self.report_unresolved(entity, format!("Table or alias {qualifier} not found"))?;
        }
        Ok(None)
    }

    fn resolve_column_reference(
        &mut self,
        table: Option<QualifiedNameId>,
        column: Option<SymbolEntryId>,
        context: &SourcesContext,
    ) -> LoweringResult<()> {
        let Some(table) = table else {
            return match column {
                Some(column) => self.resolve_unqualified_column(column, context),
                None => Ok(()),
            };
        };
        let source = self.resolve_qualifier(table, context)?;
        let Some(column) = column else {
            return Ok(());
        };
        match source {
            Some(source) => self.resolve_column_in_sources(column, std::slice::from_ref(&source)),
            None => {
                self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
                Ok(())
            }
        }
    }

    fn resolve_unqualified_column(&mut self, column: SymbolEntryId, context: &SourcesContext) -> LoweringResult<()> {
        let name = self.symbols.entry(column).name().to_string();
        match context.resolve_column(&name) {
            ColumnLookup::Found { column: found, .. } => self.define_column(column, found),
            ColumnLookup::Ambiguous(sources) => {
                self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
                if !self.data.is_dummy() {
                    let interval = self.symbols.entry(column).interval();
                    self.ctx.append_problem(
                        RecognitionProblem::warning(
                            interval,
                            format!("Column {name} is ambiguous between {}", sources.join(", ")),
                        )
                        .with_entry(column),
                    );
                }
                Ok(())
            }
            ColumnLookup::NotFound => {
                if let Some(result) = context.find_result_column(&name) {
                    self.symbols.classify_if_unknown(column, SymbolClass::ColumnDerived)?;
                    if let Some(target) = result.entry.filter(|target| *target != column) {
                        self.symbols.set_definition(column, SymbolDefinition::Entry(target))?;
                    }
                    return Ok(());
                }
                if self.try_string_fallback(column)? {
                    return Ok(());
                }
                if self.data.is_dummy() || context.has_unresolved_source_outwards() {
                    self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
                    return Ok(());
                }
                self.report_unresolved(column, format!("Column {name} not found"))
            }
        }
    }

    /// Resolve a column against specific sources, e.g. `USING (id)`
    fn resolve_column_in_sources(&mut self, column: SymbolEntryId, sources: &[RowsSource]) -> LoweringResult<()> {
        let name = self.symbols.entry(column).name().to_string();
        if let Some(found) = sources.iter().find_map(|source| source.find_column(&name)) {
            return self.define_column(column, found);
        }
        if self.data.is_dummy() || sources.iter().any(|source| !source.resolved) {
            self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
            return Ok(());
        }
        let labels: Vec<&str> = sources.iter().map(RowsSource::label).collect();
        self.report_unresolved(column, format!("Column {name} not found in {}", labels.join(", ")))
    }

    fn define_column(&mut self, column: SymbolEntryId, found: &ResultColumn) -> LoweringResult<()> {
        match (&found.object, found.entry) {
            (Some(object), _) => self.symbols.set_definition(column, SymbolDefinition::Object(Arc::clone(object)))?,
            (None, Some(target)) if target != column => {
                self.symbols.set_definition(column, SymbolDefinition::Entry(target))?;
                self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
            }
            _ => {
                self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
            }
        }
        Ok(())
    }

    fn report_unresolved(&mut self, entry: SymbolEntryId, message: String) -> LoweringResult<()> {
        self.symbols.classify_if_unknown(entry, SymbolClass::Error)?;
        let interval = self.symbols.entry(entry).interval();
        self.ctx
            .append_problem(RecognitionProblem::error(interval, message).with_entry(entry));
        Ok(())
    }

    /// Context of a statement that works on a single table
    fn target_context(
        &mut self,
        table: Option<QualifiedNameId>,
        alias: Option<SymbolEntryId>,
        root: &Arc<SourcesContext>,
    ) -> LoweringResult<Arc<SourcesContext>> {
        let target = self.resolve_table(table, root, TableUse::Read)?;
        let target = self.propagate_correlation(Propagated::from_source(target), alias, &[])?;
        Ok(Arc::new(SourcesContext::nested(root).with_sources(target.sources)))
    }

    fn propagate_delete(&mut self, delete: &DeleteModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        let context = self.target_context(delete.table, delete.alias, root)?;
        if let Some(scope) = delete.scope {
            self.scopes.get_mut(scope).set_context(Arc::clone(&context));
        }
        if let Some(condition) = &delete.condition {
            self.propagate_filter(condition, &context)?;
        }
        Ok(())
    }

    fn propagate_update(&mut self, update: &UpdateModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        let context = self.target_context(update.table, update.alias, root)?;
        if let Some(scope) = update.scope {
            self.scopes.get_mut(scope).set_context(Arc::clone(&context));
        }
        for clause in &update.set_clauses {
            if let Some(target) = clause.target {
                self.resolve_column_in_sources(target, context.sources())?;
            }
            if let Some(value) = &clause.value {
                self.propagate_value(value, &context)?;
            }
        }
        if let Some(condition) = &update.condition {
            self.propagate_filter(condition, &context)?;
        }
        Ok(())
    }

    fn propagate_insert(&mut self, insert: &InsertModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        let context = self.target_context(insert.table, None, root)?;
        for column in &insert.columns {
            self.resolve_column_in_sources(*column, context.sources())?;
        }
        if let Some(source) = &insert.source {
            self.propagate_rows(source, root)?;
        }
        Ok(())
    }

    fn propagate_create_table(&mut self, create: &CreateTableModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        self.resolve_table(create.table, root, TableUse::Create)?;
        let mut declared = Vec::new();
        for definition in &create.columns {
            if let Some(name) = definition.name {
                self.symbols.classify_if_unknown(name, SymbolClass::Column)?;
                declared.push(ResultColumn::named(self.symbols.entry(name).name()).with_entry(name));
            }
        }
        let table = RowsSource {
            columns: declared,
            resolved: true,
            ..RowsSource::default()
        };
        for column in &create.constraint_columns {
            self.resolve_column_in_sources(*column, std::slice::from_ref(&table))?;
        }
        for reference in &create.references {
            let target = self.resolve_table(reference.table, root, TableUse::Read)?;
            for column in &reference.columns {
                self.resolve_column_in_sources(*column, std::slice::from_ref(&target))?;
            }
        }
        Ok(())
    }

    fn propagate_alter_table(&mut self, alter: &AlterTableModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        let context = self.target_context(alter.table, None, root)?;
        if let Some(scope) = alter.scope {
            self.scopes.get_mut(scope).set_context(Arc::clone(&context));
        }
        let mut added = Vec::new();
        for action in &alter.actions {
            if let Some(column) = action.column {
                match action.change {
                    ColumnChange::Add => {
                        self.symbols.classify_if_unknown(column, SymbolClass::Column)?;
                        added.push(ResultColumn::named(self.symbols.entry(column).name()).with_entry(column));
                    }
                    ColumnChange::Drop | ColumnChange::Alter => {
                        self.resolve_column_in_sources(column, context.sources())?;
                    }
                }
            }
            if let Some(default) = &action.default {
                self.propagate_value(default, &context)?;
            }
        }
        // constraints may name the columns added alongside them
        let mut sources = context.sources().to_vec();
        sources.push(RowsSource {
            columns: added,
            resolved: true,
            ..RowsSource::default()
        });
        for column in &alter.constraint_columns {
            self.resolve_column_in_sources(*column, &sources)?;
        }
        for reference in &alter.references {
            let target = self.resolve_table(reference.table, root, TableUse::Read)?;
            for column in &reference.columns {
                self.resolve_column_in_sources(*column, std::slice::from_ref(&target))?;
            }
        }
        Ok(())
    }

    fn propagate_drop(&mut self, drop: &DropModel, root: &Arc<SourcesContext>) -> LoweringResult<()> {
        if drop.object == DroppedObject::Procedure {
            for name in &drop.names {
                self.resolve_routine(*name)?;
            }
            return Ok(());
        }
        let usage = if drop.if_exists {
            TableUse::DropIfExists
        } else {
            TableUse::Read
        };
        for table in &drop.names {
            self.resolve_table(Some(*table), root, usage)?;
        }
        Ok(())
    }

    /// Classify a routine name, resolving the schema it is qualified with
    ///
    /// Routines are not looked up, so a missing one is never reported.
    fn resolve_routine(&mut self, name: QualifiedNameId) -> LoweringResult<()> {
        let qualified = self.symbols.qualified_name(name);
        let entity = qualified.entity_name();
        let scope: Vec<SymbolEntryId> = qualified.scope_name().iter().flatten().copied().collect();
        if qualified.invalid_parts_count() == 0 && !scope.is_empty() {
            let parts: Vec<String> = scope
                .iter()
                .map(|entry| self.symbols.entry(*entry).name().to_string())
                .collect();
            match self.data.find_real_object(&parts) {
                Ok(Some(object)) if !object.is_table_like() => {
                    let mut current = Some(&object);
                    for entry in scope.iter().rev() {
                        let Some(target) = current else {
                            break;
                        };
                        self.symbols
                            .set_definition(*entry, SymbolDefinition::Object(Arc::clone(target)))?;
                        current = target.parent();
                    }
                }
                Ok(_) => trace!(schema = %parts.join("."), "routine schema not found"),
                Err(err) => trace!(schema = %parts.join("."), error = %err, "routine schema lookup failed"),
            }
        }
        self.symbols.classify_if_unknown(entity, SymbolClass::Routine)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlscope_catalog::CatalogSnapshot;
    use sqlscope_ir::{ColumnMetadata, DataType, Dialect, TableMetadata};
    use sqlscope_semantic::{ProblemSeverity, SymbolClass};

    use crate::context::{RecognitionContext, RecognitionSettings};
    use crate::model::Model;
    use crate::recognizer::recognize;

    fn snapshot() -> Arc<CatalogSnapshot> {
        Arc::new(CatalogSnapshot::from_tables(vec![
            TableMetadata::new("users", "public").with_columns(vec![
                ColumnMetadata::new("id", DataType::Integer),
                ColumnMetadata::new("name", DataType::Text),
            ]),
            TableMetadata::new("orders", "public").with_columns(vec![
                ColumnMetadata::new("id", DataType::Integer),
                ColumnMetadata::new("user_id", DataType::Integer),
            ]),
        ]))
    }

    fn with_metadata(text: &str) -> (Model, RecognitionContext) {
        let mut ctx =
            RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::PostgreSQL)).with_snapshot(snapshot());
        let model = recognize(text, &mut ctx).unwrap();
        (model, ctx)
    }

    fn class_of(model: &Model, raw: &str) -> SymbolClass {
        let (id, _) = model
            .symbols()
            .entries()
            .find(|(_, entry)| entry.raw_name() == raw)
            .unwrap_or_else(|| panic!("no entry {raw}"));
        model.symbols().class_of(id)
    }

    #[test]
    fn test_columns_resolve_through_aliases() {
        let (model, ctx) = with_metadata("SELECT u.name, o.user_id FROM users u JOIN orders o ON o.user_id = u.id");
        assert!(ctx.problems().is_empty(), "{:?}", ctx.problems());
        assert_eq!(class_of(&model, "users"), SymbolClass::Table);
        assert_eq!(class_of(&model, "u"), SymbolClass::TableAlias);
        assert_eq!(class_of(&model, "name"), SymbolClass::Column);
        assert_eq!(class_of(&model, "user_id"), SymbolClass::Column);
    }

    #[test]
    fn test_missing_table_and_column_are_problems() {
        let (model, ctx) = with_metadata("SELECT nope FROM users");
        assert_eq!(class_of(&model, "nope"), SymbolClass::Error);
        assert_eq!(ctx.problems().len(), 1);
        assert_eq!(ctx.problems()[0].message, "Column nope not found");

        let (model, ctx) = with_metadata("SELECT a FROM missing");
        assert_eq!(class_of(&model, "missing"), SymbolClass::Error);
        // columns of an unknown table are not reported
        assert_eq!(class_of(&model, "a"), SymbolClass::Column);
        assert_eq!(ctx.problems().len(), 1);
    }

    #[test]
    fn test_ambiguous_column_is_a_warning() {
        let (_, ctx) = with_metadata("SELECT id FROM users, orders");
        assert_eq!(ctx.problems().len(), 1);
        assert_eq!(ctx.problems()[0].severity, ProblemSeverity::Warning);
    }

    #[test]
    fn test_cte_usage_merges_with_definition() {
        let (model, ctx) = with_metadata("WITH recent AS (SELECT id FROM orders) SELECT r.id FROM recent r");
        assert!(ctx.problems().is_empty(), "{:?}", ctx.problems());
        let recent: Vec<_> = model
            .symbols()
            .entries()
            .filter(|(_, e)| e.raw_name() == "recent")
            .map(|(id, _)| model.symbols().symbol_of(id))
            .collect();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0], recent[1]);
        assert_eq!(class_of(&model, "recent"), SymbolClass::Table);
    }

    #[test]
    fn test_order_by_alias() {
        let (model, ctx) = with_metadata("SELECT name AS n FROM users ORDER BY n");
        assert!(ctx.problems().is_empty(), "{:?}", ctx.problems());
        let classes: Vec<SymbolClass> = model
            .symbols()
            .entries()
            .filter(|(_, e)| e.raw_name() == "n")
            .map(|(id, _)| model.symbols().class_of(id))
            .collect();
        assert_eq!(classes, vec![SymbolClass::ColumnDerived, SymbolClass::ColumnDerived]);
    }

    #[test]
    fn test_scopes_carry_context() {
        let (model, _) = with_metadata("SELECT id FROM users WHERE");
        let position = model.text().len();
        let context = model.context_at(position).unwrap();
        assert_eq!(context.sources().len(), 1);
        assert!(context.sources()[0].find_column("name").is_some());
    }

    #[test]
    fn test_dml_targets() {
        let (model, ctx) = with_metadata("UPDATE users SET name = 'x' WHERE id = 1");
        assert!(ctx.problems().is_empty(), "{:?}", ctx.problems());
        assert_eq!(class_of(&model, "name"), SymbolClass::Column);

        let (model, ctx) = with_metadata("DROP TABLE IF EXISTS gone");
        assert!(ctx.problems().is_empty());
        assert_eq!(class_of(&model, "gone"), SymbolClass::Table);
    }

    #[test]
    fn test_alter_table_columns_resolve_against_target() {
        let (model, ctx) = with_metadata(
            "ALTER TABLE orders DROP COLUMN nope, ALTER user_id SET DEFAULT 1, ADD COLUMN note TEXT, \
             ADD UNIQUE (note, id)",
        );
        assert_eq!(class_of(&model, "orders"), SymbolClass::Table);
        assert_eq!(class_of(&model, "user_id"), SymbolClass::Column);
        assert_eq!(class_of(&model, "note"), SymbolClass::Column);
        assert_eq!(class_of(&model, "id"), SymbolClass::Column);
        assert_eq!(class_of(&model, "nope"), SymbolClass::Error);
        assert_eq!(ctx.problems().len(), 1, "{:?}", ctx.problems());
        assert!(ctx.problems()[0].message.starts_with("Column nope not found"));

        let (_, ctx) = with_metadata("ALTER TABLE missing ADD c INT");
        assert_eq!(ctx.problems().len(), 1);
        assert_eq!(ctx.problems()[0].message, "Table missing not found");
    }

    #[test]
    fn test_alter_table_scope_sees_target_columns() {
        let (model, _) = with_metadata("ALTER TABLE users DROP COLUMN id");
        let context = model.context_at(model.text().len() - 1).unwrap();
        assert_eq!(context.sources().len(), 1);
        assert!(context.sources()[0].find_column("name").is_some());
    }

    #[test]
    fn test_drop_procedure_is_not_looked_up() {
        let (model, ctx) = with_metadata("DROP PROCEDURE public.refresh, users");
        assert!(ctx.problems().is_empty(), "{:?}", ctx.problems());
        assert_eq!(class_of(&model, "public"), SymbolClass::Schema);
        assert_eq!(class_of(&model, "refresh"), SymbolClass::Routine);
        // a table of the same name does not make it a table
        assert_eq!(class_of(&model, "users"), SymbolClass::Routine);
    }

    #[test]
    fn test_variables_and_parameters() {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::PostgreSQL));
        let model = recognize("SELECT a FROM t WHERE a = :p AND b = ?", &mut ctx).unwrap();
        assert_eq!(class_of(&model, ":p"), SymbolClass::Parameter);
        assert_eq!(class_of(&model, "?"), SymbolClass::Parameter);
    }
}
