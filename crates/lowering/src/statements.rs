// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # DML and DDL statements
//!
//! Builders for the statements the row source mapper does not cover:
//! `DELETE`, `INSERT`, `UPDATE`, `CREATE TABLE`, `ALTER TABLE` and
//! `DROP TABLE/VIEW/PROCEDURE`.

use std::sync::Arc;

use sqlscope_grammar::{NodeId, RuleKind, TokenKind};
use sqlscope_ir::Interval;
use sqlscope_semantic::{LexicalScope, QualifiedNameId, ScopeId, SymbolEntryId};

use crate::error::LoweringResult;
use crate::model::{
    AlterColumnAction, AlterTableModel, ColumnChange, ColumnDefinition, CreateTableModel, DeleteModel, DropModel,
    DroppedObject, Filter, ForeignReference, InsertModel, SetClause, UpdateModel,
};
use crate::recognizer::QueryModelRecognizer;

impl QueryModelRecognizer<'_> {
    pub(crate) fn collect_delete(&mut self, node: NodeId) -> LoweringResult<DeleteModel> {
        let table = self.collect_table_name(node);
        let alias = self.collect_correlation_alias(node);
        let condition = self.collect_where(node)?;
        let scope = self.statement_scope(node, table);
        Ok(DeleteModel {
            table,
            alias,
            condition,
            scope,
        })
    }

    pub(crate) fn collect_insert(&mut self, node: NodeId) -> LoweringResult<InsertModel> {
        let tree = Arc::clone(&self.tree);
        let table = self.collect_table_name(node);
        let Some(columns_and_source) = tree.find_child_of_rule(node, RuleKind::InsertColumnsAndSource) else {
            return Ok(InsertModel {
                table,
                columns: Vec::new(),
                source: None,
            });
        };
        let columns = self.collect_column_name_list(columns_and_source);
        let source = match tree.find_child_of_rule(columns_and_source, RuleKind::QueryExpression) {
            Some(query) => Some(self.collect_subquery(query)?),
            None => None,
        };
        Ok(InsertModel { table, columns, source })
    }

    pub(crate) fn collect_update(&mut self, node: NodeId) -> LoweringResult<UpdateModel> {
        let tree = Arc::clone(&self.tree);
        let table = self.collect_table_name(node);
        let alias = self.collect_correlation_alias(node);

        let mut set_clauses = Vec::new();
        if let Some(list) = tree.find_child_of_rule(node, RuleKind::SetClauseList) {
            for clause in tree.children(list) {
                if !tree.is_rule(clause, RuleKind::SetClause) {
                    continue;
                }
                let target = tree
                    .find_child_of_rule(clause, RuleKind::SetTarget)
                    .and_then(|target| tree.find_child_of_rule(target, RuleKind::ColumnName))
                    .and_then(|name| self.collect_identifier(name));
                let value = match tree
                    .find_child_of_rule(clause, RuleKind::UpdateSource)
                    .and_then(|source| tree.find_child_of_rule(source, RuleKind::ValueExpression))
                {
                    Some(value) => Some(self.collect_value_expression(value)?),
                    None => None,
                };
                set_clauses.push(SetClause {
                    node: clause,
                    target,
                    value,
                });
            }
        }

        let condition = self.collect_where(node)?;
        let scope = self.statement_scope(node, table);
        Ok(UpdateModel {
            table,
            alias,
            set_clauses,
            condition,
            scope,
        })
    }

    pub(crate) fn collect_create_table(&mut self, node: NodeId) -> CreateTableModel {
        let tree = Arc::clone(&self.tree);
        let mut model = CreateTableModel {
            table: self.collect_table_name(node),
            if_not_exists: tree.find_child_of_rule(node, RuleKind::IfNotExists).is_some(),
            columns: Vec::new(),
            constraint_columns: Vec::new(),
            references: Vec::new(),
        };
        let Some(list) = tree.find_child_of_rule(node, RuleKind::TableElementList) else {
            return model;
        };
        for element in tree.children(list).filter_map(|e| tree.first_child(e)) {
            match tree.rule(element) {
                Some(RuleKind::ColumnDefinition) => {
                    let definition = self.collect_column_definition(element, &mut model.references);
                    model.columns.push(definition);
                }
                Some(RuleKind::TableConstraint) => {
                    let columns = self.collect_column_name_list(element);
                    model.constraint_columns.extend(columns);
                }
                _ => {}
            }
        }
        model
    }

    pub(crate) fn collect_alter_table(&mut self, node: NodeId) -> LoweringResult<AlterTableModel> {
        let tree = Arc::clone(&self.tree);
        let table = self.collect_table_name(node);
        let mut model = AlterTableModel {
            table,
            actions: Vec::new(),
            constraint_columns: Vec::new(),
            references: Vec::new(),
            scope: None,
        };
        let actions = tree
            .children(node)
            .filter(|child| tree.is_rule(*child, RuleKind::AlterTableAction))
            .filter_map(|action| tree.first_child(action));
        for action in actions {
            let change = match tree.rule(action) {
                Some(RuleKind::AddTableConstraintDefinition) => {
                    if let Some(constraint) = tree.find_child_of_rule(action, RuleKind::TableConstraint) {
                        let columns = self.collect_column_name_list(constraint);
                        model.constraint_columns.extend(columns);
                    }
                    continue;
                }
                Some(RuleKind::AddColumnDefinition) => {
                    let Some(element) = tree.find_child_of_rule(action, RuleKind::ColumnDefinition) else {
                        continue;
                    };
                    let definition = self.collect_column_definition(element, &mut model.references);
                    model.actions.push(AlterColumnAction {
                        node: action,
                        change: ColumnChange::Add,
                        column: definition.name,
                        type_name: Some(definition.type_name),
                        default: None,
                    });
                    continue;
                }
                Some(RuleKind::DropColumnDefinition) => ColumnChange::Drop,
                Some(RuleKind::AlterColumnDefinition) => ColumnChange::Alter,
                _ => continue,
            };
            let column = tree
                .find_child_of_rule(action, RuleKind::ColumnName)
                .and_then(|name| self.collect_identifier(name));
            let default = match tree
                .find_child_of_rule(action, RuleKind::AlterColumnAction)
                .and_then(|clause| tree.find_child_of_rule(clause, RuleKind::ValueExpression))
            {
                Some(value) => Some(self.collect_value_expression(value)?),
                None => None,
            };
            model.actions.push(AlterColumnAction {
                node: action,
                change,
                column,
                type_name: None,
                default,
            });
        }
        model.scope = self.statement_scope(node, table);
        Ok(model)
    }

    /// A column definition of CREATE TABLE or `ALTER TABLE ... ADD`
    fn collect_column_definition(
        &mut self,
        element: NodeId,
        references: &mut Vec<ForeignReference>,
    ) -> ColumnDefinition {
        let tree = Arc::clone(&self.tree);
        let name = tree
            .find_child_of_rule(element, RuleKind::ColumnName)
            .and_then(|name| self.collect_identifier(name));
        let type_name = tree
            .find_child_of_rule(element, RuleKind::DataType)
            .map(|data_type| tree.text(data_type).to_string())
            .unwrap_or_default();
        for constraint in tree.children(element) {
            if tree.is_rule(constraint, RuleKind::ColumnConstraint)
                && tree.find_child_of_token(constraint, TokenKind::References).is_some()
            {
                let table = self.collect_table_name(constraint);
                let columns = self.collect_column_name_list(constraint);
                references.push(ForeignReference { table, columns });
            }
        }
        ColumnDefinition {
            node: element,
            name,
            type_name,
        }
    }

    pub(crate) fn collect_drop(&mut self, node: NodeId, object: DroppedObject) -> DropModel {
        let tree = Arc::clone(&self.tree);
        let name_rule = match object {
            DroppedObject::Table | DroppedObject::View => RuleKind::TableName,
            DroppedObject::Procedure => RuleKind::ProcedureName,
        };
        let names = tree
            .children(node)
            .filter(|child| tree.is_rule(*child, name_rule))
            .filter_map(|name| self.collect_qualified_name(name))
            .collect();
        DropModel {
            object,
            if_exists: tree.find_child_of_rule(node, RuleKind::IfExists).is_some(),
            names,
        }
    }

    fn collect_correlation_alias(&mut self, node: NodeId) -> Option<SymbolEntryId> {
        let tree = Arc::clone(&self.tree);
        let correlation = tree.find_child_of_rule(node, RuleKind::CorrelationSpecification)?;
        let name = tree.find_child_of_rule(correlation, RuleKind::CorrelationName)?;
        self.collect_identifier(name)
    }

    fn collect_where(&mut self, node: NodeId) -> LoweringResult<Option<Filter>> {
        let Some(clause) = self.tree.find_child_of_rule(node, RuleKind::WhereClause) else {
            return Ok(None);
        };
        self.collect_filter(clause, clause).map(Some)
    }

    /// Scope from the target table to the end of the statement
    fn statement_scope(&mut self, node: NodeId, table: Option<QualifiedNameId>) -> Option<ScopeId> {
        let start = self.symbols.qualified_name(table?).interval().end;
        let end = self.tree.interval(node).end.max(start);
        let mut scope = LexicalScope::new();
        scope.set_interval(Interval::new(start, end));
        Some(self.scopes.push(scope))
    }
}

#[cfg(test)]
mod tests {
    use sqlscope_ir::Dialect;

    use crate::context::{RecognitionContext, RecognitionSettings};
    use crate::model::{ColumnChange, DroppedObject, Model, ModelContent};
    use crate::recognizer::recognize;

    fn model(text: &str) -> Model {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::PostgreSQL));
        recognize(text, &mut ctx).unwrap()
    }

    #[test]
    fn test_delete() {
        let model = model("DELETE FROM users u WHERE u.id = 1");
        let Some(ModelContent::Delete(delete)) = model.content() else {
            panic!("delete expected");
        };
        assert!(delete.table.is_some());
        assert!(delete.alias.is_some());
        assert!(delete.condition.is_some());
        assert!(delete.scope.is_some());
    }

    #[test]
    fn test_insert_with_columns_and_query() {
        let model = model("INSERT INTO t (a, b) SELECT x, y FROM u");
        let Some(ModelContent::Insert(insert)) = model.content() else {
            panic!("insert expected");
        };
        assert_eq!(insert.columns.len(), 2);
        assert_eq!(insert.source.as_ref().map(|s| s.kind_name()), Some("projection"));
    }

    #[test]
    fn test_update_set_clauses() {
        let model = model("UPDATE t SET a = 1, b = DEFAULT WHERE c > 2");
        let Some(ModelContent::Update(update)) = model.content() else {
            panic!("update expected");
        };
        assert_eq!(update.set_clauses.len(), 2);
        assert!(update.set_clauses[0].value.is_some());
        assert!(update.set_clauses[1].value.is_none());
        assert!(update.condition.is_some());
    }

    #[test]
    fn test_create_table() {
        let model = model(
            "CREATE TABLE IF NOT EXISTS orders (id INTEGER, user_id INTEGER REFERENCES users (id), PRIMARY KEY (id))",
        );
        let Some(ModelContent::CreateTable(create)) = model.content() else {
            panic!("create table expected");
        };
        assert!(create.if_not_exists);
        assert_eq!(create.columns.len(), 2);
        assert_eq!(create.columns[0].type_name, "INTEGER");
        assert_eq!(create.constraint_columns.len(), 1);
        assert_eq!(create.references.len(), 1);
        assert_eq!(create.references[0].columns.len(), 1);
    }

    #[test]
    fn test_drop() {
        let model = model("DROP VIEW IF EXISTS a, s.b CASCADE");
        let Some(ModelContent::Drop(drop)) = model.content() else {
            panic!("drop expected");
        };
        assert_eq!(drop.object, DroppedObject::View);
        assert!(drop.if_exists);
        assert_eq!(drop.names.len(), 2);
    }

    #[test]
    fn test_drop_procedure() {
        let model = model("DROP PROCEDURE s.refresh, cleanup");
        let Some(ModelContent::Drop(drop)) = model.content() else {
            panic!("drop expected");
        };
        assert_eq!(drop.object, DroppedObject::Procedure);
        assert!(!drop.if_exists);
        assert_eq!(drop.names.len(), 2);
        assert_eq!(model.symbols().name_parts(drop.names[0]), vec!["s", "refresh"]);
    }

    #[test]
    fn test_alter_table_actions() {
        let model = model(
            "ALTER TABLE orders ADD COLUMN note VARCHAR(40) REFERENCES notes (id), DROP legacy CASCADE, \
             ALTER COLUMN total SET DEFAULT 0, ADD UNIQUE (note)",
        );
        let Some(ModelContent::AlterTable(alter)) = model.content() else {
            panic!("alter table expected");
        };
        assert!(alter.table.is_some());
        assert!(alter.scope.is_some());
        let changes: Vec<ColumnChange> = alter.actions.iter().map(|action| action.change).collect();
        assert_eq!(changes, vec![ColumnChange::Add, ColumnChange::Drop, ColumnChange::Alter]);
        assert!(alter.actions.iter().all(|action| action.column.is_some()));
        assert_eq!(alter.actions[0].type_name.as_deref(), Some("VARCHAR(40)"));
        assert!(alter.actions[1].default.is_none());
        assert!(alter.actions[2].default.is_some());
        assert_eq!(alter.constraint_columns.len(), 1);
        assert_eq!(alter.references.len(), 1);
    }
}
