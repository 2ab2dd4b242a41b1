// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Qualified names
//!
//! A qualified name such as `app.public.users` is a list of scope parts
//! (`app`, `public`) and a terminal entity part (`users`). A part is `None`
//! when the text is incomplete, as in `public..users`; such
//! names count their invalid parts and can only be resolved partially.
//!
//! Names live in the [`SymbolTable`] next to the entries their parts point
//! at, and resolution writes definitions into those entries.

use std::sync::Arc;

use serde::Serialize;
use sqlscope_catalog::DatabaseObject;
use sqlscope_grammar::NodeId;
use sqlscope_ir::Interval;
use tracing::debug;

use crate::data_context::QueryDataContext;
use crate::error::SemanticResult;
use crate::problem::{ProblemCollector, RecognitionProblem};
use crate::symbol::{SymbolClass, SymbolDefinition, SymbolEntryId, SymbolTable};

/// Index of a [`QualifiedName`] in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QualifiedNameId(u32);

impl QualifiedNameId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Multi-part identifier
#[derive(Debug, Clone)]
pub struct QualifiedName {
    node: NodeId,
    interval: Interval,
    scope_name: Vec<Option<SymbolEntryId>>,
    entity_name: SymbolEntryId,
    invalid_parts_count: usize,
}

impl QualifiedName {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Container parts, outermost first
    pub fn scope_name(&self) -> &[Option<SymbolEntryId>] {
        &self.scope_name
    }

    pub fn entity_name(&self) -> SymbolEntryId {
        self.entity_name
    }

    pub fn invalid_parts_count(&self) -> usize {
        self.invalid_parts_count
    }

    /// All parts, outermost first
    pub fn parts(&self) -> impl Iterator<Item = Option<SymbolEntryId>> + '_ {
        self.scope_name
            .iter()
            .copied()
            .chain(std::iter::once(Some(self.entity_name)))
    }
}

impl SymbolTable {
    pub fn add_qualified_name(
        &mut self,
        node: NodeId,
        interval: Interval,
        scope_name: Vec<Option<SymbolEntryId>>,
        entity_name: SymbolEntryId,
        invalid_parts_count: usize,
    ) -> QualifiedNameId {
        let id = QualifiedNameId(self.names.len() as u32);
        self.names.push(QualifiedName {
            node,
            interval,
            scope_name,
            entity_name,
            invalid_parts_count,
        });
        id
    }

    pub fn qualified_name(&self, id: QualifiedNameId) -> &QualifiedName {
        &self.names[id.index()]
    }

    pub fn qualified_names(&self) -> impl Iterator<Item = (QualifiedNameId, &QualifiedName)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (QualifiedNameId(i as u32), name))
    }

    /// Canonical spelling of every valid part, outermost first
    pub fn name_parts(&self, id: QualifiedNameId) -> Vec<String> {
        self.names[id.index()]
            .parts()
            .flatten()
            .map(|entry| self.entry(entry).name().to_string())
            .collect()
    }

    /// Dotted form, with missing parts left empty
    pub fn name_string(&self, id: QualifiedNameId) -> String {
        self.names[id.index()]
            .parts()
            .map(|part| part.map_or("", |entry| self.entry(entry).name()))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn is_name_classified(&self, id: QualifiedNameId) -> bool {
        self.is_classified(self.names[id.index()].entity_name)
    }

    /// Give every part of the name the same class
    ///
    /// Scope parts that are classified already keep their class.
    pub fn set_name_class(&mut self, id: QualifiedNameId, class: SymbolClass) -> SemanticResult<()> {
        let name = self.names[id.index()].clone();
        for part in name.scope_name.iter().flatten() {
            self.classify_if_unknown(*part, class)?;
        }
        self.set_symbol_class(name.entity_name, class)
    }

    /// Resolve the name to a catalog object
    ///
    /// The entity part points at `object`, and scope parts are matched from
    /// the innermost outwards against the object's containers.
    pub fn set_name_definition(&mut self, id: QualifiedNameId, object: &Arc<DatabaseObject>) -> SemanticResult<()> {
        let name = self.names[id.index()].clone();
        self.set_definition(name.entity_name, SymbolDefinition::Object(Arc::clone(object)))?;
        let mut container = object.parent();
        for part in name.scope_name.iter().rev() {
            let Some(parent) = container else {
                break;
            };
            if let Some(entry) = part {
                self.set_definition(*entry, SymbolDefinition::Object(Arc::clone(parent)))?;
            }
            container = parent.parent();
        }
        Ok(())
    }

    /// Resolve the name through another, already resolved name
    ///
    /// Used when a name refers to an alias or a CTE: each part points at the
    /// corresponding part of `source`, aligned from the entity outwards.
    pub fn set_name_definition_from(&mut self, id: QualifiedNameId, source: QualifiedNameId) -> SemanticResult<()> {
        let name = self.names[id.index()].clone();
        let source = self.names[source.index()].clone();
        self.set_definition(name.entity_name, SymbolDefinition::Entry(source.entity_name))?;
        for (part, definer) in name.scope_name.iter().rev().zip(source.scope_name.iter().rev()) {
            if let (Some(entry), Some(definer)) = (part, definer) {
                self.set_definition(*entry, SymbolDefinition::Entry(*definer))?;
            }
        }
        Ok(())
    }

    /// Resolve the longest valid prefix of an incomplete name
    ///
    /// For `public..users` this resolves `public` as a schema. Lookup failures
    /// become problems. Returns whether any prefix resolved.
    pub fn perform_partial_resolution(
        &mut self,
        id: QualifiedNameId,
        data: &QueryDataContext,
        problems: &mut ProblemCollector,
    ) -> SemanticResult<bool> {
        let prefix: Vec<SymbolEntryId> = self.names[id.index()]
            .parts()
            .map_while(|part| part)
            .collect();
        for len in (1..=prefix.len()).rev() {
            let parts: Vec<String> = prefix[..len]
                .iter()
                .map(|entry| self.entry(*entry).name().to_string())
                .collect();
            match data.find_real_object(&parts) {
                Ok(Some(object)) => {
                    let mut current = Some(&object);
                    for entry in prefix[..len].iter().rev() {
                        let Some(target) = current else {
                            break;
                        };
                        self.set_definition(*entry, SymbolDefinition::Object(Arc::clone(target)))?;
                        current = target.parent();
                    }
                    return Ok(true);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(name = %parts.join("."), error = %err, "partial name lookup failed");
                    problems.append(
                        RecognitionProblem::error(
                            self.names[id.index()].interval,
                            format!("Failed to resolve {}", parts.join(".")),
                        )
                        .with_cause(err.to_string()),
                    );
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_catalog::CatalogSnapshot;
    use sqlscope_grammar::SqlParser;
    use sqlscope_ir::{ColumnMetadata, DataType, Dialect, TableMetadata};

    fn node() -> NodeId {
        SqlParser::new(Dialect::Standard).parse("x").unwrap().root()
    }

    fn add(table: &mut SymbolTable, names: &[Option<&str>]) -> QualifiedNameId {
        let mut parts: Vec<Option<SymbolEntryId>> = names
            .iter()
            .enumerate()
            .map(|(i, name)| name.map(|n| table.add_entry(node(), Interval::new(i * 8, i * 8 + n.len()), n, n)))
            .collect();
        let invalid = parts.iter().filter(|p| p.is_none()).count();
        let entity = parts.pop().flatten().unwrap();
        table.add_qualified_name(node(), Interval::new(0, 30), parts, entity, invalid)
    }

    fn data() -> QueryDataContext {
        let snapshot = CatalogSnapshot::from_tables(vec![TableMetadata::new("users", "public")
            .with_catalog("app")
            .with_columns(vec![ColumnMetadata::new("id", DataType::Integer)])]);
        QueryDataContext::metadata(Dialect::PostgreSQL, Arc::new(snapshot))
    }

    #[test]
    fn test_name_parts_and_string() {
        let mut table = SymbolTable::new();
        let id = add(&mut table, &[Some("public"), None, Some("users")]);
        assert_eq!(table.name_parts(id), vec!["public", "users"]);
        assert_eq!(table.name_string(id), "public..users");
        assert_eq!(table.qualified_name(id).invalid_parts_count(), 1);
    }

    #[test]
    fn test_definition_walks_containers() {
        let mut table = SymbolTable::new();
        let id = add(&mut table, &[Some("app"), Some("public"), Some("users")]);
        let object = data()
            .find_real_object(&table.name_parts(id))
            .unwrap()
            .unwrap();
        table.set_name_definition(id, &object).unwrap();

        let name = table.qualified_name(id).clone();
        assert_eq!(table.class_of(name.entity_name()), SymbolClass::Table);
        assert_eq!(table.class_of(name.scope_name()[0].unwrap()), SymbolClass::Catalog);
        assert_eq!(table.class_of(name.scope_name()[1].unwrap()), SymbolClass::Schema);
    }

    #[test]
    fn test_alias_propagation() {
        let mut table = SymbolTable::new();
        let source = add(&mut table, &[Some("public"), Some("users")]);
        let object = data().find_real_object(&table.name_parts(source)).unwrap().unwrap();
        table.set_name_definition(source, &object).unwrap();

        let usage = add(&mut table, &[Some("public"), Some("users")]);
        table.set_name_definition_from(usage, source).unwrap();
        let entity = table.qualified_name(usage).entity_name();
        assert_eq!(table.class_of(entity), SymbolClass::Table);
        assert_eq!(table.resolve_object(entity), Some(object));
    }

    #[test]
    fn test_partial_resolution_of_broken_name() {
        let mut table = SymbolTable::new();
        let mut problems = ProblemCollector::new(10, false);
        let id = add(&mut table, &[Some("public"), None, Some("users")]);
        assert!(table.perform_partial_resolution(id, &data(), &mut problems).unwrap());
        let name = table.qualified_name(id).clone();
        assert_eq!(table.class_of(name.scope_name()[0].unwrap()), SymbolClass::Schema);
        // parts after the gap stay unresolved
        assert!(!table.is_classified(name.entity_name()));
        assert!(problems.is_empty());
    }

    #[test]
    fn test_uniform_class_keeps_classified_parts() {
        let mut table = SymbolTable::new();
        let id = add(&mut table, &[Some("s"), Some("t")]);
        let scope_part = table.qualified_name(id).scope_name()[0].unwrap();
        table.set_symbol_class(scope_part, SymbolClass::Schema).unwrap();
        table.set_name_class(id, SymbolClass::Error).unwrap();
        assert_eq!(table.class_of(scope_part), SymbolClass::Schema);
        assert_eq!(table.class_of(table.qualified_name(id).entity_name()), SymbolClass::Error);
    }
}
