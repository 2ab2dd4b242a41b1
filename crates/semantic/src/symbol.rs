// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Symbols and symbol entries
//!
//! Every identifier occurrence in a statement becomes a [`SymbolEntry`].
//! Entries that turn out to denote the same thing share a [`Symbol`], which
//! carries the classification (table, column, alias, ...) and the definition
//! the name resolved to.
//!
//! Both live in a [`SymbolTable`] arena and are addressed by index, so
//! merging two symbols only re-points indices:
//!
//! ```rust
//! use sqlscope_grammar::NodeId;
//! use sqlscope_ir::{Dialect, Interval};
//! use sqlscope_semantic::{SymbolClass, SymbolTable};
//!
//! # fn node() -> NodeId { sqlscope_grammar::SqlParser::new(Dialect::Standard).parse("x").unwrap().root() }
//! let mut table = SymbolTable::new();
//! let def = table.add_entry(node(), Interval::new(5, 8), "cte", "cte");
//! let usage = table.add_entry(node(), Interval::new(30, 33), "cte", "cte");
//! table.set_symbol_class(def, SymbolClass::Table).unwrap();
//!
//! let merged = table.merge_entries(def, usage).unwrap();
//! assert_eq!(table.symbol(merged).entries().len(), 2);
//! assert_eq!(table.class_of(usage), SymbolClass::Table);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use sqlscope_catalog::{DatabaseObject, ObjectKind};
use sqlscope_grammar::NodeId;
use sqlscope_ir::Interval;

use crate::error::{SemanticError, SemanticResult};
use crate::qualified_name::QualifiedName;

/// What a name denotes
///
/// A symbol starts out as `Unknown` and is classified at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolClass {
    #[default]
    Unknown,
    Catalog,
    Schema,
    Table,
    TableAlias,
    /// A procedure or function; the catalog carries no routines
    Routine,
    Column,
    ColumnDerived,
    Reserved,
    String,
    Quoted,
    Error,
    Variable,
    Parameter,
}

impl SymbolClass {
    pub fn is_unknown(self) -> bool {
        self == SymbolClass::Unknown
    }

    /// Class of a name that resolved to a catalog object
    pub fn for_object(kind: ObjectKind) -> SymbolClass {
        match kind {
            ObjectKind::Catalog => SymbolClass::Catalog,
            ObjectKind::Schema => SymbolClass::Schema,
            ObjectKind::Table | ObjectKind::View => SymbolClass::Table,
            ObjectKind::Column => SymbolClass::Column,
        }
    }
}

/// Index of a [`Symbol`] in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a [`SymbolEntry`] in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolEntryId(u32);

impl SymbolEntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a resolved name points at
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDefinition {
    /// A real (or dummy) catalog object
    Object(Arc<DatabaseObject>),
    /// Another occurrence, e.g. the alias a qualified column goes through
    Entry(SymbolEntryId),
}

/// Canonical identity shared by all occurrences of one name
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    class: SymbolClass,
    definition: Option<SymbolDefinition>,
    entries: BTreeSet<SymbolEntryId>,
    merged_into: Option<SymbolId>,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> SymbolClass {
        self.class
    }

    pub fn definition(&self) -> Option<&SymbolDefinition> {
        self.definition.as_ref()
    }

    pub fn entries(&self) -> &BTreeSet<SymbolEntryId> {
        &self.entries
    }

    /// Retired symbols were folded into another one by a merge
    pub fn is_retired(&self) -> bool {
        self.merged_into.is_some()
    }
}

/// One occurrence of a name in the statement text
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    node: NodeId,
    interval: Interval,
    name: String,
    raw_name: String,
    symbol: Option<SymbolId>,
    definition: Option<SymbolDefinition>,
}

impl SymbolEntry {
    /// The terminal node the name was read from
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Canonical spelling
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spelling as typed
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    pub fn definition(&self) -> Option<&SymbolDefinition> {
        self.definition.as_ref()
    }
}

/// Arena of entries, symbols and qualified names of one statement
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    symbols: Vec<Symbol>,
    pub(crate) names: Vec<QualifiedName>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new occurrence
    pub fn add_entry(
        &mut self,
        node: NodeId,
        interval: Interval,
        name: impl Into<String>,
        raw_name: impl Into<String>,
    ) -> SymbolEntryId {
        let id = SymbolEntryId(self.entries.len() as u32);
        self.entries.push(SymbolEntry {
            node,
            interval,
            name: name.into(),
            raw_name: raw_name.into(),
            symbol: None,
            definition: None,
        });
        id
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by id
    ///
    /// Ids are only minted by this table; a foreign id is a caller bug and
    /// panics.
    pub fn entry(&self, id: SymbolEntryId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    pub fn get_entry(&self, id: SymbolEntryId) -> Option<&SymbolEntry> {
        self.entries.get(id.index())
    }

    /// All entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (SymbolEntryId, &SymbolEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (SymbolEntryId(i as u32), entry))
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Symbols that were not retired by a merge
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, symbol)| !symbol.is_retired())
            .map(|(i, symbol)| (SymbolId(i as u32), symbol))
    }

    /// The entry's symbol, if one was created already
    pub fn symbol_of(&self, entry: SymbolEntryId) -> Option<SymbolId> {
        self.entries.get(entry.index()).and_then(|e| e.symbol)
    }

    /// The entry's symbol, created on first use
    pub fn symbol_for(&mut self, entry: SymbolEntryId) -> SymbolId {
        if let Some(symbol) = self.entries[entry.index()].symbol {
            return symbol;
        }
        let id = SymbolId(self.symbols.len() as u32);
        let name = self.entries[entry.index()].name.clone();
        self.symbols.push(Symbol {
            name,
            class: SymbolClass::Unknown,
            definition: None,
            entries: BTreeSet::from([entry]),
            merged_into: None,
        });
        self.entries[entry.index()].symbol = Some(id);
        id
    }

    /// Current class of the entry; `Unknown` when it has no symbol yet
    pub fn class_of(&self, entry: SymbolEntryId) -> SymbolClass {
        self.symbol_of(entry)
            .map_or(SymbolClass::Unknown, |s| self.symbols[s.index()].class)
    }

    /// Current class of the entry, creating its symbol if needed
    pub fn entry_symbol_class(&mut self, entry: SymbolEntryId) -> SymbolClass {
        let symbol = self.symbol_for(entry);
        self.symbols[symbol.index()].class
    }

    pub fn is_classified(&self, entry: SymbolEntryId) -> bool {
        !self.class_of(entry).is_unknown()
    }

    /// Classify the entry's symbol
    ///
    /// Setting the class the symbol already has is accepted.
    ///
    /// # Errors
    ///
    /// `SymbolAlreadyClassified` when the symbol carries a different class.
    pub fn set_symbol_class(&mut self, entry: SymbolEntryId, class: SymbolClass) -> SemanticResult<()> {
        self.check(entry)?;
        let symbol = self.symbol_for(entry);
        let target = &mut self.symbols[symbol.index()];
        if target.class == class {
            return Ok(());
        }
        if !target.class.is_unknown() {
            return Err(SemanticError::SymbolAlreadyClassified {
                name: target.name.clone(),
                current: target.class,
                requested: class,
            });
        }
        target.class = class;
        Ok(())
    }

    /// Classify the entry unless it is classified already
    ///
    /// Returns whether the class was applied.
    pub fn classify_if_unknown(&mut self, entry: SymbolEntryId, class: SymbolClass) -> SemanticResult<bool> {
        if self.is_classified(entry) {
            self.check(entry)?;
            return Ok(false);
        }
        self.set_symbol_class(entry, class)?;
        Ok(true)
    }

    /// Attach a definition to an entry and classify it accordingly
    ///
    /// An object definition implies the object's class. An entry
    /// definition passes the target's class on only to an unclassified
    /// entry, so an alias keeps `TableAlias`. The definition also becomes
    /// the symbol's definition unless the symbol has one. Re-attaching an
    /// equal definition is accepted.
    ///
    /// # Errors
    ///
    /// `SymbolAlreadyDefined` when the entry has a different definition,
    /// `SymbolAlreadyClassified` when an object's class conflicts with the
    /// current one.
    pub fn set_definition(&mut self, entry: SymbolEntryId, definition: SymbolDefinition) -> SemanticResult<()> {
        self.check(entry)?;
        if let Some(current) = &self.entries[entry.index()].definition {
            if *current == definition {
                return Ok(());
            }
            return Err(SemanticError::SymbolAlreadyDefined(
                self.entries[entry.index()].raw_name.clone(),
            ));
        }
        match &definition {
            SymbolDefinition::Object(object) => {
                self.set_symbol_class(entry, SymbolClass::for_object(object.kind()))?;
            }
            SymbolDefinition::Entry(target) => {
                self.check(*target)?;
                let class = self.class_of(*target);
                if !class.is_unknown() {
                    self.classify_if_unknown(entry, class)?;
                }
            }
        }
        let symbol = self.symbol_for(entry);
        let target = &mut self.symbols[symbol.index()];
        if target.definition.is_none() {
            target.definition = Some(definition.clone());
        }
        self.entries[entry.index()].definition = Some(definition);
        Ok(())
    }

    /// The entry's own definition, or its symbol's
    pub fn definition_of(&self, entry: SymbolEntryId) -> Option<&SymbolDefinition> {
        let data = self.entries.get(entry.index())?;
        data.definition.as_ref().or_else(|| {
            data.symbol
                .and_then(|s| self.symbols[s.index()].definition.as_ref())
        })
    }

    /// Follow definition links until a catalog object is reached
    pub fn resolve_object(&self, entry: SymbolEntryId) -> Option<Arc<DatabaseObject>> {
        let mut current = entry;
        // Each hop visits a distinct entry unless the chain loops
        for _ in 0..=self.entries.len() {
            match self.definition_of(current)? {
                SymbolDefinition::Object(object) => return Some(Arc::clone(object)),
                SymbolDefinition::Entry(next) => current = *next,
            }
        }
        None
    }

    /// Merge two symbols into a fresh one
    ///
    /// The new symbol holds the union of both entry sets and every entry is
    /// re-pointed to it. The old symbols are retired. Merging a symbol with
    /// itself (or with a symbol it was already merged into) is a no-op.
    ///
    /// # Errors
    ///
    /// `SymbolClassConflict` when both symbols are classified differently.
    pub fn merge(&mut self, a: SymbolId, b: SymbolId) -> SemanticResult<SymbolId> {
        let a = self.live(a);
        let b = self.live(b);
        if a == b {
            return Ok(a);
        }
        let (left, right) = (&self.symbols[a.index()], &self.symbols[b.index()]);
        let class = match (left.class, right.class) {
            (l, r) if l == r => l,
            (SymbolClass::Unknown, r) => r,
            (l, SymbolClass::Unknown) => l,
            (l, r) => {
                return Err(SemanticError::SymbolClassConflict {
                    left: a,
                    left_class: l,
                    right: b,
                    right_class: r,
                });
            }
        };
        let merged = Symbol {
            name: left.name.clone(),
            class,
            definition: left.definition.clone().or_else(|| right.definition.clone()),
            entries: left.entries.union(&right.entries).copied().collect(),
            merged_into: None,
        };
        let id = SymbolId(self.symbols.len() as u32);
        for entry in &merged.entries {
            self.entries[entry.index()].symbol = Some(id);
        }
        self.symbols.push(merged);
        for old in [a, b] {
            let retired = &mut self.symbols[old.index()];
            retired.merged_into = Some(id);
            retired.entries.clear();
        }
        Ok(id)
    }

    /// Merge the symbols of two entries, creating them as needed
    pub fn merge_entries(&mut self, a: SymbolEntryId, b: SymbolEntryId) -> SemanticResult<SymbolId> {
        self.check(a)?;
        self.check(b)?;
        let left = self.symbol_for(a);
        let right = self.symbol_for(b);
        self.merge(left, right)
    }

    /// Entries whose symbol is still unclassified
    pub fn unclassified_entries(&self) -> Vec<SymbolEntryId> {
        self.entries()
            .filter(|(id, _)| !self.is_classified(*id))
            .map(|(id, _)| id)
            .collect()
    }

    fn live(&self, mut id: SymbolId) -> SymbolId {
        while let Some(next) = self.symbols[id.index()].merged_into {
            id = next;
        }
        id
    }

    fn check(&self, entry: SymbolEntryId) -> SemanticResult<()> {
        if entry.index() < self.entries.len() {
            Ok(())
        } else {
            Err(SemanticError::UnknownEntry(entry))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_grammar::SqlParser;
    use sqlscope_ir::Dialect;

    fn node() -> NodeId {
        SqlParser::new(Dialect::Standard).parse("x").unwrap().root()
    }

    fn table_with(names: &[&str]) -> (SymbolTable, Vec<SymbolEntryId>) {
        let mut table = SymbolTable::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| table.add_entry(node(), Interval::new(i * 10, i * 10 + name.len()), *name, *name))
            .collect();
        (table, ids)
    }

    #[test]
    fn test_symbol_created_lazily() {
        let (mut table, ids) = table_with(&["a"]);
        assert_eq!(table.symbol_of(ids[0]), None);
        assert_eq!(table.class_of(ids[0]), SymbolClass::Unknown);
        assert_eq!(table.entry_symbol_class(ids[0]), SymbolClass::Unknown);
        assert!(table.symbol_of(ids[0]).is_some());
    }

    #[test]
    fn test_classification_is_one_shot() {
        let (mut table, ids) = table_with(&["a"]);
        table.set_symbol_class(ids[0], SymbolClass::Column).unwrap();
        // same class again is tolerated
        assert!(table.set_symbol_class(ids[0], SymbolClass::Column).is_ok());
        let err = table.set_symbol_class(ids[0], SymbolClass::Table).unwrap_err();
        assert!(matches!(err, SemanticError::SymbolAlreadyClassified { .. }));
        assert_eq!(table.class_of(ids[0]), SymbolClass::Column);
    }

    #[test]
    fn test_classify_if_unknown_skips_classified() {
        let (mut table, ids) = table_with(&["a"]);
        assert!(table.classify_if_unknown(ids[0], SymbolClass::Reserved).unwrap());
        assert!(!table.classify_if_unknown(ids[0], SymbolClass::Column).unwrap());
        assert_eq!(table.class_of(ids[0]), SymbolClass::Reserved);
    }

    #[test]
    fn test_definition_classifies_entry() {
        let (mut table, ids) = table_with(&["users", "u"]);
        let users = DatabaseObject::table("users", None, Vec::new(), false);
        table
            .set_definition(ids[0], SymbolDefinition::Object(Arc::clone(&users)))
            .unwrap();
        assert_eq!(table.class_of(ids[0]), SymbolClass::Table);

        table.set_symbol_class(ids[1], SymbolClass::TableAlias).unwrap();
        table.set_definition(ids[1], SymbolDefinition::Entry(ids[0])).unwrap();
        assert_eq!(table.resolve_object(ids[1]), Some(users));
    }

    #[test]
    fn test_double_definition_rejected() {
        let (mut table, ids) = table_with(&["t"]);
        let first = DatabaseObject::table("t", None, Vec::new(), false);
        let second = DatabaseObject::table("t2", None, Vec::new(), false);
        table.set_definition(ids[0], SymbolDefinition::Object(Arc::clone(&first))).unwrap();
        assert!(table.set_definition(ids[0], SymbolDefinition::Object(first)).is_ok());
        assert_eq!(
            table.set_definition(ids[0], SymbolDefinition::Object(second)),
            Err(SemanticError::SymbolAlreadyDefined("t".to_string()))
        );
    }

    #[test]
    fn test_foreign_entry_rejected() {
        let (mut table, _) = table_with(&["a"]);
        let foreign = SymbolEntryId(42);
        assert_eq!(
            table.set_symbol_class(foreign, SymbolClass::Column),
            Err(SemanticError::UnknownEntry(foreign))
        );
    }

    #[test]
    fn test_merge_retires_old_symbols() {
        let (mut table, ids) = table_with(&["c", "c"]);
        let a = table.symbol_for(ids[0]);
        let b = table.symbol_for(ids[1]);
        table.set_symbol_class(ids[1], SymbolClass::Table).unwrap();
        let merged = table.merge(a, b).unwrap();
        assert!(table.symbol(a).is_retired());
        assert!(table.symbol(b).is_retired());
        assert_eq!(table.symbol(merged).class(), SymbolClass::Table);
        assert_eq!(table.symbol_of(ids[0]), Some(merged));
        assert_eq!(table.symbols().count(), 1);
        // merging through a retired id lands on the live symbol
        assert_eq!(table.merge(a, merged).unwrap(), merged);
    }

    #[test]
    fn test_merge_conflicting_classes() {
        let (mut table, ids) = table_with(&["x", "x"]);
        table.set_symbol_class(ids[0], SymbolClass::Column).unwrap();
        table.set_symbol_class(ids[1], SymbolClass::Table).unwrap();
        let err = table.merge_entries(ids[0], ids[1]).unwrap_err();
        assert!(matches!(err, SemanticError::SymbolClassConflict { .. }));
    }
}
