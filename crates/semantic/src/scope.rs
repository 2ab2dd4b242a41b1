// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Lexical scopes
//!
//! A lexical scope collects the names written inside one construct (a
//! select list, a join condition, a WHERE clause) and remembers which row
//! sources were visible there. Completion and hover use it to answer "what
//! can be referenced at this position".
//!
//! During recognition scopes are opened and closed in strict stack order;
//! only the innermost open scope receives new items.

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use sqlscope_ir::Interval;

use crate::data_context::SourcesContext;
use crate::error::{SemanticError, SemanticResult};
use crate::qualified_name::QualifiedNameId;
use crate::symbol::SymbolEntryId;

/// Something registered in a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeItem {
    Entry(SymbolEntryId),
    Name(QualifiedNameId),
}

/// Index of a [`LexicalScope`] in its [`LexicalScopes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexicalScope {
    items: Vec<(ScopeItem, Interval)>,
    nodes: Vec<Interval>,
    computed: OnceLock<Interval>,
    fixed: Option<Interval>,
    context: Option<Arc<SourcesContext>>,
}

impl LexicalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, item: ScopeItem, interval: Interval) {
        self.items.push((item, interval));
        self.computed = OnceLock::new();
    }

    /// Widen the scope over a syntax node that holds no names itself
    pub fn register_node(&mut self, interval: Interval) {
        self.nodes.push(interval);
        self.computed = OnceLock::new();
    }

    pub fn items(&self) -> impl Iterator<Item = ScopeItem> + '_ {
        self.items.iter().map(|(item, _)| *item)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.nodes.is_empty()
    }

    /// Covering interval of everything registered, unless set explicitly
    pub fn interval(&self) -> Interval {
        if let Some(fixed) = self.fixed {
            return fixed;
        }
        *self.computed.get_or_init(|| {
            self.items
                .iter()
                .map(|(_, interval)| *interval)
                .chain(self.nodes.iter().copied())
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default()
        })
    }

    /// Override the computed interval for good
    pub fn set_interval(&mut self, interval: Interval) {
        self.fixed = Some(interval);
    }

    pub fn context(&self) -> Option<&Arc<SourcesContext>> {
        self.context.as_ref()
    }

    pub fn set_context(&mut self, context: Arc<SourcesContext>) {
        self.context = Some(context);
    }

    /// The earliest-starting item whose interval contains `position`
    pub fn find_item(&self, position: usize) -> Option<ScopeItem> {
        self.items
            .iter()
            .filter(|(_, interval)| interval.contains(position))
            .min_by_key(|(_, interval)| interval.start)
            .map(|(item, _)| *item)
    }

    /// The item ending closest before (or at) `position`
    pub fn find_nearest_item(&self, position: usize) -> Option<ScopeItem> {
        self.items
            .iter()
            .filter(|(_, interval)| interval.end <= position)
            .max_by_key(|(_, interval)| interval.end)
            .map(|(item, _)| *item)
    }
}

/// All scopes of a statement plus the stack of open ones
#[derive(Debug, Clone, Default)]
pub struct LexicalScopes {
    scopes: Vec<LexicalScope>,
    open: Vec<ScopeId>,
}

impl LexicalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new innermost scope
    pub fn begin(&mut self) -> ScopeId {
        let id = self.push(LexicalScope::new());
        self.open.push(id);
        id
    }

    /// Close `id`, which must be the innermost open scope
    pub fn end(&mut self, id: ScopeId) -> SemanticResult<()> {
        match self.open.last() {
            Some(top) if *top == id => {
                self.open.pop();
                Ok(())
            }
            top => Err(SemanticError::ScopeStackMismatch {
                expected: id.index(),
                found: top.map(|t| t.index()),
            }),
        }
    }

    /// Add a scope that is never on the open stack
    pub fn push(&mut self, scope: LexicalScope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.open.last().copied()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Register in the innermost open scope; returns false when none is open
    pub fn register_item(&mut self, item: ScopeItem, interval: Interval) -> bool {
        match self.open.last() {
            Some(top) => {
                self.scopes[top.index()].register_item(item, interval);
                true
            }
            None => false,
        }
    }

    pub fn register_node(&mut self, interval: Interval) -> bool {
        match self.open.last() {
            Some(top) => {
                self.scopes[top.index()].register_node(interval);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ScopeId) -> &LexicalScope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut LexicalScope {
        &mut self.scopes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &LexicalScope)> + '_ {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The narrowest non-empty scope whose interval touches `position`
    pub fn innermost_at(&self, position: usize) -> Option<ScopeId> {
        self.iter()
            .filter(|(_, scope)| !scope.is_empty() || scope.fixed.is_some())
            .filter(|(_, scope)| scope.interval().touches(position))
            .min_by_key(|(_, scope)| scope.interval().len())
            .map(|(id, _)| id)
    }
}
