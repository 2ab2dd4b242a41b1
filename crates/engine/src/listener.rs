// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Script item listeners
//!
//! Observers of the document index. Callbacks run synchronously on the
//! mutating thread after the index lock is released. Within one operation
//! every invalidation is delivered before any introduction.

use std::sync::Arc;

use crate::script_item::ScriptItemSyntaxContext;

pub trait ScriptItemListener: Send + Sync {
    /// `item`, last located at `offset`, is no longer part of the index
    fn on_script_item_invalidated(&self, _offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {}

    /// `item` was registered at `offset`
    fn on_script_item_introduced(&self, _offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {}

    /// The index was cleared
    fn on_all_items_invalidated(&self) {}
}

/// An index change waiting to be delivered
#[derive(Debug, Clone)]
pub(crate) enum ScriptItemEvent {
    Invalidated(usize, Arc<ScriptItemSyntaxContext>),
    Introduced(usize, Arc<ScriptItemSyntaxContext>),
    AllInvalidated,
}

impl ScriptItemEvent {
    pub(crate) fn deliver(&self, listener: &dyn ScriptItemListener) {
        match self {
            ScriptItemEvent::Invalidated(offset, item) => listener.on_script_item_invalidated(*offset, item),
            ScriptItemEvent::Introduced(offset, item) => listener.on_script_item_introduced(*offset, item),
            ScriptItemEvent::AllInvalidated => listener.on_all_items_invalidated(),
        }
    }
}
