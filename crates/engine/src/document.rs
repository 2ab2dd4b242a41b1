// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document syntax context
//!
//! The index of recognized statements of one document, keyed by the offset
//! each statement starts at.
//!
//! ## Overview
//!
//! - Lookups (`find_script_item`, `find_token`) keep the last result in a
//!   single-slot cache, so repeated queries near the caret are answered
//!   without searching the index.
//! - Registration replaces whatever overlaps the new statement.
//! - Edits are applied as deltas. Insertions shift the statements after the
//!   edit point and are forwarded to the statement they land in. Any other
//!   edit drops the statements it touches; the caller recognizes that text
//!   again.
//!
//! ## Locking
//!
//! The index and its caches live behind one `parking_lot::Mutex`. Listeners
//! are called after the lock is released, so they may query the context.
//! Every mutation resets the caches.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sqlscope_ir::Interval;
use sqlscope_lowering::Model;

use crate::error::DocumentResult;
use crate::listener::{ScriptItemEvent, ScriptItemListener};
use crate::offset_map::OffsetMap;
use crate::script_item::{ScriptItemSyntaxContext, ScriptToken};

/// A span of text the caller has to re-validate after an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRegion {
    pub offset: usize,
    pub length: usize,
}

impl TextRegion {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Smallest region covering both
    pub fn union(&self, other: &TextRegion) -> TextRegion {
        let offset = self.offset.min(other.offset);
        TextRegion::new(offset, self.end().max(other.end()) - offset)
    }
}

/// A statement together with the offset it starts at
#[derive(Debug, Clone)]
pub struct ScriptItemAtOffset {
    pub offset: usize,
    pub item: Arc<ScriptItemSyntaxContext>,
}

impl ScriptItemAtOffset {
    pub fn end(&self) -> usize {
        self.offset + self.item.length()
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.offset, self.end())
    }

    fn covers(&self, offset: usize) -> bool {
        offset >= self.offset && self.item.covers(offset - self.offset)
    }
}

/// A registered token with its absolute offset
#[derive(Debug, Clone)]
pub struct TokenAtOffset {
    pub offset: usize,
    pub token: ScriptToken,
    pub script_item: ScriptItemAtOffset,
}

impl TokenAtOffset {
    fn covers(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.offset + self.token.length
    }
}

#[derive(Debug, Default)]
struct DocumentState {
    items: OffsetMap<Arc<ScriptItemSyntaxContext>>,
    last_item: Option<ScriptItemAtOffset>,
    last_token: Option<TokenAtOffset>,
}

impl DocumentState {
    fn reset_caches(&mut self) {
        self.last_item = None;
        self.last_token = None;
    }

    fn find_script_item(&mut self, offset: usize) -> Option<ScriptItemAtOffset> {
        if let Some(last) = &self.last_item
            && last.covers(offset)
        {
            return Some(last.clone());
        }
        let (start, item) = self.items.floor(offset)?;
        let found = ScriptItemAtOffset {
            offset: start,
            item: item.clone(),
        };
        if !found.covers(offset) {
            return None;
        }
        self.last_item = Some(found.clone());
        Some(found)
    }

    /// Offsets of the items sharing at least one character with
    /// `[offset, end)`, plus an item starting exactly at `offset`
    fn overlapping(&self, offset: usize, end: usize) -> Vec<usize> {
        let mut found = Vec::new();
        if let Some((start, item)) = self.items.lower(offset)
            && start + item.length() > offset
        {
            found.push(start);
        }
        found.extend(self.items.range(offset, end.max(offset + 1)).map(|(start, _)| start));
        found
    }
}

/// Offset-keyed index of the recognized statements of a document
pub struct DocumentSyntaxContext {
    state: Mutex<DocumentState>,
    listeners: Mutex<Vec<Arc<dyn ScriptItemListener>>>,
}

impl Default for DocumentSyntaxContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentSyntaxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSyntaxContext")
            .field("items", &self.state.lock().items.len())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl DocumentSyntaxContext {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DocumentState::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ScriptItemListener>) {
        self.listeners.lock().push(listener);
    }

    /// Remove a listener previously added; returns whether it was found
    pub fn remove_listener(&self, listener: &Arc<dyn ScriptItemListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
        listeners.len() != before
    }

    fn notify(&self, events: Vec<ScriptItemEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.lock().clone();
        for event in &events {
            for listener in &listeners {
                event.deliver(listener.as_ref());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// All statements in offset order
    pub fn script_items(&self) -> Vec<ScriptItemAtOffset> {
        self.state
            .lock()
            .items
            .iter()
            .map(|(offset, item)| ScriptItemAtOffset {
                offset,
                item: item.clone(),
            })
            .collect()
    }

    /// The statement containing `offset`
    pub fn find_script_item(&self, offset: usize) -> Option<ScriptItemAtOffset> {
        self.state.lock().find_script_item(offset)
    }

    /// The registered token covering `offset`
    pub fn find_token(&self, offset: usize) -> Option<TokenAtOffset> {
        let mut state = self.state.lock();
        if let Some(last) = &state.last_token
            && last.covers(offset)
        {
            return Some(last.clone());
        }
        let script_item = state.find_script_item(offset)?;
        let (start, token) = script_item.item.find_token(offset - script_item.offset)?;
        let found = TokenAtOffset {
            offset: script_item.offset + start,
            token,
            script_item,
        };
        state.last_token = Some(found.clone());
        Some(found)
    }

    /// Register a freshly recognized statement at `offset`
    pub fn register_script_item_context(
        &self,
        text: impl Into<String>,
        model: Arc<Model>,
        offset: usize,
        length: usize,
        has_boundary: bool,
    ) -> Arc<ScriptItemSyntaxContext> {
        self.register_script_item(offset, ScriptItemSyntaxContext::new(text, model, length, has_boundary))
    }

    /// Install `item` at `offset`
    ///
    /// Items the new one overlaps are invalidated and removed, including a
    /// previous item at the same offset.
    pub fn register_script_item(&self, offset: usize, item: ScriptItemSyntaxContext) -> Arc<ScriptItemSyntaxContext> {
        let item = Arc::new(item);
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            for start in state.overlapping(offset, offset + item.length()) {
                if let Some(old) = state.items.remove_at(start) {
                    events.push(ScriptItemEvent::Invalidated(start, old));
                }
            }
            state.items.put(offset, item.clone());
            state.reset_caches();
        }
        tracing::debug!(
            offset,
            length = item.length(),
            replaced = events.len(),
            "Registered script item"
        );
        events.push(ScriptItemEvent::Introduced(offset, item.clone()));
        self.notify(events);
        item
    }

    /// Remove and invalidate the item starting at `offset`
    pub fn remove_script_item(&self, offset: usize) -> Option<Arc<ScriptItemSyntaxContext>> {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.items.remove_at(offset);
            state.reset_caches();
            removed
        };
        if let Some(item) = &removed {
            self.notify(vec![ScriptItemEvent::Invalidated(offset, item.clone())]);
        }
        removed
    }

    /// Apply an edit replacing `old_length` characters at `offset` with
    /// `new_length` new ones
    ///
    /// Returns the region whose statements have to be recognized again.
    pub fn apply_delta(&self, offset: usize, old_length: usize, new_length: usize) -> DocumentResult<TextRegion> {
        let mut events = Vec::new();
        let region = {
            let mut state = self.state.lock();
            let region = if old_length == 0 {
                let containing = state
                    .items
                    .lower(offset)
                    .filter(|(start, item)| item.covers(offset - start))
                    .map(|(start, _)| start);
                let region = match containing.and_then(|start| state.items.find_mut(start).map(|item| (start, item))) {
                    Some((start, item)) => {
                        let item = Arc::make_mut(item);
                        item.apply_delta(offset - start, 0, new_length)?;
                        TextRegion::new(start, item.length())
                    }
                    None => TextRegion::new(offset, new_length),
                };
                state.items.apply_offset(offset, new_length as isize);
                region
            } else {
                let end = offset + old_length;
                let mut region = TextRegion::new(offset, new_length);
                for start in state.overlapping(offset, end) {
                    let Some(item) = state.items.remove_at(start) else {
                        continue;
                    };
                    let item_end = start + item.length();
                    // the end of the removed item, in post-edit coordinates
                    let shifted_end = if item_end >= end {
                        item_end - old_length + new_length
                    } else {
                        offset + new_length
                    };
                    region = region.union(&TextRegion::new(start, shifted_end.max(start) - start));
                    events.push(ScriptItemEvent::Invalidated(start, item));
                }
                state
                    .items
                    .apply_offset(end, new_length as isize - old_length as isize);
                region
            };
            state.reset_caches();
            region
        };
        tracing::debug!(
            offset,
            old_length,
            new_length,
            invalidated = events.len(),
            region_offset = region.offset,
            region_length = region.length,
            "Applied document delta"
        );
        self.notify(events);
        Ok(region)
    }

    /// Evict the items wholly outside `visible`
    ///
    /// The visible interval is first widened to the bounds of the items
    /// its ends fall into. Items touching the widened interval stay.
    /// Returns the widened interval.
    pub fn drop_invisible_script_items(&self, visible: Interval) -> Interval {
        let mut events = Vec::new();
        let resident = {
            let mut state = self.state.lock();
            let start = match state.items.floor(visible.start) {
                Some((offset, item)) if offset + item.length() >= visible.start => offset,
                _ => visible.start,
            };
            let end = match state.items.floor(visible.end) {
                Some((offset, item)) if offset + item.length() > visible.end => offset + item.length(),
                _ => visible.end,
            };
            // items do not overlap, so only the one just before `start` can reach it
            let keep_from = match state.items.lower(start) {
                Some((offset, item)) if offset + item.length() >= start => offset,
                _ => start,
            };
            let mut evicted = state.items.remove_before(keep_from);
            evicted.extend(state.items.remove_after(end.saturating_add(1)));
            events.extend(
                evicted
                    .into_iter()
                    .map(|(offset, item)| ScriptItemEvent::Invalidated(offset, item)),
            );
            state.reset_caches();
            Interval::new(start, end)
        };
        tracing::debug!(
            start = resident.start,
            end = resident.end,
            evicted = events.len(),
            "Dropped invisible script items"
        );
        self.notify(events);
        resident
    }

    /// Drop every item
    pub fn clear(&self) {
        {
            let mut state = self.state.lock();
            state.items.clear();
            state.reset_caches();
        }
        tracing::debug!("Cleared document syntax context");
        self.notify(vec![ScriptItemEvent::AllInvalidated]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_ir::Dialect;
    use sqlscope_lowering::{RecognitionContext, RecognitionSettings, recognize};

    fn model(text: &str) -> Arc<Model> {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::MySQL));
        Arc::new(recognize(text, &mut ctx).unwrap())
    }

    /// Statements of `texts` laid out with one separating character
    fn document(texts: &[&str]) -> DocumentSyntaxContext {
        let context = DocumentSyntaxContext::new();
        let mut offset = 0;
        for text in texts {
            context.register_script_item_context(*text, model(text), offset, text.len(), false);
            offset += text.len() + 1;
        }
        context
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ScriptItemListener for Recorder {
        fn on_script_item_invalidated(&self, offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {
            self.0.lock().push(format!("-{offset}"));
        }

        fn on_script_item_introduced(&self, offset: usize, _item: &Arc<ScriptItemSyntaxContext>) {
            self.0.lock().push(format!("+{offset}"));
        }

        fn on_all_items_invalidated(&self) {
            self.0.lock().push("clear".to_string());
        }
    }

    #[test]
    fn test_find_script_item() {
        let context = document(&["SELECT a FROM t", "SELECT b FROM u"]);
        assert_eq!(context.find_script_item(3).unwrap().offset, 0);
        assert_eq!(context.find_script_item(15).unwrap().offset, 0);
        assert_eq!(context.find_script_item(16).unwrap().offset, 16);
        assert!(context.find_script_item(40).is_none());
    }

    #[test]
    fn test_lookups_are_cached() {
        let context = document(&["SELECT a FROM t", "SELECT b FROM u"]);
        let first = context.find_script_item(20).unwrap();
        let second = context.find_script_item(20).unwrap();
        assert!(Arc::ptr_eq(&first.item, &second.item));

        let first = context.find_token(23).unwrap();
        let second = context.find_token(23).unwrap();
        assert_eq!(first.offset, 23);
        assert_eq!(first.token, second.token);
        assert!(Arc::ptr_eq(&first.script_item.item, &second.script_item.item));
    }

    #[test]
    fn test_find_token_is_absolute() {
        let context = document(&["SELECT a FROM t", "SELECT bb FROM u"]);
        let token = context.find_token(24).unwrap();
        assert_eq!(token.offset, 23);
        assert_eq!(token.token.length, 2);
        let model = token.script_item.item.model().clone();
        assert_eq!(model.symbols().entry(token.token.entry).raw_name(), "bb");
        assert!(context.find_token(16).is_none());
    }

    #[test]
    fn test_replacing_fires_invalidation_first() {
        let context = document(&["SELECT a FROM t"]);
        let recorder = Arc::new(Recorder::default());
        context.add_listener(recorder.clone());
        context.register_script_item_context("SELECT 1", model("SELECT 1"), 0, 8, false);
        assert_eq!(*recorder.0.lock(), vec!["-0", "+0"]);
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_registration_removes_overlapping_items() {
        let context = document(&["SELECT 1", "SELECT 2", "SELECT 3"]);
        context.register_script_item_context("SELECT 12", model("SELECT 12"), 4, 10, false);
        let offsets: Vec<_> = context.script_items().iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![4, 18]);
    }

    #[test]
    fn test_insertion_before_item_relocates_it() {
        let context = DocumentSyntaxContext::new();
        context.register_script_item_context("SELECT a FROM t", model("SELECT a FROM t"), 10, 15, true);
        let before: Vec<_> = context.find_script_item(10).unwrap().item.tokens().map(|(o, _)| o).collect();

        let region = context.apply_delta(7, 0, 3).unwrap();
        assert_eq!(region, TextRegion::new(7, 3));
        assert!(context.find_script_item(10).is_none());
        let moved = context.find_script_item(13).unwrap();
        assert_eq!(moved.offset, 13);
        let after: Vec<_> = moved.item.tokens().map(|(o, _)| o).collect();
        assert_eq!(before, after);
        assert!(!moved.item.is_dirty());
    }

    #[test]
    fn test_insertion_inside_item_is_forwarded() {
        let context = document(&["SELECT a FROM t", "SELECT b FROM u"]);
        let region = context.apply_delta(9, 0, 2).unwrap();
        assert_eq!(region, TextRegion::new(0, 17));
        let first = context.find_script_item(0).unwrap();
        assert!(first.item.is_dirty());
        assert_eq!(first.item.length(), 17);
        assert_eq!(context.find_script_item(18).unwrap().offset, 18);
    }

    #[test]
    fn test_replacement_drops_overlapping_items() {
        let context = document(&["SELECT 1", "SELECT 2", "SELECT 3"]);
        let recorder = Arc::new(Recorder::default());
        context.add_listener(recorder.clone());

        // "2" replaced by "22"
        let region = context.apply_delta(16, 1, 2).unwrap();
        assert_eq!(region, TextRegion::new(9, 9));
        let offsets: Vec<_> = context.script_items().iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![0, 19]);
        assert_eq!(*recorder.0.lock(), vec!["-9"]);

        // deleting across two statements
        let region = context.apply_delta(5, 16, 0).unwrap();
        assert_eq!(region.offset, 0);
        assert!(context.is_empty());
    }

    #[test]
    fn test_insert_only_deltas_keep_items_ordered() {
        let texts = ["SELECT 1", "SELECT a FROM t", "SELECT 2", "SELECT b FROM u"];
        let context = document(&texts);
        let mut total: usize = texts.iter().map(|t| t.len() + 1).sum();
        let mut seed = 7usize;
        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let offset = (seed >> 33) % (total + 1);
            let length = (seed >> 20) % 4 + 1;
            context.apply_delta(offset, 0, length).unwrap();
            total += length;

            let items = context.script_items();
            let mut covered = 0;
            let mut previous_end = 0;
            for item in &items {
                assert!(item.offset >= previous_end, "items overlap: {items:?}");
                covered += item.offset - previous_end + item.item.length();
                previous_end = item.end();
            }
            assert!(previous_end <= total);
            assert_eq!(covered + (total - previous_end), total);
        }
    }

    #[test]
    fn test_drop_invisible_items() {
        // items at 0, 9, 18, 27, 36
        let context = document(&["SELECT 1", "SELECT 2", "SELECT 3", "SELECT 4", "SELECT 5"]);
        let resident = context.drop_invisible_script_items(Interval::new(20, 29));
        assert_eq!(resident, Interval::new(18, 35));
        let offsets: Vec<_> = context.script_items().iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![18, 27]);
    }

    #[test]
    fn test_drop_invisible_keeps_intersecting_items() {
        let texts = ["SELECT 1", "SELECT 2", "SELECT 3", "SELECT 4", "SELECT 5"];
        for a in 0..45 {
            for b in a..45 {
                let context = document(&texts);
                let before = context.script_items();
                let resident = context.drop_invisible_script_items(Interval::new(a, b));
                let after: Vec<_> = context.script_items().iter().map(|i| i.offset).collect();
                for item in before {
                    let intersects = item.offset <= b && item.end() >= a;
                    let outside = item.end() < resident.start || item.offset > resident.end;
                    if intersects {
                        assert!(after.contains(&item.offset), "[{a}, {b}] dropped {}", item.offset);
                    }
                    if outside {
                        assert!(!after.contains(&item.offset), "[{a}, {b}] kept {}", item.offset);
                    }
                }
            }
        }
    }

    #[test]
    fn test_clear_notifies_listeners() {
        let context = document(&["SELECT 1"]);
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn ScriptItemListener> = recorder.clone();
        context.add_listener(listener.clone());
        context.clear();
        assert!(context.is_empty());
        assert!(context.find_script_item(0).is_none());
        assert!(context.remove_listener(&listener));
        assert!(!context.remove_listener(&listener));
        assert_eq!(*recorder.0.lock(), vec!["clear"]);
    }
}
