// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Script item syntax context
//!
//! One recognized statement of a document: its text, its [`Model`] and an
//! index from token offsets (relative to the statement start) to the symbol
//! entries found there.
//!
//! Edits inside a statement are tracked only as far as insertions go. The
//! index is shifted and the item marked dirty until the caller recognizes
//! it again and calls [`ScriptItemSyntaxContext::refresh_completed`].

use std::sync::Arc;

use sqlscope_lowering::Model;
use sqlscope_semantic::{RecognitionProblem, SymbolEntryId};

use crate::error::{DocumentError, DocumentResult};
use crate::offset_map::OffsetMap;

/// A symbol entry occurrence registered at a token offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptToken {
    pub entry: SymbolEntryId,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct ScriptItemSyntaxContext {
    text: String,
    model: Arc<Model>,
    length: usize,
    has_boundary: bool,
    dirty: bool,
    tokens: OffsetMap<ScriptToken>,
    problems: Option<Vec<RecognitionProblem>>,
}

impl ScriptItemSyntaxContext {
    /// Create the context and register a token for every symbol entry of
    /// `model`
    ///
    /// `length` covers the statement text plus its delimiter, if any;
    /// `has_boundary` tells whether such a delimiter ends the item.
    pub fn new(text: impl Into<String>, model: Arc<Model>, length: usize, has_boundary: bool) -> Self {
        let mut item = Self {
            text: text.into(),
            model,
            length,
            has_boundary,
            dirty: false,
            tokens: OffsetMap::new(),
            problems: None,
        };
        let mut entries: Vec<_> = item
            .model
            .symbols()
            .entries()
            .map(|(id, entry)| (entry.interval(), id))
            .collect();
        entries.sort_by_key(|(interval, _)| (interval.start, interval.end));
        for (interval, entry) in entries {
            // a later entry at the same offset is a part of the same token
            if item.tokens.find(interval.start).is_some() {
                continue;
            }
            if let Err(error) = item.register_token(interval.start, entry, interval.len()) {
                tracing::warn!(%error, "Skipping symbol entry outside the statement");
            }
        }
        item
    }

    /// Builder method: attach the problems reported while recognizing
    pub fn with_problems(mut self, problems: Vec<RecognitionProblem>) -> Self {
        self.problems = Some(problems);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether a delimiter ends the item
    pub fn has_boundary(&self) -> bool {
        self.has_boundary
    }

    /// Whether the item was edited since it was last recognized
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn problems(&self) -> Option<&[RecognitionProblem]> {
        self.problems.as_deref()
    }

    /// Whether `offset` (relative to the item start) belongs to this item
    ///
    /// The end of an item without a delimiter still belongs to it, so a
    /// caret after the last character of an unterminated statement finds
    /// that statement.
    pub fn covers(&self, offset: usize) -> bool {
        offset < self.length || (offset == self.length && !self.has_boundary)
    }

    /// Register a token; offsets must be registered in increasing order
    pub fn register_token(&mut self, offset: usize, entry: SymbolEntryId, length: usize) -> DocumentResult<()> {
        let previous_end = self
            .tokens
            .iter()
            .next_back()
            .map(|(start, token)| start + token.length);
        if previous_end.is_some_and(|end| offset < end) || offset + length > self.length {
            return Err(DocumentError::OffsetOutOfBounds {
                offset,
                length: self.length,
            });
        }
        self.tokens.put(offset, ScriptToken { entry, length });
        Ok(())
    }

    /// The token covering `offset`, with its start
    pub fn find_token(&self, offset: usize) -> Option<(usize, ScriptToken)> {
        let (start, token) = self.tokens.floor(offset)?;
        (offset < start + token.length).then_some((start, *token))
    }

    pub fn tokens(&self) -> impl Iterator<Item = (usize, &ScriptToken)> + '_ {
        self.tokens.iter()
    }

    /// Apply an edit of the item's text, relative to the item start
    ///
    /// Only insertions are supported. Tokens at or after the insertion
    /// point move by `new_length`; a token the insertion splits is dropped
    /// because its text no longer matches.
    pub fn apply_delta(&mut self, offset: usize, old_length: usize, new_length: usize) -> DocumentResult<()> {
        if old_length > 0 {
            return Err(DocumentError::UnsupportedDelta { offset, old_length });
        }
        if offset > self.length {
            return Err(DocumentError::OffsetOutOfBounds {
                offset,
                length: self.length,
            });
        }
        if new_length == 0 {
            return Ok(());
        }
        if let Some((start, token)) = self.tokens.lower(offset)
            && offset < start + token.length
        {
            self.tokens.remove_at(start);
        }
        self.tokens.apply_offset(offset, new_length as isize);
        self.length += new_length;
        self.dirty = true;
        Ok(())
    }

    /// Clear the dirty flag after the item was reconciled
    pub fn refresh_completed(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_ir::Dialect;
    use sqlscope_lowering::{RecognitionContext, RecognitionSettings, recognize};

    fn item(text: &str) -> ScriptItemSyntaxContext {
        let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(Dialect::PostgreSQL));
        let model = recognize(text, &mut ctx).unwrap();
        ScriptItemSyntaxContext::new(text, Arc::new(model), text.len(), false)
    }

    fn raw_name(item: &ScriptItemSyntaxContext, token: ScriptToken) -> &str {
        item.model().symbols().entry(token.entry).raw_name()
    }

    #[test]
    fn test_tokens_are_registered_from_model() {
        let item = item("SELECT a, b FROM t");
        let names: Vec<_> = item.tokens().map(|(_, t)| raw_name(&item, *t)).collect();
        assert_eq!(names, vec!["a", "b", "t"]);
    }

    #[test]
    fn test_find_token_requires_coverage() {
        let item = item("SELECT abc FROM t");
        let (start, token) = item.find_token(8).unwrap();
        assert_eq!(start, 7);
        assert_eq!(raw_name(&item, token), "abc");
        assert!(item.find_token(10).is_none());
        assert!(item.find_token(3).is_none());
    }

    #[test]
    fn test_insertion_shifts_following_tokens() {
        let mut item = item("SELECT a FROM t");
        item.apply_delta(9, 0, 4).unwrap();
        assert_eq!(item.length(), 19);
        assert!(item.is_dirty());
        let starts: Vec<_> = item.tokens().map(|(start, _)| start).collect();
        assert_eq!(starts, vec![7, 18]);
        item.refresh_completed();
        assert!(!item.is_dirty());
    }

    #[test]
    fn test_insertion_inside_token_drops_it() {
        let mut item = item("SELECT abc FROM t");
        item.apply_delta(8, 0, 1).unwrap();
        assert!(item.find_token(7).is_none());
        assert_eq!(item.tokens().count(), 1);
    }

    #[test]
    fn test_replacement_is_unsupported() {
        let mut item = item("SELECT a FROM t");
        assert_eq!(
            item.apply_delta(7, 1, 2),
            Err(DocumentError::UnsupportedDelta {
                offset: 7,
                old_length: 1
            })
        );
        assert!(!item.is_dirty());
    }

    #[test]
    fn test_registration_is_monotonic() {
        let mut item = item("SELECT a FROM t");
        let entry = item.find_token(7).unwrap().1.entry;
        assert!(matches!(
            item.register_token(2, entry, 1),
            Err(DocumentError::OffsetOutOfBounds { .. })
        ));
        assert!(matches!(
            item.register_token(15, entry, 3),
            Err(DocumentError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_end_of_unterminated_item_is_covered() {
        let open = item("SELECT 1");
        assert!(open.covers(8));
        let mut ctx = RecognitionContext::new(RecognitionSettings::default());
        let model = Arc::new(recognize("SELECT 1", &mut ctx).unwrap());
        let closed = ScriptItemSyntaxContext::new("SELECT 1", model, 9, true);
        assert!(closed.covers(8));
        assert!(!closed.covers(9));
    }
}
