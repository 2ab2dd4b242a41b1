// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document analyzer
//!
//! Keeps the text of one document and its [`DocumentSyntaxContext`] in
//! step.
//!
//! The text is split into statements at `;` tokens. Separators inside
//! string literals, quoted names and comments are hidden by the lexer and
//! do not split. Each statement is recognized and registered at its start
//! offset. After an edit, the delta is applied to the index and every
//! statement whose text no longer matches its registered item is
//! recognized again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ropey::Rope;
use serde::Serialize;
use sqlscope_catalog::CatalogSnapshot;
use sqlscope_context::{CompletionScope, KeywordPrediction};
use sqlscope_grammar::{TokenKind, tokenize};
use sqlscope_lowering::{ModelContent, RecognitionContext, recognize};
use sqlscope_semantic::{RecognitionProblem, SymbolClass};

use crate::config::EngineConfig;
use crate::document::{DocumentSyntaxContext, TextRegion};
use crate::error::{DocumentError, DocumentResult};
use crate::script_item::ScriptItemSyntaxContext;

/// Where one statement lies in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSpan {
    pub start: usize,
    /// End of the statement text, before any delimiter
    pub text_end: usize,
    /// End of the item, past the delimiter if there is one
    pub end: usize,
    pub has_boundary: bool,
}

impl StatementSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `text` into statements at `;` tokens
///
/// A statement without a delimiter runs to the end of the text, so a caret
/// in trailing whitespace still belongs to it.
pub fn split_statements(text: &str) -> Vec<StatementSpan> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for token in tokenize(text) {
        if token.kind == TokenKind::Semicolon {
            if let Some((start, text_end)) = current.take() {
                spans.push(StatementSpan {
                    start,
                    text_end,
                    end: token.interval.end,
                    has_boundary: true,
                });
            }
            continue;
        }
        let start = current.map_or(token.interval.start, |(start, _)| start);
        current = Some((start, token.interval.end));
    }
    if let Some((start, text_end)) = current {
        spans.push(StatementSpan {
            start,
            text_end,
            end: text.len(),
            has_boundary: false,
        });
    }
    spans
}

/// A name occurrence and its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub offset: usize,
    pub length: usize,
    pub name: String,
    pub class: SymbolClass,
}

/// Recognition results of one statement, with document offsets
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    pub offset: usize,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub symbols: Vec<TokenInfo>,
    pub problems: Vec<RecognitionProblem>,
}

/// A SQL document kept recognized across edits
#[derive(Debug)]
pub struct DocumentAnalyzer {
    config: EngineConfig,
    snapshot: Option<Arc<CatalogSnapshot>>,
    text: Rope,
    context: DocumentSyntaxContext,
}

impl DocumentAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            snapshot: None,
            text: Rope::new(),
            context: DocumentSyntaxContext::new(),
        }
    }

    /// Builder method: resolve names against `snapshot`
    pub fn with_snapshot(mut self, snapshot: Arc<CatalogSnapshot>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &DocumentSyntaxContext {
        &self.context
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Document length in bytes
    pub fn len(&self) -> usize {
        self.text.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len_bytes() == 0
    }

    /// Replace the whole document and recognize every statement
    pub fn set_text(&mut self, text: &str) {
        self.text = Rope::from_str(text);
        self.context.clear();
        self.reconcile();
        tracing::info!(
            length = text.len(),
            statements = self.context.len(),
            "Analyzed document"
        );
    }

    /// Replace `old_length` bytes at `offset` with `new_text`
    ///
    /// Fails with [`DocumentError::OffsetOutOfBounds`] when the range lies
    /// outside the document or does not fall on character boundaries.
    /// Returns the region whose statements were recognized again.
    pub fn apply_edit(&mut self, offset: usize, old_length: usize, new_text: &str) -> DocumentResult<TextRegion> {
        let length = self.text.len_bytes();
        let end = offset.saturating_add(old_length);
        if end > length {
            return Err(DocumentError::OffsetOutOfBounds { offset: end, length });
        }
        let start_char = self.text.byte_to_char(offset);
        let end_char = self.text.byte_to_char(end);
        if self.text.char_to_byte(start_char) != offset || self.text.char_to_byte(end_char) != end {
            return Err(DocumentError::OffsetOutOfBounds { offset, length });
        }
        self.text.remove(start_char..end_char);
        self.text.insert(start_char, new_text);

        let region = self.context.apply_delta(offset, old_length, new_text.len())?;
        Ok(match self.reconcile() {
            Some(recognized) => region.union(&recognized),
            None => region,
        })
    }

    /// Recognize the statements whose registered item is missing or out of
    /// date, and drop items no statement starts at
    fn reconcile(&self) -> Option<TextRegion> {
        let text = self.text.to_string();
        let spans = split_statements(&text);
        let existing: HashMap<usize, Arc<ScriptItemSyntaxContext>> = self
            .context
            .script_items()
            .into_iter()
            .map(|found| (found.offset, found.item))
            .collect();
        let starts: HashSet<usize> = spans.iter().map(|span| span.start).collect();

        let mut region: Option<TextRegion> = None;
        let touch = |region: &mut Option<TextRegion>, touched: TextRegion| {
            *region = Some(region.map_or(touched, |r| r.union(&touched)));
        };

        for span in &spans {
            let statement = &text[span.start..span.text_end];
            let current = existing.get(&span.start).is_some_and(|item| {
                !item.is_dirty()
                    && item.length() == span.len()
                    && item.has_boundary() == span.has_boundary
                    && item.text() == statement
            });
            if current {
                continue;
            }
            self.recognize_span(statement, span);
            touch(&mut region, TextRegion::new(span.start, span.len()));
        }

        for (offset, item) in existing {
            if !starts.contains(&offset) && self.context.remove_script_item(offset).is_some() {
                touch(&mut region, TextRegion::new(offset, item.length()));
            }
        }

        tracing::debug!(
            statements = spans.len(),
            recognized = region.is_some(),
            "Reconciled document"
        );
        region
    }

    fn recognize_span(&self, statement: &str, span: &StatementSpan) {
        let mut ctx = RecognitionContext::new(self.config.recognition_settings());
        if let Some(snapshot) = &self.snapshot {
            ctx = ctx.with_snapshot(snapshot.clone());
        }
        let Some(model) = recognize(statement, &mut ctx) else {
            return;
        };
        let item = ScriptItemSyntaxContext::new(statement, Arc::new(model), span.len(), span.has_boundary)
            .with_problems(ctx.take_problems());
        self.context.register_script_item(span.start, item);
    }

    /// Reserved words that may follow `offset`
    pub fn complete_keywords_at(&self, offset: usize) -> KeywordPrediction {
        let dialect = self.config.dialect;
        let scope = match self.context.find_script_item(offset) {
            Some(found) => CompletionScope::for_keywords_at(found.item.model(), offset - found.offset, dialect),
            None => CompletionScope::offquery(dialect),
        };
        scope.resolve().clone()
    }

    /// The name occurrence covering `offset`
    pub fn token_at(&self, offset: usize) -> Option<TokenInfo> {
        let found = self.context.find_token(offset)?;
        let symbols = found.script_item.item.model().symbols();
        Some(TokenInfo {
            offset: found.offset,
            length: found.token.length,
            name: symbols.entry(found.token.entry).raw_name().to_string(),
            class: symbols.class_of(found.token.entry),
        })
    }

    /// Symbols and problems of every statement
    pub fn statements(&self) -> Vec<StatementReport> {
        self.context
            .script_items()
            .into_iter()
            .map(|found| {
                let model = found.item.model();
                let symbols = found
                    .item
                    .tokens()
                    .map(|(start, token)| TokenInfo {
                        offset: found.offset + start,
                        length: token.length,
                        name: model.symbols().entry(token.entry).raw_name().to_string(),
                        class: model.symbols().class_of(token.entry),
                    })
                    .collect();
                let problems = found
                    .item
                    .problems()
                    .unwrap_or_default()
                    .iter()
                    .map(|problem| RecognitionProblem {
                        interval: problem.interval.shifted(found.offset as isize),
                        ..problem.clone()
                    })
                    .collect();
                StatementReport {
                    offset: found.offset,
                    length: found.item.length(),
                    kind: model.content().map(ModelContent::kind_name),
                    symbols,
                    problems,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_ir::Dialect;

    fn analyzer(text: &str) -> DocumentAnalyzer {
        let mut analyzer = DocumentAnalyzer::new(EngineConfig::for_dialect(Dialect::PostgreSQL));
        analyzer.set_text(text);
        analyzer
    }

    #[test]
    fn test_split_statements() {
        let spans = split_statements("SELECT 1; SELECT 2 ;\n\nSELECT 3  ");
        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start, spans[0].text_end, spans[0].end), (0, 8, 9));
        assert_eq!((spans[1].start, spans[1].text_end, spans[1].end), (10, 18, 20));
        assert_eq!((spans[2].start, spans[2].text_end, spans[2].end), (22, 30, 32));
        assert!(spans[1].has_boundary);
        assert!(!spans[2].has_boundary);
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        let spans = split_statements(";; SELECT 1;;");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 3);
        assert!(split_statements("  -- only a comment").is_empty());
    }

    #[test]
    fn test_statements_are_registered() {
        let analyzer = analyzer("SELECT a FROM t; DELETE FROM u");
        let offsets: Vec<_> = analyzer.context().script_items().iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![0, 17]);
        let kinds: Vec<_> = analyzer.statements().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![Some("query"), Some("delete")]);
    }

    #[test]
    fn test_token_at() {
        let analyzer = analyzer("SELECT a FROM t; SELECT b FROM u");
        let token = analyzer.token_at(24).unwrap();
        assert_eq!(token.name, "b");
        assert_eq!(token.offset, 24);
        assert_eq!(token.class, SymbolClass::Column);
        assert!(analyzer.token_at(20).is_none());
    }

    #[test]
    fn test_edit_outside_bounds_fails() {
        let mut analyzer = analyzer("SELECT 1");
        assert!(matches!(
            analyzer.apply_edit(5, 10, "x"),
            Err(DocumentError::OffsetOutOfBounds { .. })
        ));
        assert_eq!(analyzer.text(), "SELECT 1");
    }

    #[test]
    fn test_edit_inside_multibyte_character_fails() {
        let mut analyzer = analyzer("SELECT 'é'");
        assert!(analyzer.apply_edit(9, 0, "x").is_err());
    }
}
