// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL-specific test helpers and custom assertions

use sqlscope_ir::Dialect;
use sqlscope_lowering::{Model, RecognitionContext, RecognitionSettings, recognize};
use sqlscope_semantic::{RecognitionProblem, SymbolClass, SymbolEntryId};

use crate::MockCatalogBuilder;

/// Recognize `text` without metadata
///
/// # Panics
///
/// Panics when the text holds no tokens.
pub fn recognize_dummy(dialect: Dialect, text: &str) -> Model {
    let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(dialect));
    recognize(text, &mut ctx).unwrap_or_else(|| panic!("nothing recognized in {text:?}"))
}

/// Recognize `text` against the standard schema, returning the problems too
///
/// # Panics
///
/// Panics when the text holds no tokens.
pub fn recognize_with_schema(dialect: Dialect, text: &str) -> (Model, Vec<RecognitionProblem>) {
    let snapshot = MockCatalogBuilder::new().with_standard_schema().snapshot();
    let mut ctx = RecognitionContext::new(RecognitionSettings::for_dialect(dialect)).with_snapshot(snapshot);
    let model = recognize(text, &mut ctx).unwrap_or_else(|| panic!("nothing recognized in {text:?}"));
    (model, ctx.take_problems())
}

/// Custom assertion helpers for recognized models
pub struct SqlAssertions;

impl SqlAssertions {
    /// Entries spelled `raw`, in text order
    pub fn entries_named(model: &Model, raw: &str) -> Vec<SymbolEntryId> {
        let mut entries: Vec<_> = model
            .symbols()
            .entries()
            .filter(|(_, entry)| entry.raw_name() == raw)
            .map(|(id, entry)| (entry.interval().start, id))
            .collect();
        entries.sort();
        entries.into_iter().map(|(_, id)| id).collect()
    }

    /// Assert that every occurrence of `raw` has class `expected`
    pub fn assert_class(model: &Model, raw: &str, expected: SymbolClass) {
        let entries = Self::entries_named(model, raw);
        assert!(!entries.is_empty(), "no symbol entry spelled {raw:?}");
        for entry in entries {
            let actual = model.symbols().class_of(entry);
            assert_eq!(
                actual,
                expected,
                "{raw:?} at {:?} is {actual:?}",
                model.symbols().entry(entry).interval()
            );
        }
    }

    /// Assert that all occurrences of `raw` belong to one symbol
    pub fn assert_same_symbol(model: &Model, raw: &str) {
        let symbols: Vec<_> = Self::entries_named(model, raw)
            .into_iter()
            .map(|entry| model.symbols().symbol_of(entry))
            .collect();
        assert!(symbols.len() > 1, "expected several occurrences of {raw:?}");
        assert!(symbols[0].is_some(), "{raw:?} has no symbol");
        assert!(symbols.windows(2).all(|w| w[0] == w[1]), "{raw:?} spans symbols {symbols:?}");
    }

    /// Assert that no problems were reported
    pub fn assert_no_problems(problems: &[RecognitionProblem]) {
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
    }

    /// Assert that exactly one problem with `message` was reported
    pub fn assert_single_problem(problems: &[RecognitionProblem], message: &str) {
        assert_eq!(problems.len(), 1, "problems: {problems:#?}");
        assert_eq!(problems[0].message, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_in_text_order() {
        let model = recognize_dummy(Dialect::PostgreSQL, "SELECT a FROM t WHERE a > 1");
        let entries = SqlAssertions::entries_named(&model, "a");
        assert_eq!(entries.len(), 2);
        let starts: Vec<usize> = entries
            .iter()
            .map(|e| model.symbols().entry(*e).interval().start)
            .collect();
        assert!(starts[0] < starts[1]);
    }

    #[test]
    fn test_assert_class() {
        let model = recognize_dummy(Dialect::PostgreSQL, "SELECT a FROM t");
        SqlAssertions::assert_class(&model, "a", SymbolClass::Column);
        SqlAssertions::assert_class(&model, "t", SymbolClass::Table);
    }

    #[test]
    #[should_panic(expected = "no symbol entry")]
    fn test_assert_class_requires_entry() {
        let model = recognize_dummy(Dialect::PostgreSQL, "SELECT a FROM t");
        SqlAssertions::assert_class(&model, "b", SymbolClass::Column);
    }
}
