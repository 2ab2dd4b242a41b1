// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for semantic analysis
//!
//! These errors signal broken invariants of the symbol table and scope
//! stack. Correct recognition never produces them; soft problems found in
//! the analyzed SQL are reported as recognition problems instead.

use thiserror::Error;

use crate::symbol::{SymbolClass, SymbolEntryId, SymbolId};

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Invariant violations raised by the symbol table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// A symbol already carries a different class
    #[error("Symbol '{name}' is already classified as {current:?}, cannot reclassify as {requested:?}")]
    SymbolAlreadyClassified {
        name: String,
        current: SymbolClass,
        requested: SymbolClass,
    },

    /// An entry already points at a different definition
    #[error("Symbol entry '{0}' already has a definition")]
    SymbolAlreadyDefined(String),

    /// Two symbols with different classes cannot be merged
    #[error("Cannot merge symbol {left:?} ({left_class:?}) with {right:?} ({right_class:?})")]
    SymbolClassConflict {
        left: SymbolId,
        left_class: SymbolClass,
        right: SymbolId,
        right_class: SymbolClass,
    },

    /// The id does not belong to this table
    #[error("Unknown symbol entry {0:?}")]
    UnknownEntry(SymbolEntryId),

    /// A scope was closed while another one was on top of the stack
    #[error("Lexical scope closed out of order: expected {expected}, found {found:?}")]
    ScopeStackMismatch { expected: usize, found: Option<usize> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_already_classified() {
        let err = SemanticError::SymbolAlreadyClassified {
            name: "users".to_string(),
            current: SymbolClass::Table,
            requested: SymbolClass::Column,
        };
        let msg = err.to_string();
        assert!(msg.contains("users"));
        assert!(msg.contains("Table"));
        assert!(msg.contains("Column"));
    }

    #[test]
    fn test_error_display_scope_mismatch() {
        let err = SemanticError::ScopeStackMismatch {
            expected: 2,
            found: None,
        };
        assert!(err.to_string().contains("out of order"));
    }
}
