// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types and handling strategy for query model recognition
//!
//! Structural errors never reach the caller of the recognizer: they make it
//! fall back to the flat identifier pass. Symbol table errors mean the
//! recognizer itself misbehaved and are reported loudly.

use sqlscope_semantic::SemanticError;

/// Result type alias for recognition operations
pub type LoweringResult<T> = Result<T, LoweringError>;

/// Errors that can occur while building a query model
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum LoweringError {
    /// The syntax node is missing a required child
    #[error("Missing required child node: expected '{expected}', but not found in {context}")]
    MissingChild { context: String, expected: String },

    /// Unexpected node type encountered
    #[error("Unexpected node type: expected '{expected}', found '{found}'")]
    UnexpectedNodeType { expected: String, found: String },

    /// Subqueries nested deeper than the configured limit
    #[error("Recursion limit exceeded: {context} (depth: {depth}, limit: {limit})")]
    RecursionLimitExceeded {
        context: String,
        depth: usize,
        limit: usize,
    },

    /// The symbol table rejected an update
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl LoweringError {
    pub fn missing_child(context: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::MissingChild {
            context: context.into(),
            expected: expected.into(),
        }
    }

    /// Check if recognition can continue with the flat fallback pass
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LoweringError::Semantic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_semantic::SymbolClass;

    #[test]
    fn test_error_display_missing_child() {
        let err = LoweringError::missing_child("querySpecification", "selectList");
        let msg = format!("{}", err);
        assert!(msg.contains("Missing required child"));
        assert!(msg.contains("querySpecification"));
        assert!(msg.contains("selectList"));
    }

    #[test]
    fn test_semantic_errors_are_transparent() {
        let err: LoweringError = SemanticError::SymbolAlreadyClassified {
            name: "id".to_string(),
            current: SymbolClass::Column,
            requested: SymbolClass::Table,
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(
            LoweringError::UnexpectedNodeType {
                expected: "unionTerm".to_string(),
                found: "intersectTerm".to_string(),
            }
            .is_recoverable()
        );
        assert!(
            LoweringError::RecursionLimitExceeded {
                context: "subquery".to_string(),
                depth: 65,
                limit: 64,
            }
            .is_recoverable()
        );
    }
}
