// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document errors

use thiserror::Error;

/// Errors raised while maintaining the document index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Replacing or removing text inside one statement is not supported;
    /// the statement has to be recognized again instead
    #[error("Unsupported delta at offset {offset}: {old_length} characters replaced inside a statement")]
    UnsupportedDelta { offset: usize, old_length: usize },

    #[error("Offset {offset} is out of bounds (length {length})")]
    OffsetOutOfBounds { offset: usize, length: usize },
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
