// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Grammar errors

use thiserror::Error;

pub type GrammarResult<T> = Result<T, GrammarError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Unknown grammar rule: {0}")]
    UnknownRule(String),

    #[error("Unknown token type id: {0}")]
    UnknownTokenId(u16),
}
