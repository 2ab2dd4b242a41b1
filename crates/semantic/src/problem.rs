// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Recognition problems
//!
//! Soft problems found while recognizing a statement, such as an unknown
//! column. They are collected per statement and shown as diagnostics; they
//! never abort recognition.

use serde::Serialize;
use sqlscope_ir::Interval;
use tracing::debug;

use crate::symbol::SymbolEntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSeverity {
    Error,
    Warning,
}

/// A diagnostic attached to a source interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionProblem {
    pub severity: ProblemSeverity,
    pub interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<SymbolEntryId>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RecognitionProblem {
    pub fn error(interval: Interval, message: impl Into<String>) -> Self {
        Self {
            severity: ProblemSeverity::Error,
            interval,
            entry: None,
            message: message.into(),
            cause: None,
        }
    }

    pub fn warning(interval: Interval, message: impl Into<String>) -> Self {
        Self {
            severity: ProblemSeverity::Warning,
            ..Self::error(interval, message)
        }
    }

    pub fn with_entry(mut self, entry: SymbolEntryId) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Per-statement problem list with a size cap
///
/// Problems past the cap are counted but not kept. With
/// `report_as_warnings` every error is downgraded on the way in.
#[derive(Debug, Clone)]
pub struct ProblemCollector {
    max_problems: usize,
    report_as_warnings: bool,
    problems: Vec<RecognitionProblem>,
    dropped: usize,
}

impl ProblemCollector {
    pub fn new(max_problems: usize, report_as_warnings: bool) -> Self {
        Self {
            max_problems,
            report_as_warnings,
            problems: Vec::new(),
            dropped: 0,
        }
    }

    pub fn append(&mut self, mut problem: RecognitionProblem) {
        if self.problems.len() >= self.max_problems {
            self.dropped += 1;
            debug!(message = %problem.message, dropped = self.dropped, "problem limit reached");
            return;
        }
        if self.report_as_warnings {
            problem.severity = ProblemSeverity::Warning;
        }
        self.problems.push(problem);
    }

    pub fn problems(&self) -> &[RecognitionProblem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Problems that did not fit under the cap
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_problems(self) -> Vec<RecognitionProblem> {
        self.problems
    }
}
