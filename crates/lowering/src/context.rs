// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recognition context for tracking state across statements
//!
//! A [`RecognitionContext`] is created once per document analysis and
//! handed to the recognizer for every statement. It carries the settings,
//! the catalog snapshot (if any) and the problems found in the statement
//! being recognized.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlscope_catalog::CatalogSnapshot;
use sqlscope_ir::Dialect;
use sqlscope_semantic::{ProblemCollector, RecognitionProblem};

use crate::error::{LoweringError, LoweringResult};

/// Default cap on problems kept per statement
pub const DEFAULT_MAX_PROBLEMS: usize = 100;

/// Default limit on syntax nesting, shared with the parser
pub const DEFAULT_MAX_DEPTH: usize = sqlscope_grammar::DEFAULT_MAX_DEPTH;

/// Settings the recognizer reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionSettings {
    /// Dialect used for parsing, quoting and reserved words
    pub dialect: Dialect,

    /// Resolve names against the catalog snapshot when one is available
    pub read_metadata: bool,

    /// Problems beyond this count are dropped
    pub max_problems_per_statement: usize,

    /// Report every problem as a warning
    pub report_problems_as_warnings: bool,

    /// Rule nesting limit for the parser and for nested subqueries
    pub parser_max_depth: usize,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            read_metadata: true,
            max_problems_per_statement: DEFAULT_MAX_PROBLEMS,
            report_problems_as_warnings: false,
            parser_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RecognitionSettings {
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

/// Context for tracking state during recognition
///
/// The context maintains:
/// - The settings and optional catalog snapshot
/// - Problems accumulated for the current statement
/// - Subquery nesting depth
pub struct RecognitionContext {
    settings: RecognitionSettings,
    snapshot: Option<Arc<CatalogSnapshot>>,
    problems: ProblemCollector,
    depth: usize,
}

impl RecognitionContext {
    /// Create a new recognition context without metadata
    pub fn new(settings: RecognitionSettings) -> Self {
        let problems = ProblemCollector::new(
            settings.max_problems_per_statement,
            settings.report_problems_as_warnings,
        );
        Self {
            settings,
            snapshot: None,
            problems,
            depth: 0,
        }
    }

    /// Builder method: attach a catalog snapshot
    pub fn with_snapshot(mut self, snapshot: Arc<CatalogSnapshot>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    pub fn dialect(&self) -> Dialect {
        self.settings.dialect
    }

    pub fn snapshot(&self) -> Option<&Arc<CatalogSnapshot>> {
        self.snapshot.as_ref()
    }

    /// The snapshot to resolve names against, if metadata reading is on
    pub fn metadata(&self) -> Option<&Arc<CatalogSnapshot>> {
        self.snapshot.as_ref().filter(|_| self.settings.read_metadata)
    }

    /// Add a problem found in the current statement
    pub fn append_problem(&mut self, problem: RecognitionProblem) {
        self.problems.append(problem);
    }

    pub fn problems(&self) -> &[RecognitionProblem] {
        self.problems.problems()
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn problem_collector(&mut self) -> &mut ProblemCollector {
        &mut self.problems
    }

    /// Take the problems of the current statement and start a fresh list
    pub fn take_problems(&mut self) -> Vec<RecognitionProblem> {
        let fresh = ProblemCollector::new(
            self.settings.max_problems_per_statement,
            self.settings.report_problems_as_warnings,
        );
        std::mem::replace(&mut self.problems, fresh).into_problems()
    }

    /// Enter a nested subquery
    ///
    /// # Errors
    ///
    /// Returns [`LoweringError::RecursionLimitExceeded`] when nesting goes
    /// beyond `parser_max_depth`.
    pub fn enter_subquery(&mut self) -> LoweringResult<()> {
        if self.depth >= self.settings.parser_max_depth {
            return Err(LoweringError::RecursionLimitExceeded {
                context: "subquery".to_string(),
                depth: self.depth + 1,
                limit: self.settings.parser_max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_subquery(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn subquery_depth(&self) -> usize {
        self.depth
    }
}
