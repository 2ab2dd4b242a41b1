// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Engine Configuration
//!
//! Settings that control recognition: the dialect, whether names are
//! resolved against catalog metadata, and the limits applied per
//! statement.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use sqlscope_engine::EngineConfig;
//! use sqlscope_ir::Dialect;
//!
//! let settings = json!({
//!     "sqlscope": {
//!         "dialect": "postgresql",
//!         "maxProblemsPerStatement": 20
//!     }
//! });
//! let config = EngineConfig::from_settings(&settings).unwrap();
//! assert_eq!(config.dialect, Dialect::PostgreSQL);
//! assert_eq!(config.max_problems_per_statement, 20);
//! assert!(config.read_metadata);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlscope_ir::Dialect;
use sqlscope_lowering::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PROBLEMS, RecognitionSettings};

/// Key of the settings object read by [`EngineConfig::from_settings`]
pub const SETTINGS_SECTION: &str = "sqlscope";

/// Nesting limits below this cannot parse ordinary statements
const MIN_PARSER_DEPTH: usize = 32;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// SQL dialect
    pub dialect: Dialect,

    /// Resolve names against catalog metadata when a catalog is attached
    pub read_metadata: bool,

    /// Problems beyond this count are dropped
    pub max_problems_per_statement: usize,

    /// Report every problem as a warning
    pub report_problems_as_warnings: bool,

    /// Rule nesting limit for the parser
    pub parser_max_depth: usize,
}

impl Default for EngineConfig {
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

impl EngineConfig {
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_problems_per_statement == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxProblemsPerStatement",
                reason: "must be > 0".to_string(),
            });
        }
        if self.parser_max_depth < MIN_PARSER_DEPTH {
            return Err(ConfigError::InvalidValue {
                field: "parserMaxDepth",
                reason: format!("must be >= {MIN_PARSER_DEPTH}"),
            });
        }
        Ok(())
    }

    /// Parse and validate the engine config from a client settings payload
    ///
    /// Expected shape:
    /// ```json
    /// {
    ///   "sqlscope": {
    ///     "dialect": "mysql",
    ///     "readMetadata": true,
    ///     "maxProblemsPerStatement": 100,
    ///     "reportProblemsAsWarnings": false,
    ///     "parserMaxDepth": 512
    ///   }
    /// }
    /// ```
    /// Missing keys keep their defaults.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let section = settings
            .get(SETTINGS_SECTION)
            .ok_or(ConfigError::MissingSection(SETTINGS_SECTION))?;
        let config: EngineConfig = serde_json::from_value(section.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a settings document such as the CLI's `--settings` file
    pub fn from_settings_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Value = serde_json::from_str(json)?;
        Self::from_settings(&settings)
    }

    /// The settings handed to the recognizer
    pub fn recognition_settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            dialect: self.dialect,
            read_metadata: self.read_metadata,
            max_problems_per_statement: self.max_problems_per_statement,
            report_problems_as_warnings: self.report_problems_as_warnings,
            parser_max_depth: self.parser_max_depth,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings have no \"{0}\" section")]
    MissingSection(&'static str),

    #[error("Invalid settings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
