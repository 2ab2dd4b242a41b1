// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for sqlscope
//!
//! This crate provides common testing components including:
//! - Mock catalog implementations
//! - Recognition helpers and assertions over symbol classes
//! - Test fixtures and sample data

pub mod assertions;
pub mod fixtures;
pub mod mock_catalog;

// Re-exports for convenience
pub use assertions::{SqlAssertions, recognize_dummy, recognize_with_schema};
pub use fixtures::{CURSOR_MARKER, ScriptFixtures, SqlFixtures, split_cursor};
pub use mock_catalog::{MockCatalog, MockCatalogBuilder};
