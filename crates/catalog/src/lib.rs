// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlscope - Catalog Layer
//!
//! This crate provides the database metadata that semantic analysis resolves
//! names against.
//!
//! - **Catalogs**: the async [`Catalog`] trait and the in-memory [`StaticCatalog`]
//! - **Snapshots**: [`CatalogSnapshot`], a synchronous lookup structure
//!   prefetched from a catalog
//! - **Objects**: [`DatabaseObject`] chains (catalog, schema, table, column)
//!   that resolved symbols point at
//!
//! ## Usage
//!
//! ```rust
//! use sqlscope_catalog::{CatalogSnapshot, StaticCatalog};
//!
//! # tokio_test::block_on(async {
//! let snapshot = CatalogSnapshot::load(&StaticCatalog::playground()).await.unwrap();
//! let users = snapshot.find_real_object(&["users".to_string()]).unwrap().unwrap();
//! assert_eq!(users.to_string(), "playground.users");
//! # });
//! ```

pub mod error;
pub mod object;
pub mod snapshot;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use error::{CatalogError, CatalogResult};
pub use object::{DatabaseObject, ObjectKind};
pub use r#static::StaticCatalog;
pub use r#trait::Catalog;
pub use snapshot::CatalogSnapshot;
