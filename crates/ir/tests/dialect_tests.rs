// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for dialect conventions

use sqlscope_ir::{Dialect, DialectFamily, IdentifierCase};

#[test]
fn test_every_dialect_reserves_core_keywords() {
    for dialect in Dialect::ALL {
        for word in ["SELECT", "FROM", "WHERE", "JOIN", "UNION", "GROUP", "ORDER"] {
            assert!(
                dialect.is_reserved_word(word),
                "{dialect} should reserve {word}"
            );
        }
    }
}

#[test]
fn test_family_specific_reserved_words() {
    assert!(Dialect::TiDB.is_reserved_word("straight_join"));
    assert!(Dialect::CockroachDB.is_reserved_word("returning"));
    assert!(!Dialect::Standard.is_reserved_word("returning"));
}

#[test]
fn test_case_folding_by_family() {
    assert_eq!(Dialect::Standard.identifier_case(), IdentifierCase::Upper);
    assert_eq!(Dialect::MariaDB.identifier_case(), IdentifierCase::Mixed);
    assert_eq!(Dialect::CockroachDB.identifier_case(), IdentifierCase::Lower);
}

#[test]
fn test_quoted_identifiers_keep_spelling_unless_forced() {
    let dialect = Dialect::MySQL;
    assert_eq!(dialect.canonicalize_identifier("`Order`", false), "`Order`");
    assert_eq!(dialect.canonicalize_identifier("`Order`", true), "Order");
    // A double-quoted token is a string in MySQL, not an identifier
    assert_eq!(dialect.canonicalize_identifier("\"Order\"", true), "\"Order\"");
}

#[test]
fn test_dialect_serde_uses_lowercase_names() {
    let json = serde_json::to_string(&Dialect::PostgreSQL).unwrap();
    assert_eq!(json, "\"postgresql\"");
    let back: Dialect = serde_json::from_str("\"mysql\"").unwrap();
    assert_eq!(back.family(), DialectFamily::MySQL);
}
