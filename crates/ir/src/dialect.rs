// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! This module defines SQL dialects and the lexical conventions the semantic
//! engine consults while recognizing a statement.
//!
//! ## Design
//!
//! The dialect system is organized into two levels:
//!
//! 1. **Dialect Family**: High-level groupings (Standard, MySQL, PostgreSQL) that share
//!    quoting and case-folding rules
//! 2. **Specific Dialect**: Individual database implementations
//!
//! ## What a dialect answers
//!
//! - The reserved-word set (used to classify keywords typed where a name was
//!   expected and to filter keyword completions)
//! - Quoting predicates (`is_quoted_identifier`, `is_quoted_string`)
//! - Identifier canonicalization (how unquoted names are stored by the database)
//! - Optional syntax extensions that gate grammar alternatives
//!
//! ## Quoting rules
//!
//! | Family     | Identifier quote | String quotes |
//! |------------|------------------|---------------|
//! | Standard   | `"`              | `'`           |
//! | MySQL      | `` ` ``          | `'` and `"`   |
//! | PostgreSQL | `"`              | `'`           |

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Dialect {
    /// ISO/ANSI SQL, used when no connection-specific dialect is known
    #[default]
    Standard,
    /// MySQL (5.7, 8.0)
    MySQL,
    /// PostgreSQL (12, 14, 15+)
    PostgreSQL,
    /// TiDB (5.0, 6.0, 7.0, 8.0)
    TiDB,
    /// MariaDB (10.x, 11.x)
    MariaDB,
    /// CockroachDB (21.x, 22.x, 23.x)
    CockroachDB,
}

/// How a database stores unquoted identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierCase {
    /// Unquoted identifiers are folded to upper case
    Upper,
    /// Unquoted identifiers are folded to lower case
    Lower,
    /// Unquoted identifiers are kept as typed
    Mixed,
}

impl Dialect {
    /// All dialects known to the engine
    pub const ALL: [Dialect; 6] = [
        Dialect::Standard,
        Dialect::MySQL,
        Dialect::PostgreSQL,
        Dialect::TiDB,
        Dialect::MariaDB,
        Dialect::CockroachDB,
    ];

    /// Returns the family this dialect belongs to
    pub fn family(&self) -> DialectFamily {
        match self {
            Dialect::Standard => DialectFamily::Standard,
            Dialect::MySQL | Dialect::TiDB | Dialect::MariaDB => DialectFamily::MySQL,
            Dialect::PostgreSQL | Dialect::CockroachDB => DialectFamily::PostgreSQL,
        }
    }

    /// Check if this dialect supports a specific extension
    pub fn supports(&self, ext: DialectExtensions) -> bool {
        if ext.is_core() {
            return true;
        }

        // MySQL family extensions
        let mysql_family = matches!(
            ext,
            DialectExtensions::LimitOffset
                | DialectExtensions::MultiDelete
                | DialectExtensions::StraightJoin
        );

        // PostgreSQL family extensions
        let postgresql_family = matches!(
            ext,
            DialectExtensions::LimitOffset
                | DialectExtensions::DistinctOn
                | DialectExtensions::LateralJoin
                | DialectExtensions::FullOuterJoin
                | DialectExtensions::TypeCast
        );

        match self {
            Dialect::Standard => ext == DialectExtensions::FullOuterJoin,
            Dialect::MySQL => mysql_family,
            Dialect::PostgreSQL => postgresql_family,
            Dialect::TiDB => mysql_family || ext == DialectExtensions::TiDBSnapshot,
            Dialect::MariaDB => mysql_family,
            Dialect::CockroachDB => postgresql_family,
        }
    }

    /// Reserved words of this dialect, upper-cased
    pub fn reserved_words(&self) -> &'static HashSet<&'static str> {
        match self.family() {
            DialectFamily::Standard => &STANDARD_RESERVED,
            DialectFamily::MySQL => &MYSQL_RESERVED,
            DialectFamily::PostgreSQL => &POSTGRESQL_RESERVED,
        }
    }

    /// Check whether `word` is reserved, ignoring case
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlscope_ir::Dialect;
    ///
    /// assert!(Dialect::Standard.is_reserved_word("select"));
    /// assert!(!Dialect::Standard.is_reserved_word("users"));
    /// ```
    pub fn is_reserved_word(&self, word: &str) -> bool {
        self.reserved_words()
            .contains(word.to_ascii_uppercase().as_str())
    }

    /// Characters that open and close a quoted identifier
    pub fn identifier_quotes(&self) -> &'static [char] {
        match self.family() {
            DialectFamily::MySQL => &['`'],
            DialectFamily::Standard | DialectFamily::PostgreSQL => &['"'],
        }
    }

    /// Characters that open and close a string literal
    pub fn string_quotes(&self) -> &'static [char] {
        match self.family() {
            DialectFamily::MySQL => &['\'', '"'],
            DialectFamily::Standard | DialectFamily::PostgreSQL => &['\''],
        }
    }

    /// Check whether `raw` is a quoted identifier in this dialect
    pub fn is_quoted_identifier(&self, raw: &str) -> bool {
        is_enclosed_by_any(raw, self.identifier_quotes())
    }

    /// Check whether `raw` is a quoted string literal in this dialect
    pub fn is_quoted_string(&self, raw: &str) -> bool {
        is_enclosed_by_any(raw, self.string_quotes())
    }

    /// How unquoted identifiers are stored
    pub fn identifier_case(&self) -> IdentifierCase {
        match self.family() {
            DialectFamily::Standard => IdentifierCase::Upper,
            DialectFamily::MySQL => IdentifierCase::Mixed,
            DialectFamily::PostgreSQL => IdentifierCase::Lower,
        }
    }

    /// Remove identifier quotes, collapsing doubled quote characters
    ///
    /// Text that is not a quoted identifier is returned unchanged.
    pub fn unquote_identifier(&self, raw: &str) -> String {
        if !self.is_quoted_identifier(raw) {
            return raw.to_string();
        }
        let mut chars = raw.chars();
        let quote = chars.next().unwrap_or('"');
        let inner = &raw[quote.len_utf8()..raw.len() - quote.len_utf8()];
        let doubled: String = [quote, quote].iter().collect();
        inner.replace(&doubled, &quote.to_string())
    }

    /// Convert an identifier to the form the database stores it in
    ///
    /// Quoted identifiers keep their exact spelling; with `force_unquoted`
    /// the quotes are stripped, otherwise the raw text is returned as is.
    /// Unquoted identifiers are case-folded according to [`Self::identifier_case`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlscope_ir::Dialect;
    ///
    /// assert_eq!(Dialect::PostgreSQL.canonicalize_identifier("Users", false), "users");
    /// assert_eq!(Dialect::Standard.canonicalize_identifier("users", false), "USERS");
    /// assert_eq!(Dialect::PostgreSQL.canonicalize_identifier("\"Users\"", true), "Users");
    /// ```
    pub fn canonicalize_identifier(&self, raw: &str, force_unquoted: bool) -> String {
        if self.is_quoted_identifier(raw) {
            return if force_unquoted {
                self.unquote_identifier(raw)
            } else {
                raw.to_string()
            };
        }
        match self.identifier_case() {
            IdentifierCase::Upper => raw.to_uppercase(),
            IdentifierCase::Lower => raw.to_lowercase(),
            IdentifierCase::Mixed => raw.to_string(),
        }
    }
}

fn is_enclosed_by_any(raw: &str, quotes: &[char]) -> bool {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => first == last && quotes.contains(&first),
        _ => false,
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Standard => "standard",
            Dialect::MySQL => "mysql",
            Dialect::PostgreSQL => "postgresql",
            Dialect::TiDB => "tidb",
            Dialect::MariaDB => "mariadb",
            Dialect::CockroachDB => "cockroachdb",
        };
        f.write_str(name)
    }
}

/// Error returned when a dialect name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown SQL dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "ansi" | "sql" => Ok(Dialect::Standard),
            "mysql" => Ok(Dialect::MySQL),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSQL),
            "tidb" => Ok(Dialect::TiDB),
            "mariadb" => Ok(Dialect::MariaDB),
            "cockroachdb" | "cockroach" => Ok(Dialect::CockroachDB),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// Dialect family groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectFamily {
    Standard,
    MySQL,
    PostgreSQL,
}

/// Dialect-specific extensions and features
///
/// These represent syntax or features that are not part of the core SQL subset
/// and are specific to certain dialects. The grammar gates the matching
/// alternatives with a predicate on the active dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DialectExtensions {
    /// LIMIT ... OFFSET ... syntax (MySQL, PostgreSQL)
    LimitOffset,

    /// DISTINCT ON (PostgreSQL, CockroachDB)
    DistinctOn,

    /// LATERAL JOIN (PostgreSQL, CockroachDB)
    LateralJoin,

    /// Window functions (PostgreSQL, MySQL 8.0+)
    WindowFunctions,

    /// STRAIGHT_JOIN hint (MySQL family)
    StraightJoin,

    /// Multi-table DELETE (MySQL family)
    MultiDelete,

    /// TiDB-specific: TIDB_SNAPSHOT
    TiDBSnapshot,

    /// CTE (Common Table Expression) - WITH clauses
    CTE,

    /// FULL OUTER JOIN
    FullOuterJoin,

    /// `expr::type` casts (PostgreSQL family)
    TypeCast,
}

impl DialectExtensions {
    /// Check if this extension is part of the core SQL subset
    pub fn is_core(self) -> bool {
        matches!(
            self,
            DialectExtensions::CTE | DialectExtensions::WindowFunctions
        )
    }
}

const STANDARD_WORDS: &[&str] = &[
    "ABS", "ALL", "ALLOCATE", "ALTER", "AND", "ANY", "ARE", "ARRAY", "AS", "ASC",
    "ASENSITIVE", "ASYMMETRIC", "AT", "ATOMIC", "AUTHORIZATION", "AVG", "BEGIN", "BETWEEN",
    "BIGINT", "BINARY", "BLOB", "BOOLEAN", "BOTH", "BY", "CALL", "CALLED", "CASCADED", "CASE",
    "CAST", "CEIL", "CHAR", "CHARACTER", "CHECK", "CLOB", "CLOSE", "COLLATE", "COLUMN",
    "COMMIT", "CONDITION", "CONNECT", "CONSTRAINT", "CONVERT", "CORRESPONDING", "COUNT",
    "CREATE", "CROSS", "CUBE", "CURRENT", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR", "CYCLE", "DATE", "DAY", "DEALLOCATE",
    "DEC", "DECIMAL", "DECLARE", "DEFAULT", "DELETE", "DEREF", "DESC", "DESCRIBE",
    "DETERMINISTIC", "DISCONNECT", "DISTINCT", "DOUBLE", "DROP", "DYNAMIC", "EACH", "ELEMENT",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "EXTERNAL", "EXTRACT",
    "FALSE", "FETCH", "FILTER", "FLOAT", "FOR", "FOREIGN", "FREE", "FROM", "FULL", "FUNCTION",
    "GET", "GLOBAL", "GRANT", "GROUP", "GROUPING", "HAVING", "HOLD", "HOUR", "IDENTITY", "IN",
    "INDICATOR", "INNER", "INOUT", "INSENSITIVE", "INSERT", "INT", "INTEGER", "INTERSECT",
    "INTERVAL", "INTO", "IS", "JOIN", "LANGUAGE", "LARGE", "LATERAL", "LEADING", "LEFT",
    "LIKE", "LOCAL", "LOCALTIME", "LOCALTIMESTAMP", "MATCH", "MAX", "MEMBER", "MERGE",
    "METHOD", "MIN", "MINUTE", "MODIFIES", "MODULE", "MONTH", "MULTISET", "NATIONAL",
    "NATURAL", "NCHAR", "NCLOB", "NEW", "NO", "NONE", "NOT", "NULL", "NUMERIC", "OF",
    "OFFSET", "OLD", "ON", "ONLY", "OPEN", "OR", "ORDER", "OUT", "OUTER", "OVER", "OVERLAPS",
    "PARAMETER", "PARTITION", "PRECISION", "PREPARE", "PRIMARY", "PROCEDURE", "RANGE",
    "READS", "REAL", "RECURSIVE", "REF", "REFERENCES", "REFERENCING", "RELEASE", "RETURN",
    "RETURNS", "REVOKE", "RIGHT", "ROLLBACK", "ROLLUP", "ROW", "ROWS", "SAVEPOINT", "SCOPE",
    "SCROLL", "SEARCH", "SECOND", "SELECT", "SENSITIVE", "SESSION_USER", "SET", "SIMILAR",
    "SMALLINT", "SOME", "SPECIFIC", "SQL", "SQLEXCEPTION", "SQLSTATE", "SQLWARNING", "START",
    "STATIC", "SUBMULTISET", "SUM", "SYMMETRIC", "SYSTEM", "SYSTEM_USER", "TABLE", "THEN",
    "TIME", "TIMESTAMP", "TO", "TRAILING", "TRANSLATION", "TREAT", "TRIGGER", "TRUE",
    "UNION", "UNIQUE", "UNKNOWN", "UNNEST", "UPDATE", "USER", "USING", "VALUE", "VALUES",
    "VARCHAR", "VARYING", "VIEW", "WHEN", "WHENEVER", "WHERE", "WINDOW", "WITH", "WITHIN",
    "WITHOUT", "YEAR",
];

const MYSQL_WORDS: &[&str] = &[
    "ANALYZE", "CASCADE", "CHANGE", "DATABASE", "DATABASES", "DELAYED", "DISTINCTROW", "DIV",
    "EXPLAIN", "FORCE", "IF", "IGNORE", "INDEX", "KEY", "KEYS", "KILL", "LIMIT", "LINES",
    "LOAD", "LOCK", "MOD", "OPTIMIZE", "PURGE", "REGEXP", "RENAME", "REPLACE", "REQUIRE",
    "RESTRICT", "RLIKE", "SCHEMA", "SCHEMAS", "SHOW", "SPATIAL", "STRAIGHT_JOIN", "TINYINT",
    "UNLOCK", "UNSIGNED", "USE", "WHILE", "XOR", "ZEROFILL",
];

const POSTGRESQL_WORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "CONCURRENTLY", "DEFERRABLE", "DO", "FREEZE", "ILIKE", "INITIALLY",
    "ISNULL", "LIMIT", "NOTNULL", "PLACING", "RETURNING", "VARIADIC", "VERBOSE",
];

static STANDARD_RESERVED: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STANDARD_WORDS.iter().copied().collect());

static MYSQL_RESERVED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STANDARD_WORDS
        .iter()
        .chain(MYSQL_WORDS.iter())
        .copied()
        .collect()
});

static POSTGRESQL_RESERVED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STANDARD_WORDS
        .iter()
        .chain(POSTGRESQL_WORDS.iter())
        .copied()
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family() {
        assert_eq!(Dialect::TiDB.family(), DialectFamily::MySQL);
        assert_eq!(Dialect::CockroachDB.family(), DialectFamily::PostgreSQL);
        assert_eq!(Dialect::Standard.family(), DialectFamily::Standard);
    }

    #[test]
    fn test_supports_limit_offset() {
        assert!(Dialect::MySQL.supports(DialectExtensions::LimitOffset));
        assert!(Dialect::PostgreSQL.supports(DialectExtensions::LimitOffset));
        assert!(!Dialect::Standard.supports(DialectExtensions::LimitOffset));
        assert!(Dialect::Standard.supports(DialectExtensions::CTE));
    }

    #[test]
    fn test_reserved_words_per_family() {
        assert!(Dialect::MySQL.is_reserved_word("limit"));
        assert!(!Dialect::Standard.is_reserved_word("limit"));
        assert!(Dialect::PostgreSQL.is_reserved_word("ILIKE"));
        assert!(!Dialect::MySQL.is_reserved_word("ilike"));
        assert!(Dialect::MariaDB.is_reserved_word("Select"));
    }

    #[test]
    fn test_quoting_predicates() {
        assert!(Dialect::Standard.is_quoted_identifier("\"a\""));
        assert!(!Dialect::Standard.is_quoted_identifier("`a`"));
        assert!(Dialect::MySQL.is_quoted_identifier("`a`"));
        assert!(Dialect::MySQL.is_quoted_string("\"a\""));
        assert!(!Dialect::PostgreSQL.is_quoted_string("\"a\""));
        assert!(!Dialect::Standard.is_quoted_identifier("\""));
        assert!(!Dialect::Standard.is_quoted_string(""));
    }

    #[test]
    fn test_unquote_identifier_collapses_doubled_quotes() {
        assert_eq!(Dialect::Standard.unquote_identifier("\"a\"\"b\""), "a\"b");
        assert_eq!(Dialect::MySQL.unquote_identifier("`x`"), "x");
        assert_eq!(Dialect::MySQL.unquote_identifier("plain"), "plain");
    }

    #[test]
    fn test_canonicalize_identifier() {
        assert_eq!(Dialect::MySQL.canonicalize_identifier("Users", false), "Users");
        assert_eq!(Dialect::PostgreSQL.canonicalize_identifier("Users", false), "users");
        assert_eq!(Dialect::Standard.canonicalize_identifier("users", true), "USERS");
        assert_eq!(
            Dialect::Standard.canonicalize_identifier("\"Users\"", false),
            "\"Users\""
        );
    }

    #[test]
    fn test_from_str_and_display() {
        for dialect in Dialect::ALL {
            let parsed: Dialect = dialect.to_string().parse().unwrap();
            assert_eq!(parsed, dialect);
        }
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::PostgreSQL);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
