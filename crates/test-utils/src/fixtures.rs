// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample SQL queries
//!
//! Queries are written against the standard schema of
//! [`crate::MockCatalogBuilder::with_standard_schema`].

/// Marks the cursor in completion fixtures
pub const CURSOR_MARKER: &str = "|";

/// Sample SQL queries for testing
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Basic SELECT queries =====

    /// Simple SELECT with column list
    pub const fn simple_select() -> &'static str {
        "SELECT id, email, name FROM users"
    }

    /// SELECT with all columns
    pub const fn select_all() -> &'static str {
        "SELECT * FROM users"
    }

    /// SELECT with WHERE clause
    pub const fn select_with_where() -> &'static str {
        "SELECT id, name FROM users WHERE email LIKE '%@example.com'"
    }

    /// SELECT with ORDER BY on an alias
    pub const fn select_with_order() -> &'static str {
        "SELECT id, name AS n FROM users ORDER BY n"
    }

    // ===== JOIN queries =====

    /// INNER JOIN
    pub const fn inner_join() -> &'static str {
        "SELECT users.name, orders.total
         FROM users
         INNER JOIN orders ON users.id = orders.user_id"
    }

    /// Multiple JOINs with aliases
    pub const fn multiple_joins() -> &'static str {
        "SELECT u.name, o.total, p.name
         FROM users u
         INNER JOIN orders o ON u.id = o.user_id
         INNER JOIN products p ON o.id = p.id"
    }

    /// JOIN ... USING
    pub const fn join_using() -> &'static str {
        "SELECT name, status FROM users JOIN orders USING (id)"
    }

    // ===== Aggregation queries =====

    /// GROUP BY with HAVING
    pub const fn group_by_having() -> &'static str {
        "SELECT user_id, SUM(total) AS total_spent
         FROM orders
         GROUP BY user_id
         HAVING SUM(total) > 1000"
    }

    // ===== Subqueries =====

    /// Subquery in a predicate
    pub const fn simple_subquery() -> &'static str {
        "SELECT name FROM users
         WHERE id IN (SELECT user_id FROM orders WHERE total > 100)"
    }

    /// Correlated subquery
    pub const fn correlated_subquery() -> &'static str {
        "SELECT u.name, (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS order_count
         FROM users u"
    }

    /// Derived table with renamed columns
    pub const fn derived_table() -> &'static str {
        "SELECT d.uid FROM (SELECT user_id FROM orders) AS d (uid)"
    }

    // ===== CTE (Common Table Expressions) =====

    /// CTE query
    pub const fn with_cte() -> &'static str {
        "WITH user_orders AS (
             SELECT user_id, COUNT(*) AS order_count
             FROM orders
             GROUP BY user_id
         )
         SELECT u.name, uo.order_count
         FROM users u
         INNER JOIN user_orders uo ON u.id = uo.user_id"
    }

    // ===== INSERT/UPDATE/DELETE =====

    /// Simple INSERT
    pub const fn simple_insert() -> &'static str {
        "INSERT INTO users (email, name) VALUES ('test@example.com', 'Test User')"
    }

    /// Simple UPDATE
    pub const fn simple_update() -> &'static str {
        "UPDATE users SET name = 'Updated Name' WHERE id = 1"
    }

    /// DELETE with WHERE
    pub const fn simple_delete() -> &'static str {
        "DELETE FROM users u WHERE u.created_at < '2020-01-01'"
    }

    // ===== DDL =====

    /// CREATE TABLE
    pub const fn create_table() -> &'static str {
        "CREATE TABLE audit (
            id BIGINT,
            user_id BIGINT REFERENCES users (id),
            note VARCHAR(100),
            PRIMARY KEY (id)
        )"
    }

    /// DROP TABLE IF EXISTS
    pub const fn drop_table() -> &'static str {
        "DROP TABLE IF EXISTS audit"
    }

    // ===== Error cases =====

    /// Query with undefined table
    pub const fn error_undefined_table() -> &'static str {
        "SELECT * FROM non_existent_table"
    }

    /// Query with undefined column
    pub const fn error_undefined_column() -> &'static str {
        "SELECT non_existent_column FROM users"
    }

    /// Query with ambiguous column
    pub const fn error_ambiguous_column() -> &'static str {
        "SELECT id FROM users u, orders o"
    }
}

/// Multi-statement scripts
pub struct ScriptFixtures;

impl ScriptFixtures {
    /// Three statements, one of them spanning lines
    pub const fn three_statements() -> &'static str {
        "SELECT id FROM users;\nUPDATE users\n   SET name = 'x'\n WHERE id = 2;\nDELETE FROM orders"
    }

    /// Separators inside literals, quoted names and comments do not split
    pub const fn separators_in_literals() -> &'static str {
        "SELECT ';' FROM users; -- a;b\nSELECT \"a;b\" FROM orders"
    }
}

/// Remove the cursor marker from a fixture, returning the text and the
/// cursor offset
///
/// # Panics
///
/// Panics when the fixture has no marker.
pub fn split_cursor(fixture: &str) -> (String, usize) {
    let position = fixture
        .find(CURSOR_MARKER)
        .unwrap_or_else(|| panic!("fixture has no cursor marker: {fixture}"));
    let mut text = fixture.to_string();
    text.replace_range(position..position + CURSOR_MARKER.len(), "");
    (text, position)
}
