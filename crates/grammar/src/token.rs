// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Token vocabulary
//!
//! Every token kind the lexer can produce. Keywords are declared in two
//! groups: reserved keywords, and non-reserved keywords that may still be
//! used as identifiers. Non-reserved keywords are declared last and
//! contiguously so that the grammar can match all of them with a single
//! range.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use sqlscope_ir::Interval;

use crate::error::GrammarError;

macro_rules! token_kinds {
    (
        punctuation { $($p:ident = $ptext:literal),* $(,)? }
        literals { $($l:ident = $ltext:literal),* $(,)? }
        keywords { $($k:ident = $ktext:literal),* $(,)? }
        non_reserved { $($n:ident = $ntext:literal),* $(,)? }
    ) => {
        /// Kind of a lexical token
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u16)]
        pub enum TokenKind {
            $($p,)*
            $($l,)*
            $($k,)*
            $($n,)*
        }

        impl TokenKind {
            /// All token kinds in declaration order; `ALL[k.id()] == k`
            pub const ALL: &'static [TokenKind] = &[
                $(TokenKind::$p,)*
                $(TokenKind::$l,)*
                $(TokenKind::$k,)*
                $(TokenKind::$n,)*
            ];

            /// Text shown to users: the keyword, the operator, or a
            /// descriptive name for literal classes
            pub fn display_name(self) -> &'static str {
                match self {
                    $(TokenKind::$p => $ptext,)*
                    $(TokenKind::$l => $ltext,)*
                    $(TokenKind::$k => $ktext,)*
                    $(TokenKind::$n => $ntext,)*
                }
            }

            /// Whether this kind is a keyword, reserved or not
            pub fn is_keyword(self) -> bool {
                matches!(self, $(TokenKind::$k)|* | $(TokenKind::$n)|*)
            }

            /// Whether this keyword may also serve as an identifier
            pub fn is_non_reserved(self) -> bool {
                matches!(self, $(TokenKind::$n)|*)
            }

            fn keyword_table() -> HashMap<&'static str, TokenKind> {
                HashMap::from([
                    $(($ktext, TokenKind::$k),)*
                    $(($ntext, TokenKind::$n),)*
                ])
            }
        }
    };
}

token_kinds! {
    punctuation {
        Comma = ",",
        Period = ".",
        Semicolon = ";",
        LeftParen = "(",
        RightParen = ")",
        Asterisk = "*",
        Plus = "+",
        Minus = "-",
        Solidus = "/",
        Percent = "%",
        Concat = "||",
        Equals = "=",
        NotEquals = "<>",
        Less = "<",
        Greater = ">",
        LessEquals = "<=",
        GreaterEquals = ">=",
        DoubleColon = "::",
        Colon = ":",
        QuestionMark = "?",
    }
    literals {
        Identifier = "identifier",
        Quoted = "quoted identifier",
        StringLiteral = "string literal",
        NumericLiteral = "numeric literal",
        BatchVariable = "batch variable",
        ClientVariable = "client variable",
        Unexpected = "unexpected character",
    }
    keywords {
        All = "ALL",
        Alter = "ALTER",
        And = "AND",
        As = "AS",
        Asc = "ASC",
        Between = "BETWEEN",
        Bigint = "BIGINT",
        Boolean = "BOOLEAN",
        By = "BY",
        Case = "CASE",
        Char = "CHAR",
        Character = "CHARACTER",
        Corresponding = "CORRESPONDING",
        Create = "CREATE",
        Cross = "CROSS",
        Date = "DATE",
        Decimal = "DECIMAL",
        Default = "DEFAULT",
        Delete = "DELETE",
        Desc = "DESC",
        Distinct = "DISTINCT",
        Double = "DOUBLE",
        Drop = "DROP",
        Else = "ELSE",
        End = "END",
        Except = "EXCEPT",
        Exists = "EXISTS",
        False = "FALSE",
        Float = "FLOAT",
        From = "FROM",
        Full = "FULL",
        Group = "GROUP",
        Having = "HAVING",
        In = "IN",
        Inner = "INNER",
        Insert = "INSERT",
        Int = "INT",
        Integer = "INTEGER",
        Intersect = "INTERSECT",
        Into = "INTO",
        Is = "IS",
        Join = "JOIN",
        Left = "LEFT",
        Like = "LIKE",
        Limit = "LIMIT",
        Natural = "NATURAL",
        Not = "NOT",
        Null = "NULL",
        Numeric = "NUMERIC",
        Offset = "OFFSET",
        On = "ON",
        Or = "OR",
        Order = "ORDER",
        Outer = "OUTER",
        Precision = "PRECISION",
        Primary = "PRIMARY",
        Real = "REAL",
        Recursive = "RECURSIVE",
        References = "REFERENCES",
        Right = "RIGHT",
        Select = "SELECT",
        Set = "SET",
        Smallint = "SMALLINT",
        Table = "TABLE",
        Then = "THEN",
        Time = "TIME",
        Timestamp = "TIMESTAMP",
        True = "TRUE",
        Union = "UNION",
        Unique = "UNIQUE",
        Unknown = "UNKNOWN",
        Update = "UPDATE",
        Using = "USING",
        Values = "VALUES",
        Varchar = "VARCHAR",
        View = "VIEW",
        When = "WHEN",
        Where = "WHERE",
        With = "WITH",
    }
    non_reserved {
        Add = "ADD",
        Cascade = "CASCADE",
        Column = "COLUMN",
        If = "IF",
        Key = "KEY",
        Procedure = "PROCEDURE",
        Restrict = "RESTRICT",
        Text = "TEXT",
    }
}

static KEYWORDS: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(TokenKind::keyword_table);

impl TokenKind {
    /// First and last non-reserved keyword; every kind in between is one too
    pub const NON_RESERVED_RANGE: (TokenKind, TokenKind) = (TokenKind::Add, TokenKind::Text);

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<TokenKind> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// Look up a keyword by its spelling, ignoring case
    pub fn keyword(word: &str) -> Option<TokenKind> {
        KEYWORDS.get(word.to_ascii_uppercase().as_str()).copied()
    }

    /// Whether `self` lies within `from..=to` in declaration order
    pub fn in_range(self, from: TokenKind, to: TokenKind) -> bool {
        from.id() <= self.id() && self.id() <= to.id()
    }
}

impl TryFrom<u16> for TokenKind {
    type Error = GrammarError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        TokenKind::from_id(id).ok_or(GrammarError::UnknownTokenId(id))
    }
}

/// A lexical token with its byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub interval: Interval,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            interval: Interval::new(start, end),
        }
    }

    /// The token's spelling in `source`
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.interval.start..self.interval.end).unwrap_or("")
    }
}
