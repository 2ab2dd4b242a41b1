// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Grammar rules
//!
//! The SQL grammar as a set of named rules. Each [`RuleKind`] maps to an
//! [`Element`] tree built from tokens, token sets, rule references and the
//! usual EBNF combinators. Because rules are an enum and [`definition`] is an
//! exhaustive match, every referenced rule is guaranteed to exist.
//!
//! Rule names follow the camelCase spelling used by tree consumers, e.g.
//! `querySpecification` or `columnReference`.

use serde::Serialize;
use sqlscope_ir::DialectExtensions;

use crate::error::GrammarError;
use crate::token::TokenKind;

macro_rules! rule_kinds {
    ($($kind:ident => $name:literal),* $(,)?) => {
        /// A named grammar rule
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u16)]
        pub enum RuleKind {
            $($kind,)*
        }

        impl RuleKind {
            pub const ALL: &'static [RuleKind] = &[$(RuleKind::$kind,)*];

            /// The rule name as it appears in syntax trees
            pub fn name(self) -> &'static str {
                match self {
                    $(RuleKind::$kind => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<RuleKind> {
                match name {
                    $($name => Some(RuleKind::$kind),)*
                    _ => None,
                }
            }
        }
    };
}

rule_kinds! {
    SqlQueries => "sqlQueries",
    SqlQuery => "sqlQuery",
    DirectSqlDataStatement => "directSqlDataStatement",
    WithClause => "withClause",
    CteList => "cteList",
    WithListElement => "with_list_element",
    SelectStatement => "selectStatement",
    QueryExpression => "queryExpression",
    UnionTerm => "unionTerm",
    ExceptTerm => "exceptTerm",
    CorrespondingSpec => "correspondingSpec",
    NonJoinQueryTerm => "nonJoinQueryTerm",
    IntersectTerm => "intersectTerm",
    QueryPrimary => "queryPrimary",
    NonJoinQueryPrimary => "nonJoinQueryPrimary",
    SimpleTable => "simpleTable",
    QuerySpecification => "querySpecification",
    SetQuantifier => "setQuantifier",
    SelectList => "selectList",
    SelectSublist => "selectSublist",
    DerivedColumn => "derivedColumn",
    AsClause => "asClause",
    TableExpression => "tableExpression",
    FromClause => "fromClause",
    TableReference => "tableReference",
    JoinedTable => "joinedTable",
    NonjoinedTableReference => "nonjoinedTableReference",
    DerivedTable => "derivedTable",
    TableSubquery => "tableSubquery",
    Subquery => "subquery",
    CorrelationSpecification => "correlationSpecification",
    DerivedColumnList => "derivedColumnList",
    CrossJoinTerm => "crossJoinTerm",
    NaturalJoinTerm => "naturalJoinTerm",
    JoinType => "joinType",
    OuterJoinType => "outerJoinType",
    JoinSpecification => "joinSpecification",
    JoinCondition => "joinCondition",
    NamedColumnsJoin => "namedColumnsJoin",
    WhereClause => "whereClause",
    GroupByClause => "groupByClause",
    HavingClause => "havingClause",
    OrderByClause => "orderByClause",
    SortSpecificationList => "sortSpecificationList",
    SortSpecification => "sortSpecification",
    OrderingSpecification => "orderingSpecification",
    LimitClause => "limitClause",
    ExplicitTable => "explicitTable",
    TableValueConstructor => "tableValueConstructor",
    SearchCondition => "searchCondition",
    BooleanTerm => "booleanTerm",
    BooleanFactor => "booleanFactor",
    BooleanTest => "booleanTest",
    BooleanPrimary => "booleanPrimary",
    ExistsPredicate => "existsPredicate",
    Predicate => "predicate",
    ComparisonPredicatePart => "comparisonPredicatePart",
    CompOp => "compOp",
    BetweenPredicatePart => "betweenPredicatePart",
    InPredicatePart => "inPredicatePart",
    InValueList => "inValueList",
    LikePredicatePart => "likePredicatePart",
    NullPredicatePart => "nullPredicatePart",
    RowValueConstructor => "rowValueConstructor",
    ValueExpression => "valueExpression",
    NumericValueExpression => "numericValueExpression",
    Term => "term",
    Factor => "factor",
    ValueExpressionPrimary => "valueExpressionPrimary",
    ValueExpressionCastSpec => "valueExpressionCastSpec",
    ValueExpressionAtom => "valueExpressionAtom",
    CaseExpression => "caseExpression",
    SearchedWhenClause => "searchedWhenClause",
    ElseClause => "elseClause",
    FunctionCall => "functionCall",
    FunctionArguments => "functionArguments",
    ValueReference => "valueReference",
    ColumnReference => "columnReference",
    TupleRefSuffix => "tupleRefSuffix",
    VariableExpression => "variableExpression",
    NamedParameter => "namedParameter",
    AnonymousParameter => "anonymousParameter",
    UnsignedNumericLiteral => "unsignedNumericLiteral",
    CharacterStringLiteral => "characterStringLiteral",
    DatetimeLiteral => "datetimeLiteral",
    TruthValue => "truthValue",
    NullSpecification => "nullSpecification",
    Identifier => "identifier",
    ActualIdentifier => "actualIdentifier",
    NonReserved => "nonReserved",
    QualifiedName => "qualifiedName",
    TableName => "tableName",
    ColumnName => "columnName",
    CorrelationName => "correlationName",
    QueryName => "queryName",
    ColumnNameList => "columnNameList",
    InsertStatement => "insertStatement",
    InsertColumnsAndSource => "insertColumnsAndSource",
    InsertColumnList => "insertColumnList",
    UpdateStatement => "updateStatement",
    SetClauseList => "setClauseList",
    SetClause => "setClause",
    SetTarget => "setTarget",
    UpdateSource => "updateSource",
    DeleteStatement => "deleteStatement",
    SqlSchemaStatement => "sqlSchemaStatement",
    CreateTableStatement => "createTableStatement",
    IfNotExists => "ifNotExists",
    TableElementList => "tableElementList",
    TableElement => "tableElement",
    TableConstraint => "tableConstraint",
    ColumnDefinition => "columnDefinition",
    DataType => "dataType",
    ColumnConstraint => "columnConstraint",
    CreateViewStatement => "createViewStatement",
    ViewColumnList => "viewColumnList",
    DropTableStatement => "dropTableStatement",
    DropViewStatement => "dropViewStatement",
    AlterTableStatement => "alterTableStatement",
    AlterTableAction => "alterTableAction",
    AddColumnDefinition => "addColumnDefinition",
    AddTableConstraintDefinition => "addTableConstraintDefinition",
    DropColumnDefinition => "dropColumnDefinition",
    AlterColumnDefinition => "alterColumnDefinition",
    AlterColumnAction => "alterColumnAction",
    DropProcedureStatement => "dropProcedureStatement",
    ProcedureName => "procedureName",
    IfExists => "ifExists",
    DropBehaviour => "dropBehaviour",
}

impl RuleKind {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::str::FromStr for RuleKind {
    type Err = GrammarError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        RuleKind::from_name(name).ok_or_else(|| GrammarError::UnknownRule(name.to_string()))
    }
}

/// A grammar element: the right-hand side of a rule or a part of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Token(TokenKind),
    TokenSet(&'static [TokenKind]),
    /// Every token kind from the first to the second, inclusive
    TokenRange(TokenKind, TokenKind),
    Rule(RuleKind),
    Seq(Vec<Element>),
    /// Ordered alternatives; the first that matches wins
    Choice(Vec<Element>),
    Optional(Box<Element>),
    ZeroOrMore(Box<Element>),
    OneOrMore(Box<Element>),
    /// Only available when the dialect supports the extension
    Gated(DialectExtensions, Box<Element>),
}

fn t(kind: TokenKind) -> Element {
    Element::Token(kind)
}

fn set(kinds: &'static [TokenKind]) -> Element {
    Element::TokenSet(kinds)
}

fn r(rule: RuleKind) -> Element {
    Element::Rule(rule)
}

fn seq(elements: Vec<Element>) -> Element {
    Element::Seq(elements)
}

fn alt(elements: Vec<Element>) -> Element {
    Element::Choice(elements)
}

fn opt(element: Element) -> Element {
    Element::Optional(Box::new(element))
}

fn star(element: Element) -> Element {
    Element::ZeroOrMore(Box::new(element))
}

fn plus(element: Element) -> Element {
    Element::OneOrMore(Box::new(element))
}

fn gated(extension: DialectExtensions, element: Element) -> Element {
    Element::Gated(extension, Box::new(element))
}

/// `item (',' item)*`
fn comma_list(item: RuleKind) -> Element {
    seq(vec![r(item), star(seq(vec![t(TokenKind::Comma), r(item)]))])
}

/// `'(' inner ')'`
fn parens(inner: Element) -> Element {
    seq(vec![t(TokenKind::LeftParen), inner, t(TokenKind::RightParen)])
}

const COMP_OPS: &[TokenKind] = &[
    TokenKind::Equals,
    TokenKind::NotEquals,
    TokenKind::Less,
    TokenKind::Greater,
    TokenKind::LessEquals,
    TokenKind::GreaterEquals,
];

const ADDITIVE_OPS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus, TokenKind::Concat];
const MULTIPLICATIVE_OPS: &[TokenKind] = &[TokenKind::Asterisk, TokenKind::Solidus, TokenKind::Percent];
const SIGNS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus];
const SET_QUANTIFIERS: &[TokenKind] = &[TokenKind::All, TokenKind::Distinct];
const TRUTH_VALUES: &[TokenKind] = &[TokenKind::True, TokenKind::False, TokenKind::Unknown];
const DATETIME_KEYWORDS: &[TokenKind] = &[TokenKind::Date, TokenKind::Time, TokenKind::Timestamp];
const OUTER_JOIN_TYPES: &[TokenKind] = &[TokenKind::Left, TokenKind::Right, TokenKind::Full];
const ORDERINGS: &[TokenKind] = &[TokenKind::Asc, TokenKind::Desc];
const DROP_BEHAVIOURS: &[TokenKind] = &[TokenKind::Cascade, TokenKind::Restrict];
const TYPE_KEYWORDS: &[TokenKind] = &[
    TokenKind::Int,
    TokenKind::Integer,
    TokenKind::Smallint,
    TokenKind::Bigint,
    TokenKind::Decimal,
    TokenKind::Numeric,
    TokenKind::Float,
    TokenKind::Real,
    TokenKind::Char,
    TokenKind::Character,
    TokenKind::Varchar,
    TokenKind::Text,
    TokenKind::Date,
    TokenKind::Time,
    TokenKind::Timestamp,
    TokenKind::Boolean,
];

/// The right-hand side of `rule`
pub fn definition(rule: RuleKind) -> Element {
    use RuleKind as R;
    use TokenKind as T;

    match rule {
        R::SqlQueries => seq(vec![
            r(R::SqlQuery),
            star(seq(vec![t(T::Semicolon), opt(r(R::SqlQuery))])),
        ]),
        R::SqlQuery => alt(vec![r(R::DirectSqlDataStatement), r(R::SqlSchemaStatement)]),
        R::DirectSqlDataStatement => seq(vec![
            opt(r(R::WithClause)),
            alt(vec![
                r(R::SelectStatement),
                r(R::InsertStatement),
                r(R::UpdateStatement),
                r(R::DeleteStatement),
            ]),
        ]),
        R::WithClause => seq(vec![t(T::With), opt(t(T::Recursive)), r(R::CteList)]),
        R::CteList => comma_list(R::WithListElement),
        R::WithListElement => seq(vec![
            r(R::QueryName),
            opt(parens(r(R::ColumnNameList))),
            t(T::As),
            r(R::Subquery),
        ]),
        R::SelectStatement => r(R::QueryExpression),

        // Set operations
        R::QueryExpression => seq(vec![
            r(R::NonJoinQueryTerm),
            star(alt(vec![r(R::UnionTerm), r(R::ExceptTerm)])),
        ]),
        R::UnionTerm => seq(vec![
            t(T::Union),
            opt(set(SET_QUANTIFIERS)),
            opt(r(R::CorrespondingSpec)),
            r(R::NonJoinQueryTerm),
        ]),
        R::ExceptTerm => seq(vec![
            t(T::Except),
            opt(set(SET_QUANTIFIERS)),
            opt(r(R::CorrespondingSpec)),
            r(R::NonJoinQueryTerm),
        ]),
        R::CorrespondingSpec => seq(vec![
            t(T::Corresponding),
            opt(seq(vec![t(T::By), parens(r(R::ColumnNameList))])),
        ]),
        R::NonJoinQueryTerm => seq(vec![r(R::QueryPrimary), star(r(R::IntersectTerm))]),
        R::IntersectTerm => seq(vec![
            t(T::Intersect),
            opt(set(SET_QUANTIFIERS)),
            opt(r(R::CorrespondingSpec)),
            r(R::QueryPrimary),
        ]),
        R::QueryPrimary => r(R::NonJoinQueryPrimary),
        R::NonJoinQueryPrimary => alt(vec![r(R::SimpleTable), parens(r(R::QueryExpression))]),
        R::SimpleTable => alt(vec![
            r(R::QuerySpecification),
            r(R::TableValueConstructor),
            r(R::ExplicitTable),
        ]),

        // SELECT
        R::QuerySpecification => seq(vec![
            t(T::Select),
            opt(r(R::SetQuantifier)),
            r(R::SelectList),
            opt(r(R::TableExpression)),
        ]),
        R::SetQuantifier => set(SET_QUANTIFIERS),
        R::SelectList => comma_list(R::SelectSublist),
        R::SelectSublist => alt(vec![t(T::Asterisk), r(R::DerivedColumn)]),
        R::DerivedColumn => seq(vec![r(R::ValueExpression), opt(r(R::AsClause))]),
        R::AsClause => seq(vec![opt(t(T::As)), r(R::ColumnName)]),
        R::TableExpression => seq(vec![
            r(R::FromClause),
            opt(r(R::WhereClause)),
            opt(r(R::GroupByClause)),
            opt(r(R::HavingClause)),
            opt(r(R::OrderByClause)),
            opt(gated(DialectExtensions::LimitOffset, r(R::LimitClause))),
        ]),

        // FROM and joins
        R::FromClause => seq(vec![t(T::From), comma_list(R::TableReference)]),
        R::TableReference => alt(vec![r(R::JoinedTable), r(R::NonjoinedTableReference)]),
        R::JoinedTable => seq(vec![
            r(R::NonjoinedTableReference),
            plus(alt(vec![r(R::NaturalJoinTerm), r(R::CrossJoinTerm)])),
        ]),
        R::NonjoinedTableReference => seq(vec![
            alt(vec![r(R::TableName), r(R::DerivedTable)]),
            opt(r(R::CorrelationSpecification)),
        ]),
        R::DerivedTable => r(R::TableSubquery),
        R::TableSubquery => r(R::Subquery),
        R::Subquery => parens(r(R::QueryExpression)),
        R::CorrelationSpecification => seq(vec![
            opt(t(T::As)),
            r(R::CorrelationName),
            opt(parens(r(R::DerivedColumnList))),
        ]),
        R::DerivedColumnList => r(R::ColumnNameList),
        R::CrossJoinTerm => seq(vec![t(T::Cross), t(T::Join), r(R::NonjoinedTableReference)]),
        R::NaturalJoinTerm => seq(vec![
            opt(t(T::Natural)),
            opt(r(R::JoinType)),
            t(T::Join),
            r(R::NonjoinedTableReference),
            opt(r(R::JoinSpecification)),
        ]),
        R::JoinType => alt(vec![
            t(T::Inner),
            seq(vec![r(R::OuterJoinType), opt(t(T::Outer))]),
        ]),
        R::OuterJoinType => set(OUTER_JOIN_TYPES),
        R::JoinSpecification => alt(vec![r(R::JoinCondition), r(R::NamedColumnsJoin)]),
        R::JoinCondition => seq(vec![t(T::On), r(R::SearchCondition)]),
        R::NamedColumnsJoin => seq(vec![t(T::Using), parens(r(R::ColumnNameList))]),

        // Remaining clauses
        R::WhereClause => seq(vec![t(T::Where), r(R::SearchCondition)]),
        R::GroupByClause => seq(vec![t(T::Group), t(T::By), comma_list(R::ValueExpression)]),
        R::HavingClause => seq(vec![t(T::Having), r(R::SearchCondition)]),
        R::OrderByClause => seq(vec![t(T::Order), t(T::By), r(R::SortSpecificationList)]),
        R::SortSpecificationList => comma_list(R::SortSpecification),
        R::SortSpecification => seq(vec![r(R::ValueExpression), opt(r(R::OrderingSpecification))]),
        R::OrderingSpecification => set(ORDERINGS),
        R::LimitClause => seq(vec![
            t(T::Limit),
            r(R::ValueExpression),
            opt(seq(vec![
                alt(vec![t(T::Offset), t(T::Comma)]),
                r(R::ValueExpression),
            ])),
        ]),
        R::ExplicitTable => seq(vec![t(T::Table), r(R::TableName)]),
        R::TableValueConstructor => seq(vec![t(T::Values), comma_list(R::RowValueConstructor)]),

        // Conditions
        R::SearchCondition => seq(vec![
            r(R::BooleanTerm),
            star(seq(vec![t(T::Or), r(R::BooleanTerm)])),
        ]),
        R::BooleanTerm => seq(vec![
            r(R::BooleanFactor),
            star(seq(vec![t(T::And), r(R::BooleanFactor)])),
        ]),
        R::BooleanFactor => seq(vec![opt(t(T::Not)), r(R::BooleanTest)]),
        R::BooleanTest => seq(vec![
            r(R::BooleanPrimary),
            opt(seq(vec![t(T::Is), opt(t(T::Not)), r(R::TruthValue)])),
        ]),
        R::BooleanPrimary => alt(vec![
            r(R::ExistsPredicate),
            r(R::Predicate),
            parens(r(R::SearchCondition)),
        ]),
        R::ExistsPredicate => seq(vec![t(T::Exists), r(R::Subquery)]),
        R::Predicate => seq(vec![
            r(R::RowValueConstructor),
            opt(alt(vec![
                r(R::ComparisonPredicatePart),
                r(R::BetweenPredicatePart),
                r(R::InPredicatePart),
                r(R::LikePredicatePart),
                r(R::NullPredicatePart),
            ])),
        ]),
        R::ComparisonPredicatePart => seq(vec![r(R::CompOp), r(R::RowValueConstructor)]),
        R::CompOp => set(COMP_OPS),
        R::BetweenPredicatePart => seq(vec![
            opt(t(T::Not)),
            t(T::Between),
            r(R::RowValueConstructor),
            t(T::And),
            r(R::RowValueConstructor),
        ]),
        R::InPredicatePart => seq(vec![
            opt(t(T::Not)),
            t(T::In),
            alt(vec![r(R::Subquery), r(R::InValueList)]),
        ]),
        R::InValueList => parens(comma_list(R::ValueExpression)),
        R::LikePredicatePart => seq(vec![opt(t(T::Not)), t(T::Like), r(R::ValueExpression)]),
        R::NullPredicatePart => seq(vec![t(T::Is), opt(t(T::Not)), t(T::Null)]),
        R::RowValueConstructor => alt(vec![
            r(R::ValueExpression),
            parens(comma_list(R::ValueExpression)),
        ]),

        // Value expressions
        R::ValueExpression => r(R::NumericValueExpression),
        R::NumericValueExpression => seq(vec![
            r(R::Term),
            star(seq(vec![set(ADDITIVE_OPS), r(R::Term)])),
        ]),
        R::Term => seq(vec![
            r(R::Factor),
            star(seq(vec![set(MULTIPLICATIVE_OPS), r(R::Factor)])),
        ]),
        R::Factor => seq(vec![opt(set(SIGNS)), r(R::ValueExpressionPrimary)]),
        R::ValueExpressionPrimary => seq(vec![
            r(R::ValueExpressionAtom),
            opt(r(R::ValueExpressionCastSpec)),
        ]),
        R::ValueExpressionCastSpec => gated(
            DialectExtensions::TypeCast,
            seq(vec![t(T::DoubleColon), r(R::DataType)]),
        ),
        R::ValueExpressionAtom => alt(vec![
            r(R::Subquery),
            parens(r(R::ValueExpression)),
            r(R::CaseExpression),
            r(R::FunctionCall),
            r(R::ValueReference),
            r(R::UnsignedNumericLiteral),
            r(R::CharacterStringLiteral),
            r(R::DatetimeLiteral),
            r(R::TruthValue),
            r(R::NullSpecification),
            r(R::VariableExpression),
        ]),
        R::CaseExpression => seq(vec![
            t(T::Case),
            opt(r(R::ValueExpression)),
            plus(r(R::SearchedWhenClause)),
            opt(r(R::ElseClause)),
            t(T::End),
        ]),
        R::SearchedWhenClause => seq(vec![
            t(T::When),
            r(R::SearchCondition),
            t(T::Then),
            r(R::ValueExpression),
        ]),
        R::ElseClause => seq(vec![t(T::Else), r(R::ValueExpression)]),
        R::FunctionCall => seq(vec![
            r(R::Identifier),
            t(T::LeftParen),
            opt(r(R::FunctionArguments)),
            t(T::RightParen),
        ]),
        R::FunctionArguments => alt(vec![
            t(T::Asterisk),
            seq(vec![opt(r(R::SetQuantifier)), comma_list(R::ValueExpression)]),
        ]),
        R::ValueReference => r(R::ColumnReference),
        R::ColumnReference => seq(vec![r(R::QualifiedName), opt(r(R::TupleRefSuffix))]),
        R::TupleRefSuffix => seq(vec![t(T::Period), t(T::Asterisk)]),
        R::VariableExpression => alt(vec![
            t(T::BatchVariable),
            t(T::ClientVariable),
            r(R::NamedParameter),
            r(R::AnonymousParameter),
        ]),
        R::NamedParameter => seq(vec![t(T::Colon), r(R::Identifier)]),
        R::AnonymousParameter => t(T::QuestionMark),
        R::UnsignedNumericLiteral => t(T::NumericLiteral),
        R::CharacterStringLiteral => t(T::StringLiteral),
        R::DatetimeLiteral => seq(vec![set(DATETIME_KEYWORDS), t(T::StringLiteral)]),
        R::TruthValue => set(TRUTH_VALUES),
        R::NullSpecification => t(T::Null),

        // Names
        R::Identifier => r(R::ActualIdentifier),
        R::ActualIdentifier => alt(vec![t(T::Identifier), t(T::Quoted), r(R::NonReserved)]),
        R::NonReserved => {
            let (from, to) = TokenKind::NON_RESERVED_RANGE;
            Element::TokenRange(from, to)
        }
        R::QualifiedName => seq(vec![
            r(R::Identifier),
            star(seq(vec![t(T::Period), r(R::Identifier)])),
        ]),
        R::TableName => r(R::QualifiedName),
        R::ColumnName => r(R::Identifier),
        R::CorrelationName => r(R::Identifier),
        R::QueryName => r(R::Identifier),
        R::ColumnNameList => comma_list(R::ColumnName),

        // DML
        R::InsertStatement => seq(vec![
            t(T::Insert),
            t(T::Into),
            r(R::TableName),
            r(R::InsertColumnsAndSource),
        ]),
        R::InsertColumnsAndSource => seq(vec![
            opt(parens(r(R::InsertColumnList))),
            alt(vec![
                r(R::QueryExpression),
                seq(vec![t(T::Default), t(T::Values)]),
            ]),
        ]),
        R::InsertColumnList => r(R::ColumnNameList),
        R::UpdateStatement => seq(vec![
            t(T::Update),
            r(R::TableName),
            opt(r(R::CorrelationSpecification)),
            t(T::Set),
            r(R::SetClauseList),
            opt(r(R::WhereClause)),
        ]),
        R::SetClauseList => comma_list(R::SetClause),
        R::SetClause => seq(vec![r(R::SetTarget), t(T::Equals), r(R::UpdateSource)]),
        R::SetTarget => r(R::ColumnName),
        R::UpdateSource => alt(vec![t(T::Default), r(R::ValueExpression)]),
        R::DeleteStatement => seq(vec![
            t(T::Delete),
            t(T::From),
            r(R::TableName),
            opt(r(R::CorrelationSpecification)),
            opt(r(R::WhereClause)),
        ]),

        // DDL
        R::SqlSchemaStatement => alt(vec![
            r(R::CreateTableStatement),
            r(R::CreateViewStatement),
            r(R::DropTableStatement),
            r(R::DropViewStatement),
            r(R::DropProcedureStatement),
            r(R::AlterTableStatement),
        ]),
        R::CreateTableStatement => seq(vec![
            t(T::Create),
            t(T::Table),
            opt(r(R::IfNotExists)),
            r(R::TableName),
            parens(r(R::TableElementList)),
        ]),
        R::IfNotExists => seq(vec![t(T::If), t(T::Not), t(T::Exists)]),
        R::TableElementList => comma_list(R::TableElement),
        R::TableElement => alt(vec![r(R::TableConstraint), r(R::ColumnDefinition)]),
        R::TableConstraint => seq(vec![
            alt(vec![seq(vec![t(T::Primary), t(T::Key)]), t(T::Unique)]),
            parens(r(R::ColumnNameList)),
        ]),
        R::ColumnDefinition => seq(vec![
            r(R::ColumnName),
            r(R::DataType),
            star(r(R::ColumnConstraint)),
        ]),
        R::DataType => seq(vec![
            alt(vec![
                seq(vec![t(T::Double), opt(t(T::Precision))]),
                set(TYPE_KEYWORDS),
                r(R::Identifier),
            ]),
            opt(parens(seq(vec![
                t(T::NumericLiteral),
                opt(seq(vec![t(T::Comma), t(T::NumericLiteral)])),
            ]))),
        ]),
        R::ColumnConstraint => alt(vec![
            seq(vec![t(T::Not), t(T::Null)]),
            t(T::Null),
            seq(vec![t(T::Primary), t(T::Key)]),
            t(T::Unique),
            seq(vec![t(T::Default), r(R::ValueExpression)]),
            seq(vec![
                t(T::References),
                r(R::TableName),
                opt(parens(r(R::ColumnNameList))),
            ]),
        ]),
        R::CreateViewStatement => seq(vec![
            t(T::Create),
            t(T::View),
            r(R::TableName),
            opt(parens(r(R::ViewColumnList))),
            t(T::As),
            r(R::QueryExpression),
        ]),
        R::ViewColumnList => r(R::ColumnNameList),
        R::DropTableStatement => seq(vec![
            t(T::Drop),
            t(T::Table),
            opt(r(R::IfExists)),
            comma_list(R::TableName),
            opt(r(R::DropBehaviour)),
        ]),
        R::DropViewStatement => seq(vec![
            t(T::Drop),
            t(T::View),
            opt(r(R::IfExists)),
            comma_list(R::TableName),
            opt(r(R::DropBehaviour)),
        ]),
        R::AlterTableStatement => seq(vec![
            t(T::Alter),
            t(T::Table),
            r(R::TableName),
            comma_list(R::AlterTableAction),
        ]),
        R::AlterTableAction => alt(vec![
            r(R::AddTableConstraintDefinition),
            r(R::AddColumnDefinition),
            r(R::DropColumnDefinition),
            r(R::AlterColumnDefinition),
        ]),
        R::AddColumnDefinition => seq(vec![t(T::Add), opt(t(T::Column)), r(R::ColumnDefinition)]),
        R::AddTableConstraintDefinition => seq(vec![t(T::Add), r(R::TableConstraint)]),
        R::DropColumnDefinition => seq(vec![
            t(T::Drop),
            opt(t(T::Column)),
            r(R::ColumnName),
            opt(r(R::DropBehaviour)),
        ]),
        R::AlterColumnDefinition => seq(vec![
            t(T::Alter),
            opt(t(T::Column)),
            r(R::ColumnName),
            r(R::AlterColumnAction),
        ]),
        R::AlterColumnAction => alt(vec![
            seq(vec![t(T::Set), t(T::Default), r(R::ValueExpression)]),
            seq(vec![t(T::Drop), t(T::Default)]),
            seq(vec![t(T::Set), t(T::Not), t(T::Null)]),
            seq(vec![t(T::Drop), t(T::Not), t(T::Null)]),
        ]),
        R::DropProcedureStatement => seq(vec![
            t(T::Drop),
            t(T::Procedure),
            opt(r(R::IfExists)),
            comma_list(R::ProcedureName),
            opt(r(R::DropBehaviour)),
        ]),
        R::ProcedureName => r(R::QualifiedName),
        R::IfExists => seq(vec![t(T::If), t(T::Exists)]),
        R::DropBehaviour => set(DROP_BEHAVIOURS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_round_trip() {
        for rule in RuleKind::ALL {
            assert_eq!(RuleKind::from_name(rule.name()), Some(*rule));
        }
        assert_eq!(RuleKind::ALL[RuleKind::TableName.index()], RuleKind::TableName);
        assert_eq!("columnReference".parse::<RuleKind>(), Ok(RuleKind::ColumnReference));
        assert_eq!(
            "column_reference".parse::<RuleKind>(),
            Err(GrammarError::UnknownRule("column_reference".into()))
        );
    }

    #[test]
    fn test_non_reserved_rule_is_a_range() {
        assert!(matches!(
            definition(RuleKind::NonReserved),
            Element::TokenRange(TokenKind::Add, TokenKind::Text)
        ));
    }
}
