//! Error types for statement composition, validation and serialization.

use std::fmt;

use crate::ast::types::ValueType;

/// Clause kinds, used to give diagnostics their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    With,
    Columns,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Union,
    Set,
    Values,
    Using,
    Returning,
    OnConflict,
}

impl Clause {
    /// Returns the SQL spelling of the clause.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::With => "WITH",
            Self::Columns => "SELECT",
            Self::From => "FROM",
            Self::Join => "JOIN",
            Self::Where => "WHERE",
            Self::GroupBy => "GROUP BY",
            Self::Having => "HAVING",
            Self::OrderBy => "ORDER BY",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Union => "UNION",
            Self::Set => "SET",
            Self::Values => "VALUES",
            Self::Using => "USING",
            Self::Returning => "RETURNING",
            Self::OnConflict => "ON CONFLICT",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A composition call was rejected because its arguments have the wrong shape.
///
/// Raised by the builder operation itself, so the rejected statement value
/// never exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompositionError {
    /// The clause was already supplied to this statement.
    #[error("{clause} clause is already set")]
    ClauseAlreadySet { clause: Clause },

    /// A list clause was given no entries.
    #[error("{clause} requires at least one entry")]
    EmptyList { clause: Clause },

    /// GROUP BY entries must not be aggregate functions.
    #[error("GROUP BY must not contain aggregate functions, found `{expr}`")]
    AggregateInGroupBy { expr: String },

    /// An aggregate function was nested inside another one.
    #[error("aggregate functions cannot be nested, found `{expr}`")]
    NestedAggregate { expr: String },

    /// WHERE and join conditions are evaluated per row.
    #[error("{clause} must not contain aggregate functions, found `{expr}`")]
    AggregateInCondition { clause: Clause, expr: String },

    /// LIMIT and OFFSET take values, not column expressions.
    #[error("{clause} requires a constant expression, found `{expr}`")]
    NotConstant { clause: Clause, expr: String },

    /// DISTINCT and ALL must be given before the selected columns.
    #[error("select flags must precede the selected columns")]
    FlagAfterColumns,

    /// A selected column has no name to address it by.
    #[error("selected column #{index} (`{expr}`) needs a name, use as_()")]
    UnnamedColumn { index: usize, expr: String },

    /// Two selected columns share a result name.
    #[error("selected column name {name} is used more than once, use as_()")]
    DuplicateColumnName { name: String },

    /// An operand has a type the operation does not accept.
    #[error("{operation} expects {expected} operands, found {found}")]
    TypeMismatch {
        operation: &'static str,
        expected: &'static str,
        found: ValueType,
    },

    /// Two operands cannot be compared with each other.
    #[error("{operation} cannot compare {left} with {right}")]
    NotComparable {
        operation: &'static str,
        left: ValueType,
        right: ValueType,
    },

    /// `IN` was given an empty value list.
    #[error("IN requires at least one value")]
    EmptyInList,

    /// A sub-select used as a value has the wrong number of columns.
    #[error("sub-select used as {usage} must select exactly one column, found {found}")]
    SubqueryColumnCount { usage: &'static str, found: usize },

    /// A sub-select was used before it selected any columns.
    #[error("sub-select has no selected columns")]
    IncompleteSubquery,

    /// `DEFAULT` may only be used as an inserted value.
    #[error("DEFAULT can only be used as an inserted value")]
    MisplacedDefault,

    /// `excluded.column` may only be used in ON CONFLICT DO UPDATE.
    #[error("excluded.{column} can only be used in ON CONFLICT DO UPDATE")]
    MisplacedExcluded { column: String },

    /// `ANY(sub-select)` may only be the right operand of a comparison.
    #[error("ANY(...) can only be the right operand of a comparison")]
    MisplacedAny,

    /// An assignment list names the same column twice.
    #[error("column {column} is assigned more than once")]
    DuplicateColumn { column: String },

    /// An assignment list spans more than one table.
    #[error("assignments must target a single table, found {first} and {second}")]
    MixedTables { first: String, second: String },

    /// A column does not belong to the statement's target table.
    #[error("column {column} does not belong to table {table}")]
    ForeignColumn { column: String, table: String },

    /// A VALUES row does not match the column list.
    #[error("VALUES row has {found} entries, expected {expected}")]
    ValueCountMismatch { expected: usize, found: usize },

    /// A value does not fit the column it is assigned to.
    #[error("cannot assign {found} to column {column} of type {expected}")]
    AssignmentType {
        column: String,
        expected: ValueType,
        found: ValueType,
    },

    /// DO UPDATE needs conflict targets.
    #[error("on_conflict() requires at least one conflict target for do_update()")]
    ConflictTargetsRequired,

    /// DO NOTHING / DO UPDATE without a preceding ON CONFLICT.
    #[error("do_nothing() and do_update() require a preceding on_conflict()")]
    NoPendingConflict,

    /// The ON CONFLICT action was already chosen.
    #[error("ON CONFLICT action is already set")]
    ConflictActionAlreadySet,

    /// Rows were given before the column list.
    #[error("values() requires a preceding columns()")]
    ValuesWithoutColumns,

    /// A table reference name appears twice in one FROM tree.
    #[error("table {name} appears more than once, use as_() to alias it")]
    DuplicateTableName { name: String },

    /// A dynamic table was used as the root of FROM.
    #[error("dynamic tables can only be joined, not used as the root of FROM")]
    DynamicFromRoot,

    /// A join condition references a table outside the joined operands.
    #[error("join condition references table {table} which is not part of the join")]
    JoinConditionScope { table: String },

    /// No column of this name exists.
    #[error("table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },

    /// UNION operands must not be ordered or limited.
    #[error("{clause} is not allowed on a union operand")]
    UnionOperandClause { clause: Clause },

    /// Only further unions may follow a union.
    #[error("{clause} cannot follow a UNION, wrap the union in a derived table")]
    ClauseAfterUnion { clause: Clause },

    /// A derived table or CTE is not consistent on its own.
    #[error("sub-select is inconsistent: {source}")]
    InconsistentSubquery {
        #[source]
        source: Box<ConsistencyError>,
    },

    /// A derived table references tables of an enclosing query.
    #[error("derived table requires table {table} from an enclosing query")]
    OuterReference { table: String },

    /// A CTE name was defined twice.
    #[error("common table expression {name} is defined more than once")]
    DuplicateCte { name: String },
}

/// A complete statement violates a cross-clause rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    /// A SELECT without columns.
    #[error("selecting columns required")]
    NoSelectedColumns,

    /// An INSERT without values.
    #[error("insert values required, e.g. set(...) or default_values()")]
    MissingInsertValues,

    /// An UPDATE without assignments.
    #[error("update assignments required, i.e. set(...)")]
    MissingUpdateAssignments,

    /// UPDATE and DELETE need an explicit filter decision.
    #[error("{statement} requires where(...) or unconditionally()")]
    MissingWhere { statement: &'static str },

    /// An expression references a table the statement does not provide.
    #[error(
        "{clause}: `{expr}` requires table {table} which is otherwise not known in the statement"
    )]
    UnknownTable {
        clause: Clause,
        table: String,
        expr: String,
    },

    /// A static expression references a table that is only dynamically provided.
    #[error(
        "{clause}: `{expr}` statically requires table {table} which is otherwise only known dynamically"
    )]
    DynamicTableInStaticClause {
        clause: Clause,
        table: String,
        expr: String,
    },

    /// A FROM item references a CTE the WITH clause does not define.
    #[error("common table expression {name} is not defined by the WITH clause")]
    UnknownCte { name: String },

    /// A selected column is neither aggregated nor grouped.
    #[error("{clause}: `{expr}` is neither an aggregate nor part of GROUP BY")]
    NotGrouped { clause: Clause, expr: String },

    /// Aggregates mixed with plain columns in a query without GROUP BY.
    #[error(
        "selected columns mix aggregates and non-aggregates without GROUP BY, `{expr}` is not aggregated"
    )]
    MixedAggregates { expr: String },

    /// A NOT NULL column without default is missing from an INSERT.
    #[error("at least one required column is missing: {table}.{column}")]
    MissingRequiredColumn { table: String, column: String },

    /// DEFAULT VALUES used on a table with a required column.
    #[error(
        "column {table}.{column} does not have a default value (explicit default, NULL, or auto-increment)"
    )]
    ColumnWithoutDefault { table: String, column: String },

    /// UNION operands select different numbers of columns.
    #[error("union operand #{operand} selects {found} columns, expected {expected}")]
    UnionColumnCount {
        operand: usize,
        expected: usize,
        found: usize,
    },

    /// UNION operand column types do not match.
    #[error("union operand #{operand} column #{column} is {found}, expected {expected}")]
    UnionColumnType {
        operand: usize,
        column: usize,
        expected: ValueType,
        found: ValueType,
    },

    /// RETURNING must not aggregate.
    #[error("returning columns must not contain aggregate functions, found `{expr}`")]
    AggregateInReturning { expr: String },

    /// ON CONFLICT without an action.
    #[error("either do_nothing() or do_update(...) is required with on_conflict")]
    MissingConflictAction,
}

/// A statement uses a feature the target dialect does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{dialect}: {message}")]
pub struct CompatibilityError {
    /// Name of the dialect that rejected the statement.
    pub dialect: String,
    /// Name of the rule that fired.
    pub rule: &'static str,
    /// Human readable description.
    pub message: String,
}

/// Configuration values that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The dialect tag is not known.
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    /// A version string is not `MAJOR.MINOR.PATCH`.
    #[error("invalid version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// A version was given for a dialect that is not versioned.
    #[error("dialect {0} does not take a version")]
    UnexpectedVersion(String),
}

/// Any error the pipeline can produce.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
