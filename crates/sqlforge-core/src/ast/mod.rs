//! Statement tree: value expressions, clauses and statements.

mod expression;
mod operator;
mod statement;
pub mod types;

pub(crate) use expression::Allow;
pub use expression::{Aggregate, AggregateFunction, Expr, Function};
pub use operator::{needs_parentheses, Associativity, BinaryOp, Precedence, Side, UnaryOp};
pub use statement::{
    Assignment, ConflictAction, Cte, Delete, DerivedTable, Filter, Insert, InsertValues, Join,
    JoinKind, OnConflict, OrderBy, Select, SelectColumn, SelectFlag, Slot, SortDirection,
    Statement, StatementRef, TableExpr, Truncate, UnionKind, UnionOperand, UnionPart, Update,
    With,
};
pub use types::{DataType, SqlType, ValueType};
