//! Statement composition.
//!
//! Statements are built one clause at a time. Every operation checks its own
//! arguments and returns `Result<_, CompositionError>`, so a statement value
//! that exists has only well-shaped clauses. Cross-clause rules are checked
//! later by [`crate::validate`].
//!
//! # Example
//!
//! ```rust
//! use sqlforge_core::ast::DataType;
//! use sqlforge_core::builder::{update, Comparable};
//! use sqlforge_core::dialect::Generic;
//! use sqlforge_core::schema::{ColumnDef, Table, TableDef};
//! use sqlforge_core::Query;
//!
//! let users = Table::new(
//!     TableDef::new("users")
//!         .column(ColumnDef::new("id", DataType::Text).primary_key())
//!         .column(ColumnDef::new("money", DataType::Integral)),
//! );
//! let id = users.column("id")?;
//! let money = users.column("money")?;
//!
//! let prepared = update(&users)
//!     .set(money.assign(42))?
//!     .where_(id.eq("abc"))?
//!     .to_sql(&Generic)?;
//!
//! assert_eq!(prepared.sql, "UPDATE users SET money = ? WHERE id = ?");
//! assert_eq!(prepared.parameters.len(), 2);
//! # Ok::<(), sqlforge_core::Error>(())
//! ```

mod delete;
mod dynamic;
mod expr;
mod insert;
mod join;
mod list;
mod select;
mod truncate;
mod update;
mod with;

pub use delete::delete_from;
pub use dynamic::{dynamic, Conditional};
pub use expr::{
    all_of, any, avg, avg_distinct, case_when, cast, coalesce, count, count_distinct, count_star,
    default_value, excluded, exists, lit, lower, max, max_distinct, min, min_distinct, null,
    parameter, scalar, sum, sum_distinct, trim, upper, verbatim, Aliasable, Arithmetic, Case,
    CaseWhen, Comparable, Logical, Windowable,
};
pub use insert::insert_into;
pub use join::{Joinable, PendingJoin};
pub use list::IntoList;
pub use select::{select, select_all, select_distinct};
pub use truncate::truncate;
pub use update::update;
pub use with::{cte, CteName};

use crate::ast::{Allow, Assignment, Expr, Select, Slot};
use crate::error::{Clause, CompositionError, ConsistencyError};
use crate::schema::{ColumnRef, Table};

/// Puts `value` into an empty clause slot.
pub(crate) fn fill<T>(slot: &mut Slot<T>, clause: Clause, value: T) -> Result<(), CompositionError> {
    if slot.is_present() {
        return Err(CompositionError::ClauseAlreadySet { clause });
    }
    *slot = Slot::Present(value);
    Ok(())
}

pub(crate) fn non_empty<T>(list: Vec<T>, clause: Clause) -> Result<Vec<T>, CompositionError> {
    if list.is_empty() {
        Err(CompositionError::EmptyList { clause })
    } else {
        Ok(list)
    }
}

/// WHERE, HAVING and ON conditions: well-typed booleans. Only HAVING may aggregate.
pub(crate) fn check_condition(condition: &Expr, clause: Clause) -> Result<(), CompositionError> {
    condition.check(Allow::NOTHING)?;
    let found = condition.value_type();
    if !found.data_type.is_boolean() {
        return Err(CompositionError::TypeMismatch {
            operation: clause.as_str(),
            expected: "boolean",
            found,
        });
    }
    if clause != Clause::Having && condition.contains_aggregate() {
        return Err(CompositionError::AggregateInCondition {
            clause,
            expr: condition.to_string(),
        });
    }
    Ok(())
}

fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Value { .. }
        | Expr::Literal(_)
        | Expr::Parameter { .. }
        | Expr::Null
        | Expr::Verbatim { .. } => true,
        Expr::Column(_)
        | Expr::Excluded(_)
        | Expr::Default
        | Expr::Aggregate(_)
        | Expr::Exists(_)
        | Expr::Any(_)
        | Expr::Subquery(_)
        | Expr::InSubquery { .. } => false,
        other => other.children().into_iter().all(is_constant),
    }
}

/// LIMIT and OFFSET: constant integral expressions.
pub(crate) fn check_constant(expr: &Expr, clause: Clause) -> Result<(), CompositionError> {
    expr.check(Allow::NOTHING)?;
    let found = expr.value_type();
    if !found.data_type.is_integral() {
        return Err(CompositionError::TypeMismatch {
            operation: clause.as_str(),
            expected: "integral",
            found,
        });
    }
    if !is_constant(expr) {
        return Err(CompositionError::NotConstant {
            clause,
            expr: expr.to_string(),
        });
    }
    Ok(())
}

/// Derived tables and CTEs must be consistent without an enclosing query.
pub(crate) fn check_detached(query: &Select) -> Result<(), CompositionError> {
    crate::validate::validate_select(query).map_err(|err| match err {
        ConsistencyError::UnknownTable { table, .. } => CompositionError::OuterReference { table },
        other => CompositionError::InconsistentSubquery {
            source: Box::new(other),
        },
    })
}

/// The column must be a column of `table`, addressed through its reference name.
pub(crate) fn check_owned(table: &Table, column: &ColumnRef) -> Result<(), CompositionError> {
    if column.table() == table.reference_name() && table.definition().find(column.name()).is_some() {
        Ok(())
    } else {
        Err(CompositionError::ForeignColumn {
            column: column.qualified_name(),
            table: String::from(table.reference_name()),
        })
    }
}

/// Column lists of INSERT and ON CONFLICT: unique columns of the target table.
pub(crate) fn check_columns(table: &Table, columns: &[ColumnRef]) -> Result<(), CompositionError> {
    for (index, column) in columns.iter().enumerate() {
        check_owned(table, column)?;
        if columns[..index].iter().any(|c| c.name() == column.name()) {
            return Err(CompositionError::DuplicateColumn {
                column: String::from(column.name()),
            });
        }
    }
    Ok(())
}

/// Whether `value` may be stored in `column`.
pub(crate) fn check_value(column: &ColumnRef, value: &Expr, allow: Allow) -> Result<(), CompositionError> {
    value.check(allow)?;
    if matches!(value, Expr::Default) {
        return Ok(());
    }
    let expected = column.value_type();
    let found = value.value_type();
    let fits = if found.data_type == crate::ast::DataType::Null {
        expected.nullable
    } else {
        found.data_type.is_comparable_with(expected.data_type)
    };
    if fits {
        Ok(())
    } else {
        Err(CompositionError::AssignmentType {
            column: String::from(column.name()),
            expected,
            found,
        })
    }
}

/// SET lists: unique columns of exactly one table, each with a fitting value.
pub(crate) fn check_assignments(
    table: &Table,
    assignments: &[Assignment],
    clause: Clause,
    allow: Allow,
) -> Result<(), CompositionError> {
    let Some(first) = assignments.first() else {
        return Err(CompositionError::EmptyList { clause });
    };
    if let Some(other) = assignments
        .iter()
        .find(|a| a.column.table() != first.column.table())
    {
        return Err(CompositionError::MixedTables {
            first: String::from(first.column.table()),
            second: String::from(other.column.table()),
        });
    }
    for (index, assignment) in assignments.iter().enumerate() {
        check_owned(table, &assignment.column)?;
        if assignments[..index]
            .iter()
            .any(|a| a.column.name() == assignment.column.name())
        {
            return Err(CompositionError::DuplicateColumn {
                column: String::from(assignment.column.name()),
            });
        }
        check_value(&assignment.column, &assignment.value, allow)?;
    }
    Ok(())
}

/// RETURNING lists follow the rules of selected columns.
pub(crate) fn check_returning(
    columns: &[crate::ast::SelectColumn],
) -> Result<(), CompositionError> {
    for (index, column) in columns.iter().enumerate() {
        column.expr.check(Allow::NOTHING)?;
        if column.name().is_none() {
            return Err(CompositionError::UnnamedColumn {
                index,
                expr: column.expr.to_string(),
            });
        }
    }
    Ok(())
}

macro_rules! impl_returning {
    ($($statement:ident),+) => {
        $(
            impl crate::ast::$statement {
                /// Sets RETURNING.
                ///
                /// # Errors
                ///
                /// Fails on an empty list, an unnamed or ill-typed column, or
                /// if RETURNING is already set.
                pub fn returning(
                    mut self,
                    columns: impl IntoList<crate::ast::SelectColumn>,
                ) -> Result<Self, CompositionError> {
                    let columns = non_empty(columns.into_list(), Clause::Returning)?;
                    check_returning(&columns)?;
                    fill(&mut self.returning, Clause::Returning, columns)?;
                    Ok(self)
                }
            }
        )+
    };
}

impl_returning!(Insert, Update, Delete);

macro_rules! impl_filter {
    ($($statement:ident),+) => {
        $(
            impl crate::ast::$statement {
                /// Sets the WHERE condition.
                ///
                /// # Errors
                ///
                /// Fails unless the condition is a well-typed, aggregate-free
                /// boolean, or if the filter is already decided.
                pub fn where_(mut self, condition: impl Into<Expr>) -> Result<Self, CompositionError> {
                    let condition = condition.into();
                    check_condition(&condition, Clause::Where)?;
                    fill(&mut self.filter, Clause::Where, crate::ast::Filter::Where(condition))?;
                    Ok(self)
                }

                /// Explicitly affects every row.
                ///
                /// # Errors
                ///
                /// Fails if the filter is already decided.
                pub fn unconditionally(mut self) -> Result<Self, CompositionError> {
                    fill(&mut self.filter, Clause::Where, crate::ast::Filter::Unconditionally)?;
                    Ok(self)
                }
            }
        )+
    };
}

impl_filter!(Update, Delete);
