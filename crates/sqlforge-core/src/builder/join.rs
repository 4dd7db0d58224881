//! Join composition.
//!
//! `left.join(right)` checks that the two sides do not share a reference
//! name and waits for its condition; `.on(condition)` completes the join.

use super::check_condition;
use crate::ast::{Expr, Join, JoinKind, TableExpr};
use crate::error::{Clause, CompositionError};
use crate::validate::column_tables;

/// Table expressions that can be joined with others.
pub trait Joinable: Into<TableExpr> + Sized {
    /// `INNER JOIN`.
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn join(self, right: impl Into<TableExpr>) -> Result<PendingJoin, CompositionError> {
        PendingJoin::new(self.into(), JoinKind::Inner, right.into())
    }

    /// Same as [`Joinable::join`].
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn inner_join(self, right: impl Into<TableExpr>) -> Result<PendingJoin, CompositionError> {
        PendingJoin::new(self.into(), JoinKind::Inner, right.into())
    }

    /// `LEFT OUTER JOIN`.
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn left_outer_join(self, right: impl Into<TableExpr>) -> Result<PendingJoin, CompositionError> {
        PendingJoin::new(self.into(), JoinKind::LeftOuter, right.into())
    }

    /// `RIGHT OUTER JOIN`.
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn right_outer_join(self, right: impl Into<TableExpr>) -> Result<PendingJoin, CompositionError> {
        PendingJoin::new(self.into(), JoinKind::RightOuter, right.into())
    }

    /// `FULL OUTER JOIN`.
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn full_outer_join(self, right: impl Into<TableExpr>) -> Result<PendingJoin, CompositionError> {
        PendingJoin::new(self.into(), JoinKind::FullOuter, right.into())
    }

    /// `CROSS JOIN`, which takes no condition.
    ///
    /// # Errors
    ///
    /// Fails if both sides provide a table with the same reference name.
    fn cross_join(self, right: impl Into<TableExpr>) -> Result<Join, CompositionError> {
        let pending = PendingJoin::new(self.into(), JoinKind::Cross, right.into())?;
        Ok(Join {
            left: pending.left,
            kind: pending.kind,
            right: pending.right,
            on: None,
        })
    }
}

impl<T: Into<TableExpr>> Joinable for T {}

/// A join waiting for its ON condition.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a join needs a condition, call .on(...)"]
pub struct PendingJoin {
    left: TableExpr,
    kind: JoinKind,
    right: TableExpr,
}

impl PendingJoin {
    fn new(left: TableExpr, kind: JoinKind, right: TableExpr) -> Result<Self, CompositionError> {
        if matches!(left, TableExpr::Dynamic { .. }) {
            return Err(CompositionError::DynamicFromRoot);
        }
        let left_names = left.reference_names();
        if let Some(name) = right
            .reference_names()
            .into_iter()
            .find(|name| left_names.contains(name))
        {
            return Err(CompositionError::DuplicateTableName {
                name: String::from(name),
            });
        }
        Ok(Self { left, kind, right })
    }

    /// Completes the join with its ON condition.
    ///
    /// # Errors
    ///
    /// Fails unless the condition is a boolean without aggregates that only
    /// references tables of the two joined sides.
    pub fn on(self, condition: impl Into<Expr>) -> Result<Join, CompositionError> {
        let condition = condition.into();
        check_condition(&condition, Clause::Join)?;
        let mut names = self.left.reference_names();
        names.extend(self.right.reference_names());
        if let Some(table) = column_tables(&condition)
            .into_iter()
            .find(|table| !names.contains(table))
        {
            return Err(CompositionError::JoinConditionScope {
                table: String::from(table),
            });
        }
        Ok(Join {
            left: self.left,
            kind: self.kind,
            right: self.right,
            on: Some(condition),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::builder::{dynamic, Comparable};
    use crate::schema::{ColumnDef, Table, TableDef};

    fn table(name: &str) -> Table {
        Table::new(TableDef::new(name).column(ColumnDef::new("id", DataType::Integral)))
    }

    #[test]
    fn test_join_on() {
        let (a, b) = (table("a"), table("b"));
        let condition = a.column("id").unwrap().eq(b.column("id").unwrap());
        let join = (&a).join(&b).unwrap().on(condition).unwrap();
        assert_eq!(join.kind(), JoinKind::Inner);
        assert!(join.condition().is_some());
        assert_eq!(TableExpr::from(join).reference_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_join_rejects_duplicate_names() {
        let a = table("a");
        let err = (&a).join(&a).unwrap_err();
        assert_eq!(
            err,
            CompositionError::DuplicateTableName {
                name: String::from("a")
            }
        );
        assert!((&a).join(a.as_("other")).is_ok());
    }

    #[test]
    fn test_join_condition_scope() {
        let (a, b, c) = (table("a"), table("b"), table("c"));
        let condition = a.column("id").unwrap().eq(c.column("id").unwrap());
        let err = (&a).left_outer_join(&b).unwrap().on(condition).unwrap_err();
        assert_eq!(
            err,
            CompositionError::JoinConditionScope {
                table: String::from("c")
            }
        );
    }

    #[test]
    fn test_dynamic_join_side() {
        let (a, b) = (table("a"), table("b"));
        let condition = a.column("id").unwrap().eq(b.column("id").unwrap());
        let join = (&a)
            .left_outer_join(dynamic(false, &b))
            .unwrap()
            .on(condition)
            .unwrap();
        assert!(matches!(join.right(), TableExpr::Dynamic { condition: false, .. }));

        let err = dynamic(true, &a).cross_join(&b).unwrap_err();
        assert_eq!(err, CompositionError::DynamicFromRoot);
    }

    #[test]
    fn test_cross_join_chain() {
        let (a, b, c) = (table("a"), table("b"), table("c"));
        let join = (&a).cross_join(&b).unwrap().cross_join(&c).unwrap();
        assert_eq!(TableExpr::from(join).reference_names(), vec!["a", "b", "c"]);
    }
}
