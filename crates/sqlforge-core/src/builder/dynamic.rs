//! Dynamic parts: clause entries that are only rendered when a runtime
//! condition holds.
//!
//! Whether a part is present is decided when it is built. An absent part is
//! still checked for scope and type consistency, so a query that validates
//! with the condition off also validates with it on.

use crate::ast::{Aggregate, Assignment, Expr, Join, OrderBy, Select, SelectColumn, TableExpr, UnionOperand};
use crate::schema::{ColumnRef, Table};

/// Values that can be wrapped as a dynamic part.
pub trait Conditional {
    type Output;

    /// Wraps `self` so that it is rendered only if `condition` is true.
    fn when(self, condition: bool) -> Self::Output;
}

/// Wraps `part` so that it is rendered only if `condition` is true.
///
/// ```rust
/// use sqlforge_core::builder::{dynamic, Comparable};
/// use sqlforge_core::ast::DataType;
/// use sqlforge_core::schema::{ColumnDef, ColumnRef};
///
/// let name = ColumnRef::new("users", ColumnDef::new("name", DataType::Text));
/// let filter = dynamic(false, name.eq("alice"));
/// assert!(filter.is_dynamic());
/// assert_eq!(filter.effective(), None);
/// ```
pub fn dynamic<T: Conditional>(condition: bool, part: T) -> T::Output {
    part.when(condition)
}

fn dynamic_expr(condition: bool, expr: Expr) -> Expr {
    Expr::Dynamic {
        condition,
        expr: Box::new(expr),
    }
}

macro_rules! impl_conditional_expr {
    ($($source:ident),+) => {
        $(
            impl Conditional for $source {
                type Output = Expr;

                fn when(self, condition: bool) -> Expr {
                    dynamic_expr(condition, self.into())
                }
            }
        )+
    };
}

impl_conditional_expr!(Expr, ColumnRef, Aggregate);

impl Conditional for SelectColumn {
    type Output = Self;

    fn when(self, condition: bool) -> Self {
        Self {
            expr: dynamic_expr(condition, self.expr),
            alias: self.alias,
        }
    }
}

impl Conditional for OrderBy {
    type Output = Self;

    fn when(self, condition: bool) -> Self {
        Self {
            expr: dynamic_expr(condition, self.expr),
            direction: self.direction,
        }
    }
}

impl Conditional for Assignment {
    type Output = Self;

    fn when(mut self, condition: bool) -> Self {
        self.condition = Some(condition);
        self
    }
}

fn dynamic_table(condition: bool, inner: TableExpr) -> TableExpr {
    TableExpr::Dynamic {
        condition,
        inner: Box::new(inner),
    }
}

impl Conditional for TableExpr {
    type Output = Self;

    fn when(self, condition: bool) -> Self {
        dynamic_table(condition, self)
    }
}

impl Conditional for Table {
    type Output = TableExpr;

    fn when(self, condition: bool) -> TableExpr {
        dynamic_table(condition, self.into())
    }
}

impl Conditional for &Table {
    type Output = TableExpr;

    fn when(self, condition: bool) -> TableExpr {
        dynamic_table(condition, self.into())
    }
}

impl Conditional for Join {
    type Output = TableExpr;

    fn when(self, condition: bool) -> TableExpr {
        dynamic_table(condition, self.into())
    }
}

impl Conditional for Select {
    type Output = UnionOperand;

    fn when(self, condition: bool) -> UnionOperand {
        UnionOperand {
            query: Box::new(self),
            condition: Some(condition),
        }
    }
}
