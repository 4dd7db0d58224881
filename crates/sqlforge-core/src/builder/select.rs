//! SELECT composition.
//!
//! Each operation fills one clause slot of a [`Select`] and checks the shape
//! of its arguments first, so a rejected call never produces a statement.
//!
//! ```rust
//! use sqlforge_core::ast::DataType;
//! use sqlforge_core::builder::{select, Comparable};
//! use sqlforge_core::schema::{ColumnDef, Table, TableDef};
//!
//! let users = Table::new(
//!     TableDef::new("users")
//!         .column(ColumnDef::new("id", DataType::Integral))
//!         .column(ColumnDef::new("name", DataType::Text)),
//! );
//! let id = users.column("id").unwrap();
//! let name = users.column("name").unwrap();
//!
//! let query = select((id.clone(), name))
//!     .and_then(|s| s.from(&users))
//!     .and_then(|s| s.where_(id.gt(10)));
//! assert!(query.is_ok());
//!
//! // WHERE needs a boolean condition.
//! let users_id = users.column("id").unwrap();
//! let rejected = select(users_id.clone())
//!     .and_then(|s| s.from(&users))
//!     .and_then(|s| s.where_(users_id));
//! assert!(rejected.is_err());
//! ```

use super::list::IntoList;
use super::{check_condition, check_constant, check_detached, fill, non_empty};
use crate::ast::{
    Allow, DerivedTable, Expr, OrderBy, Select, SelectColumn, SelectFlag, TableExpr,
    UnionKind, UnionOperand, UnionPart,
};
use crate::error::{Clause, CompositionError};

/// Starts a SELECT with the given columns.
///
/// # Errors
///
/// See [`Select::columns`].
pub fn select(columns: impl IntoList<SelectColumn>) -> Result<Select, CompositionError> {
    Select::new().columns(columns)
}

/// Starts a `SELECT DISTINCT`.
///
/// # Errors
///
/// See [`Select::columns`].
pub fn select_distinct(columns: impl IntoList<SelectColumn>) -> Result<Select, CompositionError> {
    Select::new().flag(SelectFlag::Distinct)?.columns(columns)
}

/// Starts a `SELECT ALL`.
///
/// # Errors
///
/// See [`Select::columns`].
pub fn select_all(columns: impl IntoList<SelectColumn>) -> Result<Select, CompositionError> {
    Select::new().flag(SelectFlag::All)?.columns(columns)
}

impl Select {
    /// An empty SELECT with no clause supplied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self, clause: Clause) -> Result<(), CompositionError> {
        if self.unions.is_empty() {
            Ok(())
        } else {
            Err(CompositionError::ClauseAfterUnion { clause })
        }
    }

    /// Sets DISTINCT or ALL. Flags must come before the columns.
    ///
    /// # Errors
    ///
    /// Fails if the columns or a flag were already supplied.
    pub fn flag(mut self, flag: SelectFlag) -> Result<Self, CompositionError> {
        if self.columns.is_present() {
            return Err(CompositionError::FlagAfterColumns);
        }
        if self.flag.is_some() {
            return Err(CompositionError::ClauseAlreadySet {
                clause: Clause::Columns,
            });
        }
        self.flag = Some(flag);
        Ok(self)
    }

    /// Sets the selected columns.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, on an unnamed column (use `as_`), on a name
    /// used twice, or on an ill-typed expression.
    pub fn columns(mut self, columns: impl IntoList<SelectColumn>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::Columns)?;
        let columns = non_empty(columns.into_list(), Clause::Columns)?;
        let mut names: Vec<&str> = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            column.expr.check(Allow::NOTHING)?;
            let Some(name) = column.name() else {
                return Err(CompositionError::UnnamedColumn {
                    index,
                    expr: column.expr.to_string(),
                });
            };
            if names.contains(&name) {
                return Err(CompositionError::DuplicateColumnName {
                    name: String::from(name),
                });
            }
            names.push(name);
        }
        fill(&mut self.columns, Clause::Columns, columns)?;
        Ok(self)
    }

    /// Sets FROM: a table, an aliased table, a join tree, a derived table or
    /// a CTE reference.
    ///
    /// # Errors
    ///
    /// Fails if FROM is already set or the root is a dynamic table.
    pub fn from(mut self, table: impl Into<TableExpr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::From)?;
        let table = table.into();
        if matches!(table, TableExpr::Dynamic { .. }) {
            return Err(CompositionError::DynamicFromRoot);
        }
        fill(&mut self.from, Clause::From, table)?;
        Ok(self)
    }

    /// Sets the WHERE condition.
    ///
    /// # Errors
    ///
    /// Fails unless the condition is a well-typed, aggregate-free boolean.
    pub fn where_(mut self, condition: impl Into<Expr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::Where)?;
        let condition = condition.into();
        check_condition(&condition, Clause::Where)?;
        fill(&mut self.where_, Clause::Where, condition)?;
        Ok(self)
    }

    /// Sets GROUP BY.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or if an entry is an aggregate.
    pub fn group_by(mut self, keys: impl IntoList<Expr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::GroupBy)?;
        let keys = non_empty(keys.into_list(), Clause::GroupBy)?;
        for key in &keys {
            key.check(Allow::NOTHING)?;
            if key.contains_aggregate() {
                return Err(CompositionError::AggregateInGroupBy {
                    expr: key.to_string(),
                });
            }
        }
        fill(&mut self.group_by, Clause::GroupBy, keys)?;
        Ok(self)
    }

    /// Sets the HAVING condition.
    ///
    /// # Errors
    ///
    /// Fails unless the condition is a well-typed boolean.
    pub fn having(mut self, condition: impl Into<Expr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::Having)?;
        let condition = condition.into();
        check_condition(&condition, Clause::Having)?;
        fill(&mut self.having, Clause::Having, condition)?;
        Ok(self)
    }

    /// Sets ORDER BY.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or an ill-typed entry.
    pub fn order_by(mut self, entries: impl IntoList<OrderBy>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::OrderBy)?;
        let entries = non_empty(entries.into_list(), Clause::OrderBy)?;
        for entry in &entries {
            entry.expr.check(Allow::NOTHING)?;
        }
        fill(&mut self.order_by, Clause::OrderBy, entries)?;
        Ok(self)
    }

    /// Sets LIMIT. Rust integers are bound as parameters, `lit(n)` renders inline.
    ///
    /// # Errors
    ///
    /// Fails unless the count is a constant integral expression.
    pub fn limit(mut self, count: impl Into<Expr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::Limit)?;
        let count = count.into();
        check_constant(&count, Clause::Limit)?;
        fill(&mut self.limit, Clause::Limit, count)?;
        Ok(self)
    }

    /// Sets OFFSET.
    ///
    /// # Errors
    ///
    /// Fails unless the offset is a constant integral expression.
    pub fn offset(mut self, offset: impl Into<Expr>) -> Result<Self, CompositionError> {
        self.ensure_open(Clause::Offset)?;
        let offset = offset.into();
        check_constant(&offset, Clause::Offset)?;
        fill(&mut self.offset, Clause::Offset, offset)?;
        Ok(self)
    }

    /// Appends `UNION ALL rhs`.
    ///
    /// # Errors
    ///
    /// See [`Select::union_distinct`].
    pub fn union_all(self, rhs: impl Into<UnionOperand>) -> Result<Self, CompositionError> {
        self.union(UnionKind::All, rhs.into())
    }

    /// Appends `UNION DISTINCT rhs`.
    ///
    /// # Errors
    ///
    /// Fails if either side is ordered or limited, if either side has no
    /// columns yet, or if the right side carries its own WITH clause.
    pub fn union_distinct(self, rhs: impl Into<UnionOperand>) -> Result<Self, CompositionError> {
        self.union(UnionKind::Distinct, rhs.into())
    }

    fn union(mut self, kind: UnionKind, operand: UnionOperand) -> Result<Self, CompositionError> {
        check_union_operand(&self)?;
        check_union_operand(&operand.query)?;
        if operand.query.with.is_present() {
            return Err(CompositionError::UnionOperandClause {
                clause: Clause::With,
            });
        }
        self.unions.push(UnionPart { kind, operand });
        Ok(self)
    }

    /// Turns the select into a derived table usable in FROM.
    ///
    /// # Errors
    ///
    /// Fails if the select is not consistent on its own or references tables
    /// of an enclosing query.
    pub fn as_table(self, name: impl Into<String>) -> Result<DerivedTable, CompositionError> {
        check_detached(&self)?;
        Ok(DerivedTable {
            query: Box::new(self),
            name: name.into(),
        })
    }
}

fn check_union_operand(query: &Select) -> Result<(), CompositionError> {
    if !query.columns.is_present() {
        return Err(CompositionError::IncompleteSubquery);
    }
    let ordered = [
        (query.order_by.is_present(), Clause::OrderBy),
        (query.limit.is_present(), Clause::Limit),
        (query.offset.is_present(), Clause::Offset),
    ];
    match ordered.into_iter().find(|(present, _)| *present) {
        Some((_, clause)) => Err(CompositionError::UnionOperandClause { clause }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::builder::{count_star, dynamic, lit, sum, Aliasable, Arithmetic, Comparable};
    use crate::schema::{ColumnDef, ColumnRef, Table, TableDef};

    fn orders() -> Table {
        Table::new(
            TableDef::new("orders")
                .column(ColumnDef::new("id", DataType::Integral))
                .column(ColumnDef::new("amount", DataType::FloatingPoint))
                .column(ColumnDef::new("customer", DataType::Text)),
        )
    }

    fn col(table: &Table, name: &str) -> ColumnRef {
        table.column(name).unwrap()
    }

    #[test]
    fn test_select_rejects_empty_columns() {
        let err = select(Vec::<SelectColumn>::new()).unwrap_err();
        assert_eq!(
            err,
            CompositionError::EmptyList {
                clause: Clause::Columns
            }
        );
    }

    #[test]
    fn test_select_requires_names() {
        let t = orders();
        let err = select(col(&t, "amount").plus(1)).unwrap_err();
        assert!(matches!(err, CompositionError::UnnamedColumn { index: 0, .. }));

        let ok = select(col(&t, "amount").plus(1).as_("bumped"));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_selected_columns_keep_their_order() {
        let t = orders();
        let query = select((col(&t, "customer"), col(&t, "id")))
            .and_then(|s| s.from(&t))
            .unwrap();
        let names: Vec<_> = query
            .selected_columns()
            .iter()
            .map(SelectColumn::name)
            .collect();
        assert_eq!(names, vec![Some("customer"), Some("id")]);
    }

    #[test]
    fn test_result_names_must_be_unique() {
        let t = orders();
        let err = select((sum(col(&t, "id")), sum(col(&t, "amount")))).unwrap_err();
        assert_eq!(
            err,
            CompositionError::DuplicateColumnName {
                name: String::from("sum")
            }
        );

        let other = t.as_("o");
        let err = select((col(&t, "id"), col(&other, "id"))).unwrap_err();
        assert!(matches!(err, CompositionError::DuplicateColumnName { .. }));

        let ok = select((
            sum(col(&t, "id")).as_("ids"),
            sum(col(&t, "amount")).as_("amounts"),
        ));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_clause_set_twice() {
        let t = orders();
        let err = select(col(&t, "id"))
            .and_then(|s| s.from(&t))
            .and_then(|s| s.from(&t))
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::ClauseAlreadySet {
                clause: Clause::From
            }
        );
    }

    #[test]
    fn test_flags_must_precede_columns() {
        let t = orders();
        let err = select(col(&t, "id"))
            .and_then(|s| s.flag(SelectFlag::Distinct))
            .unwrap_err();
        assert_eq!(err, CompositionError::FlagAfterColumns);
        assert!(select_distinct(col(&t, "id")).is_ok());
    }

    #[test]
    fn test_group_by_rejects_aggregates() {
        let t = orders();
        let err = select(count_star())
            .and_then(|s| s.from(&t))
            .and_then(|s| s.group_by(sum(col(&t, "amount"))))
            .unwrap_err();
        assert!(matches!(err, CompositionError::AggregateInGroupBy { .. }));

        let err = select(count_star())
            .and_then(|s| s.group_by(Vec::<Expr>::new()))
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::EmptyList {
                clause: Clause::GroupBy
            }
        );
    }

    #[test]
    fn test_where_requires_boolean() {
        let t = orders();
        let err = select(col(&t, "id"))
            .and_then(|s| s.where_(col(&t, "customer")))
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::TypeMismatch {
                operation: "WHERE",
                ..
            }
        ));
        let err = select(col(&t, "id"))
            .and_then(|s| s.where_(sum(col(&t, "amount")).gt(10)))
            .unwrap_err();
        assert!(matches!(err, CompositionError::AggregateInCondition { .. }));
    }

    #[test]
    fn test_limit_must_be_constant_integral() {
        let t = orders();
        let base = select(col(&t, "id")).and_then(|s| s.from(&t)).unwrap();
        assert!(base.clone().limit(10_u64).is_ok());
        assert!(base.clone().limit(lit(10)).is_ok());
        assert!(matches!(
            base.clone().limit(col(&t, "id")).unwrap_err(),
            CompositionError::NotConstant { .. }
        ));
        assert!(matches!(
            base.offset(1.5).unwrap_err(),
            CompositionError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_union_operands_must_not_be_ordered() {
        let t = orders();
        let lhs = select(col(&t, "id")).and_then(|s| s.from(&t)).unwrap();
        let ordered = lhs.clone().order_by(col(&t, "id").asc()).unwrap();
        let err = lhs.clone().union_all(ordered).unwrap_err();
        assert_eq!(
            err,
            CompositionError::UnionOperandClause {
                clause: Clause::OrderBy
            }
        );

        let union = lhs.clone().union_distinct(lhs.clone()).unwrap();
        let err = union.where_(col(&t, "id").eq(1)).unwrap_err();
        assert_eq!(
            err,
            CompositionError::ClauseAfterUnion {
                clause: Clause::Where
            }
        );
    }

    #[test]
    fn test_union_accepts_dynamic_operand() {
        let t = orders();
        let lhs = select(col(&t, "id")).and_then(|s| s.from(&t)).unwrap();
        let union = lhs.clone().union_all(dynamic(false, lhs)).unwrap();
        assert_eq!(union.unions().len(), 1);
        assert!(!union.unions()[0].operand().is_active());
    }

    #[test]
    fn test_derived_table_must_be_self_contained() {
        let t = orders();
        let other = Table::new(TableDef::new("other").column(ColumnDef::new("id", DataType::Integral)));
        let sub = select(col(&other, "id")).and_then(|s| s.from(&t)).unwrap();
        let err = sub.as_table("sub").unwrap_err();
        assert_eq!(
            err,
            CompositionError::OuterReference {
                table: String::from("other")
            }
        );

        let sub = select(col(&t, "id")).and_then(|s| s.from(&t)).unwrap();
        let derived = sub.as_table("sub").unwrap();
        assert_eq!(derived.column("id").unwrap().table(), "sub");
    }
}
