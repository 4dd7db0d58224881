//! Expression constructors and capability traits.
//!
//! Column references, expressions and aggregates pick up their operators
//! from small capability traits: [`Comparable`], [`Logical`], [`Arithmetic`],
//! [`Aliasable`] and, for aggregates only, [`Windowable`].

use crate::ast::{
    Aggregate, AggregateFunction, Assignment, BinaryOp, DataType, Expr, Function, OrderBy, Select,
    SelectColumn, SortDirection, SqlType, UnaryOp, ValueType,
};
use crate::schema::{ColumnRef, Table};
use crate::value::ToSqlValue;

fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left.into()),
        right: Box::new(right.into()),
    }
}

/// Comparisons, predicates and sort order.
pub trait Comparable: Into<Expr> + Sized {
    #[must_use]
    fn eq(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Eq, self, other)
    }

    #[must_use]
    fn not_eq(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::NotEq, self, other)
    }

    #[must_use]
    fn lt(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Lt, self, other)
    }

    #[must_use]
    fn lt_eq(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::LtEq, self, other)
    }

    #[must_use]
    fn gt(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Gt, self, other)
    }

    #[must_use]
    fn gt_eq(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::GtEq, self, other)
    }

    #[must_use]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into()),
            negated: false,
        }
    }

    #[must_use]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into()),
            negated: true,
        }
    }

    /// Null-safe inequality.
    #[must_use]
    fn is_distinct_from(self, other: impl Into<Expr>) -> Expr {
        Expr::IsDistinctFrom {
            left: Box::new(self.into()),
            right: Box::new(other.into()),
            negated: false,
        }
    }

    /// Null-safe equality.
    #[must_use]
    fn is_not_distinct_from(self, other: impl Into<Expr>) -> Expr {
        Expr::IsDistinctFrom {
            left: Box::new(self.into()),
            right: Box::new(other.into()),
            negated: true,
        }
    }

    #[must_use]
    fn like(self, pattern: impl Into<Expr>) -> Expr {
        Expr::Like {
            expr: Box::new(self.into()),
            pattern: Box::new(pattern.into()),
            negated: false,
        }
    }

    #[must_use]
    fn not_like(self, pattern: impl Into<Expr>) -> Expr {
        Expr::Like {
            expr: Box::new(self.into()),
            pattern: Box::new(pattern.into()),
            negated: true,
        }
    }

    #[must_use]
    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    #[must_use]
    fn not_between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        }
    }

    /// `self IN (values...)`. An empty list is rejected when the expression
    /// is handed to a clause.
    #[must_use]
    fn in_list<I>(self, values: I) -> Expr
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Expr::In {
            expr: Box::new(self.into()),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    #[must_use]
    fn not_in_list<I>(self, values: I) -> Expr
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Expr::In {
            expr: Box::new(self.into()),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `self IN (SELECT ...)`.
    #[must_use]
    fn in_select(self, query: Select) -> Expr {
        Expr::InSubquery {
            expr: Box::new(self.into()),
            query: Box::new(query),
            negated: false,
        }
    }

    #[must_use]
    fn not_in_select(self, query: Select) -> Expr {
        Expr::InSubquery {
            expr: Box::new(self.into()),
            query: Box::new(query),
            negated: true,
        }
    }

    #[must_use]
    fn asc(self) -> OrderBy {
        OrderBy {
            expr: self.into(),
            direction: Some(SortDirection::Asc),
        }
    }

    #[must_use]
    fn desc(self) -> OrderBy {
        OrderBy {
            expr: self.into(),
            direction: Some(SortDirection::Desc),
        }
    }
}

/// Boolean connectives.
pub trait Logical: Into<Expr> + Sized {
    #[must_use]
    fn and(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::And, self, other)
    }

    #[must_use]
    fn or(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Or, self, other)
    }

    #[must_use]
    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self.into()),
        }
    }
}

/// Arithmetic and string concatenation.
pub trait Arithmetic: Into<Expr> + Sized {
    #[must_use]
    fn plus(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Add, self, other)
    }

    #[must_use]
    fn minus(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Sub, self, other)
    }

    #[must_use]
    fn times(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Mul, self, other)
    }

    #[must_use]
    fn divided_by(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Div, self, other)
    }

    #[must_use]
    fn modulo(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Mod, self, other)
    }

    #[must_use]
    fn negate(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self.into()),
        }
    }

    #[must_use]
    fn concat(self, other: impl Into<Expr>) -> Expr {
        binary(BinaryOp::Concat, self, other)
    }
}

/// Naming an expression in a select list.
pub trait Aliasable: Into<Expr> + Sized {
    #[must_use]
    fn as_(self, alias: impl Into<String>) -> SelectColumn {
        SelectColumn {
            expr: self.into(),
            alias: Some(alias.into()),
        }
    }
}

/// Window functions: `aggregate OVER()`.
pub trait Windowable {
    #[must_use]
    fn over(self) -> Expr;
}

impl Windowable for Aggregate {
    fn over(mut self) -> Expr {
        self.over = true;
        Expr::Aggregate(self)
    }
}

impl Comparable for Expr {}
impl Comparable for ColumnRef {}
impl Comparable for Aggregate {}
impl Logical for Expr {}
impl Logical for ColumnRef {}
impl Arithmetic for Expr {}
impl Arithmetic for ColumnRef {}
impl Arithmetic for Aggregate {}
impl Aliasable for Expr {}
impl Aliasable for ColumnRef {}
impl Aliasable for Aggregate {}

impl ColumnRef {
    /// `column = value`, for SET lists and DO UPDATE.
    #[must_use]
    pub fn assign(&self, value: impl Into<Expr>) -> Assignment {
        Assignment {
            column: self.clone(),
            value: value.into(),
            condition: None,
        }
    }

    /// `column = DEFAULT`.
    #[must_use]
    pub fn assign_default(&self) -> Assignment {
        self.assign(Expr::Default)
    }
}

impl SelectColumn {
    /// Renames an already named column.
    #[must_use]
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A value rendered inline as a SQL literal instead of a placeholder.
#[must_use]
pub fn lit(value: impl ToSqlValue) -> Expr {
    Expr::Literal(value.to_sql_value())
}

/// The `NULL` literal.
#[must_use]
pub const fn null() -> Expr {
    Expr::Null
}

/// `DEFAULT`, usable as an inserted value.
#[must_use]
pub const fn default_value() -> Expr {
    Expr::Default
}

/// A named parameter of Rust type `T`, bound later by the caller.
#[must_use]
pub fn parameter<T: SqlType>(name: impl Into<String>) -> Expr {
    Expr::Parameter {
        name: name.into(),
        value_type: T::VALUE_TYPE,
    }
}

/// Raw SQL text of the given type. The text is emitted unchanged.
#[must_use]
pub fn verbatim(sql: impl Into<String>, value_type: ValueType) -> Expr {
    Expr::Verbatim {
        sql: sql.into(),
        value_type,
    }
}

/// `excluded.column` in ON CONFLICT DO UPDATE.
#[must_use]
pub fn excluded(column: &ColumnRef) -> Expr {
    Expr::Excluded(column.clone())
}

#[must_use]
pub fn exists(query: Select) -> Expr {
    Expr::Exists(Box::new(query))
}

/// `ANY (SELECT ...)`, the right operand of a comparison.
#[must_use]
pub fn any(query: Select) -> Expr {
    Expr::Any(Box::new(query))
}

/// A single-column sub-select used as a value.
#[must_use]
pub fn scalar(query: Select) -> Expr {
    Expr::Subquery(Box::new(query))
}

#[must_use]
pub fn cast(expr: impl Into<Expr>, target: DataType) -> Expr {
    Expr::Cast {
        expr: Box::new(expr.into()),
        target,
    }
}

fn function(function: Function, args: Vec<Expr>) -> Expr {
    Expr::Function { function, args }
}

#[must_use]
pub fn trim(expr: impl Into<Expr>) -> Expr {
    function(Function::Trim, vec![expr.into()])
}

#[must_use]
pub fn lower(expr: impl Into<Expr>) -> Expr {
    function(Function::Lower, vec![expr.into()])
}

#[must_use]
pub fn upper(expr: impl Into<Expr>) -> Expr {
    function(Function::Upper, vec![expr.into()])
}

/// `COALESCE(a, b, ...)`; at least two arguments are required.
#[must_use]
pub fn coalesce<I>(args: I) -> Expr
where
    I: IntoIterator,
    I::Item: Into<Expr>,
{
    function(
        Function::Coalesce,
        args.into_iter().map(Into::into).collect(),
    )
}

macro_rules! aggregate_constructors {
    ($($name:ident, $distinct_name:ident => $function:ident;)+) => {
        $(
            #[must_use]
            pub fn $name(expr: impl Into<Expr>) -> Aggregate {
                Aggregate::new(AggregateFunction::$function, false, Some(expr.into()))
            }

            #[must_use]
            pub fn $distinct_name(expr: impl Into<Expr>) -> Aggregate {
                Aggregate::new(AggregateFunction::$function, true, Some(expr.into()))
            }
        )+
    };
}

aggregate_constructors! {
    count, count_distinct => Count;
    sum, sum_distinct => Sum;
    avg, avg_distinct => Avg;
    min, min_distinct => Min;
    max, max_distinct => Max;
}

/// `COUNT(*)`.
#[must_use]
pub fn count_star() -> Aggregate {
    Aggregate::new(AggregateFunction::Count, false, None)
}

/// Every column of a table, in declaration order.
#[must_use]
pub fn all_of(table: impl Into<Table>) -> Vec<SelectColumn> {
    table
        .into()
        .columns()
        .into_iter()
        .map(SelectColumn::from)
        .collect()
}

/// Starts a CASE expression: `case_when(cond).then(v).else_(w)`.
#[must_use]
pub fn case_when(condition: impl Into<Expr>) -> CaseWhen {
    CaseWhen {
        branches: Vec::new(),
        condition: condition.into(),
    }
}

/// A CASE expression waiting for the THEN of its latest WHEN.
#[derive(Debug, Clone)]
pub struct CaseWhen {
    branches: Vec<(Expr, Expr)>,
    condition: Expr,
}

impl CaseWhen {
    #[must_use]
    pub fn then(mut self, value: impl Into<Expr>) -> Case {
        self.branches.push((self.condition, value.into()));
        Case {
            branches: self.branches,
        }
    }
}

/// A CASE expression with at least one complete branch.
#[derive(Debug, Clone)]
pub struct Case {
    branches: Vec<(Expr, Expr)>,
}

impl Case {
    #[must_use]
    pub fn when(self, condition: impl Into<Expr>) -> CaseWhen {
        CaseWhen {
            branches: self.branches,
            condition: condition.into(),
        }
    }

    /// Completes the expression with its ELSE branch.
    #[must_use]
    pub fn else_(self, value: impl Into<Expr>) -> Expr {
        Expr::Case {
            branches: self.branches,
            otherwise: Box::new(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;

    fn column(name: &str, data_type: DataType) -> ColumnRef {
        ColumnRef::new("t", ColumnDef::new(name, data_type))
    }

    #[test]
    fn test_comparison_builds_binary() {
        let id = column("id", DataType::Integral);
        let expr = id.clone().eq(5);
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                left: Box::new(Expr::Column(id)),
                right: Box::new(Expr::from(5)),
            }
        );
    }

    #[test]
    fn test_aggregate_over() {
        let x = column("x", DataType::Integral);
        let expr = sum(x).over();
        let Expr::Aggregate(aggregate) = expr else {
            panic!("expected aggregate");
        };
        assert!(aggregate.is_windowed());
        assert_eq!(aggregate.function(), AggregateFunction::Sum);
    }

    #[test]
    fn test_case_builder() {
        let x = column("x", DataType::Integral);
        let expr = case_when(x.clone().gt(0))
            .then("positive")
            .when(x.lt(0))
            .then("negative")
            .else_("zero");
        let Expr::Case { branches, .. } = &expr else {
            panic!("expected case");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(expr.value_type(), ValueType::of(DataType::Text));
    }

    #[test]
    fn test_parameter_type() {
        let expr = parameter::<Option<i64>>("limit");
        assert_eq!(expr.value_type(), ValueType::nullable(DataType::Integral));
    }

    #[test]
    fn test_alias_names_column() {
        let column = count_star().as_("total");
        assert_eq!(column.name(), Some("total"));
        let column: SelectColumn = count_star().into();
        assert_eq!(column.name(), Some("count"));
    }
}
