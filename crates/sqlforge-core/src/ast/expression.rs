//! Expression tree.
//!
//! Every node knows its [`ValueType`], its child expressions, and whether it
//! is an aggregate. Construction is infallible; [`Expr::check`] verifies the
//! operand types once the expression is handed to a clause.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::operator::{BinaryOp, Precedence, UnaryOp};
use super::statement::Select;
use super::types::{DataType, SqlType, ValueType};
use crate::error::CompositionError;
use crate::schema::ColumnRef;
use crate::value::{SqlValue, ToSqlValue};

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// The result column name used when the aggregate is selected without alias.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// An aggregate function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub(crate) function: AggregateFunction,
    pub(crate) distinct: bool,
    /// `None` stands for `*`.
    pub(crate) argument: Option<Box<Expr>>,
    pub(crate) over: bool,
}

impl Aggregate {
    pub(crate) fn new(function: AggregateFunction, distinct: bool, argument: Option<Expr>) -> Self {
        Self {
            function,
            distinct,
            argument: argument.map(Box::new),
            over: false,
        }
    }

    #[must_use]
    pub const fn function(&self) -> AggregateFunction {
        self.function
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn argument(&self) -> Option<&Expr> {
        self.argument.as_deref()
    }

    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.over
    }

    fn value_type(&self) -> ValueType {
        let argument = self
            .argument
            .as_deref()
            .map_or_else(ValueType::no_value, Expr::value_type);
        match self.function {
            AggregateFunction::Count => ValueType::of(DataType::Integral),
            AggregateFunction::Sum if argument.data_type == DataType::Boolean => {
                ValueType::nullable(DataType::Integral)
            }
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                argument.or_nullable(true)
            }
            AggregateFunction::Avg => ValueType::nullable(DataType::FloatingPoint),
        }
    }
}

/// Scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Trim,
    Lower,
    Upper,
    Coalesce,
}

impl Function {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trim => "TRIM",
            Self::Lower => "LOWER",
            Self::Upper => "UPPER",
            Self::Coalesce => "COALESCE",
        }
    }
}

/// A value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(ColumnRef),
    /// Value bound as a parameter.
    Value {
        value: SqlValue,
        value_type: ValueType,
    },
    /// Named parameter bound later by the caller.
    Parameter { name: String, value_type: ValueType },
    /// Value rendered inline as a literal.
    Literal(SqlValue),
    Null,
    /// `DEFAULT`, only valid as an inserted value.
    Default,
    /// `excluded.column` inside ON CONFLICT DO UPDATE.
    Excluded(ColumnRef),
    /// Raw SQL text.
    Verbatim { sql: String, value_type: ValueType },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    IsNull { expr: Box<Expr>, negated: bool },
    IsDistinctFrom {
        left: Box<Expr>,
        right: Box<Expr>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        query: Box<Select>,
        negated: bool,
    },
    Exists(Box<Select>),
    Any(Box<Select>),
    Subquery(Box<Select>),
    Case {
        branches: Vec<(Expr, Expr)>,
        otherwise: Box<Expr>,
    },
    Cast { expr: Box<Expr>, target: DataType },
    Function { function: Function, args: Vec<Expr> },
    Aggregate(Aggregate),
    /// Present only if `condition` holds.
    Dynamic { condition: bool, expr: Box<Expr> },
}

/// Which context-bound leaves an expression may contain.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Allow {
    pub default: bool,
    pub excluded: bool,
}

impl Allow {
    pub(crate) const NOTHING: Self = Self {
        default: false,
        excluded: false,
    };
}

fn arithmetic_type(left: DataType, right: DataType) -> DataType {
    use DataType::{FloatingPoint, Integral, Null, UnsignedIntegral};

    let (left, right) = match (left, right) {
        (Null, other) | (other, Null) => (other, other),
        other => other,
    };
    match (left, right) {
        (Null, Null) => Null,
        (FloatingPoint, _) | (_, FloatingPoint) => FloatingPoint,
        (UnsignedIntegral, UnsignedIntegral) => UnsignedIntegral,
        _ => Integral,
    }
}

fn first_column_type(query: &Select) -> ValueType {
    query
        .result_columns()
        .first()
        .map_or_else(ValueType::null, |(_, value_type)| *value_type)
}

impl Expr {
    /// The semantic type of the expression.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Column(column) | Self::Excluded(column) => column.value_type(),
            Self::Value { value_type, .. }
            | Self::Parameter { value_type, .. }
            | Self::Verbatim { value_type, .. } => *value_type,
            Self::Literal(value) => value.value_type(),
            Self::Null | Self::Default => ValueType::null(),
            Self::Binary { op, left, right } => {
                let (l, r) = (left.value_type(), right.value_type());
                let nullable = l.nullable || r.nullable;
                if op.is_comparison() || op.is_logical() {
                    ValueType::new(DataType::Boolean, nullable)
                } else if *op == BinaryOp::Concat {
                    ValueType::new(DataType::Text, nullable)
                } else {
                    let nullable = nullable || *op == BinaryOp::Div;
                    ValueType::new(arithmetic_type(l.data_type, r.data_type), nullable)
                }
            }
            Self::Unary { op, operand } => {
                let t = operand.value_type();
                match op {
                    UnaryOp::Not => ValueType::new(DataType::Boolean, t.nullable),
                    UnaryOp::Neg => {
                        ValueType::new(arithmetic_type(t.data_type, t.data_type), t.nullable)
                    }
                }
            }
            Self::IsNull { .. } | Self::IsDistinctFrom { .. } | Self::Exists(_) => {
                ValueType::of(DataType::Boolean)
            }
            Self::Like { expr, pattern, .. } => ValueType::new(
                DataType::Boolean,
                expr.value_type().nullable || pattern.value_type().nullable,
            ),
            Self::Between {
                expr, low, high, ..
            } => ValueType::new(
                DataType::Boolean,
                [expr, low, high].iter().any(|e| e.value_type().nullable),
            ),
            Self::In { expr, list, .. } => ValueType::new(
                DataType::Boolean,
                expr.value_type().nullable || list.iter().any(|e| e.value_type().nullable),
            ),
            Self::InSubquery { expr, query, .. } => ValueType::new(
                DataType::Boolean,
                expr.value_type().nullable || first_column_type(query).nullable,
            ),
            Self::Any(query) => first_column_type(query),
            Self::Subquery(query) => first_column_type(query).or_nullable(true),
            Self::Case {
                branches,
                otherwise,
            } => {
                let mut types = branches
                    .iter()
                    .map(|(_, then)| then.value_type())
                    .chain(std::iter::once(otherwise.value_type()));
                let nullable = types.clone().any(|t| t.nullable);
                let data_type = types
                    .find(|t| t.data_type != DataType::Null)
                    .map_or(DataType::Null, |t| t.data_type);
                ValueType::new(data_type, nullable)
            }
            Self::Cast { target, .. } => ValueType::nullable(*target),
            Self::Function { function, args } => {
                let first = args.first().map_or_else(ValueType::null, Self::value_type);
                match function {
                    Function::Trim | Function::Lower | Function::Upper => {
                        ValueType::new(DataType::Text, first.nullable)
                    }
                    Function::Coalesce => {
                        first.or_nullable(args.iter().any(|a| a.value_type().nullable))
                    }
                }
            }
            Self::Aggregate(aggregate) => aggregate.value_type(),
            Self::Dynamic { expr, .. } => expr.value_type().or_nullable(true),
        }
    }

    /// Direct child expressions, not descending into sub-selects.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Column(_)
            | Self::Value { .. }
            | Self::Parameter { .. }
            | Self::Literal(_)
            | Self::Null
            | Self::Default
            | Self::Excluded(_)
            | Self::Verbatim { .. }
            | Self::Exists(_)
            | Self::Any(_)
            | Self::Subquery(_) => Vec::new(),
            Self::Binary { left, right, .. }
            | Self::IsDistinctFrom { left, right, .. } => vec![&**left, &**right],
            Self::Unary { operand, .. } => vec![&**operand],
            Self::IsNull { expr, .. }
            | Self::Cast { expr, .. }
            | Self::Dynamic { expr, .. }
            | Self::InSubquery { expr, .. } => vec![&**expr],
            Self::Like { expr, pattern, .. } => vec![&**expr, &**pattern],
            Self::Between {
                expr, low, high, ..
            } => vec![&**expr, &**low, &**high],
            Self::In { expr, list, .. } => std::iter::once(&**expr).chain(list).collect(),
            Self::Case {
                branches,
                otherwise,
            } => branches
                .iter()
                .flat_map(|(when, then)| [when, then])
                .chain(std::iter::once(&**otherwise))
                .collect(),
            Self::Function { args, .. } => args.iter().collect(),
            Self::Aggregate(aggregate) => aggregate.argument.iter().map(|a| &**a).collect(),
        }
    }

    /// Sub-selects owned directly by this node.
    #[must_use]
    pub fn subqueries(&self) -> Vec<&Select> {
        match self {
            Self::InSubquery { query, .. }
            | Self::Exists(query)
            | Self::Any(query)
            | Self::Subquery(query) => vec![query],
            _ => Vec::new(),
        }
    }

    /// Whether the node itself is an aggregate function call.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        match self {
            Self::Aggregate(_) => true,
            Self::Dynamic { expr, .. } => expr.is_aggregate(),
            _ => false,
        }
    }

    /// Whether an aggregate appears anywhere in the tree (outside sub-selects).
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        self.is_aggregate() || self.children().iter().any(|c| c.contains_aggregate())
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }

    /// The wrapped expression of a dynamic node, the node itself otherwise.
    #[must_use]
    pub fn strip_dynamic(&self) -> &Self {
        match self {
            Self::Dynamic { expr, .. } => expr.strip_dynamic(),
            other => other,
        }
    }

    /// What remains of a boolean predicate once absent dynamic parts are dropped.
    ///
    /// Returns `None` if nothing remains. `A AND dynamic(false, B)` reduces to `A`
    /// and `NOT dynamic(false, B)` disappears entirely.
    #[must_use]
    pub fn effective(&self) -> Option<&Self> {
        match self {
            Self::Dynamic {
                condition: false, ..
            } => None,
            Self::Dynamic {
                condition: true,
                expr,
            } => expr.effective(),
            Self::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                left,
                right,
            } => match (left.effective(), right.effective()) {
                (None, None) => None,
                (Some(only), None) | (None, Some(only)) => Some(only),
                (Some(_), Some(_)) => Some(self),
            },
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => operand.effective().map(|_| self),
            other => Some(other),
        }
    }

    /// The result column name of the expression when selected without alias.
    #[must_use]
    pub fn default_name(&self) -> Option<&str> {
        match self {
            Self::Column(column) => Some(column.name()),
            Self::Aggregate(aggregate) => Some(aggregate.function.default_name()),
            Self::Dynamic { expr, .. } => expr.default_name(),
            _ => None,
        }
    }

    /// Binding strength used by the serializer.
    #[must_use]
    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { op, .. } => op.precedence(),
            Self::IsNull { .. }
            | Self::IsDistinctFrom { .. }
            | Self::Like { .. }
            | Self::Between { .. } => Precedence::Comparison,
            Self::In { .. } | Self::InSubquery { .. } | Self::Case { .. } => {
                Precedence::AlwaysWrap
            }
            Self::Dynamic { expr, .. } => expr.precedence(),
            _ => Precedence::Atom,
        }
    }

    /// Checks operand types and context-bound leaves of the whole tree.
    pub(crate) fn check(&self, allow: Allow) -> Result<(), CompositionError> {
        self.check_node(allow, false)
    }

    fn check_node(&self, allow: Allow, in_aggregate: bool) -> Result<(), CompositionError> {
        self.check_shape(allow, in_aggregate)?;
        let nested = Allow {
            default: false,
            excluded: allow.excluded,
        };
        let in_aggregate = in_aggregate || matches!(self, Self::Aggregate(_));
        let comparison = matches!(self, Self::Binary { op, .. } if op.is_comparison());
        for (index, child) in self.children().into_iter().enumerate() {
            // ANY on the right of a comparison was checked by check_binary.
            if comparison && index == 1 && matches!(child, Self::Any(_)) {
                continue;
            }
            child.check_node(nested, in_aggregate)?;
        }
        Ok(())
    }

    fn check_shape(&self, allow: Allow, in_aggregate: bool) -> Result<(), CompositionError> {
        match self {
            Self::Default if !allow.default => Err(CompositionError::MisplacedDefault),
            Self::Excluded(column) if !allow.excluded => Err(CompositionError::MisplacedExcluded {
                column: String::from(column.name()),
            }),
            Self::Any(_) => Err(CompositionError::MisplacedAny),
            Self::Binary { op, left, right } => check_binary(*op, left, right),
            Self::Unary { op, operand } => {
                let t = operand.value_type();
                match op {
                    UnaryOp::Not => expect(t, DataType::is_boolean, "NOT", "boolean"),
                    UnaryOp::Neg => expect(t, DataType::is_numeric, "unary minus", "numeric"),
                }
            }
            Self::IsNull { expr, .. } => expect(
                expr.value_type(),
                DataType::has_value,
                "IS NULL",
                "valued",
            ),
            Self::IsDistinctFrom { left, right, .. } => {
                comparable("IS DISTINCT FROM", left.value_type(), right.value_type())
            }
            Self::Like { expr, pattern, .. } => {
                expect(expr.value_type(), DataType::is_text, "LIKE", "text")?;
                expect(pattern.value_type(), DataType::is_text, "LIKE", "text")
            }
            Self::Between {
                expr, low, high, ..
            } => {
                comparable("BETWEEN", expr.value_type(), low.value_type())?;
                comparable("BETWEEN", expr.value_type(), high.value_type())
            }
            Self::In { expr, list, .. } => {
                if list.is_empty() {
                    return Err(CompositionError::EmptyInList);
                }
                list.iter()
                    .try_for_each(|item| comparable("IN", expr.value_type(), item.value_type()))
            }
            Self::InSubquery { expr, query, .. } => {
                single_column(query, "IN operand")?;
                comparable("IN", expr.value_type(), first_column_type(query))
            }
            Self::Exists(query) => {
                if query.result_columns().is_empty() {
                    return Err(CompositionError::IncompleteSubquery);
                }
                Ok(())
            }
            Self::Subquery(query) => single_column(query, "value"),
            Self::Case {
                branches,
                otherwise,
            } => {
                let result = self.value_type();
                for (when, then) in branches {
                    expect(when.value_type(), DataType::is_boolean, "CASE WHEN", "boolean")?;
                    comparable("CASE", result, then.value_type())?;
                }
                comparable("CASE", result, otherwise.value_type())
            }
            Self::Cast { expr, target } => {
                expect(expr.value_type(), DataType::has_value, "CAST", "valued")?;
                if matches!(target, DataType::NoValue | DataType::Null) {
                    return Err(CompositionError::TypeMismatch {
                        operation: "CAST",
                        expected: "a valued target",
                        found: ValueType::of(*target),
                    });
                }
                Ok(())
            }
            Self::Function { function, args } => match function {
                Function::Trim | Function::Lower | Function::Upper => args
                    .iter()
                    .try_for_each(|a| expect(a.value_type(), DataType::is_text, function.as_str(), "text")),
                Function::Coalesce => {
                    let (Some(first), true) = (args.first(), args.len() >= 2) else {
                        return Err(CompositionError::TypeMismatch {
                            operation: "COALESCE",
                            expected: "at least two",
                            found: ValueType::no_value(),
                        });
                    };
                    args.iter()
                        .try_for_each(|a| comparable("COALESCE", first.value_type(), a.value_type()))
                }
            },
            Self::Aggregate(aggregate) => {
                if in_aggregate {
                    return Err(CompositionError::NestedAggregate {
                        expr: self.to_string(),
                    });
                }
                let Some(argument) = aggregate.argument.as_deref() else {
                    return Ok(());
                };
                let name = aggregate.function.as_str();
                match aggregate.function {
                    AggregateFunction::Sum | AggregateFunction::Avg => {
                        expect(argument.value_type(), DataType::is_numeric, name, "numeric")
                    }
                    AggregateFunction::Count | AggregateFunction::Min | AggregateFunction::Max => {
                        expect(argument.value_type(), DataType::has_value, name, "valued")
                    }
                }
            }
            _ => Ok(()),
        }
    }
}

fn check_binary(op: BinaryOp, left: &Expr, right: &Expr) -> Result<(), CompositionError> {
    let l = left.value_type();
    if op.is_comparison() {
        let r = match right {
            Expr::Any(query) => {
                single_column(query, "ANY operand")?;
                first_column_type(query)
            }
            other => other.value_type(),
        };
        comparable(op.as_str(), l, r)
    } else if op.is_logical() {
        expect(l, DataType::is_boolean, op.as_str(), "boolean")?;
        expect(right.value_type(), DataType::is_boolean, op.as_str(), "boolean")
    } else if op == BinaryOp::Concat {
        expect(l, DataType::is_text, "||", "text")?;
        expect(right.value_type(), DataType::is_text, "||", "text")
    } else if op == BinaryOp::Mod {
        expect(l, DataType::is_integral, "%", "integral")?;
        expect(right.value_type(), DataType::is_integral, "%", "integral")
    } else {
        expect(l, DataType::is_numeric, op.as_str(), "numeric")?;
        expect(right.value_type(), DataType::is_numeric, op.as_str(), "numeric")
    }
}

fn expect(
    found: ValueType,
    accepts: fn(DataType) -> bool,
    operation: &'static str,
    expected: &'static str,
) -> Result<(), CompositionError> {
    if accepts(found.data_type) {
        Ok(())
    } else {
        Err(CompositionError::TypeMismatch {
            operation,
            expected,
            found,
        })
    }
}

fn comparable(
    operation: &'static str,
    left: ValueType,
    right: ValueType,
) -> Result<(), CompositionError> {
    if left.data_type.is_comparable_with(right.data_type) {
        Ok(())
    } else {
        Err(CompositionError::NotComparable {
            operation,
            left,
            right,
        })
    }
}

fn single_column(query: &Select, usage: &'static str) -> Result<(), CompositionError> {
    match query.result_columns().len() {
        1 => Ok(()),
        0 => Err(CompositionError::IncompleteSubquery),
        found => Err(CompositionError::SubqueryColumnCount { usage, found }),
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl From<Aggregate> for Expr {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        let value_type = value.value_type();
        Self::Value { value, value_type }
    }
}

impl<T: ToSqlValue> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        Self::Value {
            value_type: <Option<T>>::VALUE_TYPE,
            value: value.to_sql_value(),
        }
    }
}

macro_rules! impl_expr_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Value {
                        value_type: <$ty as SqlType>::VALUE_TYPE,
                        value: value.to_sql_value(),
                    }
                }
            }
        )+
    };
}

impl_expr_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    &str,
    Vec<u8>,
    &[u8],
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<Utc>,
);
