//! Expression rendering.

use super::Context;
use crate::ast::{
    needs_parentheses, Aggregate, Associativity, BinaryOp, Expr, Precedence, Side, UnaryOp,
    ValueType,
};
use crate::schema::ColumnRef;
use crate::value::{Parameter, SqlValue};

impl Context<'_> {
    /// Renders an expression in a top-level position, which never adds
    /// parentheses. An absent dynamic expression renders as `NULL`.
    pub(super) fn expr(&mut self, expr: &Expr) {
        match expr.effective() {
            Some(expr) => self.node(expr),
            None => self.push("NULL"),
        }
    }

    /// Renders `child` as an operand of a `parent` operator.
    fn operand(&mut self, child: &Expr, parent: Precedence, assoc: Associativity, side: Side) {
        let Some(child) = child.effective() else {
            self.push("NULL");
            return;
        };
        if needs_parentheses(child.precedence(), parent, assoc, side) {
            self.push("(");
            self.node(child);
            self.push(")");
        } else {
            self.node(child);
        }
    }

    /// Operand of a predicate such as `IS NULL`, `LIKE` or `BETWEEN`.
    fn predicate_operand(&mut self, child: &Expr, side: Side) {
        self.operand(child, Precedence::Comparison, Associativity::None, side);
    }

    pub(super) fn column(&mut self, column: &ColumnRef) {
        if self.qualify {
            self.identifier(column.table());
            self.push(".");
        }
        self.identifier(column.name());
    }

    fn value(&mut self, value: &SqlValue, value_type: ValueType) {
        if self.options.inline_values {
            self.literal(value);
        } else {
            self.bind(None, value_type, Some(value.clone()));
        }
    }

    fn bind(&mut self, name: Option<String>, value_type: ValueType, value: Option<SqlValue>) {
        let ordinal = self.parameters.len() + 1;
        let placeholder = self.dialect.placeholder(ordinal);
        self.push(&placeholder);
        self.parameters.push(Parameter {
            ordinal,
            name,
            value_type,
            value,
        });
    }

    fn literal(&mut self, value: &SqlValue) {
        let literal = self.dialect.format_literal(value);
        self.push(&literal);
    }

    pub(super) fn list<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>) {
        for (index, expr) in exprs.into_iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.expr(expr);
        }
    }

    fn node(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(column) => self.column(column),
            Expr::Value { value, value_type } => self.value(value, *value_type),
            Expr::Parameter { name, value_type } => {
                self.bind(Some(name.clone()), *value_type, None);
            }
            Expr::Literal(value) => self.literal(value),
            Expr::Null => self.push("NULL"),
            Expr::Default => self.push("DEFAULT"),
            Expr::Excluded(column) => {
                self.push("excluded.");
                self.identifier(column.name());
            }
            Expr::Verbatim { sql, .. } => self.push(sql),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::IsNull { expr, negated } => {
                self.predicate_operand(expr, Side::Only);
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::IsDistinctFrom {
                left,
                right,
                negated,
            } => self.is_distinct_from(left, right, *negated),
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                self.predicate_operand(expr, Side::Left);
                self.push(if *negated { " NOT LIKE " } else { " LIKE " });
                self.predicate_operand(pattern, Side::Right);
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                self.predicate_operand(expr, Side::Left);
                self.push(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.predicate_operand(low, Side::Right);
                self.push(" AND ");
                self.predicate_operand(high, Side::Right);
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                self.predicate_operand(expr, Side::Left);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                self.list(list);
                self.push(")");
            }
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => {
                self.predicate_operand(expr, Side::Left);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                self.select(query);
                self.push(")");
            }
            Expr::Exists(query) => {
                self.push("EXISTS (");
                self.select(query);
                self.push(")");
            }
            Expr::Any(query) => {
                self.push("ANY (");
                self.select(query);
                self.push(")");
            }
            Expr::Subquery(query) => {
                self.push("(");
                self.select(query);
                self.push(")");
            }
            Expr::Case {
                branches,
                otherwise,
            } => {
                self.push("CASE");
                for (when, then) in branches {
                    self.push(" WHEN ");
                    self.expr(when);
                    self.push(" THEN ");
                    self.expr(then);
                }
                self.push(" ELSE ");
                self.expr(otherwise);
                self.push(" END");
            }
            Expr::Cast { expr, target } => {
                self.push("CAST(");
                self.expr(expr);
                self.push(" AS ");
                let type_name = self.dialect.cast_type_name(*target);
                self.push(type_name);
                self.push(")");
            }
            Expr::Function { function, args } => {
                self.push(function.as_str());
                self.push("(");
                self.list(args);
                self.push(")");
            }
            Expr::Aggregate(aggregate) => self.aggregate(aggregate),
            Expr::Dynamic { .. } => self.expr(expr),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) {
        if op == BinaryOp::Concat {
            if let Some(function) = self.dialect.concat_function() {
                self.push(function);
                self.push("(");
                self.list([left, right]);
                self.push(")");
                return;
            }
        }
        let (precedence, assoc) = (op.precedence(), op.associativity());
        self.operand(left, precedence, assoc, Side::Left);
        self.push(" ");
        self.push(op.as_str());
        self.push(" ");
        self.operand(right, precedence, assoc, Side::Right);
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) {
        self.push(op.as_str());
        let start = self.sql.len();
        self.operand(operand, op.precedence(), Associativity::Left, Side::Only);
        // `--` would start a comment.
        if op == UnaryOp::Neg && self.sql[start..].starts_with('-') {
            self.sql.insert(start, '(');
            self.push(")");
        }
    }

    fn is_distinct_from(&mut self, left: &Expr, right: &Expr, negated: bool) {
        if self.dialect.uses_null_safe_equal() {
            if !negated {
                self.push("NOT (");
            }
            self.predicate_operand(left, Side::Left);
            self.push(" <=> ");
            self.predicate_operand(right, Side::Right);
            if !negated {
                self.push(")");
            }
            return;
        }
        self.predicate_operand(left, Side::Left);
        self.push(if negated {
            " IS NOT DISTINCT FROM "
        } else {
            " IS DISTINCT FROM "
        });
        self.predicate_operand(right, Side::Right);
    }

    fn aggregate(&mut self, aggregate: &Aggregate) {
        self.push(aggregate.function().as_str());
        self.push("(");
        if aggregate.is_distinct() {
            self.push("DISTINCT ");
        }
        match aggregate.argument() {
            Some(argument) => self.expr(argument),
            None => self.push("*"),
        }
        self.push(")");
        if aggregate.is_windowed() {
            self.push(" OVER()");
        }
    }
}
