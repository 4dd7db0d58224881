//! Cross-clause consistency rules.
//!
//! Checks run clause by clause in render order and the first violation is
//! returned. Within a statement the rules are:
//!
//! 1. every required table is provided, statically where the use is static
//! 2. aggregating selects only use grouped or aggregated values
//! 3. INSERT supplies every column that has no default
//! 4. UNION operands agree on their result rows, RETURNING does not aggregate
//! 5. ON CONFLICT has an action

use super::scope::{requirements, Provided};
use crate::ast::{
    Assignment, ConflictAction, Delete, Expr, Insert, InsertValues, Select, SelectColumn, Slot,
    TableExpr, Update, With,
};
use crate::error::{Clause, ConsistencyError};
use crate::schema::Table;

/// How column references to tables the statement does not provide are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outer {
    Closed,
    /// They belong to an enclosing query, which checks them.
    Deferred,
}

/// Which CTE names a FROM clause may reference.
#[derive(Debug, Clone)]
pub(crate) enum Ctes<'a> {
    /// Any name: the query is checked before it is placed under a WITH.
    Any,
    Known(Vec<&'a str>),
}

impl<'a> Ctes<'a> {
    fn knows(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Known(names) => names.contains(&name),
        }
    }

    fn with(&self, name: &'a str) -> Self {
        match self {
            Self::Any => Self::Any,
            Self::Known(names) => {
                let mut names = names.clone();
                names.push(name);
                Self::Known(names)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Env<'a> {
    outer: Outer,
    ctes: Ctes<'a>,
}

impl<'a> Env<'a> {
    pub(crate) const fn top_level() -> Self {
        Self {
            outer: Outer::Closed,
            ctes: Ctes::Known(Vec::new()),
        }
    }

    pub(crate) const fn detached() -> Self {
        Self {
            outer: Outer::Closed,
            ctes: Ctes::Any,
        }
    }

    const fn closed_with(ctes: Ctes<'a>) -> Self {
        Self {
            outer: Outer::Closed,
            ctes,
        }
    }

    fn nested(&self) -> Self {
        Self {
            outer: Outer::Deferred,
            ctes: self.ctes.clone(),
        }
    }

    fn closed(&self) -> Self {
        Self::closed_with(self.ctes.clone())
    }

    /// Checks the WITH clause and returns the environment of the statement body.
    fn enter(&self, with: &'a Slot<With>) -> Result<Self, ConsistencyError> {
        let mut ctes = self.ctes.clone();
        for cte in with.get().map_or(&[][..], |w| w.ctes.as_slice()) {
            check_select(&cte.query, &Env::closed_with(ctes.clone()))?;
            if let Some(step) = &cte.recursive {
                check_select(
                    &step.operand.query,
                    &Env::closed_with(ctes.with(&cte.name)),
                )?;
                check_union_row(&cte.query, &step.operand.query, 1)?;
            }
            ctes = ctes.with(&cte.name);
        }
        Ok(Self {
            outer: self.outer,
            ctes,
        })
    }
}

type Outcome = Result<(), ConsistencyError>;

/// Rule 1 for one expression. `dynamic` marks expressions that only render
/// when a dynamic condition holds.
fn check_scope(
    clause: Clause,
    expr: &Expr,
    dynamic: bool,
    provided: &Provided<'_>,
    env: &Env<'_>,
) -> Outcome {
    for query in nested_selects(expr) {
        check_select(query, &env.nested())?;
    }
    for requirement in requirements(expr) {
        let table = requirement.table;
        if provided.statics.contains(table) {
            continue;
        }
        if provided.dynamics.contains(table) {
            if dynamic || requirement.dynamic {
                continue;
            }
            return Err(ConsistencyError::DynamicTableInStaticClause {
                clause,
                table: String::from(table),
                expr: expr.to_string(),
            });
        }
        if env.outer == Outer::Closed {
            return Err(ConsistencyError::UnknownTable {
                clause,
                table: String::from(table),
                expr: expr.to_string(),
            });
        }
    }
    Ok(())
}

/// Sub-selects anywhere in the expression tree.
fn nested_selects(expr: &Expr) -> Vec<&Select> {
    let mut out = expr.subqueries();
    for child in expr.children() {
        out.extend(nested_selects(child));
    }
    out
}

/// Rule 1 for FROM: CTE references, derived tables and join conditions.
fn check_from(
    table: &TableExpr,
    dynamic: bool,
    provided: &Provided<'_>,
    env: &Env<'_>,
) -> Outcome {
    match table {
        TableExpr::Table(_) => Ok(()),
        TableExpr::Cte(name) if env.ctes.knows(name) => Ok(()),
        TableExpr::Cte(name) => Err(ConsistencyError::UnknownCte { name: name.clone() }),
        TableExpr::Derived(derived) => check_select(&derived.query, &env.closed()),
        TableExpr::Dynamic { inner, .. } => check_from(inner, true, provided, env),
        TableExpr::Join(join) => {
            check_from(&join.left, dynamic, provided, env)?;
            check_from(&join.right, dynamic, provided, env)?;
            match &join.on {
                Some(condition) => {
                    let dynamic = dynamic || matches!(join.right, TableExpr::Dynamic { .. });
                    check_scope(Clause::Join, condition, dynamic, provided, env)
                }
                None => Ok(()),
            }
        }
    }
}

pub(crate) fn check_select<'a>(select: &'a Select, env: &Env<'a>) -> Outcome {
    let Some(columns) = select.columns.get() else {
        return Err(ConsistencyError::NoSelectedColumns);
    };
    let env = env.enter(&select.with)?;
    let provided = select
        .from
        .get()
        .map(Provided::of_table_expr)
        .unwrap_or_default();

    for column in columns {
        check_scope(Clause::Columns, &column.expr, false, &provided, &env)?;
    }
    if let Some(from) = select.from.get() {
        check_from(from, false, &provided, &env)?;
    }
    if let Some(condition) = select.where_.get() {
        check_scope(Clause::Where, condition, false, &provided, &env)?;
    }
    for key in select.group_by_clause() {
        check_scope(Clause::GroupBy, key, false, &provided, &env)?;
    }
    if let Some(condition) = select.having.get() {
        check_scope(Clause::Having, condition, false, &provided, &env)?;
    }
    for entry in select.order_by.get().into_iter().flatten() {
        check_scope(Clause::OrderBy, &entry.expr, false, &provided, &env)?;
    }
    if let Some(limit) = select.limit.get() {
        check_scope(Clause::Limit, limit, false, &provided, &env)?;
    }
    if let Some(offset) = select.offset.get() {
        check_scope(Clause::Offset, offset, false, &provided, &env)?;
    }

    check_aggregates(select, columns)?;

    for (index, part) in select.unions.iter().enumerate() {
        check_select(&part.operand.query, &env)?;
        check_union_row(select, &part.operand.query, index + 1)?;
    }
    Ok(())
}

/// Rule 4: operand `index` (1-based) selects a row compatible with `left`.
fn check_union_row(left: &Select, operand: &Select, index: usize) -> Outcome {
    let wanted = left.result_columns();
    let given = operand.result_columns();
    if wanted.len() != given.len() {
        return Err(ConsistencyError::UnionColumnCount {
            operand: index,
            expected: wanted.len(),
            found: given.len(),
        });
    }
    for (position, ((_, expected), (_, found))) in wanted.iter().zip(&given).enumerate() {
        if !found.data_type.is_result_compatible_with(expected.data_type) {
            return Err(ConsistencyError::UnionColumnType {
                operand: index,
                column: position + 1,
                expected: *expected,
                found: *found,
            });
        }
    }
    Ok(())
}

/// Whether an aggregate that is not a window function appears in the tree.
fn contains_plain_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Aggregate(aggregate) if !aggregate.over => true,
        other => other.children().into_iter().any(contains_plain_aggregate),
    }
}

/// GROUP BY keys, split by whether they always render.
#[derive(Default)]
struct GroupKeys<'a> {
    statics: Vec<&'a Expr>,
    dynamics: Vec<&'a Expr>,
}

impl<'a> GroupKeys<'a> {
    fn of(keys: &'a [Expr]) -> Self {
        let mut out = Self::default();
        for key in keys {
            if key.is_dynamic() {
                out.dynamics.push(key.strip_dynamic());
            } else {
                out.statics.push(key);
            }
        }
        out
    }

    fn covers(&self, expr: &Expr, dynamic: bool) -> bool {
        self.statics.contains(&expr) || (dynamic && self.dynamics.contains(&expr))
    }

    /// Whether `expr` may appear in an aggregating select.
    fn allows(&self, expr: &Expr, dynamic: bool) -> bool {
        match expr {
            Expr::Dynamic { expr, .. } => self.allows(expr, true),
            Expr::Aggregate(aggregate) if !aggregate.over => true,
            _ if self.covers(expr, dynamic) => true,
            Expr::Column(_) => false,
            other => other
                .children()
                .into_iter()
                .all(|child| self.allows(child, dynamic)),
        }
    }
}

/// Rule 2.
fn check_aggregates(select: &Select, columns: &[SelectColumn]) -> Outcome {
    let grouped = select.group_by.is_present();
    let aggregating = grouped
        || columns.iter().any(|c| contains_plain_aggregate(&c.expr))
        || select.having.get().is_some_and(contains_plain_aggregate);
    if !aggregating {
        return Ok(());
    }
    let keys = GroupKeys::of(select.group_by_clause());
    if let Some(column) = columns.iter().find(|c| !keys.allows(&c.expr, false)) {
        let expr = column.expr.to_string();
        return Err(if grouped {
            ConsistencyError::NotGrouped {
                clause: Clause::Columns,
                expr,
            }
        } else {
            ConsistencyError::MixedAggregates { expr }
        });
    }
    match select.having.get() {
        Some(having) if !keys.allows(having, false) => Err(ConsistencyError::NotGrouped {
            clause: Clause::Having,
            expr: having.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_returning(
    returning: &Slot<Vec<SelectColumn>>,
    provided: &Provided<'_>,
    env: &Env<'_>,
) -> Outcome {
    let Some(columns) = returning.get() else {
        return Ok(());
    };
    for column in columns {
        check_scope(Clause::Returning, &column.expr, false, provided, env)?;
    }
    match columns.iter().find(|c| contains_plain_aggregate(&c.expr)) {
        Some(column) => Err(ConsistencyError::AggregateInReturning {
            expr: column.expr.to_string(),
        }),
        None => Ok(()),
    }
}

fn check_assignments(
    clause: Clause,
    assignments: &[Assignment],
    provided: &Provided<'_>,
    env: &Env<'_>,
) -> Outcome {
    for assignment in assignments {
        check_scope(
            clause,
            &assignment.value,
            assignment.is_dynamic(),
            provided,
            env,
        )?;
    }
    Ok(())
}

fn target_scope(table: &Table) -> Provided<'_> {
    let mut provided = Provided::default();
    provided.add(table.reference_name());
    provided
}

/// Rule 3.
fn check_required_columns(table: &Table, values: &InsertValues) -> Outcome {
    let definition = table.definition();
    let mut required = definition
        .columns()
        .iter()
        .filter(|c| c.is_required_for_insert());
    let assigned: Vec<&str> = match values {
        InsertValues::DefaultValues => {
            return required.next().map_or(Ok(()), |column| {
                Err(ConsistencyError::ColumnWithoutDefault {
                    table: String::from(definition.name()),
                    column: String::from(column.name()),
                })
            });
        }
        InsertValues::Set(assignments) => assignments
            .iter()
            .filter(|a| !a.is_dynamic())
            .map(|a| a.column.name())
            .collect(),
        InsertValues::Rows { columns, .. } => columns.iter().map(|c| c.name()).collect(),
    };
    required
        .find(|c| !assigned.contains(&c.name()))
        .map_or(Ok(()), |column| {
            Err(ConsistencyError::MissingRequiredColumn {
                table: String::from(definition.name()),
                column: String::from(column.name()),
            })
        })
}

pub(crate) fn check_insert<'a>(insert: &'a Insert, env: &Env<'a>) -> Outcome {
    let values = match insert.values.get() {
        Some(InsertValues::Rows { rows, .. }) if rows.is_empty() => None,
        other => other,
    };
    let Some(values) = values else {
        return Err(ConsistencyError::MissingInsertValues);
    };
    let env = env.enter(&insert.with)?;
    let provided = target_scope(&insert.table);

    match values {
        InsertValues::Set(assignments) => {
            check_assignments(Clause::Values, assignments, &provided, &env)?;
        }
        InsertValues::Rows { rows, .. } => {
            for value in rows.iter().flatten() {
                check_scope(Clause::Values, value, false, &provided, &env)?;
            }
        }
        InsertValues::DefaultValues => {}
    }
    let conflict = insert.on_conflict.get();
    if let Some(ConflictAction::DoUpdate(assignments)) = conflict.and_then(|c| c.action.as_ref()) {
        check_assignments(Clause::OnConflict, assignments, &provided, &env)?;
    }

    check_required_columns(&insert.table, values)?;
    check_returning(&insert.returning, &provided, &env)?;

    if conflict.is_some_and(|c| c.action.is_none()) {
        return Err(ConsistencyError::MissingConflictAction);
    }
    Ok(())
}

pub(crate) fn check_update<'a>(update: &'a Update, env: &Env<'a>) -> Outcome {
    let Some(assignments) = update
        .assignments
        .get()
        .filter(|assignments| assignments.iter().any(Assignment::is_active))
    else {
        return Err(ConsistencyError::MissingUpdateAssignments);
    };
    let Some(filter) = update.filter.get() else {
        return Err(ConsistencyError::MissingWhere {
            statement: "UPDATE",
        });
    };
    let env = env.enter(&update.with)?;
    let provided = target_scope(&update.table);
    check_assignments(Clause::Set, assignments, &provided, &env)?;
    if let Some(condition) = filter.condition() {
        check_scope(Clause::Where, condition, false, &provided, &env)?;
    }
    check_returning(&update.returning, &provided, &env)
}

pub(crate) fn check_delete<'a>(delete: &'a Delete, env: &Env<'a>) -> Outcome {
    let Some(filter) = delete.filter.get() else {
        return Err(ConsistencyError::MissingWhere {
            statement: "DELETE",
        });
    };
    let env = env.enter(&delete.with)?;
    let mut provided = target_scope(&delete.table);
    for table in delete.using.get().into_iter().flatten() {
        provided.add(table.reference_name());
    }
    if let Some(condition) = filter.condition() {
        check_scope(Clause::Where, condition, false, &provided, &env)?;
    }
    check_returning(&delete.returning, &provided, &env)
}
