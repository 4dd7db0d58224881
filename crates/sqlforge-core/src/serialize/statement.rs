//! Clause and statement rendering.
//!
//! Columns are qualified with their table inside selects. INSERT, UPDATE and
//! DELETE name a single target, so their columns are written bare unless a
//! DELETE brings in more tables with USING.

use super::Context;
use crate::ast::{
    Assignment, ConflictAction, Cte, Delete, Expr, Filter, Insert, InsertValues, OnConflict,
    OrderBy, Select, SelectColumn, Slot, TableExpr, Truncate, Update, With,
};
use crate::schema::Table;

/// The expression unless it is an absent dynamic part.
fn present(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Dynamic {
            condition: false, ..
        } => None,
        Expr::Dynamic {
            condition: true,
            expr,
        } => present(expr),
        other => Some(other),
    }
}

impl Context<'_> {
    pub(super) fn select(&mut self, select: &Select) {
        let outer = std::mem::replace(&mut self.qualify, true);
        self.with(&select.with);
        self.push("SELECT ");
        if let Some(flag) = select.flag {
            self.push(flag.as_str());
            self.push(" ");
        }
        self.select_columns(select.selected_columns());
        if let Some(from) = select.from.get() {
            self.push(" FROM ");
            self.table_expr(from);
        }
        self.condition(" WHERE ", select.where_.get());
        let keys: Vec<&Expr> = select.group_by_clause().iter().filter_map(present).collect();
        if !keys.is_empty() {
            self.push(" GROUP BY ");
            self.list(keys);
        }
        self.condition(" HAVING ", select.having.get());
        if let Some(entries) = select.order_by.get() {
            self.order_by(entries);
        }
        self.limit_offset(select.limit.get(), select.offset.get());
        for part in select.unions() {
            if part.operand().is_active() {
                self.push(self.dialect.union_keyword(part.kind()));
                self.select(part.operand().query());
            }
        }
        self.qualify = outer;
    }

    fn with(&mut self, with: &Slot<With>) {
        let Some(with) = with.get() else {
            return;
        };
        self.push(if with.is_recursive() {
            "WITH RECURSIVE "
        } else {
            "WITH "
        });
        for (index, cte) in with.ctes().iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.cte(cte);
        }
        self.push(" ");
    }

    fn cte(&mut self, cte: &Cte) {
        self.identifier(cte.name());
        self.push(" AS (");
        self.select(cte.query());
        if let Some(step) = &cte.recursive {
            self.push(self.dialect.union_keyword(step.kind()));
            self.select(step.operand().query());
        }
        self.push(")");
    }

    fn select_columns(&mut self, columns: &[SelectColumn]) {
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.select_column(column);
        }
    }

    /// An absent dynamic column keeps its place in the row as `NULL AS name`.
    fn select_column(&mut self, column: &SelectColumn) {
        let expr = column.expr();
        let alias = match present(expr) {
            None => {
                self.push("NULL");
                column.name()
            }
            Some(expr) => {
                self.expr(expr);
                match expr {
                    Expr::Aggregate(_) => column.name(),
                    _ => column.alias(),
                }
            }
        };
        if let Some(alias) = alias {
            self.push(" AS ");
            self.identifier(alias);
        }
    }

    fn table_expr(&mut self, table: &TableExpr) {
        match table {
            TableExpr::Table(table) => self.table(table),
            TableExpr::Derived(derived) => {
                self.push("(");
                self.select(derived.query());
                self.push(") AS ");
                self.identifier(derived.name());
            }
            TableExpr::Cte(name) => self.identifier(name),
            TableExpr::Dynamic { inner, .. } => self.table_expr(inner),
            TableExpr::Join(join) => {
                self.table_expr(join.left());
                let right = join.right();
                if matches!(
                    right,
                    TableExpr::Dynamic {
                        condition: false,
                        ..
                    }
                ) {
                    return;
                }
                self.push(join.kind().as_str());
                let nested = match right {
                    TableExpr::Dynamic { inner, .. } => inner.as_ref(),
                    other => other,
                };
                if matches!(nested, TableExpr::Join(_)) {
                    self.push("(");
                    self.table_expr(right);
                    self.push(")");
                } else {
                    self.table_expr(right);
                }
                self.condition(" ON ", join.condition());
            }
        }
    }

    fn table(&mut self, table: &Table) {
        self.identifier(table.name());
        if let Some(alias) = table.alias() {
            self.push(" AS ");
            self.identifier(alias);
        }
    }

    /// Renders `keyword condition` unless nothing of the condition is present.
    fn condition(&mut self, keyword: &str, condition: Option<&Expr>) {
        if let Some(condition) = condition.and_then(Expr::effective) {
            self.push(keyword);
            self.expr(condition);
        }
    }

    fn order_by(&mut self, entries: &[OrderBy]) {
        let entries: Vec<(&Expr, &OrderBy)> = entries
            .iter()
            .filter_map(|entry| present(entry.expr()).map(|expr| (expr, entry)))
            .collect();
        if entries.is_empty() {
            return;
        }
        self.push(" ORDER BY ");
        for (index, (expr, entry)) in entries.into_iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.expr(expr);
            if let Some(direction) = entry.direction() {
                self.push(" ");
                self.push(direction.as_str());
            }
        }
    }

    fn limit_offset(&mut self, limit: Option<&Expr>, offset: Option<&Expr>) {
        match (limit, offset) {
            (Some(limit), _) => {
                self.push(" LIMIT ");
                self.expr(limit);
            }
            (None, Some(_)) => {
                if let Some(all) = self.dialect.limit_for_offset_only() {
                    self.push(" LIMIT ");
                    self.push(all);
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = offset {
            self.push(" OFFSET ");
            self.expr(offset);
        }
    }

    /// `a = x, b = y` for the active assignments. Targets are never qualified.
    fn assignments(&mut self, assignments: &[Assignment]) {
        let active = assignments.iter().filter(|a| a.is_active());
        for (index, assignment) in active.enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.identifier(assignment.column().name());
            self.push(" = ");
            self.expr(assignment.value());
        }
    }

    fn returning(&mut self, returning: &Slot<Vec<SelectColumn>>) {
        if let Some(columns) = returning.get() {
            let outer = std::mem::replace(&mut self.qualify, false);
            self.push(" RETURNING ");
            self.select_columns(columns);
            self.qualify = outer;
        }
    }

    fn filter(&mut self, filter: Option<&Filter>) {
        self.condition(" WHERE ", filter.and_then(Filter::condition));
    }

    pub(super) fn insert(&mut self, insert: &Insert) {
        self.qualify = false;
        self.with(&insert.with);
        self.push("INSERT INTO ");
        self.identifier(insert.table().name());
        match insert.values.get() {
            Some(InsertValues::Set(assignments)) => {
                let active: Vec<&Assignment> =
                    assignments.iter().filter(|a| a.is_active()).collect();
                if active.is_empty() {
                    self.push(self.dialect.default_values());
                } else {
                    self.push(" (");
                    for (index, assignment) in active.iter().enumerate() {
                        if index > 0 {
                            self.push(", ");
                        }
                        self.identifier(assignment.column().name());
                    }
                    self.push(") VALUES (");
                    self.list(active.iter().map(|a| a.value()));
                    self.push(")");
                }
            }
            Some(InsertValues::Rows { columns, rows }) => {
                self.push(" (");
                for (index, column) in columns.iter().enumerate() {
                    if index > 0 {
                        self.push(", ");
                    }
                    self.identifier(column.name());
                }
                self.push(") VALUES ");
                for (index, row) in rows.iter().enumerate() {
                    if index > 0 {
                        self.push(", ");
                    }
                    self.push("(");
                    self.list(row);
                    self.push(")");
                }
            }
            Some(InsertValues::DefaultValues) | None => {
                self.push(self.dialect.default_values());
            }
        }
        if let Some(conflict) = insert.on_conflict.get() {
            self.on_conflict(conflict);
        }
        self.returning(&insert.returning);
    }

    fn on_conflict(&mut self, conflict: &OnConflict) {
        self.push(" ON CONFLICT");
        if !conflict.targets().is_empty() {
            self.push(" (");
            for (index, target) in conflict.targets().iter().enumerate() {
                if index > 0 {
                    self.push(", ");
                }
                self.identifier(target.name());
            }
            self.push(")");
        }
        match conflict.action() {
            Some(ConflictAction::DoUpdate(assignments))
                if assignments.iter().any(Assignment::is_active) =>
            {
                self.push(" DO UPDATE SET ");
                self.assignments(assignments);
            }
            Some(_) | None => self.push(" DO NOTHING"),
        }
    }

    pub(super) fn update(&mut self, update: &Update) {
        self.qualify = false;
        self.with(&update.with);
        self.push("UPDATE ");
        self.table(update.table());
        self.push(" SET ");
        if let Some(assignments) = update.assignments.get() {
            self.assignments(assignments);
        }
        self.filter(update.filter.get());
        self.returning(&update.returning);
    }

    pub(super) fn delete(&mut self, delete: &Delete) {
        self.qualify = delete.using.is_present();
        self.with(&delete.with);
        self.push("DELETE FROM ");
        self.table(delete.table());
        if let Some(tables) = delete.using.get() {
            self.push(" USING ");
            for (index, table) in tables.iter().enumerate() {
                if index > 0 {
                    self.push(", ");
                }
                self.table(table);
            }
        }
        self.filter(delete.filter.get());
        self.returning(&delete.returning);
    }

    pub(super) fn truncate(&mut self, truncate: &Truncate) {
        self.push("TRUNCATE ");
        self.identifier(truncate.table().name());
    }
}
