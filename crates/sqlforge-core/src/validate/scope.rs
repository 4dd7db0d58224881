//! Provided and required table sets.
//!
//! A statement provides the tables of its FROM tree (or its target table),
//! split into statically and dynamically provided ones. Its expressions
//! require the tables their column references name. Sub-selects contribute
//! the requirements they cannot satisfy themselves.

use std::collections::BTreeSet;

use crate::ast::{Expr, Select, TableExpr};

/// Reference names of the tables a statement provides.
#[derive(Debug, Clone, Default)]
pub(crate) struct Provided<'a> {
    pub statics: BTreeSet<&'a str>,
    pub dynamics: BTreeSet<&'a str>,
}

impl<'a> Provided<'a> {
    pub(crate) fn of_table_expr(table: &'a TableExpr) -> Self {
        let mut provided = Self::default();
        provided.collect(table, false);
        provided
    }

    fn collect(&mut self, table: &'a TableExpr, dynamic: bool) {
        match table {
            TableExpr::Join(join) => {
                self.collect(&join.left, dynamic);
                self.collect(&join.right, dynamic);
            }
            TableExpr::Dynamic { inner, .. } => self.collect(inner, true),
            other => {
                let names = if dynamic {
                    &mut self.dynamics
                } else {
                    &mut self.statics
                };
                names.extend(other.reference_names());
            }
        }
    }

    pub(crate) fn add(&mut self, name: &'a str) {
        self.statics.insert(name);
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.statics.contains(name) || self.dynamics.contains(name)
    }
}

/// A table an expression needs, and whether it is only needed dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Requirement<'a> {
    pub table: &'a str,
    pub dynamic: bool,
}

/// Tables required by `expr`, including those its sub-selects leave open.
pub(crate) fn requirements(expr: &Expr) -> Vec<Requirement<'_>> {
    let mut out = Vec::new();
    collect_requirements(expr, false, &mut out);
    out
}

fn collect_requirements<'a>(expr: &'a Expr, dynamic: bool, out: &mut Vec<Requirement<'a>>) {
    match expr {
        Expr::Column(column) => out.push(Requirement {
            table: column.table(),
            dynamic,
        }),
        Expr::Dynamic { expr, .. } => collect_requirements(expr, true, out),
        other => {
            for query in other.subqueries() {
                out.extend(
                    external_tables(query)
                        .into_iter()
                        .map(|table| Requirement { table, dynamic }),
                );
            }
            for child in other.children() {
                collect_requirements(child, dynamic, out);
            }
        }
    }
}

/// Reference names of the tables a column-referencing expression touches,
/// without descending into sub-selects.
pub fn column_tables(expr: &Expr) -> Vec<&str> {
    let mut tables = Vec::new();
    collect_column_tables(expr, &mut tables);
    tables
}

fn collect_column_tables<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    if let Expr::Column(column) = expr {
        if !out.contains(&column.table()) {
            out.push(column.table());
        }
    }
    for child in expr.children() {
        collect_column_tables(child, out);
    }
}

/// Every expression of a select that is evaluated in its own scope.
pub(crate) fn select_expressions(select: &Select) -> Vec<&Expr> {
    let mut exprs: Vec<&Expr> = select.selected_columns().iter().map(|c| &c.expr).collect();
    if let Some(from) = select.from.get() {
        join_conditions(from, &mut exprs);
    }
    exprs.extend(select.where_.get());
    exprs.extend(select.group_by_clause());
    exprs.extend(select.having.get());
    if let Some(order_by) = select.order_by.get() {
        exprs.extend(order_by.iter().map(|o| &o.expr));
    }
    exprs.extend(select.limit.get());
    exprs.extend(select.offset.get());
    exprs
}

fn join_conditions<'a>(table: &'a TableExpr, out: &mut Vec<&'a Expr>) {
    match table {
        TableExpr::Join(join) => {
            join_conditions(&join.left, out);
            join_conditions(&join.right, out);
            out.extend(join.on.as_ref());
        }
        TableExpr::Dynamic { inner, .. } => join_conditions(inner, out),
        _ => {}
    }
}

/// Tables a select references but does not provide itself: the outer
/// references of a correlated sub-select.
pub(crate) fn external_tables(select: &Select) -> BTreeSet<&str> {
    let provided = select
        .from
        .get()
        .map(Provided::of_table_expr)
        .unwrap_or_default();
    let mut tables: BTreeSet<&str> = select_expressions(select)
        .into_iter()
        .flat_map(requirements)
        .map(|r| r.table)
        .filter(|table| !provided.contains(table))
        .collect();
    for part in select.unions() {
        tables.extend(external_tables(&part.operand.query));
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::builder::{dynamic, exists, select, Comparable, Joinable};
    use crate::schema::{ColumnDef, Table, TableDef};

    fn table(name: &str) -> Table {
        Table::new(TableDef::new(name).column(ColumnDef::new("id", DataType::Integral)))
    }

    #[test]
    fn test_provided_splits_dynamic_tables() {
        let (a, b) = (table("a"), table("b"));
        let on = a.column("id").unwrap().eq(b.column("id").unwrap());
        let from: TableExpr = (&a)
            .join(dynamic(true, &b))
            .unwrap()
            .on(on)
            .unwrap()
            .into();
        let provided = Provided::of_table_expr(&from);
        assert!(provided.statics.contains("a"));
        assert!(provided.dynamics.contains("b"));
        assert!(!provided.statics.contains("b"));
    }

    #[test]
    fn test_correlated_subquery_requirements() {
        let (a, b) = (table("a"), table("b"));
        let inner = select(b.column("id").unwrap())
            .and_then(|s| s.from(&b))
            .and_then(|s| s.where_(b.column("id").unwrap().eq(a.column("id").unwrap())))
            .unwrap();
        assert_eq!(external_tables(&inner).into_iter().collect::<Vec<_>>(), vec!["a"]);

        let expr = dynamic(true, exists(inner));
        assert_eq!(
            requirements(&expr),
            vec![Requirement {
                table: "a",
                dynamic: true
            }]
        );
    }
}
