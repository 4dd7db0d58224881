//! Consistency validation of complete statements.
//!
//! Composition already rejects malformed clauses one call at a time. What it
//! cannot see is how clauses relate: whether a column's table is in FROM,
//! whether selected columns are grouped, whether an INSERT covers every
//! required column. [`validate`] walks the finished statement and reports the
//! first rule it breaks.

mod consistency;
mod scope;

use consistency::{check_delete, check_insert, check_select, check_update, Env};
use tracing::trace;

use crate::ast::{Select, StatementRef};
use crate::error::ConsistencyError;

pub use scope::column_tables;

/// Checks a statement for cross-clause consistency.
///
/// # Errors
///
/// Returns the first [`ConsistencyError`] found, checking clauses in the
/// order they render.
pub fn validate(statement: StatementRef<'_>) -> Result<(), ConsistencyError> {
    trace!(statement = statement.kind(), "validating");
    let env = Env::top_level();
    match statement {
        StatementRef::Select(select) => check_select(select, &env),
        StatementRef::Insert(insert) => check_insert(insert, &env),
        StatementRef::Update(update) => check_update(update, &env),
        StatementRef::Delete(delete) => check_delete(delete, &env),
        StatementRef::Truncate(_) => Ok(()),
    }
}

/// Checks a select that is about to become a derived table or a CTE.
///
/// References to CTEs are accepted since the enclosing WITH is not known yet.
pub(crate) fn validate_select(select: &Select) -> Result<(), ConsistencyError> {
    check_select(select, &Env::detached())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{DataType, Update, ValueType};
    use crate::builder::{
        count, count_star, cte, delete_from, dynamic, exists, insert_into, select, sum, truncate,
        update, Aliasable, Comparable, Joinable, Windowable,
    };
    use crate::error::Clause;
    use crate::schema::{ColumnDef, ColumnRef, Table, TableDef};

    fn users() -> Table {
        Table::new(
            TableDef::new("users")
                .column(ColumnDef::new("id", DataType::Integral).primary_key().auto_increment())
                .column(ColumnDef::new("name", DataType::Text))
                .column(ColumnDef::new("money", DataType::Integral).default_value())
                .column(ColumnDef::new("nick", DataType::Text).nullable()),
        )
    }

    fn orders() -> Table {
        Table::new(
            TableDef::new("orders")
                .column(ColumnDef::new("id", DataType::Integral).primary_key())
                .column(ColumnDef::new("user_id", DataType::Integral))
                .column(ColumnDef::new("total", DataType::Integral)),
        )
    }

    fn col(table: &Table, name: &str) -> ColumnRef {
        table.column(name).unwrap()
    }

    fn check(statement: StatementRef<'_>) -> Result<(), ConsistencyError> {
        validate(statement)
    }

    #[test]
    fn test_select_needs_columns() {
        assert_eq!(
            check(StatementRef::Select(&Select::new())),
            Err(ConsistencyError::NoSelectedColumns)
        );
    }

    #[test]
    fn test_column_of_missing_table() {
        let (u, o) = (users(), orders());
        let query = select(col(&u, "id"))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.where_(col(&o, "total").gt(5)))
            .unwrap();
        let err = check(StatementRef::Select(&query)).unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::UnknownTable { clause: Clause::Where, ref table, .. } if table == "orders"
        ));
    }

    #[test]
    fn test_dynamic_join_requires_dynamic_use() {
        let (u, o) = (users(), orders());
        let join = (&u)
            .left_outer_join(dynamic(true, &o))
            .and_then(|j| j.on(col(&o, "user_id").eq(col(&u, "id"))))
            .unwrap();

        let static_use = select((col(&u, "id"), col(&o, "total")))
            .and_then(|s| s.from(join.clone()))
            .unwrap();
        let err = check(StatementRef::Select(&static_use)).unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::DynamicTableInStaticClause { clause: Clause::Columns, .. }
        ));

        let dynamic_use = select((col(&u, "id"), dynamic(true, col(&o, "total"))))
            .and_then(|s| s.from(join))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&dynamic_use)), Ok(()));
    }

    #[test]
    fn test_correlated_subquery_is_resolved_outside() {
        let (u, o) = (users(), orders());
        let inner = select(col(&o, "id"))
            .and_then(|s| s.from(&o))
            .and_then(|s| s.where_(col(&o, "user_id").eq(col(&u, "id"))))
            .unwrap();
        let outer = select(col(&u, "name"))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.where_(exists(inner.clone())))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&outer)), Ok(()));

        // Without `users` in the outer FROM the reference dangles.
        let dangling = select(col(&o, "total"))
            .and_then(|s| s.from(&o))
            .and_then(|s| s.where_(exists(inner)))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Select(&dangling)),
            Err(ConsistencyError::UnknownTable { clause: Clause::Where, .. })
        ));
    }

    #[test]
    fn test_group_by_rules() {
        let u = users();
        let grouped = select((col(&u, "name"), count(col(&u, "id")).as_("n")))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.group_by(col(&u, "name")))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&grouped)), Ok(()));

        let ungrouped = select((col(&u, "money"), count(col(&u, "id")).as_("n")))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.group_by(col(&u, "name")))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Select(&ungrouped)),
            Err(ConsistencyError::NotGrouped { clause: Clause::Columns, .. })
        ));

        let mixed = select((col(&u, "name"), count_star().as_("n")))
            .and_then(|s| s.from(&u))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Select(&mixed)),
            Err(ConsistencyError::MixedAggregates { .. })
        ));

        let having = select(col(&u, "name"))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.group_by(col(&u, "name")))
            .and_then(|s| s.having(col(&u, "money").gt(3)))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Select(&having)),
            Err(ConsistencyError::NotGrouped { clause: Clause::Having, .. })
        ));
    }

    #[test]
    fn test_window_aggregate_does_not_aggregate() {
        let u = users();
        let query = select((col(&u, "name"), sum(col(&u, "money")).over().as_("total")))
            .and_then(|s| s.from(&u))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&query)), Ok(()));
    }

    #[test]
    fn test_dynamic_group_key_only_covers_dynamic_columns() {
        let u = users();
        let query = select((col(&u, "name"), count_star().as_("n")))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.group_by(dynamic(true, col(&u, "name"))))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Select(&query)),
            Err(ConsistencyError::NotGrouped { .. })
        ));

        let query = select((dynamic(true, col(&u, "name")), count_star().as_("n")))
            .and_then(|s| s.from(&u))
            .and_then(|s| s.group_by(dynamic(true, col(&u, "name"))))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&query)), Ok(()));
    }

    #[test]
    fn test_union_rows_must_agree() {
        let (u, o) = (users(), orders());
        let left = select(col(&u, "id")).and_then(|s| s.from(&u)).unwrap();

        let wide = select((col(&o, "id"), col(&o, "total")))
            .and_then(|s| s.from(&o))
            .unwrap();
        let err = left.clone().union_all(wide).map(|q| check(StatementRef::Select(&q)));
        assert_eq!(
            err.unwrap(),
            Err(ConsistencyError::UnionColumnCount {
                operand: 1,
                expected: 1,
                found: 2
            })
        );

        let text = select(col(&u, "name")).and_then(|s| s.from(&u)).unwrap();
        let query = left.clone().union_distinct(text).unwrap();
        assert_eq!(
            check(StatementRef::Select(&query)),
            Err(ConsistencyError::UnionColumnType {
                operand: 1,
                column: 1,
                expected: ValueType::of(DataType::Integral),
                found: ValueType::of(DataType::Text),
            })
        );

        let same = select(col(&o, "id")).and_then(|s| s.from(&o)).unwrap();
        let query = left.union_all(same).unwrap();
        assert_eq!(check(StatementRef::Select(&query)), Ok(()));
    }

    #[test]
    fn test_cte_must_be_defined() {
        let u = users();
        let rich = cte("rich")
            .as_(
                select(col(&u, "id"))
                    .and_then(|s| s.from(&u))
                    .and_then(|s| s.where_(col(&u, "money").gt(100)))
                    .unwrap(),
            )
            .unwrap();
        let id = rich.column("id").unwrap();

        let without = select(id.clone()).and_then(|s| s.from(&rich)).unwrap();
        assert_eq!(
            check(StatementRef::Select(&without)),
            Err(ConsistencyError::UnknownCte {
                name: String::from("rich")
            })
        );

        let with = select(id)
            .and_then(|s| s.from(&rich))
            .and_then(|s| s.with(rich.clone()))
            .unwrap();
        assert_eq!(check(StatementRef::Select(&with)), Ok(()));
    }

    #[test]
    fn test_insert_requires_columns_without_default() {
        let u = users();
        let insert = insert_into(&u).set(col(&u, "money").assign(5)).unwrap();
        assert_eq!(
            check(StatementRef::Insert(&insert)),
            Err(ConsistencyError::MissingRequiredColumn {
                table: String::from("users"),
                column: String::from("name")
            })
        );

        let dynamic_name = insert_into(&u)
            .set(dynamic(true, col(&u, "name").assign("x")))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Insert(&dynamic_name)),
            Err(ConsistencyError::MissingRequiredColumn { .. })
        ));

        let defaults = insert_into(&u).default_values().unwrap();
        assert_eq!(
            check(StatementRef::Insert(&defaults)),
            Err(ConsistencyError::ColumnWithoutDefault {
                table: String::from("users"),
                column: String::from("name")
            })
        );

        let complete = insert_into(&u).set(col(&u, "name").assign("x")).unwrap();
        assert_eq!(check(StatementRef::Insert(&complete)), Ok(()));
    }

    #[test]
    fn test_insert_without_values() {
        let insert = insert_into(users());
        assert_eq!(
            check(StatementRef::Insert(&insert)),
            Err(ConsistencyError::MissingInsertValues)
        );
        let u = users();
        let columns_only = insert_into(&u).columns(col(&u, "name")).unwrap();
        assert_eq!(
            check(StatementRef::Insert(&columns_only)),
            Err(ConsistencyError::MissingInsertValues)
        );
    }

    #[test]
    fn test_on_conflict_needs_action() {
        let u = users();
        let insert = insert_into(&u)
            .set(col(&u, "name").assign("x"))
            .and_then(|i| i.on_conflict(col(&u, "id")))
            .unwrap();
        assert_eq!(
            check(StatementRef::Insert(&insert)),
            Err(ConsistencyError::MissingConflictAction)
        );
        let insert = insert.do_nothing().unwrap();
        assert_eq!(check(StatementRef::Insert(&insert)), Ok(()));
    }

    #[test]
    fn test_update_and_delete_need_filter_decision() {
        let u = users();
        let update = update(&u).set(col(&u, "money").assign(1)).unwrap();
        assert_eq!(
            check(StatementRef::Update(&update)),
            Err(ConsistencyError::MissingWhere {
                statement: "UPDATE"
            })
        );
        let update = update.unconditionally().unwrap();
        assert_eq!(check(StatementRef::Update(&update)), Ok(()));

        let delete = delete_from(&u);
        assert_eq!(
            check(StatementRef::Delete(&delete)),
            Err(ConsistencyError::MissingWhere {
                statement: "DELETE"
            })
        );
    }

    #[test]
    fn test_update_with_only_absent_assignments() {
        let u = users();
        let update = update(&u)
            .set(dynamic(false, col(&u, "money").assign(1)))
            .and_then(Update::unconditionally)
            .unwrap();
        assert_eq!(
            check(StatementRef::Update(&update)),
            Err(ConsistencyError::MissingUpdateAssignments)
        );
    }

    #[test]
    fn test_delete_using_provides_tables() {
        let (u, o) = (users(), orders());
        let delete = delete_from(&o)
            .using(u.clone())
            .and_then(|d| d.where_(col(&o, "user_id").eq(col(&u, "id"))))
            .unwrap();
        assert_eq!(check(StatementRef::Delete(&delete)), Ok(()));

        let without = delete_from(&o)
            .where_(col(&o, "user_id").eq(col(&u, "id")))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Delete(&without)),
            Err(ConsistencyError::UnknownTable { .. })
        ));
    }

    #[test]
    fn test_returning_must_not_aggregate() {
        let u = users();
        let update = update(&u)
            .set(col(&u, "money").assign(1))
            .and_then(Update::unconditionally)
            .and_then(|s| s.returning(count(col(&u, "id")).as_("n")))
            .unwrap();
        assert!(matches!(
            check(StatementRef::Update(&update)),
            Err(ConsistencyError::AggregateInReturning { .. })
        ));
    }

    #[test]
    fn test_truncate_is_always_consistent() {
        assert_eq!(check(StatementRef::Truncate(&truncate(users()))), Ok(()));
    }
}
