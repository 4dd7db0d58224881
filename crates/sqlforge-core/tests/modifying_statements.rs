//! INSERT, UPDATE, DELETE and TRUNCATE through the full pipeline.

mod common;

use common::{prepare, sql, Order, User};
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlforge_core::builder::{
    delete_from, dynamic, excluded, insert_into, null, truncate, update, Arithmetic, Comparable,
    Logical,
};
use sqlforge_core::dialect::{Generic, MySql, Postgres, Sqlite};
use sqlforge_core::types::{DataType, ValueType};
use sqlforge_core::{
    CompatibilityError, ConsistencyError, Error, Parameter, Query, SerializeOptions, SqlValue,
};

#[test]
fn test_update_end_to_end() {
    let users = User::table();
    let statement = update(&users)
        .set(users.money().assign(42))
        .and_then(|s| s.where_(users.id().eq(7)))
        .unwrap();
    let prepared = prepare(&statement, &Generic);
    assert_eq!(prepared.sql, "UPDATE users SET money = ? WHERE id = ?");
    assert_eq!(
        prepared.parameters,
        vec![
            Parameter {
                ordinal: 1,
                name: None,
                value_type: ValueType::of(DataType::Integral),
                value: Some(SqlValue::Int(42)),
            },
            Parameter {
                ordinal: 2,
                name: None,
                value_type: ValueType::of(DataType::Integral),
                value: Some(SqlValue::Int(7)),
            },
        ]
    );
}

#[test]
fn test_prepared_as_json() {
    let users = User::table();
    let statement = update(&users)
        .set(users.money().assign(42))
        .and_then(|s| s.where_(users.id().eq(7)))
        .unwrap();
    let prepared = prepare(&statement, &Postgres);
    assert_eq!(
        serde_json::to_value(&prepared).unwrap(),
        json!({
            "sql": "UPDATE users SET money = $1 WHERE id = $2",
            "parameters": [
                {
                    "ordinal": 1,
                    "name": null,
                    "value_type": { "data_type": "integral", "nullable": false },
                    "value": { "type": "int", "value": 42 }
                },
                {
                    "ordinal": 2,
                    "name": null,
                    "value_type": { "data_type": "integral", "nullable": false },
                    "value": { "type": "int", "value": 7 }
                }
            ]
        })
    );
}

#[test]
fn test_inline_values() {
    let users = User::table();
    let statement = update(&users)
        .set(users.name().assign("O'Hara"))
        .and_then(|s| s.where_(users.id().eq(7)))
        .unwrap();
    let options = SerializeOptions {
        inline_values: true,
    };
    let prepared = statement.to_sql_with(&Generic, options).unwrap();
    assert_eq!(prepared.sql, "UPDATE users SET name = 'O''Hara' WHERE id = 7");
    assert!(prepared.parameters.is_empty());

    let prepared = statement.to_sql_with(&MySql, options).unwrap();
    assert_eq!(prepared.sql, "UPDATE users SET name = 'O\\'Hara' WHERE id = 7");
}

#[test]
fn test_update_needs_a_filter_decision() {
    let users = User::table();
    let statement = update(&users).set(users.money().assign(0)).unwrap();
    assert_eq!(
        statement.to_sql(&Generic).unwrap_err(),
        Error::Consistency(ConsistencyError::MissingWhere {
            statement: "UPDATE"
        })
    );

    let statement = update(&users)
        .set((
            dynamic(false, users.name().assign("x")),
            users.money().assign(users.money().plus(1)),
        ))
        .and_then(|s| s.unconditionally())
        .unwrap();
    assert_eq!(sql(&statement, &Generic), "UPDATE users SET money = money + ?");
}

#[test]
fn test_insert_required_columns() {
    let users = User::table();
    let insert = insert_into(&users)
        .set((users.name().assign("alice"), users.nick().assign(null())))
        .unwrap();
    assert_eq!(
        sql(&insert, &Generic),
        "INSERT INTO users (name, nick) VALUES (?, NULL)"
    );

    let insert = insert_into(&users).set(users.nick().assign("al")).unwrap();
    assert_eq!(
        insert.validate(),
        Err(ConsistencyError::MissingRequiredColumn {
            table: String::from("users"),
            column: String::from("name")
        })
    );

    let insert = insert_into(&users).default_values().unwrap();
    assert!(matches!(
        insert.validate(),
        Err(ConsistencyError::ColumnWithoutDefault { .. })
    ));
}

#[test]
fn test_insert_rows() {
    let orders = Order::table();
    let insert = insert_into(&orders)
        .columns((orders.id(), orders.user_id(), orders.total()))
        .and_then(|i| i.values((1, 7, 9.5)))
        .and_then(|i| i.values((2, 7, 20.0)))
        .unwrap();
    let prepared = prepare(&insert, &Postgres);
    assert_eq!(
        prepared.sql,
        "INSERT INTO orders (id, user_id, total) VALUES ($1, $2, $3), ($4, $5, $6)"
    );
    assert_eq!(prepared.parameters[5].value, Some(SqlValue::Float(20.0)));
}

#[test]
fn test_upsert_with_returning() {
    let users = User::table();
    let insert = insert_into(&users)
        .set((users.id().assign(1), users.name().assign("alice")))
        .and_then(|i| i.on_conflict(users.id()))
        .and_then(|i| i.do_update(users.name().assign(excluded(&users.name()))))
        .and_then(|i| i.returning((users.id(), users.money())))
        .unwrap();
    assert_eq!(
        sql(&insert, &Postgres),
        "INSERT INTO users (id, name) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET name = excluded.name RETURNING id, money"
    );
    assert_eq!(
        sql(&insert, &Sqlite::default()),
        "INSERT INTO users (id, name) VALUES (?, ?) \
         ON CONFLICT (id) DO UPDATE SET name = excluded.name RETURNING id, money"
    );
    let err = insert.to_sql(&MySql).unwrap_err();
    assert!(matches!(
        err,
        Error::Compatibility(CompatibilityError {
            rule: "mysql.on_conflict",
            ..
        })
    ));
}

#[test]
fn test_delete_using() {
    let (users, orders) = (User::table(), Order::table());
    let delete = delete_from(&orders)
        .using((&users,))
        .and_then(|d| {
            d.where_(
                orders
                    .user_id()
                    .eq(users.id())
                    .and(users.name().eq("mallory")),
            )
        })
        .unwrap();
    assert_eq!(
        sql(&delete, &Postgres),
        "DELETE FROM orders USING users \
         WHERE orders.user_id = users.id AND users.name = $1"
    );
    let err = delete.to_sql(&Sqlite::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "sqlite3: SQLite does not support DELETE ... USING"
    );
}

#[test]
fn test_delete_and_truncate_everything() {
    let orders = Order::table();
    let delete = delete_from(&orders).unconditionally().unwrap();
    assert_eq!(sql(&delete, &Sqlite::default()), "DELETE FROM orders");

    let statement = truncate(&orders);
    assert_eq!(sql(&statement, &Postgres), "TRUNCATE orders");
    assert!(statement.check_dialect(&Sqlite::default()).is_err());
}
