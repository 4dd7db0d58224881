#![allow(dead_code)]

use chrono::NaiveDateTime;
use sqlforge_core::{Dialect, Prepared, Query};
use sqlforge_derive::Table;

#[derive(Debug, Clone, Table)]
#[table(name = "users")]
pub struct User {
    #[column(primary_key, autoincrement)]
    pub id: i64,
    pub name: String,
    #[column(default = "0")]
    pub money: i64,
    pub nick: Option<String>,
    #[column(name = "created_at", default = "CURRENT_TIMESTAMP")]
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, Table)]
#[table(name = "orders")]
pub struct Order {
    #[column(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub total: f64,
    #[column(nullable)]
    pub note: String,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Runs the full pipeline and panics with the error if the statement is rejected.
pub fn prepare(query: &impl Query, dialect: &dyn Dialect) -> Prepared {
    init_tracing();
    query
        .to_sql(dialect)
        .unwrap_or_else(|e| panic!("statement rejected: {e}"))
}

pub fn sql(query: &impl Query, dialect: &dyn Dialect) -> String {
    prepare(query, dialect).sql
}
