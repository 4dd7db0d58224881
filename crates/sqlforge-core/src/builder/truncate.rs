//! TRUNCATE.

use crate::ast::Truncate;
use crate::schema::Table;

/// `TRUNCATE table`.
#[must_use]
pub fn truncate(table: impl Into<Table>) -> Truncate {
    Truncate {
        table: table.into(),
    }
}
