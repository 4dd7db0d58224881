//! SQL text rendering and parameter extraction.
//!
//! Serialization is a total function of a validated statement and a
//! dialect: it cannot fail. Every bound value becomes a placeholder and an
//! entry of the parameter list, numbered left to right in the order the
//! placeholders appear in the text.
//!
//! ```rust
//! use sqlforge_core::ast::{DataType, StatementRef};
//! use sqlforge_core::builder::{select, Comparable};
//! use sqlforge_core::dialect::Postgres;
//! use sqlforge_core::schema::{ColumnDef, Table, TableDef};
//! use sqlforge_core::serialize::{serialize, SerializeOptions};
//!
//! let users = Table::new(
//!     TableDef::new("users")
//!         .column(ColumnDef::new("id", DataType::Integral))
//!         .column(ColumnDef::new("name", DataType::Text)),
//! );
//! let id = users.column("id")?;
//! let name = users.column("name")?;
//! let query = select(name)?.from(&users)?.where_(id.gt(10))?;
//!
//! let prepared = serialize(StatementRef::Select(&query), &Postgres, SerializeOptions::default());
//! assert_eq!(prepared.sql, "SELECT users.name FROM users WHERE users.id > $1");
//! assert_eq!(prepared.parameters.len(), 1);
//! # Ok::<(), sqlforge_core::Error>(())
//! ```

mod expr;
mod statement;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, StatementRef};
use crate::dialect::{Dialect, Generic};
use crate::value::Parameter;

/// Serializer switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Render bound values as literals instead of placeholders. Named
    /// parameters still render as placeholders since they carry no value.
    pub inline_values: bool,
}

/// SQL text and the parameters to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prepared {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl fmt::Display for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Working state of one serialization run.
struct Context<'d> {
    sql: String,
    dialect: &'d dyn Dialect,
    options: SerializeOptions,
    parameters: Vec<Parameter>,
    /// Whether column references carry their table name.
    qualify: bool,
}

impl<'d> Context<'d> {
    fn new(dialect: &'d dyn Dialect, options: SerializeOptions) -> Self {
        Self {
            sql: String::new(),
            dialect,
            options,
            parameters: Vec::new(),
            qualify: true,
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.push(&quoted);
    }

    fn finish(self) -> Prepared {
        Prepared {
            sql: self.sql,
            parameters: self.parameters,
        }
    }
}

/// Renders `statement` for `dialect`.
///
/// The statement is expected to have passed validation and the dialect
/// check; see [`crate::Query::to_sql`] for the checked pipeline.
#[must_use]
pub fn serialize(
    statement: StatementRef<'_>,
    dialect: &dyn Dialect,
    options: SerializeOptions,
) -> Prepared {
    let mut context = Context::new(dialect, options);
    match statement {
        StatementRef::Select(select) => context.select(select),
        StatementRef::Insert(insert) => context.insert(insert),
        StatementRef::Update(update) => context.update(update),
        StatementRef::Delete(delete) => context.delete(delete),
        StatementRef::Truncate(truncate) => context.truncate(truncate),
    }
    context.finish()
}

/// Generic SQL with values inlined, as used in diagnostics.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut context = Context::new(
            &Generic,
            SerializeOptions {
                inline_values: true,
            },
        );
        context.expr(self);
        f.write_str(&context.sql)
    }
}
