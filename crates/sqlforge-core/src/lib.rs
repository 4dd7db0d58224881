//! # sqlforge-core
//!
//! SQL statement composition with validation before any text is produced.
//!
//! This crate provides:
//! - A clause-by-clause builder that rejects malformed compositions as soon
//!   as they are attempted
//! - A consistency validator that checks table scope, aggregation and
//!   required clauses of a complete statement
//! - Dialect-aware serialization into SQL text plus an ordered parameter list
//!
//! ## Building statements
//!
//! ```rust
//! use sqlforge_core::ast::DataType;
//! use sqlforge_core::builder::{dynamic, select, Comparable, Logical};
//! use sqlforge_core::dialect::Postgres;
//! use sqlforge_core::schema::{ColumnDef, Table, TableDef};
//! use sqlforge_core::Query;
//!
//! let users = Table::new(
//!     TableDef::new("users")
//!         .column(ColumnDef::new("id", DataType::Integral))
//!         .column(ColumnDef::new("name", DataType::Text)),
//! );
//! let id = users.column("id")?;
//! let name = users.column("name")?;
//!
//! let search: Option<&str> = None;
//! let query = select((id.clone(), name.clone()))?
//!     .from(&users)?
//!     .where_(id.gt(10).and(dynamic(search.is_some(), name.eq(search))))?;
//!
//! let prepared = query.to_sql(&Postgres)?;
//! assert_eq!(prepared.sql, "SELECT users.id, users.name FROM users WHERE users.id > $1");
//! assert_eq!(prepared.parameters.len(), 1);
//! # Ok::<(), sqlforge_core::Error>(())
//! ```
//!
//! ## SQL injection prevention
//!
//! Values are never spliced into the text unless explicitly requested with
//! [`lit`](builder::lit) or [`SerializeOptions::inline_values`], and literals
//! are always escaped for the target dialect.
//!
//! ```rust
//! use sqlforge_core::ast::DataType;
//! use sqlforge_core::builder::{select, Comparable};
//! use sqlforge_core::dialect::Generic;
//! use sqlforge_core::schema::{ColumnDef, Table, TableDef};
//! use sqlforge_core::value::SqlValue;
//! use sqlforge_core::Query;
//!
//! let users = Table::new(TableDef::new("users").column(ColumnDef::new("name", DataType::Text)));
//! let name = users.column("name")?;
//! let user_input = "'; DROP TABLE users; --";
//!
//! let prepared = select(name.clone())?.from(&users)?.where_(name.eq(user_input))?.to_sql(&Generic)?;
//! assert_eq!(prepared.sql, "SELECT users.name FROM users WHERE users.name = ?");
//! assert_eq!(prepared.parameters[0].value, Some(SqlValue::Text(String::from(user_input))));
//! # Ok::<(), sqlforge_core::Error>(())
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
mod query;
pub mod schema;
pub mod serialize;
pub mod validate;
pub mod value;

pub use ast::{types, Expr, Statement, StatementRef};
pub use config::{Backend, DialectConfig};
pub use dialect::Dialect;
pub use error::{
    CompatibilityError, CompositionError, ConfigError, ConsistencyError, Error, Result,
};
pub use query::Query;
pub use schema::{ColumnRef, Table, TableSchema};
pub use serialize::{Prepared, SerializeOptions};
pub use value::{Parameter, SqlValue};
