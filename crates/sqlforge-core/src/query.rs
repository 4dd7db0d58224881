//! The statement pipeline: validation, dialect check and serialization.

use tracing::{debug, trace};

use crate::ast::{Delete, Insert, Select, Statement, StatementRef, Truncate, Update};
use crate::dialect::{rules, Dialect};
use crate::error::{CompatibilityError, ConsistencyError, Result};
use crate::serialize::{serialize, Prepared, SerializeOptions};
use crate::validate;

/// A complete statement that can be turned into SQL.
///
/// Every call starts from scratch: nothing is cached between calls, so a
/// statement may be rendered for several dialects.
pub trait Query {
    /// Borrowed view of the statement.
    fn as_statement(&self) -> StatementRef<'_>;

    /// Checks the cross-clause consistency rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule the statement breaks.
    fn validate(&self) -> std::result::Result<(), ConsistencyError> {
        let statement = self.as_statement();
        validate::validate(statement)?;
        debug!(statement = statement.kind(), "statement is consistent");
        Ok(())
    }

    /// Checks the statement against the compatibility rules of `dialect`.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    fn check_dialect(&self, dialect: &dyn Dialect) -> std::result::Result<(), CompatibilityError> {
        rules::check(self.as_statement(), dialect)
    }

    /// Validates, checks and serializes the statement with bound values
    /// rendered as placeholders.
    ///
    /// # Errors
    ///
    /// Fails if the statement is inconsistent or not supported by `dialect`.
    fn to_sql(&self, dialect: &dyn Dialect) -> Result<Prepared> {
        self.to_sql_with(dialect, SerializeOptions::default())
    }

    /// Like [`Query::to_sql`] with explicit serializer options.
    ///
    /// # Errors
    ///
    /// Fails if the statement is inconsistent or not supported by `dialect`.
    fn to_sql_with(&self, dialect: &dyn Dialect, options: SerializeOptions) -> Result<Prepared> {
        self.validate()?;
        self.check_dialect(dialect)?;
        let prepared = serialize(self.as_statement(), dialect, options);
        debug!(
            dialect = dialect.name(),
            sql = %prepared.sql,
            parameters = prepared.parameters.len(),
            "serialized statement"
        );
        for parameter in &prepared.parameters {
            trace!(
                ordinal = parameter.ordinal,
                data_type = %parameter.value_type.data_type,
                name = parameter.name.as_deref(),
                "bound parameter"
            );
        }
        Ok(prepared)
    }
}

macro_rules! impl_query {
    ($($statement:ident),+) => {
        $(
            impl Query for $statement {
                fn as_statement(&self) -> StatementRef<'_> {
                    StatementRef::$statement(self)
                }
            }
        )+
    };
}

impl_query!(Select, Insert, Update, Delete, Truncate);

impl Query for Statement {
    fn as_statement(&self) -> StatementRef<'_> {
        match self {
            Self::Select(select) => StatementRef::Select(select),
            Self::Insert(insert) => StatementRef::Insert(insert),
            Self::Update(update) => StatementRef::Update(update),
            Self::Delete(delete) => StatementRef::Delete(delete),
            Self::Truncate(truncate) => StatementRef::Truncate(truncate),
        }
    }
}
