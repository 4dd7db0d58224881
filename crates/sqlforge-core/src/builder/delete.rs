//! DELETE composition.
//!
//! Like UPDATE, a DELETE must be given `where_(condition)` or
//! `unconditionally()` before it validates.

use super::fill;
use super::list::IntoList;
use crate::ast::{Delete, Slot};
use crate::error::{Clause, CompositionError};
use crate::schema::Table;

/// Starts a DELETE from `table`.
#[must_use]
pub fn delete_from(table: impl Into<Table>) -> Delete {
    Delete {
        with: Slot::Missing,
        table: table.into(),
        using: Slot::Missing,
        filter: Slot::Missing,
        returning: Slot::Missing,
    }
}

impl Delete {
    /// `USING tables`: extra tables whose columns the WHERE condition may use.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, on a reference name used twice, or if USING
    /// was already supplied.
    pub fn using(mut self, tables: impl IntoList<Table>) -> Result<Self, CompositionError> {
        let tables = super::non_empty(tables.into_list(), Clause::Using)?;
        let mut names = vec![self.table.reference_name()];
        for table in &tables {
            if names.contains(&table.reference_name()) {
                return Err(CompositionError::DuplicateTableName {
                    name: String::from(table.reference_name()),
                });
            }
            names.push(table.reference_name());
        }
        fill(&mut self.using, Clause::Using, tables)?;
        Ok(self)
    }
}
