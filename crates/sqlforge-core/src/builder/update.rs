//! UPDATE composition.
//!
//! An UPDATE must decide its filter explicitly: either `where_(condition)`
//! or `unconditionally()`. Forgetting both is a consistency error, not a
//! silent update of every row.

use super::list::IntoList;
use super::{check_assignments, fill};
use crate::ast::{Allow, Assignment, Slot, Update};
use crate::error::{Clause, CompositionError};
use crate::schema::Table;

/// Starts an UPDATE of `table`.
#[must_use]
pub fn update(table: impl Into<Table>) -> Update {
    Update {
        with: Slot::Missing,
        table: table.into(),
        assignments: Slot::Missing,
        filter: Slot::Missing,
        returning: Slot::Missing,
    }
}

impl Update {
    /// Sets the SET list.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, on columns of another table, repeated columns
    /// or values that do not fit, or if SET was already supplied.
    pub fn set(mut self, assignments: impl IntoList<Assignment>) -> Result<Self, CompositionError> {
        let assignments = assignments.into_list();
        check_assignments(&self.table, &assignments, Clause::Set, Allow::NOTHING)?;
        fill(&mut self.assignments, Clause::Set, assignments)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DataType, Filter};
    use crate::builder::{default_value, dynamic, Comparable};
    use crate::schema::{ColumnDef, ColumnRef, TableDef};

    fn users() -> Table {
        Table::new(
            TableDef::new("users")
                .column(ColumnDef::new("id", DataType::Text))
                .column(ColumnDef::new("money", DataType::Integral)),
        )
    }

    fn col(name: &str) -> ColumnRef {
        users().column(name).unwrap()
    }

    #[test]
    fn test_update_requires_assignments() {
        let err = update(users()).set(Vec::<Assignment>::new()).unwrap_err();
        assert_eq!(err, CompositionError::EmptyList { clause: Clause::Set });
    }

    #[test]
    fn test_update_rejects_default() {
        let err = update(users())
            .set(col("money").assign(default_value()))
            .unwrap_err();
        assert_eq!(err, CompositionError::MisplacedDefault);
    }

    #[test]
    fn test_filter_decided_once() {
        let base = update(users()).set(col("money").assign(1)).unwrap();
        let filtered = base.clone().where_(col("id").eq("abc")).unwrap();
        assert!(matches!(filtered.filter.get(), Some(Filter::Where(_))));
        let err = filtered.unconditionally().unwrap_err();
        assert_eq!(err, CompositionError::ClauseAlreadySet { clause: Clause::Where });
        assert!(base.unconditionally().is_ok());
    }

    #[test]
    fn test_dynamic_assignments() {
        let statement = update(users())
            .set((col("money").assign(1), dynamic(false, col("id").assign("x"))))
            .unwrap();
        let assignments = statement.assignments.get().unwrap();
        assert_eq!(assignments.iter().filter(|a| a.is_active()).count(), 1);
    }
}
