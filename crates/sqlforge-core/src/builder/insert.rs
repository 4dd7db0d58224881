//! INSERT composition.

use super::list::IntoList;
use super::{check_assignments, check_columns, check_value, fill, non_empty};
use crate::ast::{Allow, Assignment, ConflictAction, Expr, Insert, InsertValues, OnConflict, Slot};
use crate::error::{Clause, CompositionError};
use crate::schema::{ColumnRef, Table};

/// Starts an INSERT into `table`.
#[must_use]
pub fn insert_into(table: impl Into<Table>) -> Insert {
    Insert {
        with: Slot::Missing,
        table: table.into(),
        values: Slot::Missing,
        on_conflict: Slot::Missing,
        returning: Slot::Missing,
    }
}

const INSERTED_VALUE: Allow = Allow {
    default: true,
    excluded: false,
};

const CONFLICT_UPDATE: Allow = Allow {
    default: false,
    excluded: true,
};

impl Insert {
    /// Inserts one row given as assignments: `INSERT INTO t (a, b) VALUES (x, y)`.
    ///
    /// Dynamic assignments that are absent are left out of the row; if none
    /// remain the row renders as `DEFAULT VALUES`.
    ///
    /// # Errors
    ///
    /// Fails unless the assignments target unique columns of the table with
    /// fitting values, or if the values were already supplied.
    pub fn set(mut self, assignments: impl IntoList<Assignment>) -> Result<Self, CompositionError> {
        let assignments = assignments.into_list();
        check_assignments(&self.table, &assignments, Clause::Set, INSERTED_VALUE)?;
        fill(&mut self.values, Clause::Values, InsertValues::Set(assignments))?;
        Ok(self)
    }

    /// Declares the column list for subsequent [`Insert::values`] rows.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, on a column of another table or a repeated
    /// column, or if the values were already supplied.
    pub fn columns(mut self, columns: impl IntoList<ColumnRef>) -> Result<Self, CompositionError> {
        let columns = non_empty(columns.into_list(), Clause::Columns)?;
        check_columns(&self.table, &columns)?;
        let rows = InsertValues::Rows {
            columns,
            rows: Vec::new(),
        };
        fill(&mut self.values, Clause::Values, rows)?;
        Ok(self)
    }

    /// Appends one row matching the column list.
    ///
    /// # Errors
    ///
    /// Fails without a preceding [`Insert::columns`], or if the row does not
    /// match the columns in length or type.
    pub fn values(mut self, row: impl IntoList<Expr>) -> Result<Self, CompositionError> {
        let row = row.into_list();
        let Some(values) = self.values.get_mut() else {
            return Err(CompositionError::ValuesWithoutColumns);
        };
        let InsertValues::Rows { columns, rows } = values else {
            return Err(CompositionError::ClauseAlreadySet {
                clause: Clause::Values,
            });
        };
        if row.len() != columns.len() {
            return Err(CompositionError::ValueCountMismatch {
                expected: columns.len(),
                found: row.len(),
            });
        }
        for (column, value) in columns.iter().zip(&row) {
            check_value(column, value, INSERTED_VALUE)?;
        }
        rows.push(row);
        Ok(self)
    }

    /// Inserts a row made only of column defaults.
    ///
    /// # Errors
    ///
    /// Fails if the values were already supplied.
    pub fn default_values(mut self) -> Result<Self, CompositionError> {
        fill(&mut self.values, Clause::Values, InsertValues::DefaultValues)?;
        Ok(self)
    }

    /// Starts `ON CONFLICT (targets...)`. Must be followed by
    /// [`Insert::do_nothing`] or [`Insert::do_update`].
    ///
    /// # Errors
    ///
    /// Fails if a target is not a column of the table, is repeated, or if
    /// ON CONFLICT was already set.
    pub fn on_conflict(mut self, targets: impl IntoList<ColumnRef>) -> Result<Self, CompositionError> {
        let targets = targets.into_list();
        check_columns(&self.table, &targets)?;
        let conflict = OnConflict {
            targets,
            action: None,
        };
        fill(&mut self.on_conflict, Clause::OnConflict, conflict)?;
        Ok(self)
    }

    fn pending_conflict(&mut self) -> Result<&mut OnConflict, CompositionError> {
        let conflict = self
            .on_conflict
            .get_mut()
            .ok_or(CompositionError::NoPendingConflict)?;
        if conflict.action.is_some() {
            return Err(CompositionError::ConflictActionAlreadySet);
        }
        Ok(conflict)
    }

    /// `ON CONFLICT ... DO NOTHING`.
    ///
    /// # Errors
    ///
    /// Fails without a pending ON CONFLICT.
    pub fn do_nothing(mut self) -> Result<Self, CompositionError> {
        self.pending_conflict()?.action = Some(ConflictAction::DoNothing);
        Ok(self)
    }

    /// `ON CONFLICT (targets) DO UPDATE SET ...`. Values may use
    /// [`excluded`](crate::builder::excluded).
    ///
    /// # Errors
    ///
    /// Fails without a pending ON CONFLICT that names at least one target, or
    /// if the assignments are not valid for the table.
    pub fn do_update(mut self, assignments: impl IntoList<Assignment>) -> Result<Self, CompositionError> {
        let assignments = assignments.into_list();
        check_assignments(&self.table, &assignments, Clause::OnConflict, CONFLICT_UPDATE)?;
        let conflict = self.pending_conflict()?;
        if conflict.targets.is_empty() {
            return Err(CompositionError::ConflictTargetsRequired);
        }
        conflict.action = Some(ConflictAction::DoUpdate(assignments));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::builder::{default_value, excluded, Arithmetic};
    use crate::schema::{ColumnDef, TableDef};

    fn users() -> Table {
        Table::new(
            TableDef::new("users")
                .column(ColumnDef::new("id", DataType::Text).primary_key())
                .column(ColumnDef::new("money", DataType::Integral).default_value())
                .column(ColumnDef::new("nick", DataType::Text).nullable()),
        )
    }

    fn col(name: &str) -> ColumnRef {
        users().column(name).unwrap()
    }

    #[test]
    fn test_set_rejects_duplicates_and_foreign_columns() {
        let err = insert_into(users())
            .set((col("id").assign("a"), col("id").assign("b")))
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::DuplicateColumn {
                column: String::from("id")
            }
        );

        let other = Table::new(TableDef::new("other").column(ColumnDef::new("id", DataType::Text)));
        let err = insert_into(users())
            .set(other.column("id").unwrap().assign("a"))
            .unwrap_err();
        assert!(matches!(err, CompositionError::ForeignColumn { .. }));
    }

    #[test]
    fn test_set_checks_value_types() {
        let err = insert_into(users()).set(col("money").assign("lots")).unwrap_err();
        assert!(matches!(err, CompositionError::AssignmentType { .. }));
        assert!(insert_into(users())
            .set((col("id").assign("a"), col("money").assign(default_value())))
            .is_ok());
        assert!(insert_into(users()).set(col("nick").assign(None::<String>)).is_ok());
    }

    #[test]
    fn test_multi_row_values() {
        let insert = insert_into(users())
            .columns((col("id"), col("money")))
            .and_then(|i| i.values(("a", 1)))
            .and_then(|i| i.values(("b", 2)))
            .unwrap();
        let Some(InsertValues::Rows { rows, .. }) = insert.values.get() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);

        let err = insert.values(("c",)).unwrap_err();
        assert_eq!(
            err,
            CompositionError::ValueCountMismatch {
                expected: 2,
                found: 1
            }
        );
        let err = insert_into(users()).values(("a",)).unwrap_err();
        assert_eq!(err, CompositionError::ValuesWithoutColumns);
    }

    #[test]
    fn test_on_conflict_actions() {
        let base = insert_into(users()).set(col("id").assign("a")).unwrap();
        assert_eq!(
            base.clone().do_nothing().unwrap_err(),
            CompositionError::NoPendingConflict
        );
        let err = base
            .clone()
            .on_conflict(Vec::<ColumnRef>::new())
            .and_then(|i| i.do_update(col("money").assign(1)))
            .unwrap_err();
        assert_eq!(err, CompositionError::ConflictTargetsRequired);

        let upsert = base
            .on_conflict(col("id"))
            .and_then(|i| i.do_update(col("money").assign(col("money").plus(excluded(&col("money"))))))
            .unwrap();
        assert!(upsert.on_conflict.get().and_then(OnConflict::action).is_some());
        assert_eq!(
            upsert.do_nothing().unwrap_err(),
            CompositionError::ConflictActionAlreadySet
        );
    }

    #[test]
    fn test_excluded_outside_do_update() {
        let err = insert_into(users())
            .set(col("money").assign(excluded(&col("money"))))
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::MisplacedExcluded {
                column: String::from("money")
            }
        );
    }
}
