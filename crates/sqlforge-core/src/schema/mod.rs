//! Table and column descriptors.
//!
//! The schema layer is read-only input to the rest of the crate: builders take
//! column references out of it and the validator consults the column flags
//! when it checks INSERT completeness. Descriptors are either built by hand or
//! generated by `#[derive(Table)]` from `sqlforge-derive`.

use std::sync::Arc;

use crate::ast::types::{DataType, ValueType};
use crate::error::CompositionError;

/// Describes one column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    name: String,
    value_type: ValueType,
    has_default: bool,
    auto_increment: bool,
    primary_key: bool,
}

impl ColumnDef {
    /// Creates a NOT NULL column without default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self::with_type(name, ValueType::of(data_type))
    }

    /// Creates a column of the given value type.
    #[must_use]
    pub fn with_type(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            has_default: false,
            auto_increment: false,
            primary_key: false,
        }
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.value_type.nullable = true;
        self
    }

    /// Marks the column as having a server-side default.
    #[must_use]
    pub const fn default_value(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.has_default
    }

    #[must_use]
    pub const fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// An INSERT must name this column unless it can be left out.
    #[must_use]
    pub const fn is_required_for_insert(&self) -> bool {
        !self.value_type.nullable && !self.has_default && !self.auto_increment
    }
}

/// Describes a table: its name and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Implemented by types generated from `#[derive(Table)]`.
pub trait TableSchema {
    /// The SQL table name.
    const NAME: &'static str;

    /// Builds the table descriptor.
    fn definition() -> TableDef;
}

/// A table as it appears in a statement: a shared definition plus an optional alias.
///
/// Cloning is cheap. Two references to the same table are told apart by
/// their reference name, which is the alias if there is one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    def: Arc<TableDef>,
    alias: Option<String>,
}

impl Table {
    #[must_use]
    pub fn new(def: TableDef) -> Self {
        Self {
            def: Arc::new(def),
            alias: None,
        }
    }

    /// Creates a handle for a derived schema type.
    #[must_use]
    pub fn of<T: TableSchema>() -> Self {
        Self::new(T::definition())
    }

    /// Returns an aliased copy, rendered as `name AS alias`.
    #[must_use]
    pub fn as_(&self, alias: impl Into<String>) -> Self {
        Self {
            def: Arc::clone(&self.def),
            alias: Some(alias.into()),
        }
    }

    /// The declared table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.def.name()
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name column references are qualified with.
    #[must_use]
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.def.name())
    }

    #[must_use]
    pub fn definition(&self) -> &TableDef {
        &self.def
    }

    /// References a column of this table by name.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::UnknownColumn`] if the table has no such column.
    pub fn column(&self, name: &str) -> Result<ColumnRef, CompositionError> {
        self.def
            .find(name)
            .map(|def| ColumnRef::new(self.reference_name(), def.clone()))
            .ok_or_else(|| CompositionError::UnknownColumn {
                table: String::from(self.reference_name()),
                column: String::from(name),
            })
    }

    /// References every column of the table in declaration order.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnRef> {
        self.def
            .columns()
            .iter()
            .map(|def| ColumnRef::new(self.reference_name(), def.clone()))
            .collect()
    }
}

impl From<&Table> for Table {
    fn from(table: &Table) -> Self {
        table.clone()
    }
}

/// A reference to a column of a table, derived table or CTE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    table: String,
    column: ColumnDef,
}

impl ColumnRef {
    /// Creates a reference to `column` qualified by `table`.
    #[must_use]
    pub fn new(table: impl Into<String>, column: ColumnDef) -> Self {
        Self {
            table: table.into(),
            column,
        }
    }

    /// The reference name of the owning table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.column.name()
    }

    #[must_use]
    pub const fn definition(&self) -> &ColumnDef {
        &self.column
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.column.value_type()
    }

    /// `table.column`, used in diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.column.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            TableDef::new("users")
                .column(ColumnDef::new("id", DataType::Text).primary_key())
                .column(ColumnDef::new("money", DataType::Integral).default_value())
                .column(ColumnDef::new("nick", DataType::Text).nullable()),
        )
    }

    #[test]
    fn test_column_lookup() {
        let users = users();
        let money = users.column("money").unwrap();
        assert_eq!(money.table(), "users");
        assert_eq!(money.qualified_name(), "users.money");
        assert!(users.column("missing").is_err());
    }

    #[test]
    fn test_alias_changes_reference_name() {
        let u = users().as_("u");
        assert_eq!(u.name(), "users");
        assert_eq!(u.reference_name(), "u");
        assert_eq!(u.column("id").unwrap().table(), "u");
    }

    #[test]
    fn test_required_for_insert() {
        let users = users();
        let required: Vec<_> = users
            .definition()
            .columns()
            .iter()
            .filter(|c| c.is_required_for_insert())
            .map(ColumnDef::name)
            .collect();
        assert_eq!(required, vec!["id"]);
    }
}
