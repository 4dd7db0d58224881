//! Statement and clause node types.
//!
//! Every clause of a statement lives in its own [`Slot`]. Builders in
//! [`crate::builder`] fill the slots; the validator and the serializer only
//! read them.

use super::expression::{Aggregate, Expr};
use super::types::ValueType;
use crate::error::CompositionError;
use crate::schema::{ColumnDef, ColumnRef, Table};

/// A clause slot: either not supplied yet, or supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Missing,
    Present(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Slot<T> {
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        match self {
            Self::Missing => None,
            Self::Present(value) => Some(value),
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Missing => None,
            Self::Present(value) => Some(value),
        }
    }
}

/// A selected column: an expression and an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub(crate) expr: Expr,
    pub(crate) alias: Option<String>,
}

impl SelectColumn {
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The result column name: the alias, or the name the expression carries.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| self.expr.default_name())
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.expr.value_type()
    }
}

macro_rules! impl_from_expr_like {
    ($target:ident { $($field:ident: $default:expr),* }) => {
        impl_from_expr_like!(@one $target, Expr { $($field: $default),* });
        impl_from_expr_like!(@one $target, ColumnRef { $($field: $default),* });
        impl_from_expr_like!(@one $target, Aggregate { $($field: $default),* });
    };
    (@one $target:ident, $source:ident { $($field:ident: $default:expr),* }) => {
        impl From<$source> for $target {
            fn from(expr: $source) -> Self {
                Self {
                    expr: expr.into(),
                    $($field: $default),*
                }
            }
        }
    };
}

impl_from_expr_like!(SelectColumn { alias: None });

/// SELECT flags, rendered before the column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectFlag {
    Distinct,
    All,
}

impl SelectFlag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub(crate) expr: Expr,
    pub(crate) direction: Option<SortDirection>,
}

impl OrderBy {
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub const fn direction(&self) -> Option<SortDirection> {
        self.direction
    }
}

impl_from_expr_like!(OrderBy { direction: None });

/// `column = value` in SET lists, insert assignments and DO UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub(crate) column: ColumnRef,
    pub(crate) value: Expr,
    /// `Some(condition)` for a dynamic assignment.
    pub(crate) condition: Option<bool>,
}

impl Assignment {
    #[must_use]
    pub const fn column(&self) -> &ColumnRef {
        &self.column
    }

    #[must_use]
    pub const fn value(&self) -> &Expr {
        &self.value
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        self.condition.is_some()
    }

    /// Whether the assignment renders.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.condition.unwrap_or(true)
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinKind {
    /// The keyword including the surrounding spaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => " INNER JOIN ",
            Self::LeftOuter => " LEFT OUTER JOIN ",
            Self::RightOuter => " RIGHT OUTER JOIN ",
            Self::FullOuter => " FULL OUTER JOIN ",
            Self::Cross => " CROSS JOIN ",
        }
    }
}

/// Two table expressions joined together.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub(crate) left: TableExpr,
    pub(crate) kind: JoinKind,
    pub(crate) right: TableExpr,
    /// `None` for CROSS JOIN.
    pub(crate) on: Option<Expr>,
}

impl Join {
    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    #[must_use]
    pub const fn left(&self) -> &TableExpr {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &TableExpr {
        &self.right
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&Expr> {
        self.on.as_ref()
    }
}

/// A sub-select used as a table in FROM.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    pub(crate) query: Box<Select>,
    pub(crate) name: String,
}

impl DerivedTable {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn query(&self) -> &Select {
        &self.query
    }

    /// References a result column of the sub-select.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::UnknownColumn`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<ColumnRef, CompositionError> {
        result_column(&self.name, &self.query, name)
    }
}

fn result_column(
    table: &str,
    query: &Select,
    name: &str,
) -> Result<ColumnRef, CompositionError> {
    query
        .result_columns()
        .into_iter()
        .find(|(column, _)| *column == Some(name))
        .map(|(_, value_type)| ColumnRef::new(table, ColumnDef::with_type(name, value_type)))
        .ok_or_else(|| CompositionError::UnknownColumn {
            table: String::from(table),
            column: String::from(name),
        })
}

/// A table expression in FROM, JOIN or USING position.
#[derive(Debug, Clone, PartialEq)]
pub enum TableExpr {
    Table(Table),
    Derived(DerivedTable),
    /// Reference to a common table expression by name.
    Cte(String),
    Join(Box<Join>),
    /// A join operand present only if `condition` holds.
    Dynamic {
        condition: bool,
        inner: Box<TableExpr>,
    },
}

impl TableExpr {
    /// Reference names of every table this expression provides, in render order.
    #[must_use]
    pub fn reference_names(&self) -> Vec<&str> {
        match self {
            Self::Table(table) => vec![table.reference_name()],
            Self::Derived(derived) => vec![derived.name.as_str()],
            Self::Cte(name) => vec![name.as_str()],
            Self::Join(join) => {
                let mut names = join.left.reference_names();
                names.extend(join.right.reference_names());
                names
            }
            Self::Dynamic { inner, .. } => inner.reference_names(),
        }
    }
}

impl From<Table> for TableExpr {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<&Table> for TableExpr {
    fn from(table: &Table) -> Self {
        Self::Table(table.clone())
    }
}

impl From<Join> for TableExpr {
    fn from(join: Join) -> Self {
        Self::Join(Box::new(join))
    }
}

impl From<DerivedTable> for TableExpr {
    fn from(derived: DerivedTable) -> Self {
        Self::Derived(derived)
    }
}

impl From<&DerivedTable> for TableExpr {
    fn from(derived: &DerivedTable) -> Self {
        Self::Derived(derived.clone())
    }
}

/// UNION ALL or UNION DISTINCT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    All,
    Distinct,
}

impl UnionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => " UNION ALL ",
            Self::Distinct => " UNION DISTINCT ",
        }
    }
}

/// The right operand of a UNION, possibly dynamic.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionOperand {
    pub(crate) query: Box<Select>,
    pub(crate) condition: Option<bool>,
}

impl UnionOperand {
    #[must_use]
    pub fn query(&self) -> &Select {
        &self.query
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.condition.unwrap_or(true)
    }
}

impl From<Select> for UnionOperand {
    fn from(query: Select) -> Self {
        Self {
            query: Box::new(query),
            condition: None,
        }
    }
}

/// One `UNION` step attached to a select.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionPart {
    pub(crate) kind: UnionKind,
    pub(crate) operand: UnionOperand,
}

impl UnionPart {
    #[must_use]
    pub const fn kind(&self) -> UnionKind {
        self.kind
    }

    #[must_use]
    pub const fn operand(&self) -> &UnionOperand {
        &self.operand
    }
}

/// A named common table expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub(crate) name: String,
    pub(crate) query: Box<Select>,
    /// The recursive step, making this a `WITH RECURSIVE` entry.
    pub(crate) recursive: Option<UnionPart>,
}

impl Cte {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn query(&self) -> &Select {
        &self.query
    }

    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive.is_some()
    }

    /// References a result column of the CTE.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::UnknownColumn`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<ColumnRef, CompositionError> {
        result_column(&self.name, &self.query, name)
    }
}

impl From<&Cte> for TableExpr {
    fn from(cte: &Cte) -> Self {
        Self::Cte(cte.name.clone())
    }
}

/// The WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub(crate) ctes: Vec<Cte>,
}

impl With {
    #[must_use]
    pub fn ctes(&self) -> &[Cte] {
        &self.ctes
    }

    #[must_use]
    pub fn is_recursive(&self) -> bool {
        self.ctes.iter().any(Cte::is_recursive)
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub(crate) with: Slot<With>,
    pub(crate) flag: Option<SelectFlag>,
    pub(crate) columns: Slot<Vec<SelectColumn>>,
    pub(crate) from: Slot<TableExpr>,
    pub(crate) where_: Slot<Expr>,
    pub(crate) group_by: Slot<Vec<Expr>>,
    pub(crate) having: Slot<Expr>,
    pub(crate) order_by: Slot<Vec<OrderBy>>,
    pub(crate) limit: Slot<Expr>,
    pub(crate) offset: Slot<Expr>,
    pub(crate) unions: Vec<UnionPart>,
}

impl Select {
    /// Names and types of the result columns.
    #[must_use]
    pub fn result_columns(&self) -> Vec<(Option<&str>, ValueType)> {
        self.columns.get().map_or_else(Vec::new, |columns| {
            columns
                .iter()
                .map(|c| (c.name(), c.value_type()))
                .collect()
        })
    }

    #[must_use]
    pub fn selected_columns(&self) -> &[SelectColumn] {
        self.columns.get().map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub const fn from_clause(&self) -> Option<&TableExpr> {
        self.from.get()
    }

    #[must_use]
    pub const fn where_clause(&self) -> Option<&Expr> {
        self.where_.get()
    }

    #[must_use]
    pub fn group_by_clause(&self) -> &[Expr] {
        self.group_by.get().map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn unions(&self) -> &[UnionPart] {
        &self.unions
    }
}

/// WHERE of UPDATE and DELETE, which must be stated explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Where(Expr),
    Unconditionally,
}

impl Filter {
    #[must_use]
    pub const fn condition(&self) -> Option<&Expr> {
        match self {
            Self::Where(expr) => Some(expr),
            Self::Unconditionally => None,
        }
    }
}

/// How an INSERT supplies its values.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    /// `set(assignments)`: one row given as assignments.
    Set(Vec<Assignment>),
    /// `columns(...)` followed by `values(...)` rows.
    Rows {
        columns: Vec<ColumnRef>,
        rows: Vec<Vec<Expr>>,
    },
    DefaultValues,
}

/// Action of an ON CONFLICT clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<Assignment>),
}

/// The ON CONFLICT clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub(crate) targets: Vec<ColumnRef>,
    pub(crate) action: Option<ConflictAction>,
}

impl OnConflict {
    #[must_use]
    pub fn targets(&self) -> &[ColumnRef] {
        &self.targets
    }

    #[must_use]
    pub const fn action(&self) -> Option<&ConflictAction> {
        self.action.as_ref()
    }
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub(crate) with: Slot<With>,
    pub(crate) table: Table,
    pub(crate) values: Slot<InsertValues>,
    pub(crate) on_conflict: Slot<OnConflict>,
    pub(crate) returning: Slot<Vec<SelectColumn>>,
}

impl Insert {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub(crate) with: Slot<With>,
    pub(crate) table: Table,
    pub(crate) assignments: Slot<Vec<Assignment>>,
    pub(crate) filter: Slot<Filter>,
    pub(crate) returning: Slot<Vec<SelectColumn>>,
}

impl Update {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub(crate) with: Slot<With>,
    pub(crate) table: Table,
    pub(crate) using: Slot<Vec<Table>>,
    pub(crate) filter: Slot<Filter>,
    pub(crate) returning: Slot<Vec<SelectColumn>>,
}

impl Delete {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

/// A TRUNCATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Truncate {
    pub(crate) table: Table,
}

impl Truncate {
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

/// Any statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Truncate(Truncate),
}

macro_rules! impl_statement_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Statement {
                fn from(statement: $variant) -> Self {
                    Self::$variant(statement)
                }
            }
        )+
    };
}

impl_statement_from!(Select, Insert, Update, Delete, Truncate);

/// A borrowed view of any statement.
#[derive(Debug, Clone, Copy)]
pub enum StatementRef<'a> {
    Select(&'a Select),
    Insert(&'a Insert),
    Update(&'a Update),
    Delete(&'a Delete),
    Truncate(&'a Truncate),
}

impl StatementRef<'_> {
    /// The statement keyword, used in diagnostics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::Truncate(_) => "TRUNCATE",
        }
    }
}
