//! Dialect compatibility rules.
//!
//! The checker flattens a statement into the [`Node`]s that dialects
//! disagree on, in render order, and asks every rule of the dialect's
//! [`RuleSet`] about each of them. The first objection wins.

use tracing::trace;

use super::{Dialect, Version};
use crate::ast::{
    ConflictAction, DataType, Expr, Filter, InsertValues, JoinKind, Select, SelectColumn,
    StatementRef, TableExpr, With,
};
use crate::error::CompatibilityError;

/// A statement shape that some dialect may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Join(JoinKind),
    Cast { from: DataType, to: DataType },
    /// `ANY(sub-select)`.
    Any,
    /// `DELETE ... USING`.
    DeleteUsing,
    Returning,
    OnConflict,
    With,
    Truncate,
}

/// One compatibility rule.
pub trait CompatibilityRule: Send + Sync {
    /// Short identifier of the rule, reported in [`CompatibilityError::rule`].
    fn name(&self) -> &'static str;

    /// Returns a description of the problem if `node` breaks the rule.
    fn violation(&self, node: &Node) -> Option<String>;
}

/// Rejects every node matched by a predicate.
pub struct Forbid {
    name: &'static str,
    message: &'static str,
    matches: fn(&Node) -> bool,
}

impl Forbid {
    #[must_use]
    pub const fn new(name: &'static str, message: &'static str, matches: fn(&Node) -> bool) -> Self {
        Self {
            name,
            message,
            matches,
        }
    }
}

impl CompatibilityRule for Forbid {
    fn name(&self) -> &'static str {
        self.name
    }

    fn violation(&self, node: &Node) -> Option<String> {
        (self.matches)(node).then(|| String::from(self.message))
    }
}

/// Rejects matched nodes when the backend is older than `minimum`.
pub struct RequiresVersion {
    name: &'static str,
    feature: &'static str,
    minimum: Version,
    actual: Version,
    matches: fn(&Node) -> bool,
}

impl RequiresVersion {
    #[must_use]
    pub const fn new(
        name: &'static str,
        feature: &'static str,
        minimum: Version,
        actual: Version,
        matches: fn(&Node) -> bool,
    ) -> Self {
        Self {
            name,
            feature,
            minimum,
            actual,
            matches,
        }
    }
}

impl CompatibilityRule for RequiresVersion {
    fn name(&self) -> &'static str {
        self.name
    }

    fn violation(&self, node: &Node) -> Option<String> {
        if self.actual >= self.minimum || !(self.matches)(node) {
            return None;
        }
        Some(format!(
            "{} requires version {} or later, configured version is {}",
            self.feature, self.minimum, self.actual
        ))
    }
}

/// The rules of one dialect.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn CompatibilityRule>>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, builder style.
    #[must_use]
    pub fn with(mut self, rule: impl CompatibilityRule + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl CompatibilityRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the name of the first rule rejecting `node` and its message.
    #[must_use]
    pub fn violation(&self, node: &Node) -> Option<(&'static str, String)> {
        self.rules
            .iter()
            .find_map(|rule| rule.violation(node).map(|message| (rule.name(), message)))
    }

    fn first_violation(&self, nodes: &[Node]) -> Option<(&'static str, String)> {
        nodes.iter().find_map(|node| self.violation(node))
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

/// Checks `statement` against the rules of `dialect`.
///
/// # Errors
///
/// Returns a [`CompatibilityError`] for the first node a rule rejects.
pub fn check(statement: StatementRef<'_>, dialect: &dyn Dialect) -> Result<(), CompatibilityError> {
    let rules = dialect.rules();
    if rules.is_empty() {
        return Ok(());
    }
    let nodes = nodes_of(statement);
    trace!(dialect = dialect.name(), nodes = nodes.len(), "checking dialect rules");
    match rules.first_violation(&nodes) {
        Some((rule, message)) => Err(CompatibilityError {
            dialect: String::from(dialect.name()),
            rule,
            message,
        }),
        None => Ok(()),
    }
}

/// The dialect-relevant nodes of a statement in render order.
#[must_use]
pub fn nodes_of(statement: StatementRef<'_>) -> Vec<Node> {
    let mut walker = Walker::default();
    match statement {
        StatementRef::Select(select) => walker.select(select),
        StatementRef::Insert(insert) => {
            walker.with(insert.with.get());
            match insert.values.get() {
                Some(InsertValues::Set(assignments)) => {
                    walker.exprs(assignments.iter().map(|a| &a.value));
                }
                Some(InsertValues::Rows { rows, .. }) => walker.exprs(rows.iter().flatten()),
                Some(InsertValues::DefaultValues) | None => {}
            }
            if let Some(conflict) = insert.on_conflict.get() {
                walker.nodes.push(Node::OnConflict);
                if let Some(ConflictAction::DoUpdate(assignments)) = conflict.action() {
                    walker.exprs(assignments.iter().map(|a| &a.value));
                }
            }
            walker.returning(insert.returning.get());
        }
        StatementRef::Update(update) => {
            walker.with(update.with.get());
            if let Some(assignments) = update.assignments.get() {
                walker.exprs(assignments.iter().map(|a| &a.value));
            }
            walker.exprs(update.filter.get().and_then(Filter::condition));
            walker.returning(update.returning.get());
        }
        StatementRef::Delete(delete) => {
            walker.with(delete.with.get());
            if delete.using.is_present() {
                walker.nodes.push(Node::DeleteUsing);
            }
            walker.exprs(delete.filter.get().and_then(Filter::condition));
            walker.returning(delete.returning.get());
        }
        StatementRef::Truncate(_) => walker.nodes.push(Node::Truncate),
    }
    walker.nodes
}

#[derive(Default)]
struct Walker {
    nodes: Vec<Node>,
}

impl Walker {
    fn with(&mut self, with: Option<&With>) {
        let Some(with) = with else {
            return;
        };
        self.nodes.push(Node::With);
        for cte in with.ctes() {
            self.select(cte.query());
            if let Some(step) = &cte.recursive {
                self.select(step.operand().query());
            }
        }
    }

    fn select(&mut self, select: &Select) {
        self.with(select.with.get());
        self.exprs(select.selected_columns().iter().map(|c| &c.expr));
        if let Some(from) = select.from_clause() {
            self.table(from);
        }
        self.exprs(select.where_clause());
        self.exprs(select.group_by_clause());
        self.exprs(select.having.get());
        if let Some(order_by) = select.order_by.get() {
            self.exprs(order_by.iter().map(|o| &o.expr));
        }
        self.exprs(select.limit.get());
        self.exprs(select.offset.get());
        for part in select.unions() {
            self.select(part.operand().query());
        }
    }

    fn table(&mut self, table: &TableExpr) {
        match table {
            TableExpr::Table(_) | TableExpr::Cte(_) => {}
            TableExpr::Derived(derived) => self.select(derived.query()),
            TableExpr::Dynamic { inner, .. } => self.table(inner),
            TableExpr::Join(join) => {
                self.table(join.left());
                self.nodes.push(Node::Join(join.kind()));
                self.table(join.right());
                self.exprs(join.condition());
            }
        }
    }

    fn returning(&mut self, columns: Option<&Vec<SelectColumn>>) {
        if let Some(columns) = columns {
            self.nodes.push(Node::Returning);
            self.exprs(columns.iter().map(|c| &c.expr));
        }
    }

    fn exprs<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>) {
        for expr in exprs {
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Cast { expr: inner, target } => self.nodes.push(Node::Cast {
                from: inner.value_type().data_type,
                to: *target,
            }),
            Expr::Any(_) => self.nodes.push(Node::Any),
            _ => {}
        }
        for query in expr.subqueries() {
            self.select(query);
        }
        self.exprs(expr.children());
    }
}
