//! Common table expressions and the WITH clause.

use super::list::IntoList;
use super::{check_detached, fill, non_empty};
use crate::ast::{Cte, Delete, Insert, Select, Update, UnionKind, UnionPart, With};
use crate::error::{Clause, CompositionError};

/// Starts a common table expression: `cte("name").as_(select)`.
#[must_use]
pub fn cte(name: impl Into<String>) -> CteName {
    CteName { name: name.into() }
}

/// A CTE name waiting for its query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "call .as_(select) to define the CTE"]
pub struct CteName {
    name: String,
}

impl CteName {
    /// Defines the CTE as the result of `query`.
    ///
    /// # Errors
    ///
    /// Fails if the query is not consistent on its own or references tables
    /// of an enclosing query.
    pub fn as_(self, query: Select) -> Result<Cte, CompositionError> {
        check_detached(&query)?;
        Ok(Cte {
            name: self.name,
            query: Box::new(query),
            recursive: None,
        })
    }
}

impl Cte {
    /// Makes the CTE recursive: `name AS (base UNION ALL step)`.
    ///
    /// The step may select from the CTE itself.
    ///
    /// # Errors
    ///
    /// See [`Cte::union_distinct`].
    pub fn union_all(self, step: Select) -> Result<Self, CompositionError> {
        self.recursive(UnionKind::All, step)
    }

    /// Makes the CTE recursive with `UNION DISTINCT`.
    ///
    /// # Errors
    ///
    /// Fails if the CTE is already recursive, if the step is ordered,
    /// limited or has its own WITH, or if it is inconsistent on its own.
    pub fn union_distinct(self, step: Select) -> Result<Self, CompositionError> {
        self.recursive(UnionKind::Distinct, step)
    }

    fn recursive(mut self, kind: UnionKind, step: Select) -> Result<Self, CompositionError> {
        if self.recursive.is_some() {
            return Err(CompositionError::ClauseAlreadySet {
                clause: Clause::Union,
            });
        }
        if step.with.is_present() {
            return Err(CompositionError::UnionOperandClause {
                clause: Clause::With,
            });
        }
        if step.order_by.is_present() || step.limit.is_present() || step.offset.is_present() {
            return Err(CompositionError::UnionOperandClause {
                clause: Clause::OrderBy,
            });
        }
        check_detached(&step)?;
        self.recursive = Some(UnionPart {
            kind,
            operand: step.into(),
        });
        Ok(self)
    }
}

fn build_with(ctes: impl IntoList<Cte>) -> Result<With, CompositionError> {
    let ctes = non_empty(ctes.into_list(), Clause::With)?;
    for (index, cte) in ctes.iter().enumerate() {
        if ctes[..index].iter().any(|earlier| earlier.name == cte.name) {
            return Err(CompositionError::DuplicateCte {
                name: cte.name.clone(),
            });
        }
    }
    Ok(With { ctes })
}

macro_rules! impl_with {
    ($($statement:ident),+) => {
        $(
            impl $statement {
                /// Prefixes the statement with a WITH clause.
                ///
                /// # Errors
                ///
                /// Fails on an empty list, on a repeated CTE name, or if
                /// WITH is already set.
                pub fn with(mut self, ctes: impl IntoList<Cte>) -> Result<Self, CompositionError> {
                    let with = build_with(ctes)?;
                    fill(&mut self.with, Clause::With, with)?;
                    Ok(self)
                }
            }
        )+
    };
}

impl_with!(Select, Insert, Update, Delete);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::builder::{select, Aliasable, Arithmetic, Comparable};
    use crate::schema::{ColumnDef, Table, TableDef};

    fn numbers() -> Table {
        Table::new(TableDef::new("numbers").column(ColumnDef::new("n", DataType::Integral)))
    }

    #[test]
    fn test_recursive_cte() {
        let t = numbers();
        let base = select(t.column("n").unwrap()).and_then(|s| s.from(&t)).unwrap();
        let counter = cte("counter").as_(base).unwrap();
        let n = counter.column("n").unwrap();
        let step = select(n.clone().plus(1).as_("n"))
            .and_then(|s| s.from(&counter))
            .and_then(|s| s.where_(n.lt(10)))
            .unwrap();
        let counter = counter.union_all(step).unwrap();
        assert!(counter.is_recursive());

        let query = select(counter.column("n").unwrap())
            .and_then(|s| s.from(&counter))
            .and_then(|s| s.with(counter.clone()))
            .unwrap();
        assert!(query.with.get().is_some_and(With::is_recursive));
    }

    #[test]
    fn test_duplicate_cte_names() {
        let t = numbers();
        let base = select(t.column("n").unwrap()).and_then(|s| s.from(&t)).unwrap();
        let a = cte("a").as_(base.clone()).unwrap();
        let err = base.with((a.clone(), a)).unwrap_err();
        assert_eq!(
            err,
            CompositionError::DuplicateCte {
                name: String::from("a")
            }
        );
    }

    #[test]
    fn test_cte_must_not_reference_outer_tables() {
        let t = numbers();
        let outer = Table::new(TableDef::new("outer_t").column(ColumnDef::new("n", DataType::Integral)));
        let query = select(outer.column("n").unwrap()).and_then(|s| s.from(&t)).unwrap();
        let err = cte("c").as_(query).unwrap_err();
        assert_eq!(
            err,
            CompositionError::OuterReference {
                table: String::from("outer_t")
            }
        );
    }
}
