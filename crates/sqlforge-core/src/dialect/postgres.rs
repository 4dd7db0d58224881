//! PostgreSQL dialect.

use super::rules::{Forbid, RuleSet};
use super::{Dialect, Node};
use crate::ast::DataType;

/// PostgreSQL: numbered `$N` placeholders and `bytea` hex blobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Postgres;

impl Postgres {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("${ordinal}")
    }

    fn format_blob(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        format!("'\\x{hex}'")
    }

    fn cast_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Boolean => "BOOLEAN",
            DataType::Integral | DataType::UnsignedIntegral => "BIGINT",
            DataType::FloatingPoint => "DOUBLE PRECISION",
            DataType::Text => "VARCHAR",
            DataType::Blob => "BYTEA",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Null | DataType::NoValue => "NULL",
        }
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .with(Forbid::new(
                "postgresql.unsigned_cast",
                "PostgreSQL has no unsigned integer type to CAST to",
                |node| matches!(node, Node::Cast { to: DataType::UnsignedIntegral, .. }),
            ))
            .with(Forbid::new(
                "postgresql.boolean_to_numeric_cast",
                "PostgreSQL does not support CAST of boolean to a numeric type",
                |node| {
                    matches!(node, Node::Cast { from: DataType::Boolean, to }
                        if matches!(to, DataType::Integral | DataType::UnsignedIntegral | DataType::FloatingPoint))
                },
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_postgres_rendering() {
        assert_eq!(Postgres.placeholder(1), "$1");
        assert_eq!(Postgres.placeholder(12), "$12");
        assert_eq!(
            Postgres.format_literal(&SqlValue::Blob(vec![0xde, 0xad])),
            "'\\xdead'"
        );
        assert_eq!(
            Postgres.cast_type_name(DataType::FloatingPoint),
            "DOUBLE PRECISION"
        );
        assert_eq!(Postgres.cast_type_name(DataType::Blob), "BYTEA");
    }

    #[test]
    fn test_postgres_cast_rules() {
        let rules = Postgres.rules();
        let to_unsigned = Node::Cast {
            from: DataType::Integral,
            to: DataType::UnsignedIntegral,
        };
        let bool_to_float = Node::Cast {
            from: DataType::Boolean,
            to: DataType::FloatingPoint,
        };
        let bool_to_text = Node::Cast {
            from: DataType::Boolean,
            to: DataType::Text,
        };
        assert_eq!(
            rules.violation(&to_unsigned).map(|(rule, _)| rule),
            Some("postgresql.unsigned_cast")
        );
        assert_eq!(
            rules.violation(&bool_to_float).map(|(rule, _)| rule),
            Some("postgresql.boolean_to_numeric_cast")
        );
        assert!(rules.violation(&bool_to_text).is_none());
    }
}
