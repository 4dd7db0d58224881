//! MySQL dialect.

use super::rules::{Forbid, RuleSet};
use super::{Dialect, Node};
use crate::ast::{DataType, JoinKind};

/// MySQL: backtick quoting, backslash escapes, `<=>` and `CONCAT()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySql;

impl MySql {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn escape_text(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '"' => escaped.push_str("\\\""),
                '\0' => escaped.push_str("\\0"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\u{1a}' => escaped.push_str("\\Z"),
                other => escaped.push(other),
            }
        }
        escaped
    }

    fn cast_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Integral => "SIGNED INTEGER",
            DataType::UnsignedIntegral => "UNSIGNED INTEGER",
            DataType::FloatingPoint => "DOUBLE",
            DataType::Text => "CHAR",
            DataType::Blob => "BINARY",
            DataType::Timestamp => "DATETIME",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Boolean => "BOOLEAN",
            DataType::Null | DataType::NoValue => "NULL",
        }
    }

    fn uses_null_safe_equal(&self) -> bool {
        true
    }

    fn concat_function(&self) -> Option<&'static str> {
        Some("CONCAT")
    }

    fn default_values(&self) -> &'static str {
        " () VALUES()"
    }

    fn limit_for_offset_only(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .with(Forbid::new(
                "mysql.full_outer_join",
                "MySQL does not support FULL OUTER JOIN",
                |node| matches!(node, Node::Join(JoinKind::FullOuter)),
            ))
            .with(Forbid::new(
                "mysql.boolean_cast",
                "MySQL does not support CAST to or from boolean",
                |node| {
                    matches!(node, Node::Cast { from, to }
                        if *from == DataType::Boolean || *to == DataType::Boolean)
                },
            ))
            .with(Forbid::new(
                "mysql.returning",
                "MySQL does not support RETURNING",
                |node| matches!(node, Node::Returning),
            ))
            .with(Forbid::new(
                "mysql.on_conflict",
                "MySQL does not support ON CONFLICT",
                |node| matches!(node, Node::OnConflict),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_mysql_quoting_and_escaping() {
        assert_eq!(MySql.quote_identifier("order"), "`order`");
        assert_eq!(MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(MySql.quote_identifier("users"), "users");
        assert_eq!(
            MySql.format_literal(&SqlValue::Text(String::from("it's a\\b"))),
            "'it\\'s a\\\\b'"
        );
    }

    #[test]
    fn test_mysql_overrides() {
        assert_eq!(MySql.cast_type_name(DataType::Integral), "SIGNED INTEGER");
        assert_eq!(MySql.cast_type_name(DataType::Timestamp), "DATETIME");
        assert_eq!(MySql.default_values(), " () VALUES()");
        assert_eq!(MySql.rules().len(), 4);
    }
}
