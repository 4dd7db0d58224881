//! SQL dialect support.
//!
//! Backends differ in how they quote identifiers, spell placeholders and
//! literals, and in which statement shapes they accept at all. A dialect is
//! a value implementing [`Dialect`]; it is passed explicitly to every
//! check and serialization call.

mod generic;
mod mysql;
mod postgres;
pub mod rules;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ast::{DataType, UnionKind};
use crate::error::ConfigError;
use crate::value::SqlValue;

pub use generic::Generic;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use rules::{CompatibilityRule, Node, RuleSet};
pub use sqlite::Sqlite;

/// Keywords that are always quoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN",
    "CONFLICT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DEFAULT", "DELETE", "DESC",
    "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FOR", "FOREIGN",
    "FROM", "FULL", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
    "JOIN", "KEY", "LEFT", "LIKE", "LIMIT", "NOT", "NOTHING", "NULL", "OFFSET", "ON", "OR",
    "ORDER", "OUTER", "OVER", "PRIMARY", "RECURSIVE", "REFERENCES", "RETURNING", "RIGHT",
    "SELECT", "SET", "TABLE", "THEN", "TO", "TRUE", "TRUNCATE", "UNION", "UNIQUE", "UPDATE",
    "USER", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

/// Returns `true` if `word` is a reserved keyword, ignoring case.
#[must_use]
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

/// Returns `true` if `name` can be written without quotes:
/// `[A-Za-z_][A-Za-z0-9_]*` and not a reserved keyword.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved_word(name)
}

/// Rendering overrides and compatibility rules of one backend.
///
/// Every method except [`Dialect::name`] has the generic SQL behavior as
/// default, so a dialect only spells out where it differs.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect, used in diagnostics and logs.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier if it is not plain.
    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) {
            return String::from(name);
        }
        let quote = self.identifier_quote();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(quote);
        for c in name.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Returns the placeholder for the parameter at 1-based `ordinal`.
    fn placeholder(&self, _ordinal: usize) -> String {
        String::from("?")
    }

    /// Escapes the content of a text literal (without the surrounding quotes).
    fn escape_text(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    fn format_blob(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
        format!("X'{hex}'")
    }

    fn format_date(&self, date: NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    fn format_time(&self, time: NaiveTime) -> String {
        format!("TIME '{}'", time.format("%H:%M:%S%.6f"))
    }

    fn format_timestamp(&self, timestamp: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", timestamp.format("%Y-%m-%d %H:%M:%S%.6f"))
    }

    /// Renders a value as an inline literal.
    fn format_literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(true) => String::from("TRUE"),
            SqlValue::Bool(false) => String::from("FALSE"),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::UInt(n) => n.to_string(),
            SqlValue::Float(f) if f.is_nan() => String::from("'NaN'"),
            SqlValue::Float(f) if f.is_infinite() && f.is_sign_positive() => {
                String::from("'Inf'")
            }
            SqlValue::Float(f) if f.is_infinite() => String::from("'-Inf'"),
            SqlValue::Float(f) => format!("{f:?}"),
            SqlValue::Text(text) => format!("'{}'", self.escape_text(text)),
            SqlValue::Blob(bytes) => self.format_blob(bytes),
            SqlValue::Date(date) => self.format_date(*date),
            SqlValue::Time(time) => self.format_time(*time),
            SqlValue::Timestamp(timestamp) => self.format_timestamp(*timestamp),
        }
    }

    /// Returns the type name used in `CAST(x AS type)`.
    fn cast_type_name(&self, data_type: DataType) -> &'static str {
        match data_type {
            DataType::Boolean => "BOOLEAN",
            DataType::Integral => "BIGINT",
            DataType::UnsignedIntegral => "BIGINT UNSIGNED",
            DataType::FloatingPoint => "DOUBLE",
            DataType::Text => "VARCHAR",
            DataType::Blob => "BLOB",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Null | DataType::NoValue => "NULL",
        }
    }

    /// Whether `a IS [NOT] DISTINCT FROM b` is spelled with MySQL's `<=>`.
    fn uses_null_safe_equal(&self) -> bool {
        false
    }

    /// The function replacing the `||` operator, if the dialect has one.
    fn concat_function(&self) -> Option<&'static str> {
        None
    }

    /// Text following `INSERT INTO table` when no value is given.
    fn default_values(&self) -> &'static str {
        " DEFAULT VALUES"
    }

    /// Keyword joining two UNION operands, with surrounding spaces.
    fn union_keyword(&self, kind: UnionKind) -> &'static str {
        kind.as_str()
    }

    /// Row count rendered as LIMIT when only OFFSET is given, if the
    /// dialect cannot express OFFSET alone.
    fn limit_for_offset_only(&self) -> Option<&'static str> {
        None
    }

    /// Statement shapes this dialect rejects.
    fn rules(&self) -> RuleSet {
        RuleSet::new()
    }
}

/// A `MAJOR.MINOR.PATCH` backend version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidVersion {
            version: String::from(s),
            reason: String::from(reason),
        };
        let parts: Vec<&str> = s.split('.').collect();
        let &[major, minor, patch] = parts.as_slice() else {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        };
        let number = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| invalid("components must be unsigned integers"))
        };
        Ok(Self::new(number(major)?, number(minor)?, number(patch)?))
    }
}

impl TryFrom<String> for Version {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
