//! Semantic data types carried by every expression node.

use core::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The data type tag of a value expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// The node has no value (a table, a `*`).
    NoValue,
    /// The untyped `NULL` literal, compatible with every valued type.
    Null,
    Boolean,
    Integral,
    UnsignedIntegral,
    FloatingPoint,
    Text,
    Blob,
    Date,
    Time,
    Timestamp,
}

impl DataType {
    /// Returns `true` unless this is [`DataType::NoValue`].
    #[must_use]
    pub const fn has_value(self) -> bool {
        !matches!(self, Self::NoValue)
    }

    /// Boolean, integral, unsigned and floating point all take part in arithmetic.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Null | Self::Boolean | Self::Integral | Self::UnsignedIntegral | Self::FloatingPoint
        )
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Null | Self::Boolean | Self::Integral | Self::UnsignedIntegral
        )
    }

    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::Null | Self::Boolean)
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Null | Self::Text)
    }

    const fn is_date_or_timestamp(self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }

    /// Whether values of the two types can be compared with each other.
    #[must_use]
    pub const fn is_comparable_with(self, other: Self) -> bool {
        match (self, other) {
            (Self::NoValue, _) | (_, Self::NoValue) => false,
            (Self::Null, _) | (_, Self::Null) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (a, b) if a.is_date_or_timestamp() && b.is_date_or_timestamp() => true,
            (Self::Text, Self::Text) | (Self::Blob, Self::Blob) | (Self::Time, Self::Time) => true,
            _ => false,
        }
    }

    /// Whether a result column of this type can stand in for one of `other`.
    #[must_use]
    pub fn is_result_compatible_with(self, other: Self) -> bool {
        self == other || matches!(self, Self::Null) || matches!(other, Self::Null)
    }

    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoValue => "no value",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integral => "integral",
            Self::UnsignedIntegral => "unsigned integral",
            Self::FloatingPoint => "floating point",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A data type plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType {
    pub data_type: DataType,
    pub nullable: bool,
}

impl ValueType {
    #[must_use]
    pub const fn new(data_type: DataType, nullable: bool) -> Self {
        Self {
            data_type,
            nullable,
        }
    }

    /// A non-nullable value of the given type.
    #[must_use]
    pub const fn of(data_type: DataType) -> Self {
        Self::new(data_type, false)
    }

    /// A nullable value of the given type.
    #[must_use]
    pub const fn nullable(data_type: DataType) -> Self {
        Self::new(data_type, true)
    }

    /// The type of the `NULL` literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::new(DataType::Null, true)
    }

    #[must_use]
    pub const fn no_value() -> Self {
        Self::new(DataType::NoValue, false)
    }

    /// Makes the type nullable if `nullable` is set, keeps it otherwise.
    #[must_use]
    pub const fn or_nullable(self, nullable: bool) -> Self {
        Self::new(self.data_type, self.nullable || nullable)
    }

    #[must_use]
    pub const fn has_value(self) -> bool {
        self.data_type.has_value()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable && !matches!(self.data_type, DataType::Null) {
            write!(f, "nullable {}", self.data_type)
        } else {
            write!(f, "{}", self.data_type)
        }
    }
}

/// Maps a Rust type to the SQL value type it is stored as.
pub trait SqlType {
    const VALUE_TYPE: ValueType;
}

macro_rules! impl_sql_type {
    ($data_type:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl SqlType for $ty {
                const VALUE_TYPE: ValueType = ValueType::of(DataType::$data_type);
            }
        )+
    };
}

impl_sql_type!(Boolean => bool);
impl_sql_type!(Integral => i8, i16, i32, i64);
impl_sql_type!(UnsignedIntegral => u8, u16, u32, u64);
impl_sql_type!(FloatingPoint => f32, f64);
impl_sql_type!(Text => String, &str);
impl_sql_type!(Blob => Vec<u8>, &[u8]);
impl_sql_type!(Date => NaiveDate);
impl_sql_type!(Time => NaiveTime);
impl_sql_type!(Timestamp => NaiveDateTime, DateTime<Utc>);

impl<T: SqlType> SqlType for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE.or_nullable(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparability() {
        assert!(DataType::Integral.is_comparable_with(DataType::FloatingPoint));
        assert!(DataType::Boolean.is_comparable_with(DataType::UnsignedIntegral));
        assert!(DataType::Date.is_comparable_with(DataType::Timestamp));
        assert!(DataType::Null.is_comparable_with(DataType::Blob));
        assert!(!DataType::Text.is_comparable_with(DataType::Integral));
        assert!(!DataType::Time.is_comparable_with(DataType::Date));
        assert!(!DataType::NoValue.is_comparable_with(DataType::Null));
    }

    #[test]
    fn test_rust_type_mapping() {
        assert_eq!(i32::VALUE_TYPE, ValueType::of(DataType::Integral));
        assert_eq!(u64::VALUE_TYPE, ValueType::of(DataType::UnsignedIntegral));
        assert_eq!(
            <Option<String>>::VALUE_TYPE,
            ValueType::nullable(DataType::Text)
        );
        assert_eq!(
            <DateTime<Utc>>::VALUE_TYPE,
            ValueType::of(DataType::Timestamp)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueType::nullable(DataType::Integral).to_string(), "nullable integral");
        assert_eq!(ValueType::null().to_string(), "null");
        assert_eq!(ValueType::of(DataType::Text).to_string(), "text");
    }
}
