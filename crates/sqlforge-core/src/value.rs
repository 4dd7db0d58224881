//! SQL values and bound parameters.
//!
//! Values supplied by the caller are never spliced into SQL text unless
//! inline rendering is explicitly requested; they travel next to the text as
//! an ordered [`Parameter`] list.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ast::types::{DataType, SqlType, ValueType};

/// A runtime SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Returns the data type of the value itself.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Boolean,
            Self::Int(_) => DataType::Integral,
            Self::UInt(_) => DataType::UnsignedIntegral,
            Self::Float(_) => DataType::FloatingPoint,
            Self::Text(_) => DataType::Text,
            Self::Blob(_) => DataType::Blob,
            Self::Date(_) => DataType::Date,
            Self::Time(_) => DataType::Time,
            Self::Timestamp(_) => DataType::Timestamp,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The value type of a literal holding this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::null(),
            other => ValueType::of(other.data_type()),
        }
    }
}

/// Types that can be bound as SQL values.
pub trait ToSqlValue: SqlType {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Widens through the shortest decimal form, so `0.1_f32` stays `0.1`.
fn widen(v: f32) -> f64 {
    v.to_string().parse().unwrap_or_else(|_| f64::from(v))
}

macro_rules! impl_to_sql_value {
    ($($ty:ty => |$v:ident| $conv:expr),+ $(,)?) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    let $v = self;
                    $conv
                }
            }
        )+
    };
}

impl_to_sql_value!(
    bool => |v| SqlValue::Bool(v),
    i8 => |v| SqlValue::Int(i64::from(v)),
    i16 => |v| SqlValue::Int(i64::from(v)),
    i32 => |v| SqlValue::Int(i64::from(v)),
    i64 => |v| SqlValue::Int(v),
    u8 => |v| SqlValue::UInt(u64::from(v)),
    u16 => |v| SqlValue::UInt(u64::from(v)),
    u32 => |v| SqlValue::UInt(u64::from(v)),
    u64 => |v| SqlValue::UInt(v),
    f32 => |v| SqlValue::Float(widen(v)),
    f64 => |v| SqlValue::Float(v),
    String => |v| SqlValue::Text(v),
    &str => |v| SqlValue::Text(String::from(v)),
    Vec<u8> => |v| SqlValue::Blob(v),
    &[u8] => |v| SqlValue::Blob(v.to_vec()),
    NaiveDate => |v| SqlValue::Date(v),
    NaiveTime => |v| SqlValue::Time(v),
    NaiveDateTime => |v| SqlValue::Timestamp(v),
    DateTime<Utc> => |v| SqlValue::Timestamp(v.naive_utc()),
);

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// One entry of the parameter list handed to the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// 1-based left-to-right position of the placeholder.
    pub ordinal: usize,
    /// Name tag of a named parameter, `None` for bound values.
    pub name: Option<String>,
    pub value_type: ValueType,
    /// The bound value; named parameters are bound later by the caller.
    pub value: Option<SqlValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Generic};

    #[test]
    fn test_conversions() {
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(7_u16.to_sql_value(), SqlValue::UInt(7));
        assert_eq!("abc".to_sql_value(), SqlValue::Text(String::from("abc")));
        assert_eq!(None::<i64>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(1.5_f64).to_sql_value(), SqlValue::Float(1.5));
    }

    #[test]
    fn test_f32_keeps_its_decimal_form() {
        let value = 0.1_f32.to_sql_value();
        assert_eq!(value, SqlValue::Float(0.1));
        assert_eq!(Generic.format_literal(&value), "0.1");
        assert!(matches!(f32::NAN.to_sql_value(), SqlValue::Float(f) if f.is_nan()));
        assert_eq!(f32::INFINITY.to_sql_value(), SqlValue::Float(f64::INFINITY));
    }

    #[test]
    fn test_value_types() {
        assert_eq!(SqlValue::Null.value_type(), ValueType::null());
        assert_eq!(
            SqlValue::Blob(vec![1]).value_type(),
            ValueType::of(DataType::Blob)
        );
        assert!(SqlValue::Null.is_null());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&SqlValue::Int(42)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":42}"#);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let json = serde_json::to_string(&SqlValue::Date(date)).unwrap();
        assert_eq!(json, r#"{"type":"date","value":"2024-02-29"}"#);
    }
}
