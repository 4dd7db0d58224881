//! Generic SQL dialect.

use super::Dialect;

/// ANSI-flavored SQL with `"` quoting and `?` placeholders. Accepts every
/// statement shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generic;

impl Generic {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;

    #[test]
    fn test_generic_dialect() {
        let dialect = Generic::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote(), '"');
        assert_eq!(dialect.placeholder(3), "?");
        assert_eq!(dialect.default_values(), " DEFAULT VALUES");
        assert_eq!(dialect.cast_type_name(DataType::Integral), "BIGINT");
        assert!(dialect.concat_function().is_none());
        assert!(dialect.limit_for_offset_only().is_none());
        assert!(dialect.rules().is_empty());
    }
}
