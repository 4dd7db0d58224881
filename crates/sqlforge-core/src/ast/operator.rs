//! Operators and the precedence table used for parenthesization.

/// Binding strength of an expression node.
///
/// Higher binds tighter. A child is wrapped in parentheses when it binds
/// looser than the position it is rendered in; see [`needs_parentheses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// CASE and IN: parenthesized whenever they are an operand.
    AlwaysWrap = 0,
    Or = 1,
    And = 2,
    Not = 3,
    Comparison = 4,
    Concat = 5,
    Additive = 6,
    Multiplicative = 7,
    Prefix = 8,
    Atom = 10,
}

/// Associativity of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    None,
}

/// Which side of its parent an operand is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    /// Operand of a prefix or postfix operator.
    Only,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Concat,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
        }
    }

    #[must_use]
    pub const fn precedence(self) -> Precedence {
        match self {
            Self::Or => Precedence::Or,
            Self::And => Precedence::And,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => {
                Precedence::Comparison
            }
            Self::Concat => Precedence::Concat,
            Self::Add | Self::Sub => Precedence::Additive,
            Self::Mul | Self::Div | Self::Mod => Precedence::Multiplicative,
        }
    }

    #[must_use]
    pub const fn associativity(self) -> Associativity {
        if self.is_comparison() {
            Associativity::None
        } else {
            Associativity::Left
        }
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod
        )
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "NOT ",
            Self::Neg => "-",
        }
    }

    #[must_use]
    pub const fn precedence(self) -> Precedence {
        match self {
            Self::Not => Precedence::Not,
            Self::Neg => Precedence::Prefix,
        }
    }
}

/// Decides whether a child of precedence `child` rendered at `side` of a
/// parent with precedence `parent` and associativity `assoc` needs parentheses.
#[must_use]
pub fn needs_parentheses(
    child: Precedence,
    parent: Precedence,
    assoc: Associativity,
    side: Side,
) -> bool {
    if child == Precedence::AlwaysWrap {
        return true;
    }
    if child != parent {
        return child < parent;
    }
    match (assoc, side) {
        (Associativity::Left, Side::Left) => false,
        (Associativity::Left, Side::Right) | (Associativity::None, _) => true,
        (Associativity::Left, Side::Only) => child < parent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_precedence_wraps() {
        assert!(needs_parentheses(
            Precedence::Or,
            Precedence::And,
            Associativity::Left,
            Side::Left
        ));
        assert!(!needs_parentheses(
            Precedence::Comparison,
            Precedence::And,
            Associativity::Left,
            Side::Right
        ));
    }

    #[test]
    fn test_equal_precedence_depends_on_side() {
        let sub = BinaryOp::Sub;
        assert!(!needs_parentheses(
            Precedence::Additive,
            sub.precedence(),
            sub.associativity(),
            Side::Left
        ));
        assert!(needs_parentheses(
            Precedence::Additive,
            sub.precedence(),
            sub.associativity(),
            Side::Right
        ));
        let eq = BinaryOp::Eq;
        assert!(needs_parentheses(
            Precedence::Comparison,
            eq.precedence(),
            eq.associativity(),
            Side::Left
        ));
    }

    #[test]
    fn test_always_wrap() {
        assert!(needs_parentheses(
            Precedence::AlwaysWrap,
            Precedence::Or,
            Associativity::Left,
            Side::Left
        ));
    }

    #[test]
    fn test_operator_spelling() {
        assert_eq!(BinaryOp::NotEq.as_str(), "<>");
        assert_eq!(BinaryOp::Concat.as_str(), "||");
        assert!(BinaryOp::GtEq.is_comparison());
        assert!(BinaryOp::Mod.is_arithmetic());
    }
}
