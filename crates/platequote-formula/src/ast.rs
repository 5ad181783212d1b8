//! Formula Abstract Syntax Tree types

use platequote_core::CellAddress;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Single cell reference
    CellRef(CellAddress),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Call to one of the supported functions
    Call { func: Func, args: Vec<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

/// The supported spreadsheet functions
///
/// This is a closed set: templates using anything outside it fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    If,
    Sum,
    Max,
    Min,
    Abs,
    Round,
}

impl Func {
    /// Look up a function by its (case-insensitive) spreadsheet name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "IF" => Some(Func::If),
            "SUM" => Some(Func::Sum),
            "MAX" => Some(Func::Max),
            "MIN" => Some(Func::Min),
            "ABS" => Some(Func::Abs),
            "ROUND" => Some(Func::Round),
            _ => None,
        }
    }

    /// The canonical spreadsheet name
    pub fn name(&self) -> &'static str {
        match self {
            Func::If => "IF",
            Func::Sum => "SUM",
            Func::Max => "MAX",
            Func::Min => "MIN",
            Func::Abs => "ABS",
            Func::Round => "ROUND",
        }
    }

    /// Allowed argument count as (min, max); `None` means unlimited
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Func::If => (2, Some(3)),
            Func::Sum | Func::Max | Func::Min => (1, None),
            Func::Abs => (1, Some(1)),
            Func::Round => (1, Some(2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Func::from_name("IF"), Some(Func::If));
        assert_eq!(Func::from_name("round"), Some(Func::Round));
        assert_eq!(Func::from_name("VLOOKUP"), None);
        assert_eq!(Func::from_name("NOW"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Func::If.arity(), (2, Some(3)));
        assert_eq!(Func::Sum.arity(), (1, None));
        assert_eq!(Func::Abs.arity(), (1, Some(1)));
    }
}
