//! Formula evaluator
//!
//! Walks a parsed [`Expr`] against a worksheet snapshot and produces a
//! number. Cell references resolve to the snapshot's current numeric values;
//! absent or non-numeric cells count as `0.0`, matching how the templates are
//! built (empty helper cells participate in sums).

use crate::ast::{BinaryOperator, Expr, Func, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use platequote_core::Worksheet;

/// Value types during evaluation
///
/// Comparisons produce booleans so IF conditions behave properly; everywhere
/// a number is needed, booleans coerce to 0/1 the way spreadsheets do.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Number(f64),
    Boolean(bool),
}

impl Value {
    fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
        }
    }

    fn as_bool(self) -> bool {
        match self {
            Value::Boolean(b) => b,
            Value::Number(n) => n != 0.0,
        }
    }
}

/// Evaluate a formula AST against a worksheet snapshot
///
/// Returns an error if the result is NaN or infinite (e.g. division by
/// zero); callers treat that as "could not compute", not as a hard failure.
pub fn evaluate(expr: &Expr, sheet: &Worksheet) -> FormulaResult<f64> {
    let result = eval_expr(expr, sheet)?.as_number();
    if result.is_finite() {
        Ok(result)
    } else {
        Err(FormulaError::NonFinite)
    }
}

fn eval_expr(expr: &Expr, sheet: &Worksheet) -> FormulaResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),

        // Absent and non-numeric cells resolve to 0.0
        Expr::CellRef(addr) => Ok(Value::Number(sheet.get_numeric(*addr).unwrap_or(0.0))),

        Expr::UnaryOp { op, operand } => {
            let v = eval_expr(operand, sheet)?.as_number();
            match op {
                UnaryOperator::Negate => Ok(Value::Number(-v)),
            }
        }

        Expr::BinaryOp { op, left, right } => {
            let lhs = eval_expr(left, sheet)?;
            let rhs = eval_expr(right, sheet)?;
            eval_binary(*op, lhs, rhs)
        }

        Expr::Call { func, args } => eval_call(*func, args, sheet),
    }
}

fn eval_binary(op: BinaryOperator, lhs: Value, rhs: Value) -> FormulaResult<Value> {
    let l = lhs.as_number();
    let r = rhs.as_number();

    let value = match op {
        BinaryOperator::Add => Value::Number(l + r),
        BinaryOperator::Subtract => Value::Number(l - r),
        BinaryOperator::Multiply => Value::Number(l * r),
        BinaryOperator::Divide => Value::Number(l / r),
        BinaryOperator::Power => Value::Number(l.powf(r)),
        BinaryOperator::Equal => Value::Boolean(l == r),
        BinaryOperator::NotEqual => Value::Boolean(l != r),
        BinaryOperator::LessThan => Value::Boolean(l < r),
        BinaryOperator::LessEqual => Value::Boolean(l <= r),
        BinaryOperator::GreaterThan => Value::Boolean(l > r),
        BinaryOperator::GreaterEqual => Value::Boolean(l >= r),
    };

    Ok(value)
}

fn eval_call(func: Func, args: &[Expr], sheet: &Worksheet) -> FormulaResult<Value> {
    match func {
        // IF evaluates only the taken branch, so a nested IF chain never
        // touches cells on the untaken side
        Func::If => {
            let condition = eval_expr(&args[0], sheet)?.as_bool();
            if condition {
                eval_expr(&args[1], sheet)
            } else if let Some(false_branch) = args.get(2) {
                eval_expr(false_branch, sheet)
            } else {
                Ok(Value::Number(0.0))
            }
        }

        Func::Sum => {
            let mut sum = 0.0;
            for arg in args {
                sum += eval_expr(arg, sheet)?.as_number();
            }
            Ok(Value::Number(sum))
        }

        Func::Max => {
            let mut max = f64::NEG_INFINITY;
            for arg in args {
                max = max.max(eval_expr(arg, sheet)?.as_number());
            }
            Ok(Value::Number(max))
        }

        Func::Min => {
            let mut min = f64::INFINITY;
            for arg in args {
                min = min.min(eval_expr(arg, sheet)?.as_number());
            }
            Ok(Value::Number(min))
        }

        Func::Abs => {
            let v = eval_expr(&args[0], sheet)?.as_number();
            Ok(Value::Number(v.abs()))
        }

        Func::Round => {
            let v = eval_expr(&args[0], sheet)?.as_number();
            let digits = match args.get(1) {
                Some(arg) => eval_expr(arg, sheet)?.as_number().trunc() as i32,
                None => 0,
            };
            Ok(Value::Number(round_half_away(v, digits)))
        }
    }
}

/// Round to `digits` decimal places, half away from zero on the scaled value
fn round_half_away(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
