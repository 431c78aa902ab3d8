// Formula evaluator - walks the AST against a cell-value resolver.

use tabulon_core::Position;

use crate::value::{FormulaError, Value};

use super::parser::{BinaryOp, Expr, UnaryOp};

/// Resolves a referenced position to the current value of the cell stored
/// there. `None` means no cell is stored at that position.
pub trait CellResolver {
    fn value_at(&self, pos: Position) -> Option<Value>;
}

pub(crate) fn evaluate(expr: &Expr, resolver: &dyn CellResolver) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Reference(pos) => {
            if !pos.is_valid() {
                return Err(FormulaError::Ref);
            }
            coerce_to_number(resolver.value_at(*pos))
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, resolver)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary { op, left, right } => {
            let lhs = evaluate(left, resolver)?;
            let rhs = evaluate(right, resolver)?;
            match op {
                BinaryOp::Add => Ok(lhs + rhs),
                BinaryOp::Sub => Ok(lhs - rhs),
                BinaryOp::Mul => Ok(lhs * rhs),
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        Err(FormulaError::Div0)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
            }
        }
    }
}

/// Coercion at the cell boundary: absent cells read as zero, text coerces
/// only when it is empty (zero) or all decimal digits, and an upstream error
/// value fails the whole evaluation with that error.
fn coerce_to_number(value: Option<Value>) -> Result<f64, FormulaError> {
    let Some(value) = value else {
        return Ok(0.0);
    };
    match value {
        Value::Number(n) => Ok(n),
        Value::Text(s) => {
            if s.is_empty() {
                return Ok(0.0);
            }
            if !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FormulaError::Value);
            }
            s.parse::<f64>().map_err(|_| FormulaError::Value)
        }
        Value::Error(e) => Err(e),
    }
}
