// Formula parsing and evaluation

pub mod eval;

pub(crate) mod parser;

use rustc_hash::FxHashSet;

use tabulon_core::Position;

use crate::value::FormulaError;

use self::eval::CellResolver;
use self::parser::Expr;

pub use self::parser::ParseError;

/// A parsed formula expression.
///
/// The rest of the engine treats this as a black box: it evaluates against a
/// [`CellResolver`], reports which positions it references, and renders its
/// canonical expression text.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    ast: Expr,
}

impl Formula {
    /// Parse expression text (without the leading `=` sigil).
    pub fn parse(expression: &str) -> Result<Formula, ParseError> {
        Ok(Formula {
            ast: parser::parse(expression)?,
        })
    }

    /// Evaluate against the given resolver.
    pub fn evaluate(&self, resolver: &dyn CellResolver) -> Result<f64, FormulaError> {
        eval::evaluate(&self.ast, resolver)
    }

    /// Positions this formula reads from: deduplicated, in first-occurrence
    /// order. Out-of-bounds references are omitted; they evaluate to `#REF!`
    /// and never join the dependency graph.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut seen = FxHashSet::default();
        let mut refs = Vec::new();
        collect_refs(&self.ast, &mut seen, &mut refs);
        refs
    }

    /// Canonical expression text with minimal parentheses.
    pub fn expression(&self) -> String {
        self.ast.to_string()
    }
}

fn collect_refs(expr: &Expr, seen: &mut FxHashSet<Position>, refs: &mut Vec<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Reference(pos) => {
            if pos.is_valid() && seen.insert(*pos) {
                refs.push(*pos);
            }
        }
        Expr::Unary { operand, .. } => collect_refs(operand, seen, refs),
        Expr::Binary { left, right, .. } => {
            collect_refs(left, seen, refs);
            collect_refs(right, seen, refs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_parse_and_expression() {
        let formula = Formula::parse("A1 * 2").unwrap();
        assert_eq!(formula.expression(), "A1*2");
    }

    #[test]
    fn test_parse_error_surfaces() {
        assert!(Formula::parse("1+").is_err());
        assert!(Formula::parse("()").is_err());
    }

    #[test]
    fn test_referenced_cells_dedup_in_order() {
        let formula = Formula::parse("B1+A1*B1+C1").unwrap();
        assert_eq!(
            formula.referenced_cells(),
            vec![pos(0, 1), pos(0, 0), pos(0, 2)]
        );
    }

    #[test]
    fn test_referenced_cells_skip_out_of_bounds() {
        let formula = Formula::parse("A1+A99999").unwrap();
        assert_eq!(formula.referenced_cells(), vec![pos(0, 0)]);
    }

    #[test]
    fn test_literal_formula_has_no_references() {
        let formula = Formula::parse("1+2*3").unwrap();
        assert!(formula.referenced_cells().is_empty());
    }
}
