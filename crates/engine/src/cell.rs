//! Cell content model.
//!
//! A cell holds one of three content variants. Classification of raw input
//! text is bit-exact: the empty string is Empty (checked before any byte
//! inspection), `=` plus a non-empty remainder is a formula, everything else
//! is literal text, including a leading `'`, which escapes the value but
//! stays in the raw text.

use tabulon_core::Position;

use crate::formula::{Formula, ParseError};
use crate::value::Value;

/// Leading character marking formula content.
pub const FORMULA_SIGIL: char = '=';
/// Leading character escaping text that would otherwise parse as a formula.
pub const ESCAPE_MARKER: char = '\'';

#[derive(Debug, Clone, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Text(String),
    Formula {
        formula: Formula,
        /// Last evaluated value; kept fresh by the sheet's eager refresh.
        cache: Value,
    },
}

impl CellContent {
    /// Classify raw input text into a content variant.
    ///
    /// Does not touch dependency links or caches; only the sheet has the
    /// global view for that. A freshly classified formula carries a zero
    /// cache; the sheet refreshes it before the content becomes readable.
    pub(crate) fn classify(text: &str) -> Result<CellContent, ParseError> {
        if text.is_empty() {
            return Ok(CellContent::Empty);
        }
        if let Some(expression) = text.strip_prefix(FORMULA_SIGIL) {
            if !expression.is_empty() {
                let formula = Formula::parse(expression)?;
                return Ok(CellContent::Formula {
                    formula,
                    cache: Value::Number(0.0),
                });
            }
        }
        Ok(CellContent::Text(text.to_string()))
    }

    pub(crate) fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellContent::Empty | CellContent::Text(_) => Vec::new(),
            CellContent::Formula { formula, .. } => formula.referenced_cells(),
        }
    }
}

/// One cell of a sheet. Identity is its position in the owning sheet's
/// table; the struct itself only owns content.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    content: CellContent,
}

impl Cell {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn content(&self) -> &CellContent {
        &self.content
    }

    /// Swap in new content, discarding the previous variant.
    pub(crate) fn replace(&mut self, content: CellContent) {
        self.content = content;
    }

    /// Store a freshly computed value. No-op for non-formula content, whose
    /// value derives from the content itself.
    pub(crate) fn set_cache(&mut self, value: Value) {
        if let CellContent::Formula { cache, .. } = &mut self.content {
            *cache = value;
        }
    }

    /// The externally observable value of this cell.
    pub fn value(&self) -> Value {
        match &self.content {
            CellContent::Empty => Value::Number(0.0),
            CellContent::Text(text) => {
                let literal = text.strip_prefix(ESCAPE_MARKER).unwrap_or(text);
                Value::Text(literal.to_string())
            }
            CellContent::Formula { cache, .. } => cache.clone(),
        }
    }

    /// The raw text of this cell: empty, the literal text including any
    /// escape marker, or the sigil plus the canonical expression.
    pub fn text(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Text(text) => text.clone(),
            CellContent::Formula { formula, .. } => {
                format!("{}{}", FORMULA_SIGIL, formula.expression())
            }
        }
    }

    /// Positions this cell's content reads from. Forward edges are recomputed
    /// from content, never stored.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.content.referenced_cells()
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula { .. })
    }
}
