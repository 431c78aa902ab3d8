//! The sheet: sparse cell table, dependency wiring, eager cache refresh.
//!
//! All mutation funnels through [`Sheet::set_cell`] and [`Sheet::clear_cell`].
//! Each write leaves the reverse-dependency edges synchronized with cell
//! content, every affected formula cache recomputed, and the printable
//! bounding box exact. Reads never mutate.

use std::io;

use rustc_hash::{FxHashMap, FxHashSet};

use tabulon_core::{Position, Size};

use crate::cell::{Cell, CellContent};
use crate::deps::DepGraph;
use crate::error::SheetError;
use crate::formula::eval::CellResolver;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
    deps: DepGraph,
    printable_size: Size,
    cells_recomputed: u64,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of the cell at `pos` from raw input text.
    ///
    /// Writes are all-or-nothing: a parse failure or a would-be circular
    /// reference rejects the edit with the sheet exactly as before. A write
    /// whose text equals the cell's current text is a no-op, so repeated
    /// identical writes cost nothing and trigger no recomputation.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        self.check_position(pos)?;

        if let Some(cell) = self.cells.get(&pos) {
            if cell.text() == text {
                return Ok(());
            }
        }

        let content = CellContent::classify(text)?;
        let new_refs = content.referenced_cells();

        if self.creates_cycle(pos, &new_refs) {
            return Err(SheetError::CircularDependency(pos));
        }

        // Committed. Unlink the reverse edges of whatever the old content
        // referenced before it is discarded.
        let old_refs = self
            .cells
            .get(&pos)
            .map(|cell| cell.referenced_cells())
            .unwrap_or_default();
        for referenced in old_refs {
            self.deps.remove_edge(referenced, pos);
        }

        self.cells
            .entry(pos)
            .or_insert_with(Cell::empty)
            .replace(content);

        // Link the new references, materializing an empty cell at any
        // not-yet-existing position so the reverse edge has a live home.
        for referenced in &new_refs {
            self.cells.entry(*referenced).or_insert_with(Cell::empty);
            self.deps.add_edge(*referenced, pos);
        }

        self.rescan_printable_size();
        self.refresh_transitive(pos);

        Ok(())
    }

    /// Read-only handle to the cell at `pos`. `Ok(None)` means no cell is
    /// stored there (implicitly empty).
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        self.check_position(pos)?;
        Ok(self.cells.get(&pos))
    }

    /// Erase the cell at `pos`. No-op if absent.
    ///
    /// The erased cell's forward links are unwired; reverse edges pointing
    /// *at* `pos` stay (their formulas still reference the position), and
    /// those dependents are refreshed so they settle on the empty reading.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        self.check_position(pos)?;

        let Some(cell) = self.cells.remove(&pos) else {
            return Ok(());
        };
        for referenced in cell.referenced_cells() {
            self.deps.remove_edge(referenced, pos);
        }

        self.rescan_printable_size();
        self.refresh_transitive(pos);

        Ok(())
    }

    /// Smallest bounding box covering every stored cell. O(1) read.
    pub fn printable_size(&self) -> Size {
        self.printable_size
    }

    /// Cells whose formulas reference `pos`.
    pub fn dependents(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.deps.dependents(pos)
    }

    /// Running count of formula cache refreshes. Repeated identical writes
    /// leave this untouched; diamond-shaped fan-in bumps it more than once
    /// per edit.
    pub fn cells_recomputed(&self) -> u64 {
        self.cells_recomputed
    }

    /// Write the value of every cell in the bounding box, tab-separated,
    /// one line per row. Absent cells render as empty fields.
    pub fn render_values<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.render_with(out, |cell| cell.value().to_string())
    }

    /// Write the raw text of every cell in the bounding box, tab-separated,
    /// one line per row. Absent cells render as empty fields.
    pub fn render_texts<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.render_with(out, |cell| cell.text())
    }

    fn render_with<W: io::Write>(
        &self,
        out: &mut W,
        field: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        let Size { rows, cols } = self.printable_size;
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    write!(out, "{}", field(cell))?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn check_position(&self, pos: Position) -> Result<(), SheetError> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(SheetError::InvalidPosition(pos))
        }
    }

    /// Would a formula at `target` reading `refs` close a loop?
    ///
    /// Depth-first over forward references, explicit stack, no mutation.
    /// The pre-edit graph is acyclic, so the visited set is purely a
    /// complexity bound: O(V+E) over the reachable subgraph.
    fn creates_cycle(&self, target: Position, refs: &[Position]) -> bool {
        let mut visited: FxHashSet<Position> = FxHashSet::default();
        let mut stack: Vec<Position> = refs.to_vec();

        while let Some(pos) = stack.pop() {
            if pos == target {
                return true;
            }
            if !visited.insert(pos) {
                continue;
            }
            // A position with no live cell is a dead end.
            if let Some(cell) = self.cells.get(&pos) {
                stack.extend(cell.referenced_cells());
            }
        }

        false
    }

    /// Recompute the cache at `start`, then push the change through every
    /// dependent, eagerly.
    ///
    /// Explicit worklist, no recursion. Not deduplicated: a cell reachable
    /// along two paths is recomputed once per path, and each recomputation
    /// re-enqueues its own dependents, so the last recomputation of any cell
    /// runs after all of its upstream refreshes. Positions that no longer
    /// resolve to a live cell are skipped.
    fn refresh_transitive(&mut self, start: Position) {
        let mut worklist = vec![start];

        while let Some(pos) = worklist.pop() {
            let recomputed = match self.cells.get(&pos) {
                Some(cell) => match cell.content() {
                    CellContent::Formula { formula, .. } => {
                        let resolver = SheetResolver { sheet: &*self };
                        Some(match formula.evaluate(&resolver) {
                            Ok(n) => Value::Number(n),
                            Err(e) => Value::Error(e),
                        })
                    }
                    _ => None,
                },
                None => None,
            };

            if let Some(value) = recomputed {
                if let Some(cell) = self.cells.get_mut(&pos) {
                    cell.set_cache(value);
                }
                self.cells_recomputed += 1;
            }

            worklist.extend(self.deps.dependents(pos));
        }
    }

    /// Full rescan; never decremented incrementally, so the box can only be
    /// exactly right.
    fn rescan_printable_size(&mut self) {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        self.printable_size = size;
    }
}

// =============================================================================
// SheetResolver - CellResolver over the sheet's table
// =============================================================================

/// Read-only resolver handed to formula evaluation. Formula cells resolve to
/// their cached value, so evaluation never recurses through the sheet.
struct SheetResolver<'a> {
    sheet: &'a Sheet,
}

impl CellResolver for SheetResolver<'_> {
    fn value_at(&self, pos: Position) -> Option<Value> {
        self.sheet.cells.get(&pos).map(Cell::value)
    }
}
