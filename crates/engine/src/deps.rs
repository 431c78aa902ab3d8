//! Reverse-dependency edges between cells.
//!
//! Tracks dependents only: for a referenced position B, the set of formula
//! cells whose content reads B. Forward edges (what a formula references) are
//! never stored; they are recomputed on demand from cell content, so the two
//! directions cannot drift apart.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B's formula references A"  (B is a dependent of A)
//! ```
//!
//! # Invariants
//!
//! 1. For every live cell B whose content references A, `dependents(A)`
//!    contains B after every successful sheet mutation.
//! 2. No dangling entries: a set emptied by edge removal is dropped from the
//!    map.
//! 3. Set semantics: adding or removing an edge twice is a no-op.
//!
//! Edges are keyed by position, not by cell, so they survive erasure of the
//! referenced cell's table entry: the dependent's formula still references
//! that position, and the link snaps back into use if the position is
//! repopulated.

use rustc_hash::{FxHashMap, FxHashSet};

use tabulon_core::Position;

#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    /// Dependents: for each referenced position A, the formula cells B that
    /// read it. A -> {B1, B2, ...}
    dependents: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cells whose formulas reference `pos`.
    pub fn dependents(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.dependents
            .get(&pos)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn dependent_count(&self, pos: Position) -> usize {
        self.dependents.get(&pos).map_or(0, |s| s.len())
    }

    /// Record that `dependent`'s formula references `referenced`. Idempotent.
    pub(crate) fn add_edge(&mut self, referenced: Position, dependent: Position) {
        self.dependents
            .entry(referenced)
            .or_default()
            .insert(dependent);
    }

    /// Drop the edge if present. Idempotent; removes emptied sets.
    pub(crate) fn remove_edge(&mut self, referenced: Position, dependent: Position) {
        if let Some(set) = self.dependents.get_mut(&referenced) {
            set.remove(&dependent);
            if set.is_empty() {
                self.dependents.remove(&referenced);
            }
        }
    }

    /// Check invariants 2 and 3 hold structurally. Test builds only.
    #[cfg(test)]
    pub(crate) fn assert_no_dangling(&self) {
        for (pos, set) in &self.dependents {
            assert!(!set.is_empty(), "empty dependent set stored for {}", pos);
        }
    }
}
