//! Memoized per-column block cursors shared by all rebuilds against one document.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chartseq_common::SheetIndex;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Last block index a reader touched in one column.
///
/// Positions are hints: the column validates them on every lookup, so a stale or
/// concurrently overwritten value costs a search but never yields a wrong cell.
#[derive(Debug, Clone, Default)]
pub struct ColumnBlockPosition(Arc<AtomicUsize>);

impl ColumnBlockPosition {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, block: usize) {
        self.0.store(block, Ordering::Relaxed);
    }
}

/// `(sheet, column) -> ColumnBlockPosition`, populated lazily.
///
/// The lock is held only for lookup-or-insert; callers walk the column with the
/// returned handle without holding it.
#[derive(Debug, Default)]
pub struct BlockPositionCache {
    positions: Mutex<FxHashMap<(SheetIndex, u32), ColumnBlockPosition>>,
}

impl BlockPositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_position(&self, sheet: SheetIndex, col: u32) -> ColumnBlockPosition {
        self.positions
            .lock()
            .entry((sheet, col))
            .or_default()
            .clone()
    }

    /// Drop every cached position. Called by the document after structural edits.
    pub fn clear(&self) {
        self.positions.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.positions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
