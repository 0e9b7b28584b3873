//! Segmented column storage.
//!
//! A column is a run of typed blocks laid end to end from row 0. Adjacent blocks never
//! share a type and the column never ends with an empty block, so the block list stays
//! short for typical data and a positional hint makes sequential reads O(1).

use chartseq_common::{CellErrorKind, CellValue};

/// Storage classification of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Empty,
    Numeric,
    Text,
    Boolean,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
enum BlockData {
    Empty(u32),
    Numeric(Vec<f64>),
    Text(Vec<String>),
    Boolean(Vec<bool>),
    Error(Vec<CellErrorKind>),
}

impl BlockData {
    fn single(value: CellValue) -> Self {
        match value {
            CellValue::Empty => BlockData::Empty(1),
            CellValue::Number(n) => BlockData::Numeric(vec![n]),
            CellValue::Text(s) => BlockData::Text(vec![s]),
            CellValue::Boolean(b) => BlockData::Boolean(vec![b]),
            CellValue::Error(e) => BlockData::Error(vec![e]),
        }
    }

    fn kind(&self) -> CellKind {
        match self {
            BlockData::Empty(_) => CellKind::Empty,
            BlockData::Numeric(_) => CellKind::Numeric,
            BlockData::Text(_) => CellKind::Text,
            BlockData::Boolean(_) => CellKind::Boolean,
            BlockData::Error(_) => CellKind::Error,
        }
    }

    fn len(&self) -> u32 {
        match self {
            BlockData::Empty(n) => *n,
            BlockData::Numeric(v) => v.len() as u32,
            BlockData::Text(v) => v.len() as u32,
            BlockData::Boolean(v) => v.len() as u32,
            BlockData::Error(v) => v.len() as u32,
        }
    }

    fn get(&self, offset: u32) -> CellValue {
        let i = offset as usize;
        match self {
            BlockData::Empty(_) => CellValue::Empty,
            BlockData::Numeric(v) => v.get(i).map_or(CellValue::Empty, |n| CellValue::Number(*n)),
            BlockData::Text(v) => v
                .get(i)
                .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
            BlockData::Boolean(v) => v.get(i).map_or(CellValue::Empty, |b| CellValue::Boolean(*b)),
            BlockData::Error(v) => v.get(i).map_or(CellValue::Empty, |e| CellValue::Error(*e)),
        }
    }

    /// Overwrite a slot with a value of the same kind. Returns false on kind mismatch.
    fn put(&mut self, offset: u32, value: CellValue) -> bool {
        let i = offset as usize;
        match (self, value) {
            (BlockData::Empty(_), CellValue::Empty) => true,
            (BlockData::Numeric(v), CellValue::Number(n)) => {
                v[i] = n;
                true
            }
            (BlockData::Text(v), CellValue::Text(s)) => {
                v[i] = s;
                true
            }
            (BlockData::Boolean(v), CellValue::Boolean(b)) => {
                v[i] = b;
                true
            }
            (BlockData::Error(v), CellValue::Error(e)) => {
                v[i] = e;
                true
            }
            _ => false,
        }
    }

    fn split_off(&mut self, at: u32) -> BlockData {
        let i = at as usize;
        match self {
            BlockData::Empty(n) => {
                let tail = *n - at;
                *n = at;
                BlockData::Empty(tail)
            }
            BlockData::Numeric(v) => BlockData::Numeric(v.split_off(i)),
            BlockData::Text(v) => BlockData::Text(v.split_off(i)),
            BlockData::Boolean(v) => BlockData::Boolean(v.split_off(i)),
            BlockData::Error(v) => BlockData::Error(v.split_off(i)),
        }
    }

    /// Append `other` if it has the same kind; hands it back otherwise.
    fn absorb(&mut self, other: BlockData) -> Option<BlockData> {
        match (self, other) {
            (BlockData::Empty(a), BlockData::Empty(b)) => *a += b,
            (BlockData::Numeric(a), BlockData::Numeric(mut b)) => a.append(&mut b),
            (BlockData::Text(a), BlockData::Text(mut b)) => a.append(&mut b),
            (BlockData::Boolean(a), BlockData::Boolean(mut b)) => a.append(&mut b),
            (BlockData::Error(a), BlockData::Error(mut b)) => a.append(&mut b),
            (_, other) => return Some(other),
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Block {
    start: u32,
    data: BlockData,
}

impl Block {
    fn end(&self) -> u32 {
        self.start + self.data.len()
    }
}

/// Result of locating a row: the block index and the row's offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSlot {
    pub block: usize,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    blocks: Vec<Block>,
}

impl Column {
    /// Rows covered by blocks. Rows at or past this are empty.
    pub fn len(&self) -> u32 {
        self.blocks.last().map_or(0, Block::end)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Find the block holding `row`, trying `hint` and its successor before searching.
    pub fn lookup(&self, row: u32, hint: usize) -> Option<BlockSlot> {
        if row >= self.len() {
            return None;
        }
        for candidate in [hint, hint.wrapping_add(1)] {
            if let Some(b) = self.blocks.get(candidate) {
                if b.start <= row && row < b.end() {
                    return Some(BlockSlot {
                        block: candidate,
                        offset: row - b.start,
                    });
                }
            }
        }
        let block = self.blocks.partition_point(|b| b.end() <= row);
        let b = self.blocks.get(block)?;
        Some(BlockSlot {
            block,
            offset: row - b.start,
        })
    }

    pub fn kind_at(&self, slot: BlockSlot) -> CellKind {
        self.blocks
            .get(slot.block)
            .map_or(CellKind::Empty, |b| b.data.kind())
    }

    pub fn value_at(&self, slot: BlockSlot) -> CellValue {
        self.blocks
            .get(slot.block)
            .map_or(CellValue::Empty, |b| b.data.get(slot.offset))
    }

    pub fn get(&self, row: u32) -> CellValue {
        self.lookup(row, 0)
            .map_or(CellValue::Empty, |slot| self.value_at(slot))
    }

    pub fn set(&mut self, row: u32, value: CellValue) {
        if value.is_empty() && row >= self.len() {
            return;
        }
        self.extend_to(row + 1);
        let Some(slot) = self.lookup(row, 0) else {
            return;
        };
        let mut idx = slot.block;
        if self.blocks[idx].data.kind() == kind_of(&value) {
            self.blocks[idx].data.put(slot.offset, value);
            return;
        }
        if slot.offset > 0 {
            self.split(idx, slot.offset);
            idx += 1;
        }
        if self.blocks[idx].data.len() > 1 {
            self.split(idx, 1);
        }
        self.blocks[idx].data = BlockData::single(value);
        self.merge_with_next(idx);
        if idx > 0 {
            self.merge_with_next(idx - 1);
        }
        self.trim();
    }

    /// Shift rows at and below `before` down by `count`.
    pub fn insert_rows(&mut self, before: u32, count: u32) {
        if count == 0 || before >= self.len() {
            return;
        }
        let Some(slot) = self.lookup(before, 0) else {
            return;
        };
        let mut idx = slot.block;
        if slot.offset > 0 {
            self.split(idx, slot.offset);
            idx += 1;
        }
        self.blocks.insert(
            idx,
            Block {
                start: before,
                data: BlockData::Empty(count),
            },
        );
        self.merge_with_next(idx);
        if idx > 0 {
            self.merge_with_next(idx - 1);
        }
        self.reindex();
    }

    /// Remove rows `[start, start + count)`, pulling later rows up.
    pub fn delete_rows(&mut self, start: u32, count: u32) {
        let len = self.len();
        if count == 0 || start >= len {
            return;
        }
        let end = start.saturating_add(count).min(len);
        let first = self.boundary(start);
        let last = self.boundary(end);
        self.blocks.drain(first..last);
        self.reindex();
        if first > 0 {
            self.merge_with_next(first - 1);
        }
        self.trim();
    }

    /// Index of the block that starts exactly at `row`, splitting if needed.
    fn boundary(&mut self, row: u32) -> usize {
        match self.lookup(row, 0) {
            Some(slot) if slot.offset > 0 => {
                self.split(slot.block, slot.offset);
                slot.block + 1
            }
            Some(slot) => slot.block,
            None => self.blocks.len(),
        }
    }

    fn extend_to(&mut self, rows: u32) {
        let len = self.len();
        if rows <= len {
            return;
        }
        let pad = BlockData::Empty(rows - len);
        match self.blocks.last_mut() {
            Some(last) if last.data.kind() == CellKind::Empty => {
                last.data.absorb(pad);
            }
            _ => self.blocks.push(Block {
                start: len,
                data: pad,
            }),
        }
    }

    fn split(&mut self, idx: usize, offset: u32) {
        let block = &mut self.blocks[idx];
        let tail = block.data.split_off(offset);
        let start = block.start + offset;
        self.blocks.insert(idx + 1, Block { start, data: tail });
    }

    fn merge_with_next(&mut self, idx: usize) {
        if idx + 1 >= self.blocks.len() {
            return;
        }
        if self.blocks[idx].data.kind() != self.blocks[idx + 1].data.kind() {
            return;
        }
        let next = self.blocks.remove(idx + 1);
        self.blocks[idx].data.absorb(next.data);
    }

    fn reindex(&mut self) {
        let mut start = 0;
        for block in &mut self.blocks {
            block.start = start;
            start += block.data.len();
        }
    }

    fn trim(&mut self) {
        while self
            .blocks
            .last()
            .is_some_and(|b| b.data.kind() == CellKind::Empty)
        {
            self.blocks.pop();
        }
    }
}

fn kind_of(value: &CellValue) -> CellKind {
    match value {
        CellValue::Empty => CellKind::Empty,
        CellValue::Number(_) => CellKind::Numeric,
        CellValue::Text(_) => CellKind::Text,
        CellValue::Boolean(_) => CellKind::Boolean,
        CellValue::Error(_) => CellKind::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    #[test]
    fn writes_split_and_merge_blocks() {
        let mut col = Column::default();
        col.set(0, num(1.0));
        col.set(1, num(2.0));
        col.set(2, num(3.0));
        assert_eq!(col.block_count(), 1);

        col.set(1, "x".into());
        assert_eq!(col.block_count(), 3);
        assert_eq!(col.get(1), CellValue::Text("x".into()));

        col.set(1, num(9.0));
        assert_eq!(col.block_count(), 1);
        assert_eq!(col.get(1), num(9.0));
    }

    #[test]
    fn sparse_writes_leave_empty_gaps() {
        let mut col = Column::default();
        col.set(5, num(1.0));
        assert_eq!(col.len(), 6);
        assert_eq!(col.block_count(), 2);
        assert_eq!(col.get(2), CellValue::Empty);
        col.set(5, CellValue::Empty);
        assert!(col.is_empty());
        col.set(100, CellValue::Empty);
        assert!(col.is_empty());
    }

    #[test]
    fn stale_hints_fall_back_to_search() {
        let mut col = Column::default();
        for r in 0..10 {
            let v = if r % 2 == 0 { num(r as f64) } else { CellValue::Boolean(true) };
            col.set(r, v);
        }
        assert_eq!(col.block_count(), 10);
        let slot = col.lookup(7, 0).unwrap();
        assert_eq!(slot, BlockSlot { block: 7, offset: 0 });
        assert_eq!(col.lookup(7, 6), Some(slot));
        assert_eq!(col.lookup(7, 99), Some(slot));
        assert_eq!(col.lookup(10, 0), None);
        assert_eq!(col.kind_at(slot), CellKind::Boolean);
    }

    #[test]
    fn insert_and_delete_rows_shift_values() {
        let mut col = Column::default();
        for r in 0..4 {
            col.set(r, num(r as f64));
        }
        col.insert_rows(2, 3);
        assert_eq!(col.get(1), num(1.0));
        assert_eq!(col.get(2), CellValue::Empty);
        assert_eq!(col.get(5), num(2.0));
        assert_eq!(col.len(), 7);

        col.delete_rows(1, 4);
        assert_eq!(col.get(0), num(0.0));
        assert_eq!(col.get(1), num(2.0));
        assert_eq!(col.get(2), num(3.0));
        assert_eq!(col.block_count(), 1);

        col.delete_rows(0, 100);
        assert!(col.is_empty());
    }
}
