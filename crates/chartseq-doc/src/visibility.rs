//! Hidden rows and columns of one sheet.

/// Why a row is hidden. Columns are only ever hidden manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HideSource {
    Manual,
    Filter,
}

/// Dense bitset over row or column indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct IndexBits {
    words: Vec<u64>,
}

impl IndexBits {
    fn get(&self, idx: u32) -> bool {
        self.words
            .get((idx / 64) as usize)
            .is_some_and(|w| w & (1u64 << (idx % 64)) != 0)
    }

    /// Returns whether any bit flipped.
    fn set_span(&mut self, first: u32, last: u32, on: bool) -> bool {
        if first > last {
            return false;
        }
        let last_word = (last / 64) as usize;
        if on && last_word >= self.words.len() {
            self.words.resize(last_word + 1, 0);
        }
        let mut changed = false;
        let mut idx = first;
        while idx <= last {
            let word_idx = (idx / 64) as usize;
            let Some(word) = self.words.get_mut(word_idx) else {
                break;
            };
            let lo = idx % 64;
            let hi = if (last / 64) as usize == word_idx { last % 64 } else { 63 };
            let width = hi - lo + 1;
            let mask = if width == 64 { u64::MAX } else { ((1u64 << width) - 1) << lo };
            let before = *word;
            if on {
                *word |= mask;
            } else {
                *word &= !mask;
            }
            changed |= before != *word;
            match (word_idx as u32 + 1).checked_mul(64) {
                Some(next) => idx = next,
                None => break,
            }
        }
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
        changed
    }

    fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros();
                bits &= bits - 1;
                Some(word_idx as u32 * 64 + tz)
            })
        })
    }

    fn remap(&mut self, f: impl Fn(u32) -> Option<u32>) -> bool {
        let old: Vec<u32> = self.indices().collect();
        let mut next = IndexBits::default();
        for idx in &old {
            if let Some(moved) = f(*idx) {
                next.set_span(moved, moved, true);
            }
        }
        let changed = next != *self;
        *self = next;
        changed
    }

    fn insert(&mut self, before: u32, count: u32) -> bool {
        count > 0 && self.remap(|i| Some(if i >= before { i.saturating_add(count) } else { i }))
    }

    fn delete(&mut self, start: u32, count: u32) -> bool {
        let end = start.saturating_add(count);
        count > 0
            && self.remap(|i| {
                if i < start {
                    Some(i)
                } else if i < end {
                    None
                } else {
                    Some(i - count)
                }
            })
    }
}

/// Row and column visibility for a sheet, with a version bumped on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetVisibility {
    manual_rows: IndexBits,
    filtered_rows: IndexBits,
    hidden_cols: IndexBits,
    version: u64,
}

impl SheetVisibility {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.manual_rows.get(row) || self.filtered_rows.get(row)
    }

    pub fn is_row_hidden_by(&self, row: u32, source: HideSource) -> bool {
        match source {
            HideSource::Manual => self.manual_rows.get(row),
            HideSource::Filter => self.filtered_rows.get(row),
        }
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.hidden_cols.get(col)
    }

    pub fn set_rows_hidden(&mut self, first: u32, last: u32, hidden: bool, source: HideSource) -> bool {
        let bits = match source {
            HideSource::Manual => &mut self.manual_rows,
            HideSource::Filter => &mut self.filtered_rows,
        };
        let changed = bits.set_span(first, last, hidden);
        self.bump(changed)
    }

    pub fn set_cols_hidden(&mut self, first: u32, last: u32, hidden: bool) -> bool {
        let changed = self.hidden_cols.set_span(first, last, hidden);
        self.bump(changed)
    }

    pub fn insert_rows(&mut self, before: u32, count: u32) -> bool {
        let a = self.manual_rows.insert(before, count);
        let b = self.filtered_rows.insert(before, count);
        self.bump(a | b)
    }

    pub fn delete_rows(&mut self, start: u32, count: u32) -> bool {
        let a = self.manual_rows.delete(start, count);
        let b = self.filtered_rows.delete(start, count);
        self.bump(a | b)
    }

    pub fn insert_cols(&mut self, before: u32, count: u32) -> bool {
        let changed = self.hidden_cols.insert(before, count);
        self.bump(changed)
    }

    pub fn delete_cols(&mut self, start: u32, count: u32) -> bool {
        let changed = self.hidden_cols.delete(start, count);
        self.bump(changed)
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.version = self.version.saturating_add(1);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cross_word_boundaries() {
        let mut vis = SheetVisibility::default();
        assert!(vis.set_rows_hidden(60, 130, true, HideSource::Manual));
        assert!(!vis.is_row_hidden(59));
        assert!(vis.is_row_hidden(60));
        assert!(vis.is_row_hidden(64));
        assert!(vis.is_row_hidden(130));
        assert!(!vis.is_row_hidden(131));
        assert!(!vis.set_rows_hidden(70, 80, true, HideSource::Manual));
        assert!(vis.set_rows_hidden(60, 130, false, HideSource::Manual));
        assert!(!vis.is_row_hidden(100));
        assert_eq!(vis.version(), 2);
    }

    #[test]
    fn manual_and_filter_are_independent() {
        let mut vis = SheetVisibility::default();
        vis.set_rows_hidden(3, 3, true, HideSource::Filter);
        vis.set_rows_hidden(3, 3, true, HideSource::Manual);
        vis.set_rows_hidden(3, 3, false, HideSource::Manual);
        assert!(vis.is_row_hidden(3));
        assert!(vis.is_row_hidden_by(3, HideSource::Filter));
        assert!(!vis.is_row_hidden_by(3, HideSource::Manual));
    }

    #[test]
    fn structural_edits_move_hidden_rows() {
        let mut vis = SheetVisibility::default();
        vis.set_rows_hidden(5, 5, true, HideSource::Manual);
        vis.set_cols_hidden(2, 2, true);
        assert!(vis.insert_rows(0, 2));
        assert!(vis.is_row_hidden(7));
        assert!(!vis.is_row_hidden(5));
        assert!(vis.delete_rows(7, 1));
        assert!(!vis.is_row_hidden(7));
        assert!(!vis.insert_rows(0, 0));
        assert!(vis.delete_cols(0, 1));
        assert!(vis.is_col_hidden(1));
    }
}
