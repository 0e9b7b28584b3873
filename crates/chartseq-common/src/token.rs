//! Resolved references and their adjustment under structural edits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::address::{CellAddress, FileId, RangeAddress, SheetIndex, span};
use crate::error::AddressError;
use crate::coord::{MAX_COLS, MAX_ROWS};

/// A rectangle inside an externally linked document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalArea {
    pub file: FileId,
    pub sheet: String,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
    /// Written as a single cell rather than a range.
    pub single_cell: bool,
}

impl ExternalArea {
    pub fn width(&self) -> u32 {
        span(self.start_col, self.end_col)
    }

    pub fn height(&self) -> u32 {
        span(self.start_row, self.end_row)
    }

    /// Same ordering and sheet-limit checks as a local range.
    pub fn validated(&self) -> Result<(), AddressError> {
        RangeAddress::new(0, self.start_row, self.start_col, self.end_row, self.end_col).map(|_| ())
    }

    /// `(row, col)` pairs in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.start_row..=self.end_row)
            .flat_map(move |row| (self.start_col..=self.end_col).map(move |col| (row, col)))
    }
}

/// One entry of a data sequence's reference list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferenceToken {
    Cell(CellAddress),
    Area(RangeAddress),
    External(ExternalArea),
    /// A workbook-level defined name, resolved on every build.
    Name(String),
    /// A reference whose target was deleted; resolves to no cells.
    Deleted,
}

impl ReferenceToken {
    /// The local rectangle this token covers, if it is a local cell or range.
    pub fn local_range(&self) -> Option<RangeAddress> {
        match self {
            ReferenceToken::Cell(cell) => Some(RangeAddress::from_cell(*cell)),
            ReferenceToken::Area(range) => Some(*range),
            _ => None,
        }
    }

    pub fn external_file(&self) -> Option<FileId> {
        match self {
            ReferenceToken::External(ext) => Some(ext.file),
            _ => None,
        }
    }

    pub fn is_name(&self) -> bool {
        matches!(self, ReferenceToken::Name(_))
    }

    /// Pin every local reference to `sheet`. External, name and deleted tokens are untouched.
    pub fn pinned_to_sheet(&self, sheet: SheetIndex) -> ReferenceToken {
        match self {
            ReferenceToken::Cell(cell) => ReferenceToken::Cell(CellAddress { sheet, ..*cell }),
            ReferenceToken::Area(range) => ReferenceToken::Area(range.on_sheet(sheet)),
            other => other.clone(),
        }
    }

    /// Apply a structural edit the way formula references follow inserted and deleted cells.
    pub fn adjusted(&self, change: &StructuralChange) -> ReferenceToken {
        match self {
            ReferenceToken::Cell(cell) => {
                match adjust_range(&RangeAddress::from_cell(*cell), change) {
                    Some(r) => ReferenceToken::Cell(r.start()),
                    None => ReferenceToken::Deleted,
                }
            }
            ReferenceToken::Area(range) => match adjust_range(range, change) {
                Some(r) => ReferenceToken::Area(r),
                None => ReferenceToken::Deleted,
            },
            other => other.clone(),
        }
    }
}

/// Row, column and sheet insertions and deletions applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StructuralChange {
    InsertRows {
        sheet: SheetIndex,
        before: u32,
        count: u32,
    },
    DeleteRows {
        sheet: SheetIndex,
        start: u32,
        count: u32,
    },
    InsertColumns {
        sheet: SheetIndex,
        before: u32,
        count: u32,
    },
    DeleteColumns {
        sheet: SheetIndex,
        start: u32,
        count: u32,
    },
    InsertSheet {
        at: SheetIndex,
    },
    RemoveSheet {
        index: SheetIndex,
    },
}

/// Returns `None` when the whole range disappears.
pub fn adjust_range(range: &RangeAddress, change: &StructuralChange) -> Option<RangeAddress> {
    let mut out = *range;
    match *change {
        StructuralChange::InsertRows {
            sheet,
            before,
            count,
        } if range.contains_sheet(sheet) => {
            let (s, e) = shift_inserted(range.start_row, range.end_row, before, count, MAX_ROWS)?;
            out.start_row = s;
            out.end_row = e;
        }
        StructuralChange::DeleteRows {
            sheet,
            start,
            count,
        } if range.contains_sheet(sheet) => {
            let (s, e) = shrink_deleted(range.start_row, range.end_row, start, count)?;
            out.start_row = s;
            out.end_row = e;
        }
        StructuralChange::InsertColumns {
            sheet,
            before,
            count,
        } if range.contains_sheet(sheet) => {
            let (s, e) = shift_inserted(range.start_col, range.end_col, before, count, MAX_COLS)?;
            out.start_col = s;
            out.end_col = e;
        }
        StructuralChange::DeleteColumns {
            sheet,
            start,
            count,
        } if range.contains_sheet(sheet) => {
            let (s, e) = shrink_deleted(range.start_col, range.end_col, start, count)?;
            out.start_col = s;
            out.end_col = e;
        }
        StructuralChange::InsertSheet { at } => {
            if range.first_sheet >= at {
                out.first_sheet = range.first_sheet.checked_add(1)?;
            }
            if range.last_sheet >= at {
                out.last_sheet = range.last_sheet.checked_add(1)?;
            }
        }
        StructuralChange::RemoveSheet { index } => {
            if range.first_sheet == index && range.last_sheet == index {
                return None;
            }
            if range.first_sheet > index {
                out.first_sheet = range.first_sheet - 1;
            }
            if range.last_sheet >= index {
                out.last_sheet = range.last_sheet - 1;
            }
        }
        _ => {}
    }
    Some(out)
}

fn shift_inserted(start: u32, end: u32, before: u32, count: u32, limit: u32) -> Option<(u32, u32)> {
    let new_start = if start >= before { start + count } else { start };
    if new_start >= limit {
        return None;
    }
    let new_end = if end >= before { end + count } else { end };
    Some((new_start, new_end.min(limit - 1)))
}

fn shrink_deleted(start: u32, end: u32, del_start: u32, count: u32) -> Option<(u32, u32)> {
    let del_end = del_start + count;
    if end < del_start {
        return Some((start, end));
    }
    if start >= del_end {
        return Some((start - count, end - count));
    }
    if start >= del_start && end < del_end {
        return None;
    }
    let new_start = start.min(del_start);
    let new_end = if end >= del_end { end - count } else { del_start - 1 };
    Some((new_start, new_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(sheet: SheetIndex, r0: u32, c0: u32, r1: u32, c1: u32) -> ReferenceToken {
        ReferenceToken::Area(RangeAddress::new(sheet, r0, c0, r1, c1).unwrap())
    }

    #[test]
    fn rows_inserted_above_shift_range() {
        let t = area(0, 2, 0, 4, 0);
        let moved = t.adjusted(&StructuralChange::InsertRows {
            sheet: 0,
            before: 1,
            count: 2,
        });
        assert_eq!(moved, area(0, 4, 0, 6, 0));

        let inside = t.adjusted(&StructuralChange::InsertRows {
            sheet: 0,
            before: 3,
            count: 1,
        });
        assert_eq!(inside, area(0, 2, 0, 5, 0));

        let other_sheet = t.adjusted(&StructuralChange::InsertRows {
            sheet: 1,
            before: 0,
            count: 10,
        });
        assert_eq!(other_sheet, t);
    }

    #[test]
    fn deleted_rows_shrink_or_remove() {
        let t = area(0, 2, 0, 6, 0);
        let del = |start, count| StructuralChange::DeleteRows {
            sheet: 0,
            start,
            count,
        };
        assert_eq!(t.adjusted(&del(0, 2)), area(0, 0, 0, 4, 0));
        assert_eq!(t.adjusted(&del(3, 2)), area(0, 2, 0, 4, 0));
        assert_eq!(t.adjusted(&del(5, 10)), area(0, 2, 0, 4, 0));
        assert_eq!(t.adjusted(&del(0, 4)), area(0, 0, 0, 2, 0));
        assert_eq!(t.adjusted(&del(2, 5)), ReferenceToken::Deleted);
        assert_eq!(t.adjusted(&del(7, 1)), t);
    }

    #[test]
    fn cell_inside_deleted_columns_is_lost() {
        let t = ReferenceToken::Cell(CellAddress::new(0, 0, 3));
        let gone = t.adjusted(&StructuralChange::DeleteColumns {
            sheet: 0,
            start: 2,
            count: 3,
        });
        assert_eq!(gone, ReferenceToken::Deleted);
    }

    #[test]
    fn sheet_removal_adjusts_bands() {
        let band = ReferenceToken::Area(RangeAddress::with_band(1, 3, 0, 0, 0, 0).unwrap());
        let shrunk = band.adjusted(&StructuralChange::RemoveSheet { index: 2 });
        assert_eq!(
            shrunk,
            ReferenceToken::Area(RangeAddress::with_band(1, 2, 0, 0, 0, 0).unwrap())
        );
        let single = area(2, 0, 0, 0, 0);
        assert_eq!(
            single.adjusted(&StructuralChange::RemoveSheet { index: 2 }),
            ReferenceToken::Deleted
        );
        assert_eq!(
            single.adjusted(&StructuralChange::RemoveSheet { index: 0 }),
            area(1, 0, 0, 0, 0)
        );
        assert_eq!(
            single.adjusted(&StructuralChange::InsertSheet { at: 2 }),
            area(3, 0, 0, 0, 0)
        );
    }
}
