//! Sheet-qualified cell and range addresses.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coord::{MAX_COLS, MAX_ROWS, column_to_letters};
use crate::error::AddressError;

/// Positional sheet index. Indices shift when sheets are inserted or removed.
pub type SheetIndex = u16;

/// Identifier of an externally linked document, assigned by the document's link registry.
pub type FileId = u16;

/// A single cell: sheet, row and column, all 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellAddress {
    pub sheet: SheetIndex,
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub const fn new(sheet: SheetIndex, row: u32, col: u32) -> Self {
        Self { sheet, row, col }
    }

    pub fn checked(sheet: SheetIndex, row: u32, col: u32) -> Result<Self, AddressError> {
        if row >= MAX_ROWS {
            return Err(AddressError::RowOutOfBounds(row));
        }
        if col >= MAX_COLS {
            return Err(AddressError::ColumnOutOfBounds(col));
        }
        Ok(Self { sheet, row, col })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}!{}{}", self.sheet, column_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular block of cells, optionally repeated over a band of consecutive sheets.
///
/// All bounds are inclusive and 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeAddress {
    pub first_sheet: SheetIndex,
    pub last_sheet: SheetIndex,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl RangeAddress {
    /// Single-sheet range; validates ordering and sheet limits.
    pub fn new(
        sheet: SheetIndex,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Self, AddressError> {
        Self::with_band(sheet, sheet, start_row, start_col, end_row, end_col)
    }

    pub fn with_band(
        first_sheet: SheetIndex,
        last_sheet: SheetIndex,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Self, AddressError> {
        if first_sheet > last_sheet {
            return Err(AddressError::SheetOrder);
        }
        if start_row > end_row || start_col > end_col {
            return Err(AddressError::RangeOrder);
        }
        if end_row >= MAX_ROWS {
            return Err(AddressError::RowOutOfBounds(end_row));
        }
        if end_col >= MAX_COLS {
            return Err(AddressError::ColumnOutOfBounds(end_col));
        }
        Ok(Self {
            first_sheet,
            last_sheet,
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    pub fn from_cell(cell: CellAddress) -> Self {
        Self {
            first_sheet: cell.sheet,
            last_sheet: cell.sheet,
            start_row: cell.row,
            start_col: cell.col,
            end_row: cell.row,
            end_col: cell.col,
        }
    }

    /// Re-run the [`RangeAddress::with_band`] checks on a range built field by field.
    pub fn validated(&self) -> Result<Self, AddressError> {
        Self::with_band(
            self.first_sheet,
            self.last_sheet,
            self.start_row,
            self.start_col,
            self.end_row,
            self.end_col,
        )
    }

    /// Column count; 0 for an inverted range.
    pub fn width(&self) -> u32 {
        span(self.start_col, self.end_col)
    }

    pub fn height(&self) -> u32 {
        span(self.start_row, self.end_row)
    }

    pub fn depth(&self) -> u32 {
        span(u32::from(self.first_sheet), u32::from(self.last_sheet))
    }

    /// Number of cells covered, across all sheets of the band.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) * u64::from(self.depth())
    }

    pub fn start(&self) -> CellAddress {
        CellAddress::new(self.first_sheet, self.start_row, self.start_col)
    }

    pub fn contains_sheet(&self, sheet: SheetIndex) -> bool {
        (self.first_sheet..=self.last_sheet).contains(&sheet)
    }

    pub fn contains(&self, cell: CellAddress) -> bool {
        self.contains_sheet(cell.sheet)
            && (self.start_row..=self.end_row).contains(&cell.row)
            && (self.start_col..=self.end_col).contains(&cell.col)
    }

    pub fn intersects(&self, other: &RangeAddress) -> bool {
        self.first_sheet <= other.last_sheet
            && other.first_sheet <= self.last_sheet
            && self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// True when the row span `[first, last]` on `sheet` overlaps this range.
    pub fn overlaps_rows(&self, sheet: SheetIndex, first: u32, last: u32) -> bool {
        self.contains_sheet(sheet) && self.start_row <= last && first <= self.end_row
    }

    /// True when the column span `[first, last]` on `sheet` overlaps this range.
    pub fn overlaps_cols(&self, sheet: SheetIndex, first: u32, last: u32) -> bool {
        self.contains_sheet(sheet) && self.start_col <= last && first <= self.end_col
    }

    /// The same rectangle pinned to a single sheet.
    pub fn on_sheet(&self, sheet: SheetIndex) -> Self {
        Self {
            first_sheet: sheet,
            last_sheet: sheet,
            ..*self
        }
    }

    /// Cells in row-major order, sheet by sheet.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.first_sheet..=self.last_sheet).flat_map(move |sheet| {
            (self.start_row..=self.end_row).flat_map(move |row| {
                (self.start_col..=self.end_col).map(move |col| CellAddress::new(sheet, row, col))
            })
        })
    }
}

/// Inclusive extent of `[start, end]`, empty when inverted.
pub(crate) fn span(start: u32, end: u32) -> u32 {
    end.checked_sub(start).map_or(0, |d| d.saturating_add(1))
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_sheet == self.last_sheet {
            write!(f, "#{}!", self.first_sheet)?;
        } else {
            write!(f, "#{}:#{}!", self.first_sheet, self.last_sheet)?;
        }
        write!(
            f,
            "{}{}:{}{}",
            column_to_letters(self.start_col),
            self.start_row + 1,
            column_to_letters(self.end_col),
            self.end_row + 1
        )
    }
}
