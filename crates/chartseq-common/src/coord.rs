//! Column-letter and A1 cell coordinate helpers.
//!
//! All coordinates handled here are 0-based; the textual forms are the usual
//! 1-based A1 notation with optional `$` anchors.

use crate::error::RangeParseError;

/// Number of rows in a sheet (`1..=1_048_576` in A1 notation).
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in a sheet (`A..=XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Convert a 0-based column index into its letter form (`0 -> "A"`, `27 -> "AB"`).
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::with_capacity(3);
    loop {
        let rem = (col % 26) as u8;
        buf.push(char::from(b'A' + rem));
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.iter().rev().collect()
}

/// Convert column letters into a 0-based index. Lowercase letters are accepted.
///
/// Returns `None` for empty input, non-letters, or columns beyond `XFD`.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(val)?;
    }
    let col = col - 1;
    (col < MAX_COLS).then_some(col)
}

/// A cell coordinate as written in A1 form, with its `$` anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A1Cell {
    pub row: u32,
    pub col: u32,
    pub row_abs: bool,
    pub col_abs: bool,
}

impl A1Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_abs: true,
            col_abs: true,
        }
    }

    /// Parse `A1`, `$A$1`, `a$12` and friends.
    pub fn parse(text: &str) -> Result<Self, RangeParseError> {
        let bytes = text.as_bytes();
        let mut pos = 0;

        let col_abs = bytes.first() == Some(&b'$');
        if col_abs {
            pos += 1;
        }
        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let letters = &text[col_start..pos];
        if letters.is_empty() {
            return Err(RangeParseError::InvalidCell(text.to_string()));
        }
        let col = letters_to_column(letters)
            .ok_or_else(|| RangeParseError::ColumnOutOfBounds(letters.to_string()))?;

        let row_abs = bytes.get(pos) == Some(&b'$');
        if row_abs {
            pos += 1;
        }
        let digits = &text[pos..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeParseError::InvalidCell(text.to_string()));
        }
        let row_1based: u32 = digits
            .parse()
            .map_err(|_| RangeParseError::RowOutOfBounds(digits.to_string()))?;
        if row_1based == 0 || row_1based > MAX_ROWS {
            return Err(RangeParseError::RowOutOfBounds(digits.to_string()));
        }

        Ok(Self {
            row: row_1based - 1,
            col,
            row_abs,
            col_abs,
        })
    }

    /// Format with explicit anchors (`$A$1`).
    pub fn to_absolute_string(&self) -> String {
        format!("${}${}", column_to_letters(self.col), self.row + 1)
    }

    /// Format without anchors (`A1`).
    pub fn to_plain_string(&self) -> String {
        format!("{}{}", column_to_letters(self.col), self.row + 1)
    }
}
