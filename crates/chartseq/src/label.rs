use chartseq_common::column_to_letters;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which edge of a sequence's ranges generated labels describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LabelOrigin {
    /// Name each cell along the shorter side (`Column A`, `Row 3`).
    ShortSide,
    /// Number each cell along the longer side (`1`, `2`, ...).
    LongSide,
    Column,
    Row,
}

/// Inclusive `(start_row, start_col, end_row, end_col)` of one referenced rectangle.
pub(crate) type Extent = (u32, u32, u32, u32);

/// Labels for `extents`, empty when a side-relative origin cannot pick a side.
pub(crate) fn generate_labels(extents: &[Extent], origin: LabelOrigin) -> Vec<String> {
    let (rows, cols) = extents.iter().fold((0u64, 0u64), |(r, c), &(r0, c0, r1, c1)| {
        (r + u64::from(r1 - r0) + 1, c + u64::from(c1 - c0) + 1)
    });

    let by_column = match origin {
        LabelOrigin::Column => true,
        LabelOrigin::Row => false,
        LabelOrigin::ShortSide | LabelOrigin::LongSide if rows == cols => return Vec::new(),
        LabelOrigin::ShortSide => rows > cols,
        LabelOrigin::LongSide => cols > rows,
    };

    let mut labels = Vec::with_capacity(if by_column { cols } else { rows } as usize);
    for &(r0, c0, r1, c1) in extents {
        let span = if by_column { c0..=c1 } else { r0..=r1 };
        for index in span {
            let label = if origin == LabelOrigin::LongSide {
                (labels.len() + 1).to_string()
            } else if by_column {
                format!("Column {}", column_to_letters(index))
            } else {
                format!("Row {}", index + 1)
            };
            labels.push(label);
        }
    }
    labels
}
