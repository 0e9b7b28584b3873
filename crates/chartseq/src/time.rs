use chartseq_common::{SheetIndex, StructuralChange};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sheet band a time-based sequence steps through, and the sheet it currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeWindow {
    pub start: SheetIndex,
    pub end: SheetIndex,
    pub current: SheetIndex,
}

impl TimeWindow {
    /// Window over `start..=end` positioned on `start`.
    pub fn new(start: SheetIndex, end: SheetIndex) -> Self {
        Self {
            start,
            end,
            current: start,
        }
    }

    /// Advance one sheet. Past the end, wraps to `start` when `wrap` is set and
    /// otherwise stays put and returns `None`.
    pub fn next(&self, wrap: bool) -> Option<SheetIndex> {
        if self.current < self.end {
            Some(self.current + 1)
        } else if wrap {
            Some(self.start)
        } else {
            None
        }
    }

    /// Sheet for a 0-based offset into the window.
    pub fn point(&self, offset: u32) -> Option<SheetIndex> {
        let sheet = u32::from(self.start).checked_add(offset)?;
        (sheet <= u32::from(self.end)).then(|| sheet as SheetIndex)
    }

    pub fn sheet_count(&self) -> u32 {
        u32::from(self.end - self.start) + 1
    }

    /// Follow sheet insertions and removals. Returns `None` when the whole window is removed.
    pub fn adjusted(&self, change: &StructuralChange) -> Option<TimeWindow> {
        let shift = |s: SheetIndex| -> Option<SheetIndex> {
            match *change {
                StructuralChange::InsertSheet { at } if s >= at => s.checked_add(1),
                StructuralChange::RemoveSheet { index } if s > index => Some(s - 1),
                _ => Some(s),
            }
        };
        if let StructuralChange::RemoveSheet { index } = *change {
            if self.start == index && self.end == index {
                return None;
            }
        }
        let start = shift(self.start)?;
        let end = match *change {
            StructuralChange::RemoveSheet { index } if self.end >= index => self.end - 1,
            _ => shift(self.end)?,
        };
        let current = shift(self.current)?.clamp(start, end);
        Some(TimeWindow {
            start,
            end,
            current,
        })
    }
}
