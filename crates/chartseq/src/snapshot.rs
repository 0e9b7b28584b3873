//! Immutable materialized values of a data sequence.

use chartseq_common::{CellAddress, CellValue, FileId};
use chartseq_doc::CellKind;
use once_cell::sync::OnceCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One slot of the mixed view.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SequenceValue {
    Number(f64),
    Text(String),
}

impl SequenceValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SequenceValue::Number(n) => Some(*n),
            SequenceValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SequenceValue::Text(s) => Some(s),
            SequenceValue::Number(_) => None,
        }
    }
}

/// Where a cached item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemOrigin {
    Local(CellAddress),
    External { file: FileId, row: u32, col: u32 },
    /// A value supplied literally when the sequence was created.
    Literal,
}

/// One resolved cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    /// Numeric value; `0.0` when the slot is not numeric.
    pub value: f64,
    /// Display string; empty for empty cells.
    pub text: String,
    /// Whether `value` is authoritative.
    pub is_value: bool,
    pub kind: CellKind,
    pub hidden: bool,
    pub origin: ItemOrigin,
}

impl CacheItem {
    pub fn from_cell(kind: CellKind, value: &CellValue, hidden: bool, origin: ItemOrigin) -> Self {
        let number = match kind {
            CellKind::Numeric | CellKind::Boolean => value.as_number(),
            _ => None,
        };
        Self {
            value: number.unwrap_or(0.0),
            text: value.display_string(),
            is_value: number.is_some(),
            kind,
            hidden,
            origin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == CellKind::Empty
    }
}

pub(crate) fn kind_of(value: &CellValue) -> CellKind {
    match value {
        CellValue::Empty => CellKind::Empty,
        CellValue::Number(_) => CellKind::Numeric,
        CellValue::Text(_) => CellKind::Text,
        CellValue::Boolean(_) => CellKind::Boolean,
        CellValue::Error(_) => CellKind::Error,
    }
}

/// Items in resolution order plus the views derived from them.
///
/// Every resolved cell owns a slot in [`Snapshot::items`] and [`Snapshot::mixed`], hidden
/// or not. The numeric and textual views leave out the slots listed in
/// [`Snapshot::hidden_indices`], and are computed on first use.
#[derive(Debug, Default)]
pub struct Snapshot {
    items: Vec<CacheItem>,
    mixed: Vec<SequenceValue>,
    hidden: Vec<usize>,
    numeric: OnceCell<Vec<f64>>,
    textual: OnceCell<Vec<String>>,
}

impl Snapshot {
    pub fn new(items: Vec<CacheItem>, include_hidden: bool) -> Self {
        let mixed = items
            .iter()
            .map(|item| {
                if item.is_value {
                    SequenceValue::Number(item.value)
                } else {
                    SequenceValue::Text(item.text.clone())
                }
            })
            .collect();
        let hidden = if include_hidden {
            Vec::new()
        } else {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| item.hidden.then_some(i))
                .collect()
        };
        Self {
            items,
            mixed,
            hidden,
            numeric: OnceCell::new(),
            textual: OnceCell::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CacheItem] {
        &self.items
    }

    pub fn mixed(&self) -> &[SequenceValue] {
        &self.mixed
    }

    /// Slots currently excluded as hidden. Always empty when hidden cells are included.
    pub fn hidden_indices(&self) -> &[usize] {
        &self.hidden
    }

    fn visible(&self) -> impl Iterator<Item = &CacheItem> {
        let mut excluded = self.hidden.iter().copied().peekable();
        self.items.iter().enumerate().filter_map(move |(i, item)| {
            if excluded.next_if_eq(&i).is_some() {
                None
            } else {
                Some(item)
            }
        })
    }

    pub fn numeric(&self) -> &[f64] {
        self.numeric.get_or_init(|| {
            self.visible()
                .map(|item| if item.is_value { item.value } else { 0.0 })
                .collect()
        })
    }

    pub fn textual(&self) -> &[String] {
        self.textual
            .get_or_init(|| self.visible().map(|item| item.text.clone()).collect())
    }

    /// Same items, compared bit for bit.
    pub fn bit_identical(&self, other: &Snapshot) -> bool {
        self.hidden == other.hidden
            && self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| {
                a.value.to_bits() == b.value.to_bits()
                    && a.text == b.text
                    && a.is_value == b.is_value
                    && a.kind == b.kind
                    && a.hidden == b.hidden
                    && a.origin == b.origin
            })
    }
}

impl Clone for Snapshot {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            mixed: self.mixed.clone(),
            hidden: self.hidden.clone(),
            numeric: OnceCell::new(),
            textual: OnceCell::new(),
        }
    }
}
