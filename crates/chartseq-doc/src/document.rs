//! The shared, mutable document that data sequences read from.
//!
//! Mutations run inside a [`Transaction`] under the document's write lock. Events
//! collected during the transaction are delivered after the lock is released, in
//! listener registration order, on the thread that performed the edit.

use std::sync::{Arc, Weak};

use chartseq_common::{
    A1Cell, AddressError, CellAddress, CellValue, MAX_COLS, MAX_ROWS, RangeAddress, SheetIndex,
    StructuralChange, adjust_range,
};
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::block_position::{BlockPositionCache, ColumnBlockPosition};
use crate::broadcast::{ListenerId, Listeners, Subscription};
use crate::column::{CellKind, Column};
use crate::error::{DocumentError, Result};
use crate::external::ExternalLinks;
use crate::visibility::{HideSource, SheetVisibility};

/// Ranges a listener is interested in.
pub type WatchedRanges = SmallVec<[RangeAddress; 4]>;

/// Callback for [`EditEvent`]s.
pub type EditCallback = dyn Fn(&EditEvent) + Send + Sync;

/// Callback for visibility changes. Carries no payload.
pub type VisibilityCallback = dyn Fn() + Send + Sync;

/// Content and structure changes announced to edit listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    /// Values inside this range changed. Only delivered to listeners watching an
    /// intersecting range.
    CellsChanged(RangeAddress),
    /// Rows, columns or sheets were inserted or removed. Delivered to every listener.
    Structure(StructuralChange),
    /// A defined name was added, changed or removed. Delivered to every listener.
    NamesChanged,
    /// A full recalculation finished. Delivered to every listener.
    Recalculated,
}

#[derive(Debug, Clone, Copy)]
enum VisibilityChange {
    Rows { sheet: SheetIndex, first: u32, last: u32 },
    Cols { sheet: SheetIndex, first: u32, last: u32 },
}

#[derive(Debug, Default)]
struct Sheet {
    name: String,
    columns: Vec<Column>,
    visibility: SheetVisibility,
    formats: FxHashMap<(u32, u32), u32>,
}

impl Sheet {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn shift_formats(&mut self, f: impl Fn(u32, u32) -> Option<(u32, u32)>) {
        let formats = std::mem::take(&mut self.formats);
        self.formats = formats
            .into_iter()
            .filter_map(|((r, c), key)| f(r, c).map(|pos| (pos, key)))
            .collect();
    }
}

#[derive(Debug, Clone)]
struct DefinedName {
    name: String,
    ranges: Vec<RangeAddress>,
}

#[derive(Debug, Default)]
struct DocState {
    sheets: Vec<Sheet>,
    names: FxHashMap<String, DefinedName>,
}

impl DocState {
    fn sheet(&self, index: SheetIndex) -> Result<&Sheet> {
        self.sheets
            .get(index as usize)
            .ok_or(DocumentError::UnknownSheet(index))
    }

    fn sheet_mut(&mut self, index: SheetIndex) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(index as usize)
            .ok_or(DocumentError::UnknownSheet(index))
    }

    fn sheet_index(&self, name: &str) -> Option<SheetIndex> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .map(|i| i as SheetIndex)
    }

    fn adjust_names(&mut self, change: &StructuralChange) {
        for defined in self.names.values_mut() {
            defined.ranges = defined
                .ranges
                .iter()
                .filter_map(|r| adjust_range(r, change))
                .collect();
        }
    }
}

struct Shared {
    state: RwLock<DocState>,
    block_positions: BlockPositionCache,
    external: ExternalLinks,
    edits: Listeners<WatchedRanges, EditCallback>,
    visibility: Listeners<WatchedRanges, VisibilityCallback>,
}

/// Shared handle to a document. Cloning is cheap.
#[derive(Clone)]
pub struct Document {
    shared: Arc<Shared>,
}

/// Non-owning handle; upgrade before use.
#[derive(Clone, Default)]
pub struct WeakDocument {
    shared: Weak<Shared>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.shared.upgrade().map(|shared| Document { shared })
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

impl std::fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Document")
            .field("sheets", &state.sheets.len())
            .field("names", &state.names.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(DocState::default()),
                block_positions: BlockPositionCache::new(),
                external: ExternalLinks::new(),
                edits: Listeners::new(),
                visibility: Listeners::new(),
            }),
        }
    }

    /// A document with the given sheets, in order.
    pub fn with_sheets(names: &[&str]) -> Result<Self> {
        let doc = Self::new();
        doc.edit(|tx| {
            for name in names {
                tx.add_sheet(name)?;
            }
            Ok(())
        })?;
        Ok(doc)
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Shared read access for a batch of queries.
    pub fn read(&self) -> DocReader<'_> {
        DocReader {
            state: self.shared.state.read(),
            shared: &self.shared,
        }
    }

    /// Apply several mutations atomically, then broadcast the resulting events.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Transaction<'_>) -> Result<R>) -> Result<R> {
        let (result, events, visibility) = {
            let mut state = self.shared.state.write();
            let mut tx = Transaction {
                state: &mut *state,
                events: Vec::new(),
                visibility: Vec::new(),
                structural: false,
            };
            let result = f(&mut tx);
            if tx.structural {
                #[cfg(feature = "tracing")]
                tracing::debug!("structural edit, clearing block positions");
                self.shared.block_positions.clear();
            }
            (result, tx.events, tx.visibility)
        };
        self.dispatch(&events, &visibility);
        result
    }

    fn dispatch(&self, events: &[EditEvent], visibility: &[VisibilityChange]) {
        for event in events {
            let callbacks = match event {
                EditEvent::CellsChanged(changed) => self
                    .shared
                    .edits
                    .matching(|watched| watched.iter().any(|w| w.intersects(changed))),
                _ => self.shared.edits.matching(|_| true),
            };
            for cb in callbacks {
                cb(event);
            }
        }
        for change in visibility {
            let callbacks = self.shared.visibility.matching(|watched| {
                watched.iter().any(|w| match *change {
                    VisibilityChange::Rows { sheet, first, last } => {
                        w.overlaps_rows(sheet, first, last)
                    }
                    VisibilityChange::Cols { sheet, first, last } => {
                        w.overlaps_cols(sheet, first, last)
                    }
                })
            });
            for cb in callbacks {
                cb();
            }
        }
    }

    pub fn external_links(&self) -> &ExternalLinks {
        &self.shared.external
    }

    pub fn block_positions(&self) -> &BlockPositionCache {
        &self.shared.block_positions
    }

    /* ─────────────────────────── subscriptions ─────────────────────────── */

    pub fn subscribe_edits(&self, ranges: WatchedRanges, callback: Arc<EditCallback>) -> Subscription {
        self.shared.edits.subscribe(ranges, callback)
    }

    /// Change the ranges an edit registration watches.
    pub fn rewatch_edits(&self, id: ListenerId, ranges: WatchedRanges) -> bool {
        self.shared.edits.rekey(id, ranges)
    }

    pub fn subscribe_visibility(
        &self,
        ranges: WatchedRanges,
        callback: Arc<VisibilityCallback>,
    ) -> Subscription {
        self.shared.visibility.subscribe(ranges, callback)
    }

    pub fn rewatch_visibility(&self, id: ListenerId, ranges: WatchedRanges) -> bool {
        self.shared.visibility.rekey(id, ranges)
    }

    pub fn edit_listener_count(&self) -> usize {
        self.shared.edits.len()
    }

    pub fn visibility_listener_count(&self) -> usize {
        self.shared.visibility.len()
    }

    /// Announce a completed full recalculation to every edit listener.
    pub fn notify_recalculated(&self) {
        self.dispatch(&[EditEvent::Recalculated], &[]);
    }

    /* ─────────────────────────── single-step mutations ─────────────────────────── */

    pub fn add_sheet(&self, name: &str) -> Result<SheetIndex> {
        self.edit(|tx| tx.add_sheet(name))
    }

    pub fn insert_sheet(&self, at: SheetIndex, name: &str) -> Result<()> {
        self.edit(|tx| tx.insert_sheet(at, name))
    }

    pub fn remove_sheet(&self, index: SheetIndex) -> Result<()> {
        self.edit(|tx| tx.remove_sheet(index))
    }

    pub fn set_value(&self, addr: CellAddress, value: impl Into<CellValue>) -> Result<()> {
        let value = value.into();
        self.edit(|tx| tx.set_value(addr, value))
    }

    pub fn clear_cell(&self, addr: CellAddress) -> Result<()> {
        self.edit(|tx| tx.set_value(addr, CellValue::Empty))
    }

    pub fn set_number_format(&self, addr: CellAddress, key: u32) -> Result<()> {
        self.edit(|tx| tx.set_number_format(addr, key))
    }

    pub fn set_rows_hidden(&self, sheet: SheetIndex, first: u32, last: u32, hidden: bool) -> Result<()> {
        self.edit(|tx| tx.set_rows_hidden(sheet, first, last, hidden))
    }

    pub fn set_rows_filtered(&self, sheet: SheetIndex, first: u32, last: u32, filtered: bool) -> Result<()> {
        self.edit(|tx| tx.set_rows_filtered(sheet, first, last, filtered))
    }

    pub fn set_columns_hidden(&self, sheet: SheetIndex, first: u32, last: u32, hidden: bool) -> Result<()> {
        self.edit(|tx| tx.set_columns_hidden(sheet, first, last, hidden))
    }

    pub fn insert_rows(&self, sheet: SheetIndex, before: u32, count: u32) -> Result<()> {
        self.edit(|tx| tx.insert_rows(sheet, before, count))
    }

    pub fn delete_rows(&self, sheet: SheetIndex, start: u32, count: u32) -> Result<()> {
        self.edit(|tx| tx.delete_rows(sheet, start, count))
    }

    pub fn insert_columns(&self, sheet: SheetIndex, before: u32, count: u32) -> Result<()> {
        self.edit(|tx| tx.insert_columns(sheet, before, count))
    }

    pub fn delete_columns(&self, sheet: SheetIndex, start: u32, count: u32) -> Result<()> {
        self.edit(|tx| tx.delete_columns(sheet, start, count))
    }

    pub fn define_name(&self, name: &str, ranges: Vec<RangeAddress>) -> Result<()> {
        self.edit(|tx| tx.define_name(name, ranges))
    }

    pub fn remove_name(&self, name: &str) -> Result<bool> {
        self.edit(|tx| Ok(tx.remove_name(name)))
    }

    /* ─────────────────────────── single-step queries ─────────────────────────── */

    pub fn sheet_count(&self) -> usize {
        self.read().sheet_count()
    }

    pub fn sheet_index(&self, name: &str) -> Option<SheetIndex> {
        self.read().sheet_index(name)
    }

    pub fn sheet_name(&self, index: SheetIndex) -> Option<String> {
        self.read().sheet_name(index).map(str::to_string)
    }

    pub fn value(&self, addr: CellAddress) -> CellValue {
        self.read().value(addr)
    }

    pub fn display_string(&self, addr: CellAddress) -> String {
        self.read().display_string(addr)
    }

    pub fn number_format(&self, addr: CellAddress) -> u32 {
        self.read().number_format(addr)
    }

    pub fn is_cell_hidden(&self, addr: CellAddress) -> bool {
        self.read().is_cell_hidden(addr)
    }
}

/// Read guard over the document state.
pub struct DocReader<'a> {
    state: RwLockReadGuard<'a, DocState>,
    shared: &'a Shared,
}

impl DocReader<'_> {
    pub fn sheet_count(&self) -> usize {
        self.state.sheets.len()
    }

    pub fn has_sheet(&self, index: SheetIndex) -> bool {
        (index as usize) < self.state.sheets.len()
    }

    pub fn sheet_index(&self, name: &str) -> Option<SheetIndex> {
        self.state.sheet_index(name)
    }

    pub fn sheet_name(&self, index: SheetIndex) -> Option<&str> {
        self.state.sheet(index).ok().map(|s| s.name.as_str())
    }

    fn column(&self, sheet: SheetIndex, col: u32) -> Option<&Column> {
        self.state.sheet(sheet).ok()?.columns.get(col as usize)
    }

    pub fn value(&self, addr: CellAddress) -> CellValue {
        self.column(addr.sheet, addr.col)
            .map_or(CellValue::Empty, |c| c.get(addr.row))
    }

    /// Cursor for walking a column; shared by every reader of this document.
    pub fn block_position(&self, sheet: SheetIndex, col: u32) -> ColumnBlockPosition {
        self.shared.block_positions.block_position(sheet, col)
    }

    /// Read a cell starting the block search at `pos`, and leave `pos` on the block found.
    pub fn cell_at(&self, addr: CellAddress, pos: &ColumnBlockPosition) -> (CellKind, CellValue) {
        let Some(column) = self.column(addr.sheet, addr.col) else {
            return (CellKind::Empty, CellValue::Empty);
        };
        match column.lookup(addr.row, pos.get()) {
            Some(slot) => {
                pos.set(slot.block);
                (column.kind_at(slot), column.value_at(slot))
            }
            None => (CellKind::Empty, CellValue::Empty),
        }
    }

    pub fn kind(&self, addr: CellAddress) -> CellKind {
        self.column(addr.sheet, addr.col)
            .and_then(|c| c.lookup(addr.row, 0).map(|slot| c.kind_at(slot)))
            .unwrap_or(CellKind::Empty)
    }

    pub fn display_string(&self, addr: CellAddress) -> String {
        self.value(addr).display_string()
    }

    pub fn number_format(&self, addr: CellAddress) -> u32 {
        self.state
            .sheet(addr.sheet)
            .ok()
            .and_then(|s| s.formats.get(&(addr.row, addr.col)).copied())
            .unwrap_or(0)
    }

    pub fn is_row_hidden(&self, sheet: SheetIndex, row: u32) -> bool {
        self.state
            .sheet(sheet)
            .is_ok_and(|s| s.visibility.is_row_hidden(row))
    }

    pub fn is_col_hidden(&self, sheet: SheetIndex, col: u32) -> bool {
        self.state
            .sheet(sheet)
            .is_ok_and(|s| s.visibility.is_col_hidden(col))
    }

    pub fn is_cell_hidden(&self, addr: CellAddress) -> bool {
        self.state.sheet(addr.sheet).is_ok_and(|s| {
            s.visibility.is_row_hidden(addr.row) || s.visibility.is_col_hidden(addr.col)
        })
    }

    pub fn named_ranges(&self, name: &str) -> Option<&[RangeAddress]> {
        self.state
            .names
            .get(&name.to_uppercase())
            .map(|d| d.ranges.as_slice())
    }

    pub fn defined_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.names.values().map(|d| d.name.clone()).collect();
        names.sort();
        names
    }

    pub fn external_links(&self) -> &ExternalLinks {
        &self.shared.external
    }
}

/// Mutable access to the document inside [`Document::edit`].
pub struct Transaction<'a> {
    state: &'a mut DocState,
    events: Vec<EditEvent>,
    visibility: Vec<VisibilityChange>,
    structural: bool,
}

impl Transaction<'_> {
    pub fn value(&self, addr: CellAddress) -> CellValue {
        self.state
            .sheet(addr.sheet)
            .ok()
            .and_then(|s| s.columns.get(addr.col as usize))
            .map_or(CellValue::Empty, |c| c.get(addr.row))
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<SheetIndex> {
        let at = SheetIndex::try_from(self.state.sheets.len()).map_err(|_| DocumentError::TooManySheets)?;
        self.check_new_sheet_name(name)?;
        self.state.sheets.push(Sheet::named(name));
        Ok(at)
    }

    pub fn insert_sheet(&mut self, at: SheetIndex, name: &str) -> Result<()> {
        if at as usize > self.state.sheets.len() {
            return Err(DocumentError::UnknownSheet(at));
        }
        if self.state.sheets.len() >= SheetIndex::MAX as usize {
            return Err(DocumentError::TooManySheets);
        }
        self.check_new_sheet_name(name)?;
        self.state.sheets.insert(at as usize, Sheet::named(name));
        self.structure(StructuralChange::InsertSheet { at });
        Ok(())
    }

    pub fn remove_sheet(&mut self, index: SheetIndex) -> Result<()> {
        self.state.sheet(index)?;
        self.state.sheets.remove(index as usize);
        self.structure(StructuralChange::RemoveSheet { index });
        Ok(())
    }

    pub fn set_value(&mut self, addr: CellAddress, value: CellValue) -> Result<()> {
        let addr = CellAddress::checked(addr.sheet, addr.row, addr.col)?;
        let sheet = self.state.sheet_mut(addr.sheet)?;
        let col = addr.col as usize;
        if col >= sheet.columns.len() {
            if value.is_empty() {
                return Ok(());
            }
            sheet.columns.resize_with(col + 1, Column::default);
        }
        sheet.columns[col].set(addr.row, value);
        self.events
            .push(EditEvent::CellsChanged(RangeAddress::from_cell(addr)));
        Ok(())
    }

    pub fn set_number_format(&mut self, addr: CellAddress, key: u32) -> Result<()> {
        let addr = CellAddress::checked(addr.sheet, addr.row, addr.col)?;
        let sheet = self.state.sheet_mut(addr.sheet)?;
        if key == 0 {
            sheet.formats.remove(&(addr.row, addr.col));
        } else {
            sheet.formats.insert((addr.row, addr.col), key);
        }
        Ok(())
    }

    pub fn set_rows_hidden(&mut self, sheet: SheetIndex, first: u32, last: u32, hidden: bool) -> Result<()> {
        self.rows_visibility(sheet, first, last, hidden, HideSource::Manual)
    }

    pub fn set_rows_filtered(&mut self, sheet: SheetIndex, first: u32, last: u32, filtered: bool) -> Result<()> {
        self.rows_visibility(sheet, first, last, filtered, HideSource::Filter)
    }

    fn rows_visibility(
        &mut self,
        sheet: SheetIndex,
        first: u32,
        last: u32,
        hidden: bool,
        source: HideSource,
    ) -> Result<()> {
        check_span(first, last, MAX_ROWS, AddressError::RowOutOfBounds)?;
        let changed = self
            .state
            .sheet_mut(sheet)?
            .visibility
            .set_rows_hidden(first, last, hidden, source);
        if changed {
            self.visibility
                .push(VisibilityChange::Rows { sheet, first, last });
        }
        Ok(())
    }

    pub fn set_columns_hidden(&mut self, sheet: SheetIndex, first: u32, last: u32, hidden: bool) -> Result<()> {
        check_span(first, last, MAX_COLS, AddressError::ColumnOutOfBounds)?;
        let changed = self
            .state
            .sheet_mut(sheet)?
            .visibility
            .set_cols_hidden(first, last, hidden);
        if changed {
            self.visibility
                .push(VisibilityChange::Cols { sheet, first, last });
        }
        Ok(())
    }

    pub fn insert_rows(&mut self, sheet: SheetIndex, before: u32, count: u32) -> Result<()> {
        check_span(before, before, MAX_ROWS, AddressError::RowOutOfBounds)?;
        let target = self.state.sheet_mut(sheet)?;
        if count == 0 {
            return Ok(());
        }
        for column in &mut target.columns {
            column.insert_rows(before, count);
            if column.len() > MAX_ROWS {
                column.delete_rows(MAX_ROWS, column.len() - MAX_ROWS);
            }
        }
        target.visibility.insert_rows(before, count);
        target.shift_formats(|r, c| {
            let r = if r >= before { r.checked_add(count)? } else { r };
            (r < MAX_ROWS).then_some((r, c))
        });
        self.structure(StructuralChange::InsertRows {
            sheet,
            before,
            count,
        });
        Ok(())
    }

    pub fn delete_rows(&mut self, sheet: SheetIndex, start: u32, count: u32) -> Result<()> {
        check_span(start, start, MAX_ROWS, AddressError::RowOutOfBounds)?;
        let target = self.state.sheet_mut(sheet)?;
        if count == 0 {
            return Ok(());
        }
        for column in &mut target.columns {
            column.delete_rows(start, count);
        }
        target.visibility.delete_rows(start, count);
        let end = start.saturating_add(count);
        target.shift_formats(|r, c| match r {
            r if r < start => Some((r, c)),
            r if r < end => None,
            r => Some((r - count, c)),
        });
        self.structure(StructuralChange::DeleteRows {
            sheet,
            start,
            count,
        });
        Ok(())
    }

    pub fn insert_columns(&mut self, sheet: SheetIndex, before: u32, count: u32) -> Result<()> {
        check_span(before, before, MAX_COLS, AddressError::ColumnOutOfBounds)?;
        let target = self.state.sheet_mut(sheet)?;
        if count == 0 {
            return Ok(());
        }
        let at = before as usize;
        if at < target.columns.len() {
            let fresh = std::iter::repeat_with(Column::default).take(count as usize);
            target.columns.splice(at..at, fresh);
            target.columns.truncate(MAX_COLS as usize);
        }
        target.visibility.insert_cols(before, count);
        target.shift_formats(|r, c| {
            let c = if c >= before { c.checked_add(count)? } else { c };
            (c < MAX_COLS).then_some((r, c))
        });
        self.structure(StructuralChange::InsertColumns {
            sheet,
            before,
            count,
        });
        Ok(())
    }

    pub fn delete_columns(&mut self, sheet: SheetIndex, start: u32, count: u32) -> Result<()> {
        check_span(start, start, MAX_COLS, AddressError::ColumnOutOfBounds)?;
        let target = self.state.sheet_mut(sheet)?;
        if count == 0 {
            return Ok(());
        }
        let len = target.columns.len();
        let from = (start as usize).min(len);
        let to = (start.saturating_add(count) as usize).min(len);
        target.columns.drain(from..to);
        target.visibility.delete_cols(start, count);
        let end = start.saturating_add(count);
        target.shift_formats(|r, c| match c {
            c if c < start => Some((r, c)),
            c if c < end => None,
            c => Some((r, c - count)),
        });
        self.structure(StructuralChange::DeleteColumns {
            sheet,
            start,
            count,
        });
        Ok(())
    }

    pub fn define_name(&mut self, name: &str, ranges: Vec<RangeAddress>) -> Result<()> {
        if !is_valid_defined_name(name) {
            return Err(DocumentError::InvalidName(name.to_string()));
        }
        for range in &ranges {
            self.state.sheet(range.last_sheet)?;
        }
        self.state.names.insert(
            name.to_uppercase(),
            DefinedName {
                name: name.to_string(),
                ranges,
            },
        );
        self.events.push(EditEvent::NamesChanged);
        Ok(())
    }

    pub fn remove_name(&mut self, name: &str) -> bool {
        let removed = self.state.names.remove(&name.to_uppercase()).is_some();
        if removed {
            self.events.push(EditEvent::NamesChanged);
        }
        removed
    }

    fn structure(&mut self, change: StructuralChange) {
        self.state.adjust_names(&change);
        self.structural = true;
        self.events.push(EditEvent::Structure(change));
    }

    fn check_new_sheet_name(&self, name: &str) -> Result<()> {
        let invalid = name.is_empty()
            || name.starts_with('\'')
            || name.ends_with('\'')
            || name
                .chars()
                .any(|c| matches!(c, ':' | '!' | '[' | ']' | '\\' | '/' | '?' | '*'));
        if invalid {
            return Err(DocumentError::InvalidSheetName(name.to_string()));
        }
        if self.state.sheet_index(name).is_some() {
            return Err(DocumentError::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }
}

fn check_span(first: u32, last: u32, limit: u32, err: fn(u32) -> AddressError) -> Result<()> {
    if last >= limit {
        return Err(err(last).into());
    }
    if first > last {
        return Err(AddressError::RangeOrder.into());
    }
    Ok(())
}

fn is_valid_defined_name(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '\\');
    head_ok
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.'))
        && A1Cell::parse(name).is_err()
}
