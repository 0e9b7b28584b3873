//! Live data sequences: a reference list, its cached values and the subscriptions that
//! keep the cache honest.
//!
//! A sequence starts clean after its first build. Any edit, visibility change or external
//! link update that can affect its cells marks it dirty, and modify listeners hear about
//! it once per clean-to-dirty transition. The next read rebuilds the snapshot from the
//! document. Time-based sequences rebuild eagerly when their cursor moves.
//!
//! Document callbacks hold only a weak reference to the sequence, and dropping the last
//! handle drops every subscription, so no callback ever reaches a destroyed sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chartseq_common::{CellValue, FileId, ReferenceToken, SheetIndex, format_api_list};
use chartseq_doc::{
    Document, EditCallback, EditEvent, LinkCallback, LinkUpdate, ListenerId, Subscription,
    VisibilityCallback, WeakDocument,
};
use parking_lot::Mutex;

use crate::config::ProviderConfig;
use crate::error::{ChartError, Result};
use crate::label::{Extent, LabelOrigin, generate_labels};
use crate::listener::{ModifyEvent, ModifyListener, ModifyListeners, SequenceId};
use crate::rebuild::{BuildParams, build_snapshot};
use crate::resolve::{external_files, local_ranges, token_specs, validate_tokens};
use crate::role::Role;
use crate::snapshot::{CacheItem, ItemOrigin, SequenceValue, Snapshot, kind_of};
use crate::time::TimeWindow;
use crate::value_array::format_value_array;
use crate::watch::{ExternalLinkWatch, HiddenRangeWatch};

static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(1);

struct SequenceState {
    tokens: Vec<ReferenceToken>,
    include_hidden: bool,
    window: Option<TimeWindow>,
    snapshot: Arc<Snapshot>,
    dirty: bool,
    generation: u64,
}

impl SequenceState {
    /// Returns `true` on a clean-to-dirty transition.
    fn mark_dirty(&mut self) -> bool {
        !std::mem::replace(&mut self.dirty, true)
    }

    fn params(&self, config: &ProviderConfig) -> BuildParams {
        BuildParams {
            pinned_sheet: self.window.map(|w| w.current),
            include_hidden: self.include_hidden,
            max_cells: config.max_cells_per_sequence,
        }
    }
}

#[derive(Default)]
struct Watches {
    edits: Option<Subscription>,
    hidden: Option<HiddenRangeWatch>,
    external: Option<ExternalLinkWatch>,
}

struct SequenceInner {
    id: SequenceId,
    doc: WeakDocument,
    role: Role,
    config: ProviderConfig,
    /// Literal representation for sequences created from a value array.
    literal: Option<String>,
    state: Mutex<SequenceState>,
    watches: Mutex<Watches>,
    listeners: ModifyListeners,
}

impl Drop for SequenceInner {
    fn drop(&mut self) {
        let watches = std::mem::take(self.watches.get_mut());
        drop(watches);
        #[cfg(feature = "tracing")]
        tracing::trace!(sequence = self.id, "sequence dropped, subscriptions released");
    }
}

/// Shared handle to one live data sequence.
///
/// Cloning the handle shares the sequence; [`DataSequence::create_clone`] makes an
/// independent copy with its own cache and subscriptions.
#[derive(Clone)]
pub struct DataSequence {
    inner: Arc<SequenceInner>,
}

impl std::fmt::Debug for DataSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DataSequence")
            .field("id", &self.inner.id)
            .field("role", &self.inner.role)
            .field("tokens", &state.tokens)
            .field("window", &state.window)
            .field("dirty", &state.dirty)
            .finish()
    }
}

impl DataSequence {
    fn assemble(
        doc: WeakDocument,
        role: Role,
        config: ProviderConfig,
        literal: Option<String>,
        state: SequenceState,
    ) -> Self {
        Self {
            inner: Arc::new(SequenceInner {
                id: NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
                doc,
                role,
                config,
                literal,
                state: Mutex::new(state),
                watches: Mutex::new(Watches::default()),
                listeners: ModifyListeners::default(),
            }),
        }
    }

    /// Sequence over `tokens`, subscribed and built.
    pub fn new(
        doc: &Document,
        tokens: Vec<ReferenceToken>,
        role: Role,
        include_hidden: bool,
        config: ProviderConfig,
    ) -> Result<Self> {
        validate_tokens(&doc.read(), &tokens)?;
        Self::start(doc, role, config, tokens, include_hidden, None)
    }

    fn start(
        doc: &Document,
        role: Role,
        config: ProviderConfig,
        tokens: Vec<ReferenceToken>,
        include_hidden: bool,
        window: Option<TimeWindow>,
    ) -> Result<Self> {
        let seq = Self::assemble(
            doc.downgrade(),
            role,
            config,
            None,
            SequenceState {
                tokens,
                include_hidden,
                window,
                snapshot: Arc::new(Snapshot::empty()),
                dirty: true,
                generation: 0,
            },
        );
        seq.sync_watches(doc);
        seq.rebuild_with(doc)?;
        Ok(seq)
    }

    /// Detached sequence holding literal values. It never changes and has no document.
    pub fn from_values(role: Role, values: Vec<CellValue>) -> Self {
        let repr = format_value_array(&values);
        let items = values
            .iter()
            .map(|v| CacheItem::from_cell(kind_of(v), v, false, ItemOrigin::Literal))
            .collect();
        Self::assemble(
            WeakDocument::default(),
            role,
            ProviderConfig::default(),
            Some(repr),
            SequenceState {
                tokens: Vec::new(),
                include_hidden: true,
                window: None,
                snapshot: Arc::new(Snapshot::new(items, true)),
                dirty: false,
                generation: 1,
            },
        )
    }

    /* ─────────────────────────── identity & properties ─────────────────────────── */

    pub fn id(&self) -> SequenceId {
        self.inner.id
    }

    pub fn role(&self) -> &Role {
        &self.inner.role
    }

    pub fn document(&self) -> WeakDocument {
        self.inner.doc.clone()
    }

    pub fn is_literal(&self) -> bool {
        self.inner.literal.is_some()
    }

    pub fn tokens(&self) -> Vec<ReferenceToken> {
        self.inner.state.lock().tokens.clone()
    }

    pub fn include_hidden_cells(&self) -> bool {
        self.inner.state.lock().include_hidden
    }

    pub fn is_time_based(&self) -> bool {
        self.inner.state.lock().window.is_some()
    }

    pub fn time_window(&self) -> Option<TimeWindow> {
        self.inner.state.lock().window
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.state.lock().dirty
    }

    /// External files this sequence currently listens to.
    pub fn watched_files(&self) -> Vec<FileId> {
        self.inner
            .watches
            .lock()
            .external
            .as_ref()
            .map(ExternalLinkWatch::file_ids)
            .unwrap_or_default()
    }

    fn live_document(&self) -> Result<Document> {
        self.inner.doc.upgrade().ok_or(ChartError::DocumentDisposed)
    }

    fn require_live(&self) -> Result<Document> {
        if self.is_literal() {
            return Err(ChartError::argument("literal sequences have no cell references"));
        }
        self.live_document()
    }

    /* ─────────────────────────── reads ─────────────────────────── */

    /// Current snapshot, rebuilt first if stale.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let mut state = self.inner.state.lock();
        if self.is_literal() {
            return Ok(state.snapshot.clone());
        }
        let Some(doc) = self.inner.doc.upgrade() else {
            state.snapshot = Arc::new(Snapshot::empty());
            state.dirty = true;
            return Err(ChartError::DocumentDisposed);
        };
        if !state.dirty {
            return Ok(state.snapshot.clone());
        }
        self.rebuild_locked(&doc, &mut state)
    }

    /// Every resolved slot, hidden or not: numbers where the cell is numeric, text elsewhere.
    pub fn data(&self) -> Result<Vec<SequenceValue>> {
        Ok(self.snapshot()?.mixed().to_vec())
    }

    /// Numeric view without hidden slots; non-numeric slots read as `0.0`.
    pub fn numerical_data(&self) -> Result<Vec<f64>> {
        Ok(self.snapshot()?.numeric().to_vec())
    }

    /// Display strings without hidden slots.
    pub fn textual_data(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.textual().to_vec())
    }

    /// Slot indices left out of the typed views because their cells are hidden.
    pub fn hidden_values(&self) -> Result<Vec<usize>> {
        Ok(self.snapshot()?.hidden_indices().to_vec())
    }

    /// Rebuild now regardless of the dirty flag.
    pub fn build(&self) -> Result<()> {
        if self.is_literal() {
            return Ok(());
        }
        let doc = self.live_document()?;
        self.rebuild_with(&doc).map(|_| ())
    }

    fn rebuild_with(&self, doc: &Document) -> Result<Arc<Snapshot>> {
        let mut state = self.inner.state.lock();
        self.rebuild_locked(doc, &mut state)
    }

    fn rebuild_locked(&self, doc: &Document, state: &mut SequenceState) -> Result<Arc<Snapshot>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "sequence_rebuild",
            sequence = self.inner.id,
            tokens = state.tokens.len()
        )
        .entered();

        let params = state.params(&self.inner.config);
        let snapshot = build_snapshot(&doc.read(), &state.tokens, params)?;
        state.snapshot = Arc::new(snapshot);
        state.dirty = false;
        state.generation += 1;
        Ok(state.snapshot.clone())
    }

    /// Number format of the cell behind slot `index`.
    ///
    /// `-1` asks for the first non-empty slot and yields `0` when there is none.
    /// Slots that are not local cells always report `0`.
    pub fn number_format_key_by_index(&self, index: i64) -> Result<u32> {
        let snapshot = self.snapshot()?;
        let item = if index == -1 {
            match snapshot.items().iter().find(|item| !item.is_empty()) {
                Some(item) => item,
                None => return Ok(0),
            }
        } else {
            usize::try_from(index)
                .ok()
                .and_then(|i| snapshot.items().get(i))
                .ok_or(ChartError::OutOfRange {
                    index,
                    len: snapshot.len(),
                })?
        };
        match item.origin {
            ItemOrigin::Local(addr) => Ok(self.live_document()?.read().number_format(addr)),
            ItemOrigin::External { .. } | ItemOrigin::Literal => Ok(0),
        }
    }

    /* ─────────────────────────── representation ─────────────────────────── */

    /// Canonical API-form text of the reference list.
    pub fn source_range_representation(&self) -> Result<String> {
        if let Some(repr) = &self.inner.literal {
            return Ok(repr.clone());
        }
        let doc = self.live_document()?;
        let tokens = self.tokens();
        let specs = token_specs(&doc.read(), &tokens);
        Ok(format_api_list(&specs, self.inner.config.list_separator))
    }

    /// Synthetic labels (`Column A`, `Row 3`, or ordinals) derived from the referenced ranges.
    pub fn generate_label(&self, origin: LabelOrigin) -> Result<Vec<String>> {
        if self.is_literal() {
            return Ok(Vec::new());
        }
        let doc = self.live_document()?;
        let tokens = self.tokens();
        let reader = doc.read();
        let mut extents: Vec<Extent> = local_ranges(&reader, &tokens)
            .iter()
            .map(|r| (r.start_row, r.start_col, r.end_row, r.end_col))
            .collect();
        extents.extend(tokens.iter().filter_map(|t| match t {
            ReferenceToken::External(ext) => {
                Some((ext.start_row, ext.start_col, ext.end_row, ext.end_col))
            }
            _ => None,
        }));
        Ok(generate_labels(&extents, origin))
    }

    /* ─────────────────────────── mutation ─────────────────────────── */

    /// Replace the reference list. Subscriptions follow the new references.
    pub fn set_tokens(&self, tokens: Vec<ReferenceToken>) -> Result<()> {
        let doc = self.require_live()?;
        validate_tokens(&doc.read(), &tokens)?;
        {
            let mut state = self.inner.state.lock();
            state.tokens = tokens;
            state.dirty = true;
        }
        self.sync_watches(&doc);
        self.refresh_and_notify(&doc);
        Ok(())
    }

    pub fn set_include_hidden_cells(&self, include: bool) -> Result<()> {
        let doc = self.require_live()?;
        {
            let mut state = self.inner.state.lock();
            if state.include_hidden == include {
                return Ok(());
            }
            state.include_hidden = include;
        }
        self.sync_watches(&doc);
        self.refresh_and_notify(&doc);
        Ok(())
    }

    /// Turn time-based mode on or off. Enabling spans the sheet band of the local
    /// references and positions the cursor on its first sheet.
    pub fn set_time_based(&self, enabled: bool) -> Result<()> {
        let doc = self.require_live()?;
        {
            let mut state = self.inner.state.lock();
            if enabled == state.window.is_some() {
                return Ok(());
            }
            state.window = if enabled {
                let band = state
                    .tokens
                    .iter()
                    .filter_map(ReferenceToken::local_range)
                    .map(|r| (r.first_sheet, r.last_sheet))
                    .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)));
                let (start, end) = band.ok_or_else(|| {
                    ChartError::argument("a time-based sequence needs a local cell reference")
                })?;
                Some(TimeWindow::new(start, end))
            } else {
                None
            };
        }
        self.refresh_and_notify(&doc);
        Ok(())
    }

    /// Mark dirty, rebuild right away and tell listeners. A failed rebuild leaves the
    /// sequence dirty so the error resurfaces on the next read.
    fn refresh_and_notify(&self, doc: &Document) {
        {
            let mut state = self.inner.state.lock();
            state.dirty = true;
            if let Err(_err) = self.rebuild_locked(doc, &mut state) {
                #[cfg(feature = "tracing")]
                tracing::warn!(sequence = self.inner.id, error = %_err, "eager rebuild failed");
            }
        }
        self.notify();
    }

    fn move_cursor(&self, pick: impl FnOnce(&TimeWindow) -> Option<SheetIndex>) -> bool {
        let Some(doc) = self.inner.doc.upgrade() else {
            return false;
        };
        {
            let mut state = self.inner.state.lock();
            let Some(window) = state.window.as_mut() else {
                return false;
            };
            let Some(sheet) = pick(window) else {
                return false;
            };
            window.current = sheet;
        }
        self.refresh_and_notify(&doc);
        true
    }

    /// Step the time cursor one sheet forward. Returns `false` at the end of the window
    /// without `wrap`, or when the sequence is not time-based.
    pub fn switch_to_next(&self, wrap: bool) -> bool {
        self.move_cursor(|w| w.next(wrap))
    }

    /// Put the cursor on the sheet `point` positions into the window.
    pub fn set_to_point_in_time(&self, point: u32) -> bool {
        self.move_cursor(|w| w.point(point))
    }

    /// Redefine the window. The cursor is clamped into the new band; the sequence
    /// rebuilds and notifies only when that moves it.
    pub fn set_range(&self, start: SheetIndex, end: SheetIndex) -> Result<()> {
        if start > end {
            return Err(ChartError::argument(format!(
                "time range start {start} is after end {end}"
            )));
        }
        let doc = self.require_live()?;
        let moved = {
            let mut state = self.inner.state.lock();
            let window = state
                .window
                .as_mut()
                .ok_or_else(|| ChartError::argument("sequence is not time-based"))?;
            let current = window.current.clamp(start, end);
            let moved = current != window.current;
            *window = TimeWindow {
                start,
                end,
                current,
            };
            moved
        };
        if moved {
            self.refresh_and_notify(&doc);
        }
        Ok(())
    }

    /// Independent copy over the same references, with its own cache and subscriptions.
    pub fn create_clone(&self) -> Result<DataSequence> {
        if self.is_literal() {
            let snapshot = self.inner.state.lock().snapshot.clone();
            return Ok(Self::assemble(
                WeakDocument::default(),
                self.inner.role.clone(),
                self.inner.config.clone(),
                self.inner.literal.clone(),
                SequenceState {
                    tokens: Vec::new(),
                    include_hidden: true,
                    window: None,
                    snapshot,
                    dirty: false,
                    generation: 1,
                },
            ));
        }
        let doc = self.live_document()?;
        let (tokens, include_hidden, window) = {
            let state = self.inner.state.lock();
            (state.tokens.clone(), state.include_hidden, state.window)
        };
        Self::start(
            &doc,
            self.inner.role.clone(),
            self.inner.config.clone(),
            tokens,
            include_hidden,
            window,
        )
    }

    /* ─────────────────────────── modify listeners ─────────────────────────── */

    pub fn add_modify_listener(&self, listener: Arc<dyn ModifyListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Convenience for closure listeners that cannot fail.
    pub fn on_modified<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&ModifyEvent) + Send + Sync + 'static,
    {
        self.add_modify_listener(Arc::new(move |event: &ModifyEvent| -> Result<()> {
            f(event);
            Ok(())
        }))
    }

    pub fn remove_modify_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn modify_listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn notify(&self) {
        let event = ModifyEvent {
            source: self.inner.id,
        };
        self.inner.listeners.broadcast(&event);
    }

    /* ─────────────────────────── change propagation ─────────────────────────── */

    fn weak(&self) -> Weak<SequenceInner> {
        Arc::downgrade(&self.inner)
    }

    fn edit_callback(&self) -> Arc<EditCallback> {
        let weak = self.weak();
        Arc::new(move |event: &EditEvent| {
            if let Some(inner) = weak.upgrade() {
                DataSequence { inner }.on_edit(event);
            }
        })
    }

    fn visibility_callback(&self) -> Arc<VisibilityCallback> {
        let weak = self.weak();
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                DataSequence { inner }.invalidate();
            }
        })
    }

    fn link_callback(&self) -> Arc<LinkCallback> {
        let weak = self.weak();
        Arc::new(move |_file: FileId, _update: LinkUpdate| {
            if let Some(inner) = weak.upgrade() {
                #[cfg(feature = "tracing")]
                tracing::debug!(sequence = inner.id, file = _file, update = ?_update, "linked file changed");
                DataSequence { inner }.invalidate();
            }
        })
    }

    fn invalidate(&self) {
        let transitioned = self.inner.state.lock().mark_dirty();
        if transitioned {
            #[cfg(feature = "tracing")]
            tracing::debug!(sequence = self.inner.id, "sequence marked dirty");
            self.notify();
        }
    }

    fn on_edit(&self, event: &EditEvent) {
        let (transitioned, resync) = {
            let mut state = self.inner.state.lock();
            let named = state.tokens.iter().any(ReferenceToken::is_name);
            let (affected, resync) = match event {
                EditEvent::CellsChanged(_) | EditEvent::Recalculated => (true, false),
                EditEvent::NamesChanged => (named, named),
                EditEvent::Structure(change) => {
                    let tokens: Vec<_> = state.tokens.iter().map(|t| t.adjusted(change)).collect();
                    let window = state.window.and_then(|w| w.adjusted(change));
                    let moved = tokens != state.tokens || window != state.window;
                    if moved {
                        state.tokens = tokens;
                        state.window = window;
                    }
                    (moved || named, moved || named)
                }
            };
            (affected && state.mark_dirty(), resync)
        };
        if resync {
            if let Some(doc) = self.inner.doc.upgrade() {
                self.sync_watches(&doc);
            }
        }
        if transitioned {
            #[cfg(feature = "tracing")]
            tracing::debug!(sequence = self.inner.id, ?event, "sequence marked dirty by edit");
            self.notify();
        }
    }

    /// Point every subscription at what the current references need.
    ///
    /// The watches lock is held from reading the references to the last subscription change,
    /// so concurrent resyncs apply in the order they read.
    fn sync_watches(&self, doc: &Document) {
        let mut watches = self.inner.watches.lock();
        let (ranges, files, include_hidden) = {
            let state = self.inner.state.lock();
            let reader = doc.read();
            (
                local_ranges(&reader, &state.tokens),
                external_files(&state.tokens),
                state.include_hidden,
            )
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            sequence = self.inner.id,
            files = files.len(),
            include_hidden,
            "syncing subscriptions"
        );

        let rewatched = watches
            .edits
            .as_ref()
            .is_some_and(|sub| doc.rewatch_edits(sub.id(), ranges.clone()));
        if !rewatched {
            watches.edits = Some(doc.subscribe_edits(ranges.clone(), self.edit_callback()));
        }

        if include_hidden {
            watches.hidden = None;
        } else {
            let rewatched = watches
                .hidden
                .as_ref()
                .is_some_and(|w| w.rewatch(doc, ranges.clone()));
            if !rewatched {
                watches.hidden = Some(HiddenRangeWatch::register(
                    doc,
                    ranges,
                    self.visibility_callback(),
                ));
            }
        }

        if files.is_empty() {
            watches.external = None;
        } else {
            let callback = self.link_callback();
            watches
                .external
                .get_or_insert_with(|| ExternalLinkWatch::new(callback))
                .sync(doc.external_links(), &files);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartseq_common::{CellAddress, RangeAddress};
    use std::sync::atomic::AtomicUsize;

    fn column(doc: &Document, sheet: SheetIndex, rows: u32) -> DataSequence {
        let range = RangeAddress::new(sheet, 0, 0, rows - 1, 0).unwrap();
        DataSequence::new(
            doc,
            vec![ReferenceToken::Area(range)],
            Role::ValuesY,
            true,
            ProviderConfig::default(),
        )
        .unwrap()
    }

    fn counter(seq: &DataSequence) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        seq.on_modified(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn edits_inside_the_range_dirty_once() {
        let doc = Document::with_sheets(&["Sheet1"]).unwrap();
        let seq = column(&doc, 0, 3);
        let hits = counter(&seq);
        assert!(!seq.is_dirty());

        doc.set_value(CellAddress::new(0, 1, 0), 4.0).unwrap();
        doc.set_value(CellAddress::new(0, 2, 0), 5.0).unwrap();
        doc.set_value(CellAddress::new(0, 9, 0), 6.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(seq.numerical_data().unwrap(), vec![0.0, 4.0, 5.0]);

        doc.set_value(CellAddress::new(0, 0, 0), 1.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn structural_edits_move_the_references() {
        let doc = Document::with_sheets(&["Sheet1"]).unwrap();
        let seq = column(&doc, 0, 2);
        doc.insert_rows(0, 0, 3).unwrap();
        assert_eq!(
            seq.tokens(),
            vec![ReferenceToken::Area(RangeAddress::new(0, 3, 0, 4, 0).unwrap())]
        );
        assert_eq!(seq.source_range_representation().unwrap(), "Sheet1!$A$4:$A$5");

        doc.set_value(CellAddress::new(0, 3, 0), 8.0).unwrap();
        assert_eq!(seq.numerical_data().unwrap(), vec![8.0, 0.0]);
    }

    #[test]
    fn literal_sequences_never_change() {
        let seq = DataSequence::from_values(
            Role::Label,
            vec![CellValue::Number(1.0), CellValue::from("b")],
        );
        assert!(seq.is_literal());
        assert_eq!(seq.source_range_representation().unwrap(), "{1;\"b\"}");
        assert_eq!(seq.textual_data().unwrap(), vec!["1", "b"]);
        assert!(seq.set_time_based(true).is_err());
        assert!(!seq.switch_to_next(true));
        assert_eq!(seq.create_clone().unwrap().data().unwrap(), seq.data().unwrap());
    }
}
