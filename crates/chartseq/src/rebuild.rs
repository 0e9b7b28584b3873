//! Materializing a token list into a [`Snapshot`].

use chartseq_common::{CellAddress, ExternalArea, RangeAddress, ReferenceToken, SheetIndex};
use chartseq_doc::DocReader;

use crate::error::{ChartError, Result};
use crate::snapshot::{CacheItem, ItemOrigin, Snapshot, kind_of};

/// What to resolve and how.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BuildParams {
    /// Pin local references to this sheet (time-based sequences).
    pub pinned_sheet: Option<SheetIndex>,
    pub include_hidden: bool,
    pub max_cells: usize,
}

fn pinned(token: &ReferenceToken, sheet: Option<SheetIndex>) -> ReferenceToken {
    match sheet {
        Some(s) => token.pinned_to_sheet(s),
        None => token.clone(),
    }
}

/// Local ranges and external areas to walk, in token order.
enum Target<'t> {
    Local(RangeAddress),
    External(&'t ExternalArea),
}

fn targets<'t>(
    doc: &'t DocReader<'_>,
    tokens: &'t [ReferenceToken],
    sheet: Option<SheetIndex>,
) -> Vec<Target<'t>> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            ReferenceToken::Cell(_) | ReferenceToken::Area(_) => {
                out.extend(pinned(token, sheet).local_range().map(Target::Local));
            }
            ReferenceToken::Name(name) => {
                for range in doc.named_ranges(name).unwrap_or_default() {
                    let range = match sheet {
                        Some(s) => range.on_sheet(s),
                        None => *range,
                    };
                    out.push(Target::Local(range));
                }
            }
            ReferenceToken::External(ext) => out.push(Target::External(ext)),
            ReferenceToken::Deleted => {}
        }
    }
    out
}

fn target_cells(target: &Target<'_>) -> u64 {
    match target {
        Target::Local(range) => range.cell_count(),
        Target::External(ext) => u64::from(ext.width()) * u64::from(ext.height()),
    }
}

fn walk_local(doc: &DocReader<'_>, range: &RangeAddress, items: &mut Vec<CacheItem>) {
    for sheet in range.first_sheet..=range.last_sheet {
        if !doc.has_sheet(sheet) {
            #[cfg(feature = "tracing")]
            tracing::warn!(sheet, "reference to a missing sheet resolves to no cells");
            continue;
        }
        let cols = range.start_col..=range.end_col;
        let cursors: Vec<_> = cols.clone().map(|c| doc.block_position(sheet, c)).collect();
        let col_hidden: Vec<bool> = cols.clone().map(|c| doc.is_col_hidden(sheet, c)).collect();
        for row in range.start_row..=range.end_row {
            let row_hidden = doc.is_row_hidden(sheet, row);
            for (i, col) in cols.clone().enumerate() {
                let addr = CellAddress { sheet, row, col };
                let (kind, value) = doc.cell_at(addr, &cursors[i]);
                items.push(CacheItem::from_cell(
                    kind,
                    &value,
                    row_hidden || col_hidden[i],
                    ItemOrigin::Local(addr),
                ));
            }
        }
    }
}

fn walk_external(doc: &DocReader<'_>, ext: &ExternalArea, items: &mut Vec<CacheItem>) {
    let links = doc.external_links();
    for (row, col) in ext.positions() {
        let value = links
            .cached_value(ext.file, &ext.sheet, row, col)
            .unwrap_or_default();
        items.push(CacheItem::from_cell(
            kind_of(&value),
            &value,
            false,
            ItemOrigin::External {
                file: ext.file,
                row,
                col,
            },
        ));
    }
}

/// Resolve `tokens` in order into a fresh snapshot.
///
/// Fails without side effects when the resolved slot count exceeds `max_cells`.
pub(crate) fn build_snapshot(
    doc: &DocReader<'_>,
    tokens: &[ReferenceToken],
    params: BuildParams,
) -> Result<Snapshot> {
    let targets = targets(doc, tokens, params.pinned_sheet);
    let total: u64 = targets.iter().map(target_cells).sum();
    if total > params.max_cells as u64 {
        return Err(ChartError::OutOfRange {
            index: i64::try_from(total).unwrap_or(i64::MAX),
            len: params.max_cells,
        });
    }

    let mut items = Vec::with_capacity(total as usize);
    for target in &targets {
        match target {
            Target::Local(range) => walk_local(doc, range, &mut items),
            Target::External(ext) => walk_external(doc, ext, &mut items),
        }
    }
    Ok(Snapshot::new(items, params.include_hidden))
}
