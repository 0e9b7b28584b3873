//! Conversion between parsed range representations and resolved reference tokens.

use chartseq_common::{
    A1Cell, AreaSpec, CellAddress, ExternalArea, FileId, RangeAddress, RangeSpec, RangeSpecList,
    ReferenceToken, SheetIndex,
};
use chartseq_doc::{DocReader, WatchedRanges};
use smallvec::SmallVec;

use crate::error::{ChartError, Result};

/// How unknown external files are handled during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileMode {
    /// Assign a file id on first use.
    Register,
    /// Accept any file name without touching the registry. Used by probes.
    Probe,
}

fn sheet_of(doc: &DocReader<'_>, name: Option<&str>) -> Result<SheetIndex> {
    match name {
        Some(name) => doc
            .sheet_index(name)
            .ok_or_else(|| ChartError::argument(format!("unknown sheet '{name}'"))),
        None if doc.sheet_count() > 0 => Ok(0),
        None => Err(ChartError::argument("document has no sheets")),
    }
}

fn corners(area: &AreaSpec) -> (A1Cell, A1Cell) {
    (area.start, area.end.unwrap_or(area.start))
}

fn resolve_area(doc: &DocReader<'_>, area: &AreaSpec, files: FileMode) -> Result<ReferenceToken> {
    let (start, end) = corners(area);
    if let Some(file) = &area.file {
        let id = match files {
            FileMode::Register => doc.external_links().register_file(file)?,
            FileMode::Probe => doc.external_links().file_id(file).unwrap_or(FileId::MAX),
        };
        let sheet = area
            .sheet
            .clone()
            .ok_or_else(|| ChartError::argument(format!("external reference into '{file}' has no sheet")))?;
        return Ok(ReferenceToken::External(ExternalArea {
            file: id,
            sheet,
            start_row: start.row,
            start_col: start.col,
            end_row: end.row,
            end_col: end.col,
            single_cell: area.end.is_none(),
        }));
    }

    let first = sheet_of(doc, area.sheet.as_deref())?;
    let last = match &area.last_sheet {
        Some(name) => sheet_of(doc, Some(name))?,
        None => first,
    };
    let (first, last) = (first.min(last), first.max(last));
    if area.end.is_none() && first == last {
        return Ok(ReferenceToken::Cell(CellAddress::checked(first, start.row, start.col)?));
    }
    Ok(ReferenceToken::Area(RangeAddress::with_band(
        first, last, start.row, start.col, end.row, end.col,
    )?))
}

/// Resolve parsed specs against the document's sheets, names and linked files.
pub(crate) fn resolve_specs(
    doc: &DocReader<'_>,
    specs: &[RangeSpec],
    files: FileMode,
) -> Result<Vec<ReferenceToken>> {
    specs
        .iter()
        .map(|spec| match spec {
            RangeSpec::Area(area) => resolve_area(doc, area, files),
            RangeSpec::Name(name) => match doc.named_ranges(name) {
                Some(_) => Ok(ReferenceToken::Name(name.clone())),
                None => Err(ChartError::argument(format!("unknown name '{name}'"))),
            },
            RangeSpec::Deleted => Ok(ReferenceToken::Deleted),
        })
        .collect()
}

/// Check that every token refers to something the document knows.
pub(crate) fn validate_tokens(doc: &DocReader<'_>, tokens: &[ReferenceToken]) -> Result<()> {
    for token in tokens {
        match token {
            ReferenceToken::Cell(_) | ReferenceToken::Area(_) => {
                let Some(range) = token.local_range() else {
                    continue;
                };
                range.validated()?;
                if !doc.has_sheet(range.last_sheet) {
                    return Err(ChartError::argument(format!(
                        "sheet {} does not exist",
                        range.last_sheet
                    )));
                }
            }
            ReferenceToken::External(ext) => {
                ext.validated()?;
                if doc.external_links().file_name(ext.file).is_none() {
                    return Err(ChartError::argument(format!(
                        "external file {} is not registered",
                        ext.file
                    )));
                }
            }
            ReferenceToken::Name(name) => {
                if doc.named_ranges(name).is_none() {
                    return Err(ChartError::argument(format!("unknown name '{name}'")));
                }
            }
            ReferenceToken::Deleted => {}
        }
    }
    Ok(())
}

fn local_spec(doc: &DocReader<'_>, range: &RangeAddress, single_cell: bool) -> RangeSpec {
    let (Some(first), Some(last)) = (
        doc.sheet_name(range.first_sheet),
        doc.sheet_name(range.last_sheet),
    ) else {
        return RangeSpec::Deleted;
    };
    let start = A1Cell::new(range.start_row, range.start_col);
    let end = A1Cell::new(range.end_row, range.end_col);
    RangeSpec::Area(AreaSpec {
        file: None,
        sheet: Some(first.to_string()),
        last_sheet: (range.first_sheet != range.last_sheet).then(|| last.to_string()),
        start,
        end: (!single_cell).then_some(end),
    })
}

/// Turn tokens back into specs with canonical sheet and file names.
pub(crate) fn token_specs(doc: &DocReader<'_>, tokens: &[ReferenceToken]) -> RangeSpecList {
    tokens
        .iter()
        .map(|token| match token {
            ReferenceToken::Cell(cell) => local_spec(doc, &RangeAddress::from_cell(*cell), true),
            ReferenceToken::Area(range) => local_spec(doc, range, false),
            ReferenceToken::External(ext) => match doc.external_links().file_name(ext.file) {
                Some(file) => RangeSpec::Area(AreaSpec {
                    file: Some(file),
                    sheet: Some(ext.sheet.clone()),
                    last_sheet: None,
                    start: A1Cell::new(ext.start_row, ext.start_col),
                    end: (!ext.single_cell).then(|| A1Cell::new(ext.end_row, ext.end_col)),
                }),
                None => RangeSpec::Deleted,
            },
            ReferenceToken::Name(name) => RangeSpec::Name(name.clone()),
            ReferenceToken::Deleted => RangeSpec::Deleted,
        })
        .collect()
}

/// Local rectangles a token list depends on, with names expanded to their current ranges.
pub(crate) fn local_ranges(doc: &DocReader<'_>, tokens: &[ReferenceToken]) -> WatchedRanges {
    let mut out = WatchedRanges::new();
    for token in tokens {
        match token {
            ReferenceToken::Name(name) => {
                out.extend(doc.named_ranges(name).unwrap_or_default().iter().copied());
            }
            other => out.extend(other.local_range()),
        }
    }
    out
}

pub(crate) fn external_files(tokens: &[ReferenceToken]) -> SmallVec<[FileId; 2]> {
    let mut files: SmallVec<[FileId; 2]> = tokens.iter().filter_map(|t| t.external_file()).collect();
    files.sort_unstable();
    files.dedup();
    files
}
