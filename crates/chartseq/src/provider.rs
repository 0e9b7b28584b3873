//! Entry point for chart consumers: turns range text, token lists and literal arrays into
//! live sequences and sources, and converts between range representations.

use chartseq_common::{
    CellAddress, ExternalArea, RangeAddress, ReferenceToken, format_api_list, format_xml_list,
    parse_api_list, parse_xml_list,
};
use chartseq_doc::{DocReader, Document, WeakDocument};

use crate::args::{RowSource, SourceArguments};
use crate::config::ProviderConfig;
use crate::error::{ChartError, Result};
use crate::resolve::{FileMode, resolve_specs, token_specs, validate_tokens};
use crate::role::Role;
use crate::sequence::DataSequence;
use crate::source::{DataSource, LabeledDataSequence};
use crate::value_array::parse_value_array;

/// One column or row of a source range, the unit a series is built from.
#[derive(Debug, Clone, PartialEq)]
enum Strip {
    Local(RangeAddress),
    External(ExternalArea),
}

impl Strip {
    fn length(&self, orientation: RowSource) -> u32 {
        match (self, orientation) {
            (Strip::Local(r), RowSource::Columns) => r.height(),
            (Strip::Local(r), RowSource::Rows) => r.width(),
            (Strip::External(e), RowSource::Columns) => e.height(),
            (Strip::External(e), RowSource::Rows) => e.width(),
        }
    }

    fn token(&self) -> ReferenceToken {
        match self {
            Strip::Local(r) if r.cell_count() == 1 => ReferenceToken::Cell(r.start()),
            Strip::Local(r) => ReferenceToken::Area(*r),
            Strip::External(e) => {
                let single_cell = e.width() == 1 && e.height() == 1;
                ReferenceToken::External(ExternalArea {
                    single_cell,
                    ..e.clone()
                })
            }
        }
    }

    /// The first cell, and the remainder when there is one.
    fn split_head(&self, orientation: RowSource) -> (Strip, Option<Strip>) {
        let rest = self.length(orientation) > 1;
        match self {
            Strip::Local(r) => {
                let mut head = *r;
                let mut tail = *r;
                match orientation {
                    RowSource::Columns => {
                        head.end_row = r.start_row;
                        tail.start_row = r.start_row + 1;
                    }
                    RowSource::Rows => {
                        head.end_col = r.start_col;
                        tail.start_col = r.start_col + 1;
                    }
                }
                (Strip::Local(head), rest.then_some(Strip::Local(tail)))
            }
            Strip::External(e) => {
                let mut head = e.clone();
                let mut tail = e.clone();
                match orientation {
                    RowSource::Columns => {
                        head.end_row = e.start_row;
                        tail.start_row = e.start_row + 1;
                    }
                    RowSource::Rows => {
                        head.end_col = e.start_col;
                        tail.start_col = e.start_col + 1;
                    }
                }
                (Strip::External(head), rest.then_some(Strip::External(tail)))
            }
        }
    }
}

fn split_range(range: &RangeAddress, orientation: RowSource, out: &mut Vec<Strip>) {
    match orientation {
        RowSource::Columns => out.extend((range.start_col..=range.end_col).map(|col| {
            Strip::Local(RangeAddress {
                start_col: col,
                end_col: col,
                ..*range
            })
        })),
        RowSource::Rows => out.extend((range.start_row..=range.end_row).map(|row| {
            Strip::Local(RangeAddress {
                start_row: row,
                end_row: row,
                ..*range
            })
        })),
    }
}

fn split_tokens(
    doc: &DocReader<'_>,
    tokens: &[ReferenceToken],
    orientation: RowSource,
) -> Result<Vec<Strip>> {
    let mut strips = Vec::new();
    for token in tokens {
        match token {
            ReferenceToken::Cell(_) | ReferenceToken::Area(_) => {
                if let Some(range) = token.local_range() {
                    split_range(&range, orientation, &mut strips);
                }
            }
            ReferenceToken::Name(name) => {
                let ranges = doc
                    .named_ranges(name)
                    .ok_or_else(|| ChartError::argument(format!("unknown name '{name}'")))?;
                for range in ranges {
                    split_range(range, orientation, &mut strips);
                }
            }
            ReferenceToken::External(ext) => match orientation {
                RowSource::Columns => strips.extend((ext.start_col..=ext.end_col).map(|col| {
                    Strip::External(ExternalArea {
                        start_col: col,
                        end_col: col,
                        ..ext.clone()
                    })
                })),
                RowSource::Rows => strips.extend((ext.start_row..=ext.end_row).map(|row| {
                    Strip::External(ExternalArea {
                        start_row: row,
                        end_row: row,
                        ..ext.clone()
                    })
                })),
            },
            ReferenceToken::Deleted => {
                return Err(ChartError::argument("source range contains a deleted reference"));
            }
        }
    }
    Ok(strips)
}

/// Series layout of a source before any sequence is created.
#[derive(Debug)]
struct SourcePlan {
    categories: Option<Strip>,
    values: Vec<Strip>,
}

fn apply_mapping(values: Vec<Strip>, mapping: &[usize]) -> Result<Vec<Strip>> {
    if mapping.is_empty() {
        return Ok(values);
    }
    let mut seen = vec![false; values.len()];
    if mapping.len() != values.len()
        || !mapping
            .iter()
            .all(|&i| i < seen.len() && !std::mem::replace(&mut seen[i], true))
    {
        return Err(ChartError::argument(format!(
            "sequence mapping {mapping:?} is not a permutation of {} series",
            values.len()
        )));
    }
    Ok(mapping.iter().map(|&i| values[i].clone()).collect())
}

fn single_local_range(seq: &DataSequence) -> Option<RangeAddress> {
    match seq.tokens().as_slice() {
        [token] => token.local_range(),
        _ => None,
    }
}

/// `label` is the single cell directly above (columns) or left of (rows) `values`.
fn label_adjacent(label: &RangeAddress, values: &RangeAddress, orientation: RowSource) -> bool {
    if label.cell_count() != 1
        || label.first_sheet != values.first_sheet
        || label.last_sheet != values.last_sheet
    {
        return false;
    }
    match orientation {
        RowSource::Columns => {
            values.width() == 1
                && label.start_col == values.start_col
                && label.start_row + 1 == values.start_row
        }
        RowSource::Rows => {
            values.height() == 1
                && label.start_row == values.start_row
                && label.start_col + 1 == values.start_col
        }
    }
}

fn try_merge(prev: &RangeAddress, next: &RangeAddress, orientation: RowSource) -> Option<RangeAddress> {
    if prev.first_sheet != next.first_sheet || prev.last_sheet != next.last_sheet {
        return None;
    }
    match orientation {
        RowSource::Columns
            if prev.start_row == next.start_row
                && prev.end_row == next.end_row
                && prev.end_col + 1 == next.start_col =>
        {
            Some(RangeAddress {
                end_col: next.end_col,
                ..*prev
            })
        }
        RowSource::Rows
            if prev.start_col == next.start_col
                && prev.end_col == next.end_col
                && prev.end_row + 1 == next.start_row =>
        {
            Some(RangeAddress {
                end_row: next.end_row,
                ..*prev
            })
        }
        _ => None,
    }
}

/// Creates sequences and sources bound to one document.
#[derive(Debug, Clone)]
pub struct DataProvider {
    doc: WeakDocument,
    config: ProviderConfig,
}

impl DataProvider {
    pub fn new(doc: &Document) -> Self {
        Self::with_config(doc, ProviderConfig::default())
    }

    pub fn with_config(doc: &Document, config: ProviderConfig) -> Self {
        Self {
            doc: doc.downgrade(),
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Default used by [`DataProvider::create_source`] when the arguments do not say.
    pub fn include_hidden_cells(&self) -> bool {
        self.config.include_hidden_cells
    }

    pub fn set_include_hidden_cells(&mut self, include: bool) {
        self.config.include_hidden_cells = include;
    }

    fn document(&self) -> Result<Document> {
        self.doc.upgrade().ok_or(ChartError::DocumentDisposed)
    }

    fn resolve(&self, doc: &Document, repr: &str, files: FileMode) -> Result<Vec<ReferenceToken>> {
        let specs = parse_api_list(repr, self.config.list_separator)?;
        resolve_specs(&doc.read(), &specs, files)
    }

    /* ─────────────────────────── sequences ─────────────────────────── */

    pub fn create_sequence_by_range(&self, repr: &str, include_hidden: bool) -> Result<DataSequence> {
        self.create_sequence_by_range_with_role(Role::default(), repr, include_hidden)
    }

    pub fn create_sequence_by_range_with_role(
        &self,
        role: Role,
        repr: &str,
        include_hidden: bool,
    ) -> Result<DataSequence> {
        let doc = self.document()?;
        let tokens = self.resolve(&doc, repr, FileMode::Register)?;
        DataSequence::new(&doc, tokens, role, include_hidden, self.config.clone())
    }

    pub fn create_sequence_by_range_possible(&self, repr: &str) -> bool {
        self.document()
            .and_then(|doc| self.resolve(&doc, repr, FileMode::Probe))
            .is_ok()
    }

    pub fn create_sequence_by_tokens(
        &self,
        tokens: Vec<ReferenceToken>,
        include_hidden: bool,
    ) -> Result<DataSequence> {
        let doc = self.document()?;
        DataSequence::new(&doc, tokens, Role::default(), include_hidden, self.config.clone())
    }

    pub fn create_sequence_by_tokens_possible(&self, tokens: &[ReferenceToken]) -> bool {
        self.document()
            .and_then(|doc| validate_tokens(&doc.read(), tokens))
            .is_ok()
    }

    /// Literal sequence from `{1;2;"text"}`. It holds no references and never changes.
    pub fn create_sequence_by_value_array(&self, role: &str, repr: &str) -> Result<DataSequence> {
        let values = parse_value_array(repr)?;
        Ok(DataSequence::from_values(Role::parse(role), values))
    }

    /* ─────────────────────────── sources ─────────────────────────── */

    fn plan_source(&self, doc: &Document, args: &SourceArguments, files: FileMode) -> Result<SourcePlan> {
        let tokens = self.resolve(doc, &args.cell_range_representation, files)?;
        let mut strips = split_tokens(&doc.read(), &tokens, args.row_source)?;
        if strips.is_empty() {
            return Err(ChartError::argument("source range resolves to no series"));
        }
        let categories = if args.has_categories {
            Some(strips.remove(0))
        } else {
            None
        };
        let values = apply_mapping(strips, &args.sequence_mapping)?;
        Ok(SourcePlan { categories, values })
    }

    fn labeled(
        &self,
        doc: &Document,
        strip: &Strip,
        role: Role,
        args: &SourceArguments,
        include_hidden: bool,
    ) -> Result<LabeledDataSequence> {
        let make = |strip: &Strip, role: Role| -> Result<DataSequence> {
            let seq = DataSequence::new(
                doc,
                vec![strip.token()],
                role,
                include_hidden,
                self.config.clone(),
            )?;
            if args.time_based {
                seq.set_time_based(true)?;
            }
            Ok(seq)
        };

        if args.first_cell_as_label {
            let (head, rest) = strip.split_head(args.row_source);
            let label = make(&head, Role::Label)?;
            let values = rest.map(|r| make(&r, role)).transpose()?;
            Ok(LabeledDataSequence::new(Some(label), values))
        } else {
            Ok(LabeledDataSequence::values_only(make(strip, role)?))
        }
    }

    /// Split the argument range into series and build one labeled sequence per series.
    pub fn create_source(&self, args: &SourceArguments) -> Result<DataSource> {
        let doc = self.document()?;
        let plan = self.plan_source(&doc, args, FileMode::Register)?;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "create_source",
            sequences = plan.values.len() + usize::from(plan.categories.is_some())
        )
        .entered();

        let include_hidden = args
            .include_hidden_cells
            .unwrap_or(self.config.include_hidden_cells);
        let mut sequences = Vec::with_capacity(plan.values.len() + 1);
        if let Some(categories) = &plan.categories {
            sequences.push(self.labeled(&doc, categories, Role::Categories, args, include_hidden)?);
        }
        for strip in &plan.values {
            sequences.push(self.labeled(&doc, strip, Role::ValuesY, args, include_hidden)?);
        }
        Ok(DataSource::new(sequences))
    }

    pub fn create_source_possible(&self, args: &SourceArguments) -> bool {
        self.document()
            .and_then(|doc| self.plan_source(&doc, args, FileMode::Probe))
            .is_ok()
    }

    /// Best-effort reconstruction of the arguments that would recreate `source`.
    ///
    /// Sources made of single-range sequences are merged back into rectangles; anything
    /// else falls back to listing each sequence's own representation in order.
    pub fn detect_arguments(&self, source: &DataSource) -> Result<SourceArguments> {
        let doc = self.document()?;
        let mut args = SourceArguments {
            include_hidden_cells: Some(self.config.include_hidden_cells),
            ..SourceArguments::default()
        };
        let Some(first) = source.sequences().first() else {
            return Ok(args);
        };

        args.has_categories = first
            .values
            .as_ref()
            .is_some_and(|v| *v.role() == Role::Categories);
        if let Some(values) = source.iter().find_map(|l| l.values.as_ref()) {
            args.include_hidden_cells = Some(values.include_hidden_cells());
        }
        args.time_based = source
            .iter()
            .flat_map(|l| l.values.iter().chain(l.label.iter()))
            .any(DataSequence::is_time_based);

        let shapes: Option<Vec<(Option<RangeAddress>, Option<RangeAddress>)>> = source
            .iter()
            .map(|l| {
                let label = match &l.label {
                    Some(seq) => Some(single_local_range(seq)?),
                    None => None,
                };
                let values = match &l.values {
                    Some(seq) => Some(single_local_range(seq)?),
                    None => None,
                };
                Some((label, values))
            })
            .collect();

        let Some(shapes) = shapes else {
            let mut parts = Vec::new();
            for l in source {
                for seq in l.label.iter().chain(l.values.iter()) {
                    parts.push(seq.source_range_representation()?);
                }
            }
            let sep = self.config.list_separator.to_string();
            args.cell_range_representation = parts.join(sep.as_str());
            args.first_cell_as_label = source.iter().all(|l| l.label.is_some());
            return Ok(args);
        };

        let values: Vec<&RangeAddress> = shapes.iter().filter_map(|(_, v)| v.as_ref()).collect();
        args.row_source = if values.iter().all(|v| v.width() == 1) {
            RowSource::Columns
        } else if values.iter().all(|v| v.height() == 1) {
            RowSource::Rows
        } else {
            RowSource::Columns
        };
        let orientation = args.row_source;

        args.first_cell_as_label = shapes.iter().all(|(label, values)| match (label, values) {
            (Some(l), Some(v)) => label_adjacent(l, v, orientation),
            (Some(l), None) => l.cell_count() == 1,
            (None, _) => false,
        });

        let mut merged: Vec<RangeAddress> = Vec::with_capacity(shapes.len());
        for (label, values) in &shapes {
            let whole = match (label, values) {
                (Some(l), Some(v)) if args.first_cell_as_label => RangeAddress {
                    start_row: l.start_row,
                    start_col: l.start_col,
                    ..*v
                },
                (_, Some(v)) => *v,
                (Some(l), None) => *l,
                (None, None) => continue,
            };
            let joined = merged
                .last()
                .and_then(|prev| try_merge(prev, &whole, orientation));
            match (joined, merged.last_mut()) {
                (Some(joined), Some(prev)) => *prev = joined,
                _ => merged.push(whole),
            }
        }

        let tokens: Vec<ReferenceToken> = merged
            .into_iter()
            .map(|r| {
                if r.cell_count() == 1 {
                    ReferenceToken::Cell(CellAddress {
                        sheet: r.first_sheet,
                        row: r.start_row,
                        col: r.start_col,
                    })
                } else {
                    ReferenceToken::Area(r)
                }
            })
            .collect();
        let specs = token_specs(&doc.read(), &tokens);
        args.cell_range_representation = format_api_list(&specs, self.config.list_separator);
        Ok(args)
    }

    /* ─────────────────────────── conversion ─────────────────────────── */

    /// Canonical API form of `repr`: sheet-qualified, absolute, with document sheet names.
    pub fn canonical_representation(&self, repr: &str) -> Result<String> {
        let doc = self.document()?;
        let tokens = self.resolve(&doc, repr, FileMode::Register)?;
        let specs = token_specs(&doc.read(), &tokens);
        Ok(format_api_list(&specs, self.config.list_separator))
    }

    pub fn convert_range_to_xml(&self, repr: &str) -> Result<String> {
        let doc = self.document()?;
        let tokens = self.resolve(&doc, repr, FileMode::Register)?;
        let specs = token_specs(&doc.read(), &tokens);
        Ok(format_xml_list(&specs)?)
    }

    pub fn convert_range_from_xml(&self, xml: &str) -> Result<String> {
        let doc = self.document()?;
        let specs = parse_xml_list(xml)?;
        let reader = doc.read();
        let tokens = resolve_specs(&reader, &specs, FileMode::Register)?;
        let specs = token_specs(&reader, &tokens);
        Ok(format_api_list(&specs, self.config.list_separator))
    }
}
