//! Range representation grammars.
//!
//! Two textual forms are supported:
//!
//! * the API form used by chart consumers: `Sheet1!$A$1:$B$3;'My Sheet'!$C$1`,
//!   with `Sheet1:Sheet3!A1` for sheet bands, `[Book.xlsx]Sheet1!A1` for external
//!   files and bare identifiers for defined names;
//! * the XML form used in saved documents: `Sheet1.A1:Sheet1.B3 'My Sheet'.C1`,
//!   with both ends sheet-qualified and `'Book.xlsx'#Sheet1.A1` for external files.
//!
//! Parsing yields unresolved [`RangeSpec`]s; sheet and file names are looked up later
//! against a document.

use smallvec::SmallVec;

use crate::coord::A1Cell;
use crate::error::RangeParseError;

/// A syntactic rectangle reference, before sheet names are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaSpec {
    pub file: Option<String>,
    pub sheet: Option<String>,
    /// Last sheet of a band (`Sheet1:Sheet3!...`); `None` for a single sheet.
    pub last_sheet: Option<String>,
    pub start: A1Cell,
    pub end: Option<A1Cell>,
}

impl AreaSpec {
    pub fn cell(sheet: Option<&str>, start: A1Cell) -> Self {
        Self {
            file: None,
            sheet: sheet.map(str::to_string),
            last_sheet: None,
            start,
            end: None,
        }
    }

    pub fn range(sheet: Option<&str>, start: A1Cell, end: A1Cell) -> Self {
        Self {
            end: Some(end),
            ..Self::cell(sheet, start)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    Area(AreaSpec),
    Name(String),
    Deleted,
}

pub type RangeSpecList = SmallVec<[RangeSpec; 2]>;

const DELETED: &str = "#REF!";

/* ─────────────────────────── API form ─────────────────────────── */

/// Parse a `sep`-separated list of API-form references.
pub fn parse_api_list(input: &str, sep: char) -> Result<RangeSpecList, RangeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RangeParseError::Empty);
    }
    split_outside_quotes(trimmed, |c| c == sep)?
        .into_iter()
        .map(|part| parse_api(part.trim()))
        .collect()
}

/// Parse one API-form reference.
pub fn parse_api(entry: &str) -> Result<RangeSpec, RangeParseError> {
    if entry.is_empty() {
        return Err(RangeParseError::Empty);
    }
    if entry == DELETED {
        return Ok(RangeSpec::Deleted);
    }

    let Some(bang) = find_outside_quotes(entry, '!') else {
        if let Ok((start, end)) = parse_cell_pair(entry) {
            return Ok(RangeSpec::Area(AreaSpec {
                file: None,
                sheet: None,
                last_sheet: None,
                start,
                end,
            }));
        }
        if is_valid_name(entry) {
            return Ok(RangeSpec::Name(entry.to_string()));
        }
        return Err(RangeParseError::InvalidName(entry.to_string()));
    };

    let (prefix, cells) = (&entry[..bang], &entry[bang + 1..]);
    let (file, sheet, last_sheet) = parse_api_prefix(prefix, entry)?;
    let (start, end) = parse_cell_pair(cells)?;
    Ok(RangeSpec::Area(AreaSpec {
        file,
        sheet: Some(sheet),
        last_sheet,
        start,
        end,
    }))
}

type Prefix = (Option<String>, String, Option<String>);

fn parse_api_prefix(prefix: &str, whole: &str) -> Result<Prefix, RangeParseError> {
    let inner = if prefix.starts_with('\'') {
        unquote(prefix).ok_or_else(|| RangeParseError::UnterminatedQuote(whole.to_string()))?
    } else {
        prefix.to_string()
    };

    let (file, rest) = if let Some(after) = inner.strip_prefix('[') {
        let close = after
            .find(']')
            .ok_or_else(|| RangeParseError::Unexpected(whole.to_string()))?;
        let file = &after[..close];
        if file.is_empty() {
            return Err(RangeParseError::Unexpected(whole.to_string()));
        }
        (Some(file.to_string()), after[close + 1..].to_string())
    } else {
        (None, inner)
    };

    let (sheet, last) = match rest.split_once(':') {
        Some((first, last)) => (first.to_string(), Some(last.to_string())),
        None => (rest, None),
    };
    if sheet.is_empty() || last.as_deref() == Some("") {
        return Err(RangeParseError::EmptySheetName(whole.to_string()));
    }
    if file.is_some() && last.is_some() {
        return Err(RangeParseError::ExternalBand(whole.to_string()));
    }
    let last = last.filter(|l| *l != sheet);
    Ok((file, sheet, last))
}

/// Format a list of specs in API form.
pub fn format_api_list(specs: &[RangeSpec], sep: char) -> String {
    let mut out = String::new();
    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(&format_api(spec));
    }
    out
}

/// Canonical API form: sheet-qualified, absolute anchors.
pub fn format_api(spec: &RangeSpec) -> String {
    match spec {
        RangeSpec::Deleted => DELETED.to_string(),
        RangeSpec::Name(name) => name.clone(),
        RangeSpec::Area(area) => {
            let mut out = String::new();
            if let Some(sheet) = &area.sheet {
                let mut prefix = String::new();
                let mut quote = needs_quotes(sheet);
                if let Some(file) = &area.file {
                    prefix.push('[');
                    prefix.push_str(file);
                    prefix.push(']');
                    quote |= !file
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
                }
                prefix.push_str(sheet);
                if let Some(last) = &area.last_sheet {
                    quote |= needs_quotes(last);
                    prefix.push(':');
                    prefix.push_str(last);
                }
                if quote {
                    out.push_str(&quote_name(&prefix));
                } else {
                    out.push_str(&prefix);
                }
                out.push('!');
            }
            out.push_str(&area.start.to_absolute_string());
            if let Some(end) = &area.end {
                out.push(':');
                out.push_str(&end.to_absolute_string());
            }
            out
        }
    }
}

/* ─────────────────────────── XML form ─────────────────────────── */

/// Parse a whitespace-separated list of XML-form references.
pub fn parse_xml_list(input: &str) -> Result<RangeSpecList, RangeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RangeParseError::Empty);
    }
    split_outside_quotes(trimmed, char::is_whitespace)?
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(parse_xml)
        .collect()
}

/// Parse one XML-form reference.
pub fn parse_xml(entry: &str) -> Result<RangeSpec, RangeParseError> {
    if entry == DELETED {
        return Ok(RangeSpec::Deleted);
    }
    let mut rest = entry;
    let mut file = None;
    if rest.starts_with('\'') {
        if let Some(hash) = find_outside_quotes(rest, '#') {
            let quoted = &rest[..hash];
            let name = unquote(quoted)
                .ok_or_else(|| RangeParseError::UnterminatedQuote(entry.to_string()))?;
            if name.is_empty() {
                return Err(RangeParseError::Unexpected(entry.to_string()));
            }
            file = Some(name);
            rest = &rest[hash + 1..];
        }
    }

    let (first, second) = match find_outside_quotes(rest, ':') {
        Some(colon) => (&rest[..colon], Some(&rest[colon + 1..])),
        None => (rest, None),
    };
    let (sheet, start) = parse_xml_endpoint(first, entry)?;
    let sheet = sheet.ok_or_else(|| RangeParseError::MissingSheet(entry.to_string()))?;
    let (last_sheet, end) = match second {
        Some(text) => {
            let (s, cell) = parse_xml_endpoint(text, entry)?;
            (s.filter(|s| *s != sheet), Some(cell))
        }
        None => (None, None),
    };
    if file.is_some() && last_sheet.is_some() {
        return Err(RangeParseError::ExternalBand(entry.to_string()));
    }
    let (start, end) = normalize_pair(start, end);
    Ok(RangeSpec::Area(AreaSpec {
        file,
        sheet: Some(sheet),
        last_sheet,
        start,
        end,
    }))
}

fn parse_xml_endpoint(
    text: &str,
    whole: &str,
) -> Result<(Option<String>, A1Cell), RangeParseError> {
    let dot = find_outside_quotes(text, '.')
        .ok_or_else(|| RangeParseError::MissingSheet(whole.to_string()))?;
    let raw_sheet = text[..dot].trim_start_matches('$');
    let sheet = if raw_sheet.is_empty() {
        None
    } else if raw_sheet.starts_with('\'') {
        Some(unquote(raw_sheet).ok_or_else(|| RangeParseError::UnterminatedQuote(whole.to_string()))?)
    } else {
        Some(raw_sheet.to_string())
    };
    if sheet.as_deref() == Some("") {
        return Err(RangeParseError::EmptySheetName(whole.to_string()));
    }
    let cell = A1Cell::parse(&text[dot + 1..])?;
    Ok((sheet, cell))
}

/// Format a list of specs in XML form. Defined names have no XML form.
pub fn format_xml_list(specs: &[RangeSpec]) -> Result<String, RangeParseError> {
    let parts = specs
        .iter()
        .map(format_xml)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

pub fn format_xml(spec: &RangeSpec) -> Result<String, RangeParseError> {
    match spec {
        RangeSpec::Deleted => Ok(DELETED.to_string()),
        RangeSpec::Name(name) => Err(RangeParseError::InvalidName(name.clone())),
        RangeSpec::Area(area) => {
            let sheet = area
                .sheet
                .as_deref()
                .ok_or_else(|| RangeParseError::MissingSheet(format_api(spec)))?;
            let mut out = String::new();
            if let Some(file) = &area.file {
                out.push_str(&quote_name(file));
                out.push('#');
            }
            push_xml_endpoint(&mut out, sheet, &area.start);
            if let Some(end) = &area.end {
                out.push(':');
                push_xml_endpoint(&mut out, area.last_sheet.as_deref().unwrap_or(sheet), end);
            }
            Ok(out)
        }
    }
}

fn push_xml_endpoint(out: &mut String, sheet: &str, cell: &A1Cell) {
    if needs_quotes(sheet) || sheet.contains('.') {
        out.push_str(&quote_name(sheet));
    } else {
        out.push_str(sheet);
    }
    out.push('.');
    out.push_str(&cell.to_plain_string());
}

/* ─────────────────────────── shared helpers ─────────────────────────── */

fn parse_cell_pair(text: &str) -> Result<(A1Cell, Option<A1Cell>), RangeParseError> {
    let (start, end) = match text.split_once(':') {
        Some((a, b)) => (A1Cell::parse(a)?, Some(A1Cell::parse(b)?)),
        None => (A1Cell::parse(text)?, None),
    };
    Ok(normalize_pair(start, end))
}

fn normalize_pair(start: A1Cell, end: Option<A1Cell>) -> (A1Cell, Option<A1Cell>) {
    match end {
        Some(end) => {
            let tl = A1Cell {
                row: start.row.min(end.row),
                col: start.col.min(end.col),
                ..start
            };
            let br = A1Cell {
                row: start.row.max(end.row),
                col: start.col.max(end.col),
                ..end
            };
            (tl, Some(br))
        }
        None => (start, None),
    }
}

/// Sheet names that cannot be written bare.
pub fn needs_quotes(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    first.is_ascii_digit()
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
        || A1Cell::parse(name).is_ok()
}

fn quote_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Strip surrounding quotes and undouble embedded ones. `None` if not properly quoted.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next_if_eq(&'\'').is_none() {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

fn is_valid_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '\\' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.'))
}

/// Byte offset of the first `needle` outside single quotes and `[...]` brackets.
fn find_outside_quotes(text: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth = depth.saturating_sub(1),
            _ if c == needle && !in_quotes && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_outside_quotes(
    text: &str,
    is_sep: impl Fn(char) -> bool,
) -> Result<Vec<&str>, RangeParseError> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth = depth.saturating_sub(1),
            _ if is_sep(c) && !in_quotes && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(RangeParseError::UnterminatedQuote(text.to_string()));
    }
    parts.push(&text[start..]);
    Ok(parts)
}
