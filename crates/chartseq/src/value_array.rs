//! Literal value arrays such as `{1;2;"three"}`.

use chartseq_common::CellValue;

use crate::error::{ChartError, Result};

/// Parse a literal array. Braces are optional; entries are separated by `;` or `,`.
///
/// Numbers become numeric values, double-quoted strings (with `""` as an escaped quote)
/// become text, `TRUE`/`FALSE` become booleans and empty entries stay empty. Any other
/// bare word is kept as text.
pub fn parse_value_array(input: &str) -> Result<Vec<CellValue>> {
    let trimmed = input.trim();
    let body = match trimmed.strip_prefix('{') {
        Some(rest) => rest
            .strip_suffix('}')
            .ok_or_else(|| ChartError::argument(format!("unterminated value array '{input}'")))?,
        None => trimmed,
    };
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let value = if chars.next_if_eq(&'"').is_some() {
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.next_if_eq(&'"').is_some() => text.push('"'),
                    Some('"') => break,
                    Some(c) => text.push(c),
                    None => {
                        return Err(ChartError::argument(format!(
                            "unterminated string in value array '{input}'"
                        )));
                    }
                }
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            CellValue::Text(text)
        } else {
            let mut raw = String::new();
            while let Some(c) = chars.next_if(|c| !matches!(c, ';' | ',')) {
                raw.push(c);
            }
            literal(raw.trim())
        };
        values.push(value);
        match chars.next() {
            None => break,
            Some(';' | ',') => {}
            Some(c) => {
                return Err(ChartError::argument(format!(
                    "unexpected '{c}' in value array '{input}'"
                )));
            }
        }
    }
    Ok(values)
}

fn literal(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Empty;
    }
    if raw.eq_ignore_ascii_case("TRUE") {
        return CellValue::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("FALSE") {
        return CellValue::Boolean(false);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

/// Canonical literal form of `values`, always braced and `;`-separated.
pub fn format_value_array(values: &[CellValue]) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|v| match v {
            CellValue::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
            other => other.display_string(),
        })
        .collect();
    format!("{{{}}}", parts.join(";"))
}
