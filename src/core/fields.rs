//! Tolerant decoders for semi-structured cell values.
//!
//! The same logical field is often typed inconsistently across a sheet
//! (`[1,2,3]` in one row, `1,2,3` in the next). These parsers normalise the
//! accepted encodings and return a [`FieldError`] for everything else. They
//! never panic.

use crate::core::error::{FieldError, FieldResult};
use serde_json::{Map, Value as JsonValue};

/// Widest `a-b` phase range that will be expanded.
pub const MAX_PHASE_SPAN: u32 = 1000;

/// Element types a list cell can hold.
pub trait ListElement: Sized {
    /// Description used in error messages.
    const EXPECTED: &'static str;

    /// Decode one element of a JSON array.
    fn from_json(value: &JsonValue) -> Option<Self>;

    /// Decode one element of a comma-separated list.
    fn from_text(text: &str) -> Option<Self>;
}

/// Phase numbers: integers >= 1.
impl ListElement for u32 {
    const EXPECTED: &'static str = "a positive integer";

    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => {
                let as_int = n.as_u64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                        .map(|f| f as u64)
                })?;
                u32::try_from(as_int).ok().filter(|v| *v >= 1)
            }
            JsonValue::String(s) => Self::from_text(s),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse::<u32>().ok().filter(|v| *v >= 1)
    }
}

/// Skill names and IDs: non-empty strings.
impl ListElement for String {
    const EXPECTED: &'static str = "a non-empty string";

    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Self::from_text(s),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Parse a list cell.
///
/// Accepts a JSON array (`[1,2,3]`, `["a","b"]`), bracket notation that is
/// not valid JSON (`[a, b]`), or a bare comma-separated list (`1,2,3`).
/// The result is never empty.
pub fn parse_list<T: ListElement>(raw: &str) -> FieldResult<Vec<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Empty);
    }

    if raw.starts_with('[') && raw.ends_with(']') {
        if let Ok(json) = serde_json::from_str::<JsonValue>(raw) {
            let items = json.as_array().ok_or(FieldError::NotAList)?;
            return collect_json(items);
        }
        return collect_text(&raw[1..raw.len() - 1]);
    }

    collect_text(raw)
}

fn collect_json<T: ListElement>(items: &[JsonValue]) -> FieldResult<Vec<T>> {
    if items.is_empty() {
        return Err(FieldError::Empty);
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::from_json(item).ok_or_else(|| FieldError::InvalidElement {
                index,
                value: item.to_string(),
                expected: T::EXPECTED,
            })
        })
        .collect()
}

fn collect_text<T: ListElement>(body: &str) -> FieldResult<Vec<T>> {
    if body.trim().is_empty() {
        return Err(FieldError::Empty);
    }
    body.split(',')
        .enumerate()
        .map(|(index, part)| {
            T::from_text(part).ok_or_else(|| FieldError::InvalidElement {
                index,
                value: part.trim().to_string(),
                expected: T::EXPECTED,
            })
        })
        .collect()
}

/// Parse a `PreferredPhases`-style cell into ascending, distinct phases.
///
/// Accepts a single integer (`3`), an inclusive range (`1-3`, `1 - 3`), a JSON
/// array, bracket notation, or a comma list.
pub fn parse_phase_spec(raw: &str) -> FieldResult<Vec<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Empty);
    }

    let mut phases = if raw.starts_with('[') || raw.contains(',') {
        parse_list::<u32>(raw)?
    } else if let Some((start, end)) = raw.split_once('-') {
        parse_range(raw, start, end)?
    } else {
        let phase = u32::from_text(raw).ok_or_else(|| {
            if raw.parse::<f64>().is_ok() {
                FieldError::InvalidElement {
                    index: 0,
                    value: raw.to_string(),
                    expected: u32::EXPECTED,
                }
            } else {
                FieldError::NotNumeric(raw.to_string())
            }
        })?;
        vec![phase]
    };

    phases.sort_unstable();
    phases.dedup();
    Ok(phases)
}

fn parse_range(raw: &str, start: &str, end: &str) -> FieldResult<Vec<u32>> {
    let invalid = || FieldError::InvalidRange(raw.to_string());
    let start = u32::from_text(start).ok_or_else(invalid)?;
    let end = u32::from_text(end).ok_or_else(invalid)?;
    if start > end || end - start >= MAX_PHASE_SPAN {
        return Err(invalid());
    }
    Ok((start..=end).collect())
}

/// Check a JSON-object cell.
///
/// Returns `None` when the cell does not look like a JSON object (does not
/// start with `{`); such cells are free text and are not checked.
pub fn parse_json_object(raw: &str) -> Option<FieldResult<Map<String, JsonValue>>> {
    let raw = raw.trim();
    if !raw.starts_with('{') {
        return None;
    }
    Some(match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(_) => Err(FieldError::NotAnObject),
        Err(e) => Err(FieldError::InvalidJson(e.to_string())),
    })
}

/// Parse a finite decimal number.
pub fn parse_number(raw: &str) -> FieldResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Empty);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FieldError::NotNumeric(raw.to_string()))
}

/// Split an ID-list cell (`T1, T2` or `["T1","T2"]`), dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    parse_list::<String>(raw).unwrap_or_else(|_| {
        raw.trim_matches(|c| c == '[' || c == ']')
            .split(',')
            .filter_map(String::from_text)
            .collect()
    })
}
