use serde_json::Value;
use thiserror::Error;

use crate::record::RawRecord;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid JSON: {0}")]
    Syntax(String),
    #[error("Top-level JSON value is not an array")]
    NotArray,
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Turns raw uploaded text into loosely-typed announcement records.
///
/// Parsing is strict-first with a single best-effort repair retry for the
/// two malformations that show up in real dumps: back-to-back bare objects
/// with no enclosing array, and arrays cut off mid-element. The repair is
/// heuristic and not assumed lossless.
pub struct Ingestor;

impl Ingestor {
    /// Parses `content` into raw records, or fails with a terminal syntax
    /// error before any record exists. Array elements that are not
    /// object-shaped are silently dropped.
    pub fn ingest(content: &str) -> IngestResult<Vec<RawRecord>> {
        let items = Self::parse_array(content)?;

        let mut records = Vec::with_capacity(items.len());
        let mut dropped = 0usize;
        for item in &items {
            match RawRecord::from_value(item) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped non-object array elements");
        }

        Ok(records)
    }

    fn parse_array(content: &str) -> IngestResult<Vec<Value>> {
        match Self::parse_strict(content) {
            Ok(items) => Ok(items),
            Err(first) => {
                let Some(repaired) = repair(content) else {
                    return Err(first);
                };
                // One retry only; the original error is what callers see.
                Self::parse_strict(&repaired).map_err(|_| first)
            }
        }
    }

    fn parse_strict(content: &str) -> IngestResult<Vec<Value>> {
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => Err(IngestError::NotArray),
            Err(e) => Err(IngestError::Syntax(e.to_string())),
        }
    }
}

fn repair(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        Some(join_bare_objects(trimmed))
    } else if trimmed.starts_with('[') {
        repair_array(trimmed)
    } else {
        None
    }
}

/// Joins back-to-back objects (`}{` boundaries, whitespace allowed) with
/// commas and wraps the whole thing in brackets. Boundaries inside string
/// literals can be misjoined; that is accepted for a repair pass.
fn join_bare_objects(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len() + 2);
    out.push('[');

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c == '}' {
            let mut next = i + 1;
            while next < chars.len() && chars[next].is_whitespace() {
                next += 1;
            }
            if next < chars.len() && chars[next] == '{' {
                out.push(',');
            }
        }
    }

    out.push(']');
    out
}

/// Truncates a damaged array to its last well-formed object or array
/// boundary, discarding any trailing incomplete fragment, and strips a
/// dangling comma before re-closing the bracket.
fn repair_array(content: &str) -> Option<String> {
    if let Some(body) = content.strip_suffix(']') {
        let body = body.trim_end();
        let body = body.strip_suffix(',').unwrap_or(body);
        return Some(format!("{body}]"));
    }

    let boundary = content.rfind(['}', ']'])?;
    let kept = &content[..=boundary];
    Some(format!("{kept}]"))
}
