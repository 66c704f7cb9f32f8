//! Turns one scanned block into a [`Record`].
use super::content::{clean_with_title, unquote};
use super::record::{CalloutMetadata, Record, Source, count_words};
use super::title::{PLACEHOLDER_TITLE, find_title};
use crate::dates::{fallback_date, resolve_date};
use crate::error::Defect;
use crate::metrics::{Metrics, extract_metrics};
use crate::scanner::{CalloutSpan, MARKER_RE};
use chrono::NaiveDate;

/// How many UTF-16 units of a block feed its id.
const ID_HASH_UNITS: usize = 1000;
const ID_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions<'a> {
    /// Path reported in the record's source.
    pub source_path: &'a str,
    /// Date used when the block has none. Defaults to today.
    pub reference_date: Option<NaiveDate>,
}

/// Builds the record for `span`.
///
/// Fails when the block is empty, does not start with a callout marker, or
/// has an odd number of code-fence lines. The date falls back to
/// [`BuildOptions::reference_date`] (or today), and metrics are read from the
/// block as written, before cleaning removes their section.
pub fn build_entry(span: &CalloutSpan, options: &BuildOptions) -> Result<Record, Defect> {
    if span.raw.trim().is_empty() {
        return Err(Defect::EmptySpan);
    }
    let text = unquote(&span.raw);
    let starts_with_marker = MARKER_RE
        .find(text.trim_start())
        .is_some_and(|m| m.start() == 0);
    if !starts_with_marker {
        return Err(Defect::MissingMarker);
    }
    let fences = text
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            line.starts_with("```") || line.starts_with("~~~")
        })
        .count();
    if fences % 2 != 0 {
        return Err(Defect::UnbalancedFence { fences });
    }

    let resolved = resolve_date(&text);
    let date = resolved.unwrap_or_else(|| fallback_date(options.reference_date));
    let title = find_title(&text);
    let content = clean_with_title(&text, &title);
    let word_count = count_words(&content);
    let metrics = extract_metrics(&text);

    let id = match &span.nested {
        Some(origin) => origin.id.clone(),
        None => callout_id(&span.raw),
    };

    Ok(Record {
        date,
        title: title.title,
        content,
        source: Source::Located {
            file: options.source_path.to_string(),
            id: Some(id.clone()),
        },
        word_count,
        metrics,
        callout_metadata: CalloutMetadata {
            callout_type: span.callout_type.clone(),
            id: Some(id),
            nested_in_type: span.nested.as_ref().map(|n| n.outer_type.clone()),
            date_fallback: resolved.is_none(),
            ..Default::default()
        },
    })
}

/// The record kept for a block that could not be built: the failure message
/// followed by the block's original text, flagged as a recovered parse.
pub fn fallback_record(
    raw: &str,
    callout_type: &str,
    options: &BuildOptions,
    message: &str,
) -> Record {
    let resolved = resolve_date(raw);
    let content = format!("Failed to parse {callout_type} entry: {message}\n\n{}", raw.trim())
        .trim()
        .to_string();
    Record {
        date: resolved.unwrap_or_else(|| fallback_date(options.reference_date)),
        title: format!("{PLACEHOLDER_TITLE} ({callout_type}, unparsed)"),
        word_count: count_words(&content),
        content,
        source: Source::Path(options.source_path.to_string()),
        metrics: Metrics::new(),
        callout_metadata: CalloutMetadata {
            callout_type: callout_type.to_string(),
            id: Some(callout_id(raw)),
            error: Some(message.to_string()),
            is_valid: Some(false),
            date_fallback: resolved.is_none(),
            parse_failure: true,
            recovery_attempted: true,
            ..Default::default()
        },
    }
}

/// Content-derived id of a block.
///
/// A 31-multiplier rolling hash over the first 1000 UTF-16 units, wrapped to
/// a signed 32-bit value; the id is the last 8 digits of its absolute value.
pub fn callout_id(raw: &str) -> String {
    let hash = raw
        .encode_utf16()
        .take(ID_HASH_UNITS)
        .fold(0_i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        });
    let digits = i64::from(hash).abs().to_string();
    digits[digits.len().saturating_sub(ID_DIGITS)..].to_string()
}
