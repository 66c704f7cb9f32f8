//! Structural checks on a built record.
//!
//! Defects are plain strings. They end up as warnings on the record; a record
//! is never dropped for failing validation.
use crate::entry::{MAX_TITLE_CHARS, PLACEHOLDER_TITLE, Record, count_words};
use chrono::Datelike;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;
const MIN_CONTENT_CHARS: usize = 10;
const MIN_WORD_DRIFT: usize = 10;

/// Lists what is wrong with `record`; empty when nothing is.
pub fn validate_record(record: &Record) -> Vec<String> {
    let mut defects = Vec::new();

    let year = record.date.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        defects.push(format!(
            "Date {} is outside {MIN_YEAR}-{MAX_YEAR}",
            record.date_string()
        ));
    }

    let title = record.title.trim();
    if title.is_empty() || title == PLACEHOLDER_TITLE {
        defects.push("Missing title".to_string());
    } else if title.chars().count() > MAX_TITLE_CHARS {
        defects.push(format!("Title is longer than {MAX_TITLE_CHARS} characters"));
    }

    let content = record.content.trim();
    if content.is_empty() {
        defects.push("Missing content".to_string());
    } else if content.chars().count() < MIN_CONTENT_CHARS {
        defects.push(format!("Content is shorter than {MIN_CONTENT_CHARS} characters"));
    }

    if record.metrics.is_empty() {
        defects.push("No metrics found".to_string());
    }

    let recount = count_words(&record.content);
    let tolerance = MIN_WORD_DRIFT.max(recount / 5);
    if record.word_count == 0 {
        defects.push("Word count is zero".to_string());
    } else if record.word_count.abs_diff(recount) > tolerance {
        defects.push(format!(
            "Word count {} differs from content ({recount} words) by more than {tolerance}",
            record.word_count
        ));
    }

    if record.source.file().trim().is_empty() {
        defects.push("Missing source".to_string());
    }

    defects
}
