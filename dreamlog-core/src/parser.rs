//! The top-level `parse` and the supervisor that keeps it from failing.
//!
//! Every block is built independently. A block that fails to build becomes a
//! fallback record (lenient) or the returned error (strict). A failure of the
//! scan itself stops the document: strict returns it, lenient either keeps
//! what was already extracted or, in transactional mode, throws it all away.
use crate::diagnostics::{DiagnosticsSink, Level, NoopSink};
use crate::entry::{BuildOptions, Record, build_entry, fallback_record};
use crate::error::{ParseError, ScanError, panic_message};
use crate::options::ParseOptions;
use crate::sanitize::{sanitize_with_limit, truncate_chars};
use crate::scanner::{CalloutSpan, scan, scan_nested};
use crate::validate::validate_record;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

/// Whole-document outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Records in order of first appearance in the text.
    pub entries: Vec<Record>,
    pub metadata: ParseMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMetadata {
    pub total_entries: usize,
    /// Blocks that needed a fallback record, plus a failed scan.
    pub error_count: usize,
    /// Document warnings plus every validation defect on every record.
    pub warning_count: usize,
    pub total_word_count: usize,
    pub average_word_count: f64,
    /// Marker type that was searched for.
    pub callout_type: String,
    /// `true` iff `error_count == 0`.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Extracts every `options.marker_type` callout from `text`, discarding diagnostics.
pub fn parse(text: &str, options: &ParseOptions) -> Result<ParseResult, ParseError> {
    parse_with_sink(text, options, &NoopSink)
}

/// Like [`parse`], reporting progress and recoveries to `sink`.
///
/// Invalid options are rejected in every mode. Otherwise, with `strict` off
/// this always returns `Ok`; callers learn about recovered blocks through
/// [`ParseMetadata::success`] and `error_count`.
pub fn parse_with_sink(
    text: &str,
    options: &ParseOptions,
    sink: &dyn DiagnosticsSink,
) -> Result<ParseResult, ParseError> {
    options.check()?;
    let mut supervisor = Supervisor::new(options, sink);

    let text = supervisor.prepare(text);
    let mut top_level = scan(&text, &options.marker_type, options.max_matches);
    supervisor.run_pass(Guarded::new(&mut top_level))?;
    if top_level.limit_reached() {
        supervisor.warn_limit("top-level");
    }

    if options.include_nested && !supervisor.aborted {
        let mut nested = scan_nested(&text, &options.marker_type, options.max_matches);
        supervisor.run_pass(Guarded::new(&mut nested))?;
        if nested.limit_reached() {
            supervisor.warn_limit("nested");
        }
    }

    Ok(supervisor.finish())
}

/// Turns a panic inside the wrapped scanner into a [`ScanError::Interrupted`]
/// and ends the iteration there.
struct Guarded<I> {
    inner: I,
    done: bool,
}

impl<I> Guarded<I> {
    fn new(inner: I) -> Self {
        Self { inner, done: false }
    }
}

impl<'a, I> Iterator for Guarded<I>
where
    I: Iterator<Item = Result<CalloutSpan<'a>, ScanError>>,
{
    type Item = Result<CalloutSpan<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.next())) {
            Ok(item) => item,
            Err(payload) => {
                self.done = true;
                Some(Err(ScanError::Interrupted(panic_message(payload.as_ref()))))
            }
        }
    }
}

/// A record at its marker offset, with the error that made it a fallback.
struct Placed {
    offset: usize,
    record: Record,
    error: Option<String>,
}

/// State of one document parse.
struct Supervisor<'o> {
    options: &'o ParseOptions,
    sink: &'o dyn DiagnosticsSink,
    /// Kept sorted by offset.
    entries: Vec<Placed>,
    scan_errors: Vec<String>,
    warnings: Vec<String>,
    /// Set once a scan failed; no further pass runs.
    aborted: bool,
}

impl<'o> Supervisor<'o> {
    fn new(options: &'o ParseOptions, sink: &'o dyn DiagnosticsSink) -> Self {
        Self {
            options,
            sink,
            entries: Vec::new(),
            scan_errors: Vec::new(),
            warnings: Vec::new(),
            aborted: false,
        }
    }

    fn build_options(&self) -> BuildOptions<'o> {
        BuildOptions {
            source_path: self.options.source_or_unknown(),
            reference_date: self.options.reference_date,
        }
    }

    /// Truncates to `max_content_length` and, when enabled, sanitizes.
    fn prepare<'t>(&mut self, text: &'t str) -> Cow<'t, str> {
        let max = self.options.max_content_length;
        let (prepared, truncated, original_len) = if self.options.sanitize {
            let sanitized = sanitize_with_limit(text, Some(max));
            (
                Cow::Owned(sanitized.text),
                sanitized.truncated,
                sanitized.original_len,
            )
        } else {
            let (kept, truncated) = truncate_chars(text, max);
            let original_len = if truncated { text.chars().count() } else { 0 };
            (Cow::Borrowed(kept), truncated, original_len)
        };

        if truncated {
            let message =
                format!("Content truncated from {original_len} to {max} characters");
            self.sink.log(
                Level::Warn,
                "sanitize",
                &message,
                Some(&json!({ "originalLength": original_len, "maxContentLength": max })),
            );
            self.warnings.push(message);
        }
        prepared
    }

    fn warn_limit(&mut self, pass: &str) {
        let message = format!(
            "Stopped the {pass} scan after {} callouts",
            self.options.max_matches
        );
        self.sink.warn("scanner", &message);
        self.warnings.push(message);
    }

    /// Builds every span `spans` yields, stopping at the first scan error.
    fn run_pass<'a, I>(&mut self, spans: I) -> Result<(), ParseError>
    where
        I: Iterator<Item = Result<CalloutSpan<'a>, ScanError>>,
    {
        for (index, item) in spans.enumerate() {
            match item {
                Ok(span) => {
                    self.sink.debug(
                        "scanner",
                        &format!("callout #{index} at offset {}", span.offset),
                    );
                    let placed = self.build(index, &span)?;
                    self.insert(placed);
                }
                Err(err) => return self.scan_failed(err),
            }
        }
        Ok(())
    }

    fn build(&self, index: usize, span: &CalloutSpan) -> Result<Placed, ParseError> {
        let build_options = self.build_options();
        let built = panic::catch_unwind(AssertUnwindSafe(|| build_entry(span, &build_options)));
        let failure = match built {
            Ok(Ok(mut record)) => {
                if self.options.validate {
                    self.attach_validation(&mut record);
                }
                return Ok(Placed {
                    offset: span.offset,
                    record,
                    error: None,
                });
            }
            Ok(Err(defect)) => ParseError::Block {
                index,
                offset: span.offset,
                defect,
            },
            Err(payload) => ParseError::Panicked {
                index,
                offset: span.offset,
                message: panic_message(payload.as_ref()),
            },
        };

        if self.options.strict {
            self.sink.error("builder", &failure.to_string());
            return Err(failure);
        }
        let cause = match &failure {
            ParseError::Block { defect, .. } => defect.to_string(),
            ParseError::Panicked { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.sink.log(
            Level::Error,
            "builder",
            &failure.to_string(),
            Some(&json!({ "index": index, "offset": span.offset, "type": span.callout_type })),
        );
        Ok(Placed {
            offset: span.offset,
            record: fallback_record(&span.raw, &span.callout_type, &build_options, &cause),
            error: Some(failure.to_string()),
        })
    }

    fn attach_validation(&self, record: &mut Record) {
        let defects = validate_record(record);
        if !defects.is_empty() {
            self.sink.log(
                Level::Debug,
                "validate",
                &format!("`{}` has {} defect(s)", record.title, defects.len()),
                Some(&json!(defects)),
            );
        }
        record.callout_metadata.is_valid = Some(defects.is_empty());
        record.callout_metadata.warnings = defects;
    }

    /// Places a record by offset. A record already at that offset is replaced,
    /// together with its error.
    fn insert(&mut self, placed: Placed) {
        match self.entries.binary_search_by_key(&placed.offset, |p| p.offset) {
            Ok(pos) => self.entries[pos] = placed,
            Err(pos) => self.entries.insert(pos, placed),
        }
    }

    fn scan_failed(&mut self, err: ScanError) -> Result<(), ParseError> {
        self.aborted = true;
        if self.options.strict {
            self.sink.error("scanner", &err.to_string());
            return Err(ParseError::Scan(err));
        }
        let message = ParseError::Scan(err).to_string();
        if self.options.transactional {
            self.sink.error(
                "parser",
                &format!("{message}; discarding {} entries", self.entries.len()),
            );
            self.entries.clear();
        } else {
            self.sink.error(
                "parser",
                &format!("{message}; keeping {} entries", self.entries.len()),
            );
        }
        self.scan_errors.push(message);
        Ok(())
    }

    /// Block errors in offset order, then the scan error.
    fn finish(self) -> ParseResult {
        let mut errors = Vec::new();
        let mut entries = Vec::with_capacity(self.entries.len());
        for placed in self.entries {
            errors.extend(placed.error);
            entries.push(placed.record);
        }
        errors.extend(self.scan_errors);
        let record_warnings: usize = entries
            .iter()
            .map(|r| r.callout_metadata.warnings.len())
            .sum();
        let total_word_count: usize = entries.iter().map(|r| r.word_count).sum();
        let average_word_count = if entries.is_empty() {
            0.0
        } else {
            total_word_count as f64 / entries.len() as f64
        };
        let error_count = errors.len();
        let metadata = ParseMetadata {
            total_entries: entries.len(),
            error_count,
            warning_count: self.warnings.len() + record_warnings,
            total_word_count,
            average_word_count,
            callout_type: self.options.marker_type.to_ascii_lowercase(),
            success: error_count == 0,
            errors,
            warnings: self.warnings,
        };
        self.sink.log(
            Level::Info,
            "parser",
            &format!(
                "parsed {} `{}` entries ({} errors)",
                metadata.total_entries, metadata.callout_type, metadata.error_count
            ),
            Some(&json!({
                "totalEntries": metadata.total_entries,
                "errorCount": metadata.error_count,
                "warningCount": metadata.warning_count,
            })),
        );
        ParseResult { entries, metadata }
    }
}
