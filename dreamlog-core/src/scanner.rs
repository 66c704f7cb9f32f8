//! Splits a document into callout blocks.
//!
//! A block starts at a `[!type]` marker of the requested type and runs until
//! the next marker of *any* type, or the end of the text. There is no notion
//! of nesting or closing tokens: a marker that shows up in the middle of a
//! block's prose (inside a code span, a quote, anything) ends that block.
//!
//! Both scanners are lazy and stop after `max_matches` blocks, recording that
//! the cap was hit so the caller can warn about it.
use crate::error::ScanError;
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::iter::Peekable;

/// Default cap on blocks produced by a single scan.
pub const DEFAULT_MAX_MATCHES: usize = 1000;

/// Any callout marker, with an optional Obsidian fold sign (`[!note]-`).
pub(crate) static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[!([A-Za-z0-9_-]+)\][+-]?").expect("valid marker regex"));

/// A blockquoted callout header at quote depth one: `> [!type] ...`.
static QUOTED_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*>[ \t]*\[!([A-Za-z0-9_-]+)\][+-]?").expect("valid header regex")
});

/// Provenance of a block found inside another callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedOrigin {
    /// Type of the enclosing callout (lowercase).
    pub outer_type: String,
    /// Synthetic identifier: `nested-<outer offset>-<index inside outer>`.
    pub id: String,
}

/// One captured block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutSpan<'a> {
    /// Marker type as written, lowercased.
    pub callout_type: String,
    /// Text from the marker up to the next marker or the end of the document.
    pub raw: Cow<'a, str>,
    /// Byte offset of the marker in the scanned document.
    pub offset: usize,
    pub nested: Option<NestedOrigin>,
}

/// Starts a lazy scan of `text` for `marker_type` blocks (ASCII case-insensitive).
pub fn scan<'a>(text: &'a str, marker_type: &str, max_matches: usize) -> CalloutScanner<'a> {
    CalloutScanner {
        text,
        marker_type: marker_type.to_string(),
        markers: MARKER_RE.captures_iter(text).peekable(),
        max_matches,
        yielded: 0,
        limit_reached: false,
        done: false,
    }
}

pub struct CalloutScanner<'a> {
    text: &'a str,
    marker_type: String,
    markers: Peekable<CaptureMatches<'static, 'a>>,
    max_matches: usize,
    yielded: usize,
    limit_reached: bool,
    done: bool,
}

impl CalloutScanner<'_> {
    /// `true` once the scan stopped because of the match cap.
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<'a> Iterator for CalloutScanner<'a> {
    type Item = Result<CalloutSpan<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(caps) = self.markers.next() else {
                self.done = true;
                return None;
            };
            let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !kind.as_str().eq_ignore_ascii_case(&self.marker_type) {
                continue;
            }
            if self.yielded >= self.max_matches {
                self.limit_reached = true;
                self.done = true;
                return None;
            }

            let start = whole.start();
            let end = self
                .markers
                .peek()
                .and_then(|next| next.get(0))
                .map(|next| next.start())
                .unwrap_or(self.text.len());

            return match self.text.get(start..end) {
                Some(raw) => {
                    self.yielded += 1;
                    Some(Ok(CalloutSpan {
                        callout_type: kind.as_str().to_ascii_lowercase(),
                        raw: Cow::Borrowed(raw),
                        offset: start,
                        nested: None,
                    }))
                }
                None => {
                    self.done = true;
                    Some(Err(ScanError::SpanOutOfBounds { start, end }))
                }
            };
        }
    }
}

/// Starts a lazy scan for `marker_type` blocks nested inside blockquoted
/// callouts of other types.
///
/// An outer block is a `> [!type]` line plus every following line that starts
/// with `>`. Its body is de-quoted one level and re-scanned with [`scan`].
/// Outer blocks of `marker_type` itself are skipped. Offsets of the produced
/// spans point into `text`, so they can be compared with [`scan`]'s.
pub fn scan_nested<'a>(text: &'a str, marker_type: &str, max_matches: usize) -> NestedScanner<'a> {
    NestedScanner {
        text,
        marker_type: marker_type.to_string(),
        pos: 0,
        pending: VecDeque::new(),
        max_matches,
        yielded: 0,
        limit_reached: false,
        done: false,
    }
}

pub struct NestedScanner<'a> {
    text: &'a str,
    marker_type: String,
    pos: usize,
    pending: VecDeque<Result<CalloutSpan<'a>, ScanError>>,
    max_matches: usize,
    yielded: usize,
    limit_reached: bool,
    done: bool,
}

impl NestedScanner<'_> {
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }
}

/// A de-quoted outer body plus the map back to document offsets.
struct Dequoted {
    text: String,
    /// `(offset in text, offset in the document)` for the start of every line.
    line_starts: Vec<(usize, usize)>,
}

impl Dequoted {
    fn to_document_offset(&self, inner: usize) -> usize {
        let idx = self
            .line_starts
            .partition_point(|&(line_start, _)| line_start <= inner)
            .saturating_sub(1);
        match self.line_starts.get(idx) {
            Some(&(line_start, doc_start)) => doc_start + (inner - line_start),
            None => inner,
        }
    }
}

/// Returns the line starting at `pos` (without its newline) and the offset of the next one.
fn line_at(text: &str, pos: usize) -> (&str, usize) {
    let rest = &text[pos..];
    match rest.find('\n') {
        Some(nl) => (&rest[..nl], pos + nl + 1),
        None => (rest, text.len()),
    }
}

fn strip_one_quote_level(line: &str) -> Option<(&str, usize)> {
    let indent = line.len() - line.trim_start().len();
    let after = line[indent..].strip_prefix('>')?;
    let skipped = if after.starts_with(' ') { 2 } else { 1 };
    Some((&line[indent + skipped..], indent + skipped))
}

impl<'a> NestedScanner<'a> {
    /// Finds the next outer block of another type and queues its inner matches.
    /// Returns `false` when the document is exhausted.
    fn fill(&mut self) -> bool {
        while self.pos < self.text.len() {
            let (line, next) = line_at(self.text, self.pos);
            let header_at = self.pos;
            self.pos = next;

            let Some(caps) = QUOTED_HEADER_RE.captures(line) else {
                continue;
            };
            let outer_type = caps
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();

            let mut body = Dequoted {
                text: String::new(),
                line_starts: Vec::new(),
            };
            while self.pos < self.text.len() {
                let (line, next) = line_at(self.text, self.pos);
                let Some((inner, skipped)) = strip_one_quote_level(line) else {
                    break;
                };
                if !body.text.is_empty() {
                    body.text.push('\n');
                }
                body.line_starts.push((body.text.len(), self.pos + skipped));
                body.text.push_str(inner);
                self.pos = next;
            }

            if outer_type.eq_ignore_ascii_case(&self.marker_type) || body.text.is_empty() {
                continue;
            }

            let budget = self.max_matches.saturating_sub(self.yielded);
            let mut inner_scan = scan(&body.text, &self.marker_type, budget);
            let mut inner_index = 0;
            for item in inner_scan.by_ref() {
                match item {
                    Ok(span) => {
                        self.pending.push_back(Ok(CalloutSpan {
                            callout_type: span.callout_type,
                            raw: Cow::Owned(span.raw.into_owned()),
                            offset: body.to_document_offset(span.offset),
                            nested: Some(NestedOrigin {
                                outer_type: outer_type.clone(),
                                id: format!("nested-{header_at}-{inner_index}"),
                            }),
                        }));
                        inner_index += 1;
                    }
                    Err(err) => {
                        self.pending.push_back(Err(err));
                        break;
                    }
                }
            }
            if inner_scan.limit_reached() {
                self.limit_reached = true;
            }
            if !self.pending.is_empty() {
                return true;
            }
            if self.limit_reached {
                return false;
            }
        }
        false
    }
}

impl<'a> Iterator for NestedScanner<'a> {
    type Item = Result<CalloutSpan<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.pending.is_empty() && (self.limit_reached || !self.fill()) {
            self.done = true;
            return None;
        }
        let item = self.pending.pop_front()?;
        match &item {
            Ok(_) => self.yielded += 1,
            Err(_) => {
                self.pending.clear();
                self.done = true;
            }
        }
        Some(item)
    }
}
