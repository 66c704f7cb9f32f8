//! `key: value` metrics embedded in a block.
//!
//! Two passes over the same text, merged so that the first pass wins:
//!
//! 1. the *metrics section*: the lines under a `Metrics` label, or failing
//!    that, the first paragraph made mostly of `key: value` lines;
//! 2. every line of the block, catching pairs written inline with prose.
use crate::scanner::MARKER_RE;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Metric name → value. Names are case-sensitive.
pub type Metrics = BTreeMap<String, MetricValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

/// Names never treated as metrics: they belong to the entry itself.
const RESERVED_NAMES: &[&str] = &["title", "date", "metrics"];
const MAX_NAME_CHARS: usize = 40;
/// Longest name accepted inside a metrics section.
const SECTION_MAX_WORDS: usize = 5;
/// Longest name accepted inline, where prose like `Then I said: hi` is common.
const INLINE_MAX_WORDS: usize = 3;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").expect("valid number regex"));

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:#{1,6}\s*)?[*_]*metrics[*_]*\s*(?::[*_]*\s*(.*))?$")
        .expect("valid label regex")
});

/// Extracts every metric from `span`. Never fails; a block without metrics
/// gives an empty map.
pub fn extract_metrics(span: &str) -> Metrics {
    let lines: Vec<&str> = span.lines().collect();
    let mut metrics = Metrics::new();

    if let Some(section) = find_metrics_section(&lines) {
        for line in &lines[section] {
            let (pairs, _) = line_pairs(pair_text(line), SECTION_MAX_WORDS);
            for (name, value) in pairs {
                metrics.entry(name).or_insert(value);
            }
        }
    }

    for line in &lines {
        let (pairs, _) = line_pairs(pair_text(line), INLINE_MAX_WORDS);
        for (name, value) in pairs {
            metrics.entry(name).or_insert(value);
        }
    }

    metrics
}

/// `"4"`, `"-2.5"` → numbers; anything else → the trimmed text.
pub fn parse_metric_value(raw: &str) -> MetricValue {
    let value = raw.trim();
    if NUMBER_RE.is_match(value) {
        if let Ok(n) = value.parse::<f64>() {
            return MetricValue::Number(n);
        }
    }
    MetricValue::Text(value.to_string())
}

/// Trims emphasis markers and collapses whitespace, keeping case.
/// Returns `None` for anything that does not look like a name.
pub fn normalize_metric_name(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_matches(|c| c == '*' || c == '_' || c == '`')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let first = name.chars().next()?;
    let well_formed = first.is_alphabetic()
        && name.chars().count() <= MAX_NAME_CHARS
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || " _-/()'".contains(c));
    well_formed.then_some(name)
}

/// Strips quote markers and list bullets from the start of a line.
pub(crate) fn strip_decoration(line: &str) -> &str {
    let mut s = line.trim_start();
    while let Some(rest) = s.strip_prefix('>') {
        s = rest.trim_start();
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            s = rest.trim_start();
            break;
        }
    }
    s.trim_end()
}

/// The part of a line that may hold pairs: the remainder of a `Metrics:`
/// label, or the undecorated line.
fn pair_text(line: &str) -> &str {
    let text = strip_decoration(line);
    match LABEL_RE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => text,
    }
}

fn is_label(line: &str) -> bool {
    LABEL_RE.is_match(strip_decoration(line))
}

/// A line consisting only of pairs, at least one of them numeric.
pub(crate) fn is_metrics_line(line: &str) -> bool {
    let (pairs, all_pairs) = line_pairs(pair_text(line), INLINE_MAX_WORDS);
    all_pairs && pairs.iter().any(|(_, v)| v.as_number().is_some())
}

/// Line range of the metrics section in `lines`, if any.
///
/// A `Metrics` label (`Metrics:`, `## Metrics`, `**Metrics**`) opens a
/// section that runs to the next blank line, heading or callout marker. Blank
/// lines directly after a bare label are skipped. Without a label, the first
/// paragraph where more than half the lines are metrics lines is used.
pub(crate) fn find_metrics_section(lines: &[&str]) -> Option<Range<usize>> {
    if let Some(label) = lines.iter().position(|l| is_label(l)) {
        let mut end = label + 1;
        if pair_text(lines[label]).is_empty() {
            while end < lines.len() && lines[end].trim().is_empty() {
                end += 1;
            }
        }
        while end < lines.len() {
            let text = strip_decoration(lines[end]);
            if text.is_empty() || text.starts_with('#') || MARKER_RE.is_match(text) {
                break;
            }
            end += 1;
        }
        return Some(label..end);
    }

    let mut start = 0;
    while start < lines.len() {
        if strip_decoration(lines[start]).is_empty() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < lines.len() && !strip_decoration(lines[end]).is_empty() {
            end += 1;
        }
        let metric_lines = lines[start..end].iter().filter(|l| is_metrics_line(l)).count();
        if metric_lines > 0 && metric_lines * 2 > end - start {
            return Some(start..end);
        }
        start = end;
    }
    None
}

/// Splits a line on `,` `;` `|` and parses each segment as `key: value` or
/// `key:: value`. A segment that is not a pair continues the previous value
/// (`Mood: happy, calm`). The flag is `false` when the line opens with prose.
fn line_pairs(line: &str, max_words: usize) -> (Vec<(String, MetricValue)>, bool) {
    let mut raw: Vec<(String, String)> = Vec::new();
    let mut all_pairs = true;

    for segment in line.split([',', ';', '|']) {
        if segment.trim().is_empty() {
            continue;
        }
        if let Some((name, value)) = split_pair(segment, max_words) {
            raw.push((name, value));
        } else if let Some((_, value)) = raw.last_mut() {
            value.push_str(", ");
            value.push_str(segment.trim());
        } else {
            all_pairs = false;
        }
    }

    let pairs = raw
        .into_iter()
        .map(|(name, value)| (name, parse_metric_value(&value)))
        .collect::<Vec<_>>();
    let all_pairs = all_pairs && !pairs.is_empty();
    (pairs, all_pairs)
}

fn split_pair(segment: &str, max_words: usize) -> Option<(String, String)> {
    let (key, value) = segment.split_once(':')?;
    let value = value.strip_prefix(':').unwrap_or(value);
    let name = normalize_metric_name(key)?;
    if name.split(' ').count() > max_words
        || RESERVED_NAMES.contains(&name.to_ascii_lowercase().as_str())
    {
        return None;
    }

    let value = value.trim().trim_matches('*').trim();
    if value.is_empty() || value.starts_with("//") {
        return None;
    }
    // `at 10:30` is a time, not a metric called "at 10".
    let name_ends_in_digit = name.chars().last().is_some_and(|c| c.is_ascii_digit());
    let value_starts_with_digit = value.chars().next().is_some_and(|c| c.is_ascii_digit());
    if name_ends_in_digit && value_starts_with_digit {
        return None;
    }
    Some((name, value.to_string()))
}
