use super::title::{TitleMatch, TitleSource, find_title};
use crate::metrics::{find_metrics_section, is_metrics_line};
use crate::scanner::MARKER_RE;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dataview-style `key:: value` property lines.
static PROPERTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[A-Za-z][\w \-]*::").expect("valid property regex"));
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank regex"));

/// Removes blockquote markers (`>`, `> >`, ...) from the start of every line.
pub fn unquote(text: &str) -> String {
    text.lines()
        .map(|line| {
            let mut s = line;
            loop {
                let trimmed = s.trim_start();
                match trimmed.strip_prefix('>') {
                    Some(rest) => s = rest.strip_prefix(' ').unwrap_or(rest),
                    None => break,
                }
            }
            s.trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The body of a callout block, with everything that is not prose removed.
pub fn clean_content(block: &str) -> String {
    let text = unquote(block);
    let title = find_title(&text);
    clean_with_title(&text, &title)
}

/// Cleans an already unquoted block whose title is known.
///
/// Drops the marker (and the rest of its line when the title was read from
/// it), the title heading or `Title:` line, the metrics section and every
/// other metrics line, and `key:: value` properties. Runs of blank lines
/// shrink to one.
pub(crate) fn clean_with_title(text: &str, title: &TitleMatch) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let section = find_metrics_section(&lines);
    let title_line = match title.source {
        TitleSource::Heading1 | TitleSource::Heading2 | TitleSource::TitleLine => title.line,
        TitleSource::FirstLine => title.line.filter(|&i| i == 0),
        TitleSource::Placeholder => None,
    };

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, &line) in lines.iter().enumerate() {
        if Some(i) == title_line {
            continue;
        }
        if section.as_ref().is_some_and(|s| s.contains(&i)) {
            continue;
        }
        let line = if i == 0 { strip_marker(line) } else { line };
        if is_metrics_line(line) || PROPERTY_RE.is_match(line) {
            continue;
        }
        kept.push(line.trim_end());
    }

    let joined = kept.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

fn strip_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    match MARKER_RE.find(trimmed) {
        Some(m) if m.start() == 0 => trimmed[m.end()..].trim_start(),
        _ => line,
    }
}
