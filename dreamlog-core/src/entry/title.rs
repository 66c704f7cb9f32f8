use crate::metrics::is_metrics_line;
use crate::scanner::MARKER_RE;
use once_cell::sync::Lazy;
use regex::Regex;

/// Titles longer than this are cut and end with `...`.
pub const MAX_TITLE_CHARS: usize = 50;
/// A plain first line longer than this is prose, not a title.
const MAX_FIRST_LINE_CHARS: usize = 100;
pub const PLACEHOLDER_TITLE: &str = "Untitled";

static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+(.+)$").expect("valid h1 regex"));
static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\s+(.+)$").expect("valid h2 regex"));
static TITLE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[*_]*title[*_]*\s*::?[*_]*\s*(.+)$").expect("valid title regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Heading1,
    Heading2,
    TitleLine,
    FirstLine,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub title: String,
    pub source: TitleSource,
    /// Index of the line the title was read from.
    pub line: Option<usize>,
}

/// Returns the title of `content`; never empty.
pub fn extract_title(content: &str) -> String {
    find_title(content).title
}

/// Finds the title of `content`, remembering where it came from.
///
/// Candidates, first hit wins:
///
/// 1. a level-1 heading (`# Title`);
/// 2. a level-2 heading (`## Title`);
/// 3. a `Title: ...` line;
/// 4. the first non-empty line, if it is at most 100 characters and is not a
///    line of metrics. A leading `[!type]` marker is not part of it.
///
/// Otherwise the title is [`PLACEHOLDER_TITLE`]. Titles longer than
/// [`MAX_TITLE_CHARS`] are truncated with an ellipsis.
pub fn find_title(content: &str) -> TitleMatch {
    let lines: Vec<&str> = content.lines().map(title_text).collect();

    let from_pattern = |re: &Regex, source: TitleSource, clean: fn(&str) -> String| {
        lines.iter().enumerate().find_map(|(i, line)| {
            let caps = re.captures(line)?;
            let title = clean(caps.get(1)?.as_str());
            (!title.is_empty()).then(|| TitleMatch {
                title: truncate_title(&title),
                source,
                line: Some(i),
            })
        })
    };

    from_pattern(&H1_RE, TitleSource::Heading1, heading_text)
        .or_else(|| from_pattern(&H2_RE, TitleSource::Heading2, heading_text))
        .or_else(|| from_pattern(&TITLE_LINE_RE, TitleSource::TitleLine, normalize_title))
        .or_else(|| {
            let (i, line) = lines
                .iter()
                .enumerate()
                .find(|(_, line)| !line.trim().is_empty())?;
            let title = normalize_title(line);
            let usable = !title.is_empty()
                && title.chars().count() <= MAX_FIRST_LINE_CHARS
                && !is_metrics_line(&title);
            usable.then(|| TitleMatch {
                title: truncate_title(&title),
                source: TitleSource::FirstLine,
                line: Some(i),
            })
        })
        .unwrap_or_else(|| TitleMatch {
            title: PLACEHOLDER_TITLE.to_string(),
            source: TitleSource::Placeholder,
            line: None,
        })
}

/// A line without quote markers or a leading callout marker.
fn title_text(line: &str) -> &str {
    let mut s = line.trim_start();
    while let Some(rest) = s.strip_prefix('>') {
        s = rest.trim_start();
    }
    match MARKER_RE.find(s) {
        Some(m) if m.start() == 0 => s[m.end()..].trim(),
        _ => s.trim_end(),
    }
}

/// Heading text as written, minus an ATX closing sequence (`# Title ##`).
/// A `#` glued to the last word (`C#`) is part of the text.
fn heading_text(s: &str) -> String {
    strip_closing_hashes(s.trim()).to_string()
}

fn strip_closing_hashes(t: &str) -> &str {
    let without = t.trim_end_matches('#');
    if without.len() < t.len() && (without.is_empty() || without.ends_with(char::is_whitespace)) {
        without.trim_end()
    } else {
        t
    }
}

/// A title from plain text: leading `#`s, a closing sequence and a `**...**`
/// wrapper are removed.
fn normalize_title(s: &str) -> String {
    let mut t = s.trim_start_matches(|c: char| c == '#' || c.is_whitespace());
    t = strip_closing_hashes(t.trim_end());
    if t.len() > 4 && t.starts_with("**") && t.ends_with("**") {
        t = t[2..t.len() - 2].trim();
    }
    t.to_string()
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let kept: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", kept.trim_end())
}
