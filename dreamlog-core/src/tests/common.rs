use crate::ParseOptions;
use chrono::NaiveDate;

/// Date every fixture falls back to.
pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

/// Test helper to create the `ParseOptions` every scenario starts from.
///
/// Keeps fallback dates deterministic; everything else is the default.
pub fn mk_options(marker_type: &str) -> ParseOptions {
    ParseOptions::default()
        .with_marker_type(marker_type)
        .with_source_path("journal/dreams.md")
        .with_reference_date(fixed_date())
}

/// `count` minimal blocks: `[!dream] Dream N\nMinimal content for dream N.\n\n`.
pub fn minimal_entries(count: usize) -> String {
    (1..=count)
        .map(|n| format!("[!dream] Dream {n}\nMinimal content for dream {n}.\n\n"))
        .collect()
}

/// A well-formed block with a heading, a dated line, prose and a metrics section.
pub fn full_entry(title: &str, date: &str, body: &str) -> String {
    format!("[!dream]\n# {title}\nDate: {date}\n\n{body}\n\nMetrics:\nClarity: 4\nVividness: 3\nMood: calm\n\n")
}

/// Inputs that have to go through `parse` without a panic or an error.
pub fn hostile_inputs() -> Vec<String> {
    vec![
        String::new(),
        " \n\t\n".to_string(),
        "[!".to_string(),
        "[!dream".to_string(),
        "text [! dream] and [!] and [!!dream]".to_string(),
        "[!dream]".to_string(),
        "[!dream]\n```".to_string(),
        "[!dream][!dream][!dream]".to_string(),
        "\u{0}\u{7}[!dream] \u{201C}quoted\u{201D}\u{2026}\r\n\u{FEFF}body".to_string(),
        "[!".repeat(5_000),
        "[!dream] x ".repeat(3_000),
        "> > > [!note]\n> > [!dream] deep\n> > > > body\n".repeat(50),
        "Clarity: 4: 5 :: : ,;| [!dream] ::::".to_string(),
    ]
}
