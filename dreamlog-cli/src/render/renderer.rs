use super::palette::{Palette, journal_skin};
use crate::config::DEFAULT_DATE_FORMAT;
use dreamlog_core::{ParseMetadata, ParseResult, Record};
use termimad::{MadSkin, crossterm::style::Stylize};

#[derive(Clone)]
pub struct RenderOptions {
    pub date_format: String,
    pub use_color: bool,
    pub short_mode: bool,
}

pub struct Renderer {
    skin: MadSkin,
    opts: RenderOptions,
}

impl Renderer {
    pub fn new(config: Option<RenderOptions>) -> Self {
        Self {
            skin: journal_skin(),
            opts: match config {
                Some(config) => config,
                None => RenderOptions {
                    date_format: DEFAULT_DATE_FORMAT.to_string(),
                    use_color: true,
                    short_mode: false,
                },
            },
        }
    }

    pub fn print_md(&self, md: &str) {
        if self.opts.use_color {
            self.skin.print_text(md);
        } else {
            print!("{md}");
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.opts.use_color {
            let md = format!("|-|\n| {message} |\n|-|\n");
            self.skin.print_text(&md);
        } else {
            println!("{message}");
        }
    }

    pub fn print_entry_line(&self, entry: &Record) {
        let mut date = entry.date.format(&self.opts.date_format).to_string();
        let mut title = entry.title.trim().to_string();
        let mut metrics = metrics_line(entry);
        if self.opts.use_color {
            date = date.with(Palette::DATE).to_string();
            title = if entry.is_recovered() {
                title.with(Palette::RECOVERED).to_string()
            } else {
                title.with(Palette::TITLE).to_string()
            };
            metrics = metrics.with(Palette::METRIC).to_string();
        }
        if metrics.is_empty() {
            println!("{date} - {title}");
        } else {
            println!("{date} - {title} [{metrics}]");
        }
    }

    pub fn print_entries(&self, result: &ParseResult) {
        if result.entries.is_empty() {
            self.print_info(&format!(
                "No [!{}] entries found.",
                result.metadata.callout_type
            ));
            return;
        }

        for (i, entry) in result.entries.iter().enumerate() {
            if self.opts.short_mode {
                self.print_entry_line(entry);
                continue;
            }
            self.print_md(&entry_markdown(entry, &self.opts.date_format));
            if i + 1 < result.entries.len() {
                println!();
            }
            self.print_md("---\n");
        }
    }

    pub fn print_summary(&self, source: &str, metadata: &ParseMetadata) {
        self.print_info(&format!(
            "{source}: {} entries, {} words (avg {:.1}), {} errors, {} warnings",
            metadata.total_entries,
            metadata.total_word_count,
            metadata.average_word_count,
            metadata.error_count,
            metadata.warning_count,
        ));
    }

    /// Lists document errors and warnings, if any.
    pub fn print_problems(&self, metadata: &ParseMetadata) {
        if !metadata.errors.is_empty() {
            self.print_md("\n# Errors:\n");
            for error in &metadata.errors {
                self.print_md(&format!("* {error}\n"));
            }
        }
        if !metadata.warnings.is_empty() {
            self.print_md("\n# Warnings:\n");
            for warning in &metadata.warnings {
                self.print_md(&format!("* {warning}\n"));
            }
        }
    }
}

/// One entry as markdown: heading, body, metrics and validation warnings.
fn entry_markdown(entry: &Record, date_format: &str) -> String {
    let date = entry.date.format(date_format).to_string();
    let mut md = format!("## {date}: {}\n", entry.title.trim());
    if entry.callout_metadata.date_fallback {
        md.push_str("*no date found in entry*\n");
    }
    let body = entry.content.trim_end();
    if !body.is_empty() {
        md.push_str(body);
        md.push('\n');
    }
    if !entry.metrics.is_empty() {
        md.push_str("\n|:-|-:|\n|**Metric**|**Value**|\n|-|-|\n");
        for (name, value) in &entry.metrics {
            md.push_str(&format!("|{name}|{value}|\n"));
        }
        md.push_str("|-|-|\n");
    }
    for warning in &entry.callout_metadata.warnings {
        md.push_str(&format!("> {warning}\n"));
    }
    md
}

fn metrics_line(entry: &Record) -> String {
    entry
        .metrics
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
