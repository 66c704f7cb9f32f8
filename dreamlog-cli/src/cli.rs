use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use dreamlog_core::ParseOptions;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// dreamlog: extract dream journal entries from markdown callouts
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Notes to read. Reads stdin when empty or `-`.
    #[arg()]
    pub inputs: Vec<PathBuf>,
    /// Callout type to extract (e.g., `dreamlog -t memory notes.md` for `[!memory]` blocks).
    #[arg(long = "type", short = 't', env = "DREAMLOG_TYPE")]
    pub marker_type: Option<String>,
    /// Also extract callouts nested inside `> [!note]`-style blockquotes.
    #[arg(long)]
    pub nested: bool,
    /// Stop at the first block that cannot be parsed instead of recovering it.
    #[arg(long)]
    pub strict: bool,
    /// Drop every entry of a document whose scan fails.
    #[arg(long)]
    pub transactional: bool,
    /// Skip the validation warnings.
    #[arg(long)]
    pub no_validate: bool,
    /// Parse the text as-is, without normalizing punctuation and control characters.
    #[arg(long)]
    pub no_sanitize: bool,
    /// Truncate each document to this many characters.
    #[arg(long)]
    pub max_length: Option<usize>,
    /// Stop after this many callouts per document.
    #[arg(long)]
    pub max_matches: Option<usize>,
    /// Date for entries without one, as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub reference_date: Option<String>,
    /// Read settings from this file instead of the default config locations.
    #[arg(long, env = "DREAMLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, conflicts_with_all = ["summary", "short"])]
    pub json: bool,
    /// Only print per-document counts.
    #[arg(long, conflicts_with = "short")]
    pub summary: bool,
    /// Only show the date, title and metrics of each entry.
    #[arg(long, short)]
    pub short: bool,
    /// Control ANSI colors in output.
    /// By default, colors are disabled when output is redirected (e.g with `>` or `|`).
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
    /// Exit with a failure status when any block needed recovery.
    #[arg(long)]
    pub fail_on_error: bool,
}

/// When entries are printed with the journal skin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Only on a terminal, and only while `NO_COLOR` is unset.
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn enabled(self, no_color: bool, stdout_is_terminal: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => !no_color && stdout_is_terminal,
        }
    }
}

impl Cli {
    pub fn use_color(&self) -> bool {
        let no_color = std::env::var_os("NO_COLOR").is_some();
        self.color.enabled(no_color, io::stdout().is_terminal())
    }

    /// Applies the flags on top of the options loaded from the config file.
    pub fn parse_options(&self, base: &ParseOptions) -> Result<ParseOptions> {
        let mut options = base.clone();
        if let Some(marker_type) = &self.marker_type {
            options = options.with_marker_type(marker_type);
        }
        options.include_nested |= self.nested;
        options.strict |= self.strict;
        options.transactional |= self.transactional;
        if self.no_validate {
            options.validate = false;
        }
        if self.no_sanitize {
            options.sanitize = false;
        }
        if let Some(max) = self.max_length {
            options.max_content_length = max;
        }
        if let Some(max) = self.max_matches {
            options.max_matches = max;
        }
        if let Some(date) = &self.reference_date {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid --reference-date `{date}`"))?;
            options.reference_date = Some(date);
        }
        options.check()?;
        Ok(options)
    }

    /// `None` stands for stdin.
    pub fn documents(&self) -> Vec<Option<PathBuf>> {
        if self.inputs.is_empty() {
            return vec![None];
        }
        self.inputs
            .iter()
            .map(|p| (p.as_os_str() != "-").then(|| p.clone()))
            .collect()
    }
}
