use crate::cli::Cli;
use crate::render::Renderer;
use anyhow::{Context, Result};
use dreamlog_core::{ParseOptions, ParseResult, TracingSink, parse_with_sink};
use serde::Serialize;
use std::{
    fs,
    io::{self, Read},
    path::Path,
};
use tracing::{debug, info};

/// One parsed document, as printed by `--json`.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub source: String,
    #[serde(flatten)]
    pub result: ParseResult,
}

/// Parses every input named on the command line and prints the results.
/// Returns the total number of errors across documents.
pub fn parse_mode(cli: &Cli, options: &ParseOptions, renderer: &Renderer) -> Result<usize> {
    let mut reports = Vec::new();
    for path in cli.documents() {
        let report = match path.as_deref() {
            Some(path) => parse_file(path, options)?,
            None => parse_stdin(options)?,
        };
        if !cli.json {
            print_report(cli, renderer, &report);
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(reports.iter().map(|r| r.result.metadata.error_count).sum())
}

fn parse_file(path: &Path, options: &ParseOptions) -> Result<DocumentReport> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let source = path.display().to_string();
    let options = match &options.source_path {
        Some(_) => options.clone(),
        None => options.clone().with_source_path(&source),
    };
    parse_document(&text, source, &options)
}

fn parse_stdin(options: &ParseOptions) -> Result<DocumentReport> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("reading stdin")?;
    let source = options.source_or_unknown().to_string();
    parse_document(&text, source, options)
}

fn parse_document(text: &str, source: String, options: &ParseOptions) -> Result<DocumentReport> {
    debug!(source = %source, chars = text.len(), "parsing document");
    let result = parse_with_sink(text, options, &TracingSink)
        .with_context(|| format!("parsing {source}"))?;
    info!(
        source = %source,
        entries = result.metadata.total_entries,
        errors = result.metadata.error_count,
        "parsed document"
    );
    Ok(DocumentReport { source, result })
}

fn print_report(cli: &Cli, renderer: &Renderer, report: &DocumentReport) {
    let metadata = &report.result.metadata;
    if cli.summary {
        renderer.print_summary(&report.source, metadata);
        return;
    }
    renderer.print_info(&format!(
        "{}: {} entries found.",
        report.source, metadata.total_entries
    ));
    renderer.print_entries(&report.result);
    renderer.print_problems(metadata);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn files_are_parsed_with_their_path_as_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[!dream] Boat 2024-04-04\nRowing on a lake.\nClarity: 3\n\n[!dream] Broken\n```\n"
        )
        .unwrap();

        let report = parse_file(file.path(), &ParseOptions::default()).unwrap();
        let source = file.path().display().to_string();
        assert_eq!(report.source, source);
        assert_eq!(report.result.entries.len(), 2);
        assert_eq!(report.result.entries[0].source.file(), source);
        assert_eq!(report.result.metadata.error_count, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], source.as_str());
        assert_eq!(json["metadata"]["errorCount"], 1);
        assert_eq!(json["entries"][0]["date"], "2024-04-04");
    }

    #[test]
    fn configured_source_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[!dream] Boat\nRowing.").unwrap();
        let options = ParseOptions::default().with_source_path("vault/boats.md");
        let report = parse_file(file.path(), &options).unwrap();
        assert_eq!(report.result.entries[0].source.file(), "vault/boats.md");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(&dir.path().join("missing.md"), &ParseOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("reading"));
    }

    #[test]
    fn strict_failures_name_the_document() {
        let options = ParseOptions::default().strict(true);
        let err = parse_document("[!dream] x\n```", "notes.md".to_string(), &options).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("parsing notes.md"));
        assert!(message.contains("unbalanced code fence"));
    }
}
