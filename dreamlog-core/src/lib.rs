//! Extraction of structured journal entries from `[!type]` callout blocks.
pub mod dates;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod months;
pub mod options;
pub mod parser;
pub mod sanitize;
pub mod scanner;
pub mod validate;

#[cfg(test)]
mod tests;

pub use dates::resolve_date;
pub use diagnostics::{CollectingSink, DiagnosticsSink, Level, NoopSink, TracingSink};
pub use entry::{Record, Source, build_entry, extract_title};
pub use error::{Defect, ParseError, ScanError};
pub use metrics::{MetricValue, Metrics, extract_metrics};
pub use options::ParseOptions;
pub use parser::{ParseMetadata, ParseResult, parse, parse_with_sink};
pub use sanitize::sanitize;
pub use scanner::{CalloutSpan, scan, scan_nested};
pub use validate::validate_record;
