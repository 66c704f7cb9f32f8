//! Typed failures of the extraction pipeline.
//!
//! Data-shape problems (a missing date, no metrics, an odd title) are never
//! errors: primitives report them with `Option`/empty values and the validator
//! turns them into warnings. The types here cover the three things that are
//! actually allowed to fail.
use thiserror::Error;

/// A block that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Defect {
    #[error("callout block is empty")]
    EmptySpan,
    #[error("callout block does not start with a `[!type]` marker")]
    MissingMarker,
    #[error("callout block has an unbalanced code fence ({fences} fence lines)")]
    UnbalancedFence { fences: usize },
}

/// A failure of the document-level scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("callout span {start}..{end} does not fall on the document's character boundaries")]
    SpanOutOfBounds { start: usize, end: usize },
    #[error("scanner interrupted: {0}")]
    Interrupted(String),
}

/// Everything the top-level `parse` can hand back to the caller.
///
/// In lenient mode only [`ParseError::InvalidOptions`] is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid parse options: {0}")]
    InvalidOptions(String),
    #[error("document scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("callout #{index} at offset {offset} failed: {defect}")]
    Block {
        index: usize,
        offset: usize,
        defect: Defect,
    },
    #[error("callout #{index} at offset {offset} panicked: {message}")]
    Panicked {
        index: usize,
        offset: usize,
        message: String,
    },
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
