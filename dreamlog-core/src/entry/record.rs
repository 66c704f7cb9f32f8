use crate::dates::format_date;
use crate::metrics::Metrics;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a record came from.
///
/// Either a bare path or a path plus the callout's id; [`Source::file`] reads
/// the path out of both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Path(String),
    Located {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Source {
    pub fn file(&self) -> &str {
        match self {
            Source::Path(file) => file,
            Source::Located { file, .. } => file,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Source::Path(_) => None,
            Source::Located { id, .. } => id.as_deref(),
        }
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(path.to_string())
    }
}

/// Provenance and diagnostics of one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalloutMetadata {
    #[serde(rename = "type")]
    pub callout_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Type of the enclosing callout, for blocks found by nested scanning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_in_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// No date was found in the block and the fallback date was used.
    #[serde(default)]
    pub date_fallback: bool,
    #[serde(default)]
    pub parse_failure: bool,
    #[serde(default)]
    pub recovery_attempted: bool,
}

/// One extracted journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub source: Source,
    pub word_count: usize,
    pub metrics: Metrics,
    pub callout_metadata: CalloutMetadata,
}

impl Record {
    /// The date as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    /// `true` for records synthesized after a failed build.
    pub fn is_recovered(&self) -> bool {
        self.callout_metadata.parse_failure
    }
}

/// Number of whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_file_is_reachable_from_both_shapes() {
        let bare = Source::from("notes/2023.md");
        let located = Source::Located {
            file: "notes/2023.md".to_string(),
            id: Some("12345678".to_string()),
        };
        assert_eq!(bare.file(), "notes/2023.md");
        assert_eq!(located.file(), "notes/2023.md");
        assert_eq!(bare.id(), None);
        assert_eq!(located.id(), Some("12345678"));
    }

    #[test]
    fn source_deserializes_from_either_shape() {
        let bare: Source = serde_json::from_value(json!("a.md")).unwrap();
        let located: Source = serde_json::from_value(json!({ "file": "b.md" })).unwrap();
        assert_eq!(bare.file(), "a.md");
        assert_eq!(located.file(), "b.md");
    }

    #[test]
    fn record_serializes_with_canonical_date_and_camel_case() {
        let record = Record {
            date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            title: "T".to_string(),
            content: "c".to_string(),
            source: Source::from("x.md"),
            word_count: 1,
            metrics: Metrics::new(),
            callout_metadata: CalloutMetadata {
                callout_type: "dream".to_string(),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], json!("2023-01-05"));
        assert_eq!(value["wordCount"], json!(1));
        assert_eq!(value["calloutMetadata"]["type"], json!("dream"));
        assert_eq!(record.date_string(), "2023-01-05");
    }

    #[test]
    fn words_are_split_on_any_whitespace() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
        assert_eq!(count_words(""), 0);
    }
}
