use crate::error::ParseError;
use crate::scanner::DEFAULT_MAX_MATCHES;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MARKER_TYPE: &str = "dream";
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 500_000;
/// Source reported when the caller does not give one.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Everything [`crate::parse`] can be told.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ParseOptions {
    /// Callout type to extract (`[!dream]`). Matched case-insensitively.
    pub marker_type: String,
    /// Path reported in every record's source.
    pub source_path: Option<String>,
    /// Run the validator and attach its defects as warnings.
    pub validate: bool,
    /// Also extract blocks nested inside blockquoted callouts of other types.
    pub include_nested: bool,
    /// Normalize punctuation and strip control characters first.
    pub sanitize: bool,
    /// Return the first internal failure instead of recovering from it.
    pub strict: bool,
    /// Discard all entries when the document scan fails.
    pub transactional: bool,
    /// Input is cut to this many characters before scanning.
    pub max_content_length: usize,
    /// A scan stops after this many blocks.
    pub max_matches: usize,
    /// Date given to blocks without one. Defaults to today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            marker_type: DEFAULT_MARKER_TYPE.to_string(),
            source_path: None,
            validate: true,
            include_nested: false,
            sanitize: true,
            strict: false,
            transactional: false,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            max_matches: DEFAULT_MAX_MATCHES,
            reference_date: None,
        }
    }
}

impl ParseOptions {
    /// Default options aimed at `target`.
    ///
    /// A target containing a path separator (`/` or `\`) is taken as the
    /// source path; anything else is the marker type.
    pub fn for_target(target: &str) -> Self {
        if target.contains('/') || target.contains('\\') {
            Self::default().with_source_path(target)
        } else {
            Self::default().with_marker_type(target)
        }
    }

    pub fn with_marker_type(mut self, marker_type: &str) -> Self {
        self.marker_type = marker_type.trim().to_string();
        self
    }

    pub fn with_source_path(mut self, source_path: &str) -> Self {
        self.source_path = Some(source_path.to_string());
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn include_nested(mut self, include_nested: bool) -> Self {
        self.include_nested = include_nested;
        self
    }

    pub fn source_or_unknown(&self) -> &str {
        self.source_path.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }

    /// Rejects option sets that cannot describe a parse.
    pub fn check(&self) -> Result<(), ParseError> {
        if self.marker_type.is_empty() {
            return Err(ParseError::InvalidOptions("marker type is empty".to_string()));
        }
        if !self
            .marker_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ParseError::InvalidOptions(format!(
                "marker type `{}` may only contain letters, digits, `_` and `-`",
                self.marker_type
            )));
        }
        if self.max_content_length == 0 {
            return Err(ParseError::InvalidOptions(
                "max_content_length must be positive".to_string(),
            ));
        }
        if self.max_matches == 0 {
            return Err(ParseError::InvalidOptions(
                "max_matches must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = ParseOptions::default();
        assert_eq!(o.marker_type, "dream");
        assert!(o.validate && o.sanitize);
        assert!(!o.include_nested && !o.strict && !o.transactional);
        assert_eq!(o.max_content_length, 500_000);
        assert_eq!(o.source_or_unknown(), UNKNOWN_SOURCE);
        assert!(o.check().is_ok());
    }

    #[test]
    fn target_with_separator_is_a_source_path() {
        let o = ParseOptions::for_target("journal/2023.md");
        assert_eq!(o.source_path.as_deref(), Some("journal/2023.md"));
        assert_eq!(o.marker_type, DEFAULT_MARKER_TYPE);

        let o = ParseOptions::for_target(r"C:\notes\a.md");
        assert_eq!(o.source_path.as_deref(), Some(r"C:\notes\a.md"));

        let o = ParseOptions::for_target("memory");
        assert_eq!(o.marker_type, "memory");
        assert!(o.source_path.is_none());
    }

    #[test]
    fn invalid_combinations_fail_fast() {
        let bad = [
            ParseOptions::default().with_marker_type(""),
            ParseOptions::default().with_marker_type("dre am"),
            ParseOptions::default().with_marker_type("dream]"),
            ParseOptions {
                max_content_length: 0,
                ..Default::default()
            },
            ParseOptions {
                max_matches: 0,
                ..Default::default()
            },
        ];
        for options in bad {
            assert!(
                matches!(options.check(), Err(ParseError::InvalidOptions(_))),
                "{options:?}"
            );
        }
    }

    #[test]
    fn partial_settings_deserialize_over_defaults() {
        let o: ParseOptions = serde_json::from_str(r#"{ "marker_type": "memory", "strict": true }"#).unwrap();
        assert_eq!(o.marker_type, "memory");
        assert!(o.strict);
        assert!(o.validate);
        assert_eq!(o.max_matches, DEFAULT_MAX_MATCHES);
    }
}
