use anyhow::{Context, Result};
use directories::BaseDirs;
use dreamlog_core::ParseOptions;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_DATE_FORMAT: &str = "%A, %d %b %Y";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Starting point for every parse; command-line flags override it.
    pub parse: ParseOptions,
    /// How entry dates are printed (chrono format).
    pub date_format: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    date_format: Option<String>,
    /// Optional table, any subset of the parse options:
    /// [parse]
    /// marker_type = "dream"
    /// include_nested = true
    parse: Option<ParseOptions>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

impl Config {
    /// Load config from disk (first XDG path, then native) and apply defaults.
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self> {
        for path in Self::config_file_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load the config at `path`, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let file_config =
            Self::parse_file(&s).with_context(|| format!("parsing {}", path.display()))?;
        let config = Self::from_file(file_config);
        config
            .parse
            .check()
            .with_context(|| format!("checking [parse] in {}", path.display()))?;
        Ok(config)
    }

    fn from_file(file_config: FileConfig) -> Self {
        Self {
            parse: file_config.parse.unwrap_or_default(),
            date_format: file_config
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
        }
    }

    fn config_file_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Some(b) = BaseDirs::new() {
            let xdg = b
                .home_dir()
                .join(".config")
                .join("dreamlog")
                .join("config.toml");
            v.push(xdg);
            let native = b.config_dir().join("dreamlog").join("config.toml");
            v.push(native);
        }
        v
    }

    /// Parse a TOML string into `FileConfig`.
    fn parse_file(s: &str) -> Result<FileConfig> {
        Ok(toml::from_str::<FileConfig>(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn candidates_prioritize_xdg_then_native() {
        if let Some(b) = BaseDirs::new() {
            let expected_xdg = b
                .home_dir()
                .join(".config")
                .join("dreamlog")
                .join("config.toml");
            let expected_native = b.config_dir().join("dreamlog").join("config.toml");
            let c = Config::config_file_paths();
            assert_eq!(c.first(), Some(&expected_xdg));
            assert_eq!(c.get(1), Some(&expected_native));
        }
    }

    #[test]
    fn parse_table_overrides_only_what_it_names() {
        let toml = r#"
            date_format = "%d/%m/%Y"

            [parse]
            marker_type = "memory"
            include_nested = true
            reference_date = "2024-02-29"
        "#;
        let config = Config::from_file(Config::parse_file(toml).unwrap());
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.parse.marker_type, "memory");
        assert!(config.parse.include_nested);
        assert_eq!(
            config.parse.reference_date,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(config.parse.validate);
        assert_eq!(config.parse.max_content_length, 500_000);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_file(Config::parse_file("").unwrap());
        assert_eq!(config, Config::default());
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn load_from_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parse]\nstrict = true\nmax_matches = 20").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert!(config.parse.strict);
        assert_eq!(config.parse.max_matches, 20);
    }

    #[test]
    fn load_from_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nope.toml");
        assert!(Config::load_from(&missing).is_err());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[parse\nstrict = yes").unwrap();
        let err = Config::load_from(&broken).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));

        let invalid = dir.path().join("invalid.toml");
        fs::write(&invalid, "[parse]\nmax_matches = 0").unwrap();
        let err = Config::load_from(&invalid).unwrap_err();
        assert!(format!("{err:#}").contains("max_matches"));
    }
}
