use crate::error::ParseError;
use crate::timestamp::parse_offset;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the engine does with a line whose structure matched but whose time did not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFailurePolicy {
    /// Treat it like a non-matching line
    #[default]
    Drop,
    /// Return the `TimeParse` error to the caller
    Surface,
}

/// Options of one parser instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Add the untouched raw time string to each record under `time`
    pub keep_raw_time: bool,

    /// Handling of time resolution failures
    pub time_failure: TimeFailurePolicy,

    /// Offset attached to times from layouts without a zone
    pub default_offset: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            keep_raw_time: false,
            time_failure: TimeFailurePolicy::Drop,
            default_offset: "+00:00".to_string(),
        }
    }
}

impl ParserOptions {
    pub fn with_keep_raw_time(mut self, keep: bool) -> Self {
        self.keep_raw_time = keep;
        self
    }

    pub fn with_time_failure(mut self, policy: TimeFailurePolicy) -> Self {
        self.time_failure = policy;
        self
    }

    pub fn with_default_offset(mut self, offset: impl Into<String>) -> Self {
        self.default_offset = offset.into();
        self
    }

    pub fn offset(&self) -> Result<FixedOffset, ParseError> {
        parse_offset(&self.default_offset)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ParseError> {
        let options: ParserOptions = toml::from_str(text).map_err(|e| ParseError::Configuration {
            parameter: "options".to_string(),
            message: e.to_string(),
        })?;
        options.offset()?;
        Ok(options)
    }

    /// Read options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
            operation: format!("reading {}", path.display()),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = ParserOptions::default();
        assert!(!options.keep_raw_time);
        assert_eq!(options.time_failure, TimeFailurePolicy::Drop);
        assert_eq!(options.offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_from_toml_partial() {
        let options = ParserOptions::from_toml_str("keep_raw_time = true\n").unwrap();
        assert!(options.keep_raw_time);
        assert_eq!(options.time_failure, TimeFailurePolicy::Drop);
        assert_eq!(options.default_offset, "+00:00");
    }

    #[test]
    fn test_from_toml_full() {
        let text = r#"
keep_raw_time = false
time_failure = "surface"
default_offset = "-07:00"
"#;
        let options = ParserOptions::from_toml_str(text).unwrap();
        assert_eq!(options.time_failure, TimeFailurePolicy::Surface);
        assert_eq!(options.offset().unwrap().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(matches!(
            ParserOptions::from_toml_str(r#"time_failure = "explode""#),
            Err(ParseError::Configuration { .. })
        ));
        assert!(matches!(
            ParserOptions::from_toml_str(r#"default_offset = "noon""#),
            Err(ParseError::Configuration { parameter, .. }) if parameter == "default_offset"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "keep_raw_time = true").unwrap();
        writeln!(file, "default_offset = \"+09:00\"").unwrap();

        let options = ParserOptions::load(file.path()).unwrap();
        assert!(options.keep_raw_time);
        assert_eq!(options.default_offset, "+09:00");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ParserOptions::load("/nonexistent/edgelog.toml");
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }
}
