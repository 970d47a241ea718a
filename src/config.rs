//! Segmentation configuration
//!
//! Values are layered, lowest precedence first: built-in defaults, a YAML
//! file, `COVENANT_*` environment variables, then command-line flags (the
//! binary applies those last).
//!
//! ```yaml
//! min_offset: 2000
//! lookahead: 4
//! section_pattern: labeled
//! expected_numerals: [I, II, III]
//! ```

use crate::segment::numerals::{canonical_numerals, is_article_numeral};
use crate::segment::{SectionPattern, LOOKAHEAD_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_MIN_OFFSET: &str = "COVENANT_MIN_OFFSET";
pub const ENV_EXPECTED_NUMERALS: &str = "COVENANT_EXPECTED_NUMERALS";
pub const ENV_LOOKAHEAD: &str = "COVENANT_LOOKAHEAD";
pub const ENV_SECTION_PATTERN: &str = "COVENANT_SECTION_PATTERN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown article numeral: {0}")]
    UnknownNumeral(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Document-specific settings for segmentation and coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Line index before which Article headings are front matter
    pub min_offset: usize,
    /// Numerals the coverage audit expects, in order
    pub expected_numerals: Vec<String>,
    /// Lines inspected after an Article heading for its title
    pub lookahead: usize,
    pub section_pattern: SectionPattern,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_offset: 0,
            expected_numerals: canonical_numerals(),
            lookahead: LOOKAHEAD_WINDOW,
            section_pattern: SectionPattern::default(),
        }
    }
}

impl SegmentConfig {
    /// Load a YAML file over the defaults and validate it.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config file");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `COVENANT_*` variables from the process environment.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup (tests use a map).
    pub fn apply_env_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MIN_OFFSET) {
            self.min_offset = parse_number(ENV_MIN_OFFSET, &value)?;
        }
        if let Some(value) = lookup(ENV_LOOKAHEAD) {
            self.lookahead = parse_number(ENV_LOOKAHEAD, &value)?;
        }
        if let Some(value) = lookup(ENV_SECTION_PATTERN) {
            self.section_pattern = value.parse().map_err(|message| ConfigError::InvalidValue {
                key: ENV_SECTION_PATTERN.to_string(),
                message,
            })?;
        }
        if let Some(value) = lookup(ENV_EXPECTED_NUMERALS) {
            self.expected_numerals = parse_numeral_list(&value);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_lookahead(self.lookahead)?;
        if let Some(bad) = self
            .expected_numerals
            .iter()
            .find(|n| !is_article_numeral(n))
        {
            return Err(ConfigError::UnknownNumeral(bad.clone()));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Lookahead wider than [`LOOKAHEAD_WINDOW`] is rejected, never clamped.
pub fn check_lookahead(lookahead: usize) -> ConfigResult<()> {
    if lookahead > LOOKAHEAD_WINDOW {
        return Err(ConfigError::InvalidValue {
            key: "lookahead".to_string(),
            message: format!("must be at most {}", LOOKAHEAD_WINDOW),
        });
    }
    Ok(())
}

/// Split a comma-separated numeral list, dropping empty entries.
pub fn parse_numeral_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_expect_all_forty_two_articles() {
        let config = SegmentConfig::default();
        assert_eq!(config.min_offset, 0);
        assert_eq!(config.lookahead, 4);
        assert_eq!(config.expected_numerals.len(), 42);
        assert_eq!(config.section_pattern, SectionPattern::Labeled);
    }

    #[test]
    fn yaml_overrides_only_what_it_names() {
        let config = SegmentConfig::from_yaml_str("min_offset: 2000\nsection_pattern: bare\n").unwrap();
        assert_eq!(config.min_offset, 2000);
        assert_eq!(config.section_pattern, SectionPattern::Bare);
        assert_eq!(config.expected_numerals.len(), 42);
    }

    #[test]
    fn yaml_file_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "expected_numerals: [I, II, III]").unwrap();
        let config = SegmentConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.expected_numerals, vec!["I", "II", "III"]);
    }

    #[test]
    fn env_takes_precedence_over_yaml() {
        let config = SegmentConfig::from_yaml_str("min_offset: 100\nlookahead: 2\n")
            .unwrap()
            .apply_env_from(env(&[
                (ENV_MIN_OFFSET, "2000"),
                (ENV_EXPECTED_NUMERALS, "I, II ,VII"),
            ]))
            .unwrap();
        assert_eq!(config.min_offset, 2000);
        assert_eq!(config.lookahead, 2);
        assert_eq!(config.expected_numerals, vec!["I", "II", "VII"]);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let err = SegmentConfig::default()
            .apply_env_from(env(&[(ENV_MIN_OFFSET, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = SegmentConfig::default()
            .apply_env_from(env(&[(ENV_SECTION_PATTERN, "numbered")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_SECTION_PATTERN));
    }

    #[test]
    fn unknown_numerals_and_wide_lookahead_fail_validation() {
        let err = SegmentConfig::from_yaml_str("expected_numerals: [I, XLIII]").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNumeral(n) if n == "XLIII"));

        let err = SegmentConfig::from_yaml_str("lookahead: 9").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SegmentConfig::from_yaml_str("min_offset: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
