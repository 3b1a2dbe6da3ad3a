//! Store configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use verlog_diff::DEFAULT_MIN_TOKEN_LEN;

use crate::error::{StoreError, StoreResult};

/// Field name under which a value carries its own versioning record.
pub const DEFAULT_LABEL: &str = "versioning";

/// Configuration for a [`HistoryStore`](crate::HistoryStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Reserved field name used for embedded records.
    pub label: String,
    /// Minimum token length for the diff engine, in chars.
    pub min_token_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    ///
    /// ```toml
    /// label = "history"
    /// min_token_len = 4
    /// ```
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.label.is_empty() {
            return Err(StoreError::InvalidConfig("label must not be empty".into()));
        }
        if self.min_token_len == 0 {
            return Err(StoreError::InvalidConfig(
                "min_token_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.label, "versioning");
        assert_eq!(c.min_token_len, 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn toml_overrides() {
        let c = StoreConfig::from_toml_str("label = \"_history\"\nmin_token_len = 5\n").unwrap();
        assert_eq!(c.label, "_history");
        assert_eq!(c.min_token_len, 5);
    }

    #[test]
    fn toml_partial_keeps_defaults() {
        let c = StoreConfig::from_toml_str("min_token_len = 4").unwrap();
        assert_eq!(c.label, DEFAULT_LABEL);
        assert_eq!(c.min_token_len, 4);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            StoreConfig::from_toml_str("label = \"\""),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("min_token_len = 0"),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("min_token_len = \"three\""),
            Err(StoreError::InvalidConfig(_))
        ));
    }
}
