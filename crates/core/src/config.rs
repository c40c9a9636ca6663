//! QuickCreate configuration
//!
//! Allocation and search limits, loadable from a JSON file. Every field has
//! a default, so a partial file (or none) is valid.

use crate::code::{DEFAULT_CODE_LENGTH, MAX_SUFFIX};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the allocator, search and product quick-create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickCreateConfig {
    // === Codes ===
    /// Code length assumed when dot notation is expanded without an exercise
    #[serde(default = "default_code_length")]
    pub default_code_length: usize,

    /// Highest suffix tried under one parent account
    #[serde(default = "default_max_suffix")]
    pub max_suffix: u32,

    /// Extra attempts when another writer takes the allocated code first
    #[serde(default = "default_allocation_retries")]
    pub allocation_retries: u32,

    // === Search ===
    /// Total results returned by a search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Results taken from the code-prefix match before filling by description
    #[serde(default = "default_search_code_limit")]
    pub search_code_limit: u32,

    // === Products ===
    /// Tax code preselected in the product form
    #[serde(default)]
    pub default_tax: Option<String>,
}

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

fn default_max_suffix() -> u32 {
    MAX_SUFFIX
}

fn default_allocation_retries() -> u32 {
    3
}

fn default_search_limit() -> u32 {
    20
}

fn default_search_code_limit() -> u32 {
    15
}

impl Default for QuickCreateConfig {
    fn default() -> Self {
        Self {
            default_code_length: default_code_length(),
            max_suffix: default_max_suffix(),
            allocation_retries: default_allocation_retries(),
            search_limit: default_search_limit(),
            search_code_limit: default_search_code_limit(),
            default_tax: None,
        }
    }
}

impl QuickCreateConfig {
    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.default_code_length == 0 {
            return Err(CoreError::Config(
                "default_code_length must be positive".to_string(),
            ));
        }
        if self.max_suffix == 0 {
            return Err(CoreError::Config("max_suffix must be positive".to_string()));
        }
        if self.search_limit == 0 {
            return Err(CoreError::Config("search_limit must be positive".to_string()));
        }
        if self.search_code_limit > self.search_limit {
            return Err(CoreError::Config(format!(
                "search_code_limit ({}) exceeds search_limit ({})",
                self.search_code_limit, self.search_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = QuickCreateConfig::default();

        assert_eq!(config.default_code_length, 10);
        assert_eq!(config.max_suffix, 999);
        assert_eq!(config.allocation_retries, 3);
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.search_code_limit, 15);
        assert_eq!(config.default_tax, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "search_limit": 30, "default_tax": "IVA21" }"#;
        let config: QuickCreateConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.search_limit, 30);
        assert_eq!(config.default_tax.as_deref(), Some("IVA21"));
        assert_eq!(config.search_code_limit, 15); // default
    }

    #[test]
    fn test_config_validation() {
        let config = QuickCreateConfig {
            search_code_limit: 25,
            ..QuickCreateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = QuickCreateConfig {
            max_suffix: 0,
            ..QuickCreateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_suffix": 99 }}"#).unwrap();

        let config = QuickCreateConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_suffix, 99);

        let config = QuickCreateConfig::load(None).unwrap();
        assert_eq!(config.max_suffix, 999);
    }

    #[test]
    fn test_config_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = QuickCreateConfig::from_file(file.path()).unwrap_err();
        assert!(err.is_config_error());
    }
}
