use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::rules::policy::Policy;
use crate::store::FreshnessPolicy;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".crxaudit.toml";

/// Top-level configuration from `.crxaudit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where analysis results are kept and how long they stay fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    /// Rows in the stats "most findings" table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".crxaudit/results")
}

fn default_max_age_hours() -> i64 {
    24
}

fn default_top_n() -> usize {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            max_age_hours: default_max_age_hours(),
            top_n: default_top_n(),
        }
    }
}

impl StoreConfig {
    pub fn freshness(&self) -> FreshnessPolicy {
        FreshnessPolicy::with_max_age_hours(self.max_age_hours)
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.store.max_age_hours < 0 {
            return Err(AuditError::Config(format!(
                "store.max_age_hours must not be negative (got {})",
                config.store.max_age_hours
            )));
        }
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# crxaudit configuration

[policy]
# Minimum verdict to fail the scan (minimal, low, medium, high, critical).
fail_on = "high"

# Rule IDs to ignore entirely.
# ignore_rules = ["CRX-006"]

# Per-rule severity overrides.
# [policy.overrides]
# "CRX-004" = "low"

[store]
dir = ".crxaudit/results"
# Forced rescans reuse results younger than this.
max_age_hours = 24
top_n = 5
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.policy.fail_on, Severity::High);
        assert_eq!(config.store.dir, PathBuf::from(".crxaudit/results"));
        assert_eq!(config.store.max_age_hours, 24);
        assert_eq!(config.store.top_n, 5);
    }

    #[test]
    fn starter_toml_parses() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.policy.fail_on, Severity::High);
        assert!(config.policy.ignore_rules.is_empty());
        assert_eq!(config.store.top_n, 5);
    }

    #[test]
    fn partial_store_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[store]\nmax_age_hours = 6\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.max_age_hours, 6);
        assert_eq!(config.store.top_n, 5);
        assert_eq!(config.store.freshness(), FreshnessPolicy::with_max_age_hours(6));
    }

    #[test]
    fn negative_age_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[store]\nmax_age_hours = -1\n").unwrap();
        assert!(matches!(Config::load(&path), Err(AuditError::Config(_))));
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[policy\n").unwrap();
        assert!(matches!(Config::load(&path), Err(AuditError::Toml(_))));
    }
}
