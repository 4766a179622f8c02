//! Configuration loader and validator for the group membership sync.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest page the listing endpoints will return.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Largest number of usernames `addUsers` accepts in one call.
pub const MAX_BATCH_SIZE: usize = 25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub portal: Portal,
    pub policy: Policy,
    pub sync: Run,
}

/// Remote portal settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Portal {
    pub base_url: String,
    pub token_expiration_minutes: u32,
    pub page_size: u32,
    pub batch_size: usize,
}

impl Default for Portal {
    fn default() -> Self {
        Self {
            base_url: "https://governmentofbc.maps.arcgis.com/sharing/rest/".into(),
            token_expiration_minutes: 60,
            page_size: MAX_PAGE_SIZE,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Which organization accounts are eligible for the group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Policy {
    pub account_marker: String,
    pub email_domain: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            account_marker: "_governmentofbc".into(),
            email_domain: "@gov.bc.ca".into(),
        }
    }
}

/// Run-level defaults, overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Run {
    pub default_username: String,
    pub default_group: String,
    pub output_dir: String,
    pub mode: SyncMode,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            default_username: "Province.Of.British.Columbia".into(),
            default_group: "23fe22d4f7c54475958319baecbd5b28".into(),
            output_dir: ".".into(),
            mode: SyncMode::DryRun,
        }
    }
}

/// Whether a run only reports the delta or also adds the users.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    #[default]
    DryRun,
    Apply,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::DryRun => "dry-run",
            SyncMode::Apply => "apply",
        }
    }
}

impl Config {
    /// Ensure the report output directory exists.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.sync.output_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.sync.output_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.portal.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("portal.base_url must be non-empty"));
    }
    if cfg.portal.token_expiration_minutes == 0 {
        return Err(ConfigError::Invalid("portal.token_expiration_minutes must be > 0"));
    }
    if cfg.portal.page_size == 0 || cfg.portal.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid("portal.page_size must be between 1 and 100"));
    }
    if cfg.portal.batch_size == 0 || cfg.portal.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Invalid("portal.batch_size must be between 1 and 25"));
    }

    if cfg.policy.account_marker.trim().is_empty() {
        return Err(ConfigError::Invalid("policy.account_marker must be non-empty"));
    }
    if cfg.policy.email_domain.trim().is_empty() {
        return Err(ConfigError::Invalid("policy.email_domain must be non-empty"));
    }

    if cfg.sync.output_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("sync.output_dir must be non-empty"));
    }

    Ok(())
}

/// Returns an example YAML document with every setting spelled out.
pub fn example() -> &'static str {
    r#"portal:
  base_url: "https://governmentofbc.maps.arcgis.com/sharing/rest/"
  token_expiration_minutes: 60
  page_size: 100
  batch_size: 25

policy:
  account_marker: "_governmentofbc"
  email_domain: "@gov.bc.ca"

sync:
  default_username: "Province.Of.British.Columbia"
  default_group: "23fe22d4f7c54475958319baecbd5b28"
  output_dir: "./reports"
  mode: dry-run
"#
}
