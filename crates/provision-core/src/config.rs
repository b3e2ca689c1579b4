use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Page under which databases and the summary page are created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page_id: Option<String>,
}

fn default_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            parent_page_id: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// PacingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_database_interval")]
    pub database_interval_ms: u64,
    #[serde(default = "default_record_interval")]
    pub record_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
}

fn default_database_interval() -> u64 {
    1000
}

fn default_record_interval() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_backoff_max() -> u64 {
    30_000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            database_interval_ms: default_database_interval(),
            record_interval_ms: default_record_interval(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
        }
    }
}

impl PacingConfig {
    /// No waits at all. Used by tests and dry runs against mocks.
    pub fn immediate() -> Self {
        Self {
            database_interval_ms: 0,
            record_interval_ms: 0,
            max_retries: default_max_retries(),
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// DeploymentConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Global override for the sample-data phase. `Some(false)` skips it
    /// even when the build package carries seed records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<bool>,
    #[serde(default = "default_max_records")]
    pub max_records_per_resource: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
}

fn default_max_records() -> usize {
    5
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            sample_data: None,
            max_records_per_resource: default_max_records(),
            region: None,
            custom_domain: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

impl Config {
    /// Load `.provision/config.yaml`; a missing file means all defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("api.base_url '{}' is not an http(s) url", self.api.base_url),
            });
        }

        if self.api.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "api.timeout_secs must be greater than zero".to_string(),
            });
        }

        if self.pacing.database_interval_ms == 0 || self.pacing.record_interval_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "a pacing interval is zero; deployments may hit the platform rate limit"
                    .to_string(),
            });
        }

        if self.pacing.max_retries > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "pacing.max_retries={} (>10 is unusual)",
                    self.pacing.max_retries
                ),
            });
        }

        if self.pacing.backoff_max_ms < self.pacing.backoff_base_ms {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "pacing.backoff_max_ms is below pacing.backoff_base_ms".to_string(),
            });
        }

        if self.deployment.max_records_per_resource == 0
            && self.deployment.sample_data != Some(false)
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "deployment.max_records_per_resource is 0; no sample records will be created"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
