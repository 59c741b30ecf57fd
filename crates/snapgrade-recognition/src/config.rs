//! Configuration and recognizer factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use snapgrade_core::engine::GradingEngineConfig;
use snapgrade_core::model::DEFAULT_PASSING_SCORE;
use snapgrade_core::templates::DEFAULT_TEMPLATE_ID;
use snapgrade_core::traits::RecognitionService;

use crate::backend::{BackendRecognizer, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::demo::DemoRecognizer;

/// Environment variable that forces the HTTP backend at the given URL.
pub const BACKEND_URL_ENV: &str = "SNAPGRADE_BACKEND_URL";

/// Which recognition service to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecognizerConfig {
    Demo {
        #[serde(default)]
        seed: Option<u64>,
    },
    Backend {
        #[serde(default = "default_backend_url")]
        base_url: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig::Demo { seed: None }
    }
}

fn default_backend_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level snapgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapgradeConfig {
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    /// Root of the JSON repository.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Passing score for tests that do not set one.
    #[serde(default = "default_passing_score")]
    pub default_passing_score: u32,
    /// Template for tests that do not name one.
    #[serde(default = "default_template")]
    pub default_template: String,
    /// Max retries on transient recognition errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent recognition requests.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./snapgrade-data")
}
fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}
fn default_template() -> String {
    DEFAULT_TEMPLATE_ID.to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}

impl Default for SnapgradeConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerConfig::default(),
            data_dir: default_data_dir(),
            default_passing_score: default_passing_score(),
            default_template: default_template(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
        }
    }
}

impl SnapgradeConfig {
    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> GradingEngineConfig {
        GradingEngineConfig {
            parallelism: self.parallelism.max(1),
            max_retries_per_sheet: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `snapgrade.toml` in the current directory
/// 2. `~/.config/snapgrade/config.toml`
///
/// `SNAPGRADE_BACKEND_URL` switches the recognizer to the HTTP backend.
pub fn load_config() -> Result<SnapgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SnapgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("snapgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SnapgradeConfig::default(),
    };

    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        if !url.is_empty() {
            apply_backend_override(&mut config, url);
        }
    }

    Ok(config)
}

/// Parse a config document and expand `${VAR}` references.
pub fn parse_config(content: &str) -> Result<SnapgradeConfig> {
    let mut config: SnapgradeConfig = toml::from_str(content)?;

    if let RecognizerConfig::Backend { base_url, .. } = &mut config.recognizer {
        *base_url = resolve_env_vars(base_url);
    }
    let data_dir = resolve_env_vars(&config.data_dir.to_string_lossy());
    config.data_dir = PathBuf::from(data_dir);

    Ok(config)
}

fn apply_backend_override(config: &mut SnapgradeConfig, url: String) {
    match &mut config.recognizer {
        RecognizerConfig::Backend { base_url, .. } => *base_url = url,
        RecognizerConfig::Demo { .. } => {
            config.recognizer = RecognizerConfig::Backend {
                base_url: url,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("snapgrade"))
}

/// Create a recognition service from its configuration.
pub fn create_recognizer(config: &RecognizerConfig) -> Result<Arc<dyn RecognitionService>> {
    match config {
        RecognizerConfig::Demo { seed } => Ok(Arc::new(match seed {
            Some(seed) => DemoRecognizer::with_seed(*seed),
            None => DemoRecognizer::new(),
        })),
        RecognizerConfig::Backend {
            base_url,
            timeout_secs,
        } => Ok(Arc::new(BackendRecognizer::new(base_url, *timeout_secs)?)),
    }
}
