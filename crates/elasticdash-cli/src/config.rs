//! Runner configuration
//!
//! Loaded from `elasticdash.toml` (or a JSON file, chosen by extension), then
//! overridden by `ELASTICDASH_*` environment variables.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use elasticdash_core::JudgeDefaults;

use crate::reporter::ReportFormat;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "elasticdash.toml";

/// Test file pattern used when none is configured
pub const DEFAULT_TEST_MATCH: &str = "**/*.ai_test.rs";

/// Judge defaults applied to matchers that do not pick a provider or model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl From<&JudgeConfig> for JudgeDefaults {
    fn from(config: &JudgeConfig) -> Self {
        JudgeDefaults {
            provider: config.provider.clone(),
            model: config.model.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Glob patterns selecting the registered test files to run
    pub test_match: Vec<String>,
    pub judge: JudgeConfig,
    pub test_timeout_ms: Option<u64>,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    pub report_format: ReportFormat,
    /// Install the LLM traffic interceptor before running
    pub intercept: bool,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            test_match: vec![DEFAULT_TEST_MATCH.to_string()],
            judge: JudgeConfig::default(),
            test_timeout_ms: None,
            log_level: "warn".to_string(),
            report_format: ReportFormat::Table,
            intercept: true,
        }
    }
}

impl DashConfig {
    pub fn test_timeout(&self) -> Option<Duration> {
        self.test_timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration for a run
    ///
    /// An explicit path must exist; the default file is optional. Environment
    /// overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                load_from_file(path)?
            }
            None => load_from_file(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `ELASTICDASH_*` overrides read through `lookup`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(patterns) = lookup("ELASTICDASH_TEST_MATCH") {
            let patterns: Vec<String> = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !patterns.is_empty() {
                self.test_match = patterns;
            }
        }
        if let Some(provider) = lookup("ELASTICDASH_JUDGE_PROVIDER") {
            self.judge.provider = Some(provider);
        }
        if let Some(model) = lookup("ELASTICDASH_JUDGE_MODEL") {
            self.judge.model = Some(model);
        }
        if let Some(timeout) = lookup("ELASTICDASH_TEST_TIMEOUT_MS") {
            let millis = timeout.trim().parse::<u64>().with_context(|| {
                format!("Invalid ELASTICDASH_TEST_TIMEOUT_MS value '{}'", timeout)
            })?;
            self.test_timeout_ms = Some(millis);
        }
        if let Some(level) = lookup("ELASTICDASH_LOG") {
            self.log_level = level;
        }
        Ok(())
    }
}

/// Load configuration from a file
///
/// TOML for `.toml`, JSON otherwise. Returns the defaults if the file doesn't exist.
pub fn load_from_file(path: &Path) -> Result<DashConfig> {
    if !path.exists() {
        return Ok(DashConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config '{}'", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config '{}'", path.display()))?,
    };
    Ok(config)
}
