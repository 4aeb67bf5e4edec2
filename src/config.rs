use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, Token};
use crate::providers::jenkins::{
    EngineSettings, DEFAULT_HISTORY_JOB_LIMIT, DEFAULT_MAX_CONCURRENT_REQUESTS,
};

/// Configuration file structure for jenkins-pulse.
///
/// Loaded from the current directory or a path given on the command line.
/// Environment variables and CLI flags override individual values afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL, e.g. <https://ci.example.com>
    pub url: Option<String>,

    pub user: Option<String>,

    /// API token for `user`
    pub token: Option<String>,

    /// Deadline for each upstream request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of jobs queried when assembling build history
    #[serde(default = "default_history_job_limit")]
    pub history_job_limit: usize,

    /// Maximum number of per-job requests in flight during history collection
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            history_job_limit: default_history_job_limit(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_history_job_limit() -> usize {
    DEFAULT_HISTORY_JOB_LIMIT
}

fn default_max_concurrent_requests() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl JenkinsConfig {
    /// Returns credentials only when url, user and token are all set and non-empty.
    /// Anything less selects fallback mode.
    pub fn credentials(&self) -> Option<Credentials> {
        let base_url = non_empty(self.url.as_ref())?;
        let username = non_empty(self.user.as_ref())?;
        let token = non_empty(self.token.as_ref())?;

        Some(Credentials {
            base_url: base_url.to_string(),
            username: username.to_string(),
            token: Token::from(token),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            request_timeout: Duration::from_secs(self.timeout_secs),
            history_job_limit: self.history_job_limit,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }

    /// Applies values that take precedence over the file (environment or CLI).
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        user: Option<String>,
        token: Option<String>,
    ) {
        if url.is_some() {
            self.url = url;
        }
        if user.is_some() {
            self.user = user;
        }
        if token.is_some() {
            self.token = token;
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./jenkins-pulse.toml
    /// 3. ./jenkins-pulse.json
    /// 4. ./jenkins-pulse.yaml
    /// 5. ./jenkins-pulse.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "jenkins-pulse.toml",
            "jenkins-pulse.json",
            "jenkins-pulse.yaml",
            "jenkins-pulse.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
