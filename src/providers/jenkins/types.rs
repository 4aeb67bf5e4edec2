//! Raw Jenkins JSON API payloads.
//!
//! These mirror the `tree=` projections requested by the client and are normalised
//! into [`crate::models`] by the engine.

use serde::Deserialize;

/// Top-level `/api/json` response listing the job inventory.
#[derive(Debug, Deserialize)]
pub struct JobInventory {
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub name: String,
    /// Ball colour, e.g. `blue`, `red_anime`. Absent for folders and never-built jobs.
    pub color: Option<String>,
    #[serde(default)]
    pub url: String,
    pub last_build: Option<RawBuild>,
}

/// `/job/{name}/api/json` with description and last build stages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub name: Option<String>,
    #[serde(default)]
    pub url: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub last_build: Option<RawBuild>,
}

/// `/job/{name}/api/json?tree=builds[...]`
#[derive(Debug, Deserialize)]
pub struct BuildList {
    #[serde(default)]
    pub builds: Vec<RawBuild>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawBuild {
    #[serde(default)]
    pub number: u64,
    /// `null` while the build is still running.
    pub result: Option<String>,
    pub timestamp: Option<i64>,
    pub duration: Option<u64>,
    /// Requested in every `tree=` projection; `true` while the build runs.
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub stages: Vec<RawStage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawStage {
    pub name: String,
    pub status: Option<String>,
}

/// `/crumbIssuer/api/json`
#[derive(Debug, Deserialize)]
pub struct Crumb {
    pub crumb: String,
}
