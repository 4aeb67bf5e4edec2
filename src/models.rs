use serde::{Deserialize, Serialize};

/// The fixed status vocabulary every upstream encoding is normalised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Success,
    Failure,
    Unstable,
    Running,
    Aborted,
    NotBuilt,
    Unknown,
}

impl CanonicalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Running => "RUNNING",
            Self::Aborted => "ABORTED",
            Self::NotBuilt => "NOT_BUILT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub name: String,
    pub status: CanonicalStatus,
}

/// Last-build summary attached to a pipeline in the inventory view.
///
/// `result` is `None` while the build is still running, and so is `duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub number: u64,
    pub result: Option<CanonicalStatus>,
    pub timestamp: Option<i64>,
    pub duration: Option<u64>,
}

/// A job as seen from the inventory endpoint. `stages` is synthesized here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub name: String,
    pub url: String,
    pub status: CanonicalStatus,
    pub stages: Vec<Stage>,
    pub last_build: Option<BuildSummary>,
}

/// A job as seen from the per-job detail endpoint.
///
/// Same fields as [`Pipeline`] plus `description`; `stages` are the upstream's own,
/// taken from the last build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDetail {
    pub name: String,
    pub url: String,
    pub status: CanonicalStatus,
    pub stages: Vec<Stage>,
    pub description: Option<String>,
    pub last_build: Option<Build>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub job_name: String,
    pub number: u64,
    pub result: Option<CanonicalStatus>,
    pub timestamp: Option<i64>,
    pub duration: Option<u64>,
    pub stages: Vec<Stage>,
}

/// One row of the merged cross-job history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildHistoryEntry {
    pub job_name: String,
    pub number: u64,
    pub result: Option<CanonicalStatus>,
    pub timestamp: Option<i64>,
    pub duration: Option<u64>,
}

/// A job whose build list could not be fetched during history collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFetchFailure {
    pub job_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildHistoryReport {
    pub source: DataSource,
    pub entries: Vec<BuildHistoryEntry>,
    pub failures: Vec<JobFetchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResult {
    pub message: String,
    pub job_name: String,
}
