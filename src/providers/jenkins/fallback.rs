use chrono::Utc;

use crate::models::{
    Build, BuildHistoryEntry, BuildSummary, CanonicalStatus, Pipeline, PipelineDetail,
    TriggerResult,
};

use super::status::synthesize_stages;

const FALLBACK_BASE_URL: &str = "http://jenkins.example.com";

const PIPELINE_NAMES: [&str; 5] = [
    "frontend-deploy",
    "backend-api",
    "database-migration",
    "integration-tests",
    "production-release",
];

const PIPELINE_STATUSES: [CanonicalStatus; 4] = [
    CanonicalStatus::Success,
    CanonicalStatus::Failure,
    CanonicalStatus::Running,
    CanonicalStatus::Unstable,
];

const HISTORY_JOB_NAMES: [&str; 4] = [
    "frontend-deploy",
    "backend-api",
    "database-migration",
    "integration-tests",
];

const HISTORY_RESULTS: [CanonicalStatus; 4] = [
    CanonicalStatus::Success,
    CanonicalStatus::Failure,
    CanonicalStatus::Unstable,
    CanonicalStatus::Success,
];

const MAX_HISTORY_ENTRIES: usize = 20;
const HISTORY_BASE_NUMBER: u64 = 100;
const PIPELINE_BASE_NUMBER: u64 = 42;
const HOUR_MS: i64 = 3_600_000;
const HALF_HOUR_MS: i64 = 1_800_000;
const MINUTE_MS: u64 = 60_000;

pub const FALLBACK_TRIGGER_MESSAGE: &str = "Mock build triggered";

/// Deterministic stand-in data, shaped exactly like live aggregation output.
///
/// All timestamps are offsets from `anchor_ms`, fixed when the provider is created,
/// so repeated calls on the same provider return identical data.
#[derive(Debug, Clone, Copy)]
pub struct FallbackDataProvider {
    anchor_ms: i64,
}

impl Default for FallbackDataProvider {
    fn default() -> Self {
        Self::anchored_at(Utc::now().timestamp_millis())
    }
}

impl FallbackDataProvider {
    pub fn anchored_at(anchor_ms: i64) -> Self {
        Self { anchor_ms }
    }

    pub fn pipelines(&self) -> Vec<Pipeline> {
        PIPELINE_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let status = PIPELINE_STATUSES[index % PIPELINE_STATUSES.len()];
                let running = status == CanonicalStatus::Running;
                let offset = index as u64;

                Pipeline {
                    name: (*name).to_string(),
                    url: format!("{FALLBACK_BASE_URL}/job/{name}/"),
                    status,
                    stages: synthesize_stages(status),
                    last_build: Some(BuildSummary {
                        number: PIPELINE_BASE_NUMBER + offset,
                        result: (!running).then_some(status),
                        timestamp: Some(self.anchor_ms - index as i64 * HOUR_MS),
                        duration: (!running).then_some((5 + offset) * MINUTE_MS),
                    }),
                }
            })
            .collect()
    }

    pub fn pipeline_detail(&self, job_name: &str) -> PipelineDetail {
        PipelineDetail {
            name: job_name.to_string(),
            url: format!("{FALLBACK_BASE_URL}/job/{job_name}/"),
            status: CanonicalStatus::Success,
            stages: synthesize_stages(CanonicalStatus::Success),
            description: Some(format!("Mock pipeline for {job_name}")),
            last_build: Some(self.build_detail(job_name, PIPELINE_BASE_NUMBER)),
        }
    }

    pub fn build_history(&self, limit: usize) -> Vec<BuildHistoryEntry> {
        (0..limit.min(MAX_HISTORY_ENTRIES))
            .map(|i| BuildHistoryEntry {
                job_name: HISTORY_JOB_NAMES[i % HISTORY_JOB_NAMES.len()].to_string(),
                number: HISTORY_BASE_NUMBER - i as u64,
                result: Some(HISTORY_RESULTS[i % HISTORY_RESULTS.len()]),
                timestamp: Some(self.anchor_ms - i as i64 * HALF_HOUR_MS),
                duration: Some((5 + (i as u64 % 10)) * MINUTE_MS),
            })
            .collect()
    }

    pub fn build_detail(&self, job_name: &str, build_number: u64) -> Build {
        Build {
            job_name: job_name.to_string(),
            number: build_number,
            result: Some(CanonicalStatus::Success),
            timestamp: Some(self.anchor_ms),
            duration: Some(5 * MINUTE_MS),
            stages: synthesize_stages(CanonicalStatus::Success),
        }
    }

    pub fn trigger(&self, job_name: &str) -> TriggerResult {
        TriggerResult {
            message: FALLBACK_TRIGGER_MESSAGE.to_string(),
            job_name: job_name.to_string(),
        }
    }
}
