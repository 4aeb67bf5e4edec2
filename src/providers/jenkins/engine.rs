use std::cmp::Reverse;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{info, warn};

use crate::auth::Credentials;
use crate::error::{PulseError, Result};
use crate::models::{
    Build, BuildHistoryEntry, BuildHistoryReport, BuildSummary, DataSource, JobFetchFailure,
    Pipeline, PipelineDetail, Stage, TriggerResult,
};

use super::client::JenkinsClient;
use super::fallback::FallbackDataProvider;
use super::status::{map_build_result, map_stage_status, map_status, synthesize_stages};
use super::types::{JobDetail, JobSummary, RawBuild};
use super::upstream::UpstreamClient;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on jobs queried per history request, to keep fan-out load on the server bounded.
pub const DEFAULT_HISTORY_JOB_LIMIT: usize = 10;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;

const TRIGGER_MESSAGE: &str = "Build triggered successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub request_timeout: Duration,
    pub history_job_limit: usize,
    pub max_concurrent_requests: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            history_job_limit: DEFAULT_HISTORY_JOB_LIMIT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

/// Fixed at construction. A configured but unreachable server stays `Live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Live,
    Fallback,
}

/// Aggregates Jenkins job and build data into the canonical model.
///
/// Holds only immutable configuration; every call derives a fresh result from the
/// upstream (or the fallback generator) and nothing is cached between calls.
///
/// Failure policy:
/// - listing calls (`list_pipelines`, the inventory step of history) degrade to fallback data
/// - a failed per-job build fetch contributes nothing to history and is reported as a [`JobFetchFailure`]
/// - named-resource calls (pipeline/build detail, trigger) propagate the error unchanged
pub struct AggregationEngine {
    upstream: Option<Arc<dyn UpstreamClient>>,
    fallback: FallbackDataProvider,
    settings: EngineSettings,
}

impl AggregationEngine {
    /// Builds a live engine when credentials are present, otherwise a fallback one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn from_credentials(
        credentials: Option<Credentials>,
        settings: EngineSettings,
    ) -> Result<Self> {
        match credentials {
            Some(credentials) => {
                info!("Using live Jenkins at {}", credentials.base_url);
                let client = JenkinsClient::new(credentials, settings.request_timeout)?;
                Ok(Self::live(Arc::new(client), settings))
            }
            None => {
                warn!("Jenkins credentials not configured, serving fallback data");
                Ok(Self::fallback(settings))
            }
        }
    }

    pub fn live(upstream: Arc<dyn UpstreamClient>, settings: EngineSettings) -> Self {
        Self {
            upstream: Some(upstream),
            fallback: FallbackDataProvider::default(),
            settings,
        }
    }

    pub fn fallback(settings: EngineSettings) -> Self {
        Self {
            upstream: None,
            fallback: FallbackDataProvider::default(),
            settings,
        }
    }

    #[must_use]
    pub fn with_fallback_provider(mut self, fallback: FallbackDataProvider) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn mode(&self) -> EngineMode {
        if self.upstream.is_some() {
            EngineMode::Live
        } else {
            EngineMode::Fallback
        }
    }

    /// Bounds a single upstream call by the configured deadline.
    async fn call<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.settings.request_timeout;
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| PulseError::Timeout(timeout))?
    }

    /// Lists every job with its mapped status and synthesized stages.
    ///
    /// Any upstream failure yields the full fallback list; partial results are never returned.
    pub async fn list_pipelines(&self) -> Vec<Pipeline> {
        let Some(upstream) = &self.upstream else {
            return self.fallback.pipelines();
        };

        info!("Fetching Jenkins job inventory");
        match self.call(upstream.list_jobs()).await {
            Ok(jobs) => jobs.into_iter().map(pipeline_from_summary).collect(),
            Err(e) => {
                warn!("Jenkins inventory fetch failed, serving fallback pipelines: {e}");
                self.fallback.pipelines()
            }
        }
    }

    /// Fetches one job with its description and the actual stages of its last build.
    ///
    /// # Errors
    ///
    /// Propagates `NotFound` and upstream errors; never substitutes fallback data in live mode.
    pub async fn get_pipeline_detail(&self, job_name: &str) -> Result<PipelineDetail> {
        let Some(upstream) = &self.upstream else {
            return Ok(self.fallback.pipeline_detail(job_name));
        };

        info!("Fetching details for job {job_name}");
        let detail = self.call(upstream.get_job_detail(job_name)).await?;
        Ok(pipeline_from_detail(job_name, detail))
    }

    /// Merged history across jobs, newest first, at most `limit` entries.
    pub async fn get_build_history(&self, limit: usize) -> Vec<BuildHistoryEntry> {
        self.build_history_report(limit).await.entries
    }

    /// Like [`Self::get_build_history`], but also reports which jobs could not be read.
    pub async fn build_history_report(&self, limit: usize) -> BuildHistoryReport {
        let Some(upstream) = &self.upstream else {
            return self.fallback_history(limit);
        };

        info!("Collecting build history (limit: {limit})");
        let jobs = match self.call(upstream.list_jobs()).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Jenkins inventory fetch failed, serving fallback history: {e}");
                return self.fallback_history(limit);
            }
        };

        let job_names: Vec<String> = jobs
            .into_iter()
            .take(self.settings.history_job_limit)
            .map(|job| job.name)
            .collect();

        info!("Fetching builds for {} jobs in parallel", job_names.len());

        // `buffered` yields in input order, which keeps the merge deterministic.
        let outcomes: Vec<(String, Result<Vec<RawBuild>>)> = stream::iter(job_names)
            .map(|job_name| async move {
                let builds = self.call(upstream.list_builds(&job_name)).await;
                (job_name, builds)
            })
            .buffered(self.settings.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for (job_name, outcome) in outcomes {
            match outcome {
                Ok(builds) => {
                    entries.extend(builds.into_iter().map(|raw| history_entry(&job_name, raw)));
                }
                Err(e) => {
                    warn!("Failed to get builds for {job_name}: {e}");
                    failures.push(JobFetchFailure {
                        job_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        BuildHistoryReport {
            source: DataSource::Live,
            entries: merge_history(entries, limit),
            failures,
        }
    }

    /// # Errors
    ///
    /// Propagates `NotFound` and upstream errors; never substitutes fallback data in live mode.
    pub async fn get_build_detail(&self, job_name: &str, build_number: u64) -> Result<Build> {
        let Some(upstream) = &self.upstream else {
            return Ok(self.fallback.build_detail(job_name, build_number));
        };

        info!("Fetching build {job_name} #{build_number}");
        let raw = self
            .call(upstream.get_build_detail(job_name, build_number))
            .await?;

        Ok(Build {
            number: build_number,
            ..build_from_raw(job_name, raw)
        })
    }

    /// Queues a build. In fallback mode nothing is contacted.
    ///
    /// A failed token request does not abort the trigger: it proceeds with an empty token.
    ///
    /// # Errors
    ///
    /// Propagates the trigger request's own failure. No retries are made.
    pub async fn trigger_build(&self, job_name: &str) -> Result<TriggerResult> {
        let Some(upstream) = &self.upstream else {
            return Ok(self.fallback.trigger(job_name));
        };

        info!("Triggering build for job {job_name}");
        // TODO: confirm whether servers enforcing CSRF protection reject the empty-token path.
        let token = match self.call(upstream.issue_trigger_token()).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not obtain trigger token, continuing without one: {e}");
                String::new()
            }
        };

        self.call(upstream.trigger_build(job_name, &token)).await?;

        Ok(TriggerResult {
            message: TRIGGER_MESSAGE.to_string(),
            job_name: job_name.to_string(),
        })
    }

    fn fallback_history(&self, limit: usize) -> BuildHistoryReport {
        BuildHistoryReport {
            source: DataSource::Fallback,
            entries: self.fallback.build_history(limit),
            failures: Vec::new(),
        }
    }
}

/// Sorts newest first (missing timestamps count as 0) and truncates to `limit`.
/// The sort is stable, so equal timestamps keep their collection order.
pub(crate) fn merge_history(
    mut entries: Vec<BuildHistoryEntry>,
    limit: usize,
) -> Vec<BuildHistoryEntry> {
    entries.sort_by_key(|entry| Reverse(entry.timestamp.unwrap_or(0)));
    entries.truncate(limit);
    entries
}

fn is_running(raw: &RawBuild) -> bool {
    raw.building || raw.result.is_none()
}

/// Jenkins reports 0 while a build runs; the model leaves it absent instead.
fn finished_duration(raw: &RawBuild) -> Option<u64> {
    if is_running(raw) {
        None
    } else {
        raw.duration
    }
}

fn pipeline_from_summary(job: JobSummary) -> Pipeline {
    let status = map_status(job.color.as_deref());

    Pipeline {
        stages: synthesize_stages(status),
        last_build: job.last_build.map(|raw| BuildSummary {
            number: raw.number,
            result: map_build_result(raw.result.as_deref()),
            timestamp: raw.timestamp,
            duration: finished_duration(&raw),
        }),
        name: job.name,
        url: job.url,
        status,
    }
}

fn pipeline_from_detail(job_name: &str, detail: JobDetail) -> PipelineDetail {
    let name = detail.name.unwrap_or_else(|| job_name.to_string());
    let last_build = detail.last_build.map(|raw| build_from_raw(&name, raw));

    PipelineDetail {
        status: map_status(detail.color.as_deref()),
        stages: last_build
            .as_ref()
            .map(|build| build.stages.clone())
            .unwrap_or_default(),
        last_build,
        name,
        url: detail.url,
        description: detail.description,
    }
}

fn build_from_raw(job_name: &str, raw: RawBuild) -> Build {
    let duration = finished_duration(&raw);

    Build {
        job_name: job_name.to_string(),
        number: raw.number,
        result: map_build_result(raw.result.as_deref()),
        timestamp: raw.timestamp,
        duration,
        stages: raw
            .stages
            .into_iter()
            .map(|stage| Stage {
                status: map_stage_status(stage.status.as_deref()),
                name: stage.name,
            })
            .collect(),
    }
}

fn history_entry(job_name: &str, raw: RawBuild) -> BuildHistoryEntry {
    BuildHistoryEntry {
        job_name: job_name.to_string(),
        number: raw.number,
        result: map_build_result(raw.result.as_deref()),
        timestamp: raw.timestamp,
        duration: finished_duration(&raw),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::models::CanonicalStatus;
    use crate::providers::jenkins::fallback::FALLBACK_TRIGGER_MESSAGE;
    use crate::providers::jenkins::types::RawStage;

    const ANCHOR: i64 = 1_700_000_000_000;

    /// In-memory upstream recording every call it receives.
    #[derive(Default)]
    struct FakeUpstream {
        jobs: Vec<JobSummary>,
        builds_per_job: usize,
        inventory_fails: bool,
        slow_inventory: bool,
        failing_jobs: HashSet<String>,
        slow_jobs: HashSet<String>,
        missing_jobs: HashSet<String>,
        slow_detail: bool,
        token_fails: bool,
        slow_token: bool,
        slow_trigger: bool,
        trigger_fails: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeUpstream {
        fn with_jobs(count: usize, builds_per_job: usize) -> Self {
            let jobs = (1..=count)
                .map(|i| JobSummary {
                    name: format!("job-{i:02}"),
                    color: Some("blue".to_string()),
                    url: format!("http://ci/job/job-{i:02}/"),
                    last_build: Some(raw_build(1, Some("SUCCESS"), Some(1_000))),
                })
                .collect();

            Self {
                jobs,
                builds_per_job,
                ..Self::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_starting_with(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }

        /// Outlasts any deadline the tests configure.
        async fn stall(&self, slow: bool) {
            if slow {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }

        fn unavailable() -> PulseError {
            PulseError::ApiError {
                status: 502,
                message: "bad gateway".to_string(),
            }
        }
    }

    fn short_deadline() -> EngineSettings {
        EngineSettings {
            request_timeout: Duration::from_millis(50),
            ..EngineSettings::default()
        }
    }

    fn raw_build(number: u64, result: Option<&str>, timestamp: Option<i64>) -> RawBuild {
        RawBuild {
            number,
            result: result.map(ToString::to_string),
            timestamp,
            duration: Some(60_000),
            building: false,
            stages: Vec::new(),
        }
    }

    /// Job `job-NN` gets timestamps interleaved with every other job so the merge has to sort.
    fn job_index(job_name: &str) -> i64 {
        job_name.trim_start_matches("job-").parse().unwrap()
    }

    #[async_trait]
    impl UpstreamClient for FakeUpstream {
        async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
            self.record("list_jobs".to_string());
            self.stall(self.slow_inventory).await;
            if self.inventory_fails {
                return Err(Self::unavailable());
            }
            Ok(self.jobs.clone())
        }

        async fn get_job_detail(&self, job_name: &str) -> Result<JobDetail> {
            self.record(format!("get_job_detail:{job_name}"));
            self.stall(self.slow_detail).await;
            if self.missing_jobs.contains(job_name) {
                return Err(PulseError::NotFound(format!("job '{job_name}'")));
            }
            let mut last_build = raw_build(9, Some("FAILURE"), Some(5_000));
            last_build.stages = vec![
                RawStage {
                    name: "Compile".to_string(),
                    status: Some("SUCCESS".to_string()),
                },
                RawStage {
                    name: "Integration".to_string(),
                    status: Some("FAILED".to_string()),
                },
            ];
            Ok(JobDetail {
                name: Some(job_name.to_string()),
                url: format!("http://ci/job/{job_name}/"),
                color: Some("red".to_string()),
                description: Some("Builds the thing".to_string()),
                last_build: Some(last_build),
            })
        }

        async fn list_builds(&self, job_name: &str) -> Result<Vec<RawBuild>> {
            self.record(format!("list_builds:{job_name}"));
            self.stall(self.slow_jobs.contains(job_name)).await;
            if self.failing_jobs.contains(job_name) {
                return Err(Self::unavailable());
            }
            let index = job_index(job_name);
            Ok((0..self.builds_per_job as i64)
                .map(|k| {
                    raw_build(
                        (k + 1) as u64,
                        Some("SUCCESS"),
                        Some(10_000 + k * 100 + index),
                    )
                })
                .collect())
        }

        async fn get_build_detail(&self, job_name: &str, build_number: u64) -> Result<RawBuild> {
            self.record(format!("get_build_detail:{job_name}:{build_number}"));
            self.stall(self.slow_detail).await;
            if self.missing_jobs.contains(job_name) {
                return Err(PulseError::NotFound(format!("build '{job_name}' #{build_number}")));
            }
            Err(Self::unavailable())
        }

        async fn issue_trigger_token(&self) -> Result<String> {
            self.record("issue_trigger_token".to_string());
            self.stall(self.slow_token).await;
            if self.token_fails {
                return Err(Self::unavailable());
            }
            Ok("crumb-1".to_string())
        }

        async fn trigger_build(&self, job_name: &str, token: &str) -> Result<()> {
            self.record(format!("trigger_build:{job_name}:{token}"));
            self.stall(self.slow_trigger).await;
            if self.trigger_fails {
                return Err(Self::unavailable());
            }
            Ok(())
        }
    }

    fn live_engine(upstream: &Arc<FakeUpstream>) -> AggregationEngine {
        live_engine_with(upstream, EngineSettings::default())
    }

    fn live_engine_with(upstream: &Arc<FakeUpstream>, settings: EngineSettings) -> AggregationEngine {
        AggregationEngine::live(Arc::clone(upstream) as Arc<dyn UpstreamClient>, settings)
            .with_fallback_provider(FallbackDataProvider::anchored_at(ANCHOR))
    }

    fn fallback_engine() -> AggregationEngine {
        AggregationEngine::fallback(EngineSettings::default())
            .with_fallback_provider(FallbackDataProvider::anchored_at(ANCHOR))
    }

    fn entry(job_name: &str, timestamp: Option<i64>) -> BuildHistoryEntry {
        BuildHistoryEntry {
            job_name: job_name.to_string(),
            number: 1,
            result: Some(CanonicalStatus::Success),
            timestamp,
            duration: Some(1),
        }
    }

    /// Collects every object key path so two values can be compared by shape alone.
    fn shape(value: &Value) -> BTreeSet<String> {
        fn walk(value: &Value, prefix: &str, out: &mut BTreeSet<String>) {
            match value {
                Value::Object(map) => {
                    for (key, child) in map {
                        let path = format!("{prefix}.{key}");
                        out.insert(path.clone());
                        walk(child, &path, out);
                    }
                }
                Value::Array(items) => {
                    if let Some(first) = items.first() {
                        walk(first, &format!("{prefix}[]"), out);
                    }
                }
                _ => {}
            }
        }

        let mut out = BTreeSet::new();
        walk(value, "", &mut out);
        out
    }

    #[cfg(test)]
    mod merge_history {
        use super::*;

        #[test]
        fn sorts_newest_first_and_truncates() {
            let merged = merge_history(
                vec![entry("a", Some(1)), entry("b", Some(3)), entry("c", Some(2))],
                2,
            );

            let names: Vec<_> = merged.iter().map(|e| e.job_name.as_str()).collect();
            assert_eq!(names, ["b", "c"]);
        }

        #[test]
        fn missing_timestamps_sort_last() {
            let merged = merge_history(vec![entry("none", None), entry("old", Some(1))], 10);
            assert_eq!(merged[0].job_name, "old");
            assert_eq!(merged[1].job_name, "none");
        }

        #[test]
        fn ties_keep_collection_order() {
            let merged = merge_history(
                vec![entry("first", Some(5)), entry("second", Some(5)), entry("third", Some(5))],
                10,
            );

            let names: Vec<_> = merged.iter().map(|e| e.job_name.as_str()).collect();
            assert_eq!(names, ["first", "second", "third"]);
        }

        #[test]
        fn zero_limit_returns_nothing() {
            assert!(merge_history(vec![entry("a", Some(1))], 0).is_empty());
        }
    }

    #[tokio::test]
    async fn list_pipelines_normalises_inventory() {
        let mut upstream = FakeUpstream::with_jobs(1, 0);
        upstream.jobs[0].color = Some("blue_anime".to_string());
        upstream.jobs[0].last_build = Some(RawBuild {
            duration: Some(0),
            ..raw_build(8, None, Some(42))
        });
        let upstream = Arc::new(upstream);

        let pipelines = live_engine(&upstream).list_pipelines().await;

        assert_eq!(pipelines.len(), 1);
        let pipeline = &pipelines[0];
        assert_eq!(pipeline.status, CanonicalStatus::Running);
        assert_eq!(pipeline.stages.len(), 4);
        assert!(pipeline
            .stages
            .iter()
            .all(|s| s.status == CanonicalStatus::Running));
        let last_build = pipeline.last_build.as_ref().unwrap();
        assert_eq!(last_build.result, None);
        assert_eq!(last_build.duration, None);
    }

    #[tokio::test]
    async fn list_pipelines_degrades_to_fallback_on_inventory_failure() {
        let upstream = Arc::new(FakeUpstream {
            inventory_fails: true,
            ..FakeUpstream::with_jobs(3, 0)
        });
        let engine = live_engine(&upstream);

        let pipelines = engine.list_pipelines().await;

        assert_eq!(
            pipelines,
            FallbackDataProvider::anchored_at(ANCHOR).pipelines()
        );
        assert_eq!(engine.mode(), EngineMode::Live);
    }

    #[tokio::test]
    async fn list_pipelines_degrades_to_fallback_on_inventory_timeout() {
        let upstream = Arc::new(FakeUpstream {
            slow_inventory: true,
            ..FakeUpstream::with_jobs(3, 0)
        });

        let pipelines = live_engine_with(&upstream, short_deadline())
            .list_pipelines()
            .await;

        assert_eq!(
            pipelines,
            FallbackDataProvider::anchored_at(ANCHOR).pipelines()
        );
    }

    #[tokio::test]
    async fn list_pipelines_treats_building_flag_as_running() {
        let mut upstream = FakeUpstream::with_jobs(1, 0);
        upstream.jobs[0].last_build = Some(RawBuild {
            building: true,
            duration: Some(0),
            ..raw_build(8, Some("FAILURE"), Some(42))
        });
        let upstream = Arc::new(upstream);

        let pipelines = live_engine(&upstream).list_pipelines().await;

        let last_build = pipelines[0].last_build.as_ref().unwrap();
        assert_eq!(last_build.result, Some(CanonicalStatus::Failure));
        assert_eq!(last_build.duration, None);
    }

    #[tokio::test]
    async fn history_tolerates_per_job_failures_and_caps_fan_out() {
        let upstream = Arc::new(FakeUpstream {
            failing_jobs: ["job-03", "job-07"].map(String::from).into(),
            ..FakeUpstream::with_jobs(12, 5)
        });

        let report = live_engine(&upstream).build_history_report(50).await;

        assert_eq!(report.source, DataSource::Live);
        assert_eq!(report.entries.len(), 40);
        assert_eq!(upstream.calls_starting_with("list_builds:"), 10);
        assert_eq!(upstream.calls_starting_with("list_jobs"), 1);

        let excluded = ["job-03", "job-07", "job-11", "job-12"];
        assert!(report
            .entries
            .iter()
            .all(|e| !excluded.contains(&e.job_name.as_str())));

        assert!(report
            .entries
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));

        let failed: Vec<_> = report.failures.iter().map(|f| f.job_name.as_str()).collect();
        assert_eq!(failed, ["job-03", "job-07"]);
    }

    #[tokio::test]
    async fn history_truncates_to_limit_keeping_newest() {
        let upstream = Arc::new(FakeUpstream::with_jobs(4, 5));

        let history = live_engine(&upstream).get_build_history(3).await;

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].timestamp, Some(10_404));
        assert_eq!(history[0].job_name, "job-04");
        assert_eq!(history[2].job_name, "job-02");
    }

    #[tokio::test]
    async fn history_falls_back_only_when_inventory_fails() {
        let upstream = Arc::new(FakeUpstream {
            inventory_fails: true,
            ..FakeUpstream::with_jobs(2, 5)
        });

        let report = live_engine(&upstream).build_history_report(50).await;

        assert_eq!(report.source, DataSource::Fallback);
        assert_eq!(report.entries.len(), 20);
        assert_eq!(upstream.calls_starting_with("list_builds:"), 0);
    }

    #[tokio::test]
    async fn history_with_every_job_failing_is_empty_not_fallback() {
        let upstream = Arc::new(FakeUpstream {
            failing_jobs: ["job-01", "job-02"].map(String::from).into(),
            ..FakeUpstream::with_jobs(2, 5)
        });

        let report = live_engine(&upstream).build_history_report(50).await;

        assert_eq!(report.source, DataSource::Live);
        assert!(report.entries.is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn slow_job_times_out_without_sinking_history() {
        let upstream = Arc::new(FakeUpstream {
            slow_jobs: ["job-02"].map(String::from).into(),
            ..FakeUpstream::with_jobs(3, 2)
        });

        let report = live_engine_with(&upstream, short_deadline())
            .build_history_report(50)
            .await;

        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].job_name, "job-02");
        assert!(report.failures[0].error.contains("timed out"));
    }

    #[tokio::test]
    async fn history_honours_custom_job_limit() {
        let upstream = Arc::new(FakeUpstream::with_jobs(6, 1));
        let settings = EngineSettings {
            history_job_limit: 2,
            max_concurrent_requests: 1,
            ..EngineSettings::default()
        };

        let history = live_engine_with(&upstream, settings)
            .get_build_history(50)
            .await;

        assert_eq!(history.len(), 2);
        assert_eq!(upstream.calls_starting_with("list_builds:"), 2);
    }

    #[tokio::test]
    async fn pipeline_detail_propagates_not_found() {
        let upstream = Arc::new(FakeUpstream {
            missing_jobs: ["nonexistent"].map(String::from).into(),
            ..FakeUpstream::default()
        });

        let err = live_engine(&upstream)
            .get_pipeline_detail("nonexistent")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn pipeline_detail_uses_actual_stages() {
        let upstream = Arc::new(FakeUpstream::default());

        let detail = live_engine(&upstream)
            .get_pipeline_detail("api")
            .await
            .unwrap();

        assert_eq!(detail.status, CanonicalStatus::Failure);
        assert_eq!(detail.description.as_deref(), Some("Builds the thing"));
        let stages: Vec<_> = detail
            .stages
            .iter()
            .map(|s| (s.name.as_str(), s.status))
            .collect();
        assert_eq!(
            stages,
            [
                ("Compile", CanonicalStatus::Success),
                ("Integration", CanonicalStatus::Failure)
            ]
        );
        let build = detail.last_build.unwrap();
        assert_eq!(build.job_name, "api");
        assert_eq!(build.stages, detail.stages);
    }

    #[test]
    fn pipeline_detail_without_last_build_has_no_stages() {
        let detail = pipeline_from_detail(
            "fresh",
            JobDetail {
                name: None,
                url: "http://ci/job/fresh/".to_string(),
                color: Some("notbuilt".to_string()),
                description: None,
                last_build: None,
            },
        );

        assert_eq!(detail.name, "fresh");
        assert_eq!(detail.status, CanonicalStatus::NotBuilt);
        assert!(detail.stages.is_empty());
        assert!(detail.last_build.is_none());
    }

    #[tokio::test]
    async fn pipeline_detail_timeout_is_an_upstream_error() {
        let upstream = Arc::new(FakeUpstream {
            slow_detail: true,
            ..FakeUpstream::default()
        });

        let err = live_engine_with(&upstream, short_deadline())
            .get_pipeline_detail("api")
            .await
            .unwrap_err();

        assert!(matches!(err, PulseError::Timeout(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn build_detail_timeout_is_an_upstream_error() {
        let upstream = Arc::new(FakeUpstream {
            slow_detail: true,
            ..FakeUpstream::default()
        });

        let err = live_engine_with(&upstream, short_deadline())
            .get_build_detail("api", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, PulseError::Timeout(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn build_detail_errors_are_not_masked() {
        let upstream = Arc::new(FakeUpstream::default());

        let err = live_engine(&upstream)
            .get_build_detail("api", 3)
            .await
            .unwrap_err();

        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn trigger_fetches_token_then_triggers() {
        let upstream = Arc::new(FakeUpstream::default());

        let result = live_engine(&upstream).trigger_build("api").await.unwrap();

        assert_eq!(result.message, "Build triggered successfully");
        assert_eq!(
            upstream.calls(),
            ["issue_trigger_token", "trigger_build:api:crumb-1"]
        );
    }

    #[tokio::test]
    async fn trigger_proceeds_with_empty_token_when_issuer_fails() {
        let upstream = Arc::new(FakeUpstream {
            token_fails: true,
            ..FakeUpstream::default()
        });

        let result = live_engine(&upstream).trigger_build("api").await;

        assert!(result.is_ok());
        assert_eq!(upstream.calls()[1], "trigger_build:api:");
    }

    #[tokio::test]
    async fn trigger_proceeds_with_empty_token_when_issuer_times_out() {
        let upstream = Arc::new(FakeUpstream {
            slow_token: true,
            ..FakeUpstream::default()
        });

        let result = live_engine_with(&upstream, short_deadline())
            .trigger_build("api")
            .await;

        assert!(result.is_ok());
        assert_eq!(
            upstream.calls(),
            ["issue_trigger_token", "trigger_build:api:"]
        );
    }

    #[tokio::test]
    async fn trigger_timeout_is_an_upstream_error() {
        let upstream = Arc::new(FakeUpstream {
            slow_trigger: true,
            ..FakeUpstream::default()
        });

        let err = live_engine_with(&upstream, short_deadline())
            .trigger_build("api")
            .await
            .unwrap_err();

        assert!(matches!(err, PulseError::Timeout(_)));
        assert!(err.is_upstream());
        assert_eq!(upstream.calls_starting_with("trigger_build:"), 1);
    }

    #[tokio::test]
    async fn trigger_failure_is_propagated_without_retry() {
        let upstream = Arc::new(FakeUpstream {
            trigger_fails: true,
            ..FakeUpstream::default()
        });

        let result = live_engine(&upstream).trigger_build("api").await;

        assert!(result.unwrap_err().is_upstream());
        assert_eq!(upstream.calls_starting_with("trigger_build:"), 1);
    }

    #[tokio::test]
    async fn fallback_trigger_acknowledges_any_job_name() {
        let engine = fallback_engine();

        for job_name in ["api", "release/2.0 #hotfix?x=1&y", ""] {
            let result = engine.trigger_build(job_name).await.unwrap();
            assert_eq!(result.message, FALLBACK_TRIGGER_MESSAGE);
            assert_eq!(result.job_name, job_name);
        }
        assert_eq!(engine.mode(), EngineMode::Fallback);
    }

    #[tokio::test]
    async fn fallback_engine_serves_every_operation() {
        let engine = fallback_engine();
        let provider = FallbackDataProvider::anchored_at(ANCHOR);

        assert_eq!(engine.list_pipelines().await, provider.pipelines());
        assert_eq!(engine.get_build_history(50).await, provider.build_history(50));
        assert_eq!(
            engine.get_pipeline_detail("x").await.unwrap(),
            provider.pipeline_detail("x")
        );
        assert_eq!(
            engine.get_build_detail("x", 4).await.unwrap(),
            provider.build_detail("x", 4)
        );
    }

    #[tokio::test]
    async fn fallback_output_is_shape_identical_to_live() {
        let upstream = Arc::new(FakeUpstream::with_jobs(2, 2));
        let live = live_engine(&upstream);
        let fallback = fallback_engine();

        let pairs = [
            (
                serde_json::to_value(live.list_pipelines().await).unwrap(),
                serde_json::to_value(fallback.list_pipelines().await).unwrap(),
            ),
            (
                serde_json::to_value(live.get_build_history(10).await).unwrap(),
                serde_json::to_value(fallback.get_build_history(10).await).unwrap(),
            ),
            (
                serde_json::to_value(live.get_pipeline_detail("api").await.unwrap()).unwrap(),
                serde_json::to_value(fallback.get_pipeline_detail("api").await.unwrap())
                    .unwrap(),
            ),
            (
                serde_json::to_value(live.trigger_build("api").await.unwrap()).unwrap(),
                serde_json::to_value(fallback.trigger_build("api").await.unwrap()).unwrap(),
            ),
        ];

        for (live_value, fallback_value) in pairs {
            assert_eq!(shape(&live_value), shape(&fallback_value));
        }
    }

    #[tokio::test]
    async fn unconfigured_engine_makes_no_network_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let post_mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let config = crate::config::JenkinsConfig {
            url: Some(server.url()),
            user: Some("user".to_string()),
            token: None,
            ..crate::config::JenkinsConfig::default()
        };
        let engine =
            AggregationEngine::from_credentials(config.credentials(), config.engine_settings())
                .unwrap();

        assert_eq!(engine.mode(), EngineMode::Fallback);
        engine.list_pipelines().await;
        engine.get_build_history(10).await;
        engine.get_pipeline_detail("api").await.unwrap();
        engine.get_build_detail("api", 1).await.unwrap();
        engine.trigger_build("api").await.unwrap();

        mock.assert_async().await;
        post_mock.assert_async().await;
    }
}
