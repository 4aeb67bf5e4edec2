use async_trait::async_trait;

use crate::error::Result;

use super::types::{JobDetail, JobSummary, RawBuild};

/// The narrow query surface the aggregation engine needs from a CI server.
///
/// Implementations perform exactly one upstream request per call and never retry.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Full job inventory with colour and last-build summary.
    async fn list_jobs(&self) -> Result<Vec<JobSummary>>;

    /// Description and last build (with actual stages) for one job.
    async fn get_job_detail(&self, job_name: &str) -> Result<JobDetail>;

    /// All retained builds for one job.
    async fn list_builds(&self, job_name: &str) -> Result<Vec<RawBuild>>;

    async fn get_build_detail(&self, job_name: &str, build_number: u64) -> Result<RawBuild>;

    /// Anti-forgery token required by some servers for state-changing requests.
    async fn issue_trigger_token(&self) -> Result<String>;

    /// Queues a build. An empty `token` means none is sent.
    async fn trigger_build(&self, job_name: &str, token: &str) -> Result<()>;
}
