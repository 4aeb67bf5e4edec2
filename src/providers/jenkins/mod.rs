mod client;
mod engine;
mod fallback;
mod status;
mod types;
mod upstream;

pub use client::JenkinsClient;
pub use engine::{
    AggregationEngine, EngineMode, EngineSettings, DEFAULT_HISTORY_JOB_LIMIT,
    DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT,
};
pub use fallback::FallbackDataProvider;
pub use status::{map_build_result, map_stage_status, map_status, synthesize_stages};
pub use types::{JobDetail, JobSummary, RawBuild, RawStage};
pub use upstream::UpstreamClient;
