use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credentials;
use crate::error::{PulseError, Result};

use super::types::{BuildList, Crumb, JobDetail, JobInventory, JobSummary, RawBuild};
use super::upstream::UpstreamClient;

const INVENTORY_TREE: &str = "jobs[name,color,url,lastBuild[number,result,timestamp,duration,building]]";
const JOB_DETAIL_TREE: &str = "name,url,color,description,\
lastBuild[number,result,timestamp,duration,building,stages[name,status]]";
const BUILD_LIST_TREE: &str = "builds[number,result,timestamp,duration,building]";
const BUILD_DETAIL_TREE: &str = "number,result,timestamp,duration,building,stages[name,status]";
const CRUMB_HEADER: &str = "Jenkins-Crumb";

/// HTTP client for the Jenkins JSON API.
pub struct JenkinsClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl JenkinsClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jenkins-pulse/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&credentials.base_url)
            .map_err(|e| PulseError::Config(format!("Invalid base URL: {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(PulseError::Config(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(
            &self.credentials.username,
            Some(self.credentials.token.as_str()),
        )
    }

    /// Appends percent-encoded path segments (and an optional `tree` projection) to the base URL.
    fn endpoint(&self, segments: &[&str], tree: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some(tree) = tree {
            url.query_pairs_mut().append_pair("tree", tree);
        }
        url
    }

    async fn get_json<T>(&self, url: Url, resource: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        let body = Self::read_success_body(response, resource).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn read_success_body(response: Response, resource: &str) -> Result<String> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(PulseError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PulseError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl UpstreamClient for JenkinsClient {
    async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let url = self.endpoint(&["api", "json"], Some(INVENTORY_TREE));
        let inventory: JobInventory = self.get_json(url, "job inventory").await?;
        Ok(inventory.jobs)
    }

    async fn get_job_detail(&self, job_name: &str) -> Result<JobDetail> {
        let url = self.endpoint(&["job", job_name, "api", "json"], Some(JOB_DETAIL_TREE));
        self.get_json(url, &format!("job '{job_name}'")).await
    }

    async fn list_builds(&self, job_name: &str) -> Result<Vec<RawBuild>> {
        let url = self.endpoint(&["job", job_name, "api", "json"], Some(BUILD_LIST_TREE));
        let list: BuildList = self.get_json(url, &format!("job '{job_name}'")).await?;
        Ok(list.builds)
    }

    async fn get_build_detail(&self, job_name: &str, build_number: u64) -> Result<RawBuild> {
        let number = build_number.to_string();
        let url = self.endpoint(
            &["job", job_name, &number, "api", "json"],
            Some(BUILD_DETAIL_TREE),
        );
        self.get_json(url, &format!("build '{job_name}' #{build_number}"))
            .await
    }

    async fn issue_trigger_token(&self) -> Result<String> {
        let url = self.endpoint(&["crumbIssuer", "api", "json"], None);
        let crumb: Crumb = self.get_json(url, "crumb issuer").await?;
        Ok(crumb.crumb)
    }

    async fn trigger_build(&self, job_name: &str, token: &str) -> Result<()> {
        let url = self.endpoint(&["job", job_name, "build"], None);
        debug!("POST {url}");

        let mut request = self.auth_request(self.client.post(url));
        if !token.is_empty() {
            request = request.header(CRUMB_HEADER, token);
        }

        let response = request.send().await?;
        Self::read_success_body(response, &format!("job '{job_name}'")).await?;
        Ok(())
    }
}
