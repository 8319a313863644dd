use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

use super::dump::{self, DumpFile};
use super::throttle::Throttle;
use super::PrError;
use crate::config::{Config, Repository};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = "pr-digest";

/// The two reads the collectors need. Both return the raw response body;
/// decoding is left to the caller so a bad payload can be told apart from a dead connection.
#[async_trait]
pub trait PullRequestApi: Send {
    /// One page of closed pull requests.
    async fn list_closed_pulls(&mut self, page: u32) -> Result<String, PrError>;

    /// All issue comments of a pull request.
    async fn list_issue_comments(&mut self, number: u64) -> Result<String, PrError>;
}

/// Throttled, dumping GitHub REST client.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repository: Repository,
    per_page: u32,
    throttle: Throttle,
    pr_dump: DumpFile,
    comment_dump: DumpFile,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self, PrError> {
        let throttle = Throttle::new(config.settings.request_delay());
        Self::with_throttle(config, throttle)
    }

    pub fn with_throttle(config: &Config, throttle: Throttle) -> Result<Self, PrError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(PrError::Client)?;

        Ok(Self {
            http,
            api_url: config.settings.api_url.trim_end_matches('/').to_string(),
            token: config.credentials.token.clone(),
            repository: config.repository.clone(),
            per_page: config.settings.per_page,
            throttle,
            pr_dump: DumpFile::new(&config.settings.pr_dump_path),
            comment_dump: DumpFile::new(&config.settings.comment_dump_path),
        })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_url, self.repository.owner, self.repository.name
        )
    }

    /// Throttle, send, dump both directions, and hand back the body of a 2xx response.
    async fn get(&mut self, url: String, dump_kind: DumpKind) -> Result<String, PrError> {
        self.throttle.wait().await;

        let request = self
            .http
            .get(&url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .bearer_auth(&self.token)
            .build()
            .map_err(PrError::Client)?;

        let dump_file = match dump_kind {
            DumpKind::PullRequests => &self.pr_dump,
            DumpKind::Comments => &self.comment_dump,
        };
        dump_file.append(&dump::format_request(&request));

        debug!(%url, "sending request");
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| PrError::transport(&url, err))?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|err| PrError::transport(&url, err))?;
        debug!(%url, %status, body_bytes = body.len(), "received response");

        dump_file.append(&dump::format_response(version, status, &headers, &body));

        if !status.is_success() {
            return Err(PrError::Status { url, status });
        }
        Ok(body)
    }
}

#[derive(Clone, Copy)]
enum DumpKind {
    PullRequests,
    Comments,
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn list_closed_pulls(&mut self, page: u32) -> Result<String, PrError> {
        let url = format!(
            "{}/pulls?state=closed&per_page={}&page={}",
            self.repo_url(),
            self.per_page,
            page
        );
        self.get(url, DumpKind::PullRequests).await
    }

    async fn list_issue_comments(&mut self, number: u64) -> Result<String, PrError> {
        let url = format!("{}/issues/{}/comments", self.repo_url(), number);
        self.get(url, DumpKind::Comments).await
    }
}
