pub mod client;
pub mod dump;
pub mod throttle;
pub mod types;

pub use client::{GitHubClient, PullRequestApi};
pub use types::{Author, Comment, PullRequest};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("GitHub API returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode GitHub API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to build HTTP request: {0}")]
    Client(#[source] reqwest::Error),
}

impl PrError {
    pub fn transport(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PrError::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }

    /// Transport failures end the current collection stage; everything else only skips one unit.
    pub fn is_transport(&self) -> bool {
        matches!(self, PrError::Transport { .. } | PrError::Client(_))
    }
}

/// Collect closed pull requests, one listing page at a time, up to `max_pages` pages.
///
/// A page that fails to decode (or comes back with an error status) contributes nothing
/// and the next page is requested. A transport failure stops paging; pages already
/// decoded are kept.
#[instrument(skip(api))]
pub async fn fetch_all_pull_requests<A>(api: &mut A, max_pages: u32) -> Vec<PullRequest>
where
    A: PullRequestApi + ?Sized,
{
    let mut pull_requests = Vec::new();

    for page in 1..=max_pages {
        let body = match api.list_closed_pulls(page).await {
            Ok(body) => body,
            Err(err) if err.is_transport() => {
                error!(page, error = %err, collected = pull_requests.len(), "stopping pagination");
                break;
            }
            Err(err) => {
                warn!(page, error = %err, "skipping page");
                continue;
            }
        };

        match serde_json::from_str::<Vec<PullRequest>>(&body) {
            Ok(decoded) => {
                debug!(page, count = decoded.len(), "decoded page");
                pull_requests.extend(decoded);
            }
            Err(err) => warn!(page, error = %PrError::from(err), "skipping undecodable page"),
        }
    }

    info!(count = pull_requests.len(), "collected pull requests");
    pull_requests
}

/// Fetch the issue comments of a single pull request.
pub async fn fetch_comments<A>(api: &mut A, pr: &PullRequest) -> Result<Vec<Comment>, PrError>
where
    A: PullRequestApi + ?Sized,
{
    let body = api.list_issue_comments(pr.number).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Fill in `comments` for every pull request, in order.
///
/// A PR whose comments cannot be decoded keeps an empty list. A transport
/// failure leaves this PR and all remaining ones without comments.
#[instrument(skip_all, fields(pull_requests = pull_requests.len()))]
pub async fn attach_comments<A>(api: &mut A, pull_requests: &mut [PullRequest])
where
    A: PullRequestApi + ?Sized,
{
    for pr in pull_requests.iter_mut() {
        match fetch_comments(api, pr).await {
            Ok(comments) => {
                debug!(pr = pr.number, count = comments.len(), "fetched comments");
                pr.comments = comments;
            }
            Err(err) if err.is_transport() => {
                error!(pr = pr.number, error = %err, "stopping comment collection");
                break;
            }
            Err(err) => warn!(pr = pr.number, error = %err, "leaving comments empty"),
        }
    }
}
