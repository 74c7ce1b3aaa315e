//! Async client for the statistics service.

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::ExplorerError;
use crate::query::ExplorerQuery;
use crate::retry::compute_retry_delay;
use crate::stats::ExplorerResult;

/// Public endpoint for games played on lichess.
pub const DEFAULT_BASE_URL: &str = "https://explorer.lichess.ovh/lichess";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for move statistics. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    base: Url,
}

impl ExplorerClient {
    pub fn new(base_url: &str) -> Result<Self, ExplorerError> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("sparring/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ExplorerClient { http, base })
    }

    /// Full request URL for `query`.
    pub fn url_for(&self, query: &ExplorerQuery) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().clear().extend_pairs(query.params());
        url
    }

    /// Issue one request. Non-success statuses become [`ExplorerError::Status`].
    pub async fn fetch(&self, query: &ExplorerQuery) -> Result<ExplorerResult, ExplorerError> {
        let url = self.url_for(query);
        debug!(%url, "explorer request");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::Status {
                status: status.as_u16(),
            });
        }
        let result: ExplorerResult = response.json().await?;
        debug!(
            games = result.total_games(),
            moves = result.moves.len(),
            "explorer response"
        );
        Ok(result)
    }

    /// Fetch, retrying failed attempts after [`compute_retry_delay`].
    ///
    /// Gives up after `max_attempts` attempts (at least one is always made)
    /// and returns the last error.
    pub async fn fetch_with_retry(
        &self,
        query: &ExplorerQuery,
        max_attempts: u32,
    ) -> Result<ExplorerResult, ExplorerError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch(query).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt >= max_attempts => {
                    warn!(attempt, error = %e, "explorer request failed, giving up");
                    return Err(e);
                }
                Err(e) => {
                    let delay = compute_retry_delay(attempt, e.status());
                    info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "explorer request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
