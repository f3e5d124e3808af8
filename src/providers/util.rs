use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by all providers.
///
/// Every request made through it is bounded by `timeout` so a hung source
/// cannot stall a refresh cycle.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GETs `url` and decodes a JSON body, failing on non-success statuses.
///
/// `what` names the thing being fetched in error messages.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    what: &str,
) -> Result<T> {
    debug!("Requesting {} from {}", what, redact(url));
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Request error for {}: {}", what, e.without_url()))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
    }

    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body for {what}"))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", what, e))
}

/// Appends form-encoded query parameters to `url`, so tickers such as
/// `M&M.NS` reach the source intact.
pub fn with_query(url: &str, params: &[(&str, &str)]) -> Result<String> {
    reqwest::Url::parse_with_params(url, params)
        .map(String::from)
        .with_context(|| format!("Invalid URL: {url}"))
}

/// Strips the query string so API keys never reach the logs.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
