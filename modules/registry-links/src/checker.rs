use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use registry_common::LinkCheck;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = "modern-slavery-registry/0.1 (statement link check)";

// --- PageFetcher trait ---

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return where it ended up after redirects. Any transport
    /// error, timeout or non-2xx status is an `Err`.
    async fn fetch(&self, url: &Url) -> Result<Url>;
}

// --- reqwest fetcher ---

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build link-check HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Url> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;

        Ok(resp.url().clone())
    }
}

// --- Normalizer ---

/// Checks that a statement URL is live, preferring HTTPS.
///
/// The submitted URL is tried with its scheme forced to `https`, then once
/// more forced to `http`. The first success wins and its final URL is kept.
/// When both fail, or the URL cannot be parsed, the submitted text is kept
/// and marked broken.
pub struct UrlNormalizer<F = HttpFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> UrlNormalizer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn check(&self, submitted: &str) -> LinkCheck {
        let Some(candidate) = parse_candidate(submitted) else {
            debug!(url = submitted, "Statement URL is not parseable");
            return LinkCheck::broken(submitted);
        };

        for scheme in ["https", "http"] {
            let Some(attempt) = with_scheme(&candidate, scheme) else {
                debug!(url = submitted, scheme, "Statement URL scheme cannot be switched");
                return LinkCheck::broken(submitted);
            };

            match self.fetcher.fetch(&attempt).await {
                Ok(final_url) => return LinkCheck::reachable(final_url.to_string()),
                Err(e) => debug!(url = %attempt, error = %e, "Statement URL fetch failed"),
            }
        }

        LinkCheck::broken(submitted)
    }
}

/// Parse a submitted URL. A bare host like `cucumber.io/statement` is read as
/// if it carried `http://`.
pub fn parse_candidate(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}")).ok(),
        Err(_) => None,
    }
}

fn with_scheme(url: &Url, scheme: &str) -> Option<Url> {
    let mut url = url.clone();
    url.set_scheme(scheme).ok()?;
    Some(url)
}
