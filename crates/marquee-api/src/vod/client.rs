use std::time::Duration;

use marquee_core::config::{RetryConfig, VodSite};
use reqwest::Client;
use url::Url;

use super::error::VodError;
use super::types::VodListResponse;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::traits::{VodCatalog, VodItem};

/// Client for one `provide/vod` aggregator endpoint.
pub struct VodClient {
    title: String,
    base: Url,
    http: Client,
    retry: RetryPolicy,
}

impl VodClient {
    pub fn new(title: impl Into<String>, url: &str) -> Result<Self, VodError> {
        let base = Url::parse(url).map_err(|source| VodError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            title: title.into(),
            base,
            http: Client::new(),
            retry: RetryPolicy::default(),
        })
    }

    /// Build a client for a configured site with the shared timeout and retry settings.
    pub fn from_site(site: &VodSite, retry: &RetryConfig) -> Result<Self, VodError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(retry.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            retry: RetryPolicy::from(retry),
            ..Self::new(site.title.clone(), &site.url)?
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The detail-search URL for `term`.
    pub fn search_url(&self, term: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ac", "detail")
            .append_pair("wd", term);
        url
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, VodError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(VodError::Api {
                status,
                message: body,
            })
        }
    }
}

impl VodCatalog for VodClient {
    type Error = VodError;

    fn site_title(&self) -> &str {
        &self.title
    }

    async fn search(&self, term: &str) -> Result<Vec<VodItem>, VodError> {
        let url = self.search_url(term);
        let resp = send_with_retry(&self.retry, || self.http.get(url.clone())).await?;
        let resp = Self::check_response(resp).await?;

        // Several sites answer with `text/html`, so decode the body ourselves.
        let body = resp.text().await?;
        let list: VodListResponse =
            serde_json::from_str(&body).map_err(|e| VodError::Parse(e.to_string()))?;

        if !list.is_success() {
            tracing::debug!(site = %self.title, term, msg = ?list.msg, "VOD site returned no data");
            return Ok(Vec::new());
        }
        Ok(list.into_items())
    }
}
