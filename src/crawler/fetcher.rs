//! HTTP fetcher for the publication API
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent
//! - Building endpoint URLs from the configured base URL
//! - GET requests, with JSON decoding of the three endpoints
//!
//! There is no retry: a failed request is reported once to the caller, which
//! decides whether it is fatal.

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::models::{decode_comment_tree, decode_listing_page, ArticleBody, ArticleRecord, Comment};
use crate::{HarvestError, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Request pacing, including the optional timeout
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use acx_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use acx_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> std::result::Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = crawler.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// Client for the three read-only endpoints of a publication
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    page_size: u32,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api.base_url)?;
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        Ok(Self {
            client,
            base_url,
            page_size: config.api.page_size,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| HarvestError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// `GET /api/v1/archive?sort=new&search=&offset=N&limit=P`
    pub fn listing_url(&self, offset: u64) -> Result<Url> {
        let mut url = self.endpoint(&["api", "v1", "archive"])?;
        url.query_pairs_mut()
            .append_pair("sort", "new")
            .append_pair("search", "")
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    /// `GET /api/v1/post/{id}/comments`, asking for the whole tree
    pub fn comments_url(&self, article_id: i64) -> Result<Url> {
        let id = article_id.to_string();
        let mut url = self.endpoint(&["api", "v1", "post", &id, "comments"])?;
        url.query_pairs_mut()
            .append_pair("token", "")
            .append_pair("all_comments", "true")
            .append_pair("sort", "oldest_first");
        Ok(url)
    }

    /// `GET /api/v1/posts/{slug}`
    pub fn article_url(&self, slug: &str) -> Result<Url> {
        self.endpoint(&["api", "v1", "posts", slug])
    }

    /// Fetches a URL and returns its body
    ///
    /// Connection failures and non-success statuses are both errors.
    async fn get_text(&self, url: Url, accept_json: bool) -> Result<String> {
        tracing::info!("GET {}", url);

        let mut request = self.client.get(url.clone());
        if accept_json {
            request = request.header(ACCEPT, "application/json");
        }

        let http_error = |source: reqwest::Error| HarvestError::Http {
            url: url.to_string(),
            source,
        };

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_error)?;

        response.text().await.map_err(http_error)
    }

    /// Fetches and decodes one archive page
    ///
    /// An empty vector means there are no articles at this offset.
    pub async fn fetch_listing_page(&self, offset: u64) -> Result<Vec<ArticleRecord>> {
        let url = self.listing_url(offset)?;
        let body = self.get_text(url.clone(), false).await?;

        decode_listing_page(&body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetches and decodes the complete comment tree of an article
    pub async fn fetch_comment_tree(&self, article_id: i64) -> Result<Vec<Comment>> {
        let url = self.comments_url(article_id)?;
        let body = self.get_text(url.clone(), false).await?;

        decode_comment_tree(&body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetches an article's detail and decodes its HTML body
    pub async fn fetch_article_body(&self, slug: &str) -> Result<ArticleBody> {
        let url = self.article_url(slug)?;
        let body = self.get_text(url.clone(), true).await?;

        serde_json::from_str(&body).map_err(|source| HarvestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
