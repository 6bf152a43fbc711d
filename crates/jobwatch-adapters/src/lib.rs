//! Job-board client contract + the Arbeitsagentur job-search implementation.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use jobwatch_core::extract::extract_listings;
use jobwatch_core::{DetailRecord, ListingRecord};
use jobwatch_storage::{FetchError, FetchedResponse, HttpClientConfig, HttpFetcher, TtlCache};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

pub const CRATE_NAME: &str = "jobwatch-adapters";

pub const SEARCH_PATH: &str = "/pc/v4/app/jobs";
pub const MAX_ERROR_EXCERPT_CHARS: usize = 400;
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DETAIL_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Work-arrangement filter understood by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkArrangement {
    HomeOffice,
}

impl WorkArrangement {
    pub fn code(&self) -> &'static str {
        match self {
            WorkArrangement::HomeOffice => "ho",
        }
    }
}

/// Full parameter tuple of one search call. Doubles as the memo key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub api_key: String,
    pub location: String,
    pub radius_km: u32,
    pub query: String,
    pub max_age_days: u32,
    pub page_size: u32,
    pub page: u32,
    pub work_arrangement: Option<WorkArrangement>,
}

impl SearchRequest {
    /// Query string for the search endpoint. A blank free-text query is omitted.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("angebotsart", "1".to_string()),
            ("page", self.page.to_string()),
            ("pav", "false".to_string()),
            ("size", self.page_size.to_string()),
            ("umkreis", self.radius_km.to_string()),
            ("aktualitaet", self.max_age_days.to_string()),
            ("wo", self.location.clone()),
        ];
        if !self.query.trim().is_empty() {
            params.push(("was", self.query.clone()));
        }
        if let Some(arrangement) = self.work_arrangement {
            params.push(("arbeitszeit", arrangement.code().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Details,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Search => f.write_str("Search"),
            Endpoint::Details => f.write_str("Details"),
        }
    }
}

/// Failure of a single search or detail call.
///
/// `Status` and `Transport` are separate paths: the first is an answer from
/// the API, the second means no answer arrived.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint} HTTP {status}: {excerpt}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        excerpt: String,
    },
    #[error("{endpoint} request error: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: FetchError,
    },
    #[error("{endpoint}: response was not valid JSON ({message})")]
    Decode { endpoint: Endpoint, message: String },
}

impl ApiError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            ApiError::Status { endpoint, .. }
            | ApiError::Transport { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => *endpoint,
        }
    }
}

/// First `max_chars` characters of a response body.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

fn expect_ok_json(endpoint: Endpoint, resp: FetchedResponse) -> Result<JsonValue, ApiError> {
    if !resp.is_ok() {
        debug!(url = %resp.final_url, status = %resp.status, "non-success response");
        return Err(ApiError::Status {
            endpoint,
            status: resp.status.as_u16(),
            excerpt: body_excerpt(&resp.text(), MAX_ERROR_EXCERPT_CHARS),
        });
    }
    serde_json::from_slice(&resp.body).map_err(|err| ApiError::Decode {
        endpoint,
        message: err.to_string(),
    })
}

#[async_trait]
pub trait JobBoard: Send + Sync {
    fn board_id(&self) -> &'static str;

    /// Root that relative detail links are resolved against.
    fn api_base(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<ListingRecord>, ApiError>;

    async fn fetch_detail(&self, api_key: &str, url: &str) -> Result<DetailRecord, ApiError>;
}

/// Bundesagentur für Arbeit job-search API.
#[derive(Debug, Clone)]
pub struct ArbeitsagenturBoard {
    api_base: String,
    http: HttpFetcher,
}

impl ArbeitsagenturBoard {
    pub fn new(api_base: impl Into<String>, http_config: HttpClientConfig) -> Result<Self> {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Ok(Self {
            api_base,
            http: HttpFetcher::new(http_config)?,
        })
    }

    pub fn search_url(&self) -> String {
        format!("{}{}", self.api_base, SEARCH_PATH)
    }
}

#[async_trait]
impl JobBoard for ArbeitsagenturBoard {
    fn board_id(&self) -> &'static str {
        "arbeitsagentur"
    }

    fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<ListingRecord>, ApiError> {
        let resp = self
            .http
            .get(&self.search_url(), &request.query_params(), &request.api_key)
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: Endpoint::Search,
                source,
            })?;
        let body = expect_ok_json(Endpoint::Search, resp)?;
        Ok(extract_listings(&body))
    }

    async fn fetch_detail(&self, api_key: &str, url: &str) -> Result<DetailRecord, ApiError> {
        let resp = self
            .http
            .get(url, &[], api_key)
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: Endpoint::Details,
                source,
            })?;
        match expect_ok_json(Endpoint::Details, resp)? {
            JsonValue::Object(fields) => Ok(DetailRecord::new(fields)),
            other => Err(ApiError::Decode {
                endpoint: Endpoint::Details,
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Memoizing decorator: successful results are reused for a bounded
/// freshness window keyed by the full call parameters. Errors are never cached.
pub struct CachedJobBoard {
    inner: Box<dyn JobBoard>,
    searches: TtlCache<SearchRequest, Vec<ListingRecord>>,
    details: TtlCache<(String, String), DetailRecord>,
}

impl CachedJobBoard {
    pub fn new(inner: Box<dyn JobBoard>) -> Self {
        Self::with_ttls(inner, SEARCH_CACHE_TTL, DETAIL_CACHE_TTL)
    }

    pub fn with_ttls(inner: Box<dyn JobBoard>, search_ttl: Duration, detail_ttl: Duration) -> Self {
        Self {
            inner,
            searches: TtlCache::new(search_ttl),
            details: TtlCache::new(detail_ttl),
        }
    }
}

#[async_trait]
impl JobBoard for CachedJobBoard {
    fn board_id(&self) -> &'static str {
        self.inner.board_id()
    }

    fn api_base(&self) -> &str {
        self.inner.api_base()
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<ListingRecord>, ApiError> {
        if let Some(hit) = self.searches.get(request).await {
            debug!(location = %request.location, radius_km = request.radius_km, "search cache hit");
            return Ok(hit);
        }
        let items = self.inner.search(request).await?;
        self.searches.insert(request.clone(), items.clone()).await;
        let entries = self.searches.len().await;
        debug!(entries, "search cached");
        Ok(items)
    }

    async fn fetch_detail(&self, api_key: &str, url: &str) -> Result<DetailRecord, ApiError> {
        let key = (api_key.to_string(), url.to_string());
        if let Some(hit) = self.details.get(&key).await {
            debug!(url, "detail cache hit");
            return Ok(hit);
        }
        let detail = self.inner.fetch_detail(api_key, url).await?;
        self.details.insert(key, detail.clone()).await;
        let entries = self.details.len().await;
        debug!(entries, "detail cached");
        Ok(detail)
    }
}

impl CachedJobBoard {
    /// Entries currently held as `(searches, details)`.
    pub async fn cached_counts(&self) -> (usize, usize) {
        (self.searches.len().await, self.details.len().await)
    }
}
