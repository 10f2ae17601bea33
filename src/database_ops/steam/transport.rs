use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const APPLIST_URL: &str = "https://api.steampowered.com/IStoreService/GetAppList/v1/";
pub const APPDETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";
pub const APPREVIEWS_URL: &str = "https://store.steampowered.com/appreviews/";
pub const STEAMSPY_URL: &str = "https://steamspy.com/api.php";

/// Which upstream capability a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AppList,
    AppDetails,
    AppReviews,
    OwnerStats,
}

#[derive(Debug, Clone)]
pub struct SteamRequest {
    pub endpoint: Endpoint,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

impl SteamRequest {
    pub fn new(endpoint: Endpoint, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint,
            url: url.into(),
            query: Vec::new(),
            timeout,
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    /// Value of a query parameter, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("non-success status {0}")]
    Status(u16),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

/// One GET returning a JSON body. Implementations do not retry.
#[async_trait]
pub trait SteamTransport: Send + Sync {
    async fn get_json(&self, request: &SteamRequest) -> Result<Value, FetchError>;
}

/// reqwest-backed transport; the timeout comes from each request.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("steam-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SteamTransport for HttpTransport {
    async fn get_json(&self, request: &SteamRequest) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(&request.url)
            .header("Accept", "application/json")
            .query(&request.query)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
