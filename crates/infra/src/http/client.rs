use std::time::Duration;

use permsys_domain::{constants, ApiError, ApiResult, ConfigError, ETag, ProviderConfig};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use tracing::{debug, instrument};

use crate::errors::InfraError;

/// Header carrying the API version on every request.
pub const API_VERSION_HEADER: &str = "X-API-Version";

const JSON: &str = "application/json";

/// Status, headers and fully drained body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Drained body text
    pub body: String,
    /// `ETag` response header; empty when the server sent none
    pub etag: ETag,
}

impl RawResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Authenticated transport to the control plane.
///
/// Never interprets status codes. Transport failures (connect, DNS, TLS,
/// timeout) surface as `Transient`.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    token: String,
    api_version: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl HttpClient {
    /// Start building a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(base_url)
    }

    /// Validate `config` and build a client from it.
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        config.validate().map_err(InfraError::from)?;
        Self::builder(&config.host)
            .token(&config.token)
            .api_version(&config.api_version)
            .timeout(config.timeout())
            .build()
    }

    /// Base URL every path is joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Send one request and drain the response body.
    #[instrument(level = "debug", skip(self, body, headers))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: &[(&str, String)],
    ) -> ApiResult<RawResponse> {
        let url = self.url(path);

        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(API_VERSION_HEADER, &self.api_version)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(InfraError::from)?;
            request = request.body(encoded);
        }

        let response = request.send().await.map_err(InfraError::from)?;
        let status = response.status();
        let headers = response.headers().clone();
        let etag = headers
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(ETag::new)
            .unwrap_or_default();
        let body = response.text().await.map_err(InfraError::from)?;

        debug!(%status, etag = etag.as_str(), bytes = body.len(), "received HTTP response");
        Ok(RawResponse { status, headers, body, etag })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    token: String,
    api_version: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: String::new(),
            api_version: constants::DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }

    /// Bearer token for the `Authorization` header.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Value of the `X-API-Version` header.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Custom `User-Agent`.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Validate the base URL and build the client.
    pub fn build(self) -> ApiResult<HttpClient> {
        let base_url = self.base_url.trim().to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ApiError::from(InfraError::from(ConfigError::Invalid {
                field: "host",
                message: e.to_string(),
            }))
        })?;

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(InfraError::from)?;

        Ok(HttpClient { client, base_url, token: self.token, api_version: self.api_version })
    }
}

/// Join `base` and `path` with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
