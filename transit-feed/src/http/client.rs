//! Upstream HTTP client configuration and transport.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};

use super::error::HttpError;

/// Default long-polling endpoint of the upstream real-time backend.
pub const DEFAULT_POLLING_URL: &str = "https://czynaczas.pl/socket.io/?EIO=4&transport=polling";

/// Default `Origin` header value.
const DEFAULT_ORIGIN: &str = "https://czynaczas.pl";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// Pause between joining a channel and polling it.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Configuration shared by every upstream call.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Long-polling endpoint, including the protocol query string
    pub polling_url: String,
    pub origin: String,
    pub user_agent: String,
    /// Session cookie copied from a browser, if the upstream requires one
    pub cookie: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Wait after the join before the first poll
    pub settle_delay: Duration,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            polling_url: DEFAULT_POLLING_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Set a custom polling endpoint (for testing or a mirror).
    pub fn with_polling_url(mut self, url: impl Into<String>) -> Self {
        self.polling_url = url.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.cookie = (!cookie.is_empty()).then_some(cookie);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Parse the configured polling endpoint.
    pub fn polling_url(&self) -> Result<Url, HttpError> {
        Url::parse(&self.polling_url).map_err(|e| HttpError::InvalidUrl {
            url: self.polling_url.clone(),
            message: e.to_string(),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Header values sent with every request for one network.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdentity<'a> {
    pub user_agent: &'a str,
    pub origin: &'a str,
    pub referer: &'a str,
    pub cookie: Option<&'a str>,
}

impl RequestIdentity<'_> {
    /// Build the header map: `User-Agent`, `Origin`, `Referer`, `Accept` and
    /// optionally `Cookie`.
    pub fn headers(&self) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("User-Agent", self.user_agent)?);
        headers.insert(ORIGIN, header_value("Origin", self.origin)?);
        headers.insert(REFERER, header_value("Referer", self.referer)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        if let Some(cookie) = self.cookie {
            headers.insert(COOKIE, header_value("Cookie", cookie)?);
        }
        Ok(headers)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
        name,
        message: e.to_string(),
    })
}

/// Text-in, text-out HTTP transport.
///
/// This abstraction allows the session and fetch logic to be tested with
/// scripted responses.
pub trait HttpTransport: Send + Sync {
    /// GET `url` and return the response body.
    fn get(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<String, HttpError>> + Send;

    /// POST `body` to `url` and return the response body.
    fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> impl Future<Output = Result<String, HttpError>> + Send;
}

/// Transport backed by a shared `reqwest::Client` with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, HttpError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response.text().await?)
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<String, HttpError> {
        self.send(self.http.get(url.clone()).headers(headers.clone()))
            .await
    }

    async fn post(&self, url: &Url, headers: &HeaderMap, body: String) -> Result<String, HttpError> {
        self.send(self.http.post(url.clone()).headers(headers.clone()).body(body))
            .await
    }
}
