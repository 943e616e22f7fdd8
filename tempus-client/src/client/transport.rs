//! The request/response channel to the routing service.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::error::ClientError;

/// Default service endpoint.
const DEFAULT_URL: &str = "http://127.0.0.1/wps";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `content` is a query string
    Get,
    /// `content` is an XML body
    Post,
}

/// Status and body of one exchange. The body is returned whatever the
/// status; the client decides what a non-200 answer means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// One blocking request/response exchange.
///
/// Implementations must return only once the full body is read. Dropping
/// an exchange halfway leaves the client state undefined.
pub trait Transport {
    fn request(&mut self, method: Method, content: &str) -> Result<TransportResponse, ClientError>;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Service endpoint
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Basic-auth user and password
    pub basic_auth: Option<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            basic_auth: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some((user, password)) = &self.basic_auth {
            let token = STANDARD.encode(format!("{user}:{password}"));
            let value = HeaderValue::from_str(&format!("Basic {token}"))
                .map_err(|_| ClientError::InvalidConfig("credentials are not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// [`Transport`] over blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, ClientError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(format!(
                "unsupported service URL {:?}",
                config.url
            )));
        }

        let http = reqwest::blocking::Client::builder()
            .default_headers(config.headers()?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn request(&mut self, method: Method, content: &str) -> Result<TransportResponse, ClientError> {
        let response = match method {
            Method::Get => self.http.get(format!("{}?{}", self.url, content)).send()?,
            Method::Post => self
                .http
                .post(&self.url)
                .header(CONTENT_TYPE, "text/xml")
                .body(content.to_string())
                .send()?,
        };

        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(?method, status, bytes = body.len(), "HTTP exchange complete");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.url, "http://127.0.0.1/wps");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.basic_auth.is_none());
        assert!(config.headers().unwrap().is_empty());
    }

    #[test]
    fn basic_auth_header() {
        let config = TransportConfig::new("http://localhost/wps")
            .with_timeout(5)
            .with_basic_auth("Aladdin", "open sesame");
        let headers = config.headers().unwrap();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn rejects_non_http_url() {
        let err = HttpTransport::new(TransportConfig::new("ftp://localhost/wps")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
