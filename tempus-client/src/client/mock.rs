//! Mock transport for testing without a routing server.
//!
//! Serves canned answers keyed by operation and remembers every request it
//! received, so tests can check what went over the wire.

use std::collections::HashMap;
use std::path::Path;

use crate::expr::decode;
use crate::protocol::parse_execute_envelope;

use super::error::ClientError;
use super::transport::{Method, Transport, TransportResponse};

/// Canned-response [`Transport`].
///
/// POST requests are matched on the `Execute` process identifier
/// (`select`, `plugin_list`, ...), GET requests on their `request=`
/// parameter (`GetCapabilities`, `DescribeProcess`).
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: HashMap<String, TransportResponse>,
    requests: Vec<(Method, String)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `key` with a 200 and `body`.
    pub fn with_response(self, key: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_status_response(key, 200, body)
    }

    pub fn with_status_response(
        mut self,
        key: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.responses.insert(
            key.into(),
            TransportResponse {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Load answers from a directory of `{key}.xml` files
    /// (e.g. `select.xml`, `GetCapabilities.xml`).
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, ClientError> {
        let data_dir = data_dir.as_ref();
        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            ClientError::InvalidConfig(format!("failed to read mock data directory: {e}"))
        })?;

        let mut mock = Self::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ClientError::InvalidConfig(format!("failed to read entry: {e}")))?
                .path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("xml") {
                continue;
            }

            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ClientError::InvalidConfig(format!("invalid filename: {path:?}")))?
                .to_string();
            let body = std::fs::read_to_string(&path).map_err(|e| {
                ClientError::InvalidConfig(format!("failed to read {path:?}: {e}"))
            })?;
            mock = mock.with_response(key, body);
        }

        if mock.responses.is_empty() {
            return Err(ClientError::InvalidConfig(format!(
                "no mock response files found in {data_dir:?}"
            )));
        }
        Ok(mock)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> &[(Method, String)] {
        &self.requests
    }

    pub fn last_request(&self) -> Option<&(Method, String)> {
        self.requests.last()
    }

    fn key(method: Method, content: &str) -> Result<String, ClientError> {
        match method {
            Method::Get => content
                .split('&')
                .find_map(|pair| pair.strip_prefix("request="))
                .map(str::to_string)
                .ok_or_else(|| ClientError::transport_failure(400, "missing request parameter")),
            Method::Post => {
                let (identifier, _) = parse_execute_envelope(&decode(content)?)?;
                Ok(identifier)
            }
        }
    }
}

impl Transport for MockTransport {
    fn request(&mut self, method: Method, content: &str) -> Result<TransportResponse, ClientError> {
        self.requests.push((method, content.to_string()));
        let key = Self::key(method, content)?;
        self.responses.get(&key).cloned().ok_or_else(|| {
            let mut available: Vec<&str> = self.responses.keys().map(String::as_str).collect();
            available.sort_unstable();
            ClientError::transport_failure(
                404,
                &format!("no mock response for {key}. Available: {available:?}"),
            )
        })
    }
}
