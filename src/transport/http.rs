//! Reqwest-backed transport with bearer authentication.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, SdkError, TransportError};
use crate::transport::{Method, RemoteRequest, Transport};

/// HTTP transport for the remote sleep-data API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Builds a client with the configured request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SdkError::validation(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Absolute URL for a request path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> std::result::Result<Value, TransportError> {
        let url = self.url(&request.path);
        debug!(method = ?request.method, %url, "sending remote request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        builder = builder.bearer_auth(&self.api_key).query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        response.json().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() || err.is_body() {
        TransportError::ConnectionAborted(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_url_joining() {
        let mut config = Config::for_test("key");
        config.base_url = "https://api.example.com/v1/".to_string();
        let transport = HttpTransport::from_config(&config).unwrap();

        assert_eq!(transport.url("/sleep/42"), "https://api.example.com/v1/sleep/42");
        assert_eq!(transport.url("sleep"), "https://api.example.com/v1/sleep");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_failure() {
        let mut config = Config::for_test("key");
        // Port 9 on localhost (discard) is closed on test machines
        config.base_url = "http://127.0.0.1:9".to_string();
        config.request_timeout = Duration::from_secs(2);
        let transport = HttpTransport::from_config(&config).unwrap();

        let err = transport.send(RemoteRequest::get("sleep")).await.unwrap_err();
        assert!(
            matches!(err, TransportError::ConnectionAborted(_) | TransportError::Timeout(_)),
            "unexpected error: {:?}",
            err
        );
    }
}
