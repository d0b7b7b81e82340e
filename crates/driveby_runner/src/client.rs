//! HTTP client shared by both executors.

use crate::request::RequestPlan;
use driveby_core::{AuthConfig, TransportError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of sending one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Status code, or the transport failure
    pub status: Result<u16, TransportError>,
    /// Time until the response completed or the request failed
    pub latency: Duration,
}

/// HTTP client with a per-request timeout and uniform credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    timeout: Duration,
    auth: Option<AuthConfig>,
}

impl ApiClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Request` if the underlying client cannot be built.
    pub fn new(timeout: Duration, auth: Option<AuthConfig>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            timeout,
            auth,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends a request. Transport failures are returned as data, never raised.
    pub async fn send(&self, plan: &RequestPlan) -> Exchange {
        let mut request = self.client.request(plan.method.clone(), plan.url.clone());
        for (name, value) in &plan.headers {
            request = request.header(name, value);
        }
        if let Some((content_type, bytes)) = &plan.body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes.clone());
        }
        request = match &self.auth {
            Some(AuthConfig::Bearer {
                token,
                scheme,
                header,
            }) => {
                let value = if scheme.is_empty() {
                    token.clone()
                } else {
                    format!("{} {}", scheme, token)
                };
                request.header(header, value)
            }
            Some(AuthConfig::ApiKey { key, header }) => request.header(header, key),
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        };

        let started = Instant::now();
        let status = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                // Drain the body so latency covers the full response.
                if let Err(e) = response.bytes().await {
                    debug!(url = %plan.url, error = %e, "Failed to read response body");
                }
                Ok(status)
            }
            Err(e) => Err(self.transport_error(e)),
        };
        Exchange {
            status,
            latency: started.elapsed(),
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }
}
