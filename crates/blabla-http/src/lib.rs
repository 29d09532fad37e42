//! reqwest adapter for the `blabla-core` connector ports.
//!
//! One `reqwest::Client` (and its connection pool) per session, so a forced
//! abort really drops the sockets of the aborted session.

use std::time::Duration;

use async_trait::async_trait;
use blabla_core::{
    errors::{ConnectionError, Error},
    ports::{ApiRequest, Connection, Connector, HttpMethod, RawResponse},
    Result,
};
use reqwest::header::CONTENT_TYPE;

#[derive(Clone, Debug)]
pub struct ReqwestConnector {
    connect_timeout: Duration,
    user_agent: String,
}

impl Default for ReqwestConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("blablabot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReqwestConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for ReqwestConnector {
    async fn connect(&self, base_url: &str) -> Result<Box<dyn Connection>> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid api base url {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "api base url must be http or https, got {base_url:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Box::new(ReqwestConnection {
            client: Some(client),
            base_url,
        }))
    }
}

pub struct ReqwestConnection {
    client: Option<reqwest::Client>,
    base_url: String,
}

#[async_trait]
impl Connection for ReqwestConnection {
    async fn execute(&mut self, request: ApiRequest) -> Result<RawResponse> {
        let Some(client) = self.client.as_ref() else {
            return Err(ConnectionError::Reset {
                reason: "connection already shut down".to_string(),
            }
            .into());
        };

        // The path starts with `bot<id>:<secret>`, which `Url::join` would
        // read as a scheme; plain concatenation keeps it a path.
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.unwrap_or_default()),
        };
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    async fn shutdown(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!(base_url = %self.base_url, "http client released");
        }
    }
}

/// Connection-level failures become `Reset`; request URLs (which carry the
/// token) are stripped from the message.
fn classify(error: reqwest::Error) -> Error {
    let error = error.without_url();
    if error.is_builder() {
        return Error::Config(format!("invalid http request: {error}"));
    }
    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        return ConnectionError::Reset {
            reason: error.to_string(),
        }
        .into();
    }
    Error::External(format!("http error: {error}"))
}
