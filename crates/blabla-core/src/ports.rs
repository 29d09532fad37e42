use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One HTTP exchange against the Bot API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path and query relative to the session base URL (`bot<token>/getMe`).
    pub path: String,
    /// JSON body; only sent with POST.
    pub body: Option<String>,
    /// Client-side limit for the whole exchange.
    pub timeout: Option<Duration>,
}

/// Status line and body of a completed exchange, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Hexagonal port for opening HTTP(S) sessions.
///
/// Implemented by the reqwest adapter; tests script it in memory.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, base_url: &str) -> Result<Box<dyn Connection>>;
}

/// An open session. Exclusively owned by one transport.
///
/// `execute` maps a mid-exchange break to `ConnectionError::Reset`; it never
/// reports `Aborted` itself (cancellation happens above it).
#[async_trait]
pub trait Connection: Send {
    async fn execute(&mut self, request: ApiRequest) -> Result<RawResponse>;

    /// Graceful release of pooled connections.
    async fn shutdown(&mut self);
}
