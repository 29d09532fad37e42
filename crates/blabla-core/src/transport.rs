//! HTTP session bound to one base URL and bot token.
//!
//! State machine: `Uninitialized -> Active -> Closed`, and `Closed -> Active`
//! again on re-init. Requests are only legal while `Active`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::ConnectionError;
use crate::ports::{ApiRequest, Connection, Connector, HttpMethod};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        })
    }
}

/// Cancels the pending exchange of the current session and refuses new ones.
///
/// Cloned out of a transport so another task (a signal handler) can stop a
/// long poll that would otherwise block for the full server timeout.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Transport {
    base_url: String,
    token: String,
    connector: Arc<dyn Connector>,
    state: SessionState,
    connection: Option<Box<dyn Connection>>,
    /// Lives as long as the transport; cancelled through [`AbortHandle`].
    shutdown: CancellationToken,
    /// Child of `shutdown`, replaced on every `init`.
    session: CancellationToken,
}

impl Transport {
    pub fn new(base_url: &str, token: &str, connector: Arc<dyn Connector>) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let shutdown = CancellationToken::new();
        let session = shutdown.child_token();
        Self {
            base_url,
            token: token.to_string(),
            connector,
            state: SessionState::Uninitialized,
            connection: None,
            shutdown,
            session,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            token: self.shutdown.clone(),
        }
    }

    pub async fn init(&mut self) -> Result<()> {
        if self.state == SessionState::Active {
            return Err(Error::SessionState {
                operation: "init",
                state: self.state,
            });
        }
        if self.shutdown.is_cancelled() {
            return Err(ConnectionError::Aborted.into());
        }

        let connection = self.connector.connect(&self.base_url).await?;
        self.connection = Some(connection);
        self.session = self.shutdown.child_token();
        self.state = SessionState::Active;
        tracing::info!(base_url = %self.base_url, "session opened");
        Ok(())
    }

    /// Graceful close. Calling it again (or before `init`) is a no-op.
    pub async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.shutdown().await;
            tracing::info!("session closed");
        }
        if self.state != SessionState::Uninitialized {
            self.state = SessionState::Closed;
        }
    }

    /// Forced close: cancels in-flight I/O and drops the connection unflushed.
    pub fn abort(&mut self) {
        self.session.cancel();
        if self.connection.take().is_some() {
            tracing::warn!("session aborted");
        }
        if self.state != SessionState::Uninitialized {
            self.state = SessionState::Closed;
        }
    }

    /// GET `bot<token>/<method>` with integer query parameters.
    pub async fn get(
        &mut self,
        method: &'static str,
        query: &[(&str, i64)],
        timeout: Option<Duration>,
    ) -> Result<String> {
        let mut path = self.method_path(method);
        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            path.push('?');
            path.push_str(&pairs.join("&"));
        }
        self.exchange(
            method,
            ApiRequest {
                method: HttpMethod::Get,
                path,
                body: None,
                timeout,
            },
        )
        .await
    }

    /// POST `bot<token>/<method>` with a JSON body.
    pub async fn post_json(
        &mut self,
        method: &'static str,
        body: &impl serde::Serialize,
    ) -> Result<String> {
        let body = serde_json::to_string(body)?;
        let path = self.method_path(method);
        self.exchange(
            method,
            ApiRequest {
                method: HttpMethod::Post,
                path,
                body: Some(body),
                timeout: None,
            },
        )
        .await
    }

    fn method_path(&self, method: &str) -> String {
        format!("bot{}/{}", self.token, method)
    }

    async fn exchange(&mut self, method: &'static str, request: ApiRequest) -> Result<String> {
        let state = self.state;
        let Some(connection) = self.connection.as_mut().filter(|_| state == SessionState::Active)
        else {
            return Err(Error::SessionState {
                operation: method,
                state,
            });
        };

        let redacted = request.path.replacen(&self.token, "<token>", 1);
        tracing::debug!(
            http_method = request.method.as_str(),
            path = %redacted,
            body = request.body.as_deref().unwrap_or(""),
            "api request"
        );

        let cancel = self.session.clone();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(path = %redacted, "request aborted");
                return Err(ConnectionError::Aborted.into());
            }
            response = connection.execute(request) => response?,
        };

        tracing::debug!(
            status = response.status,
            body = %response.body,
            "api response"
        );
        if response.status != 200 {
            return Err(Error::Transport {
                operation: method.to_string(),
                status: response.status,
                reason: response.reason,
            });
        }
        Ok(response.body)
    }
}
