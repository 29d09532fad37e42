use async_trait::async_trait;

use crate::api::BotApi;
use crate::model::Message;
use crate::{Error, Result};

/// What the poll loop should do after a message was handled.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    /// Persist the watermark, close the session, return normally.
    Stop,
    /// Persist, force-close the session and start a fresh one.
    Abort,
    /// Persist, close and return the error.
    Fatal(Error),
}

/// Hexagonal port for message handling.
///
/// Called once per message, in server order, with exclusive access to the
/// API so replies go out on the same session. An `Err` is treated like
/// `Outcome::Fatal` unless it is a recoverable connection reset.
#[async_trait]
pub trait CommandRouter: Send {
    async fn route(&mut self, message: &Message, api: &mut BotApi) -> Result<Outcome>;
}
