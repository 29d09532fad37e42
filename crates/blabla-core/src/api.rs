//! Typed Bot API calls on top of [`Transport`].

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{ChatId, MessageId, UpdateId};
use crate::model::{Message, Update, User};
use crate::schema::{decode, decode_batch, DecodeOptions};
use crate::transport::{AbortHandle, SessionState, Transport};
use crate::{Error, Result};

/// One decoded `getUpdates` result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateBatch {
    /// Entries that decoded, in server order.
    pub updates: Vec<Update>,
    /// Highest `update_id` in the raw result, decodable or not.
    pub last_update_id: Option<UpdateId>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.last_update_id.is_none()
    }
}

/// Body of `sendMessage`. Unset options are left out of the request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<MessageId>,
}

impl SendMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            disable_notification: None,
            reply_to_message_id: None,
        }
    }

    pub fn parse_mode(mut self, mode: impl Into<String>) -> Self {
        self.parse_mode = Some(mode.into());
        self
    }

    pub fn without_preview(mut self) -> Self {
        self.disable_web_page_preview = Some(true);
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = Some(true);
        self
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }
}

#[derive(Serialize)]
struct SendSticker<'a> {
    chat_id: ChatId,
    sticker: &'a str,
}

#[derive(Serialize)]
struct SendDocument<'a> {
    chat_id: ChatId,
    document: &'a str,
}

pub struct BotApi {
    transport: Transport,
    expected_name: String,
    decode: DecodeOptions,
    poll_grace: Duration,
}

impl BotApi {
    pub fn new(transport: Transport, expected_name: impl Into<String>) -> Self {
        Self {
            transport,
            expected_name: expected_name.into(),
            decode: DecodeOptions::default(),
            poll_grace: Duration::from_secs(10),
        }
    }

    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode = options;
        self
    }

    /// Extra client-side time a long poll gets on top of its server timeout.
    pub fn with_poll_grace(mut self, grace: Duration) -> Self {
        self.poll_grace = grace;
        self
    }

    pub fn session_state(&self) -> SessionState {
        self.transport.state()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.transport.abort_handle()
    }

    pub async fn init_session(&mut self) -> Result<()> {
        self.transport.init().await
    }

    pub async fn close_session(&mut self) {
        self.transport.close().await;
    }

    pub fn abort_session(&mut self) {
        self.transport.abort();
    }

    pub async fn get_me(&mut self) -> Result<User> {
        let body = self.transport.get("getMe", &[], None).await?;
        let result = unwrap_envelope("getMe", &body)?;
        Ok(decode(&result, &self.decode)?)
    }

    /// Confirms the token belongs to a bot with the configured first name.
    pub async fn check_bot_info(&mut self) -> Result<User> {
        let me = self.get_me().await?;
        if !me.is_bot || me.first_name != self.expected_name {
            return Err(Error::IdentityMismatch {
                expected: self.expected_name.clone(),
                found: me.describe(),
            });
        }
        tracing::info!(bot = %me.describe(), "bot identity confirmed");
        Ok(me)
    }

    /// `getUpdates`; `offset` and `timeout` (seconds) are each sent only when set.
    pub async fn get_updates(
        &mut self,
        offset: Option<i64>,
        timeout: Option<u64>,
    ) -> Result<Vec<Update>> {
        Ok(self.fetch_updates(offset, timeout).await?.updates)
    }

    /// Like [`BotApi::get_updates`], but also reports the highest `update_id`
    /// of the raw batch, including entries that failed to decode.
    pub async fn fetch_updates(
        &mut self,
        offset: Option<i64>,
        timeout: Option<u64>,
    ) -> Result<UpdateBatch> {
        let mut query = Vec::with_capacity(2);
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }
        if let Some(timeout) = timeout {
            query.push(("timeout", i64::try_from(timeout).unwrap_or(i64::MAX)));
        }
        let limit = Duration::from_secs(timeout.unwrap_or(0)).saturating_add(self.poll_grace);

        let body = self
            .transport
            .get("getUpdates", &query, Some(limit))
            .await?;
        let result = unwrap_envelope("getUpdates", &body)?;
        let updates: Vec<Update> = decode_batch(&result, &self.decode)?;
        let last_update_id = highest_update_id(&result);
        if updates.is_empty() && last_update_id.is_some() {
            tracing::warn!(?last_update_id, "no decodable update in batch");
        }
        tracing::debug!(count = updates.len(), "updates received");
        Ok(UpdateBatch {
            updates,
            last_update_id,
        })
    }

    pub async fn get_updates_with_offset(&mut self, offset: i64) -> Result<Vec<Update>> {
        self.get_updates(Some(offset), None).await
    }

    pub async fn get_updates_with_timeout(&mut self, timeout: u64) -> Result<Vec<Update>> {
        self.get_updates(None, Some(timeout)).await
    }

    pub async fn send_message(&mut self, request: &SendMessage) -> Result<Message> {
        self.call("sendMessage", request).await
    }

    pub async fn send_text(&mut self, chat_id: ChatId, text: &str) -> Result<Message> {
        self.send_message(&SendMessage::new(chat_id, text)).await
    }

    pub async fn send_message_reply(
        &mut self,
        chat_id: ChatId,
        text: &str,
        reply_to: MessageId,
    ) -> Result<Message> {
        self.send_message(&SendMessage::new(chat_id, text).reply_to(reply_to))
            .await
    }

    /// `sticker` is a file id already known to the server.
    pub async fn send_sticker(&mut self, chat_id: ChatId, sticker: &str) -> Result<Message> {
        self.call("sendSticker", &SendSticker { chat_id, sticker })
            .await
    }

    /// `document` is a file id already known to the server.
    pub async fn send_document(&mut self, chat_id: ChatId, document: &str) -> Result<Message> {
        self.call("sendDocument", &SendDocument { chat_id, document })
            .await
    }

    async fn call(&mut self, method: &'static str, body: &impl Serialize) -> Result<Message> {
        let body = self.transport.post_json(method, body).await?;
        let result = unwrap_envelope(method, &body)?;
        Ok(decode(&result, &self.decode)?)
    }
}

/// Checks the `{"ok": ..., "result": ...}` envelope and hands back `result`.
/// Integer `update_id`s of the raw entries; malformed entries count too.
fn highest_update_id(result: &Value) -> Option<UpdateId> {
    result
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("update_id").and_then(Value::as_i64))
        .max()
        .map(UpdateId)
}

fn unwrap_envelope(method: &str, body: &str) -> Result<Value> {
    let envelope: Value = serde_json::from_str(body)?;
    let Value::Object(mut fields) = envelope else {
        return Err(Error::Protocol(format!(
            "{method}: response is not a JSON object"
        )));
    };

    match fields.get("ok") {
        Some(Value::Bool(true)) => {}
        Some(Value::Bool(false)) => {
            let description = fields
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("no description");
            let message = match fields.get("error_code").and_then(Value::as_i64) {
                Some(code) => format!("{method} failed: {description} (error_code {code})"),
                None => format!("{method} failed: {description}"),
            };
            return Err(Error::Protocol(message));
        }
        Some(_) => {
            return Err(Error::Protocol(format!(
                "{method}: field `ok` is not a bool"
            )))
        }
        None => return Err(Error::Protocol(format!("{method}: field `ok` is missing"))),
    }

    fields
        .remove("result")
        .ok_or_else(|| Error::Protocol(format!("{method}: field `result` is missing")))
}
