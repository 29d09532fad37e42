use serde::Serialize;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, unique per chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

/// Server-assigned update id. Ids only ever grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UpdateId(pub i64);

impl UpdateId {
    /// The watermark that acknowledges this update and everything before it.
    pub fn next(self) -> i64 {
        self.0.saturating_add(1)
    }
}
