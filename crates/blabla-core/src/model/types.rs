use serde::Serialize;

use crate::domain::{ChatId, MessageId, UpdateId, UserId};
use crate::schema::Opaque;

/// A Telegram user or bot account.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl User {
    /// Short human label used in logs and identity errors.
    pub fn describe(&self) -> String {
        let kind = if self.is_bot { "bot" } else { "user" };
        match &self.username {
            Some(username) => format!("{kind} {:?} (@{username}, id {})", self.first_name, self.id.0),
            None => format!("{kind} {:?} (id {})", self.first_name, self.id.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chat {
    pub id: ChatId,
    /// "private", "group", "supergroup" or "channel"; kept verbatim.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_members_are_administrators: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_set_sticker_set: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sticker {
    pub file_id: String,
    pub width: i32,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_position: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i32>,
}

/// A message in any chat. Content fields are not mutually exclusive here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub message_id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Unix seconds.
    pub date: i64,
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_from: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_from_chat: Option<Chat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_from_message_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<Sticker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_note: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_chat_members: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_chat_member: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_chat_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_chat_photo: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_chat_photo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_chat_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supergroup_chat_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_chat_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_from_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_payment: Option<Opaque>,
}

/// One entry of a `getUpdates` batch. At most one payload is set in practice.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Update {
    pub update_id: UpdateId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_query: Option<Opaque>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_checkout_query: Option<Opaque>,
}
