use crate::domain::{ChatId, MessageId, UpdateId, UserId};
use crate::schema::{Decode, DecodeError, FieldSpec, Fields, JsonKind};

use super::types::{Chat, Message, Sticker, Update, User};

use JsonKind::{Array, Bool, Integer, Object, String as Text};

impl Decode for User {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("id", Integer),
        FieldSpec::required("is_bot", Bool),
        FieldSpec::required("first_name", Text),
        FieldSpec::optional("last_name", Text),
        FieldSpec::optional("username", Text),
        FieldSpec::optional("language_code", Text),
    ];

    fn from_fields(f: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: UserId(f.int("id")?),
            is_bot: f.flag("is_bot")?,
            first_name: f.string("first_name")?,
            last_name: f.opt_string("last_name")?,
            username: f.opt_string("username")?,
            language_code: f.opt_string("language_code")?,
        })
    }
}

impl Decode for Chat {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("id", Integer),
        FieldSpec::required("type", Text),
        FieldSpec::optional("title", Text),
        FieldSpec::optional("username", Text),
        FieldSpec::optional("first_name", Text),
        FieldSpec::optional("last_name", Text),
        FieldSpec::optional("all_members_are_administrators", Bool),
        FieldSpec::optional("photo", Object),
        FieldSpec::optional("description", Text),
        FieldSpec::optional("invite_link", Text),
        FieldSpec::optional("pinned_message", Object),
        FieldSpec::optional("sticker_set_name", Text),
        FieldSpec::optional("can_set_sticker_set", Bool),
    ];

    fn from_fields(f: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: ChatId(f.int("id")?),
            kind: f.string("type")?,
            title: f.opt_string("title")?,
            username: f.opt_string("username")?,
            first_name: f.opt_string("first_name")?,
            last_name: f.opt_string("last_name")?,
            all_members_are_administrators: f.opt_flag("all_members_are_administrators")?,
            photo: f.opt_opaque("photo"),
            description: f.opt_string("description")?,
            invite_link: f.opt_string("invite_link")?,
            pinned_message: f.opt_boxed("pinned_message")?,
            sticker_set_name: f.opt_string("sticker_set_name")?,
            can_set_sticker_set: f.opt_flag("can_set_sticker_set")?,
        })
    }
}

impl Decode for Sticker {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("file_id", Text),
        FieldSpec::required("width", Integer),
        FieldSpec::required("height", Integer),
        FieldSpec::optional("thumb", Object),
        FieldSpec::optional("emoji", Text),
        FieldSpec::optional("set_name", Text),
        FieldSpec::optional("mask_position", Object),
        FieldSpec::optional("file_size", Integer),
    ];

    fn from_fields(f: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            file_id: f.string("file_id")?,
            width: f.int("width")?,
            height: f.int("height")?,
            thumb: f.opt_opaque("thumb"),
            emoji: f.opt_string("emoji")?,
            set_name: f.opt_string("set_name")?,
            mask_position: f.opt_opaque("mask_position"),
            file_size: f.opt_int("file_size")?,
        })
    }
}

impl Decode for Message {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("message_id", Integer),
        FieldSpec::optional("from", Object),
        FieldSpec::required("date", Integer),
        FieldSpec::required("chat", Object),
        FieldSpec::optional("forward_from", Object),
        FieldSpec::optional("forward_from_chat", Object),
        FieldSpec::optional("forward_from_message_id", Integer),
        FieldSpec::optional("forward_signature", Text),
        FieldSpec::optional("forward_date", Integer),
        FieldSpec::optional("reply_to_message", Object),
        FieldSpec::optional("edit_date", Integer),
        FieldSpec::optional("media_group_id", Text),
        FieldSpec::optional("author_signature", Text),
        FieldSpec::optional("text", Text),
        FieldSpec::optional("entities", Array),
        FieldSpec::optional("caption_entities", Array),
        FieldSpec::optional("audio", Object),
        FieldSpec::optional("document", Object),
        FieldSpec::optional("game", Object),
        FieldSpec::optional("photo", Array),
        FieldSpec::optional("sticker", Object),
        FieldSpec::optional("video", Object),
        FieldSpec::optional("voice", Object),
        FieldSpec::optional("video_note", Object),
        FieldSpec::optional("caption", Text),
        FieldSpec::optional("contact", Object),
        FieldSpec::optional("location", Object),
        FieldSpec::optional("venue", Object),
        FieldSpec::optional("new_chat_members", Array),
        FieldSpec::optional("left_chat_member", Object),
        FieldSpec::optional("new_chat_title", Text),
        FieldSpec::optional("new_chat_photo", Array),
        FieldSpec::optional("delete_chat_photo", Bool),
        FieldSpec::optional("group_chat_created", Bool),
        FieldSpec::optional("supergroup_chat_created", Bool),
        FieldSpec::optional("channel_chat_created", Bool),
        FieldSpec::optional("migrate_to_chat_id", Integer),
        FieldSpec::optional("migrate_from_chat_id", Integer),
        FieldSpec::optional("pinned_message", Object),
        FieldSpec::optional("invoice", Object),
        FieldSpec::optional("successful_payment", Object),
    ];

    fn from_fields(f: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            message_id: MessageId(f.int("message_id")?),
            from: f.opt_record("from")?,
            date: f.int("date")?,
            chat: f.record("chat")?,
            forward_from: f.opt_record("forward_from")?,
            forward_from_chat: f.opt_record("forward_from_chat")?,
            forward_from_message_id: f.opt_int("forward_from_message_id")?,
            forward_signature: f.opt_string("forward_signature")?,
            forward_date: f.opt_int("forward_date")?,
            reply_to_message: f.opt_boxed("reply_to_message")?,
            edit_date: f.opt_int("edit_date")?,
            media_group_id: f.opt_string("media_group_id")?,
            author_signature: f.opt_string("author_signature")?,
            text: f.opt_string("text")?,
            entities: f.opt_opaque("entities"),
            caption_entities: f.opt_opaque("caption_entities"),
            audio: f.opt_opaque("audio"),
            document: f.opt_opaque("document"),
            game: f.opt_opaque("game"),
            photo: f.opt_opaque("photo"),
            sticker: f.opt_record("sticker")?,
            video: f.opt_opaque("video"),
            voice: f.opt_opaque("voice"),
            video_note: f.opt_opaque("video_note"),
            caption: f.opt_string("caption")?,
            contact: f.opt_opaque("contact"),
            location: f.opt_opaque("location"),
            venue: f.opt_opaque("venue"),
            new_chat_members: f.opt_records("new_chat_members")?,
            left_chat_member: f.opt_record("left_chat_member")?,
            new_chat_title: f.opt_string("new_chat_title")?,
            new_chat_photo: f.opt_opaque("new_chat_photo"),
            delete_chat_photo: f.opt_flag("delete_chat_photo")?,
            group_chat_created: f.opt_flag("group_chat_created")?,
            supergroup_chat_created: f.opt_flag("supergroup_chat_created")?,
            channel_chat_created: f.opt_flag("channel_chat_created")?,
            migrate_to_chat_id: f.opt_int("migrate_to_chat_id")?,
            migrate_from_chat_id: f.opt_int("migrate_from_chat_id")?,
            pinned_message: f.opt_boxed("pinned_message")?,
            invoice: f.opt_opaque("invoice"),
            successful_payment: f.opt_opaque("successful_payment"),
        })
    }
}

impl Decode for Update {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("update_id", Integer),
        FieldSpec::optional("message", Object),
        FieldSpec::optional("edited_message", Object),
        FieldSpec::optional("channel_post", Object),
        FieldSpec::optional("edited_channel_post", Object),
        FieldSpec::optional("inline_query", Object),
        FieldSpec::optional("chosen_inline_result", Object),
        FieldSpec::optional("callback_query", Object),
        FieldSpec::optional("shipping_query", Object),
        FieldSpec::optional("pre_checkout_query", Object),
    ];

    fn from_fields(f: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            update_id: UpdateId(f.int("update_id")?),
            message: f.opt_record("message")?,
            edited_message: f.opt_record("edited_message")?,
            channel_post: f.opt_record("channel_post")?,
            edited_channel_post: f.opt_record("edited_channel_post")?,
            inline_query: f.opt_opaque("inline_query"),
            chosen_inline_result: f.opt_opaque("chosen_inline_result"),
            callback_query: f.opt_opaque("callback_query"),
            shipping_query: f.opt_opaque("shipping_query"),
            pre_checkout_query: f.opt_opaque("pre_checkout_query"),
        })
    }
}
