//! Typed Bot API records (the modeled subset) and their field tables.

mod decode;
mod types;

pub use types::{Chat, Message, Sticker, Update, User};
