//! Telegram-facing side of blablabot: the fixed text-command table and the
//! wiring that runs it over the HTTP adapter.

pub mod commands;
pub mod router;

pub use commands::{CommandTable, TextCommand};
