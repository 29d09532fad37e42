//! Core of the blablabot long-polling client.
//!
//! This crate is framework-agnostic: it owns the typed records and their
//! schema-driven decoder, the session state machine, the Bot API calls, the
//! watermark store and the poll loop. HTTP and the command table live behind
//! ports (traits) implemented in adapter crates.

pub mod api;
pub mod config;
pub mod cursor;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod model;
pub mod poll;
pub mod ports;
pub mod router;
pub mod schema;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
