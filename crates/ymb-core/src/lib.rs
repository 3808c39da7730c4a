//! Core logic for the Yandex Music download bot.
//!
//! This crate is framework-agnostic. Telegram and the downloader CLI live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod handler;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod security;

pub use errors::{Error, Result};
