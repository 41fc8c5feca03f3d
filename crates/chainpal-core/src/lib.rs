//! Core domain + application logic for the chainpal Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / OpenAI / wallet
//! generation live behind ports (traits) implemented in adapter crates.

pub mod chains;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod session;

pub use errors::{Error, Result};
