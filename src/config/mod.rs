//! Configuration management
//!
//! This module handles the settings for the ledger and its proof-of-work
//! engine. There is no global instance: a `Config` is built once and passed
//! to whatever needs it.

pub mod settings;

pub use settings::Config;
