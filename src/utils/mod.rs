//! Utility functions and helpers
//!
//! This module contains the digest integration, timestamps and the JSON
//! helpers used to export blocks and chains.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, has_leading_zeros, sha256_digest, sha256_hex, HEX_DIGEST_LEN};

pub use serialization::{from_json, read_json_file, to_json, write_json_file};
