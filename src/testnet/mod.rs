//! Shared helpers for the crate's unit tests
//!
//! Builds small chains quickly and simulates corruption by reassembling
//! blocks with different fields; sealed blocks cannot be edited in place.

pub mod test_utils;

pub use test_utils::*;
