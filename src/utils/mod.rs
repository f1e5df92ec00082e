// src/utils/mod.rs
//! Shared helpers

pub mod time;

pub use time::{current_timestamp_nanos, MockTimeProvider, SystemTimeProvider, TimeProvider};
