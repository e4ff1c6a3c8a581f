//! Reprise console front end
//!
//! Line-oriented driver for the playback coordinator: configuration
//! loading, command parsing and event rendering.

pub mod config;
pub mod console;
