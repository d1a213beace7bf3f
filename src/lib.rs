//! tabscope - inspect, search and deduplicate open browser tabs
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod panel;
pub mod sources;
pub mod tui;
pub mod util;
