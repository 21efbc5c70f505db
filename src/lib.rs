//! LazyESP library
//!
//! Compiles declarative screen layouts (pages of typed widgets) into ESPHome
//! device configuration, either as a direct drawing lambda or as an LVGL
//! widget tree, optionally spliced into a hardware template.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod hardware;
pub mod models;
pub mod parser;
pub mod plugins;

#[cfg(feature = "web")]
pub mod web;
