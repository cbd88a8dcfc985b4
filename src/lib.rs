//! rfolder - folder-based telemetry input.
//!
//! Resolves folder glob patterns into the files they contain on every
//! collection cycle, parses each file in full and forwards the resulting
//! records to a sink. This library backs the `rfolderd` daemon.

pub mod collector;
pub mod config;
pub mod parser;
pub mod sink;
