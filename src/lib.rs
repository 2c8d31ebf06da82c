//! askdb - natural-language database querying behind a strict SQL safety gate.
//!
//! This library exposes the core modules for use in integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod policy;
pub mod workflow;
