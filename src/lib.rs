//! tekshila: AI-generated documentation and code quality (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod env;
pub mod generator;
pub mod ingest;
pub mod languages;
pub mod models;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod providers;
pub mod publish;
pub mod quality;
pub mod response;
