//! # TrainerCentral MCP
//!
//! A Model Context Protocol (MCP) server that lets assistants manage Zoho
//! TrainerCentral academies: courses, chapters, lessons, assignments, tests
//! and live workshops.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`]: Settings from the environment, `.env` and an optional TOML file
//! - [`auth`]: Zoho OAuth token lifecycle with single-flight refresh
//! - [`client`]: Authorized HTTP calls against the TrainerCentral REST API
//! - [`api`]: Per-resource path and body builders
//! - [`mcp`]: Tool registry and the pmcp server
//! - [`discovery`]: OAuth well-known metadata and health endpoints
//! - [`models`]: Request bodies assembled by the crate
//! - [`utils`]: HTTP client, parameter validation and date conversion

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod mcp;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use api::TrainerCentralApi;
pub use auth::TokenManager;
pub use client::TrainerCentralClient;
pub use config::Settings;
pub use error::{ErrorEnvelope, ErrorKind, TcError, TcResult};
pub use mcp::{McpServer, ToolRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
