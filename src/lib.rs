//! OSDU quickstart - demo servers for login, search and file delivery
//!
//! This library provides the building blocks behind the `osdu-quickstart`
//! binary: an OpenID Connect login flow, a search proxy and a streaming
//! file-delivery proxy, each served over HTTP with axum.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Provider discovery, PKCE, pending-login sessions and the OIDC client
//! - `platform`: Search and delivery API payloads and the platform client
//! - `server`: Routes, handlers and the mapping of errors to HTTP responses
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use osdu_quickstart::cli::{Cli, Commands};
//! use osdu_quickstart::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Cli::default())?;
//!     config.validate(Commands::Search)?;
//!
//!     server::serve(Commands::Search, &config).await
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{QuickstartError, Result};
