//! Command-line interface definition for the quickstart servers
//!
//! This module defines the CLI structure using clap's derive API. Each
//! subcommand starts a server that mounts one group of demo routes.

use clap::{Parser, Subcommand};

/// OSDU quickstart - demo servers for login, search and file delivery
///
/// Runs a small HTTP server that logs in through OpenID Connect, proxies
/// full-text searches, and streams delivered files from object storage.
#[derive(Parser, Debug, Clone)]
#[command(name = "osdu-quickstart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "OSDU_QUICKSTART_CONFIG",
        default_value = "config/config.yaml"
    )]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the listen address (e.g. 0.0.0.0:8080)
    #[arg(short, long, global = true)]
    pub bind: Option<String>,

    /// Server to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available servers
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Combined app: login, search and fetch routes
    App,

    /// Login only: `/` and `/auth/callback`
    Auth,

    /// Search proxy only: `/find` and `/search`
    Search,

    /// File delivery proxy only: `/fetch`
    Fetch,
}

impl Commands {
    /// Whether this server mounts the login routes (and needs discovery)
    pub fn uses_auth(self) -> bool {
        matches!(self, Commands::App | Commands::Auth)
    }

    /// Whether this server mounts the search route
    pub fn uses_search(self) -> bool {
        matches!(self, Commands::App | Commands::Search)
    }

    /// Whether this server mounts the fetch route
    pub fn uses_fetch(self) -> bool {
        matches!(self, Commands::App | Commands::Fetch)
    }

    /// Whether this server talks to the platform APIs
    pub fn uses_platform(self) -> bool {
        self.uses_search() || self.uses_fetch()
    }
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            bind: None,
            command: Commands::App,
        }
    }
}
