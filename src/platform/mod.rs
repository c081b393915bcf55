//! Search and delivery APIs of the data platform
//!
//! - [`search`]   -- search request envelope and result grouping
//! - [`delivery`] -- SRN resolution to pre-signed storage URLs
//! - [`client`]   -- [`PlatformClient`], which talks to both and to storage

pub mod client;
pub mod delivery;
pub mod search;

pub use client::{ObjectStream, PlatformClient};
pub use search::{FilesByResourceType, FoundFile};
