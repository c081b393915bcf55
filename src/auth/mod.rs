//! OpenID Connect login
//!
//! # Module Layout
//!
//! - [`discovery`] -- provider discovery document
//! - [`client`]    -- authorization URL, code exchange and userinfo
//! - [`pkce`]      -- PKCE `S256` challenges and random tokens
//! - [`session`]   -- pending logins keyed by a session cookie

pub mod client;
pub mod discovery;
pub mod pkce;
pub mod session;

pub use client::{OAuth2Token, OidcClient, TokenResponse, UserInfo};
pub use discovery::ProviderMetadata;
pub use session::{PendingLogin, SessionStore, SESSION_COOKIE};
