//! PKCE S256 challenges and random tokens
//!
//! Implements the `S256` method of Proof Key for Code Exchange (RFC 7636)
//! and the random tokens used for `state` values and session ids.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use base64::Engine as _;
use rand::RngCore as _;
use sha2::{Digest, Sha256};

use crate::auth::discovery::ProviderMetadata;

/// A PKCE S256 challenge pair.
///
/// # Examples
///
/// ```
/// use osdu_quickstart::auth::pkce::generate;
///
/// let pkce = generate();
/// assert_eq!(pkce.verifier.len(), 43);
/// assert_ne!(pkce.verifier, pkce.challenge);
/// ```
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// 32 random bytes, base64url without padding (43 characters). Sent to
    /// the token endpoint as `code_verifier`.
    pub verifier: String,

    /// base64url(SHA-256(verifier)). Sent to the authorization endpoint as
    /// `code_challenge`.
    pub challenge: String,
}

impl PkceChallenge {
    /// Derives the S256 challenge for an existing verifier.
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generates a fresh PKCE S256 challenge.
pub fn generate() -> PkceChallenge {
    PkceChallenge::from_verifier(random_token(32))
}

/// Returns `byte_len` cryptographically random bytes encoded as base64url
/// without padding.
pub fn random_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Whether an S256 challenge may be sent to this provider.
///
/// Providers that do not advertise `code_challenge_methods_supported` are
/// assumed to accept S256; providers that advertise a list without it are not.
pub fn s256_allowed(metadata: &ProviderMetadata) -> bool {
    match metadata.code_challenge_methods_supported.as_deref() {
        None => true,
        Some(methods) => methods.iter().any(|m| m == "S256"),
    }
}
