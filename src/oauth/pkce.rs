//! PKCE (Proof Key for Code Exchange) for the authorization code flow.
//!
//! Google accepts PKCE alongside the client secret; sending it hardens the
//! loopback callback against code interception at no cost.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// PKCE challenge method constant.
const PKCE_METHOD: &str = "S256";

/// Random bytes behind the verifier. 96 bytes encode to 128 characters,
/// the maximum verifier length RFC 7636 allows.
const VERIFIER_ENTROPY_BYTES: usize = 96;

/// A PKCE verifier/challenge pair.
#[derive(Debug, Clone)]
pub struct Pkce {
    /// The code verifier (secret, sent during token exchange).
    pub verifier: String,
    /// The code challenge (sent in the authorization URL).
    pub challenge: String,
    /// The challenge method (always "S256").
    pub method: &'static str,
}

impl Pkce {
    /// Generate a new verifier/challenge pair.
    ///
    /// The verifier is random bytes in base64url form, which keeps every
    /// character inside RFC 7636's unreserved set.
    #[must_use]
    pub fn generate() -> Self {
        let mut entropy = [0u8; VERIFIER_ENTROPY_BYTES];
        rand::rng().fill_bytes(&mut entropy);
        let verifier = URL_SAFE_NO_PAD.encode(entropy);

        let challenge = Self::compute_challenge(&verifier);

        Self {
            verifier,
            challenge,
            method: PKCE_METHOD,
        }
    }

    /// S256 challenge: SHA-256 of the verifier, base64url without padding.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}
