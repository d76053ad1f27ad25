//! Opaque secret generation and hashing: session tokens, password-reset
//! tokens, invite tokens, and API-key secrets.
//!
//! Only the SHA-256 hash of any secret is ever persisted; the raw value
//! is returned to the caller once and is their single proof.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Well-known prefix on raw API keys. A presented key without it is
/// rejected before any lookup.
pub const API_KEY_PREFIX: &str = "vgl_";

/// Length of the stored display prefix of an API key.
pub const API_KEY_DISPLAY_PREFIX_LEN: usize = 16;

/// Generate a cryptographically random opaque token
/// (32 bytes → base64url-encoded, no padding, 43 chars).
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a raw API key: `vgl_` + 43 base64url chars.
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", generate_token())
}

/// The stored display prefix of a raw API key.
pub fn api_key_display_prefix(raw: &str) -> String {
    raw.chars().take(API_KEY_DISPLAY_PREFIX_LEN).collect()
}

/// SHA-256 hash of a raw secret, hex-encoded. Stored as
/// `session.token_hash`, `invite.token_hash`, `api_key.secret_hash`,
/// and `password_reset_token.token_hash`.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_url_safe() {
        let token = generate_token();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn api_key_carries_prefix() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 43);
    }

    #[test]
    fn display_prefix_is_sixteen_chars() {
        let key = generate_api_key();
        let prefix = api_key_display_prefix(&key);
        assert_eq!(prefix.len(), 16);
        assert!(key.starts_with(&prefix));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_token("some-token"), hash_token("some-token"));
    }

    #[test]
    fn different_tokens_different_hashes() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}
