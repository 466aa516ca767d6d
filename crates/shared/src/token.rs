//! Invite token generation.
//!
//! Invite tokens are bearer secrets: whoever holds the token can redeem it
//! to join the group it points at. They are generated from the operating
//! system CSPRNG with 256 bits of entropy and hex-encoded, so guessing one
//! is not feasible. Uniqueness is still enforced by a database constraint.

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes in an invite token (256 bits).
pub const INVITE_TOKEN_BYTES: usize = 32;

/// Length of a hex-encoded invite token.
pub const INVITE_TOKEN_LEN: usize = INVITE_TOKEN_BYTES * 2;

/// Generates a new opaque invite token: 64 lowercase hex characters.
pub fn generate_invite_token() -> String {
    let mut bytes = [0u8; INVITE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_invite_token();
        assert_eq!(token.len(), INVITE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tokens_are_pairwise_distinct() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_invite_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_decodes_to_expected_entropy() {
        let token = generate_invite_token();
        let bytes = hex::decode(&token).expect("token must be valid hex");
        assert_eq!(bytes.len(), INVITE_TOKEN_BYTES);
    }
}
