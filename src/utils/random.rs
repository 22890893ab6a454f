//! Random material generation for tokens and salts.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

/// Fill `n` bytes from the thread-local CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// A fresh device refresh token: 64 random bytes, standard base64.
pub fn refresh_token_value() -> String {
    STANDARD.encode(random_bytes(64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_distinct() {
        assert_ne!(refresh_token_value(), refresh_token_value());
    }

    #[test]
    fn refresh_token_encodes_64_bytes() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let decoded = STANDARD.decode(refresh_token_value()).unwrap();
        assert_eq!(decoded.len(), 64);
    }
}
