//! Server-side password stretching.
//!
//! Clients never send the master password itself; they send a derived hash,
//! which the server stretches again with its own per-user salt and iteration
//! count before storage. PBKDF2-HMAC-SHA256 with a 32-byte output, matching
//! the wire protocol's KDF family.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const HASH_LEN: usize = 32;

/// Compute the stored hash for a candidate password. Deterministic: the same
/// (password, salt, iterations) triple always yields the same hash, and a
/// changed iteration count yields a different one - iteration upgrades
/// therefore require rehashing on next login, not just re-verification.
pub fn generate_password(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    hash.to_vec()
}

/// Recompute and compare in constant time.
pub fn verify_password(password: &str, salt: &[u8], hash: &[u8], iterations: u32) -> bool {
    let candidate = generate_password(password, salt, iterations);
    candidate.ct_eq(hash).into()
}
