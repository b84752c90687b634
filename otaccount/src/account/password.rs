use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// One-way hash stored in place of the plaintext: lowercase hex SHA-256.
pub(crate) fn hash_password(plaintext: &str) -> String {
    format!("{:x}", Sha256::digest(plaintext.as_bytes()))
}

pub(crate) fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let candidate = hash_password(plaintext);
    candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
