//! Numeric one-time passwords for the second login step.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Random numeric code of `length` digits, leading zeros allowed
pub fn generate_code(length: u32) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Hash stored in place of the code. Bound to the account so a hash
/// copied between rows is useless.
pub fn hash_code(account_id: Uuid, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_id.as_bytes());
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn code_matches(account_id: Uuid, code: &str, stored_hash: &str) -> bool {
    hash_code(account_id, code)
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}
