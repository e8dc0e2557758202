/// Hash a plaintext password for storage.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// Verify plaintext against a stored hash. A malformed hash never verifies.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
