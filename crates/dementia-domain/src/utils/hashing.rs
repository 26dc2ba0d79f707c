use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `content`, used as `ContextLock::content_hash`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_has_a_well_defined_hash() {
        let hash = content_hash("");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn identical_content_hashes_identically() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(content_hash("hello"), content_hash("world"));
    }
}
