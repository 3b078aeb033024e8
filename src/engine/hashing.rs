//! Content identity for chunks

use blake3::Hasher;

use crate::utils::config::StagingNames;

/// Short hex blake3 digest of `content`, used as a pattern-mode chunk identity.
/// Not unique across chunks; staging directories are keyed by ordinal as well.
pub fn content_id(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..StagingNames::HASH_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_stable_and_short() {
        let a = content_id(b"line one\n");
        assert_eq!(a.len(), StagingNames::HASH_ID_LEN);
        assert_eq!(a, content_id(b"line one\n"));
        assert_ne!(a, content_id(b"line two\n"));
    }
}
