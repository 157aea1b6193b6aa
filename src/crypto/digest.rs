//! Deterministic hashing and Merkle aggregation.
//!
//! Every hash in the ledger is a lowercase 64-character hex string derived
//! from SHA-256. The previous generation of this system used a non-
//! cryptographic rolling hash; the string-in, fixed-width-hex-out contract
//! is kept, the algorithm is not.

use sha2::{Digest, Sha256};

/// Width of every digest and Merkle root, in hex characters.
pub const DIGEST_WIDTH: usize = 64;

/// Root of an empty leaf set.
pub const EMPTY_ROOT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Deterministic digest of an arbitrary string.
///
/// Same input always yields the same 64-hex-char output.
pub fn hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Merkle root over an ordered sequence of leaf hashes.
///
/// Empty input yields [`EMPTY_ROOT`]; a single leaf is returned left-padded
/// to 64 characters. Otherwise adjacent leaves are paired (the last leaf is
/// duplicated when the count is odd) and hashed upward until one value
/// remains. Leaf order is significant: the root is only re-derivable from
/// the same leaves in the same order.
pub fn merkle_root(leaf_hashes: &[String]) -> String {
    if leaf_hashes.is_empty() {
        return EMPTY_ROOT.to_string();
    }
    if leaf_hashes.len() == 1 {
        return pad_digest(&leaf_hashes[0]);
    }

    let mut level = leaf_hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let (left, right) = if pair.len() == 2 {
                (&pair[0], &pair[1])
            } else {
                // Odd count: the trailing leaf pairs with itself.
                (&pair[0], &pair[0])
            };
            next.push(hash(&format!("{left}{right}")));
        }
        level = next;
    }

    level.into_iter().next().unwrap_or_else(|| EMPTY_ROOT.to_string())
}

/// Left-pad a hash to the fixed digest width.
pub fn pad_digest(value: &str) -> String {
    format!("{:0>width$}", value, width = DIGEST_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash("goldbach"), hash("goldbach"));
        assert_ne!(hash("goldbach"), hash("collatz"));
        assert_eq!(hash("").len(), DIGEST_WIDTH);
    }

    #[test]
    fn test_merkle_empty_is_zero_sentinel() {
        assert_eq!(merkle_root(&[]), EMPTY_ROOT);
        assert_eq!(EMPTY_ROOT.len(), DIGEST_WIDTH);
    }

    #[test]
    fn test_merkle_single_leaf_padded() {
        let root = merkle_root(&["abc123".to_string()]);
        assert_eq!(root.len(), DIGEST_WIDTH);
        assert!(root.ends_with("abc123"));
        assert!(root.starts_with('0'));
    }

    #[test]
    fn test_merkle_odd_leaf_duplicated() {
        let a = hash("a");
        let b = hash("b");
        let c = hash("c");
        let root = merkle_root(&[a.clone(), b.clone(), c.clone()]);

        // Manual derivation: (a+b), (c+c), then the pair of those.
        let left = hash(&format!("{a}{b}"));
        let right = hash(&format!("{c}{c}"));
        assert_eq!(root, hash(&format!("{left}{right}")));
    }

    #[test]
    fn test_merkle_order_matters() {
        let a = hash("a");
        let b = hash("b");
        assert_ne!(
            merkle_root(&[a.clone(), b.clone()]),
            merkle_root(&[b, a])
        );
    }
}
