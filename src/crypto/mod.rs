//! Hash functions and signature verification
//!
//! Every commitment the engine checks is one of three digests:
//! - `sha256`: single SHA-256
//! - `hash256`: SHA-256 applied twice (txids, sighash digests, hashOutputs)
//! - `hash160`: RIPEMD-160 of SHA-256 (public key hashes, contract script hashes)

use crate::types::{Hash, Hash160};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub mod ecdsa;

/// Single SHA256 hash
#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Double SHA256 hash (Bitcoin standard)
#[inline]
pub fn hash256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// RIPEMD160(SHA256(data))
#[inline]
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    let mut result = [0u8; 20];
    result.copy_from_slice(&ripemd);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256(b""),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn test_hash256_empty() {
        assert_eq!(
            hash256(b""),
            hex!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")
        );
    }

    #[test]
    fn test_hash256_is_sha256_twice() {
        let data = b"covenant";
        assert_eq!(hash256(data), sha256(&sha256(data)));
    }

    #[test]
    fn test_hash160_empty() {
        assert_eq!(hash160(b""), hex!("b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"));
    }
}
