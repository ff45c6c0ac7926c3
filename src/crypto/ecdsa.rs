//! ECDSA verification over an arbitrary 32-byte digest
//!
//! This is the general-purpose curve check used for emulated sighash flags:
//! the digest is not the native signature hash but one recomputed from a
//! masked preimage, so the script interpreter's CHECKSIG path cannot be used.

use crate::types::Hash;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, VerifyOnly};

thread_local! {
    /// Verification-only context, reused across calls on the same thread
    static SECP256K1_CONTEXT: Secp256k1<VerifyOnly> = Secp256k1::verification_only();
}

/// Parse a signature given either as 64 compact bytes (r || s) or DER
fn parse_signature(signature_bytes: &[u8]) -> Option<Signature> {
    if signature_bytes.len() == 64 {
        if let Ok(sig) = Signature::from_compact(signature_bytes) {
            return Some(sig);
        }
    }
    Signature::from_der(signature_bytes).ok()
}

/// Verify an ECDSA signature against a digest
///
/// `digest` is used as the big-endian message scalar, exactly as produced by
/// `hash256`. The public key may be compressed or uncompressed SEC1.
/// High-S signatures are normalized before verification.
///
/// Returns `false` for any unparsable key or signature.
pub fn verify_digest_signature(pubkey_bytes: &[u8], signature_bytes: &[u8], digest: &Hash) -> bool {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    let mut signature = match parse_signature(signature_bytes) {
        Some(sig) => sig,
        None => return false,
    };
    signature.normalize_s();

    let message = Message::from_digest(*digest);
    SECP256K1_CONTEXT.with(|secp| secp.verify_ecdsa(&message, &signature, &pubkey).is_ok())
}
