//! Core value types exchanged by the engine

use crate::error::{CovenantError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash type: 256-bit hash (hash256 / sha256 output)
pub type Hash = [u8; 32];

/// 160-bit hash (RIPEMD160(SHA256(x)))
pub type Hash160 = [u8; 20];

/// Value in satoshis
pub type Satoshis = u64;

/// Immutable byte sequence
///
/// All transaction, script and preimage data flows through the engine as a
/// `ByteString`. Hex is only produced or consumed at the boundary through
/// [`ByteString::from_hex`] and [`ByteString::to_hex`], never by string
/// concatenation.
#[repr(transparent)]
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteString(#[serde(with = "hex")] Vec<u8>);

impl ByteString {
    /// Create an empty ByteString
    #[inline]
    pub fn new() -> Self {
        ByteString(Vec::new())
    }

    /// Decode a ByteString from hex
    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s)
            .map(ByteString)
            .map_err(|e| CovenantError::malformed(format!("invalid hex: {e}")))
    }

    /// Encode as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Borrow the underlying bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying vector
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Concatenate a sequence of byte strings into a fresh one
    pub fn concat<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a ByteString>,
    {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(&part.0);
        }
        ByteString(out)
    }
}

impl std::ops::Deref for ByteString {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for ByteString {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ByteString {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        ByteString(bytes)
    }
}

impl From<&[u8]> for ByteString {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        ByteString(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for ByteString {
    #[inline]
    fn from(bytes: [u8; N]) -> Self {
        ByteString(bytes.to_vec())
    }
}

impl From<ByteString> for Vec<u8> {
    #[inline]
    fn from(bytes: ByteString) -> Self {
        bytes.0
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({})", self.to_hex())
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Reference to a previous transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction id in wire (internal) byte order
    pub txid: Hash,
    pub index: u32,
}

impl OutPoint {
    /// Wire encoding: 32-byte txid followed by the 4-byte little-endian index
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(&self.txid);
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Satoshis,
    pub script: ByteString,
}

impl TxOutput {
    pub fn new(value: Satoshis, script: impl Into<ByteString>) -> Self {
        TxOutput {
            value,
            script: script.into(),
        }
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction (legacy, non-witness layout)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}
