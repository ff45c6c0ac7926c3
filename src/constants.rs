//! Layout constants for transactions, preimages and state scripts

/// Transaction id length in bytes
pub const TXID_LEN: usize = 32;

/// Outpoint length: txid (32) + output index (4)
pub const OUTPOINT_LEN: usize = 36;

/// Serialized output value width
pub const OUTPUT_VALUE_LEN: usize = 8;

/// Input sequence width
pub const SEQUENCE_LEN: usize = 4;

/// Maximum transaction size: 1MB
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Transaction version width
pub const VERSION_LEN: usize = 4;

/// Public key hash length (hash160)
pub const PUBKEY_HASH_LEN: usize = 20;

/// Default bound on inputs scanned by the output extractor
pub const DEFAULT_MAX_INPUTS: usize = 3;

/// Default bound on outputs scanned by the output extractor
pub const DEFAULT_MAX_OUTPUTS: usize = 3;

// ============================================================================
// SIGHASH PREIMAGE LAYOUT
// ============================================================================

/// Offset of hashPrevouts
pub const PREIMAGE_HASH_PREVOUTS_OFFSET: usize = 4;

/// Offset of hashSequence
pub const PREIMAGE_HASH_SEQUENCE_OFFSET: usize = 36;

/// Offset of the spent outpoint
pub const PREIMAGE_OUTPOINT_OFFSET: usize = 68;

/// Offset of the varint-prefixed scriptCode
pub const PREIMAGE_SCRIPT_CODE_OFFSET: usize = 104;

/// Bytes following the scriptCode: value(8) + sequence(4) + hashOutputs(32)
/// + lockTime(4) + sighashType(4)
pub const PREIMAGE_TAIL_LEN: usize = 52;

/// Smallest possible preimage: fixed head, 1-byte empty scriptCode, fixed tail
pub const MIN_PREIMAGE_LEN: usize = PREIMAGE_SCRIPT_CODE_OFFSET + 1 + PREIMAGE_TAIL_LEN;

// ============================================================================
// STATE SCRIPT LAYOUT
// ============================================================================

/// Trailing state-length field: 1-byte push header + 2-byte length
pub const STATE_LEN_FIELD_LEN: usize = 3;

/// Largest state region the 2-byte (signed script number) trailer can describe
pub const MAX_STATE_LEN: usize = 0x7fff;
