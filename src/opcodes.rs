//! Script opcode constants used by output templates and state scripts
//!
//! Reference: Bitcoin Core `script/script.h`

// ============================================================================
// PUSH DATA OPCODES (0x00 - 0x4e)
// ============================================================================

/// OP_FALSE - Push empty array
pub const OP_FALSE: u8 = 0x00;

/// Largest length that is its own push opcode (OP_DATA_75)
pub const MAX_DIRECT_PUSH: u8 = 0x4b;

/// OP_PUSHDATA1 - Push next byte as data length
pub const OP_PUSHDATA1: u8 = 0x4c;

/// OP_PUSHDATA2 - Push next 2 bytes (little-endian) as data length
pub const OP_PUSHDATA2: u8 = 0x4d;

/// OP_PUSHDATA4 - Push next 4 bytes (little-endian) as data length
pub const OP_PUSHDATA4: u8 = 0x4e;

// ============================================================================
// FLOW CONTROL
// ============================================================================

/// OP_RETURN - Marks the start of unspendable data (state region)
pub const OP_RETURN: u8 = 0x6a;

// ============================================================================
// STACK / BITWISE / CRYPTO
// ============================================================================

/// OP_DUP - Duplicates the top stack item
pub const OP_DUP: u8 = 0x76;

/// OP_EQUALVERIFY - OP_EQUAL followed by OP_VERIFY
pub const OP_EQUALVERIFY: u8 = 0x88;

/// OP_HASH160 - SHA-256 followed by RIPEMD-160
pub const OP_HASH160: u8 = 0xa9;

/// OP_CHECKSIG - Verify signature against public key
pub const OP_CHECKSIG: u8 = 0xac;
