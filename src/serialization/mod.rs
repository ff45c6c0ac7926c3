//! Bitcoin wire format serialization/deserialization
//!
//! Serialization here must match the network's canonical encoding byte for
//! byte: the covenant check compares hashes of re-serialized data against
//! hashes committed by the execution environment.
//!
//! All serialization uses little-endian byte order (Bitcoin standard).

pub mod cursor;
pub mod transaction;
pub mod varint;

pub use cursor::ByteCursor;
pub use transaction::{deserialize_transaction, serialize_output, serialize_transaction};
pub use varint::{decode_varint, encode_varint, varint_len, VarIntError};
