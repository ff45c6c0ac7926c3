//! Transaction wire format serialization/deserialization
//!
//! Legacy (non-witness) layout:
//! - Version (4 bytes, little-endian, signed)
//! - Input count (VarInt)
//! - For each input: prevout txid (32), prevout index (4), scriptSig (VarInt + bytes), sequence (4)
//! - Output count (VarInt)
//! - For each output: value (8), scriptPubKey (VarInt + bytes)
//! - Lock time (4 bytes, little-endian)

use super::cursor::ByteCursor;
use super::varint::{decode_varint, encode_varint};
use crate::constants::MAX_TX_SIZE;
use crate::error::{CovenantError, Result};
use crate::types::*;

/// Serialize one output: value (8 bytes LE) + VarInt script length + script
#[inline]
pub fn serialize_output(value: Satoshis, script: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(8 + 9 + script.len());
    write_output(&mut result, value, script);
    result
}

pub(crate) fn write_output(buf: &mut Vec<u8>, value: Satoshis, script: &[u8]) {
    buf.extend_from_slice(&value.to_le_bytes());
    buf.extend_from_slice(&encode_varint(script.len() as u64));
    buf.extend_from_slice(script);
}

/// Serialize a transaction to wire format
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let estimated_size = 4
        + 9
        + tx.inputs.iter().map(|i| 41 + 9 + i.script_sig.len()).sum::<usize>()
        + 9
        + tx.outputs.iter().map(|o| 8 + 9 + o.script.len()).sum::<usize>()
        + 4;
    let mut result = Vec::with_capacity(estimated_size.min(MAX_TX_SIZE));

    result.extend_from_slice(&tx.version.to_le_bytes());

    result.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        result.extend_from_slice(&input.prevout.to_bytes());
        result.extend_from_slice(&encode_varint(input.script_sig.len() as u64));
        result.extend_from_slice(&input.script_sig);
        result.extend_from_slice(&input.sequence.to_le_bytes());
    }

    result.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        write_output(&mut result, output.value, &output.script);
    }

    result.extend_from_slice(&tx.lock_time.to_le_bytes());

    result
}

/// Read a canonical VarInt at the cursor position and advance
fn take_compact_size(cursor: &mut ByteCursor<'_>) -> Result<u64> {
    let rest = cursor.slice_ref(cursor.position(), None)?;
    let (value, width) = decode_varint(rest)?;
    cursor.skip(width)?;
    Ok(value)
}

/// Read a canonical count, rejecting counts the remaining bytes cannot hold
fn take_count(cursor: &mut ByteCursor<'_>, min_entry_len: usize, what: &str) -> Result<usize> {
    let count = take_compact_size(cursor)?;
    if count > (cursor.remaining() / min_entry_len) as u64 {
        return Err(CovenantError::malformed(format!(
            "{what} count {count} exceeds remaining {} bytes",
            cursor.remaining()
        )));
    }
    Ok(count as usize)
}

fn take_script(cursor: &mut ByteCursor<'_>) -> Result<ByteString> {
    let len = take_compact_size(cursor)?;
    let len = usize::try_from(len)
        .map_err(|_| CovenantError::malformed(format!("script length {len} too large")))?;
    cursor.take(len).map(ByteString::from)
}

/// Deserialize a transaction from wire format
///
/// The whole buffer must be consumed; trailing bytes are rejected.
pub fn deserialize_transaction(data: &[u8]) -> Result<Transaction> {
    let mut cursor = ByteCursor::new(data);

    let version = i32::from_le_bytes(cursor.take_array::<4>()?);

    // Smallest input: outpoint (36) + empty script (1) + sequence (4)
    let input_count = take_count(&mut cursor, 41, "input")?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let txid = cursor.take_array::<32>()?;
        let index = u32::from_le_bytes(cursor.take_array::<4>()?);
        let script_sig = take_script(&mut cursor)?;
        let sequence = u32::from_le_bytes(cursor.take_array::<4>()?);
        inputs.push(TransactionInput {
            prevout: OutPoint { txid, index },
            script_sig,
            sequence,
        });
    }

    // Smallest output: value (8) + empty script (1)
    let output_count = take_count(&mut cursor, 9, "output")?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let value = u64::from_le_bytes(cursor.take_array::<8>()?);
        let script = take_script(&mut cursor)?;
        outputs.push(TxOutput { value, script });
    }

    let lock_time = u32::from_le_bytes(cursor.take_array::<4>()?);

    if !cursor.is_exhausted() {
        return Err(CovenantError::malformed(format!(
            "{} trailing bytes after transaction",
            cursor.remaining()
        )));
    }

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}
