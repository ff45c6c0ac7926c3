//! Field extraction from raw serialized transactions
//!
//! These readers walk a transaction the way on-chain script code does: with
//! fixed iteration bounds and no full deserialization. The output section is
//! reached by skipping at most `max_inputs` inputs; any transaction with more
//! inputs or outputs than the configured bounds is rejected.

use crate::config::{log_rejection, EngineConfig, TxParseLimits};
use crate::constants::{OUTPOINT_LEN, OUTPUT_VALUE_LEN, SEQUENCE_LEN, TXID_LEN, VERSION_LEN};
use crate::crypto::{hash160, hash256};
use crate::error::{CovenantError, Result};
use crate::serialization::cursor::ByteCursor;
use crate::types::{ByteString, Hash, Hash160, OutPoint, TxOutput};

/// Bounded reader for raw transaction fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxFieldExtractor {
    limits: TxParseLimits,
}

impl TxFieldExtractor {
    pub fn new(limits: TxParseLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tx_parse)
    }

    pub fn limits(&self) -> TxParseLimits {
        self.limits
    }

    /// Extract the serialized output at `output_index`: 8-byte value, VarInt
    /// script length and script, exactly as it appears on the wire
    pub fn read_output_bytes(&self, tx: &[u8], output_index: usize) -> Result<ByteString> {
        let mut cursor = ByteCursor::new(tx);
        cursor.skip(VERSION_LEN)?;

        let input_count = cursor.take_varint()?;
        if input_count > self.limits.max_inputs as u64 {
            return Err(CovenantError::malformed(format!(
                "{input_count} inputs exceed the bound of {}",
                self.limits.max_inputs
            )));
        }
        for _ in 0..input_count {
            cursor.skip(OUTPOINT_LEN)?;
            cursor.take_var_bytes()?;
            cursor.skip(SEQUENCE_LEN)?;
        }

        let output_count = cursor.take_varint()?;
        if output_count > self.limits.max_outputs as u64 {
            return Err(CovenantError::malformed(format!(
                "{output_count} outputs exceed the bound of {}",
                self.limits.max_outputs
            )));
        }
        log::trace!(
            "read_output: {input_count} inputs, {output_count} outputs, index {output_index}"
        );
        if output_index as u64 >= output_count {
            return Err(CovenantError::malformed(format!(
                "output index {output_index} out of range for {output_count} outputs"
            )));
        }

        for _ in 0..output_index {
            cursor.skip(OUTPUT_VALUE_LEN)?;
            cursor.take_var_bytes()?;
        }
        let start = cursor.position();
        cursor.skip(OUTPUT_VALUE_LEN)?;
        cursor.take_var_bytes()?;
        cursor.slice(start, Some(cursor.position()))
    }

    /// Decode the output at `output_index`
    pub fn read_output(&self, tx: &[u8], output_index: usize) -> Result<TxOutput> {
        let output = self.read_output_bytes(tx, output_index)?;
        let mut cursor = ByteCursor::new(&output);
        let value = cursor.take_le_uint(OUTPUT_VALUE_LEN)?;
        let script = cursor.take_var_bytes()?;
        Ok(TxOutput::new(value, script))
    }

    /// Check that the output referenced by prevout `i` of `prevouts` is
    /// locked by a script hashing to `expected_hash`
    ///
    /// `prev_tx` must be the full serialized transaction whose hash256 is the
    /// txid in that prevout.
    pub fn check_contract_by_hash(
        &self,
        prevouts: &[u8],
        i: usize,
        prev_tx: &[u8],
        expected_hash: &Hash160,
    ) -> Result<()> {
        let outpoint = get_prevout(prevouts, i)?;

        let prev_txid = txid(prev_tx);
        if prev_txid != outpoint.txid {
            return Err(CovenantError::mismatch(format!(
                "prevout {i} txid {} does not match supplied transaction {}",
                hex::encode(outpoint.txid),
                hex::encode(prev_txid)
            )));
        }

        let output = self.read_output(prev_tx, outpoint.index as usize)?;
        let script_hash = hash160(&output.script);
        if &script_hash != expected_hash {
            return Err(CovenantError::mismatch(format!(
                "script hash {} does not match expected {}",
                hex::encode(script_hash),
                hex::encode(expected_hash)
            )));
        }
        Ok(())
    }

    /// Boolean form of [`Self::check_contract_by_hash`]
    pub fn verify_contract_by_hash(
        &self,
        prevouts: &[u8],
        i: usize,
        prev_tx: &[u8],
        expected_hash: &Hash160,
    ) -> bool {
        match self.check_contract_by_hash(prevouts, i, prev_tx, expected_hash) {
            Ok(()) => true,
            Err(e) => {
                log_rejection("verify_contract_by_hash", &e);
                false
            }
        }
    }
}

/// Locking script of a serialized output (value, VarInt length, script)
///
/// Bytes after the script are ignored.
pub fn get_script_code_from_output(output: &[u8]) -> Result<ByteString> {
    let mut cursor = ByteCursor::new(output);
    cursor.skip(OUTPUT_VALUE_LEN)?;
    cursor.take_var_bytes().map(ByteString::from)
}

/// Transaction id: hash256 of the serialized transaction, internal byte order
pub fn txid(tx: &[u8]) -> Hash {
    hash256(tx)
}

/// Number of outpoints in a concatenated prevouts blob
pub fn prevout_count(prevouts: &[u8]) -> Result<usize> {
    if prevouts.len() % OUTPOINT_LEN != 0 {
        return Err(CovenantError::malformed(format!(
            "prevouts length {} is not a multiple of {OUTPOINT_LEN}",
            prevouts.len()
        )));
    }
    Ok(prevouts.len() / OUTPOINT_LEN)
}

/// Outpoint `i` of a concatenated prevouts blob
pub fn get_prevout(prevouts: &[u8], i: usize) -> Result<OutPoint> {
    let start = i
        .checked_mul(OUTPOINT_LEN)
        .ok_or_else(|| CovenantError::malformed(format!("prevout index {i} too large")))?;
    let cursor = ByteCursor::new(prevouts);
    let bytes = cursor.slice_ref(start, start.checked_add(OUTPOINT_LEN))?;
    let mut txid = [0u8; TXID_LEN];
    txid.copy_from_slice(&bytes[..TXID_LEN]);
    let index = cursor.read_le_uint(start + TXID_LEN, 4)? as u32;
    Ok(OutPoint { txid, index })
}

/// Txid of outpoint `i`, 32 bytes in wire order
pub fn get_prevout_txid(prevouts: &[u8], i: usize) -> Result<Hash> {
    get_prevout(prevouts, i).map(|o| o.txid)
}

/// Output index of outpoint `i`
pub fn get_prevout_output_index(prevouts: &[u8], i: usize) -> Result<u32> {
    get_prevout(prevouts, i).map(|o| o.index)
}
