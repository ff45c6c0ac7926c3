//! Signature-hash preimage model
//!
//! The preimage is the byte string whose hash256 a signature commits to
//! (BIP143 layout, as used with SIGHASH_FORKID):
//!
//! | field         | offset | width        |
//! |---------------|--------|--------------|
//! | version       | 0      | 4            |
//! | hashPrevouts  | 4      | 32           |
//! | hashSequence  | 36     | 32           |
//! | outpoint      | 68     | 36           |
//! | scriptCode    | 104    | VarInt + len |
//! | value         |        | 8            |
//! | sequence      |        | 4            |
//! | hashOutputs   |        | 32           |
//! | lockTime      |        | 4            |
//! | sighashType   |        | 4            |
//!
//! Sighash flags the host does not support natively are emulated by zeroing
//! byte ranges of the preimage and verifying an ECDSA signature over the
//! hash256 of the masked bytes.

use crate::config::log_rejection;
use crate::constants::*;
use crate::crypto::{ecdsa::verify_digest_signature, hash256};
use crate::error::{CovenantError, Result};
use crate::serialization::cursor::ByteCursor;
use crate::serialization::transaction::write_output;
use crate::serialization::varint::{decode_varint, encode_varint, varint_len};
use crate::types::*;
use std::ops::Range;

/// Sign all outputs
pub const SIGHASH_ALL: u32 = 0x01;
/// Sign no outputs
pub const SIGHASH_NONE: u32 = 0x02;
/// Sign only the output at the input's index
pub const SIGHASH_SINGLE: u32 = 0x03;
/// Replay-protected preimage layout flag
pub const SIGHASH_FORKID: u32 = 0x40;
/// Sign only the current input
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

const SIGHASH_BASE_MASK: u32 = 0x1f;

/// Byte ranges zeroed to emulate SIGHASH_ANYPREVOUT: hashPrevouts,
/// hashSequence and the spent outpoint
pub const ANYPREVOUT_MASK: &[Range<usize>] =
    &[PREIMAGE_HASH_PREVOUTS_OFFSET..PREIMAGE_SCRIPT_CODE_OFFSET];

/// Which outputs a signature commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SighashBase {
    All,
    None,
    Single,
}

/// Parsed 4-byte sighash flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SighashType {
    pub base: SighashBase,
    pub anyone_can_pay: bool,
    pub fork_id: bool,
}

impl SighashType {
    /// `SIGHASH_ALL | SIGHASH_FORKID`
    pub const ALL_FORKID: SighashType = SighashType {
        base: SighashBase::All,
        anyone_can_pay: false,
        fork_id: true,
    };

    /// `SIGHASH_SINGLE | SIGHASH_ANYONECANPAY | SIGHASH_FORKID`
    pub const SINGLE_ANYONECANPAY_FORKID: SighashType = SighashType {
        base: SighashBase::Single,
        anyone_can_pay: true,
        fork_id: true,
    };

    /// Parse sighash flags
    ///
    /// The base type must be ALL, NONE or SINGLE and no bits besides
    /// ANYONECANPAY and FORKID may be set.
    pub fn from_u32(raw: u32) -> Result<Self> {
        if raw & !(SIGHASH_BASE_MASK | SIGHASH_FORKID | SIGHASH_ANYONECANPAY) != 0 {
            return Err(CovenantError::InvalidSighashType(raw));
        }
        let base = match raw & SIGHASH_BASE_MASK {
            SIGHASH_ALL => SighashBase::All,
            SIGHASH_NONE => SighashBase::None,
            SIGHASH_SINGLE => SighashBase::Single,
            _ => return Err(CovenantError::InvalidSighashType(raw)),
        };
        Ok(SighashType {
            base,
            anyone_can_pay: raw & SIGHASH_ANYONECANPAY != 0,
            fork_id: raw & SIGHASH_FORKID != 0,
        })
    }

    pub fn to_u32(self) -> u32 {
        let mut raw = match self.base {
            SighashBase::All => SIGHASH_ALL,
            SighashBase::None => SIGHASH_NONE,
            SighashBase::Single => SIGHASH_SINGLE,
        };
        if self.anyone_can_pay {
            raw |= SIGHASH_ANYONECANPAY;
        }
        if self.fork_id {
            raw |= SIGHASH_FORKID;
        }
        raw
    }
}

impl TryFrom<u32> for SighashType {
    type Error = CovenantError;

    fn try_from(raw: u32) -> Result<Self> {
        SighashType::from_u32(raw)
    }
}

/// Decoded sighash preimage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Preimage {
    version: u32,
    hash_prevouts: Hash,
    hash_sequence: Hash,
    outpoint: OutPoint,
    script_code: ByteString,
    value: Satoshis,
    sequence: u32,
    hash_outputs: Hash,
    lock_time: u32,
    sighash_type: u32,
}

impl Preimage {
    /// Decode a preimage at the fixed offsets of the BIP143 layout
    ///
    /// Exactly 52 bytes must follow the scriptCode.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_PREIMAGE_LEN {
            return Err(CovenantError::malformed(format!(
                "preimage of {} bytes is shorter than the minimum {MIN_PREIMAGE_LEN}",
                bytes.len()
            )));
        }
        let mut cursor = ByteCursor::new(bytes);
        let version = u32::from_le_bytes(cursor.take_array::<4>()?);
        let hash_prevouts = cursor.take_array::<32>()?;
        let hash_sequence = cursor.take_array::<32>()?;
        let txid = cursor.take_array::<32>()?;
        let index = u32::from_le_bytes(cursor.take_array::<4>()?);
        debug_assert_eq!(cursor.position(), PREIMAGE_SCRIPT_CODE_OFFSET);

        // Canonical width only, so serialize() reproduces the input exactly
        let (len, width) = decode_varint(cursor.slice_ref(cursor.position(), None)?)?;
        cursor.skip(width)?;
        let len = usize::try_from(len)
            .map_err(|_| CovenantError::malformed(format!("scriptCode length {len} too large")))?;
        let script_code = ByteString::from(cursor.take(len)?);

        if cursor.remaining() != PREIMAGE_TAIL_LEN {
            return Err(CovenantError::malformed(format!(
                "expected {PREIMAGE_TAIL_LEN} bytes after scriptCode, found {}",
                cursor.remaining()
            )));
        }
        let value = u64::from_le_bytes(cursor.take_array::<8>()?);
        let sequence = u32::from_le_bytes(cursor.take_array::<4>()?);
        let hash_outputs = cursor.take_array::<32>()?;
        let lock_time = u32::from_le_bytes(cursor.take_array::<4>()?);
        let sighash_type = u32::from_le_bytes(cursor.take_array::<4>()?);

        Ok(Preimage {
            version,
            hash_prevouts,
            hash_sequence,
            outpoint: OutPoint { txid, index },
            script_code,
            value,
            sequence,
            hash_outputs,
            lock_time,
            sighash_type,
        })
    }

    /// Encode back to bytes; the exact inverse of [`Preimage::parse`]
    pub fn serialize(&self) -> ByteString {
        let mut out = Vec::with_capacity(
            PREIMAGE_SCRIPT_CODE_OFFSET
                + varint_len(self.script_code.len() as u64)
                + self.script_code.len()
                + PREIMAGE_TAIL_LEN,
        );
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.hash_prevouts);
        out.extend_from_slice(&self.hash_sequence);
        out.extend_from_slice(&self.outpoint.to_bytes());
        out.extend_from_slice(&encode_varint(self.script_code.len() as u64));
        out.extend_from_slice(&self.script_code);
        out.extend_from_slice(&self.value.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&self.hash_outputs);
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out.extend_from_slice(&self.sighash_type.to_le_bytes());
        out.into()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn hash_prevouts(&self) -> &Hash {
        &self.hash_prevouts
    }

    pub fn hash_sequence(&self) -> &Hash {
        &self.hash_sequence
    }

    /// The outpoint being spent
    pub fn outpoint(&self) -> OutPoint {
        self.outpoint
    }

    /// Locking script of the output being spent
    pub fn script_code(&self) -> &ByteString {
        &self.script_code
    }

    /// Value locked in the output being spent
    pub fn value(&self) -> Satoshis {
        self.value
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Commitment to the spending transaction's outputs
    pub fn hash_outputs(&self) -> &Hash {
        &self.hash_outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    /// Raw 4-byte sighash flags
    pub fn sighash_type(&self) -> u32 {
        self.sighash_type
    }

    /// Parsed sighash flags
    pub fn sighash_flags(&self) -> Result<SighashType> {
        SighashType::from_u32(self.sighash_type)
    }
}

/// Digest a signature over `preimage` commits to
pub fn sighash(preimage: &Preimage) -> Hash {
    hash256(&preimage.serialize())
}

/// Build the preimage for spending `tx.inputs[input_index]`
///
/// `script_code` and `value` describe the output being spent.
pub fn compute_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    value: Satoshis,
    sighash_type: SighashType,
) -> Result<Preimage> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        CovenantError::malformed(format!(
            "input index {input_index} out of range for {} inputs",
            tx.inputs.len()
        ))
    })?;

    let hash_prevouts = if sighash_type.anyone_can_pay {
        [0u8; 32]
    } else {
        let mut buf = Vec::with_capacity(tx.inputs.len() * OUTPOINT_LEN);
        for i in &tx.inputs {
            buf.extend_from_slice(&i.prevout.to_bytes());
        }
        hash256(&buf)
    };

    let hash_sequence =
        if sighash_type.anyone_can_pay || sighash_type.base != SighashBase::All {
            [0u8; 32]
        } else {
            let mut buf = Vec::with_capacity(tx.inputs.len() * SEQUENCE_LEN);
            for i in &tx.inputs {
                buf.extend_from_slice(&i.sequence.to_le_bytes());
            }
            hash256(&buf)
        };

    let hash_outputs = match sighash_type.base {
        SighashBase::All => {
            let mut buf = Vec::new();
            for o in &tx.outputs {
                write_output(&mut buf, o.value, &o.script);
            }
            hash256(&buf)
        }
        SighashBase::Single if input_index < tx.outputs.len() => {
            let o = &tx.outputs[input_index];
            let mut buf = Vec::new();
            write_output(&mut buf, o.value, &o.script);
            hash256(&buf)
        }
        _ => [0u8; 32],
    };

    Ok(Preimage {
        version: tx.version as u32,
        hash_prevouts,
        hash_sequence,
        outpoint: input.prevout,
        script_code: script_code.into(),
        value,
        sequence: input.sequence,
        hash_outputs,
        lock_time: tx.lock_time,
        sighash_type: sighash_type.to_u32(),
    })
}

/// Copy of `preimage` with each half-open range zeroed
pub fn reconstruct_masked(preimage: &[u8], masked_ranges: &[Range<usize>]) -> Result<ByteString> {
    let mut out = preimage.to_vec();
    for range in masked_ranges {
        if range.start > range.end || range.end > out.len() {
            return Err(CovenantError::malformed(format!(
                "mask range [{}, {}) outside preimage of {} bytes",
                range.start,
                range.end,
                out.len()
            )));
        }
        out[range.clone()].fill(0);
    }
    Ok(out.into())
}

/// hash256 of the masked preimage
pub fn masked_digest(preimage: &[u8], masked_ranges: &[Range<usize>]) -> Result<Hash> {
    reconstruct_masked(preimage, masked_ranges).map(|masked| hash256(&masked))
}

/// Script-number form of a digest: `reverse(digest) || 0x00`
///
/// Read as a little-endian script number this is the digest taken as an
/// unsigned big-endian integer; the trailing zero keeps it non-negative.
pub fn digest_scalar_script_num(digest: &Hash) -> ByteString {
    let mut out = Vec::with_capacity(33);
    out.extend(digest.iter().rev());
    out.push(0x00);
    out.into()
}

/// Check an ECDSA signature over the hash256 of the masked preimage
///
/// A bad range is `MalformedInput`; a key or signature that does not verify
/// against the digest is `CommitmentMismatch`.
pub fn check_masked_signature(
    preimage: &[u8],
    masked_ranges: &[Range<usize>],
    signature: &[u8],
    pubkey: &[u8],
) -> Result<()> {
    let digest = masked_digest(preimage, masked_ranges)?;
    if !verify_digest_signature(pubkey, signature, &digest) {
        return Err(CovenantError::mismatch(format!(
            "signature does not match digest {}",
            hex::encode(digest)
        )));
    }
    Ok(())
}

/// Boolean form of [`check_masked_signature`]
///
/// Returns false on any malformed range, key or signature.
pub fn verify_masked_signature(
    preimage: &[u8],
    masked_ranges: &[Range<usize>],
    signature: &[u8],
    pubkey: &[u8],
) -> bool {
    match check_masked_signature(preimage, masked_ranges, signature, pubkey) {
        Ok(()) => true,
        Err(e) => {
            log_rejection("verify_masked_signature", &e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![
                TransactionInput {
                    prevout: OutPoint { txid: [0xaa; 32], index: 1 },
                    script_sig: ByteString::new(),
                    sequence: 0xffff_ffff,
                },
                TransactionInput {
                    prevout: OutPoint { txid: [0xbb; 32], index: 0 },
                    script_sig: ByteString::new(),
                    sequence: 0xffff_fffe,
                },
            ],
            outputs: vec![
                TxOutput::new(1000, vec![0x51u8]),
                TxOutput::new(2000, vec![0x52u8]),
            ],
            lock_time: 500,
        }
    }

    #[test]
    fn test_sighash_type_parsing() {
        assert_eq!(SighashType::from_u32(0x41).unwrap(), SighashType::ALL_FORKID);
        assert_eq!(
            SighashType::from_u32(0xc3).unwrap(),
            SighashType::SINGLE_ANYONECANPAY_FORKID
        );
        assert_eq!(SighashType::ALL_FORKID.to_u32(), 0x41);
        assert_eq!(SighashType::SINGLE_ANYONECANPAY_FORKID.to_u32(), 0xc3);
        assert!(!SighashType::from_u32(0x01).unwrap().fork_id);

        assert_eq!(
            SighashType::from_u32(0x00),
            Err(CovenantError::InvalidSighashType(0))
        );
        assert!(SighashType::from_u32(0x04).is_err());
        assert!(SighashType::from_u32(0x141).is_err());
    }

    #[test]
    fn test_parse_serialize_inverse() {
        let preimage =
            compute_preimage(&sample_tx(), 0, &[0x76, 0xa9], 5000, SighashType::ALL_FORKID)
                .unwrap();
        let bytes = preimage.serialize();
        assert_eq!(bytes.len(), PREIMAGE_SCRIPT_CODE_OFFSET + 1 + 2 + PREIMAGE_TAIL_LEN);
        assert_eq!(Preimage::parse(&bytes).unwrap(), preimage);
    }

    #[test]
    fn test_field_offsets() {
        let preimage =
            compute_preimage(&sample_tx(), 1, &[0xac], 7777, SighashType::ALL_FORKID).unwrap();
        let bytes = preimage.serialize();
        assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
        assert_eq!(
            &bytes[PREIMAGE_HASH_PREVOUTS_OFFSET..PREIMAGE_HASH_SEQUENCE_OFFSET],
            preimage.hash_prevouts()
        );
        assert_eq!(
            &bytes[PREIMAGE_HASH_SEQUENCE_OFFSET..PREIMAGE_OUTPOINT_OFFSET],
            preimage.hash_sequence()
        );
        assert_eq!(
            &bytes[PREIMAGE_OUTPOINT_OFFSET..PREIMAGE_SCRIPT_CODE_OFFSET],
            &preimage.outpoint().to_bytes()
        );
        assert_eq!(&bytes[68..100], &[0xbb; 32]);
        assert_eq!(&bytes[104..106], &[0x01, 0xac]);
        assert_eq!(&bytes[106..114], &7777u64.to_le_bytes());
        assert_eq!(&bytes[114..118], &0xffff_fffeu32.to_le_bytes());
        assert_eq!(&bytes[118..150], preimage.hash_outputs());
        assert_eq!(&bytes[150..154], &500u32.to_le_bytes());
        assert_eq!(&bytes[154..158], &0x41u32.to_le_bytes());
    }

    #[test]
    fn test_parse_rejects_wrong_tail() {
        let preimage =
            compute_preimage(&sample_tx(), 0, &[0x51], 1, SighashType::ALL_FORKID).unwrap();
        let mut bytes = preimage.serialize().into_vec();
        bytes.push(0);
        assert!(matches!(
            Preimage::parse(&bytes),
            Err(CovenantError::MalformedInput(_))
        ));
        bytes.truncate(bytes.len() - 2);
        assert!(Preimage::parse(&bytes).is_err());
        assert!(Preimage::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_hash_fields_follow_flags() {
        let tx = sample_tx();
        let all = compute_preimage(&tx, 0, &[], 0, SighashType::ALL_FORKID).unwrap();
        assert_ne!(all.hash_prevouts(), &[0u8; 32]);
        assert_ne!(all.hash_sequence(), &[0u8; 32]);

        let mut outputs = Vec::new();
        for o in &tx.outputs {
            write_output(&mut outputs, o.value, &o.script);
        }
        assert_eq!(all.hash_outputs(), &hash256(&outputs));

        let acp_single =
            compute_preimage(&tx, 1, &[], 0, SighashType::SINGLE_ANYONECANPAY_FORKID).unwrap();
        assert_eq!(acp_single.hash_prevouts(), &[0u8; 32]);
        assert_eq!(acp_single.hash_sequence(), &[0u8; 32]);
        let mut second = Vec::new();
        write_output(&mut second, 2000, &[0x52]);
        assert_eq!(acp_single.hash_outputs(), &hash256(&second));

        let none = SighashType {
            base: SighashBase::None,
            anyone_can_pay: false,
            fork_id: true,
        };
        let none = compute_preimage(&tx, 0, &[], 0, none).unwrap();
        assert_ne!(none.hash_prevouts(), &[0u8; 32]);
        assert_eq!(none.hash_sequence(), &[0u8; 32]);
        assert_eq!(none.hash_outputs(), &[0u8; 32]);
    }

    #[test]
    fn test_single_without_matching_output_commits_to_zero() {
        let mut tx = sample_tx();
        tx.outputs.truncate(1);
        let preimage =
            compute_preimage(&tx, 1, &[], 0, SighashType::SINGLE_ANYONECANPAY_FORKID).unwrap();
        assert_eq!(preimage.hash_outputs(), &[0u8; 32]);
    }

    #[test]
    fn test_compute_preimage_bad_input_index() {
        assert!(compute_preimage(&sample_tx(), 2, &[], 0, SighashType::ALL_FORKID).is_err());
    }

    #[test]
    fn test_anyprevout_mask_zeroes_prevout_fields() {
        let preimage =
            compute_preimage(&sample_tx(), 0, &[0x51], 1, SighashType::ALL_FORKID).unwrap();
        let bytes = preimage.serialize();
        let masked = reconstruct_masked(&bytes, ANYPREVOUT_MASK).unwrap();
        assert_eq!(&masked[..4], &bytes[..4]);
        assert!(masked[4..104].iter().all(|&b| b == 0));
        assert_eq!(&masked[104..], &bytes[104..]);
    }

    #[test]
    fn test_mask_out_of_range() {
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = [5..3];
        assert!(reconstruct_masked(&[0u8; 10], &[0..11]).is_err());
        assert!(reconstruct_masked(&[0u8; 10], &reversed).is_err());
        assert_eq!(reconstruct_masked(&[1u8; 10], &[]).unwrap().as_bytes(), &[1u8; 10]);
    }

    #[test]
    fn test_digest_scalar_script_num() {
        let digest = hash256(b"covenant");
        let num = digest_scalar_script_num(&digest);
        assert_eq!(num.len(), 33);
        assert_eq!(num[32], 0x00);
        let mut back: Vec<u8> = num[..32].to_vec();
        back.reverse();
        assert_eq!(back, digest.to_vec());
    }
}
