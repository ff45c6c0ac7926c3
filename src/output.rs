//! Canonical output and script templates
//!
//! The covenant check hashes the concatenation of these serialized outputs,
//! so every byte here must match what the spending transaction carries.

use crate::constants::PUBKEY_HASH_LEN;
use crate::error::{CovenantError, Result};
use crate::opcodes::*;
use crate::serialization::transaction::write_output;
use crate::types::{ByteString, Hash160, Satoshis, TxOutput};

/// Serialize a single output: 8-byte LE value, VarInt script length, script
pub fn build_output(script: &[u8], value: Satoshis) -> ByteString {
    let mut buf = Vec::with_capacity(8 + 9 + script.len());
    write_output(&mut buf, value, script);
    buf.into()
}

/// Serialize outputs back to back, in the given order
pub fn build_outputs(outputs: &[TxOutput]) -> ByteString {
    let mut buf = Vec::with_capacity(outputs.iter().map(|o| 17 + o.script.len()).sum());
    for output in outputs {
        write_output(&mut buf, output.value, &output.script);
    }
    buf.into()
}

/// `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn build_pub_key_hash_script(pubkey_hash: &Hash160) -> ByteString {
    let mut script = Vec::with_capacity(PUBKEY_HASH_LEN + 5);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(PUBKEY_HASH_LEN as u8);
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script.into()
}

/// Serialized P2PKH output
pub fn build_pub_key_hash_output(pubkey_hash: &Hash160, value: Satoshis) -> ByteString {
    build_output(&build_pub_key_hash_script(pubkey_hash), value)
}

/// Optional P2PKH change output: empty when there is no change to return
pub fn build_change_output(pubkey_hash: &Hash160, value: Satoshis) -> ByteString {
    if value == 0 {
        return ByteString::new();
    }
    build_pub_key_hash_output(pubkey_hash, value)
}

/// Size of the push header `push_data` emits for `len` bytes of data
///
/// 1 for direct pushes (len <= 75), 2 for PUSHDATA1, 3 for PUSHDATA2, 5 for PUSHDATA4.
pub fn push_data_header_len(len: usize) -> usize {
    if len <= MAX_DIRECT_PUSH as usize {
        1
    } else if len <= 0xff {
        2
    } else if len <= 0xffff {
        3
    } else {
        5
    }
}

/// Append a push of `data` to `buf` using the smallest push header
pub(crate) fn write_push_data(buf: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = data.len();
    match push_data_header_len(len) {
        1 => buf.push(len as u8),
        2 => {
            buf.push(OP_PUSHDATA1);
            buf.push(len as u8);
        }
        3 => {
            buf.push(OP_PUSHDATA2);
            buf.extend_from_slice(&(len as u16).to_le_bytes());
        }
        _ => {
            let len32 = u32::try_from(len).map_err(|_| {
                CovenantError::unsupported(format!("push of {len} bytes exceeds PUSHDATA4"))
            })?;
            buf.push(OP_PUSHDATA4);
            buf.extend_from_slice(&len32.to_le_bytes());
        }
    }
    buf.extend_from_slice(data);
    Ok(())
}

/// Encode `data` as a single script push
///
/// An empty push is the single byte `OP_FALSE`.
pub fn push_data(data: &[u8]) -> Result<ByteString> {
    let mut buf = Vec::with_capacity(push_data_header_len(data.len()) + data.len());
    write_push_data(&mut buf, data)?;
    Ok(buf.into())
}

/// Provably unspendable data carrier: `OP_FALSE OP_RETURN <data>`
pub fn build_data_script(data: &[u8]) -> Result<ByteString> {
    let mut script = vec![OP_FALSE, OP_RETURN];
    write_push_data(&mut script, data)?;
    Ok(script.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_build_output_layout() {
        let out = build_output(&[0x51], 100_000);
        assert_eq!(out.as_bytes(), &hex!("a086010000000000 01 51"));
    }

    #[test]
    fn test_build_output_long_script_uses_fd_varint() {
        let script = vec![0u8; 0xfd];
        let out = build_output(&script, 1);
        assert_eq!(&out[8..11], &[0xfd, 0xfd, 0x00]);
        assert_eq!(out.len(), 8 + 3 + 0xfd);
    }

    #[test]
    fn test_p2pkh_template() {
        let script = build_pub_key_hash_script(&[0x11; 20]);
        assert_eq!(script.len(), 25);
        assert_eq!(&script[..3], &[0x76, 0xa9, 0x14]);
        assert_eq!(&script[3..23], &[0x11; 20]);
        assert_eq!(&script[23..], &[0x88, 0xac]);
    }

    #[test]
    fn test_change_output_skipped_when_zero() {
        assert!(build_change_output(&[0u8; 20], 0).is_empty());
        assert_eq!(build_change_output(&[0u8; 20], 1).len(), 8 + 1 + 25);
    }

    #[test]
    fn test_build_outputs_concatenates_in_order() {
        let a = TxOutput::new(1, vec![0xaau8]);
        let b = TxOutput::new(2, vec![0xbbu8]);
        let joined = build_outputs(&[a.clone(), b.clone()]);
        let expected = ByteString::concat([
            &build_output(&a.script, a.value),
            &build_output(&b.script, b.value),
        ]);
        assert_eq!(joined, expected);
        assert_ne!(joined, build_outputs(&[b, a]));
    }

    #[test]
    fn test_push_data_boundaries() {
        assert_eq!(push_data(&[]).unwrap().as_bytes(), &[0x00]);
        assert_eq!(push_data(&[0u8; 0x4b]).unwrap()[0], 0x4b);
        assert_eq!(&push_data(&[0u8; 0x4c]).unwrap()[..2], &[0x4c, 0x4c]);
        assert_eq!(&push_data(&[0u8; 0xff]).unwrap()[..2], &[0x4c, 0xff]);
        assert_eq!(&push_data(&[0u8; 0x100]).unwrap()[..3], &[0x4d, 0x00, 0x01]);
        assert_eq!(&push_data(&[0u8; 0xffff]).unwrap()[..3], &[0x4d, 0xff, 0xff]);
        assert_eq!(
            &push_data(&[0u8; 0x10000]).unwrap()[..5],
            &[0x4e, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_push_data_header_len() {
        assert_eq!(push_data_header_len(0), 1);
        assert_eq!(push_data_header_len(75), 1);
        assert_eq!(push_data_header_len(76), 2);
        assert_eq!(push_data_header_len(255), 2);
        assert_eq!(push_data_header_len(256), 3);
        assert_eq!(push_data_header_len(65535), 3);
        assert_eq!(push_data_header_len(65536), 5);
    }

    #[test]
    fn test_data_script() {
        let script = build_data_script(b"hi").unwrap();
        assert_eq!(script.as_bytes(), &[0x00, 0x6a, 0x02, b'h', b'i']);
    }
}
