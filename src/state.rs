//! Contract state embedded in a locking script
//!
//! A stateful locking script is laid out as
//!
//! ```text
//! <code part> OP_RETURN <field> <field> ... <02 len_lo len_hi>
//! ```
//!
//! Each field is a push: a length header (direct, PUSHDATA1, PUSHDATA2 or
//! PUSHDATA4) followed by the body. The final three bytes push the length of
//! the state region as a 2-byte script number, so the boundary between code
//! and state can be found by reading backward from the end of the script.
//!
//! Fields do not carry their type. Integers are minimal script numbers and
//! zero has an empty body; `false` is also an empty body. An empty byte
//! string, the integer 0 and `false` therefore all encode as the single byte
//! `00`, and the reader must know the expected type at each position.

use crate::config::{get_engine_config, StateCodecConfig};
use crate::constants::STATE_LEN_FIELD_LEN;
use crate::error::{CovenantError, Result};
use crate::opcodes::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_RETURN};
use crate::output::write_push_data;
use crate::serialization::cursor::ByteCursor;
use crate::types::ByteString;
use serde::{Deserialize, Serialize};

/// Push header of the trailing state-length field
const STATE_LEN_HEADER: u8 = 0x02;

/// Type of a state field, as known to the contract reading it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    Int,
    Bytes,
}

/// One typed state value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateField {
    Bool(bool),
    Int(i64),
    Bytes(ByteString),
}

impl StateField {
    pub fn kind(&self) -> FieldKind {
        match self {
            StateField::Bool(_) => FieldKind::Bool,
            StateField::Int(_) => FieldKind::Int,
            StateField::Bytes(_) => FieldKind::Bytes,
        }
    }
}

impl From<bool> for StateField {
    fn from(value: bool) -> Self {
        StateField::Bool(value)
    }
}

impl From<i64> for StateField {
    fn from(value: i64) -> Self {
        StateField::Int(value)
    }
}

impl From<ByteString> for StateField {
    fn from(value: ByteString) -> Self {
        StateField::Bytes(value)
    }
}

// ============================================================================
// SCRIPT NUMBERS
// ============================================================================

/// Minimal little-endian sign-magnitude encoding; zero is empty
pub fn encode_script_num(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    // Room for the sign bit
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode a script number; non-minimal encodings such as `00` are accepted
pub fn decode_script_num(bytes: &[u8]) -> Result<i64> {
    if bytes.len() > 9 {
        return Err(CovenantError::unsupported(format!(
            "script number of {} bytes exceeds 64 bits",
            bytes.len()
        )));
    }
    let Some((&last, _)) = bytes.split_last() else {
        return Ok(0);
    };
    let mut magnitude: u128 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let b = if i == bytes.len() - 1 { b & 0x7f } else { b };
        magnitude |= (b as u128) << (8 * i);
    }
    let value = if last & 0x80 != 0 {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };
    i64::try_from(value)
        .map_err(|_| CovenantError::unsupported(format!("script number {value} exceeds 64 bits")))
}

/// Script truthiness: false for all-zero bytes and negative zero
fn cast_to_bool(bytes: &[u8]) -> bool {
    match bytes.split_last() {
        None => false,
        Some((&last, rest)) => rest.iter().any(|&b| b != 0) || (last & 0x7f) != 0,
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Serializes state fields followed by the state-length trailer
#[derive(Debug, Clone)]
pub struct StateWriter {
    buf: Vec<u8>,
    max_state_len: usize,
}

impl Default for StateWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateWriter {
    /// Writer limited by the global engine configuration
    pub fn new() -> Self {
        Self::with_config(&get_engine_config().state)
    }

    pub fn with_config(config: &StateCodecConfig) -> Self {
        StateWriter {
            buf: Vec::new(),
            max_state_len: config.effective_max_state_len(),
        }
    }

    /// Push `data` with the smallest length header
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        write_push_data(&mut self.buf, data)?;
        Ok(self)
    }

    /// `01 01` for true, `00` for false
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        if value {
            self.buf.extend_from_slice(&[0x01, 0x01]);
        } else {
            self.buf.push(0x00);
        }
        self
    }

    pub fn write_int(&mut self, value: i64) -> &mut Self {
        let body = encode_script_num(value);
        self.buf.push(body.len() as u8);
        self.buf.extend_from_slice(&body);
        self
    }

    pub fn write_field(&mut self, field: &StateField) -> Result<&mut Self> {
        match field {
            StateField::Bool(b) => Ok(self.write_bool(*b)),
            StateField::Int(n) => Ok(self.write_int(*n)),
            StateField::Bytes(bytes) => self.write_bytes(bytes),
        }
    }

    /// Bytes written so far, without the trailer
    pub fn state_len(&self) -> usize {
        self.buf.len()
    }

    /// Append the state-length trailer and return the state region
    pub fn finish(self) -> Result<ByteString> {
        let state_len = self.buf.len();
        if state_len > self.max_state_len {
            return Err(CovenantError::unsupported(format!(
                "state of {state_len} bytes exceeds the limit of {}",
                self.max_state_len
            )));
        }
        let mut out = self.buf;
        out.reserve(STATE_LEN_FIELD_LEN);
        out.push(STATE_LEN_HEADER);
        out.extend_from_slice(&(state_len as u16).to_le_bytes());
        Ok(out.into())
    }

    /// Write `fields` in order and finish
    pub fn serialize_state(mut self, fields: &[StateField]) -> Result<ByteString> {
        for field in fields {
            self.write_field(field)?;
        }
        self.finish()
    }

    /// `code_part OP_RETURN <fields> <trailer>`
    pub fn build_state_script(self, code_part: &[u8], fields: &[StateField]) -> Result<ByteString> {
        let state = self.serialize_state(fields)?;
        let mut script = Vec::with_capacity(code_part.len() + 1 + state.len());
        script.extend_from_slice(code_part);
        script.push(OP_RETURN);
        script.extend_from_slice(&state);
        Ok(script.into())
    }
}

/// Serialize `fields` in order followed by the state-length trailer
pub fn serialize_state(fields: &[StateField]) -> Result<ByteString> {
    StateWriter::new().serialize_state(fields)
}

// ============================================================================
// READER
// ============================================================================

/// Sequential reader over a serialized state region
#[derive(Debug, Clone)]
pub struct StateReader<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> StateReader<'a> {
    pub fn new(state: &'a [u8]) -> Self {
        StateReader {
            cursor: ByteCursor::new(state),
        }
    }

    /// True once every byte has been consumed
    pub fn eof(&self) -> bool {
        self.cursor.is_exhausted()
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn read_bytes(&mut self) -> Result<ByteString> {
        let [header] = self.cursor.take_array::<1>()?;
        let len = match header {
            h if h < OP_PUSHDATA1 => h as u64,
            OP_PUSHDATA1 => self.cursor.take_le_uint(1)?,
            OP_PUSHDATA2 => self.cursor.take_le_uint(2)?,
            OP_PUSHDATA4 => self.cursor.take_le_uint(4)?,
            h => {
                return Err(CovenantError::unsupported(format!(
                    "byte {h:#04x} at offset {} is not a push header",
                    self.cursor.position() - 1
                )))
            }
        };
        let len = usize::try_from(len)
            .map_err(|_| CovenantError::malformed(format!("field length {len} too large")))?;
        self.cursor.take(len).map(ByteString::from)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_bytes().map(|body| cast_to_bool(&body))
    }

    pub fn read_int(&mut self) -> Result<i64> {
        decode_script_num(&self.read_bytes()?)
    }

    pub fn read_field(&mut self, kind: FieldKind) -> Result<StateField> {
        Ok(match kind {
            FieldKind::Bool => StateField::Bool(self.read_bool()?),
            FieldKind::Int => StateField::Int(self.read_int()?),
            FieldKind::Bytes => StateField::Bytes(self.read_bytes()?),
        })
    }

    /// Read one field per entry of `layout`, in order
    pub fn read_all(&mut self, layout: &[FieldKind]) -> Result<Vec<StateField>> {
        layout.iter().map(|&kind| self.read_field(kind)).collect()
    }
}

// ============================================================================
// STATEFUL SCRIPTS
// ============================================================================

/// Offset where the state region of `script` begins
///
/// Computed from the trailer as `len - state_len - 3`. The code part,
/// including its final `OP_RETURN`, occupies everything before it.
pub fn get_state_start(script: &[u8]) -> Result<usize> {
    let script_len = script.len();
    let trailer_at = script_len.checked_sub(STATE_LEN_FIELD_LEN).ok_or_else(|| {
        CovenantError::malformed(format!("script of {script_len} bytes has no state trailer"))
    })?;
    if script[trailer_at] != STATE_LEN_HEADER {
        return Err(CovenantError::malformed(format!(
            "state trailer header {:#04x}, expected {STATE_LEN_HEADER:#04x}",
            script[trailer_at]
        )));
    }
    let state_len = decode_script_num(&script[trailer_at + 1..])?;
    let state_len = usize::try_from(state_len)
        .map_err(|_| CovenantError::malformed(format!("negative state length {state_len}")))?;
    trailer_at.checked_sub(state_len).ok_or_else(|| {
        CovenantError::malformed(format!(
            "state length {state_len} exceeds script of {script_len} bytes"
        ))
    })
}

/// Split a stateful script into its code part and its state region
///
/// The trailer belongs to neither half.
pub fn split_state(script: &[u8]) -> Result<(ByteString, ByteString)> {
    let start = get_state_start(script)?;
    let end = script.len() - STATE_LEN_FIELD_LEN;
    Ok((script[..start].into(), script[start..end].into()))
}

/// `code_part OP_RETURN <serialized fields> <trailer>`
pub fn build_state_script(code_part: &[u8], fields: &[StateField]) -> Result<ByteString> {
    StateWriter::new().build_state_script(code_part, fields)
}

/// Decode the state of a stateful script; every state byte must be consumed
pub fn read_state(script: &[u8], layout: &[FieldKind]) -> Result<Vec<StateField>> {
    let (_, state) = split_state(script)?;
    let mut reader = StateReader::new(&state);
    let fields = reader.read_all(layout)?;
    if !reader.eof() {
        return Err(CovenantError::malformed(format!(
            "{} bytes of state left after {} fields",
            state.len() - reader.position(),
            layout.len()
        )));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_STATE_LEN;

    #[test]
    fn test_script_num_encoding() {
        assert_eq!(encode_script_num(0), Vec::<u8>::new());
        assert_eq!(encode_script_num(1), vec![0x01]);
        assert_eq!(encode_script_num(-1), vec![0x81]);
        assert_eq!(encode_script_num(127), vec![0x7f]);
        assert_eq!(encode_script_num(128), vec![0x80, 0x00]);
        assert_eq!(encode_script_num(-128), vec![0x80, 0x80]);
        assert_eq!(encode_script_num(0x7fff), vec![0xff, 0x7f]);
        assert_eq!(encode_script_num(i64::MIN).len(), 9);
    }

    #[test]
    fn test_script_num_decoding() {
        for n in [0, 1, -1, 127, 128, -128, 255, 256, -32768, i64::MAX, i64::MIN] {
            assert_eq!(decode_script_num(&encode_script_num(n)).unwrap(), n, "{n}");
        }
        assert_eq!(decode_script_num(&[0x00]).unwrap(), 0);
        assert_eq!(decode_script_num(&[0x80]).unwrap(), 0);
        assert!(decode_script_num(&[0xff; 10]).is_err());
        assert!(decode_script_num(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]).is_err());
    }

    #[test]
    fn test_field_encodings() {
        let mut writer = StateWriter::with_config(&StateCodecConfig::default());
        writer.write_bool(true).write_bool(false).write_int(0).write_int(-5);
        writer.write_bytes(&[]).unwrap().write_bytes(b"ab").unwrap();
        let state = writer.finish().unwrap();
        assert_eq!(
            state.as_bytes(),
            &[0x01, 0x01, 0x00, 0x00, 0x01, 0x85, 0x00, 0x02, b'a', b'b', 0x02, 0x0a, 0x00]
        );
    }

    #[test]
    fn test_empty_zero_and_false_collide() {
        let a = serialize_state(&[StateField::Bytes(ByteString::new())]).unwrap();
        let b = serialize_state(&[StateField::Int(0)]).unwrap();
        let c = serialize_state(&[StateField::Bool(false)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_reader_accepts_legacy_zero_int() {
        let mut reader = StateReader::new(&[0x01, 0x00]);
        assert_eq!(reader.read_int().unwrap(), 0);
        assert!(reader.eof());
    }

    #[test]
    fn test_reader_pushdata4_length() {
        let mut data = vec![OP_PUSHDATA4, 0x03, 0x00, 0x00, 0x00];
        data.extend_from_slice(b"xyz");
        let mut reader = StateReader::new(&data);
        assert_eq!(reader.read_bytes().unwrap().as_bytes(), b"xyz");
        assert!(reader.eof());
    }

    #[test]
    fn test_reader_errors() {
        assert!(matches!(
            StateReader::new(&[0x05, 0x01]).read_bytes(),
            Err(CovenantError::MalformedInput(_))
        ));
        assert!(matches!(
            StateReader::new(&[0x4f]).read_bytes(),
            Err(CovenantError::UnsupportedEncoding(_))
        ));
        assert!(StateReader::new(&[]).read_bool().is_err());
    }

    #[test]
    fn test_state_limit() {
        let mut writer = StateWriter::with_config(&StateCodecConfig { max_state_len: 4 });
        writer.write_bytes(&[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(CovenantError::UnsupportedEncoding(_))
        ));

        let mut writer = StateWriter::with_config(&StateCodecConfig::default());
        writer.write_bytes(&vec![0u8; MAX_STATE_LEN]).unwrap();
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_state_script_round_trip() {
        let code = [0x51u8, 0x52, 0x93];
        let fields = vec![
            StateField::Int(42),
            StateField::Bytes(ByteString::from(&b"owner"[..])),
            StateField::Bool(true),
        ];
        let script = build_state_script(&code, &fields).unwrap();
        assert_eq!(get_state_start(&script).unwrap(), code.len() + 1);

        let (code_part, state) = split_state(&script).unwrap();
        assert_eq!(code_part.as_bytes(), &[0x51, 0x52, 0x93, OP_RETURN]);
        assert_eq!(state.len(), script.len() - code.len() - 1 - STATE_LEN_FIELD_LEN);

        let layout = [FieldKind::Int, FieldKind::Bytes, FieldKind::Bool];
        assert_eq!(read_state(&script, &layout).unwrap(), fields);
        assert!(read_state(&script, &layout[..2]).is_err());
    }

    #[test]
    fn test_get_state_start_rejects_bad_trailer() {
        assert!(get_state_start(&[0x02, 0x00]).is_err());
        assert!(get_state_start(&[0x6a, 0x03, 0x05, 0x00]).is_err());
        assert!(get_state_start(&[0x6a, 0x02, 0x05, 0x00]).is_err());
        assert!(get_state_start(&[0x6a, 0x02, 0x01, 0x80]).is_err());
        assert_eq!(get_state_start(&[0x6a, 0x02, 0x00, 0x00]).unwrap(), 1);
    }
}
