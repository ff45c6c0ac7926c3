//! Covenant verification: the spending transaction's outputs must be exactly
//! the outputs the contract rule expects
//!
//! The rule rebuilds the outputs it requires, serializes them in order and
//! compares their hash256 with `hashOutputs` from the sighash preimage. The
//! preimage itself must come from the execution environment (its signature
//! is checked there); a caller-supplied preimage proves nothing.

use crate::config::{get_engine_config, log_rejection, StateCodecConfig};
use crate::crypto::hash256;
use crate::error::{CovenantError, Result};
use crate::output::{build_outputs, build_pub_key_hash_script};
use crate::preimage::Preimage;
use crate::state::{StateField, StateWriter};
use crate::types::{ByteString, Hash160, Satoshis, TxOutput};

/// Check that `expected_outputs`, serialized in order, hash to the
/// preimage's committed `hashOutputs`
pub fn check_state_transition(preimage: &Preimage, expected_outputs: &[TxOutput]) -> Result<()> {
    let actual = hash256(&build_outputs(expected_outputs));
    if &actual != preimage.hash_outputs() {
        return Err(CovenantError::mismatch(format!(
            "outputs hash {} does not match committed hashOutputs {}",
            hex::encode(actual),
            hex::encode(preimage.hash_outputs())
        )));
    }
    Ok(())
}

/// Boolean form of [`check_state_transition`]
pub fn verify_state_transition(preimage: &Preimage, expected_outputs: &[TxOutput]) -> bool {
    match check_state_transition(preimage, expected_outputs) {
        Ok(()) => true,
        Err(e) => {
            log_rejection("verify_state_transition", &e);
            false
        }
    }
}

/// Total value of `outputs`, failing on overflow
pub fn sum_output_values(outputs: &[TxOutput]) -> Result<Satoshis> {
    outputs.iter().try_fold(0u64, |total, o| {
        total.checked_add(o.value).ok_or_else(|| {
            CovenantError::malformed(format!("output value sum overflows at {}", o.value))
        })
    })
}

/// Ordered list of outputs a contract rule requires
///
/// Every output is derived from contract parameters, call arguments or the
/// value locked in the spent output, never from the spending transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutputs {
    outputs: Vec<TxOutput>,
    state_config: StateCodecConfig,
}

impl Default for ExpectedOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpectedOutputs {
    /// Empty list; state outputs use the global state limits
    pub fn new() -> Self {
        Self::with_state_config(get_engine_config().state)
    }

    /// Empty list whose state outputs are bound by `state_config`
    pub fn with_state_config(state_config: StateCodecConfig) -> Self {
        Self {
            outputs: Vec::new(),
            state_config,
        }
    }

    /// Recreate the spent contract: `script` locking the same value
    pub fn carry_locked_value(mut self, preimage: &Preimage, script: impl Into<ByteString>) -> Self {
        self.outputs.push(TxOutput::new(preimage.value(), script));
        self
    }

    /// Stateful contract output: `code_part OP_RETURN <state> <trailer>`
    pub fn state_output(
        mut self,
        code_part: &[u8],
        state: &[StateField],
        value: Satoshis,
    ) -> Result<Self> {
        let script =
            StateWriter::with_config(&self.state_config).build_state_script(code_part, state)?;
        self.outputs.push(TxOutput::new(value, script));
        Ok(self)
    }

    /// Payment to a public key hash
    pub fn pay_to_pub_key_hash(mut self, pubkey_hash: &Hash160, value: Satoshis) -> Self {
        self.outputs
            .push(TxOutput::new(value, build_pub_key_hash_script(pubkey_hash)));
        self
    }

    /// Optional change output, omitted when `value` is zero
    pub fn change(self, pubkey_hash: &Hash160, value: Satoshis) -> Self {
        if value == 0 {
            return self;
        }
        self.pay_to_pub_key_hash(pubkey_hash, value)
    }

    pub fn output(mut self, output: TxOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Serialized outputs, concatenated in order
    pub fn serialize(&self) -> ByteString {
        build_outputs(&self.outputs)
    }

    pub fn total_value(&self) -> Result<Satoshis> {
        sum_output_values(&self.outputs)
    }

    pub fn check(&self, preimage: &Preimage) -> Result<()> {
        check_state_transition(preimage, &self.outputs)
    }

    pub fn verify(&self, preimage: &Preimage) -> bool {
        verify_state_transition(preimage, &self.outputs)
    }
}

impl From<ExpectedOutputs> for Vec<TxOutput> {
    fn from(expected: ExpectedOutputs) -> Self {
        expected.outputs
    }
}
