//! # Covenant-Proof
//!
//! Verification engine for stateful UTXO covenants.
//!
//! A covenant constrains how an output may be spent by inspecting the
//! spending transaction itself. The execution environment exposes the
//! signature-hash preimage of the spending input; a contract rule rebuilds the
//! outputs it requires, hashes them and compares the result with the
//! preimage's `hashOutputs` commitment. Contract state travels in the next
//! output's locking script, after an `OP_RETURN`.
//!
//! ## Components
//!
//! - [`serialization::cursor`]: bounds-checked byte reads
//! - [`tx_fields`]: bounded field extraction from raw transactions
//! - [`preimage`]: sighash preimage decoding, computation and masking
//! - [`output`]: canonical output and script templates
//! - [`covenant`]: the outputs-commitment check
//! - [`state`]: typed contract state in a locking script
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every check is deterministic and side-effect-free
//! 2. **Fail Closed**: any malformed input or mismatch rejects the spend
//! 3. **Bounded Work**: raw transaction scans honor explicit iteration bounds
//!
//! ## Usage
//!
//! ```rust
//! use covenant_proof::covenant::verify_state_transition;
//! use covenant_proof::output::build_pub_key_hash_script;
//! use covenant_proof::preimage::{compute_preimage, SighashType};
//! use covenant_proof::types::*;
//!
//! let payout = TxOutput::new(99_500, build_pub_key_hash_script(&[0x11; 20]));
//! let spending = Transaction {
//!     version: 1,
//!     inputs: vec![TransactionInput {
//!         prevout: OutPoint { txid: [0x22; 32], index: 0 },
//!         script_sig: ByteString::new(),
//!         sequence: 0xffffffff,
//!     }],
//!     outputs: vec![payout.clone()],
//!     lock_time: 0,
//! };
//! let preimage =
//!     compute_preimage(&spending, 0, &[0x51], 100_000, SighashType::ALL_FORKID).unwrap();
//! assert!(verify_state_transition(&preimage, &[payout]));
//! ```

pub mod config;
pub mod constants;
pub mod covenant;
pub mod crypto;
pub mod error;
pub mod opcodes;
pub mod output;
pub mod preimage;
pub mod serialization;
pub mod state;
pub mod tx_fields;
pub mod types;

pub use config::{get_engine_config, init_engine_config, EngineConfig};
pub use covenant::{check_state_transition, verify_state_transition, ExpectedOutputs};
pub use error::{CovenantError, Result};
pub use preimage::{Preimage, SighashType, ANYPREVOUT_MASK};
pub use serialization::ByteCursor;
pub use state::{FieldKind, StateField, StateReader, StateWriter};
pub use tx_fields::TxFieldExtractor;
pub use types::{ByteString, Hash, Hash160, OutPoint, Satoshis, Transaction, TxOutput};

use std::ops::Range;

/// Covenant Proof - wrapper struct for covenant verification functions
///
/// Holds one engine configuration so that bounded scans and state limits
/// are applied consistently. All methods delegate to the corresponding
/// module functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CovenantProof {
    config: EngineConfig,
}

impl CovenantProof {
    /// Create an instance using the global engine configuration
    pub fn new() -> Self {
        Self::with_config(get_engine_config())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn extractor(&self) -> TxFieldExtractor {
        TxFieldExtractor::from_config(&self.config)
    }

    /// Collapse a check to a bool, logging per this instance's debug config
    fn accept(&self, check: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                config::log_rejection_with(&self.config.debug, check, &e);
                false
            }
        }
    }

    /// Decode the output at `output_index` of a raw transaction
    pub fn read_output(&self, tx: &[u8], output_index: usize) -> Result<TxOutput> {
        self.extractor().read_output(tx, output_index)
    }

    /// Check that prevout `i` spends a contract whose script hashes to
    /// `expected_hash`
    pub fn verify_contract_by_hash(
        &self,
        prevouts: &[u8],
        i: usize,
        prev_tx: &[u8],
        expected_hash: &Hash160,
    ) -> bool {
        let checked = self
            .extractor()
            .check_contract_by_hash(prevouts, i, prev_tx, expected_hash);
        self.accept("verify_contract_by_hash", checked)
    }

    /// Decode a sighash preimage
    pub fn parse_preimage(&self, bytes: &[u8]) -> Result<Preimage> {
        Preimage::parse(bytes)
    }

    /// Verify a signature over a masked preimage
    pub fn verify_masked_signature(
        &self,
        preimage: &[u8],
        masked_ranges: &[Range<usize>],
        signature: &[u8],
        pubkey: &[u8],
    ) -> bool {
        let checked = preimage::check_masked_signature(preimage, masked_ranges, signature, pubkey);
        self.accept("verify_masked_signature", checked)
    }

    /// Check the spending transaction's outputs against the preimage
    pub fn verify_state_transition(&self, preimage: &Preimage, expected: &[TxOutput]) -> bool {
        self.accept(
            "verify_state_transition",
            covenant::check_state_transition(preimage, expected),
        )
    }

    /// Expected-outputs builder bound by this instance's state limits
    pub fn expected_outputs(&self) -> ExpectedOutputs {
        ExpectedOutputs::with_state_config(self.config.state)
    }

    /// Writer bound by this instance's state limits
    pub fn state_writer(&self) -> StateWriter {
        StateWriter::with_config(&self.config.state)
    }

    /// Build `code_part OP_RETURN <state> <trailer>`
    pub fn build_state_script(&self, code_part: &[u8], fields: &[StateField]) -> Result<ByteString> {
        self.state_writer().build_state_script(code_part, fields)
    }

    /// Decode the state of a stateful locking script
    pub fn read_state(&self, script: &[u8], layout: &[FieldKind]) -> Result<Vec<StateField>> {
        state::read_state(script, layout)
    }
}
