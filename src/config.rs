//! Configuration for covenant-proof
//!
//! Provides the configurable parameters of the verification engine: the
//! iteration bounds used when scanning raw transactions, the state trailer
//! limit, and diagnostics. These settings can be loaded from config files
//! (any serde format), environment variables, or passed programmatically.

use crate::constants::{DEFAULT_MAX_INPUTS, DEFAULT_MAX_OUTPUTS, MAX_STATE_LEN};
use serde::{Deserialize, Serialize};

/// Iteration bounds for raw transaction scanning
///
/// A step-limited host evaluator cannot run unbounded loops, so the output
/// extractor walks at most `max_inputs` inputs and `max_outputs` outputs.
/// Transactions with more entries are rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParseLimits {
    /// Maximum inputs walked before the output section (default: 3)
    #[serde(default = "default_max_inputs")]
    pub max_inputs: usize,

    /// Maximum outputs walked (default: 3)
    #[serde(default = "default_max_outputs")]
    pub max_outputs: usize,
}

fn default_max_inputs() -> usize {
    DEFAULT_MAX_INPUTS
}

fn default_max_outputs() -> usize {
    DEFAULT_MAX_OUTPUTS
}

impl Default for TxParseLimits {
    fn default() -> Self {
        Self {
            max_inputs: DEFAULT_MAX_INPUTS,
            max_outputs: DEFAULT_MAX_OUTPUTS,
        }
    }
}

impl TxParseLimits {
    pub fn new(max_inputs: usize, max_outputs: usize) -> Self {
        Self {
            max_inputs,
            max_outputs,
        }
    }
}

/// State codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCodecConfig {
    /// Largest serialized state region accepted by the writer
    /// Default: 0x7fff (largest non-negative 2-byte script number)
    /// Values above the default are clamped: the trailer cannot describe them
    #[serde(default = "default_max_state_len")]
    pub max_state_len: usize,
}

fn default_max_state_len() -> usize {
    MAX_STATE_LEN
}

impl Default for StateCodecConfig {
    fn default() -> Self {
        Self {
            max_state_len: MAX_STATE_LEN,
        }
    }
}

impl StateCodecConfig {
    /// Effective limit, never above what the trailer can encode
    pub fn effective_max_state_len(&self) -> usize {
        self.max_state_len.min(MAX_STATE_LEN)
    }
}

/// Debug and diagnostics configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log every rejected verification at debug level
    #[serde(default = "default_true")]
    pub log_rejections: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_rejections: true,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Raw transaction iteration bounds
    #[serde(default)]
    pub tx_parse: TxParseLimits,

    /// State codec limits
    #[serde(default)]
    pub state: StateCodecConfig,

    /// Diagnostics
    #[serde(default)]
    pub debug: DebugConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables keep their defaults:
    /// - `COVENANT_PROOF_TX_PARSE_MAX_INPUTS`
    /// - `COVENANT_PROOF_TX_PARSE_MAX_OUTPUTS`
    /// - `COVENANT_PROOF_STATE_MAX_STATE_LEN`
    /// - `COVENANT_PROOF_DEBUG_LOG_REJECTIONS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COVENANT_PROOF_TX_PARSE_MAX_INPUTS") {
            if let Ok(n) = val.parse::<usize>() {
                config.tx_parse.max_inputs = n;
            }
        }
        if let Ok(val) = std::env::var("COVENANT_PROOF_TX_PARSE_MAX_OUTPUTS") {
            if let Ok(n) = val.parse::<usize>() {
                config.tx_parse.max_outputs = n;
            }
        }
        if let Ok(val) = std::env::var("COVENANT_PROOF_STATE_MAX_STATE_LEN") {
            if let Ok(n) = val.parse::<usize>() {
                config.state.max_state_len = n;
            }
        }
        if let Ok(val) = std::env::var("COVENANT_PROOF_DEBUG_LOG_REJECTIONS") {
            if let Ok(enabled) = val.parse::<bool>() {
                config.debug.log_rejections = enabled;
            }
        }

        config
    }
}

/// Global engine configuration instance
///
/// Written at most once, read-only afterwards.
static GLOBAL_ENGINE_CONFIG: std::sync::OnceLock<EngineConfig> = std::sync::OnceLock::new();

/// Initialize global engine configuration
///
/// Returns the rejected config if the global was already initialized.
pub fn init_engine_config(config: EngineConfig) -> Result<(), EngineConfig> {
    GLOBAL_ENGINE_CONFIG.set(config)
}

/// Get global engine configuration
///
/// Returns the global config if initialized, otherwise loads it from the
/// environment.
pub fn get_engine_config() -> EngineConfig {
    GLOBAL_ENGINE_CONFIG
        .get()
        .copied()
        .unwrap_or_else(EngineConfig::from_env)
}

/// Log a rejected check when the global config enables rejection logging
pub(crate) fn log_rejection(check: &str, reason: &dyn std::fmt::Display) {
    log_rejection_with(&get_engine_config().debug, check, reason);
}

/// Log a rejected check when `debug` enables rejection logging
pub(crate) fn log_rejection_with(debug: &DebugConfig, check: &str, reason: &dyn std::fmt::Display) {
    if debug.log_rejections {
        log::debug!("{check} rejected: {reason}");
    }
}
