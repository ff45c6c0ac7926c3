//! Error types for covenant verification

use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CovenantError {
    /// Out-of-range read, unsupported varint width, iteration bound exceeded,
    /// or a structure whose length does not match its declared layout.
    #[error("Malformed input: {0}")]
    MalformedInput(Cow<'static, str>),

    /// A recomputed hash does not match the committed one.
    #[error("Commitment mismatch: {0}")]
    CommitmentMismatch(Cow<'static, str>),

    /// A state field or trailer does not fit the encoding's length classes.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(Cow<'static, str>),

    #[error("Invalid sighash type: {0:#x}")]
    InvalidSighashType(u32),
}

impl CovenantError {
    pub(crate) fn malformed(msg: impl Into<Cow<'static, str>>) -> Self {
        CovenantError::MalformedInput(msg.into())
    }

    pub(crate) fn mismatch(msg: impl Into<Cow<'static, str>>) -> Self {
        CovenantError::CommitmentMismatch(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<Cow<'static, str>>) -> Self {
        CovenantError::UnsupportedEncoding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CovenantError>;
