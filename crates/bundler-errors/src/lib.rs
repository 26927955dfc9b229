//! The error taxonomy shared by every bundler-core crate.
//!
//! Every public method in the validation/gas/mempool triad returns
//! `Result<_, BundlerError>`. No crate in the core invents its own ad-hoc
//! error type; transport-level detail (e.g. `reqwest::Error`) is captured
//! once at the RPC boundary and folded into [`BundlerError::RpcError`] or
//! [`BundlerError::DecodeError`] before it crosses into the rest of the core.

use std::fmt;

/// Hex-formatted revert/calldata payload, kept as owned bytes so errors are
/// `'static` and can cross task boundaries freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertData(pub Vec<u8>);

impl fmt::Display for RevertData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for RevertData {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

/// The error taxonomy from the error-handling design: every failure the core
/// can produce is one of these variants.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BundlerError {
    /// `FailedOp` returned from `simulateValidation`.
    #[error("rejected by entrypoint or account: {0}")]
    RejectedByEntryPointOrAccount(String),

    /// `simulateHandleOp` returned a validation-phase failure.
    #[error("simulate validation failed: {0}")]
    SimulateValidation(String),

    /// `simulateValidation`/`simulateHandleOp` returned normally instead of
    /// reverting — a protocol violation on the EntryPoint's part.
    #[error("simulation did not revert")]
    SimulationDidNotRevert,

    /// Caller-side static checks (fees, nonce, gas caps, mempool capacity).
    #[error("invalid fields: {0}")]
    InvalidFields(String),

    /// The call-gas binary search confirmed a revert at `MAX_CALL_GAS_LIMIT`.
    #[error("execution reverted: {0}")]
    ExecutionReverted(RevertData),

    /// A banned or throttled entity at admission time.
    #[error("reputation: {0}")]
    Reputation(String),

    /// Transport or node error not otherwise classified.
    #[error("rpc error: {0}")]
    RpcError(String),

    /// A malformed ABI payload.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The node lacks a feature (e.g. state-override `eth_estimateGas`).
    ///
    /// This is a control signal consumed internally by `GasManager`'s
    /// override-support probe; it must never be surfaced to a caller of the
    /// public API. Kept in the shared taxonomy because the RPC client still
    /// needs a typed way to report it across the crate boundary.
    #[error("method not found")]
    MethodNotFound,

    /// An external cancellation signal fired mid-admission. No mempool state
    /// was mutated.
    #[error("operation cancelled")]
    Cancelled,
}

impl BundlerError {
    /// `true` for the one variant that must never escape `GasManager`.
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, BundlerError::MethodNotFound)
    }
}

pub type BundlerResult<T> = Result<T, BundlerError>;
