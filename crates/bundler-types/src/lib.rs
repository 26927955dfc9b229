//! Domain model shared by every bundler-core crate: the `UserOperation`
//! struct, its packing/hashing routines, state overrides, and the numeric
//! constants the EntryPoint's own accounting is pinned to.

pub mod constants;
pub mod state_overrides;
pub mod user_operation;

pub use state_overrides::{AccountOverride, StateOverrides};
pub use user_operation::{
    calldata_gas_cost, pad_dummy_signature, CodeHash, UserOperation, UserOperationHash,
};
