//! Constants that are part of the external contract with the EntryPoint and
//! the surrounding chain ecosystem (§6). These must match the EntryPoint's
//! own accounting exactly; changing them changes what gets included on chain.

use alloy_primitives::{address, Address, U256};

/// Upper bound accepted for `verificationGasLimit`.
pub const MAX_VERIFICATION_GAS_LIMIT: u64 = 10_000_000;

/// Floor a sane `callGasLimit` estimate should never be allowed to clamp
/// below (a non-zero-value `CALL` alone costs this much).
pub const MIN_CALL_GAS_LIMIT: u64 = 21_000;

/// Ceiling the call-gas binary search never searches past.
pub const MAX_CALL_GAS_LIMIT: u64 = 30_000_000;

/// Binary-search tolerance: the search stops once `right - left <= this`.
pub const CALL_GAS_BINARY_SEARCH_TOLERANCE: u64 = 5_000;

/// Pre-verification-gas accounting constants (§4.3.1). `bundle_size` is kept
/// as a named constant rather than a knob: the spec's singleton-entrypoint
/// assumption is deliberate and multi-op bundles are out of scope.
pub const PVG_FIXED: u64 = 21_000;
pub const PVG_PER_USER_OPERATION: u64 = 18_300;
pub const PVG_PER_USER_OPERATION_WORD: u64 = 4;
pub const PVG_ZERO_BYTE: u64 = 4;
pub const PVG_NON_ZERO_BYTE: u64 = 16;
pub const PVG_BUNDLE_SIZE: u64 = 1;

/// Dummy signature substituted when the caller's signature is shorter than
/// 65 bytes, so pre-verification-gas accounting reflects a realistic
/// signature size regardless of what the caller actually submitted.
pub const DUMMY_SIGNATURE_LEN: usize = 65;

/// Optimism (and Optimism Goerli) L1 gas-price oracle.
pub const OPTIMISM_GAS_ORACLE: Address = address!("420000000000000000000000000000000000000F");

/// Arbitrum One's NodeInterface precompile.
pub const ARBITRUM_NODE_INTERFACE: Address = address!("00000000000000000000000000000000000000C8");

/// Optimism family chain ids that use the L1 gas-price oracle.
pub const OPTIMISM_CHAIN_IDS: [u64; 2] = [10, 420];

/// Arbitrum One's chain id.
pub const ARBITRUM_ONE_CHAIN_ID: u64 = 42161;

/// `10^15 ETH` in wei, used as the "may as well be infinite" balance/deposit
/// override so simulation never fails on an insufficient-funds check.
/// Fits in 112 bits.
pub fn high_balance_override() -> U256 {
    U256::from_str_radix("314dc6448d9338c15b0a00000000", 16).expect("valid hex literal")
}
