use serde::{Deserialize, Serialize};

/// Knobs §4.3.1/§4.3.4 leave as configuration rather than fixed constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasManagerConfig {
    /// Percentage applied to the computed pre-verification gas before the
    /// additive constant (§4.3.1 step (g)).
    pub preverification_gas_percentage_coefficient: u64,
    /// Flat addition applied after the percentage coefficient.
    pub preverification_gas_addition_constant: u64,
    /// Percentage tolerance `t` the op's fees are allowed to fall short of
    /// the node's current fee floor by (§4.3.4).
    pub enforce_gas_price_tolerance: u64,
    /// Percentage multiplier applied to `eth_gasPrice`'s result.
    pub max_fee_per_gas_percentage_multiplier: u64,
    /// Percentage multiplier applied to `eth_maxPriorityFeePerGas`'s result.
    pub max_priority_fee_per_gas_percentage_multiplier: u64,
    /// Skips the EIP-1559 priority-fee floor fetch and branch entirely.
    pub is_legacy_mode: bool,
    /// Whether `estimate_call_gas_limit` raises its result up to
    /// `MIN_CALL_GAS_LIMIT` when the estimate falls short of it.
    pub clamp_call_gas_to_floor: bool,
}

impl Default for GasManagerConfig {
    fn default() -> Self {
        Self {
            preverification_gas_percentage_coefficient: 100,
            preverification_gas_addition_constant: 0,
            enforce_gas_price_tolerance: 0,
            max_fee_per_gas_percentage_multiplier: 100,
            max_priority_fee_per_gas_percentage_multiplier: 100,
            is_legacy_mode: false,
            clamp_call_gas_to_floor: true,
        }
    }
}
