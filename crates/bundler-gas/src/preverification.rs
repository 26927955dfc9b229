use alloy_primitives::U256;
use bundler_errors::BundlerError;
use bundler_rpc::EthRpcClient;
use bundler_types::constants::{
    ARBITRUM_ONE_CHAIN_ID, OPTIMISM_CHAIN_IDS, PVG_BUNDLE_SIZE, PVG_FIXED, PVG_PER_USER_OPERATION,
    PVG_PER_USER_OPERATION_WORD,
};
use bundler_types::{calldata_gas_cost, UserOperation};

use crate::config::GasManagerConfig;
use crate::l1_cost::{arbitrum_l1_gas_estimate, optimism_l1_gas_estimate};

/// `calc_base_preverification_gas` (§4.3.1 steps a-e): the EntryPoint-side
/// calldata/word accounting, before any L1 data cost is folded in.
pub fn base_preverification_gas(op: &UserOperation) -> u64 {
    let packed = op.pack_for_pre_verification_gas();
    let call_data_cost = calldata_gas_cost(&packed);
    let length_words = (packed.len() as u64 + 31) / 32;

    call_data_cost
        + PVG_FIXED / PVG_BUNDLE_SIZE
        + PVG_PER_USER_OPERATION
        + PVG_PER_USER_OPERATION_WORD * length_words
}

/// `get_preverification_gas` (§4.3.1 steps f-g): folds in the chain's L1
/// data cost, then applies the configured percentage coefficient and
/// additive constant.
pub async fn get_preverification_gas(
    client: &EthRpcClient,
    config: &GasManagerConfig,
    chain_id: u64,
    entry_point: alloy_primitives::Address,
    op: &UserOperation,
    block: &str,
    base_fee: U256,
) -> Result<u64, BundlerError> {
    let base = base_preverification_gas(op);

    let l1_gas: u64 = if OPTIMISM_CHAIN_IDS.contains(&chain_id) {
        let estimate = optimism_l1_gas_estimate(client, op, block, base_fee).await?;
        u256_to_u64_saturating(estimate)
    } else if chain_id == ARBITRUM_ONE_CHAIN_ID {
        let estimate = arbitrum_l1_gas_estimate(client, op, entry_point).await?;
        u256_to_u64_saturating(estimate)
    } else {
        0
    };

    let calculated = base + l1_gas;
    let scaled = calculated as u128 * config.preverification_gas_percentage_coefficient as u128;
    let adjusted = ceil_div_u128(scaled, 100) + config.preverification_gas_addition_constant as u128;
    Ok(adjusted as u64)
}

fn ceil_div_u128(numerator: u128, denominator: u128) -> u128 {
    (numerator + denominator - 1) / denominator
}

fn u256_to_u64_saturating(value: U256) -> u64 {
    value.try_into().unwrap_or(u64::MAX)
}
