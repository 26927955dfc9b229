//! Per-chain L1 data-cost models folded into pre-verification gas (§4.3.1).
//! Every other chain contributes zero extra gas.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use bundler_abi::encode_handle_ops_calldata;
use bundler_errors::BundlerError;
use bundler_rpc::EthRpcClient;
use bundler_types::UserOperation;

use crate::gas_oracle::{gasEstimateL1ComponentCall, getL1FeeCall};

const ZERO_ADDRESS: Address = Address::ZERO;
const OPTIMISM_ORACLE: Address = bundler_types::constants::OPTIMISM_GAS_ORACLE;
const ARBITRUM_NODE_INTERFACE: Address = bundler_types::constants::ARBITRUM_NODE_INTERFACE;

/// Singleton-bundle `handleOps` calldata with a zero beneficiary — the
/// transaction shape both L1 oracles size their fee estimate against.
fn singleton_handle_ops_calldata(op: &UserOperation) -> Bytes {
    encode_handle_ops_calldata(std::slice::from_ref(op), ZERO_ADDRESS)
}

/// `L1DataCost` for chains 10/420 (§4.3.1): `ceil(l1_fee / l2_gas_price)`
/// where `l2_gas_price = max(1, min(maxFeePerGas, maxPriorityFeePerGas +
/// base_fee))`.
pub async fn optimism_l1_gas_estimate(
    client: &EthRpcClient,
    op: &UserOperation,
    block: &str,
    base_fee: U256,
) -> Result<U256, BundlerError> {
    let handle_ops_calldata = singleton_handle_ops_calldata(op);
    let call = getL1FeeCall {
        data: handle_ops_calldata,
    };
    let calldata = Bytes::from(call.abi_encode());

    let result = client
        .eth_call(Some(ZERO_ADDRESS), OPTIMISM_ORACLE, &calldata, block, None)
        .await?
        .into_result()?;
    let raw = result
        .as_str()
        .ok_or_else(|| BundlerError::DecodeError("getL1Fee did not return a string".into()))?
        .parse::<Bytes>()
        .map_err(|err| BundlerError::DecodeError(format!("getL1Fee result: {err}")))?;
    let l1_fee: U256 = getL1FeeCall::abi_decode_returns(&raw)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))?;

    let priority_plus_base = op.max_priority_fee_per_gas.saturating_add(base_fee);
    let l2_gas_price = op.max_fee_per_gas.min(priority_plus_base).max(U256::from(1u64));

    Ok(ceil_div(l1_fee, l2_gas_price))
}

/// `L1DataCost` for Arbitrum One (§4.3.1): the NodeInterface precompile's
/// `gasEstimateL1Component` already returns the L1 gas units directly.
pub async fn arbitrum_l1_gas_estimate(
    client: &EthRpcClient,
    op: &UserOperation,
    entry_point: Address,
) -> Result<U256, BundlerError> {
    let handle_ops_calldata = singleton_handle_ops_calldata(op);
    let is_init = op.nonce.is_zero();
    let call = gasEstimateL1ComponentCall {
        to: entry_point,
        contractCreation: is_init,
        data: handle_ops_calldata,
    };
    let calldata = Bytes::from(call.abi_encode());

    let result = client
        .eth_call(Some(ZERO_ADDRESS), ARBITRUM_NODE_INTERFACE, &calldata, "latest", None)
        .await?
        .into_result()?;
    let raw = result
        .as_str()
        .ok_or_else(|| BundlerError::DecodeError("gasEstimateL1Component did not return a string".into()))?
        .parse::<Bytes>()
        .map_err(|err| BundlerError::DecodeError(format!("gasEstimateL1Component result: {err}")))?;
    let decoded = gasEstimateL1ComponentCall::abi_decode_returns(&raw)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))?;

    Ok(U256::from(decoded.gasEstimateForL1))
}

fn ceil_div(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    (numerator + denominator - U256::from(1u64)) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up_on_remainder() {
        assert_eq!(ceil_div(U256::from(10u64), U256::from(3u64)), U256::from(4u64));
        assert_eq!(ceil_div(U256::from(9u64), U256::from(3u64)), U256::from(3u64));
    }
}
