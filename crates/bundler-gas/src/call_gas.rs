use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::{Address, Bytes, U256};
use bundler_abi::{decode_test_call_gas_result, encode_test_call_gas_calldata};
use bundler_errors::BundlerError;
use bundler_rpc::{EthRpcClient, RpcOutcome};
use bundler_types::constants::{
    CALL_GAS_BINARY_SEARCH_TOLERANCE, MAX_CALL_GAS_LIMIT, MIN_CALL_GAS_LIMIT,
};
use bundler_types::{calldata_gas_cost, AccountOverride, StateOverrides, UserOperation};

use crate::helper_bytecode::GAS_HELPER_BYTECODE_HEX;

const ZERO_ADDRESS: Address = Address::ZERO;

/// Whether Strategy A is even worth attempting: no account deployment in
/// this op, and either no overrides are needed or the node has already
/// proven it accepts them.
pub fn eth_estimate_strategy_eligible(
    op: &UserOperation,
    overrides: &StateOverrides,
    override_support_confirmed: bool,
) -> bool {
    op.init_code.is_empty() && (overrides.is_empty() || override_support_confirmed)
}

/// Strategy A (§4.3.2): `eth_estimateGas` with an optional state-override
/// set, minus fixed transaction overhead. `Ok(None)` means the node
/// returned `MethodNotFound` for the override parameter — the caller should
/// flip the support latch and fall back to Strategy B permanently.
pub async fn estimate_call_gas_limit_via_eth_estimate(
    client: &EthRpcClient,
    entry_point: Address,
    op: &UserOperation,
    block: &str,
    overrides: &StateOverrides,
) -> Result<Option<U256>, BundlerError> {
    let pass_overrides = (!overrides.is_empty()).then_some(overrides);
    match client
        .eth_estimate_gas(Some(entry_point), op.sender, &op.call_data, block, pass_overrides)
        .await
    {
        Ok(RpcOutcome::Result(value)) => {
            let raw = value
                .as_str()
                .ok_or_else(|| BundlerError::DecodeError("eth_estimateGas: expected a quantity".into()))?;
            let raw = U256::from_str_radix(raw.trim_start_matches("0x"), 16)
                .map_err(|err| BundlerError::DecodeError(format!("eth_estimateGas: {err}")))?;
            let overhead = U256::from(MIN_CALL_GAS_LIMIT + calldata_gas_cost(&op.call_data));
            Ok(Some(raw.saturating_sub(overhead)))
        }
        Ok(RpcOutcome::Error(err)) => Err(BundlerError::RpcError(err.message)),
        Err(BundlerError::MethodNotFound) => Ok(None),
        Err(other) => Err(other),
    }
}

/// Strategy B (§4.3.2): binary search against the `GasHelper` bytecode
/// overlaid onto the EntryPoint address. Returns the smallest `callGasLimit`
/// (within the binary-search tolerance) the helper reports success at.
pub async fn estimate_call_gas_limit_via_binary_search(
    client: &EthRpcClient,
    entry_point: Address,
    op: &UserOperation,
    block: &str,
) -> Result<U256, BundlerError> {
    let (success, gas_used, return_data) =
        call_test_call_gas(client, entry_point, op, block, U256::from(MAX_CALL_GAS_LIMIT)).await?;
    if !success {
        return Err(BundlerError::ExecutionReverted(return_data.to_vec().into()));
    }

    let (mut left, mut right) = find_max_min_gas(client, entry_point, op, block, gas_used).await?;
    let tolerance = U256::from(CALL_GAS_BINARY_SEARCH_TOLERANCE);

    while left + tolerance < right {
        let mid = left + ceil_div(right - left, U256::from(2u64));
        let (mid_success, _, _) = call_test_call_gas(client, entry_point, op, block, mid).await?;
        if mid_success {
            right = mid;
        } else {
            left = mid + U256::from(1u64);
        }
    }

    Ok(right)
}

/// Exponential expansion from the gas the `MAX_CALL_GAS_LIMIT` probe used,
/// establishing `(left, right)` bounds for the binary search: `left` is a
/// limit known to fail, `right` one known to succeed.
async fn find_max_min_gas(
    client: &EthRpcClient,
    entry_point: Address,
    op: &UserOperation,
    block: &str,
    gas_used: U256,
) -> Result<(U256, U256), BundlerError> {
    let mut min = gas_used;
    let mut max = gas_used.saturating_mul(U256::from(2u64));
    let mut index: u32 = 1;
    let cap = U256::from(MAX_CALL_GAS_LIMIT);

    while max < cap {
        let (success, _, _) = call_test_call_gas(client, entry_point, op, block, max).await?;
        if success {
            break;
        }
        index += 1;
        min = max;
        max = pow2(index).saturating_mul(gas_used).min(cap);
    }

    Ok((min, max))
}

async fn call_test_call_gas(
    client: &EthRpcClient,
    entry_point: Address,
    op: &UserOperation,
    block: &str,
    call_gas_limit: U256,
) -> Result<(bool, U256, Bytes), BundlerError> {
    let calldata =
        encode_test_call_gas_calldata(op.sender, op.init_code.clone(), op.call_data.clone(), call_gas_limit);
    let overrides = helper_overlay(entry_point);
    let outcome = client
        .eth_call(Some(ZERO_ADDRESS), entry_point, &calldata, block, Some(&overrides))
        .await?;
    match outcome {
        RpcOutcome::Result(value) => {
            let raw = value
                .as_str()
                .ok_or_else(|| BundlerError::DecodeError("testCallGas: expected a quantity".into()))?
                .parse::<Bytes>()
                .map_err(|err| BundlerError::DecodeError(format!("testCallGas result: {err}")))?;
            decode_test_call_gas_result(&raw)
        }
        RpcOutcome::Error(err) => Err(BundlerError::RpcError(err.message)),
    }
}

fn helper_overlay(entry_point: Address) -> StateOverrides {
    let bytecode: Bytes = format!("0x{GAS_HELPER_BYTECODE_HEX}")
        .parse()
        .expect("valid hex literal");
    let mut overrides = StateOverrides::new();
    overrides.insert(entry_point, AccountOverride::with_code(bytecode));
    overrides
}

fn ceil_div(numerator: U256, denominator: U256) -> U256 {
    (numerator + denominator - U256::from(1u64)) / denominator
}

fn pow2(exp: u32) -> U256 {
    U256::from(1u64) << exp
}

/// Flips once, permanently, on the first `MethodNotFound` a state-override
/// `eth_estimateGas` call produces (§4.3.2). Shared as an `Arc<AtomicBool>`
/// so every `GasManager` clone observes the same latch.
#[derive(Debug, Default)]
pub struct OverrideSupportLatch(AtomicBool);

impl OverrideSupportLatch {
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn is_supported(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn mark_unsupported(&self) {
        if self.0.swap(false, Ordering::Relaxed) {
            tracing::warn!("node does not support eth_estimateGas state overrides, falling back to binary search permanently");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_grows_as_expected() {
        assert_eq!(pow2(1), U256::from(2u64));
        assert_eq!(pow2(3), U256::from(8u64));
    }

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(U256::from(10u64), U256::from(3u64)), U256::from(4u64));
    }

    #[test]
    fn latch_flips_once_and_stays_flipped() {
        let latch = OverrideSupportLatch::new();
        assert!(latch.is_supported());
        latch.mark_unsupported();
        assert!(!latch.is_supported());
        latch.mark_unsupported();
        assert!(!latch.is_supported());
    }

    #[tokio::test]
    async fn binary_search_converges_on_the_success_threshold() {
        use alloy_sol_types::SolCall;
        use bundler_abi::{testCallGasCall, testCallGasReturn};
        use bundler_rpc::{EthRpcClient, MockJsonRpcTransport};
        use std::sync::Arc;

        const THRESHOLD: u64 = 73_421;

        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(|_, params| {
            let calldata_hex = params[0]["data"].as_str().unwrap();
            let calldata: Bytes = calldata_hex.parse().unwrap();
            let call = testCallGasCall::abi_decode(&calldata).unwrap();
            let call_gas_limit: u64 = call.callGasLimit.try_into().unwrap();
            let success = call_gas_limit >= THRESHOLD;
            let ret = testCallGasReturn {
                success,
                gasUsed: U256::from(call_gas_limit.min(THRESHOLD)),
                returnData: Bytes::default(),
            };
            let encoded = testCallGasCall::abi_encode_returns(&ret);
            Ok(serde_json::json!({ "result": format!("0x{}", hex::encode(encoded)) }))
        });

        let client = EthRpcClient::new(Arc::new(mock));
        let entry_point = Address::ZERO;
        let op = UserOperation {
            sender: Address::ZERO,
            nonce: U256::ZERO,
            init_code: Bytes::default(),
            call_data: Bytes::default(),
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        };

        let result = estimate_call_gas_limit_via_binary_search(&client, entry_point, &op, "latest")
            .await
            .unwrap();
        let result: u64 = result.try_into().unwrap();
        assert!(result >= THRESHOLD && result <= THRESHOLD + CALL_GAS_BINARY_SEARCH_TOLERANCE);
    }
}
