use alloy_primitives::U256;
use bundler_errors::BundlerError;
use bundler_rpc::EthRpcClient;
use bundler_types::UserOperation;

use crate::config::GasManagerConfig;

/// `verify_gas_fees_and_get_price` (§4.3.4). Returns the block's current
/// max-fee-per-gas (scaled by the configured multiplier) on success;
/// rejects the op with `InvalidFields`/`SimulateValidation` when its fees
/// fall short of the tolerance-adjusted floor.
pub async fn verify_gas_fees_and_get_price(
    client: &EthRpcClient,
    config: &GasManagerConfig,
    op: &UserOperation,
) -> Result<U256, BundlerError> {
    let block_max_fee_per_gas = if config.is_legacy_mode {
        client.eth_gas_price().await?
    } else {
        let (gas_price, _) = client.fee_floors().await?;
        gas_price
    };
    let block_max_fee_per_gas = scale(block_max_fee_per_gas, config.max_fee_per_gas_percentage_multiplier);
    let tolerance = config.enforce_gas_price_tolerance;
    let block_max_fee_per_gas_with_tolerance = ceil_mul_percent(block_max_fee_per_gas, 100u64.saturating_sub(tolerance));

    if tolerance >= 100 {
        return Ok(block_max_fee_per_gas);
    }

    if config.is_legacy_mode {
        if op.max_fee_per_gas < block_max_fee_per_gas_with_tolerance {
            return Err(BundlerError::SimulateValidation(format!(
                "max fee per gas too low, minimum: {block_max_fee_per_gas_with_tolerance:#x}"
            )));
        }
        return Ok(block_max_fee_per_gas);
    }

    let block_priority_fee = client.eth_max_priority_fee_per_gas().await?;
    let block_priority_fee = scale(block_priority_fee, config.max_priority_fee_per_gas_percentage_multiplier);

    let estimated_base_fee = block_max_fee_per_gas
        .checked_sub(block_priority_fee)
        .unwrap_or(U256::ZERO)
        .max(U256::from(1u64));

    if op.max_fee_per_gas < estimated_base_fee {
        return Err(BundlerError::InvalidFields(format!(
            "max fee per gas too low, minimum (estimated base fee): {estimated_base_fee:#x}"
        )));
    }
    if op.max_priority_fee_per_gas < U256::from(1u64) {
        return Err(BundlerError::InvalidFields(
            "max priority fee per gas too low, minimum: 0x1".into(),
        ));
    }
    let combined = op.max_fee_per_gas.min(estimated_base_fee + op.max_priority_fee_per_gas);
    if combined < block_max_fee_per_gas_with_tolerance {
        return Err(BundlerError::InvalidFields(format!(
            "max fee per gas and (max priority fee per gas + estimated base fee) too low, minimum: {block_max_fee_per_gas_with_tolerance:#x}"
        )));
    }

    Ok(block_max_fee_per_gas)
}

fn scale(value: U256, percentage: u64) -> U256 {
    ceil_mul_percent(value, percentage)
}

fn ceil_mul_percent(value: U256, percentage: u64) -> U256 {
    let numerator = value * U256::from(percentage);
    let hundred = U256::from(100u64);
    (numerator + hundred - U256::from(1u64)) / hundred
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};

    fn op(max_fee: u64, priority_fee: u64) -> UserOperation {
        UserOperation {
            sender: address!("1111111111111111111111111111111111111111"),
            nonce: U256::ZERO,
            init_code: Bytes::default(),
            call_data: Bytes::default(),
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::from(max_fee),
            max_priority_fee_per_gas: U256::from(priority_fee),
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        }
    }

    #[test]
    fn ceil_mul_percent_rounds_up() {
        assert_eq!(ceil_mul_percent(U256::from(100u64), 33), U256::from(33u64));
        assert_eq!(ceil_mul_percent(U256::from(101u64), 100), U256::from(101u64));
    }

    #[tokio::test]
    async fn eip1559_rejects_below_base_fee() {
        use bundler_rpc::{EthRpcClient, MockJsonRpcTransport};
        use std::sync::Arc;

        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(|method, _| {
            let result = match method {
                "eth_gasPrice" => "0x64", // 100
                "eth_maxPriorityFeePerGas" => "0xa", // 10
                other => panic!("unexpected method {other}"),
            };
            Ok(serde_json::json!({ "result": result }))
        });
        let client = EthRpcClient::new(Arc::new(mock));
        let config = GasManagerConfig::default();

        let err = verify_gas_fees_and_get_price(&client, &config, &op(5, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BundlerError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn eip1559_accepts_sufficient_fees() {
        use bundler_rpc::{EthRpcClient, MockJsonRpcTransport};
        use std::sync::Arc;

        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(|method, _| {
            let result = match method {
                "eth_gasPrice" => "0x64",
                "eth_maxPriorityFeePerGas" => "0xa",
                other => panic!("unexpected method {other}"),
            };
            Ok(serde_json::json!({ "result": result }))
        });
        let client = EthRpcClient::new(Arc::new(mock));
        let config = GasManagerConfig::default();

        let price = verify_gas_fees_and_get_price(&client, &config, &op(200, 20))
            .await
            .unwrap();
        assert_eq!(price, U256::from(100u64));
    }
}
