//! Drives the EntryPoint's `simulateValidation`/`simulateHandleOp`
//! revert-as-result protocol and classifies outcomes (§4.2), plus the
//! code-hash pinning/recheck that bundle selection relies on.

pub mod manager;
pub mod types;

pub use manager::ValidationManager;
pub use types::{ReturnInfo, SimulateHandleOpOutcome, StakeInfo, ValidationOutcome};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::{address, U256};
    use bundler_abi::{FailedOp, ValidationResult as SolValidationResult};
    use bundler_errors::BundlerError;
    use bundler_rpc::{EthRpcClient, MockJsonRpcTransport};
    use bundler_types::UserOperation;

    use super::*;

    fn empty_op() -> UserOperation {
        UserOperation {
            sender: address!("000000000000000000000000000000000000aa"),
            nonce: U256::ZERO,
            init_code: Default::default(),
            call_data: Default::default(),
            call_gas_limit: U256::from(100_000u64),
            verification_gas_limit: U256::from(100_000u64),
            pre_verification_gas: U256::from(50_000u64),
            max_fee_per_gas: U256::from(10u64),
            max_priority_fee_per_gas: U256::from(1u64),
            paymaster_and_data: Default::default(),
            signature: Default::default(),
        }
    }

    fn manager_over(mock: MockJsonRpcTransport) -> ValidationManager {
        let client = Arc::new(EthRpcClient::new(Arc::new(mock)));
        ValidationManager::new(
            client,
            address!("1111111111111111111111111111111111111111"),
            address!("2222222222222222222222222222222222222222"),
        )
    }

    #[tokio::test]
    async fn simulate_validation_decodes_valid_outcome() {
        use alloy_sol_types::SolError;

        let payload = SolValidationResult {
            returnInfo: bundler_abi::ReturnInfo {
                preOpGas: U256::from(200_000u64),
                prefund: U256::ZERO,
                sigFailed: false,
                validAfter: 0,
                validUntil: 0,
                paymasterContext: Default::default(),
            },
            senderInfo: bundler_abi::StakeInfo {
                stake: U256::ZERO,
                unstakeDelaySec: U256::ZERO,
            },
            factoryInfo: bundler_abi::StakeInfo {
                stake: U256::ZERO,
                unstakeDelaySec: U256::ZERO,
            },
            paymasterInfo: bundler_abi::StakeInfo {
                stake: U256::ZERO,
                unstakeDelaySec: U256::ZERO,
            },
        }
        .abi_encode();
        let data_hex = format!("0x{}", hex::encode(&payload));

        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(move |_, _| {
            Ok(serde_json::json!({
                "error": { "code": -32000, "message": "execution reverted", "data": data_hex }
            }))
        });

        let manager = manager_over(mock);
        let outcome = manager.simulate_validation(&empty_op()).await.unwrap();
        match outcome {
            ValidationOutcome::Valid { return_info, .. } => {
                assert_eq!(return_info.pre_op_gas, U256::from(200_000u64));
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn simulate_validation_decodes_failed_op() {
        use alloy_sol_types::SolError;

        let payload = FailedOp {
            opIndex: U256::ZERO,
            paymaster: alloy_primitives::Address::ZERO,
            reason: "AA23 reverted".to_string(),
        }
        .abi_encode();
        let data_hex = format!("0x{}", hex::encode(&payload));

        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(move |_, _| {
            Ok(serde_json::json!({
                "error": { "code": -32000, "message": "execution reverted", "data": data_hex }
            }))
        });

        let manager = manager_over(mock);
        let outcome = manager.simulate_validation(&empty_op()).await.unwrap();
        match outcome {
            ValidationOutcome::FailedOp { reason, .. } => assert_eq!(reason, "AA23 reverted"),
            other => panic!("expected FailedOp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_reverting_call_is_a_protocol_violation() {
        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw()
            .returning(|_, _| Ok(serde_json::json!({"result": "0x"})));

        let manager = manager_over(mock);
        let err = manager.simulate_validation(&empty_op()).await.unwrap_err();
        assert!(matches!(err, BundlerError::SimulationDidNotRevert));
    }

    #[tokio::test]
    async fn unknown_selector_yields_protocol_outcome() {
        let mut mock = MockJsonRpcTransport::new();
        mock.expect_send_raw().returning(|_, _| {
            Ok(serde_json::json!({
                "error": { "code": -32000, "message": "execution reverted", "data": "0xdeadbeef" }
            }))
        });

        let manager = manager_over(mock);
        let outcome = manager.simulate_validation(&empty_op()).await.unwrap();
        assert!(matches!(outcome, ValidationOutcome::Protocol { .. }));
    }
}
