//! End-to-end scenarios against a scripted `JsonRpcTransport`, mirroring §8
//! of the bundler core's design notes — no live chain, no process spawned.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::SolError;
use bundler_abi::{FailedOp, ReturnInfo, StakeInfo, ValidationResult as SolValidationResult};
use bundler_core::{BundlerCore, BundlerCoreConfig};
use bundler_errors::BundlerError;
use bundler_gas::GasManagerConfig;
use bundler_mempool::MempoolConfig;
use bundler_reputation::ReputationConfig;
use bundler_rpc::{EthRpcClient, MockJsonRpcTransport};
use bundler_types::UserOperation;
use serde_json::json;

const ENTRY_POINT: Address = address!("1111111111111111111111111111111111111111");
const BUNDLER: Address = address!("2222222222222222222222222222222222222222");
const CHAIN_ID: u64 = 1;

fn base_config() -> BundlerCoreConfig {
    BundlerCoreConfig {
        entry_point: ENTRY_POINT,
        bundler: BUNDLER,
        chain_id: CHAIN_ID,
        gas: GasManagerConfig::default(),
        reputation: ReputationConfig::default(),
        mempool: MempoolConfig::default(),
    }
}

fn cheap_op(sender: Address, nonce: u64) -> UserOperation {
    UserOperation {
        sender,
        nonce: U256::from(nonce),
        init_code: Default::default(),
        call_data: Default::default(),
        call_gas_limit: U256::from(100_000u64),
        verification_gas_limit: U256::from(100_000u64),
        pre_verification_gas: U256::from(1_000_000u64),
        max_fee_per_gas: U256::from(2_000_000_000u64),
        max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        paymaster_and_data: Default::default(),
        signature: Default::default(),
    }
}

fn valid_result_payload() -> String {
    let payload = SolValidationResult {
        returnInfo: ReturnInfo {
            preOpGas: U256::from(200_000u64),
            prefund: U256::ZERO,
            sigFailed: false,
            validAfter: 0,
            validUntil: 0,
            paymasterContext: Default::default(),
        },
        senderInfo: StakeInfo {
            stake: U256::ZERO,
            unstakeDelaySec: U256::ZERO,
        },
        factoryInfo: StakeInfo {
            stake: U256::ZERO,
            unstakeDelaySec: U256::ZERO,
        },
        paymasterInfo: StakeInfo {
            stake: U256::ZERO,
            unstakeDelaySec: U256::ZERO,
        },
    }
    .abi_encode();
    format!("0x{}", hex::encode(&payload))
}

/// Dispatches every method a happy-path admission touches: a legacy-mode
/// fee quote, a block with a modest base fee, an always-"Valid" `eth_call`,
/// and empty contract code for every address.
fn happy_path_transport() -> MockJsonRpcTransport {
    let data_hex = valid_result_payload();
    let mut mock = MockJsonRpcTransport::new();
    mock.expect_send_raw().returning(move |method, _| match method {
        "eth_call" => Ok(json!({
            "error": {"code": -32000, "message": "execution reverted", "data": data_hex}
        })),
        "eth_getCode" => Ok(json!({"result": "0x"})),
        "eth_getBlockByNumber" => Ok(json!({
            "result": {"number": "0x1", "baseFeePerGas": "0x3b9aca00", "gasLimit": "0x1c9c380"}
        })),
        "eth_gasPrice" => Ok(json!({"result": "0x77359400"})),
        "eth_maxPriorityFeePerGas" => Ok(json!({"result": "0x3b9aca00"})),
        other => panic!("unexpected method {other}"),
    });
    mock
}

fn core_over(mock: MockJsonRpcTransport) -> BundlerCore {
    let client = Arc::new(EthRpcClient::new(Arc::new(mock)));
    BundlerCore::new(client, base_config())
}

/// Scenario 1: admit-and-bundle happy path.
#[tokio::test]
async fn admit_and_bundle_happy_path() {
    let mut core = core_over(happy_path_transport());
    let op = cheap_op(address!("000000000000000000000000000000000000aa"), 0);
    let expected_hash = op.clone().user_operation_hash(ENTRY_POINT, CHAIN_ID);

    let hash = core.add_user_operation(op).await.unwrap();
    assert_eq!(hash, expected_hash);
    assert_eq!(core.mempool_len(), 1);

    let bundle = core.get_bundle().await.unwrap();
    assert_eq!(bundle.len(), 1);
    assert_eq!(core.mempool_len(), 0);
}

/// Scenario 2: FailedOp rejection.
#[tokio::test]
async fn failed_op_rejection_carries_the_reason() {
    let payload = FailedOp {
        opIndex: U256::ZERO,
        paymaster: Address::ZERO,
        reason: "AA23 reverted".to_string(),
    }
    .abi_encode();
    let data_hex = format!("0x{}", hex::encode(&payload));

    let mut mock = MockJsonRpcTransport::new();
    mock.expect_send_raw().returning(move |method, _| match method {
        "eth_call" => Ok(json!({
            "error": {"code": -32000, "message": "execution reverted", "data": data_hex}
        })),
        "eth_getBlockByNumber" => Ok(json!({
            "result": {"number": "0x1", "baseFeePerGas": "0x3b9aca00", "gasLimit": "0x1c9c380"}
        })),
        "eth_gasPrice" => Ok(json!({"result": "0x77359400"})),
        "eth_maxPriorityFeePerGas" => Ok(json!({"result": "0x3b9aca00"})),
        other => panic!("unexpected method {other}"),
    });

    let mut core = core_over(mock);
    let op = cheap_op(address!("000000000000000000000000000000000000aa"), 0);
    let err = core.add_user_operation(op).await.unwrap_err();
    assert!(matches!(
        err,
        BundlerError::RejectedByEntryPointOrAccount(reason) if reason == "AA23 reverted"
    ));
}

/// Scenario 5: reputation throttle. Once a sender's `ops_seen - ops_included`
/// overhang exceeds the default threshold (10), the next admission that
/// still finds it in the mempool is rejected with `Reputation`.
#[tokio::test]
async fn reputation_throttle_blocks_admission_once_the_overhang_trips() {
    let mut core = core_over(happy_path_transport());
    let sender = address!("000000000000000000000000000000000000aa");
    let threshold = ReputationConfig::default().throttle_threshold;

    for nonce in 0..=threshold {
        core.add_user_operation(cheap_op(sender, nonce))
            .await
            .unwrap();
    }
    assert_eq!(
        core.reputation().status(sender),
        bundler_reputation::ReputationStatus::Throttled
    );

    let err = core
        .add_user_operation(cheap_op(sender, threshold + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BundlerError::Reputation(_)));
}

/// Scenario 6: code-hash eviction at bundle time. The op references a
/// factory via `initCode`; the factory's on-chain code changes between
/// admission and `get_bundle`, while the sender's own code never does.
#[tokio::test]
async fn code_hash_mismatch_evicts_the_op_at_bundle_time() {
    use alloy_primitives::bytes;

    let factory = address!("3333333333333333333333333333333333333333");
    let data_hex = valid_result_payload();
    let factory_call_count = Arc::new(AtomicUsize::new(0));
    let factory_call_count_clone = factory_call_count.clone();

    let mut mock = MockJsonRpcTransport::new();
    mock.expect_send_raw().returning(move |method, params| match method {
        "eth_call" => Ok(json!({
            "error": {"code": -32000, "message": "execution reverted", "data": data_hex}
        })),
        "eth_getCode" => {
            let addr: Address = params[0].as_str().unwrap().parse().unwrap();
            let code = if addr == factory {
                let n = factory_call_count_clone.fetch_add(1, Ordering::SeqCst);
                if n == 0 { "0x" } else { "0x600160005260206000f3" }
            } else {
                "0x"
            };
            Ok(json!({"result": code}))
        }
        "eth_getBlockByNumber" => Ok(json!({
            "result": {"number": "0x1", "baseFeePerGas": "0x3b9aca00", "gasLimit": "0x1c9c380"}
        })),
        "eth_gasPrice" => Ok(json!({"result": "0x77359400"})),
        "eth_maxPriorityFeePerGas" => Ok(json!({"result": "0x3b9aca00"})),
        other => panic!("unexpected method {other}"),
    });

    let mut core = core_over(mock);
    let mut op = cheap_op(address!("000000000000000000000000000000000000aa"), 0);
    op.init_code = bytes!("3333333333333333333333333333333333333333deadbeef");
    core.add_user_operation(op).await.unwrap();
    assert_eq!(core.mempool_len(), 1);

    let bundle = core.get_bundle().await.unwrap();
    assert!(bundle.is_empty());
    assert_eq!(core.mempool_len(), 0);
}
