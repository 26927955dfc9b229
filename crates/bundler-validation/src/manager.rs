use std::collections::BTreeSet;
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256};
use bundler_abi::{
    self as abi, ERROR_STRING_SELECTOR, EXECUTION_RESULT_SELECTOR, FAILED_OP_SELECTOR,
    VALIDATION_RESULT_SELECTOR,
};
use bundler_errors::BundlerError;
use bundler_rpc::{EthRpcClient, RpcOutcome};
use bundler_types::{StateOverrides, UserOperation};

use crate::types::{ReturnInfo, SimulateHandleOpOutcome, StakeInfo, ValidationOutcome};

/// Drives the EntryPoint's revert-as-result simulation entry points and
/// classifies their output (§4.2). Stateless over the chain: every method
/// is a pure function of its arguments plus whatever the node returns.
pub struct ValidationManager {
    client: Arc<EthRpcClient>,
    entry_point: Address,
    bundler: Address,
}

impl ValidationManager {
    pub fn new(client: Arc<EthRpcClient>, entry_point: Address, bundler: Address) -> Self {
        Self {
            client,
            entry_point,
            bundler,
        }
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// `simulate_validation(op) -> ValidationOutcome`.
    pub async fn simulate_validation(
        &self,
        op: &UserOperation,
    ) -> Result<ValidationOutcome, BundlerError> {
        let calldata = abi::encode_simulate_validation_calldata(op);
        let outcome = self
            .client
            .eth_call(Some(self.bundler), self.entry_point, &calldata, "latest", None)
            .await?;

        let revert_data = match outcome {
            RpcOutcome::Result(_) => return Err(BundlerError::SimulationDidNotRevert),
            RpcOutcome::Error(err) => parse_revert_data(&err.message, err.data.as_deref())?,
        };

        classify_validation(&revert_data)
    }

    /// `simulate_handle_op`, with caller-supplied overrides (§4.3.5 — the
    /// gas manager owns building the right override set for each call).
    pub async fn simulate_handle_op(
        &self,
        op: &UserOperation,
        target: Address,
        target_call_data: Bytes,
        overrides: &StateOverrides,
    ) -> Result<SimulateHandleOpOutcome, BundlerError> {
        let calldata = abi::encode_simulate_handle_op_calldata(op, target, target_call_data);
        let outcome = self
            .client
            .eth_call(
                Some(self.bundler),
                self.entry_point,
                &calldata,
                "latest",
                Some(overrides),
            )
            .await?;

        let revert_data = match outcome {
            RpcOutcome::Result(_) => return Err(BundlerError::SimulationDidNotRevert),
            RpcOutcome::Error(err) => parse_revert_data(&err.message, err.data.as_deref())?,
        };

        classify_handle_op(&revert_data)
    }

    /// `code_hash = keccak(concat(eth_getCode(a) for a in sorted addresses))`.
    /// Addresses are fetched concurrently: each `eth_getCode` is an
    /// independent RPC (§5).
    pub async fn addresses_code_hash(
        &self,
        addresses: &BTreeSet<Address>,
        block: &str,
    ) -> Result<B256, BundlerError> {
        let fetches = addresses
            .iter()
            .map(|addr| self.client.eth_get_code(*addr, block));
        let codes = futures::future::try_join_all(fetches).await?;
        let mut concatenated = Vec::new();
        for code in codes {
            concatenated.extend_from_slice(&code);
        }
        Ok(keccak256(concatenated))
    }

    /// Recomputes the code hash over `addresses` and compares it against the
    /// hash pinned at admission. A mismatch means the op must be dropped
    /// silently at bundle time (§4.2, §4.5).
    pub async fn code_hash_still_matches(
        &self,
        addresses: &BTreeSet<Address>,
        pinned: B256,
    ) -> Result<bool, BundlerError> {
        Ok(self.addresses_code_hash(addresses, "latest").await? == pinned)
    }
}

/// Splits `error.data` into its 4-byte selector and remainder, after
/// confirming the error is in fact a revert (§4.2: "asserts the response is
/// an error with message 'execution reverted'").
fn parse_revert_data(message: &str, data: Option<&str>) -> Result<Bytes, BundlerError> {
    if !message.contains("execution reverted") {
        return Err(BundlerError::RpcError(format!(
            "expected a revert, node returned: {message}"
        )));
    }
    let data = data.unwrap_or("0x");
    data.parse::<Bytes>()
        .map_err(|err| BundlerError::DecodeError(format!("malformed revert data: {err}")))
}

fn classify_validation(payload: &Bytes) -> Result<ValidationOutcome, BundlerError> {
    let selector = abi::selector_of(payload)?;
    if selector == FAILED_OP_SELECTOR {
        let (op_index, paymaster, reason) = abi::decode_failed_op(payload)?;
        return Ok(ValidationOutcome::FailedOp {
            op_index,
            paymaster,
            reason,
        });
    }
    if selector == VALIDATION_RESULT_SELECTOR {
        let decoded = abi::decode_validation_result(payload)?;
        return Ok(ValidationOutcome::Valid {
            return_info: ReturnInfo {
                pre_op_gas: decoded.returnInfo.preOpGas,
                prefund: decoded.returnInfo.prefund,
                sig_failed: decoded.returnInfo.sigFailed,
                valid_after: decoded.returnInfo.validAfter,
                valid_until: decoded.returnInfo.validUntil,
            },
            sender_info: StakeInfo {
                stake: decoded.senderInfo.stake,
                unstake_delay_sec: decoded.senderInfo.unstakeDelaySec,
            },
            factory_info: StakeInfo {
                stake: decoded.factoryInfo.stake,
                unstake_delay_sec: decoded.factoryInfo.unstakeDelaySec,
            },
            paymaster_info: StakeInfo {
                stake: decoded.paymasterInfo.stake,
                unstake_delay_sec: decoded.paymasterInfo.unstakeDelaySec,
            },
        });
    }
    Ok(ValidationOutcome::Protocol {
        raw: payload.clone(),
    })
}

fn classify_handle_op(payload: &Bytes) -> Result<SimulateHandleOpOutcome, BundlerError> {
    let selector = abi::selector_of(payload)?;
    if selector == EXECUTION_RESULT_SELECTOR {
        let (pre_op_gas, paid, target_success, target_result) =
            abi::decode_execution_result(payload)?;
        return Ok(SimulateHandleOpOutcome::Success {
            pre_op_gas,
            paid,
            target_success,
            target_result,
        });
    }
    if selector == FAILED_OP_SELECTOR {
        let (_, _, reason) = abi::decode_failed_op(payload)?;
        return Ok(SimulateHandleOpOutcome::ValidationException { reason });
    }
    if selector == ERROR_STRING_SELECTOR {
        let reason = abi::decode_error_string(payload)?;
        return Ok(SimulateHandleOpOutcome::ValidationException { reason });
    }
    Ok(SimulateHandleOpOutcome::Protocol {
        raw: payload.clone(),
    })
}
