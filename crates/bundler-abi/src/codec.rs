use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, SolError, SolValue};
use bundler_errors::BundlerError;
use bundler_types::UserOperation;

use crate::sol::{
    handleOpsCall, simulateHandleOpCall, simulateValidationCall, testCallGasCall, Error as RevertError,
    ExecutionResult, FailedOp, UserOperationSol, ValidationResult,
};

/// `FailedOp(uint256,address,string)`.
pub const FAILED_OP_SELECTOR: [u8; 4] = FailedOp::SELECTOR;
/// `ValidationResult((uint256,uint256,bool,uint48,uint48,bytes),(uint256,uint256),(uint256,uint256),(uint256,uint256))`.
pub const VALIDATION_RESULT_SELECTOR: [u8; 4] = ValidationResult::SELECTOR;
/// `ExecutionResult(uint256,uint256,bool,bytes)`.
pub const EXECUTION_RESULT_SELECTOR: [u8; 4] = ExecutionResult::SELECTOR;
/// `Error(string)`, solidity's implicit `require`/`revert(string)` selector.
pub const ERROR_STRING_SELECTOR: [u8; 4] = RevertError::SELECTOR;
/// `testCallGas(address,bytes,bytes,uint256)`, the helper-bytecode entrypoint.
pub const TEST_CALL_GAS_SELECTOR: [u8; 4] = testCallGasCall::SELECTOR;
/// `simulateHandleOp((...),address,bytes)`.
pub const SIMULATE_HANDLE_OP_SELECTOR: [u8; 4] = simulateHandleOpCall::SELECTOR;

fn to_sol(op: &UserOperation) -> UserOperationSol {
    UserOperationSol {
        sender: op.sender,
        nonce: op.nonce,
        initCode: op.init_code.clone(),
        callData: op.call_data.clone(),
        callGasLimit: op.call_gas_limit,
        verificationGasLimit: op.verification_gas_limit,
        preVerificationGas: op.pre_verification_gas,
        maxFeePerGas: op.max_fee_per_gas,
        maxPriorityFeePerGas: op.max_priority_fee_per_gas,
        paymasterAndData: op.paymaster_and_data.clone(),
        signature: op.signature.clone(),
    }
}

/// Generic ABI encode over any `sol!`-derived value — the `encode(types,
/// values)` primitive from the codec contract.
pub fn encode<T: SolValue>(value: &T) -> Vec<u8> {
    value.abi_encode()
}

/// Generic ABI decode, the dual of [`encode`]. Rejects truncated payloads
/// with a typed [`BundlerError::DecodeError`] rather than panicking.
pub fn decode<T: SolValue>(data: &[u8]) -> Result<T, BundlerError> {
    T::abi_decode(data, true).map_err(|err| BundlerError::DecodeError(err.to_string()))
}

/// `encodeHandleOpsCalldata`: a singleton-bundle `handleOps` call.
pub fn encode_handle_ops_calldata(ops: &[UserOperation], beneficiary: Address) -> Bytes {
    let call = handleOpsCall {
        ops: ops.iter().map(to_sol).collect(),
        beneficiary,
    };
    Bytes::from(call.abi_encode())
}

/// `selector ∥ abi(op)` for `simulateValidation`.
pub fn encode_simulate_validation_calldata(op: &UserOperation) -> Bytes {
    let call = simulateValidationCall { userOp: to_sol(op) };
    Bytes::from(call.abi_encode())
}

/// `selector ∥ abi(op, target, targetCallData)` for `simulateHandleOp`.
pub fn encode_simulate_handle_op_calldata(
    op: &UserOperation,
    target: Address,
    target_call_data: Bytes,
) -> Bytes {
    let call = simulateHandleOpCall {
        userOp: to_sol(op),
        target,
        targetCallData: target_call_data,
    };
    Bytes::from(call.abi_encode())
}

/// `selector ∥ abi(sender, initCode, callData, callGasLimit)` for the
/// `testCallGas` helper used by call-gas binary search.
pub fn encode_test_call_gas_calldata(
    sender: Address,
    init_code: Bytes,
    call_data: Bytes,
    call_gas_limit: alloy_primitives::U256,
) -> Bytes {
    let call = testCallGasCall {
        sender,
        initCode: init_code,
        callData: call_data,
        callGasLimit: call_gas_limit,
    };
    Bytes::from(call.abi_encode())
}

/// The first 4 bytes of a revert/return payload, or a typed error if the
/// payload is too short to carry a selector at all.
pub fn selector_of(payload: &[u8]) -> Result<[u8; 4], BundlerError> {
    payload
        .get(..4)
        .map(|s| [s[0], s[1], s[2], s[3]])
        .ok_or_else(|| {
            BundlerError::DecodeError("payload shorter than a 4-byte selector".into())
        })
}

/// `decodeFailedOp(payload) -> (opIndex, paymaster, reason)`.
pub fn decode_failed_op(
    payload: &[u8],
) -> Result<(alloy_primitives::U256, Address, String), BundlerError> {
    let decoded = FailedOp::abi_decode(payload, true)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))?;
    Ok((decoded.opIndex, decoded.paymaster, decoded.reason))
}

/// `decodeValidationResult(payload) -> (ReturnInfo, StakeInfo x3)`.
pub fn decode_validation_result(payload: &[u8]) -> Result<ValidationResult, BundlerError> {
    ValidationResult::abi_decode(payload, true)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))
}

/// `decodeExecutionResult(payload) -> (preOpGas, paid, targetSuccess, targetResult)`.
pub fn decode_execution_result(
    payload: &[u8],
) -> Result<(alloy_primitives::U256, alloy_primitives::U256, bool, Bytes), BundlerError> {
    let decoded = ExecutionResult::abi_decode(payload, true)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))?;
    Ok((
        decoded.preOpGas,
        decoded.paid,
        decoded.targetSuccess,
        decoded.targetResult,
    ))
}

/// Decodes a bare `Error(string)` revert, the shape Solidity emits for
/// `require(cond, "message")` and unqualified `revert("message")`.
pub fn decode_error_string(payload: &[u8]) -> Result<String, BundlerError> {
    let decoded = RevertError::abi_decode(payload, true)
        .map_err(|err| BundlerError::DecodeError(err.to_string()))?;
    Ok(decoded.message)
}

/// The `(success, gasUsed, returnData)` triple the `testCallGas` helper
/// returns, decoded from a non-reverting `eth_call` result (not a revert
/// payload — the helper always returns normally).
pub fn decode_test_call_gas_result(
    data: &[u8],
) -> Result<(bool, alloy_primitives::U256, Bytes), BundlerError> {
    testCallGasCall::abi_decode_returns(data)
        .map(|r| (r.success, r.gasUsed, r.returnData))
        .map_err(|err| BundlerError::DecodeError(err.to_string()))
}
