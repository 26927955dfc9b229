//! ABI encoding/decoding for the EntryPoint contract: `sol!`-declared shapes
//! plus the codec helpers built on top of them (`AbiCodec` in all but name —
//! these are free functions rather than a struct, since none of them carry
//! state).

pub mod codec;
pub mod sol;

pub use codec::{
    decode, decode_error_string, decode_execution_result, decode_failed_op,
    decode_test_call_gas_result, decode_validation_result, encode, encode_handle_ops_calldata,
    encode_simulate_handle_op_calldata, encode_simulate_validation_calldata,
    encode_test_call_gas_calldata, selector_of, ERROR_STRING_SELECTOR, EXECUTION_RESULT_SELECTOR,
    FAILED_OP_SELECTOR, SIMULATE_HANDLE_OP_SELECTOR, TEST_CALL_GAS_SELECTOR,
    VALIDATION_RESULT_SELECTOR,
};
pub use sol::{
    handleOpsCall, simulateHandleOpCall, simulateValidationCall, testCallGasCall, testCallGasReturn,
    Error, ExecutionResult, FailedOp, ReturnInfo, StakeInfo, UserOperationSol, ValidationResult,
};
