//! EntryPoint ABI shapes declared once via `sol!` so every selector below is
//! derived by the macro from its Solidity signature rather than hand-copied.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct UserOperationSol {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes paymasterAndData;
        bytes signature;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ReturnInfo {
        uint256 preOpGas;
        uint256 prefund;
        bool sigFailed;
        uint48 validAfter;
        uint48 validUntil;
        bytes paymasterContext;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct StakeInfo {
        uint256 stake;
        uint256 unstakeDelaySec;
    }

    #[derive(Debug, PartialEq, Eq)]
    error FailedOp(uint256 opIndex, address paymaster, string reason);

    #[derive(Debug, PartialEq, Eq)]
    error ValidationResult(
        ReturnInfo returnInfo,
        StakeInfo senderInfo,
        StakeInfo factoryInfo,
        StakeInfo paymasterInfo
    );

    #[derive(Debug, PartialEq, Eq)]
    error ExecutionResult(uint256 preOpGas, uint256 paid, bool targetSuccess, bytes targetResult);

    #[derive(Debug, PartialEq, Eq)]
    error Error(string message);

    function testCallGas(
        address sender,
        bytes initCode,
        bytes callData,
        uint256 callGasLimit
    ) returns (bool success, uint256 gasUsed, bytes returnData);

    function simulateValidation(UserOperationSol userOp);

    function simulateHandleOp(UserOperationSol userOp, address target, bytes targetCallData);

    function handleOps(UserOperationSol[] ops, address beneficiary);
}
