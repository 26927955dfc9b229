use alloy_primitives::{Address, Bytes, U256};

/// Domain copy of the EntryPoint's `ReturnInfo` struct, decoupled from the
/// ABI-generated type so callers outside this crate never need to depend on
/// `bundler-abi`'s `sol!` output directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnInfo {
    pub pre_op_gas: U256,
    pub prefund: U256,
    pub sig_failed: bool,
    pub valid_after: u64,
    pub valid_until: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeInfo {
    pub stake: U256,
    pub unstake_delay_sec: U256,
}

/// The tagged sum `simulateValidation`'s revert payload decodes to (§4.2):
/// a successful validation, a rejection from the EntryPoint or the account
/// itself, or an unrecognized selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid {
        return_info: ReturnInfo,
        sender_info: StakeInfo,
        factory_info: StakeInfo,
        paymaster_info: StakeInfo,
    },
    FailedOp {
        op_index: U256,
        paymaster: Address,
        reason: String,
    },
    Protocol {
        raw: Bytes,
    },
}

/// The tagged sum `simulateHandleOp`'s revert payload decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulateHandleOpOutcome {
    Success {
        pre_op_gas: U256,
        paid: U256,
        target_success: bool,
        target_result: Bytes,
    },
    ValidationException {
        reason: String,
    },
    Protocol {
        raw: Bytes,
    },
}
