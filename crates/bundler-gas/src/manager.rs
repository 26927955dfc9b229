use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use bundler_errors::BundlerError;
use bundler_rpc::EthRpcClient;
use bundler_types::constants::{MAX_CALL_GAS_LIMIT, MIN_CALL_GAS_LIMIT};
use bundler_types::{StateOverrides, UserOperation};
use bundler_validation::{SimulateHandleOpOutcome, ValidationManager};

use crate::call_gas::{
    estimate_call_gas_limit_via_binary_search, estimate_call_gas_limit_via_eth_estimate,
    eth_estimate_strategy_eligible, OverrideSupportLatch,
};
use crate::config::GasManagerConfig;
use crate::fees::verify_gas_fees_and_get_price;
use crate::overrides::simulate_handle_op_overrides;
use crate::preverification::get_preverification_gas;

/// The three limits `estimate_gas` computes, in the order §4.3 defines them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub pre_verification_gas: U256,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
}

/// Computes and verifies the three EntryPoint gas limits (§4.3). Remembers,
/// for the lifetime of the process, whether the connected node supports
/// state-override `eth_estimateGas` — once it answers `MethodNotFound` the
/// manager falls back to binary search permanently.
pub struct GasManager {
    client: Arc<EthRpcClient>,
    validation: Arc<ValidationManager>,
    entry_point: Address,
    chain_id: u64,
    config: GasManagerConfig,
    override_support: OverrideSupportLatch,
}

impl GasManager {
    pub fn new(
        client: Arc<EthRpcClient>,
        validation: Arc<ValidationManager>,
        entry_point: Address,
        chain_id: u64,
        config: GasManagerConfig,
    ) -> Self {
        Self {
            client,
            validation,
            entry_point,
            chain_id,
            config,
            override_support: OverrideSupportLatch::new(),
        }
    }

    /// `estimate_callgaslimit_and_preverificationgas_and_verificationgas`:
    /// pre-verification gas first, then call gas limit, then verification
    /// gas limit (the order §4.3 fixes).
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn estimate_gas(
        &self,
        op: &UserOperation,
        block: &str,
        base_fee: U256,
        overrides: &StateOverrides,
    ) -> Result<GasEstimate, BundlerError> {
        let pre_verification_gas = U256::from(
            get_preverification_gas(
                &self.client,
                &self.config,
                self.chain_id,
                self.entry_point,
                op,
                block,
                base_fee,
            )
            .await?,
        );

        let call_gas_limit = self.estimate_call_gas_limit(op, block, overrides).await?;

        let mut sized_op = op.clone();
        sized_op.pre_verification_gas = pre_verification_gas;
        sized_op.call_gas_limit = call_gas_limit;
        let verification_gas_limit = self.estimate_verification_gas_limit(&sized_op, block).await?;

        Ok(GasEstimate {
            pre_verification_gas,
            call_gas_limit,
            verification_gas_limit,
        })
    }

    /// §4.3.2: Strategy A when eligible and not yet disproven, else Strategy
    /// B. A `MethodNotFound` from Strategy A flips the support latch
    /// permanently before falling back.
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn estimate_call_gas_limit(
        &self,
        op: &UserOperation,
        block: &str,
        overrides: &StateOverrides,
    ) -> Result<U256, BundlerError> {
        if eth_estimate_strategy_eligible(op, overrides, self.override_support.is_supported()) {
            match estimate_call_gas_limit_via_eth_estimate(
                &self.client,
                self.entry_point,
                op,
                block,
                overrides,
            )
            .await?
            {
                Some(limit) => return Ok(self.clamp_to_floor(limit)),
                None => self.override_support.mark_unsupported(),
            }
        }

        let limit =
            estimate_call_gas_limit_via_binary_search(&self.client, self.entry_point, op, block)
                .await?;
        Ok(self.clamp_to_floor(limit))
    }

    fn clamp_to_floor(&self, limit: U256) -> U256 {
        if self.config.clamp_call_gas_to_floor {
            limit.max(U256::from(MIN_CALL_GAS_LIMIT))
        } else {
            limit
        }
    }

    /// §4.3.3: force `callGasLimit` to the ceiling so verification is the
    /// binding constraint, run `simulate_handle_op` against the zero
    /// address, and read `preOpGas - preVerificationGas` off the result.
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn estimate_verification_gas_limit(
        &self,
        op: &UserOperation,
        _block: &str,
    ) -> Result<U256, BundlerError> {
        let mut probe = op.clone();
        probe.call_gas_limit = U256::from(MAX_CALL_GAS_LIMIT);

        let overrides =
            simulate_handle_op_overrides(&probe, self.entry_point, Address::ZERO, &StateOverrides::new());

        match self
            .validation
            .simulate_handle_op(&probe, Address::ZERO, Bytes::default(), &overrides)
            .await?
        {
            SimulateHandleOpOutcome::Success { pre_op_gas, .. } => {
                Ok(pre_op_gas.saturating_sub(probe.pre_verification_gas))
            }
            SimulateHandleOpOutcome::ValidationException { reason } => {
                Err(BundlerError::SimulateValidation(reason))
            }
            SimulateHandleOpOutcome::Protocol { raw } => {
                Err(BundlerError::DecodeError(format!(
                    "simulateHandleOp returned an unrecognized selector: 0x{}",
                    hex::encode(&raw)
                )))
            }
        }
    }

    /// §4.3.4, delegated to the free function so it can be unit-tested
    /// without a full `GasManager`.
    pub async fn verify_gas_fees_and_get_price(&self, op: &UserOperation) -> Result<U256, BundlerError> {
        verify_gas_fees_and_get_price(&self.client, &self.config, op).await
    }

    /// §4.3.1/I5: rejects an op whose declared `preVerificationGas` is below
    /// the computed floor, or whose `verificationGasLimit` exceeds the cap.
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn verify_preverification_gas_and_verification_gas_limit(
        &self,
        op: &UserOperation,
        block: &str,
        base_fee: U256,
    ) -> Result<(), BundlerError> {
        use bundler_types::constants::MAX_VERIFICATION_GAS_LIMIT;

        let expected = get_preverification_gas(
            &self.client,
            &self.config,
            self.chain_id,
            self.entry_point,
            op,
            block,
            base_fee,
        )
        .await?;

        if op.pre_verification_gas < U256::from(expected) {
            return Err(BundlerError::SimulateValidation(format!(
                "preVerificationGas too low, minimum: {expected:#x}"
            )));
        }
        if op.verification_gas_limit > U256::from(MAX_VERIFICATION_GAS_LIMIT) {
            return Err(BundlerError::SimulateValidation(format!(
                "verificationGasLimit too high, maximum: {MAX_VERIFICATION_GAS_LIMIT:#x}"
            )));
        }
        Ok(())
    }
}
