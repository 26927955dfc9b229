//! Wires the validation/gas/mempool triad into a single facade a JSON-RPC
//! server or CLI front-end can drive without touching the individual
//! managers (§2, §9 "facade crate wiring the triad end to end").

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use bundler_errors::BundlerError;
use bundler_gas::{GasEstimate, GasManager, GasManagerConfig};
use bundler_mempool::{MempoolConfig, MempoolManager};
use bundler_reputation::{ReputationConfig, ReputationManager};
use bundler_rpc::EthRpcClient;
use bundler_types::{StateOverrides, UserOperation, UserOperationHash};
use bundler_validation::ValidationManager;
use serde::{Deserialize, Serialize};

/// Everything an embedder needs to stand up a [`BundlerCore`] for one chain
/// and one EntryPoint deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerCoreConfig {
    pub entry_point: Address,
    pub bundler: Address,
    pub chain_id: u64,
    pub gas: GasManagerConfig,
    pub reputation: ReputationConfig,
    pub mempool: MempoolConfig,
}

/// The bundler core: one EntryPoint, one chain, one mempool. Owns the
/// mempool exclusively (`&mut self` on every mutating method, per §5 —
/// an embedder wanting concurrent access wraps this in its own mutex).
pub struct BundlerCore {
    client: Arc<EthRpcClient>,
    validation: Arc<ValidationManager>,
    gas: GasManager,
    mempool: MempoolManager,
}

impl BundlerCore {
    pub fn new(client: Arc<EthRpcClient>, config: BundlerCoreConfig) -> Self {
        let validation = Arc::new(ValidationManager::new(
            client.clone(),
            config.entry_point,
            config.bundler,
        ));
        let gas = GasManager::new(
            client.clone(),
            validation.clone(),
            config.entry_point,
            config.chain_id,
            config.gas,
        );
        let reputation = ReputationManager::new(config.reputation);
        let mempool = MempoolManager::new(
            validation.clone(),
            reputation,
            config.chain_id,
            config.mempool,
        );
        Self {
            client,
            validation,
            gas,
            mempool,
        }
    }

    /// Estimates the three gas limits for `op` against the latest block,
    /// without admitting it to the mempool.
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
        overrides: &StateOverrides,
    ) -> Result<GasEstimate, BundlerError> {
        let base_fee = self.latest_base_fee().await?;
        self.gas.estimate_gas(op, "latest", base_fee, overrides).await
    }

    /// Full admission path (§2 control flow): static checks, fee/PVG
    /// verification, then handoff to the mempool (which itself drives
    /// reputation gating and `simulateValidation`).
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn add_user_operation(
        &mut self,
        op: UserOperation,
    ) -> Result<UserOperationHash, BundlerError> {
        op.validate_static()?;

        let base_fee = self.latest_base_fee().await?;
        self.gas.verify_gas_fees_and_get_price(&op).await?;
        self.gas
            .verify_preverification_gas_and_verification_gas_limit(&op, "latest", base_fee)
            .await?;

        self.mempool.add(op).await
    }

    /// Drains one op per sender, in admission order, dropping any whose
    /// pinned code hash no longer matches on-chain state.
    #[tracing::instrument(skip(self))]
    pub async fn get_bundle(&mut self) -> Result<Vec<UserOperation>, BundlerError> {
        self.mempool.get_bundle().await
    }

    pub fn clear_mempool(&mut self) {
        self.mempool.clear();
    }

    pub fn pending_user_operations(&self) -> Vec<UserOperation> {
        self.mempool.get_all()
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    pub fn reputation(&self) -> &ReputationManager {
        self.mempool.reputation()
    }

    pub fn entry_point(&self) -> Address {
        self.validation.entry_point()
    }

    async fn latest_base_fee(&self) -> Result<U256, BundlerError> {
        let block = self.client.eth_get_block_by_number("latest").await?;
        Ok(block.base_fee_per_gas.unwrap_or(U256::ZERO))
    }
}
