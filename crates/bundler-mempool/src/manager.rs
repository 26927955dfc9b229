use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use bundler_errors::BundlerError;
use bundler_reputation::ReputationManager;
use bundler_types::{UserOperation, UserOperationHash};
use bundler_validation::{ValidationManager, ValidationOutcome};
use indexmap::IndexMap;

use crate::types::{MempoolConfig, PooledUserOperation, Sender};

/// Owns admission, eviction, and bundle assembly over the pool of validated
/// ops (§4.5). Holds its state exclusively: callers funnel every mutation
/// through `&mut self` (§5 — no locks are prescribed by this crate).
pub struct MempoolManager {
    senders: IndexMap<Address, Sender>,
    entity_in_mempool: HashMap<Address, u64>,
    reputation: ReputationManager,
    validation: Arc<ValidationManager>,
    chain_id: u64,
    config: MempoolConfig,
}

impl MempoolManager {
    pub fn new(
        validation: Arc<ValidationManager>,
        reputation: ReputationManager,
        chain_id: u64,
        config: MempoolConfig,
    ) -> Self {
        Self {
            senders: IndexMap::new(),
            entity_in_mempool: HashMap::new(),
            reputation,
            validation,
            chain_id,
            config,
        }
    }

    fn total_len(&self) -> usize {
        self.senders.values().map(|s| s.ops.len()).sum()
    }

    fn in_mempool_count(&self, sender: Address, entity: Address) -> u64 {
        if entity == sender {
            self.senders.get(&sender).map(|s| s.ops.len() as u64).unwrap_or(0)
        } else {
            self.entity_in_mempool.get(&entity).copied().unwrap_or(0)
        }
    }

    /// `add(op)` (§4.5 steps 1-6): reputation gating, validation, per-sender
    /// nonce monotonicity, then admission bookkeeping.
    #[tracing::instrument(skip(self, op), fields(sender = %op.sender))]
    pub async fn add(&mut self, op: UserOperation) -> Result<UserOperationHash, BundlerError> {
        if self.total_len() >= self.config.capacity {
            return Err(BundlerError::InvalidFields("mempool full".into()));
        }

        let factory = op.factory_address();
        let paymaster = op.paymaster_address();

        for (entity, role) in [
            (Some(op.sender), "sender"),
            (factory, "factory"),
            (paymaster, "paymaster"),
        ] {
            if let Some(entity) = entity {
                self.reputation
                    .check_admission(entity, role, self.in_mempool_count(op.sender, entity))?;
            }
        }

        let outcome = self.validation.simulate_validation(&op).await?;
        match outcome {
            ValidationOutcome::Valid { .. } => {}
            ValidationOutcome::FailedOp { reason, .. } => {
                return Err(BundlerError::RejectedByEntryPointOrAccount(reason));
            }
            ValidationOutcome::Protocol { raw } => {
                return Err(BundlerError::DecodeError(format!(
                    "simulateValidation returned an unrecognized selector: 0x{}",
                    hex::encode(&raw)
                )));
            }
        }

        // The hash is a pure function of the op's own bytes (§4.5: computed
        // "in parallel with the sender-queue append") — nothing here
        // crosses a suspension point, so there's no RPC to overlap it with.
        let hash = op.user_operation_hash(self.validation.entry_point(), self.chain_id);

        let associated_addresses = op.default_associated_addresses();
        let code_hash = self
            .validation
            .addresses_code_hash(&associated_addresses, "latest")
            .await?;

        let entry = self.senders.entry(op.sender).or_default();
        if let Some(last_nonce) = entry.last_nonce() {
            if op.nonce <= last_nonce {
                return Err(BundlerError::InvalidFields(format!(
                    "nonce {} is not greater than the sender's last queued nonce {}",
                    op.nonce, last_nonce
                )));
            }
        }

        self.reputation.record_seen(op.sender);
        if let Some(factory) = factory {
            self.reputation.record_seen(factory);
            *self.entity_in_mempool.entry(factory).or_insert(0) += 1;
        }
        if let Some(paymaster) = paymaster {
            self.reputation.record_seen(paymaster);
            *self.entity_in_mempool.entry(paymaster).or_insert(0) += 1;
        }

        entry.ops.push_back(PooledUserOperation {
            op,
            hash,
            associated_addresses,
            code_hash,
        });

        Ok(hash)
    }

    /// `get_bundle()`: pop the head op of every sender in admission order,
    /// dropping silently when the associated-address code hash no longer
    /// matches what was pinned at admission (§4.5). Atomic per op (§5): an
    /// op that mismatches is discarded, never returned to its queue. Either
    /// way the op leaves the mempool, so its factory/paymaster in-mempool
    /// counters are released here, not just on a successful inclusion.
    #[tracing::instrument(skip(self))]
    pub async fn get_bundle(&mut self) -> Result<Vec<UserOperation>, BundlerError> {
        let mut bundle = Vec::new();
        let mut emptied = Vec::new();
        let mut released = Vec::new();
        let mut included = Vec::new();

        for (sender, queue) in self.senders.iter_mut() {
            let Some(pooled) = queue.ops.pop_front() else {
                continue;
            };
            let still_matches = self
                .validation
                .code_hash_still_matches(&pooled.associated_addresses, pooled.code_hash)
                .await?;

            let factory = pooled.op.factory_address();
            let paymaster = pooled.op.paymaster_address();
            if let Some(factory) = factory {
                released.push(factory);
            }
            if let Some(paymaster) = paymaster {
                released.push(paymaster);
            }

            if still_matches {
                included.push((*sender, factory, paymaster));
                bundle.push(pooled.op);
            } else {
                tracing::warn!(%sender, "dropping op: associated-address code hash changed since admission");
            }
            if queue.ops.is_empty() {
                emptied.push(*sender);
            }
        }

        for sender in emptied {
            self.senders.shift_remove(&sender);
        }
        for entity in released {
            if let Some(count) = self.entity_in_mempool.get_mut(&entity) {
                *count = count.saturating_sub(1);
            }
        }
        for (sender, factory, paymaster) in included {
            self.reputation.record_included(sender);
            if let Some(factory) = factory {
                self.reputation.record_included(factory);
            }
            if let Some(paymaster) = paymaster {
                self.reputation.record_included(paymaster);
            }
        }

        Ok(bundle)
    }

    /// Drops all senders and their in-mempool entity counters (external
    /// reset). Reputation history is untouched.
    pub fn clear(&mut self) {
        self.senders.clear();
        self.entity_in_mempool.clear();
    }

    /// Flattens every sender's queue in iteration order.
    pub fn get_all(&self) -> Vec<UserOperation> {
        self.senders
            .values()
            .flat_map(|s| s.ops.iter().map(|pooled| pooled.op.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.total_len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn reputation(&self) -> &ReputationManager {
        &self.reputation
    }
}
