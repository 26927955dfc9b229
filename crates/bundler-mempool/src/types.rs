use std::collections::{BTreeSet, VecDeque};

use alloy_primitives::{Address, B256, U256};
use bundler_types::{UserOperation, UserOperationHash};
use serde::{Deserialize, Serialize};

/// An admitted op plus the bookkeeping `get_bundle` needs to re-verify it
/// hasn't been invalidated by on-chain state drift since admission (§4.5).
#[derive(Debug, Clone)]
pub struct PooledUserOperation {
    pub op: UserOperation,
    pub hash: UserOperationHash,
    pub associated_addresses: BTreeSet<Address>,
    pub code_hash: B256,
}

/// One sender's FIFO queue of admitted ops, in admission order (§5:
/// insertion order equals bundle-extraction order within a sender).
#[derive(Debug, Default)]
pub struct Sender {
    pub ops: VecDeque<PooledUserOperation>,
}

impl Sender {
    /// The nonce monotonicity bound: the next admitted op for this sender
    /// must exceed the tail of the current queue.
    pub fn last_nonce(&self) -> Option<U256> {
        self.ops.back().map(|pooled| pooled.op.nonce)
    }
}

/// Mempool-wide capacity (M1): `add` rejects further admissions once the
/// sum of all sender queue lengths reaches this bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolConfig {
    pub capacity: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}
