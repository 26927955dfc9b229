use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// A single account's override, passed to `eth_call`/`eth_estimateGas` as
/// part of the third (state override) parameter.
///
/// `state_diff` is a sparse slot -> value map merged into existing storage,
/// as distinct from a full-replacement `state` map (not modeled here: the
/// bundler never needs to wipe an account's storage wholesale).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    #[serde(
        rename = "stateDiff",
        skip_serializing_if = "BTreeMap::is_empty",
        default
    )]
    pub state_diff: BTreeMap<B256, B256>,
}

impl AccountOverride {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance: Some(balance),
            ..Default::default()
        }
    }

    pub fn with_code(code: Bytes) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    /// Right-biased merge: `other`'s fields win where set, `stateDiff` slots
    /// union with `other` overwriting on key collision.
    pub fn merge(mut self, other: AccountOverride) -> Self {
        if other.balance.is_some() {
            self.balance = other.balance;
        }
        if other.code.is_some() {
            self.code = other.code;
        }
        self.state_diff.extend(other.state_diff);
        self
    }
}

/// The full set of per-address overrides sent alongside a call. Address keys
/// merge right-biased through [`AccountOverride::merge`]; this is how the
/// gas manager layers a deposit-slot override for the sender on top of a
/// high-balance override for the same address without clobbering either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOverrides(pub BTreeMap<Address, AccountOverride>);

impl StateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, account_override: AccountOverride) {
        self.0
            .entry(address)
            .and_modify(|existing| {
                *existing = existing.clone().merge(account_override.clone())
            })
            .or_insert(account_override);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges `other` into `self`, address by address, right-biased.
    pub fn merge(mut self, other: StateOverrides) -> Self {
        for (address, account_override) in other.0 {
            self.insert(address, account_override);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn account_override_merge_is_right_biased_and_unions_state_diff() {
        let mut a = AccountOverride::with_balance(U256::from(1u64));
        a.state_diff.insert(B256::ZERO, B256::with_last_byte(1));

        let mut b = AccountOverride::with_balance(U256::from(2u64));
        b.state_diff
            .insert(B256::with_last_byte(9), B256::with_last_byte(9));

        let merged = a.merge(b);
        assert_eq!(merged.balance, Some(U256::from(2u64)));
        assert_eq!(merged.state_diff.len(), 2);
    }

    #[test]
    fn state_overrides_insert_merges_same_address() {
        let addr = address!("0000000000000000000000000000000000dead");
        let mut overrides = StateOverrides::new();
        overrides.insert(addr, AccountOverride::with_balance(U256::from(1u64)));
        overrides.insert(addr, AccountOverride::with_code(Bytes::from(vec![0x60])));

        let entry = overrides.0.get(&addr).unwrap();
        assert_eq!(entry.balance, Some(U256::from(1u64)));
        assert!(entry.code.is_some());
    }

    #[test]
    fn state_overrides_merge_combines_distinct_addresses() {
        let a_addr = address!("0000000000000000000000000000000000aaaa");
        let b_addr = address!("0000000000000000000000000000000000bbbb");
        let mut a = StateOverrides::new();
        a.insert(a_addr, AccountOverride::with_balance(U256::from(1u64)));
        let mut b = StateOverrides::new();
        b.insert(b_addr, AccountOverride::with_balance(U256::from(2u64)));

        let merged = a.merge(b);
        assert_eq!(merged.0.len(), 2);
    }
}
