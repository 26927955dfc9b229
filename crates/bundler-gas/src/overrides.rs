use alloy_primitives::{Address, B256};
use bundler_types::constants::high_balance_override;
use bundler_types::{AccountOverride, StateOverrides, UserOperation};

use crate::deposit::deposit_slot_index;

const ZERO_ADDRESS: Address = Address::ZERO;

/// Builds the state overrides `simulate_handle_op` needs to bypass balance
/// checks (§4.3.5), then merges `caller_overrides` on top.
pub fn simulate_handle_op_overrides(
    op: &UserOperation,
    entry_point: Address,
    target: Address,
    caller_overrides: &StateOverrides,
) -> StateOverrides {
    let mut overrides = StateOverrides::new();
    overrides.insert(ZERO_ADDRESS, AccountOverride::with_balance(high_balance_override()));

    if op.paymaster_address().is_none() {
        if target == ZERO_ADDRESS {
            overrides.insert(op.sender, AccountOverride::with_balance(high_balance_override()));
        } else {
            insert_deposit_override(&mut overrides, entry_point, op.sender);
        }
    } else {
        let paymaster = op.paymaster_address().expect("checked above");
        insert_deposit_override(&mut overrides, entry_point, paymaster);
    }

    overrides.merge(caller_overrides.clone())
}

fn insert_deposit_override(overrides: &mut StateOverrides, entry_point: Address, depositor: Address) {
    let slot = deposit_slot_index(depositor, 0);
    let mut account_override = AccountOverride::default();
    account_override
        .state_diff
        .insert(slot, high_balance_value_word());
    overrides.insert(entry_point, account_override);
}

/// `high_balance_override()` (10^15 ETH, 112 bits) as a full 32-byte storage
/// word, matching the `DepositInfo.deposit` field's packing within the
/// EntryPoint's storage slot.
fn high_balance_value_word() -> B256 {
    B256::from(high_balance_override().to_be_bytes::<32>())
}
