use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

/// `keccak256(abi.encode(uint256(address), uint256(slot)))` — the storage
/// slot of `EntryPoint.deposits[address]` under Solidity's `mapping(address
/// => DepositInfo)` layout at storage slot 0 (§4.3.5).
pub fn deposit_slot_index(address: Address, slot: u64) -> B256 {
    let address_as_uint = U256::from_be_bytes(address.into_word().0);
    keccak256((address_as_uint, U256::from(slot)).abi_encode_params())
}
