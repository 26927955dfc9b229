use std::collections::BTreeSet;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use bundler_errors::BundlerError;
use serde::{Deserialize, Serialize};

use crate::constants::{DUMMY_SIGNATURE_LEN, MAX_CALL_GAS_LIMIT, MAX_VERIFICATION_GAS_LIMIT};

/// Canonical representation of an ERC-4337 user operation (EntryPoint v0.6
/// struct layout: a flat `paymasterAndData` blob rather than the packed
/// `accountGasLimits`/paymaster fields of v0.7).
///
/// Immutable once admitted to the mempool except for the gas fields, which
/// are still being estimated during pre-admission gas estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

/// Hash pinned at admission over the set of contract addresses observed
/// during validation (sender, factory, paymaster, or a richer trace-derived
/// set when a trace subsystem is available).
pub type CodeHash = B256;

/// The EIP-712-like hash over the canonical encoding plus EntryPoint address
/// and chain id (I6: stable for the life of the op).
pub type UserOperationHash = B256;

impl UserOperation {
    /// I1: `sender` is non-zero.
    /// I2: if `initCode` is non-empty it begins with a 20-byte factory address.
    /// I3: `paymasterAndData` is either empty or begins with a 20-byte paymaster address.
    /// I4: all three gas limit fields are within their caps.
    ///
    /// Does not check I5 (preVerificationGas lower bound): that requires the
    /// chain-aware computation owned by `GasManager`.
    pub fn validate_static(&self) -> Result<(), BundlerError> {
        if self.sender.is_zero() {
            return Err(BundlerError::InvalidFields("sender is the zero address".into()));
        }
        if !self.init_code.is_empty() && self.init_code.len() < 20 {
            return Err(BundlerError::InvalidFields(
                "initCode is non-empty but shorter than a 20-byte factory address".into(),
            ));
        }
        if !self.paymaster_and_data.is_empty() && self.paymaster_and_data.len() < 20 {
            return Err(BundlerError::InvalidFields(
                "paymasterAndData is non-empty but shorter than a 20-byte paymaster address"
                    .into(),
            ));
        }
        if self.verification_gas_limit > U256::from(MAX_VERIFICATION_GAS_LIMIT) {
            return Err(BundlerError::InvalidFields(format!(
                "verificationGasLimit {} exceeds cap {}",
                self.verification_gas_limit, MAX_VERIFICATION_GAS_LIMIT
            )));
        }
        if self.call_gas_limit > U256::from(MAX_CALL_GAS_LIMIT) {
            return Err(BundlerError::InvalidFields(format!(
                "callGasLimit {} exceeds cap {}",
                self.call_gas_limit, MAX_CALL_GAS_LIMIT
            )));
        }
        Ok(())
    }

    /// First 20 bytes of `initCode`, if any.
    pub fn factory_address(&self) -> Option<Address> {
        Self::leading_address(&self.init_code)
    }

    /// First 20 bytes of `paymasterAndData`, if any.
    pub fn paymaster_address(&self) -> Option<Address> {
        Self::leading_address(&self.paymaster_and_data)
    }

    fn leading_address(field: &Bytes) -> Option<Address> {
        (field.len() >= 20).then(|| Address::from_slice(&field[..20]))
    }

    /// `{sender, factory, paymaster}`, the default associated-address set
    /// when a trace subsystem is unavailable to the validation manager.
    pub fn default_associated_addresses(&self) -> BTreeSet<Address> {
        let mut set = BTreeSet::new();
        set.insert(self.sender);
        if let Some(f) = self.factory_address() {
            set.insert(f);
        }
        if let Some(p) = self.paymaster_address() {
            set.insert(p);
        }
        set
    }

    /// ABI-encodes the op as the `(address,uint256,bytes,bytes,uint256,
    /// uint256,uint256,uint256,uint256,bytes,bytes)` tuple that EntryPoint
    /// sees embedded inside a `handleOps` transaction. This is the
    /// "canonical packing routine" §4.3.1 computes calldata cost over — it
    /// carries the real bytes, not hashes of them.
    pub fn pack_for_calldata_cost(&self) -> Vec<u8> {
        (
            self.sender,
            self.nonce,
            self.init_code.clone(),
            self.call_data.clone(),
            self.call_gas_limit,
            self.verification_gas_limit,
            self.pre_verification_gas,
            self.max_fee_per_gas,
            self.max_priority_fee_per_gas,
            self.paymaster_and_data.clone(),
            self.signature.clone(),
        )
            .abi_encode_params()
    }

    /// Like [`Self::pack_for_calldata_cost`] but with `preVerificationGas`
    /// forced to `21000` and the signature padded to the 65-byte dummy
    /// value when shorter, matching the pre-verification-gas algorithm's
    /// step (a).
    ///
    /// Signatures longer than 65 bytes are left untouched and inflate the
    /// computed gas accurately; only short/missing signatures are padded.
    pub fn pack_for_pre_verification_gas(&self) -> Vec<u8> {
        let mut clone = self.clone();
        clone.pre_verification_gas = U256::from(21_000u64);
        clone.signature = pad_dummy_signature(&clone.signature);
        clone.pack_for_calldata_cost()
    }

    /// The canonical encoding hashed for `user_operation_hash`: every
    /// variable-length field is pre-hashed so the outer tuple is a fixed
    /// set of words, matching the EntryPoint's own `getUserOpHash` packing.
    fn pack_for_hash(&self) -> Vec<u8> {
        (
            self.sender,
            self.nonce,
            keccak256(&self.init_code),
            keccak256(&self.call_data),
            self.call_gas_limit,
            self.verification_gas_limit,
            self.pre_verification_gas,
            self.max_fee_per_gas,
            self.max_priority_fee_per_gas,
            keccak256(&self.paymaster_and_data),
        )
            .abi_encode_params()
    }

    /// `user_operation_hash = keccak(keccak(pack_for_hash) ++ entrypoint ++ chain_id)`.
    ///
    /// I6: stable for the life of the op — a pure function of the immutable
    /// fields plus the (also immutable) entrypoint/chain_id pair.
    pub fn user_operation_hash(&self, entry_point: Address, chain_id: u64) -> UserOperationHash {
        let inner = keccak256(self.pack_for_hash());
        keccak256((inner, entry_point, U256::from(chain_id)).abi_encode_params())
    }
}

/// Pads `sig` up to the 65-byte dummy value when shorter; left unchanged
/// otherwise. The dummy fill mirrors the reference bundler's placeholder
/// signature used purely to size pre-verification-gas accounting.
pub fn pad_dummy_signature(sig: &Bytes) -> Bytes {
    if sig.len() >= DUMMY_SIGNATURE_LEN {
        return sig.clone();
    }
    Bytes::from(vec![0x01u8; DUMMY_SIGNATURE_LEN])
}

/// Zero/non-zero calldata byte cost, used both for the packed-op cost in
/// pre-verification gas and for `eth_estimateGas` overhead subtraction.
pub fn calldata_gas_cost(data: &[u8]) -> u64 {
    let zero = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zero = data.len() as u64 - zero;
    zero * crate::constants::PVG_ZERO_BYTE + non_zero * crate::constants::PVG_NON_ZERO_BYTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    fn zeroed_op() -> UserOperation {
        UserOperation {
            sender: Address::ZERO,
            nonce: U256::ZERO,
            init_code: Bytes::default(),
            call_data: Bytes::default(),
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        }
    }

    // Cross-checked against the EntryPoint's own getUserOpHash() output for
    // the all-zero operation at entrypoint 0x66a1...4ddc, chain id 1337.
    #[test]
    fn hash_zeroed_matches_entrypoint() {
        let op = zeroed_op();
        let entry_point = address!("66a15edcc3b50a663e72f1457ffd49b9ae284ddc");
        let hash = op.user_operation_hash(entry_point, 1337);
        let expected: B256 =
            "0xdca97c3b49558ab360659f6ead939773be8bf26631e61bb17045bb70dc983b2d"
                .parse()
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn hash_is_stable_across_clones() {
        let op = zeroed_op();
        let entry_point = address!("1111111111111111111111111111111111111111");
        let a = op.user_operation_hash(entry_point, 1);
        let b = op.clone().user_operation_hash(entry_point, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn factory_and_paymaster_addresses_from_leading_bytes() {
        let mut op = zeroed_op();
        op.init_code = bytes!("6942069420694206942069420694206942069420deadbeef");
        op.paymaster_and_data =
            bytes!("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef");
        assert_eq!(
            op.factory_address(),
            Some(address!("6942069420694206942069420694206942069420"))
        );
        assert_eq!(
            op.paymaster_address(),
            Some(address!("0123456789abcdef0123456789abcdef01234567"))
        );
    }

    #[test]
    fn validate_static_rejects_zero_sender() {
        let op = zeroed_op();
        assert!(matches!(
            op.validate_static(),
            Err(BundlerError::InvalidFields(_))
        ));
    }

    #[test]
    fn validate_static_rejects_short_init_code() {
        let mut op = zeroed_op();
        op.sender = address!("000000000000000000000000000000000000aa");
        op.init_code = bytes!("1234");
        assert!(matches!(
            op.validate_static(),
            Err(BundlerError::InvalidFields(_))
        ));
    }

    #[test]
    fn validate_static_rejects_gas_caps() {
        let mut op = zeroed_op();
        op.sender = address!("000000000000000000000000000000000000aa");
        op.call_gas_limit = U256::from(MAX_CALL_GAS_LIMIT + 1);
        assert!(matches!(
            op.validate_static(),
            Err(BundlerError::InvalidFields(_))
        ));
    }

    #[test]
    fn pad_dummy_signature_fills_short_signatures_only() {
        let short = Bytes::from(vec![0xffu8; 10]);
        assert_eq!(pad_dummy_signature(&short).len(), 65);

        let long = Bytes::from(vec![0xffu8; 70]);
        assert_eq!(pad_dummy_signature(&long), long);
    }

    #[test]
    fn calldata_gas_cost_weighs_zero_and_non_zero_bytes() {
        let data = [0u8, 0, 1, 2, 0];
        // 3 zero bytes * 4 + 2 non-zero bytes * 16 = 12 + 32 = 44
        assert_eq!(calldata_gas_cost(&data), 44);
    }
}
