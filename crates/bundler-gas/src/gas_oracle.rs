//! ABI shapes for the two L1-data-cost oracles §4.3.1 calls into. Neither
//! oracle is part of the EntryPoint ABI, so they're declared locally rather
//! than living in `bundler-abi`.

use alloy_sol_types::sol;

sol! {
    function getL1Fee(bytes data) external view returns (uint256 fee);

    function gasEstimateL1Component(
        address to,
        bool contractCreation,
        bytes data
    ) external payable returns (uint64 gasEstimateForL1, uint256 baseFee, uint256 l1BaseFeeEstimate);
}
