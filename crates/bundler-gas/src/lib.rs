//! Computes and verifies the three EntryPoint gas limits (§4.3): pre-
//! verification gas, call gas limit, and verification gas limit, plus the
//! fee-floor check that gates admission.

pub mod call_gas;
pub mod config;
pub mod deposit;
pub mod fees;
pub mod gas_oracle;
pub mod helper_bytecode;
pub mod l1_cost;
pub mod manager;
pub mod overrides;
pub mod preverification;

pub use config::GasManagerConfig;
pub use manager::{GasEstimate, GasManager};
