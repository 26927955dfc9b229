//! A thin JSON-RPC client over an Ethereum node, abstracted behind
//! [`JsonRpcTransport`] so the validation/gas managers can be driven against
//! a fake node in tests.

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{BlockInfo, EthRpcClient, RpcError, RpcOutcome};
pub use transport::{HttpJsonRpcTransport, JsonRpcTransport};

#[cfg(feature = "test-utils")]
pub use transport::MockJsonRpcTransport;
