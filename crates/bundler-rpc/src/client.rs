use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use bundler_errors::BundlerError;
use bundler_types::StateOverrides;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::retry::retry_delay;
use crate::transport::JsonRpcTransport;

/// The `{"code", "message", ["data"]}` shape of a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

/// `call()`'s result: the EntryPoint's revert-as-result protocol means a
/// node-level "error" is frequently the expected outcome (a revert carrying
/// a payload), not a failure — so it is surfaced to the caller rather than
/// collapsed into [`BundlerError`]. Only `-32601`/`-32602` (the node lacking
/// the method or rejecting its params) are promoted to a typed error; every
/// other error response passes through as [`RpcOutcome::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcError),
}

impl RpcOutcome {
    /// Collapses the outcome into a plain result, for call sites that have
    /// no use for the revert-as-result distinction (fee floors, block info).
    pub fn into_result(self) -> Result<Value, BundlerError> {
        match self {
            RpcOutcome::Result(v) => Ok(v),
            RpcOutcome::Error(e) => Err(BundlerError::RpcError(e.message)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub number: U256,
    pub base_fee_per_gas: Option<U256>,
    pub gas_limit: U256,
}

/// Thin JSON-RPC client over an injected [`JsonRpcTransport`]. Retries
/// transport-level failures (not logical RPC errors) with a bounded
/// exponential backoff; logical errors are the node being authoritative and
/// are never retried.
pub struct EthRpcClient {
    transport: Arc<dyn JsonRpcTransport>,
    max_attempts: u32,
}

impl EthRpcClient {
    pub fn new(transport: Arc<dyn JsonRpcTransport>) -> Self {
        Self {
            transport,
            max_attempts: 3,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The thin `call(method, params) -> Result` primitive (§4.6). Retries
    /// transport errors up to `max_attempts` times; `-32601`/`-32602` become
    /// [`BundlerError::MethodNotFound`] immediately (no point retrying a
    /// method the node has told us it doesn't support).
    pub async fn call(&self, method: &str, params: Value) -> Result<RpcOutcome, BundlerError> {
        let mut attempt = 0;
        loop {
            match self.transport.send_raw(method, params.clone()).await {
                Ok(envelope) => return Self::interpret(envelope),
                Err(err) if attempt + 1 >= self.max_attempts => return Err(err),
                Err(err) => {
                    tracing::warn!(method, attempt, error = %err, "rpc transport error, retrying");
                    tokio::time::sleep(retry_delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    fn interpret(envelope: Value) -> Result<RpcOutcome, BundlerError> {
        if let Some(error) = envelope.get("error") {
            let rpc_error: RpcError = serde_json::from_value(error.clone())
                .map_err(|err| BundlerError::DecodeError(format!("malformed error envelope: {err}")))?;
            return match rpc_error.code {
                -32601 | -32602 => Err(BundlerError::MethodNotFound),
                _ => Ok(RpcOutcome::Error(rpc_error)),
            };
        }
        let result = envelope.get("result").cloned().ok_or_else(|| {
            BundlerError::DecodeError("response has neither result nor error".into())
        })?;
        Ok(RpcOutcome::Result(result))
    }

    /// `eth_call({from, to, data}, block[, stateOverrides])`, left as a raw
    /// [`RpcOutcome`] since the validation manager interprets a revert's
    /// `error.data` directly.
    pub async fn eth_call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &Bytes,
        block: &str,
        overrides: Option<&StateOverrides>,
    ) -> Result<RpcOutcome, BundlerError> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        let mut params = vec![tx, json!(block)];
        if let Some(overrides) = overrides {
            params.push(serde_json::to_value(overrides).map_err(|err| {
                BundlerError::DecodeError(format!("state overrides: {err}"))
            })?);
        }
        self.call("eth_call", json!(params)).await
    }

    /// `eth_estimateGas({from, to, data}, block[, stateOverrides])`. A
    /// `MethodNotFound` here (when `overrides` is `Some`) is how the gas
    /// manager learns the node can't do state-override estimation.
    pub async fn eth_estimate_gas(
        &self,
        from: Option<Address>,
        to: Address,
        data: &Bytes,
        block: &str,
        overrides: Option<&StateOverrides>,
    ) -> Result<RpcOutcome, BundlerError> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        let mut params = vec![tx, json!(block)];
        if let Some(overrides) = overrides {
            params.push(serde_json::to_value(overrides).map_err(|err| {
                BundlerError::DecodeError(format!("state overrides: {err}"))
            })?);
        }
        self.call("eth_estimateGas", json!(params)).await
    }

    pub async fn eth_gas_price(&self) -> Result<U256, BundlerError> {
        let value = self.call("eth_gasPrice", json!([])).await?.into_result()?;
        parse_quantity(&value)
    }

    pub async fn eth_max_priority_fee_per_gas(&self) -> Result<U256, BundlerError> {
        let value = self
            .call("eth_maxPriorityFeePerGas", json!([]))
            .await?
            .into_result()?;
        parse_quantity(&value)
    }

    /// `eth_gasPrice` and `eth_maxPriorityFeePerGas` are independent RPCs
    /// (§5); fetch them concurrently rather than sequentially.
    pub async fn fee_floors(&self) -> Result<(U256, U256), BundlerError> {
        tokio::try_join!(self.eth_gas_price(), self.eth_max_priority_fee_per_gas())
    }

    pub async fn eth_get_block_by_number(&self, tag: &str) -> Result<BlockInfo, BundlerError> {
        let value = self
            .call("eth_getBlockByNumber", json!([tag, false]))
            .await?
            .into_result()?;
        let number = value
            .get("number")
            .ok_or_else(|| BundlerError::DecodeError("block missing number".into()))
            .and_then(parse_quantity)?;
        let base_fee_per_gas = value
            .get("baseFeePerGas")
            .map(parse_quantity)
            .transpose()?;
        let gas_limit = value
            .get("gasLimit")
            .ok_or_else(|| BundlerError::DecodeError("block missing gasLimit".into()))
            .and_then(parse_quantity)?;
        Ok(BlockInfo {
            number,
            base_fee_per_gas,
            gas_limit,
        })
    }

    pub async fn eth_get_code(&self, address: Address, block: &str) -> Result<Bytes, BundlerError> {
        let value = self
            .call("eth_getCode", json!([address, block]))
            .await?
            .into_result()?;
        let hex_str = value
            .as_str()
            .ok_or_else(|| BundlerError::DecodeError("eth_getCode did not return a string".into()))?;
        hex_str
            .parse::<Bytes>()
            .map_err(|err| BundlerError::DecodeError(format!("eth_getCode: {err}")))
    }
}

fn parse_quantity(value: &Value) -> Result<U256, BundlerError> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| BundlerError::DecodeError("expected a 0x-prefixed quantity".into()))?;
    U256::from_str_radix(hex_str.trim_start_matches("0x"), 16)
        .map_err(|err| BundlerError::DecodeError(format!("malformed quantity {hex_str}: {err}")))
}
