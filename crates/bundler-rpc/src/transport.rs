use async_trait::async_trait;
use bundler_errors::BundlerError;
use serde_json::Value;

/// The suspension point every other manager ultimately funnels through.
/// Abstracted behind a trait so the validation/gas/mempool managers can be
/// exercised against a fake node in tests (§8) without a live HTTP endpoint.
#[async_trait]
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait JsonRpcTransport: Send + Sync {
    /// Sends one JSON-RPC 2.0 request and returns the raw envelope
    /// (`{"result": ...}` or `{"error": {...}}`) as a [`Value`]. Only
    /// transport-level failures (connection refused, timeout, malformed
    /// JSON) are turned into [`BundlerError::RpcError`] here; node-level
    /// errors are surfaced as `Ok` envelopes for the caller to interpret.
    async fn send_raw(&self, method: &str, params: Value) -> Result<Value, BundlerError>;
}

/// Production transport: a plain HTTP(S) POST carrying a single JSON-RPC 2.0
/// request body, built on `reqwest` the way the rest of the ecosystem talks
/// to an Ethereum node.
pub struct HttpJsonRpcTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpJsonRpcTransport {
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with a fixed timeout is always buildable");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl JsonRpcTransport for HttpJsonRpcTransport {
    async fn send_raw(&self, method: &str, params: Value) -> Result<Value, BundlerError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    BundlerError::RpcError(format!("{method}: request timed out"))
                } else {
                    BundlerError::RpcError(format!("{method}: {err}"))
                }
            })?;

        response
            .json::<Value>()
            .await
            .map_err(|err| BundlerError::RpcError(format!("{method}: malformed response: {err}")))
    }
}
