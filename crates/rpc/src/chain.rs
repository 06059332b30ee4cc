//! The chain RPC facade and its JSON-RPC implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::trace;

use crate::RpcError;
use crate::envelope::rpc_result;

/// What a session needs from a connected provider.
///
/// Quantities are returned as reported by the provider (hex or decimal);
/// callers normalise them. `Ok(None)` means the provider had no answer.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Fetches the balance of `account` at the latest block.
    async fn get_balance(&self, account: &str) -> Result<Option<String>, RpcError>;

    /// Fetches the latest block number.
    async fn get_block_number(&self) -> Result<Option<String>, RpcError>;

    /// Returns `true` if `account` holds code.
    async fn is_contract_account(&self, account: &str) -> Result<bool, RpcError>;
}

/// Returns `true` if both handles point at the same provider instance.
pub fn same_chain(a: &Arc<dyn ChainRpc>, b: &Arc<dyn ChainRpc>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Sends raw JSON-RPC calls to a provider.
///
/// The returned value may be the full response envelope or the bare result;
/// [`rpc_result`] handles both.
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    async fn send(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// [`ChainRpc`] over the `klay_*` JSON-RPC namespace.
pub struct JsonRpcChain<T> {
    transport: T,
    calls: AtomicU64,
}

impl<T: JsonRpcTransport> JsonRpcChain<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            calls: AtomicU64::new(0),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of calls issued so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Option<Value>, RpcError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        trace!(method, call = n, "rpc call");
        let response = self.transport.send(method, params).await?;
        rpc_result(response)
    }
}

#[async_trait]
impl<T: JsonRpcTransport> ChainRpc for JsonRpcChain<T> {
    async fn get_balance(&self, account: &str) -> Result<Option<String>, RpcError> {
        let result = self
            .call("klay_getBalance", json!([account, "latest"]))
            .await?;
        result.map(quantity_string).transpose()
    }

    async fn get_block_number(&self) -> Result<Option<String>, RpcError> {
        let result = self.call("klay_blockNumber", json!([])).await?;
        result.map(quantity_string).transpose()
    }

    async fn is_contract_account(&self, account: &str) -> Result<bool, RpcError> {
        let code = self.call("klay_getCode", json!([account])).await?;
        Ok(match code {
            Some(Value::String(code)) => code != "0x",
            Some(other) => {
                return Err(RpcError::InvalidResponse(format!(
                    "expected code string, got {other}"
                )));
            }
            None => false,
        })
    }
}

fn quantity_string(value: Value) -> Result<String, RpcError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => n.as_u64().map(|v| v.to_string()).ok_or_else(|| {
            RpcError::InvalidResponse(format!("expected integer quantity, got {n}"))
        }),
        other => Err(RpcError::InvalidResponse(format!(
            "expected quantity, got {other}"
        ))),
    }
}
