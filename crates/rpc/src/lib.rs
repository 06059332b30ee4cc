//! Chain RPC facade for wallet sessions.
//!
//! [`ChainRpc`] is the narrow contract the session needs from a connected
//! provider: fetch a balance, fetch the latest block number, tell whether an
//! account holds code. [`JsonRpcChain`] implements it on top of any
//! [`JsonRpcTransport`].

pub mod chain;
pub mod envelope;

pub use chain::{ChainRpc, JsonRpcChain, JsonRpcTransport, same_chain};
pub use envelope::rpc_result;

/// Errors from RPC calls.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
