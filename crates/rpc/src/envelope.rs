//! JSON-RPC response unwrapping.

use serde_json::Value;

use crate::RpcError;

/// Extracts the useful value from a provider response.
///
/// Some providers answer with the full `{jsonrpc, id, result | error}`
/// envelope, others return the bare result. A `null` (or empty string)
/// result is reported as `None`.
pub fn rpc_result(response: Value) -> Result<Option<Value>, RpcError> {
    match response {
        Value::Object(mut obj) if obj.contains_key("jsonrpc") => {
            if let Some(error) = obj.remove("error").filter(|e| !e.is_null()) {
                return Err(envelope_error(error));
            }
            Ok(obj.remove("result").and_then(non_empty))
        }
        other => Ok(non_empty(other)),
    }
}

fn non_empty(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(ref s) if s.is_empty() => None,
        v => Some(v),
    }
}

fn envelope_error(error: Value) -> RpcError {
    match error {
        Value::Object(obj) => RpcError::Rpc {
            code: obj.get("code").and_then(Value::as_i64).unwrap_or(-32603),
            message: obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        },
        Value::String(message) => RpcError::Rpc {
            code: -32603,
            message,
        },
        other => RpcError::InvalidResponse(other.to_string()),
    }
}
