//! Error taxonomy surfaced through the session `error` field.

/// Failure reported by the activation mechanism.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("unsupported chain id: {chain_id}")]
    UnsupportedChainId { chain_id: i64 },

    #[error("the user rejected the activation request")]
    UserRejected,

    #[error("no provider available")]
    NoProvider,

    #[error("{0}")]
    Other(String),
}

/// Errors exposed by a wallet session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The requested connector is not registered, or it produced no handle.
    #[error("unsupported connector: {0}")]
    ConnectorUnsupported(String),

    /// Activation reported a chain the session was not configured for.
    #[error("unsupported chain: {received} (expected {expected})")]
    ChainUnsupported { received: i64, expected: u64 },

    /// The user declined the activation.
    #[error("the connection was rejected")]
    ConnectionRejected,

    /// Malformed connector descriptor or config.
    #[error("connector config error: {0}")]
    ConnectorConfig(String),

    /// Invalid session configuration or a second session in the same scope.
    #[error("session config error: {0}")]
    SessionConfig(String),

    /// Any other activation failure, stored as reported.
    #[error("activation failed: {0}")]
    Activation(#[from] ActivationError),
}

impl WalletError {
    /// Stable name of the error kind, for consumers matching on strings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectorUnsupported(_) => "ConnectorUnsupportedError",
            Self::ChainUnsupported { .. } => "ChainUnsupportedError",
            Self::ConnectionRejected => "ConnectionRejectedError",
            Self::ConnectorConfig(_) => "ConnectorConfigError",
            Self::SessionConfig(_) => "SessionConfigError",
            Self::Activation(_) => "ActivationError",
        }
    }
}
