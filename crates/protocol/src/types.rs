use serde::{Deserialize, Serialize};

/// Lifecycle status of a wallet session.
///
/// `Disconnected -> Connecting -> Connected`, with `Error` reachable from
/// `Connecting` and `Connected`. Only a reset goes back to `Disconnected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the connected account.
///
/// `None` in a snapshot means the classification is unknown or pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Externally owned account.
    Normal,
    /// Account with deployed code.
    Contract,
}

impl AccountKind {
    pub fn from_is_contract(is_contract: bool) -> Self {
        if is_contract {
            Self::Contract
        } else {
            Self::Normal
        }
    }
}
