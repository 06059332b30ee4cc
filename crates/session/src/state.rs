//! Observable session state.

use klaywallet_protocol::{AccountKind, ConnectionStatus, WalletError};

/// State owned by the connection state machine.
///
/// Account and provider come from the activation mechanism and are not
/// duplicated here; see [`WalletSnapshot`] for the combined view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Connector of the current or last attempted activation.
    pub connector: Option<String>,
    pub error: Option<WalletError>,
    pub status: ConnectionStatus,
    /// `None` while unknown or being determined.
    pub account_kind: Option<AccountKind>,
}

impl SessionState {
    /// Back to `Disconnected` with no connector and no error.
    pub(crate) fn clear(&mut self) {
        self.connector = None;
        self.error = None;
        self.status = ConnectionStatus::Disconnected;
    }

    pub(crate) fn fail(&mut self, error: WalletError) {
        self.status = ConnectionStatus::Error;
        self.error = Some(error);
    }
}

/// Read-only view of a session for consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub account: Option<String>,
    /// Decimal balance, or the `"-1"` sentinel.
    pub balance: String,
    pub block_number: Option<String>,
    pub chain_id: u64,
    pub network_name: &'static str,
    pub connector: Option<String>,
    /// Registered connector ids, sorted.
    pub connectors: Vec<String>,
    pub error: Option<WalletError>,
    pub status: ConnectionStatus,
    pub account_kind: Option<AccountKind>,
}

/// How a `connect` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Activation succeeded and the session is connected.
    Connected,
    /// The attempt failed; the same error is stored in the session.
    Failed(WalletError),
    /// A newer `connect` call started before this one finished. Its result
    /// was discarded and the session was left untouched.
    Superseded,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn error(&self) -> Option<&WalletError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}
