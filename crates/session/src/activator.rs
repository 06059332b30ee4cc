//! The activation mechanism a session drives.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use klaywallet_connectors::ProviderHandle;
use klaywallet_protocol::ActivationError;
use klaywallet_rpc::ChainRpc;
use tokio::sync::watch;

/// What the activation mechanism currently exposes.
#[derive(Clone, Default)]
pub struct ActivationState {
    /// Connected account, once authorized.
    pub account: Option<String>,
    /// Chain client for the active provider.
    pub library: Option<Arc<dyn ChainRpc>>,
    pub active: bool,
}

impl ActivationState {
    /// The `(account, library)` pair, when both are set.
    pub fn pair(&self) -> Option<(&str, &Arc<dyn ChainRpc>)> {
        Some((self.account.as_deref()?, self.library.as_ref()?))
    }
}

impl fmt::Debug for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationState")
            .field("account", &self.account)
            .field("library", &self.library.is_some())
            .field("active", &self.active)
            .finish()
    }
}

/// Performs wallet handshakes for provider handles.
///
/// Implementations own the wallet wire protocols. The session only starts
/// and stops activations and observes the resulting [`ActivationState`].
#[async_trait]
pub trait Activator: Send + Sync {
    /// Completes the handshake for `handle`. May take arbitrarily long
    /// (user interaction, network).
    async fn activate(&self, handle: ProviderHandle) -> Result<(), ActivationError>;

    /// Tears down the active provider, if any.
    fn deactivate(&self);

    /// Subscribes to activation state changes.
    fn state(&self) -> watch::Receiver<ActivationState>;

    fn is_active(&self) -> bool {
        self.state().borrow().active
    }
}
