//! Connection state machine.
//!
//! A [`WalletSession`] sequences `connect`/`reset` calls against an
//! [`Activator`], keeps the observable [`SessionState`], and feeds the
//! balance and block number watchers from the activation state.
//!
//! Every `connect` call takes a new activation token. State changes made on
//! behalf of a call are applied only while its token is still the latest, so
//! a later call always wins over an earlier one, whichever finishes first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use klaywallet_connectors::{
    Connector, ConnectorConfig, ConnectorDescriptor, ConnectorEntry, ConnectorRegistry,
    build_registry,
};
use klaywallet_poll::{BalanceWatcher, BlockNumberWatcher, Listener};
use klaywallet_protocol::constants::DEFAULT_CONNECTOR_ID;
use klaywallet_protocol::{ActivationError, ConnectionStatus, WalletError, network_name};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::activator::Activator;
use crate::config::WalletConfig;
use crate::reconcile;
use crate::scope::{ScopeGuard, SessionScope};
use crate::state::{ConnectOutcome, SessionState, WalletSnapshot};

pub(crate) struct SessionInner {
    pub(crate) chain_id: u64,
    pub(crate) registry: ConnectorRegistry,
    pub(crate) activator: Arc<dyn Activator>,
    activation_id: AtomicU64,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) balance: BalanceWatcher,
    pub(crate) block_number: BlockNumberWatcher,
    pub(crate) shutdown: CancellationToken,
}

impl SessionInner {
    fn is_current(&self, token: u64) -> bool {
        self.activation_id.load(Ordering::SeqCst) == token
    }

    /// Applies `f` only if `token` is still the latest activation token.
    ///
    /// The check runs under the state lock, so no newer call can slip in
    /// between the check and the write.
    fn update_if_current(&self, token: u64, f: impl FnOnce(&mut SessionState)) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(token) {
                return false;
            }
            f(state);
            true
        })
    }

    fn deactivate_if_active(&self) {
        if self.activator.is_active() {
            self.activator.deactivate();
        }
    }

    fn classify(&self, descriptor: &ConnectorDescriptor, error: ActivationError) -> WalletError {
        match error {
            ActivationError::UnsupportedChainId { chain_id } => WalletError::ChainUnsupported {
                received: chain_id,
                expected: self.chain_id,
            },
            other => descriptor
                .handle_activation_error(&other)
                .unwrap_or(WalletError::Activation(other)),
        }
    }
}

/// A wallet session.
///
/// Created through [`WalletSessionBuilder`]. Shut down explicitly with
/// [`shutdown`](Self::shutdown) or by dropping it.
pub struct WalletSession {
    inner: Arc<SessionInner>,
    scope: Mutex<Option<ScopeGuard>>,
}

impl WalletSession {
    /// Connects through the connector registered as `connector_id`.
    ///
    /// Never fails: errors end up in the session state and in the returned
    /// [`ConnectOutcome`].
    pub async fn connect(&self, connector_id: &str) -> ConnectOutcome {
        let inner = &self.inner;
        let token = inner.activation_id.fetch_add(1, Ordering::SeqCst) + 1;
        info!(connector = %connector_id, token, "connecting");

        inner.deactivate_if_active();
        if !inner.update_if_current(token, SessionState::clear) {
            debug!(connector = %connector_id, token, "connect superseded before start");
            return ConnectOutcome::Superseded;
        }

        let Some(descriptor) = inner.registry.get(connector_id) else {
            warn!(connector = %connector_id, "unknown connector");
            return self.fail(token, WalletError::ConnectorUnsupported(connector_id.to_string()));
        };

        if !inner.update_if_current(token, |s| s.status = ConnectionStatus::Connecting) {
            return ConnectOutcome::Superseded;
        }

        let Some(handle) = descriptor.initialize(inner.chain_id) else {
            warn!(connector = %connector_id, "connector produced no provider handle");
            return self.fail(token, WalletError::ConnectorUnsupported(connector_id.to_string()));
        };

        if !inner.update_if_current(token, |s| s.connector = Some(connector_id.to_string())) {
            return ConnectOutcome::Superseded;
        }

        match inner.activator.activate(handle).await {
            Ok(()) => {
                if inner.update_if_current(token, |s| s.status = ConnectionStatus::Connected) {
                    info!(connector = %connector_id, token, "connected");
                    ConnectOutcome::Connected
                } else {
                    debug!(connector = %connector_id, token, "discarding stale activation");
                    ConnectOutcome::Superseded
                }
            }
            Err(e) => {
                if !inner.is_current(token) {
                    debug!(
                        connector = %connector_id,
                        token,
                        error = %e,
                        "discarding stale activation error"
                    );
                    return ConnectOutcome::Superseded;
                }
                let error = inner.classify(descriptor, e);
                warn!(connector = %connector_id, token, error = %error, "activation failed");
                let applied = inner.update_if_current(token, |s| {
                    s.connector = None;
                    s.fail(error.clone());
                });
                if applied {
                    ConnectOutcome::Failed(error)
                } else {
                    ConnectOutcome::Superseded
                }
            }
        }
    }

    /// Connects through the injected provider.
    pub async fn connect_default(&self) -> ConnectOutcome {
        self.connect(DEFAULT_CONNECTOR_ID).await
    }

    fn fail(&self, token: u64, error: WalletError) -> ConnectOutcome {
        if self.inner.update_if_current(token, |s| s.fail(error.clone())) {
            ConnectOutcome::Failed(error)
        } else {
            ConnectOutcome::Superseded
        }
    }

    /// Deactivates the provider, if active, and returns to `Disconnected`.
    ///
    /// Does not invalidate in-flight `connect` calls.
    pub fn reset(&self) {
        self.inner.deactivate_if_active();
        self.inner.state.send_modify(SessionState::clear);
        info!("session reset");
    }

    pub fn register_block_number_listener(&self, cb: &Listener<String>) -> bool {
        self.inner.block_number.add_listener(cb)
    }

    pub fn unregister_block_number_listener(&self, cb: &Listener<String>) -> bool {
        self.inner.block_number.remove_listener(cb)
    }

    /// The last polled block number.
    pub fn block_number(&self) -> Option<String> {
        self.inner.block_number.block_number()
    }

    /// The current balance, or the sentinel.
    pub fn balance(&self) -> String {
        self.inner.balance.balance()
    }

    pub fn subscribe_balance(&self) -> watch::Receiver<String> {
        self.inner.balance.subscribe()
    }

    /// Subscribes to state machine changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        let state = self.state();
        let account = self.inner.activator.state().borrow().account.clone();
        WalletSnapshot {
            account,
            balance: self.balance(),
            block_number: self.block_number(),
            chain_id: self.inner.chain_id,
            network_name: network_name(self.inner.chain_id),
            connector: state.connector,
            connectors: self.inner.registry.ids(),
            error: state.error,
            status: state.status,
            account_kind: state.account_kind,
        }
    }

    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.inner.registry
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }

    pub fn network_name(&self) -> &'static str {
        network_name(self.inner.chain_id)
    }

    /// Stops the live feeds and the reconciliation task, and releases the
    /// session scope. Does not deactivate the provider.
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.shutdown.cancel();
        self.inner.balance.stop();
        self.inner.block_number.stop();
        self.scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        info!("session shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds a [`WalletSession`] from a [`WalletConfig`] plus programmatic
/// connector entries.
#[derive(Debug, Default)]
pub struct WalletSessionBuilder {
    config: WalletConfig,
    entries: Vec<(String, ConnectorEntry)>,
}

impl WalletSessionBuilder {
    pub fn new(config: WalletConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Registers a custom connector, or replaces a built-in one.
    pub fn connector(mut self, id: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        self.entries
            .push((id.into(), ConnectorEntry::Initializer(connector)));
        self
    }

    /// Attaches a config to a registered connector. Overrides a config for
    /// the same id from the [`WalletConfig`].
    pub fn connector_config(mut self, id: impl Into<String>, config: ConnectorConfig) -> Self {
        self.entries.push((id.into(), ConnectorEntry::Config(config)));
        self
    }

    /// Builds the session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self, activator: Arc<dyn Activator>) -> Result<WalletSession, WalletError> {
        self.build_with_guard(activator, None)
    }

    /// Builds the session as the single session of `scope`.
    pub fn build_in(
        self,
        scope: &SessionScope,
        activator: Arc<dyn Activator>,
    ) -> Result<WalletSession, WalletError> {
        let guard = scope.claim()?;
        self.build_with_guard(activator, Some(guard))
    }

    fn build_with_guard(
        self,
        activator: Arc<dyn Activator>,
        guard: Option<ScopeGuard>,
    ) -> Result<WalletSession, WalletError> {
        let config = self.config;
        config.validate()?;

        let mut entries = config.connector_entries()?;
        entries.extend(self.entries);
        let registry = build_registry(config.chain_id, entries)?;

        let inner = Arc::new(SessionInner {
            chain_id: config.chain_id,
            registry,
            activator,
            activation_id: AtomicU64::new(0),
            state: watch::channel(SessionState::default()).0,
            balance: BalanceWatcher::new(config.balance_interval()),
            block_number: BlockNumberWatcher::new(config.block_number_interval()),
            shutdown: CancellationToken::new(),
        });
        reconcile::spawn(Arc::clone(&inner));

        info!(
            chain_id = config.chain_id,
            network = network_name(config.chain_id),
            connectors = inner.registry.len(),
            "wallet session created"
        );
        Ok(WalletSession {
            inner,
            scope: Mutex::new(guard),
        })
    }
}

impl SessionScope {
    /// Creates the session of this scope from `config`.
    ///
    /// Fails with a `SessionConfig` error while another session created in
    /// this scope is alive.
    pub fn create(
        &self,
        config: WalletConfig,
        activator: Arc<dyn Activator>,
    ) -> Result<WalletSession, WalletError> {
        WalletSessionBuilder::new(config).build_in(self, activator)
    }
}
