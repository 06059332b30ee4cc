//! Connector strategy and the values it exchanges with the session.

use std::fmt;
use std::sync::Arc;

use klaywallet_protocol::{ActivationError, WalletError};
use serde_json::{Map, Value};

/// Free-form connector options, as found in configuration.
pub type ConnectorOptions = Map<String, Value>;

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Presentation callbacks a connector may drive (e.g. a QR code modal).
#[derive(Clone)]
pub struct ModalHooks {
    show: Hook,
    close: Hook,
}

impl ModalHooks {
    pub fn new<S, C>(show: S, close: C) -> Self
    where
        S: Fn() + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            show: Arc::new(show),
            close: Arc::new(close),
        }
    }

    pub fn show(&self) {
        (self.show)()
    }

    pub fn close(&self) {
        (self.close)()
    }
}

impl fmt::Debug for ModalHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModalHooks { .. }")
    }
}

/// Configuration attached to a registered connector.
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    pub options: ConnectorOptions,
    pub modal: Option<ModalHooks>,
}

impl ConnectorConfig {
    pub fn from_options(options: ConnectorOptions) -> Self {
        Self {
            options,
            modal: None,
        }
    }

    pub fn with_modal(mut self, modal: ModalHooks) -> Self {
        self.modal = Some(modal);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl From<ConnectorOptions> for ConnectorConfig {
    fn from(options: ConnectorOptions) -> Self {
        Self::from_options(options)
    }
}

/// Parameters handed to [`Connector::initialize`].
#[derive(Debug, Clone)]
pub struct ActivationParams {
    pub chain_id: u64,
    pub options: ConnectorOptions,
    pub modal: Option<ModalHooks>,
}

impl ActivationParams {
    /// Merges the session chain id with a connector config.
    ///
    /// A numeric `chainId` option overrides the session chain id.
    pub fn new(chain_id: u64, config: Option<&ConnectorConfig>) -> Self {
        let options = config.map(|c| c.options.clone()).unwrap_or_default();
        let chain_id = options
            .get("chainId")
            .and_then(Value::as_u64)
            .unwrap_or(chain_id);
        Self {
            chain_id,
            options,
            modal: config.and_then(|c| c.modal.clone()),
        }
    }
}

/// Kind of provider a handle asks the activation mechanism for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    /// Provider injected by the host environment (browser extension).
    Injected,
    /// Remote signer paired by scanning a QR code.
    RemoteQr,
    /// Caller-defined provider.
    Custom(String),
}

/// What a connector produced: everything the activation mechanism needs to
/// perform the handshake.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    pub kind: ProviderKind,
    pub supported_chain_ids: Vec<u64>,
    pub options: ConnectorOptions,
    pub modal: Option<ModalHooks>,
}

impl ProviderHandle {
    pub fn new(kind: ProviderKind, params: &ActivationParams) -> Self {
        Self {
            kind,
            supported_chain_ids: vec![params.chain_id],
            options: params.options.clone(),
            modal: params.modal.clone(),
        }
    }
}

/// A pluggable strategy for obtaining a provider handle.
pub trait Connector: Send + Sync {
    /// Builds the provider handle, or `None` if this connector cannot be
    /// used with these parameters.
    fn initialize(&self, params: &ActivationParams) -> Option<ProviderHandle>;

    /// Gets first refusal to reclassify an activation failure.
    fn handle_activation_error(&self, _error: &ActivationError) -> Option<WalletError> {
        None
    }
}

/// A [`Connector`] backed by a closure.
pub struct FnConnector<F> {
    init: F,
}

impl<F> FnConnector<F>
where
    F: Fn(&ActivationParams) -> Option<ProviderHandle> + Send + Sync + 'static,
{
    pub fn new(init: F) -> Self {
        Self { init }
    }
}

impl<F> Connector for FnConnector<F>
where
    F: Fn(&ActivationParams) -> Option<ProviderHandle> + Send + Sync + 'static,
{
    fn initialize(&self, params: &ActivationParams) -> Option<ProviderHandle> {
        (self.init)(params)
    }
}

/// Wraps a closure as a shareable connector.
pub fn connector_fn<F>(init: F) -> Arc<dyn Connector>
where
    F: Fn(&ActivationParams) -> Option<ProviderHandle> + Send + Sync + 'static,
{
    Arc::new(FnConnector::new(init))
}
