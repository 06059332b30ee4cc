//! Connectors registered in every session.

use std::sync::Arc;

use klaywallet_protocol::{ActivationError, WalletError};

use crate::connector::{ActivationParams, Connector, ProviderHandle, ProviderKind};

/// Id of the browser-injected provider connector.
pub const INJECTED: &str = "injected";

/// Id of the QR-paired remote signer connector.
pub const REMOTE_QR: &str = "remote-qr";

/// Wraps the provider injected by the host environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectedConnector;

impl Connector for InjectedConnector {
    fn initialize(&self, params: &ActivationParams) -> Option<ProviderHandle> {
        Some(ProviderHandle::new(ProviderKind::Injected, params))
    }

    fn handle_activation_error(&self, error: &ActivationError) -> Option<WalletError> {
        rejected(error)
    }
}

/// Pairs with a remote signer through a QR code.
///
/// Needs modal hooks to show and close the QR code; without them it yields
/// no handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteQrConnector;

impl Connector for RemoteQrConnector {
    fn initialize(&self, params: &ActivationParams) -> Option<ProviderHandle> {
        params.modal.as_ref()?;
        Some(ProviderHandle::new(ProviderKind::RemoteQr, params))
    }

    fn handle_activation_error(&self, error: &ActivationError) -> Option<WalletError> {
        rejected(error)
    }
}

fn rejected(error: &ActivationError) -> Option<WalletError> {
    matches!(error, ActivationError::UserRejected).then_some(WalletError::ConnectionRejected)
}

/// The built-in connectors, keyed by id.
pub fn builtin_connectors() -> Vec<(&'static str, Arc<dyn Connector>)> {
    vec![
        (INJECTED, Arc::new(InjectedConnector) as Arc<dyn Connector>),
        (REMOTE_QR, Arc::new(RemoteQrConnector) as Arc<dyn Connector>),
    ]
}
