//! Wallet connectors.
//!
//! A connector turns activation parameters into a [`ProviderHandle`] the
//! activation mechanism can complete. The [`ConnectorRegistry`] merges the
//! built-in connectors with caller-supplied ones.

pub mod builtin;
pub mod connector;
pub mod registry;

pub use builtin::{INJECTED, InjectedConnector, REMOTE_QR, RemoteQrConnector};
pub use connector::{
    ActivationParams, Connector, ConnectorConfig, ConnectorOptions, FnConnector, ModalHooks,
    ProviderHandle, ProviderKind, connector_fn,
};
pub use registry::{ConnectorDescriptor, ConnectorEntry, ConnectorRegistry, build_registry};
